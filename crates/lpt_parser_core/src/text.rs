//! Plain UTF-8 text files without a carriage control column.
//!
//! CR, LF and CR+LF each end a line, FF ends the line and the page. Lines are
//! trimmed to 132 characters. The whole file is a single job.

use std::io::BufRead;

use crate::{LineBuffer, PrinterHandler, ScanError, ScannerConfig};

const LF: char = '\n';
const CR: char = '\r';
const FF: char = '\x0C';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextState {
    Default,
    HaveCr,
    Dispose,
}

pub struct TextFileScanner {
    config: ScannerConfig,
    state: TextState,
    line: LineBuffer<char>,
}

impl TextFileScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            config,
            state: TextState::Default,
            line: LineBuffer::new(),
        }
    }

    /// Reads `reader` to the end and emits it as one job.
    /// Invalid UTF-8 is replaced with U+FFFD.
    pub fn scan(mut self, reader: &mut dyn BufRead, sink: &mut dyn PrinterHandler) -> Result<(), ScanError> {
        let mut chunk = Vec::new();
        loop {
            chunk.clear();
            if reader.read_until(b'\n', &mut chunk)? == 0 {
                break;
            }
            for ch in String::from_utf8_lossy(&chunk).chars() {
                self.feed_char(ch, sink);
            }
        }
        if !self.line.is_empty() {
            self.emit_line(sink);
        }
        sink.end_of_job(&self.config.job_name);
        Ok(())
    }

    pub fn feed_char(&mut self, ch: char, sink: &mut dyn PrinterHandler) {
        self.state = match (self.state, ch) {
            (TextState::HaveCr, CR) => {
                self.emit_line(sink);
                TextState::HaveCr
            }
            (_, CR) => TextState::HaveCr,
            (_, LF) => {
                self.emit_line(sink);
                TextState::Default
            }
            (_, FF) => {
                self.emit_line(sink);
                sink.page_break();
                TextState::Default
            }
            (TextState::Dispose, _) => TextState::Dispose,
            (TextState::HaveCr, ch) => {
                self.emit_line(sink);
                self.append(ch)
            }
            (TextState::Default, ch) => self.append(ch),
        };
    }

    fn append(&mut self, ch: char) -> TextState {
        self.line.push(ch);
        if self.line.is_full() { TextState::Dispose } else { TextState::Default }
    }

    fn emit_line(&mut self, sink: &mut dyn PrinterHandler) {
        let text = self.line.take_string();
        if self.config.trace {
            log::trace!("[{}] text line: {:?}", self.config.name, text);
        }
        sink.add_line(&text, true);
    }
}
