//! ASA carriage control
//!
//! The first character of every line tells the printer how far to move the
//! paper *before* printing the line:
//!
//! - `' '` - single space
//! - `'0'` - double space (one blank line)
//! - `'-'` - triple space (two blank lines)
//! - `'1'` - new page
//! - `'+'` - no advance; overstrike the previous line
//!
//! Our handler wants to know after each line whether to feed, so the scanner
//! holds one line back: the control character of line N decides how line N-1
//! is terminated.

use crate::{
    ASA_DOUBLE_SPACE, ASA_NEW_PAGE, ASA_OVERSTRIKE, ASA_SINGLE_SPACE, ASA_TRIPLE_SPACE, CarriageControlScanner, LineBuffer, ParseError, PrinterHandler,
    ScannerConfig, report,
};

pub struct AsaScanner {
    config: ScannerConfig,
    line_number: usize,
    pending: LineBuffer<char>,
}

impl AsaScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            config,
            line_number: 0,
            pending: LineBuffer::new(),
        }
    }

    fn flush(&mut self, linefeed: bool, sink: &mut dyn PrinterHandler) {
        let text = self.pending.take_string();
        if self.config.trace {
            log::trace!("[{}] (lf: {}) asa line: {}", self.config.name, linefeed, text);
        }
        sink.add_line(&text, linefeed);
    }
}

impl CarriageControlScanner for AsaScanner {
    fn config(&self) -> &ScannerConfig {
        &self.config
    }

    fn line(&mut self, control: char, text: &str, sink: &mut dyn PrinterHandler) {
        self.line_number += 1;

        // We start at the top of a fresh page, so a leading '1' needs no page
        // break and a leading '+' has nothing to overstrike.
        if self.line_number == 1 {
            match control {
                ASA_SINGLE_SPACE | ASA_NEW_PAGE | ASA_OVERSTRIKE => {}
                ASA_DOUBLE_SPACE => sink.add_line("", true),
                ASA_TRIPLE_SPACE => {
                    sink.add_line("", true);
                    sink.add_line("", true);
                }
                _ => report(&self.config.name, sink, ParseError::UnknownControl { control, line: 1 }),
            }
            self.pending.fill_from(text);
            return;
        }

        match control {
            ASA_SINGLE_SPACE => self.flush(true, sink),
            ASA_NEW_PAGE => {
                self.flush(true, sink);
                sink.page_break();
            }
            ASA_DOUBLE_SPACE => {
                self.flush(true, sink);
                sink.add_line("", true);
            }
            ASA_TRIPLE_SPACE => {
                self.flush(true, sink);
                sink.add_line("", true);
                sink.add_line("", true);
            }
            ASA_OVERSTRIKE => self.flush(false, sink),
            _ => {
                self.flush(true, sink);
                report(
                    &self.config.name,
                    sink,
                    ParseError::UnknownControl {
                        control,
                        line: self.line_number,
                    },
                );
            }
        }
        self.pending.fill_from(text);
    }

    fn finish(&mut self, sink: &mut dyn PrinterHandler) {
        self.flush(true, sink);
        sink.end_of_job(&self.config.job_name);
        self.line_number = 0;
    }
}
