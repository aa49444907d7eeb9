//! Printer channel scanner for live (socket) data
//!
//! The host sends raw print lines terminated by any mix of CR, LF and FF, with
//! no framing around jobs. We tolerate the usual combinations:
//!
//! - bare LF, CR+LF and LF+CR all end a line and advance one line
//! - a bare CR ends a line without advancing, so the next line overstrikes it
//! - FF ends the pending line and starts a new page
//!
//! Lines are trimmed to 132 positions; bytes past that are discarded until the
//! next control byte.
//!
//! A job ends either when the line printed just before a form feed is the
//! trailer of a separator page, or when the host goes quiet for the idle
//! timeout while a job is in progress (see [`crate::scan_live`]).
//!
//! ## Transition table
//!
//! | state              | LF                 | CR                 | FF              | other               |
//! |--------------------|--------------------|--------------------|-----------------|---------------------|
//! | CollectingLine     | -> SawLf           | -> SawCr           | line+page       | append              |
//! | SawCr              | line -> Collecting | overstrike, stay   | line+page       | overstrike, append  |
//! | SawLf              | line, stay         | line -> Collecting | line+page       | line, append        |
//! | DiscardingOverflow | -> SawLf           | -> SawCr           | line+page       | discard             |

use crate::{
    CARRIAGE_RETURN, FORM_FEED, LINE_FEED, LineBuffer, ParseError, PrinterHandler, ScannerConfig, charset, print_char_value, report,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Collecting print positions into the current line
    CollectingLine,
    /// Got a CR; waiting to see whether it is CR+LF, CR+CR or a bare CR
    SawCr,
    /// Got a LF; waiting to see whether it is LF+CR, LF+LF or a bare LF
    SawLf,
    /// Line is full; dropping bytes until the next control byte
    DiscardingOverflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteClass {
    Lf,
    Cr,
    Ff,
    Other,
}

impl ByteClass {
    #[inline]
    pub fn of(byte: u8) -> Self {
        match byte {
            LINE_FEED => Self::Lf,
            CARRIAGE_RETURN => Self::Cr,
            FORM_FEED => Self::Ff,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    Nothing,
    /// Flush the line buffer; `advance == false` is an overstrike
    Line { advance: bool },
    /// Flush the line buffer with a line feed, then a page break (or end of job on a separator line)
    LineAndPage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub emit: Emit,
    /// Append the input byte to the (just flushed) line buffer
    pub append: bool,
    pub next: State,
}

const fn go(emit: Emit, append: bool, next: State) -> Transition {
    Transition { emit, append, next }
}

/// The complete transition table of the live scanner.
///
/// Overflow is not visible here: the scanner switches to
/// [`State::DiscardingOverflow`] itself once an append fills the line.
pub const fn step(state: State, class: ByteClass) -> Transition {
    use ByteClass::*;
    use State::*;

    const NOTHING: Emit = Emit::Nothing;
    const ADVANCE: Emit = Emit::Line { advance: true };
    const OVERSTRIKE: Emit = Emit::Line { advance: false };
    const PAGE: Emit = Emit::LineAndPage;

    match (state, class) {
        (CollectingLine, Lf) => go(NOTHING, false, SawLf),
        (CollectingLine, Cr) => go(NOTHING, false, SawCr),
        (CollectingLine, Ff) => go(PAGE, false, CollectingLine),
        (CollectingLine, Other) => go(NOTHING, true, CollectingLine),

        (SawCr, Lf) => go(ADVANCE, false, CollectingLine),
        (SawCr, Cr) => go(OVERSTRIKE, false, SawCr),
        (SawCr, Ff) => go(PAGE, false, CollectingLine),
        (SawCr, Other) => go(OVERSTRIKE, true, CollectingLine),

        // a second LF is itself a pending line end, so blank lines survive
        (SawLf, Lf) => go(ADVANCE, false, SawLf),
        (SawLf, Cr) => go(ADVANCE, false, CollectingLine),
        (SawLf, Ff) => go(PAGE, false, CollectingLine),
        (SawLf, Other) => go(ADVANCE, true, CollectingLine),

        (DiscardingOverflow, Lf) => go(NOTHING, false, SawLf),
        (DiscardingOverflow, Cr) => go(NOTHING, false, SawCr),
        (DiscardingOverflow, Ff) => go(PAGE, false, CollectingLine),
        (DiscardingOverflow, Other) => go(NOTHING, false, DiscardingOverflow),
    }
}

/// Byte-at-a-time scanner for one live printer connection.
pub struct LiveScanner {
    config: ScannerConfig,
    state: State,
    line: LineBuffer<u8>,
    new_job: bool,
}

impl LiveScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            config,
            state: State::CollectingLine,
            line: LineBuffer::new(),
            new_job: true,
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// True once the first byte of a job has been accepted and until the job ends.
    /// Only then is the idle timeout armed.
    pub fn job_in_progress(&self) -> bool {
        !self.new_job
    }

    pub fn feed(&mut self, input: &[u8], sink: &mut dyn PrinterHandler) {
        for &b in input {
            self.feed_byte(b, sink);
        }
    }

    pub fn feed_byte(&mut self, byte: u8, sink: &mut dyn PrinterHandler) {
        if self.config.discard_byte == Some(byte) {
            if self.config.trace {
                log::trace!("[{}] dropping {}", self.config.name, print_char_value(byte));
            }
            return;
        }

        let class = ByteClass::of(byte);
        if self.new_job {
            match class {
                ByteClass::Cr => {
                    // The host resets the carriage after the previous job. We are
                    // already at column 0 and still want the FF handling below.
                    if self.config.trace {
                        log::trace!("[{}] ignoring CR at beginning of job", self.config.name);
                    }
                    return;
                }
                ByteClass::Ff => {
                    // The host ejects the previous job late; we already start on a fresh page.
                    self.start_job();
                    if self.config.trace {
                        log::trace!("[{}] ignoring FF at beginning of job", self.config.name);
                    }
                    return;
                }
                _ => self.start_job(),
            }
        }

        let transition = step(self.state, class);
        if self.config.trace && class != ByteClass::Other {
            log::trace!("[{}] {:?} in {:?} -> {:?}", self.config.name, class, self.state, transition.next);
        }

        match transition.emit {
            Emit::Nothing => {}
            Emit::Line { advance } => {
                self.emit_line(advance, sink);
            }
            Emit::LineAndPage => {
                if self.emit_line_and_page(sink) {
                    return;
                }
            }
        }

        let mut next = transition.next;
        if transition.append {
            self.line.push(byte);
            if self.line.is_full() && next == State::CollectingLine {
                next = State::DiscardingOverflow;
            }
        }
        self.state = next;
    }

    /// The read deadline expired while a job was in progress: flush and end the job.
    pub fn idle_timeout(&mut self, sink: &mut dyn PrinterHandler) {
        if self.new_job {
            return;
        }
        log::info!("[{}] no data for {:?}, assuming end of job", self.config.name, self.config.idle_timeout);
        self.flush_pending(sink);
        self.end_job(String::new(), sink);
    }

    /// The byte source was closed. Flushes a partial line and ends a job in progress.
    pub fn finish(&mut self, sink: &mut dyn PrinterHandler) {
        if self.new_job {
            return;
        }
        self.flush_pending(sink);
        self.end_job(String::new(), sink);
    }

    fn start_job(&mut self) {
        log::info!("[{}] receiving data for new print job", self.config.name);
        self.new_job = false;
    }

    fn flush_pending(&mut self, sink: &mut dyn PrinterHandler) {
        if self.state != State::CollectingLine || !self.line.is_empty() {
            self.emit_line(true, sink);
        }
    }

    fn emit_line(&mut self, linefeed: bool, sink: &mut dyn PrinterHandler) -> String {
        let name = &self.config.name;
        if self.config.trace {
            let hex: String = self.line.as_slice().iter().map(|b| format!("{:02x}", b)).collect();
            log::trace!("[{}] (lf: {}) scanner got line: {}", name, linefeed, hex);
        }
        let mut unmapped = Vec::new();
        let text = self.line.flush_with(|bytes| charset::decode_line(bytes, |b| unmapped.push(b)));
        for byte in unmapped {
            report(name, sink, ParseError::UnmappedCharacter { byte });
        }
        sink.add_line(&text, linefeed);
        self.state = State::CollectingLine;
        text
    }

    /// Returns true if the line was a separator trailer and the job ended.
    fn emit_line_and_page(&mut self, sink: &mut dyn PrinterHandler) -> bool {
        let line = self.emit_line(true, sink);
        if self.config.trace {
            log::trace!("[{}] checking for end of job on line: {}", self.config.name, line);
        }
        match self.config.separator.job_info(&line) {
            Some(info) => {
                self.end_job(info, sink);
                true
            }
            None => {
                sink.page_break();
                false
            }
        }
    }

    fn end_job(&mut self, info: String, sink: &mut dyn PrinterHandler) {
        log::info!("[{}] end of print job {}", self.config.name, info);
        sink.end_of_job(&info);
        self.line.clear();
        self.state = State::CollectingLine;
        self.new_job = true;
    }
}
