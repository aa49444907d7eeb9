//! Line printer stream decoding: turns printer channel bytes or carriage-control
//! listings into lines, overstrikes, page breaks and job boundaries.

mod control_codes;
pub use control_codes::*;

mod errors;
pub use errors::*;

mod line_buffer;
pub use line_buffer::LineBuffer;

pub mod charset;

mod config;
pub use config::{DEFAULT_IDLE_TIMEOUT, DEFAULT_SEPARATOR_PATTERN, JobSeparator, ScannerConfig};

mod live;
pub use live::{ByteClass, Emit, LiveScanner, State, Transition, step};

pub mod source;
pub use source::{ByteSource, ReadEvent, ReadTimeout, StreamSource, Untimed, scan_live};

mod lines;
pub use lines::{CarriageControlScanner, FileMode, scan_lines};

mod asa;
pub use asa::AsaScanner;

mod cdc;
pub use cdc::CdcScanner;

mod text;
pub use text::TextFileScanner;

pub mod directive;
pub use directive::{DirectiveError, DirectiveLimits, DirectiveWriter, read_directives};

/// One decoded printer action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrinterEvent {
    /// Print `text`; `advance` moves to the next line afterwards, otherwise the next line overstrikes this one
    Line { text: String, advance: bool },
    /// Advance to the top of the next page
    PageBreak,
    /// The job has concluded; `info` is best-effort metadata, empty if unknown
    EndOfJob { info: String },
}

impl PrinterEvent {
    pub fn line(text: impl Into<String>, advance: bool) -> Self {
        Self::Line { text: text.into(), advance }
    }

    pub fn end_of_job(info: impl Into<String>) -> Self {
        Self::EndOfJob { info: info.into() }
    }
}

/// Receives the output of every scanner.
///
/// Calls arrive in input order. After `end_of_job` returns the scanner starts
/// over with fresh state, so a handler may block there (e.g. waiting for a
/// render slot) to hold back the next job.
pub trait PrinterHandler {
    fn add_line(&mut self, line: &str, linefeed: bool);

    fn page_break(&mut self);

    fn end_of_job(&mut self, jobinfo: &str);

    /// Report a recoverable input problem. Default implementation does nothing.
    fn report_error(&mut self, _error: ParseError, _level: ErrorLevel) {}
}

impl PrinterHandler for Vec<PrinterEvent> {
    fn add_line(&mut self, line: &str, linefeed: bool) {
        self.push(PrinterEvent::line(line, linefeed));
    }

    fn page_break(&mut self) {
        self.push(PrinterEvent::PageBreak);
    }

    fn end_of_job(&mut self, jobinfo: &str) {
        self.push(PrinterEvent::end_of_job(jobinfo));
    }
}

/// Logs a diagnostic under the input tag and forwards it to the handler.
pub(crate) fn report(name: &str, sink: &mut dyn PrinterHandler, error: ParseError) {
    let level = error.level();
    match level {
        ErrorLevel::Info => log::debug!("[{}] {}", name, error.description()),
        ErrorLevel::Warning => log::warn!("[{}] {}", name, error.description()),
        ErrorLevel::Error => log::error!("[{}] {}", name, error.description()),
    }
    sink.report_error(error, level);
}
