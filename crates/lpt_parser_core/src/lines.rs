//! Line-oriented input (local listings) with a carriage control column.

use std::io::BufRead;

use crate::{AsaScanner, CdcScanner, ParseError, PrinterHandler, ScanError, ScannerConfig, TextFileScanner, report};

/// A scanner fed one listing line at a time.
///
/// `control` is the first character of the line, `text` the rest. The line
/// ending has already been removed.
pub trait CarriageControlScanner {
    fn config(&self) -> &ScannerConfig;

    fn line(&mut self, control: char, text: &str, sink: &mut dyn PrinterHandler);

    /// End of input: print what is still pending and end the job.
    fn finish(&mut self, sink: &mut dyn PrinterHandler);
}

/// How a local file is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileMode {
    /// Plain text with CR, LF and FF controls
    #[default]
    Text,
    /// ASA carriage control in column 1
    Asa,
    /// CDC NOS carriage control in column 1
    Cdc,
}

impl FileMode {
    /// Picks the mode from the command line switches; ASA and CDC exclude each other.
    pub fn from_flags(asa: bool, cdc: bool) -> Result<Self, ScanError> {
        match (asa, cdc) {
            (true, true) => Err(ScanError::ConflictingModes),
            (true, false) => Ok(Self::Asa),
            (false, true) => Ok(Self::Cdc),
            (false, false) => Ok(Self::Text),
        }
    }

    /// Scans a whole file as a single job.
    pub fn scan(self, reader: &mut dyn BufRead, config: ScannerConfig, sink: &mut dyn PrinterHandler) -> Result<(), ScanError> {
        match self {
            Self::Text => TextFileScanner::new(config).scan(reader, sink),
            Self::Asa => scan_lines(reader, &mut AsaScanner::new(config), sink),
            Self::Cdc => scan_lines(reader, &mut CdcScanner::new(config), sink),
        }
    }
}

/// Splits `reader` into lines and feeds them to `scanner`. The whole input is one job.
///
/// A line without even a control character counts as `' '`. If the control
/// position is not valid UTF-8 it is reported and also treated as `' '`.
pub fn scan_lines(reader: &mut dyn BufRead, scanner: &mut dyn CarriageControlScanner, sink: &mut dyn PrinterHandler) -> Result<(), ScanError> {
    let mut raw = Vec::new();
    let mut line_number = 0;
    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        line_number += 1;
        if raw.last() == Some(&b'\n') {
            raw.pop();
        }
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
        if raw.is_empty() {
            scanner.line(' ', "", sink);
            continue;
        }

        let (control, rest) = split_control(&raw);
        let control = control.unwrap_or_else(|| {
            report(&scanner.config().name, sink, ParseError::InvalidControlEncoding { line: line_number });
            ' '
        });
        scanner.line(control, &String::from_utf8_lossy(rest), sink);
    }
    scanner.finish(sink);
    Ok(())
}

fn split_control(raw: &[u8]) -> (Option<char>, &[u8]) {
    let valid = match std::str::from_utf8(raw) {
        Ok(s) => s,
        Err(e) => std::str::from_utf8(&raw[..e.valid_up_to()]).unwrap_or_default(),
    };
    match valid.chars().next() {
        Some(ch) => (Some(ch), &raw[ch.len_utf8()..]),
        None => (None, &raw[1..]),
    }
}
