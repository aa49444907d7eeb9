//! Diagnostic and error types for the printer stream scanners

use std::fmt::Display;

use thiserror::Error;

/// Severity level of a scanner diagnostic
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorLevel {
    /// Informational message (e.g., a byte without a character mapping)
    Info = 0,
    /// Input that was tolerated but is probably not what the host intended
    Warning = 1,
    /// Input that could not be interpreted; a fail-safe default was used
    Error = 2,
}

impl ErrorLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl Display for ErrorLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recoverable problems found in the input. Scanning always continues after one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The carriage control position of a line was not valid UTF-8; treated as `' '`
    InvalidControlEncoding { line: usize },
    /// Carriage control character without a defined meaning; the pending line still advances
    UnknownControl { control: char, line: usize },
    /// High byte without an entry in the character table; passed through by value
    UnmappedCharacter { byte: u8 },
}

impl ParseError {
    /// Returns the suggested error level for this error type
    pub fn level(&self) -> ErrorLevel {
        match self {
            Self::InvalidControlEncoding { .. } => ErrorLevel::Error,
            Self::UnknownControl { .. } => ErrorLevel::Error,
            Self::UnmappedCharacter { .. } => ErrorLevel::Info,
        }
    }

    pub fn description(&self) -> String {
        match self {
            Self::InvalidControlEncoding { line } => {
                format!("invalid UTF-8 byte sequence at beginning of line {}", line)
            }
            Self::UnknownControl { control, line } => {
                format!("unknown/unimplemented control character '{}' on line {}", control.escape_debug(), line)
            }
            Self::UnmappedCharacter { byte } => {
                format!("got character {}, need to add mapping", print_char_value(*byte))
            }
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level(), self.description())
    }
}

/// Hard failures that stop a scanner.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Reading the underlying socket or file failed (end of stream is not an error)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid job separator pattern: {0}")]
    SeparatorPattern(#[from] regex::Error),

    #[error("ASA and CDC carriage control are mutually exclusive")]
    ConflictingModes,

    #[error("idle timeout must be greater than zero")]
    ZeroIdleTimeout,
}

/// Format a byte value for human-readable diagnostics.
///
/// - Printable ASCII (0x20-0x7E): "0x41 ('A')"
/// - Printer control characters: "0x0A (LF)", "0x0C (FF)", "0x0D (CR)"
/// - Other bytes: "0x9F"
pub fn print_char_value(byte: u8) -> String {
    match byte {
        0x00 => "0x00 (NUL)".to_string(),
        0x0A => "0x0A (LF)".to_string(),
        0x0C => "0x0C (FF)".to_string(),
        0x0D => "0x0D (CR)".to_string(),
        0x20..=0x7E => format!("0x{:02X} ('{}')", byte, byte as char),
        _ => format!("0x{:02X}", byte),
    }
}
