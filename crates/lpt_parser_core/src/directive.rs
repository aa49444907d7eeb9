//! Print directive streams
//!
//! A line-based text format for handing a decoded job to a renderer or to a
//! file. Each line is a one-letter directive, a colon and optional data:
//!
//! ```text
//! L:[line data]  - print a line, then advance to the next line
//! O:[line data]  - print a line, then return to column 0 without advancing;
//!                  the next L: or O: overstrikes it
//! P:             - page break; data is ignored
//! J:[job data]   - job identifier, up to 25 characters of [A-Za-z0-9_];
//!                  the last one wins
//! ```
//!
//! Line data must be valid UTF-8 and is trimmed to 132 characters.

use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::{LineBuffer, PrinterHandler};

pub const MAX_JOB_INFO_LEN: usize = 25;

#[derive(Debug, Error)]
pub enum DirectiveError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: received without directive")]
    MissingDirective { line: usize },

    #[error("line {line}: invalid UTF-8 string")]
    InvalidUtf8 { line: usize },

    #[error("line {line}: invalid directive received: {directive:?}")]
    UnknownDirective { line: usize, directive: String },

    #[error("line {line}: invalid job data directive")]
    InvalidJobInfo { line: usize },
}

/// Caps applied while reading a directive stream. Zero/`None` means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectiveLimits {
    /// Stop after this many directives
    pub max_lines: Option<usize>,
}

pub fn is_valid_job_info(info: &str) -> bool {
    info.len() <= MAX_JOB_INFO_LEN && info.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Reduces arbitrary job info to what a `J:` directive may carry.
pub fn sanitize_job_info(info: &str) -> String {
    info.chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .take(MAX_JOB_INFO_LEN)
        .collect()
}

/// Writes every printer event as a directive.
///
/// Handler methods cannot fail, so the first write error is kept and all later
/// output is dropped; check it with [`DirectiveWriter::take_error`] or
/// [`DirectiveWriter::finish`].
pub struct DirectiveWriter<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> DirectiveWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    /// Flushes and returns the underlying writer, or the first error that occurred.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_directive(&mut self, directive: &str, data: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = writeln!(self.out, "{}{}", directive, data) {
            self.error = Some(err);
        }
    }
}

impl<W: Write> PrinterHandler for DirectiveWriter<W> {
    fn add_line(&mut self, line: &str, linefeed: bool) {
        self.write_directive(if linefeed { "L:" } else { "O:" }, line);
    }

    fn page_break(&mut self) {
        self.write_directive("P:", "");
    }

    fn end_of_job(&mut self, jobinfo: &str) {
        let info = sanitize_job_info(jobinfo);
        if !info.is_empty() {
            self.write_directive("J:", &info);
        }
        if self.error.is_none() {
            if let Err(err) = self.out.flush() {
                self.error = Some(err);
            }
        }
    }
}

/// Replays a directive stream into `sink` and ends the job.
///
/// Returns the job info from the last `J:` directive (empty if there was none).
/// Blank lines are skipped; anything else that is not a valid directive aborts
/// the replay with an error before `end_of_job` is called.
pub fn read_directives(reader: &mut dyn BufRead, sink: &mut dyn PrinterHandler, limits: DirectiveLimits) -> Result<String, DirectiveError> {
    let mut jobinfo = String::new();
    let mut raw = Vec::new();
    let mut line_number = 0;
    let mut directives = 0;
    let mut text = LineBuffer::<char>::new();

    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        line_number += 1;
        let line = std::str::from_utf8(&raw).map_err(|_| DirectiveError::InvalidUtf8 { line: line_number })?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.len() < 2 {
            return Err(DirectiveError::MissingDirective { line: line_number });
        }
        let Some(directive) = line.get(..2) else {
            return Err(DirectiveError::UnknownDirective {
                line: line_number,
                directive: line.chars().take(2).collect(),
            });
        };
        text.fill_from(&line[2..]);

        match directive {
            "L:" => sink.add_line(&text.take_string(), true),
            "O:" => sink.add_line(&text.take_string(), false),
            "P:" => sink.page_break(),
            "J:" => {
                let info = text.take_string();
                if !is_valid_job_info(&info) {
                    return Err(DirectiveError::InvalidJobInfo { line: line_number });
                }
                jobinfo = info;
            }
            _ => {
                return Err(DirectiveError::UnknownDirective {
                    line: line_number,
                    directive: directive.to_string(),
                });
            }
        }
        text.clear();

        directives += 1;
        if limits.max_lines.is_some_and(|max| max > 0 && directives >= max) {
            log::warn!("directive stream truncated after {} directives", directives);
            break;
        }
    }

    sink.end_of_job(&jobinfo);
    Ok(jobinfo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_job_info() {
        assert_eq!(sanitize_job_info("J42_MYJOB"), "J42_MYJOB");
        assert_eq!(sanitize_job_info("J7_$HASP#01"), "J7_HASP01");
        assert_eq!(sanitize_job_info(&"X".repeat(40)).len(), MAX_JOB_INFO_LEN);
        assert!(is_valid_job_info(""));
        assert!(!is_valid_job_info("BAD-INFO"));
    }
}
