use std::time::Duration;

use regex::Regex;

use crate::{NUL, ScanError};

/// Matches the last line of a JES2 separator page. The host follows it with LF+FF.
pub const DEFAULT_SEPARATOR_PATTERN: &str = r"(?m)\*+.+END.+(JOB|STC|TSU)\D+(\d+)\s+(\S+)\s+.+ROOM.+END.+\*+";

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(500);

/// Recognizes the separator banner that ends a job on a live printer stream.
///
/// The pattern is expected to capture the job type (`JOB`, `STC`, `TSU`), the
/// job number and the job name, in that order. Missing groups are skipped when
/// the job info is built.
#[derive(Debug, Clone)]
pub struct JobSeparator {
    pattern: Regex,
}

impl JobSeparator {
    pub fn new(pattern: &str) -> Result<Self, ScanError> {
        Ok(Self { pattern: Regex::new(pattern)? })
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    /// Returns the job info for `line` if it is a separator line, e.g. `J123_MYJOB`.
    pub fn job_info(&self, line: &str) -> Option<String> {
        let caps = self.pattern.captures(line)?;
        let mut info = String::new();
        if let Some(kind) = caps.get(1).and_then(|m| m.as_str().chars().next()) {
            info.push(kind);
        }
        if let Some(number) = caps.get(2) {
            info.push_str(number.as_str());
        }
        if let Some(name) = caps.get(3) {
            info.push('_');
            info.push_str(name.as_str());
        }
        Some(info)
    }
}

impl Default for JobSeparator {
    fn default() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_SEPARATOR_PATTERN).expect("default separator pattern is valid"),
        }
    }
}

/// Per-instance scanner settings. Nothing here is shared between scanners.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Input tag used as log prefix
    pub name: String,
    /// How long a live job may stay silent before it is considered finished
    pub idle_timeout: Duration,
    pub separator: JobSeparator,
    /// Byte dropped before it reaches the live state machine
    pub discard_byte: Option<u8>,
    /// Log raw lines and state transitions at trace level
    pub trace: bool,
    /// Job info reported by the file scanners at end of input
    pub job_name: String,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            separator: JobSeparator::default(),
            discard_byte: Some(NUL),
            trace: false,
            job_name: String::new(),
        }
    }
}

impl ScannerConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRAILER: &str = "****A  END   JOB   42  MYJOB     ROOM       END  A****";

    #[test]
    fn extracts_job_info() {
        let sep = JobSeparator::default();
        assert_eq!(sep.job_info(TRAILER).as_deref(), Some("J42_MYJOB"));
        assert_eq!(
            sep.job_info("****S  END   STC 1234  INIT      ROOM       END  S****").as_deref(),
            Some("S1234_INIT")
        );
        assert_eq!(sep.job_info("  END OF LISTING"), None);
    }

    #[test]
    fn custom_pattern_without_groups() {
        let sep = JobSeparator::new(r"^=== END OF JOB ===$").unwrap();
        assert_eq!(sep.job_info("=== END OF JOB ===").as_deref(), Some(""));
    }

    #[test]
    fn rejects_invalid_pattern() {
        assert!(matches!(JobSeparator::new("(unclosed"), Err(ScanError::SeparatorPattern(_))));
    }
}
