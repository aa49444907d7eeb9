use std::{
    fs::OpenOptions,
    io::{self, Write},
    mem,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use lpt_parser_core::{DirectiveWriter, ErrorLevel, ParseError, PrinterHandler, directive::sanitize_job_info};
use parking_lot::{Condvar, Mutex};

/// Bounds how many finished jobs are written out at the same time.
///
/// Inputs block in [`JobGate::acquire`] until a slot is free, which in turn
/// stalls their scanner inside `end_of_job` and holds back the next job.
pub struct JobGate {
    available: Mutex<usize>,
    released: Condvar,
}

impl JobGate {
    pub fn new(slots: usize) -> Self {
        Self {
            available: Mutex::new(slots.max(1)),
            released: Condvar::new(),
        }
    }

    pub fn acquire(&self) -> JobPermit<'_> {
        let mut available = self.available.lock();
        while *available == 0 {
            self.released.wait(&mut available);
        }
        *available -= 1;
        JobPermit { gate: self }
    }

    pub fn available(&self) -> usize {
        *self.available.lock()
    }
}

pub struct JobPermit<'a> {
    gate: &'a JobGate,
}

impl Drop for JobPermit<'_> {
    fn drop(&mut self) {
        *self.gate.available.lock() += 1;
        self.gate.released.notify_one();
    }
}

/// Name of the file a job is stored in: `lpt-<info>-<UTC timestamp>.txt`,
/// or `lpt-<UTC timestamp>.txt` without job info.
pub fn job_file_name(jobinfo: &str, finished: DateTime<Utc>) -> String {
    let stamp = finished.format("%Y%m%dT%H%M%S");
    let info = sanitize_job_info(jobinfo);
    if info.is_empty() { format!("lpt-{}.txt", stamp) } else { format!("lpt-{}-{}.txt", info, stamp) }
}

/// Collects the directives of one job and stores each finished job in its own file.
pub struct JobFileHandler<'a> {
    name: String,
    output_dir: PathBuf,
    gate: &'a JobGate,
    job: DirectiveWriter<Vec<u8>>,
    lines: usize,
    pages: usize,
    errors: usize,
    written: Vec<PathBuf>,
}

impl<'a> JobFileHandler<'a> {
    pub fn new(name: impl Into<String>, output_dir: impl Into<PathBuf>, gate: &'a JobGate) -> Self {
        Self {
            name: name.into(),
            output_dir: output_dir.into(),
            gate,
            job: DirectiveWriter::new(Vec::new()),
            lines: 0,
            pages: 0,
            errors: 0,
            written: Vec::new(),
        }
    }

    /// Files written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Drops a partially received job, e.g. after the connection broke.
    pub fn abandon_job(&mut self) {
        if self.lines > 0 || self.pages > 0 {
            log::warn!("[{}] discarding incomplete job with {} lines", self.name, self.lines);
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.job = DirectiveWriter::new(Vec::new());
        self.lines = 0;
        self.pages = 0;
        self.errors = 0;
    }

    fn store(&self, data: &[u8], file_name: &str) -> io::Result<PathBuf> {
        let mut path = self.output_dir.join(file_name);
        let mut attempt = 1;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(data)?;
                    file.flush()?;
                    return Ok(path);
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    // two jobs finished within the same second
                    attempt += 1;
                    path = self.output_dir.join(unique_name(file_name, attempt));
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn unique_name(file_name: &str, attempt: usize) -> String {
    let stem = Path::new(file_name).file_stem().and_then(|s| s.to_str()).unwrap_or(file_name);
    format!("{}-{}.txt", stem, attempt)
}

impl PrinterHandler for JobFileHandler<'_> {
    fn add_line(&mut self, line: &str, linefeed: bool) {
        self.lines += 1;
        self.job.add_line(line, linefeed);
    }

    fn page_break(&mut self) {
        self.pages += 1;
        self.job.page_break();
    }

    fn end_of_job(&mut self, jobinfo: &str) {
        if self.lines == 0 {
            log::info!("[{}] ignoring empty job {}", self.name, jobinfo);
            self.reset();
            return;
        }
        self.job.end_of_job(jobinfo);
        let job = mem::replace(&mut self.job, DirectiveWriter::new(Vec::new()));
        let (lines, pages, errors) = (self.lines, self.pages, self.errors);
        self.reset();

        let data = match job.finish() {
            Ok(data) => data,
            Err(err) => {
                log::error!("[{}] couldn't encode job: {}", self.name, err);
                return;
            }
        };

        let gate = self.gate;
        let _permit = gate.acquire();
        let file_name = job_file_name(jobinfo, Utc::now());
        match self.store(&data, &file_name) {
            Ok(path) => {
                log::info!(
                    "[{}] wrote {} lines on {} pages to {} ({} diagnostics)",
                    self.name,
                    lines,
                    pages + 1,
                    path.display(),
                    errors
                );
                self.written.push(path);
            }
            Err(err) => log::error!("[{}] couldn't write job file {}: {}", self.name, file_name, err),
        }
    }

    fn report_error(&mut self, _error: ParseError, _level: ErrorLevel) {
        self.errors += 1;
    }
}
