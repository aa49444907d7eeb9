use std::{collections::VecDeque, io, time::Duration};

use lpt_parser_core::{ByteSource, DEFAULT_IDLE_TIMEOUT, LiveScanner, PrinterEvent, ReadEvent, ScanError, ScannerConfig, StreamSource, Untimed, scan_live};
use pretty_assertions::assert_eq;

enum Step {
    Bytes(&'static [u8]),
    Idle,
    Fail,
}

/// Replays a fixed script and records the deadline of every read.
struct ScriptedSource {
    script: VecDeque<Step>,
    pending: VecDeque<u8>,
    deadlines: Vec<Option<Duration>>,
}

impl ScriptedSource {
    fn new(script: Vec<Step>) -> Self {
        Self {
            script: script.into(),
            pending: VecDeque::new(),
            deadlines: Vec::new(),
        }
    }
}

impl ByteSource for ScriptedSource {
    fn next_byte(&mut self, deadline: Option<Duration>) -> io::Result<ReadEvent> {
        self.deadlines.push(deadline);
        loop {
            if let Some(b) = self.pending.pop_front() {
                return Ok(ReadEvent::Byte(b));
            }
            match self.script.pop_front() {
                Some(Step::Bytes(bytes)) => self.pending.extend(bytes),
                Some(Step::Idle) => return Ok(ReadEvent::Idle),
                Some(Step::Fail) => return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer")),
                None => return Ok(ReadEvent::Closed),
            }
        }
    }
}

fn run(script: Vec<Step>) -> (ScriptedSource, Vec<PrinterEvent>) {
    let mut source = ScriptedSource::new(script);
    let mut scanner = LiveScanner::new(ScannerConfig::named("scripted"));
    let mut events = Vec::new();
    scan_live(&mut source, &mut scanner, &mut events).unwrap();
    (source, events)
}

#[test]
fn idle_ends_job_once() {
    let (_, events) = run(vec![Step::Bytes(b"FIRST\nSECOND"), Step::Idle, Step::Idle, Step::Bytes(b"NEXT\n"), Step::Idle]);
    assert_eq!(
        events,
        vec![
            PrinterEvent::line("FIRST", true),
            PrinterEvent::line("SECOND", true),
            PrinterEvent::end_of_job(""),
            PrinterEvent::line("NEXT", true),
            PrinterEvent::end_of_job(""),
        ]
    );
}

#[test]
fn deadline_is_armed_only_during_a_job() {
    let (source, _) = run(vec![Step::Bytes(b"\rA"), Step::Idle]);
    assert_eq!(
        source.deadlines,
        vec![
            None,                       // CR, ignored before the job
            None,                       // 'A' starts the job
            Some(DEFAULT_IDLE_TIMEOUT), // idle
            None,                       // closed
        ]
    );
}

#[test]
fn close_flushes_and_ends_job() {
    let (_, events) = run(vec![Step::Bytes(b"\x0CPARTIAL")]);
    assert_eq!(events, vec![PrinterEvent::line("PARTIAL", true), PrinterEvent::end_of_job("")]);
}

#[test]
fn close_between_jobs_emits_nothing() {
    let (_, events) = run(vec![Step::Bytes(b"A\n"), Step::Idle, Step::Bytes(b"\r")]);
    assert_eq!(events, vec![PrinterEvent::line("A", true), PrinterEvent::end_of_job("")]);
}

#[test]
fn read_error_propagates_without_flush() {
    let mut source = ScriptedSource::new(vec![Step::Bytes(b"UNFINISHED"), Step::Fail]);
    let mut scanner = LiveScanner::new(ScannerConfig::default());
    let mut events = Vec::new();

    let result = scan_live(&mut source, &mut scanner, &mut events);
    assert!(matches!(result, Err(ScanError::Io(ref e)) if e.kind() == io::ErrorKind::ConnectionReset));
    assert!(events.is_empty());
    assert!(scanner.job_in_progress());
}

#[test]
fn zero_idle_timeout_is_rejected_before_reading() {
    let mut source = ScriptedSource::new(vec![Step::Bytes(b"JOB\n")]);
    let mut config = ScannerConfig::named("zero");
    config.idle_timeout = Duration::ZERO;
    let mut scanner = LiveScanner::new(config);
    let mut events = Vec::new();

    let result = scan_live(&mut source, &mut scanner, &mut events);
    assert!(matches!(result, Err(ScanError::ZeroIdleTimeout)));
    assert!(source.deadlines.is_empty());
    assert!(events.is_empty());
}

#[test]
fn captured_stream_is_one_job() {
    let capture = b"\x0CHEADER\r\n\r\nBODY\rBODY\r\n\x0CPAGE 2\r\n";
    let mut source = StreamSource::new(Untimed(&capture[..]));
    let mut scanner = LiveScanner::new(ScannerConfig::named("capture"));
    let mut events = Vec::new();
    scan_live(&mut source, &mut scanner, &mut events).unwrap();

    assert_eq!(
        events,
        vec![
            PrinterEvent::line("HEADER", true),
            PrinterEvent::line("", true),
            PrinterEvent::line("BODY", false),
            PrinterEvent::line("BODY", true),
            PrinterEvent::line("", true),
            PrinterEvent::PageBreak,
            PrinterEvent::line("PAGE 2", true),
            PrinterEvent::end_of_job(""),
        ]
    );
}
