use lpt_parser_core::{ErrorLevel, FileMode, LiveScanner, MAX_LINE_LEN, ParseError, PrinterEvent, PrinterHandler, ScannerConfig};

const SEPARATOR: &[u8] = b"****A  END   JOB   42  MYJOB     ROOM       END  A****";

/// Records events and counts diagnostics
#[derive(Default)]
struct FuzzSink {
    events: Vec<PrinterEvent>,
    error_count: usize,
}

impl PrinterHandler for FuzzSink {
    fn add_line(&mut self, line: &str, linefeed: bool) {
        self.events.add_line(line, linefeed);
    }

    fn page_break(&mut self) {
        self.events.page_break();
    }

    fn end_of_job(&mut self, jobinfo: &str) {
        self.events.end_of_job(jobinfo);
    }

    fn report_error(&mut self, _error: ParseError, _level: ErrorLevel) {
        self.error_count += 1;
    }
}

/// Random printer channel data, weighted towards the bytes the scanner cares about.
fn random_stream(rng: &mut fastrand::Rng, len: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(len);
    while data.len() < len {
        match rng.u8(0..20) {
            0 => data.push(b'\n'),
            1 => data.push(b'\r'),
            2 => data.push(0x0C),
            3 => data.push(0x00),
            4 => data.push(rng.u8(0x80..=0xFF)),
            5 => data.extend(std::iter::repeat_n(b'#', rng.usize(100..300))),
            6 => data.extend_from_slice(SEPARATOR),
            _ => data.push(rng.u8(0x20..0x7F)),
        }
    }
    data
}

fn random_listing(rng: &mut fastrand::Rng, lines: usize) -> Vec<u8> {
    const CONTROLS: &[u8] = b" 10-+2345678QRX\xFF";
    let mut data = Vec::new();
    for _ in 0..lines {
        if rng.u8(0..10) > 0 {
            data.push(CONTROLS[rng.usize(..CONTROLS.len())]);
        }
        let width = if rng.bool() { rng.usize(0..80) } else { rng.usize(0..400) };
        data.extend((0..width).map(|_| rng.u8(0x20..0x7F)));
        data.extend_from_slice(if rng.bool() { b"\n" } else { b"\r\n" });
    }
    data
}

fn assert_lines_fit(events: &[PrinterEvent], context: &str) {
    for event in events {
        if let PrinterEvent::Line { text, .. } = event {
            assert!(text.chars().count() <= MAX_LINE_LEN, "{}: line of {} chars", context, text.chars().count());
        }
    }
}

#[test]
fn fuzz_live_scanner() {
    let mut rng = fastrand::Rng::with_seed(0x1403);

    for round in 0..200 {
        let len = rng.usize(1..4000);
        let data = random_stream(&mut rng, len);
        let mut scanner = LiveScanner::new(ScannerConfig::named("fuzz"));
        let mut sink = FuzzSink::default();

        for chunk in data.chunks(rng.usize(1..64)) {
            scanner.feed(chunk, &mut sink);
            if rng.u8(0..8) == 0 {
                scanner.idle_timeout(&mut sink);
            }
        }
        scanner.finish(&mut sink);

        let context = format!("round {}", round);
        assert_lines_fit(&sink.events, &context);
        assert!(!scanner.job_in_progress(), "{}", context);
        if let Some(last) = sink.events.last() {
            assert!(matches!(last, PrinterEvent::EndOfJob { .. }), "{}: ends with {:?}", context, last);
        }

        // a page break always directly follows the advancing line it ends
        for pair in sink.events.windows(2) {
            if pair[1] == PrinterEvent::PageBreak {
                assert!(matches!(pair[0], PrinterEvent::Line { advance: true, .. }), "{}: {:?}", context, pair);
            }
        }
        if let Some(first) = sink.events.first() {
            assert_ne!(*first, PrinterEvent::PageBreak, "{}", context);
        }
    }
}

#[test]
fn fuzz_file_modes() {
    let mut rng = fastrand::Rng::with_seed(0x0066);

    for round in 0..100 {
        let lines = rng.usize(0..150);
        let data = random_listing(&mut rng, lines);
        for mode in [FileMode::Text, FileMode::Asa, FileMode::Cdc] {
            let mut sink = FuzzSink::default();
            mode.scan(&mut data.as_slice(), ScannerConfig::named("fuzz"), &mut sink).unwrap();

            let context = format!("round {} {:?}", round, mode);
            assert_lines_fit(&sink.events, &context);
            let jobs = sink.events.iter().filter(|e| matches!(e, PrinterEvent::EndOfJob { .. })).count();
            assert_eq!(jobs, 1, "{}", context);
            assert_eq!(sink.events.last(), Some(&PrinterEvent::end_of_job("")), "{}", context);
        }
    }
}

#[test]
fn fuzz_all_single_bytes() {
    for b in 0..=255u8 {
        let mut scanner = LiveScanner::new(ScannerConfig::default());
        let mut sink = FuzzSink::default();
        scanner.feed(&[b, b, b], &mut sink);
        scanner.finish(&mut sink);
        assert_lines_fit(&sink.events, &format!("byte {:02X}", b));

        let (_, unmapped) = lpt_parser_core::charset::map_byte(b);
        assert_eq!(sink.error_count, if unmapped { 3 } else { 0 }, "byte {:02X}", b);
    }
}
