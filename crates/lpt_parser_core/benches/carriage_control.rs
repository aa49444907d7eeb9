use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use lpt_parser_core::{FileMode, PrinterHandler, ScannerConfig};
use std::hint::black_box;

struct NullSink;
impl PrinterHandler for NullSink {
    #[inline]
    fn add_line(&mut self, _line: &str, _linefeed: bool) {}

    #[inline]
    fn page_break(&mut self) {}

    #[inline]
    fn end_of_job(&mut self, _jobinfo: &str) {}
}

fn make_listing(controls: &[u8]) -> Vec<u8> {
    let mut listing = Vec::new();
    for i in 0..20_000 {
        listing.push(controls[i % controls.len()]);
        listing.extend_from_slice(format!("{:06} {}\n", i, "SOURCE TEXT ".repeat(8)).as_bytes());
    }
    listing
}

fn bench_carriage_control(c: &mut Criterion) {
    let asa = make_listing(b"1     0  -   +");
    let cdc = make_listing(b"1  4 0 6 2 + 3  7 Q R");
    let text = make_listing(b" ");
    let mut group = c.benchmark_group("carriage_control");

    for (name, mode, input) in [("asa", FileMode::Asa, &asa), ("cdc", FileMode::Cdc, &cdc), ("text", FileMode::Text, &text)] {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_function(name, |b| {
            let mut sink = NullSink;
            b.iter(|| mode.scan(&mut black_box(input.as_slice()), ScannerConfig::default(), &mut sink));
        });
    }

    group.finish();
}

criterion_group!(name=carriage_control; config=Criterion::default().with_plots(); targets=bench_carriage_control);
criterion_main!(carriage_control);
