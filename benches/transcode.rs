use criterion::{Criterion, black_box, criterion_group, criterion_main};
use nibrs_extract::{TranscodeOptions, Transcoder, parse_layout};
use std::fmt::Write;

fn wide_layout(fields: usize) -> String {
    let mut text = String::from("INPUT\n");
    let mut labels = String::from("LABEL\n");
    for i in 0..fields {
        let start = i * 4 + 1;
        let _ = writeln!(text, "  V{:04} $ {}-{}", i, start, start + 3);
        let _ = writeln!(labels, "  V{:04} = 'VARIABLE NUMBER {}'", i, i);
    }
    text.push_str(";\n");
    labels.push_str(";\n");
    text + &labels
}

fn bench_parse_layout(c: &mut Criterion) {
    let layout = wide_layout(400);
    c.bench_function("parse_layout_400_fields", |b| {
        b.iter(|| parse_layout(black_box(&layout)).unwrap())
    });
}

fn bench_write_csv(c: &mut Criterion) {
    let schema = parse_layout(&wide_layout(100)).unwrap();
    let transcoder = Transcoder::new(schema, TranscodeOptions::default()).unwrap();
    let line = "AB1,".repeat(100);
    let lines: Vec<String> = (0..1_000).map(|_| line.clone()).collect();

    c.bench_function("write_csv_1000x100", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(512 * 1024);
            transcoder
                .write_csv(lines.iter().cloned().map(Ok), &mut out)
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_parse_layout, bench_write_csv);
criterion_main!(benches);
