//! Escaping and URL parsing benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use slp_core::{escape, unescape, Attributes, ServiceUrl};

fn escape_benchmark(c: &mut Criterion) {
    let input = "(location=Building 4, Floor 2),color!=mono~draft";

    c.bench_function("escape_value", |b| {
        b.iter(|| black_box(escape(black_box(input), false)))
    });

    c.bench_function("escape_tag", |b| {
        b.iter(|| black_box(escape(black_box(input), true)))
    });
}

fn unescape_benchmark(c: &mut Criterion) {
    let escaped = escape("(location=Building 4, Floor 2),color!=mono~draft", true);

    c.bench_function("unescape", |b| {
        b.iter(|| black_box(unescape(black_box(&escaped), true).unwrap()))
    });
}

fn url_benchmark(c: &mut Criterion) {
    c.bench_function("parse_service_url", |b| {
        b.iter(|| {
            black_box(
                ServiceUrl::parse(black_box("service:printer:lpr://printer.example.com:515/queue1"))
                    .unwrap(),
            )
        })
    });
}

fn attributes_benchmark(c: &mut Criterion) {
    let attrs: Attributes = (0..16)
        .map(|i| (format!("attr{}", i), format!("value{}", i)))
        .collect();

    c.bench_function("encode_attributes", |b| {
        b.iter(|| black_box(attrs.encode()))
    });
}

criterion_group!(
    benches,
    escape_benchmark,
    unescape_benchmark,
    url_benchmark,
    attributes_benchmark
);
criterion_main!(benches);
