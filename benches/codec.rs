#![allow(missing_docs)]

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use packtree::{read_binary, write_binary, Packable};
use serde::{Deserialize, Serialize};
use std::hint::black_box;

// --- SETUP ---

#[derive(Packable, Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
struct Sample {
    id: u64,
    label: String,
    readings: Vec<f64>,
    flags: Vec<bool>,
}

fn make_samples(count: usize) -> Vec<Sample> {
    (0..count)
        .map(|i| Sample {
            id: i as u64,
            label: format!("sample_{i}"),
            readings: (0..32).map(|j| (i * j) as f64 * 0.5).collect(),
            flags: (0..8).map(|j| j % 3 == 0).collect(),
        })
        .collect()
}

fn bench_write(c: &mut Criterion) {
    let samples = make_samples(1_000);
    let bytes = write_binary(&samples).expect("encode");

    let mut group = c.benchmark_group("write");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("packtree_binary", |b| {
        b.iter(|| write_binary(black_box(&samples)).expect("encode"))
    });
    group.bench_function("bincode_baseline", |b| {
        b.iter(|| {
            bincode::serde::encode_to_vec(black_box(&samples), bincode::config::standard())
                .expect("encode")
        })
    });
    group.finish();
}

fn bench_read(c: &mut Criterion) {
    let samples = make_samples(1_000);
    let ours = write_binary(&samples).expect("encode");
    let baseline =
        bincode::serde::encode_to_vec(&samples, bincode::config::standard()).expect("encode");

    let mut group = c.benchmark_group("read");
    group.throughput(Throughput::Bytes(ours.len() as u64));
    group.bench_function("packtree_binary", |b| {
        b.iter(|| {
            let back: Vec<Sample> = read_binary(black_box(&ours)).expect("decode");
            back
        })
    });
    group.bench_function("bincode_baseline", |b| {
        b.iter(|| {
            let (back, _): (Vec<Sample>, usize) = bincode::serde::decode_from_slice(
                black_box(&baseline),
                bincode::config::standard(),
            )
            .expect("decode");
            back
        })
    });
    group.finish();
}

criterion_group!(benches, bench_write, bench_read);
criterion_main!(benches);
