use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use similarity_estimator::SimilaritySketch;

const PRECISION: u8 = 14;
const SAMPLE_CAPACITY: usize = 4096;

criterion_group!(benches, benchmark);
criterion_main!(benches);

fn sketch_of_range(range: std::ops::Range<u64>) -> SimilaritySketch {
    let mut sketch = SimilaritySketch::new(PRECISION, SAMPLE_CAPACITY).unwrap();
    for value in range {
        sketch.offer(&value);
    }
    sketch
}

fn benchmark(c: &mut Criterion) {
    let cardinalities = [1_000u64, 10_000, 100_000];

    let mut group = c.benchmark_group("offer");
    for &cardinality in &cardinalities {
        group.throughput(Throughput::Elements(cardinality));
        group.bench_with_input(
            BenchmarkId::from_parameter(cardinality),
            &cardinality,
            |b, &n| b.iter(|| black_box(sketch_of_range(0..n))),
        );
    }
    group.finish();

    let mut group = c.benchmark_group("merge");
    for &cardinality in &cardinalities {
        let left = sketch_of_range(0..cardinality);
        let right = sketch_of_range(cardinality / 2..cardinality + cardinality / 2);
        group.bench_with_input(
            BenchmarkId::from_parameter(cardinality),
            &cardinality,
            |b, _| b.iter(|| black_box(left.merge(&[&right]).unwrap())),
        );
    }
    group.finish();

    let mut group = c.benchmark_group("jaccard_index");
    for &cardinality in &cardinalities {
        let left = sketch_of_range(0..cardinality);
        let right = sketch_of_range(cardinality / 2..cardinality + cardinality / 2);
        group.bench_with_input(
            BenchmarkId::from_parameter(cardinality),
            &cardinality,
            |b, _| b.iter(|| black_box(SimilaritySketch::jaccard_index(&[&left, &right]))),
        );
    }
    group.finish();

    let mut group = c.benchmark_group("serialize");
    let sketch = sketch_of_range(0..100_000);
    for compress in [false, true] {
        group.bench_with_input(
            BenchmarkId::from_parameter(compress),
            &compress,
            |b, &compress| b.iter(|| black_box(sketch.to_bytes(compress).unwrap())),
        );
    }
    group.finish();
}
