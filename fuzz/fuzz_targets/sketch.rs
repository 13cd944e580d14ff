#![no_main]

use libfuzzer_sys::fuzz_target;
use similarity_estimator::SimilaritySketch;
use wyhash::wyhash;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let split_index = wyhash(data, 0) as usize % data.len();
    let (first_half, second_half) = data.split_at(split_index);

    let mut left = SimilaritySketch::new(10, 32).unwrap();
    for chunk in first_half.chunks(4) {
        left.offer(&chunk);
        assert!(left.sample().len() <= left.sample_capacity());
    }

    let mut right = SimilaritySketch::new(10, 32).unwrap();
    for chunk in second_half.chunks(4) {
        right.offer(&chunk);
        assert!(right.sample().len() <= right.sample_capacity());
    }

    let jaccard = SimilaritySketch::jaccard_index(&[&left, &right]);
    assert!((0.0..=1.0).contains(&jaccard));

    let merged = left.merge(&[&right]).unwrap();
    assert!(merged.cardinality() >= left.cardinality().max(right.cardinality()) / 2);

    let intersection = SimilaritySketch::intersect(&[&left, &right]).unwrap();
    assert!(intersection <= merged.cardinality().max(1) * 2);
});
