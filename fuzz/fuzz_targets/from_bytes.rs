#![no_main]

use libfuzzer_sys::fuzz_target;
use similarity_estimator::{HyperLogLog, SimilaritySketch};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must decode cleanly or fail cleanly, never panic and
    // never produce an object violating its own invariants.
    if let Ok(estimator) = HyperLogLog::from_bytes(data) {
        let _ = estimator.cardinality();
    }

    for compressed in [false, true] {
        if let Ok(sketch) = SimilaritySketch::from_bytes(data, compressed) {
            assert!(sketch.sample().len() <= sketch.sample_capacity());
            let _ = sketch.cardinality();

            let bytes = sketch.to_bytes(compressed).unwrap();
            let reloaded = SimilaritySketch::from_bytes(&bytes, compressed).unwrap();
            assert_eq!(reloaded, sketch);
        }
    }
});
