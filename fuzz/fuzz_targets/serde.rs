#![no_main]

use cardinality_similarity::{CardinalityEstimator, SimilaritySketch};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut estimator) = serde_json::from_slice::<CardinalityEstimator<usize>>(data) {
        estimator.insert(&1);
        assert!(estimator.estimate() > 0);
    }
    if let Ok(mut sketch) = serde_json::from_slice::<SimilaritySketch<usize>>(data) {
        sketch.insert(&1);
        assert!(sketch.sample().len() <= sketch.sample_capacity());
        assert_eq!(sketch.intersect(&sketch).unwrap(), sketch.estimate());
    }
});
