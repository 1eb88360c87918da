#![no_main]

use cardinality_similarity::{union, CardinalityEstimator};
use libfuzzer_sys::fuzz_target;
use wyhash::wyhash;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let split_index = wyhash(data, 0) as usize % data.len();
    let (first_half, second_half) = data.split_at(split_index);
    let precision = 4 + data[0] % 15;

    let mut estimator1 = CardinalityEstimator::<[u8]>::new(precision).unwrap();
    for chunk in first_half.chunks(4) {
        estimator1.insert(chunk);
        assert!(estimator1.estimate() > 0);
        assert!(estimator1.size_of() > 0);
    }

    let mut estimator2 = CardinalityEstimator::<[u8]>::new(precision).unwrap();
    for chunk in second_half.chunks(4) {
        estimator2.insert(chunk);
        assert!(estimator2.estimate() > 0);
    }

    let merged = union(&estimator1, [&estimator2]).unwrap();
    estimator1.merge(&estimator2).unwrap();
    assert_eq!(estimator1, merged);
});
