#![no_main]

use cardinality_similarity::SimilaritySketch;
use libfuzzer_sys::fuzz_target;
use wyhash::wyhash;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let precision = 4 + data[0] % 15;
    let capacity = 1 + usize::from(data[1]);
    let split_index = wyhash(data, 0) as usize % data.len();
    let (first_half, second_half) = data.split_at(split_index);

    let mut lhs = SimilaritySketch::<[u8]>::with_params(precision, capacity).unwrap();
    for chunk in first_half.chunks(3) {
        lhs.insert(chunk);
    }
    let mut rhs = SimilaritySketch::<[u8]>::with_params(precision, capacity).unwrap();
    for chunk in second_half.chunks(3) {
        rhs.insert(chunk);
    }

    let jaccard = lhs.jaccard(&rhs).unwrap();
    assert!((0.0..=1.0).contains(&jaccard));
    assert!(lhs.intersect(&rhs).unwrap() <= lhs.union_estimate(&rhs).unwrap());
    assert_eq!(lhs.intersect(&lhs).unwrap(), lhs.estimate());
    assert!(lhs.sample().len() <= capacity);
});
