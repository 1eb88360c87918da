//! ## Union
//! Cardinality of the union of several streams, estimated from the per-bucket maximum of their
//! bucket arrays. Every input is checked against the first one before any bucket is combined, so
//! an incompatible input never leaves a partially merged result behind.

use std::hash::{Hash, Hasher};

use tracing::debug;

use crate::error::Result;
use crate::estimate::Estimate;
use crate::estimator::CardinalityEstimator;
use crate::hyperloglog::{max_in_place, BucketArray};

/// Per-bucket maximum of `first` and every array of `rest`.
pub fn merge_buckets<'a, I>(first: &BucketArray, rest: I) -> Result<BucketArray>
where
    I: IntoIterator<Item = &'a BucketArray>,
{
    let rest: Vec<&BucketArray> = rest.into_iter().collect();
    for other in &rest {
        first.check_compatible(other)?;
    }

    let precision = first.precision();
    let mut buckets = first.as_slice().to_vec();
    for other in &rest {
        max_in_place(&mut buckets, other.as_slice());
    }
    debug!(precision, inputs = rest.len() + 1, "merged bucket arrays");

    BucketArray::from_parts(precision, buckets)
}

/// Estimate of the union of `first` and every array of `rest`.
pub fn union_estimate<'a, I>(first: &BucketArray, rest: I) -> Result<Estimate>
where
    I: IntoIterator<Item = &'a BucketArray>,
{
    merge_buckets(first, rest).map(|merged| Estimate::from_buckets(&merged))
}

/// Estimator of the union of `first` and every estimator of `rest`.
pub fn union<'a, T, H, I>(
    first: &CardinalityEstimator<T, H>,
    rest: I,
) -> Result<CardinalityEstimator<T, H>>
where
    T: Hash + ?Sized + 'a,
    H: Hasher + Default + 'a,
    I: IntoIterator<Item = &'a CardinalityEstimator<T, H>>,
{
    let buckets = merge_buckets(first.buckets(), rest.into_iter().map(|e| e.buckets()))?;
    Ok(CardinalityEstimator::from_buckets(buckets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SketchError;
    use test_case::test_case;

    fn estimator(precision: u8, items: std::ops::Range<usize>) -> CardinalityEstimator<usize> {
        let mut e = CardinalityEstimator::new(precision).unwrap();
        for i in items {
            e.insert(&i);
        }
        e
    }

    #[test]
    fn test_union_of_single_sketch() {
        let a = estimator(12, 0..1_000);
        let none: [&CardinalityEstimator<usize>; 0] = [];
        assert_eq!(union(&a, none).unwrap(), a);
        let none: [&BucketArray; 0] = [];
        assert_eq!(
            union_estimate(a.buckets(), none).unwrap(),
            a.estimate_detail()
        );
    }

    #[test]
    fn test_union_is_order_independent() {
        let a = estimator(10, 0..3_000);
        let b = estimator(10, 2_000..6_000);
        let c = estimator(10, 5_000..9_000);

        let abc = union(&a, [&b, &c]).unwrap();
        let cab = union(&c, [&a, &b]).unwrap();
        let nested = union(&union(&a, [&b]).unwrap(), [&c]).unwrap();
        assert_eq!(abc, cab);
        assert_eq!(abc, nested);
        assert_eq!(abc, estimator(10, 0..9_000));
    }

    #[test]
    fn test_union_leaves_inputs_untouched() {
        let a = estimator(8, 0..100);
        let b = estimator(8, 100..200);
        let (a_before, b_before) = (a.clone(), b.clone());
        union(&a, [&b]).unwrap();
        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
    }

    #[test_case(12, 12, 14)]
    #[test_case(12, 10, 12)]
    fn test_union_incompatible(first: u8, second: u8, third: u8) {
        let a = estimator(first, 0..10);
        let b = estimator(second, 0..10);
        let c = estimator(third, 0..10);
        assert!(matches!(
            union(&a, [&b, &c]),
            Err(SketchError::IncompatibleSketch { .. })
        ));
        assert!(merge_buckets(a.buckets(), [b.buckets(), c.buckets()]).is_err());
    }
}
