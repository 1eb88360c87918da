//! ## Bucket array
//! Owns the HyperLogLog registers of a sketch: `m = 2^p` buckets, each holding the maximum rank
//! routed to it so far (`0` while no value reached the bucket). Buckets only grow, through
//! [`BucketArray::update`] and the merge family, so two arrays of equal precision always combine
//! into the array of the union of their streams.

use std::fmt::{Debug, Formatter};
use std::mem::{size_of, size_of_val};

use tracing::warn;

use crate::bias::{alpha, validate_precision};
use crate::error::{Result, Shape, SketchError};
use crate::hash::max_rank;

/// Number of buckets processed per merge step, smallest bucket count is a multiple of it.
const LANES: usize = 16;

/// HyperLogLog registers of a single sketch
#[derive(Clone, PartialEq, Eq)]
pub struct BucketArray {
    precision: u8,
    buckets: Vec<u8>,
}

impl BucketArray {
    /// Create empty bucket array, fails for unsupported `precision`.
    pub fn new(precision: u8) -> Result<Self> {
        validate_precision(precision)?;
        Ok(Self::empty(precision))
    }

    /// Create empty bucket array for an already validated `precision`.
    #[inline]
    pub(crate) fn empty(precision: u8) -> Self {
        Self {
            precision,
            buckets: vec![0; 1 << precision],
        }
    }

    /// Restore bucket array from its persisted parts.
    pub fn from_parts(precision: u8, buckets: Vec<u8>) -> Result<Self> {
        validate_precision(precision)?;
        let expected = 1usize << precision;
        if buckets.len() != expected {
            return Err(SketchError::InvalidBuckets {
                expected,
                actual: buckets.len(),
            });
        }
        let max = max_rank(precision);
        if let Some((bucket, &rank)) = buckets.iter().enumerate().find(|&(_, &r)| r > max) {
            return Err(SketchError::InvalidRank { bucket, rank, max });
        }
        Ok(Self { precision, buckets })
    }

    #[inline]
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Number of buckets `m`
    #[inline]
    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Bias correction constant for this array's precision
    #[inline]
    pub fn alpha(&self) -> f64 {
        alpha(self.precision)
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        Shape {
            precision: self.precision,
            num_buckets: self.buckets.len(),
            sample_capacity: None,
        }
    }

    /// Whether `other` has the same precision (and therefore bucket count and alpha)
    #[inline]
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.precision == other.precision && self.buckets.len() == other.buckets.len()
    }

    /// Return `IncompatibleSketch` error unless `other` can be merged with `self`.
    pub fn check_compatible(&self, other: &Self) -> Result<()> {
        if self.is_compatible(other) {
            return Ok(());
        }
        warn!(lhs = %self.shape(), rhs = %other.shape(), "incompatible bucket arrays");
        Err(SketchError::IncompatibleSketch {
            lhs: self.shape(),
            rhs: other.shape(),
        })
    }

    /// Raise `bucket` to `rank` if it holds a lower rank.
    ///
    /// Fails without touching any bucket when `bucket` is out of range or `rank` exceeds the
    /// maximum rank of this precision.
    pub fn update(&mut self, bucket: usize, rank: u8) -> Result<()> {
        let num_buckets = self.buckets.len();
        if bucket >= num_buckets {
            return Err(SketchError::InvalidBucket {
                bucket,
                num_buckets,
            });
        }
        let max = max_rank(self.precision);
        if rank > max {
            return Err(SketchError::InvalidRank { bucket, rank, max });
        }
        self.raise(bucket, rank);
        Ok(())
    }

    /// Raise `bucket` to `rank`, both produced by a router of the same precision.
    #[inline]
    pub(crate) fn raise(&mut self, bucket: usize, rank: u8) {
        let current = &mut self.buckets[bucket];
        if rank > *current {
            *current = rank;
        }
    }

    /// Rank stored in `bucket`
    #[inline]
    pub fn get(&self, bucket: usize) -> u8 {
        self.buckets[bucket]
    }

    /// Return new array holding the per-bucket maximum of `self` and `other`.
    pub fn merge(&self, other: &Self) -> Result<Self> {
        let mut merged = self.clone();
        merged.merge_from(other)?;
        Ok(merged)
    }

    /// Raise every bucket of `self` to the matching bucket of `other`.
    ///
    /// `self` is left untouched when the arrays are incompatible.
    pub fn merge_from(&mut self, other: &Self) -> Result<()> {
        self.check_compatible(other)?;
        max_in_place(&mut self.buckets, &other.buckets);
        Ok(())
    }

    /// Number of buckets no value was routed to yet
    #[inline]
    pub fn count_zero_buckets(&self) -> usize {
        self.buckets.iter().filter(|&&r| r == 0).count()
    }

    /// Sum of `2^-rank` over all buckets
    #[inline]
    pub fn harmonic_sum(&self) -> f64 {
        self.buckets
            .iter()
            .map(|&r| 2f64.powi(-i32::from(r)))
            .sum()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buckets
    }

    #[inline]
    pub fn into_vec(self) -> Vec<u8> {
        self.buckets
    }

    /// Memory size of the bucket array
    #[inline]
    pub fn size_of(&self) -> usize {
        size_of::<Self>() + size_of_val(self.buckets.as_slice())
    }
}

impl Debug for BucketArray {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ precision: {}, zeros: {}, size: {} }}",
            self.precision,
            self.count_zero_buckets(),
            self.size_of()
        )
    }
}

/// Per-bucket maximum of two equally sized slices, in `LANES` wide steps so it auto-vectorizes.
#[inline]
pub(crate) fn max_in_place(lhs: &mut [u8], rhs: &[u8]) {
    debug_assert_eq!(lhs.len(), rhs.len());
    debug_assert_eq!(lhs.len() % LANES, 0);
    for (l, r) in lhs.chunks_exact_mut(LANES).zip(rhs.chunks_exact(LANES)) {
        for (a, &b) in l.iter_mut().zip(r) {
            *a = (*a).max(b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn array_with(precision: u8, ranks: &[(usize, u8)]) -> BucketArray {
        let mut array = BucketArray::new(precision).unwrap();
        for &(bucket, rank) in ranks {
            array.update(bucket, rank).unwrap();
        }
        array
    }

    #[test_case(4 => 16)]
    #[test_case(12 => 4096)]
    #[test_case(18 => 262_144)]
    fn test_new(precision: u8) -> usize {
        let array = BucketArray::new(precision).unwrap();
        assert_eq!(array.count_zero_buckets(), array.num_buckets());
        array.num_buckets()
    }

    #[test_case(3)]
    #[test_case(19)]
    fn test_new_invalid_precision(precision: u8) {
        assert!(matches!(
            BucketArray::new(precision),
            Err(SketchError::InvalidPrecision { .. })
        ));
    }

    #[test]
    fn test_update_keeps_maximum() {
        let mut array = array_with(4, &[(3, 5), (3, 2)]);
        assert_eq!(array.get(3), 5);
        array.update(3, 7).unwrap();
        assert_eq!(array.get(3), 7);
        assert_eq!(array.count_zero_buckets(), 15);
    }

    #[test_case(16, 1 => SketchError::InvalidBucket { bucket: 16, num_buckets: 16 }; "bucket out of range")]
    #[test_case(0, 62 => SketchError::InvalidRank { bucket: 0, rank: 62, max: 61 }; "rank above maximum")]
    #[test_case(0, 200 => SketchError::InvalidRank { bucket: 0, rank: 200, max: 61 }; "rank far above maximum")]
    fn test_update_rejects_invalid_input(bucket: usize, rank: u8) -> SketchError {
        let mut array = array_with(4, &[(0, 3)]);
        let err = array.update(bucket, rank).unwrap_err();
        assert_eq!(array, array_with(4, &[(0, 3)]));
        // the array still restores from its own parts
        let restored = BucketArray::from_parts(4, array.as_slice().to_vec()).unwrap();
        assert_eq!(restored, array);
        err
    }

    #[test]
    fn test_update_accepts_maximum_rank() {
        let mut array = BucketArray::new(4).unwrap();
        array.update(15, max_rank(4)).unwrap();
        assert_eq!(array.get(15), 61);
    }

    #[test]
    fn test_update_is_idempotent() {
        let once = array_with(6, &[(1, 3), (40, 9)]);
        let twice = array_with(6, &[(1, 3), (40, 9), (1, 3), (40, 9)]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge() {
        let lhs = array_with(4, &[(0, 1), (1, 5), (2, 3)]);
        let rhs = array_with(4, &[(1, 2), (2, 4), (15, 6)]);
        let merged = lhs.merge(&rhs).unwrap();
        assert_eq!(&merged.as_slice()[..3], &[1, 5, 4]);
        assert_eq!(merged.get(15), 6);
        assert_eq!(merged.count_zero_buckets(), 12);
        // inputs are untouched
        assert_eq!(lhs.get(2), 3);
        assert_eq!(rhs.get(1), 2);
    }

    #[test]
    fn test_merge_is_commutative_and_associative() {
        let a = array_with(5, &[(0, 3), (7, 1), (31, 2)]);
        let b = array_with(5, &[(0, 1), (8, 4), (31, 5)]);
        let c = array_with(5, &[(7, 6), (9, 2)]);
        assert_eq!(a.merge(&b).unwrap(), b.merge(&a).unwrap());
        assert_eq!(
            a.merge(&b).unwrap().merge(&c).unwrap(),
            a.merge(&b.merge(&c).unwrap()).unwrap()
        );
    }

    #[test]
    fn test_merge_incompatible() {
        let mut lhs = array_with(4, &[(0, 1)]);
        let rhs = array_with(5, &[(0, 2)]);
        let err = lhs.merge_from(&rhs).unwrap_err();
        assert!(matches!(err, SketchError::IncompatibleSketch { .. }));
        assert_eq!(lhs.get(0), 1);
    }

    #[test]
    fn test_harmonic_sum() {
        let array = array_with(4, &[(0, 1), (1, 2)]);
        assert_eq!(array.harmonic_sum(), 14.0 + 0.5 + 0.25);
    }

    #[test]
    fn test_from_parts() {
        let array = BucketArray::from_parts(4, vec![1; 16]).unwrap();
        assert_eq!(array.count_zero_buckets(), 0);

        assert_eq!(
            BucketArray::from_parts(4, vec![0; 15]),
            Err(SketchError::InvalidBuckets {
                expected: 16,
                actual: 15
            })
        );

        let mut buckets = vec![0; 16];
        buckets[9] = 62;
        assert_eq!(
            BucketArray::from_parts(4, buckets),
            Err(SketchError::InvalidRank {
                bucket: 9,
                rank: 62,
                max: 61
            })
        );
    }

    #[test]
    fn test_debug() {
        let array = array_with(4, &[(0, 1)]);
        assert_eq!(format!("{:?}", array), "{ precision: 4, zeros: 15, size: 48 }");
    }
}
