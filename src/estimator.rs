//! Cardinality estimator allows to estimate number of distinct elements
//! in the stream or dataset and is defined with a runtime precision `p`
//! in [4..18] range, which defines number of bits used for bucket indices.
//!
//! # Data-structure design rationale
//!
//! ## Memory footprint
//! One `u8` bucket per index, `2^p` bytes in total, fixed for the lifetime of the estimator:
//! - P = 10: 1 KiB
//! - P = 12: 4 KiB
//! - P = 16: 64 KiB
//! - P = 18: 256 KiB
//!
//! ## Accuracy
//! HyperLogLog++ estimate with empirical bias correction below `5m` and linear counting for small
//! cardinalities (see [`crate::estimate`]). Expected error is `1.04 / sqrt(2^p)`.
//!
//! ## Merging
//! Estimators with equal precision and hasher merge by per-bucket maximum, which is the estimator
//! of the union of both streams. Merging validates compatibility before touching any bucket.
//!
//! ## Concurrency
//! `insert` takes `&mut self`, a single owner feeds the estimator or wraps it in a lock.
//! `estimate` only reads buckets, so shared references can estimate concurrently.

use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::mem::size_of;

use tracing::debug;
use wyhash::WyHash;

use crate::config::{SketchConfig, DEFAULT_PRECISION};
use crate::error::{Result, Shape};
use crate::estimate::Estimate;
use crate::hash::{hash_item, HashRouter};
use crate::hyperloglog::BucketArray;

/// HyperLogLog++ cardinality estimator of a stream of `T` hashed with `H`
pub struct CardinalityEstimator<T: Hash + ?Sized = usize, H: Hasher + Default = WyHash> {
    buckets: BucketArray,
    router: HashRouter,
    _marker: PhantomData<(fn(&T), H)>,
}

impl<T: Hash + ?Sized, H: Hasher + Default> CardinalityEstimator<T, H> {
    /// Create new estimator with precision `p`, fails when `p` is outside [4..18].
    pub fn new(precision: u8) -> Result<Self> {
        let buckets = BucketArray::new(precision)?;
        debug!(precision, "new cardinality estimator");
        Ok(Self::from_buckets(buckets))
    }

    /// Create new estimator with the precision of `config`.
    pub fn with_config(config: &SketchConfig) -> Result<Self> {
        Self::new(config.precision)
    }

    /// Create estimator continuing from existing `buckets`.
    pub fn from_buckets(buckets: BucketArray) -> Self {
        Self {
            router: HashRouter::new(buckets.precision()),
            buckets,
            _marker: PhantomData,
        }
    }

    /// Insert a hashable item into `CardinalityEstimator`
    #[inline]
    pub fn insert(&mut self, item: &T) {
        self.insert_hash(Self::hash(item));
    }

    /// Hash `item` the way `insert` does
    #[inline]
    pub fn hash(item: &T) -> u64 {
        hash_item::<T, H>(item)
    }

    /// Insert hash into `CardinalityEstimator`
    #[inline]
    pub fn insert_hash(&mut self, hash: u64) {
        let (bucket, rank) = self.router.route(hash);
        self.buckets.raise(bucket, rank);
    }

    /// Return cardinality estimate
    #[inline]
    pub fn estimate(&self) -> usize {
        self.estimate_detail().value()
    }

    /// Return cardinality estimate together with its intermediate values
    pub fn estimate_detail(&self) -> Estimate {
        Estimate::from_buckets(&self.buckets)
    }

    /// Merge `rhs` into `self`, fails when precisions differ.
    pub fn merge(&mut self, rhs: &Self) -> Result<()> {
        self.buckets.merge_from(&rhs.buckets)?;
        debug!(precision = self.precision(), "merged cardinality estimator");
        Ok(())
    }

    /// Estimate cardinality of the union of `self` and `others` without modifying any of them.
    pub fn union_estimate(&self, others: &[&Self]) -> Result<usize> {
        let merged = crate::union::merge_buckets(
            &self.buckets,
            others.iter().map(|other| &other.buckets),
        )?;
        Ok(Estimate::from_buckets(&merged).value())
    }

    #[inline]
    pub fn precision(&self) -> u8 {
        self.buckets.precision()
    }

    #[inline]
    pub fn num_buckets(&self) -> usize {
        self.buckets.num_buckets()
    }

    #[inline]
    pub fn buckets(&self) -> &BucketArray {
        &self.buckets
    }

    #[inline]
    pub fn into_buckets(self) -> BucketArray {
        self.buckets
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.buckets.shape()
    }

    #[inline]
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.buckets.is_compatible(&other.buckets)
    }

    pub fn check_compatible(&self, other: &Self) -> Result<()> {
        self.buckets.check_compatible(&other.buckets)
    }

    /// Return memory size of `CardinalityEstimator`
    pub fn size_of(&self) -> usize {
        size_of::<Self>() - size_of::<BucketArray>() + self.buckets.size_of()
    }
}

impl<T: Hash + ?Sized, H: Hasher + Default> Default for CardinalityEstimator<T, H> {
    /// Estimator with default precision
    fn default() -> Self {
        Self::from_buckets(BucketArray::empty(DEFAULT_PRECISION))
    }
}

impl<T: Hash + ?Sized, H: Hasher + Default> Clone for CardinalityEstimator<T, H> {
    fn clone(&self) -> Self {
        Self::from_buckets(self.buckets.clone())
    }
}

impl<T: Hash + ?Sized, H: Hasher + Default> PartialEq for CardinalityEstimator<T, H> {
    fn eq(&self, other: &Self) -> bool {
        self.buckets == other.buckets
    }
}

impl<T: Hash + ?Sized, H: Hasher + Default> Debug for CardinalityEstimator<T, H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ precision: {}, estimate: {}, size: {} }}",
            self.precision(),
            self.estimate(),
            self.size_of()
        )
    }
}
