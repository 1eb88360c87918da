//! ## Similarity sketch
//! Composite sketch of a stream: a [`CardinalityEstimator`] and a [`BoundedMinSample`] fed the
//! same hash of every inserted value. Two similarity sketches with equal precision and sample
//! capacity estimate the Jaccard index of their streams from the samples and the size of the
//! intersection as `jaccard * |A ∪ B|`, where the union comes from the merged buckets.
//!
//! # Example
//! ```
//! use cardinality_similarity::{SimilaritySketch, SketchConfig};
//!
//! let config = SketchConfig::default().with_precision(14).with_sample_capacity(512);
//! let mut a = SimilaritySketch::<usize>::new(&config).unwrap();
//! let mut b = SimilaritySketch::<usize>::new(&config).unwrap();
//! for i in 0..10_000 {
//!     a.insert(&i);
//!     b.insert(&(i + 5_000));
//! }
//! let intersection = a.intersect(&b).unwrap();
//! assert!((3_500..6_500).contains(&intersection));
//! ```

use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::mem::size_of;

use tracing::{debug, warn};
use wyhash::WyHash;

use crate::config::SketchConfig;
use crate::error::{Result, Shape, SketchError};
use crate::estimator::CardinalityEstimator;
use crate::minhash::BoundedMinSample;

/// Lower bound of the Jaccard index used for intersection estimates
pub const MIN_JACCARD: f64 = 1e-6;

/// Cardinality sketch carrying a bottom-k sample for similarity estimates
pub struct SimilaritySketch<T: Hash + ?Sized = usize, H: Hasher + Default = WyHash> {
    estimator: CardinalityEstimator<T, H>,
    sample: BoundedMinSample,
}

impl<T: Hash + ?Sized, H: Hasher + Default> SimilaritySketch<T, H> {
    /// Create new sketch from `config`, fails on unsupported precision or zero sample capacity.
    pub fn new(config: &SketchConfig) -> Result<Self> {
        config.validate()?;
        Self::with_params(config.precision, config.sample_capacity)
    }

    /// Create new sketch with precision `p` and sample capacity `k`.
    pub fn with_params(precision: u8, sample_capacity: usize) -> Result<Self> {
        let sketch = Self {
            estimator: CardinalityEstimator::new(precision)?,
            sample: BoundedMinSample::new(sample_capacity)?,
        };
        debug!(precision, sample_capacity, "new similarity sketch");
        Ok(sketch)
    }

    /// Create sketch from already validated parts.
    pub fn from_parts(estimator: CardinalityEstimator<T, H>, sample: BoundedMinSample) -> Self {
        Self { estimator, sample }
    }

    /// Insert a hashable item into both the buckets and the sample
    #[inline]
    pub fn insert(&mut self, item: &T) {
        self.insert_hash(CardinalityEstimator::<T, H>::hash(item));
    }

    #[inline]
    pub fn insert_hash(&mut self, hash: u64) {
        self.estimator.insert_hash(hash);
        self.sample.add(hash);
    }

    /// Return cardinality estimate of this stream
    #[inline]
    pub fn estimate(&self) -> usize {
        self.estimator.estimate()
    }

    #[inline]
    pub fn estimator(&self) -> &CardinalityEstimator<T, H> {
        &self.estimator
    }

    #[inline]
    pub fn sample(&self) -> &BoundedMinSample {
        &self.sample
    }

    #[inline]
    pub fn precision(&self) -> u8 {
        self.estimator.precision()
    }

    #[inline]
    pub fn sample_capacity(&self) -> usize {
        self.sample.capacity()
    }

    pub fn shape(&self) -> Shape {
        Shape {
            sample_capacity: Some(self.sample.capacity()),
            ..self.estimator.shape()
        }
    }

    /// Whether both sketches have equal precision and sample capacity
    #[inline]
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.estimator.is_compatible(&other.estimator) && self.sample.is_compatible(&other.sample)
    }

    pub fn check_compatible(&self, other: &Self) -> Result<()> {
        if self.is_compatible(other) {
            return Ok(());
        }
        warn!(lhs = %self.shape(), rhs = %other.shape(), "incompatible similarity sketches");
        Err(SketchError::IncompatibleSketch {
            lhs: self.shape(),
            rhs: other.shape(),
        })
    }

    /// Estimate the Jaccard index of both streams, never below [`MIN_JACCARD`].
    pub fn jaccard(&self, other: &Self) -> Result<f64> {
        self.check_compatible(other)?;
        let jaccard = self.sample.jaccard(&other.sample)?;
        Ok(jaccard.max(MIN_JACCARD))
    }

    /// Estimate cardinality of the union of both streams.
    pub fn union_estimate(&self, other: &Self) -> Result<usize> {
        self.check_compatible(other)?;
        self.estimator.union_estimate(&[&other.estimator])
    }

    /// Estimate cardinality of the intersection of both streams.
    pub fn intersect(&self, other: &Self) -> Result<usize> {
        let jaccard = self.jaccard(other)?;
        let union = self.union_estimate(other)?;
        let intersection = jaccard * union as f64;
        debug!(jaccard, union, intersection, "intersect");
        Ok((intersection + 0.5) as usize)
    }

    /// Merge `rhs` into `self`, fails when precisions or sample capacities differ.
    pub fn merge(&mut self, rhs: &Self) -> Result<()> {
        self.check_compatible(rhs)?;
        self.estimator.merge(&rhs.estimator)?;
        self.sample.merge(&rhs.sample)
    }

    /// Return memory size of `SimilaritySketch`
    pub fn size_of(&self) -> usize {
        size_of::<Self>() - size_of::<CardinalityEstimator<T, H>>() - size_of::<BoundedMinSample>()
            + self.estimator.size_of()
            + self.sample.size_of()
    }
}

impl<T: Hash + ?Sized, H: Hasher + Default> Clone for SimilaritySketch<T, H> {
    fn clone(&self) -> Self {
        Self {
            estimator: self.estimator.clone(),
            sample: self.sample.clone(),
        }
    }
}

impl<T: Hash + ?Sized, H: Hasher + Default> PartialEq for SimilaritySketch<T, H> {
    fn eq(&self, other: &Self) -> bool {
        self.estimator == other.estimator && self.sample == other.sample
    }
}

impl<T: Hash + ?Sized, H: Hasher + Default> Debug for SimilaritySketch<T, H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ precision: {}, estimate: {}, sample: {}/{}, size: {} }}",
            self.precision(),
            self.estimate(),
            self.sample.len(),
            self.sample.capacity(),
            self.size_of()
        )
    }
}
