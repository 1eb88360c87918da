//! ## Bounded min sample
//! Bottom-k MinHash sketch: keeps the `k` smallest distinct hashes inserted so far. Contents do
//! not depend on arrival order, so samples of different streams can be merged and compared.
//!
//! Hashes live in a max-heap, so the largest retained hash is evicted in `O(log k)` when a smaller
//! one arrives. A membership set next to the heap keeps repeated inserts from duplicating hashes.

use std::collections::{BinaryHeap, HashSet};
use std::fmt::{Debug, Formatter};
use std::hash::BuildHasherDefault;
use std::mem::size_of;

use wyhash::WyHash;

use crate::error::{Result, Shape, SketchError};

/// Largest supported sample capacity `k`
pub const MAX_SAMPLE_CAPACITY: usize = 1 << 24;
/// Upper bound of the space reserved up front, larger samples grow as hashes arrive.
const PREALLOCATED_CAPACITY: usize = 1 << 10;

/// Check that `capacity` is in [1..=MAX_SAMPLE_CAPACITY].
pub fn validate_capacity(capacity: usize) -> Result<()> {
    if capacity == 0 || capacity > MAX_SAMPLE_CAPACITY {
        return Err(SketchError::InvalidSampleCapacity { capacity });
    }
    Ok(())
}

/// Fixed capacity sample of the smallest distinct hashes
#[derive(Clone)]
pub struct BoundedMinSample {
    capacity: usize,
    heap: BinaryHeap<u64>,
    members: HashSet<u64, BuildHasherDefault<WyHash>>,
}

impl BoundedMinSample {
    /// Create empty sample retaining at most `capacity` hashes.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_reserved(capacity, capacity)
    }

    /// Create empty sample reserving space for `reserved` hashes, at most `capacity`.
    fn with_reserved(capacity: usize, reserved: usize) -> Result<Self> {
        validate_capacity(capacity)?;
        let reserved = reserved.min(capacity).min(PREALLOCATED_CAPACITY);
        Ok(Self {
            capacity,
            heap: BinaryHeap::with_capacity(reserved),
            members: HashSet::with_capacity_and_hasher(reserved, Default::default()),
        })
    }

    /// Create sample from previously retained hashes.
    pub fn from_values<I: IntoIterator<Item = u64>>(capacity: usize, values: I) -> Result<Self> {
        let values = values.into_iter();
        let mut sample = Self::with_reserved(capacity, values.size_hint().0)?;
        for value in values {
            sample.add(value);
        }
        Ok(sample)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of retained hashes
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Whether the sample reached its capacity
    #[inline]
    pub fn is_full(&self) -> bool {
        self.heap.len() == self.capacity
    }

    #[inline]
    pub fn contains(&self, value: u64) -> bool {
        self.members.contains(&value)
    }

    /// Largest retained hash, the next one to be evicted
    #[inline]
    pub fn max(&self) -> Option<u64> {
        self.heap.peek().copied()
    }

    /// Retained hashes in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.heap.iter().copied()
    }

    /// Retained hashes in ascending order
    pub fn to_sorted_vec(&self) -> Vec<u64> {
        let mut values: Vec<u64> = self.heap.iter().copied().collect();
        values.sort_unstable();
        values
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        Shape {
            precision: 0,
            num_buckets: 0,
            sample_capacity: Some(self.capacity),
        }
    }

    /// Insert `value`, returns whether it is retained.
    ///
    /// Values already present are ignored. Once full, `value` replaces the current maximum only
    /// when it is smaller.
    pub fn add(&mut self, value: u64) -> bool {
        if self.members.contains(&value) {
            return false;
        }
        if self.heap.len() < self.capacity {
            self.heap.push(value);
            self.members.insert(value);
            return true;
        }
        match self.heap.peek_mut() {
            Some(mut top) if value < *top => {
                self.members.remove(&*top);
                self.members.insert(value);
                // sifts the new value down when `top` is dropped
                *top = value;
                true
            }
            _ => false,
        }
    }

    /// Bottom-k of the union of both samples.
    pub fn union(&self, other: &Self) -> Result<Self> {
        let mut merged = self.clone();
        merged.merge(other)?;
        Ok(merged)
    }

    /// Add every hash of `other` to `self`.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        self.check_compatible(other)?;
        for value in other.iter() {
            self.add(value);
        }
        Ok(())
    }

    /// Estimate the Jaccard index of the two sampled streams.
    ///
    /// Counts how many hashes of the bottom-k of the union are retained by both samples and
    /// divides by the size of that union sample, which is `k` unless both streams are smaller.
    /// This replaces the plain `|S_A ∩ S_B| / k` over both samples: that ratio tends to the
    /// containment of the streams rather than their Jaccard index, for example `1/2` instead of
    /// `1/3` for two streams sharing half of their values.
    /// Two empty samples have index `0`.
    pub fn jaccard(&self, other: &Self) -> Result<f64> {
        let union = self.union(other)?;
        if union.is_empty() {
            return Ok(0.0);
        }
        let overlap = union
            .iter()
            .filter(|&h| self.contains(h) && other.contains(h))
            .count();
        Ok(overlap as f64 / union.len() as f64)
    }

    #[inline]
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.capacity == other.capacity
    }

    pub fn check_compatible(&self, other: &Self) -> Result<()> {
        if self.is_compatible(other) {
            return Ok(());
        }
        Err(SketchError::IncompatibleSketch {
            lhs: self.shape(),
            rhs: other.shape(),
        })
    }

    /// Approximate memory size of the sample
    pub fn size_of(&self) -> usize {
        size_of::<Self>() + (self.heap.capacity() + self.members.capacity()) * size_of::<u64>()
    }
}

impl PartialEq for BoundedMinSample {
    fn eq(&self, other: &Self) -> bool {
        self.capacity == other.capacity && self.members == other.members
    }
}

impl Eq for BoundedMinSample {}

impl Debug for BoundedMinSample {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ capacity: {}, len: {}, max: {:?} }}",
            self.capacity,
            self.len(),
            self.max()
        )
    }
}
