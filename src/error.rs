//! Errors surfaced by sketch construction, restoration and combination.

use thiserror::Error;

/// Sketch error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SketchError {
    #[error("invalid precision {precision}: expected a value in [{min}..={max}]")]
    InvalidPrecision { precision: u8, min: u8, max: u8 },

    #[error(
        "invalid sample capacity {capacity}: expected a value in [1..={}]",
        crate::minhash::MAX_SAMPLE_CAPACITY
    )]
    InvalidSampleCapacity { capacity: usize },

    #[error("invalid bucket {bucket}: sketch has {num_buckets} buckets")]
    InvalidBucket { bucket: usize, num_buckets: usize },

    #[error("incompatible sketches: {lhs} vs {rhs}")]
    IncompatibleSketch { lhs: Shape, rhs: Shape },

    #[error("invalid bucket array: expected {expected} buckets, got {actual}")]
    InvalidBuckets { expected: usize, actual: usize },

    #[error("invalid rank {rank} in bucket {bucket}: maximum for this precision is {max}")]
    InvalidRank { bucket: usize, rank: u8, max: u8 },

    #[error("invalid sample: {len} values exceed capacity {capacity}")]
    InvalidSample { len: usize, capacity: usize },
}

/// Parameters that decide whether two sketches can be combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    /// Precision of the bucket array, `0` for bare samples
    pub precision: u8,
    /// Number of buckets, `0` for bare samples
    pub num_buckets: usize,
    /// Bottom-k sample capacity, `None` for plain cardinality sketches.
    pub sample_capacity: Option<usize>,
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut fields = Vec::with_capacity(3);
        if self.num_buckets > 0 {
            fields.push(format!("precision: {}", self.precision));
            fields.push(format!("buckets: {}", self.num_buckets));
        }
        if let Some(k) = self.sample_capacity {
            fields.push(format!("sample capacity: {}", k));
        }
        write!(f, "{{ {} }}", fields.join(", "))
    }
}

pub type Result<T> = std::result::Result<T, SketchError>;
