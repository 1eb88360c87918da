//! `cardinality-similarity` is a Rust crate designed to estimate the number of distinct elements in
//! a stream or dataset, and the overlap of two such streams, in an efficient manner.
//!
//! Distinct counts use HyperLogLog++ with empirical bias correction and linear counting for small
//! cardinalities. Sketches of equal precision merge by per-bucket maximum, which estimates the
//! union of their streams. A [`SimilaritySketch`] additionally carries a bottom-k MinHash sample,
//! from which the Jaccard index and the size of the intersection of two streams are estimated.
//!
//! ```
//! use cardinality_similarity::CardinalityEstimator;
//!
//! let mut estimator = CardinalityEstimator::<str>::new(12).unwrap();
//! estimator.insert("foo");
//! estimator.insert("bar");
//! estimator.insert("foo");
//! assert_eq!(estimator.estimate(), 2);
//! ```
pub mod bias;
pub mod config;
pub mod error;
pub mod estimate;
pub mod estimator;
pub mod hash;
pub mod hyperloglog;
pub mod minhash;
#[cfg(feature = "with_serde")]
mod serde;
pub mod similarity;
pub mod union;

pub use config::SketchConfig;
pub use error::{Result, Shape, SketchError};
pub use estimate::{Estimate, EstimateBranch};
pub use estimator::CardinalityEstimator;
pub use hash::HashRouter;
pub use hyperloglog::BucketArray;
pub use minhash::BoundedMinSample;
pub use similarity::SimilaritySketch;
pub use union::{merge_buckets, union, union_estimate};
