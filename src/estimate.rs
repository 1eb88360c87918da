//! ## Cardinality estimate
//! HyperLogLog++ estimate of a bucket array, computed in four steps:
//! 1. raw estimate `E = alpha * m^2 / Σ 2^-bucket`,
//! 2. bias correction `E' = E - bias(E)` when `E <= 5m`, otherwise `E' = E`,
//! 3. linear counting `H = m * ln(m / zeros)` when any bucket is empty, otherwise `H = E'`,
//! 4. `H` when `H <= threshold(p)`, otherwise `E'`.
//!
//! Expected error is `1.04 / sqrt(m)`:
//! - P = 10: 3.25%
//! - P = 12: 1.62%
//! - P = 14: 0.81%
//! - P = 16: 0.41%
//! - P = 18: 0.20%

use tracing::trace;

use crate::bias::{bias_row, threshold};
use crate::hyperloglog::BucketArray;

/// Branch of the estimator that produced the final value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimateBranch {
    LinearCounting,
    BiasCorrected,
}

/// Intermediate values and final choice of a single estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Raw HyperLogLog estimate
    pub raw: f64,
    /// Raw estimate after bias correction
    pub corrected: f64,
    /// Linear counting estimate, equal to `corrected` when no bucket is empty
    pub linear: f64,
    /// Number of empty buckets
    pub zeros: usize,
    pub branch: EstimateBranch,
}

impl Estimate {
    /// Estimate cardinality of the stream summarized by `buckets`.
    pub fn from_buckets(buckets: &BucketArray) -> Self {
        let precision = buckets.precision();
        let m = buckets.num_buckets() as f64;
        let zeros = buckets.count_zero_buckets();

        let raw = buckets.alpha() * m * m / buckets.harmonic_sum();
        let corrected = if raw <= 5.0 * m {
            raw - bias_row(precision).bias(raw)
        } else {
            raw
        };
        let linear = if zeros > 0 {
            linear_counting(m, zeros)
        } else {
            corrected
        };

        // bucket arrays can only be built for precisions present in the table
        let switch = threshold(precision).unwrap_or(0.0);
        let branch = if linear <= switch {
            EstimateBranch::LinearCounting
        } else {
            EstimateBranch::BiasCorrected
        };
        trace!(precision, raw, corrected, linear, zeros, ?branch, "estimate");

        Self {
            raw,
            corrected,
            linear,
            zeros,
            branch,
        }
    }

    /// Unrounded final estimate
    #[inline]
    pub fn as_f64(&self) -> f64 {
        match self.branch {
            EstimateBranch::LinearCounting => self.linear,
            EstimateBranch::BiasCorrected => self.corrected,
        }
    }

    /// Final estimate rounded to a cardinality
    #[inline]
    pub fn value(&self) -> usize {
        (self.as_f64().max(0.0) + 0.5) as usize
    }
}

/// Linear counting estimate for `m` buckets of which `zeros` are empty
#[inline]
pub fn linear_counting(m: f64, zeros: usize) -> f64 {
    m * (m / zeros as f64).ln()
}
