//! Precision-indexed constants of HyperLogLog++:
//! - `alpha` constant of the raw estimator,
//! - empirical linear counting switch thresholds,
//! - raw estimate breakpoints with their bias, used to correct raw estimates below `5m`.
//!
//! [Original HyperLogLog++ paper](https://static.googleusercontent.com/media/research.google.com/en//pubs/archive/40671.pdf)
//!
//! The bias rows are built once per process on first use and are never mutated. Each row samples
//! the expected raw estimate `E[E_raw](n)` on an evenly spaced grid of `n = λm` with
//! `λ ∈ [0, TABLE_SPAN]`, and stores `E[E_raw](n) - n` as the bias of that breakpoint.
//! Expectations come from the Poisson model of a single bucket, `P(M <= k) = exp(-λ·2^-k)`
//! (capped at the maximum rank), with a second order term for the mean of the harmonic sum.

use std::sync::OnceLock;

use crate::error::{Result, SketchError};
use crate::hash::max_rank;

/// Smallest supported precision
pub const MIN_PRECISION: u8 = 4;
/// Largest supported precision
pub const MAX_PRECISION: u8 = 18;

/// Number of breakpoints per bias row
const TABLE_POINTS: usize = 201;
/// Bias rows cover cardinalities up to `TABLE_SPAN * m`, past the `5m` correction cutoff.
const TABLE_SPAN: f64 = 5.5;

/// Linear counting switch thresholds for precision in [4..18] range.
const THRESHOLD: [f64; 15] = [
    10.0,     // p = 4
    20.0,     // p = 5
    40.0,     // p = 6
    80.0,     // p = 7
    220.0,    // p = 8
    400.0,    // p = 9
    900.0,    // p = 10
    1800.0,   // p = 11
    3100.0,   // p = 12
    6500.0,   // p = 13
    11500.0,  // p = 14
    20000.0,  // p = 15
    50000.0,  // p = 16
    120000.0, // p = 17
    350000.0, // p = 18
];

/// Linear counting threshold for `precision`, `None` if the table has no entry for it.
#[inline]
pub fn threshold(precision: u8) -> Option<f64> {
    precision
        .checked_sub(MIN_PRECISION)
        .and_then(|i| THRESHOLD.get(usize::from(i)))
        .copied()
}

/// Check that `precision` is supported.
pub fn validate_precision(precision: u8) -> Result<()> {
    match threshold(precision) {
        Some(_) => Ok(()),
        None => Err(SketchError::InvalidPrecision {
            precision,
            min: MIN_PRECISION,
            max: MAX_PRECISION,
        }),
    }
}

/// Parameter for bias correction
#[inline]
pub fn alpha(precision: u8) -> f64 {
    match precision {
        4 => 0.673,
        5 => 0.697,
        6 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / ((1u64 << precision) as f64)),
    }
}

/// Raw estimate breakpoints and their bias for a single precision.
#[derive(Debug, Clone, PartialEq)]
pub struct BiasRow {
    raw_estimates: Vec<f64>,
    biases: Vec<f64>,
}

impl BiasRow {
    fn build(precision: u8) -> Self {
        let m = (1u64 << precision) as f64;
        let alpha = alpha(precision);
        let max_rank = max_rank(precision);

        let mut raw_estimates = Vec::with_capacity(TABLE_POINTS);
        let mut biases = Vec::with_capacity(TABLE_POINTS);
        for i in 0..TABLE_POINTS {
            let lambda = TABLE_SPAN * (i as f64) / ((TABLE_POINTS - 1) as f64);
            let raw = expected_raw_estimate(lambda, m, alpha, max_rank);
            // breakpoints must stay strictly increasing for the binary search
            if raw_estimates.last().map_or(true, |&last| raw > last) {
                raw_estimates.push(raw);
                biases.push(raw - lambda * m);
            }
        }

        Self {
            raw_estimates,
            biases,
        }
    }

    /// Sorted raw estimate breakpoints
    pub fn raw_estimates(&self) -> &[f64] {
        &self.raw_estimates
    }

    /// Bias at each breakpoint
    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    /// Bias for raw `estimate`: average of the biases at the two breakpoints bracketing it.
    ///
    /// Estimates outside the row use the bias of the nearest end.
    pub fn bias(&self, estimate: f64) -> f64 {
        let last = self.raw_estimates.len() - 1;
        let idx = self.raw_estimates.partition_point(|&x| x < estimate);
        let lo = idx.saturating_sub(1).min(last);
        let hi = idx.min(last);
        (self.biases[lo] + self.biases[hi]) / 2.0
    }
}

/// Bias row for a validated `precision`.
pub fn bias_row(precision: u8) -> &'static BiasRow {
    // model rows stand in for the empirical HLL++ bias tables, which are not shipped here
    static ROWS: OnceLock<Vec<BiasRow>> = OnceLock::new();
    let rows = ROWS.get_or_init(|| (MIN_PRECISION..=MAX_PRECISION).map(BiasRow::build).collect());
    &rows[usize::from(precision - MIN_PRECISION)]
}

/// Expected raw estimate `alpha * m^2 / Σ 2^-M` at load factor `lambda = n / m`.
fn expected_raw_estimate(lambda: f64, m: f64, alpha: f64, max_rank: u8) -> f64 {
    // first and second moments of 2^-M for a single bucket
    let mut phi1 = 0.0;
    let mut phi2 = 0.0;
    let mut prev_cdf = 0.0;
    let mut weight = 1.0;
    for k in 0..=max_rank {
        let cdf = if k == max_rank {
            1.0
        } else {
            (-lambda * weight).exp()
        };
        let mass = cdf - prev_cdf;
        phi1 += weight * mass;
        phi2 += weight * weight * mass;
        prev_cdf = cdf;
        weight *= 0.5;
    }

    let mean = m * phi1;
    let variance = m * (phi2 - phi1 * phi1);
    alpha * m * m * (1.0 / mean + variance / mean.powi(3))
}
