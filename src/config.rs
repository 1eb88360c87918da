//! Construction parameters shared by cardinality and similarity sketches.

use crate::bias::validate_precision;
use crate::error::Result;
use crate::minhash::validate_capacity;

/// Default precision, 4096 buckets with 1.62% expected error
pub const DEFAULT_PRECISION: u8 = 12;
/// Default bottom-k sample capacity
pub const DEFAULT_SAMPLE_CAPACITY: usize = 256;

/// Sketch parameters
///
/// Sketches built from equal configs (and the same hasher) can always be merged and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SketchConfig {
    /// Precision `p` in [4..18] range, sketches use `2^p` buckets
    pub precision: u8,
    /// Capacity `k` of the bottom-k sample used for similarity estimates
    pub sample_capacity: usize,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            sample_capacity: DEFAULT_SAMPLE_CAPACITY,
        }
    }
}

impl SketchConfig {
    pub fn with_precision(mut self, precision: u8) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_sample_capacity(mut self, sample_capacity: usize) -> Self {
        self.sample_capacity = sample_capacity;
        self
    }

    /// Check that both parameters are supported.
    pub fn validate(&self) -> Result<()> {
        validate_precision(self.precision)?;
        validate_capacity(self.sample_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SketchError;
    use crate::minhash::MAX_SAMPLE_CAPACITY;
    use test_case::test_case;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(SketchConfig::default().validate(), Ok(()));
    }

    #[test_case(4, 1 => Ok(()))]
    #[test_case(18, 4096 => Ok(()))]
    #[test_case(3, 256 => Err(SketchError::InvalidPrecision { precision: 3, min: 4, max: 18 }))]
    #[test_case(12, 0 => Err(SketchError::InvalidSampleCapacity { capacity: 0 }))]
    #[test_case(12, MAX_SAMPLE_CAPACITY + 1 => Err(SketchError::InvalidSampleCapacity { capacity: MAX_SAMPLE_CAPACITY + 1 }))]
    fn test_validate(precision: u8, sample_capacity: usize) -> Result<()> {
        SketchConfig::default()
            .with_precision(precision)
            .with_sample_capacity(sample_capacity)
            .validate()
    }

    #[cfg(feature = "with_serde")]
    #[test]
    fn test_serde() {
        let config: SketchConfig =
            serde_json::from_str(r#"{"precision":14,"sample_capacity":512}"#).unwrap();
        assert_eq!(
            config,
            SketchConfig::default()
                .with_precision(14)
                .with_sample_capacity(512)
        );
    }
}
