//! ## Hash routing
//! Every value is hashed once into a fixed-width `u64`. For precision `p` the hash is split into:
//! - bits `0..p`        - bucket index (`hash & (m - 1)`)
//! - bits `p - 1..64`   - rank source (`hash >> (p - 1)`)
//!
//! The rank is `1 +` the number of consecutive 1-bits directly below the highest set bit of
//! `hash >> (p - 1)`. This is a leading-ones convention rather than the leading-zeros rule of the
//! HyperLogLog paper; both give ranks distributed as `P(rank > k) = 2^-k`, and the bias rows in
//! [`crate::bias`] are built for this convention, so it must not be swapped for the textbook one.
//!
//! Ranks are bounded by `HASH_BITS - p + 1`.

use std::hash::{BuildHasher, BuildHasherDefault, Hash, Hasher};

/// Width of the hash produced by [`hash_item`]
pub const HASH_BITS: u32 = 64;

/// Hash `item` with a default-constructed `H`.
///
/// All sketches that will later be merged or compared must use the same `H`.
#[inline]
pub fn hash_item<T: Hash + ?Sized, H: Hasher + Default>(item: &T) -> u64 {
    let mut hasher = BuildHasherDefault::<H>::default().build_hasher();
    item.hash(&mut hasher);
    hasher.finish()
}

/// Largest rank a bucket can hold for `precision`.
#[inline]
pub const fn max_rank(precision: u8) -> u8 {
    HASH_BITS as u8 + 1 - precision
}

/// Maps hashes to `(bucket, rank)` pairs for a fixed precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashRouter {
    precision: u8,
    mask: u64,
}

impl HashRouter {
    /// Create router for an already validated `precision`.
    #[inline]
    pub(crate) const fn new(precision: u8) -> Self {
        Self {
            precision,
            mask: (1 << precision) - 1,
        }
    }

    /// Precision this router splits hashes for
    #[inline]
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Bucket selected by the low `p` bits of `hash`
    #[inline]
    pub fn bucket(&self, hash: u64) -> usize {
        (hash & self.mask) as usize
    }

    /// Rank of `hash`, always in `[1..=max_rank(p)]`.
    #[inline]
    pub fn rank(&self, hash: u64) -> u8 {
        let shifted = hash >> (self.precision - 1);
        let lz = shifted.leading_zeros();
        // drop everything down to and including the highest set bit, vacated bits are zeros
        let below = shifted.checked_shl(lz + 1).unwrap_or(0);
        (1 + below.leading_ones()) as u8
    }

    /// Return `(bucket, rank)` pair for `hash`
    #[inline]
    pub fn route(&self, hash: u64) -> (usize, u8) {
        (self.bucket(hash), self.rank(hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use wyhash::WyHash;

    #[test_case(4, 0 => (0, 1); "zero hash")]
    #[test_case(4, 0b1000 => (8, 1); "only bucket bits")]
    #[test_case(4, 0b0111_0101 => (5, 3); "two ones below top bit")]
    #[test_case(4, 0b1111_0000 => (0, 4); "three ones below top bit")]
    #[test_case(4, u64::MAX => (15, 61); "all ones at p4")]
    #[test_case(16, u64::MAX => (65535, 49); "all ones at p16")]
    #[test_case(18, 1 << 63 => (0, 1); "single top bit")]
    #[test_case(12, 0xF000_0000_0000_0ABC => (0xABC, 4); "run at the top of the hash")]
    fn test_route(precision: u8, hash: u64) -> (usize, u8) {
        HashRouter::new(precision).route(hash)
    }

    #[test]
    fn test_rank_bounds() {
        for precision in 4..=18 {
            let router = HashRouter::new(precision);
            for i in 0..10_000u64 {
                let rank = router.rank(hash_item::<_, WyHash>(&i));
                assert!(rank >= 1 && rank <= max_rank(precision));
            }
            assert_eq!(router.rank(u64::MAX), max_rank(precision));
        }
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(
            hash_item::<_, WyHash>("item"),
            hash_item::<_, WyHash>(&String::from("item"))
        );
        assert_ne!(hash_item::<_, WyHash>("item"), hash_item::<_, WyHash>("item2"));
    }
}
