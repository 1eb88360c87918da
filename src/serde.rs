//! # Serde module for sketches
//!
//! This module provides serde-based (serialization and deserialization) features for
//! `BucketArray`, `BoundedMinSample`, `CardinalityEstimator` and `SimilaritySketch`. It uses
//! `serde`'s custom serialization and deserialization mechanisms.
//!
//! Sketches are converted into tuples of their logical parts:
//! - `BucketArray` and `CardinalityEstimator`: `(precision, buckets)`
//! - `BoundedMinSample`: `(capacity, sorted sample)`
//! - `SimilaritySketch`: `(precision, buckets, capacity, sorted sample)`
//!
//! During deserialization every part is validated again (precision range, bucket count, rank
//! bounds, sample capacity and size), so a sketch restored from untrusted input is always well formed.
//!
//! Refer to the serde documentation for more details on custom serialization and deserialization:
//! - [Serialization](https://serde.rs/impl-serialize.html)
//! - [Deserialization](https://serde.rs/impl-deserialize.html)
use std::hash::{Hash, Hasher};

use serde::de::Error;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize};

use crate::error::SketchError;
use crate::estimator::CardinalityEstimator;
use crate::hyperloglog::BucketArray;
use crate::minhash::BoundedMinSample;
use crate::similarity::SimilaritySketch;

impl Serialize for BucketArray {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut tup = serializer.serialize_tuple(2)?;
        tup.serialize_element(&self.precision())?;
        tup.serialize_element(self.as_slice())?;
        tup.end()
    }
}

impl<'de> Deserialize<'de> for BucketArray {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let (precision, buckets): (u8, Vec<u8>) = Deserialize::deserialize(deserializer)?;
        BucketArray::from_parts(precision, buckets).map_err(D::Error::custom)
    }
}

impl Serialize for BoundedMinSample {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut tup = serializer.serialize_tuple(2)?;
        tup.serialize_element(&self.capacity())?;
        // sorted so equal samples always serialize to equal bytes
        tup.serialize_element(&self.to_sorted_vec())?;
        tup.end()
    }
}

impl<'de> Deserialize<'de> for BoundedMinSample {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let (capacity, values): (usize, Vec<u64>) = Deserialize::deserialize(deserializer)?;
        restore_sample(capacity, values).map_err(D::Error::custom)
    }
}

impl<T, H> Serialize for CardinalityEstimator<T, H>
where
    T: Hash + ?Sized,
    H: Hasher + Default,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.buckets().serialize(serializer)
    }
}

impl<'de, T, H> Deserialize<'de> for CardinalityEstimator<T, H>
where
    T: Hash + ?Sized,
    H: Hasher + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        BucketArray::deserialize(deserializer).map(CardinalityEstimator::from_buckets)
    }
}

impl<T, H> Serialize for SimilaritySketch<T, H>
where
    T: Hash + ?Sized,
    H: Hasher + Default,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut tup = serializer.serialize_tuple(4)?;
        tup.serialize_element(&self.precision())?;
        tup.serialize_element(self.estimator().buckets().as_slice())?;
        tup.serialize_element(&self.sample_capacity())?;
        tup.serialize_element(&self.sample().to_sorted_vec())?;
        tup.end()
    }
}

impl<'de, T, H> Deserialize<'de> for SimilaritySketch<T, H>
where
    T: Hash + ?Sized,
    H: Hasher + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let (precision, buckets, capacity, values): (u8, Vec<u8>, usize, Vec<u64>) =
            Deserialize::deserialize(deserializer)?;
        let buckets = BucketArray::from_parts(precision, buckets).map_err(D::Error::custom)?;
        let sample = restore_sample(capacity, values).map_err(D::Error::custom)?;
        Ok(SimilaritySketch::from_parts(
            CardinalityEstimator::from_buckets(buckets),
            sample,
        ))
    }
}

fn restore_sample(capacity: usize, values: Vec<u64>) -> Result<BoundedMinSample, SketchError> {
    if values.len() > capacity {
        return Err(SketchError::InvalidSample {
            len: values.len(),
            capacity,
        });
    }
    BoundedMinSample::from_values(capacity, values)
}
