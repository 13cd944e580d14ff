//! # Serialization for sketches and estimators
//!
//! Two encodings cross process boundaries in practice:
//! - the full structural encoding of a [`SimilaritySketch`] (estimator plus
//!   bottom-k sample), produced by [`SimilaritySketch::to_bytes`], and
//! - the estimator-only compact encoding ([`crate::HyperLogLog::to_bytes`]),
//!   used when only the distinct count needs to travel, e.g. to a downstream
//!   merge step of a partial aggregation.
//!
//! Both can be wrapped in a DEFLATE stream; whether compression applies is an
//! explicit parameter of every call, never process-wide state.
//!
//! The serde impls here serialize objects as tuples of their raw parts and
//! validate everything on the way back in: deserialization either produces a
//! fully valid object or fails, leaving no partial state behind.

use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use serde::de::Error;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize};

use crate::error::SketchError;
use crate::hyperloglog::HyperLogLog;
use crate::sketch::SimilaritySketch;

impl Serialize for HyperLogLog {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut tup = serializer.serialize_tuple(2)?;
        tup.serialize_element(&self.precision())?;
        tup.serialize_element(self.as_register_words())?;
        tup.end()
    }
}

impl<'de> Deserialize<'de> for HyperLogLog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let (precision, words): (u8, Vec<u32>) = Deserialize::deserialize(deserializer)?;
        HyperLogLog::from_parts(precision, words).map_err(Error::custom)
    }
}

impl Serialize for SimilaritySketch {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut tup = serializer.serialize_tuple(3)?;
        tup.serialize_element(&(self.sample_capacity() as u64))?;
        tup.serialize_element(self.estimator())?;
        tup.serialize_element(self.sample())?;
        tup.end()
    }
}

impl<'de> Deserialize<'de> for SimilaritySketch {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let (capacity, estimator, sample): (u64, HyperLogLog, Vec<u64>) =
            Deserialize::deserialize(deserializer)?;
        let capacity = usize::try_from(capacity)
            .map_err(|_| Error::custom("sample capacity exceeds the address space"))?;
        SimilaritySketch::from_parts(capacity, estimator, sample).map_err(Error::custom)
    }
}

impl SimilaritySketch {
    /// Encodes the whole sketch, optionally DEFLATE-compressed.
    ///
    /// # Errors
    /// [`SketchError::Serialization`] when encoding or compression fails.
    pub fn to_bytes(&self, compress: bool) -> Result<Vec<u8>, SketchError> {
        let encoded =
            bincode::serialize(self).map_err(|e| SketchError::Serialization(e.to_string()))?;
        if compress {
            compress_bytes(&encoded)
        } else {
            Ok(encoded)
        }
    }

    /// Decodes a sketch previously produced by [`SimilaritySketch::to_bytes`]
    /// with the same `compressed` flag.
    ///
    /// # Errors
    /// [`SketchError::Deserialization`] on malformed, truncated or
    /// wrongly-flagged input; no partial sketch is ever produced.
    pub fn from_bytes(bytes: &[u8], compressed: bool) -> Result<Self, SketchError> {
        let inflated;
        let payload = if compressed {
            inflated = decompress_bytes(bytes)?;
            &inflated
        } else {
            bytes
        };
        bincode::deserialize(payload).map_err(|e| SketchError::Deserialization(e.to_string()))
    }
}

/// Wraps `bytes` in a DEFLATE stream at best compression.
///
/// # Errors
/// [`SketchError::Serialization`] when the encoder fails.
pub fn compress_bytes(bytes: &[u8]) -> Result<Vec<u8>, SketchError> {
    let mut encoder = DeflateEncoder::new(Vec::with_capacity(bytes.len()), Compression::best());
    encoder
        .write_all(bytes)
        .map_err(|e| SketchError::Serialization(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| SketchError::Serialization(e.to_string()))
}

/// Unwraps a DEFLATE stream produced by [`compress_bytes`].
///
/// # Errors
/// [`SketchError::Deserialization`] when `bytes` is not a valid stream.
pub fn decompress_bytes(bytes: &[u8]) -> Result<Vec<u8>, SketchError> {
    let mut decoder = DeflateDecoder::new(bytes);
    let mut inflated = Vec::with_capacity(bytes.len());
    decoder
        .read_to_end(&mut inflated)
        .map_err(|e| SketchError::Deserialization(e.to_string()))?;
    Ok(inflated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn filled_sketch(n: u64) -> SimilaritySketch {
        let mut sketch = SimilaritySketch::new(12, 1_024).unwrap();
        for value in 0..n {
            sketch.offer(&value);
        }
        sketch
    }

    #[test_case(0; "empty sketch")]
    #[test_case(1; "single element")]
    #[test_case(100; "unsaturated sample")]
    #[test_case(10_000; "saturated sample")]
    fn test_sketch_round_trip(n: u64) {
        let original = filled_sketch(n);

        for compress in [false, true] {
            let bytes = original.to_bytes(compress).unwrap();
            let decoded = SimilaritySketch::from_bytes(&bytes, compress).unwrap();
            assert_eq!(decoded, original);
            assert_eq!(decoded.cardinality(), original.cardinality());
            assert_eq!(decoded.sample(), original.sample());
        }
    }

    #[test]
    fn test_compression_shrinks_sparse_registers() {
        // Mostly-zero registers dominate the encoding and deflate well.
        let mut sketch = SimilaritySketch::new(14, 64).unwrap();
        for value in 0..1_000_u64 {
            sketch.offer(&value);
        }
        let plain = sketch.to_bytes(false).unwrap();
        let compressed = sketch.to_bytes(true).unwrap();
        assert!(compressed.len() < plain.len());
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        // 0xFF opens a reserved DEFLATE block type.
        assert!(SimilaritySketch::from_bytes(&[0xFF; 32], true).is_err());
        assert!(SimilaritySketch::from_bytes(&[], false).is_err());

        let truncated = filled_sketch(100).to_bytes(false).unwrap();
        assert!(SimilaritySketch::from_bytes(&truncated[..truncated.len() / 2], false).is_err());
    }

    #[test]
    fn test_compress_round_trip() {
        let payload: Vec<u8> = (0..2_048_u32).flat_map(|v| (v % 251).to_le_bytes()).collect();
        let compressed = compress_bytes(&payload).unwrap();
        assert_eq!(decompress_bytes(&compressed).unwrap(), payload);
    }

    #[test]
    fn test_json_round_trip() {
        let original = filled_sketch(200);
        let json = serde_json::to_string(&original).unwrap();
        let decoded: SimilaritySketch = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_estimator_serde_validates_word_count() {
        // Precision 8 requires 43 words; 42 must be rejected.
        let json = format!("[8,[{}]]", vec!["0"; 42].join(","));
        assert!(serde_json::from_str::<HyperLogLog>(&json).is_err());

        let json = format!("[8,[{}]]", vec!["0"; 43].join(","));
        assert!(serde_json::from_str::<HyperLogLog>(&json).is_ok());
    }

    #[test]
    fn test_sketch_serde_validates_sample_size() {
        // Capacity 2 with a 3-value sample must be rejected atomically.
        let estimator_words = vec!["0"; 43].join(",");
        let json = format!("[2,[8,[{estimator_words}]],[1,2,3]]");
        assert!(serde_json::from_str::<SimilaritySketch>(&json).is_err());
    }
}
