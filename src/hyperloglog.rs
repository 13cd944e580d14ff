//! ## Dense HyperLogLog estimator
//!
//! Approximates the number of distinct pre-hashed 64-bit values in a stream
//! using `2^p` packed 5-bit registers, where `p` is the precision parameter in
//! the `[4, 18]` range. Each register keeps the maximum observed rank (leading
//! zero run length plus one) of the hash suffix for its bucket.
//!
//! The estimator intentionally stays dense and plain: no sparse/dense
//! representation switching and no empirical bias tables, just the classic
//! harmonic-mean estimate with a small-range linear-counting correction and a
//! large-range correction for the 64-bit hash space.
//!
//! Values are expected to be hashed exactly once before ingestion; see
//! [`crate::sketch::SimilaritySketch`] for the hashing front end.

use crate::error::SketchError;
use crate::register_set::RegisterSet;

/// Smallest supported precision.
pub const MIN_PRECISION: u8 = 4;
/// Largest supported precision.
pub const MAX_PRECISION: u8 = 18;

/// Version tag leading every compact estimator encoding.
const FORMAT_VERSION: u8 = 1;

/// Dense HyperLogLog over a packed [`RegisterSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperLogLog {
    precision: u8,
    registers: RegisterSet,
}

impl HyperLogLog {
    /// Creates an empty estimator with `2^precision` registers.
    ///
    /// # Errors
    /// [`SketchError::InvalidParameter`] when `precision` is outside
    /// [`MIN_PRECISION`]..=[`MAX_PRECISION`].
    pub fn new(precision: u8) -> Result<Self, SketchError> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
            return Err(SketchError::InvalidParameter(
                "precision must be in the inclusive range [4, 18]",
            ));
        }
        Ok(Self {
            precision,
            registers: RegisterSet::new(1 << precision),
        })
    }

    /// Configured precision.
    #[inline]
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Number of registers (`2^precision`).
    #[inline]
    pub fn register_count(&self) -> usize {
        1 << self.precision
    }

    /// Ingests one pre-hashed value, returning whether a register grew.
    ///
    /// The top `p` bits of the hash select the register; the rank of the
    /// remaining suffix is its leading zero count plus one. A bit is planted
    /// below the suffix so the rank stays bounded even for an all-zero suffix.
    #[inline]
    pub fn offer_hashed(&mut self, hash: u64) -> bool {
        let index = (hash >> (64 - u32::from(self.precision))) as usize;
        let suffix = (hash << self.precision) | (1 << (self.precision - 1));
        let rank = suffix.leading_zeros() + 1;
        self.registers.update_if_greater(index, rank)
    }

    /// Current distinct-count estimate.
    pub fn cardinality(&self) -> u64 {
        let m = self.register_count() as f64;
        let mut harmonic_sum = 0.0;
        let mut zeros = 0u64;
        for position in 0..self.register_count() {
            let rank = self.registers.get(position);
            harmonic_sum += 2f64.powi(-(rank as i32));
            zeros += u64::from(rank == 0);
        }

        let raw = alpha(self.register_count()) * m * m / harmonic_sum;

        // Small-range correction: linear counting while zero registers remain.
        let corrected = if raw <= 2.5 * m && zeros > 0 {
            m * (m / zeros as f64).ln()
        } else {
            raw
        };

        // Large-range correction for the 64-bit hash space.
        let hash_space = (u64::MAX as f64) + 1.0;
        let corrected = if corrected > hash_space / 30.0 {
            let ratio = (corrected / hash_space).min(1.0 - f64::EPSILON);
            -hash_space * (1.0 - ratio).ln()
        } else {
            corrected
        };

        corrected.round() as u64
    }

    /// Absorbs `other` in place via register-wise maximum.
    ///
    /// # Errors
    /// [`SketchError::ConfigMismatch`] when precisions differ.
    pub fn add_all(&mut self, other: &Self) -> Result<(), SketchError> {
        if self.precision != other.precision {
            return Err(SketchError::ConfigMismatch {
                what: "precision",
                left: usize::from(self.precision),
                right: usize::from(other.precision),
            });
        }
        self.registers.merge(&other.registers)
    }

    /// Builds a new estimator unioning `self` with every estimator in
    /// `others`, in order, leaving all operands untouched.
    ///
    /// An empty `others` yields a copy of `self`.
    pub fn merge(&self, others: &[&Self]) -> Result<Self, SketchError> {
        let mut merged = Self::new(self.precision)?;
        merged.add_all(self)?;
        for other in others {
            merged.add_all(other)?;
        }
        Ok(merged)
    }

    /// Compact byte encoding: version, precision, then register words in
    /// little-endian order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let words = self.registers.as_words();
        let mut bytes = Vec::with_capacity(2 + words.len() * 4);
        bytes.push(FORMAT_VERSION);
        bytes.push(self.precision);
        for word in words {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    /// Decodes an estimator previously produced by [`HyperLogLog::to_bytes`].
    ///
    /// # Errors
    /// [`SketchError::Deserialization`] on any malformed or truncated input;
    /// either a fully valid estimator is returned or nothing is built.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SketchError> {
        if bytes.len() < 2 {
            return Err(SketchError::Deserialization(
                "estimator encoding shorter than its two-byte preamble".to_string(),
            ));
        }
        let version = bytes[0];
        if version != FORMAT_VERSION {
            return Err(SketchError::Deserialization(format!(
                "unsupported estimator format version {version}"
            )));
        }

        let precision = bytes[1];
        let payload = &bytes[2..];
        if payload.len() % 4 != 0 {
            return Err(SketchError::Deserialization(format!(
                "register payload of {} bytes is not word aligned",
                payload.len()
            )));
        }
        let words = payload
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes(chunk.try_into().unwrap()))
            .collect();
        Self::from_parts(precision, words)
    }

    /// Rebuilds an estimator from decoded parts, validating everything.
    pub(crate) fn from_parts(precision: u8, words: Vec<u32>) -> Result<Self, SketchError> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
            return Err(SketchError::Deserialization(format!(
                "precision {precision} outside [{MIN_PRECISION}, {MAX_PRECISION}]"
            )));
        }
        let count = 1usize << precision;
        let expected = RegisterSet::size_for_count(count);
        if words.len() != expected {
            return Err(SketchError::Deserialization(format!(
                "register payload holds {} words, expected {expected}",
                words.len()
            )));
        }
        Ok(Self {
            precision,
            registers: RegisterSet::from_words(count, words),
        })
    }

    /// Live register words, for the serde layer.
    #[inline]
    pub(crate) fn as_register_words(&self) -> &[u32] {
        self.registers.as_words()
    }
}

/// Bias-correction constant for `m` registers.
#[inline]
fn alpha(m: usize) -> f64 {
    match m {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / (m as f64)),
    }
}
