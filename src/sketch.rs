//! ## Similarity sketch
//!
//! Couples a [`HyperLogLog`] distinct-count estimator with a bounded ascending
//! sample of the smallest 64-bit hashes ever observed (a bottom-k MinHash
//! sample). The estimator answers "how many distinct elements", the sample
//! answers "how much do several streams overlap": because the k smallest
//! hashes of a union are an unbiased sample of the union, the fraction of them
//! present in every sketch estimates the multi-way Jaccard index, and scaling
//! that fraction by the union cardinality estimates the intersection size.
//!
//! Every element is hashed exactly once with one fixed hash function
//! ([`wyhash::WyHash`] with its default seed) and the same hash feeds both
//! halves of the sketch. Identical logical elements therefore hash identically
//! across every sketch instance, which is what makes samples from different
//! sketches comparable; this is a correctness precondition, not an
//! implementation detail.

use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use wyhash::WyHash;

use crate::error::SketchError;
use crate::hyperloglog::HyperLogLog;

/// Default estimator precision.
pub const DEFAULT_PRECISION: u8 = 18;
/// Default bottom-k sample capacity.
pub const DEFAULT_SAMPLE_CAPACITY: usize = 8192;

/// Distinct-count estimator with a bottom-k sample for overlap estimation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilaritySketch {
    /// Wrapped cardinality estimator, exclusively owned by this sketch.
    estimator: HyperLogLog,
    /// The k smallest distinct hashes ever offered, ascending.
    sample: BTreeSet<u64>,
    /// Maximum number of retained hashes, fixed at construction.
    sample_capacity: usize,
}

impl SimilaritySketch {
    /// Creates an empty sketch with estimator precision `precision` and
    /// bottom-k sample capacity `sample_capacity`.
    ///
    /// # Errors
    /// [`SketchError::InvalidParameter`] when `precision` is outside `[4, 18]`
    /// or `sample_capacity` is zero.
    pub fn new(precision: u8, sample_capacity: usize) -> Result<Self, SketchError> {
        if sample_capacity == 0 {
            return Err(SketchError::InvalidParameter(
                "sample capacity must be at least 1",
            ));
        }
        Ok(Self {
            estimator: HyperLogLog::new(precision)?,
            sample: BTreeSet::new(),
            sample_capacity,
        })
    }

    /// Estimator precision.
    #[inline]
    pub fn precision(&self) -> u8 {
        self.estimator.precision()
    }

    /// Configured bottom-k sample capacity.
    #[inline]
    pub fn sample_capacity(&self) -> usize {
        self.sample_capacity
    }

    /// The retained sample, ascending. Holds every distinct hash observed
    /// until the sketch saturates.
    #[inline]
    pub fn sample(&self) -> &BTreeSet<u64> {
        &self.sample
    }

    /// Whether the sample has reached capacity and started evicting.
    #[inline]
    pub fn is_saturated(&self) -> bool {
        self.sample.len() >= self.sample_capacity
    }

    /// The wrapped estimator, e.g. for shipping its compact encoding across a
    /// partial-aggregate boundary when the sample is not needed downstream.
    #[inline]
    pub fn estimator(&self) -> &HyperLogLog {
        &self.estimator
    }

    /// Hashes `item` once and ingests the hash.
    pub fn offer<T: Hash + ?Sized>(&mut self, item: &T) {
        let mut hasher = WyHash::default();
        item.hash(&mut hasher);
        self.offer_hashed(hasher.finish());
    }

    /// Ingests an already-hashed value into both the sample and the estimator.
    ///
    /// The hash goes to the estimator through its hashed-ingestion entry point
    /// and is never hashed again.
    pub fn offer_hashed(&mut self, hash: u64) {
        self.sample.insert(hash);
        if self.sample.len() > self.sample_capacity {
            self.sample.pop_last();
        }
        self.estimator.offer_hashed(hash);
    }

    /// Current distinct-count estimate.
    ///
    /// While the sample is unsaturated no eviction has ever occurred, so the
    /// sample still holds every distinct hash observed and its size is
    /// returned as an exact count. Once saturated, the estimator's
    /// approximation is returned.
    pub fn cardinality(&self) -> u64 {
        if self.sample.len() < self.sample_capacity {
            self.sample.len() as u64
        } else {
            self.estimator.cardinality()
        }
    }

    /// Absorbs `other` into `self`: register-wise estimator merge, then a
    /// deduplicated sample union truncated back down to capacity by dropping
    /// the largest values.
    ///
    /// # Errors
    /// [`SketchError::ConfigMismatch`] unless both sketches share precision
    /// and sample capacity.
    pub fn add_all(&mut self, other: &Self) -> Result<(), SketchError> {
        if self.sample_capacity != other.sample_capacity {
            return Err(SketchError::ConfigMismatch {
                what: "sample capacity",
                left: self.sample_capacity,
                right: other.sample_capacity,
            });
        }
        self.estimator.add_all(&other.estimator)?;

        self.sample.extend(other.sample.iter().copied());
        while self.sample.len() > self.sample_capacity {
            self.sample.pop_last();
        }
        Ok(())
    }

    /// Builds a new sketch with `self`'s configuration absorbing `self` and
    /// then every sketch in `others`, in argument order. No operand is
    /// mutated; an empty `others` yields a copy of `self`.
    ///
    /// # Errors
    /// [`SketchError::ConfigMismatch`] when any operand differs in precision
    /// or sample capacity.
    pub fn merge(&self, others: &[&Self]) -> Result<Self, SketchError> {
        let mut merged = Self::new(self.precision(), self.sample_capacity)?;
        merged.add_all(self)?;
        for other in others {
            merged.add_all(other)?;
        }
        Ok(merged)
    }

    /// Estimates the Jaccard index across an arbitrary set of sketches.
    ///
    /// Walks the ascending union of all samples and counts how many of its
    /// `effective_k` smallest values appear in every sketch, where
    /// `effective_k` clamps the smallest configured capacity down to the
    /// largest current sample size. Should the union run out before
    /// `effective_k` draws, the denominator deliberately stays `effective_k`,
    /// biasing the estimate low when data is scarce rather than high.
    ///
    /// An empty `sketches` slice, any operand with an empty sample, or an
    /// `effective_k` of zero all yield `0.0` rather than an error.
    pub fn jaccard_index(sketches: &[&Self]) -> f64 {
        if sketches.is_empty() {
            return 0.0;
        }
        if sketches.iter().any(|sketch| sketch.sample.is_empty()) {
            return 0.0;
        }

        let mut union: BTreeSet<u64> = BTreeSet::new();
        let mut smallest_capacity = usize::MAX;
        let mut largest_sample = 0;
        for sketch in sketches {
            union.extend(sketch.sample.iter().copied());
            smallest_capacity = smallest_capacity.min(sketch.sample_capacity);
            largest_sample = largest_sample.max(sketch.sample.len());
        }

        let effective_k = smallest_capacity.min(largest_sample);
        if effective_k == 0 {
            return 0.0;
        }

        let hits = union
            .iter()
            .take(effective_k)
            .filter(|&&value| sketches.iter().all(|sketch| sketch.sample.contains(&value)))
            .count();
        hits as f64 / effective_k as f64
    }

    /// Estimates the intersection size across an arbitrary set of sketches as
    /// `round(jaccard * union_cardinality)`.
    ///
    /// A Jaccard index of zero short-circuits to `Ok(0)` without touching any
    /// estimator; otherwise only the estimators are merged (samples are
    /// ignored) to obtain the union cardinality.
    ///
    /// # Errors
    /// [`SketchError::ConfigMismatch`] when the estimators disagree on
    /// precision.
    pub fn intersect(sketches: &[&Self]) -> Result<u64, SketchError> {
        let jaccard = Self::jaccard_index(sketches);
        if jaccard == 0.0 {
            return Ok(0);
        }

        // A non-zero Jaccard index implies a non-empty sketch list.
        let rest: Vec<&HyperLogLog> = sketches[1..].iter().map(|s| &s.estimator).collect();
        let union = sketches[0].estimator.merge(&rest)?;
        Ok((jaccard * union.cardinality() as f64).round() as u64)
    }

    /// Rebuilds a sketch from decoded parts, validating everything.
    pub(crate) fn from_parts(
        sample_capacity: usize,
        estimator: HyperLogLog,
        sample: Vec<u64>,
    ) -> Result<Self, SketchError> {
        if sample_capacity == 0 {
            return Err(SketchError::Deserialization(
                "sample capacity of zero".to_string(),
            ));
        }
        let sample: BTreeSet<u64> = sample.into_iter().collect();
        if sample.len() > sample_capacity {
            return Err(SketchError::Deserialization(format!(
                "sample holds {} values, capacity is {sample_capacity}",
                sample.len()
            )));
        }
        Ok(Self {
            estimator,
            sample,
            sample_capacity,
        })
    }
}

impl Default for SimilaritySketch {
    /// An empty sketch with the default precision and sample capacity.
    fn default() -> Self {
        Self::new(DEFAULT_PRECISION, DEFAULT_SAMPLE_CAPACITY)
            .expect("default sketch configuration is valid")
    }
}
