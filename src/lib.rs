//! `similarity-estimator` is a Rust crate for estimating the number of distinct elements in
//! large collections and the Jaccard similarity / intersection size between several of them,
//! without retaining the raw elements.
//!
//! It combines two probabilistic summaries fed by one shared 64-bit hash per element:
//! - a dense HyperLogLog over a bit-packed 5-bit register array for distinct counts, and
//! - a bottom-k MinHash sample (the k smallest distinct hashes observed) for multi-way
//!   Jaccard and intersection estimation.
//!
//! # Typical lifecycle
//!
//! Sketches are built per shard or per partition, persisted as (optionally
//! DEFLATE-compressed) bytes, reloaded, merged, and only then asked for answers:
//!
//! ```
//! use similarity_estimator::SimilaritySketch;
//!
//! let mut monday = SimilaritySketch::new(14, 1024)?;
//! let mut tuesday = SimilaritySketch::new(14, 1024)?;
//! for visitor in 0..50_000u64 {
//!     monday.offer(&visitor);
//! }
//! for visitor in 40_000..90_000u64 {
//!     tuesday.offer(&visitor);
//! }
//!
//! // Persist and reload, e.g. across a partial-aggregation boundary.
//! let bytes = monday.to_bytes(true)?;
//! let monday = SimilaritySketch::from_bytes(&bytes, true)?;
//!
//! let both_days = SimilaritySketch::intersect(&[&monday, &tuesday])?;
//! assert!(both_days > 7_000 && both_days < 13_000);
//! # Ok::<(), similarity_estimator::SketchError>(())
//! ```
//!
//! # Concurrency
//!
//! Sketches are plain values with no interior synchronization. Mutating one instance from
//! several threads is the caller's bug to prevent; the supported parallel pattern is one
//! sketch per shard, combined afterwards with [`SimilaritySketch::merge`] or
//! [`SimilaritySketch::add_all`], which is equivalent to a single sequential stream because
//! both halves of the sketch merge commutatively, associatively and idempotently.

pub mod error;
pub mod hyperloglog;
pub mod register_set;
mod serde;
pub mod sketch;

pub use crate::error::SketchError;
pub use crate::hyperloglog::HyperLogLog;
pub use crate::register_set::RegisterSet;
pub use crate::serde::{compress_bytes, decompress_bytes};
pub use crate::sketch::{SimilaritySketch, DEFAULT_PRECISION, DEFAULT_SAMPLE_CAPACITY};
