//! Error types shared across the crate.

use thiserror::Error;

/// Errors produced by sketch construction, merging and (de)serialization.
#[derive(Debug, Error)]
pub enum SketchError {
    /// Register arrays of different word counts cannot be merged.
    #[error("register arrays differ in size: {left} words vs {right} words")]
    ShapeMismatch { left: usize, right: usize },

    /// Sketches built with different parameters cannot absorb each other.
    #[error("sketch configurations differ: {what} {left} vs {right}")]
    ConfigMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    /// A constructor argument is outside its supported range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// Encoding a sketch or estimator to bytes failed.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Malformed or truncated bytes; no partial object is ever produced.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}
