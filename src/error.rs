//! Error types for training and sampling.
//!
//! Precondition failures that a caller can trigger with bad data (an index
//! outside the vocabulary, an empty window, mismatched input/target lengths)
//! are returned as [`RnnError`]. Tensor shape mismatches between parameters
//! and gradients are programming errors and panic instead.

use thiserror::Error;

/// Result type alias for fallible crate operations.
pub type Result<T> = std::result::Result<T, RnnError>;

/// Errors that can occur while training or sampling.
#[derive(Debug, Error)]
pub enum RnnError {
    /// An input, target or seed index outside `[0, vocab_size)`.
    #[error("vocabulary index {index} out of range (vocab_size = {vocab_size})")]
    InvalidVocabularyIndex {
        /// Offending index.
        index: usize,
        /// Size of the vocabulary.
        vocab_size: usize,
    },

    /// A character that the vocabulary was not built with.
    #[error("character {0:?} is not in the vocabulary")]
    UnknownCharacter(char),

    /// A window with no time steps.
    #[error("window must contain at least one time step")]
    EmptyWindow,

    /// Targets and cached steps disagree in length.
    #[error("length mismatch: expected {expected} targets, got {actual}")]
    LengthMismatch {
        /// Number of time steps in the forward cache.
        expected: usize,
        /// Number of targets supplied.
        actual: usize,
    },

    /// Invalid configuration parameter.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Corpus too short to produce a single training window.
    #[error("corpus has {len} characters, need at least {required} for one window")]
    CorpusTooShort {
        /// Characters in the corpus.
        len: usize,
        /// Characters needed (window length + 1).
        required: usize,
    },

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON configuration.
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Check that `index` addresses a vocabulary entry.
pub(crate) fn check_index(index: usize, vocab_size: usize) -> Result<()> {
    if index < vocab_size {
        Ok(())
    } else {
        Err(RnnError::InvalidVocabularyIndex { index, vocab_size })
    }
}
