//! Error types for the shabd tokenizer crates.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type shared by every shabd crate.
#[derive(Error, Debug)]
pub enum TokenizerError {
    /// Invalid training configuration, raised before any merge is learned
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Empty or unusable training corpus
    #[error("Training error: {0}")]
    Training(String),

    /// Training was aborted through its cancellation flag
    #[error("Training cancelled")]
    Cancelled,

    /// A symbol has no vocabulary entry. Encoding recovers this as `[UNK]`.
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    /// A token ID outside `0..vocab_size` was passed to decode
    #[error("Unknown token ID: {0}")]
    UnknownTokenId(u32),

    /// Model document is malformed, truncated, inconsistent or from another format version
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// I/O error with file context
    #[error("I/O error for {path}: {err}")]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid merge rule
    #[error("Invalid merge rule: {0}")]
    InvalidMerge(String),

    /// Vocabulary overflow
    #[error("Vocabulary size exceeded maximum of {max} (tried to add {tried})")]
    VocabularyOverflow { max: usize, tried: usize },
}

impl TokenizerError {
    /// Wrap an I/O error with the path that caused it.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            err,
        }
    }
}

/// Result type alias for tokenizer operations.
pub type Result<T> = std::result::Result<T, TokenizerError>;
