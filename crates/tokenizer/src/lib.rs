//! Shabd-tokenizer - High-level tokenizer API
//!
//! This crate provides a Devanagari-oriented subword tokenizer: it learns a
//! BPE vocabulary from a corpus and maps text to token ids and back.
//!
//! # Features
//!
//! - Idempotent normalization with Devanagari combining-mark canonicalization
//! - Word-start markers so decoding restores spaces exactly
//! - Deterministic training with optional boost seeds
//! - Parallel batch encoding and decoding with per-item errors
//! - A single versioned JSON model file
//!
//! # Example
//!
//! ```rust
//! use shabd_tokenizer::Tokenizer;
//!
//! let corpus = ["नमस्ते दुनिया", "नमस्ते भारत"];
//! let tokenizer = Tokenizer::builder()
//!     .vocab_size(40)
//!     .min_frequency(2)
//!     .train(&corpus)?;
//!
//! let encoding = tokenizer.encode("नमस्ते दुनिया", false)?;
//! let text = tokenizer.decode(&encoding.ids, false)?;
//! assert_eq!(text, "नमस्ते दुनिया");
//! # Ok::<(), shabd_tokenizer::TokenizerError>(())
//! ```

pub use shabd_core::{Result, SpecialToken, SpecialTokensConfig, TokenizerError, WORD_MARKER};
pub use shabd_training::{
    BoostTable, StopReason, TrainingConfig, TrainingSummary, MAX_BOOST_WEIGHT,
};

// Tokenizer API
pub mod tokenizer;
pub use tokenizer::{Encoding, ModelConfig, Tokenizer, TokenizerBuilder};

// Model persistence
pub mod io;
pub use io::{ModelLoader, ModelSaver, SerializedModel, FORMAT_VERSION};

// Pre-tokenization
pub mod pre_tokenizer;
pub use pre_tokenizer::{Normalizer, Splitter, WordCounts};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
