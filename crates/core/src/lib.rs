//! Shabd-core - Core BPE data structures for the shabd tokenizer
//!
//! This crate provides the vocabulary, merge rules and symbol-level
//! encoder shared by the trainer and the tokenizer.
//!
//! # Features
//!
//! - Vocabulary storage using `AHashMap` and compact strings
//! - Ranked merge rules with constant-time pair lookup
//! - A deterministic priority queue for merge candidates
//! - Fixed-id special tokens with configurable strings
//!
//! # Example
//!
//! ```rust
//! use shabd_core::{SpecialTokensConfig, Vocabulary};
//!
//! let mut vocab = Vocabulary::with_special_tokens(&SpecialTokensConfig::default(), 8).unwrap();
//! let id = vocab.add_token("न").unwrap();
//! assert_eq!(id, 4);
//! ```

pub mod error;
pub use error::{Result, TokenizerError};

pub mod core;
pub use core::{
    MergeCandidate, MergeMap, MergeRules, Pair, PairPriorityQueue, SpecialToken,
    SpecialTokensConfig, Vocab, VocabR, Vocabulary,
};

pub mod encoding;
pub use encoding::{CharLevelEncoder, WORD_MARKER};
