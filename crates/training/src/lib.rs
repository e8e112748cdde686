//! Shabd-training - BPE merge learning
//!
//! This crate learns an ordered list of merge rules from an already
//! normalized word-frequency table.
//!
//! # Features
//!
//! - Incremental pair counting with an inverted index, so each merge only
//!   revisits the words that contain the chosen pair
//! - Parallel initial pair counting
//! - Deterministic tie-breaking on symbol strings
//! - Boost seeds folded in as pseudo-frequency words
//! - Cooperative cancellation between merge steps
//!
//! # Example
//!
//! ```rust
//! use shabd_training::{BpeTrainer, TrainingConfig, WordTable};
//!
//! let mut words = WordTable::new();
//! words.insert("\u{2581}नमस्ते".into(), 8);
//! words.insert("\u{2581}दुनिया".into(), 5);
//!
//! let trainer = BpeTrainer::new(TrainingConfig::with_vocab_size(24));
//! let model = trainer.train(&words).unwrap();
//! assert!(!model.merges.is_empty());
//! ```

pub use shabd_core::{Result, TokenizerError};

pub mod training;
pub use training::{
    BoostTable, BpeTrainer, PairCounter, StopReason, TrainedModel, TrainingConfig,
    TrainingSummary, VocabularySeeder, WordTable, MAX_BOOST_WEIGHT,
};
