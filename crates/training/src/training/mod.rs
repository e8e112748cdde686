//! Training infrastructure for BPE tokenizers.
//!
//! This module provides the vocabulary seeder, the incremental pair counter
//! and the merge learner.

pub mod config;
pub mod counter;
pub mod seed;
pub mod trainer;

pub use config::{BoostTable, TrainingConfig, MAX_BOOST_WEIGHT};
pub use counter::PairCounter;
pub use seed::{VocabularySeeder, WordTable};
pub use trainer::{BpeTrainer, StopReason, TrainedModel, TrainingSummary};
