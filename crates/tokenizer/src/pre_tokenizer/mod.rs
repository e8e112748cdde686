//! Pre-tokenization pipeline.
//!
//! This module provides the operations applied before BPE encoding:
//! normalization, splitting into marked pre-tokens and word counting.

pub mod normalize;
pub mod split;
pub mod words;

pub use normalize::Normalizer;
pub use split::Splitter;
pub use words::WordCounts;
