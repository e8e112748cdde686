//! Symbol-level encoding for BPE tokenization.
//!
//! Base symbols are Unicode scalar values; merges build larger symbols
//! from them.

pub mod char_level;

pub use char_level::{replace_pair, CharLevelEncoder, WORD_MARKER};
