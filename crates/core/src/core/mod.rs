//! Core BPE data structures.
//!
//! Vocabulary, merge rules and the merge-candidate queue, independent of
//! how text is normalized or split.

pub mod merges;
pub mod priority;
pub mod vocab;

pub use merges::{MergeMap, MergeRules, Pair};
pub use priority::{MergeCandidate, PairPriorityQueue};
pub use vocab::{SpecialToken, SpecialTokensConfig, Vocab, VocabR, Vocabulary};
