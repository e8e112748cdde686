//! Vocabulary storage and lookup.
//!
//! This module provides efficient vocabulary storage using AHashMap for fast lookups
//! and CompactString for memory-efficient string storage. The four special tokens
//! always occupy the lowest ids, in the order of [`SpecialToken::ALL`].

use crate::error::{Result, TokenizerError};
use ahash::AHashMap;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Forward mapping: token string -> ID
pub type Vocab = AHashMap<CompactString, u32>;

/// Reverse mapping: ID -> token string
pub type VocabR = AHashMap<u32, CompactString>;

/// The reserved tokens. Each has a fixed id equal to its discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpecialToken {
    /// Stands in for characters that were never seen during training
    Unk = 0,
    /// Padding
    Pad = 1,
    /// Beginning of sequence
    Bos = 2,
    /// End of sequence
    Eos = 3,
}

impl SpecialToken {
    /// All special tokens in id order.
    pub const ALL: [SpecialToken; 4] = [
        SpecialToken::Unk,
        SpecialToken::Pad,
        SpecialToken::Bos,
        SpecialToken::Eos,
    ];

    /// Number of reserved ids.
    pub const COUNT: usize = Self::ALL.len();

    /// The fixed token id.
    #[inline]
    pub const fn id(self) -> u32 {
        self as u32
    }

    /// Role name used in the persisted model.
    pub const fn name(self) -> &'static str {
        match self {
            SpecialToken::Unk => "unk",
            SpecialToken::Pad => "pad",
            SpecialToken::Bos => "bos",
            SpecialToken::Eos => "eos",
        }
    }

    /// Look up a special token by role name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Whether the token sits inside a word rather than standing as one.
    ///
    /// `[UNK]` replaces characters within a word; the others are separate
    /// words of their own.
    #[inline]
    pub const fn is_inline(self) -> bool {
        matches!(self, SpecialToken::Unk)
    }

    /// Look up a special token by id.
    #[inline]
    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }
}

/// Strings used for the special tokens.
///
/// Only the strings are configurable; the ids are fixed by [`SpecialToken`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialTokensConfig {
    pub unk: String,
    pub pad: String,
    pub bos: String,
    pub eos: String,
}

impl Default for SpecialTokensConfig {
    fn default() -> Self {
        Self {
            unk: "[UNK]".to_string(),
            pad: "[PAD]".to_string(),
            bos: "[BOS]".to_string(),
            eos: "[EOS]".to_string(),
        }
    }
}

impl SpecialTokensConfig {
    /// The configured string for a special token.
    pub fn token(&self, token: SpecialToken) -> &str {
        match token {
            SpecialToken::Unk => &self.unk,
            SpecialToken::Pad => &self.pad,
            SpecialToken::Bos => &self.bos,
            SpecialToken::Eos => &self.eos,
        }
    }

    /// Check that every string is non-empty and distinct.
    pub fn validate(&self) -> Result<()> {
        for (i, &a) in SpecialToken::ALL.iter().enumerate() {
            if self.token(a).is_empty() {
                return Err(TokenizerError::InvalidConfig(format!(
                    "special token '{}' must not be empty",
                    a.name()
                )));
            }
            for &b in &SpecialToken::ALL[i + 1..] {
                if self.token(a) == self.token(b) {
                    return Err(TokenizerError::InvalidConfig(format!(
                        "special tokens '{}' and '{}' share the string {:?}",
                        a.name(),
                        b.name(),
                        self.token(a)
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Vocabulary with forward and reverse mappings.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    /// Forward mapping: token string -> ID
    pub vocab: Vocab,
    /// Reverse mapping: ID -> token string
    pub vocab_r: VocabR,
}

impl Vocabulary {
    /// Create a new empty vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new vocabulary with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vocab: Vocab::with_capacity(capacity),
            vocab_r: VocabR::with_capacity(capacity),
        }
    }

    /// Create a vocabulary holding only the special tokens at their fixed ids.
    pub fn with_special_tokens(special: &SpecialTokensConfig, capacity: usize) -> Result<Self> {
        special.validate()?;

        let mut vocab = Self::with_capacity(capacity.max(SpecialToken::COUNT));
        for token in SpecialToken::ALL {
            vocab.add_token_with_id(special.token(token), token.id())?;
        }

        Ok(vocab)
    }

    /// Add a token to the vocabulary.
    ///
    /// Returns the ID assigned to the token, or the existing ID if it is
    /// already present.
    pub fn add_token(&mut self, token: &str) -> Result<u32> {
        if let Some(id) = self.get_id(token) {
            return Ok(id);
        }

        let id = u32::try_from(self.vocab.len()).map_err(|_| TokenizerError::VocabularyOverflow {
            max: u32::MAX as usize,
            tried: self.vocab.len() + 1,
        })?;

        let token = CompactString::new(token);
        self.vocab_r.insert(id, token.clone());
        self.vocab.insert(token, id);

        Ok(id)
    }

    /// Add a token with a specific ID.
    ///
    /// Returns an error if the ID is already taken or the token already has
    /// another ID.
    pub fn add_token_with_id(&mut self, token: &str, id: u32) -> Result<()> {
        if self.vocab_r.contains_key(&id) {
            return Err(TokenizerError::InvalidConfig(format!(
                "Token ID {} already exists",
                id
            )));
        }
        if let Some(existing) = self.get_id(token) {
            return Err(TokenizerError::InvalidConfig(format!(
                "Token {:?} already has ID {}",
                token, existing
            )));
        }

        let token = CompactString::new(token);
        self.vocab_r.insert(id, token.clone());
        self.vocab.insert(token, id);

        Ok(())
    }

    /// Get the ID for a token string.
    #[inline]
    pub fn get_id(&self, token: &str) -> Option<u32> {
        self.vocab.get(token).copied()
    }

    /// Get the token string for an ID.
    #[inline]
    pub fn get_token(&self, id: u32) -> Option<&str> {
        self.vocab_r.get(&id).map(|s| s.as_str())
    }

    /// Check whether a token string is present.
    #[inline]
    pub fn contains(&self, token: &str) -> bool {
        self.vocab.contains_key(token)
    }

    /// Get the size of the vocabulary.
    #[inline]
    pub fn len(&self) -> usize {
        self.vocab.len()
    }

    /// Check if the vocabulary is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vocab.is_empty()
    }

    /// Check if an ID is one of the reserved special-token ids.
    #[inline]
    pub fn is_special(&self, id: u32) -> bool {
        SpecialToken::from_id(id).is_some()
    }

    /// The string stored for a special token, if the vocabulary has one.
    #[inline]
    pub fn special_token(&self, token: SpecialToken) -> Option<&str> {
        self.get_token(token.id())
    }

    /// Check that ids form the contiguous range `0..len`.
    pub fn is_contiguous(&self) -> bool {
        (0..self.len() as u32).all(|id| self.vocab_r.contains_key(&id))
    }

    /// Iterate `(id, token)` in ascending id order.
    pub fn iter_ordered(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        let mut ids: Vec<u32> = self.vocab_r.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter()
            .filter_map(move |id| self.get_token(id).map(|token| (id, token)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_token() {
        let mut vocab = Vocabulary::new();
        let id1 = vocab.add_token("क").unwrap();
        let id2 = vocab.add_token("ख").unwrap();

        assert_eq!(id1, 0);
        assert_eq!(id2, 1);
        assert_eq!(vocab.get_id("क"), Some(0));
        assert_eq!(vocab.get_id("ख"), Some(1));
        assert_eq!(vocab.get_token(0), Some("क"));
        assert_eq!(vocab.get_token(1), Some("ख"));
    }

    #[test]
    fn test_add_duplicate_token() {
        let mut vocab = Vocabulary::new();
        let id1 = vocab.add_token("नम").unwrap();
        let id2 = vocab.add_token("नम").unwrap();

        assert_eq!(id1, id2);
        assert_eq!(vocab.len(), 1);
    }

    #[test]
    fn test_add_token_with_id() {
        let mut vocab = Vocabulary::new();
        vocab.add_token_with_id("hello", 5).unwrap();
        vocab.add_token_with_id("world", 10).unwrap();

        assert_eq!(vocab.get_id("hello"), Some(5));
        assert_eq!(vocab.get_token(10), Some("world"));
        assert!(!vocab.is_contiguous());

        assert!(vocab.add_token_with_id("again", 5).is_err());
        assert!(vocab.add_token_with_id("hello", 6).is_err());
    }

    #[test]
    fn test_special_tokens_fixed_ids() {
        let vocab = Vocabulary::with_special_tokens(&SpecialTokensConfig::default(), 16).unwrap();

        assert_eq!(vocab.len(), SpecialToken::COUNT);
        assert_eq!(vocab.get_id("[UNK]"), Some(0));
        assert_eq!(vocab.get_id("[PAD]"), Some(1));
        assert_eq!(vocab.get_id("[BOS]"), Some(2));
        assert_eq!(vocab.get_id("[EOS]"), Some(3));
        assert!(vocab.is_special(SpecialToken::Eos.id()));
        assert!(!vocab.is_special(4));
        assert!(vocab.is_contiguous());
    }

    #[test]
    fn test_special_tokens_must_be_distinct() {
        let config = SpecialTokensConfig {
            bos: "[X]".to_string(),
            eos: "[X]".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Vocabulary::with_special_tokens(&config, 4),
            Err(TokenizerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_special_token_lookup() {
        assert_eq!(SpecialToken::from_name("bos"), Some(SpecialToken::Bos));
        assert_eq!(SpecialToken::from_name("mask"), None);
        assert_eq!(SpecialToken::from_id(0), Some(SpecialToken::Unk));
        assert_eq!(SpecialToken::from_id(4), None);
        assert!(SpecialToken::Unk.is_inline());
        assert!(!SpecialToken::Bos.is_inline());
    }

    #[test]
    fn test_iter_ordered() {
        let mut vocab = Vocabulary::new();
        vocab.add_token_with_id("c", 2).unwrap();
        vocab.add_token_with_id("a", 0).unwrap();
        vocab.add_token_with_id("b", 1).unwrap();

        let tokens: Vec<_> = vocab.iter_ordered().collect();
        assert_eq!(tokens, vec![(0, "a"), (1, "b"), (2, "c")]);
    }
}
