//! Training configuration.
//!
//! Everything that shapes the learned model lives here. Run options that do
//! not change the result (parallelism, cancellation) live on the trainer.

use serde::{Deserialize, Serialize};
use shabd_core::{Result, SpecialToken, SpecialTokensConfig, TokenizerError};
use std::collections::BTreeMap;

/// Largest accepted boost weight.
pub const MAX_BOOST_WEIGHT: f64 = u32::MAX as f64;

/// Seed strings with a pseudo-frequency weight.
///
/// Seeds bias early merges toward whole words or syllables. They are folded
/// into the word table before learning and are not persisted afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoostTable(BTreeMap<String, f64>);

impl BoostTable {
    /// Create an empty boost table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the weight of a seed, returning the previous weight.
    pub fn insert(&mut self, seed: impl Into<String>, weight: f64) -> Option<f64> {
        self.0.insert(seed.into(), weight)
    }

    /// Weight of a seed.
    pub fn get(&self, seed: &str) -> Option<f64> {
        self.0.get(seed).copied()
    }

    /// Iterate seeds in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.0.iter().map(|(seed, &weight)| (seed.as_str(), weight))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reject negative, NaN, infinite and oversized weights.
    pub fn validate(&self) -> Result<()> {
        for (seed, weight) in self.iter() {
            if !(0.0..=MAX_BOOST_WEIGHT).contains(&weight) {
                return Err(TokenizerError::InvalidConfig(format!(
                    "boost weight for {:?} must be between 0 and {}, got {}",
                    seed, MAX_BOOST_WEIGHT, weight
                )));
            }
        }
        Ok(())
    }

    /// Pseudo-frequency contributed by a weight: the weight rounded to the
    /// nearest integer.
    #[inline]
    pub fn pseudo_count(weight: f64) -> u64 {
        weight.round() as u64
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for BoostTable {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(s, w)| (s.into(), w)).collect())
    }
}

/// Configuration for BPE training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Target vocabulary size, special tokens included
    pub vocab_size: usize,
    /// Minimum frequency for a pair to be merged
    pub min_frequency: u64,
    /// Seed strings that bias early merges
    pub boost_table: BoostTable,
    /// Strings of the reserved tokens
    pub special_tokens: SpecialTokensConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            vocab_size: 8000,
            min_frequency: 2,
            boost_table: BoostTable::default(),
            special_tokens: SpecialTokensConfig::default(),
        }
    }
}

impl TrainingConfig {
    /// Default configuration with the given target vocabulary size.
    pub fn with_vocab_size(vocab_size: usize) -> Self {
        Self {
            vocab_size,
            ..Default::default()
        }
    }

    /// Checks that need no corpus.
    ///
    /// The bound against the base alphabet is checked by the trainer once
    /// the alphabet is known.
    pub fn validate(&self) -> Result<()> {
        if self.min_frequency < 1 {
            return Err(TokenizerError::InvalidConfig(
                "min_frequency must be at least 1".to_string(),
            ));
        }
        if self.vocab_size <= SpecialToken::COUNT {
            return Err(TokenizerError::InvalidConfig(format!(
                "vocab_size {} leaves no room beyond the {} special tokens",
                self.vocab_size,
                SpecialToken::COUNT
            )));
        }
        self.special_tokens.validate()?;
        self.boost_table.validate()
    }
}
