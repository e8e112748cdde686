//! Initial vocabulary construction.
//!
//! The seeded vocabulary is the four special tokens followed by every base
//! character, sorted by code point. Boost seeds are folded into the word
//! table as pseudo-frequency entries rather than added as atomic tokens.

use super::config::BoostTable;
use compact_str::CompactString;
use shabd_core::{
    Result, SpecialToken, SpecialTokensConfig, TokenizerError, Vocabulary, WORD_MARKER,
};
use std::collections::{BTreeMap, BTreeSet};

/// Word-frequency table: pre-token -> occurrence count.
///
/// Ordered so that word indices, and therefore training, never depend on
/// hash iteration order.
pub type WordTable = BTreeMap<CompactString, u64>;

/// Builds the initial symbol set for training.
#[derive(Debug, Clone)]
pub struct VocabularySeeder {
    special_tokens: SpecialTokensConfig,
    initial_alphabet: BTreeSet<char>,
}

impl VocabularySeeder {
    /// Create a seeder for the given special-token strings.
    pub fn new(special_tokens: SpecialTokensConfig) -> Self {
        Self {
            special_tokens,
            initial_alphabet: BTreeSet::new(),
        }
    }

    /// Characters to seed even if the corpus never uses them.
    pub fn with_initial_alphabet(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.initial_alphabet.extend(chars);
        self
    }

    /// Fold boost seeds into a word table.
    ///
    /// `split` turns a seed into its pre-tokens. Each piece gains the seed's
    /// weight rounded to an integer; zero-weight seeds contribute nothing.
    pub fn apply_boosts<F>(&self, words: &mut WordTable, boosts: &BoostTable, split: F) -> Result<()>
    where
        F: Fn(&str) -> Vec<String>,
    {
        boosts.validate()?;

        for (seed, weight) in boosts.iter() {
            let count = BoostTable::pseudo_count(weight);
            if count == 0 {
                continue;
            }
            for piece in split(seed) {
                if piece.is_empty() {
                    continue;
                }
                let entry = words.entry(CompactString::from(piece)).or_insert(0);
                *entry = entry.checked_add(count).ok_or_else(|| {
                    TokenizerError::InvalidConfig(format!(
                        "boost for {:?} overflows its word count",
                        seed
                    ))
                })?;
            }
        }

        Ok(())
    }

    /// Every base character: the word marker, the initial alphabet and each
    /// character in the word table, in code-point order.
    pub fn alphabet(&self, words: &WordTable) -> BTreeSet<char> {
        let mut alphabet = self.initial_alphabet.clone();
        alphabet.insert(WORD_MARKER);
        for word in words.keys() {
            alphabet.extend(word.chars());
        }
        alphabet
    }

    /// Build the initial vocabulary for a word table.
    pub fn seed(&self, words: &WordTable) -> Result<Vocabulary> {
        let alphabet = self.alphabet(words);
        let mut vocab = Vocabulary::with_special_tokens(
            &self.special_tokens,
            alphabet.len() + SpecialToken::COUNT,
        )?;

        let mut buf = [0u8; 4];
        for ch in alphabet {
            let symbol = ch.encode_utf8(&mut buf);
            if vocab.contains(symbol) {
                return Err(TokenizerError::InvalidConfig(format!(
                    "special token {:?} collides with a base character",
                    symbol
                )));
            }
            vocab.add_token(symbol)?;
        }

        Ok(vocab)
    }
}
