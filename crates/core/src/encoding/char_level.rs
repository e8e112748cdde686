//! Character-level BPE encoding.
//!
//! Every pre-token starts as one symbol per Unicode scalar value. Merge
//! rules are then applied in ascending rank: the lowest-rank pair present
//! anywhere in the sequence is replaced at all of its non-overlapping
//! left-to-right occurrences, exactly as the learner rewrote training words.

use crate::core::{MergeRules, Pair, SpecialToken, Vocabulary};
use crate::{Result, TokenizerError};
use std::sync::Arc;

/// Marks the first symbol of every word. Decoding turns it back into a space.
pub const WORD_MARKER: char = '\u{2581}';

/// Character-level BPE encoder and decoder over a read-only model.
///
/// Cloning is cheap; the vocabulary and merge rules are shared.
#[derive(Debug, Clone)]
pub struct CharLevelEncoder {
    vocab: Arc<Vocabulary>,
    merges: Arc<MergeRules>,
}

impl CharLevelEncoder {
    /// Create a new character-level encoder.
    pub fn new(vocab: Arc<Vocabulary>, merges: Arc<MergeRules>) -> Self {
        Self { vocab, merges }
    }

    /// The shared vocabulary.
    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// The shared merge rules.
    pub fn merges(&self) -> &MergeRules {
        &self.merges
    }

    /// Encode a single pre-token, appending its ids to `out`.
    ///
    /// Characters missing from the vocabulary become `[UNK]`.
    pub fn encode_word(&self, word: &str, out: &mut Vec<u32>) {
        let mut symbols: Vec<u32> = word
            .chars()
            .map(|ch| {
                self.symbol_id(ch)
                    .unwrap_or_else(|_| SpecialToken::Unk.id())
            })
            .collect();

        self.apply_merges(&mut symbols);
        out.extend(symbols);
    }

    fn symbol_id(&self, ch: char) -> Result<u32> {
        let mut buf = [0u8; 4];
        let symbol = ch.encode_utf8(&mut buf);
        self.vocab
            .get_id(symbol)
            .ok_or_else(|| TokenizerError::UnknownSymbol(symbol.to_string()))
    }

    /// Apply merge rules to a symbol sequence until none matches.
    pub fn apply_merges(&self, symbols: &mut Vec<u32>) {
        while symbols.len() >= 2 {
            let best = symbols
                .windows(2)
                .filter_map(|w| {
                    let pair = (w[0], w[1]);
                    self.merges.get(pair).map(|(rank, id)| (rank, pair, id))
                })
                .min_by_key(|&(rank, _, _)| rank);

            match best {
                Some((_, pair, new_id)) => replace_pair(symbols, pair, new_id),
                None => break,
            }
        }
    }

    /// Encode a word that spells a special token.
    ///
    /// `[UNK]` is encoded like any one-character unknown word, as the word
    /// marker followed by `[UNK]`. The other special tokens are one id each.
    pub fn encode_special_word(&self, token: SpecialToken, out: &mut Vec<u32>) {
        if token.is_inline() {
            out.push(
                self.symbol_id(WORD_MARKER)
                    .unwrap_or_else(|_| SpecialToken::Unk.id()),
            );
        }
        out.push(token.id());
    }

    /// Decode token IDs back to normalized text.
    ///
    /// Any id without a vocabulary entry fails the whole call. Special
    /// tokens are dropped when `skip_special_tokens` is set and rendered as
    /// their literal strings otherwise. Rendered word-level special tokens
    /// are separated from their neighbours by a space.
    pub fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String> {
        let mut text = String::with_capacity(ids.len() * 4);

        for &id in ids {
            let token = self
                .vocab
                .get_token(id)
                .ok_or(TokenizerError::UnknownTokenId(id))?;

            if let Some(special) = SpecialToken::from_id(id) {
                if !skip_special_tokens {
                    if !special.is_inline() && !text.is_empty() && !text.ends_with(' ') {
                        text.push(' ');
                    }
                    text.push_str(token);
                }
                continue;
            }

            for ch in token.chars() {
                text.push(if ch == WORD_MARKER { ' ' } else { ch });
            }
        }

        if text.starts_with(' ') {
            text.remove(0);
        }
        Ok(text)
    }
}

/// Replace every non-overlapping occurrence of `pair`, scanning left to right.
pub fn replace_pair(symbols: &mut Vec<u32>, pair: Pair, new_id: u32) {
    let mut write = 0;
    let mut read = 0;
    let len = symbols.len();

    while read < len {
        if read + 1 < len && symbols[read] == pair.0 && symbols[read + 1] == pair.1 {
            symbols[write] = new_id;
            read += 2;
        } else {
            symbols[write] = symbols[read];
            read += 1;
        }
        write += 1;
    }

    symbols.truncate(write);
}
