//! BPE trainer implementation.
//!
//! This module implements the merge learner: starting from the seeded
//! vocabulary, it repeatedly merges the most frequent adjacent pair until the
//! target vocabulary size is reached, the best pair falls below the frequency
//! floor, or no pairs remain.

use super::config::TrainingConfig;
use super::counter::PairCounter;
use super::seed::{VocabularySeeder, WordTable};
use ahash::AHashSet;
use log::{debug, info, warn};
use shabd_core::{
    MergeCandidate, MergeRules, Pair, PairPriorityQueue, Result, SpecialToken, TokenizerError,
    Vocabulary,
};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Why the merge loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The vocabulary reached `vocab_size`
    TargetVocabReached,
    /// The most frequent remaining pair occurs fewer than `min_frequency` times
    BelowMinFrequency,
    /// Every word is a single symbol, or every remaining pair was skipped
    NoPairsLeft,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            StopReason::TargetVocabReached => "target vocabulary size reached",
            StopReason::BelowMinFrequency => "best pair below minimum frequency",
            StopReason::NoPairsLeft => "no pairs left to merge",
        };
        f.write_str(reason)
    }
}

/// Statistics about a finished training run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingSummary {
    /// Distinct words in the table, boost seeds included
    pub word_count: usize,
    /// Number of base characters
    pub alphabet_size: usize,
    /// Number of merge rules learned
    pub merges_learned: usize,
    /// Pairs skipped because their concatenation was already a symbol
    pub skipped_pairs: usize,
    pub stop_reason: StopReason,
}

/// Output of a training run.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub vocab: Vocabulary,
    pub merges: MergeRules,
    pub summary: TrainingSummary,
}

/// BPE trainer.
///
/// Each call to [`BpeTrainer::train`] owns its pair counts, inverted index and
/// word segmentations; nothing outlives the call except the returned model.
#[derive(Debug, Clone)]
pub struct BpeTrainer {
    /// Configuration
    config: TrainingConfig,
    /// Whether initial pair counting uses rayon
    parallel: bool,
    /// Characters seeded even if absent from the corpus
    initial_alphabet: Vec<char>,
    /// Checked before every merge step
    cancel: Option<Arc<AtomicBool>>,
}

impl BpeTrainer {
    /// Create a new BPE trainer with the given configuration.
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            parallel: true,
            initial_alphabet: Vec::new(),
            cancel: None,
        }
    }

    /// Create a new BPE trainer with default configuration.
    pub fn with_vocab_size(vocab_size: usize) -> Self {
        Self::new(TrainingConfig::with_vocab_size(vocab_size))
    }

    /// Enable or disable parallel pair counting. Results are identical.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Characters to seed regardless of the corpus.
    pub fn initial_alphabet(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.initial_alphabet.extend(chars);
        self
    }

    /// Abort training with [`TokenizerError::Cancelled`] once the flag is set.
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// The seeder this trainer uses for its initial vocabulary.
    pub fn seeder(&self) -> VocabularySeeder {
        VocabularySeeder::new(self.config.special_tokens.clone())
            .with_initial_alphabet(self.initial_alphabet.iter().copied())
    }

    /// Learn a vocabulary and ordered merge rules from a word table.
    ///
    /// The table must already include any boost seeds; see
    /// [`VocabularySeeder::apply_boosts`].
    pub fn train(&self, words: &WordTable) -> Result<TrainedModel> {
        self.config.validate()?;

        if words.values().all(|&count| count == 0) {
            return Err(TokenizerError::Training(
                "corpus contains no words after normalization".to_string(),
            ));
        }

        let mut vocab = self.seeder().seed(words)?;
        let base_size = vocab.len();
        let alphabet_size = base_size - SpecialToken::COUNT;

        if self.config.vocab_size <= base_size {
            return Err(TokenizerError::InvalidConfig(format!(
                "vocab_size {} must exceed the {} base characters plus {} special tokens",
                self.config.vocab_size,
                alphabet_size,
                SpecialToken::COUNT
            )));
        }

        let mut counter = PairCounter::from_word_table(words, &vocab)?;
        counter.build_index(self.parallel);

        info!(
            "Training BPE: {} words ({} occurrences), {} base characters, target vocab {}",
            counter.word_count(),
            counter.total_word_occurrences(),
            alphabet_size,
            self.config.vocab_size
        );

        let mut queue = PairPriorityQueue::with_capacity(counter.pair_counts().len());
        for (&pair, &count) in counter.pair_counts() {
            queue.push(candidate(&vocab, pair, count)?);
        }

        let mut merges = MergeRules::with_capacity(self.config.vocab_size - base_size);
        let mut skipped: AHashSet<Pair> = AHashSet::new();

        let stop_reason = loop {
            self.check_cancelled()?;

            if vocab.len() >= self.config.vocab_size {
                break StopReason::TargetVocabReached;
            }

            let Some(best) = queue.pop() else {
                break StopReason::NoPairsLeft;
            };

            if best.count < self.config.min_frequency {
                break StopReason::BelowMinFrequency;
            }

            let merged = best.merged();
            if vocab.contains(&merged) {
                warn!(
                    "Skipping pair ({:?}, {:?}): {:?} is already in the vocabulary",
                    best.left, best.right, merged
                );
                skipped.insert(best.pair);
                continue;
            }

            let new_token_id = vocab.add_token(&merged)?;
            let rank = merges.push(best.pair, new_token_id)?;
            debug!(
                "Merge {}: {:?} + {:?} -> {:?} (count {})",
                rank, best.left, best.right, merged, best.count
            );

            for (pair, count) in counter.merge_pair(best.pair, new_token_id) {
                if count == 0 {
                    queue.remove(pair);
                } else if !skipped.contains(&pair) {
                    queue.push(candidate(&vocab, pair, count)?);
                }
            }
        };

        let summary = TrainingSummary {
            word_count: counter.word_count(),
            alphabet_size,
            merges_learned: merges.len(),
            skipped_pairs: skipped.len(),
            stop_reason,
        };

        info!(
            "Training finished: {} merges, vocab size {} ({})",
            summary.merges_learned,
            vocab.len(),
            summary.stop_reason
        );

        Ok(TrainedModel {
            vocab,
            merges,
            summary,
        })
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => {
                info!("Training cancelled");
                Err(TokenizerError::Cancelled)
            }
            _ => Ok(()),
        }
    }
}

/// Build a queue entry carrying the symbol strings used for tie-breaking.
fn candidate(vocab: &Vocabulary, pair: Pair, count: u64) -> Result<MergeCandidate> {
    let symbol = |id: u32| {
        vocab
            .get_token(id)
            .ok_or_else(|| TokenizerError::InvalidMerge(format!("token id {} has no symbol", id)))
    };
    Ok(MergeCandidate::new(pair, count, symbol(pair.0)?, symbol(pair.1)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use compact_str::CompactString;

    fn table(entries: &[(&str, u64)]) -> WordTable {
        entries
            .iter()
            .map(|&(w, c)| (CompactString::from(w), c))
            .collect()
    }

    fn merge_strings(model: &TrainedModel) -> Vec<(String, String)> {
        model
            .merges
            .iter()
            .map(|(_, (l, r), _)| {
                (
                    model.vocab.get_token(l).unwrap().to_string(),
                    model.vocab.get_token(r).unwrap().to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn test_basic_training() {
        let trainer = BpeTrainer::with_vocab_size(100);
        let model = trainer
            .train(&table(&[("\u{2581}aaab", 3), ("\u{2581}daab", 2), ("\u{2581}ac", 1)]))
            .unwrap();

        assert!(!model.merges.is_empty());
        assert_eq!(
            model.vocab.len(),
            SpecialToken::COUNT + model.summary.alphabet_size + model.merges.len()
        );
        assert!(model.vocab.is_contiguous());
    }

    #[test]
    fn test_first_merges_follow_tie_break() {
        let trainer = BpeTrainer::with_vocab_size(28);
        let model = trainer
            .train(&table(&[
                ("\u{2581}नमस्ते", 8),
                ("\u{2581}दुनिया", 5),
                ("\u{2581}भारत", 3),
            ]))
            .unwrap();

        let merges = merge_strings(&model);
        assert_eq!(merges[0], ("त".to_string(), "े".to_string()));
        assert_eq!(merges[1], ("न".to_string(), "म".to_string()));
        assert_eq!(model.summary.alphabet_size, 14);
    }

    #[test]
    fn test_stops_at_target_vocab() {
        let trainer = BpeTrainer::with_vocab_size(20);
        let model = trainer
            .train(&table(&[("\u{2581}abcdefgh", 10)]))
            .unwrap();

        assert_eq!(model.vocab.len(), 20);
        assert_eq!(model.summary.stop_reason, StopReason::TargetVocabReached);
    }

    #[test]
    fn test_min_frequency_filter() {
        let trainer = BpeTrainer::new(TrainingConfig {
            vocab_size: 100,
            min_frequency: 100,
            ..Default::default()
        });
        let model = trainer.train(&table(&[("\u{2581}ab", 3)])).unwrap();

        assert!(model.merges.is_empty());
        assert_eq!(model.summary.stop_reason, StopReason::BelowMinFrequency);
    }

    #[test]
    fn test_no_pairs_left() {
        let trainer = BpeTrainer::new(TrainingConfig {
            vocab_size: 100,
            min_frequency: 1,
            ..Default::default()
        });
        let model = trainer.train(&table(&[("\u{2581}ab", 1)])).unwrap();

        assert_eq!(model.merges.len(), 2);
        assert_eq!(model.summary.stop_reason, StopReason::NoPairsLeft);
    }

    #[test]
    fn test_existing_symbol_is_skipped() {
        // "ab" is a special-token string, so (a, b) can never be merged.
        let mut config = TrainingConfig {
            vocab_size: 100,
            min_frequency: 1,
            ..Default::default()
        };
        config.special_tokens.pad = "ab".to_string();

        let model = BpeTrainer::new(config)
            .train(&table(&[("ab", 5), ("\u{2581}c", 1)]))
            .unwrap();

        let merges = merge_strings(&model);
        assert!(!merges.contains(&("a".to_string(), "b".to_string())));
        assert_eq!(model.summary.skipped_pairs, 1);
        assert_eq!(
            model.vocab.len(),
            SpecialToken::COUNT + model.summary.alphabet_size + model.merges.len()
        );
    }

    #[test]
    fn test_deterministic() {
        let words = table(&[
            ("\u{2581}abab", 4),
            ("\u{2581}baba", 4),
            ("\u{2581}cdcd", 4),
            ("\u{2581}dcdc", 4),
        ]);
        let a = BpeTrainer::with_vocab_size(30).train(&words).unwrap();
        let b = BpeTrainer::with_vocab_size(30)
            .parallel(false)
            .train(&words)
            .unwrap();

        assert_eq!(merge_strings(&a), merge_strings(&b));
        let ids_a: Vec<_> = a.vocab.iter_ordered().collect();
        let ids_b: Vec<_> = b.vocab.iter_ordered().collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn test_empty_corpus() {
        let trainer = BpeTrainer::with_vocab_size(100);
        assert!(matches!(
            trainer.train(&WordTable::new()),
            Err(TokenizerError::Training(_))
        ));
    }

    #[test]
    fn test_vocab_size_too_small_for_alphabet() {
        // 4 specials + marker + a + b = 7
        let trainer = BpeTrainer::with_vocab_size(7);
        assert!(matches!(
            trainer.train(&table(&[("\u{2581}ab", 5)])),
            Err(TokenizerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_cancelled() {
        let flag = Arc::new(AtomicBool::new(true));
        let trainer = BpeTrainer::with_vocab_size(100).cancel_flag(flag);
        assert!(matches!(
            trainer.train(&table(&[("\u{2581}ab", 5)])),
            Err(TokenizerError::Cancelled)
        ));
    }
}
