//! Main tokenizer implementation.
//!
//! This module provides the high-level `Tokenizer` struct that ties the
//! normalizer, the pre-tokenizer and the learned model together, and the
//! `TokenizerBuilder` that trains one.

use crate::pre_tokenizer::{Normalizer, Splitter, WordCounts};
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use shabd_core::{
    CharLevelEncoder, MergeRules, Result, SpecialToken, SpecialTokensConfig, TokenizerError,
    Vocabulary,
};
use shabd_training::{BoostTable, BpeTrainer, TrainingConfig, TrainingSummary};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Training settings persisted alongside the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub vocab_size: usize,
    pub min_frequency: u64,
}

impl From<&TrainingConfig> for ModelConfig {
    fn from(config: &TrainingConfig) -> Self {
        Self {
            vocab_size: config.vocab_size,
            min_frequency: config.min_frequency,
        }
    }
}

/// Builder for training a tokenizer.
#[derive(Debug, Clone)]
pub struct TokenizerBuilder {
    config: TrainingConfig,
    parallel: bool,
    initial_alphabet: Vec<char>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Default for TokenizerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenizerBuilder {
    /// Create a new tokenizer builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: TrainingConfig::default(),
            parallel: true,
            initial_alphabet: Vec::new(),
            cancel: None,
        }
    }

    /// Replace the whole training configuration.
    pub fn config(mut self, config: TrainingConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the target vocabulary size.
    pub fn vocab_size(mut self, size: usize) -> Self {
        self.config.vocab_size = size;
        self
    }

    /// Set the minimum frequency for merges.
    pub fn min_frequency(mut self, freq: u64) -> Self {
        self.config.min_frequency = freq;
        self
    }

    /// Add one boost seed.
    pub fn boost(mut self, seed: impl Into<String>, weight: f64) -> Self {
        self.config.boost_table.insert(seed, weight);
        self
    }

    /// Replace the boost table.
    pub fn boost_table(mut self, table: BoostTable) -> Self {
        self.config.boost_table = table;
        self
    }

    /// Set special tokens.
    pub fn with_special_tokens(mut self, tokens: SpecialTokensConfig) -> Self {
        self.config.special_tokens = tokens;
        self
    }

    /// Characters to include in the alphabet even if the corpus lacks them.
    pub fn initial_alphabet(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.initial_alphabet.extend(chars);
        self
    }

    /// Count words and pairs with rayon.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Flag that aborts training between merge steps once set.
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Train a tokenizer on corpus lines.
    pub fn train<S>(self, corpus: &[S]) -> Result<Tokenizer>
    where
        S: AsRef<str> + Sync,
    {
        self.train_with_summary(corpus).map(|(tokenizer, _)| tokenizer)
    }

    /// Train a tokenizer on corpus lines and report how training went.
    pub fn train_with_summary<S>(self, corpus: &[S]) -> Result<(Tokenizer, TrainingSummary)>
    where
        S: AsRef<str> + Sync,
    {
        self.config.validate()?;

        let normalizer = Normalizer::new();
        let splitter = Splitter::new();

        let mut counts = WordCounts::from_lines(corpus, &normalizer, &splitter, self.parallel);
        if counts.is_empty() {
            return Err(TokenizerError::Training(
                "corpus contains no words after normalization".to_string(),
            ));
        }
        info!(
            "Counted {} distinct pre-tokens ({} total) in {} lines",
            counts.len(),
            counts.total(),
            corpus.len()
        );

        let mut trainer = BpeTrainer::new(self.config.clone())
            .parallel(self.parallel)
            .initial_alphabet(self.initial_alphabet.iter().copied());
        if let Some(flag) = self.cancel {
            trainer = trainer.cancel_flag(flag);
        }

        let seed_splitter = Splitter::without_marker();
        trainer.seeder().apply_boosts(
            counts.table_mut(),
            &self.config.boost_table,
            |seed| seed_splitter.split(&normalizer.normalize(seed)),
        )?;

        let model = trainer.train(counts.table())?;
        let tokenizer = Tokenizer::from_parts(
            model.vocab,
            model.merges,
            ModelConfig::from(&self.config),
        );

        Ok((tokenizer, model.summary))
    }
}

/// Main tokenizer struct.
///
/// The model is read-only and shared, so a tokenizer can be cloned cheaply
/// and used from any number of threads.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    /// Encoder over the shared vocabulary and merge rules
    encoder: CharLevelEncoder,
    /// Settings the model was trained with
    config: ModelConfig,
    /// Unicode normalizer
    normalizer: Normalizer,
    /// Text splitter
    splitter: Splitter,
}

impl Tokenizer {
    /// Create a tokenizer builder.
    pub fn builder() -> TokenizerBuilder {
        TokenizerBuilder::new()
    }

    /// Wrap an already validated model.
    pub(crate) fn from_parts(vocab: Vocabulary, merges: MergeRules, config: ModelConfig) -> Self {
        Self {
            encoder: CharLevelEncoder::new(Arc::new(vocab), Arc::new(merges)),
            config,
            normalizer: Normalizer::new(),
            splitter: Splitter::new(),
        }
    }

    /// Normalize text the way `encode` does.
    pub fn normalize(&self, text: &str) -> String {
        self.normalizer.normalize(text)
    }

    /// Encode text to token IDs.
    ///
    /// A word spelling a special token, such as `[BOS]`, encodes to that
    /// token's id instead of being split into characters.
    ///
    /// # Arguments
    /// * `text` - The text to encode
    /// * `add_special_tokens` - Whether to wrap the sequence in `[BOS]` and `[EOS]`
    pub fn encode(&self, text: &str, add_special_tokens: bool) -> Result<Encoding> {
        let normalized = self.normalizer.normalize(text);

        let mut ids = Vec::with_capacity(normalized.len() / 2 + 2);
        if add_special_tokens {
            ids.push(SpecialToken::Bos.id());
        }
        for word in normalized.split(' ').filter(|w| !w.is_empty()) {
            match self.special_word(word) {
                Some(token) => self.encoder.encode_special_word(token, &mut ids),
                None => self.splitter.for_each_pre_token(word, |piece| {
                    self.encoder.encode_word(piece, &mut ids);
                }),
            }
        }
        if add_special_tokens {
            ids.push(SpecialToken::Eos.id());
        }

        let tokens = ids
            .iter()
            .map(|&id| {
                self.id_to_token(id)
                    .map(str::to_string)
                    .ok_or(TokenizerError::UnknownTokenId(id))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Encoding { ids, tokens })
    }

    fn special_word(&self, word: &str) -> Option<SpecialToken> {
        self.vocab().get_id(word).and_then(SpecialToken::from_id)
    }

    /// Encode a batch of texts in parallel.
    ///
    /// Each item succeeds or fails on its own; results keep input order.
    pub fn encode_batch<S>(&self, texts: &[S], add_special_tokens: bool) -> Vec<Result<Encoding>>
    where
        S: AsRef<str> + Sync,
    {
        texts
            .par_iter()
            .map(|text| self.encode(text.as_ref(), add_special_tokens))
            .collect()
    }

    /// Decode token IDs back to normalized text.
    ///
    /// # Arguments
    /// * `ids` - The token IDs to decode
    /// * `skip_special_tokens` - Drop special tokens instead of rendering their strings
    pub fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String> {
        self.encoder.decode(ids, skip_special_tokens)
    }

    /// Decode a batch of id sequences in parallel.
    ///
    /// Each item succeeds or fails on its own; results keep input order.
    pub fn decode_batch<V>(&self, batch: &[V], skip_special_tokens: bool) -> Vec<Result<String>>
    where
        V: AsRef<[u32]> + Sync,
    {
        batch
            .par_iter()
            .map(|ids| self.decode(ids.as_ref(), skip_special_tokens))
            .collect()
    }

    /// Get the ID of a token string.
    pub fn token_to_id(&self, token: &str) -> Option<u32> {
        self.vocab().get_id(token)
    }

    /// Get the token string of an ID.
    pub fn id_to_token(&self, id: u32) -> Option<&str> {
        self.vocab().get_token(id)
    }

    /// Get the vocabulary size.
    pub fn vocab_size(&self) -> usize {
        self.vocab().len()
    }

    /// Get a reference to the vocabulary.
    pub fn vocab(&self) -> &Vocabulary {
        self.encoder.vocab()
    }

    /// Get the merge rules in rank order.
    pub fn merges(&self) -> &MergeRules {
        self.encoder.merges()
    }

    /// Settings the model was trained with.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Save the model to a single JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        crate::io::ModelSaver::new(self).save(path)
    }

    /// Load a model saved by [`Tokenizer::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        crate::io::ModelLoader::load(path)
    }
}

impl std::str::FromStr for Tokenizer {
    type Err = TokenizerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        crate::io::ModelLoader::from_json(s)
    }
}

/// Result of encoding text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoding {
    /// Token IDs
    pub ids: Vec<u32>,
    /// Symbol string of each ID
    pub tokens: Vec<String>,
}

impl Encoding {
    /// Get the number of tokens.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if the encoding is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
