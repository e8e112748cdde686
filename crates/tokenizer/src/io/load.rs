//! Load functionality for saved models.
//!
//! Loading never produces a partially initialized model: the document is
//! checked for version, vocabulary consistency and merge ordering before a
//! tokenizer is built from it.

use super::format::{SerializedModel, FORMAT_VERSION};
use crate::tokenizer::Tokenizer;
use ahash::AHashSet;
use log::debug;
use shabd_core::{MergeRules, Result, SpecialToken, TokenizerError, Vocabulary};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

fn invalid(msg: impl Into<String>) -> TokenizerError {
    TokenizerError::Deserialization(msg.into())
}

/// Model loader - rebuilds a tokenizer from a saved model.
pub struct ModelLoader;

impl ModelLoader {
    /// Load a model from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Tokenizer> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TokenizerError::io(path, e))?;
        let reader = BufReader::new(file);

        let value: serde_json::Value = serde_json::from_reader(reader)
            .map_err(|e| invalid(format!("{}: {}", path.display(), e)))?;
        let tokenizer = Self::from_value(value)?;

        debug!(
            "Loaded model from {} ({} tokens, {} merges)",
            path.display(),
            tokenizer.vocab_size(),
            tokenizer.merges().len()
        );
        Ok(tokenizer)
    }

    /// Load a model from a JSON string.
    pub fn from_json(json: &str) -> Result<Tokenizer> {
        let value: serde_json::Value = serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;
        Self::from_value(value)
    }

    fn from_value(value: serde_json::Value) -> Result<Tokenizer> {
        // Check the version first so a newer layout reports a version error
        // rather than a missing field.
        let version = value
            .get("version")
            .ok_or_else(|| invalid("missing field `version`"))?;
        if version.as_u64() != Some(u64::from(FORMAT_VERSION)) {
            return Err(invalid(format!(
                "unsupported format version {} (expected {})",
                version, FORMAT_VERSION
            )));
        }

        let data: SerializedModel =
            serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
        Self::deserialize(data)
    }

    /// Validate a serialized model and build a tokenizer from it.
    pub fn deserialize(data: SerializedModel) -> Result<Tokenizer> {
        if data.version != FORMAT_VERSION {
            return Err(invalid(format!(
                "unsupported format version {} (expected {})",
                data.version, FORMAT_VERSION
            )));
        }

        if data.vocabulary.len() > data.config.vocab_size {
            return Err(invalid(format!(
                "vocabulary has {} entries, more than the configured size {}",
                data.vocabulary.len(),
                data.config.vocab_size
            )));
        }

        Self::check_special_tokens(&data)?;
        let vocab = Self::build_vocab(&data)?;
        let merges = Self::build_merges(&data, &vocab)?;

        Ok(Tokenizer::from_parts(vocab, merges, data.config))
    }

    fn check_special_tokens(data: &SerializedModel) -> Result<()> {
        for (name, &id) in &data.special_tokens {
            let token = SpecialToken::from_name(name)
                .ok_or_else(|| invalid(format!("unknown special token '{}'", name)))?;
            if token.id() != id {
                return Err(invalid(format!(
                    "special token '{}' has id {}, expected {}",
                    name,
                    id,
                    token.id()
                )));
            }
        }
        for token in SpecialToken::ALL {
            if !data.special_tokens.contains_key(token.name()) {
                return Err(invalid(format!(
                    "missing special token '{}'",
                    token.name()
                )));
            }
        }
        Ok(())
    }

    fn build_vocab(data: &SerializedModel) -> Result<Vocabulary> {
        if data.vocabulary.len() < SpecialToken::COUNT {
            return Err(invalid(format!(
                "vocabulary has {} entries, fewer than the special tokens",
                data.vocabulary.len()
            )));
        }

        let mut vocab = Vocabulary::with_capacity(data.vocabulary.len());
        for (expected, (&id, token)) in data.vocabulary.iter().enumerate() {
            if id as usize != expected {
                return Err(invalid(format!(
                    "vocabulary ids are not contiguous: expected {}, found {}",
                    expected, id
                )));
            }
            vocab
                .add_token_with_id(token, id)
                .map_err(|_| invalid(format!("duplicate symbol {:?} at id {}", token, id)))?;
        }

        Ok(vocab)
    }

    /// Every merge must name known symbols, produce a symbol that exists,
    /// and only consume base symbols or outputs of strictly earlier ranks.
    /// Symbols no merge produces are base characters.
    fn build_merges(data: &SerializedModel, vocab: &Vocabulary) -> Result<MergeRules> {
        let lookup = |symbol: &str, rank: usize| {
            vocab.get_id(symbol).ok_or_else(|| {
                invalid(format!("merge {} uses unknown symbol {:?}", rank, symbol))
            })
        };

        let mut resolved = Vec::with_capacity(data.merges.len());
        let mut outputs: AHashSet<u32> = AHashSet::with_capacity(data.merges.len());
        for (rank, (left, right)) in data.merges.iter().enumerate() {
            let pair = (lookup(left, rank)?, lookup(right, rank)?);
            let merged = format!("{}{}", left, right);
            let new_id = vocab.get_id(&merged).ok_or_else(|| {
                invalid(format!("merge {} output {:?} is not in the vocabulary", rank, merged))
            })?;
            if vocab.is_special(new_id) || !outputs.insert(new_id) {
                return Err(invalid(format!(
                    "merge {} output {:?} is produced more than once or is special",
                    rank, merged
                )));
            }
            resolved.push((pair, new_id));
        }

        for (id, token) in vocab.iter_ordered() {
            if !vocab.is_special(id) && !outputs.contains(&id) && token.chars().count() != 1 {
                return Err(invalid(format!(
                    "symbol {:?} at id {} is neither a character nor a merge output",
                    token, id
                )));
            }
        }

        let mut merges = MergeRules::with_capacity(resolved.len());
        let mut created: AHashSet<u32> = AHashSet::with_capacity(resolved.len());
        for (rank, (pair, new_id)) in resolved.into_iter().enumerate() {
            for input in [pair.0, pair.1] {
                let available = !vocab.is_special(input)
                    && (!outputs.contains(&input) || created.contains(&input));
                if !available {
                    return Err(invalid(format!(
                        "merge {} consumes id {} before it is created",
                        rank, input
                    )));
                }
            }
            merges
                .push(pair, new_id)
                .map_err(|e| invalid(format!("merge {}: {}", rank, e)))?;
            created.insert(new_id);
        }

        Ok(merges)
    }
}
