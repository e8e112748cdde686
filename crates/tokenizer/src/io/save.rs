//! Save functionality for trained models.

use super::format::{SerializedModel, FORMAT_VERSION};
use crate::tokenizer::Tokenizer;
use log::debug;
use shabd_core::{Result, SpecialToken, TokenizerError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Model saver - writes a tokenizer's model as one JSON document.
pub struct ModelSaver<'a> {
    tokenizer: &'a Tokenizer,
}

impl<'a> ModelSaver<'a> {
    /// Create a new model saver.
    pub fn new(tokenizer: &'a Tokenizer) -> Self {
        Self { tokenizer }
    }

    /// Save the model to `path`, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let serialized = self.serialize()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| TokenizerError::io(parent, e))?;
        }

        let file = File::create(path).map_err(|e| TokenizerError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &serialized)?;
        writer.flush().map_err(|e| TokenizerError::io(path, e))?;

        debug!(
            "Saved model to {} ({} tokens, {} merges)",
            path.display(),
            serialized.vocabulary.len(),
            serialized.merges.len()
        );
        Ok(())
    }

    /// Render the model as a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.serialize()?)?)
    }

    /// Serialize the model to a structure.
    pub fn serialize(&self) -> Result<SerializedModel> {
        let vocab = self.tokenizer.vocab();

        let special_tokens = SpecialToken::ALL
            .iter()
            .map(|t| (t.name().to_string(), t.id()))
            .collect();

        let vocabulary = vocab
            .iter_ordered()
            .map(|(id, token)| (id, token.to_string()))
            .collect();

        let symbol = |id: u32| {
            vocab
                .get_token(id)
                .map(str::to_string)
                .ok_or(TokenizerError::UnknownTokenId(id))
        };
        let merges = self
            .tokenizer
            .merges()
            .iter()
            .map(|(_, (left, right), _)| Ok((symbol(left)?, symbol(right)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(SerializedModel {
            version: FORMAT_VERSION,
            special_tokens,
            vocabulary,
            merges,
            config: *self.tokenizer.config(),
        })
    }
}
