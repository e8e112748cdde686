//! Format definitions for model serialization.

use crate::tokenizer::ModelConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version written by this crate and the only one it loads.
pub const FORMAT_VERSION: u32 = 1;

/// Complete model serialization format.
///
/// Ordered maps keep the output byte-stable across saves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedModel {
    /// Format version
    pub version: u32,
    /// Role name -> fixed id
    pub special_tokens: BTreeMap<String, u32>,
    /// ID -> symbol, ascending
    pub vocabulary: BTreeMap<u32, String>,
    /// Merge inputs in rank order
    pub merges: Vec<(String, String)>,
    /// Training settings
    pub config: ModelConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let model = SerializedModel {
            version: FORMAT_VERSION,
            special_tokens: [("unk".to_string(), 0)].into_iter().collect(),
            vocabulary: [(0, "[UNK]".to_string()), (1, "त".to_string())]
                .into_iter()
                .collect(),
            merges: vec![("त".to_string(), "े".to_string())],
            config: ModelConfig {
                vocab_size: 100,
                min_frequency: 2,
            },
        };

        let value = serde_json::to_value(&model).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["special_tokens"]["unk"], 0);
        assert_eq!(value["vocabulary"]["1"], "त");
        assert_eq!(value["merges"][0][1], "े");
        assert_eq!(value["config"]["min_frequency"], 2);

        let back: SerializedModel = serde_json::from_value(value).unwrap();
        assert_eq!(back, model);
    }
}
