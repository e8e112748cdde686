//! Model persistence.
//!
//! A trained model is stored as one pretty-printed JSON document holding
//! the format version, special-token ids, vocabulary, ordered merges and
//! training settings.

pub mod format;
pub mod load;
pub mod save;

pub use format::{SerializedModel, FORMAT_VERSION};
pub use load::ModelLoader;
pub use save::ModelSaver;
