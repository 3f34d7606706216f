//! Configuration errors surfaced while merging extensions.

use thiserror::Error;

/// Fatal problems in the merged extension configuration.
///
/// These are raised by [`crate::pipeline::MarkdownEditor::new`] before any
/// editor is created, so a broken extension never ships a half-configured
/// pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An extension contributed an item with an empty id.
    #[error("{category} contribution has an empty id")]
    EmptyId { category: &'static str },

    /// Two extensions contributed the same id in the same category.
    #[error("duplicate {category} id `{id}`")]
    DuplicateId { category: &'static str, id: String },

    /// A tab-out rule with nothing to jump over.
    #[error("tab-out `{id}` has an empty delimiter")]
    EmptyDelimiter { id: String },

    /// A shortcut whose key combination has no main key.
    #[error("shortcut `{id}` has no main key")]
    EmptyKey { id: String },
}
