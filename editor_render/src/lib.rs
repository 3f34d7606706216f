//! Duet render - the extension pipeline and live preview engine.
//!
//! Builds on `duet-md-core`: extensions contribute shortcuts, icons,
//! transformers, and grammars; the pipeline merges them, converts markdown
//! to HTML, highlights fenced code, and schedules debounced re-renders.

pub mod error;
pub mod extension;
#[cfg(feature = "highlight")]
pub mod highlight;
pub mod icons;
pub mod pipeline;
pub mod scheduler;

pub use error::ConfigError;
pub use extension::{
    Component, Extension, GrammarRule, HighlightingRule, Listener, RenderListener, TransformFn,
    TransformStage, Transformer,
};
#[cfg(feature = "highlight")]
pub use highlight::Highlighter;
pub use icons::Icon;
pub use pipeline::{Disable, EditorOptions, MarkdownEditor, Sanitizer};
pub use scheduler::RenderScheduler;
