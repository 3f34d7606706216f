//! Duet core - pure text editing engine.
//!
//! This crate contains the buffer, selection, undo history, and overlay
//! patching logic without any dependency on rendering or async runtimes.

pub mod buffer;
pub mod caret;
pub mod editor;
pub mod history;
pub mod overlay;
pub mod prefixes;
pub mod selection;
pub mod shortcuts;
pub mod tabouts;

pub use buffer::TextBuffer;
pub use caret::{CaretBinder, CaretRect, ViewportMetrics};
pub use editor::{ChangeListener, Editor, EditorConfig};
pub use history::{History, HistoryEntry, HistoryOptions};
pub use overlay::{DiffSpan, Overlay, OverlayLine, OverlayNode};
pub use prefixes::{LinePrefix, PrefixMode};
pub use selection::Selection;
pub use shortcuts::{KeyCombo, KeyboardShortcut, ShortcutAction};
pub use tabouts::TabOut;
