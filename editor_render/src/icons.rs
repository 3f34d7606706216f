//! Toolbar icons and the built-in icon set.

use duet_md_core::editor::Editor;
use duet_md_core::prefixes::PrefixMode;
use duet_md_core::selection::Selection;
use duet_md_core::shortcuts::ShortcutAction;
use std::fmt;
use std::sync::Arc;

/// A toolbar icon. The host renders the button; the action reuses the same
/// editing operations the keyboard shortcuts do.
#[derive(Clone)]
pub struct Icon {
    /// Unique identifier, used by disable lists.
    pub id: String,
    /// Human-readable label for tooltips.
    pub label: String,
    pub action: ShortcutAction,
}

impl Icon {
    pub fn new(id: &str, label: &str, action: ShortcutAction) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            action,
        }
    }
}

impl fmt::Debug for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Icon")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// The built-in toolbar, in display order.
pub fn default_icons() -> Vec<Icon> {
    vec![
        Icon::new(
            "heading",
            "Heading",
            Arc::new(|e| e.toggle_line_prefix("### ", PrefixMode::Repeat)),
        ),
        Icon::new(
            "bold",
            "Bold",
            Arc::new(|e| e.toggle_selection_surrounding("**", "**")),
        ),
        Icon::new(
            "italic",
            "Italic",
            Arc::new(|e| e.toggle_selection_surrounding("*", "*")),
        ),
        Icon::new(
            "quote",
            "Quote",
            Arc::new(|e| e.toggle_line_prefix("> ", PrefixMode::Repeat)),
        ),
        Icon::new(
            "code",
            "Code",
            Arc::new(|e| e.toggle_selection_surrounding("`", "`")),
        ),
        Icon::new(
            "link",
            "Link",
            Arc::new(|e| {
                e.toggle_selection_surrounding("[", "]");
                let position = e.selection().end;
                e.insert_at(position, "(url)");
                e.set_selection(Selection::range(position + 1, position + 4));
            }),
        ),
        Icon::new(
            "bulletedList",
            "Bulleted list",
            Arc::new(|e| e.toggle_line_prefix("- ", PrefixMode::Repeat)),
        ),
        Icon::new(
            "numberedList",
            "Numbered list",
            Arc::new(|e| e.toggle_line_prefix("1. ", PrefixMode::Detach)),
        ),
        Icon::new(
            "taskList",
            "Task list",
            Arc::new(|e| e.toggle_line_prefix("- [ ] ", PrefixMode::Detach)),
        ),
        Icon::new(
            "strikethrough",
            "Strikethrough",
            Arc::new(|e| e.toggle_selection_surrounding("~~", "~~")),
        ),
    ]
}
