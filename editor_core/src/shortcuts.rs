//! Keyboard shortcut registry and default bindings.

use crate::editor::Editor;
use crate::prefixes::PrefixMode;
use crate::selection::Selection;
use std::fmt;
use std::sync::Arc;

/// Action executed when a shortcut fires.
pub type ShortcutAction = Arc<dyn Fn(&mut Editor) + Send + Sync>;

/// A normalized key combination.
///
/// `key` is the lowercased main key; modifiers are tracked separately so
/// "Ctrl+Shift+X" and "ctrl+shift+x" dispatch identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyCombo {
    /// Creates a combination with no modifiers.
    pub fn key(key: &str) -> Self {
        Self {
            key: key.to_lowercase(),
            ctrl: false,
            shift: false,
            alt: false,
        }
    }

    /// Creates a ctrl+key combination.
    pub fn ctrl(key: &str) -> Self {
        Self {
            ctrl: true,
            ..Self::key(key)
        }
    }

    /// Creates a ctrl+shift+key combination.
    pub fn ctrl_shift(key: &str) -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::key(key)
        }
    }

    /// Parses a "ctrl+shift+x" style string. Returns `None` when the string
    /// has no main key or contains an unknown modifier.
    pub fn parse(s: &str) -> Option<Self> {
        let mut combo = Self::key("");
        let mut key = None;
        for part in s.split('+') {
            let part = part.trim().to_lowercase();
            match part.as_str() {
                "ctrl" | "control" | "meta" | "cmd" => combo.ctrl = true,
                "shift" => combo.shift = true,
                "alt" | "option" => combo.alt = true,
                "" => return None,
                _ => {
                    if key.replace(part).is_some() {
                        return None; // two main keys
                    }
                }
            }
        }
        combo.key = key?;
        Some(combo)
    }
}

/// A registered keyboard shortcut.
#[derive(Clone)]
pub struct KeyboardShortcut {
    /// Unique identifier, used by disable lists.
    pub id: String,
    pub combo: KeyCombo,
    pub action: ShortcutAction,
}

impl KeyboardShortcut {
    pub fn new(id: &str, combo: KeyCombo, action: ShortcutAction) -> Self {
        Self {
            id: id.to_string(),
            combo,
            action,
        }
    }
}

impl fmt::Debug for KeyboardShortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyboardShortcut")
            .field("id", &self.id)
            .field("combo", &self.combo)
            .finish_non_exhaustive()
    }
}

/// The built-in shortcut table.
pub fn default_shortcuts() -> Vec<KeyboardShortcut> {
    vec![
        KeyboardShortcut::new(
            "bold",
            KeyCombo::ctrl("b"),
            Arc::new(|e| e.toggle_selection_surrounding("**", "**")),
        ),
        KeyboardShortcut::new(
            "italic",
            KeyCombo::ctrl("i"),
            Arc::new(|e| e.toggle_selection_surrounding("*", "*")),
        ),
        KeyboardShortcut::new(
            "strikethrough",
            KeyCombo::ctrl_shift("x"),
            Arc::new(|e| e.toggle_selection_surrounding("~~", "~~")),
        ),
        KeyboardShortcut::new(
            "code",
            KeyCombo::ctrl("e"),
            Arc::new(|e| e.toggle_selection_surrounding("`", "`")),
        ),
        KeyboardShortcut::new(
            "quote",
            KeyCombo::ctrl_shift("."),
            Arc::new(|e| e.toggle_line_prefix("> ", PrefixMode::Repeat)),
        ),
        KeyboardShortcut::new(
            "link",
            KeyCombo::ctrl("k"),
            Arc::new(|e| {
                e.toggle_selection_surrounding("[", "]");
                // Selection now covers "[text]"; the url goes right after it.
                let position = e.selection().end;
                e.insert_at(position, "(url)");
                // Leave "url" selected so it can be typed over.
                e.set_selection(Selection::range(position + 1, position + 4));
            }),
        ),
        KeyboardShortcut::new(
            "bulletedList",
            KeyCombo::ctrl_shift("8"),
            Arc::new(|e| e.toggle_line_prefix("- ", PrefixMode::Repeat)),
        ),
        KeyboardShortcut::new(
            "numberedList",
            KeyCombo::ctrl_shift("7"),
            Arc::new(|e| e.toggle_line_prefix("1. ", PrefixMode::Detach)),
        ),
        KeyboardShortcut::new(
            "taskList",
            KeyCombo::ctrl_shift("9"),
            Arc::new(|e| e.toggle_line_prefix("- [ ] ", PrefixMode::Detach)),
        ),
        KeyboardShortcut::new("undo", KeyCombo::ctrl("z"), Arc::new(|e| e.undo())),
        KeyboardShortcut::new("redo", KeyCombo::ctrl("y"), Arc::new(|e| e.redo())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_combo() {
        assert_eq!(KeyCombo::parse("ctrl+b"), Some(KeyCombo::ctrl("b")));
        assert_eq!(
            KeyCombo::parse("Ctrl+Shift+X"),
            Some(KeyCombo::ctrl_shift("x"))
        );
        assert_eq!(KeyCombo::parse("k"), Some(KeyCombo::key("k")));
        assert_eq!(KeyCombo::parse("ctrl+"), None);
        assert_eq!(KeyCombo::parse("ctrl"), None);
        assert_eq!(KeyCombo::parse("a+b"), None);
    }

    #[test]
    fn test_default_ids_are_unique() {
        let shortcuts = default_shortcuts();
        let mut ids: Vec<_> = shortcuts.iter().map(|s| s.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), shortcuts.len());
    }
}
