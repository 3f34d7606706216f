//! Selection-aware text mutation engine.
//!
//! [`Editor`] owns the single text buffer and its selection. Every mutating
//! operation captures the pre-state into [`History`], computes the new
//! buffer and selection, and synchronously notifies change listeners with
//! `(new_text, selection)`.

use crate::buffer::TextBuffer;
use crate::history::{History, HistoryOptions};
use crate::prefixes::{default_prefixes, split_numeric_marker, LinePrefix, PrefixMode};
use crate::selection::Selection;
use crate::shortcuts::{default_shortcuts, KeyCombo, KeyboardShortcut};
use crate::tabouts::{default_tab_outs, TabOut};
use std::sync::Arc;

/// Listener invoked with `(new_text, selection)` on every committed mutation.
pub type ChangeListener = Arc<dyn Fn(&str, Selection) + Send + Sync>;

/// Name of the input event forwarded to named event listeners.
const INPUT_EVENT: &str = "input";

/// Static configuration for an [`Editor`] instance.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub shortcuts: Vec<KeyboardShortcut>,
    pub prefixes: Vec<LinePrefix>,
    pub tab_outs: Vec<TabOut>,
    pub history: HistoryOptions,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            shortcuts: default_shortcuts(),
            prefixes: default_prefixes(),
            tab_outs: default_tab_outs(),
            history: HistoryOptions::default(),
        }
    }
}

/// The text editing engine.
pub struct Editor {
    buffer: TextBuffer,
    selection: Selection,
    history: History,
    shortcuts: Vec<KeyboardShortcut>,
    prefixes: Vec<LinePrefix>,
    tab_outs: Vec<TabOut>,
    change_listeners: Vec<ChangeListener>,
    event_listeners: Vec<(String, ChangeListener)>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// Creates an empty editor with the default tables.
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    /// Creates an empty editor from a merged configuration.
    pub fn with_config(config: EditorConfig) -> Self {
        Self {
            buffer: TextBuffer::new(),
            selection: Selection::default(),
            history: History::new(config.history),
            shortcuts: config.shortcuts,
            prefixes: config.prefixes,
            tab_outs: config.tab_outs,
            change_listeners: Vec::new(),
            event_listeners: Vec::new(),
        }
    }

    /// Returns the buffer text.
    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    /// Returns a reference to the buffer.
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// Returns the current selection.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Sets the selection, clamped to the buffer. Selection-only changes do
    /// not emit a buffer-changed notification.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = Selection::range(selection.start, selection.end)
            .clamped(self.buffer.len_chars());
    }

    /// Returns a reference to the undo history.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Registers a buffer-changed listener.
    pub fn on_change(&mut self, listener: ChangeListener) {
        self.change_listeners.push(listener);
    }

    /// Registers a named input-event listener (extension contributions whose
    /// event name is not a render-lifecycle name end up here).
    pub fn add_event_listener(&mut self, name: &str, listener: ChangeListener) {
        self.event_listeners.push((name.to_string(), listener));
    }

    fn capture(&mut self) {
        let value = self.buffer.to_string();
        self.history.save_state(&value, self.selection);
    }

    fn emit_change(&self) {
        let text = self.buffer.to_string();
        for listener in &self.change_listeners {
            listener(&text, self.selection);
        }
        for (name, listener) in &self.event_listeners {
            if name == INPUT_EVENT {
                listener(&text, self.selection);
            }
        }
    }

    /// Replaces the whole buffer (host synchronization path).
    pub fn set_text(&mut self, text: &str) {
        self.capture();
        self.buffer = TextBuffer::from_str(text);
        self.selection = self.selection.clamped(self.buffer.len_chars());
        self.emit_change();
    }

    /// Inserts text at the given character position, shifting the selection
    /// when the insertion lands at or before it.
    pub fn insert_at(&mut self, position: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        self.capture();
        let position = position.min(self.buffer.len_chars());
        self.buffer.insert(position, text);
        let n = text.chars().count();
        let mut sel = self.selection;
        if position <= sel.start {
            sel = sel.shifted(n as isize);
        } else if position < sel.end {
            sel.end += n;
        }
        self.selection = sel;
        self.emit_change();
    }

    /// Replaces the selected range with the given text (typing/paste path)
    /// and leaves the caret after it.
    pub fn replace_selection(&mut self, text: &str) {
        self.capture();
        let sel = self.selection;
        self.buffer.remove(sel.start, sel.end);
        self.buffer.insert(sel.start, text);
        self.selection = Selection::at(sel.start + text.chars().count());
        self.emit_change();
    }

    /// Toggles the given open/close tokens around the selection. Symmetric
    /// tokens pass the same string twice.
    ///
    /// Toggle-on inserts the tokens and extends the selection to cover them;
    /// toggle-off recognizes tokens either at the selection's inner edges or
    /// immediately outside it, so applying the operation twice restores the
    /// original text and selection bounds.
    pub fn toggle_selection_surrounding(&mut self, open: &str, close: &str) {
        if open.is_empty() && close.is_empty() {
            return;
        }
        let sel = self.selection;
        let o = open.chars().count();
        let c = close.chars().count();

        // Tokens at the selection's inner edges (the state toggle-on leaves).
        let selected = self.buffer.slice(sel.start, sel.end);
        if sel.len() >= o + c && selected.starts_with(open) && selected.ends_with(close) {
            self.capture();
            self.buffer.remove(sel.end - c, sel.end);
            self.buffer.remove(sel.start, sel.start + o);
            self.selection = Selection::range(sel.start, sel.end - o - c);
            self.emit_change();
            return;
        }

        // Tokens immediately outside the selection.
        let before = self.buffer.slice(sel.start.saturating_sub(o), sel.start);
        let after = self.buffer.slice(sel.end, sel.end + c);
        if sel.start >= o && before == open && after == close {
            self.capture();
            self.buffer.remove(sel.end, sel.end + c);
            self.buffer.remove(sel.start - o, sel.start);
            self.selection = Selection::range(sel.start - o, sel.end - o);
            self.emit_change();
            return;
        }

        self.capture();
        self.buffer.insert(sel.end, close);
        self.buffer.insert(sel.start, open);
        self.selection = Selection::range(sel.start, sel.end + o + c);
        self.emit_change();
    }

    /// Toggles a literal prefix on every full line intersecting the
    /// selection. See [`PrefixMode`] for the two marker behaviors.
    pub fn toggle_line_prefix(&mut self, prefix: &str, mode: PrefixMode) {
        if prefix.is_empty() {
            return;
        }
        let sel = self.selection;
        let first_line = self.buffer.char_to_line_col(sel.start).0;
        let last_line = self.buffer.char_to_line_col(sel.end).0;

        let numeric = match mode {
            PrefixMode::Detach => split_numeric_marker(prefix),
            PrefixMode::Repeat => None,
        };

        let marker_len_at = |line_text: &str| -> Option<usize> {
            if let Some((_, rest)) = numeric {
                let digits: String = line_text
                    .chars()
                    .take_while(|ch| ch.is_ascii_digit())
                    .collect();
                if !digits.is_empty() && line_text[digits.len()..].starts_with(rest) {
                    return Some(digits.len() + rest.chars().count());
                }
                None
            } else {
                line_text
                    .starts_with(prefix)
                    .then(|| prefix.chars().count())
            }
        };

        let first_text = self.buffer.line(first_line).unwrap_or_default();
        let turning_on = marker_len_at(&first_text).is_none();

        self.capture();
        let mut total_delta: isize = 0;
        let mut first_delta: isize = 0;
        // Last-to-first keeps earlier line offsets valid while editing.
        for line in (first_line..=last_line).rev() {
            let text = self.buffer.line(line).unwrap_or_default();
            let start = self.buffer.line_start(line);
            let delta = if turning_on {
                let marker = match numeric {
                    Some((base, rest)) => {
                        format!("{}{rest}", base + (line - first_line) as u64)
                    }
                    None => prefix.to_string(),
                };
                self.buffer.insert(start, &marker);
                marker.chars().count() as isize
            } else if let Some(len) = marker_len_at(&text) {
                self.buffer.remove(start, start + len);
                -(len as isize)
            } else {
                // Unmarked line while toggling off: leave it unchanged.
                0
            };
            total_delta += delta;
            if line == first_line {
                first_delta = delta;
            }
        }

        let line_start = self.buffer.line_start(first_line);
        let new_start = if first_delta >= 0 {
            sel.start + first_delta as usize
        } else {
            sel.start
                .saturating_sub(first_delta.unsigned_abs())
                .max(line_start)
        };
        let new_end = ((sel.end as isize) + total_delta).max(new_start as isize) as usize;
        self.selection =
            Selection::range(new_start, new_end).clamped(self.buffer.len_chars());
        self.emit_change();
    }

    /// Tab key handling: when the caret sits immediately before a registered
    /// closing delimiter, moves it past the delimiter and returns true.
    /// Otherwise returns false so the caller applies default tab behavior.
    pub fn handle_tab(&mut self) -> bool {
        if !self.selection.is_caret() {
            return false;
        }
        let pos = self.selection.start;
        let mut matched = None;
        for tab_out in &self.tab_outs {
            let n = tab_out.delimiter.chars().count();
            if n == 0 || self.buffer.slice(pos, pos + n) != tab_out.delimiter {
                continue;
            }
            // Longest delimiter wins ("**" over "*").
            if matched.map_or(true, |m| n > m) {
                matched = Some(n);
            }
        }
        match matched {
            Some(n) => {
                self.selection = Selection::at(pos + n);
                true
            }
            None => false,
        }
    }

    /// Enter key handling: continues the list marker of the current line, or
    /// removes the marker when the line holds nothing else. Returns false
    /// when no prefix rule matches, so the caller inserts a plain newline.
    pub fn handle_newline(&mut self) -> bool {
        let sel = self.selection;
        let (line_idx, _) = self.buffer.char_to_line_col(sel.start);
        let line = self.buffer.line(line_idx).unwrap_or_default();
        let Some((rule, marker)) = self
            .prefixes
            .iter()
            .find_map(|r| (r.matcher)(&line).map(|m| (r.clone(), m)))
        else {
            return false;
        };

        self.capture();
        if !sel.is_empty() {
            self.buffer.remove(sel.start, sel.end);
        }
        if line.trim_end() == marker.trim_end() {
            // Empty item: exit the list instead of continuing it.
            let start = self.buffer.line_start(line_idx);
            self.buffer.remove(start, start + marker.chars().count());
            self.selection = Selection::at(start);
        } else {
            let continuation = format!("\n{}", (rule.maker)(&marker));
            self.buffer.insert(sel.start, &continuation);
            self.selection = Selection::at(sel.start + continuation.chars().count());
        }
        self.emit_change();
        true
    }

    /// Dispatches a normalized key combination to its registered action.
    /// Returns true when a shortcut handled the key.
    pub fn handle_shortcut(&mut self, combo: &KeyCombo) -> bool {
        let action = self
            .shortcuts
            .iter()
            .find(|s| &s.combo == combo)
            .map(|s| s.action.clone());
        match action {
            Some(action) => {
                action(self);
                true
            }
            None => false,
        }
    }

    /// Rolls the buffer back one history state. Bypasses the pre-state
    /// capture; the live buffer is parked at the tip first so redo can
    /// return to it.
    pub fn undo(&mut self) {
        if self.history.at_tip() {
            let value = self.buffer.to_string();
            self.history.commit(&value, self.selection);
        }
        let entry = self.history.undo().cloned();
        if let Some(entry) = entry {
            self.buffer = TextBuffer::from_str(&entry.value);
            self.selection = entry.selection.clamped(self.buffer.len_chars());
            self.emit_change();
        }
    }

    /// Moves the buffer forward one history state.
    pub fn redo(&mut self) {
        let entry = self.history.redo().cloned();
        if let Some(entry) = entry {
            self.buffer = TextBuffer::from_str(&entry.value);
            self.selection = entry.selection.clamped(self.buffer.len_chars());
            self.emit_change();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    fn editor_with_text(text: &str) -> Editor {
        let mut editor = Editor::new();
        editor.set_text(text);
        editor
    }

    #[test]
    fn test_toggle_surrounding_symmetric_round_trip() {
        let mut editor = editor_with_text("hello world");
        editor.set_selection(Selection::range(0, 5));
        editor.toggle_selection_surrounding("**", "**");
        assert_eq!(editor.text(), "**hello** world");
        assert_eq!(editor.selection(), Selection::range(0, 9));
        editor.toggle_selection_surrounding("**", "**");
        assert_eq!(editor.text(), "hello world");
        assert_eq!(editor.selection(), Selection::range(0, 5));
    }

    #[test]
    fn test_toggle_surrounding_asymmetric() {
        let mut editor = editor_with_text("link text");
        editor.set_selection(Selection::range(0, 4));
        editor.toggle_selection_surrounding("[", "]");
        assert_eq!(editor.text(), "[link] text");
        editor.toggle_selection_surrounding("[", "]");
        assert_eq!(editor.text(), "link text");
        assert_eq!(editor.selection(), Selection::range(0, 4));
    }

    #[test]
    fn test_toggle_surrounding_detects_outer_tokens() {
        let mut editor = editor_with_text("**bold**");
        editor.set_selection(Selection::range(2, 6));
        editor.toggle_selection_surrounding("**", "**");
        assert_eq!(editor.text(), "bold");
        assert_eq!(editor.selection(), Selection::range(0, 4));
    }

    #[test]
    fn test_toggle_line_prefix_repeat_round_trip() {
        let mut editor = editor_with_text("one\ntwo\nthree");
        editor.set_selection(Selection::range(0, 13));
        editor.toggle_line_prefix("> ", PrefixMode::Repeat);
        assert_eq!(editor.text(), "> one\n> two\n> three");
        editor.toggle_line_prefix("> ", PrefixMode::Repeat);
        assert_eq!(editor.text(), "one\ntwo\nthree");
    }

    #[test]
    fn test_toggle_line_prefix_detach_numbers_lines() {
        let mut editor = editor_with_text("one\ntwo\nthree");
        editor.set_selection(Selection::range(0, 13));
        editor.toggle_line_prefix("1. ", PrefixMode::Detach);
        assert_eq!(editor.text(), "1. one\n2. two\n3. three");
        // Turning off strips markers regardless of their counter value.
        editor.toggle_line_prefix("1. ", PrefixMode::Detach);
        assert_eq!(editor.text(), "one\ntwo\nthree");
    }

    #[test]
    fn test_toggle_line_prefix_off_skips_unmarked_lines() {
        let mut editor = editor_with_text("- one\ntwo\n- three");
        editor.set_selection(Selection::range(0, 17));
        editor.toggle_line_prefix("- ", PrefixMode::Detach);
        assert_eq!(editor.text(), "one\ntwo\nthree");
    }

    #[test]
    fn test_toggle_line_prefix_single_caret_line() {
        let mut editor = editor_with_text("title");
        editor.set_selection(Selection::at(3));
        editor.toggle_line_prefix("### ", PrefixMode::Repeat);
        assert_eq!(editor.text(), "### title");
        assert_eq!(editor.selection(), Selection::at(7));
    }

    #[test]
    fn test_insert_at_shifts_selection() {
        let mut editor = editor_with_text("abc");
        editor.set_selection(Selection::range(1, 2));
        editor.insert_at(0, "xy");
        assert_eq!(editor.text(), "xyabc");
        assert_eq!(editor.selection(), Selection::range(3, 4));
    }

    #[test]
    fn test_tab_out_moves_past_delimiter() {
        let mut editor = editor_with_text("(code)");
        editor.set_selection(Selection::at(5));
        assert!(editor.handle_tab());
        assert_eq!(editor.selection(), Selection::at(6));
        // Nothing to tab out of at the end of the buffer.
        assert!(!editor.handle_tab());
    }

    #[test]
    fn test_tab_out_prefers_longest_delimiter() {
        let mut editor = editor_with_text("bold**");
        editor.set_selection(Selection::at(4));
        assert!(editor.handle_tab());
        assert_eq!(editor.selection(), Selection::at(6));
    }

    #[test]
    fn test_shortcut_dispatch() {
        let mut editor = editor_with_text("hello");
        editor.set_selection(Selection::range(0, 5));
        assert!(editor.handle_shortcut(&KeyCombo::ctrl("b")));
        assert_eq!(editor.text(), "**hello**");
        assert!(!editor.handle_shortcut(&KeyCombo::ctrl("q")));
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut editor = editor_with_text("hello");
        editor.set_selection(Selection::range(0, 5));
        editor.toggle_selection_surrounding("**", "**");
        assert_eq!(editor.text(), "**hello**");

        editor.undo();
        assert_eq!(editor.text(), "hello");
        editor.redo();
        assert_eq!(editor.text(), "**hello**");
        // Undoing again must not re-record itself.
        editor.undo();
        assert_eq!(editor.text(), "hello");
    }

    #[test]
    fn test_undo_steps_through_spaced_edits() {
        let mut editor = Editor::with_config(EditorConfig {
            history: HistoryOptions {
                min_interval: Duration::from_millis(1),
                ..Default::default()
            },
            ..Default::default()
        });
        editor.replace_selection("a");
        std::thread::sleep(Duration::from_millis(5));
        editor.replace_selection("b");
        std::thread::sleep(Duration::from_millis(5));
        editor.replace_selection("c");
        assert_eq!(editor.text(), "abc");

        editor.undo();
        assert_eq!(editor.text(), "ab");
        editor.undo();
        assert_eq!(editor.text(), "a");
        editor.redo();
        assert_eq!(editor.text(), "ab");
        editor.redo();
        assert_eq!(editor.text(), "abc");
    }

    #[test]
    fn test_newline_continues_numbered_list() {
        let mut editor = editor_with_text("1. one");
        editor.set_selection(Selection::at(6));
        assert!(editor.handle_newline());
        assert_eq!(editor.text(), "1. one\n2. ");
        assert_eq!(editor.selection(), Selection::at(10));
    }

    #[test]
    fn test_newline_exits_empty_list_item() {
        let mut editor = editor_with_text("- one\n- ");
        editor.set_selection(Selection::at(8));
        assert!(editor.handle_newline());
        assert_eq!(editor.text(), "- one\n");
    }

    #[test]
    fn test_newline_without_list_is_unhandled() {
        let mut editor = editor_with_text("plain");
        editor.set_selection(Selection::at(5));
        assert!(!editor.handle_newline());
        assert_eq!(editor.text(), "plain");
    }

    #[test]
    fn test_change_listener_receives_committed_state() {
        let seen: Arc<Mutex<Vec<(String, Selection)>>> = Arc::default();
        let mut editor = Editor::new();
        let sink = seen.clone();
        editor.on_change(Arc::new(move |text, sel| {
            sink.lock().unwrap().push((text.to_string(), sel));
        }));
        editor.replace_selection("hi");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "hi");
        assert_eq!(seen[0].1, Selection::at(2));
    }

    #[test]
    fn test_link_shortcut_selects_placeholder() {
        let mut editor = editor_with_text("here");
        editor.set_selection(Selection::range(0, 4));
        assert!(editor.handle_shortcut(&KeyCombo::ctrl("k")));
        assert_eq!(editor.text(), "[here](url)");
        assert_eq!(editor.selection(), Selection::range(7, 10));
    }
}
