//! Speculative patching of the highlighted overlay.
//!
//! The authoritative highlighter runs asynchronously and is visibly slower
//! than keystroke latency. This module patches the overlay from a plain
//! text diff immediately, trading highlighting fidelity for zero perceived
//! latency: the changed span shows as unhighlighted text until the real
//! render arrives.

/// One token node in the overlay. `highlighted` marks nodes produced by the
/// authoritative pass; speculative patches always insert plain nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayNode {
    pub text: String,
    pub highlighted: bool,
}

impl OverlayNode {
    pub fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            highlighted: false,
        }
    }

    pub fn highlighted(text: &str) -> Self {
        Self {
            text: text.to_string(),
            highlighted: true,
        }
    }

    fn len_chars(&self) -> usize {
        self.text.chars().count()
    }
}

/// One line of the overlay. Lines map to buffer lines, joined by a single
/// newline character.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayLine {
    pub nodes: Vec<OverlayNode>,
}

impl OverlayLine {
    fn len_chars(&self) -> usize {
        self.nodes.iter().map(OverlayNode::len_chars).sum()
    }
}

/// The prefix/suffix diff between two text versions, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffSpan {
    pub common_prefix_len: usize,
    pub common_suffix_len: usize,
}

impl DiffSpan {
    /// Computes the longest shared prefix and suffix, each bounded by the
    /// shorter text's length.
    pub fn compute(prev: &str, next: &str) -> Self {
        let prev: Vec<char> = prev.chars().collect();
        let next: Vec<char> = next.chars().collect();
        let min_len = prev.len().min(next.len());

        let mut prefix = 0;
        while prefix < min_len && prev[prefix] == next[prefix] {
            prefix += 1;
        }
        let mut suffix = 0;
        while suffix < min_len && prev[prev.len() - 1 - suffix] == next[next.len() - 1 - suffix] {
            suffix += 1;
        }
        Self {
            common_prefix_len: prefix,
            common_suffix_len: suffix,
        }
    }

    /// The changed span in the old text, clamped to be non-negative.
    pub fn old_range(&self, prev_len: usize) -> (usize, usize) {
        let start = self.common_prefix_len;
        let end = prev_len
            .saturating_sub(self.common_suffix_len)
            .max(start);
        (start, end)
    }

    /// The changed span in the new text, clamped to be non-negative.
    pub fn new_range(&self, next_len: usize) -> (usize, usize) {
        let start = self.common_prefix_len;
        let end = next_len
            .saturating_sub(self.common_suffix_len)
            .max(start);
        (start, end)
    }
}

fn char_slice(text: &str, start: usize, end: usize) -> String {
    text.chars().skip(start).take(end.saturating_sub(start)).collect()
}

/// The syntax-highlighted overlay structure mirroring the text buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overlay {
    pub lines: Vec<OverlayLine>,
}

impl Overlay {
    /// Builds an unhighlighted overlay: one plain node per non-empty line.
    pub fn from_plain_text(text: &str) -> Self {
        let lines = text
            .split('\n')
            .map(|line| OverlayLine {
                nodes: if line.is_empty() {
                    Vec::new()
                } else {
                    vec![OverlayNode::plain(line)]
                },
            })
            .collect();
        Self { lines }
    }

    /// The text the overlay currently mirrors.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| {
                line.nodes
                    .iter()
                    .map(|n| n.text.as_str())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn len_chars(&self) -> usize {
        if self.lines.is_empty() {
            return 0;
        }
        let nodes: usize = self.lines.iter().map(OverlayLine::len_chars).sum();
        nodes + self.lines.len() - 1
    }

    /// Character offset of the start of a line (counting joining newlines).
    fn line_offset(&self, line: usize) -> usize {
        self.lines[..line]
            .iter()
            .map(|l| l.len_chars() + 1)
            .sum()
    }

    /// Index of the line whose span (including its end position) contains
    /// the given character offset.
    fn line_at(&self, offset: usize) -> Option<usize> {
        let mut off = 0;
        for (idx, line) in self.lines.iter().enumerate() {
            let end = off + line.len_chars();
            if offset <= end {
                return Some(idx);
            }
            off = end + 1; // joining newline
        }
        None
    }

    /// Patches the overlay to mirror `next`, given that it currently
    /// mirrors `prev`. Replaces the nodes covering the changed span with a
    /// single plain node; nodes outside the span are left untouched.
    ///
    /// Returns false (leaving the overlay untouched) when the structure
    /// cannot be safely mapped to the change; the overlay then stays stale
    /// until the authoritative render arrives.
    pub fn patch(&mut self, prev: &str, next: &str) -> bool {
        if prev == next {
            return true;
        }

        let prev_len = prev.chars().count();
        let next_len = next.chars().count();
        if self.len_chars() != prev_len {
            log::warn!(
                "overlay out of sync with text ({} vs {} chars), skipping patch",
                self.len_chars(),
                prev_len
            );
            return false;
        }
        if self.lines.is_empty() {
            self.lines.push(OverlayLine::default());
        }

        let diff = DiffSpan::compute(prev, next);
        let (old_start, old_end) = diff.old_range(prev_len);
        let delta = next_len as isize - prev_len as isize;

        let Some(first_line) = self.line_at(old_start) else {
            return false;
        };
        let Some(last_line) = self.line_at(old_end) else {
            return false;
        };

        let first_off = self.line_offset(first_line);
        let changed_old = char_slice(prev, old_start, old_end);
        let (new_start, new_end) = diff.new_range(next_len);
        let changed_new = char_slice(next, new_start, new_end);

        let single_line = first_line == last_line
            && !changed_old.contains('\n')
            && !changed_new.contains('\n')
            && old_end <= first_off + self.lines[first_line].len_chars();

        if single_line {
            self.patch_line(first_line, first_off, old_start, old_end, next, delta)
        } else {
            self.patch_lines(first_line, last_line, next, delta)
        }
    }

    /// Node-granular patch within a single line.
    fn patch_line(
        &mut self,
        line_idx: usize,
        line_off: usize,
        old_start: usize,
        old_end: usize,
        next: &str,
        delta: isize,
    ) -> bool {
        let rel_start = old_start - line_off;
        let rel_end = old_end - line_off;
        let line = &mut self.lines[line_idx];

        // Change at the end of the line past every node: append an empty
        // seam node to host the insertion.
        let line_len = line.len_chars();
        if rel_start >= line_len && line.nodes.is_empty() {
            line.nodes.push(OverlayNode::plain(""));
        }

        // Locate the covered node range, expanded to node boundaries.
        let mut node_start = 0;
        let mut first = None;
        let mut last = None;
        let mut region_start = 0;
        let mut region_end = 0;
        for (idx, node) in line.nodes.iter().enumerate() {
            let node_end = node_start + node.len_chars();
            let covers = if rel_start == rel_end {
                rel_start <= node_end
            } else {
                node_end > rel_start && node_start < rel_end
            };
            if covers {
                if first.is_none() {
                    first = Some(idx);
                    region_start = node_start;
                }
                last = Some(idx);
                region_end = node_end;
                if rel_start == rel_end {
                    break; // a pure insertion touches exactly one node
                }
            }
            node_start = node_end;
        }
        let (Some(first), Some(last)) = (first, last) else {
            log::warn!("overlay nodes do not cover the changed span, skipping patch");
            return false;
        };

        // Corresponding span in the new text: unchanged content outside the
        // changed region maps position-for-position, shifted by delta.
        let abs_start = line_off + region_start;
        let abs_end = line_off as isize + region_end as isize + delta;
        if abs_end < abs_start as isize {
            log::warn!("inconsistent overlay span after diff, skipping patch");
            return false;
        }
        let replacement = char_slice(next, abs_start, abs_end as usize);

        let replace_with = if replacement.is_empty() {
            Vec::new()
        } else {
            vec![OverlayNode::plain(&replacement)]
        };
        line.nodes.splice(first..=last, replace_with);
        true
    }

    /// Line-granular patch: rebuilds every affected line as plain nodes.
    fn patch_lines(
        &mut self,
        first_line: usize,
        last_line: usize,
        next: &str,
        delta: isize,
    ) -> bool {
        let region_start = self.line_offset(first_line);
        let region_end =
            self.line_offset(last_line) + self.lines[last_line].len_chars();
        let new_end = region_end as isize + delta;
        if new_end < region_start as isize {
            log::warn!("inconsistent overlay line span after diff, skipping patch");
            return false;
        }
        let replacement = char_slice(next, region_start, new_end as usize);

        let new_lines: Vec<OverlayLine> = replacement
            .split('\n')
            .map(|line| OverlayLine {
                nodes: if line.is_empty() {
                    Vec::new()
                } else {
                    vec![OverlayNode::plain(line)]
                },
            })
            .collect();
        self.lines.splice(first_line..=last_line, new_lines);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_span_insertion() {
        let diff = DiffSpan::compute("hello world", "hello there world");
        assert_eq!(diff.common_prefix_len, 6);
        assert_eq!(diff.common_suffix_len, 6);
        // Old span is empty; the new span is exactly the inserted word.
        assert_eq!(diff.old_range(11), (6, 6));
        assert_eq!(diff.new_range(17), (6, 11));
    }

    #[test]
    fn test_diff_span_equal_texts() {
        let diff = DiffSpan::compute("same", "same");
        assert_eq!(diff.old_range(4), (4, 4));
        assert_eq!(diff.new_range(4), (4, 4));
    }

    #[test]
    fn test_patch_equal_texts_changes_nothing() {
        let mut overlay = Overlay::from_plain_text("hello world");
        let before = overlay.clone();
        assert!(overlay.patch("hello world", "hello world"));
        assert_eq!(overlay, before);
    }

    #[test]
    fn test_patch_insertion_keeps_untouched_nodes() {
        let mut overlay = Overlay {
            lines: vec![OverlayLine {
                nodes: vec![
                    OverlayNode::highlighted("hello"),
                    OverlayNode::plain(" "),
                    OverlayNode::highlighted("world"),
                ],
            }],
        };
        assert!(overlay.patch("hello world", "hello there world"));
        assert_eq!(overlay.text(), "hello there world");
        // Nodes outside the changed span keep their highlighting.
        assert_eq!(overlay.lines[0].nodes[0], OverlayNode::highlighted("hello"));
        assert_eq!(overlay.lines[0].nodes[2], OverlayNode::highlighted("world"));
        assert!(!overlay.lines[0].nodes[1].highlighted);
    }

    #[test]
    fn test_patch_replacement_within_node() {
        let mut overlay = Overlay {
            lines: vec![OverlayLine {
                nodes: vec![
                    OverlayNode::highlighted("let"),
                    OverlayNode::plain(" x"),
                ],
            }],
        };
        assert!(overlay.patch("let x", "let y"));
        assert_eq!(overlay.text(), "let y");
        assert_eq!(overlay.lines[0].nodes[0], OverlayNode::highlighted("let"));
    }

    #[test]
    fn test_patch_append_at_document_end() {
        let mut overlay = Overlay::from_plain_text("abc\n");
        // The last line has no nodes; the patch creates the seam node.
        assert!(overlay.patch("abc\n", "abc\nx"));
        assert_eq!(overlay.text(), "abc\nx");
    }

    #[test]
    fn test_patch_multi_line_change() {
        let mut overlay = Overlay::from_plain_text("one\ntwo\nthree");
        assert!(overlay.patch("one\ntwo\nthree", "one\n2a\n2b\nthree"));
        assert_eq!(overlay.text(), "one\n2a\n2b\nthree");
        assert_eq!(overlay.lines.len(), 4);
    }

    #[test]
    fn test_patch_deletion() {
        let mut overlay = Overlay::from_plain_text("hello there world");
        assert!(overlay.patch("hello there world", "hello world"));
        assert_eq!(overlay.text(), "hello world");
    }

    #[test]
    fn test_patch_skips_out_of_sync_overlay() {
        let mut overlay = Overlay::from_plain_text("different text");
        let before = overlay.clone();
        assert!(!overlay.patch("hello", "hello!"));
        // Never partially patched: the overlay stays stale but intact.
        assert_eq!(overlay, before);
    }

    #[test]
    fn test_patch_tracks_editor_change_notifications() {
        use crate::editor::Editor;
        use crate::selection::Selection;
        use std::sync::{Arc, Mutex};

        let mut editor = Editor::new();
        editor.set_text("hello world");

        // (last seen text, overlay) driven purely by the change listener.
        let shared = Arc::new(Mutex::new((
            "hello world".to_string(),
            Overlay::from_plain_text("hello world"),
        )));
        let sink = shared.clone();
        editor.on_change(Arc::new(move |text: &str, _selection| {
            let mut guard = sink.lock().unwrap();
            let prev = guard.0.clone();
            assert!(guard.1.patch(&prev, text));
            guard.0 = text.to_string();
        }));

        editor.set_selection(Selection::range(0, 5));
        editor.toggle_selection_surrounding("**", "**");
        assert_eq!(shared.lock().unwrap().1.text(), editor.text());

        editor.set_selection(Selection::at(editor.buffer().len_chars()));
        editor.replace_selection("\nnext");
        assert_eq!(shared.lock().unwrap().1.text(), editor.text());

        editor.undo();
        assert_eq!(shared.lock().unwrap().1.text(), editor.text());
        assert_eq!(shared.lock().unwrap().0, editor.text());
    }

    #[test]
    fn test_patch_ambiguous_overlapping_diff() {
        // Prefix and suffix scans overlap ("aa" -> "a"); the node expansion
        // must still produce the correct text.
        let mut overlay = Overlay::from_plain_text("aa");
        assert!(overlay.patch("aa", "a"));
        assert_eq!(overlay.text(), "a");
    }
}
