//! Line prefix rules: list markers and their newline continuation.

use std::fmt;
use std::sync::Arc;

/// How `toggle_line_prefix` applies a marker across the selected lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixMode {
    /// Every line receives the identical literal prefix.
    Repeat,
    /// Counted-list marker: numeric-ordered prefixes ("1. ") increment per
    /// line when turning on; turning off strips the marker regardless of
    /// its counter value.
    Detach,
}

/// Returns the marker found at the start of a line, if any.
pub type PrefixMatcher = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Builds the marker for the next line from the previous line's marker.
pub type PrefixMaker = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A line prefix rule, used for Enter-key list continuation.
#[derive(Clone)]
pub struct LinePrefix {
    /// Unique identifier, used by disable lists.
    pub id: String,
    pub matcher: PrefixMatcher,
    pub maker: PrefixMaker,
}

impl LinePrefix {
    pub fn new(id: &str, matcher: PrefixMatcher, maker: PrefixMaker) -> Self {
        Self {
            id: id.to_string(),
            matcher,
            maker,
        }
    }
}

impl fmt::Debug for LinePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinePrefix")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Splits a numeric-ordered marker like "12. " into its counter and the
/// remainder (". "). Returns `None` for non-numeric markers.
pub fn split_numeric_marker(marker: &str) -> Option<(u64, &str)> {
    let digits: String = marker.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let counter = digits.parse().ok()?;
    Some((counter, &marker[digits.len()..]))
}

/// The built-in prefix rules. Task list comes first so its marker is not
/// shadowed by the plain bulleted list rule.
pub fn default_prefixes() -> Vec<LinePrefix> {
    vec![
        LinePrefix::new(
            "taskList",
            Arc::new(|line: &str| {
                for marker in ["- [ ] ", "- [x] "] {
                    if line.starts_with(marker) {
                        return Some(marker.to_string());
                    }
                }
                None
            }),
            Arc::new(|_prev: &str| "- [ ] ".to_string()),
        ),
        LinePrefix::new(
            "bulletedList",
            Arc::new(|line: &str| {
                for marker in ["- ", "* "] {
                    if line.starts_with(marker) {
                        return Some(marker.to_string());
                    }
                }
                None
            }),
            Arc::new(|prev: &str| prev.to_string()),
        ),
        LinePrefix::new(
            "numberedList",
            Arc::new(|line: &str| {
                let digits: String = line.chars().take_while(|c| c.is_ascii_digit()).collect();
                if digits.is_empty() {
                    return None;
                }
                let rest = &line[digits.len()..];
                if rest.starts_with(". ") {
                    Some(format!("{digits}. "))
                } else {
                    None
                }
            }),
            Arc::new(|prev: &str| match split_numeric_marker(prev) {
                Some((n, rest)) => format!("{}{rest}", n + 1),
                None => prev.to_string(),
            }),
        ),
    ]
}
