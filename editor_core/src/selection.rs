//! Selection handling.

/// A linear selection over the buffer, as character offsets.
/// Invariant: `start <= end`. When `start == end` the selection is a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    /// Creates a caret selection at the given position.
    pub fn at(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Creates a selection from two offsets, normalizing their order.
    pub fn range(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// Returns true if the selection is a caret (no selected text).
    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }

    /// Returns the number of selected characters.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if no characters are selected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collapses the selection to its start.
    pub fn collapse_to_start(&self) -> Self {
        Self::at(self.start)
    }

    /// Collapses the selection to its end.
    pub fn collapse_to_end(&self) -> Self {
        Self::at(self.end)
    }

    /// Shifts both offsets by a signed delta, saturating at zero.
    pub fn shifted(&self, delta: isize) -> Self {
        let apply = |v: usize| {
            if delta >= 0 {
                v + delta as usize
            } else {
                v.saturating_sub(delta.unsigned_abs())
            }
        };
        Self {
            start: apply(self.start),
            end: apply(self.end),
        }
    }

    /// Clamps both offsets to the given buffer length.
    pub fn clamped(&self, max: usize) -> Self {
        Self {
            start: self.start.min(max),
            end: self.end.min(max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_normalizes() {
        let sel = Selection::range(7, 3);
        assert_eq!(sel.start, 3);
        assert_eq!(sel.end, 7);
        assert!(!sel.is_caret());
        assert_eq!(sel.len(), 4);
    }

    #[test]
    fn test_caret() {
        let sel = Selection::at(5);
        assert!(sel.is_caret());
        assert!(sel.is_empty());
    }

    #[test]
    fn test_shifted_saturates() {
        let sel = Selection::range(1, 3).shifted(-2);
        assert_eq!(sel, Selection::range(0, 1));
        let sel = Selection::range(1, 3).shifted(4);
        assert_eq!(sel, Selection::range(5, 7));
    }

    #[test]
    fn test_clamped() {
        let sel = Selection::range(4, 10).clamped(6);
        assert_eq!(sel, Selection::range(4, 6));
    }
}
