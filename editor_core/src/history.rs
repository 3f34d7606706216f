//! Undo/redo history over `(text, selection)` snapshots.
//!
//! Rapid edits are coalesced into a single undo step based on elapsed time,
//! and total retention is bounded by an approximate byte budget.

use crate::selection::Selection;
use std::time::{Duration, Instant};

/// Default time window for coalescing edits (in milliseconds).
const MIN_INTERVAL_MS: u64 = 300;

/// Default retention budget, in byte-equivalent units (2 per character).
const MAX_SIZE: usize = 1_000_000;

/// History tuning options.
#[derive(Debug, Clone, Copy)]
pub struct HistoryOptions {
    /// Two saves closer than this collapse into one entry.
    pub min_interval: Duration,
    /// Retention budget; oldest entries are evicted past it.
    pub max_size: usize,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(MIN_INTERVAL_MS),
            max_size: MAX_SIZE,
        }
    }
}

/// One saved buffer snapshot. Immutable once created.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub timestamp: Instant,
    pub selection: Selection,
    pub value: String,
}

impl HistoryEntry {
    /// Size of this entry in byte-equivalent units (2 per character).
    fn byte_size(&self) -> usize {
        self.value.chars().count() * 2
    }
}

/// Bounded, time-coalescing undo/redo log.
///
/// `current_index` is a non-positive offset from the end of `states`:
/// 0 points at the newest entry, more negative values point further back.
#[derive(Debug, Default)]
pub struct History {
    states: Vec<HistoryEntry>,
    current_index: isize,
    /// Running total of entry sizes; kept equal to the sum over `states`.
    size: usize,
    options: HistoryOptions,
}

impl History {
    /// Creates a new history with the given options.
    pub fn new(options: HistoryOptions) -> Self {
        Self {
            states: Vec::new(),
            current_index: 0,
            size: 0,
            options,
        }
    }

    /// Saves a value into history, coalescing with the tip entry when the
    /// save lands within the configured minimum interval.
    pub fn save_state(&mut self, value: &str, selection: Selection) {
        self.save_state_at(value, selection, Instant::now());
    }

    /// Same as [`save_state`](Self::save_state) with an explicit timestamp.
    pub fn save_state_at(&mut self, value: &str, selection: Selection, now: Instant) {
        self.push_state(value, selection, now, true);
    }

    /// Appends a snapshot without time coalescing. Used to park the live
    /// buffer at the tip before an undo, so redo can reach it again.
    pub fn commit(&mut self, value: &str, selection: Selection) {
        self.push_state(value, selection, Instant::now(), false);
    }

    fn push_state(&mut self, value: &str, selection: Selection, now: Instant, coalesce: bool) {
        // A new edit destroys the redo branch.
        if self.current_index < 0 {
            let keep = (self.states.len() as isize + self.current_index).max(0) as usize;
            for entry in self.states.drain(keep..) {
                self.size -= entry.byte_size();
            }
        }
        self.current_index = 0;

        // Dedup against the tip after truncation, so a save landing right
        // after an undo does not re-record the entry it rolled back to.
        if let Some(latest) = self.states.last() {
            if latest.value == value {
                return;
            }
        }

        if coalesce {
            let within_window = self.states.last().is_some_and(|latest| {
                now.checked_duration_since(latest.timestamp)
                    .unwrap_or_default()
                    <= self.options.min_interval
            });
            if within_window {
                let replaced = self.states.pop().unwrap();
                self.size -= replaced.byte_size();
            }
        }

        let entry = HistoryEntry {
            timestamp: now,
            selection,
            value: value.to_string(),
        };
        self.size += entry.byte_size();
        self.states.push(entry);

        while self.size > self.options.max_size && !self.states.is_empty() {
            let removed = self.states.remove(0);
            self.size -= removed.byte_size();
        }
    }

    /// Rolls back one state. Returns the entry now pointed to, or `None`
    /// when already at the oldest entry.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        let target = self.states.len() as isize - 2 + self.current_index;
        if target < 0 {
            return None;
        }
        self.current_index -= 1;
        self.states.get(target as usize)
    }

    /// Moves forward one state. Returns the entry now pointed to, or `None`
    /// when already at the tip.
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        if self.current_index >= 0 {
            return None;
        }
        self.current_index += 1;
        let idx = self.states.len() as isize - 1 + self.current_index;
        self.states.get(idx as usize)
    }

    /// Returns true when the pointer sits at the newest entry.
    pub fn at_tip(&self) -> bool {
        self.current_index == 0
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns true if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Total stored size in byte-equivalent units (2 per character).
    pub fn get_size(&self) -> usize {
        self.size
    }

    /// The stored entries, oldest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.states
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(min_interval_ms: u64, max_size: usize) -> HistoryOptions {
        HistoryOptions {
            min_interval: Duration::from_millis(min_interval_ms),
            max_size,
        }
    }

    fn save_at(history: &mut History, value: &str, t0: Instant, offset_ms: u64) {
        history.save_state_at(value, Selection::at(value.len()), t0 + Duration::from_millis(offset_ms));
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut history = History::new(opts(300, MAX_SIZE));
        let t0 = Instant::now();
        save_at(&mut history, "a", t0, 0);
        save_at(&mut history, "ab", t0, 500);
        save_at(&mut history, "abc", t0, 1000);

        assert_eq!(history.undo().unwrap().value, "ab");
        assert_eq!(history.undo().unwrap().value, "a");
        assert!(history.undo().is_none()); // already at oldest

        assert_eq!(history.redo().unwrap().value, "ab");
        assert_eq!(history.redo().unwrap().value, "abc");
        assert!(history.redo().is_none()); // already at tip
    }

    #[test]
    fn test_coalesces_rapid_saves() {
        let mut history = History::new(opts(300, MAX_SIZE));
        let t0 = Instant::now();
        save_at(&mut history, "a", t0, 0);
        save_at(&mut history, "ab", t0, 50);
        save_at(&mut history, "abc", t0, 400);

        let values: Vec<_> = history.entries().iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, ["ab", "abc"]);
    }

    #[test]
    fn test_unchanged_value_is_noop() {
        let mut history = History::new(opts(300, MAX_SIZE));
        let t0 = Instant::now();
        save_at(&mut history, "a", t0, 0);
        save_at(&mut history, "a", t0, 1000);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_new_edit_destroys_redo_branch() {
        let mut history = History::new(opts(300, MAX_SIZE));
        let t0 = Instant::now();
        save_at(&mut history, "a", t0, 0);
        save_at(&mut history, "ab", t0, 500);
        save_at(&mut history, "abc", t0, 1000);

        history.undo();
        history.undo();
        save_at(&mut history, "ax", t0, 2000);

        let values: Vec<_> = history.entries().iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, ["a", "ax"]);
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_save_after_undo_dedups_against_pointed_entry() {
        let mut history = History::new(opts(300, MAX_SIZE));
        let t0 = Instant::now();
        save_at(&mut history, "a", t0, 0);
        save_at(&mut history, "ab", t0, 1000);

        history.undo();
        // The pre-state capture of the next edit matches the entry the undo
        // rolled back to; it must not append a dead undo step.
        save_at(&mut history, "a", t0, 2000);

        let values: Vec<_> = history.entries().iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, ["a"]);
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_eviction_keeps_size_bounded() {
        // 10 chars = 20 units per entry; budget fits two entries.
        let mut history = History::new(opts(300, 40));
        let t0 = Instant::now();
        save_at(&mut history, "aaaaaaaaaa", t0, 0);
        save_at(&mut history, "bbbbbbbbbb", t0, 1000);
        save_at(&mut history, "cccccccccc", t0, 2000);

        assert!(history.get_size() <= 40);
        let values: Vec<_> = history.entries().iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, ["bbbbbbbbbb", "cccccccccc"]);
    }

    #[test]
    fn test_size_counter_matches_entries() {
        let mut history = History::new(opts(300, MAX_SIZE));
        let t0 = Instant::now();
        save_at(&mut history, "abc", t0, 0);
        save_at(&mut history, "defgh", t0, 1000);
        let expected: usize = history
            .entries()
            .iter()
            .map(|e| e.value.chars().count() * 2)
            .sum();
        assert_eq!(history.get_size(), expected);
        assert_eq!(history.get_size(), 16);
    }

    #[test]
    fn test_commit_bypasses_coalescing() {
        let mut history = History::new(opts(300, MAX_SIZE));
        let t0 = Instant::now();
        save_at(&mut history, "a", t0, 0);
        // Within the interval, but committed: both entries survive.
        history.commit("ab", Selection::at(2));
        let values: Vec<_> = history.entries().iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, ["a", "ab"]);
    }

    #[test]
    fn test_undo_on_empty_history() {
        let mut history = History::new(HistoryOptions::default());
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
    }
}
