//! Bounded undo history over program snapshots.

use std::collections::VecDeque;

use fl_program::ProgramSpec;

/// Snapshot history with move coalescing.
///
/// The newest entry is always the current state, so with capacity `N` at most
/// `N - 1` undos are possible. Consecutive block moves collapse into a single
/// entry.
///
/// # Example
///
/// ```
/// use fl_editor::History;
/// use fl_program::ProgramSpec;
///
/// let mut history = History::new(11);
/// history.reset(ProgramSpec::empty("p", "P"));
/// history.record(ProgramSpec::empty("p", "P moved"), true);
/// assert!(history.undo().is_some());
/// assert!(history.undo().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<ProgramSpec>,
    capacity: usize,
    last_was_move: bool,
}

impl History {
    /// Create a history holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            last_was_move: false,
        }
    }

    /// Start over from a freshly loaded program.
    pub fn reset(&mut self, initial: ProgramSpec) {
        self.entries.clear();
        self.entries.push_back(initial);
        self.last_was_move = false;
    }

    /// Append a snapshot, or replace the newest one when `overwrite` is set.
    /// The oldest entry is evicted past capacity.
    pub fn snapshot(&mut self, spec: ProgramSpec, overwrite: bool) {
        if overwrite && !self.entries.is_empty() {
            self.entries.pop_back();
        }
        self.entries.push_back(spec);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Record a change. A move directly following another move overwrites
    /// the newest entry instead of adding one.
    pub fn record(&mut self, spec: ProgramSpec, is_move: bool) {
        let overwrite = is_move && self.last_was_move;
        self.snapshot(spec, overwrite);
        self.last_was_move = is_move;
    }

    /// Drop the newest entry and return the state to restore. `None` when
    /// there is nothing to undo.
    pub fn undo(&mut self) -> Option<ProgramSpec> {
        if self.entries.len() < 2 {
            return None;
        }
        self.entries.pop_back();
        self.last_was_move = false;
        self.entries.back().cloned()
    }

    /// The entry `undo` would restore, without dropping the newest one.
    pub fn previous(&self) -> Option<&ProgramSpec> {
        self.entries.len().checked_sub(2).and_then(|i| self.entries.get(i))
    }

    pub fn can_undo(&self) -> bool {
        self.entries.len() >= 2
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn current(&self) -> Option<&ProgramSpec> {
        self.entries.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn spec(n: usize) -> ProgramSpec {
        ProgramSpec::empty(format!("p{n}"), "P")
    }

    #[test]
    fn undo_needs_two_entries() {
        let mut h = History::new(11);
        assert!(h.undo().is_none());
        h.reset(spec(0));
        assert!(h.undo().is_none());
        h.record(spec(1), false);
        assert_eq!(h.previous(), Some(&spec(0)));
        assert_eq!(h.len(), 2);
        assert_eq!(h.undo(), Some(spec(0)));
        assert_eq!(h.len(), 1);
        assert_eq!(h.previous(), None);
    }

    #[test]
    fn consecutive_moves_coalesce() {
        let mut h = History::new(11);
        h.reset(spec(0));
        h.record(spec(1), true);
        h.record(spec(2), true);
        h.record(spec(3), true);
        assert_eq!(h.len(), 2);
        assert_eq!(h.current(), Some(&spec(3)));

        // A non-move breaks the run
        h.record(spec(4), false);
        h.record(spec(5), true);
        assert_eq!(h.len(), 4);
    }

    #[test]
    fn first_move_after_load_is_kept() {
        let mut h = History::new(11);
        h.reset(spec(0));
        h.record(spec(1), true);
        assert_eq!(h.undo(), Some(spec(0)));
    }

    #[test]
    fn undo_resets_move_run() {
        let mut h = History::new(11);
        h.reset(spec(0));
        h.record(spec(1), false);
        h.record(spec(2), true);
        h.undo();
        h.record(spec(3), true);
        assert_eq!(h.len(), 3);
    }

    proptest! {
        #[test]
        fn undo_depth_is_capacity_minus_one(cap in 1usize..20, extra in 1usize..40) {
            let mut h = History::new(cap);
            h.reset(spec(0));
            for i in 0..cap + extra {
                h.record(spec(i + 1), false);
            }
            let mut undos = 0;
            while h.undo().is_some() {
                undos += 1;
            }
            prop_assert_eq!(undos, cap - 1);
        }
    }
}
