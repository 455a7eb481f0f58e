//! Edit History
//!
//! A bounded undo/redo stack of `(text, cursor)` snapshots with debounced
//! coalescing, so a burst of keystrokes collapses into one undo step.
//!
//! The debounce is an explicit state machine rather than a timer callback:
//! `debounced_add` records a pending payload with a deadline, and the owner
//! drives it by calling [`InputHistory::flush`] with the current time. Time
//! is always passed in, never read from a clock here, which keeps every
//! transition deterministic under test.

use std::time::{Duration, Instant};

// ─────────────────────────────────────────────────────────────────────────────
// History Entry
// ─────────────────────────────────────────────────────────────────────────────

/// One committed snapshot of the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub text: String,
    /// Caret offset at commit time, when the host reported one.
    pub cursor_position: Option<usize>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Debounce State
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Debounce {
    Idle,
    Pending {
        text: String,
        cursor_position: Option<usize>,
        deadline: Instant,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Input History
// ─────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_DEPTH: usize = 100;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Bounded linear undo/redo history with a debounced write path.
///
/// Invariant: `index < entries.len()` whenever the history is non-empty.
#[derive(Debug)]
pub struct InputHistory {
    entries: Vec<HistoryEntry>,
    index: usize,
    depth: usize,
    debounce: Duration,
    pending: Debounce,
}

impl Default for InputHistory {
    fn default() -> Self {
        Self::new(DEFAULT_DEPTH)
    }
}

impl InputHistory {
    pub fn new(depth: usize) -> Self {
        Self::with_debounce(depth, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(depth: usize, debounce: Duration) -> Self {
        InputHistory {
            entries: Vec::new(),
            index: 0,
            depth: depth.max(1),
            debounce,
            pending: Debounce::Idle,
        }
    }

    /// The entry at the current index, if any.
    pub fn current_item(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.index)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.pending, Debounce::Pending { .. })
    }

    /// Drop all entries and any pending payload.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = 0;
        self.pending = Debounce::Idle;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Write Path
    // ─────────────────────────────────────────────────────────────────────────

    /// Commit a snapshot immediately.
    ///
    /// A text equal to the most recently stored entry is dropped. Otherwise
    /// the redo tail past the current index is discarded, the entry is
    /// appended, and the oldest entry is evicted once over capacity.
    pub fn add(&mut self, text: &str, cursor_position: Option<usize>) {
        if self.entries.last().is_some_and(|last| last.text == text) {
            return;
        }
        if self.index + 1 < self.entries.len() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(HistoryEntry {
            text: text.to_string(),
            cursor_position,
        });
        if self.entries.len() > self.depth {
            self.entries.remove(0);
        }
        self.index = self.entries.len() - 1;
    }

    /// Record a payload to be committed once `debounce` has elapsed without
    /// another edit. A previous pending payload is replaced and the deadline
    /// re-armed.
    pub fn debounced_add(&mut self, text: &str, cursor_position: Option<usize>, now: Instant) {
        self.pending = Debounce::Pending {
            text: text.to_string(),
            cursor_position,
            deadline: now + self.debounce,
        };
    }

    /// Commit the pending payload if its deadline has elapsed. Returns true
    /// when a commit happened.
    pub fn flush(&mut self, now: Instant) -> bool {
        let Debounce::Pending { deadline, .. } = &self.pending else {
            return false;
        };
        if now < *deadline {
            return false;
        }
        let Debounce::Pending {
            text,
            cursor_position,
            ..
        } = std::mem::replace(&mut self.pending, Debounce::Idle)
        else {
            return false;
        };
        self.add(&text, cursor_position);
        true
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Undo / Redo
    // ─────────────────────────────────────────────────────────────────────────

    /// Step back one entry.
    ///
    /// A pending payload is abandoned instead: the history returns the latest
    /// committed entry, modelling "undo while typing collapses back to before
    /// the current burst". Returns `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if self.cancel_pending() {
            return self.entries.last();
        }
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index)
    }

    /// Step forward one entry. Symmetric with [`InputHistory::undo`]:
    /// a pending payload cancels to the latest committed entry. Returns
    /// `None` at the newest entry.
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        if self.cancel_pending() {
            return self.entries.last();
        }
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index)
    }

    fn cancel_pending(&mut self) -> bool {
        if self.is_pending() {
            self.pending = Debounce::Idle;
            true
        } else {
            false
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
