//! Undo/redo history of edit commands.
//!
//! Commands carry whole-content snapshots, so undoing is restoring the
//! `before` snapshot and redoing is restoring `after`. Consecutive typing or
//! deleting on the same area coalesces into one command while the cursors
//! chain and the commands arrive within the merge window.

use std::time::{Duration, Instant};

use crate::format::TextPart;

/// Maximum number of commands kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

/// Window within which consecutive commands may coalesce.
pub const DEFAULT_MERGE_WINDOW: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Addition,
    Deletion,
    Paste,
    Formatting,
}

impl CommandKind {
    /// Whether consecutive commands of this kind may coalesce.
    pub fn merges(self) -> bool {
        matches!(self, CommandKind::Addition | CommandKind::Deletion)
    }
}

/// Content and cursor of an area at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub parts: Vec<TextPart>,
    pub edit_cursor: usize,
    pub locked_cursor: usize,
}

/// One undoable change to one area.
#[derive(Debug, Clone, PartialEq)]
pub struct Command<K> {
    pub kind: CommandKind,
    pub area: K,
    pub before: Snapshot,
    pub after: Snapshot,
}

impl<K: PartialEq> Command<K> {
    fn chains_onto(&self, last: &Command<K>) -> bool {
        self.kind.merges()
            && self.kind == last.kind
            && self.area == last.area
            && self.before.edit_cursor == last.after.edit_cursor
    }
}

#[derive(Debug, Clone)]
struct Entry<K> {
    command: Command<K>,
    /// Time of the latest command merged into this entry.
    timestamp: Instant,
}

/// Linear undo stack with a redo tail.
#[derive(Debug, Clone)]
pub struct History<K> {
    undo_stack: Vec<Entry<K>>,
    redo_stack: Vec<Entry<K>>,
    limit: usize,
    merge_window: Duration,
}

impl<K: PartialEq + Clone> History<K> {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit,
            merge_window: DEFAULT_MERGE_WINDOW,
        }
    }

    pub fn set_merge_window(&mut self, window: Duration) {
        self.merge_window = window;
    }

    pub fn merge_window(&self) -> Duration {
        self.merge_window
    }

    /// Record a command now.
    pub fn push(&mut self, command: Command<K>) {
        self.push_at(command, Instant::now());
    }

    /// Record a command issued at `now`. Clears the redo tail.
    pub fn push_at(&mut self, command: Command<K>, now: Instant) {
        self.redo_stack.clear();

        if let Some(last) = self.undo_stack.last_mut() {
            let within_window = now.saturating_duration_since(last.timestamp) <= self.merge_window;
            if within_window && command.chains_onto(&last.command) {
                last.command.after = command.after;
                last.timestamp = now;
                return;
            }
        }

        self.undo_stack.push(Entry {
            command,
            timestamp: now,
        });
        if self.undo_stack.len() > self.limit {
            self.undo_stack.remove(0);
        }
    }

    /// Move the latest command to the redo tail and return it. The caller
    /// restores its `before` snapshot.
    pub fn undo(&mut self) -> Option<Command<K>> {
        let entry = self.undo_stack.pop()?;
        let command = entry.command.clone();
        self.redo_stack.push(entry);
        Some(command)
    }

    /// Move the latest undone command back and return it. The caller
    /// restores its `after` snapshot.
    pub fn redo(&mut self) -> Option<Command<K>> {
        let entry = self.redo_stack.pop()?;
        let command = entry.command.clone();
        self.undo_stack.push(entry);
        Some(command)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Drop every command that belongs to `area`.
    pub fn forget_area(&mut self, area: &K) {
        self.undo_stack.retain(|entry| &entry.command.area != area);
        self.redo_stack.retain(|entry| &entry.command.area != area);
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        if self.undo_stack.len() > limit {
            let excess = self.undo_stack.len() - limit;
            self.undo_stack.drain(..excess);
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl<K: PartialEq + Clone> Default for History<K> {
    fn default() -> Self {
        Self::new()
    }
}
