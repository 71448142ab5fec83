use core::ops::Range;
use std::time::Duration;

/// Cursor movement requested by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    Left,
    Right,
    Up,
    Down,
    /// Jump to the start of the previous word.
    CtrlLeft,
    /// Jump to the end of the next word.
    CtrlRight,
    /// Start of the current line.
    Start,
    /// End of the current line.
    End,
    DocumentStart,
    DocumentEnd,
}

impl Movement {
    pub fn is_vertical(self) -> bool {
        matches!(self, Movement::Up | Movement::Down)
    }
}

/// Edit cursor and selection anchor, both glyph positions in
/// `[0, glyph_count]`.
///
/// The selection is the range between the two and is empty when they are
/// equal. While the selection is locked (shift held) only the edit cursor
/// moves; otherwise the anchor follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorState {
    pub edit_cursor: usize,
    pub locked_cursor: usize,
    pub selection_locked: bool,
    /// Horizontal pixel position kept across vertical moves, in 26.6 fixed
    /// point.
    pub anchor_x: Option<i64>,
}

impl CursorState {
    pub fn at(cursor: usize) -> Self {
        Self {
            edit_cursor: cursor,
            locked_cursor: cursor,
            ..Self::default()
        }
    }

    /// Move the edit cursor. The anchor follows unless the selection is
    /// locked.
    pub fn move_to(&mut self, cursor: usize) {
        self.edit_cursor = cursor;
        if !self.selection_locked {
            self.locked_cursor = cursor;
        }
    }

    /// Set both ends explicitly.
    pub fn select(&mut self, anchor: usize, cursor: usize) {
        self.locked_cursor = anchor;
        self.edit_cursor = cursor;
        self.anchor_x = None;
    }

    /// Collapse the selection onto the edit cursor.
    pub fn collapse_to(&mut self, cursor: usize) {
        self.edit_cursor = cursor;
        self.locked_cursor = cursor;
        self.anchor_x = None;
    }

    pub fn has_selection(&self) -> bool {
        self.edit_cursor != self.locked_cursor
    }

    pub fn selection(&self) -> Range<usize> {
        self.edit_cursor.min(self.locked_cursor)..self.edit_cursor.max(self.locked_cursor)
    }

    /// Clamp both ends into `[0, glyph_count]`.
    pub fn clamp(&mut self, glyph_count: usize) {
        self.edit_cursor = self.edit_cursor.min(glyph_count);
        self.locked_cursor = self.locked_cursor.min(glyph_count);
    }
}

/// Blinking state of the drawn cursor.
#[derive(Debug, Clone)]
pub struct CursorBlink {
    visible: bool,
    elapsed: Duration,
    interval: Duration,
}

impl CursorBlink {
    pub fn new(interval: Duration) -> Self {
        Self {
            visible: true,
            elapsed: Duration::ZERO,
            interval: interval.max(Duration::from_millis(100)),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Make the cursor visible and restart the blink period, as after any
    /// cursor movement.
    pub fn reset(&mut self) {
        self.visible = true;
        self.elapsed = Duration::ZERO;
    }

    /// Advance the blink animation. Returns whether visibility changed.
    pub fn advance(&mut self, delta: Duration) -> bool {
        self.elapsed += delta;
        let mut changed = false;
        while self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            self.visible = !self.visible;
            changed = !changed;
        }
        changed
    }
}

impl Default for CursorBlink {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}
