//! Cursor placement, navigation, selection and editing over a
//! [`TextLayout`].

pub mod cursor;
pub mod history;
pub mod split;
pub mod words;

use core::ops::Range;
use std::sync::Arc;

use crate::error::{Result, TextError};
use crate::format::{Format, FormatPatch, TextPart, normalize_parts, parse_markup, plain_text, unparse_markup};
use crate::layout::{LayoutConstraints, RunBuffer, TextLayout};
use crate::shaping::{Shaper, from_fixed};

pub use cursor::{CursorBlink, CursorState, Movement};
pub use history::{Command, CommandKind, History, Snapshot};

/// What a mutating edit changed, for the host to record as a command.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRecord {
    pub kind: CommandKind,
    pub before: Snapshot,
    pub after: Snapshot,
}

/// Where the edit cursor is drawn, in area pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorRect {
    pub x: f32,
    /// Top of the cursor bar, scroll applied.
    pub y: f32,
    pub height: f32,
}

/// Editable rich text: runs, their layout and the cursor over them.
#[derive(Debug, Clone)]
pub struct Editor {
    shaper: Arc<dyn Shaper>,
    layout: TextLayout,
    cursor: CursorState,
}

impl Editor {
    pub fn new(shaper: Arc<dyn Shaper>, base: Format, constraints: LayoutConstraints) -> Result<Self> {
        let layout = TextLayout::new(base.clone(), constraints)?;
        let mut editor = Self {
            shaper,
            layout,
            cursor: CursorState::default(),
        };
        editor.set_parts(vec![TextPart::new(String::new(), base)])?;
        Ok(editor)
    }

    pub fn layout(&self) -> &TextLayout {
        &self.layout
    }

    pub fn cursor(&self) -> &CursorState {
        &self.cursor
    }

    pub fn base_format(&self) -> &Format {
        self.layout.base_format()
    }

    pub fn glyph_count(&self) -> usize {
        self.layout.glyph_count()
    }

    pub fn parts(&self) -> Vec<TextPart> {
        self.layout.index().to_parts()
    }

    pub fn text(&self) -> String {
        plain_text(&self.parts())
    }

    pub fn has_buffer(&self) -> bool {
        !self.layout.index().runs().is_empty()
    }

    fn require_buffer(&self) -> Result<()> {
        if self.has_buffer() { Ok(()) } else { Err(TextError::NoBuffer) }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            parts: self.parts(),
            edit_cursor: self.cursor.edit_cursor,
            locked_cursor: self.cursor.locked_cursor,
        }
    }

    /// Replace the content and cursor with a recorded snapshot.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.set_parts(snapshot.parts.clone())?;
        self.cursor.select(snapshot.locked_cursor, snapshot.edit_cursor);
        self.cursor.clamp(self.glyph_count());
        Ok(())
    }

    /// Replace all runs with freshly shaped `parts`. An empty list leaves the
    /// editor without a buffer.
    pub fn set_parts(&mut self, parts: Vec<TextPart>) -> Result<()> {
        let runs = normalize_parts(parts)
            .into_iter()
            .map(|part| RunBuffer::new(part, self.shaper.as_ref()).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;
        self.layout.set_runs(runs);
        self.cursor.clamp(self.glyph_count());
        Ok(())
    }

    pub fn set_constraints(&mut self, constraints: LayoutConstraints) -> Result<()> {
        self.layout.set_constraints(constraints)
    }

    pub fn scroll(&mut self, delta: f32) -> bool {
        self.layout.scroll_by(delta)
    }

    /// Parse inline markup against the base format and move the cursor to
    /// the end of the text.
    pub fn parse(&mut self, markup: &str) -> Result<()> {
        let parts = parse_markup(markup, self.base_format())?;
        self.set_parts(parts)?;
        self.cursor.collapse_to(self.glyph_count());
        Ok(())
    }

    pub fn unparse(&self) -> Result<String> {
        unparse_markup(&self.parts(), self.base_format())
    }

    /// Remove all text, keeping the base format.
    pub fn clear(&mut self) -> Result<()> {
        let base = self.base_format().clone();
        self.set_parts(vec![TextPart::new(String::new(), base)])?;
        self.cursor.collapse_to(0);
        Ok(())
    }

    pub fn place_cursor(&mut self, x: f32, y: f32) -> Result<()> {
        self.require_buffer()?;
        let target = self.layout.hit_test(x, y)?;
        self.cursor.move_to(target);
        self.cursor.anchor_x = None;
        Ok(())
    }

    pub fn move_cursor(&mut self, movement: Movement) -> Result<()> {
        self.require_buffer()?;
        let target = self.target(movement)?;
        if !movement.is_vertical() {
            self.cursor.anchor_x = None;
        }
        self.cursor.move_to(target);
        Ok(())
    }

    fn target(&mut self, movement: Movement) -> Result<usize> {
        let count = self.glyph_count();
        let c = self.cursor.edit_cursor.min(count);
        let line_index = self.layout.line_index_of(c);
        let line = &self.layout.lines()[line_index];

        let target = match movement {
            Movement::Left => c.saturating_sub(1),
            Movement::Right => (c + 1).min(count),
            Movement::CtrlLeft => words::previous_word_start(self.layout.index(), c),
            Movement::CtrlRight => words::next_word_end(self.layout.index(), c),
            Movement::Start => line.first_glyph,
            Movement::End => line.max_cursor(count),
            Movement::DocumentStart => 0,
            Movement::DocumentEnd => count,
            Movement::Up | Movement::Down => {
                let anchor = *self.cursor.anchor_x.get_or_insert_with(|| self.layout.cursor_x(c));
                let last_line = self.layout.lines().len() - 1;
                match movement {
                    Movement::Up if line_index == 0 => line.first_glyph,
                    Movement::Down if line_index == last_line => line.max_cursor(count),
                    Movement::Up => self.layout.hit_test_line(line_index - 1, from_fixed(anchor))?,
                    _ => self.layout.hit_test_line(line_index + 1, from_fixed(anchor))?,
                }
            }
        };
        Ok(target)
    }

    pub fn select_all(&mut self) -> Result<()> {
        self.require_buffer()?;
        self.cursor.select(0, self.glyph_count());
        Ok(())
    }

    /// Select from `anchor` to `cursor`, both clamped to the text.
    pub fn set_selection(&mut self, anchor: usize, cursor: usize) -> Result<()> {
        self.require_buffer()?;
        let count = self.glyph_count();
        self.cursor.select(anchor.min(count), cursor.min(count));
        Ok(())
    }

    /// While locked, cursor moves extend the selection.
    pub fn lock_selection(&mut self, locked: bool) {
        self.cursor.selection_locked = locked;
    }

    pub fn selection(&self) -> Range<usize> {
        self.cursor.selection()
    }

    pub fn selected_text(&self) -> Result<String> {
        split::text_in(self.layout.index().runs(), self.selection())
    }

    /// Type `text` at the cursor, replacing the selection if there is one.
    pub fn insert_text(&mut self, text: &str) -> Result<Option<EditRecord>> {
        self.insert_as(text, CommandKind::Addition)
    }

    /// Insert pasted text. Recorded separately so it never merges with
    /// typing.
    pub fn paste(&mut self, text: &str) -> Result<Option<EditRecord>> {
        self.insert_as(text, CommandKind::Paste)
    }

    fn insert_as(&mut self, text: &str, kind: CommandKind) -> Result<Option<EditRecord>> {
        self.require_buffer()?;
        if text.is_empty() {
            return if self.cursor.has_selection() {
                self.delete_text(Movement::Right)
            } else {
                Ok(None)
            };
        }

        let before = self.snapshot();
        let new_cursor = if self.cursor.has_selection() {
            let range = self.selection();
            let old_count = self.glyph_count();
            match split::split_deletion(self.layout.index().runs(), range.clone())? {
                Some(split) => {
                    let remaining = old_count - split.removed_glyphs;
                    self.set_parts(split.into_parts_with(text))?;
                    range.start + self.glyph_count().saturating_sub(remaining)
                }
                None => self.insert_at_cursor(text, range.start)?,
            }
        } else {
            self.insert_at_cursor(text, self.cursor.edit_cursor)?
        };

        self.cursor.collapse_to(new_cursor.min(self.glyph_count()));
        tracing::debug!(inserted = text.len(), cursor = new_cursor, "inserted text");
        Ok(Some(EditRecord {
            kind,
            before,
            after: self.snapshot(),
        }))
    }

    /// Insert into the run owning `cursor` (the last run at end of text).
    /// Returns the new cursor.
    fn insert_at_cursor(&mut self, text: &str, cursor: usize) -> Result<usize> {
        let count = self.glyph_count();
        let mut runs = self.layout.index().runs().to_vec();
        let (run, local) = if cursor < count {
            let location = self.layout.index().locate(cursor)?;
            (location.run, location.local)
        } else {
            let last = runs.len() - 1;
            (last, runs[last].glyph_count())
        };

        let added = Arc::make_mut(&mut runs[run]).insert_text(text, local, self.shaper.as_ref())?;
        self.layout.set_runs(runs);
        Ok(cursor.min(count) + added)
    }

    /// Delete the selection, or the glyphs between the cursor and the target
    /// of `movement`. Returns `None` when nothing was deleted.
    pub fn delete_text(&mut self, movement: Movement) -> Result<Option<EditRecord>> {
        self.require_buffer()?;
        let range = if self.cursor.has_selection() {
            self.selection()
        } else {
            let c = self.cursor.edit_cursor;
            let count = self.glyph_count();
            match movement {
                Movement::Right => c..(c + 1).min(count),
                Movement::Left => c.saturating_sub(1)..c,
                Movement::Up | Movement::Down => return Ok(None),
                other => {
                    let target = self.target(other)?;
                    c.min(target)..c.max(target)
                }
            }
        };

        let before = self.snapshot();
        let Some(split) = split::split_deletion(self.layout.index().runs(), range.clone())? else {
            return Ok(None);
        };
        self.set_parts(split.into_parts())?;
        self.cursor.collapse_to(range.start.min(self.glyph_count()));
        tracing::debug!(?range, "deleted text");

        Ok(Some(EditRecord {
            kind: CommandKind::Deletion,
            before,
            after: self.snapshot(),
        }))
    }

    /// Patch the format of the selected glyphs only. Returns `None` without a
    /// selection.
    pub fn format_selection(&mut self, patch: &FormatPatch) -> Result<Option<EditRecord>> {
        self.require_buffer()?;
        if !self.cursor.has_selection() || patch.is_empty() {
            return Ok(None);
        }
        let before = self.snapshot();
        let parts = split::split_formatting(self.layout.index().runs(), self.selection(), patch)?;
        self.set_parts(parts)?;
        Ok(Some(EditRecord {
            kind: CommandKind::Formatting,
            before,
            after: self.snapshot(),
        }))
    }

    /// Patch the base format and every part.
    pub fn set_base_format(&mut self, patch: &FormatPatch) -> Result<EditRecord> {
        self.require_buffer()?;
        let before = self.snapshot();
        let parts = self
            .parts()
            .into_iter()
            .map(|part| TextPart::new(part.text, patch.apply(&part.format)))
            .collect();
        let base = patch.apply(self.base_format());
        self.layout.set_base_format(base);
        self.set_parts(parts)?;
        Ok(EditRecord {
            kind: CommandKind::Formatting,
            before,
            after: self.snapshot(),
        })
    }

    /// Where to draw the cursor bar.
    pub fn cursor_rect(&self) -> CursorRect {
        let c = self.cursor.edit_cursor.min(self.glyph_count());
        let line = &self.layout.lines()[self.layout.line_index_of(c)];
        CursorRect {
            x: self.layout.cursor_x_px(c),
            y: self.layout.margin() as f32 + line.top() - self.layout.scroll(),
            height: line.full_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Direction;
    use crate::layout::Sizing;
    use crate::shaping::SimpleShaper;

    fn editor(text: &str) -> Editor {
        let base = Format {
            charsize: 10,
            ..Format::default()
        };
        let constraints = LayoutConstraints {
            sizing: Sizing::Fixed {
                width: 200,
                height: 100,
            },
            margin: 0,
        };
        let mut editor = Editor::new(Arc::new(SimpleShaper::with_ratio(1.0)), base, constraints).unwrap();
        editor.parse(text).unwrap();
        editor
    }

    #[test]
    fn insert_in_the_middle_of_a_run() {
        let mut editor = editor("hello");
        editor.set_selection(3, 3).unwrap();
        let record = editor.insert_text("X").unwrap().unwrap();
        assert_eq!(editor.text(), "helXlo");
        assert_eq!(editor.glyph_count(), 6);
        assert_eq!(editor.parts().len(), 1);
        assert_eq!(editor.cursor().edit_cursor, 4);
        assert_eq!(record.kind, CommandKind::Addition);
        assert_eq!(record.before.edit_cursor, 3);
        assert_eq!(record.after.edit_cursor, 4);
    }

    #[test]
    fn insert_at_end_appends_to_last_run() {
        let mut editor = editor("ab{{\"outline\":true}}cd{{}}");
        assert_eq!(editor.cursor().edit_cursor, 4);
        editor.insert_text("e").unwrap();
        assert_eq!(editor.parts()[1].text, "cde");
    }

    #[test]
    fn insert_replaces_selection() {
        let mut editor = editor("hello world");
        editor.set_selection(0, 5).unwrap();
        editor.insert_text("bye").unwrap();
        assert_eq!(editor.text(), "bye world");
        assert_eq!(editor.cursor().edit_cursor, 3);
        assert!(!editor.cursor().has_selection());
    }

    #[test]
    fn delete_selection_regardless_of_direction() {
        let mut editor = editor("abcdefg");
        editor.set_selection(5, 2).unwrap();
        let record = editor.delete_text(Movement::Right).unwrap().unwrap();
        assert_eq!(editor.glyph_count(), 4);
        assert_eq!(editor.text(), "abfg");
        assert_eq!(editor.cursor().edit_cursor, 2);
        assert_eq!(record.kind, CommandKind::Deletion);
    }

    #[test]
    fn delete_left_at_start_is_a_noop() {
        let mut editor = editor("abc");
        editor.move_cursor(Movement::DocumentStart).unwrap();
        assert!(editor.delete_text(Movement::Left).unwrap().is_none());
        assert!(editor.delete_text(Movement::Right).unwrap().is_some());
        assert_eq!(editor.text(), "bc");
    }

    #[test]
    fn delete_words() {
        let mut editor = editor("one two three");
        editor.delete_text(Movement::CtrlLeft).unwrap();
        assert_eq!(editor.text(), "one two ");
        editor.move_cursor(Movement::DocumentStart).unwrap();
        editor.delete_text(Movement::CtrlRight).unwrap();
        assert_eq!(editor.text(), " two ");
    }

    #[test]
    fn deleting_everything_keeps_base_format() {
        let mut editor = editor("abc");
        editor.select_all().unwrap();
        editor.delete_text(Movement::Left).unwrap();
        assert_eq!(editor.glyph_count(), 0);
        assert_eq!(editor.parts().len(), 1);
        assert_eq!(editor.layout().lines().len(), 1);
        editor.insert_text("z").unwrap();
        assert_eq!(editor.text(), "z");
    }

    #[test]
    fn editing_without_buffer_fails() {
        let mut editor = editor("abc");
        editor.set_parts(Vec::new()).unwrap();
        assert_eq!(editor.insert_text("x").unwrap_err(), TextError::NoBuffer);
        assert_eq!(editor.move_cursor(Movement::Left).unwrap_err(), TextError::NoBuffer);
        assert_eq!(editor.place_cursor(0.0, 0.0).unwrap_err(), TextError::NoBuffer);
    }

    #[test]
    fn format_selection_only_touches_selected_glyphs() {
        let mut editor = editor("hello world");
        editor.set_selection(6, 11).unwrap();
        let patch = FormatPatch::from_json(r#"{"alpha":128}"#).unwrap();
        editor.format_selection(&patch).unwrap().unwrap();
        let parts = editor.parts();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].text, "hello ");
        assert_eq!(parts[0].format.alpha, 255);
        assert_eq!(parts[1].format.alpha, 128);
        assert_eq!(editor.glyph_count(), 11);
    }

    #[test]
    fn set_base_format_patches_everything() {
        let mut editor = editor("ab{{\"outline\":true}}cd{{}}");
        let patch = FormatPatch::from_json(r#"{"charsize":20}"#).unwrap();
        editor.set_base_format(&patch).unwrap();
        assert_eq!(editor.base_format().charsize, 20);
        assert!(editor.parts().iter().all(|p| p.format.charsize == 20));
        assert_eq!(editor.unparse().unwrap(), "ab{{\"outline\":true}}cd{{}}");
    }

    #[test]
    fn horizontal_moves_clamp() {
        let mut editor = editor("ab");
        editor.move_cursor(Movement::Right).unwrap();
        assert_eq!(editor.cursor().edit_cursor, 2);
        editor.move_cursor(Movement::DocumentStart).unwrap();
        editor.move_cursor(Movement::Left).unwrap();
        assert_eq!(editor.cursor().edit_cursor, 0);
    }

    #[test]
    fn vertical_moves_keep_horizontal_anchor() {
        let mut editor = editor("abcdef\nab\nabcdef");
        editor.set_selection(5, 5).unwrap();
        editor.move_cursor(Movement::Down).unwrap();
        // Line two is short: clamp before its newline.
        assert_eq!(editor.cursor().edit_cursor, 9);
        editor.move_cursor(Movement::Down).unwrap();
        assert_eq!(editor.cursor().edit_cursor, 15);
        editor.move_cursor(Movement::Up).unwrap();
        editor.move_cursor(Movement::Up).unwrap();
        assert_eq!(editor.cursor().edit_cursor, 5);
        editor.move_cursor(Movement::Up).unwrap();
        assert_eq!(editor.cursor().edit_cursor, 0);
    }

    #[test]
    fn line_start_and_end() {
        let mut editor = editor("abc\ndef");
        editor.set_selection(5, 5).unwrap();
        editor.move_cursor(Movement::Start).unwrap();
        assert_eq!(editor.cursor().edit_cursor, 4);
        editor.move_cursor(Movement::End).unwrap();
        assert_eq!(editor.cursor().edit_cursor, 7);
        editor.set_selection(1, 1).unwrap();
        editor.move_cursor(Movement::End).unwrap();
        assert_eq!(editor.cursor().edit_cursor, 3);
    }

    #[test]
    fn locked_selection_extends() {
        let mut editor = editor("abcdef");
        editor.move_cursor(Movement::DocumentStart).unwrap();
        editor.lock_selection(true);
        editor.move_cursor(Movement::CtrlRight).unwrap();
        assert_eq!(editor.selection(), 0..6);
        assert_eq!(editor.selected_text().unwrap(), "abcdef");
        editor.lock_selection(false);
        editor.move_cursor(Movement::Left).unwrap();
        assert!(!editor.cursor().has_selection());
    }

    #[test]
    fn place_cursor_in_mixed_direction_text() {
        let mut editor = editor("abc ");
        let rtl = Format {
            direction: Direction::Rtl,
            ..editor.base_format().clone()
        };
        let mut parts = editor.parts();
        parts.push(TextPart::new("שלום", rtl));
        editor.set_parts(parts).unwrap();
        editor.place_cursor(42.0, 5.0).unwrap();
        assert_eq!(editor.cursor().edit_cursor, 8);
    }

    #[test]
    fn restore_snapshot_round_trips() {
        let mut editor = editor("abc");
        let record = editor.insert_text("d").unwrap().unwrap();
        editor.restore(&record.before).unwrap();
        assert_eq!(editor.text(), "abc");
        assert_eq!(editor.cursor().edit_cursor, 3);
        editor.restore(&record.after).unwrap();
        assert_eq!(editor.text(), "abcd");
    }

    #[test]
    fn cursor_rect_tracks_line() {
        let editor = editor("ab\ncd");
        let rect = editor.cursor_rect();
        assert_eq!(rect.x, 20.0);
        assert_eq!(rect.y, 10.0);
        assert_eq!(rect.height, 10.0);
    }
}
