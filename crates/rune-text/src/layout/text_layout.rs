use std::sync::Arc;

use crate::error::{Result, TextError};
use crate::format::Format;
use crate::layout::index::LayoutIndex;
use crate::layout::line::{GlyphPlacement, Line};
use crate::layout::line_breaker::{BrokenLines, LayoutConstraints, Sizing, break_lines};
use crate::layout::run::RunBuffer;
use crate::shaping::{FIXED_ONE, from_fixed, to_fixed};

/// Runs, their flat index and the lines computed from them.
///
/// Lines are recomputed wholesale whenever the runs, the base format or the
/// constraints change. Cloning is cheap: runs are shared, lines are small.
#[derive(Debug, Clone)]
pub struct TextLayout {
    index: LayoutIndex,
    lines: Vec<Line>,
    base: Format,
    constraints: LayoutConstraints,
    width: u32,
    height: u32,
    content_height: f32,
    scroll: f32,
}

impl TextLayout {
    pub fn new(base: Format, constraints: LayoutConstraints) -> Result<Self> {
        validate(&constraints)?;
        let mut layout = Self {
            index: LayoutIndex::default(),
            lines: Vec::new(),
            base,
            constraints,
            width: 0,
            height: 0,
            content_height: 0.0,
            scroll: 0.0,
        };
        layout.relayout();
        Ok(layout)
    }

    /// Replace all runs and recompute the lines.
    pub fn set_runs(&mut self, runs: Vec<Arc<RunBuffer>>) {
        self.index.update(runs);
        self.relayout();
    }

    pub fn set_constraints(&mut self, constraints: LayoutConstraints) -> Result<()> {
        validate(&constraints)?;
        self.constraints = constraints;
        self.relayout();
        Ok(())
    }

    pub fn set_base_format(&mut self, base: Format) {
        self.base = base;
        self.relayout();
    }

    /// Run the line breaker again over the current runs.
    pub fn relayout(&mut self) {
        let BrokenLines {
            lines,
            width,
            height,
            content_height,
        } = break_lines(&self.index, &self.base, &self.constraints);

        if self.content_height > 0.0 && content_height != self.content_height {
            self.scroll *= content_height / self.content_height;
        }
        self.lines = lines;
        self.width = width;
        self.height = height;
        self.content_height = content_height;
        self.scroll = self.scroll.clamp(0.0, self.max_scroll());
    }

    pub fn index(&self) -> &LayoutIndex {
        &self.index
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn base_format(&self) -> &Format {
        &self.base
    }

    pub fn constraints(&self) -> &LayoutConstraints {
        &self.constraints
    }

    pub fn glyph_count(&self) -> usize {
        self.index.glyph_count()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn margin(&self) -> u32 {
        self.constraints.margin
    }

    pub fn content_height(&self) -> f32 {
        self.content_height
    }

    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    /// Largest scroll offset that keeps content in view.
    pub fn max_scroll(&self) -> f32 {
        (self.content_height + 2.0 * self.constraints.margin as f32 - self.height as f32).max(0.0)
    }

    /// Scroll by `delta` pixels, clamped. Returns whether the offset moved.
    pub fn scroll_by(&mut self, delta: f32) -> bool {
        let next = (self.scroll + delta).clamp(0.0, self.max_scroll());
        let moved = next != self.scroll;
        self.scroll = next;
        moved
    }

    /// Line holding `cursor`. A cursor at a wrap point belongs to the line
    /// that starts there.
    pub fn line_index_of(&self, cursor: usize) -> usize {
        self.lines
            .iter()
            .position(|line| cursor < line.last_glyph)
            .unwrap_or(self.lines.len().saturating_sub(1))
    }

    /// Line at a content-relative y coordinate; the last line when below.
    pub fn line_index_at_y(&self, y: f32) -> usize {
        self.lines
            .iter()
            .position(|line| line.scroll_offset > y)
            .unwrap_or(self.lines.len().saturating_sub(1))
    }

    pub fn placements(&self, line: usize) -> Vec<GlyphPlacement> {
        self.lines
            .get(line)
            .map(|line| line.placements(&self.index, self.constraints.margin))
            .unwrap_or_default()
    }

    /// Cursor for a click at `x` (area pixels) on the given line.
    ///
    /// The first glyph in visual order whose midpoint lies right of `x`
    /// decides: the cursor goes logically before an LTR glyph and after an
    /// RTL one. Past the right end the rightmost glyph decides the other way.
    pub fn hit_test_line(&self, line: usize, x: f32) -> Result<usize> {
        let line = self.lines.get(line).ok_or(TextError::OutOfBounds {
            what: "line",
            index: line,
            len: self.lines.len(),
        })?;
        let x = i64::from(to_fixed(x));
        let placements = line.placements(&self.index, self.constraints.margin);

        let cursor = match placements.iter().find(|p| x < p.midpoint()) {
            Some(p) if p.rtl => p.index + 1,
            Some(p) => p.index,
            None => match placements.last() {
                Some(p) if p.rtl => p.index,
                Some(p) => p.index + 1,
                None => line.first_glyph,
            },
        };
        Ok(cursor.clamp(line.first_glyph, line.max_cursor(self.glyph_count())))
    }

    /// Cursor for a click at area coordinates `(x, y)`, taking the scroll
    /// offset into account.
    pub fn hit_test(&self, x: f32, y: f32) -> Result<usize> {
        let y = y - self.constraints.margin as f32 + self.scroll;
        self.hit_test_line(self.line_index_at_y(y), x)
    }

    /// Horizontal cursor position in 26.6 fixed point, in area coordinates.
    pub fn cursor_x(&self, cursor: usize) -> i64 {
        let line_index = self.line_index_of(cursor);
        let Some(line) = self.lines.get(line_index) else {
            return i64::from(self.constraints.margin) * i64::from(FIXED_ONE);
        };
        let placements = line.placements(&self.index, self.constraints.margin);

        if let Some(p) = placements.iter().find(|p| p.index == cursor) {
            return if p.rtl { p.right() } else { p.left() };
        }
        if let Some(p) = placements.iter().find(|p| p.index + 1 == cursor) {
            return if p.rtl { p.left() } else { p.right() };
        }
        if line.rtl {
            line.start_x(self.constraints.margin) + line.used_width
        } else {
            line.start_x(self.constraints.margin)
        }
    }

    pub fn cursor_x_px(&self, cursor: usize) -> f32 {
        from_fixed(self.cursor_x(cursor))
    }
}

fn validate(constraints: &LayoutConstraints) -> Result<()> {
    match constraints.sizing {
        Sizing::Fixed { width, height } if width == 0 || height == 0 => Err(TextError::InvalidDimensions {
            width: width as i32,
            height: height as i32,
        }),
        _ => Ok(()),
    }
}
