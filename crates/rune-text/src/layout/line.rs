use core::ops::Range;

use crate::format::Alignment;
use crate::layout::index::LayoutIndex;
use crate::shaping::{FIXED_ONE, from_fixed};

/// A single visual line of the layout.
///
/// Horizontal quantities are 26.6 fixed point, vertical ones are pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// First glyph on the line (flat index).
    pub first_glyph: usize,
    /// One past the last glyph on the line.
    pub last_glyph: usize,
    /// Largest charsize on the line.
    pub charsize: u32,
    /// Height of the line box: the largest `charsize * line_spacing`.
    pub full_height: f32,
    /// Distance from the top of the line box to the baseline.
    pub baseline: f32,
    /// Cumulative height of all lines up to and including this one.
    pub scroll_offset: f32,
    /// Advance of all glyphs on the line except forced newlines.
    pub used_width: i64,
    /// Available width minus the used width, never negative.
    pub unused_width: i64,
    pub alignment: Alignment,
    /// Paragraph direction.
    pub rtl: bool,
    /// Glyph indices at which the run direction flips away from the
    /// current pen direction.
    pub direction_changes: Vec<usize>,
    /// Whether the line ends with a forced newline.
    pub ends_with_newline: bool,
}

/// Horizontal position of one glyph after bidi placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphPlacement {
    pub index: usize,
    /// Left edge in 26.6 fixed point, including the margin and alignment.
    pub x: i64,
    /// Advance used for placement (zero for forced newlines).
    pub advance: i64,
    pub rtl: bool,
}

impl GlyphPlacement {
    pub fn left(&self) -> i64 {
        self.x
    }

    pub fn right(&self) -> i64 {
        self.x + self.advance
    }

    pub fn midpoint(&self) -> i64 {
        self.x + self.advance / 2
    }
}

/// A maximal span of glyphs sharing one direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionSegment {
    pub range: Range<usize>,
    pub rtl: bool,
}

impl Line {
    pub fn glyph_range(&self) -> Range<usize> {
        self.first_glyph..self.last_glyph
    }

    pub fn is_empty(&self) -> bool {
        self.first_glyph == self.last_glyph
    }

    /// Top of the line relative to the top of the content.
    pub fn top(&self) -> f32 {
        self.scroll_offset - self.full_height
    }

    pub fn bottom(&self) -> f32 {
        self.scroll_offset
    }

    /// Largest cursor position that still belongs to this line.
    ///
    /// A line that ends in a forced newline or a wrap point keeps its cursor
    /// in front of the last glyph; only the final line reaches
    /// `glyph_count`.
    pub fn max_cursor(&self, glyph_count: usize) -> usize {
        if self.last_glyph == glyph_count && !self.ends_with_newline {
            glyph_count
        } else {
            self.last_glyph.saturating_sub(1).max(self.first_glyph)
        }
    }

    /// Left edge of the line's content for the given margin.
    pub fn start_x(&self, margin: u32) -> i64 {
        let margin = i64::from(margin) * i64::from(FIXED_ONE);
        match self.alignment {
            Alignment::Left => margin,
            Alignment::Center => margin + self.unused_width / 2,
            Alignment::Right => margin + self.unused_width,
        }
    }

    pub fn start_x_px(&self, margin: u32) -> f32 {
        from_fixed(self.start_x(margin))
    }

    /// Direction segments in logical order.
    pub fn segments(&self) -> Vec<DirectionSegment> {
        let mut segments = Vec::with_capacity(self.direction_changes.len() + 1);
        let mut rtl = self.rtl;
        let mut start = self.first_glyph;
        for &change in &self.direction_changes {
            if change > start {
                segments.push(DirectionSegment { range: start..change, rtl });
            }
            start = change;
            rtl = !rtl;
        }
        if self.last_glyph > start || segments.is_empty() {
            segments.push(DirectionSegment {
                range: start..self.last_glyph,
                rtl,
            });
        }
        segments
    }

    /// Glyph placements in visual order, left to right.
    ///
    /// An LTR paragraph lays its segments out left to right and an RTL one
    /// right to left. The pen is replaced at every direction flip so the
    /// glyphs of an opposite-direction segment run the other way within the
    /// segment's own span.
    pub fn placements(&self, index: &LayoutIndex, margin: u32) -> Vec<GlyphPlacement> {
        let mut visual = Vec::with_capacity(self.last_glyph - self.first_glyph);
        let mut segments = self.segments();
        if self.rtl {
            segments.reverse();
        }
        for segment in segments {
            if segment.rtl {
                visual.extend(segment.range.rev().map(|i| (i, true)));
            } else {
                visual.extend(segment.range.map(|i| (i, false)));
            }
        }

        let mut pen = self.start_x(margin);
        visual
            .into_iter()
            .filter_map(|(i, rtl)| {
                let glyph = index.glyph(i).ok()?;
                let advance = if glyph.is_newline {
                    0
                } else {
                    i64::from(glyph.x_advance)
                };
                let placement = GlyphPlacement {
                    index: i,
                    x: pen,
                    advance,
                    rtl,
                };
                pen += advance;
                Some(placement)
            })
            .collect()
    }
}
