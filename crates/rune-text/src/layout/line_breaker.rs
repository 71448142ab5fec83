use core::ops::Range;

use crate::format::Format;
use crate::layout::index::LayoutIndex;
use crate::layout::line::Line;
use crate::layout::run::{GlyphRecord, RunBuffer};
use crate::shaping::{FIXED_ONE, from_fixed};

/// How the area's box is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sizing {
    /// Fixed box; lines wrap at `width - margin`.
    Fixed { width: u32, height: u32 },
    /// The box grows to fit its content. Lines wrap only when a maximum
    /// width is given.
    AutoWrap { min_width: u32, max_width: Option<u32> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConstraints {
    pub sizing: Sizing,
    pub margin: u32,
}

impl Default for LayoutConstraints {
    fn default() -> Self {
        Self {
            sizing: Sizing::AutoWrap {
                min_width: 0,
                max_width: None,
            },
            margin: 0,
        }
    }
}

impl LayoutConstraints {
    /// Right edge the pen may not cross, in 26.6 fixed point.
    fn pen_limit(&self) -> Option<i64> {
        let edge = match self.sizing {
            Sizing::Fixed { width, .. } => width,
            Sizing::AutoWrap { max_width, .. } => max_width?,
        };
        Some(i64::from(edge.saturating_sub(self.margin)) * i64::from(FIXED_ONE))
    }
}

/// Result of one line breaking pass.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLines {
    pub lines: Vec<Line>,
    /// Box width after auto-wrap growth.
    pub width: u32,
    /// Box height after auto-wrap growth.
    pub height: u32,
    /// Sum of all line heights.
    pub content_height: f32,
}

/// Break the glyph stream into lines.
///
/// Breaks happen after a forced newline, or when the pen leaves the
/// available width: after the last word divider seen on the line, or hard
/// at the overflowing glyph when the line has no divider. A glyph wider than
/// the whole line still gets a line of its own.
pub fn break_lines(index: &LayoutIndex, base: &Format, constraints: &LayoutConstraints) -> BrokenLines {
    let margin = i64::from(constraints.margin) * i64::from(FIXED_ONE);
    let limit = constraints.pen_limit();
    let glyph_count = index.glyph_count();
    let glyphs: Vec<(&RunBuffer, &GlyphRecord)> = index.iter().map(|(_, run, glyph)| (run, glyph)).collect();

    let mut ranges: Vec<Range<usize>> = Vec::new();
    let mut start = 0;
    while start < glyph_count {
        let mut pen = margin;
        let mut candidate = None;
        let mut end = glyph_count;

        for (i, (_, glyph)) in glyphs.iter().enumerate().skip(start) {
            if glyph.is_newline {
                end = i + 1;
                break;
            }
            if glyph.is_word_divider {
                candidate = Some(i);
            }
            pen += i64::from(glyph.x_advance);
            if limit.is_some_and(|limit| pen > limit) {
                end = match candidate {
                    Some(divider) => divider + 1,
                    None if i > start => i,
                    None => i + 1,
                };
                break;
            }
        }
        ranges.push(start..end);
        start = end;
    }

    let trailing_newline = glyphs.last().is_some_and(|(_, glyph)| glyph.is_newline);
    if glyph_count == 0 || trailing_newline {
        ranges.push(glyph_count..glyph_count);
    }

    let rtl = !index.is_ltr();
    let mut lines = Vec::with_capacity(ranges.len());
    let mut scroll_offset = 0.0;
    for range in ranges {
        let line = finish_line(&glyphs, base, range, rtl, scroll_offset);
        scroll_offset = line.scroll_offset;
        lines.push(line);
    }

    let content_height = scroll_offset;
    let (width, height) = match constraints.sizing {
        Sizing::Fixed { width, height } => (width, height),
        Sizing::AutoWrap { min_width, max_width } => {
            let widest = lines.iter().map(|line| line.used_width).max().unwrap_or(0);
            let width = (from_fixed(widest).ceil() as u32).saturating_add(2 * constraints.margin);
            let width = width.max(min_width).min(max_width.unwrap_or(u32::MAX));
            let height = content_height.ceil() as u32 + 2 * constraints.margin;
            (width, height)
        }
    };

    let available = i64::from(width.saturating_sub(2 * constraints.margin)) * i64::from(FIXED_ONE);
    for line in &mut lines {
        line.unused_width = (available - line.used_width).max(0);
    }

    tracing::debug!(lines = lines.len(), width, height, "line breaking pass");

    BrokenLines {
        lines,
        width,
        height,
        content_height,
    }
}

fn finish_line(
    glyphs: &[(&RunBuffer, &GlyphRecord)],
    base: &Format,
    range: Range<usize>,
    rtl: bool,
    previous: f32,
) -> Line {
    let mut charsize = 0;
    let mut full_height: f32 = 0.0;
    let mut used_width = 0i64;
    let mut direction_changes = Vec::new();
    let mut pen_rtl = rtl;
    let mut ends_with_newline = false;

    for (i, (run, glyph)) in glyphs[range.clone()].iter().enumerate() {
        let format = run.format();
        charsize = charsize.max(format.charsize);
        full_height = full_height.max(format.line_height());
        if run.is_rtl() != pen_rtl {
            direction_changes.push(range.start + i);
            pen_rtl = run.is_rtl();
        }
        if glyph.is_newline {
            ends_with_newline = true;
        } else {
            used_width += i64::from(glyph.x_advance);
        }
    }

    // An empty line takes its metrics from the run before it, or from the
    // base format when there is no text at all.
    let alignment_format = glyphs
        .get(range.start)
        .or_else(|| glyphs.get(range.start.checked_sub(1)?))
        .map(|(run, _)| run.format())
        .unwrap_or(base);
    if range.is_empty() {
        charsize = alignment_format.charsize;
        full_height = alignment_format.line_height();
    }

    let cs = charsize as f32;
    Line {
        first_glyph: range.start,
        last_glyph: range.end,
        charsize,
        full_height,
        baseline: (full_height - cs) / 2.0 + cs * 0.8,
        scroll_offset: previous + full_height,
        used_width,
        unused_width: 0,
        alignment: alignment_format.alignment,
        rtl,
        direction_changes,
        ends_with_newline,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::format::{Alignment, Direction, TextPart};
    use crate::layout::run::RunBuffer;
    use crate::shaping::SimpleShaper;

    fn index_of(parts: &[(&str, Format)], shaper: &SimpleShaper) -> LayoutIndex {
        LayoutIndex::new(
            parts
                .iter()
                .map(|(text, format)| Arc::new(RunBuffer::new(TextPart::new(*text, format.clone()), shaper).unwrap()))
                .collect(),
        )
    }

    fn twelve() -> Format {
        Format {
            charsize: 12,
            ..Format::default()
        }
    }

    fn fixed(width: u32, margin: u32) -> LayoutConstraints {
        LayoutConstraints {
            sizing: Sizing::Fixed { width, height: 100 },
            margin,
        }
    }

    #[test]
    fn wraps_at_preceding_divider() {
        let shaper = SimpleShaper::with_ratio(1.0);
        let index = index_of(&[("Lorem ipsum dolor", twelve())], &shaper);
        let broken = break_lines(&index, &twelve(), &fixed(200, 10));
        let ranges: Vec<_> = broken.lines.iter().map(Line::glyph_range).collect();
        assert_eq!(ranges, vec![0..12, 12..17]);
        assert_eq!(broken.lines[0].used_width, 12 * 12 * 64);
        assert_eq!(broken.lines[1].scroll_offset, 24.0);
    }

    #[test]
    fn lines_partition_the_glyphs() {
        let shaper = SimpleShaper::with_ratio(1.0);
        let index = index_of(&[("aa bb\ncc dd ee ff gg", twelve())], &shaper);
        let broken = break_lines(&index, &twelve(), &fixed(80, 4));
        let mut expected = 0;
        for line in &broken.lines {
            assert_eq!(line.first_glyph, expected);
            expected = line.last_glyph;
        }
        assert_eq!(expected, index.glyph_count());
        assert!(broken.lines[0].ends_with_newline);
    }

    #[test]
    fn long_word_breaks_hard() {
        let shaper = SimpleShaper::with_ratio(1.0);
        let index = index_of(&[("abcdefghij", twelve())], &shaper);
        let broken = break_lines(&index, &twelve(), &fixed(50, 0));
        let ranges: Vec<_> = broken.lines.iter().map(Line::glyph_range).collect();
        assert_eq!(ranges, vec![0..4, 4..8, 8..10]);
    }

    #[test]
    fn glyph_wider_than_line_gets_own_line() {
        let shaper = SimpleShaper::with_ratio(1.0);
        let big = Format {
            charsize: 40,
            ..Format::default()
        };
        let index = index_of(&[("WW", big.clone())], &shaper);
        let broken = break_lines(&index, &big, &fixed(30, 0));
        let ranges: Vec<_> = broken.lines.iter().map(Line::glyph_range).collect();
        assert_eq!(ranges, vec![0..1, 1..2]);
    }

    #[test]
    fn trailing_newline_adds_empty_line() {
        let shaper = SimpleShaper::new();
        let index = index_of(&[("ab\n", twelve())], &shaper);
        let broken = break_lines(&index, &twelve(), &LayoutConstraints::default());
        assert_eq!(broken.lines.len(), 2);
        assert_eq!(broken.lines[1].glyph_range(), 3..3);
        assert_eq!(broken.lines[1].full_height, 12.0);
    }

    #[test]
    fn empty_text_yields_single_base_line() {
        let base = Format {
            charsize: 20,
            line_spacing: 1.5,
            ..Format::default()
        };
        let index = index_of(&[("", base.clone())], &SimpleShaper::new());
        let broken = break_lines(&index, &base, &LayoutConstraints::default());
        assert_eq!(broken.lines.len(), 1);
        assert_eq!(broken.lines[0].full_height, 30.0);
        assert_eq!(broken.content_height, 30.0);
    }

    #[test]
    fn line_height_is_max_not_sum() {
        let shaper = SimpleShaper::new();
        let big = Format {
            charsize: 30,
            ..Format::default()
        };
        let index = index_of(&[("ab", twelve()), ("cd", big)], &shaper);
        let broken = break_lines(&index, &twelve(), &LayoutConstraints::default());
        assert_eq!(broken.lines[0].full_height, 30.0);
        assert_eq!(broken.lines[0].charsize, 30);
    }

    #[test]
    fn auto_wrap_grows_to_widest_line() {
        let shaper = SimpleShaper::with_ratio(1.0);
        let index = index_of(&[("abc\nabcdef", twelve())], &shaper);
        let constraints = LayoutConstraints {
            sizing: Sizing::AutoWrap {
                min_width: 10,
                max_width: None,
            },
            margin: 5,
        };
        let broken = break_lines(&index, &twelve(), &constraints);
        assert_eq!(broken.width, 6 * 12 + 10);
        assert_eq!(broken.height, 24 + 10);
        assert_eq!(broken.lines[0].unused_width, 3 * 12 * 64);
    }

    #[test]
    fn auto_wrap_respects_max_width() {
        let shaper = SimpleShaper::with_ratio(1.0);
        let index = index_of(&[("aaaa bbbb", twelve())], &shaper);
        let constraints = LayoutConstraints {
            sizing: Sizing::AutoWrap {
                min_width: 0,
                max_width: Some(60),
            },
            margin: 0,
        };
        let broken = break_lines(&index, &twelve(), &constraints);
        assert_eq!(broken.lines.len(), 2);
        assert_eq!(broken.width, 60);
    }

    #[test]
    fn records_direction_changes_per_run() {
        let shaper = SimpleShaper::new();
        let rtl = Format {
            direction: Direction::Rtl,
            ..Format::default()
        };
        let index = index_of(&[("abc ", Format::default()), ("שלום", rtl)], &shaper);
        let broken = break_lines(&index, &Format::default(), &LayoutConstraints::default());
        assert_eq!(broken.lines[0].direction_changes, vec![4]);
        assert!(!broken.lines[0].rtl);
    }

    #[test]
    fn many_lines_keep_their_ranges_and_offsets() {
        let shaper = SimpleShaper::with_ratio(1.0);
        let text = "abcdefgh\n".repeat(4000);
        let index = index_of(&[(text.as_str(), twelve())], &shaper);
        let broken = break_lines(&index, &twelve(), &LayoutConstraints::default());
        assert_eq!(broken.lines.len(), 4001);
        assert_eq!(broken.lines[3999].glyph_range(), 3999 * 9..4000 * 9);
        assert_eq!(broken.lines[3999].used_width, 8 * 12 * 64);
        assert_eq!(broken.lines[4000].glyph_range(), 36000..36000);
        assert_eq!(broken.content_height, 4001.0 * 12.0);
    }

    #[test]
    fn alignment_comes_from_first_glyph() {
        let shaper = SimpleShaper::new();
        let centered = Format {
            alignment: Alignment::Center,
            ..Format::default()
        };
        let index = index_of(&[("ab", centered), ("cd", Format::default())], &shaper);
        let broken = break_lines(&index, &Format::default(), &fixed(100, 0));
        assert_eq!(broken.lines[0].alignment, Alignment::Center);
    }
}
