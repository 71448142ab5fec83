use crate::error::{Result, TextError};
use crate::format::{Direction, Format, TextPart};
use crate::shaping::{SegmentProperties, Shaper};

/// A shaped glyph together with the flags layout needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphRecord {
    pub glyph_id: u32,
    /// Byte offset of the glyph's cluster within the run text.
    pub cluster: u32,
    /// First scalar value of the cluster.
    pub ch: char,
    /// Advances and offsets in 26.6 fixed point.
    pub x_advance: i32,
    pub y_advance: i32,
    pub x_offset: i32,
    pub y_offset: i32,
    pub is_word_divider: bool,
    pub is_newline: bool,
}

/// One contiguous styled run of text and its shaped glyphs.
///
/// The glyph records are always in sync with the run's string and format:
/// every mutation re-shapes the whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunBuffer {
    part: TextPart,
    direction: Direction,
    glyphs: Vec<GlyphRecord>,
}

impl RunBuffer {
    pub fn new(part: TextPart, shaper: &dyn Shaper) -> Result<Self> {
        let mut run = Self {
            direction: Direction::Ltr,
            part,
            glyphs: Vec::new(),
        };
        run.reshape(shaper)?;
        Ok(run)
    }

    /// Replace both string and format.
    pub fn set(&mut self, part: TextPart, shaper: &dyn Shaper) -> Result<()> {
        self.part = part;
        self.reshape(shaper)
    }

    /// Replace the string, keeping the format.
    pub fn change_string(&mut self, text: impl Into<String>, shaper: &dyn Shaper) -> Result<()> {
        self.part.text = text.into();
        self.reshape(shaper)
    }

    /// Replace the format, keeping the string.
    pub fn change_format(&mut self, format: Format, shaper: &dyn Shaper) -> Result<()> {
        self.part.format = format;
        self.reshape(shaper)
    }

    /// Insert `text` before the glyph at `glyph_cursor` (or at the end when
    /// the cursor equals the glyph count). Returns the number of glyphs the
    /// run gained.
    pub fn insert_text(&mut self, text: &str, glyph_cursor: usize, shaper: &dyn Shaper) -> Result<usize> {
        let at = self.cluster_index(glyph_cursor)?;
        let before = self.glyphs.len();
        self.part.text.insert_str(at, text);
        self.reshape(shaper)?;
        Ok(self.glyphs.len().saturating_sub(before))
    }

    /// Byte offset in the run text of the cluster at `glyph_cursor`.
    ///
    /// The cursor one past the last glyph maps to the end of the string.
    pub fn cluster_index(&self, glyph_cursor: usize) -> Result<usize> {
        match glyph_cursor.cmp(&self.glyphs.len()) {
            core::cmp::Ordering::Less => Ok(self.glyphs[glyph_cursor].cluster as usize),
            core::cmp::Ordering::Equal => Ok(self.part.text.len()),
            core::cmp::Ordering::Greater => Err(TextError::OutOfBounds {
                what: "run glyph cursor",
                index: glyph_cursor,
                len: self.glyphs.len(),
            }),
        }
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn glyphs(&self) -> &[GlyphRecord] {
        &self.glyphs
    }

    pub fn part(&self) -> &TextPart {
        &self.part
    }

    pub fn text(&self) -> &str {
        &self.part.text
    }

    pub fn format(&self) -> &Format {
        &self.part.format
    }

    /// Resolved direction of the run (never `Auto`).
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_rtl(&self) -> bool {
        self.direction.is_rtl()
    }

    fn reshape(&mut self, shaper: &dyn Shaper) -> Result<()> {
        let props = SegmentProperties::for_run(&self.part.text, &self.part.format);
        let shaped = shaper.shape(&self.part.text, &self.part.format, &props)?;

        let text = &self.part.text;
        let format = &self.part.format;
        self.glyphs = shaped
            .into_iter()
            .map(|glyph| {
                let ch = text
                    .get(glyph.cluster as usize..)
                    .and_then(|rest| rest.chars().next())
                    .unwrap_or('\u{fffd}');
                GlyphRecord {
                    glyph_id: glyph.glyph_id,
                    cluster: glyph.cluster,
                    ch,
                    x_advance: glyph.x_advance,
                    y_advance: glyph.y_advance,
                    x_offset: glyph.x_offset,
                    y_offset: glyph.y_offset,
                    is_word_divider: format.is_word_divider(ch),
                    is_newline: ch == '\n',
                }
            })
            .collect();
        self.direction = props.direction;
        Ok(())
    }
}
