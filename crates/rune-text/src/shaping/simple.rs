use unicode_segmentation::UnicodeSegmentation;

use super::{SegmentProperties, ShapedGlyph, Shaper, to_fixed};
use crate::error::Result;
use crate::format::Format;

/// Font-less shaper producing one glyph per grapheme cluster.
///
/// Every cluster advances by `charsize * advance_ratio` pixels, except a
/// forced newline which has no advance. The glyph id is the cluster's first
/// scalar value. Used when no font is available and wherever deterministic
/// metrics are needed.
#[derive(Debug, Clone, Copy)]
pub struct SimpleShaper {
    advance_ratio: f32,
}

impl SimpleShaper {
    pub fn new() -> Self {
        Self { advance_ratio: 0.5 }
    }

    /// A shaper whose clusters advance by `ratio` em.
    pub fn with_ratio(ratio: f32) -> Self {
        Self { advance_ratio: ratio }
    }
}

impl Default for SimpleShaper {
    fn default() -> Self {
        Self::new()
    }
}

impl Shaper for SimpleShaper {
    fn shape(&self, text: &str, format: &Format, _props: &SegmentProperties) -> Result<Vec<ShapedGlyph>> {
        let advance = to_fixed(format.charsize as f32 * self.advance_ratio);
        Ok(text
            .grapheme_indices(true)
            .map(|(offset, cluster)| {
                let first = cluster.chars().next().unwrap_or('\u{fffd}');
                ShapedGlyph {
                    glyph_id: first as u32,
                    cluster: offset as u32,
                    x_advance: if first == '\n' { 0 } else { advance },
                    y_advance: 0,
                    x_offset: 0,
                    y_offset: 0,
                }
            })
            .collect())
    }
}
