//! Shaping adapter interface.
//!
//! A [`Shaper`] turns one run of text in one [`Format`] into positioned
//! glyphs. Glyphs are always returned in logical order (cluster offsets
//! non-decreasing), whatever the run direction; visual placement is the
//! line breaker's job.
//!
//! Advances and offsets are 26.6 fixed point (64 units per pixel).

pub mod harfrust_shaper;
pub mod simple;

use core::fmt;

use crate::error::Result;
use crate::format::{Direction, Format};

pub use harfrust_shaper::HarfrustShaper;
pub use simple::SimpleShaper;

/// Number of fractional bits in shaping positions.
pub const FIXED_SHIFT: u32 = 6;
/// One pixel in 26.6 fixed point.
pub const FIXED_ONE: i32 = 1 << FIXED_SHIFT;

/// Convert pixels to 26.6 fixed point.
pub fn to_fixed(px: f32) -> i32 {
    (px * FIXED_ONE as f32).round() as i32
}

/// Convert 26.6 fixed point to pixels.
pub fn from_fixed(value: i64) -> f32 {
    value as f32 / FIXED_ONE as f32
}

/// One glyph as produced by a shaping backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapedGlyph {
    pub glyph_id: u32,
    /// Byte offset of the glyph's cluster within the run text.
    pub cluster: u32,
    pub x_advance: i32,
    pub y_advance: i32,
    pub x_offset: i32,
    pub y_offset: i32,
}

/// Segment properties handed to the backend alongside the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentProperties {
    /// Resolved direction (never `Auto`).
    pub direction: Direction,
    /// ISO-15924 script tag.
    pub script: String,
    /// BCP-47 language tag.
    pub language: String,
}

impl SegmentProperties {
    pub fn for_run(text: &str, format: &Format) -> Self {
        Self {
            direction: format.direction.resolve(text),
            script: format.script.clone(),
            language: format.language.clone(),
        }
    }
}

/// Text shaping backend.
pub trait Shaper: Send + Sync + fmt::Debug {
    /// Shape `text` in `format`, returning glyphs in logical order.
    fn shape(&self, text: &str, format: &Format, props: &SegmentProperties) -> Result<Vec<ShapedGlyph>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_point_conversions() {
        assert_eq!(to_fixed(1.0), 64);
        assert_eq!(to_fixed(0.5), 32);
        assert_eq!(from_fixed(96), 1.5);
    }

    #[test]
    fn segment_properties_resolve_auto_direction() {
        let format = Format {
            direction: Direction::Auto,
            script: "Hebr".to_string(),
            language: "he".to_string(),
            ..Format::default()
        };
        let props = SegmentProperties::for_run("שלום", &format);
        assert_eq!(props.direction, Direction::Rtl);
        assert_eq!(props.script, "Hebr");
    }
}
