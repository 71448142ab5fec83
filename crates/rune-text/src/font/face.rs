use std::sync::Arc;

use swash::scale::{Render, ScaleContext, Source};
use swash::zeno::{Format as MaskFormat, Stroke};
use swash::{FontRef, Metrics};

use crate::error::{Result, TextError};
use crate::font::FontMetrics;

/// Alpha coverage mask for one glyph, positioned relative to the pen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphMask {
    pub width: u32,
    pub height: u32,
    /// Horizontal distance from the pen to the left edge of the mask.
    pub left: i32,
    /// Vertical distance from the baseline up to the top edge of the mask.
    pub top: i32,
    /// One coverage byte per pixel, row-major.
    pub data: Vec<u8>,
}

/// Loaded font face backed by a font file (TTF/OTF).
///
/// This is a thin wrapper around `swash::FontRef` that owns the
/// underlying font data and exposes metrics and glyph rendering.
#[derive(Debug, Clone)]
pub struct FontFace {
    /// Full font data.
    data: Arc<[u8]>,
    /// Index of the face within a collection.
    index: u32,
    /// Offset to the table directory for this font.
    offset: u32,
    /// Cache key used internally by swash.
    key: swash::CacheKey,
    /// Extracted font metrics in font units.
    metrics: FontMetrics,
}

impl FontFace {
    /// Create a font face from raw bytes and a font index within the file.
    pub fn from_bytes(data: Arc<[u8]>, index: usize) -> Result<Self> {
        let font = FontRef::from_index(&data, index)
            .ok_or_else(|| TextError::InvalidFont(format!("no face at index {index}")))?;
        let metrics = Self::metrics_from_swash(&font);
        let (offset, key) = (font.offset, font.key);
        Ok(Self {
            data,
            index: index as u32,
            offset,
            key,
            metrics,
        })
    }

    /// Create a font face from raw bytes owned by a `Vec<u8>`.
    pub fn from_vec(data: Vec<u8>, index: usize) -> Result<Self> {
        Self::from_bytes(Arc::from(data), index)
    }

    /// Create a font face from a font file on disk.
    pub fn from_path(path: impl AsRef<std::path::Path>, index: usize) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_vec(data, index)
    }

    /// Raw font bytes, for handing to the shaper.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Face index within the font file.
    pub fn index(&self) -> u32 {
        self.index
    }

    fn as_swash_ref(&self) -> FontRef<'_> {
        FontRef {
            data: &self.data,
            offset: self.offset,
            key: self.key,
        }
    }

    fn metrics_from_swash(font: &FontRef<'_>) -> FontMetrics {
        let Metrics {
            units_per_em,
            ascent,
            descent,
            leading,
            ..
        } = font.metrics(&[]);

        FontMetrics {
            ascent,
            descent,
            line_gap: leading,
            units_per_em,
        }
    }

    /// Font metrics in font units.
    pub fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    /// Render a glyph's coverage mask at `font_size` pixels per em.
    ///
    /// With `stroke` set the outline is stroked with that width instead of
    /// filled. Returns `None` for glyph ids outside the font or glyphs
    /// without an outline (such as spaces).
    pub fn render_glyph(&self, glyph_id: u32, font_size: f32, stroke: Option<f32>) -> Option<GlyphMask> {
        let glyph_id = u16::try_from(glyph_id).ok()?;
        let mut context = ScaleContext::new();
        let mut scaler = context
            .builder(self.as_swash_ref())
            .size(font_size)
            .hint(true)
            .build();

        let mut render = Render::new(&[Source::Outline]);
        render.format(MaskFormat::Alpha);
        if let Some(width) = stroke {
            render.style(Stroke::new(width));
        }
        let image = render.render(&mut scaler, glyph_id)?;

        Some(GlyphMask {
            width: image.placement.width,
            height: image.placement.height,
            left: image.placement.left,
            top: image.placement.top,
            data: image.data,
        })
    }
}
