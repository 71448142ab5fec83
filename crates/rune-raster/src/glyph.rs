use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::Mutex;
use rune_text::FontLibrary;

use crate::error::{RasterError, Result};

/// Identifies one rendered glyph bitmap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlyphKey {
    pub font: String,
    pub glyph_id: u32,
    /// Pixels per em.
    pub charsize: u32,
    /// Stroke width in pixels for outline bitmaps, `None` for fills.
    pub outline: Option<u32>,
}

/// Coverage bitmap of one glyph, positioned relative to the pen on the
/// baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphBitmap {
    pub width: u32,
    pub height: u32,
    /// Distance from the pen to the bitmap's left edge.
    pub pen_left: i32,
    /// Distance from the baseline up to the bitmap's top edge.
    pub pen_top: i32,
    /// One coverage byte per pixel, row-major.
    pub coverage: Vec<u8>,
}

impl GlyphBitmap {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn coverage_at(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.coverage[(y * self.width + x) as usize]
    }
}

/// Glyph rendering backend.
pub trait GlyphRasterizer: Send + Sync + fmt::Debug {
    fn rasterize(&self, key: &GlyphKey) -> Result<GlyphBitmap>;
}

/// Renders glyph outlines with swash, using faces from a [`FontLibrary`].
#[derive(Debug, Clone)]
pub struct SwashRasterizer {
    fonts: Arc<FontLibrary>,
}

impl SwashRasterizer {
    pub fn new(fonts: Arc<FontLibrary>) -> Self {
        Self { fonts }
    }
}

impl GlyphRasterizer for SwashRasterizer {
    fn rasterize(&self, key: &GlyphKey) -> Result<GlyphBitmap> {
        let face = self.fonts.resolve(&key.font)?;
        // Glyphs without an outline (spaces) render as empty bitmaps.
        let Some(mask) = face.render_glyph(key.glyph_id, key.charsize as f32, key.outline.map(|w| w as f32)) else {
            return Ok(GlyphBitmap::default());
        };
        if mask.data.len() != (mask.width * mask.height) as usize {
            return Err(RasterError::Glyph {
                font: key.font.clone(),
                glyph_id: key.glyph_id,
                reason: format!("mask of {} bytes for {}x{}", mask.data.len(), mask.width, mask.height),
            });
        }
        Ok(GlyphBitmap {
            width: mask.width,
            height: mask.height,
            pen_left: mask.left,
            pen_top: mask.top,
            coverage: mask.data,
        })
    }
}

/// Font-less backend drawing every visible glyph as a solid box.
///
/// Pairs with the `SimpleShaper`, which uses scalar values as glyph ids:
/// whitespace renders empty. Boxes are 40% of the charsize wide and 70% tall
/// and sit on the baseline; outline bitmaps are the box's border band grown
/// by the stroke width.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockRasterizer;

impl GlyphRasterizer for BlockRasterizer {
    fn rasterize(&self, key: &GlyphKey) -> Result<GlyphBitmap> {
        if char::from_u32(key.glyph_id).is_none_or(char::is_whitespace) {
            return Ok(GlyphBitmap::default());
        }

        let box_width = ((key.charsize as f32 * 0.4).round() as u32).max(1);
        let box_height = ((key.charsize as f32 * 0.7).round() as u32).max(1);
        let stroke = key.outline.unwrap_or(0);
        let width = box_width + 2 * stroke;
        let height = box_height + 2 * stroke;

        let coverage = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| {
                let on_border = x < 2 * stroke
                    || x >= width.saturating_sub(2 * stroke)
                    || y < 2 * stroke
                    || y >= height.saturating_sub(2 * stroke);
                if key.outline.is_none() || on_border { 255 } else { 0 }
            })
            .collect();

        Ok(GlyphBitmap {
            width,
            height,
            pen_left: 1 - stroke as i32,
            pen_top: (box_height + stroke) as i32,
            coverage,
        })
    }
}

/// Memoizes bitmaps across raster jobs.
///
/// Rendering happens outside the lock; two threads missing on the same key
/// may both render it, and the first insert wins.
#[derive(Debug)]
pub struct GlyphCache {
    rasterizer: Arc<dyn GlyphRasterizer>,
    entries: Mutex<HashMap<GlyphKey, Arc<GlyphBitmap>>>,
}

impl GlyphCache {
    pub fn new(rasterizer: Arc<dyn GlyphRasterizer>) -> Self {
        Self {
            rasterizer,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &GlyphKey) -> Result<Arc<GlyphBitmap>> {
        if let Some(bitmap) = self.entries.lock().get(key) {
            return Ok(bitmap.clone());
        }
        let bitmap = Arc::new(self.rasterizer.rasterize(key)?);
        let mut entries = self.entries.lock();
        Ok(entries.entry(key.clone()).or_insert(bitmap).clone())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
