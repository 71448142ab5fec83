//! The draw pass: paints a frozen layout snapshot into a pixel surface.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rune_text::shaping::from_fixed;
use rune_text::{Color, CursorRect, Format, GlyphRecord, TextLayout};

use crate::color;
use crate::effects::{self, GlyphPerturbation};
use crate::error::{RasterError, Result};
use crate::glyph::{GlyphCache, GlyphKey};
use crate::surface::{PixelFormat, PixelSurface, Rgba8};

/// Width of the cursor bar in pixels.
pub const CURSOR_WIDTH: u32 = 2;

/// Everything one raster job needs. Owns its data so the editor can keep
/// mutating while the job runs.
#[derive(Debug, Clone)]
pub struct DrawParameters {
    /// Lines and glyph index; also carries the area size, margin and scroll.
    pub layout: TextLayout,
    /// Flat glyph indices to paint. Glyphs outside the range are laid out
    /// but left invisible.
    pub glyph_range: Range<usize>,
    /// Cursor bar to draw, if any.
    pub cursor: Option<CursorRect>,
    pub cursor_color: Rgba8,
    pub background: Rgba8,
    pub pixel_format: PixelFormat,
    /// Time since the area was created; drives effects and rainbow drift.
    pub elapsed: Duration,
}

impl DrawParameters {
    pub fn new(layout: TextLayout) -> Self {
        let glyph_range = 0..layout.glyph_count();
        Self {
            layout,
            glyph_range,
            cursor: None,
            cursor_color: Rgba8::new(255, 255, 255, 255),
            background: Rgba8::TRANSPARENT,
            pixel_format: PixelFormat::default(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn width(&self) -> u32 {
        self.layout.width()
    }

    pub fn height(&self) -> u32 {
        self.layout.height()
    }

    /// Whether any painted glyph changes from frame to frame.
    pub fn is_animated(&self) -> bool {
        self.layout
            .index()
            .runs()
            .iter()
            .any(|run| run.glyph_count() > 0 && run.format().is_animated())
    }
}

/// The four compositing passes, back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layer {
    OutlineShadow,
    TextShadow,
    Outline,
    Text,
}

impl Layer {
    const ALL: [Layer; 4] = [Layer::OutlineShadow, Layer::TextShadow, Layer::Outline, Layer::Text];

    fn applies_to(self, format: &Format) -> bool {
        match self {
            Layer::OutlineShadow => format.shadow && format.outline,
            Layer::TextShadow => format.shadow,
            Layer::Outline => format.outline,
            Layer::Text => true,
        }
    }

    fn color(self, format: &Format) -> Color {
        match self {
            Layer::OutlineShadow | Layer::TextShadow => format.shadow_color,
            Layer::Outline => format.outline_color,
            Layer::Text => format.text_color,
        }
    }

    fn offset(self, format: &Format) -> (f32, f32) {
        match self {
            Layer::OutlineShadow | Layer::TextShadow => (format.shadow_offset[0] as f32, format.shadow_offset[1] as f32),
            Layer::Outline | Layer::Text => (0.0, 0.0),
        }
    }

    fn stroke(self, format: &Format) -> Option<u32> {
        match self {
            Layer::OutlineShadow | Layer::Outline => Some(format.outline_size.max(1)),
            Layer::TextShadow | Layer::Text => None,
        }
    }
}

/// A visible glyph with its pen position in surface pixels.
struct PaintGlyph<'a> {
    index: usize,
    format: &'a Format,
    record: &'a GlyphRecord,
    pen_x: f32,
    baseline_y: f32,
}

fn check(cancel: &AtomicBool) -> Result<()> {
    if cancel.load(Ordering::Relaxed) {
        return Err(RasterError::Cancelled);
    }
    Ok(())
}

/// Paint `params` into `surface`, reshaping it to the area size first.
///
/// Returns [`RasterError::Cancelled`] as soon as `cancel` is observed; the
/// surface content is unspecified in that case.
pub fn draw(params: &DrawParameters, surface: &mut PixelSurface, cache: &GlyphCache, cancel: &AtomicBool) -> Result<()> {
    let layout = &params.layout;
    surface.reshape(layout.width(), layout.height(), params.pixel_format);
    surface.fill(params.background);

    let glyphs = visible_glyphs(params);
    tracing::debug!(
        glyphs = glyphs.len(),
        width = layout.width(),
        height = layout.height(),
        "draw pass"
    );

    for layer in Layer::ALL {
        check(cancel)?;
        for glyph in &glyphs {
            check(cancel)?;
            paint_glyph(params, surface, cache, layer, glyph);
        }
    }

    if let Some(cursor) = params.cursor {
        surface.blend_rect(
            cursor.x.round() as i64,
            cursor.y.round() as i64,
            CURSOR_WIDTH,
            cursor.height.round().max(1.0) as u32,
            params.cursor_color,
        );
    }
    Ok(())
}

fn visible_glyphs(params: &DrawParameters) -> Vec<PaintGlyph<'_>> {
    let layout = &params.layout;
    let records: Vec<_> = layout.index().iter().map(|(_, run, record)| (run.format(), record)).collect();
    let margin = layout.margin() as f32;
    let height = layout.height() as f32;

    let mut out = Vec::new();
    for (line_index, line) in layout.lines().iter().enumerate() {
        let top = margin + line.top() - layout.scroll();
        if top + line.full_height < 0.0 || top > height {
            continue;
        }
        let baseline_y = top + line.baseline;
        for placement in layout.placements(line_index) {
            if !params.glyph_range.contains(&placement.index) {
                continue;
            }
            let Some(&(format, record)) = records.get(placement.index) else {
                continue;
            };
            if record.is_newline {
                continue;
            }
            out.push(PaintGlyph {
                index: placement.index,
                format,
                record,
                pen_x: from_fixed(placement.x + i64::from(record.x_offset)),
                baseline_y: baseline_y - from_fixed(i64::from(record.y_offset)),
            });
        }
    }
    out
}

fn paint_glyph(
    params: &DrawParameters,
    surface: &mut PixelSurface,
    cache: &GlyphCache,
    layer: Layer,
    glyph: &PaintGlyph<'_>,
) {
    let format = glyph.format;
    if !layer.applies_to(format) {
        return;
    }
    let GlyphPerturbation { dx, dy, alpha } = effects::perturbation(format, glyph.index, params.elapsed);
    let opacity = f32::from(format.alpha) / 255.0 * alpha;
    if opacity <= 0.0 {
        return;
    }

    let key = GlyphKey {
        font: format.font.clone(),
        glyph_id: glyph.record.glyph_id,
        charsize: format.charsize,
        outline: layer.stroke(format),
    };
    let bitmap = match cache.get(&key) {
        Ok(bitmap) => bitmap,
        Err(err) => {
            tracing::warn!(glyph = glyph.index, glyph_id = key.glyph_id, %err, "skipping glyph");
            return;
        }
    };
    if bitmap.is_empty() {
        return;
    }

    let (ox, oy) = layer.offset(format);
    let left = (glyph.pen_x + dx + ox).round() as i64 + i64::from(bitmap.pen_left);
    let top = (glyph.baseline_y + dy + oy).round() as i64 - i64::from(bitmap.pen_top);
    let paint = layer.color(format);
    let fixed = match paint {
        Color::Rgb(rgb) => Some(rgb),
        Color::Rainbow | Color::RainbowFixed => None,
    };

    for by in 0..bitmap.height {
        for bx in 0..bitmap.width {
            let coverage = bitmap.coverage_at(bx, by);
            if coverage == 0 {
                continue;
            }
            let x = left + i64::from(bx);
            let rgb = match fixed {
                Some(rgb) => rgb,
                None => color::resolve(paint, x as f32, params.width(), params.elapsed),
            };
            let a = (f32::from(coverage) * opacity).round() as u8;
            surface.blend(x, top + i64::from(by), Rgba8::from_rgb(rgb, a));
        }
    }
}
