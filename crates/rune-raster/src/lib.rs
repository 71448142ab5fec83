//! rune-raster: paints text layouts into CPU pixel surfaces.
//!
//! - `glyph`: rasterizer backends and the shared glyph cache
//! - `surface`: pixel buffers and straight-alpha compositing
//! - `color`, `effects`: paint-time color and per-glyph animation
//! - `draw`: the layered draw pass over a layout snapshot
//! - `scheduler`: single-slot background jobs with surface promotion

pub mod color;
pub mod draw;
pub mod effects;
pub mod error;
pub mod glyph;
pub mod scheduler;
pub mod surface;

pub use draw::{DrawParameters, draw};
pub use effects::{EFFECT_FRAME, GlyphPerturbation};
pub use error::{RasterError, Result};
pub use glyph::{BlockRasterizer, GlyphBitmap, GlyphCache, GlyphKey, GlyphRasterizer, SwashRasterizer};
pub use scheduler::RasterScheduler;
pub use surface::{PixelFormat, PixelSurface, Rgba8};
