//! rune-area: rich-text areas with editing, undo and background
//! rasterization.
//!
//! A [`Context`] owns the shaping and glyph backends, an arena of
//! [`Area`]s addressed by [`AreaId`], input focus and the undo history.
//! Hosts drive it by calling [`Context::update_all`] once per frame and
//! reading [`Area::pixels`] when [`Area::pixels_were_changed`] reports a
//! new frame.

pub mod area;
pub mod context;
pub mod error;
pub mod typewriter;

pub use area::{Area, AreaId, AreaSettings};
pub use context::Context;
pub use error::{AreaError, Result};
pub use typewriter::{PrintMode, Typewriter, TypewriterSettings};

pub use rune_config::AreaConfig;
pub use rune_raster::{PixelFormat, PixelSurface, Rgba8};
pub use rune_text::{Format, FormatPatch, Movement, TextPart};
