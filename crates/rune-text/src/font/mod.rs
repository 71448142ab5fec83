pub mod face;
pub mod library;
pub mod metrics;

pub use face::{FontFace, GlyphMask};
pub use library::FontLibrary;
pub use metrics::{FontMetrics, ScaledFontMetrics};
