//! Runs, the flat glyph index over them, and line breaking.

pub mod index;
pub mod line;
pub mod line_breaker;
pub mod run;
pub mod text_layout;

pub use index::{GlyphLocation, LayoutIndex};
pub use line::{DirectionSegment, GlyphPlacement, Line};
pub use line_breaker::{BrokenLines, LayoutConstraints, Sizing, break_lines};
pub use run::{GlyphRecord, RunBuffer};
pub use text_layout::TextLayout;
