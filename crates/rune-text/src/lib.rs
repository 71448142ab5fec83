//! rune-text: rich-text runs, shaping, line breaking and editing.
//!
//! - `format`: the per-run format model, JSON patches and inline markup
//! - `shaping`: the shaper interface with harfrust and font-less backends
//! - `font`: font resolution through fontdb and swash-backed faces
//! - `layout`: run buffers, the flat glyph index and the line breaker
//! - `edit`: cursor, selection, editing operations and undo history

pub mod bidi;
pub mod edit;
pub mod error;
pub mod font;
pub mod format;
pub mod layout;
pub mod shaping;

pub use edit::{
    Command, CommandKind, CursorBlink, CursorRect, CursorState, EditRecord, Editor, History, Movement, Snapshot,
};
pub use error::{Result, TextError};
pub use font::{FontFace, FontLibrary, FontMetrics, GlyphMask, ScaledFontMetrics};
pub use format::{
    Alignment, Color, Direction, Effect, Format, FormatPatch, Rgb, TextPart, normalize_parts, parse_markup,
    plain_text, unparse_markup,
};
pub use layout::{
    GlyphPlacement, GlyphRecord, LayoutConstraints, LayoutIndex, Line, RunBuffer, Sizing, TextLayout,
};
pub use shaping::{HarfrustShaper, SegmentProperties, ShapedGlyph, Shaper, SimpleShaper};
