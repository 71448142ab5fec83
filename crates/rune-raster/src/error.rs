//! Error types for glyph rendering and raster jobs.

use rune_text::TextError;
use thiserror::Error;

/// Result type for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RasterError {
    /// The glyph backend produced no usable bitmap.
    #[error("glyph {glyph_id} of font '{font}' could not be rendered: {reason}")]
    Glyph {
        font: String,
        glyph_id: u32,
        reason: String,
    },

    /// Font resolution or another text-layer failure.
    #[error(transparent)]
    Text(#[from] TextError),

    /// The draw pass observed its cancellation flag.
    #[error("raster job cancelled")]
    Cancelled,

    /// The worker thread exited without returning its surface.
    #[error("raster worker exited without a result")]
    WorkerLost,

    #[error("unknown pixel format '{0}'")]
    UnknownPixelFormat(String),
}
