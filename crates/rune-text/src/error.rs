//! Error types for layout and editing.

use thiserror::Error;

/// Result type for text operations.
pub type Result<T> = std::result::Result<T, TextError>;

/// Errors that can occur while shaping, laying out or editing text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TextError {
    /// A glyph cursor or index was past the end of the addressed range.
    #[error("{what}: index {index} out of bounds (len {len})")]
    OutOfBounds {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// An edit was attempted before any run buffer existed.
    #[error("no buffer was given beforehand")]
    NoBuffer,

    /// The shaping backend failed for a run.
    #[error("shaping failed for font '{font}': {reason}")]
    Shaping { font: String, reason: String },

    /// A format referenced a font the library could not resolve.
    #[error("font not found: {0}")]
    MissingFont(String),

    /// Font bytes could not be parsed.
    #[error("invalid font data: {0}")]
    InvalidFont(String),

    /// A format patch or directive could not be decoded.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Inline markup was malformed (e.g. an unterminated directive).
    #[error("markup error at byte {offset}: {reason}")]
    Markup { offset: usize, reason: String },

    /// Non-positive dimensions for a fixed-size area.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },
}

impl From<std::io::Error> for TextError {
    fn from(err: std::io::Error) -> Self {
        TextError::InvalidFont(err.to_string())
    }
}
