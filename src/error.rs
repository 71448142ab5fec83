//! Error type of the host API.

use rune_config::ConfigError;
use rune_raster::RasterError;
use rune_text::TextError;
use thiserror::Error;

use crate::area::AreaId;

pub type Result<T> = std::result::Result<T, AreaError>;

#[derive(Error, Debug)]
pub enum AreaError {
    #[error(transparent)]
    Text(#[from] TextError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The id names an area that was destroyed or never created.
    #[error("area {0} does not exist")]
    NotFound(AreaId),

    /// A focused-area operation was issued while no area had focus.
    #[error("no area has focus")]
    NoFocus,
}
