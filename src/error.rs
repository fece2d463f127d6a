//! Error types for the poster builder

use thiserror::Error;

/// Result type alias for poster operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a poster
#[derive(Error, Debug)]
pub enum Error {
    /// An alignment token was not one of the recognized variants
    #[error("Invalid alignment: {0}")]
    InvalidAlignment(String),

    /// Page geometry or an image aspect ratio violates a precondition
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A text style is missing a required field or references an unknown font
    #[error("Missing style: {0}")]
    MissingStyle(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Failed to fetch or rasterize street-map data
    #[error("Map data error: {0}")]
    MapData(String),

    /// Raster decode/encode failure
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Failed to materialize the page document or its preview
    #[error("Rendering failed: {0}")]
    Render(String),

    /// Artifact cache failure
    #[error("Cache error: {0}")]
    Cache(String),

    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
