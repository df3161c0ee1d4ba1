use thiserror::Error;

#[derive(Error, Debug)]
pub enum MaskError {
    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("No mask loaded")]
    NoMaskLoaded,

    #[error("Mask data length {actual} does not match {width}x{height}")]
    DataLength { width: u32, height: u32, actual: usize },

    #[error("Mask dimensions differ: {left:?} vs {right:?}")]
    DimensionMismatch { left: (u32, u32), right: (u32, u32) },

    #[error("Invalid display transform: {0}")]
    InvalidTransform(String),

    #[error("Path parse error at byte {position}: {message}")]
    PathParse { position: usize, message: String },

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Clipping failed: {0}")]
    ClipFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

pub type Result<T> = std::result::Result<T, MaskError>;
