use mask::MaskError;
use thiserror::Error;

use crate::region::RegionId;
use crate::segmenter::SegmenterError;
use crate::workspace::TileId;

#[derive(Error, Debug)]
pub enum RegionError {
    #[error(transparent)]
    Mask(#[from] MaskError),

    #[error(transparent)]
    Segmenter(#[from] SegmenterError),

    #[error("Region not found: {0}")]
    RegionNotFound(RegionId),

    #[error("Tile not found: {0}")]
    TileNotFound(TileId),

    #[error("A stroke is already in progress on region {0}")]
    StrokeInProgress(RegionId),

    #[error("No stroke in progress")]
    NoStroke,
}

pub type Result<T> = std::result::Result<T, RegionError>;
