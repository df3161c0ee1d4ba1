//! The segmentation model seen from the region side.
//!
//! Inference itself lives behind [`Segmenter`]; this crate only consumes what
//! it returns. Masks come back at the model's own resolution, which is
//! usually much smaller than the photo.

use image::RgbImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::region::RegionKind;

#[derive(thiserror::Error, Debug)]
pub enum SegmenterError {
    #[error("Failed to initialize segmenter: {0}")]
    Initialization(String),
    #[error("Segmenter used before init")]
    NotReady,
    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Per-pixel category IDs from a semantic segmentation model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentationResult {
    pub mask_width: u32,
    pub mask_height: u32,
    /// Row-major, one category ID per pixel
    pub category_mask: Vec<u8>,
}

impl SegmentationResult {
    pub fn is_well_formed(&self) -> bool {
        self.category_mask.len() == self.mask_width as usize * self.mask_height as usize
    }

    pub fn category_at(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.mask_width || y >= self.mask_height {
            return None;
        }
        self.category_mask.get(y as usize * self.mask_width as usize + x as usize).copied()
    }
}

/// One detected person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InstanceResult {
    /// `[x1, y1, x2, y2]` in mask pixels
    pub bbox: [f32; 4],
    pub score: f32,
    /// Full-frame alpha at the output's mask resolution
    pub mask_alpha: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentationOutput {
    Categories(SegmentationResult),
    Instances {
        mask_width: u32,
        mask_height: u32,
        instances: Vec<InstanceResult>,
    },
}

impl SegmentationOutput {
    pub fn mask_dimensions(&self) -> (u32, u32) {
        match self {
            Self::Categories(result) => (result.mask_width, result.mask_height),
            Self::Instances { mask_width, mask_height, .. } => (*mask_width, *mask_height),
        }
    }
}

/// A segmentation model with an explicit lifecycle.
///
/// Callers own the handle: `init` before the first `segment`, `dispose` when
/// done. `segment` returning `Ok(None)` means the model produced no mask.
pub trait Segmenter: Send {
    fn init(&mut self) -> Result<(), SegmenterError>;

    fn is_ready(&self) -> bool;

    fn segment(&mut self, image: &RgbImage) -> Result<Option<SegmentationOutput>, SegmenterError>;

    fn dispose(&mut self);
}

/// Category IDs that make up one region kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryConfig {
    pub kind: RegionKind,
    pub categories: Vec<u8>,
}

impl CategoryConfig {
    pub fn new(kind: RegionKind, categories: impl Into<Vec<u8>>) -> Self {
        Self { kind, categories: categories.into() }
    }

    /// People, foreground and background for the multiclass selfie model.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(RegionKind::People, [0]),
            Self::new(RegionKind::Foreground, [5]),
            Self::new(RegionKind::Background, [1, 2, 3, 4]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_lookup_past_u32_range() {
        let result = SegmentationResult {
            mask_width: 65_536,
            mask_height: 65_537,
            category_mask: vec![7],
        };
        assert_eq!(result.category_at(0, 0), Some(7));
        // row 65536 starts at 2^32
        assert_eq!(result.category_at(0, 65_536), None);
    }

    #[test]
    fn test_category_lookup() {
        let result = SegmentationResult {
            mask_width: 3,
            mask_height: 2,
            category_mask: vec![0, 1, 2, 3, 4, 5],
        };
        assert!(result.is_well_formed());
        assert_eq!(result.category_at(2, 1), Some(5));
        assert_eq!(result.category_at(3, 0), None);
    }

    #[test]
    fn test_output_is_tagged() {
        let output = SegmentationOutput::Instances { mask_width: 4, mask_height: 4, instances: vec![] };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["type"], "instances");
        assert_eq!(output.mask_dimensions(), (4, 4));
    }

    #[test]
    fn test_default_categories() {
        let defaults = CategoryConfig::defaults();
        assert_eq!(defaults.len(), 3);
        assert_eq!(defaults[2].categories, vec![1, 2, 3, 4]);
    }
}
