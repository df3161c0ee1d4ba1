pub mod preprocessing;
pub mod extraction;
pub mod detection;
pub mod simplification;
pub mod smoothing;
pub mod clipping;
pub mod offset;

pub use preprocessing::*;
pub use extraction::*;
pub use detection::*;
pub use simplification::*;
pub use smoothing::*;
pub use clipping::{combine, combine_shapes, BooleanOp, Clipper, FillRule, PolyRole};
pub use offset::stroke_to_polygon;

use crate::{
    error::Result,
    raster::RasterMask,
    types::ComplexShape,
    traits::{MaskPreprocessor, ContourExtractor, HoleDetector, OutlineExtractor},
};

/// Statically composed preprocess → trace → group extractor
#[derive(Debug)]
pub struct StandardOutlineExtractor<P, C, H>
where
    P: MaskPreprocessor,
    C: ContourExtractor,
    H: HoleDetector,
{
    pub preprocessor: P,
    pub contour_extractor: C,
    pub hole_detector: H,
}

impl<P, C, H> StandardOutlineExtractor<P, C, H>
where
    P: MaskPreprocessor,
    C: ContourExtractor,
    H: HoleDetector,
{
    pub fn new(preprocessor: P, contour_extractor: C, hole_detector: H) -> Self {
        Self {
            preprocessor,
            contour_extractor,
            hole_detector,
        }
    }
}

impl<P, C, H> OutlineExtractor for StandardOutlineExtractor<P, C, H>
where
    P: MaskPreprocessor,
    C: ContourExtractor,
    H: HoleDetector,
{
    fn extract_outlines(&self, mask: &RasterMask) -> Result<Vec<ComplexShape>> {
        let binary = self.preprocessor.preprocess(mask)?;
        let contours = self.contour_extractor.extract_contours(&binary)?;
        self.hole_detector.detect_holes(contours)
    }
}
