use crate::{error::Result, raster::RasterMask, types::{ComplexShape, Contour}};

/// Trait for mask preprocessing algorithms
pub trait MaskPreprocessor: Send + Sync {
    /// Preprocess the input mask (e.g., feather, threshold)
    fn preprocess(&self, mask: &RasterMask) -> Result<RasterMask>;
}

/// Trait for contour extraction algorithms
pub trait ContourExtractor: Send + Sync {
    /// Extract closed contours from a mask
    fn extract_contours(&self, mask: &RasterMask) -> Result<Vec<Contour>>;
}

/// Trait for hole detection algorithms
pub trait HoleDetector: Send + Sync {
    /// Group contours into complex shapes
    fn detect_holes(&self, contours: Vec<Contour>) -> Result<Vec<ComplexShape>>;
}

/// Trait for shape simplification algorithms
pub trait ShapeSimplifier: Send + Sync {
    /// Simplify the shapes by reducing point count
    fn simplify(&self, shapes: &mut [ComplexShape], tolerance: f64) -> Result<()>;
}

/// Trait for shape post-processing algorithms
pub trait ShapePostProcessor: Send + Sync {
    /// Post-process the extracted shapes
    fn process(&self, shapes: &mut [ComplexShape]) -> Result<()>;
}

/// Main trait for outline extraction
pub trait OutlineExtractor: Send + Sync {
    /// Extract outlines from a mask
    fn extract_outlines(&self, mask: &RasterMask) -> Result<Vec<ComplexShape>>;
}
