pub mod builder;

use tracing::{debug, warn};

use crate::{
    algorithms::CurveSmoother,
    error::Result,
    path::VectorPath,
    raster::RasterMask,
    types::ComputedOutline,
    traits::{MaskPreprocessor, ContourExtractor, HoleDetector, ShapePostProcessor},
};

/// Simplification tolerance used when turning a region mask into its outline.
pub const DEFAULT_EPSILON: f64 = 2.0;

/// A flexible pipeline for outline extraction with multiple processing stages
pub struct Pipeline {
    preprocessors: Vec<Box<dyn MaskPreprocessor>>,
    contour_extractor: Box<dyn ContourExtractor>,
    hole_detector: Box<dyn HoleDetector>,
    postprocessors: Vec<Box<dyn ShapePostProcessor>>,
    smoother: Option<CurveSmoother>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Create a new pipeline with the given components
    pub fn new(
        preprocessors: Vec<Box<dyn MaskPreprocessor>>,
        contour_extractor: Box<dyn ContourExtractor>,
        hole_detector: Box<dyn HoleDetector>,
        postprocessors: Vec<Box<dyn ShapePostProcessor>>,
        smoother: Option<CurveSmoother>,
    ) -> Self {
        Self {
            preprocessors,
            contour_extractor,
            hole_detector,
            postprocessors,
            smoother,
        }
    }

    /// Run a mask through every stage. A blank mask yields an empty outline.
    pub fn process(&self, mask: &RasterMask) -> Result<ComputedOutline> {
        let mut processed = mask.clone();
        for preprocessor in &self.preprocessors {
            processed = preprocessor.preprocess(&processed)?;
        }

        let contours = self.contour_extractor.extract_contours(&processed)?;
        let contour_count = contours.len();
        let traced_points: usize = contours.iter().map(Vec::len).sum();

        let mut shapes = self.hole_detector.detect_holes(contours)?;

        for postprocessor in &self.postprocessors {
            postprocessor.process(&mut shapes)?;
        }

        // Post-processors invalidate shapes by clearing them
        shapes.retain(|shape| !shape.exterior.is_empty());

        debug!(
            contours = contour_count,
            traced_points,
            shapes = shapes.len(),
            kept_points = shapes.iter().map(|s| s.exterior.len()).sum::<usize>(),
            "outline pipeline finished"
        );

        Ok(ComputedOutline {
            shapes,
            image_width: mask.width(),
            image_height: mask.height(),
        })
    }

    /// One closed subpath per exterior and hole, smoothed when the pipeline
    /// has a smoother.
    pub fn to_vector_path(&self, outline: &ComputedOutline) -> VectorPath {
        let mut path = VectorPath::new();
        for shape in &outline.shapes {
            for ring in std::iter::once(&shape.exterior).chain(shape.holes.iter()) {
                let subpath = match &self.smoother {
                    Some(smoother) => smoother.smooth(ring),
                    None => VectorPath::from_ring(ring),
                };
                path.extend(subpath);
            }
        }
        path
    }

    /// Trace `mask` and scale the result by `(scale_x, scale_y)`.
    pub fn mask_to_path(&self, mask: &RasterMask, scale_x: f64, scale_y: f64) -> Result<VectorPath> {
        let outline = self.process(mask)?;
        if outline.is_empty() {
            debug!(width = mask.width(), height = mask.height(), "no contour found in mask");
            return Ok(VectorPath::new());
        }
        Ok(self.to_vector_path(&outline).scale(scale_x, scale_y))
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        let smoothing = match &self.smoother {
            Some(s) => format!("smoothing tension {}", s.tension),
            None => "no smoothing".to_string(),
        };
        format!(
            "Pipeline: {} preprocessors, 1 contour extractor, 1 hole detector, {} postprocessors, {}",
            self.preprocessors.len(),
            self.postprocessors.len(),
            smoothing
        )
    }
}

/// Smooth outline of the largest region in `mask`, scaled into display units.
///
/// Never fails: a blank mask, or any pipeline error, gives an empty path.
pub fn mask_to_path(mask: &RasterMask, scale_x: f64, scale_y: f64, epsilon: f64) -> VectorPath {
    let pipeline = builder::PipelineBuilder::build_region_outline(crate::raster::DEFAULT_THRESHOLD, epsilon);
    match pipeline.mask_to_path(mask, scale_x, scale_y) {
        Ok(path) => path,
        Err(err) => {
            warn!(error = %err, "mask tracing failed");
            VectorPath::new()
        }
    }
}
