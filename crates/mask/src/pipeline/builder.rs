use crate::{
    pipeline::Pipeline,
    raster::DEFAULT_THRESHOLD,
    traits::{MaskPreprocessor, ContourExtractor, HoleDetector, ShapePostProcessor},
    algorithms::{
        ContainmentHoleDetector,
        CurveSmoother,
        GaussianBlurPreprocessor,
        GeometryValidator,
        LargestContourSelector,
        MarchingSquaresExtractor,
        MinimumAreaFilter,
        RdpSimplifier,
        SimplificationProcessor,
        ThresholdPreprocessor,
        DEFAULT_MIN_CONTOUR_POINTS,
    },
};

/// Builder for creating processing pipelines with a fluent API
pub struct PipelineBuilder {
    preprocessors: Vec<Box<dyn MaskPreprocessor>>,
    contour_extractor: Option<Box<dyn ContourExtractor>>,
    hole_detector: Option<Box<dyn HoleDetector>>,
    postprocessors: Vec<Box<dyn ShapePostProcessor>>,
    smoother: Option<CurveSmoother>,
    threshold: u8,
    min_contour_points: usize,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            preprocessors: Vec::new(),
            contour_extractor: None,
            hole_detector: None,
            postprocessors: Vec::new(),
            smoother: Some(CurveSmoother::default()),
            threshold: DEFAULT_THRESHOLD,
            min_contour_points: DEFAULT_MIN_CONTOUR_POINTS,
        }
    }

    /// Add a preprocessor to the pipeline
    pub fn add_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: MaskPreprocessor + 'static,
    {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Set the contour extractor (replaces any existing one)
    pub fn set_contour_extractor<E>(mut self, extractor: E) -> Self
    where
        E: ContourExtractor + 'static,
    {
        self.contour_extractor = Some(Box::new(extractor));
        self
    }

    /// Set the hole detector (replaces any existing one)
    pub fn set_hole_detector<H>(mut self, detector: H) -> Self
    where
        H: HoleDetector + 'static,
    {
        self.hole_detector = Some(Box::new(detector));
        self
    }

    /// Add a post-processor to the pipeline
    pub fn add_postprocessor<P>(mut self, postprocessor: P) -> Self
    where
        P: ShapePostProcessor + 'static,
    {
        self.postprocessors.push(Box::new(postprocessor));
        self
    }

    /// Iso-level for the default marching squares extractor
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    /// Contours shorter than this are dropped by the default extractor
    pub fn with_min_contour_points(mut self, min_points: usize) -> Self {
        self.min_contour_points = min_points;
        self
    }

    /// Soften mask edges with a gaussian before tracing
    pub fn with_feather(self, sigma: f32) -> Self {
        self.add_preprocessor(GaussianBlurPreprocessor { sigma })
    }

    /// Keep only the longest contour as the region outline
    pub fn largest_only(self) -> Self {
        self.set_hole_detector(LargestContourSelector)
    }

    /// Add Ramer-Douglas-Peucker simplification as a post-processing step
    pub fn with_simplification(self, tolerance: f64) -> Self {
        self.add_postprocessor(SimplificationProcessor { simplifier: RdpSimplifier, tolerance })
    }

    /// Drop shapes smaller than `min_area` square pixels
    pub fn with_min_area(self, min_area: f64) -> Self {
        self.add_postprocessor(MinimumAreaFilter { min_area })
    }

    /// Add geometry validation as a post-processing step
    pub fn with_validation(self) -> Self {
        self.add_postprocessor(GeometryValidator)
    }

    pub fn with_smoothing(mut self, tension: f64) -> Self {
        self.smoother = Some(CurveSmoother::new(tension));
        self
    }

    /// Emit polylines instead of curves
    pub fn without_smoothing(mut self) -> Self {
        self.smoother = None;
        self
    }

    /// Build the pipeline with default components if not specified
    pub fn build(self) -> Pipeline {
        let threshold = self.threshold;
        let min_points = self.min_contour_points;
        let contour_extractor = self
            .contour_extractor
            .unwrap_or_else(|| Box::new(MarchingSquaresExtractor { threshold, min_points }));

        let hole_detector = self.hole_detector.unwrap_or_else(|| Box::new(ContainmentHoleDetector));

        Pipeline::new(
            self.preprocessors,
            contour_extractor,
            hole_detector,
            self.postprocessors,
            self.smoother,
        )
    }

    /// Build a simple pipeline with basic threshold preprocessing
    pub fn build_simple(threshold: u8) -> Pipeline {
        Self::new()
            .add_preprocessor(ThresholdPreprocessor { threshold })
            .with_threshold(threshold)
            .build()
    }

    /// Build a pipeline with hole detection
    pub fn build_with_holes(threshold: u8) -> Pipeline {
        Self::new()
            .add_preprocessor(ThresholdPreprocessor { threshold })
            .with_threshold(threshold)
            .set_hole_detector(ContainmentHoleDetector)
            .build()
    }

    /// Build a pipeline with simplification
    pub fn build_with_simplification(threshold: u8, tolerance: f64) -> Pipeline {
        Self::new()
            .add_preprocessor(ThresholdPreprocessor { threshold })
            .with_threshold(threshold)
            .with_simplification(tolerance)
            .build()
    }

    /// Largest contour, simplified and smoothed: the outline drawn for a region
    pub fn build_region_outline(threshold: u8, tolerance: f64) -> Pipeline {
        Self::new()
            .add_preprocessor(ThresholdPreprocessor { threshold })
            .with_threshold(threshold)
            .largest_only()
            .with_simplification(tolerance)
            .with_validation()
            .build()
    }

    /// Build a comprehensive pipeline with multiple processing steps
    pub fn build_comprehensive(threshold: u8, tolerance: f64, feather_sigma: f32) -> Pipeline {
        Self::new()
            .with_feather(feather_sigma)
            .add_preprocessor(ThresholdPreprocessor { threshold })
            .with_threshold(threshold)
            .set_hole_detector(ContainmentHoleDetector)
            .with_simplification(tolerance)
            .with_min_area(MinimumAreaFilter::default().min_area)
            .with_validation()
            .build()
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
