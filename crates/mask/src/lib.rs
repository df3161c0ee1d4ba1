//! # Region Mask Geometry
//!
//! Raster region masks and the vector outlines traced from them. The crate
//! covers both directions of a mask editor: painting and resolving masks as
//! bitmaps, and turning them into smooth paths that can be drawn, hit-tested
//! and edited with polygon booleans.
//!
//! ## Core Features
//!
//! - **RasterMask**: byte-per-pixel membership maps with thresholding, pixelwise ops and I/O
//! - **Contour Extraction**: marching squares with sub-pixel interpolation, or pixel border following
//! - **Simplification & Smoothing**: Ramer-Douglas-Peucker, then Catmull-Rom curves as cubic Béziers
//! - **Polygon Booleans**: fixed-point scanbeam union / difference / intersection / xor
//! - **Brush**: circular stamps, gap-free strokes and stroke-to-polygon offsetting
//! - **Ownership**: per-pixel resolution across overlapping masks, circular erosion
//! - **Pipeline System**: compose preprocessors, extractors, hole detectors and post-processors
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mask::{Pipeline, RasterMask};
//!
//! let mask = RasterMask::open("mask.png")?;
//! let pipeline = Pipeline::builder().with_simplification(2.0).build();
//!
//! let outline = pipeline.process(&mask)?;
//! let path = pipeline.to_vector_path(&outline);
//! println!("{path}");
//!
//! outline.save_geojson("output.geojson")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Brush edits
//!
//! ```rust
//! use mask::{brush, BrushMode, RasterMask, DisplayTransform};
//!
//! let mut mask = RasterMask::new(256, 256);
//! let view = DisplayTransform::fit(900.0, 600.0, 1024, 1024, 256, 256)?;
//! let center = view.display_to_mask(geo_types::Coord { x: 450.0, y: 300.0 });
//! brush::paint(&mut mask, center.x, center.y, view.brush_radius(20.0), BrushMode::Add);
//! assert!(mask.has_coverage());
//! # Ok::<(), mask::MaskError>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod raster;
pub mod traits;
pub mod algorithms;
pub mod path;
pub mod brush;
pub mod morphology;
pub mod ownership;
pub mod transform;
pub mod pipeline;
pub mod io;
pub mod command;

// Re-exports for convenience
pub use error::{MaskError, Result};
pub use types::{ComplexShape, ComputedOutline, Contour, Point};
pub use raster::{BinaryGrid, RasterMask, DEFAULT_THRESHOLD};
pub use traits::*;
pub use algorithms::*;
pub use path::{PathSegment, VectorPath};
pub use brush::{brush_radius, paint, BrushEngine, BrushMode, BrushStroke};
pub use morphology::erode;
pub use ownership::{resolve_ownership, union_all};
pub use transform::DisplayTransform;
pub use pipeline::{mask_to_path, Pipeline, builder::PipelineBuilder, DEFAULT_EPSILON};
pub use io::OutlineProperties;
pub use command::{CommandOutput, MaskCommand, MaskEditor};

/// Type aliases for common extractor configurations
pub type SimpleExtractor = StandardOutlineExtractor<
    ThresholdPreprocessor,
    MarchingSquaresExtractor,
    NoHoleDetector,
>;

pub type HoleAwareExtractor = StandardOutlineExtractor<
    ThresholdPreprocessor,
    MarchingSquaresExtractor,
    ContainmentHoleDetector,
>;

impl Default for SimpleExtractor {
    fn default() -> Self {
        Self::new(
            ThresholdPreprocessor::default(),
            MarchingSquaresExtractor::default(),
            NoHoleDetector,
        )
    }
}

impl Default for HoleAwareExtractor {
    fn default() -> Self {
        Self::new(
            ThresholdPreprocessor::default(),
            MarchingSquaresExtractor::default(),
            ContainmentHoleDetector,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_mask() -> RasterMask {
        let mut mask = RasterMask::new(100, 100);
        for y in 20..80 {
            for x in 20..80 {
                mask.set(x, y, 255);
            }
        }
        mask
    }

    fn ring_mask() -> RasterMask {
        let mut mask = create_test_mask();
        for y in 40..60 {
            for x in 40..60 {
                mask.set(x, y, 0);
            }
        }
        mask
    }

    #[test]
    fn test_pipeline_basic() {
        let pipeline = Pipeline::builder().build();
        let mask = create_test_mask();

        let result = pipeline.process(&mask).expect("Should process successfully");
        assert_eq!(result.shapes.len(), 1);
        assert_eq!(result.image_width, 100);
        assert_eq!(result.image_height, 100);
    }

    #[test]
    fn test_pipeline_with_simplification() {
        let pipeline = Pipeline::builder().with_simplification(2.0).build();
        let mask = create_test_mask();

        let result = pipeline.process(&mask).expect("Should process successfully");
        let shape = &result.shapes[0];
        assert!(shape.exterior.len() <= 8, "square kept {} points", shape.exterior.len());
        assert!((shape.area() - 3600.0).abs() < 40.0);
    }

    #[test]
    fn test_pipeline_keeps_holes_unless_largest_only() {
        let with_holes = Pipeline::builder().build().process(&ring_mask()).unwrap();
        assert_eq!(with_holes.shapes.len(), 1);
        assert_eq!(with_holes.shapes[0].holes.len(), 1);

        let largest = Pipeline::builder().largest_only().build().process(&ring_mask()).unwrap();
        assert_eq!(largest.shapes.len(), 1);
        assert!(largest.shapes[0].holes.is_empty());
    }

    #[test]
    fn test_blank_mask_gives_empty_path() {
        let mask = RasterMask::new(50, 50);
        assert!(mask_to_path(&mask, 2.0, 2.0, DEFAULT_EPSILON).is_empty());
        assert!(mask_to_path(&RasterMask::new(0, 0), 1.0, 1.0, DEFAULT_EPSILON).is_empty());
    }

    #[test]
    fn test_mask_to_path_scales_into_display_space() {
        let path = mask_to_path(&create_test_mask(), 3.0, 2.0, DEFAULT_EPSILON);
        assert!(path.to_svg().starts_with('M'));
        assert!(path.to_svg().ends_with('Z'));
        let (min, max) = path.bounding_box().unwrap();
        assert!(min.x > 30.0 && max.x < 270.0);
        assert!(min.y > 20.0 && max.y < 180.0);
    }

    #[test]
    fn test_command_editor() {
        let mut editor = MaskEditor::with_mask(create_test_mask());
        let result = editor
            .execute(MaskCommand::TraceOutline { epsilon: 1.0 })
            .expect("Should extract outline successfully");
        let CommandOutput::Outline(outline) = result else {
            panic!("expected an outline");
        };
        assert!(!outline.shapes.is_empty(), "Should find at least one shape");
    }

    #[test]
    fn test_geojson_export() {
        let pipeline = Pipeline::builder().build();
        let result = pipeline.process(&create_test_mask()).expect("Should process successfully");
        let geojson = result.to_geojson().expect("Should create GeoJSON");
        assert!(!geojson.features.is_empty());
    }

    #[test]
    fn test_custom_extractor() {
        let extractor = StandardOutlineExtractor::new(
            ThresholdPreprocessor { threshold: 100 },
            BorderFollowingExtractor::default(),
            NoHoleDetector,
        );

        let shapes = extractor.extract_outlines(&create_test_mask()).expect("Should extract outlines");
        assert!(!shapes.is_empty(), "Should find at least one shape");
        assert!(HoleAwareExtractor::default().extract_outlines(&ring_mask()).unwrap()[0].has_holes());
        assert_eq!(SimpleExtractor::default().extract_outlines(&ring_mask()).unwrap().len(), 2);
    }

    #[test]
    fn test_pipeline_info() {
        let info = Pipeline::builder().with_feather(1.0).with_validation().build().info();
        assert!(info.contains("1 preprocessors"));
        assert!(info.contains("1 postprocessors"));
        assert!(info.contains("smoothing tension 0.5"));
    }
}
