//! Mapping between mask pixels and the on-screen image rectangle.

use geo_types::Coord;
use serde::{Deserialize, Serialize};

use crate::brush;
use crate::error::{MaskError, Result};
use crate::path::VectorPath;
use crate::types::{ComplexShape, Point};

/// Where a mask is drawn on screen.
///
/// Mask and display resolutions are independent: a 256x256 model mask can be
/// shown over a 1200x800 photo letterboxed into a 900x600 viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayTransform {
    pub offset_x: f64,
    pub offset_y: f64,
    pub display_width: f64,
    pub display_height: f64,
    pub mask_width: u32,
    pub mask_height: u32,
}

impl DisplayTransform {
    pub fn new(display_width: f64, display_height: f64, mask_width: u32, mask_height: u32) -> Result<Self> {
        Self::with_offset(0.0, 0.0, display_width, display_height, mask_width, mask_height)
    }

    pub fn with_offset(
        offset_x: f64,
        offset_y: f64,
        display_width: f64,
        display_height: f64,
        mask_width: u32,
        mask_height: u32,
    ) -> Result<Self> {
        if !(display_width > 0.0 && display_height > 0.0) {
            return Err(MaskError::InvalidTransform(format!(
                "display size must be positive, got {display_width}x{display_height}"
            )));
        }
        if mask_width == 0 || mask_height == 0 {
            return Err(MaskError::InvalidTransform(format!(
                "mask size must be positive, got {mask_width}x{mask_height}"
            )));
        }
        if !offset_x.is_finite() || !offset_y.is_finite() {
            return Err(MaskError::InvalidTransform("offset must be finite".into()));
        }
        Ok(Self {
            offset_x,
            offset_y,
            display_width,
            display_height,
            mask_width,
            mask_height,
        })
    }

    /// Fit an `image_width` x `image_height` picture inside the container,
    /// preserving aspect ratio and centering it.
    pub fn fit(
        container_width: f64,
        container_height: f64,
        image_width: u32,
        image_height: u32,
        mask_width: u32,
        mask_height: u32,
    ) -> Result<Self> {
        if !(container_width > 0.0 && container_height > 0.0) || image_width == 0 || image_height == 0 {
            return Err(MaskError::InvalidTransform(format!(
                "cannot fit {image_width}x{image_height} into {container_width}x{container_height}"
            )));
        }
        let (iw, ih) = (f64::from(image_width), f64::from(image_height));
        let scale = (container_width / iw).min(container_height / ih);
        let (dw, dh) = (iw * scale, ih * scale);
        Self::with_offset(
            (container_width - dw) / 2.0,
            (container_height - dh) / 2.0,
            dw,
            dh,
            mask_width,
            mask_height,
        )
    }

    pub fn scale_x(&self) -> f64 {
        self.display_width / f64::from(self.mask_width)
    }

    pub fn scale_y(&self) -> f64 {
        self.display_height / f64::from(self.mask_height)
    }

    pub fn display_to_mask(&self, point: Point) -> Point {
        Coord {
            x: (point.x - self.offset_x) / self.scale_x(),
            y: (point.y - self.offset_y) / self.scale_y(),
        }
    }

    pub fn mask_to_display(&self, point: Point) -> Point {
        Coord {
            x: point.x * self.scale_x() + self.offset_x,
            y: point.y * self.scale_y() + self.offset_y,
        }
    }

    /// Whether a display-space point falls on the drawn image.
    pub fn contains_display_point(&self, point: Point) -> bool {
        point.x >= self.offset_x
            && point.y >= self.offset_y
            && point.x < self.offset_x + self.display_width
            && point.y < self.offset_y + self.display_height
    }

    /// Mask-space radius of a brush `display_diameter` screen pixels wide.
    pub fn brush_radius(&self, display_diameter: f64) -> f64 {
        brush::brush_radius(
            display_diameter,
            self.mask_width,
            self.mask_height,
            self.display_width,
            self.display_height,
        )
    }

    pub fn path_to_display(&self, path: &VectorPath) -> VectorPath {
        path.scale(self.scale_x(), self.scale_y()).translate(self.offset_x, self.offset_y)
    }

    pub fn path_to_mask(&self, path: &VectorPath) -> VectorPath {
        path.translate(-self.offset_x, -self.offset_y)
            .scale(1.0 / self.scale_x(), 1.0 / self.scale_y())
    }

    pub fn shape_to_display(&self, shape: &ComplexShape) -> ComplexShape {
        shape.map_points(|p| self.mask_to_display(p))
    }

    pub fn shape_to_mask(&self, shape: &ComplexShape) -> ComplexShape {
        shape.map_points(|p| self.display_to_mask(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_letterboxes_and_centers() {
        let t = DisplayTransform::fit(900.0, 600.0, 1200, 1200, 256, 256).unwrap();
        assert_eq!((t.display_width, t.display_height), (600.0, 600.0));
        assert_eq!((t.offset_x, t.offset_y), (150.0, 0.0));
    }

    #[test]
    fn test_axes_scale_independently() {
        let t = DisplayTransform::new(800.0, 400.0, 200, 200).unwrap();
        assert_eq!(t.scale_x(), 4.0);
        assert_eq!(t.scale_y(), 2.0);
        let p = t.display_to_mask(Coord { x: 400.0, y: 100.0 });
        assert_eq!(p, Coord { x: 100.0, y: 50.0 });
        assert_eq!(t.mask_to_display(p), Coord { x: 400.0, y: 100.0 });
    }

    #[test]
    fn test_round_trip_with_offset() {
        let t = DisplayTransform::fit(1000.0, 500.0, 640, 480, 320, 240).unwrap();
        let p = Coord { x: 121.5, y: 77.25 };
        let back = t.display_to_mask(t.mask_to_display(p));
        assert!((back.x - p.x).abs() < 1e-9 && (back.y - p.y).abs() < 1e-9);
        assert!(t.contains_display_point(t.mask_to_display(p)));
        assert!(!t.contains_display_point(Coord { x: 1.0, y: 1.0 }));
    }

    #[test]
    fn test_non_positive_sizes_are_rejected() {
        assert!(DisplayTransform::new(0.0, 100.0, 10, 10).is_err());
        assert!(DisplayTransform::new(100.0, f64::NAN, 10, 10).is_err());
        assert!(DisplayTransform::new(100.0, 100.0, 0, 10).is_err());
        assert!(DisplayTransform::fit(100.0, 100.0, 0, 10, 10, 10).is_err());
    }

    #[test]
    fn test_path_moves_into_display_space() {
        let t = DisplayTransform::with_offset(10.0, 20.0, 200.0, 100.0, 100, 100).unwrap();
        let path = VectorPath::from_ring(&[
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 50.0, y: 0.0 },
            Coord { x: 50.0, y: 50.0 },
        ]);
        let shown = t.path_to_display(&path);
        assert_eq!(shown.to_svg(), "M 10 20 L 110 20 L 110 70 Z");
        assert_eq!(t.path_to_mask(&shown), path);
    }
}
