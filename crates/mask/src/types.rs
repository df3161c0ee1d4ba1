use serde::{Deserialize, Serialize};
use geo_types::{Coord, LineString, Polygon};

/// A point in mask-pixel space (or display space once transformed).
pub type Point = Coord<f64>;

/// One closed loop traced from a mask boundary. The closing point is implicit.
pub type Contour = Vec<Point>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputedOutline {
    /// Multiple separate shapes found in the mask
    pub shapes: Vec<ComplexShape>,
    /// Original mask dimensions
    pub image_width: u32,
    pub image_height: u32,
}

impl ComputedOutline {
    /// The shape with the largest area, if any.
    pub fn largest_shape(&self) -> Option<&ComplexShape> {
        self.shapes
            .iter()
            .max_by(|a, b| a.area().partial_cmp(&b.area()).unwrap_or(std::cmp::Ordering::Equal))
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexShape {
    /// The exterior boundary of the shape (outer contour)
    pub exterior: Vec<Point>,
    /// Interior boundaries (holes within the shape)
    pub holes: Vec<Vec<Point>>,
}

impl ComplexShape {
    pub fn new(exterior: Vec<Point>, holes: Vec<Vec<Point>>) -> Self {
        Self { exterior, holes }
    }

    pub fn from_exterior(exterior: Vec<Point>) -> Self {
        Self { exterior, holes: Vec::new() }
    }

    /// A shape with fewer than three exterior points covers nothing.
    pub fn is_empty(&self) -> bool {
        self.exterior.len() < 3
    }

    /// Convert to geo-types Polygon for geometric operations
    pub fn to_geo_polygon(&self) -> Polygon<f64> {
        let holes = self.holes.iter().map(|hole| LineString::new(hole.clone())).collect();
        Polygon::new(LineString::new(self.exterior.clone()), holes)
    }

    /// Calculate the area of the shape (exterior minus holes)
    pub fn area(&self) -> f64 {
        use geo::Area;
        if self.is_empty() {
            return 0.0;
        }
        self.to_geo_polygon().unsigned_area()
    }

    /// Check if this shape contains holes
    pub fn has_holes(&self) -> bool {
        !self.holes.is_empty()
    }

    /// Get the bounding box of the exterior as (min, max)
    pub fn bounding_box(&self) -> Option<(Point, Point)> {
        bounding_box(&self.exterior)
    }

    /// Get the centroid of the shape
    pub fn centroid(&self) -> Option<Point> {
        use geo::Centroid;
        self.to_geo_polygon()
            .centroid()
            .map(|c| c.0)
            .or_else(|| self.bounding_box().map(|(min, max)| (min + max) / 2.0))
    }

    /// Get the perimeter length of the shape (including holes)
    pub fn perimeter(&self) -> f64 {
        std::iter::once(&self.exterior)
            .chain(self.holes.iter())
            .map(|ring| ring_perimeter(ring))
            .sum()
    }

    /// Map every coordinate of the shape.
    pub fn map_points<F>(&self, mut f: F) -> Self
    where
        F: FnMut(Point) -> Point,
    {
        Self {
            exterior: self.exterior.iter().map(|&p| f(p)).collect(),
            holes: self
                .holes
                .iter()
                .map(|hole| hole.iter().map(|&p| f(p)).collect())
                .collect(),
        }
    }
}

/// Shoelace area; positive for counter-clockwise rings in a y-up frame.
pub fn ring_signed_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// Length of a closed ring, including the closing edge.
pub fn ring_perimeter(ring: &[Point]) -> f64 {
    if ring.len() < 2 {
        return 0.0;
    }
    (0..ring.len())
        .map(|i| distance(ring[i], ring[(i + 1) % ring.len()]))
        .sum()
}

pub fn distance(a: Point, b: Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

pub fn bounding_box(points: &[Point]) -> Option<(Point, Point)> {
    let first = *points.first()?;
    Some(points.iter().fold((first, first), |(min, max), p| {
        (
            Coord { x: min.x.min(p.x), y: min.y.min(p.y) },
            Coord { x: max.x.max(p.x), y: max.y.max(p.y) },
        )
    }))
}
