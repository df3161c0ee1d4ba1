use geo::ConvexHull;
use geo_types::{Coord, MultiPoint};
use tracing::debug;

use super::clipping::{oriented, BooleanOp, Clipper, PolyRole};
use crate::error::Result;
use crate::types::{distance, ComplexShape, Point};

/// Vertices used to approximate a round cap.
pub const CIRCLE_SEGMENTS: usize = 16;

fn circle(center: Point, radius: f64) -> impl Iterator<Item = Point> {
    (0..CIRCLE_SEGMENTS).map(move |i| {
        let angle = std::f64::consts::TAU * i as f64 / CIRCLE_SEGMENTS as f64;
        Coord {
            x: center.x + radius * angle.cos(),
            y: center.y + radius * angle.sin(),
        }
    })
}

/// Round-capped capsule around the segment `a`-`b`.
fn capsule(a: Point, b: Point, radius: f64) -> Vec<Point> {
    let points: MultiPoint<f64> = circle(a, radius).chain(circle(b, radius)).map(geo_types::Point).collect();
    let mut ring = points.convex_hull().exterior().0.clone();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    oriented(&ring, true)
}

/// Drop samples closer than half the radius to the previously kept one.
fn decimate(centerline: &[Point], radius: f64) -> Vec<Point> {
    let min_step = radius / 2.0;
    let mut kept: Vec<Point> = Vec::with_capacity(centerline.len());
    for &p in centerline {
        match kept.last() {
            Some(&last) if distance(last, p) < min_step => {}
            _ => kept.push(p),
        }
    }
    if let (Some(&last), Some(&tail)) = (centerline.last(), kept.last()) {
        if tail != last {
            kept.push(last);
        }
    }
    kept
}

/// Fill the area swept by a round brush of radius `half_width` moving along
/// `centerline`, with round caps and joins.
///
/// An empty centerline or a non-positive width gives an empty shape. Engine
/// failures are returned.
pub fn stroke_to_polygon(centerline: &[Point], half_width: f64) -> Result<ComplexShape> {
    if centerline.is_empty() || half_width.is_nan() || half_width <= 0.0 {
        return Ok(ComplexShape::default());
    }
    let points = decimate(centerline, half_width);
    if points.len() == 1 {
        return Ok(ComplexShape::from_exterior(circle(points[0], half_width).collect()));
    }

    let mut clipper = Clipper::new();
    for pair in points.windows(2) {
        clipper.add_ring(&capsule(pair[0], pair[1], half_width), PolyRole::Subject);
    }
    let shapes = clipper.execute(BooleanOp::Union)?;
    debug!(points = points.len(), pieces = shapes.len(), "stroke offset");
    Ok(shapes
        .into_iter()
        .max_by(|a, b| a.area().partial_cmp(&b.area()).unwrap_or(std::cmp::Ordering::Equal))
        .unwrap_or_default())
}
