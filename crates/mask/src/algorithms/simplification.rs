use crate::{
    error::Result,
    traits::{ShapePostProcessor, ShapeSimplifier},
    types::{distance, ComplexShape, Point},
};

/// Distance from `p` to the segment `a`-`b`; a zero-length chord degrades to
/// the point-to-point distance.
pub fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let d = b - a;
    let length_sq = d.x * d.x + d.y * d.y;
    if length_sq < 1e-12 {
        return distance(p, a);
    }
    let t = (((p.x - a.x) * d.x + (p.y - a.y) * d.y) / length_sq).clamp(0.0, 1.0);
    distance(p, a + d * t)
}

/// Ramer–Douglas–Peucker simplification of an open polyline.
///
/// Every dropped point lies within `epsilon` of the returned polyline.
/// Inputs shorter than three points come back unchanged.
pub fn simplify(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut stack = vec![(0usize, points.len() - 1)];
    while let Some((first, last)) = stack.pop() {
        if last <= first + 1 {
            continue;
        }
        let (index, max_distance) = (first + 1..last)
            .map(|i| (i, segment_distance(points[i], points[first], points[last])))
            .fold((first, -1.0), |best, candidate| if candidate.1 > best.1 { candidate } else { best });

        if max_distance > epsilon {
            keep[index] = true;
            stack.push((first, index));
            stack.push((index, last));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, kept)| kept.then_some(*p))
        .collect()
}

/// RDP on a closed ring (closing point implicit).
///
/// The ring is split at the vertex farthest from its first vertex and both
/// halves are simplified as open polylines.
pub fn simplify_closed(ring: &[Point], epsilon: f64) -> Vec<Point> {
    if ring.len() < 4 {
        return ring.to_vec();
    }
    let split = (1..ring.len())
        .max_by(|&a, &b| {
            distance(ring[0], ring[a])
                .partial_cmp(&distance(ring[0], ring[b]))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(ring.len() / 2);

    let mut first_half = simplify(&ring[..=split], epsilon);
    let mut second: Vec<Point> = ring[split..].to_vec();
    second.push(ring[0]);
    let second_half = simplify(&second, epsilon);

    first_half.pop();
    first_half.extend_from_slice(&second_half[..second_half.len() - 1]);
    first_half
}

/// Douglas-Peucker simplifier over exteriors and holes
#[derive(Debug, Clone, Default)]
pub struct RdpSimplifier;

impl ShapeSimplifier for RdpSimplifier {
    fn simplify(&self, shapes: &mut [ComplexShape], tolerance: f64) -> Result<()> {
        for shape in shapes {
            shape.exterior = simplify_closed(&shape.exterior, tolerance);
            if shape.exterior.len() < 3 {
                // Mark as invalid
                shape.exterior.clear();
                shape.holes.clear();
                continue;
            }
            for hole in &mut shape.holes {
                *hole = simplify_closed(hole, tolerance);
            }
            shape.holes.retain(|hole| hole.len() >= 3);
        }
        Ok(())
    }
}

/// Minimum area filter using geo crate's area calculation
#[derive(Debug, Clone)]
pub struct MinimumAreaFilter {
    pub min_area: f64,
}

impl Default for MinimumAreaFilter {
    fn default() -> Self {
        Self { min_area: 10.0 }
    }
}

impl ShapePostProcessor for MinimumAreaFilter {
    fn process(&self, shapes: &mut [ComplexShape]) -> Result<()> {
        for shape in shapes {
            if shape.area() < self.min_area {
                // Mark shape as invalid by clearing its points
                shape.exterior.clear();
                shape.holes.clear();
            }
        }
        Ok(())
    }
}

/// Geometry validation processor using basic checks
#[derive(Debug, Clone, Default)]
pub struct GeometryValidator;

impl ShapePostProcessor for GeometryValidator {
    fn process(&self, shapes: &mut [ComplexShape]) -> Result<()> {
        for shape in shapes {
            if shape.exterior.len() < 3 {
                shape.exterior.clear();
                shape.holes.clear();
                continue;
            }

            shape.holes.retain(|hole| hole.len() >= 3);

            let has_invalid_coords = shape
                .exterior
                .iter()
                .chain(shape.holes.iter().flatten())
                .any(|p| !p.x.is_finite() || !p.y.is_finite());

            if has_invalid_coords {
                shape.exterior.clear();
                shape.holes.clear();
            }
        }
        Ok(())
    }
}

/// Wrapper to run a [`ShapeSimplifier`] as a pipeline post-processing step
pub struct SimplificationProcessor<S: ShapeSimplifier> {
    pub simplifier: S,
    pub tolerance: f64,
}

impl<S: ShapeSimplifier> ShapePostProcessor for SimplificationProcessor<S> {
    fn process(&self, shapes: &mut [ComplexShape]) -> Result<()> {
        self.simplifier.simplify(shapes, self.tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::Coord;
    use std::f64::consts::PI;

    fn circle(n: usize, radius: f64) -> Vec<Point> {
        (0..n)
            .map(|i| {
                let a = 2.0 * PI * i as f64 / n as f64;
                Coord { x: radius * a.cos(), y: radius * a.sin() }
            })
            .collect()
    }

    fn polyline_distance(p: Point, line: &[Point]) -> f64 {
        line.windows(2)
            .map(|w| segment_distance(p, w[0], w[1]))
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn test_short_input_unchanged() {
        let pts = vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 3.0, y: 4.0 }];
        assert_eq!(simplify(&pts, 1.0), pts);
        assert!(simplify(&[], 1.0).is_empty());
    }

    #[test]
    fn test_collinear_points_collapse() {
        let pts: Vec<Point> = (0..10).map(|i| Coord { x: i as f64, y: 0.0 }).collect();
        let out = simplify(&pts, 0.1);
        assert_eq!(out, vec![pts[0], pts[9]]);
    }

    #[test]
    fn test_zero_length_chord_uses_point_distance() {
        let pts = vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 5.0, y: 0.0 },
            Coord { x: 0.0, y: 0.0 },
        ];
        let out = simplify(&pts, 1.0);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_error_bound_holds_for_removed_points() {
        let pts: Vec<Point> = (0..200)
            .map(|i| {
                let x = i as f64 * 0.5;
                Coord { x, y: (x * 0.3).sin() * 8.0 }
            })
            .collect();
        let epsilon = 0.75;
        let out = simplify(&pts, epsilon);
        assert!(out.len() < pts.len());
        for p in &pts {
            assert!(polyline_distance(*p, &out) <= epsilon + 1e-9);
        }
    }

    #[test]
    fn test_circle_reduces_points() {
        let ring = circle(100, 50.0);
        let out = simplify_closed(&ring, 1.0);
        assert!(out.len() < 50, "kept {} points", out.len());
        assert!(out.len() >= 8);
        for p in &out {
            let r = (p.x * p.x + p.y * p.y).sqrt();
            assert!((r - 50.0).abs() <= 1.0);
        }
        let mut closed = out.clone();
        closed.push(out[0]);
        for p in &ring {
            assert!(polyline_distance(*p, &closed) <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn test_simplifier_drops_collapsed_holes() {
        let mut shapes = vec![ComplexShape::new(
            circle(64, 40.0),
            vec![vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 0.1, y: 0.0 },
                Coord { x: 0.2, y: 0.0 },
                Coord { x: 0.3, y: 0.0 },
            ]],
        )];
        RdpSimplifier.simplify(&mut shapes, 1.0).unwrap();
        assert!(shapes[0].exterior.len() >= 3);
        assert!(shapes[0].holes.is_empty());
    }

    #[test]
    fn test_minimum_area_filter_clears_small_shapes() {
        let mut shapes = vec![ComplexShape::from_exterior(circle(16, 1.0))];
        MinimumAreaFilter::default().process(&mut shapes).unwrap();
        assert!(shapes[0].exterior.is_empty());
    }
}
