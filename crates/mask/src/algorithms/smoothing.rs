use crate::{path::VectorPath, types::Point};

/// Default Catmull-Rom tension.
pub const DEFAULT_TENSION: f64 = 0.5;

/// Catmull-Rom to cubic Bézier conversion for traced outlines.
#[derive(Debug, Clone, Copy)]
pub struct CurveSmoother {
    pub tension: f64,
}

impl Default for CurveSmoother {
    fn default() -> Self {
        Self { tension: DEFAULT_TENSION }
    }
}

impl CurveSmoother {
    pub fn new(tension: f64) -> Self {
        Self { tension }
    }

    /// Closed smooth path through every point of `ring`.
    pub fn smooth(&self, ring: &[Point]) -> VectorPath {
        smooth(ring, self.tension)
    }

    pub fn smooth_open(&self, points: &[Point]) -> VectorPath {
        smooth_open(points, self.tension)
    }
}

/// Closed Catmull-Rom spline through `points`, one cubic per input point.
///
/// Neighbours wrap around the ring. Two points produce a straight segment,
/// fewer produce an empty path.
pub fn smooth(points: &[Point], tension: f64) -> VectorPath {
    let mut path = VectorPath::new();
    match points.len() {
        0 | 1 => return path,
        2 => {
            path.move_to(points[0]);
            path.line_to(points[1]);
            path.close();
            return path;
        }
        _ => {}
    }

    let n = points.len();
    path.move_to(points[0]);
    for i in 0..n {
        let p0 = points[(i + n - 1) % n];
        let p1 = points[i];
        let p2 = points[(i + 1) % n];
        let p3 = points[(i + 2) % n];
        let (c1, c2) = control_points(p0, p1, p2, p3, tension);
        path.cubic_to(c1, c2, p2);
    }
    path.close();
    path
}

/// Open Catmull-Rom spline; the end points stand in for their missing
/// neighbours.
pub fn smooth_open(points: &[Point], tension: f64) -> VectorPath {
    let mut path = VectorPath::new();
    let Some(&first) = points.first() else {
        return path;
    };
    path.move_to(first);
    if points.len() == 2 {
        path.line_to(points[1]);
        return path;
    }

    let last = points.len() - 1;
    for i in 0..last {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(last)];
        let (c1, c2) = control_points(p0, p1, p2, p3, tension);
        path.cubic_to(c1, c2, p2);
    }
    path
}

fn control_points(p0: Point, p1: Point, p2: Point, p3: Point, tension: f64) -> (Point, Point) {
    let c1 = p1 + (p2 - p0) * (tension / 6.0);
    let c2 = p2 - (p3 - p1) * (tension / 6.0);
    (c1, c2)
}
