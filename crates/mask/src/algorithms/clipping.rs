//! Polygon boolean operations.
//!
//! A scanbeam clipper in the spirit of Vatti's algorithm. Input rings are
//! snapped to a fixed-point grid ([`DEFAULT_SCALE`] units per pixel) and cut
//! into horizontal beams at every vertex and every edge crossing. Inside a
//! beam no two edges cross, so ordering the active edges by their x at the
//! beam midpoint and accumulating subject and clip winding numbers gives the
//! exact spans where the operation's predicate holds. Span ends are rounded
//! to the grid and the boundary of the union of those span trapezoids is
//! stitched back into rings.
//!
//! Output rings follow the crate convention: exteriors have positive
//! [`ring_signed_area`], holes negative.

use std::collections::HashMap;

use geo::{Contains, InteriorPoint};
use geo_types::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use tracing::{debug, warn};

use crate::{
    error::{MaskError, Result},
    types::{ring_signed_area, ComplexShape, Point},
};

/// Fixed-point units per pixel.
pub const DEFAULT_SCALE: f64 = 100.0;

/// Largest accepted scaled coordinate; keeps every cross product exact in i128.
const MAX_COORD: f64 = (1u64 << 40) as f64;

const X_EPSILON: f64 = 1e-9;
const Y_EPSILON: f64 = 1e-9;

/// Off-line distance, in grid units, below which a vertex counts as collinear.
const GRID_TOLERANCE: f64 = 1.0;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BooleanOp {
    Union,
    Difference,
    Intersection,
    Xor,
}

impl BooleanOp {
    fn holds(self, in_subject: bool, in_clip: bool) -> bool {
        match self {
            Self::Union => in_subject || in_clip,
            Self::Difference => in_subject && !in_clip,
            Self::Intersection => in_subject && in_clip,
            Self::Xor => in_subject != in_clip,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

impl FillRule {
    fn is_filled(self, winding: i32) -> bool {
        match self {
            Self::NonZero => winding != 0,
            Self::EvenOdd => winding % 2 != 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolyRole {
    Subject,
    Clip,
}

/// One non-horizontal input edge, stored top (smaller y) to bottom.
#[derive(Debug, Clone, Copy)]
struct Edge {
    top: (i64, i64),
    bottom: (i64, i64),
    winding: i32,
    role: PolyRole,
}

impl Edge {
    fn x_at(&self, y: f64) -> f64 {
        let (x0, y0) = (self.top.0 as f64, self.top.1 as f64);
        let (x1, y1) = (self.bottom.0 as f64, self.bottom.1 as f64);
        if y <= y0 {
            x0
        } else if y >= y1 {
            x1
        } else {
            x0 + (x1 - x0) * (y - y0) / (y1 - y0)
        }
    }

    /// y of a crossing strictly inside both edges.
    fn crossing_y(&self, other: &Edge) -> Option<f64> {
        let (ax, ay) = (i128::from(self.top.0), i128::from(self.top.1));
        let (rx, ry) = (i128::from(self.bottom.0) - ax, i128::from(self.bottom.1) - ay);
        let (cx, cy) = (i128::from(other.top.0), i128::from(other.top.1));
        let (sx, sy) = (i128::from(other.bottom.0) - cx, i128::from(other.bottom.1) - cy);

        let denom = rx * sy - ry * sx;
        if denom == 0 {
            return None;
        }
        let (qx, qy) = (cx - ax, cy - ay);
        let t_num = qx * sy - qy * sx;
        let u_num = qx * ry - qy * rx;
        let inside = |num: i128| {
            if denom > 0 {
                num > 0 && num < denom
            } else {
                num < 0 && num > denom
            }
        };
        if !inside(t_num) || !inside(u_num) {
            return None;
        }
        Some(ay as f64 + ry as f64 * (t_num as f64 / denom as f64))
    }
}

/// Directed boundary piece in scaled coordinates.
type Segment = (Point, Point);

/// Scanbeam polygon clipper.
///
/// ```ignore
/// let mut clipper = Clipper::new();
/// clipper.add_ring(&subject, PolyRole::Subject);
/// clipper.add_ring(&clip, PolyRole::Clip);
/// let shapes = clipper.execute(BooleanOp::Union)?;
/// ```
#[derive(Debug, Clone)]
pub struct Clipper {
    scale: f64,
    fill_rule: FillRule,
    edges: Vec<Edge>,
    invalid_input: bool,
}

impl Default for Clipper {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            fill_rule: FillRule::default(),
            edges: Vec::new(),
            invalid_input: false,
        }
    }
}

impl Clipper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fill_rule(mut self, fill_rule: FillRule) -> Self {
        self.fill_rule = fill_rule;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn clear(&mut self) {
        self.edges.clear();
        self.invalid_input = false;
    }

    /// Add one closed ring as given. Rings with fewer than three points are
    /// ignored.
    pub fn add_ring(&mut self, ring: &[Point], role: PolyRole) {
        if ring.len() < 3 {
            return;
        }
        let mut vertices = Vec::with_capacity(ring.len());
        for p in ring {
            let x = (p.x * self.scale).round();
            let y = (p.y * self.scale).round();
            if !x.is_finite() || !y.is_finite() || x.abs() > MAX_COORD || y.abs() > MAX_COORD {
                self.invalid_input = true;
                return;
            }
            vertices.push((x as i64, y as i64));
        }

        for i in 0..vertices.len() {
            let a = vertices[i];
            let b = vertices[(i + 1) % vertices.len()];
            if a.1 == b.1 {
                continue;
            }
            let edge = if a.1 < b.1 {
                Edge { top: a, bottom: b, winding: 1, role }
            } else {
                Edge { top: b, bottom: a, winding: -1, role }
            };
            self.edges.push(edge);
        }
    }

    /// Add a shape with its exterior counter-clockwise and its holes
    /// clockwise, so holes cancel under the non-zero rule.
    pub fn add_shape(&mut self, shape: &ComplexShape, role: PolyRole) {
        if shape.is_empty() {
            return;
        }
        self.add_ring(&oriented(&shape.exterior, true), role);
        for hole in &shape.holes {
            self.add_ring(&oriented(hole, false), role);
        }
    }

    /// Run `op` over everything added so far.
    pub fn execute(&self, op: BooleanOp) -> Result<Vec<ComplexShape>> {
        if self.invalid_input {
            return Err(MaskError::ClipFailed("non-finite or out-of-range coordinate".into()));
        }
        if self.edges.is_empty() {
            return Ok(Vec::new());
        }

        let mut edges = self.edges.clone();
        edges.sort_by_key(|e| e.top.1);
        let events = scanbeam_events(&edges);
        let segments = self.boundary_segments(&edges, &events, op);
        let rings = assemble_rings(segments)?;
        let shapes = classify_rings(rings, self.scale);
        debug!(
            op = %op,
            edges = edges.len(),
            beams = events.len().saturating_sub(1),
            shapes = shapes.len(),
            "boolean operation finished"
        );
        Ok(shapes)
    }

    fn boundary_segments(&self, edges: &[Edge], events: &[f64], op: BooleanOp) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut previous_spans: Vec<(f64, f64)> = Vec::new();
        let mut active: Vec<Edge> = Vec::new();
        let mut next_edge = 0;

        for beam in events.windows(2) {
            let (ya, yb) = (beam[0], beam[1]);
            let mid = (ya + yb) / 2.0;

            active.retain(|e| (e.bottom.1 as f64) > mid);
            while next_edge < edges.len() && (edges[next_edge].top.1 as f64) < mid {
                if (edges[next_edge].bottom.1 as f64) > mid {
                    active.push(edges[next_edge]);
                }
                next_edge += 1;
            }

            let spans = self.beam_spans(&mut active, mid, op);
            let top_spans = snapped_spans(&spans, ya);
            let bottom_spans = snapped_spans(&spans, yb);
            for (&(la, ra), &(lb, rb)) in top_spans.iter().zip(&bottom_spans) {
                segments.push((Coord { x: ra, y: ya }, Coord { x: rb, y: yb }));
                segments.push((Coord { x: lb, y: yb }, Coord { x: la, y: ya }));
            }

            horizontal_pieces(ya, &previous_spans, &top_spans, &mut segments);
            previous_spans = bottom_spans;
        }

        if let Some(&last) = events.last() {
            horizontal_pieces(last, &previous_spans, &[], &mut segments);
        }
        segments
    }

    /// Maximal spans of one beam as (left edge, right edge) pairs.
    fn beam_spans(&self, active: &mut [Edge], mid: f64, op: BooleanOp) -> Vec<(Edge, Edge)> {
        active.sort_by(|a, b| a.x_at(mid).partial_cmp(&b.x_at(mid)).unwrap_or(std::cmp::Ordering::Equal));

        let mut spans = Vec::new();
        let (mut subject, mut clip) = (0i32, 0i32);
        let mut open: Option<Edge> = None;
        let mut i = 0;
        while i < active.len() {
            let x = active[i].x_at(mid);
            let group_start = i;
            while i < active.len() && (active[i].x_at(mid) - x).abs() < X_EPSILON {
                match active[i].role {
                    PolyRole::Subject => subject += active[i].winding,
                    PolyRole::Clip => clip += active[i].winding,
                }
                i += 1;
            }
            let inside = op.holds(self.fill_rule.is_filled(subject), self.fill_rule.is_filled(clip));
            let edge = active[group_start];
            match (open, inside) {
                (None, true) => open = Some(edge),
                (Some(left), false) => {
                    spans.push((left, edge));
                    open = None;
                }
                _ => {}
            }
        }
        spans
    }
}

/// Span ends on the line `y`, rounded to whole grid units and kept disjoint
/// and ordered left to right.
///
/// Every boundary vertex then sits on the integer grid, so the same vertex
/// reached from two different edges compares equal.
fn snapped_spans(spans: &[(Edge, Edge)], y: f64) -> Vec<(f64, f64)> {
    let mut floor = f64::NEG_INFINITY;
    spans
        .iter()
        .map(|(left, right)| {
            let l = left.x_at(y).round().max(floor);
            let r = right.x_at(y).round().max(l);
            floor = r;
            (l, r)
        })
        .collect()
}

fn scanbeam_events(edges: &[Edge]) -> Vec<f64> {
    let mut events: Vec<f64> = edges
        .iter()
        .flat_map(|e| [e.top.1 as f64, e.bottom.1 as f64])
        .collect();

    // edges are sorted by top y
    for (i, a) in edges.iter().enumerate() {
        for b in &edges[i + 1..] {
            if b.top.1 >= a.bottom.1 {
                break;
            }
            let (a_min, a_max) = (a.top.0.min(a.bottom.0), a.top.0.max(a.bottom.0));
            let (b_min, b_max) = (b.top.0.min(b.bottom.0), b.top.0.max(b.bottom.0));
            if a_max < b_min || b_max < a_min {
                continue;
            }
            if let Some(y) = a.crossing_y(b) {
                events.push(y);
            }
        }
    }

    events.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    events.dedup_by(|b, a| (*b - *a).abs() < Y_EPSILON);
    events
}

/// Horizontal boundary on the line `y`: the symmetric difference of the spans
/// ending there (`below`, from the beam above the line) and the spans starting
/// there (`above`, from the beam below it).
fn horizontal_pieces(y: f64, below: &[(f64, f64)], above: &[(f64, f64)], segments: &mut Vec<Segment>) {
    if below.is_empty() && above.is_empty() {
        return;
    }
    let mut breaks: Vec<f64> = below.iter().chain(above).flat_map(|&(l, r)| [l, r]).collect();
    breaks.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    breaks.dedup();

    let covers = |spans: &[(f64, f64)], x: f64| spans.iter().any(|&(l, r)| l < x && x < r);
    for pair in breaks.windows(2) {
        let (x0, x1) = (pair[0], pair[1]);
        let sample = (x0 + x1) / 2.0;
        match (covers(below, sample), covers(above, sample)) {
            (false, true) => segments.push((Coord { x: x0, y }, Coord { x: x1, y })),
            (true, false) => segments.push((Coord { x: x1, y }, Coord { x: x0, y })),
            _ => {}
        }
    }
}

/// Grid x plus the exact scanline y. Scanline values are shared by every
/// segment on that line.
fn key(p: Point) -> (i64, u64) {
    (p.x as i64, p.y.to_bits())
}

/// Chain directed segments into closed rings by endpoint identity.
fn assemble_rings(segments: Vec<Segment>) -> Result<Vec<Vec<Point>>> {
    let mut outgoing: HashMap<(i64, u64), Vec<usize>> = HashMap::with_capacity(segments.len());
    for (i, (start, end)) in segments.iter().enumerate() {
        if key(*start) == key(*end) {
            continue;
        }
        outgoing.entry(key(*start)).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut rings = Vec::new();
    for first in 0..segments.len() {
        if used[first] || key(segments[first].0) == key(segments[first].1) {
            continue;
        }
        let origin = key(segments[first].0);
        let mut ring = Vec::new();
        let mut current = first;
        loop {
            used[current] = true;
            let (start, end) = segments[current];
            ring.push(start);
            if key(end) == origin {
                break;
            }
            let next = outgoing
                .get(&key(end))
                .and_then(|candidates| candidates.iter().copied().find(|&c| !used[c]));
            match next {
                Some(n) => current = n,
                None => return Err(MaskError::ClipFailed(format!("open boundary at ({}, {})", end.x, end.y))),
            }
        }
        let ring = clean_ring(ring);
        if ring.len() >= 3 && ring_signed_area(&ring).abs() > 1e-3 {
            rings.push(ring);
        }
    }
    Ok(rings)
}

/// Drop repeated vertices and vertices within snapping distance of the line
/// through their neighbours.
fn clean_ring(mut ring: Vec<Point>) -> Vec<Point> {
    loop {
        let n = ring.len();
        if n < 3 {
            return ring;
        }
        let keep: Vec<bool> = (0..n)
            .map(|i| {
                let prev = ring[(i + n - 1) % n];
                let cur = ring[i];
                let next = ring[(i + 1) % n];
                let (a, chord) = (cur - prev, next - prev);
                let degenerate = a.x.abs() < 1e-7 && a.y.abs() < 1e-7;
                // distance of `cur` from the chord, in grid units
                let cross = a.x * chord.y - a.y * chord.x;
                let length = chord.x.hypot(chord.y);
                !degenerate && cross.abs() > GRID_TOLERANCE * length.max(1.0)
            })
            .collect();
        if keep.iter().all(|&k| k) {
            return ring;
        }
        // Remove one vertex per run so neighbours are re-evaluated
        let mut skip_next = false;
        let mut cleaned = Vec::with_capacity(n);
        for (i, p) in ring.iter().enumerate() {
            if !keep[i] && !skip_next {
                skip_next = true;
                continue;
            }
            skip_next = false;
            cleaned.push(*p);
        }
        ring = cleaned;
    }
}

fn classify_rings(rings: Vec<Vec<Point>>, scale: f64) -> Vec<ComplexShape> {
    let (exteriors, holes): (Vec<_>, Vec<_>) = rings.into_iter().partition(|r| ring_signed_area(r) > 0.0);

    let polygons: Vec<Polygon<f64>> = exteriors
        .iter()
        .map(|r| Polygon::new(LineString::new(r.clone()), vec![]))
        .collect();
    let areas: Vec<f64> = exteriors.iter().map(|r| ring_signed_area(r)).collect();
    let mut shapes: Vec<ComplexShape> = exteriors.into_iter().map(ComplexShape::from_exterior).collect();

    for hole in holes {
        let interior = Polygon::new(LineString::new(hole.clone()), vec![])
            .interior_point()
            .map(|p| p.0)
            .unwrap_or(hole[0]);
        let owner = (0..polygons.len())
            .filter(|&i| polygons[i].contains(&geo_types::Point(interior)))
            .min_by(|&a, &b| areas[a].partial_cmp(&areas[b]).unwrap_or(std::cmp::Ordering::Equal));
        match owner {
            Some(i) => shapes[i].holes.push(hole),
            None => warn!(points = hole.len(), "hole without an enclosing ring dropped"),
        }
    }

    shapes
        .into_iter()
        .map(|shape| shape.map_points(|p| Coord { x: p.x / scale, y: p.y / scale }))
        .collect()
}

/// Copy of `ring` with positive signed area when `positive`, negative otherwise.
pub fn oriented(ring: &[Point], positive: bool) -> Vec<Point> {
    let mut ring = ring.to_vec();
    if (ring_signed_area(&ring) > 0.0) != positive {
        ring.reverse();
    }
    ring
}

fn largest(shapes: Vec<ComplexShape>) -> Option<ComplexShape> {
    shapes
        .into_iter()
        .max_by(|a, b| a.area().partial_cmp(&b.area()).unwrap_or(std::cmp::Ordering::Equal))
}

/// Combine two existing shapes, keeping the largest resulting shape.
///
/// A union that yields nothing leaves `subject` unchanged. A difference or
/// intersection may legitimately come back empty. Engine failures are
/// returned to the caller.
pub fn combine_shapes(subject: &ComplexShape, clip: &ComplexShape, op: BooleanOp) -> Result<ComplexShape> {
    let mut clipper = Clipper::new();
    clipper.add_shape(subject, PolyRole::Subject);
    clipper.add_shape(clip, PolyRole::Clip);

    Ok(match largest(clipper.execute(op)?) {
        Some(shape) => shape,
        None if op == BooleanOp::Union => {
            warn!(op = %op, "boolean operation produced no polygon, keeping subject");
            subject.clone()
        }
        None => ComplexShape::default(),
    })
}

/// Union or subtract two simple polygons.
///
/// Never fails: on an engine error `subject` is returned unchanged.
pub fn combine(subject: &[Point], clip: &[Point], op: BooleanOp) -> ComplexShape {
    let subject = ComplexShape::from_exterior(subject.to_vec());
    let clip = ComplexShape::from_exterior(clip.to_vec());
    combine_shapes(&subject, &clip, op).unwrap_or_else(|err| {
        warn!(op = %op, error = %err, "boolean operation failed, keeping subject");
        subject
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::bounding_box;

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Point> {
        vec![
            Coord { x: x0, y: y0 },
            Coord { x: x0 + size, y: y0 },
            Coord { x: x0 + size, y: y0 + size },
            Coord { x: x0, y: y0 + size },
        ]
    }

    fn total_area(shapes: &[ComplexShape]) -> f64 {
        shapes.iter().map(ComplexShape::area).sum()
    }

    #[test]
    fn test_union_of_overlapping_squares() {
        let shape = combine(&square(0.0, 0.0, 10.0), &square(5.0, 5.0, 10.0), BooleanOp::Union);
        let (min, max) = bounding_box(&shape.exterior).unwrap();
        assert_eq!((min.x, min.y, max.x, max.y), (0.0, 0.0, 15.0, 15.0));
        assert!((shape.area() - 175.0).abs() < 1e-6, "area {}", shape.area());
        assert_eq!(shape.exterior.len(), 8);
        assert!(shape.holes.is_empty());
    }

    #[test]
    fn test_difference_punches_hole() {
        let shape = combine(&square(0.0, 0.0, 20.0), &square(5.0, 5.0, 10.0), BooleanOp::Difference);
        assert_eq!(shape.holes.len(), 1);
        assert!((shape.area() - 300.0).abs() < 1e-6, "area {}", shape.area());
        assert!(ring_signed_area(&shape.exterior) > 0.0);
        assert!(ring_signed_area(&shape.holes[0]) < 0.0);
    }

    #[test]
    fn test_intersection_and_xor() {
        let mut clipper = Clipper::new();
        clipper.add_ring(&square(0.0, 0.0, 10.0), PolyRole::Subject);
        clipper.add_ring(&square(5.0, 5.0, 10.0), PolyRole::Clip);

        let intersection = clipper.execute(BooleanOp::Intersection).unwrap();
        assert_eq!(intersection.len(), 1);
        assert!((total_area(&intersection) - 25.0).abs() < 1e-6);

        let xor = clipper.execute(BooleanOp::Xor).unwrap();
        assert!((total_area(&xor) - 150.0).abs() < 1e-6);
    }

    #[test]
    fn test_orientation_of_input_does_not_matter_for_shapes() {
        let mut cw = square(0.0, 0.0, 10.0);
        cw.reverse();
        let shape = combine(&cw, &square(5.0, 5.0, 10.0), BooleanOp::Union);
        assert!((shape.area() - 175.0).abs() < 1e-6);
    }

    #[test]
    fn test_crossing_edges() {
        // diamond over a square: every boundary crossing lies off the lattice
        let diamond = vec![
            Coord { x: 5.0, y: -3.0 },
            Coord { x: 13.0, y: 5.0 },
            Coord { x: 5.0, y: 13.0 },
            Coord { x: -3.0, y: 5.0 },
        ];
        let square = square(0.0, 0.0, 10.0);
        let union = combine(&square, &diamond, BooleanOp::Union);
        let intersection = combine(&square, &diamond, BooleanOp::Intersection);
        // corners of the square stick out of the diamond by 4 triangles of area 2
        assert!((intersection.area() - 92.0).abs() < 1e-3, "area {}", intersection.area());
        assert!((union.area() - (128.0 + 100.0 - 92.0)).abs() < 1e-3, "area {}", union.area());
    }

    #[test]
    fn test_disjoint_union_keeps_largest() {
        let shape = combine(&square(0.0, 0.0, 10.0), &square(50.0, 50.0, 4.0), BooleanOp::Union);
        assert!((shape.area() - 100.0).abs() < 1e-6);

        let mut clipper = Clipper::new();
        clipper.add_ring(&square(0.0, 0.0, 10.0), PolyRole::Subject);
        clipper.add_ring(&square(50.0, 50.0, 4.0), PolyRole::Clip);
        assert_eq!(clipper.execute(BooleanOp::Union).unwrap().len(), 2);
    }

    #[test]
    fn test_degenerate_clip_keeps_subject() {
        let subject = square(0.0, 0.0, 10.0);
        let line = vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 5.0, y: 5.0 }];
        let shape = combine(&subject, &line, BooleanOp::Union);
        assert!((shape.area() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_coordinates_fall_back_to_subject() {
        let subject = square(0.0, 0.0, 10.0);
        let mut clip = square(5.0, 5.0, 10.0);
        clip[1].x = f64::NAN;
        let shape = combine(&subject, &clip, BooleanOp::Union);
        assert_eq!(shape.exterior, subject);

        let clip = ComplexShape::from_exterior(clip);
        assert!(combine_shapes(&ComplexShape::from_exterior(subject), &clip, BooleanOp::Union).is_err());
    }

    #[test]
    fn test_difference_can_erase_everything() {
        let shape = combine(&square(2.0, 2.0, 4.0), &square(0.0, 0.0, 10.0), BooleanOp::Difference);
        assert!(shape.is_empty());
    }

    #[test]
    fn test_union_with_existing_hole_shape() {
        let ring_shape = combine(&square(0.0, 0.0, 20.0), &square(5.0, 5.0, 10.0), BooleanOp::Difference);
        let patched = combine_shapes(
            &ring_shape,
            &ComplexShape::from_exterior(square(5.0, 5.0, 10.0)),
            BooleanOp::Union,
        )
        .unwrap();
        assert!(patched.holes.is_empty());
        assert!((patched.area() - 400.0).abs() < 1e-6);
    }

    #[test]
    fn test_even_odd_fills_overlap_as_outside() {
        let mut clipper = Clipper::new().with_fill_rule(FillRule::EvenOdd);
        clipper.add_ring(&square(0.0, 0.0, 10.0), PolyRole::Subject);
        clipper.add_ring(&square(5.0, 5.0, 10.0), PolyRole::Subject);
        let shapes = clipper.execute(BooleanOp::Union).unwrap();
        assert!((total_area(&shapes) - 150.0).abs() < 1e-6);
    }

    #[test]
    fn test_square_and_its_rotation_make_an_octagon() {
        // eight crossings, none of them on the grid
        let square = square(-10.0, -10.0, 20.0);
        let r = 10.0 * std::f64::consts::SQRT_2;
        let diamond = vec![
            Coord { x: r, y: 0.0 },
            Coord { x: 0.0, y: r },
            Coord { x: -r, y: 0.0 },
            Coord { x: 0.0, y: -r },
        ];
        let octagon = 8.0 * (std::f64::consts::PI / 8.0).tan() * 100.0;

        let mut clipper = Clipper::new();
        clipper.add_ring(&square, PolyRole::Subject);
        clipper.add_ring(&diamond, PolyRole::Clip);

        let intersection = clipper.execute(BooleanOp::Intersection).unwrap();
        assert_eq!(intersection.len(), 1);
        assert_eq!(intersection[0].exterior.len(), 8);
        assert!((total_area(&intersection) - octagon).abs() < 0.5, "area {}", total_area(&intersection));

        let union = clipper.execute(BooleanOp::Union).unwrap();
        assert_eq!(union.len(), 1);
        assert!((total_area(&union) - (800.0 - octagon)).abs() < 0.5);

        let xor = clipper.execute(BooleanOp::Xor).unwrap();
        assert_eq!(xor.len(), 8);
        assert!((total_area(&xor) - (800.0 - 2.0 * octagon)).abs() < 0.5);
    }
}
