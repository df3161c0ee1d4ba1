//! Typed vector paths.
//!
//! A [`VectorPath`] is a list of segments carrying explicit coordinates, so
//! moving a path between mask space and display space is plain arithmetic on
//! each coordinate. Paths serialize to the usual path mini-language
//! (`M x y L x y C … Z`) and parse back from it.

use std::fmt;
use std::str::FromStr;

use geo_types::Coord;
use serde::{Deserialize, Serialize};

use crate::error::{MaskError, Result};
use crate::types::{bounding_box, ComplexShape, Point};

/// Sampling steps per curve segment when flattening.
pub const DEFAULT_FLATTEN_STEPS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathSegment {
    MoveTo { to: Point },
    LineTo { to: Point },
    QuadTo { ctrl: Point, to: Point },
    CubicTo { ctrl1: Point, ctrl2: Point, to: Point },
    Close,
}

impl PathSegment {
    fn map<F: Fn(Point) -> Point>(self, f: &F) -> Self {
        match self {
            Self::MoveTo { to } => Self::MoveTo { to: f(to) },
            Self::LineTo { to } => Self::LineTo { to: f(to) },
            Self::QuadTo { ctrl, to } => Self::QuadTo { ctrl: f(ctrl), to: f(to) },
            Self::CubicTo { ctrl1, ctrl2, to } => Self::CubicTo {
                ctrl1: f(ctrl1),
                ctrl2: f(ctrl2),
                to: f(to),
            },
            Self::Close => Self::Close,
        }
    }

    fn points(&self) -> Vec<Point> {
        match *self {
            Self::MoveTo { to } | Self::LineTo { to } => vec![to],
            Self::QuadTo { ctrl, to } => vec![ctrl, to],
            Self::CubicTo { ctrl1, ctrl2, to } => vec![ctrl1, ctrl2, to],
            Self::Close => vec![],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorPath {
    segments: Vec<PathSegment>,
}

impl VectorPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Closed polyline through `ring`.
    pub fn from_ring(ring: &[Point]) -> Self {
        let mut path = Self::new();
        path.push_ring(ring);
        path
    }

    /// Closed polylines for the exterior and every hole.
    pub fn from_shape(shape: &ComplexShape) -> Self {
        let mut path = Self::new();
        path.push_ring(&shape.exterior);
        for hole in &shape.holes {
            path.push_ring(hole);
        }
        path
    }

    fn push_ring(&mut self, ring: &[Point]) {
        let Some((&first, rest)) = ring.split_first() else {
            return;
        };
        self.move_to(first);
        for &p in rest {
            self.line_to(p);
        }
        self.close();
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn move_to(&mut self, to: Point) {
        self.segments.push(PathSegment::MoveTo { to });
    }

    pub fn line_to(&mut self, to: Point) {
        self.segments.push(PathSegment::LineTo { to });
    }

    pub fn quad_to(&mut self, ctrl: Point, to: Point) {
        self.segments.push(PathSegment::QuadTo { ctrl, to });
    }

    pub fn cubic_to(&mut self, ctrl1: Point, ctrl2: Point, to: Point) {
        self.segments.push(PathSegment::CubicTo { ctrl1, ctrl2, to });
    }

    pub fn close(&mut self) {
        self.segments.push(PathSegment::Close);
    }

    /// Append every segment of `other`.
    pub fn extend(&mut self, other: VectorPath) {
        self.segments.extend(other.segments);
    }

    pub fn map_points<F: Fn(Point) -> Point>(&self, f: F) -> Self {
        Self {
            segments: self.segments.iter().map(|s| s.map(&f)).collect(),
        }
    }

    pub fn scale(&self, sx: f64, sy: f64) -> Self {
        self.map_points(|p| Coord { x: p.x * sx, y: p.y * sy })
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        self.map_points(|p| Coord { x: p.x + dx, y: p.y + dy })
    }

    /// Bounds over every coordinate, control points included.
    pub fn bounding_box(&self) -> Option<(Point, Point)> {
        let points: Vec<Point> = self.segments.iter().flat_map(|s| s.points()).collect();
        bounding_box(&points)
    }

    /// Sample the path into one polygon ring per subpath.
    pub fn flatten(&self, steps: usize) -> Vec<Vec<Point>> {
        let steps = steps.max(1);
        let mut rings = Vec::new();
        let mut ring: Vec<Point> = Vec::new();
        let mut current = Coord { x: 0.0, y: 0.0 };
        let mut start = current;

        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo { to } => {
                    if ring.len() >= 3 {
                        rings.push(std::mem::take(&mut ring));
                    }
                    ring.clear();
                    ring.push(to);
                    current = to;
                    start = to;
                }
                PathSegment::LineTo { to } => {
                    ring.push(to);
                    current = to;
                }
                PathSegment::QuadTo { ctrl, to } => {
                    for i in 1..=steps {
                        let t = i as f64 / steps as f64;
                        let mt = 1.0 - t;
                        ring.push(current * (mt * mt) + ctrl * (2.0 * mt * t) + to * (t * t));
                    }
                    current = to;
                }
                PathSegment::CubicTo { ctrl1, ctrl2, to } => {
                    for i in 1..=steps {
                        let t = i as f64 / steps as f64;
                        let mt = 1.0 - t;
                        ring.push(
                            current * (mt * mt * mt)
                                + ctrl1 * (3.0 * mt * mt * t)
                                + ctrl2 * (3.0 * mt * t * t)
                                + to * (t * t * t),
                        );
                    }
                    current = to;
                }
                PathSegment::Close => {
                    if ring.last() == Some(&start) && ring.len() > 1 {
                        ring.pop();
                    }
                    if ring.len() >= 3 {
                        rings.push(std::mem::take(&mut ring));
                    }
                    ring.clear();
                    current = start;
                }
            }
        }
        if ring.len() >= 3 {
            rings.push(ring);
        }
        rings
    }

    /// Flatten into a shape: the largest ring is the exterior, the others holes.
    pub fn to_shape(&self, steps: usize) -> ComplexShape {
        let mut rings = self.flatten(steps);
        if rings.is_empty() {
            return ComplexShape::default();
        }
        let largest = (0..rings.len())
            .max_by(|&a, &b| {
                ring_area(&rings[a])
                    .partial_cmp(&ring_area(&rings[b]))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(0);
        let exterior = rings.swap_remove(largest);
        ComplexShape::new(exterior, rings)
    }

    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            if !out.is_empty() {
                out.push(' ');
            }
            match *segment {
                PathSegment::MoveTo { to } => out.push_str(&format!("M {} {}", num(to.x), num(to.y))),
                PathSegment::LineTo { to } => out.push_str(&format!("L {} {}", num(to.x), num(to.y))),
                PathSegment::QuadTo { ctrl, to } => out.push_str(&format!(
                    "Q {} {} {} {}",
                    num(ctrl.x),
                    num(ctrl.y),
                    num(to.x),
                    num(to.y)
                )),
                PathSegment::CubicTo { ctrl1, ctrl2, to } => out.push_str(&format!(
                    "C {} {} {} {} {} {}",
                    num(ctrl1.x),
                    num(ctrl1.y),
                    num(ctrl2.x),
                    num(ctrl2.y),
                    num(to.x),
                    num(to.y)
                )),
                PathSegment::Close => out.push('Z'),
            }
        }
        out
    }

    pub fn parse(input: &str) -> Result<Self> {
        PathParser::new(input).parse()
    }
}

fn ring_area(ring: &[Point]) -> f64 {
    crate::types::ring_signed_area(ring).abs()
}

/// Two decimals, trailing zeros trimmed.
fn num(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    let text = format!("{rounded:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

impl fmt::Display for VectorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_svg())
    }
}

impl FromStr for VectorPath {
    type Err = MaskError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

struct PathParser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> PathParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input: input.as_bytes(), pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> MaskError {
        MaskError::PathParse { position: self.pos, message: message.into() }
    }

    fn skip_separators(&mut self) {
        while self.pos < self.input.len()
            && (self.input[self.pos].is_ascii_whitespace() || self.input[self.pos] == b',')
        {
            self.pos += 1;
        }
    }

    fn peek_command(&mut self) -> Option<u8> {
        self.skip_separators();
        self.input.get(self.pos).copied().filter(|c| c.is_ascii_alphabetic())
    }

    fn at_number(&mut self) -> bool {
        self.skip_separators();
        matches!(self.input.get(self.pos), Some(c) if c.is_ascii_digit() || matches!(c, b'-' | b'+' | b'.'))
    }

    fn number(&mut self) -> Result<f64> {
        self.skip_separators();
        let start = self.pos;
        let bytes = self.input;
        if matches!(bytes.get(self.pos), Some(b'-' | b'+')) {
            self.pos += 1;
        }
        let mut seen_dot = false;
        let mut seen_exp = false;
        while let Some(&c) = bytes.get(self.pos) {
            match c {
                b'0'..=b'9' => self.pos += 1,
                b'.' if !seen_dot && !seen_exp => {
                    seen_dot = true;
                    self.pos += 1;
                }
                b'e' | b'E' if !seen_exp => {
                    seen_exp = true;
                    self.pos += 1;
                    if matches!(bytes.get(self.pos), Some(b'-' | b'+')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
        let text = std::str::from_utf8(&bytes[start..self.pos]).map_err(|_| self.error("invalid utf-8"))?;
        text.parse::<f64>().map_err(|_| {
            self.pos = start;
            self.error(format!("expected number, found {:?}", text))
        })
    }

    fn point(&mut self) -> Result<Point> {
        let x = self.number()?;
        let y = self.number()?;
        Ok(Coord { x, y })
    }

    fn parse(mut self) -> Result<VectorPath> {
        let mut path = VectorPath::new();
        let mut current = Coord { x: 0.0, y: 0.0 };
        let mut start = current;
        let mut command: Option<u8> = None;

        loop {
            if let Some(c) = self.peek_command() {
                self.pos += 1;
                command = Some(c);
            } else if self.pos >= self.input.len() {
                break;
            } else if !self.at_number() || command.is_none() {
                return Err(self.error("expected path command"));
            }

            let Some(cmd) = command else { break };
            let relative = cmd.is_ascii_lowercase();
            let base = if relative { current } else { Coord { x: 0.0, y: 0.0 } };

            match cmd.to_ascii_uppercase() {
                b'M' => {
                    let to = self.point()? + base;
                    path.move_to(to);
                    current = to;
                    start = to;
                    // Extra coordinate pairs after a move are implicit line-tos
                    command = Some(if relative { b'l' } else { b'L' });
                }
                b'L' => {
                    let to = self.point()? + base;
                    path.line_to(to);
                    current = to;
                }
                b'H' => {
                    let x = self.number()? + if relative { current.x } else { 0.0 };
                    current = Coord { x, y: current.y };
                    path.line_to(current);
                }
                b'V' => {
                    let y = self.number()? + if relative { current.y } else { 0.0 };
                    current = Coord { x: current.x, y };
                    path.line_to(current);
                }
                b'Q' => {
                    let ctrl = self.point()? + base;
                    let to = self.point()? + base;
                    path.quad_to(ctrl, to);
                    current = to;
                }
                b'C' => {
                    let ctrl1 = self.point()? + base;
                    let ctrl2 = self.point()? + base;
                    let to = self.point()? + base;
                    path.cubic_to(ctrl1, ctrl2, to);
                    current = to;
                }
                b'Z' => {
                    path.close();
                    current = start;
                    command = None;
                }
                other => return Err(self.error(format!("unsupported command {:?}", other as char))),
            }
        }
        Ok(path)
    }
}
