//! Circular stamp brush for painting into a [`RasterMask`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::raster::RasterMask;
use crate::types::{distance, Point};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BrushMode {
    /// Paint the region in
    #[default]
    Add,
    /// Remove pixels from the region
    Erase,
}

impl BrushMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Add => Self::Erase,
            Self::Erase => Self::Add,
        }
    }
}

/// Mask-space radius for a brush drawn `display_diameter` pixels wide on a
/// mask shown at `display_width` x `display_height`.
///
/// The larger of the two axis ratios is used so the stamp covers at least
/// what the user sees under the cursor.
pub fn brush_radius(display_diameter: f64, mask_width: u32, mask_height: u32, display_width: f64, display_height: f64) -> f64 {
    let sx = f64::from(mask_width) / display_width;
    let sy = f64::from(mask_height) / display_height;
    display_diameter * sx.max(sy) / 2.0
}

/// Hard-edged stamp: every pixel whose center lies within `radius` of
/// `(cx, cy)` becomes 255 (add) or 0 (erase).
///
/// # Panics
///
/// Panics if `radius` is negative or not finite.
pub fn paint(mask: &mut RasterMask, cx: f64, cy: f64, radius: f64, mode: BrushMode) {
    BrushEngine::default().stamp(mask, cx, cy, radius, mode);
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrushEngine {
    /// Fraction of the radius painted at full strength; 1.0 is a hard disc.
    pub hardness: f64,
}

impl Default for BrushEngine {
    fn default() -> Self {
        Self { hardness: 1.0 }
    }
}

impl BrushEngine {
    pub fn new(hardness: f64) -> Self {
        Self { hardness: hardness.clamp(0.0, 1.0) }
    }

    /// Strength in `[0, 1]` at distance `d` from the center.
    fn falloff(&self, d: f64, radius: f64) -> f64 {
        let solid = radius * self.hardness.clamp(0.0, 1.0);
        if d <= solid {
            1.0
        } else {
            ((radius - d) / (radius - solid)).clamp(0.0, 1.0)
        }
    }

    /// # Panics
    ///
    /// Panics if `radius` is negative or not finite.
    pub fn stamp(&self, mask: &mut RasterMask, cx: f64, cy: f64, radius: f64, mode: BrushMode) {
        assert!(radius.is_finite() && radius >= 0.0, "brush radius must be finite and non-negative, got {radius}");
        if mask.is_empty() || !cx.is_finite() || !cy.is_finite() {
            return;
        }

        let x0 = ((cx - radius).floor() as i64).max(0);
        let x1 = ((cx + radius).ceil() as i64).min(i64::from(mask.width()) - 1);
        let y0 = ((cy - radius).floor() as i64).max(0);
        let y1 = ((cy + radius).ceil() as i64).min(i64::from(mask.height()) - 1);
        let r2 = radius * radius;

        for y in y0..=y1 {
            let dy = y as f64 + 0.5 - cy;
            for x in x0..=x1 {
                let dx = x as f64 + 0.5 - cx;
                let d2 = dx * dx + dy * dy;
                if d2 > r2 {
                    continue;
                }
                let value = (self.falloff(d2.sqrt(), radius) * 255.0).round() as u8;
                let current = mask.get(x, y);
                let next = match mode {
                    BrushMode::Add => current.max(value),
                    BrushMode::Erase => current.min(255 - value),
                };
                mask.set(x, y, next);
            }
        }
    }

    /// Stamp along `from`-`to` at a spacing of at most a quarter radius.
    pub fn stroke_segment(&self, mask: &mut RasterMask, from: Point, to: Point, radius: f64, mode: BrushMode) {
        let length = distance(from, to);
        let spacing = if radius > 0.0 { radius / 4.0 } else { 1.0 };
        let steps = (length / spacing).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let p = from + (to - from) * (i as f64 / steps as f64);
            self.stamp(mask, p.x, p.y, radius, mode);
        }
    }
}

/// Pointer samples of one stroke in mask space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushStroke {
    pub points: Vec<Point>,
    pub radius: f64,
    pub mode: BrushMode,
}

impl BrushStroke {
    pub fn new(radius: f64, mode: BrushMode) -> Self {
        Self { points: Vec::new(), radius, mode }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Record a sample and paint from the previous one.
    pub fn extend_to(&mut self, mask: &mut RasterMask, engine: &BrushEngine, point: Point) {
        match self.points.last() {
            Some(&last) => engine.stroke_segment(mask, last, point, self.radius, self.mode),
            None => engine.stamp(mask, point.x, point.y, self.radius, self.mode),
        }
        self.points.push(point);
    }

    /// Replay the whole stroke onto `mask`.
    pub fn apply(&self, mask: &mut RasterMask, engine: &BrushEngine) {
        match self.points.as_slice() {
            [] => {}
            [only] => engine.stamp(mask, only.x, only.y, self.radius, self.mode),
            points => {
                for pair in points.windows(2) {
                    engine.stroke_segment(mask, pair[0], pair[1], self.radius, self.mode);
                }
            }
        }
    }
}
