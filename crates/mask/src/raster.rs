//! Single-channel region masks.
//!
//! A [`RasterMask`] stores one byte per pixel in row-major order. Values are
//! membership strength: 0 is excluded, 255 is included and anything in between
//! is a soft edge. Binary decisions use [`DEFAULT_THRESHOLD`] unless a caller
//! asks for a different level.

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::error::{MaskError, Result};
use crate::types::{ComplexShape, Point};

/// Level at or above which a pixel counts as part of the region.
pub const DEFAULT_THRESHOLD: u8 = 128;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RasterMask {
    /// Zero-filled mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, 0)
    }

    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width as usize * height as usize],
        }
    }

    pub fn from_vec(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if data.len() != width as usize * height as usize {
            return Err(MaskError::DataLength { width, height, actual: data.len() });
        }
        Ok(Self { width, height, data })
    }

    /// Binary mask marking every pixel whose category ID is one of `categories`.
    pub fn from_categories(width: u32, height: u32, category_mask: &[u8], categories: &[u8]) -> Result<Self> {
        let data = category_mask
            .iter()
            .map(|id| if categories.contains(id) { 255 } else { 0 })
            .collect();
        Self::from_vec(width, height, data)
    }

    pub fn from_gray_image(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            data: image.as_raw().clone(),
        }
    }

    /// Decode any supported image format and take its luma channel.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)?;
        Ok(Self::from_gray_image(&image.to_luma8()))
    }

    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let image = image::open(path)?;
        Ok(Self::from_gray_image(&image.to_luma8()))
    }

    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        self.to_gray_image().save(path)?;
        Ok(())
    }

    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| Luma([self.data[self.offset(x, y)]]))
    }

    /// Rasterize a shape into a zero-filled mask of the given size.
    pub fn from_shape(width: u32, height: u32, shape: &ComplexShape) -> Self {
        let mut mask = Self::new(width, height);
        mask.fill_shape(shape, 255);
        mask
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for zero-size masks.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Row-major index of `(x, y)`, or `None` outside the mask.
    pub fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(self.offset(x as u32, y as u32))
    }

    /// Out-of-range reads return 0.
    pub fn get(&self, x: i64, y: i64) -> u8 {
        self.index(x, y).map_or(0, |i| self.data[i])
    }

    /// Out-of-range writes are ignored.
    pub fn set(&mut self, x: i64, y: i64, value: u8) {
        if let Some(i) = self.index(x, y) {
            self.data[i] = value;
        }
    }

    pub fn is_set(&self, x: i64, y: i64, level: u8) -> bool {
        self.get(x, y) >= level
    }

    /// Membership test for a point in mask space.
    pub fn contains_point(&self, point: Point, level: u8) -> bool {
        self.is_set(point.x.floor() as i64, point.y.floor() as i64, level)
    }

    pub fn threshold(&self, level: u8) -> BinaryGrid {
        BinaryGrid {
            width: self.width,
            height: self.height,
            cells: self.data.iter().map(|&v| v >= level).collect(),
        }
    }

    /// Apply a threshold in place, leaving only 0 and 255.
    pub fn binarize(&mut self, level: u8) {
        for v in &mut self.data {
            *v = if *v >= level { 255 } else { 0 };
        }
    }

    pub fn count_above(&self, level: u8) -> usize {
        self.data.iter().filter(|&&v| v >= level).count()
    }

    pub fn is_blank(&self, level: u8) -> bool {
        !self.data.iter().any(|&v| v >= level)
    }

    /// Any non-zero pixel at all, soft edges included.
    pub fn has_coverage(&self) -> bool {
        self.data.iter().any(|&v| v > 0)
    }

    /// Inclusive pixel bounds `(min_x, min_y, max_x, max_y)` of set pixels.
    pub fn bounding_box(&self, level: u8) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.data[self.offset(x, y)] < level {
                    continue;
                }
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        bounds
    }

    fn check_dimensions(&self, other: &RasterMask) -> Result<()> {
        if self.dimensions() != other.dimensions() {
            return Err(MaskError::DimensionMismatch {
                left: self.dimensions(),
                right: other.dimensions(),
            });
        }
        Ok(())
    }

    /// Pixelwise maximum.
    pub fn union_with(&mut self, other: &RasterMask) -> Result<()> {
        self.check_dimensions(other)?;
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            *a = (*a).max(b);
        }
        Ok(())
    }

    /// Remove every pixel covered by `other`, scaled by its strength.
    pub fn subtract(&mut self, other: &RasterMask) -> Result<()> {
        self.check_dimensions(other)?;
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            *a = (*a).min(255 - b);
        }
        Ok(())
    }

    pub fn invert(&mut self) {
        for v in &mut self.data {
            *v = 255 - *v;
        }
    }

    /// Fill the pixels whose centers fall inside `shape` (even-odd over the
    /// exterior and its holes).
    pub fn fill_shape(&mut self, shape: &ComplexShape, value: u8) {
        if shape.is_empty() || self.is_empty() {
            return;
        }
        let rings: Vec<&Vec<Point>> = std::iter::once(&shape.exterior)
            .chain(shape.holes.iter().filter(|h| h.len() >= 3))
            .collect();

        let min_y = rings.iter().flat_map(|r| r.iter()).map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = rings.iter().flat_map(|r| r.iter()).map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        let y_start = (min_y - 0.5).ceil().max(0.0) as i64;
        let y_end = (max_y - 0.5).floor().min(self.height as f64 - 1.0) as i64;

        let mut crossings = Vec::new();
        for y in y_start..=y_end {
            let sample_y = y as f64 + 0.5;
            crossings.clear();
            for ring in &rings {
                for i in 0..ring.len() {
                    let a = ring[i];
                    let b = ring[(i + 1) % ring.len()];
                    if (a.y <= sample_y) != (b.y <= sample_y) {
                        let t = (sample_y - a.y) / (b.y - a.y);
                        crossings.push(a.x + t * (b.x - a.x));
                    }
                }
            }
            crossings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            for pair in crossings.chunks_exact(2) {
                let x_start = (pair[0] - 0.5).ceil().max(0.0) as i64;
                let x_end = (pair[1] - 0.5).floor().min(self.width as f64 - 1.0) as i64;
                for x in x_start..=x_end {
                    self.set(x, y, value);
                }
            }
        }
    }
}

/// Result of thresholding a mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryGrid {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl BinaryGrid {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Out-of-range cells are `false`.
    pub fn get(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.cells[y as usize * self.width as usize + x as usize]
    }

    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn to_mask(&self) -> RasterMask {
        RasterMask {
            width: self.width,
            height: self.height,
            data: self.cells.iter().map(|&c| if c { 255 } else { 0 }).collect(),
        }
    }
}
