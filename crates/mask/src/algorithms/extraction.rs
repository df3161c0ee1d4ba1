use std::collections::{HashMap, HashSet};

use geo_types::Coord;
use tracing::{debug, warn};

use crate::{
    error::Result,
    raster::{RasterMask, DEFAULT_THRESHOLD},
    traits::ContourExtractor,
    types::{Contour, Point},
};

/// Contours with fewer points than this are treated as noise.
pub const DEFAULT_MIN_CONTOUR_POINTS: usize = 10;

/// Marching squares over the mask grid with edge interpolation.
///
/// Samples sit at pixel centers and the mask is padded with a virtual zero
/// border, so every contour closes even when a region touches the mask edge.
#[derive(Debug, Clone)]
pub struct MarchingSquaresExtractor {
    pub threshold: u8,
    pub min_points: usize,
}

impl Default for MarchingSquaresExtractor {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_points: DEFAULT_MIN_CONTOUR_POINTS,
        }
    }
}

impl MarchingSquaresExtractor {
    pub fn new(threshold: u8) -> Self {
        Self { threshold, ..Self::default() }
    }

    pub fn extract(&self, mask: &RasterMask) -> Vec<Contour> {
        let graph = CellGraph::build(mask, self.threshold);
        let contours = graph.trace(self.min_points);
        debug!(
            width = mask.width(),
            height = mask.height(),
            contours = contours.len(),
            "marching squares finished"
        );
        contours
    }
}

impl ContourExtractor for MarchingSquaresExtractor {
    fn extract_contours(&self, mask: &RasterMask) -> Result<Vec<Contour>> {
        Ok(self.extract(mask))
    }
}

/// Extract contours with the default minimum length.
pub fn extract_contours(mask: &RasterMask, threshold: u8) -> Vec<Contour> {
    MarchingSquaresExtractor::new(threshold).extract(mask)
}

/// A crossing point on one grid edge, linked to the two cells that share it.
struct EdgeNode {
    position: Point,
    links: [Option<usize>; 2],
}

struct CellGraph {
    nodes: HashMap<usize, EdgeNode>,
    order: Vec<usize>,
    max_steps: usize,
}

impl CellGraph {
    fn build(mask: &RasterMask, threshold: u8) -> Self {
        let width = mask.width() as i64;
        let height = mask.height() as i64;
        let grid_width = (width + 2) as usize;
        let level = f64::from(threshold);
        let mut graph = Self {
            nodes: HashMap::new(),
            order: Vec::new(),
            max_steps: 2 * grid_width * (height + 2) as usize,
        };
        if mask.is_blank(threshold) {
            return graph;
        }

        // Corner grid indices are offset by one for the padding border.
        let h_edge = |gx: usize, gy: usize| (gy * grid_width + gx) * 2;
        let v_edge = |gx: usize, gy: usize| (gy * grid_width + gx) * 2 + 1;
        let center = |x: i64, y: i64| Coord { x: x as f64 + 0.5, y: y as f64 + 0.5 };

        for cy in -1..height {
            for cx in -1..width {
                let tl = mask.get(cx, cy);
                let tr = mask.get(cx + 1, cy);
                let br = mask.get(cx + 1, cy + 1);
                let bl = mask.get(cx, cy + 1);
                let case = (tl >= threshold) as u8
                    | ((tr >= threshold) as u8) << 1
                    | ((br >= threshold) as u8) << 2
                    | ((bl >= threshold) as u8) << 3;
                if case == 0 || case == 15 {
                    continue;
                }

                let gx = (cx + 1) as usize;
                let gy = (cy + 1) as usize;
                let top = (h_edge(gx, gy), interpolate(center(cx, cy), tl, center(cx + 1, cy), tr, level));
                let bottom = (
                    h_edge(gx, gy + 1),
                    interpolate(center(cx, cy + 1), bl, center(cx + 1, cy + 1), br, level),
                );
                let left = (v_edge(gx, gy), interpolate(center(cx, cy), tl, center(cx, cy + 1), bl, level));
                let right = (
                    v_edge(gx + 1, gy),
                    interpolate(center(cx + 1, cy), tr, center(cx + 1, cy + 1), br, level),
                );

                let center_inside =
                    (f64::from(tl) + f64::from(tr) + f64::from(br) + f64::from(bl)) / 4.0 >= level;

                match case {
                    1 | 14 => graph.link(left, top),
                    2 | 13 => graph.link(top, right),
                    3 | 12 => graph.link(left, right),
                    4 | 11 => graph.link(right, bottom),
                    6 | 9 => graph.link(top, bottom),
                    7 | 8 => graph.link(left, bottom),
                    5 | 10 => {
                        // Saddle: the center decides which diagonal is connected.
                        let tl_br_joined = (case == 5) == center_inside;
                        if tl_br_joined {
                            graph.link(top, right);
                            graph.link(bottom, left);
                        } else {
                            graph.link(left, top);
                            graph.link(right, bottom);
                        }
                    }
                    _ => {}
                }
            }
        }
        graph
    }

    fn link(&mut self, a: (usize, Point), b: (usize, Point)) {
        self.attach(a.0, a.1, b.0);
        self.attach(b.0, b.1, a.0);
    }

    fn attach(&mut self, id: usize, position: Point, neighbour: usize) {
        let order = &mut self.order;
        let node = self.nodes.entry(id).or_insert_with(|| {
            order.push(id);
            EdgeNode { position, links: [None, None] }
        });
        if node.links[0].is_none() {
            node.links[0] = Some(neighbour);
        } else {
            node.links[1] = Some(neighbour);
        }
    }

    fn trace(&self, min_points: usize) -> Vec<Contour> {
        let mut visited = HashSet::with_capacity(self.nodes.len());
        let mut contours = Vec::new();

        for &start in &self.order {
            if visited.contains(&start) {
                continue;
            }
            if let Some(contour) = self.walk(start, &mut visited) {
                if contour.len() >= min_points {
                    contours.push(contour);
                }
            }
        }
        contours
    }

    fn walk(&self, start: usize, visited: &mut HashSet<usize>) -> Option<Contour> {
        let mut contour = Vec::new();
        let mut previous = start;
        let mut current = start;

        for _ in 0..self.max_steps {
            let node = self.nodes.get(&current)?;
            visited.insert(current);
            contour.push(node.position);

            let next = match node.links {
                [Some(a), Some(b)] => {
                    if current == start && contour.len() == 1 {
                        a
                    } else if a != previous {
                        a
                    } else {
                        b
                    }
                }
                _ => return None,
            };
            previous = current;
            current = next;
            if current == start {
                return Some(contour);
            }
        }
        warn!(start, "contour walk exceeded its step bound");
        None
    }
}

fn interpolate(p1: Point, v1: u8, p2: Point, v2: u8, level: f64) -> Point {
    if v1 == v2 {
        return (p1 + p2) / 2.0;
    }
    let t = ((level - f64::from(v1)) / (f64::from(v2) - f64::from(v1))).clamp(0.0, 1.0);
    p1 + (p2 - p1) * t
}

/// Outline tracing of pixel borders (Suzuki-Abe, via imageproc)
#[derive(Debug, Clone)]
pub struct BorderFollowingExtractor {
    pub threshold: u8,
    pub min_points: usize,
}

impl Default for BorderFollowingExtractor {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_points: DEFAULT_MIN_CONTOUR_POINTS,
        }
    }
}

impl ContourExtractor for BorderFollowingExtractor {
    fn extract_contours(&self, mask: &RasterMask) -> Result<Vec<Contour>> {
        let binary = mask.threshold(self.threshold).to_mask();
        let contours = imageproc::contours::find_contours::<i32>(&binary.to_gray_image());

        let result = contours
            .into_iter()
            .map(|contour| {
                contour
                    .points
                    .iter()
                    .map(|p| Coord { x: p.x as f64 + 0.5, y: p.y as f64 + 0.5 })
                    .collect::<Contour>()
            })
            .filter(|points| points.len() >= self.min_points)
            .collect();

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{bounding_box, ring_signed_area};

    fn square_mask(size: u32, x0: i64, y0: i64, side: i64) -> RasterMask {
        let mut mask = RasterMask::new(size, size);
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                mask.set(x, y, 255);
            }
        }
        mask
    }

    #[test]
    fn test_empty_mask_has_no_contours() {
        let mask = RasterMask::new(32, 32);
        assert!(extract_contours(&mask, DEFAULT_THRESHOLD).is_empty());
        assert!(extract_contours(&RasterMask::new(0, 0), DEFAULT_THRESHOLD).is_empty());
    }

    #[test]
    fn test_square_contour_tracks_pixel_edges() {
        let mask = square_mask(40, 10, 10, 20);
        let contours = extract_contours(&mask, DEFAULT_THRESHOLD);
        assert_eq!(contours.len(), 1);

        let (min, max) = bounding_box(&contours[0]).unwrap();
        assert!((min.x - 10.0).abs() < 0.05 && (min.y - 10.0).abs() < 0.05);
        assert!((max.x - 30.0).abs() < 0.05 && (max.y - 30.0).abs() < 0.05);

        let area = ring_signed_area(&contours[0]).abs();
        assert!((area - 400.0).abs() < 2.0, "area was {area}");
    }

    #[test]
    fn test_region_touching_border_still_closes() {
        let mask = square_mask(16, 0, 0, 16);
        let contours = extract_contours(&mask, DEFAULT_THRESHOLD);
        assert_eq!(contours.len(), 1);
        let area = ring_signed_area(&contours[0]).abs();
        assert!((area - 256.0).abs() < 2.0, "area was {area}");
    }

    #[test]
    fn test_disjoint_blobs_and_holes() {
        let mut mask = square_mask(60, 5, 5, 20);
        for y in 35..55 {
            for x in 35..55 {
                mask.set(x, y, 255);
            }
        }
        // punch a hole into the first blob
        for y in 10..20 {
            for x in 10..20 {
                mask.set(x, y, 0);
            }
        }
        let contours = extract_contours(&mask, DEFAULT_THRESHOLD);
        assert_eq!(contours.len(), 3);
    }

    #[test]
    fn test_tiny_blob_is_filtered() {
        let mask = square_mask(10, 4, 4, 1);
        assert!(extract_contours(&mask, DEFAULT_THRESHOLD).is_empty());
        let permissive = MarchingSquaresExtractor { threshold: DEFAULT_THRESHOLD, min_points: 3 };
        assert_eq!(permissive.extract(&mask).len(), 1);
    }

    #[test]
    fn test_saddle_cells_do_not_break_walks() {
        // checkerboard diagonal pair
        let mut mask = RasterMask::new(8, 8);
        mask.set(3, 3, 255);
        mask.set(4, 4, 255);
        let extractor = MarchingSquaresExtractor { threshold: DEFAULT_THRESHOLD, min_points: 3 };
        let contours = extractor.extract(&mask);
        assert_eq!(contours.len(), 2);
    }

    #[test]
    fn test_border_following_finds_outline() {
        let mask = square_mask(30, 5, 5, 12);
        let contours = BorderFollowingExtractor::default().extract_contours(&mask).unwrap();
        assert!(!contours.is_empty());
        let (min, max) = bounding_box(&contours[0]).unwrap();
        assert_eq!((min.x, min.y), (5.5, 5.5));
        assert_eq!((max.x, max.y), (16.5, 16.5));
    }
}
