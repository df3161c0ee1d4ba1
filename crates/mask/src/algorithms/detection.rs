use geo_types::{LineString, Polygon};
use crate::{error::Result, traits::HoleDetector, types::{ComplexShape, Contour}};

/// Containment-based hole detector.
///
/// Contours are nested by containment: a contour directly inside an exterior
/// becomes one of its holes, a contour inside a hole starts a new shape.
#[derive(Debug, Clone, Default)]
pub struct ContainmentHoleDetector;

impl HoleDetector for ContainmentHoleDetector {
    fn detect_holes(&self, contours: Vec<Contour>) -> Result<Vec<ComplexShape>> {
        use geo::{Area, Contains};

        let mut polygons: Vec<(Polygon<f64>, Contour)> = contours
            .into_iter()
            .filter(|points| points.len() >= 3)
            .map(|points| (Polygon::new(LineString::new(points.clone()), vec![]), points))
            .collect();

        // Largest first, so every parent is placed before its children
        polygons.sort_by(|a, b| {
            b.0.unsigned_area().partial_cmp(&a.0.unsigned_area()).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut shapes: Vec<ComplexShape> = Vec::new();
        // (polygon index, nesting depth, owning shape index)
        let mut placed: Vec<(usize, usize, usize)> = Vec::new();

        for (i, (polygon, points)) in polygons.iter().enumerate() {
            // Smallest containing contour is the last one placed that contains us
            let parent = placed
                .iter()
                .rev()
                .find(|(j, _, _)| polygons[*j].0.contains(polygon))
                .copied();

            match parent {
                Some((_, depth, shape)) if depth % 2 == 0 => {
                    shapes[shape].holes.push(points.clone());
                    placed.push((i, depth + 1, shape));
                }
                Some((_, depth, _)) => {
                    shapes.push(ComplexShape::from_exterior(points.clone()));
                    placed.push((i, depth + 1, shapes.len() - 1));
                }
                None => {
                    shapes.push(ComplexShape::from_exterior(points.clone()));
                    placed.push((i, 0, shapes.len() - 1));
                }
            }
        }

        Ok(shapes)
    }
}

/// Simple hole detector that treats each contour as a separate shape
#[derive(Debug, Clone, Default)]
pub struct NoHoleDetector;

impl HoleDetector for NoHoleDetector {
    fn detect_holes(&self, contours: Vec<Contour>) -> Result<Vec<ComplexShape>> {
        Ok(contours.into_iter().map(ComplexShape::from_exterior).collect())
    }
}

/// Keeps only the contour with the most points as the region's outline.
#[derive(Debug, Clone, Default)]
pub struct LargestContourSelector;

impl HoleDetector for LargestContourSelector {
    fn detect_holes(&self, contours: Vec<Contour>) -> Result<Vec<ComplexShape>> {
        Ok(contours
            .into_iter()
            .max_by_key(|points| points.len())
            .map(ComplexShape::from_exterior)
            .into_iter()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::Coord;

    fn square(x0: f64, y0: f64, size: f64) -> Contour {
        vec![
            Coord { x: x0, y: y0 },
            Coord { x: x0 + size, y: y0 },
            Coord { x: x0 + size, y: y0 + size },
            Coord { x: x0, y: y0 + size },
        ]
    }

    #[test]
    fn test_containment_builds_holes_and_islands() {
        let contours = vec![
            square(20.0, 20.0, 10.0), // island inside the hole
            square(0.0, 0.0, 50.0),   // exterior
            square(10.0, 10.0, 30.0), // hole
            square(60.0, 0.0, 10.0),  // separate blob
        ];
        let shapes = ContainmentHoleDetector.detect_holes(contours).unwrap();
        assert_eq!(shapes.len(), 3);
        let outer = shapes.iter().find(|s| s.exterior == square(0.0, 0.0, 50.0)).unwrap();
        assert_eq!(outer.holes, vec![square(10.0, 10.0, 30.0)]);
        assert!(shapes.iter().any(|s| s.exterior == square(20.0, 20.0, 10.0) && s.holes.is_empty()));
    }

    #[test]
    fn test_largest_selector_picks_longest_contour() {
        let mut long = square(0.0, 0.0, 10.0);
        long.push(Coord { x: 0.0, y: 5.0 });
        let shapes = LargestContourSelector
            .detect_holes(vec![square(0.0, 0.0, 100.0), long.clone()])
            .unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].exterior, long);
    }

    #[test]
    fn test_no_contours_no_shapes() {
        assert!(LargestContourSelector.detect_holes(vec![]).unwrap().is_empty());
        assert!(ContainmentHoleDetector.detect_holes(vec![]).unwrap().is_empty());
    }
}
