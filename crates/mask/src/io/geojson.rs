use std::path::Path;

use geo_types::Coord;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::{MaskError, Result},
    types::{ComplexShape, ComputedOutline, Point},
};

/// Properties attached to every exported outline feature
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[schemars(description = "Properties for mask outline features")]
pub struct OutlineProperties {
    #[schemars(description = "Index of the shape within the outline")]
    pub id: u32,
    #[schemars(description = "Area of the shape in square pixels")]
    pub area: f64,
    #[schemars(description = "Whether the shape contains holes")]
    pub has_holes: bool,
    #[schemars(description = "Number of holes in the shape")]
    pub hole_count: usize,
    #[schemars(description = "Perimeter of the shape in pixels")]
    pub perimeter: f64,
}

impl OutlineProperties {
    pub fn for_shape(id: u32, shape: &ComplexShape) -> Self {
        Self {
            id,
            area: shape.area(),
            has_holes: shape.has_holes(),
            hole_count: shape.holes.len(),
            perimeter: shape.perimeter(),
        }
    }

    fn to_json_object(&self) -> Result<JsonObject> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(MaskError::InvalidGeoJson("properties did not serialize to an object".into())),
        }
    }
}

/// GeoJSON rings repeat their first position at the end.
fn ring_positions(ring: &[Point]) -> Vec<Vec<f64>> {
    let mut positions: Vec<Vec<f64>> = ring.iter().map(|p| vec![p.x, p.y]).collect();
    if let Some(first) = positions.first().cloned() {
        positions.push(first);
    }
    positions
}

fn ring_from_positions(positions: &[Vec<f64>]) -> Result<Vec<Point>> {
    let mut ring = positions
        .iter()
        .map(|pos| match pos.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(MaskError::InvalidGeoJson(format!("position with {} values", pos.len()))),
        })
        .collect::<Result<Vec<Point>>>()?;
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    Ok(ring)
}

fn dimension(members: &JsonObject, key: &str) -> Result<u32> {
    members
        .get(key)
        .and_then(|v| v.as_u64())
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| MaskError::InvalidGeoJson(format!("missing or invalid {key}")))
}

impl ComputedOutline {
    pub fn to_geojson(&self) -> Result<FeatureCollection> {
        let mut features = Vec::with_capacity(self.shapes.len());

        for (i, shape) in self.shapes.iter().enumerate() {
            let rings = std::iter::once(&shape.exterior)
                .chain(shape.holes.iter())
                .map(|ring| ring_positions(ring))
                .collect();

            let properties = OutlineProperties::for_shape(i as u32, shape);
            features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Polygon(rings))),
                id: Some(geojson::feature::Id::Number(serde_json::Number::from(i))),
                properties: Some(properties.to_json_object()?),
                foreign_members: None,
            });
        }

        // Image metadata travels in the collection's foreign members
        let mut foreign_members = JsonObject::new();
        foreign_members.insert("image_width".to_string(), self.image_width.into());
        foreign_members.insert("image_height".to_string(), self.image_height.into());
        foreign_members.insert("shape_count".to_string(), self.shapes.len().into());

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        })
    }

    /// Export to GeoJSON and serialize to JSON string
    pub fn to_geojson_string(&self) -> Result<String> {
        let geojson = self.to_geojson()?;
        Ok(serde_json::to_string_pretty(&geojson)?)
    }

    pub fn save_geojson<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_geojson_string()?)?;
        Ok(())
    }

    pub fn from_geojson_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let geojson_str = std::fs::read_to_string(path)?;
        Self::from_geojson_string(&geojson_str)
    }

    /// Polygons become shapes (first ring exterior, the rest holes); other
    /// geometry types are skipped.
    pub fn from_geojson_string(geojson_str: &str) -> Result<Self> {
        let geojson: FeatureCollection = geojson_str.parse()?;

        let foreign_members = geojson
            .foreign_members
            .as_ref()
            .ok_or_else(|| MaskError::InvalidGeoJson("missing image metadata".into()))?;
        let image_width = dimension(foreign_members, "image_width")?;
        let image_height = dimension(foreign_members, "image_height")?;

        let mut shapes = Vec::new();
        for feature in geojson.features {
            let Some(Geometry { value: Value::Polygon(rings), .. }) = feature.geometry else {
                continue;
            };
            let Some((exterior, holes)) = rings.split_first() else {
                continue;
            };
            shapes.push(ComplexShape {
                exterior: ring_from_positions(exterior)?,
                holes: holes.iter().map(|h| ring_from_positions(h)).collect::<Result<_>>()?,
            });
        }

        Ok(ComputedOutline {
            shapes,
            image_width,
            image_height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outline() -> ComputedOutline {
        let square = |x0: f64, size: f64| {
            vec![
                Coord { x: x0, y: x0 },
                Coord { x: x0 + size, y: x0 },
                Coord { x: x0 + size, y: x0 + size },
                Coord { x: x0, y: x0 + size },
            ]
        };
        ComputedOutline {
            shapes: vec![ComplexShape::new(square(0.0, 20.0), vec![square(5.0, 10.0)])],
            image_width: 64,
            image_height: 48,
        }
    }

    #[test]
    fn test_export_carries_properties_and_metadata() {
        let collection = outline().to_geojson().unwrap();
        assert_eq!(collection.features.len(), 1);
        let props = collection.features[0].properties.as_ref().unwrap();
        assert_eq!(props["hole_count"], 1);
        assert_eq!(props["has_holes"], true);
        assert_eq!(props["area"], 300.0);
        let members = collection.foreign_members.unwrap();
        assert_eq!(members["image_width"], 64);
        assert_eq!(members["shape_count"], 1);
    }

    #[test]
    fn test_string_round_trip() {
        let original = outline();
        let text = original.to_geojson_string().unwrap();
        let back = ComputedOutline::from_geojson_string(&text).unwrap();
        assert_eq!(back.image_width, 64);
        assert_eq!(back.image_height, 48);
        assert_eq!(back.shapes, original.shapes);
    }

    #[test]
    fn test_missing_metadata_is_rejected() {
        let text = r#"{"type":"FeatureCollection","features":[]}"#;
        assert!(matches!(
            ComputedOutline::from_geojson_string(text),
            Err(MaskError::InvalidGeoJson(_))
        ));
    }
}
