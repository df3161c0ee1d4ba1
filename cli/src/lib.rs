use mask::{
    DisplayTransform, MaskCommand, MaskError, Pipeline, PipelineBuilder, RasterMask, DEFAULT_EPSILON,
    DEFAULT_MIN_CONTOUR_POINTS, DEFAULT_TENSION, DEFAULT_THRESHOLD,
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    MaskError(#[from] MaskError),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
    #[error("Display size must be positive, got {0}x{1}")]
    InvalidDisplaySize(f64, f64),
}

/// Size of the on-screen rectangle a traced path is drawn into.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct DisplaySize {
    pub width: f64,
    pub height: f64,
}

/// How a mask is traced into an outline
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct TraceConfig {
    /// Pixels at or above this value are inside the region
    pub threshold: u8,
    /// Ramer-Douglas-Peucker tolerance in mask pixels; 0 disables simplification
    pub epsilon: f64,
    /// Catmull-Rom tension; 0 gives straight segments
    pub tension: f64,
    pub min_contour_points: usize,
    /// Shapes smaller than this many square pixels are dropped
    pub min_area: Option<f64>,
    /// Keep only the largest region
    pub largest_only: bool,
    /// Scale paths from mask pixels into this rectangle
    pub display: Option<DisplaySize>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            epsilon: DEFAULT_EPSILON,
            tension: DEFAULT_TENSION,
            min_contour_points: DEFAULT_MIN_CONTOUR_POINTS,
            min_area: None,
            largest_only: true,
            display: None,
        }
    }
}

impl TraceConfig {
    /// Load TraceConfig from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load TraceConfig from TOML string
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    /// Load TraceConfig from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load TraceConfig from JSON string
    pub fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    /// Save in the format matching the file extension
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        let path_ref = path.as_ref();
        let content = match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => self.to_toml()?,
            Some("json") => self.to_json()?,
            _ => return Err(CliError::UnsupportedFileFormat),
        };
        fs::write(path, content)?;
        Ok(())
    }

    /// Convert TraceConfig to TOML string
    pub fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    /// Convert TraceConfig to JSON string
    pub fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    pub fn pipeline(&self) -> Pipeline {
        let mut builder = PipelineBuilder::new()
            .with_threshold(self.threshold)
            .with_min_contour_points(self.min_contour_points);
        if self.largest_only {
            builder = builder.largest_only();
        }
        if self.epsilon > 0.0 {
            builder = builder.with_simplification(self.epsilon);
        }
        if let Some(min_area) = self.min_area {
            builder = builder.with_min_area(min_area);
        }
        builder = if self.tension > 0.0 {
            builder.with_smoothing(self.tension)
        } else {
            builder.without_smoothing()
        };
        builder.build()
    }

    /// Transform from mask pixels to the configured display, if any.
    pub fn transform_for(&self, mask: &RasterMask) -> Result<Option<DisplayTransform>, CliError> {
        let Some(DisplaySize { width, height }) = self.display else {
            return Ok(None);
        };
        if !(width > 0.0 && height > 0.0) {
            return Err(CliError::InvalidDisplaySize(width, height));
        }
        Ok(Some(DisplayTransform::new(width, height, mask.width(), mask.height())?))
    }
}

/// Load a command script: a JSON array of mask commands.
pub fn load_script<P: AsRef<Path>>(path: P) -> Result<Vec<MaskCommand>, CliError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mask::BrushMode;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TraceConfig::from_toml("epsilon = 0.5\nlargest_only = false\n").unwrap();
        assert_eq!(config.epsilon, 0.5);
        assert!(!config.largest_only);
        assert_eq!(config.threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.display, None);
    }

    #[test]
    fn test_toml_and_json_agree() {
        let config = TraceConfig {
            min_area: Some(12.0),
            display: Some(DisplaySize { width: 900.0, height: 600.0 }),
            ..Default::default()
        };
        assert_eq!(TraceConfig::from_toml(&config.to_toml().unwrap()).unwrap(), config);
        assert_eq!(TraceConfig::from_json(&config.to_json().unwrap()).unwrap(), config);
    }

    #[test]
    fn test_from_file_detects_format() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("trace.toml");
        let json_path = dir.path().join("trace.json");
        fs::write(&toml_path, "threshold = 64").unwrap();
        fs::write(&json_path, r#"{ "tension": 0.0 }"#).unwrap();

        assert_eq!(TraceConfig::from_file(&toml_path).unwrap().threshold, 64);
        assert_eq!(TraceConfig::from_file(&json_path).unwrap().tension, 0.0);
        assert!(matches!(
            TraceConfig::from_file(dir.path().join("trace.yaml")),
            Err(CliError::UnsupportedFileFormat)
        ));
    }

    #[test]
    fn test_pipeline_traces_a_square() {
        let mut mask = RasterMask::new(40, 40);
        for y in 10..30 {
            for x in 10..30 {
                mask.set(x, y, 255);
            }
        }
        let config = TraceConfig { tension: 0.0, ..Default::default() };
        let outline = config.pipeline().process(&mask).unwrap();
        assert_eq!(outline.shapes.len(), 1);
        assert!((outline.shapes[0].area() - 400.0).abs() < 20.0);
    }

    #[test]
    fn test_transform_requires_positive_display() {
        let mask = RasterMask::new(10, 10);
        assert!(TraceConfig::default().transform_for(&mask).unwrap().is_none());

        let config = TraceConfig { display: Some(DisplaySize { width: 0.0, height: 5.0 }), ..Default::default() };
        assert!(matches!(config.transform_for(&mask), Err(CliError::InvalidDisplaySize(..))));
    }

    #[test]
    fn test_script_parses_tagged_commands() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edit.json");
        fs::write(
            &path,
            r#"[
                { "type": "paint", "params": { "x": 5.0, "y": 5.0, "radius": 3.0, "mode": "add" } },
                { "type": "invert" }
            ]"#,
        )
        .unwrap();
        let script = load_script(&path).unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(script[0], MaskCommand::Paint { x: 5.0, y: 5.0, radius: 3.0, mode: BrushMode::Add });
        assert_eq!(script[1], MaskCommand::Invert);
    }
}
