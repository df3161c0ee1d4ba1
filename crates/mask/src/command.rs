use geo_types::Coord;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use tracing::debug;

use crate::{
    algorithms::GaussianBlurPreprocessor,
    brush::{BrushEngine, BrushMode, BrushStroke},
    error::{MaskError, Result},
    morphology::erode,
    path::VectorPath,
    pipeline::builder::PipelineBuilder,
    raster::{RasterMask, DEFAULT_THRESHOLD},
    traits::MaskPreprocessor,
    types::ComputedOutline,
};

#[derive(
    Debug, Clone,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq
)]
#[serde(tag = "type", content = "params")]
#[strum(serialize_all = "snake_case")]
pub enum MaskCommand {
    /// Binarize the mask at a level
    #[serde(rename = "threshold")]
    Threshold {
        level: u8,
    },

    /// Soften the mask edges with a gaussian blur
    #[serde(rename = "feather")]
    Feather {
        #[schemars(range(min = 0.1, max = 50.0))]
        sigma: f32,
    },

    /// Swap inside and outside
    #[serde(rename = "invert")]
    Invert,

    /// Shrink the region with a circular element
    #[serde(rename = "erode")]
    Erode {
        #[schemars(range(min = 1, max = 256))]
        radius: u32,
    },

    /// Stamp a single brush dab in mask coordinates
    #[serde(rename = "paint")]
    Paint {
        x: f64,
        y: f64,
        #[schemars(range(min = 0.0))]
        radius: f64,
        mode: BrushMode,
    },

    /// Paint a continuous stroke through the given mask-space points
    #[serde(rename = "stroke")]
    Stroke {
        #[schemars(length(min = 1))]
        points: Vec<[f64; 2]>,
        #[schemars(range(min = 0.0))]
        radius: f64,
        mode: BrushMode,
    },

    /// Restore the mask as it was loaded
    #[serde(rename = "reset")]
    Reset,

    /// Trace the region into polygons with holes
    #[serde(rename = "trace_outline")]
    TraceOutline {
        #[schemars(range(min = 0.0, max = 20.0))]
        epsilon: f64,
    },

    /// Trace the largest region into a smooth closed path
    #[serde(rename = "trace_path")]
    TracePath {
        #[schemars(range(min = 0.0, max = 20.0))]
        epsilon: f64,
        #[schemars(range(min = 0.0, max = 2.0))]
        tension: f64,
    },
}

impl MaskCommand {
    /// Get the JSON schema for all commands
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(MaskCommand)
    }

    /// Get a list of all available command names
    pub fn command_names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Threshold { .. } => "Binarize the mask: values at or above the level become 255, the rest 0",
            Self::Feather { .. } => "Blur the mask edges with a gaussian of the given sigma",
            Self::Invert => "Invert every pixel of the mask",
            Self::Erode { .. } => "Shrink the region so only pixels whose whole disc is set survive",
            Self::Paint { .. } => "Stamp one circular brush dab in add or erase mode",
            Self::Stroke { .. } => "Paint a gap-free brush stroke through a list of points",
            Self::Reset => "Restore the mask loaded at the start of the session",
            Self::TraceOutline { .. } => "Extract simplified polygons with holes from the mask",
            Self::TracePath { .. } => "Extract the largest region as a smooth closed vector path",
        }
    }

    /// True for commands that change the mask.
    pub fn is_edit(&self) -> bool {
        !matches!(self, Self::TraceOutline { .. } | Self::TracePath { .. })
    }
}

/// Result of one command
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandOutput {
    Mask { width: u32, height: u32, coverage: usize },
    Outline(ComputedOutline),
    Path { path: VectorPath, svg: String },
}

/// A mask under edit plus the copy it was loaded as.
#[derive(Debug, Clone, Default)]
pub struct MaskEditor {
    mask: Option<RasterMask>,
    original: Option<RasterMask>,
    engine: BrushEngine,
}

impl MaskEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mask(mask: RasterMask) -> Self {
        let mut editor = Self::new();
        editor.set_mask(mask);
        editor
    }

    pub fn with_engine(mut self, engine: BrushEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Load a mask image from file
    pub fn load_mask<P: AsRef<std::path::Path>>(&mut self, path: P) -> Result<()> {
        self.set_mask(RasterMask::open(path)?);
        Ok(())
    }

    /// Load a mask image from memory
    pub fn load_mask_from_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.set_mask(RasterMask::from_bytes(bytes)?);
        Ok(())
    }

    pub fn set_mask(&mut self, mask: RasterMask) {
        self.original = Some(mask.clone());
        self.mask = Some(mask);
    }

    pub fn mask(&self) -> Option<&RasterMask> {
        self.mask.as_ref()
    }

    pub fn into_mask(self) -> Option<RasterMask> {
        self.mask
    }

    pub fn execute(&mut self, command: MaskCommand) -> Result<CommandOutput> {
        debug!(command = %command, "executing mask command");
        let engine = self.engine;
        let mask = self.mask.as_mut().ok_or(MaskError::NoMaskLoaded)?;

        match command {
            MaskCommand::Threshold { level } => mask.binarize(level),
            MaskCommand::Feather { sigma } => {
                *mask = GaussianBlurPreprocessor { sigma }.preprocess(mask)?;
            }
            MaskCommand::Invert => mask.invert(),
            MaskCommand::Erode { radius } => *mask = erode(mask, radius),
            MaskCommand::Paint { x, y, radius, mode } => {
                check_radius(radius)?;
                engine.stamp(mask, x, y, radius, mode);
            }
            MaskCommand::Stroke { points, radius, mode } => {
                check_radius(radius)?;
                let mut stroke = BrushStroke::new(radius, mode);
                stroke.points = points.iter().map(|&[x, y]| Coord { x, y }).collect();
                stroke.apply(mask, &engine);
            }
            MaskCommand::Reset => {
                if let Some(original) = &self.original {
                    *mask = original.clone();
                }
            }
            MaskCommand::TraceOutline { epsilon } => {
                let pipeline = PipelineBuilder::build_with_simplification(DEFAULT_THRESHOLD, epsilon);
                return Ok(CommandOutput::Outline(pipeline.process(mask)?));
            }
            MaskCommand::TracePath { epsilon, tension } => {
                let pipeline = PipelineBuilder::new()
                    .largest_only()
                    .with_simplification(epsilon)
                    .with_smoothing(tension)
                    .build();
                let path = pipeline.mask_to_path(mask, 1.0, 1.0)?;
                let svg = path.to_svg();
                return Ok(CommandOutput::Path { path, svg });
            }
        }

        Ok(CommandOutput::Mask {
            width: mask.width(),
            height: mask.height(),
            coverage: mask.count_above(DEFAULT_THRESHOLD),
        })
    }

    /// Run commands in order, stopping at the first error.
    pub fn run_script(&mut self, commands: impl IntoIterator<Item = MaskCommand>) -> Result<Vec<CommandOutput>> {
        commands.into_iter().map(|command| self.execute(command)).collect()
    }
}

fn check_radius(radius: f64) -> Result<()> {
    if radius.is_finite() && radius >= 0.0 {
        Ok(())
    } else {
        Err(MaskError::InvalidCommand(format!("brush radius must be finite and non-negative, got {radius}")))
    }
}
