//! Region types for a segmented image.

use std::fmt;

use mask::{Point, RasterMask, VectorPath, DEFAULT_THRESHOLD};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

/// Unique region ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(Uuid);

impl RegionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RegionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What a region covers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RegionKind {
    /// One detected person instance
    Person,
    /// Union of all person instances
    PeopleGroup,
    /// Category-mask people region
    People,
    Background,
    Foreground,
    Hair,
    BodySkin,
    FaceSkin,
    Clothes,
    /// Painted by hand
    Manual,
}

impl RegionKind {
    /// Default display label
    pub fn label(self) -> &'static str {
        match self {
            Self::Person => "Person",
            Self::PeopleGroup | Self::People => "People",
            Self::Background => "Background",
            Self::Foreground => "Foreground",
            Self::Hair => "Hair",
            Self::BodySkin => "Body Skin",
            Self::FaceSkin => "Face Skin",
            Self::Clothes => "Clothes",
            Self::Manual => "My Mask",
        }
    }

    pub fn color(self) -> RegionColor {
        match self {
            Self::Person | Self::PeopleGroup | Self::People => RegionColor::tint([0, 255, 0]),
            Self::Background => RegionColor::tint([0, 0, 255]),
            Self::Foreground => RegionColor::tint([255, 255, 0]),
            Self::Hair => RegionColor::tint([147, 51, 234]),
            Self::BodySkin => RegionColor::tint([249, 115, 22]),
            Self::FaceSkin => RegionColor::tint([236, 72, 153]),
            Self::Clothes => RegionColor::tint([6, 182, 212]),
            Self::Manual => RegionColor {
                fill: [0, 255, 100, 0x40],
                selected: [0, 255, 100, 0x80],
            },
        }
    }

    /// True for single detected instances.
    pub fn is_person(self) -> bool {
        self == Self::Person
    }
}

/// RGBA overlay colors for the normal and selected states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RegionColor {
    pub fill: [u8; 4],
    pub selected: [u8; 4],
}

impl RegionColor {
    /// 30% fill, 50% when selected
    pub fn tint([r, g, b]: [u8; 3]) -> Self {
        Self {
            fill: [r, g, b, 77],
            selected: [r, g, b, 128],
        }
    }
}

/// A masked area of one image.
///
/// `mask` is the working copy brush edits replace; `original_mask` is what
/// segmentation produced and what [`Region::reset`] restores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub kind: RegionKind,
    pub label: String,
    pub mask: RasterMask,
    /// Eroded mask separating deep clicks from edge clicks
    pub inner_mask: Option<RasterMask>,
    pub original_mask: RasterMask,
    /// Outline in display space, when traced
    pub path: Option<VectorPath>,
    pub color: RegionColor,
    pub visible: bool,
    pub selected: bool,
    /// Detector score for instance regions
    pub confidence: Option<f32>,
}

impl Region {
    pub fn new(kind: RegionKind, mask: RasterMask) -> Self {
        Self {
            id: RegionId::new(),
            kind,
            label: kind.label().to_string(),
            original_mask: mask.clone(),
            mask,
            inner_mask: None,
            path: None,
            color: kind.color(),
            visible: true,
            selected: false,
            confidence: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Replace the working mask. The traced path and inner mask are stale
    /// afterwards and are dropped.
    pub fn set_mask(&mut self, mask: RasterMask) {
        self.mask = mask;
        self.path = None;
        self.inner_mask = None;
    }

    /// Make the working mask the new reset point.
    pub fn commit_original(&mut self) {
        self.original_mask = self.mask.clone();
    }

    /// Undo every edit since segmentation.
    pub fn reset(&mut self) {
        let original = self.original_mask.clone();
        self.set_mask(original);
    }

    pub fn is_edited(&self) -> bool {
        self.mask != self.original_mask
    }

    /// Current overlay color
    pub fn display_color(&self) -> [u8; 4] {
        if self.selected { self.color.selected } else { self.color.fill }
    }

    /// Whether a mask-space point falls on the region.
    pub fn contains(&self, point: Point) -> bool {
        self.mask.contains_point(point, DEFAULT_THRESHOLD)
    }

    /// Whether a mask-space point falls on the inner mask.
    pub fn contains_deep(&self, point: Point) -> bool {
        self.inner_mask
            .as_ref()
            .is_some_and(|inner| inner.contains_point(point, DEFAULT_THRESHOLD))
    }

    /// Pixels at or above the default threshold.
    pub fn area(&self) -> usize {
        self.mask.count_above(DEFAULT_THRESHOLD)
    }
}
