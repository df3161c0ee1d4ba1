//! # Regions
//!
//! The region model of a segmented photo: which areas exist, which one is
//! selected or hidden, who owns each pixel, and how brush edits change them.
//!
//! Segmentation is a collaborator. Implement [`Segmenter`] for a model,
//! hand it to a [`Workspace`], and each added image comes back as an
//! [`ImageTile`] whose [`RegionStore`] holds the resulting regions.
//!
//! ```rust
//! use mask::{DisplayTransform, RasterMask};
//! use regions::{BrushSettings, EditSession, Region, RegionKind, RegionStore};
//!
//! let mut store = RegionStore::new();
//! let id = store.insert(Region::new(RegionKind::Manual, RasterMask::new(64, 64)));
//!
//! let view = DisplayTransform::new(128.0, 128.0, 64, 64)?;
//! let mut session = EditSession::begin(&store, id, view, BrushSettings::default())?;
//! session.pointer_down(geo_types::Coord { x: 64.0, y: 64.0 })?;
//! session.pointer_up(&mut store)?;
//! session.finish(&mut store)?;
//!
//! assert!(store.get(id).unwrap().path.is_some());
//! # Ok::<(), regions::RegionError>(())
//! ```

pub mod error;
pub mod region;
pub mod store;
pub mod ownership;
pub mod segmenter;
pub mod builder;
pub mod edit;
pub mod workspace;

pub use error::{RegionError, Result};
pub use region::{Region, RegionColor, RegionId, RegionKind};
pub use store::{PeopleDisplay, RegionStore, SelectionMode};
pub use ownership::{RegionOwnershipResolver, DEFAULT_INNER_RADIUS};
pub use segmenter::{
    CategoryConfig, InstanceResult, SegmentationOutput, SegmentationResult, Segmenter, SegmenterError,
};
pub use builder::{trace_region_path, RegionBuilder, RegionBuilderConfig};
pub use edit::{BrushSettings, EditSession, VectorEditSession, DEFAULT_BRUSH_DIAMETER};
pub use workspace::{ImageTile, TileId, TileState, Workspace, MIN_PROCESSING_TIME};
