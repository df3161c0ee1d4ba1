use std::fmt;
use std::time::Duration;

use image::RgbImage;
use mask::DisplayTransform;
use serde::{Deserialize, Serialize};
use strum::Display;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::builder::RegionBuilder;
use crate::error::{RegionError, Result};
use crate::segmenter::Segmenter;
use crate::store::RegionStore;

/// Shortest time a tile stays in the processing state.
pub const MIN_PROCESSING_TIME: Duration = Duration::from_millis(900);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(Uuid);

impl TileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TileState {
    Processing,
    Ready,
    /// Segmentation failed; the tile has no regions but stays editable
    Failed(String),
}

/// One image of the workspace with its regions.
#[derive(Debug, Clone)]
pub struct ImageTile {
    pub id: TileId,
    pub image: RgbImage,
    pub store: RegionStore,
    pub state: TileState,
    /// Where the image sits in the viewport, once known
    pub transform: Option<DisplayTransform>,
}

impl ImageTile {
    pub fn is_processing(&self) -> bool {
        self.state == TileState::Processing
    }
}

/// Images being edited, plus the segmenter that fills them with regions.
pub struct Workspace<S: Segmenter> {
    segmenter: S,
    builder: RegionBuilder,
    tiles: Vec<ImageTile>,
    active: Option<TileId>,
    min_processing: Duration,
    viewport: Option<(f64, f64)>,
}

impl<S: Segmenter> Workspace<S> {
    pub fn new(segmenter: S) -> Self {
        Self {
            segmenter,
            builder: RegionBuilder::default(),
            tiles: Vec::new(),
            active: None,
            min_processing: MIN_PROCESSING_TIME,
            viewport: None,
        }
    }

    pub fn with_builder(mut self, builder: RegionBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn with_min_processing_time(mut self, duration: Duration) -> Self {
        self.min_processing = duration;
        self
    }

    /// Viewport size used to place images and trace region paths on screen.
    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport = Some((width, height));
        self
    }

    pub fn segmenter(&self) -> &S {
        &self.segmenter
    }

    /// Add an image and segment it.
    ///
    /// Holds the workspace for the whole processing time, so callers that
    /// need to show the processing state use [`Workspace::begin_image`] and
    /// [`Workspace::complete_image`] instead.
    pub async fn add_image(&mut self, image: RgbImage) -> TileId {
        let id = self.begin_image(image);
        if let Err(err) = self.complete_image(id).await {
            warn!(tile = %id, error = %err, "tile vanished while processing");
        }
        id
    }

    /// Add an image as the active tile, in the processing state with no
    /// regions yet.
    pub fn begin_image(&mut self, image: RgbImage) -> TileId {
        let id = TileId::new();
        self.tiles.push(ImageTile {
            id,
            image,
            store: RegionStore::new(),
            state: TileState::Processing,
            transform: None,
        });
        self.active = Some(id);
        id
    }

    /// Segment a tile added with [`Workspace::begin_image`].
    ///
    /// The tile stays processing for at least the minimum processing time.
    /// A segmenter failure leaves the tile failed with no regions; only a
    /// missing tile is an error.
    pub async fn complete_image(&mut self, id: TileId) -> Result<()> {
        if self.tile(id).is_none() {
            return Err(RegionError::TileNotFound(id));
        }
        let start = Instant::now();
        let outcome = self.process(id);
        let elapsed = start.elapsed();
        if elapsed < self.min_processing {
            sleep(self.min_processing - elapsed).await;
        }

        let tile = self.tile_mut(id).ok_or(RegionError::TileNotFound(id))?;
        match outcome {
            Ok((store, transform)) => {
                info!(tile = %id, regions = store.len(), ?elapsed, "tile ready");
                tile.store = store;
                tile.transform = transform;
                tile.state = TileState::Ready;
            }
            Err(err) => {
                warn!(tile = %id, error = %err, "segmentation failed");
                tile.store = RegionStore::new();
                tile.state = TileState::Failed(err.to_string());
            }
        }
        Ok(())
    }

    fn process(&mut self, id: TileId) -> Result<(RegionStore, Option<DisplayTransform>)> {
        if !self.segmenter.is_ready() {
            self.segmenter.init()?;
        }
        let tile = self.tiles.iter().find(|t| t.id == id).ok_or(RegionError::TileNotFound(id))?;
        let output = self.segmenter.segment(&tile.image)?;
        let mut store = self.builder.build(output.as_ref())?;

        let transform = match (self.viewport, &output) {
            (Some((width, height)), Some(output)) => {
                let (mask_width, mask_height) = output.mask_dimensions();
                DisplayTransform::fit(width, height, tile.image.width(), tile.image.height(), mask_width, mask_height).ok()
            }
            _ => None,
        };
        self.builder.trace_paths(&mut store, transform.as_ref());
        Ok((store, transform))
    }

    pub fn tiles(&self) -> &[ImageTile] {
        &self.tiles
    }

    pub fn tile(&self, id: TileId) -> Option<&ImageTile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub fn tile_mut(&mut self, id: TileId) -> Option<&mut ImageTile> {
        self.tiles.iter_mut().find(|t| t.id == id)
    }

    pub fn remove_tile(&mut self, id: TileId) -> Option<ImageTile> {
        let index = self.tiles.iter().position(|t| t.id == id)?;
        if self.active == Some(id) {
            self.active = None;
        }
        Some(self.tiles.remove(index))
    }

    pub fn select_tile(&mut self, id: Option<TileId>) -> Result<()> {
        if let Some(id) = id {
            if self.tile(id).is_none() {
                return Err(RegionError::TileNotFound(id));
            }
        }
        self.active = id;
        Ok(())
    }

    pub fn active_tile(&self) -> Option<&ImageTile> {
        self.tile(self.active?)
    }

    pub fn active_tile_mut(&mut self) -> Option<&mut ImageTile> {
        let id = self.active?;
        self.tile_mut(id)
    }

    /// Release the segmenter. It is initialized again on the next image.
    pub fn shutdown(&mut self) {
        if self.segmenter.is_ready() {
            self.segmenter.dispose();
        }
    }
}
