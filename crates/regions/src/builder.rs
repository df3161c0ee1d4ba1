//! Turning a segmentation output into regions.

use mask::{mask_to_path, DisplayTransform, RasterMask, VectorPath, DEFAULT_EPSILON, DEFAULT_THRESHOLD};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::ownership::RegionOwnershipResolver;
use crate::region::{Region, RegionKind};
use crate::segmenter::{CategoryConfig, InstanceResult, SegmentationOutput, SegmentationResult};
use crate::store::RegionStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionBuilderConfig {
    /// Category IDs per region kind, for semantic outputs
    pub categories: Vec<CategoryConfig>,
    pub ownership: RegionOwnershipResolver,
    /// RDP tolerance for traced outlines, in mask pixels
    pub trace_epsilon: f64,
    /// Instances scoring below this are dropped
    pub min_instance_score: f32,
}

impl Default for RegionBuilderConfig {
    fn default() -> Self {
        Self {
            categories: CategoryConfig::defaults(),
            ownership: RegionOwnershipResolver::default(),
            trace_epsilon: DEFAULT_EPSILON,
            min_instance_score: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegionBuilder {
    config: RegionBuilderConfig,
}

impl RegionBuilder {
    pub fn new(config: RegionBuilderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RegionBuilderConfig {
        &self.config
    }

    /// Regions for one segmentation output, in mask space. No output or a
    /// malformed one gives an empty store.
    pub fn build(&self, output: Option<&SegmentationOutput>) -> Result<RegionStore> {
        let Some(output) = output else {
            warn!("segmenter returned no mask");
            return Ok(RegionStore::new());
        };
        match output {
            SegmentationOutput::Categories(result) => self.build_categories(result),
            SegmentationOutput::Instances { mask_width, mask_height, instances } => {
                self.build_instances(*mask_width, *mask_height, instances)
            }
        }
    }

    fn build_categories(&self, result: &SegmentationResult) -> Result<RegionStore> {
        let mut store = RegionStore::new();
        if !result.is_well_formed() {
            warn!(
                width = result.mask_width,
                height = result.mask_height,
                len = result.category_mask.len(),
                "category mask does not match its dimensions"
            );
            return Ok(store);
        }

        for config in &self.config.categories {
            let mask = RasterMask::from_categories(
                result.mask_width,
                result.mask_height,
                &result.category_mask,
                &config.categories,
            )?;
            if mask.is_blank(DEFAULT_THRESHOLD) {
                continue;
            }
            store.insert(Region::new(config.kind, mask));
        }
        debug!(regions = store.len(), "built category regions");
        Ok(store)
    }

    fn build_instances(&self, width: u32, height: u32, instances: &[InstanceResult]) -> Result<RegionStore> {
        let mut store = RegionStore::new();
        let expected = width as usize * height as usize;

        let mut count = 0;
        for instance in instances {
            if instance.score < self.config.min_instance_score {
                continue;
            }
            if instance.mask_alpha.len() != expected {
                warn!(len = instance.mask_alpha.len(), expected, "dropping instance with mismatched mask");
                continue;
            }
            let mask = RasterMask::from_vec(width, height, instance.mask_alpha.clone())?;
            if !mask.has_coverage() {
                continue;
            }
            count += 1;
            store.insert(
                Region::new(RegionKind::Person, mask)
                    .with_confidence(instance.score)
                    .with_label(format!("Person {count}")),
            );
        }
        if store.is_empty() {
            return Ok(store);
        }

        self.config.ownership.resolve(&mut store)?;
        if let Some(group) = store.rebuild_group()? {
            let mut background = store.get(group).map(|g| g.mask.clone()).unwrap_or_else(|| RasterMask::new(width, height));
            background.invert();
            if !background.is_blank(DEFAULT_THRESHOLD) {
                store.insert(Region::new(RegionKind::Background, background));
            }
        }
        store.show_individuals();
        debug!(people = count, regions = store.len(), "built instance regions");
        Ok(store)
    }

    /// Trace every region's outline into display space (mask space without a
    /// transform). Regions with no contour get no path.
    pub fn trace_paths(&self, store: &mut RegionStore, transform: Option<&DisplayTransform>) {
        let ids = store.ids().to_vec();
        for id in ids {
            if let Some(region) = store.get_mut(id) {
                region.path = trace_region_path(&region.mask, transform, self.config.trace_epsilon);
            }
        }
    }
}

/// Smooth outline of the largest area of `mask`, placed on screen by
/// `transform`.
pub fn trace_region_path(mask: &RasterMask, transform: Option<&DisplayTransform>, epsilon: f64) -> Option<VectorPath> {
    let path = mask_to_path(mask, 1.0, 1.0, epsilon);
    if path.is_empty() {
        return None;
    }
    Some(match transform {
        Some(transform) => transform.path_to_display(&path),
        None => path,
    })
}
