use mask::{erode, resolve_ownership, RasterMask};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RegionError, Result};
use crate::region::{RegionId, RegionKind};
use crate::store::RegionStore;

/// Erosion radius, in mask pixels, of the deep-click zone.
pub const DEFAULT_INNER_RADIUS: u32 = 6;

/// Splits overlapping person masks so each pixel has one owner, then
/// derives every person's inner mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionOwnershipResolver {
    pub inner_radius: u32,
}

impl Default for RegionOwnershipResolver {
    fn default() -> Self {
        Self { inner_radius: DEFAULT_INNER_RADIUS }
    }
}

impl RegionOwnershipResolver {
    pub fn new(inner_radius: u32) -> Self {
        Self { inner_radius }
    }

    /// Resolve the person regions of `store` in place.
    ///
    /// The resolved masks become each region's reset point. Equal mask
    /// values go to the higher-confidence person. Returns how many persons
    /// were resolved.
    pub fn resolve(&self, store: &mut RegionStore) -> Result<usize> {
        let mut people: Vec<(RegionId, f32)> = store
            .by_kind(RegionKind::Person)
            .map(|r| (r.id, r.confidence.unwrap_or(0.0)))
            .collect();
        // Stable, so equal scores keep insertion order
        people.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut masks: Vec<RasterMask> = Vec::with_capacity(people.len());
        for (id, _) in &people {
            let region = store.get(*id).ok_or(RegionError::RegionNotFound(*id))?;
            masks.push(region.mask.clone());
        }
        resolve_ownership(&mut masks)?;

        for ((id, _), resolved) in people.iter().zip(masks) {
            let region = store.get_mut(*id).ok_or(RegionError::RegionNotFound(*id))?;
            let inner = erode(&resolved, self.inner_radius);
            region.set_mask(resolved);
            region.commit_original();
            region.inner_mask = Some(inner);
        }
        debug!(people = people.len(), inner_radius = self.inner_radius, "resolved person ownership");
        Ok(people.len())
    }

    /// Recompute a single region's inner mask after an edit.
    pub fn refresh_inner(&self, store: &mut RegionStore, id: RegionId) -> Result<()> {
        let region = store.get_mut(id).ok_or(RegionError::RegionNotFound(id))?;
        region.inner_mask = Some(erode(&region.mask, self.inner_radius));
        Ok(())
    }
}
