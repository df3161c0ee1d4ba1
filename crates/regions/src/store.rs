use std::collections::{HashMap, HashSet};

use mask::{union_all, Point, RasterMask};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RegionError, Result};
use crate::region::{Region, RegionId, RegionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Selecting a region clears every other selection
    #[default]
    Single,
    /// Selecting toggles one region and leaves the rest alone
    Multi,
}

/// Which of the two people views is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeopleDisplay {
    #[default]
    Individuals,
    Group,
}

/// The regions of one image, keyed by ID, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct RegionStore {
    regions: HashMap<RegionId, Region>,
    order: Vec<RegionId>,
    selection_mode: SelectionMode,
    people_display: PeopleDisplay,
    disabled: HashSet<RegionKind>,
}

impl RegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selection_mode(mut self, mode: SelectionMode) -> Self {
        self.selection_mode = mode;
        self
    }

    pub fn selection_mode(&self) -> SelectionMode {
        self.selection_mode
    }

    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        self.selection_mode = mode;
    }

    /// Add a region, replacing any region with the same ID in place.
    pub fn insert(&mut self, region: Region) -> RegionId {
        let id = region.id;
        if self.regions.insert(id, region).is_none() {
            self.order.push(id);
        }
        id
    }

    pub fn remove(&mut self, id: RegionId) -> Option<Region> {
        let region = self.regions.remove(&id)?;
        self.order.retain(|other| *other != id);
        Some(region)
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(&id)
    }

    pub fn get_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.regions.get_mut(&id)
    }

    fn require_mut(&mut self, id: RegionId) -> Result<&mut Region> {
        self.regions.get_mut(&id).ok_or(RegionError::RegionNotFound(id))
    }

    pub fn contains(&self, id: RegionId) -> bool {
        self.regions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.regions.clear();
        self.order.clear();
    }

    /// Regions in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.order.iter().filter_map(|id| self.regions.get(id))
    }

    pub fn ids(&self) -> &[RegionId] {
        &self.order
    }

    pub fn by_kind(&self, kind: RegionKind) -> impl Iterator<Item = &Region> {
        self.iter().filter(move |region| region.kind == kind)
    }

    pub fn first_of_kind(&self, kind: RegionKind) -> Option<&Region> {
        self.by_kind(kind).next()
    }

    fn ids_of_kind(&self, kind: RegionKind) -> Vec<RegionId> {
        self.by_kind(kind).map(|region| region.id).collect()
    }

    /// Gate a kind out of selection and hit testing.
    pub fn set_kind_enabled(&mut self, kind: RegionKind, enabled: bool) {
        if enabled {
            self.disabled.remove(&kind);
        } else {
            self.disabled.insert(kind);
            for id in self.ids_of_kind(kind) {
                if let Some(region) = self.regions.get_mut(&id) {
                    region.selected = false;
                }
            }
        }
    }

    pub fn is_kind_enabled(&self, kind: RegionKind) -> bool {
        !self.disabled.contains(&kind)
    }

    /// Select a region. In single mode selecting the selected region clears
    /// the selection; in multi mode the region's flag is toggled. Regions of a
    /// disabled kind are left alone.
    pub fn select(&mut self, id: RegionId) -> Result<()> {
        let (kind, was_selected) = {
            let region = self.require_mut(id)?;
            (region.kind, region.selected)
        };
        if !self.is_kind_enabled(kind) {
            return Ok(());
        }
        match self.selection_mode {
            SelectionMode::Single => {
                for region in self.regions.values_mut() {
                    region.selected = !was_selected && region.id == id;
                }
            }
            SelectionMode::Multi => self.require_mut(id)?.selected = !was_selected,
        }
        Ok(())
    }

    pub fn deselect_all(&mut self) {
        for region in self.regions.values_mut() {
            region.selected = false;
        }
    }

    pub fn selected(&self) -> impl Iterator<Item = &Region> {
        self.iter().filter(|region| region.selected)
    }

    pub fn set_visible(&mut self, id: RegionId, visible: bool) -> Result<()> {
        let region = self.require_mut(id)?;
        region.visible = visible;
        if !visible {
            region.selected = false;
        }
        Ok(())
    }

    /// Flip visibility and return the new state.
    pub fn toggle_visible(&mut self, id: RegionId) -> Result<bool> {
        let visible = !self.require_mut(id)?.visible;
        self.set_visible(id, visible)?;
        Ok(visible)
    }

    pub fn people_display(&self) -> PeopleDisplay {
        self.people_display
    }

    /// Show every person and hide the group.
    pub fn show_individuals(&mut self) {
        self.set_people_display(PeopleDisplay::Individuals);
    }

    /// Show the group and hide every person.
    pub fn show_group(&mut self) {
        self.set_people_display(PeopleDisplay::Group);
    }

    fn set_people_display(&mut self, display: PeopleDisplay) {
        self.people_display = display;
        let individuals = display == PeopleDisplay::Individuals;
        for region in self.regions.values_mut() {
            let visible = match region.kind {
                RegionKind::Person => individuals,
                RegionKind::PeopleGroup => !individuals,
                _ => continue,
            };
            region.visible = visible;
            if !visible {
                region.selected = false;
            }
        }
    }

    /// Recompute the people-group mask as the union of all person masks.
    ///
    /// Creates the group region on first use and removes it once no person is
    /// left. Returns the group's ID when one exists.
    pub fn rebuild_group(&mut self) -> Result<Option<RegionId>> {
        let people: Vec<&RasterMask> = self.by_kind(RegionKind::Person).map(|r| &r.mask).collect();
        let union = union_all(&people)?;
        let existing = self.first_of_kind(RegionKind::PeopleGroup).map(|r| r.id);

        let Some(union) = union else {
            if let Some(id) = existing {
                self.remove(id);
            }
            return Ok(None);
        };

        debug!(people = people.len(), "rebuilt people group");
        let visible = self.people_display == PeopleDisplay::Group;
        let id = match existing {
            Some(id) => {
                let group = self.require_mut(id)?;
                group.set_mask(union);
                group.commit_original();
                id
            }
            None => {
                let mut group = Region::new(RegionKind::PeopleGroup, union);
                group.visible = visible;
                self.insert(group)
            }
        };
        Ok(Some(id))
    }

    /// Which region a click at `point` (mask space) lands on.
    ///
    /// A click on a visible person's inner mask picks that person, unless
    /// the group is on display. A click elsewhere on a person picks the
    /// group, or the person when there is no group and it is visible. Any other click picks the first
    /// visible region under the point.
    pub fn hit_test(&self, point: Point) -> Option<RegionId> {
        if self.is_kind_enabled(RegionKind::Person) {
            let people: Vec<&Region> = self.by_kind(RegionKind::Person).collect();
            if self.people_display == PeopleDisplay::Individuals {
                if let Some(person) = people.iter().find(|r| r.visible && r.contains_deep(point)) {
                    return Some(person.id);
                }
            }
            if let Some(person) = people.iter().find(|r| r.contains(point)) {
                let group = self
                    .first_of_kind(RegionKind::PeopleGroup)
                    .filter(|_| self.is_kind_enabled(RegionKind::PeopleGroup));
                match group {
                    Some(group) => return Some(group.id),
                    None if person.visible => return Some(person.id),
                    None => {}
                }
            }
        }

        self.iter()
            .filter(|r| !matches!(r.kind, RegionKind::Person | RegionKind::PeopleGroup))
            .filter(|r| r.visible && self.is_kind_enabled(r.kind))
            .find(|r| r.contains(point))
            .map(|r| r.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::Coord;

    fn square(x0: i64, y0: i64, size: i64) -> RasterMask {
        let mut mask = RasterMask::new(32, 32);
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                mask.set(x, y, 255);
            }
        }
        mask
    }

    #[test]
    fn test_insert_keeps_order_and_replaces_in_place() {
        let mut store = RegionStore::new();
        let a = store.insert(Region::new(RegionKind::Background, square(0, 0, 4)));
        let b = store.insert(Region::new(RegionKind::Foreground, square(4, 4, 4)));

        let mut replacement = store.get(a).unwrap().clone();
        replacement.label = "Sky".into();
        store.insert(replacement);

        assert_eq!(store.ids(), &[a, b]);
        assert_eq!(store.get(a).unwrap().label, "Sky");
        assert!(store.remove(a).is_some());
        assert_eq!(store.ids(), &[b]);
        assert!(store.remove(a).is_none());
    }

    #[test]
    fn test_single_selection_toggles_off() {
        let mut store = RegionStore::new();
        let a = store.insert(Region::new(RegionKind::Background, square(0, 0, 4)));
        let b = store.insert(Region::new(RegionKind::Foreground, square(4, 4, 4)));

        store.select(a).unwrap();
        store.select(b).unwrap();
        assert_eq!(store.selected().map(|r| r.id).collect::<Vec<_>>(), vec![b]);

        store.select(b).unwrap();
        assert_eq!(store.selected().count(), 0);
    }

    #[test]
    fn test_multi_selection() {
        let mut store = RegionStore::new().with_selection_mode(SelectionMode::Multi);
        let a = store.insert(Region::new(RegionKind::Background, square(0, 0, 4)));
        let b = store.insert(Region::new(RegionKind::Foreground, square(4, 4, 4)));
        store.select(a).unwrap();
        store.select(b).unwrap();
        assert_eq!(store.selected().count(), 2);
        store.select(a).unwrap();
        assert_eq!(store.selected().map(|r| r.id).collect::<Vec<_>>(), vec![b]);
        store.deselect_all();
        assert_eq!(store.selected().count(), 0);
    }

    #[test]
    fn test_unknown_region_is_an_error() {
        let mut store = RegionStore::new();
        let missing = RegionId::new();
        assert!(matches!(store.select(missing), Err(RegionError::RegionNotFound(id)) if id == missing));
        assert!(store.set_visible(missing, false).is_err());
    }

    #[test]
    fn test_disabled_kinds_ignore_selection() {
        let mut store = RegionStore::new();
        let bg = store.insert(Region::new(RegionKind::Background, square(0, 0, 4)));
        store.set_kind_enabled(RegionKind::Background, false);
        store.select(bg).unwrap();
        assert!(!store.get(bg).unwrap().selected);
        assert_eq!(store.hit_test(Coord { x: 1.0, y: 1.0 }), None);
    }

    #[test]
    fn test_hiding_clears_selection() {
        let mut store = RegionStore::new();
        let a = store.insert(Region::new(RegionKind::Background, square(0, 0, 4)));
        store.select(a).unwrap();
        assert!(!store.toggle_visible(a).unwrap());
        assert!(!store.get(a).unwrap().selected);
        assert!(store.toggle_visible(a).unwrap());
    }

    #[test]
    fn test_group_and_individuals_are_exclusive() {
        let mut store = RegionStore::new();
        let p1 = store.insert(Region::new(RegionKind::Person, square(0, 0, 8)));
        let p2 = store.insert(Region::new(RegionKind::Person, square(16, 16, 8)));
        let group = store.rebuild_group().unwrap().unwrap();

        assert_eq!(store.get(group).unwrap().area(), 128);
        assert!(!store.get(group).unwrap().visible);

        store.show_group();
        assert!(store.get(group).unwrap().visible);
        assert!(!store.get(p1).unwrap().visible && !store.get(p2).unwrap().visible);

        store.show_individuals();
        assert!(!store.get(group).unwrap().visible);
        assert!(store.get(p1).unwrap().visible && store.get(p2).unwrap().visible);
    }

    #[test]
    fn test_group_follows_people() {
        let mut store = RegionStore::new();
        let p1 = store.insert(Region::new(RegionKind::Person, square(0, 0, 8)));
        let group = store.rebuild_group().unwrap().unwrap();

        store.get_mut(p1).unwrap().set_mask(square(0, 0, 4));
        assert_eq!(store.rebuild_group().unwrap(), Some(group));
        assert_eq!(store.get(group).unwrap().area(), 16);

        store.remove(p1);
        assert_eq!(store.rebuild_group().unwrap(), None);
        assert!(store.first_of_kind(RegionKind::PeopleGroup).is_none());
    }

    #[test]
    fn test_hit_test_deep_edge_and_background() {
        let mut store = RegionStore::new();
        let mut person = Region::new(RegionKind::Person, square(4, 4, 12));
        person.inner_mask = Some(square(7, 7, 6));
        let person = store.insert(person);
        let group = store.rebuild_group().unwrap().unwrap();
        let mut outside = square(0, 0, 32);
        outside.subtract(&square(4, 4, 12)).unwrap();
        let bg = store.insert(Region::new(RegionKind::Background, outside));

        assert_eq!(store.hit_test(Coord { x: 9.5, y: 9.5 }), Some(person));
        assert_eq!(store.hit_test(Coord { x: 4.5, y: 9.5 }), Some(group));
        assert_eq!(store.hit_test(Coord { x: 30.0, y: 30.0 }), Some(bg));
        assert_eq!(store.hit_test(Coord { x: 40.0, y: 3.0 }), None);

        store.show_group();
        assert_eq!(store.hit_test(Coord { x: 9.5, y: 9.5 }), Some(group));
    }

    #[test]
    fn test_hidden_person_is_not_picked() {
        let mut store = RegionStore::new();
        let mut person = Region::new(RegionKind::Person, square(4, 4, 12));
        person.inner_mask = Some(square(7, 7, 6));
        let person = store.insert(person);
        let group = store.rebuild_group().unwrap().unwrap();

        store.set_visible(person, false).unwrap();
        assert_eq!(store.hit_test(Coord { x: 9.5, y: 9.5 }), Some(group));

        store.remove(group);
        assert_eq!(store.hit_test(Coord { x: 9.5, y: 9.5 }), None);
        store.set_visible(person, true).unwrap();
        assert_eq!(store.hit_test(Coord { x: 9.5, y: 9.5 }), Some(person));
    }
}
