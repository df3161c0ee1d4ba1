//! Brush editing of a single region.
//!
//! [`EditSession`] paints the region's bitmap and is the primary mode.
//! [`VectorEditSession`] keeps the region as a polygon and folds each stroke
//! in with a polygon boolean, for callers that want vector output.
//!
//! Both sessions take pointer positions in display space and paint into a
//! private buffer; the region in the store only changes when a stroke is
//! committed on pointer up.

use mask::{
    combine_shapes, stroke_to_polygon, BooleanOp, BrushEngine, BrushMode, BrushStroke, ComplexShape,
    DisplayTransform, Pipeline, Point, RasterMask, VectorPath, DEFAULT_EPSILON,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builder::trace_region_path;
use crate::error::{RegionError, Result};
use crate::ownership::DEFAULT_INNER_RADIUS;
use crate::region::{RegionId, RegionKind};
use crate::store::RegionStore;

/// On-screen brush width in display pixels.
pub const DEFAULT_BRUSH_DIAMETER: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrushSettings {
    /// Display pixels
    pub diameter: f64,
    pub mode: BrushMode,
    pub hardness: f64,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            diameter: DEFAULT_BRUSH_DIAMETER,
            mode: BrushMode::Add,
            hardness: 1.0,
        }
    }
}

impl BrushSettings {
    pub fn with_diameter(mut self, diameter: f64) -> Self {
        self.diameter = diameter.max(0.0);
        self
    }

    pub fn with_mode(mut self, mode: BrushMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_hardness(mut self, hardness: f64) -> Self {
        self.hardness = hardness;
        self
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
    }

    pub fn engine(&self) -> BrushEngine {
        BrushEngine::new(self.hardness)
    }
}

/// Bitmap brush session on one region.
#[derive(Debug, Clone)]
pub struct EditSession {
    region: RegionId,
    transform: DisplayTransform,
    settings: BrushSettings,
    inner_radius: u32,
    /// Mask on entry, restored by cancel
    snapshot: RasterMask,
    /// Last committed mask
    committed: RasterMask,
    in_flight: Option<(RasterMask, BrushStroke)>,
}

impl EditSession {
    /// Enter edit mode on `id`.
    pub fn begin(store: &RegionStore, id: RegionId, transform: DisplayTransform, settings: BrushSettings) -> Result<Self> {
        let region = store.get(id).ok_or(RegionError::RegionNotFound(id))?;
        debug!(region = %id, kind = %region.kind, "entering edit mode");
        Ok(Self {
            region: id,
            transform,
            settings,
            inner_radius: DEFAULT_INNER_RADIUS,
            snapshot: region.mask.clone(),
            committed: region.mask.clone(),
            in_flight: None,
        })
    }

    pub fn with_inner_radius(mut self, inner_radius: u32) -> Self {
        self.inner_radius = inner_radius;
        self
    }

    pub fn region_id(&self) -> RegionId {
        self.region
    }

    pub fn settings(&self) -> &BrushSettings {
        &self.settings
    }

    /// Takes effect from the next stroke.
    pub fn set_settings(&mut self, settings: BrushSettings) {
        self.settings = settings;
    }

    pub fn toggle_mode(&mut self) {
        self.settings.toggle_mode();
    }

    /// Brush radius in mask pixels.
    pub fn radius(&self) -> f64 {
        self.transform.brush_radius(self.settings.diameter)
    }

    pub fn is_stroking(&self) -> bool {
        self.in_flight.is_some()
    }

    /// What the editor should draw: the stroke buffer while painting,
    /// otherwise the committed mask.
    pub fn preview(&self) -> &RasterMask {
        self.in_flight.as_ref().map_or(&self.committed, |(buffer, _)| buffer)
    }

    /// Start a stroke. Fails while another stroke is in flight.
    pub fn pointer_down(&mut self, display_point: Point) -> Result<()> {
        if self.in_flight.is_some() {
            return Err(RegionError::StrokeInProgress(self.region));
        }
        let mut buffer = self.committed.clone();
        let mut stroke = BrushStroke::new(self.radius(), self.settings.mode);
        stroke.extend_to(&mut buffer, &self.settings.engine(), self.transform.display_to_mask(display_point));
        self.in_flight = Some((buffer, stroke));
        Ok(())
    }

    /// Continue the stroke. Returns false when no stroke is in flight.
    pub fn pointer_move(&mut self, display_point: Point) -> bool {
        let point = self.transform.display_to_mask(display_point);
        let engine = self.settings.engine();
        match &mut self.in_flight {
            Some((buffer, stroke)) => {
                stroke.extend_to(buffer, &engine, point);
                true
            }
            None => false,
        }
    }

    /// Commit the stroke into the region.
    pub fn pointer_up(&mut self, store: &mut RegionStore) -> Result<()> {
        let (buffer, stroke) = self.in_flight.take().ok_or(RegionError::NoStroke)?;
        let region = store.get_mut(self.region).ok_or(RegionError::RegionNotFound(self.region))?;
        debug!(region = %self.region, samples = stroke.points.len(), mode = %stroke.mode, "committing stroke");
        region.set_mask(buffer.clone());
        self.committed = buffer;
        Ok(())
    }

    /// Drop the stroke in flight. Returns whether there was one.
    pub fn cancel_stroke(&mut self) -> bool {
        self.in_flight.take().is_some()
    }

    /// Leave edit mode, undoing every stroke of this session.
    pub fn cancel(self, store: &mut RegionStore) -> Result<()> {
        let region = store.get_mut(self.region).ok_or(RegionError::RegionNotFound(self.region))?;
        region.set_mask(self.snapshot.clone());
        self.refresh(store)
    }

    /// Leave edit mode keeping committed strokes. A stroke still in flight
    /// is discarded.
    pub fn finish(self, store: &mut RegionStore) -> Result<()> {
        self.refresh(store)
    }

    fn refresh(&self, store: &mut RegionStore) -> Result<()> {
        let region = store.get_mut(self.region).ok_or(RegionError::RegionNotFound(self.region))?;
        region.path = trace_region_path(&region.mask, Some(&self.transform), DEFAULT_EPSILON);
        refresh_person(store, self.region, self.inner_radius)
    }
}

/// Re-erode a person's inner mask and rebuild the group after its mask
/// changed. Other kinds are left alone.
fn refresh_person(store: &mut RegionStore, id: RegionId, inner_radius: u32) -> Result<()> {
    let region = store.get_mut(id).ok_or(RegionError::RegionNotFound(id))?;
    if region.kind != RegionKind::Person {
        return Ok(());
    }
    region.inner_mask = Some(mask::erode(&region.mask, inner_radius));
    store.rebuild_group()?;
    Ok(())
}

/// Polygon brush session on one region.
#[derive(Debug, Clone)]
pub struct VectorEditSession {
    region: RegionId,
    transform: DisplayTransform,
    settings: BrushSettings,
    inner_radius: u32,
    /// Region outline in mask space
    shape: ComplexShape,
    snapshot: (RasterMask, Option<VectorPath>),
    centerline: Option<Vec<Point>>,
}

impl VectorEditSession {
    pub fn begin(store: &RegionStore, id: RegionId, transform: DisplayTransform, settings: BrushSettings) -> Result<Self> {
        let region = store.get(id).ok_or(RegionError::RegionNotFound(id))?;
        let outline = Pipeline::builder()
            .largest_only()
            .with_simplification(0.5)
            .without_smoothing()
            .build()
            .process(&region.mask)?;
        let shape = outline.largest_shape().cloned().unwrap_or_default();
        Ok(Self {
            region: id,
            transform,
            settings,
            inner_radius: DEFAULT_INNER_RADIUS,
            shape,
            snapshot: (region.mask.clone(), region.path.clone()),
            centerline: None,
        })
    }

    pub fn with_inner_radius(mut self, inner_radius: u32) -> Self {
        self.inner_radius = inner_radius;
        self
    }

    pub fn shape(&self) -> &ComplexShape {
        &self.shape
    }

    pub fn settings(&self) -> &BrushSettings {
        &self.settings
    }

    pub fn toggle_mode(&mut self) {
        self.settings.toggle_mode();
    }

    pub fn is_stroking(&self) -> bool {
        self.centerline.is_some()
    }

    /// Fill polygon of the stroke drawn so far, in mask space.
    pub fn stroke_preview(&self) -> Result<Option<ComplexShape>> {
        let Some(line) = &self.centerline else {
            return Ok(None);
        };
        Ok(Some(stroke_to_polygon(line, self.transform.brush_radius(self.settings.diameter))?))
    }

    pub fn pointer_down(&mut self, display_point: Point) -> Result<()> {
        if self.centerline.is_some() {
            return Err(RegionError::StrokeInProgress(self.region));
        }
        self.centerline = Some(vec![self.transform.display_to_mask(display_point)]);
        Ok(())
    }

    pub fn pointer_move(&mut self, display_point: Point) -> bool {
        let point = self.transform.display_to_mask(display_point);
        match &mut self.centerline {
            Some(line) => {
                line.push(point);
                true
            }
            None => false,
        }
    }

    /// Union (add) or subtract (erase) the stroke polygon and write the
    /// result back into the region as both path and mask.
    ///
    /// A failed boolean is returned and leaves the region and the session
    /// shape as they were; the stroke is dropped either way.
    pub fn pointer_up(&mut self, store: &mut RegionStore) -> Result<()> {
        let line = self.centerline.take().ok_or(RegionError::NoStroke)?;
        if !store.contains(self.region) {
            return Err(RegionError::RegionNotFound(self.region));
        }
        let stroke = stroke_to_polygon(&line, self.transform.brush_radius(self.settings.diameter))?;

        let merged = match (self.settings.mode, self.shape.is_empty()) {
            (BrushMode::Add, true) => stroke,
            (BrushMode::Erase, true) => ComplexShape::default(),
            (BrushMode::Add, false) => combine_shapes(&self.shape, &stroke, BooleanOp::Union)?,
            (BrushMode::Erase, false) => combine_shapes(&self.shape, &stroke, BooleanOp::Difference)?,
        };
        self.shape = merged;
        self.write_back(store)?;
        debug!(region = %self.region, area = self.shape.area(), "merged vector stroke");
        Ok(())
    }

    /// Leave edit mode keeping the merged strokes.
    pub fn finish(self, store: &mut RegionStore) -> Result<()> {
        refresh_person(store, self.region, self.inner_radius)
    }

    /// Leave edit mode, restoring the region as it was on entry.
    pub fn cancel(self, store: &mut RegionStore) -> Result<()> {
        let region = store.get_mut(self.region).ok_or(RegionError::RegionNotFound(self.region))?;
        let (mask, path) = self.snapshot;
        region.set_mask(mask);
        region.path = path;
        refresh_person(store, self.region, self.inner_radius)
    }

    fn write_back(&self, store: &mut RegionStore) -> Result<()> {
        let region = store.get_mut(self.region).ok_or(RegionError::RegionNotFound(self.region))?;
        let (width, height) = region.mask.dimensions();
        region.set_mask(RasterMask::from_shape(width, height, &self.shape));
        region.path = if self.shape.is_empty() {
            None
        } else {
            Some(self.transform.path_to_display(&VectorPath::from_shape(&self.shape)))
        };
        refresh_person(store, self.region, self.inner_radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Region;
    use geo_types::Coord;

    fn setup() -> (RegionStore, RegionId, DisplayTransform) {
        let mut store = RegionStore::new();
        let id = store.insert(Region::new(RegionKind::Manual, RasterMask::new(64, 64)));
        // 2x display scale
        let transform = DisplayTransform::new(128.0, 128.0, 64, 64).unwrap();
        (store, id, transform)
    }

    fn at(x: f64, y: f64) -> Point {
        Coord { x, y }
    }

    #[test]
    fn test_stroke_is_invisible_until_pointer_up() {
        let (mut store, id, transform) = setup();
        let mut session = EditSession::begin(&store, id, transform, BrushSettings::default()).unwrap();
        assert_eq!(session.radius(), 5.0);

        session.pointer_down(at(40.0, 64.0)).unwrap();
        assert!(session.pointer_move(at(88.0, 64.0)));
        assert!(store.get(id).unwrap().mask.is_blank(1));
        assert!(session.preview().has_coverage());

        session.pointer_up(&mut store).unwrap();
        let mask = &store.get(id).unwrap().mask;
        for x in 20..=44 {
            assert_eq!(mask.get(x, 32), 255, "gap at x = {x}");
        }
        assert!(store.get(id).unwrap().original_mask.is_blank(1));
    }

    #[test]
    fn test_second_pointer_down_is_rejected() {
        let (store, id, transform) = setup();
        let mut session = EditSession::begin(&store, id, transform, BrushSettings::default()).unwrap();
        session.pointer_down(at(10.0, 10.0)).unwrap();
        assert!(matches!(session.pointer_down(at(20.0, 20.0)), Err(RegionError::StrokeInProgress(_))));
        assert!(session.cancel_stroke());
        assert!(!session.is_stroking());
        assert!(!session.pointer_move(at(30.0, 30.0)));
    }

    #[test]
    fn test_pointer_up_without_stroke() {
        let (mut store, id, transform) = setup();
        let mut session = EditSession::begin(&store, id, transform, BrushSettings::default()).unwrap();
        assert!(matches!(session.pointer_up(&mut store), Err(RegionError::NoStroke)));
    }

    #[test]
    fn test_cancel_restores_mask_from_entry() {
        let (mut store, id, transform) = setup();
        let mut session = EditSession::begin(&store, id, transform, BrushSettings::default()).unwrap();
        session.pointer_down(at(64.0, 64.0)).unwrap();
        session.pointer_up(&mut store).unwrap();
        assert!(store.get(id).unwrap().mask.has_coverage());

        session.cancel(&mut store).unwrap();
        assert!(store.get(id).unwrap().mask.is_blank(1));
        assert!(store.get(id).unwrap().path.is_none());
    }

    #[test]
    fn test_erase_then_finish_traces_path() {
        let (mut store, id, transform) = setup();
        store.get_mut(id).unwrap().set_mask(RasterMask::filled(64, 64, 255));

        let settings = BrushSettings::default().with_mode(BrushMode::Erase).with_diameter(40.0);
        let mut session = EditSession::begin(&store, id, transform, settings).unwrap();
        session.pointer_down(at(64.0, 64.0)).unwrap();
        session.pointer_up(&mut store).unwrap();
        assert_eq!(store.get(id).unwrap().mask.get(32, 32), 0);
        assert_eq!(store.get(id).unwrap().mask.get(2, 2), 255);

        session.finish(&mut store).unwrap();
        assert!(store.get(id).unwrap().path.is_some());
    }

    #[test]
    fn test_person_edit_refreshes_inner_and_group() {
        let mut store = RegionStore::new();
        let person = store.insert(Region::new(RegionKind::Person, RasterMask::new(64, 64)));
        let transform = DisplayTransform::new(64.0, 64.0, 64, 64).unwrap();

        let settings = BrushSettings::default().with_diameter(30.0);
        let mut session = EditSession::begin(&store, person, transform, settings).unwrap().with_inner_radius(4);
        session.pointer_down(at(32.0, 32.0)).unwrap();
        session.pointer_up(&mut store).unwrap();
        session.finish(&mut store).unwrap();

        let region = store.get(person).unwrap();
        assert!(region.contains_deep(at(32.0, 32.0)));
        assert!(!region.contains_deep(at(32.0, 19.0)));
        let group = store.first_of_kind(RegionKind::PeopleGroup).unwrap();
        assert_eq!(group.mask, region.mask);
    }

    #[test]
    fn test_vector_add_then_erase() {
        let (mut store, id, transform) = setup();
        let settings = BrushSettings::default().with_diameter(20.0);
        let mut session = VectorEditSession::begin(&store, id, transform, settings).unwrap();
        assert!(session.shape().is_empty());

        session.pointer_down(at(20.0, 64.0)).unwrap();
        session.pointer_move(at(108.0, 64.0));
        assert!(session.stroke_preview().unwrap().is_some());
        session.pointer_up(&mut store).unwrap();

        // Capsule from (10, 32) to (54, 32) with radius 5
        let added = session.shape().area();
        assert!((added - (44.0 * 10.0 + std::f64::consts::PI * 25.0)).abs() < 6.0);
        assert_eq!(store.get(id).unwrap().mask.get(32, 32), 255);
        assert!(store.get(id).unwrap().path.is_some());

        // Cutting it in two keeps the larger piece
        session.toggle_mode();
        session.pointer_down(at(80.0, 40.0)).unwrap();
        session.pointer_move(at(80.0, 88.0));
        session.pointer_up(&mut store).unwrap();
        assert!(session.shape().area() < added);
        let mask = &store.get(id).unwrap().mask;
        assert_eq!(mask.get(40, 32), 0);
        assert_eq!(mask.get(15, 32), 255);
        assert_eq!(mask.get(52, 32), 0);
    }

    #[test]
    fn test_vector_cancel() {
        let (mut store, id, transform) = setup();
        let mut session = VectorEditSession::begin(&store, id, transform, BrushSettings::default()).unwrap();
        session.pointer_down(at(64.0, 64.0)).unwrap();
        session.pointer_up(&mut store).unwrap();
        assert!(store.get(id).unwrap().mask.has_coverage());
        session.cancel(&mut store).unwrap();
        assert!(store.get(id).unwrap().mask.is_blank(1));
    }

    #[test]
    fn test_vector_edit_on_person_refreshes_inner_and_group() {
        let mut store = RegionStore::new();
        let mut disc = RasterMask::new(64, 64);
        mask::paint(&mut disc, 16.0, 16.0, 8.0, BrushMode::Add);
        let person = store.insert(Region::new(RegionKind::Person, disc));
        store.rebuild_group().unwrap();
        let transform = DisplayTransform::new(64.0, 64.0, 64, 64).unwrap();

        let mut session = VectorEditSession::begin(&store, person, transform, BrushSettings::default())
            .unwrap()
            .with_inner_radius(4);
        session.pointer_down(at(20.0, 16.0)).unwrap();
        session.pointer_move(at(50.0, 40.0));
        session.pointer_up(&mut store).unwrap();

        let region = store.get(person).unwrap();
        assert_eq!(region.mask.get(50, 40), 255);
        assert!(region.contains_deep(at(45.5, 36.5)));
        let group = store.first_of_kind(RegionKind::PeopleGroup).unwrap();
        assert_eq!(group.mask, region.mask);
        assert_eq!(store.hit_test(at(45.5, 36.5)), Some(person));

        session.finish(&mut store).unwrap();
        assert!(store.get(person).unwrap().inner_mask.is_some());
    }

    #[test]
    fn test_vector_merge_failure_is_reported() {
        let (mut store, id, transform) = setup();
        let mut session = VectorEditSession::begin(&store, id, transform, BrushSettings::default()).unwrap();
        session.pointer_down(at(64.0, 64.0)).unwrap();
        session.pointer_up(&mut store).unwrap();
        let shape = session.shape().clone();
        let mask = store.get(id).unwrap().mask.clone();

        // far outside the clipper's coordinate range
        session.pointer_down(at(1e13, 64.0)).unwrap();
        assert!(matches!(session.pointer_up(&mut store), Err(RegionError::Mask(_))));
        assert_eq!(session.shape(), &shape);
        assert_eq!(store.get(id).unwrap().mask, mask);
        assert!(!session.is_stroking());
    }
}
