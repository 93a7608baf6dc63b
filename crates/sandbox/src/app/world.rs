use placement::{
    Cell, CellGrid, Footprint, LayerMask, ObjectId, ObjectLifecycle, PreviewFeedback, Ray,
    SpatialQuery, Vec3,
};
use serde::Serialize;
use tracing::{debug, warn};

use super::script::Occluder;

pub(crate) const GROUND_MASK: LayerMask = LayerMask::bit(0);
pub(crate) const OCCLUDER_MASK: LayerMask = LayerMask::bit(1);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct PlacedVisual {
    pub(crate) key: String,
    pub(crate) position: Vec3,
}

/// Handle-indexed visuals. Released slots stay empty so handles are never reused.
#[derive(Debug, Default)]
pub(crate) struct ObjectPlacer {
    objects: Vec<Option<PlacedVisual>>,
}

impl ObjectPlacer {
    pub(crate) fn live_count(&self) -> usize {
        self.objects.iter().filter(|slot| slot.is_some()).count()
    }

    pub(crate) fn live_objects(&self) -> impl Iterator<Item = (ObjectId, &PlacedVisual)> + '_ {
        self.objects
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|visual| (ObjectId(index as u64), visual)))
    }
}

impl ObjectLifecycle for ObjectPlacer {
    fn spawn_object(&mut self, key: &str, position: Vec3) -> ObjectId {
        let id = ObjectId(self.objects.len() as u64);
        self.objects.push(Some(PlacedVisual {
            key: key.to_string(),
            position,
        }));
        id
    }

    fn release_object(&mut self, id: ObjectId) {
        match self.objects.get_mut(id.0 as usize) {
            Some(slot @ Some(_)) => *slot = None,
            _ => warn!(object = id.0, "release_unknown_object"),
        }
    }
}

/// Flat ground at y = 0 on `GROUND_MASK` and sphere occluders on
/// `OCCLUDER_MASK`. Hit points on occluders are the closest approach of the ray.
#[derive(Debug, Default)]
pub(crate) struct FlatGround {
    grid: CellGrid,
    occluders: Vec<Occluder>,
}

impl FlatGround {
    pub(crate) fn new(grid: CellGrid, occluders: Vec<Occluder>) -> Self {
        Self { grid, occluders }
    }

    pub(crate) fn grid(&self) -> &CellGrid {
        &self.grid
    }
}

impl SpatialQuery for FlatGround {
    fn cast_ray(&self, ray: Ray, max_distance: f32, mask: LayerMask) -> Option<Vec3> {
        let mut nearest: Option<f32> = None;
        let mut consider = |distance: f32| {
            if (0.0..=max_distance).contains(&distance) {
                nearest = Some(nearest.map_or(distance, |current| current.min(distance)));
            }
        };

        if GROUND_MASK.intersects(mask) && ray.direction.y < 0.0 {
            consider(-ray.origin.y / ray.direction.y);
        }
        if OCCLUDER_MASK.intersects(mask) {
            for occluder in &self.occluders {
                let along = (occluder.center - ray.origin).dot(ray.direction);
                if ray.point_at(along).distance(occluder.center) <= occluder.radius {
                    consider(along);
                }
            }
        }
        nearest.map(|distance| ray.point_at(distance))
    }

    fn world_to_cell(&self, world: Vec3) -> Cell {
        self.grid.world_to_cell(world)
    }

    fn cell_to_world(&self, cell: Cell) -> Vec3 {
        self.grid.cell_to_world(cell)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PreviewMode {
    Hidden,
    Removal,
    Placement,
}

#[derive(Debug)]
pub(crate) struct LoggingPreview {
    mode: PreviewMode,
    last: Option<(Vec3, bool)>,
}

impl Default for LoggingPreview {
    fn default() -> Self {
        Self {
            mode: PreviewMode::Hidden,
            last: None,
        }
    }
}

#[cfg(test)]
impl LoggingPreview {
    pub(crate) fn mode(&self) -> PreviewMode {
        self.mode
    }

    pub(crate) fn last(&self) -> Option<(Vec3, bool)> {
        self.last
    }
}

impl PreviewFeedback for LoggingPreview {
    fn start_removal_preview(&mut self) {
        self.mode = PreviewMode::Removal;
        debug!("preview_removal_started");
    }

    fn start_placement_preview(&mut self, footprint: Footprint) {
        self.mode = PreviewMode::Placement;
        debug!(
            width = footprint.width(),
            depth = footprint.depth(),
            "preview_placement_started"
        );
    }

    fn stop_preview(&mut self) {
        self.mode = PreviewMode::Hidden;
        self.last = None;
        debug!("preview_stopped");
    }

    fn update_position(&mut self, world: Vec3, valid: bool) {
        self.last = Some((world, valid));
        debug!(x = world.x, y = world.y, z = world.z, valid, "preview_moved");
    }
}
