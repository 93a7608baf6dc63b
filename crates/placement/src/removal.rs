use thiserror::Error;
use tracing::{debug, info};

use crate::collab::ObjectLifecycle;
use crate::grid::{LayerKind, LayeredGrid, ObjectId, OccupancyError};
use crate::math::{Cell, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRemoval {
    pub layer: LayerKind,
    pub cell: Cell,
    pub object: ObjectId,
}

/// `None` is the ordinary "nothing to remove" outcome.
pub type RemovalCandidate = Option<ResolvedRemoval>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RemovalError {
    #[error("cannot commit an empty removal candidate")]
    InvalidCandidate,
    #[error(transparent)]
    Occupancy(#[from] OccupancyError),
}

/// Equality counts as out of range. Non-finite distances never pass.
pub fn within_removal_range(ref_position: Vec3, hit_point: Vec3, max_range: f32) -> bool {
    let distance = ref_position.distance(hit_point);
    distance.is_finite() && distance < max_range
}

pub struct RemovalResolver<'a, L: ObjectLifecycle + ?Sized> {
    grid: &'a mut LayeredGrid,
    lifecycle: &'a mut L,
    last_resolved: Option<ObjectId>,
}

impl<'a, L: ObjectLifecycle + ?Sized> RemovalResolver<'a, L> {
    pub fn new(grid: &'a mut LayeredGrid, lifecycle: &'a mut L) -> Self {
        Self {
            grid,
            lifecycle,
            last_resolved: None,
        }
    }

    pub fn grid(&self) -> &LayeredGrid {
        &*self.grid
    }

    pub fn last_resolved(&self) -> Option<ObjectId> {
        self.last_resolved
    }

    pub fn try_resolve_removal(
        &mut self,
        target_cell: Cell,
        hit_point: Vec3,
        ref_position: Vec3,
        max_range: f32,
    ) -> RemovalCandidate {
        self.last_resolved = None;
        if !within_removal_range(ref_position, hit_point, max_range) {
            debug!(
                cell = %target_cell,
                distance = ref_position.distance(hit_point),
                max_range,
                "removal_out_of_range"
            );
            return None;
        }

        let layer = self.grid.find_occupied_layer(target_cell)?;
        let object = self.grid.layer(layer).object_id(target_cell)?;
        self.last_resolved = Some(object);
        debug!(
            cell = %target_cell,
            layer = layer.as_token(),
            object = object.0,
            "removal_resolved"
        );
        Some(ResolvedRemoval {
            layer,
            cell: target_cell,
            object,
        })
    }

    /// Clears the candidate's layer entry and releases the removed handle.
    pub fn commit_removal(&mut self, candidate: RemovalCandidate) -> Result<ObjectId, RemovalError> {
        let resolved = candidate.ok_or(RemovalError::InvalidCandidate)?;
        let removed = self.grid.layer_mut(resolved.layer).remove(resolved.cell)?;
        self.lifecycle.release_object(removed);
        self.last_resolved = None;
        info!(
            cell = %resolved.cell,
            layer = resolved.layer.as_token(),
            object = removed.0,
            "object_removed"
        );
        Ok(removed)
    }
}
