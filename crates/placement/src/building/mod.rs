mod placing;
mod removing;

use thiserror::Error;

use crate::collab::{ObjectLifecycle, PreviewFeedback, Ray, SpatialQuery};
use crate::config::PlacementConfig;
use crate::grid::{LayerKind, LayeredGrid, ObjectId, OccupancyError};
use crate::math::{Cell, Vec3};
use crate::removal::RemovalError;

pub use placing::PlacingState;
pub use removing::{RemovalPhase, RemovingState};

/// Collaborators for one building-state call, resolved once by the caller.
pub struct BuildContext<'a> {
    pub grid: &'a mut LayeredGrid,
    pub lifecycle: &'a mut dyn ObjectLifecycle,
    pub spatial: &'a dyn SpatialQuery,
    pub preview: &'a mut dyn PreviewFeedback,
    pub agent_position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NoHit,
    OutOfRange,
    NothingToRemove,
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Placed {
        layer: LayerKind,
        cell: Cell,
        object: ObjectId,
    },
    Removed {
        layer: LayerKind,
        cell: Cell,
        object: ObjectId,
    },
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("removal failed: {0}")]
    Removal(#[from] RemovalError),
    #[error("placement failed: {0}")]
    Placement(#[from] OccupancyError),
}

pub trait BuildingState {
    fn on_action(
        &mut self,
        cell: Cell,
        pointer: Ray,
        ctx: &mut BuildContext<'_>,
    ) -> Result<ActionOutcome, BuildError>;
    fn update_state(&mut self, cell: Cell, ctx: &mut BuildContext<'_>);
    fn end_state(&mut self, ctx: &mut BuildContext<'_>);
}

/// Grid cell under the pointer, cast with the same distance and mask the
/// removal state uses. `None` when the ray hits nothing.
pub fn cell_under_pointer(
    spatial: &dyn SpatialQuery,
    pointer: Ray,
    config: &PlacementConfig,
) -> Option<Cell> {
    spatial
        .cast_ray(pointer, config.ray_max_distance, config.placement_mask)
        .map(|hit| spatial.world_to_cell(hit))
}
