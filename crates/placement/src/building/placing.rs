use tracing::{info, warn};

use super::{ActionOutcome, BuildContext, BuildError, BuildingState, RejectReason};
use crate::collab::{PreviewFeedback, Ray};
use crate::grid::{Footprint, LayerKind};
use crate::math::Cell;

/// Places one kind of object on its own layer. Other layers are ignored, so
/// furniture can stand on floor tiles.
#[derive(Debug)]
pub struct PlacingState {
    object_key: String,
    layer: LayerKind,
    footprint: Footprint,
}

impl PlacingState {
    pub fn begin(
        object_key: impl Into<String>,
        layer: LayerKind,
        footprint: Footprint,
        preview: &mut dyn PreviewFeedback,
    ) -> Self {
        preview.start_placement_preview(footprint);
        Self {
            object_key: object_key.into(),
            layer,
            footprint,
        }
    }

    pub fn layer(&self) -> LayerKind {
        self.layer
    }

    pub fn footprint(&self) -> Footprint {
        self.footprint
    }

    fn refresh_preview(&self, cell: Cell, ctx: &mut BuildContext<'_>) {
        let valid = ctx
            .grid
            .can_place_footprint(self.layer, cell, self.footprint);
        let world = ctx.spatial.cell_to_world(cell);
        ctx.preview.update_position(world, valid);
    }
}

impl BuildingState for PlacingState {
    fn on_action(
        &mut self,
        cell: Cell,
        _pointer: Ray,
        ctx: &mut BuildContext<'_>,
    ) -> Result<ActionOutcome, BuildError> {
        if !ctx
            .grid
            .can_place_footprint(self.layer, cell, self.footprint)
        {
            self.refresh_preview(cell, ctx);
            return Ok(ActionOutcome::Rejected(RejectReason::Blocked));
        }

        let world = ctx.spatial.cell_to_world(cell);
        let object = ctx.lifecycle.spawn_object(&self.object_key, world);
        if let Err(err) = ctx
            .grid
            .layer_mut(self.layer)
            .place_footprint(cell, self.footprint, object)
        {
            warn!(cell = %cell, error = %err, "placement_rolled_back");
            ctx.lifecycle.release_object(object);
            return Err(err.into());
        }

        info!(
            cell = %cell,
            layer = self.layer.as_token(),
            object = object.0,
            key = %self.object_key,
            "object_placed"
        );
        self.refresh_preview(cell, ctx);
        Ok(ActionOutcome::Placed {
            layer: self.layer,
            cell,
            object,
        })
    }

    fn update_state(&mut self, cell: Cell, ctx: &mut BuildContext<'_>) {
        self.refresh_preview(cell, ctx);
    }

    fn end_state(&mut self, ctx: &mut BuildContext<'_>) {
        ctx.preview.stop_preview();
    }
}
