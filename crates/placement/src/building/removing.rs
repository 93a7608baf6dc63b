use tracing::{debug, error};

use super::{ActionOutcome, BuildContext, BuildError, BuildingState, RejectReason};
use crate::collab::{LayerMask, PreviewFeedback, Ray};
use crate::config::PlacementConfig;
use crate::math::Cell;
use crate::removal::{within_removal_range, RemovalResolver};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RemovalPhase {
    #[default]
    Idle,
    Resolving,
    Committed,
    Rejected,
}

#[derive(Debug)]
pub struct RemovingState {
    removal_range: f32,
    ray_max_distance: f32,
    placement_mask: LayerMask,
    phase: RemovalPhase,
}

impl RemovingState {
    pub fn begin(config: &PlacementConfig, preview: &mut dyn PreviewFeedback) -> Self {
        preview.start_removal_preview();
        Self {
            removal_range: config.removal_range,
            ray_max_distance: config.ray_max_distance,
            placement_mask: config.placement_mask,
            phase: RemovalPhase::Idle,
        }
    }

    pub fn phase(&self) -> RemovalPhase {
        self.phase
    }

    fn refresh_preview(cell: Cell, ctx: &mut BuildContext<'_>) {
        let valid = !ctx.grid.can_place_at(cell);
        let world = ctx.spatial.cell_to_world(cell);
        ctx.preview.update_position(world, valid);
    }

    fn resolve_and_commit(
        &mut self,
        cell: Cell,
        pointer: Ray,
        ctx: &mut BuildContext<'_>,
    ) -> Result<ActionOutcome, BuildError> {
        let Some(hit_point) = ctx
            .spatial
            .cast_ray(pointer, self.ray_max_distance, self.placement_mask)
        else {
            debug!(cell = %cell, "removal_ray_missed");
            return Ok(ActionOutcome::Rejected(RejectReason::NoHit));
        };

        let mut resolver = RemovalResolver::new(&mut *ctx.grid, &mut *ctx.lifecycle);
        let candidate = resolver.try_resolve_removal(
            cell,
            hit_point,
            ctx.agent_position,
            self.removal_range,
        );
        let Some(resolved) = candidate else {
            let reason =
                if within_removal_range(ctx.agent_position, hit_point, self.removal_range) {
                    RejectReason::NothingToRemove
                } else {
                    RejectReason::OutOfRange
                };
            return Ok(ActionOutcome::Rejected(reason));
        };

        let object = resolver.commit_removal(candidate)?;
        Ok(ActionOutcome::Removed {
            layer: resolved.layer,
            cell,
            object,
        })
    }
}

impl BuildingState for RemovingState {
    fn on_action(
        &mut self,
        cell: Cell,
        pointer: Ray,
        ctx: &mut BuildContext<'_>,
    ) -> Result<ActionOutcome, BuildError> {
        self.phase = RemovalPhase::Resolving;
        let result = self.resolve_and_commit(cell, pointer, ctx);
        self.phase = match &result {
            Ok(ActionOutcome::Removed { .. }) => RemovalPhase::Committed,
            Ok(_) => RemovalPhase::Rejected,
            Err(err) => {
                error!(cell = %cell, error = %err, "removal_failed");
                RemovalPhase::Rejected
            }
        };
        Self::refresh_preview(cell, ctx);
        result
    }

    fn update_state(&mut self, cell: Cell, ctx: &mut BuildContext<'_>) {
        self.phase = RemovalPhase::Idle;
        Self::refresh_preview(cell, ctx);
    }

    fn end_state(&mut self, ctx: &mut BuildContext<'_>) {
        self.phase = RemovalPhase::Idle;
        ctx.preview.stop_preview();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::test_support::{
        PlaneWorld, PreviewEvent, RecordingLifecycle, RecordingPreview,
    };
    use crate::grid::{LayerKind, LayeredGrid, ObjectId};
    use crate::math::Vec3;

    struct Fixture {
        grid: LayeredGrid,
        lifecycle: RecordingLifecycle,
        world: PlaneWorld,
        preview: RecordingPreview,
    }

    impl Fixture {
        fn new() -> Self {
            let mut grid = LayeredGrid::new();
            grid.layer_mut(LayerKind::Furniture)
                .place(Cell::new(2, 0, 3), ObjectId(7))
                .expect("furniture");
            Self {
                grid,
                lifecycle: RecordingLifecycle::default(),
                world: PlaneWorld {
                    ground_mask: Some(LayerMask::bit(0)),
                    ..PlaneWorld::default()
                },
                preview: RecordingPreview::default(),
            }
        }

        fn ctx(&mut self, agent_position: Vec3) -> BuildContext<'_> {
            BuildContext {
                grid: &mut self.grid,
                lifecycle: &mut self.lifecycle,
                spatial: &self.world,
                preview: &mut self.preview,
                agent_position,
            }
        }
    }

    fn straight_down_at(x: f32, z: f32) -> Ray {
        Ray::new(Vec3::new(x, 10.0, z), Vec3::new(0.0, -1.0, 0.0))
    }

    #[test]
    fn begin_starts_the_removal_preview() {
        let mut preview = RecordingPreview::default();
        let state = RemovingState::begin(&PlacementConfig::default(), &mut preview);
        assert_eq!(state.phase(), RemovalPhase::Idle);
        assert_eq!(preview.events, vec![PreviewEvent::StartRemoval]);
    }

    #[test]
    fn action_near_agent_removes_furniture_and_refreshes_preview() {
        let mut fixture = Fixture::new();
        let mut state = RemovingState::begin(&PlacementConfig::default(), &mut fixture.preview);
        let cell = Cell::new(2, 0, 3);

        let outcome = {
            let mut ctx = fixture.ctx(Vec3::new(2.0, 0.0, 1.0));
            state
                .on_action(cell, straight_down_at(2.0, 3.0), &mut ctx)
                .expect("action")
        };

        assert_eq!(
            outcome,
            ActionOutcome::Removed {
                layer: LayerKind::Furniture,
                cell,
                object: ObjectId(7),
            }
        );
        assert_eq!(state.phase(), RemovalPhase::Committed);
        assert_eq!(fixture.lifecycle.released, vec![ObjectId(7)]);
        assert!(fixture.grid.can_place_at(cell));
        assert_eq!(
            fixture.preview.events.last(),
            Some(&PreviewEvent::Update {
                world: Vec3::new(2.0, 0.0, 3.0),
                valid: false,
            })
        );
    }

    #[test]
    fn action_far_from_agent_is_rejected() {
        let mut fixture = Fixture::new();
        let mut state = RemovingState::begin(&PlacementConfig::default(), &mut fixture.preview);
        let cell = Cell::new(2, 0, 3);

        let outcome = {
            let mut ctx = fixture.ctx(Vec3::new(2.0, 0.0, 10.0));
            state
                .on_action(cell, straight_down_at(2.0, 3.0), &mut ctx)
                .expect("action")
        };

        assert_eq!(outcome, ActionOutcome::Rejected(RejectReason::OutOfRange));
        assert_eq!(state.phase(), RemovalPhase::Rejected);
        assert!(fixture.lifecycle.released.is_empty());
        assert_eq!(
            fixture.preview.events.last(),
            Some(&PreviewEvent::Update {
                world: Vec3::new(2.0, 0.0, 3.0),
                valid: true,
            })
        );
    }

    #[test]
    fn ray_miss_never_removes() {
        let mut fixture = Fixture::new();
        fixture.world.ground_mask = None;
        let mut state = RemovingState::begin(&PlacementConfig::default(), &mut fixture.preview);

        let outcome = {
            let mut ctx = fixture.ctx(Vec3::ZERO);
            state
                .on_action(Cell::new(2, 0, 3), straight_down_at(0.0, 0.0), &mut ctx)
                .expect("action")
        };
        assert_eq!(outcome, ActionOutcome::Rejected(RejectReason::NoHit));
        assert!(fixture.lifecycle.released.is_empty());
    }

    #[test]
    fn empty_cell_in_range_reports_nothing_to_remove() {
        let mut fixture = Fixture::new();
        let mut state = RemovingState::begin(&PlacementConfig::default(), &mut fixture.preview);

        let outcome = {
            let mut ctx = fixture.ctx(Vec3::ZERO);
            state
                .on_action(Cell::new(0, 0, 0), straight_down_at(0.5, 0.5), &mut ctx)
                .expect("action")
        };
        assert_eq!(
            outcome,
            ActionOutcome::Rejected(RejectReason::NothingToRemove)
        );
    }

    #[test]
    fn update_returns_to_idle_and_end_stops_preview() {
        let mut fixture = Fixture::new();
        let mut state = RemovingState::begin(&PlacementConfig::default(), &mut fixture.preview);
        {
            let mut ctx = fixture.ctx(Vec3::new(2.0, 0.0, 2.0));
            state
                .on_action(Cell::new(2, 0, 3), straight_down_at(2.0, 3.0), &mut ctx)
                .expect("action");
            assert_eq!(state.phase(), RemovalPhase::Committed);
            state.update_state(Cell::new(2, 0, 3), &mut ctx);
            assert_eq!(state.phase(), RemovalPhase::Idle);
            state.end_state(&mut ctx);
        }
        assert_eq!(fixture.preview.events.last(), Some(&PreviewEvent::Stop));
    }
}
