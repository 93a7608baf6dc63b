use placement::{
    cell_under_pointer, ActionOutcome, BuildContext, BuildingState, Cell, Footprint, LayerKind,
    LayeredGrid, MachineId, MachineRegistry, MoneyGrabber, MoneyHolder, PlacementConfig,
    PlacingState, Ray, RejectReason, RemovingState, SeatFinder, SeatId, Vec3, Wallet,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::script::{SessionScript, Step};
use super::world::{FlatGround, LoggingPreview, ObjectPlacer, PlacedVisual};
use super::SandboxError;

const POINTER_HEIGHT: f32 = 10.0;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tool {
    Removing,
    Placing {
        key: String,
        layer: LayerKind,
        footprint: Footprint,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub(crate) struct SessionReport {
    pub(crate) placed: u32,
    pub(crate) removed: u32,
    pub(crate) rejected_no_hit: u32,
    pub(crate) rejected_out_of_range: u32,
    pub(crate) rejected_nothing_to_remove: u32,
    pub(crate) rejected_blocked: u32,
    pub(crate) money_grabbed: u64,
    pub(crate) wallet_balance: u64,
    pub(crate) seats_taken: Vec<SeatId>,
    pub(crate) seat_misses: u32,
    pub(crate) objects_by_layer: Vec<(LayerKind, usize)>,
    pub(crate) live_objects: Vec<ReportedObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ReportedObject {
    pub(crate) id: u64,
    #[serde(flatten)]
    pub(crate) visual: PlacedVisual,
}

pub(crate) struct Session {
    config: PlacementConfig,
    grid: LayeredGrid,
    placer: ObjectPlacer,
    world: FlatGround,
    preview: LoggingPreview,
    agent: Vec3,
    active: Option<(Tool, Box<dyn BuildingState>)>,
    machines: MachineRegistry,
    wallet: Wallet,
    grabber: MoneyGrabber,
    seats: SeatFinder,
    rng: StdRng,
    report: SessionReport,
}

impl Session {
    pub(crate) fn new(config: PlacementConfig, script: &SessionScript) -> Self {
        let world = FlatGround::new(config.cell_grid(), script.occluders.clone());
        let seats = SeatFinder::from_config(&config);
        Self {
            config,
            grid: LayeredGrid::new(),
            placer: ObjectPlacer::default(),
            world,
            preview: LoggingPreview::default(),
            agent: script.agent,
            active: None,
            machines: MachineRegistry::new(),
            wallet: Wallet::default(),
            grabber: MoneyGrabber::new(),
            seats,
            rng: StdRng::seed_from_u64(script.seed),
            report: SessionReport::default(),
        }
    }

    pub(crate) fn run(
        config: PlacementConfig,
        script: &SessionScript,
    ) -> Result<SessionReport, SandboxError> {
        let mut session = Self::new(config, script);
        for (index, step) in script.steps.iter().enumerate() {
            session.apply(index, step)?;
        }
        session.end_tool();
        Ok(session.finish())
    }

    #[cfg(test)]
    pub(crate) fn grid(&self) -> &LayeredGrid {
        &self.grid
    }

    #[cfg(test)]
    pub(crate) fn preview(&self) -> &LoggingPreview {
        &self.preview
    }

    pub(crate) fn apply(&mut self, index: usize, step: &Step) -> Result<(), SandboxError> {
        debug!(step = index, ?step, "step");
        match step {
            Step::MoveAgent { to } => self.agent = *to,
            Step::Place {
                key,
                layer,
                cell,
                footprint,
            } => {
                self.activate(Tool::Placing {
                    key: key.clone(),
                    layer: *layer,
                    footprint: *footprint,
                });
                let pointer = self.pointer_above(*cell);
                self.act(index, *cell, pointer)?;
            }
            Step::Remove { cell, pointer } => {
                self.activate(Tool::Removing);
                let pointer = pointer
                    .map(|ray| Ray::new(ray.origin, ray.direction))
                    .unwrap_or_else(|| self.pointer_above(*cell));
                let target =
                    cell_under_pointer(&self.world, pointer, &self.config).unwrap_or(*cell);
                if target != *cell {
                    debug!(step = index, named = %cell, hit = %target, "removal_retargeted");
                }
                self.act(index, target, pointer)?;
            }
            Step::Hover { cell } => self.hover(*cell),
            Step::EndTool => self.end_tool(),
            Step::AddMachine { machine } => {
                self.machines.insert(*machine, MoneyHolder::default());
            }
            Step::Deposit { machine, amount } => {
                self.holder_mut(index, *machine)?.deposit(*amount);
            }
            Step::ApproachMachine { machine } => {
                let holder = self
                    .machines
                    .get(*machine)
                    .ok_or(SandboxError::UnknownMachine {
                        step: index,
                        machine: machine.0,
                    })?;
                self.grabber.observe(*machine, holder);
            }
            Step::LeaveMachine { machine } => self.grabber.leave(*machine),
            Step::GrabMoney => {
                let grabbed = self
                    .grabber
                    .grab(&mut self.machines, &mut self.wallet)
                    .map_err(|source| SandboxError::Wallet {
                        step: index,
                        source,
                    })?;
                if let Some(amount) = grabbed {
                    self.report.money_grabbed += amount;
                }
            }
            Step::AddSeat { seat } => self.seats.enter(*seat),
            Step::TakeSeat { anchor } => {
                match self.seats.take_seat(*anchor, &self.world, &mut self.rng) {
                    Some(seat) => self.report.seats_taken.push(seat),
                    None => self.report.seat_misses += 1,
                }
            }
            Step::ReleaseSeat { seat } => {
                if !self.seats.release_seat(*seat) {
                    warn!(step = index, seat = seat.0, "seat_not_taken");
                }
            }
        }
        Ok(())
    }

    fn holder_mut(
        &mut self,
        index: usize,
        machine: MachineId,
    ) -> Result<&mut MoneyHolder, SandboxError> {
        self.machines
            .get_mut(machine)
            .ok_or(SandboxError::UnknownMachine {
                step: index,
                machine: machine.0,
            })
    }

    fn pointer_above(&self, cell: Cell) -> Ray {
        let target = self.world.grid().cell_center_world(cell);
        Ray::new(
            Vec3::new(target.x, target.y + POINTER_HEIGHT, target.z),
            Vec3::new(0.0, -1.0, 0.0),
        )
    }

    fn activate(&mut self, tool: Tool) {
        if matches!(&self.active, Some((current, _)) if *current == tool) {
            return;
        }
        self.end_tool();
        let state: Box<dyn BuildingState> = match &tool {
            Tool::Removing => Box::new(RemovingState::begin(&self.config, &mut self.preview)),
            Tool::Placing {
                key,
                layer,
                footprint,
            } => Box::new(PlacingState::begin(
                key.clone(),
                *layer,
                *footprint,
                &mut self.preview,
            )),
        };
        self.active = Some((tool, state));
    }

    fn end_tool(&mut self) {
        if let Some((_, mut state)) = self.active.take() {
            let mut ctx = BuildContext {
                grid: &mut self.grid,
                lifecycle: &mut self.placer,
                spatial: &self.world,
                preview: &mut self.preview,
                agent_position: self.agent,
            };
            state.end_state(&mut ctx);
        }
    }

    fn hover(&mut self, cell: Cell) {
        let Some((_, state)) = self.active.as_mut() else {
            return;
        };
        let mut ctx = BuildContext {
            grid: &mut self.grid,
            lifecycle: &mut self.placer,
            spatial: &self.world,
            preview: &mut self.preview,
            agent_position: self.agent,
        };
        state.update_state(cell, &mut ctx);
    }

    fn act(&mut self, index: usize, cell: Cell, pointer: Ray) -> Result<(), SandboxError> {
        let Some((_, state)) = self.active.as_mut() else {
            return Ok(());
        };
        let mut ctx = BuildContext {
            grid: &mut self.grid,
            lifecycle: &mut self.placer,
            spatial: &self.world,
            preview: &mut self.preview,
            agent_position: self.agent,
        };
        let outcome = state
            .on_action(cell, pointer, &mut ctx)
            .map_err(|source| SandboxError::Build {
                step: index,
                source,
            })?;

        match outcome {
            ActionOutcome::Placed { .. } => self.report.placed += 1,
            ActionOutcome::Removed { .. } => self.report.removed += 1,
            ActionOutcome::Rejected(reason) => {
                info!(step = index, cell = %cell, ?reason, "action_rejected");
                match reason {
                    RejectReason::NoHit => self.report.rejected_no_hit += 1,
                    RejectReason::OutOfRange => self.report.rejected_out_of_range += 1,
                    RejectReason::NothingToRemove => {
                        self.report.rejected_nothing_to_remove += 1
                    }
                    RejectReason::Blocked => self.report.rejected_blocked += 1,
                }
            }
        }
        Ok(())
    }

    fn finish(mut self) -> SessionReport {
        self.report.wallet_balance = self.wallet.balance();
        self.report.objects_by_layer = self
            .grid
            .layers()
            .map(|(kind, layer)| (kind, layer.len()))
            .collect();
        self.report.live_objects = self
            .placer
            .live_objects()
            .map(|(id, visual)| ReportedObject {
                id: id.0,
                visual: visual.clone(),
            })
            .collect();
        info!(
            placed = self.report.placed,
            removed = self.report.removed,
            live_objects = self.placer.live_count(),
            wallet = self.report.wallet_balance,
            "session_finished"
        );
        self.report
    }
}
