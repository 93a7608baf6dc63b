//! Layered build grid: per-category occupancy, removal resolution with a
//! distance gate, building states, and the small interactions that sit next
//! to them (money pickup, seat selection).

pub mod building;
pub mod collab;
pub mod config;
pub mod grid;
pub mod interaction;
mod math;
pub mod removal;

pub use building::{
    cell_under_pointer, ActionOutcome, BuildContext, BuildError, BuildingState, PlacingState,
    RejectReason, RemovalPhase, RemovingState,
};
pub use collab::{LayerMask, ObjectLifecycle, PreviewFeedback, Ray, SpatialQuery};
pub use config::{
    load_config, resolve_config_path, ConfigError, PlacementConfig, CONFIG_ENV_VAR,
};
pub use grid::{
    CellGrid, Footprint, LayerKind, LayeredGrid, ObjectId, OccupancyError, OccupancyLayer,
    PlacementEntry,
};
pub use interaction::{
    MachineId, MachineRegistry, MoneyGrabber, MoneyHolder, SeatCandidate, SeatFinder, SeatId,
    Wallet, WalletError,
};
pub use math::{Cell, Vec3};
pub use removal::{
    within_removal_range, RemovalCandidate, RemovalError, RemovalResolver, ResolvedRemoval,
};
