mod layer;
mod layered;
mod transform;

pub use layer::{Footprint, ObjectId, OccupancyError, OccupancyLayer, PlacementEntry};
pub use layered::{LayerKind, LayeredGrid};
pub use transform::CellGrid;
