use crate::math::{Cell, Vec3};

/// Uniform grid transform.
/// - `origin` is the world position of the min corner of cell (0,0,0).
/// - Cell (x,y,z) spans `origin + cell_size * (x,y,z)` to one cell further on each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellGrid {
    origin: Vec3,
    cell_size: f32,
}

impl Default for CellGrid {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            cell_size: 1.0,
        }
    }
}

impl CellGrid {
    /// Non-positive or non-finite sizes fall back to one world unit per cell.
    pub fn new(origin: Vec3, cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            1.0
        };
        Self { origin, cell_size }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn world_to_cell(&self, world: Vec3) -> Cell {
        let local = world - self.origin;
        Cell {
            x: (local.x / self.cell_size).floor() as i32,
            y: (local.y / self.cell_size).floor() as i32,
            z: (local.z / self.cell_size).floor() as i32,
        }
    }

    pub fn cell_to_world(&self, cell: Cell) -> Vec3 {
        Vec3 {
            x: self.origin.x + cell.x as f32 * self.cell_size,
            y: self.origin.y + cell.y as f32 * self.cell_size,
            z: self.origin.z + cell.z as f32 * self.cell_size,
        }
    }

    pub fn cell_center_world(&self, cell: Cell) -> Vec3 {
        let half = self.cell_size * 0.5;
        self.cell_to_world(cell) + Vec3::new(half, 0.0, half)
    }
}
