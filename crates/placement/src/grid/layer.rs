use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

/// Rectangle of cells an object covers, laid out along +x (width) and +z (depth)
/// from its origin cell. Extents are always in `1..=MAX_EXTENT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "FootprintExtents")]
pub struct Footprint {
    width: u32,
    depth: u32,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FootprintExtents {
    width: u32,
    depth: u32,
}

impl TryFrom<FootprintExtents> for Footprint {
    type Error = OccupancyError;

    fn try_from(extents: FootprintExtents) -> Result<Self, Self::Error> {
        Footprint::new(extents.width, extents.depth)
    }
}

impl Footprint {
    pub const UNIT: Footprint = Footprint { width: 1, depth: 1 };
    pub const MAX_EXTENT: u32 = 64;

    /// Zero extents are bumped to one cell; anything above `MAX_EXTENT` is rejected.
    pub fn new(width: u32, depth: u32) -> Result<Self, OccupancyError> {
        if width > Self::MAX_EXTENT || depth > Self::MAX_EXTENT {
            return Err(OccupancyError::FootprintTooLarge { width, depth });
        }
        Ok(Self {
            width: width.max(1),
            depth: depth.max(1),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.depth as usize
    }

    /// Every covered cell, or `OutOfBounds` when the rectangle runs past the
    /// edge of the coordinate range.
    pub fn cells(self, origin: Cell) -> Result<Vec<Cell>, OccupancyError> {
        let out_of_bounds = OccupancyError::OutOfBounds {
            origin,
            width: self.width,
            depth: self.depth,
        };
        let width = i32::try_from(self.width).map_err(|_| out_of_bounds)?;
        let depth = i32::try_from(self.depth).map_err(|_| out_of_bounds)?;
        (0..width)
            .flat_map(|dx| (0..depth).map(move |dz| (dx, dz)))
            .map(|(dx, dz)| origin.checked_offset(dx, dz).ok_or(out_of_bounds))
            .collect()
    }
}

impl Default for Footprint {
    fn default() -> Self {
        Self::UNIT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementEntry {
    pub object: ObjectId,
    pub origin: Cell,
    pub footprint: Footprint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OccupancyError {
    #[error("cell {cell} is already occupied by object {existing:?}")]
    AlreadyOccupied { cell: Cell, existing: ObjectId },
    #[error("cell {cell} is not occupied")]
    NotOccupied { cell: Cell },
    #[error(
        "footprint {width}x{depth} exceeds the {max}x{max} limit",
        max = Footprint::MAX_EXTENT
    )]
    FootprintTooLarge { width: u32, depth: u32 },
    #[error("footprint {width}x{depth} at {origin} runs past the grid edge")]
    OutOfBounds { origin: Cell, width: u32, depth: u32 },
}

/// Occupancy map for one category of placed object. Each cell of a footprint
/// points at the same entry, so removing through any covered cell clears the
/// whole object.
#[derive(Debug, Clone, Default)]
pub struct OccupancyLayer {
    cells: HashMap<Cell, PlacementEntry>,
    object_count: usize,
}

impl OccupancyLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.cells.contains_key(&cell)
    }

    pub fn object_id(&self, cell: Cell) -> Option<ObjectId> {
        self.cells.get(&cell).map(|entry| entry.object)
    }

    pub fn entry(&self, cell: Cell) -> Option<&PlacementEntry> {
        self.cells.get(&cell)
    }

    /// False when any covered cell is taken or the footprint leaves the grid.
    pub fn can_place(&self, origin: Cell, footprint: Footprint) -> bool {
        footprint
            .cells(origin)
            .is_ok_and(|cells| cells.iter().all(|cell| !self.is_occupied(*cell)))
    }

    pub fn place(&mut self, cell: Cell, object: ObjectId) -> Result<(), OccupancyError> {
        self.place_footprint(cell, Footprint::UNIT, object)
    }

    pub fn place_footprint(
        &mut self,
        origin: Cell,
        footprint: Footprint,
        object: ObjectId,
    ) -> Result<(), OccupancyError> {
        let covered = footprint.cells(origin)?;
        if let Some((cell, entry)) = covered
            .iter()
            .find_map(|cell| self.cells.get(cell).map(|entry| (*cell, entry)))
        {
            return Err(OccupancyError::AlreadyOccupied {
                cell,
                existing: entry.object,
            });
        }

        let entry = PlacementEntry {
            object,
            origin,
            footprint,
        };
        self.cells.reserve(covered.len());
        for cell in covered {
            self.cells.insert(cell, entry);
        }
        self.object_count += 1;
        Ok(())
    }

    pub fn remove(&mut self, cell: Cell) -> Result<ObjectId, OccupancyError> {
        let entry = self
            .cells
            .get(&cell)
            .copied()
            .ok_or(OccupancyError::NotOccupied { cell })?;
        // Placement already proved the footprint fits at its origin.
        let covered = entry
            .footprint
            .cells(entry.origin)
            .unwrap_or_else(|_| vec![cell]);
        for covered in covered {
            self.cells.remove(&covered);
        }
        self.object_count = self.object_count.saturating_sub(1);
        Ok(entry.object)
    }

    /// Number of distinct objects, not covered cells.
    pub fn len(&self) -> usize {
        self.object_count
    }

    pub fn is_empty(&self) -> bool {
        self.object_count == 0
    }

    pub fn occupied_cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.object_count = 0;
    }
}
