use serde::{Deserialize, Serialize};

use super::layer::{Footprint, OccupancyLayer};
use crate::math::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Floor,
    Wall,
    WallDecoration,
    Furniture,
}

const LAYER_COUNT: usize = 4;

impl LayerKind {
    /// Scan order for removal. Floor comes first so the most foundational
    /// object at a cell is the one targeted.
    pub const PRIORITY: [LayerKind; LAYER_COUNT] = [
        LayerKind::Floor,
        LayerKind::Wall,
        LayerKind::WallDecoration,
        LayerKind::Furniture,
    ];

    pub const fn index(self) -> usize {
        match self {
            LayerKind::Floor => 0,
            LayerKind::Wall => 1,
            LayerKind::WallDecoration => 2,
            LayerKind::Furniture => 3,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            LayerKind::Floor => "floor",
            LayerKind::Wall => "wall",
            LayerKind::WallDecoration => "wall_decoration",
            LayerKind::Furniture => "furniture",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LayeredGrid {
    layers: [OccupancyLayer; LAYER_COUNT],
}

impl LayeredGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(&self, kind: LayerKind) -> &OccupancyLayer {
        &self.layers[kind.index()]
    }

    pub fn layer_mut(&mut self, kind: LayerKind) -> &mut OccupancyLayer {
        &mut self.layers[kind.index()]
    }

    pub fn layers(&self) -> impl Iterator<Item = (LayerKind, &OccupancyLayer)> + '_ {
        LayerKind::PRIORITY
            .into_iter()
            .map(move |kind| (kind, self.layer(kind)))
    }

    pub fn can_place_at(&self, cell: Cell) -> bool {
        self.layers.iter().all(|layer| !layer.is_occupied(cell))
    }

    pub fn can_place_footprint(&self, kind: LayerKind, origin: Cell, footprint: Footprint) -> bool {
        self.layer(kind).can_place(origin, footprint)
    }

    pub fn find_occupied_layer(&self, cell: Cell) -> Option<LayerKind> {
        self.layers()
            .find(|(_, layer)| layer.is_occupied(cell))
            .map(|(kind, _)| kind)
    }

    pub fn object_count(&self) -> usize {
        self.layers.iter().map(OccupancyLayer::len).sum()
    }

    pub fn clear(&mut self) {
        for layer in &mut self.layers {
            layer.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ObjectId;

    #[test]
    fn priority_matches_index_order() {
        for (position, kind) in LayerKind::PRIORITY.iter().enumerate() {
            assert_eq!(kind.index(), position);
        }
    }

    #[test]
    fn empty_cell_has_no_occupied_layer() {
        let grid = LayeredGrid::new();
        let cell = Cell::new(0, 0, 0);
        assert_eq!(grid.find_occupied_layer(cell), None);
        assert!(grid.can_place_at(cell));
    }

    #[test]
    fn lowest_priority_index_wins_when_several_layers_claim_a_cell() {
        let mut grid = LayeredGrid::new();
        let cell = Cell::new(2, 0, 3);
        grid.layer_mut(LayerKind::Furniture)
            .place(cell, ObjectId(4))
            .expect("furniture");
        assert_eq!(grid.find_occupied_layer(cell), Some(LayerKind::Furniture));

        grid.layer_mut(LayerKind::WallDecoration)
            .place(cell, ObjectId(3))
            .expect("decor");
        assert_eq!(
            grid.find_occupied_layer(cell),
            Some(LayerKind::WallDecoration)
        );

        grid.layer_mut(LayerKind::Wall)
            .place(cell, ObjectId(2))
            .expect("wall");
        assert_eq!(grid.find_occupied_layer(cell), Some(LayerKind::Wall));

        grid.layer_mut(LayerKind::Floor)
            .place(cell, ObjectId(1))
            .expect("floor");
        assert_eq!(grid.find_occupied_layer(cell), Some(LayerKind::Floor));
        assert_eq!(grid.object_count(), 4);
    }

    #[test]
    fn can_place_at_agrees_with_find_occupied_layer() {
        let mut grid = LayeredGrid::new();
        grid.layer_mut(LayerKind::Wall)
            .place(Cell::new(1, 0, 0), ObjectId(1))
            .expect("wall");
        grid.layer_mut(LayerKind::Furniture)
            .place_footprint(
                Cell::new(3, 0, 3),
                Footprint::new(2, 2).expect("footprint"),
                ObjectId(2),
            )
            .expect("table");

        for x in -1..6 {
            for z in -1..6 {
                let cell = Cell::new(x, 0, z);
                assert_eq!(
                    grid.can_place_at(cell),
                    grid.find_occupied_layer(cell).is_none(),
                    "cell {cell}"
                );
            }
        }
    }

    #[test]
    fn footprint_check_is_per_layer() {
        let mut grid = LayeredGrid::new();
        let origin = Cell::new(0, 0, 0);
        grid.layer_mut(LayerKind::Floor)
            .place_footprint(origin, Footprint::new(3, 3).expect("footprint"), ObjectId(1))
            .expect("floor");

        assert!(!grid.can_place_footprint(LayerKind::Floor, origin, Footprint::UNIT));
        let bench = Footprint::new(2, 1).expect("footprint");
        assert!(grid.can_place_footprint(LayerKind::Furniture, origin, bench));

        grid.clear();
        assert_eq!(grid.object_count(), 0);
        assert!(grid.can_place_at(origin));
    }
}
