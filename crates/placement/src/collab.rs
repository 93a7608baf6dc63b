//! Interfaces to the host's spatial queries, object visuals and preview widget.
//! The core never reaches for these through global lookups; callers hand them in.

use serde::{Deserialize, Serialize};

use crate::grid::{Footprint, ObjectId};
use crate::math::{Cell, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    pub const NONE: LayerMask = LayerMask(0);

    /// Single-bit mask. Panics for indices of 32 and above; in a `const`
    /// context that is a compile error.
    pub const fn bit(index: u32) -> Self {
        match Self::checked_bit(index) {
            Some(mask) => mask,
            None => panic!("layer mask bit index out of range"),
        }
    }

    pub const fn checked_bit(index: u32) -> Option<Self> {
        if index < u32::BITS {
            Some(LayerMask(1 << index))
        } else {
            None
        }
    }

    pub const fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalized(),
        }
    }

    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

pub trait SpatialQuery {
    /// First hit point along `ray` within `max_distance` against colliders in `mask`.
    fn cast_ray(&self, ray: Ray, max_distance: f32, mask: LayerMask) -> Option<Vec3>;
    fn world_to_cell(&self, world: Vec3) -> Cell;
    fn cell_to_world(&self, cell: Cell) -> Vec3;
}

pub trait ObjectLifecycle {
    fn spawn_object(&mut self, key: &str, position: Vec3) -> ObjectId;
    fn release_object(&mut self, id: ObjectId);
}

pub trait PreviewFeedback {
    fn start_removal_preview(&mut self);
    fn start_placement_preview(&mut self, footprint: Footprint);
    fn stop_preview(&mut self);
    fn update_position(&mut self, world: Vec3, valid: bool);
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_bits_intersect() {
        let ground = LayerMask::bit(0);
        let walls = LayerMask::bit(3);
        assert!(LayerMask::ALL.intersects(ground));
        assert!(!ground.intersects(walls));
        assert!(!LayerMask::NONE.intersects(LayerMask::ALL));
    }

    #[test]
    fn bit_indices_do_not_wrap() {
        assert_eq!(LayerMask::checked_bit(31), Some(LayerMask(1 << 31)));
        assert_eq!(LayerMask::checked_bit(32), None);
        assert_eq!(LayerMask::checked_bit(33), None);
    }

    #[test]
    #[should_panic(expected = "layer mask bit index out of range")]
    fn bit_panics_past_the_last_index() {
        let index = std::hint::black_box(32);
        let _ = LayerMask::bit(index);
    }

    #[test]
    fn ray_direction_is_normalized() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(ray.point_at(2.0), Vec3::new(0.0, 0.0, 2.0));
    }
}
