use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::collab::{LayerMask, Ray, SpatialQuery};
use crate::config::PlacementConfig;
use crate::math::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeatId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeatCandidate {
    pub id: SeatId,
    pub position: Vec3,
    pub forward: Vec3,
    pub available: bool,
}

/// Seats currently touching one table (the anchor). Seat models face along
/// their negative forward axis, so a seat turned toward the anchor has a
/// forward vector pointing away from it.
#[derive(Debug, Clone)]
pub struct SeatFinder {
    touching: Vec<SeatCandidate>,
    facing_threshold: f32,
    occluder_mask: LayerMask,
}

impl SeatFinder {
    pub fn new(facing_threshold: f32, occluder_mask: LayerMask) -> Self {
        Self {
            touching: Vec::new(),
            facing_threshold,
            occluder_mask,
        }
    }

    pub fn from_config(config: &PlacementConfig) -> Self {
        Self::new(config.seat_facing_threshold, config.seat_occluder_mask)
    }

    pub fn enter(&mut self, seat: SeatCandidate) {
        match self.touching.iter_mut().find(|known| known.id == seat.id) {
            Some(known) => *known = seat,
            None => self.touching.push(seat),
        }
    }

    pub fn exit(&mut self, id: SeatId) -> bool {
        let before = self.touching.len();
        self.touching.retain(|seat| seat.id != id);
        self.touching.len() != before
    }

    pub fn seat(&self, id: SeatId) -> Option<&SeatCandidate> {
        self.touching.iter().find(|seat| seat.id == id)
    }

    pub fn touching(&self) -> &[SeatCandidate] {
        &self.touching
    }

    pub fn valid_seats(&self, anchor: Vec3, spatial: &dyn SpatialQuery) -> Vec<SeatId> {
        self.touching
            .iter()
            .filter(|seat| self.is_valid(seat, anchor, spatial))
            .map(|seat| seat.id)
            .collect()
    }

    fn is_valid(&self, seat: &SeatCandidate, anchor: Vec3, spatial: &dyn SpatialQuery) -> bool {
        if !seat.available {
            return false;
        }

        let to_anchor = (anchor - seat.position).normalized();
        let facing = seat.forward.normalized().dot(to_anchor);
        if facing > self.facing_threshold {
            return false;
        }

        let distance = seat.position.distance(anchor);
        let ray = Ray::new(seat.position, to_anchor);
        if let Some(hit) = spatial.cast_ray(ray, distance, self.occluder_mask) {
            debug!(seat = seat.id.0, hit_x = hit.x, hit_z = hit.z, "seat_occluded");
            return false;
        }
        true
    }

    /// Picks a valid seat uniformly at random and marks it taken.
    pub fn take_seat<R: Rng + ?Sized>(
        &mut self,
        anchor: Vec3,
        spatial: &dyn SpatialQuery,
        rng: &mut R,
    ) -> Option<SeatId> {
        let valid = self.valid_seats(anchor, spatial);
        if valid.is_empty() {
            debug!(touching = self.touching.len(), "no_seat_available");
            return None;
        }
        let chosen = valid[rng.random_range(0..valid.len())];
        if let Some(seat) = self.touching.iter_mut().find(|seat| seat.id == chosen) {
            seat.available = false;
        }
        info!(seat = chosen.0, candidates = valid.len(), "seat_taken");
        Some(chosen)
    }

    pub fn release_seat(&mut self, id: SeatId) -> bool {
        match self.touching.iter_mut().find(|seat| seat.id == id) {
            Some(seat) if !seat.available => {
                seat.available = true;
                true
            }
            _ => false,
        }
    }
}
