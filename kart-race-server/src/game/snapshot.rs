//! Snapshots
//!
//! Replicated kart and race state in compact binary form (bincode).
//! A client applies a `KartSnapshot` onto its local kart; everything not
//! listed here is derived locally.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::coord::Coord;
use crate::game::attachment::Attachment;
use crate::game::collectable::Collectable;
use crate::game::kart::KartState;
use crate::game::race::RacePhase;
use crate::game::track::TrackCoords;

/// Snapshot encode/decode failure.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// bincode failure
    #[error("snapshot encoding failed: {0}")]
    Encoding(#[from] bincode::Error),

    /// Snapshot is for a different grid
    #[error("snapshot has {got} karts, race has {expected}")]
    GridMismatch {
        /// Karts in the race
        expected: usize,
        /// Karts in the snapshot
        got: usize,
    },
}

/// Replicated state of one kart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KartSnapshot {
    /// Grid index
    pub grid_position: usize,
    /// World position
    pub position: Coord,
    /// Kart-space velocity
    pub velocity: Coord,
    /// Pitch offset
    pub wheelie_angle: f32,
    /// Skid flag
    pub skidding: bool,
    /// Longitudinal acceleration of the previous frame (feeds the grip limit)
    pub prev_accel: f32,
    /// Cached track segment
    pub track_hint: usize,
    /// Track coordinates this frame
    pub curr_track_coords: TrackCoords,
    /// Track coordinates last frame
    pub last_track_coords: TrackCoords,
    /// Lap counter
    pub race_lap: i32,
    /// Standing
    pub race_position: usize,
    /// Consumables held
    pub num_pickups_gobbled: u32,
    /// Zipper time left
    pub zipper_time_left: f32,
    /// Magnet time left
    pub magnet_time_left: f32,
    /// Magnet lock
    pub magnet_target: Option<usize>,
    /// Fire held last frame
    pub fire_held: bool,
    /// Effect slot
    pub attachment: Attachment,
    /// Ammunition slot
    pub collectable: Collectable,
}

impl KartSnapshot {
    /// Capture a kart.
    pub fn capture(kart: &KartState) -> Self {
        Self {
            grid_position: kart.grid_position,
            position: kart.position,
            velocity: kart.velocity,
            wheelie_angle: kart.wheelie_angle,
            skidding: kart.skidding,
            prev_accel: kart.prev_accel,
            track_hint: kart.track_hint,
            curr_track_coords: kart.curr_track_coords,
            last_track_coords: kart.last_track_coords,
            race_lap: kart.race_lap,
            race_position: kart.race_position,
            num_pickups_gobbled: kart.num_pickups_gobbled,
            zipper_time_left: kart.zipper_time_left,
            magnet_time_left: kart.magnet_time_left,
            magnet_target: kart.magnet_target,
            fire_held: kart.fire_held,
            attachment: kart.attachment,
            collectable: kart.collectable,
        }
    }

    /// Overwrite the replicated fields of `kart`.
    pub fn apply(&self, kart: &mut KartState) {
        kart.position = self.position;
        kart.velocity = self.velocity;
        kart.wheelie_angle = self.wheelie_angle;
        kart.skidding = self.skidding;
        kart.prev_accel = self.prev_accel;
        kart.track_hint = self.track_hint;
        kart.curr_track_coords = self.curr_track_coords;
        kart.last_track_coords = self.last_track_coords;
        kart.race_lap = self.race_lap;
        kart.race_position = self.race_position;
        kart.num_pickups_gobbled = self.num_pickups_gobbled;
        kart.zipper_time_left = self.zipper_time_left;
        kart.magnet_time_left = self.magnet_time_left;
        kart.magnet_target = self.magnet_target;
        kart.fire_held = self.fire_held;
        kart.attachment = self.attachment;
        kart.collectable = self.collectable;
    }

    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bincode.
    pub fn from_bytes(data: &[u8]) -> Result<Self, SnapshotError> {
        Ok(bincode::deserialize(data)?)
    }
}

/// Replicated state of a whole race at one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RaceSnapshot {
    /// Frame number
    pub frame: u64,
    /// Race phase
    pub phase: RacePhase,
    /// Karts in grid order
    pub karts: Vec<KartSnapshot>,
}

impl RaceSnapshot {
    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bincode.
    pub fn from_bytes(data: &[u8]) -> Result<Self, SnapshotError> {
        Ok(bincode::deserialize(data)?)
    }
}
