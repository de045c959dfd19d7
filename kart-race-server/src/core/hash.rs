//! State Hashing for Verification
//!
//! Deterministic hashing of race state for:
//! - Replay validation (same inputs must give the same hash)
//! - Client/server drift detection during replication

use sha2::{Sha256, Digest};
use super::coord::{Coord, Vec3};

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for race state.
///
/// Wraps SHA-256 with helpers for simulation types.
/// Floats are hashed by bit pattern, so the order of updates is critical.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for race state.
    pub fn for_race_state() -> Self {
        Self::new(b"KART_RACE_STATE_V1")
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an i32 value (little-endian).
    #[inline]
    pub fn update_i32(&mut self, value: i32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an f32 bit pattern.
    #[inline]
    pub fn update_f32(&mut self, value: f32) {
        self.hasher.update(value.to_bits().to_le_bytes());
    }

    /// Update with a Vec3.
    #[inline]
    pub fn update_vec3(&mut self, value: Vec3) {
        self.update_f32(value.x);
        self.update_f32(value.y);
        self.update_f32(value.z);
    }

    /// Update with a Coord (translation then rotation).
    #[inline]
    pub fn update_coord(&mut self, value: &Coord) {
        self.update_vec3(value.xyz);
        self.update_vec3(value.hpr);
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute state hash for race verification.
///
/// The frame counter and seed are always hashed first; the closure adds
/// race-specific data.
pub fn compute_state_hash<F>(frame: u64, race_seed: u64, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_race_state();

    hasher.update_u64(frame);
    hasher.update_u64(race_seed);

    add_state(&mut hasher);

    hasher.finalize()
}
