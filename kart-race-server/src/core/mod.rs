//! Core deterministic primitives.
//!
//! Vector math, per-kart random streams and state hashing shared by the
//! race simulation.

pub mod coord;
pub mod rng;
pub mod hash;

// Re-export core types
pub use coord::{Coord, Vec3};
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash, StateHasher};
