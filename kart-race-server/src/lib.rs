//! # Kart Race Server
//!
//! Per-kart vehicle dynamics and race-state engine for a multiplayer kart
//! racing game.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     KART RACE SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Deterministic primitives                 │
//! │  ├── coord.rs     - Position/orientation in degrees          │
//! │  ├── rng.rs       - Deterministic Xorshift128+ PRNG          │
//! │  └── hash.rs      - State hashing for verification           │
//! │                                                              │
//! │  game/            - Race simulation                          │
//! │  ├── kart.rs      - Kart state and per-frame update          │
//! │  ├── physics.rs   - Forces, grip-limited slip, steering      │
//! │  ├── collision.rs - Collision braking and crash response     │
//! │  ├── interaction.rs - Kart contacts and pickups              │
//! │  ├── progress.rs  - Track coordinates, laps, rescue          │
//! │  ├── boost.rs     - Zipper and magnet                        │
//! │  ├── skid.rs      - Skid trail state machines                │
//! │  ├── track.rs     - Track projection                         │
//! │  └── race.rs      - Race session loop                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! The simulation is deterministic for a given build and platform:
//! - Karts are updated in grid order; no HashMap anywhere
//! - No system time dependencies
//! - All randomness from per-kart seeded Xorshift128+ streams
//!
//! Replaying recorded controls at the fixed frame step reproduces the
//! state hash of the live race.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use crate::core::coord::{Coord, Vec3};
pub use crate::core::rng::DeterministicRng;
pub use crate::game::config::{KartProperties, PhysicsParameters, RaceConfig, FRAME_RATE};
pub use crate::game::input::{ControlFrame, KartControls};
pub use crate::game::kart::KartState;
pub use crate::game::race::{Race, RacePhase};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
