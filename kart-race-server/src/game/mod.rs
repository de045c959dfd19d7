//! Race Simulation
//!
//! Per-kart dynamics and race state. Deterministic given identical inputs,
//! frame steps and seed.
//!
//! ## Module Structure
//!
//! - `config`: Kart properties, physics tuning, fixed constants
//! - `input`: Controls, packed control frames, recordings
//! - `track`: Track projection trait and the drive line track
//! - `moveable`: Position/velocity capability and integration
//! - `kart`: Kart state and per-frame update order
//! - `physics`: Force model and grip-limited slip
//! - `collision`: Collision braking, crashes, pitch recovery
//! - `interaction`: Kart contacts and pickup dispatch
//! - `pickup`: Pickup categories, managers, collection effects
//! - `attachment`: Timed effect slot
//! - `collectable`: Ammunition slot
//! - `boost`: Zipper and magnet
//! - `progress`: Track coordinates, laps, rescue
//! - `skid`: Skid trail state machines
//! - `events`: Race events
//! - `snapshot`: Replicated state
//! - `race`: Race session loop

pub mod config;
pub mod input;
pub mod track;
pub mod moveable;
pub mod kart;
pub mod physics;
pub mod collision;
pub mod interaction;
pub mod pickup;
pub mod attachment;
pub mod collectable;
pub mod boost;
pub mod progress;
pub mod skid;
pub mod events;
pub mod snapshot;
pub mod race;

// Re-export key types
pub use config::{ConfigError, KartProperties, PhysicsParameters, RaceConfig};
pub use input::{ControlFrame, ControlRecording, KartControls};
pub use track::{DriveLine, Track, TrackCoords, TrackError, TrackProjection};
pub use moveable::Moveable;
pub use kart::{FrameContext, KartSensors, KartState, OtherKarts};
pub use collision::MotionState;
pub use pickup::{NoPickups, PickupField, PickupKind, PickupManager};
pub use events::{KartEvent, KartEventData};
pub use skid::{SkidEvent, SkidEventKind, WheelSide};
pub use snapshot::{KartSnapshot, RaceSnapshot, SnapshotError};
pub use race::{replay_race, FrameResult, Race, RaceError, RacePhase};
