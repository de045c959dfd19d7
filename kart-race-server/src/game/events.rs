//! Race Events
//!
//! Discrete things that happened to a kart during a frame. Karts queue
//! `KartEventData` while updating; the race drains the queues in grid order
//! and stamps each entry with the frame and kart index.

use serde::{Serialize, Deserialize};

use crate::game::attachment::AttachmentKind;
use crate::game::collectable::CollectableKind;
use crate::game::pickup::PickupKind;
use crate::game::skid::SkidEvent;

/// Event payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum KartEventData {
    /// Lap counter moved (+1 forward crossing, -1 wrong-way crossing)
    LapChanged {
        /// New lap number
        lap: i32,
        /// Direction of the change
        delta: i32,
    },

    /// Kart was forced to a full stop
    Crashed {
        /// Forward speed at the moment of the crash
        speed: f32,
    },

    /// Kart drove over a pickup
    PickupCollected {
        /// Pickup category
        kind: PickupKind,
        /// Consumable count after clamping
        gobbled: u32,
    },

    /// A penalty attached something to the kart
    AttachmentAdded {
        /// What was attached
        kind: AttachmentKind,
    },

    /// Collectable slot changed after an offensive pickup
    CollectableGranted {
        /// Item kind held
        kind: CollectableKind,
        /// Items now held
        count: u32,
    },

    /// Zipper boost started
    ZipperStarted,

    /// Magnet locked onto another kart
    MagnetLocked {
        /// Grid index of the target
        target: usize,
    },

    /// Kart was put back on the track
    Rescued {
        /// Track hint the kart was placed at
        track_hint: usize,
    },

    /// A projectile left the kart (simulated by the projectile manager)
    ProjectileFired {
        /// Projectile kind
        kind: CollectableKind,
    },

    /// Skid trail stroke/break
    Skid(SkidEvent),
}

/// A stamped event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KartEvent {
    /// Frame the event occurred in
    pub frame: u64,
    /// Grid index of the kart
    pub kart: usize,
    /// Event data
    pub data: KartEventData,
}

impl KartEvent {
    /// Create a new event.
    pub fn new(frame: u64, kart: usize, data: KartEventData) -> Self {
        Self { frame, kart, data }
    }

    /// True for skid trail events (high volume, usually filtered from logs).
    pub fn is_skid(&self) -> bool {
        matches!(self.data, KartEventData::Skid(_))
    }
}
