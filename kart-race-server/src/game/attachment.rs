//! Attachment Slot
//!
//! Timed effects hung on a kart: penalties from pickups and the rescue hold.
//! Penalties change the effective mass or air friction the dynamics model
//! sees; the rescue hold keeps the kart still while it is put back on track.

use serde::{Serialize, Deserialize};

use crate::core::coord::Coord;
use crate::core::rng::DeterministicRng;
use crate::game::config::{ANVIL_WEIGHT, ATTACHMENT_TIME, PARACHUTE_AIR_FRICTION};

/// Kind of attachment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AttachmentKind {
    /// Extra air drag
    Parachute = 0,
    /// Extra mass
    Anvil = 1,
    /// Kart is held in place while being rescued
    Rescue = 2,
}

const PENALTIES: [AttachmentKind; 2] = [AttachmentKind::Parachute, AttachmentKind::Anvil];

/// Attachment slot of one kart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    kind: Option<AttachmentKind>,
    time_left: f32,
}

impl Attachment {
    /// Attach `kind` for `time` seconds, replacing anything present.
    pub fn set(&mut self, kind: AttachmentKind, time: f32) {
        self.kind = Some(kind);
        self.time_left = time;
    }

    /// Remove the attachment.
    pub fn clear(&mut self) {
        self.kind = None;
        self.time_left = 0.0;
    }

    /// Current attachment.
    pub fn kind(&self) -> Option<AttachmentKind> {
        self.kind
    }

    /// Seconds until the attachment drops off.
    pub fn time_left(&self) -> f32 {
        self.time_left
    }

    /// True while the rescue hold is active.
    pub fn holds_kart(&self) -> bool {
        self.kind == Some(AttachmentKind::Rescue)
    }

    /// Penalty pickup: attach a random penalty.
    ///
    /// Ignored while the kart is being rescued. Returns what was attached.
    pub fn hit_penalty(&mut self, rng: &mut DeterministicRng) -> Option<AttachmentKind> {
        if self.holds_kart() {
            return None;
        }
        let kind = *rng.choose(&PENALTIES)?;
        self.set(kind, ATTACHMENT_TIME);
        Some(kind)
    }

    /// Count down; the rescue hold zeroes `velocity` every frame it lasts.
    pub fn update(&mut self, dt: f32, velocity: &mut Coord) {
        let Some(kind) = self.kind else {
            return;
        };
        if kind == AttachmentKind::Rescue {
            velocity.clear();
        }
        self.time_left -= dt;
        if self.time_left <= 0.0 {
            self.clear();
        }
    }

    /// Mass added to the kart (kg).
    pub fn weight_adjust(&self) -> f32 {
        match self.kind {
            Some(AttachmentKind::Anvil) => ANVIL_WEIGHT,
            _ => 0.0,
        }
    }

    /// Air friction added to the kart.
    pub fn air_friction_adjust(&self) -> f32 {
        match self.kind {
            Some(AttachmentKind::Parachute) => PARACHUTE_AIR_FRICTION,
            _ => 0.0,
        }
    }
}
