//! Collectable Slot
//!
//! Ammunition granted by offensive pickups. The slot holds a single kind
//! with a count; projectile flight is simulated elsewhere.

use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;

/// Item kinds a kart can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CollectableKind {
    /// Straight-flying projectile
    Missile = 0,
    /// Projectile that follows the kart ahead
    Homing = 1,
    /// Bouncing projectile
    Spark = 2,
    /// Pulls the kart toward the kart ahead
    Magnet = 3,
    /// Instant zipper boost
    Zipper = 4,
}

impl CollectableKind {
    /// True for items that leave the kart when used.
    pub fn is_projectile(self) -> bool {
        matches!(self, Self::Missile | Self::Homing | Self::Spark)
    }
}

const ALL_KINDS: [CollectableKind; 5] = [
    CollectableKind::Missile,
    CollectableKind::Homing,
    CollectableKind::Spark,
    CollectableKind::Magnet,
    CollectableKind::Zipper,
];

/// Collectable slot of one kart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collectable {
    kind: Option<CollectableKind>,
    count: u32,
}

impl Collectable {
    /// Slot holding `count` items of `kind`; empty when `count` is 0.
    pub fn holding(kind: CollectableKind, count: u32) -> Self {
        Self { kind: (count > 0).then_some(kind), count }
    }

    /// Held kind.
    pub fn kind(&self) -> Option<CollectableKind> {
        self.kind
    }

    /// Items held.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Grant `n` items. An empty slot draws a new kind; a filled slot keeps
    /// its kind and stacks.
    pub fn grant(&mut self, n: u32, rng: &mut DeterministicRng) -> Option<CollectableKind> {
        if n == 0 {
            return self.kind;
        }
        match self.kind {
            Some(_) => self.count = self.count.saturating_add(n),
            None => {
                self.kind = rng.choose(&ALL_KINDS).copied();
                self.count = n;
            }
        }
        self.kind
    }

    /// Consume one item.
    pub fn use_one(&mut self) -> Option<CollectableKind> {
        let kind = self.kind?;
        self.count = self.count.saturating_sub(1);
        if self.count == 0 {
            self.kind = None;
        }
        Some(kind)
    }

    /// Empty the slot.
    pub fn clear(&mut self) {
        self.kind = None;
        self.count = 0;
    }
}
