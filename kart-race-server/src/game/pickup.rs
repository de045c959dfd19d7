//! Pickups
//!
//! Pickups sit on the track and are collected by driving over them. The
//! `PickupManager` trait reports hits; `KartState::collected_pickup` applies
//! the effect of each hit to the kart.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::coord::Vec3;
use crate::core::hash::StateHasher;
use crate::game::config::{MAX_PICKUPS_GOBBLED, PICKUP_HIT_DISTANCE_SQ, PICKUP_RESPAWN_TIME};
use crate::game::events::KartEventData;
use crate::game::kart::KartState;

/// Pickup category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum PickupKind {
    /// Attaches a penalty to the kart
    Penalty = 0,
    /// One consumable
    Common = 1,
    /// Three consumables
    Rare = 2,
    /// Ammunition for the collectable slot
    Offensive = 3,
}

/// Source of pickup hits.
pub trait PickupManager {
    /// Report pickups hit by a kart at `pos`, removing them from play.
    fn hit_pickups(&mut self, pos: Vec3, out: &mut Vec<PickupKind>);

    /// Advance respawn timers.
    fn update(&mut self, dt: f32);

    /// Hash pickup state for determinism checks.
    fn hash_into(&self, _hasher: &mut StateHasher) {}
}

/// Manager for tracks without pickups.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPickups;

impl PickupManager for NoPickups {
    fn hit_pickups(&mut self, _pos: Vec3, _out: &mut Vec<PickupKind>) {}

    fn update(&mut self, _dt: f32) {}
}

/// A pickup placed on the track.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    /// World position
    pub position: Vec3,
    /// Category
    pub kind: PickupKind,
    /// Seconds until it reappears (0 while present)
    pub respawn_in: f32,
}

impl Pickup {
    /// True if the pickup can be collected.
    pub fn is_present(&self) -> bool {
        self.respawn_in <= 0.0
    }
}

/// Fixed set of pickups that respawn after being collected.
#[derive(Clone, Debug, Default)]
pub struct PickupField {
    pickups: BTreeMap<u32, Pickup>,
    next_id: u32,
}

impl PickupField {
    /// Empty field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a pickup. Returns its id.
    pub fn add(&mut self, position: Vec3, kind: PickupKind) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.pickups.insert(id, Pickup { position, kind, respawn_in: 0.0 });
        id
    }

    /// Look up a pickup.
    pub fn get(&self, id: u32) -> Option<&Pickup> {
        self.pickups.get(&id)
    }

    /// Pickups currently collectable.
    pub fn present_count(&self) -> usize {
        self.pickups.values().filter(|p| p.is_present()).count()
    }
}

impl PickupManager for PickupField {
    fn hit_pickups(&mut self, pos: Vec3, out: &mut Vec<PickupKind>) {
        for pickup in self.pickups.values_mut() {
            if pickup.is_present()
                && pickup.position.planar_distance_squared(pos) < PICKUP_HIT_DISTANCE_SQ
            {
                pickup.respawn_in = PICKUP_RESPAWN_TIME;
                out.push(pickup.kind);
            }
        }
    }

    fn update(&mut self, dt: f32) {
        for pickup in self.pickups.values_mut() {
            if pickup.respawn_in > 0.0 {
                pickup.respawn_in = (pickup.respawn_in - dt).max(0.0);
            }
        }
    }

    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.pickups.len() as u32);
        for (id, pickup) in &self.pickups {
            hasher.update_u32(*id);
            hasher.update_u8(pickup.kind as u8);
            hasher.update_f32(pickup.respawn_in);
        }
    }
}

impl KartState {
    /// Apply the effect of one collected pickup.
    pub fn collected_pickup(&mut self, kind: PickupKind) {
        match kind {
            PickupKind::Penalty => {
                if let Some(attached) = self.attachment.hit_penalty(&mut self.rng) {
                    self.push_event(KartEventData::AttachmentAdded { kind: attached });
                }
            }
            PickupKind::Common => self.num_pickups_gobbled += 1,
            PickupKind::Rare => self.num_pickups_gobbled += 3,
            PickupKind::Offensive => {
                let n = 1 + 4 * self.num_pickups_gobbled / MAX_PICKUPS_GOBBLED;
                if let Some(item) = self.collectable.grant(n, &mut self.rng) {
                    let count = self.collectable.count();
                    self.push_event(KartEventData::CollectableGranted { kind: item, count });
                }
            }
        }
        self.num_pickups_gobbled = self.num_pickups_gobbled.min(MAX_PICKUPS_GOBBLED);

        debug!(kart = self.grid_position, ?kind, gobbled = self.num_pickups_gobbled, "pickup collected");
        self.push_event(KartEventData::PickupCollected {
            kind,
            gobbled: self.num_pickups_gobbled,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::kart::tests::test_kart;
    use proptest::prelude::*;

    #[test]
    fn test_gobbled_counts_and_clamp() {
        let (mut kart, _) = test_kart(0);
        for _ in 0..3 {
            kart.collected_pickup(PickupKind::Common);
        }
        assert_eq!(kart.num_pickups_gobbled, 3);

        kart.collected_pickup(PickupKind::Rare);
        assert_eq!(kart.num_pickups_gobbled, 6);

        for _ in 0..10 {
            kart.collected_pickup(PickupKind::Rare);
        }
        assert_eq!(kart.num_pickups_gobbled, MAX_PICKUPS_GOBBLED);
    }

    #[test]
    fn test_offensive_scales_with_gobbled() {
        let (mut kart, _) = test_kart(0);
        kart.collected_pickup(PickupKind::Offensive);
        assert_eq!(kart.collectable.count(), 1);

        let (mut full, _) = test_kart(1);
        full.num_pickups_gobbled = MAX_PICKUPS_GOBBLED;
        full.collected_pickup(PickupKind::Offensive);
        assert_eq!(full.collectable.count(), 5);
        assert_eq!(full.num_pickups_gobbled, MAX_PICKUPS_GOBBLED);
    }

    #[test]
    fn test_penalty_attaches() {
        let (mut kart, _) = test_kart(0);
        kart.collected_pickup(PickupKind::Penalty);
        assert!(kart.attachment.kind().is_some());
        let events = kart.take_events();
        assert!(matches!(events[0], KartEventData::AttachmentAdded { .. }));
        assert!(matches!(
            events[1],
            KartEventData::PickupCollected { kind: PickupKind::Penalty, gobbled: 0 }
        ));
    }

    #[test]
    fn test_field_collect_and_respawn() {
        let mut field = PickupField::new();
        let id = field.add(Vec3::new(10.0, 0.0, 0.0), PickupKind::Rare);
        field.add(Vec3::new(50.0, 0.0, 0.0), PickupKind::Common);

        let mut hits = Vec::new();
        field.hit_pickups(Vec3::new(10.5, 0.0, 2.0), &mut hits);
        assert_eq!(hits, vec![PickupKind::Rare]);
        assert_eq!(field.present_count(), 1);

        // Gone until respawn
        hits.clear();
        field.hit_pickups(Vec3::new(10.0, 0.0, 0.0), &mut hits);
        assert!(hits.is_empty());

        field.update(PICKUP_RESPAWN_TIME / 2.0);
        assert!(!field.get(id).unwrap().is_present());
        field.update(PICKUP_RESPAWN_TIME / 2.0 + 0.1);
        assert!(field.get(id).unwrap().is_present());
        assert_eq!(field.present_count(), 2);
    }

    proptest! {
        #[test]
        fn gobbled_never_exceeds_max(kinds in prop::collection::vec(0u8..4, 0..64)) {
            let (mut kart, _) = test_kart(0);
            for k in kinds {
                let kind = match k {
                    0 => PickupKind::Penalty,
                    1 => PickupKind::Common,
                    2 => PickupKind::Rare,
                    _ => PickupKind::Offensive,
                };
                kart.collected_pickup(kind);
                prop_assert!(kart.num_pickups_gobbled <= MAX_PICKUPS_GOBBLED);
            }
        }
    }
}
