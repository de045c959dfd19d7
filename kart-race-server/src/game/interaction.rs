//! Object Interactions
//!
//! Kart-vs-kart contact and pickup collection for the kart being updated.
//!
//! Contacts are checked only against karts with a lower grid index, so each
//! pair is resolved once per frame, by the higher-index kart. The slower of
//! the two stops dead and is pushed one unit out of the overlap; the faster
//! kart drives on. Equal speeds crash the lower-index kart.

use crate::core::coord::Vec3;
use crate::game::config::CONTACT_DISTANCE_SQ;
use crate::game::kart::KartState;
use crate::game::moveable::Moveable;
use crate::game::pickup::{PickupKind, PickupManager};

/// Which side of a contact gets stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactLoser {
    /// The kart being updated
    This,
    /// The lower-index kart it touched
    Other,
}

/// Decide a contact between the kart being updated and `other`.
///
/// Returns the loser and the unit normal pointing from `other` to this kart,
/// or `None` if the karts are not touching.
pub fn check_kart_contact(this: &KartState, other: &KartState) -> Option<(ContactLoser, Vec3)> {
    let a = this.position.xyz;
    let b = other.position.xyz;
    if a.planar_distance_squared(b) >= CONTACT_DISTANCE_SQ {
        return None;
    }

    let normal = (a - b).planar_normalize();
    let loser = if this.speed() < other.speed() {
        ContactLoser::This
    } else {
        ContactLoser::Other
    };
    Some((loser, normal))
}

impl KartState {
    /// Resolve contacts with lower-index karts, then collect pickups.
    pub fn do_object_interactions(
        &mut self,
        lower: &mut [KartState],
        pickups: &mut dyn PickupManager,
    ) {
        for other in lower.iter_mut() {
            let Some((loser, normal)) = check_kart_contact(self, other) else {
                continue;
            };
            match loser {
                ContactLoser::This => {
                    self.force_crash();
                    self.position.xyz += normal;
                }
                ContactLoser::Other => {
                    other.force_crash();
                    other.position.xyz -= normal;
                }
            }
        }

        let mut hits: Vec<PickupKind> = Vec::new();
        pickups.hit_pickups(self.position.xyz, &mut hits);
        for kind in hits {
            self.collected_pickup(kind);
        }
    }
}
