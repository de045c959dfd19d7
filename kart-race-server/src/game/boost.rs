//! Transient Boosts
//!
//! Zipper (a timed speed floor with a wheelie) and magnet (steer at and
//! catch up with the closest kart ahead), plus firing the collectable slot
//! that starts them.

use tracing::{debug, trace};

use crate::core::coord::Vec3;
use crate::game::collectable::CollectableKind;
use crate::game::config::{PhysicsParameters, MAGNET_CATCHUP_FACTOR, ZIPPER_ANGLE};
use crate::game::events::KartEventData;
use crate::game::kart::{KartState, OtherKarts};

impl KartState {
    /// Start a zipper boost.
    pub fn handle_zipper(&mut self, params: &PhysicsParameters) {
        self.wheelie_angle = ZIPPER_ANGLE;
        self.zipper_time_left = params.zipper_time;
        debug!(kart = self.grid_position, "zipper started");
        self.push_event(KartEventData::ZipperStarted);
    }

    /// Hold the speed floor while the zipper runs.
    pub fn do_zipper_processing(&mut self, dt: f32, params: &PhysicsParameters) {
        if self.zipper_time_left > dt {
            self.zipper_time_left -= dt;
            if self.velocity.xyz.y < params.zipper_velocity {
                self.velocity.xyz.y = params.zipper_velocity;
            }
        } else {
            self.zipper_time_left = 0.0;
        }
    }

    /// Closest kart at or ahead of this one down the track and within
    /// `range_sq`. Returns its grid index and squared planar distance.
    pub fn get_closest_kart(&self, others: &OtherKarts<'_>, range_sq: f32) -> Option<(usize, f32)> {
        let own = self.distance_down_track();
        let mut closest: Option<(usize, f32)> = None;
        for other in others.iter() {
            if other.distance_down_track() < own {
                continue;
            }
            let d = self.position.xyz.planar_distance_squared(other.position.xyz);
            if d < range_sq && closest.map_or(true, |(_, best)| d < best) {
                closest = Some((other.grid_position, d));
            }
        }
        closest
    }

    /// Face `target` and match or beat its speed.
    pub fn handle_magnet(&mut self, target: &KartState, dist_sq: f32, params: &PhysicsParameters) {
        let toward = (target.position.xyz - self.position.xyz).planar_normalize();
        if toward != Vec3::ZERO {
            self.position.hpr.x = toward.heading();
            self.position.hpr.y = 0.0;
            self.position.hpr.z = 0.0;
        }

        let target_v = target.velocity.xyz.y;
        if dist_sq > params.magnet_min_range_sq {
            if self.velocity.xyz.y < target_v {
                self.velocity.xyz.y = target_v * MAGNET_CATCHUP_FACTOR;
            }
        } else {
            self.velocity.xyz.y = target_v;
        }
    }

    /// Run the magnet while its window is open.
    pub fn do_magnet_processing(
        &mut self,
        dt: f32,
        params: &PhysicsParameters,
        others: &OtherKarts<'_>,
    ) {
        if self.magnet_time_left <= 0.0 {
            self.magnet_target = None;
            return;
        }
        self.magnet_time_left = (self.magnet_time_left - dt).max(0.0);

        let lock = self
            .get_closest_kart(others, params.magnet_range_sq)
            .and_then(|(index, d)| others.get(index).map(|target| (target, d)));
        let Some((target, dist_sq)) = lock else {
            self.magnet_target = None;
            return;
        };

        if self.magnet_target != Some(target.grid_position) {
            self.magnet_target = Some(target.grid_position);
            trace!(kart = self.grid_position, target = target.grid_position, "magnet locked");
            self.push_event(KartEventData::MagnetLocked { target: target.grid_position });
        }
        self.handle_magnet(target, dist_sq, params);
    }

    /// Use one collectable item on the frame fire goes down. Holding the
    /// button does not fire again.
    pub fn use_collectable(&mut self, params: &PhysicsParameters) {
        let pressed = self.controls.fire && !self.fire_held;
        self.fire_held = self.controls.fire;
        if !pressed {
            return;
        }
        let Some(kind) = self.collectable.use_one() else {
            return;
        };
        if kind.is_projectile() {
            self.push_event(KartEventData::ProjectileFired { kind });
        } else if kind == CollectableKind::Magnet {
            self.magnet_time_left = params.magnet_time;
        } else {
            self.handle_zipper(params);
        }
    }
}
