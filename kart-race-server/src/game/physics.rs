//! Vehicle Dynamics
//!
//! Longitudinal force model with grip-limited slip and a kinematic steering
//! model. One call per kart per frame turns controls, ground state and kart
//! properties into a new velocity and `skidding` flag.
//!
//! ## Grip
//!
//! The drive force a tire can transmit is bounded by the weight on it plus a
//! load transfer term from last frame's acceleration. When the effective
//! force exceeds that bound it is damped geometrically (×0.6 per pass) until
//! it fits, and the kart is flagged as skidding. The damping is iterative,
//! never a closed-form clamp: a kart that overpowers its tires loses more
//! than the excess.

use crate::game::config::{PhysicsParameters, GRIP_DAMPING, MAX_GRIP_ITERATIONS};
use crate::game::kart::KartState;

/// Outcome of grip limiting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GripLimit {
    /// Force after damping
    pub force: f32,
    /// Damping passes applied
    pub iterations: u32,
}

impl GripLimit {
    /// True if the force had to be damped.
    pub fn slipped(&self) -> bool {
        self.iterations > 0
    }
}

/// Damp `force` by `GRIP_DAMPING` until it fits under `max_grip`.
///
/// Bounded by `MAX_GRIP_ITERATIONS`; a force that is still not finite after
/// the loop is dropped to zero.
pub fn limit_to_grip(force: f32, max_grip: f32) -> GripLimit {
    let mut force = force;
    let mut iterations = 0;
    while force.abs() > max_grip && iterations < MAX_GRIP_ITERATIONS {
        force *= GRIP_DAMPING;
        iterations += 1;
    }
    if !force.is_finite() {
        force = 0.0;
    }
    GripLimit { force, iterations }
}

impl KartState {
    /// Mass including attachment weight.
    pub fn effective_mass(&self) -> f32 {
        self.properties().mass + self.attachment.weight_adjust()
    }

    /// Air friction including attachment drag.
    pub fn effective_air_friction(&self) -> f32 {
        self.properties().air_friction + self.attachment.air_friction_adjust()
    }

    /// Maximum transmissible drive force this frame.
    pub fn max_grip(&self, gravity: f32) -> f32 {
        let props = self.properties();
        let mass = self.effective_mass();
        let weight_on_tires = 0.5 * mass * gravity;
        let load_transfer = self.prev_accel.abs() * mass * props.height_cog / props.wheel_base;
        let mut grip = (weight_on_tires + load_transfer) * props.tire_grip;
        if self.sensors.on_ground {
            if let Some(friction) = self.sensors.surface_friction {
                grip *= friction;
            }
        }
        grip
    }

    /// Integrate forces for one frame.
    pub fn update_physics(&mut self, dt: f32, gravity: f32, params: &PhysicsParameters) {
        let mass = self.effective_mass();
        let air_friction = self.effective_air_friction();
        let (max_power, roll_resistance, max_steer) = {
            let p = self.properties();
            (p.max_power, p.roll_resistance, p.max_steer_angle)
        };
        let on_ground = self.sensors.on_ground;
        let v = self.velocity.xyz.y;

        let throttle = match (on_ground, self.controls.brake) {
            (true, true) => -1.0,
            (true, false) => self.controls.accel,
            (false, _) => 0.0,
        };

        let drive = throttle * max_power;
        let air = air_friction * v * v.abs();
        let roll = roll_resistance * v;

        // Ground contact cancels gravity; the ground clamp zeroes what is left.
        let force_z = if on_ground && self.controls.jump {
            params.jump_impulse * gravity
        } else {
            -gravity * mass
        };

        let grip = limit_to_grip(drive - air - roll, self.max_grip(gravity));
        self.skidding = grip.slipped();
        let accel = grip.force / mass;

        self.velocity.xyz.y += accel * dt;
        self.velocity.xyz.z += force_z / mass * dt;
        self.velocity.xyz.x = 0.0;

        self.velocity.hpr.x = if self.wheelie_angle <= 0.0 && on_ground {
            (-max_steer * self.controls.steer).clamp(-max_steer, max_steer)
        } else {
            0.0
        };

        self.prev_accel = accel;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::attachment::AttachmentKind;
    use crate::game::kart::tests::test_kart;
    use proptest::prelude::*;

    #[test]
    fn test_limit_to_grip_within() {
        let g = limit_to_grip(100.0, 200.0);
        assert_eq!(g.force, 100.0);
        assert!(!g.slipped());
    }

    #[test]
    fn test_limit_to_grip_damps_below_bound() {
        let g = limit_to_grip(-1000.0, 200.0);
        assert!(g.slipped());
        assert!(g.force < 0.0);
        assert!(g.force.abs() <= 200.0);
        // 1000 * 0.6^4 = 129.6
        assert_eq!(g.iterations, 4);
    }

    #[test]
    fn test_limit_to_grip_degenerate_inputs_terminate() {
        let g = limit_to_grip(f32::INFINITY, 100.0);
        assert_eq!(g.iterations, MAX_GRIP_ITERATIONS);
        assert_eq!(g.force, 0.0);

        let g = limit_to_grip(500.0, -1.0);
        assert_eq!(g.iterations, MAX_GRIP_ITERATIONS);

        let g = limit_to_grip(f32::NAN, 100.0);
        assert_eq!(g.force, 0.0);
    }

    #[test]
    fn test_throttle_accelerates_without_skid() {
        let (mut kart, _) = test_kart(0);
        let params = PhysicsParameters::default();
        kart.controls.accel = 1.0;
        kart.update_physics(0.1, 9.82, &params);

        assert!(!kart.skidding);
        assert!(kart.velocity.xyz.y > 0.0);
        let expected = kart.properties().max_power / kart.properties().mass;
        assert!((kart.prev_accel - expected).abs() < 1e-3);
    }

    #[test]
    fn test_overpowered_kart_skids() {
        let (mut kart, _) = test_kart(0);
        let params = PhysicsParameters::default();
        kart.controls.accel = 1.0;
        kart.sensors.surface_friction = Some(0.1);
        kart.update_physics(0.1, 9.82, &params);

        assert!(kart.skidding);
        assert!(kart.prev_accel * kart.effective_mass() <= kart.max_grip(9.82));
    }

    #[test]
    fn test_no_drive_or_steer_in_air() {
        let (mut kart, _) = test_kart(0);
        let params = PhysicsParameters::default();
        kart.sensors.on_ground = false;
        kart.controls.accel = 1.0;
        kart.controls.steer = 1.0;
        kart.update_physics(0.1, 9.82, &params);

        assert_eq!(kart.velocity.xyz.y, 0.0);
        assert_eq!(kart.velocity.hpr.x, 0.0);
        assert!(kart.velocity.xyz.z < 0.0);
    }

    #[test]
    fn test_steering_sign_and_wheelie_lock() {
        let (mut kart, _) = test_kart(0);
        let params = PhysicsParameters::default();
        let max_steer = kart.properties().max_steer_angle;

        kart.controls.steer = 1.0;
        kart.update_physics(0.1, 9.82, &params);
        assert_eq!(kart.velocity.hpr.x, -max_steer);

        kart.wheelie_angle = 10.0;
        kart.update_physics(0.1, 9.82, &params);
        assert_eq!(kart.velocity.hpr.x, 0.0);
    }

    #[test]
    fn test_anvil_slows_acceleration() {
        let params = PhysicsParameters::default();
        let (mut light, _) = test_kart(0);
        let (mut heavy, _) = test_kart(0);
        heavy.attachment.set(AttachmentKind::Anvil, 5.0);
        light.controls.accel = 1.0;
        heavy.controls.accel = 1.0;

        light.update_physics(0.1, 9.82, &params);
        heavy.update_physics(0.1, 9.82, &params);
        assert!(heavy.velocity.xyz.y < light.velocity.xyz.y);
    }

    proptest! {
        #[test]
        fn grip_damping_terminates(force in any::<f32>(), grip in any::<f32>()) {
            let g = limit_to_grip(force, grip);
            prop_assert!(g.iterations <= MAX_GRIP_ITERATIONS);
            prop_assert!(g.force.is_finite());
        }

        #[test]
        fn grip_damping_fits_finite_force(force in -1.0e6f32..1.0e6, grip in 1.0e-3f32..1.0e6) {
            let g = limit_to_grip(force, grip);
            prop_assert!(g.force.abs() <= grip);
            prop_assert_eq!(g.slipped(), force.abs() > grip);
        }

        #[test]
        fn physics_step_stays_finite(
            accel in 0.0f32..=1.0,
            steer in -1.0f32..=1.0,
            brake in any::<bool>(),
            on_ground in any::<bool>(),
            dt in 1.0e-4f32..0.05,
        ) {
            let (mut kart, _) = test_kart(0);
            let params = PhysicsParameters::default();
            kart.controls.accel = accel;
            kart.controls.steer = steer;
            kart.controls.brake = brake;
            kart.sensors.on_ground = on_ground;
            for _ in 0..10 {
                kart.update_physics(dt, 9.82, &params);
            }
            prop_assert!(kart.velocity.xyz.y.is_finite());
            prop_assert!(kart.velocity.xyz.z.is_finite());
        }
    }
}
