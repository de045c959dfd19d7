//! Moveable Capability
//!
//! Anything with a world position and a kart-space velocity that can be
//! advanced by a time step.

use crate::core::coord::Coord;

/// Position + velocity + integration.
pub trait Moveable {
    /// World position and orientation.
    fn coord(&self) -> &Coord;

    /// Mutable world position.
    fn coord_mut(&mut self) -> &mut Coord;

    /// Velocity in object space (`xyz.y` forward) with angular rates.
    fn velocity(&self) -> &Coord;

    /// Signed forward speed.
    fn speed(&self) -> f32 {
        self.velocity().xyz.y
    }

    /// Advance the position by one step: translate along the current
    /// heading, then apply the angular rates.
    fn integrate(&mut self, dt: f32) {
        let vel = *self.velocity();
        let pos = self.coord_mut();
        let step = pos.to_world(vel.xyz.scale(dt));
        pos.xyz += step;
        pos.hpr += vel.hpr.scale(dt);
        pos.hpr.x = wrap_degrees(pos.hpr.x);
    }
}

/// Wrap an angle into [-180, 180).
pub fn wrap_degrees(angle: f32) -> f32 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}
