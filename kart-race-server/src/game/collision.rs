//! Collision Response
//!
//! Reacts to the contact sensors after the kart has moved: brakes a kart
//! that scrapes along something, forces a full stop on a hard hit, and
//! levels the kart's pitch again afterwards.

use tracing::debug;

use crate::game::config::{
    COLLIDE_BRAKING_RATE, CRASH_PITCH, MIN_COLLIDE_VELOCITY, MIN_CRASH_VELOCITY,
    PITCH_RESTORE_RATE,
};
use crate::game::events::KartEventData;
use crate::game::kart::KartState;
use crate::game::moveable::Moveable;

/// How the kart is moving after collision braking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionState {
    /// Free driving
    Normal,
    /// Scraping along an obstacle
    Colliding,
    /// Hit an obstacle fast enough to stop dead
    Crashed,
    /// Pitch is returning to level
    Recovering,
}

impl MotionState {
    /// Classify a kart whose collision braking has already been applied.
    pub fn classify(kart: &KartState) -> Self {
        if kart.sensors.crashed && kart.velocity.xyz.y > MIN_CRASH_VELOCITY {
            MotionState::Crashed
        } else if kart.wheelie_angle < 0.0
            || (kart.wheelie_angle > 0.0 && kart.zipper_time_left <= 0.0)
        {
            MotionState::Recovering
        } else if kart.sensors.collided {
            MotionState::Colliding
        } else {
            MotionState::Normal
        }
    }
}

impl KartState {
    /// Apply sensor-driven collision response for this frame.
    pub fn do_collision_analysis(&mut self, dt: f32) -> MotionState {
        if self.sensors.collided {
            let v = &mut self.velocity.xyz.y;
            if *v > MIN_COLLIDE_VELOCITY {
                *v -= COLLIDE_BRAKING_RATE * dt;
            } else if *v < -MIN_COLLIDE_VELOCITY {
                *v += COLLIDE_BRAKING_RATE * dt;
            }
        }

        let state = MotionState::classify(self);
        match state {
            MotionState::Crashed => self.force_crash(),
            MotionState::Recovering => self.restore_pitch(dt),
            MotionState::Colliding | MotionState::Normal => {}
        }

        if self.sensors.on_ground {
            self.velocity.xyz.z = 0.0;
        }
        state
    }

    /// Stop the kart dead and pitch it nose down.
    pub fn force_crash(&mut self) {
        let speed = self.speed();
        debug!(kart = self.grid_position, speed, "kart crashed");
        self.push_event(KartEventData::Crashed { speed });
        self.velocity.clear();
        self.wheelie_angle = CRASH_PITCH;
    }

    /// Move the pitch toward level without overshooting.
    fn restore_pitch(&mut self, dt: f32) {
        let step = PITCH_RESTORE_RATE * dt;
        self.wheelie_angle = if self.wheelie_angle < 0.0 {
            (self.wheelie_angle + step).min(0.0)
        } else {
            (self.wheelie_angle - step).max(0.0)
        };
    }
}
