//! Race and Kart Configuration
//!
//! Immutable tuning data. `KartProperties` describes one kart type,
//! `PhysicsParameters` holds race-wide tuning, and `RaceConfig` bundles both
//! with world values. Everything is validated once at load time; the per-frame
//! simulation assumes validated values and never re-checks them.

use serde::{Serialize, Deserialize};
use thiserror::Error;

// =============================================================================
// FIXED CONSTANTS
// =============================================================================

/// Simulation frame rate (Hz) used by replays and the demo binary.
pub const FRAME_RATE: u32 = 60;

/// Fixed frame step for replays (seconds).
pub const FIXED_FRAME_DT: f32 = 1.0 / FRAME_RATE as f32;

/// Largest dt a single frame may advance: three internal 1/60 s steps.
pub const MAX_FRAME_DT: f32 = 3.0 / FRAME_RATE as f32;

/// Conversion factor from km/h to m/s.
pub const KILOMETERS_PER_HOUR: f32 = 1.0 / 3.6;

/// Upper bound on consumable pickups a kart can hold.
pub const MAX_PICKUPS_GOBBLED: u32 = 20;

/// Pitch set by a forced stop (degrees, nose down).
pub const CRASH_PITCH: f32 = -45.0;

/// Pitch set by a zipper (degrees, wheelie).
pub const ZIPPER_ANGLE: f32 = 45.0;

/// Rate at which wheelie pitch returns to level (degrees per second).
pub const PITCH_RESTORE_RATE: f32 = 90.0;

/// Speed below which a colliding kart is no longer braked (m/s).
pub const MIN_COLLIDE_VELOCITY: f32 = 0.5;

/// Deceleration while colliding (m/s per second).
pub const COLLIDE_BRAKING_RATE: f32 = 15.0;

/// Forward speed above which a crash forces a full stop (m/s).
pub const MIN_CRASH_VELOCITY: f32 = 12.0 * KILOMETERS_PER_HOUR;

/// Track distance above which a kart is near the end of a lap.
pub const LAP_END_BAND: f32 = 100.0;

/// Track distance below which a kart is near the start of a lap.
pub const LAP_START_BAND: f32 = 20.0;

/// Squared planar distance under which two karts are in contact.
pub const CONTACT_DISTANCE_SQ: f32 = 1.0;

/// Distance from kart origin to the rear wheel contact point.
pub const SKID_OFFSET_LENGTH: f32 = 0.57;

/// Angle of each rear wheel contact point from the kart axis (degrees).
pub const SKID_SIDE_ANGLE: f32 = 43.0;

/// Speed multiplier applied when the magnet catches up with its target.
pub const MAGNET_CATCHUP_FACTOR: f32 = 1.4;

/// Geometric damping factor applied to a slipping drive force.
pub const GRIP_DAMPING: f32 = 0.6;

/// Hard cap on grip damping passes. Finite forces settle far below this.
pub const MAX_GRIP_ITERATIONS: u32 = 512;

/// Duration of a penalty attachment (seconds).
pub const ATTACHMENT_TIME: f32 = 10.0;

/// Duration of the rescue hold (seconds).
pub const RESCUE_TIME: f32 = 4.0;

/// Extra air friction while a parachute is attached.
pub const PARACHUTE_AIR_FRICTION: f32 = 2.0;

/// Extra mass while an anvil is attached (kg).
pub const ANVIL_WEIGHT: f32 = 150.0;

/// Pickup hit radius, squared.
pub const PICKUP_HIT_DISTANCE_SQ: f32 = 0.8;

/// Time until a collected pickup reappears (seconds).
pub const PICKUP_RESPAWN_TIME: f32 = 10.0;

// =============================================================================
// ERRORS
// =============================================================================

/// Configuration rejected at load time.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value that must be strictly positive was not.
    #[error("{field} must be positive, got {value}")]
    NotPositive {
        /// Field name
        field: &'static str,
        /// Rejected value
        value: f32,
    },

    /// A value that must be non-negative was negative.
    #[error("{field} must not be negative, got {value}")]
    Negative {
        /// Field name
        field: &'static str,
        /// Rejected value
        value: f32,
    },

    /// Magnet minimum range exceeds its maximum.
    #[error("magnet minimum range ({min}) exceeds magnet range ({max})")]
    MagnetRange {
        /// Squared minimum range
        min: f32,
        /// Squared maximum range
        max: f32,
    },

    /// Race needs at least one lap.
    #[error("race must have at least one lap")]
    NoLaps,

    /// JSON parse failure.
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

// =============================================================================
// KART PROPERTIES
// =============================================================================

/// Immutable per-kart-type physical description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KartProperties {
    /// Kart type identifier
    pub ident: String,
    /// Mass (kg)
    pub mass: f32,
    /// Maximum drive force at full throttle (N)
    pub max_power: f32,
    /// Tire grip coefficient
    pub tire_grip: f32,
    /// Quadratic air drag coefficient
    pub air_friction: f32,
    /// Linear rolling resistance coefficient
    pub roll_resistance: f32,
    /// Distance between axles (m)
    pub wheel_base: f32,
    /// Height of center of gravity (m)
    pub height_cog: f32,
    /// Maximum yaw rate at full steering (degrees per second)
    pub max_steer_angle: f32,
}

impl Default for KartProperties {
    fn default() -> Self {
        Self {
            ident: "tux".to_string(),
            mass: 225.0,
            max_power: 3000.0,
            tire_grip: 3.0,
            air_friction: 0.8257,
            roll_resistance: 7.5,
            wheel_base: 1.2,
            height_cog: 0.5,
            max_steer_angle: 45.0,
        }
    }
}

impl KartProperties {
    /// Check the physical invariants the dynamics model relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("mass", self.mass)?;
        positive("max_power", self.max_power)?;
        positive("tire_grip", self.tire_grip)?;
        positive("wheel_base", self.wheel_base)?;
        positive("height_cog", self.height_cog)?;
        positive("max_steer_angle", self.max_steer_angle)?;
        non_negative("air_friction", self.air_friction)?;
        non_negative("roll_resistance", self.roll_resistance)?;
        Ok(())
    }
}

// =============================================================================
// PHYSICS PARAMETERS
// =============================================================================

/// Race-wide tuning shared by all karts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParameters {
    /// Jump force as a multiple of gravity
    pub jump_impulse: f32,
    /// Squared range within which the magnet locks on
    pub magnet_range_sq: f32,
    /// Squared range inside which the magnet only matches speed
    pub magnet_min_range_sq: f32,
    /// Duration of a magnet item (seconds)
    pub magnet_time: f32,
    /// Minimum forward speed while a zipper is active (m/s)
    pub zipper_velocity: f32,
    /// Zipper duration (seconds)
    pub zipper_time: f32,
}

impl Default for PhysicsParameters {
    fn default() -> Self {
        Self {
            jump_impulse: 2000.0,
            magnet_range_sq: 400.0,
            magnet_min_range_sq: 16.0,
            magnet_time: 5.0,
            zipper_velocity: 100.0 * KILOMETERS_PER_HOUR,
            zipper_time: 3.0,
        }
    }
}

impl PhysicsParameters {
    /// Check ranges and durations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("jump_impulse", self.jump_impulse)?;
        positive("magnet_range_sq", self.magnet_range_sq)?;
        non_negative("magnet_min_range_sq", self.magnet_min_range_sq)?;
        if self.magnet_min_range_sq > self.magnet_range_sq {
            return Err(ConfigError::MagnetRange {
                min: self.magnet_min_range_sq,
                max: self.magnet_range_sq,
            });
        }
        non_negative("magnet_time", self.magnet_time)?;
        positive("zipper_velocity", self.zipper_velocity)?;
        positive("zipper_time", self.zipper_time)?;
        Ok(())
    }
}

// =============================================================================
// RACE CONFIG
// =============================================================================

/// Everything a race session needs besides the track and grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    /// Gravity (m/s², positive down)
    pub gravity: f32,
    /// Laps to finish
    pub num_laps: i32,
    /// Countdown before racing starts (frames)
    pub countdown_frames: u32,
    /// Seed for per-kart random streams
    pub seed: u64,
    /// Race-wide physics tuning
    pub physics: PhysicsParameters,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            gravity: 9.82,
            num_laps: 3,
            countdown_frames: 3 * FRAME_RATE,
            seed: 0,
            physics: PhysicsParameters::default(),
        }
    }
}

impl RaceConfig {
    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the whole config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("gravity", self.gravity)?;
        if self.num_laps < 1 {
            return Err(ConfigError::NoLaps);
        }
        self.physics.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(KartProperties::default().validate().is_ok());
        assert!(PhysicsParameters::default().validate().is_ok());
        assert!(RaceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_mass() {
        let props = KartProperties { mass: 0.0, ..Default::default() };
        assert!(matches!(
            props.validate(),
            Err(ConfigError::NotPositive { field: "mass", .. })
        ));

        let props = KartProperties { wheel_base: -1.0, ..Default::default() };
        assert!(props.validate().is_err());

        let props = KartProperties { tire_grip: f32::NAN, ..Default::default() };
        assert!(props.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_magnet_range() {
        let params = PhysicsParameters {
            magnet_range_sq: 10.0,
            magnet_min_range_sq: 20.0,
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(ConfigError::MagnetRange { .. })));
    }

    #[test]
    fn test_from_json_partial() {
        let config = RaceConfig::from_json_str(
            r#"{ "num_laps": 5, "physics": { "zipper_time": 2.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.num_laps, 5);
        assert_eq!(config.physics.zipper_time, 2.0);
        assert_eq!(config.gravity, 9.82);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(matches!(
            RaceConfig::from_json_str(r#"{ "num_laps": 0 }"#),
            Err(ConfigError::NoLaps)
        ));
        assert!(matches!(
            RaceConfig::from_json_str("not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_kart_properties_json() {
        let props: KartProperties =
            serde_json::from_str(r#"{ "ident": "heavy", "mass": 400.0 }"#).unwrap();
        assert_eq!(props.ident, "heavy");
        assert_eq!(props.mass, 400.0);
        assert_eq!(props.tire_grip, KartProperties::default().tire_grip);
    }
}
