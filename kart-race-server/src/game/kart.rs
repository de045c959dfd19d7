//! Kart State
//!
//! Everything one kart owns across frames, and the per-frame update that
//! drives the components in a fixed order:
//!
//! ```text
//! rescue / attachment → collectable use → zipper → magnet
//!   → dynamics → position integration + collision analysis
//!   → object interactions → track re-projection → lap counting → skid trail
//! ```
//!
//! Component logic lives in sibling modules as `impl KartState` blocks.

use std::sync::Arc;

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::coord::Coord;
use crate::core::hash::StateHasher;
use crate::core::rng::DeterministicRng;
use crate::game::attachment::{Attachment, AttachmentKind};
use crate::game::collectable::Collectable;
use crate::game::config::{KartProperties, PhysicsParameters, RESCUE_TIME};
use crate::game::events::KartEventData;
use crate::game::input::KartControls;
use crate::game::moveable::Moveable;
use crate::game::pickup::PickupManager;
use crate::game::skid::SkidMarks;
use crate::game::track::{Track, TrackCoords};

// =============================================================================
// FRAME CONTEXT
// =============================================================================

/// Read-only world state handed to every kart update.
pub struct FrameContext<'a> {
    /// Frame step (already bounded by the race)
    pub dt: f32,
    /// Gravity (positive down)
    pub gravity: f32,
    /// Race-wide tuning
    pub params: &'a PhysicsParameters,
    /// Track geometry
    pub track: &'a dyn Track,
}

/// The rest of the grid as seen by the kart being updated.
///
/// `before` holds the karts with lower grid index (already updated this
/// frame, mutable for contact resolution); `after` the ones not yet updated.
pub struct OtherKarts<'a> {
    /// Lower grid indices
    pub before: &'a mut [KartState],
    /// Higher grid indices
    pub after: &'a [KartState],
}

impl<'a> OtherKarts<'a> {
    /// No other karts.
    pub fn none() -> OtherKarts<'static> {
        OtherKarts { before: &mut [], after: &[] }
    }

    /// All other karts, in grid order.
    pub fn iter(&self) -> impl Iterator<Item = &KartState> {
        self.before.iter().chain(self.after.iter())
    }

    /// Look up another kart by grid index.
    pub fn get(&self, grid_position: usize) -> Option<&KartState> {
        self.iter().find(|k| k.grid_position == grid_position)
    }
}

// =============================================================================
// SENSORS
// =============================================================================

/// Contact state set by collision detection before each update.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct KartSensors {
    /// Wheels touch the ground
    pub on_ground: bool,
    /// Kart is scraping something (brakes the kart)
    pub collided: bool,
    /// Kart hit something head on (may force a stop)
    pub crashed: bool,
    /// Friction multiplier of the surface under the kart
    pub surface_friction: Option<f32>,
}

impl Default for KartSensors {
    fn default() -> Self {
        Self {
            on_ground: true,
            collided: false,
            crashed: false,
            surface_friction: None,
        }
    }
}

// =============================================================================
// KART STATE
// =============================================================================

/// Long-lived state of one kart.
#[derive(Clone, Debug)]
pub struct KartState {
    /// Starting order; also the kart's index in the race
    pub grid_position: usize,

    /// Kart type
    properties: Arc<KartProperties>,

    /// Where `reset` puts the kart
    pub start_position: Coord,

    /// World position and orientation
    pub position: Coord,

    /// Kart-space velocity (`xyz.y` forward) and angular rates
    pub velocity: Coord,

    /// Controls for the current frame
    pub controls: KartControls,

    /// Contact sensors for the current frame
    pub sensors: KartSensors,

    /// Tires exceeded grip this frame
    pub skidding: bool,

    /// Pitch offset (degrees); negative while recovering from a crash
    pub wheelie_angle: f32,

    /// Longitudinal acceleration of the previous frame
    pub prev_accel: f32,

    /// Cached track segment
    pub track_hint: usize,

    /// Track coordinates this frame
    pub curr_track_coords: TrackCoords,

    /// Track coordinates last frame
    pub last_track_coords: TrackCoords,

    /// Lap counter (-1 before crossing the start line)
    pub race_lap: i32,

    /// Current standing (1 = leading)
    pub race_position: usize,

    /// Consumable pickups held
    pub num_pickups_gobbled: u32,

    /// Remaining zipper boost (seconds)
    pub zipper_time_left: f32,

    /// Remaining magnet window (seconds)
    pub magnet_time_left: f32,

    /// Kart the magnet is locked onto
    pub magnet_target: Option<usize>,

    /// Fire was held last frame
    pub fire_held: bool,

    /// Rescue requested; handled at the start of the next update
    pub rescue_pending: bool,

    /// Accumulated wheel rotation for rendering
    pub wheel_rotation: f32,

    /// Effect slot
    pub attachment: Attachment,

    /// Ammunition slot
    pub collectable: Collectable,

    /// Skid trail machines
    pub skid_marks: SkidMarks,

    /// Random stream for item and penalty draws
    pub(crate) rng: DeterministicRng,

    /// Events raised since the last drain
    pending_events: Vec<KartEventData>,
}

impl KartState {
    /// Create a kart parked at `start_position`.
    pub fn new(
        grid_position: usize,
        properties: Arc<KartProperties>,
        start_position: Coord,
        rng: DeterministicRng,
    ) -> Self {
        Self {
            grid_position,
            properties,
            start_position,
            position: start_position,
            velocity: Coord::ZERO,
            controls: KartControls::default(),
            sensors: KartSensors::default(),
            skidding: false,
            wheelie_angle: 0.0,
            prev_accel: 0.0,
            track_hint: 0,
            curr_track_coords: TrackCoords::default(),
            last_track_coords: TrackCoords::default(),
            race_lap: -1,
            race_position: grid_position + 1,
            num_pickups_gobbled: 0,
            zipper_time_left: 0.0,
            magnet_time_left: 0.0,
            magnet_target: None,
            fire_held: false,
            rescue_pending: false,
            wheel_rotation: 0.0,
            attachment: Attachment::default(),
            collectable: Collectable::default(),
            skid_marks: SkidMarks::default(),
            rng,
            pending_events: Vec::new(),
        }
    }

    /// Kart type.
    pub fn properties(&self) -> &KartProperties {
        &self.properties
    }

    /// Race (re)start: back to the grid slot with a fresh race state.
    ///
    /// The track hint is reseeded with a full search.
    pub fn reset(&mut self, track: &dyn Track) {
        self.position = self.start_position;
        self.velocity = Coord::ZERO;
        self.sensors = KartSensors::default();
        self.skidding = false;
        self.wheelie_angle = 0.0;
        self.prev_accel = 0.0;
        self.race_lap = -1;
        self.race_position = self.grid_position + 1;
        self.num_pickups_gobbled = 0;
        self.zipper_time_left = 0.0;
        self.magnet_time_left = 0.0;
        self.magnet_target = None;
        self.fire_held = false;
        self.rescue_pending = false;
        self.attachment.clear();
        self.collectable.clear();
        self.skid_marks.reset();
        self.pending_events.clear();
        self.reset_track_hint(track);
    }

    /// Ask for the kart to be put back on the track next frame.
    pub fn request_rescue(&mut self) {
        self.rescue_pending = true;
    }

    /// Run one frame. `others` is the rest of the grid.
    pub fn update(
        &mut self,
        ctx: &FrameContext<'_>,
        others: &mut OtherKarts<'_>,
        pickups: &mut dyn PickupManager,
    ) {
        let dt = ctx.dt;
        self.controls = self.controls.sanitized();

        // per frame, not scaled by dt
        self.wheel_rotation += self.velocity.xyz.length();

        if self.rescue_pending {
            self.rescue_pending = false;
            self.handle_rescue(ctx.track);
            self.attachment.set(AttachmentKind::Rescue, RESCUE_TIME);
            debug!(kart = self.grid_position, hint = self.track_hint, "kart rescued");
            self.push_event(KartEventData::Rescued { track_hint: self.track_hint });
        }
        self.attachment.update(dt, &mut self.velocity);

        self.use_collectable(ctx.params);
        self.do_zipper_processing(dt, ctx.params);
        self.do_magnet_processing(dt, ctx.params, others);

        self.update_physics(dt, ctx.gravity, ctx.params);
        if self.attachment.holds_kart() {
            self.velocity.clear();
        }

        self.last_track_coords = self.curr_track_coords;
        self.integrate(dt);
        self.do_collision_analysis(dt);

        self.do_object_interactions(others.before, pickups);

        self.update_track_coords(ctx.track);
        self.do_lap_counting();
        self.process_skid_marks();
    }

    /// Pose handed to the renderer: wheelie pitch applied and the body
    /// lifted so the rear wheels stay on the ground.
    pub fn render_transform(&self) -> Coord {
        let mut c = self.position;
        c.hpr.y += self.wheelie_angle;
        c.xyz.z += 0.3 * self.wheelie_angle.to_radians().sin().abs();
        c
    }

    /// Queue an event for the race to drain.
    pub fn push_event(&mut self, event: KartEventData) {
        self.pending_events.push(event);
    }

    /// Take queued events.
    pub fn take_events(&mut self) -> Vec<KartEventData> {
        std::mem::take(&mut self.pending_events)
    }

    /// Hash everything that influences future frames.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.grid_position as u32);
        hasher.update_coord(&self.position);
        hasher.update_coord(&self.velocity);
        hasher.update_bool(self.skidding);
        hasher.update_bool(self.sensors.on_ground);
        hasher.update_f32(self.wheelie_angle);
        hasher.update_f32(self.prev_accel);
        hasher.update_u32(self.track_hint as u32);
        hasher.update_f32(self.curr_track_coords.lateral);
        hasher.update_f32(self.curr_track_coords.distance);
        hasher.update_i32(self.race_lap);
        hasher.update_u32(self.race_position as u32);
        hasher.update_u32(self.num_pickups_gobbled);
        hasher.update_f32(self.zipper_time_left);
        hasher.update_f32(self.magnet_time_left);
        hasher.update_u32(self.magnet_target.map_or(u32::MAX, |t| t as u32));
        hasher.update_bool(self.fire_held);
        hasher.update_u8(self.attachment.kind().map_or(u8::MAX, |k| k as u8));
        hasher.update_f32(self.attachment.time_left());
        hasher.update_u8(self.collectable.kind().map_or(u8::MAX, |k| k as u8));
        hasher.update_u32(self.collectable.count());
        let [s0, s1] = self.rng.state();
        hasher.update_u64(s0);
        hasher.update_u64(s1);
    }
}

impl Moveable for KartState {
    fn coord(&self) -> &Coord {
        &self.position
    }

    fn coord_mut(&mut self) -> &mut Coord {
        &mut self.position
    }

    fn velocity(&self) -> &Coord {
        &self.velocity
    }
}

// =============================================================================
// TESTS
// =============================================================================
