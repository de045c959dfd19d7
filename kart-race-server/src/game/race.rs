//! Race Session
//!
//! Owns the grid, the track and the pickups and advances them one frame at
//! a time. This is the only entry point that mutates karts during a race.
//!
//! ## Frame
//!
//! ```text
//! bound dt → pickups respawn → kart 0 .. kart N (grid order)
//!   → drain events → race positions → finish check
//! ```
//!
//! Karts are updated strictly in grid order. A kart sees lower-index karts
//! as already updated this frame and higher-index karts as still at last
//! frame's state.

use std::sync::Arc;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::coord::Coord;
use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::rng::DeterministicRng;
use crate::game::config::{ConfigError, KartProperties, RaceConfig, FIXED_FRAME_DT, MAX_FRAME_DT};
use crate::game::events::KartEvent;
use crate::game::input::{ControlRecording, KartControls};
use crate::game::kart::{FrameContext, KartSensors, KartState, OtherKarts};
use crate::game::pickup::PickupManager;
use crate::game::snapshot::{KartSnapshot, RaceSnapshot, SnapshotError};
use crate::game::track::Track;

// =============================================================================
// TYPES
// =============================================================================

/// Race setup failure.
#[derive(Debug, Error)]
pub enum RaceError {
    /// No karts on the grid.
    #[error("race needs at least one kart")]
    EmptyGrid,

    /// Race-wide configuration rejected.
    #[error("invalid race config: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// A kart type was rejected.
    #[error("kart {grid_position} has invalid properties: {source}")]
    InvalidKart {
        /// Grid slot of the kart
        grid_position: usize,
        /// What was wrong
        #[source]
        source: ConfigError,
    },

    /// `start` called while a race is running.
    #[error("race already started")]
    AlreadyStarted,
}

/// Race lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RacePhase {
    /// Karts placed, not started
    Limbo,
    /// Counting down to the start
    Countdown {
        /// Frames until racing starts
        frames_remaining: u32,
    },
    /// Race is on
    Racing,
    /// Every kart has completed the race
    Finished,
}

impl RacePhase {
    fn code(self) -> u8 {
        match self {
            RacePhase::Limbo => 0,
            RacePhase::Countdown { .. } => 1,
            RacePhase::Racing => 2,
            RacePhase::Finished => 3,
        }
    }
}

/// Result of one `Race::update`.
#[derive(Debug, Default)]
pub struct FrameResult {
    /// Frame number after the update
    pub frame: u64,
    /// Events raised this frame, in grid order
    pub events: Vec<KartEvent>,
    /// Race finished this frame
    pub race_finished: bool,
}

// =============================================================================
// RACE
// =============================================================================

/// A race session.
pub struct Race<T: Track, P: PickupManager> {
    track: T,
    pickups: P,
    config: RaceConfig,
    karts: Vec<KartState>,
    phase: RacePhase,
    frame: u64,
}

impl<T: Track, P: PickupManager> Race<T, P> {
    /// Place the grid. Karts sit at their start slots until `start`.
    pub fn new(
        track: T,
        pickups: P,
        config: RaceConfig,
        grid: Vec<KartProperties>,
    ) -> Result<Self, RaceError> {
        if grid.is_empty() {
            return Err(RaceError::EmptyGrid);
        }
        config.validate()?;

        let mut karts = Vec::with_capacity(grid.len());
        for (grid_position, properties) in grid.into_iter().enumerate() {
            properties
                .validate()
                .map_err(|source| RaceError::InvalidKart { grid_position, source })?;
            let mut kart = KartState::new(
                grid_position,
                Arc::new(properties),
                track.grid_coord(grid_position),
                DeterministicRng::for_kart(config.seed, grid_position),
            );
            kart.reset(&track);
            karts.push(kart);
        }

        Ok(Self {
            track,
            pickups,
            config,
            karts,
            phase: RacePhase::Limbo,
            frame: 0,
        })
    }

    /// Reset every kart and begin the countdown.
    pub fn start(&mut self) -> Result<(), RaceError> {
        if matches!(self.phase, RacePhase::Countdown { .. } | RacePhase::Racing) {
            return Err(RaceError::AlreadyStarted);
        }
        for kart in &mut self.karts {
            kart.reset(&self.track);
        }
        self.frame = 0;
        self.phase = match self.config.countdown_frames {
            0 => RacePhase::Racing,
            frames => RacePhase::Countdown { frames_remaining: frames },
        };
        info!(karts = self.karts.len(), laps = self.config.num_laps, "race started");
        Ok(())
    }

    /// Advance by `dt` seconds.
    ///
    /// Non-positive or non-finite `dt` is ignored; larger steps are bounded
    /// by `MAX_FRAME_DT`.
    pub fn update(&mut self, dt: f32) -> FrameResult {
        let mut result = FrameResult { frame: self.frame, ..Default::default() };

        if !dt.is_finite() || dt <= 0.0 {
            return result;
        }
        let dt = dt.min(MAX_FRAME_DT);

        match self.phase {
            RacePhase::Limbo | RacePhase::Finished => return result,
            RacePhase::Countdown { frames_remaining } => {
                self.frame += 1;
                result.frame = self.frame;
                self.phase = if frames_remaining <= 1 {
                    debug!(frame = self.frame, "countdown over");
                    RacePhase::Racing
                } else {
                    RacePhase::Countdown { frames_remaining: frames_remaining - 1 }
                };
                return result;
            }
            RacePhase::Racing => {}
        }

        self.frame += 1;
        result.frame = self.frame;

        self.pickups.update(dt);

        let ctx = FrameContext {
            dt,
            gravity: self.config.gravity,
            params: &self.config.physics,
            track: &self.track,
        };
        for i in 0..self.karts.len() {
            let (before, rest) = self.karts.split_at_mut(i);
            let Some((kart, after)) = rest.split_first_mut() else {
                break;
            };
            let mut others = OtherKarts { before, after };
            kart.update(&ctx, &mut others, &mut self.pickups);
            // contact reports cover one frame
            kart.sensors.collided = false;
            kart.sensors.crashed = false;
        }

        for kart in &mut self.karts {
            let grid_position = kart.grid_position;
            result.events.extend(
                kart.take_events()
                    .into_iter()
                    .map(|data| KartEvent::new(self.frame, grid_position, data)),
            );
        }

        self.update_race_positions();

        if self.karts.iter().all(|k| k.race_lap >= self.config.num_laps) {
            self.phase = RacePhase::Finished;
            result.race_finished = true;
            info!(frame = self.frame, "race finished");
        }

        result
    }

    /// Rank karts by lap, then distance down the track, then grid order.
    pub fn update_race_positions(&mut self) {
        let mut order: Vec<usize> = (0..self.karts.len()).collect();
        order.sort_by(|&a, &b| {
            let (ka, kb) = (&self.karts[a], &self.karts[b]);
            kb.race_lap
                .cmp(&ka.race_lap)
                .then(kb.distance_down_track().total_cmp(&ka.distance_down_track()))
                .then(a.cmp(&b))
        });
        for (rank, index) in order.into_iter().enumerate() {
            self.karts[index].race_position = rank + 1;
        }
    }

    /// Set the controls a kart uses from the next update on.
    pub fn set_controls(&mut self, grid_position: usize, controls: KartControls) {
        if let Some(kart) = self.karts.get_mut(grid_position) {
            kart.controls = controls;
        }
    }

    /// Contact sensors of a kart, for the collision detector to fill in.
    pub fn sensors_mut(&mut self, grid_position: usize) -> Option<&mut KartSensors> {
        self.karts.get_mut(grid_position).map(|k| &mut k.sensors)
    }

    /// Queue a rescue for a kart.
    pub fn request_rescue(&mut self, grid_position: usize) {
        if let Some(kart) = self.karts.get_mut(grid_position) {
            kart.request_rescue();
        }
    }

    /// Karts in grid order.
    pub fn karts(&self) -> &[KartState] {
        &self.karts
    }

    /// One kart.
    pub fn kart(&self, grid_position: usize) -> Option<&KartState> {
        self.karts.get(grid_position)
    }

    /// Mutable kart access.
    pub fn kart_mut(&mut self, grid_position: usize) -> Option<&mut KartState> {
        self.karts.get_mut(grid_position)
    }

    /// Render poses in grid order.
    pub fn render_transforms(&self) -> Vec<Coord> {
        self.karts.iter().map(KartState::render_transform).collect()
    }

    /// Grid indices ordered by race position.
    pub fn standings(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.karts.len()).collect();
        order.sort_by_key(|&i| self.karts[i].race_position);
        order
    }

    /// Track.
    pub fn track(&self) -> &T {
        &self.track
    }

    /// Pickups.
    pub fn pickups(&self) -> &P {
        &self.pickups
    }

    /// Configuration.
    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    /// Current phase.
    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    /// Frames advanced since `start`.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// True once every kart has finished.
    pub fn is_finished(&self) -> bool {
        self.phase == RacePhase::Finished
    }

    /// Hash of everything that influences future frames.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.frame, self.config.seed, |hasher| {
            hasher.update_u8(self.phase.code());
            if let RacePhase::Countdown { frames_remaining } = self.phase {
                hasher.update_u32(frames_remaining);
            }
            hasher.update_u32(self.karts.len() as u32);
            for kart in &self.karts {
                kart.hash_into(hasher);
            }
            self.pickups.hash_into(hasher);
        })
    }

    /// Capture the replicated state.
    pub fn snapshot(&self) -> RaceSnapshot {
        RaceSnapshot {
            frame: self.frame,
            phase: self.phase,
            karts: self.karts.iter().map(KartSnapshot::capture).collect(),
        }
    }

    /// Overwrite the replicated state from a snapshot of the same grid.
    pub fn apply_snapshot(&mut self, snapshot: &RaceSnapshot) -> Result<(), SnapshotError> {
        if snapshot.karts.len() != self.karts.len() {
            return Err(SnapshotError::GridMismatch {
                expected: self.karts.len(),
                got: snapshot.karts.len(),
            });
        }
        self.frame = snapshot.frame;
        self.phase = snapshot.phase;
        for (kart, snap) in self.karts.iter_mut().zip(&snapshot.karts) {
            snap.apply(kart);
        }
        Ok(())
    }
}

/// Re-run a race from recorded controls and sensor reports at the fixed
/// frame step.
///
/// Runs until `frames` frames have elapsed or the race finishes. Returns the
/// final race and every event raised. A live race replays to the same hash
/// only if every `sensors_mut` change was also passed to
/// `ControlRecording::record_sensors`.
pub fn replay_race<T: Track, P: PickupManager>(
    track: T,
    pickups: P,
    config: RaceConfig,
    grid: Vec<KartProperties>,
    recordings: &[ControlRecording],
    frames: u64,
) -> Result<(Race<T, P>, Vec<KartEvent>), RaceError> {
    let mut race = Race::new(track, pickups, config, grid)?;
    race.start()?;

    let mut events = Vec::new();
    while race.frame() < frames && !race.is_finished() {
        let frame = race.frame();
        for (grid_position, recording) in recordings.iter().enumerate() {
            race.set_controls(grid_position, recording.input_at(frame).to_controls());
            if let Some(report) = recording.sensors_at(frame) {
                if let Some(sensors) = race.sensors_mut(grid_position) {
                    *sensors = report;
                }
            }
        }
        events.extend(race.update(FIXED_FRAME_DT).events);
    }

    Ok((race, events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coord::Vec3;
    use crate::game::events::KartEventData;
    use crate::game::input::ControlFrame;
    use crate::game::pickup::{PickupField, PickupKind};
    use crate::game::track::DriveLine;

    fn test_race(karts: usize) -> Race<DriveLine, PickupField> {
        let track = DriveLine::circle(40.0, 64).unwrap();
        let mut pickups = PickupField::new();
        pickups.add(track.track_to_spatial(3), PickupKind::Rare);
        let config = RaceConfig { countdown_frames: 0, seed: 7, ..Default::default() };
        Race::new(track, pickups, config, vec![KartProperties::default(); karts]).unwrap()
    }

    fn drive(race: &mut Race<DriveLine, PickupField>, frames: usize) -> Vec<KartEvent> {
        let mut events = Vec::new();
        for f in 0..frames {
            for i in 0..race.karts().len() {
                let steer = if (f / 30 + i) % 2 == 0 { 0.2 } else { -0.3 };
                race.set_controls(i, KartControls { accel: 0.8, steer, ..Default::default() });
            }
            events.extend(race.update(FIXED_FRAME_DT).events);
        }
        events
    }

    #[test]
    fn test_setup_errors() {
        let track = DriveLine::circle(40.0, 64).unwrap();
        assert!(matches!(
            Race::new(track.clone(), PickupField::new(), RaceConfig::default(), vec![]),
            Err(RaceError::EmptyGrid)
        ));

        let bad = KartProperties { mass: -5.0, ..Default::default() };
        assert!(matches!(
            Race::new(
                track.clone(),
                PickupField::new(),
                RaceConfig::default(),
                vec![KartProperties::default(), bad]
            ),
            Err(RaceError::InvalidKart { grid_position: 1, .. })
        ));

        let config = RaceConfig { num_laps: 0, ..Default::default() };
        assert!(matches!(
            Race::new(track, PickupField::new(), config, vec![KartProperties::default()]),
            Err(RaceError::InvalidConfig(ConfigError::NoLaps))
        ));
    }

    #[test]
    fn test_limbo_until_started() {
        let mut race = test_race(2);
        race.set_controls(0, KartControls { accel: 1.0, ..Default::default() });
        race.update(FIXED_FRAME_DT);
        assert_eq!(race.frame(), 0);
        assert_eq!(race.kart(0).unwrap().velocity, Coord::ZERO);

        race.start().unwrap();
        assert!(matches!(race.start(), Err(RaceError::AlreadyStarted)));
        assert_eq!(race.phase(), RacePhase::Racing);
    }

    #[test]
    fn test_countdown_holds_karts() {
        let track = DriveLine::circle(40.0, 64).unwrap();
        let config = RaceConfig { countdown_frames: 3, ..Default::default() };
        let mut race =
            Race::new(track, PickupField::new(), config, vec![KartProperties::default()]).unwrap();
        race.start().unwrap();
        race.set_controls(0, KartControls { accel: 1.0, ..Default::default() });

        for _ in 0..3 {
            assert!(matches!(race.phase(), RacePhase::Countdown { .. }));
            race.update(FIXED_FRAME_DT);
        }
        assert_eq!(race.phase(), RacePhase::Racing);
        assert_eq!(race.kart(0).unwrap().velocity.xyz.y, 0.0);

        race.update(FIXED_FRAME_DT);
        assert!(race.kart(0).unwrap().velocity.xyz.y > 0.0);
    }

    #[test]
    fn test_race_determinism() {
        let mut a = test_race(4);
        let mut b = test_race(4);
        a.start().unwrap();
        b.start().unwrap();

        let events_a = drive(&mut a, 300);
        let events_b = drive(&mut b, 300);

        assert_eq!(a.compute_hash(), b.compute_hash());
        assert_eq!(events_a, events_b);
    }

    #[test]
    fn test_hash_changes_with_state() {
        let mut race = test_race(2);
        race.start().unwrap();
        let before = race.compute_hash();
        drive(&mut race, 1);
        assert_ne!(before, race.compute_hash());
    }

    #[test]
    fn test_dt_bounds() {
        let mut a = test_race(2);
        let mut b = test_race(2);
        a.start().unwrap();
        b.start().unwrap();

        for dt in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            a.update(dt);
        }
        assert_eq!(a.frame(), 0);

        for race in [&mut a, &mut b] {
            race.set_controls(0, KartControls { accel: 1.0, ..Default::default() });
        }
        a.update(1.0);
        b.update(MAX_FRAME_DT);
        assert_eq!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn test_crash_sensor_stops_kart() {
        let mut race = test_race(1);
        race.start().unwrap();
        race.kart_mut(0).unwrap().velocity.xyz.y = 20.0;
        race.sensors_mut(0).unwrap().crashed = true;

        let result = race.update(FIXED_FRAME_DT);

        let kart = race.kart(0).unwrap();
        assert_eq!(kart.velocity, Coord::ZERO);
        assert!(result
            .events
            .iter()
            .any(|e| e.kart == 0 && matches!(e.data, KartEventData::Crashed { .. })));
        // the sensor report does not carry over
        assert!(!kart.sensors.crashed);
    }

    #[test]
    fn test_race_positions() {
        let mut race = test_race(3);
        race.start().unwrap();
        {
            let karts = &mut race.karts;
            karts[0].race_lap = 1;
            karts[0].curr_track_coords.distance = 10.0;
            karts[1].race_lap = 1;
            karts[1].curr_track_coords.distance = 50.0;
            karts[2].race_lap = 2;
            karts[2].curr_track_coords.distance = 5.0;
        }
        race.update_race_positions();

        assert_eq!(race.standings(), vec![2, 1, 0]);
        assert_eq!(race.kart(2).unwrap().race_position, 1);
        assert_eq!(race.kart(0).unwrap().race_position, 3);
    }

    #[test]
    fn test_finishes_when_all_done() {
        let mut race = test_race(2);
        race.start().unwrap();
        race.kart_mut(0).unwrap().race_lap = 3;
        race.update(FIXED_FRAME_DT);
        assert_eq!(race.phase(), RacePhase::Racing);

        race.kart_mut(1).unwrap().race_lap = 3;
        let result = race.update(FIXED_FRAME_DT);
        assert!(result.race_finished);
        assert!(race.is_finished());

        let frame = race.frame();
        race.update(FIXED_FRAME_DT);
        assert_eq!(race.frame(), frame);
    }

    #[test]
    fn test_rescue_through_race() {
        let mut race = test_race(1);
        race.start().unwrap();
        race.kart_mut(0).unwrap().position.xyz = Vec3::new(0.0, 0.0, 1.0);
        race.request_rescue(0);

        let result = race.update(FIXED_FRAME_DT);
        assert!(result
            .events
            .iter()
            .any(|e| matches!(e.data, KartEventData::Rescued { .. })));
        assert!(race.kart(0).unwrap().attachment.holds_kart());
    }

    #[test]
    fn test_replay_matches_live_race() {
        let track = DriveLine::circle(40.0, 64).unwrap();
        let config = RaceConfig { countdown_frames: 10, seed: 3, ..Default::default() };
        let grid = vec![KartProperties::default(); 3];

        let mut live = Race::new(track.clone(), PickupField::new(), config.clone(), grid.clone())
            .unwrap();
        live.start().unwrap();
        let mut recordings = vec![ControlRecording::new(); 3];
        for f in 0..200u64 {
            let frame = live.frame();
            for (i, rec) in recordings.iter_mut().enumerate() {
                let steer = if (f / 40) % 2 == 0 { 10 } else { -20 - i as i8 };
                let input = ControlFrame::driving(200, steer);
                rec.record(frame, input);
                live.set_controls(i, input.to_controls());
            }
            live.update(FIXED_FRAME_DT);
        }

        let (replayed, _) =
            replay_race(track, PickupField::new(), config, grid, &recordings, live.frame())
                .unwrap();
        assert_eq!(replayed.frame(), live.frame());
        assert_eq!(replayed.compute_hash(), live.compute_hash());
    }

    #[test]
    fn test_snapshot_restores_replicated_state() {
        let mut race = test_race(2);
        race.start().unwrap();
        drive(&mut race, 30);
        let snap = race.snapshot();
        let bytes = snap.to_bytes().unwrap();

        let mut other = test_race(2);
        other.apply_snapshot(&RaceSnapshot::from_bytes(&bytes).unwrap()).unwrap();
        assert_eq!(other.frame(), race.frame());
        assert_eq!(other.kart(1).unwrap().position, race.kart(1).unwrap().position);

        let mut small = test_race(1);
        assert!(matches!(
            small.apply_snapshot(&snap),
            Err(SnapshotError::GridMismatch { expected: 1, got: 2 })
        ));
    }

    #[test]
    fn test_snapshot_after_line_crossing_keeps_lap() {
        let full_throttle = KartControls { accel: 1.0, ..Default::default() };
        let mut live = test_race(1);
        live.start().unwrap();
        for _ in 0..300 {
            live.set_controls(0, full_throttle);
            live.update(FIXED_FRAME_DT);
            if live.kart(0).unwrap().race_lap == 0 {
                break;
            }
        }
        assert_eq!(live.kart(0).unwrap().race_lap, 0);

        let mut remote = test_race(1);
        remote.start().unwrap();
        remote.apply_snapshot(&live.snapshot()).unwrap();

        for race in [&mut live, &mut remote] {
            race.set_controls(0, full_throttle);
            race.update(FIXED_FRAME_DT);
        }
        let (l, r) = (live.kart(0).unwrap(), remote.kart(0).unwrap());
        assert_eq!(r.race_lap, l.race_lap);
        assert_eq!(r.position, l.position);
        assert_eq!(r.velocity, l.velocity);
        assert_eq!(remote.compute_hash(), live.compute_hash());
    }

    #[test]
    fn test_replay_reapplies_sensor_reports() {
        let track = DriveLine::circle(40.0, 64).unwrap();
        let config = RaceConfig { countdown_frames: 0, seed: 5, ..Default::default() };
        let grid = vec![KartProperties::default(); 2];

        let mut live = Race::new(track.clone(), PickupField::new(), config.clone(), grid.clone())
            .unwrap();
        live.start().unwrap();
        let mut recordings = vec![ControlRecording::new(); 2];
        for _ in 0..120u64 {
            let frame = live.frame();
            for (i, rec) in recordings.iter_mut().enumerate() {
                let input = ControlFrame::driving(255, 0);
                rec.record(frame, input);
                live.set_controls(i, input.to_controls());
            }
            if frame == 60 {
                let sensors = live.sensors_mut(1).unwrap();
                sensors.crashed = true;
                let report = *sensors;
                recordings[1].record_sensors(frame, report);
            }
            live.update(FIXED_FRAME_DT);
        }

        let (replayed, events) =
            replay_race(track, PickupField::new(), config, grid, &recordings, live.frame())
                .unwrap();
        assert!(events
            .iter()
            .any(|e| e.kart == 1 && matches!(e.data, KartEventData::Crashed { .. })));
        assert_eq!(replayed.compute_hash(), live.compute_hash());
    }
}

