//! Track Progress
//!
//! Keeps the kart's track coordinates current, counts laps from start-line
//! crossings and puts a lost kart back on the centerline.

use tracing::debug;

use crate::game::config::{LAP_END_BAND, LAP_START_BAND};
use crate::game::events::KartEventData;
use crate::game::kart::KartState;
use crate::game::track::Track;

/// Lap delta for a move between two distances down the track.
///
/// Crossing the start line forward (late in the lap to early) is +1,
/// backward is -1.
pub fn lap_crossing(last_distance: f32, curr_distance: f32) -> i32 {
    if last_distance > LAP_END_BAND && curr_distance < LAP_START_BAND {
        1
    } else if curr_distance > LAP_END_BAND && last_distance < LAP_START_BAND {
        -1
    } else {
        0
    }
}

impl KartState {
    /// Distance along the current lap.
    pub fn distance_down_track(&self) -> f32 {
        self.curr_track_coords.distance
    }

    /// Re-project the position, searching near the cached hint.
    pub fn update_track_coords(&mut self, track: &dyn Track) {
        let projection = track.spatial_to_track(self.position.xyz, self.track_hint);
        self.curr_track_coords = projection.coords;
        self.track_hint = projection.hint;
    }

    /// Reseed the hint with a search over the whole track.
    pub fn reset_track_hint(&mut self, track: &dyn Track) {
        let projection = track.abs_spatial_to_track(self.position.xyz);
        self.curr_track_coords = projection.coords;
        self.last_track_coords = projection.coords;
        self.track_hint = projection.hint;
    }

    /// Update the lap counter from last and current track distance.
    pub fn do_lap_counting(&mut self) {
        let delta = lap_crossing(self.last_track_coords.distance, self.curr_track_coords.distance);
        if delta == 0 {
            return;
        }
        self.race_lap += delta;
        debug!(kart = self.grid_position, lap = self.race_lap, delta, "lap changed");
        self.push_event(KartEventData::LapChanged { lap: self.race_lap, delta });
    }

    /// Step back one segment and move onto the centerline there, keeping
    /// the current height.
    pub fn handle_rescue(&mut self, track: &dyn Track) {
        self.track_hint = self.track_hint.saturating_sub(1);
        let z = self.position.xyz.z;
        self.position.xyz = track.track_to_spatial(self.track_hint);
        self.position.xyz.z = z;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::kart::tests::test_kart;
    use crate::game::track::TrackCoords;

    #[test]
    fn test_lap_crossing() {
        assert_eq!(lap_crossing(105.0, 15.0), 1);
        assert_eq!(lap_crossing(15.0, 105.0), -1);
        assert_eq!(lap_crossing(50.0, 60.0), 0);
        assert_eq!(lap_crossing(100.0, 15.0), 0);
    }

    #[test]
    fn test_lap_counting_events() {
        let (mut kart, _) = test_kart(0);
        kart.take_events();

        kart.last_track_coords = TrackCoords::new(0.0, 105.0);
        kart.curr_track_coords = TrackCoords::new(0.0, 15.0);
        kart.do_lap_counting();
        assert_eq!(kart.race_lap, 0);

        kart.last_track_coords = TrackCoords::new(0.0, 15.0);
        kart.curr_track_coords = TrackCoords::new(0.0, 105.0);
        kart.do_lap_counting();
        assert_eq!(kart.race_lap, -1);

        kart.last_track_coords = TrackCoords::new(0.0, 50.0);
        kart.curr_track_coords = TrackCoords::new(0.0, 60.0);
        kart.do_lap_counting();
        assert_eq!(kart.race_lap, -1);

        let events = kart.take_events();
        assert_eq!(
            events,
            vec![
                KartEventData::LapChanged { lap: 0, delta: 1 },
                KartEventData::LapChanged { lap: -1, delta: -1 },
            ]
        );
    }

    #[test]
    fn test_rescue_steps_back_keeping_height() {
        let (mut kart, track) = test_kart(0);
        kart.track_hint = 5;
        kart.position.xyz.z = 2.5;

        kart.handle_rescue(&track);

        assert_eq!(kart.track_hint, 4);
        let expected = track.track_to_spatial(4);
        assert_eq!(kart.position.xyz.x, expected.x);
        assert_eq!(kart.position.xyz.y, expected.y);
        assert_eq!(kart.position.xyz.z, 2.5);
    }

    #[test]
    fn test_rescue_hint_floor() {
        let (mut kart, track) = test_kart(0);
        kart.track_hint = 0;
        kart.handle_rescue(&track);
        assert_eq!(kart.track_hint, 0);
    }

    #[test]
    fn test_reprojection_follows_movement() {
        let (mut kart, track) = test_kart(0);
        kart.position.xyz = track.track_to_spatial(10);
        kart.track_hint = 9;
        kart.update_track_coords(&track);
        assert!(kart.track_hint == 9 || kart.track_hint == 10);
        assert!(kart.distance_down_track() > 0.0);
    }
}
