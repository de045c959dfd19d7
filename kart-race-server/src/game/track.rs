//! Track Projection
//!
//! The `Track` trait is the only view of track geometry the simulation has:
//! world position to (lateral, distance) track coordinates and back, seeded
//! by a cached segment hint. `DriveLine` is a closed polyline implementation
//! used by the demo server and tests.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::coord::{Coord, Vec3};

/// Segments searched on each side of the hint by `spatial_to_track`.
const HINT_SEARCH_WINDOW: usize = 4;

/// Spacing between grid slots along the track (m).
const GRID_SPACING: f32 = 1.5;

/// Lateral offset of grid slots from the centerline (m).
const GRID_LATERAL: f32 = 1.0;

/// Position expressed relative to the track centerline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackCoords {
    /// Signed offset from the centerline, positive to the left
    pub lateral: f32,
    /// Distance along the lap from the start line
    pub distance: f32,
}

impl TrackCoords {
    /// Create coordinates.
    pub const fn new(lateral: f32, distance: f32) -> Self {
        Self { lateral, distance }
    }
}

/// Result of projecting a world position onto the track.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackProjection {
    /// Track-relative coordinates
    pub coords: TrackCoords,
    /// Segment index the position projected onto
    pub hint: usize,
}

/// Read-only track geometry.
pub trait Track {
    /// Incremental projection searching near `hint`.
    fn spatial_to_track(&self, pos: Vec3, hint: usize) -> TrackProjection;

    /// Projection searching every segment.
    fn abs_spatial_to_track(&self, pos: Vec3) -> TrackProjection;

    /// Centerline point at the start of segment `hint`.
    fn track_to_spatial(&self, hint: usize) -> Vec3;

    /// Number of segments. Hints are always below this.
    fn num_segments(&self) -> usize;

    /// Starting coordinate for a grid slot.
    fn grid_coord(&self, grid_position: usize) -> Coord;
}

/// Invalid drive line geometry.
#[derive(Debug, Error)]
pub enum TrackError {
    /// Fewer than three points.
    #[error("drive line needs at least 3 points, got {0}")]
    TooFewPoints(usize),

    /// Two consecutive points coincide.
    #[error("drive line segment {0} has zero length")]
    DegenerateSegment(usize),
}

/// Closed polyline centerline. Segment `i` runs from point `i` to point
/// `i + 1`, wrapping at the end; the start line is at point 0.
#[derive(Clone, Debug)]
pub struct DriveLine {
    points: Vec<Vec3>,
    /// Distance from the start line to each point
    start_distance: Vec<f32>,
    lap_length: f32,
}

impl DriveLine {
    /// Build from centerline points.
    pub fn new(points: Vec<Vec3>) -> Result<Self, TrackError> {
        if points.len() < 3 {
            return Err(TrackError::TooFewPoints(points.len()));
        }

        let mut start_distance = Vec::with_capacity(points.len());
        let mut total = 0.0f32;
        for i in 0..points.len() {
            start_distance.push(total);
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            let len = a.planar_distance_squared(b).sqrt();
            if len <= f32::EPSILON {
                return Err(TrackError::DegenerateSegment(i));
            }
            total += len;
        }

        Ok(Self { points, start_distance, lap_length: total })
    }

    /// Circle of `radius` around the origin, driven counter-clockwise.
    pub fn circle(radius: f32, segments: usize) -> Result<Self, TrackError> {
        let points = (0..segments)
            .map(|i| {
                let a = std::f32::consts::TAU * i as f32 / segments as f32;
                Vec3::new(radius * a.cos(), radius * a.sin(), 0.0)
            })
            .collect();
        Self::new(points)
    }

    /// Total lap length.
    pub fn lap_length(&self) -> f32 {
        self.lap_length
    }

    fn segment(&self, i: usize) -> (Vec3, Vec3) {
        let n = self.points.len();
        (self.points[i % n], self.points[(i + 1) % n])
    }

    /// Heading (degrees) of segment `i`.
    pub fn segment_heading(&self, i: usize) -> f32 {
        let (a, b) = self.segment(i);
        (b - a).heading()
    }

    /// Project onto one segment: (planar distance², coords).
    fn project_onto(&self, pos: Vec3, i: usize) -> (f32, TrackCoords) {
        let (a, b) = self.segment(i);
        let ab = b - a;
        let ap = pos - a;
        let len_sq = ab.planar_length_squared();
        let t = ((ap.x * ab.x + ap.y * ab.y) / len_sq).clamp(0.0, 1.0);
        let closest = a + ab.scale(t);
        let len = len_sq.sqrt();
        let lateral = (ab.x * ap.y - ab.y * ap.x) / len;
        let coords = TrackCoords::new(lateral, self.start_distance[i % self.points.len()] + t * len);
        (pos.planar_distance_squared(closest), coords)
    }

    fn best_of(&self, pos: Vec3, candidates: impl Iterator<Item = usize>) -> TrackProjection {
        let mut best: Option<(f32, TrackProjection)> = None;
        for i in candidates {
            let (d, coords) = self.project_onto(pos, i);
            if best.as_ref().map_or(true, |(bd, _)| d < *bd) {
                best = Some((d, TrackProjection { coords, hint: i }));
            }
        }
        best.map(|(_, p)| p).unwrap_or(TrackProjection {
            coords: TrackCoords::default(),
            hint: 0,
        })
    }
}

impl Track for DriveLine {
    fn spatial_to_track(&self, pos: Vec3, hint: usize) -> TrackProjection {
        let n = self.points.len();
        let window = HINT_SEARCH_WINDOW.min(n / 2);
        let start = hint % n + n - window;
        self.best_of(pos, (start..=start + 2 * window).map(|i| i % n))
    }

    fn abs_spatial_to_track(&self, pos: Vec3) -> TrackProjection {
        self.best_of(pos, 0..self.points.len())
    }

    fn track_to_spatial(&self, hint: usize) -> Vec3 {
        self.points[hint % self.points.len()]
    }

    fn num_segments(&self) -> usize {
        self.points.len()
    }

    fn grid_coord(&self, grid_position: usize) -> Coord {
        // Slots are staggered behind the start line along the last segment
        let last = self.points.len() - 1;
        let heading = self.segment_heading(last);
        let (a, b) = self.segment(last);
        let dir = (b - a).planar_normalize();
        let left = Vec3::new(-dir.y, dir.x, 0.0);
        let back = GRID_SPACING * (grid_position as f32 + 1.0);
        let side = if grid_position % 2 == 0 { GRID_LATERAL } else { -GRID_LATERAL };
        let xyz = b - dir.scale(back) + left.scale(side);
        Coord::at(xyz, heading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> DriveLine {
        DriveLine::new(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(100.0, 0.0, 0.0),
            Vec3::new(100.0, 100.0, 0.0),
            Vec3::new(0.0, 100.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_geometry() {
        assert!(matches!(
            DriveLine::new(vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)]),
            Err(TrackError::TooFewPoints(2))
        ));
        assert!(matches!(
            DriveLine::new(vec![Vec3::ZERO, Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)]),
            Err(TrackError::DegenerateSegment(0))
        ));
    }

    #[test]
    fn test_abs_projection() {
        let track = square();
        assert_eq!(track.lap_length(), 400.0);

        // Left of the first segment (driving +X, left is +Y)
        let p = track.abs_spatial_to_track(Vec3::new(30.0, 2.0, 5.0));
        assert_eq!(p.hint, 0);
        assert!((p.coords.distance - 30.0).abs() < 1e-4);
        assert!((p.coords.lateral - 2.0).abs() < 1e-4);

        let p = track.abs_spatial_to_track(Vec3::new(102.0, 50.0, 0.0));
        assert_eq!(p.hint, 1);
        assert!((p.coords.distance - 150.0).abs() < 1e-4);
        assert!((p.coords.lateral + 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_hinted_projection_matches_abs_nearby() {
        let track = DriveLine::circle(40.0, 64).unwrap();
        let pos = Vec3::new(0.0, 40.5, 0.0);
        let abs = track.abs_spatial_to_track(pos);
        let near = track.spatial_to_track(pos, abs.hint + 1);
        assert_eq!(abs.hint, near.hint);
        assert_eq!(abs.coords, near.coords);
    }

    #[test]
    fn test_hint_wraps_around_start() {
        let track = DriveLine::circle(40.0, 64).unwrap();
        let pos = track.track_to_spatial(1);
        let p = track.spatial_to_track(pos, 63);
        assert!(p.hint == 0 || p.hint == 1);
        assert!(p.hint < track.num_segments());
    }

    #[test]
    fn test_grid_slots_are_apart_and_near_lap_end() {
        let track = DriveLine::circle(40.0, 64).unwrap();
        let slots: Vec<Coord> = (0..4).map(|i| track.grid_coord(i)).collect();
        for i in 0..slots.len() {
            for j in (i + 1)..slots.len() {
                assert!(slots[i].xyz.planar_distance_squared(slots[j].xyz) > 1.0);
            }
            let p = track.abs_spatial_to_track(slots[i].xyz);
            assert!(p.coords.distance > 100.0);
        }
    }
}
