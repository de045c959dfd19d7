//! Skid Trails
//!
//! Each rear wheel side runs a two-state machine (stroking / broken) driven
//! by the kart's `skidding` and ground flags. The machine emits
//! `SkidEvent`s; drawing the trail is left to the renderer, which can replay
//! the events into a `SkidTrail`.

use serde::{Serialize, Deserialize};

use crate::core::coord::{Coord, Vec3};
use crate::game::config::{SKID_OFFSET_LENGTH, SKID_SIDE_ANGLE};
use crate::game::events::KartEventData;
use crate::game::kart::KartState;

/// Rear wheel side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WheelSide {
    /// Left rear wheel
    Left,
    /// Right rear wheel
    Right,
}

impl WheelSide {
    /// Angle of the wheel contact point from the kart axis (degrees).
    pub fn angle(self) -> f32 {
        match self {
            WheelSide::Left => -SKID_SIDE_ANGLE,
            WheelSide::Right => SKID_SIDE_ANGLE,
        }
    }

    /// Contact point of this wheel for a kart at `pos`.
    pub fn contact_point(self, pos: &Coord) -> Vec3 {
        pos.rear_offset(SKID_OFFSET_LENGTH, self.angle())
    }
}

/// Trail state for one wheel side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkidState {
    /// A stroke is open and being extended
    Stroking,
    /// No stroke is open
    #[default]
    Broken,
}

/// What happened to the trail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkidEventKind {
    /// New stroke begins at the point
    Start,
    /// Point appended to the open stroke
    Extend,
    /// Gap: the open stroke (if any) ends here
    Break,
}

/// One trail update for one wheel side.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkidEvent {
    /// Wheel side
    pub side: WheelSide,
    /// Event kind
    pub kind: SkidEventKind,
    /// World-space contact point
    pub point: Vec3,
}

/// State machine for a single wheel side.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkidMark {
    side: WheelSide,
    state: SkidState,
}

impl SkidMark {
    /// New machine in the broken state.
    pub fn new(side: WheelSide) -> Self {
        Self { side, state: SkidState::Broken }
    }

    /// Current state.
    pub fn state(&self) -> SkidState {
        self.state
    }

    /// True while a stroke is open.
    pub fn is_marking(&self) -> bool {
        self.state == SkidState::Stroking
    }

    /// Advance one frame.
    pub fn update(&mut self, pos: &Coord, skidding: bool, on_ground: bool) -> Option<SkidEvent> {
        let kind = match (skidding, on_ground, self.state) {
            (true, true, SkidState::Stroking) => SkidEventKind::Extend,
            (true, true, SkidState::Broken) => {
                self.state = SkidState::Stroking;
                SkidEventKind::Start
            }
            // airborne wheels never mark, a break is registered every frame
            (true, false, _) => {
                self.state = SkidState::Broken;
                SkidEventKind::Break
            }
            (false, _, SkidState::Stroking) => {
                self.state = SkidState::Broken;
                SkidEventKind::Break
            }
            (false, _, SkidState::Broken) => return None,
        };

        Some(SkidEvent {
            side: self.side,
            kind,
            point: self.side.contact_point(pos),
        })
    }

    /// Back to broken without emitting anything.
    pub fn reset(&mut self) {
        self.state = SkidState::Broken;
    }
}

/// Both rear wheel machines of a kart.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkidMarks {
    /// Left side
    pub left: SkidMark,
    /// Right side
    pub right: SkidMark,
}

impl Default for SkidMarks {
    fn default() -> Self {
        Self {
            left: SkidMark::new(WheelSide::Left),
            right: SkidMark::new(WheelSide::Right),
        }
    }
}

impl SkidMarks {
    /// Advance both sides, left first.
    pub fn process(
        &mut self,
        pos: &Coord,
        skidding: bool,
        on_ground: bool,
        out: &mut Vec<SkidEvent>,
    ) {
        out.extend(self.left.update(pos, skidding, on_ground));
        out.extend(self.right.update(pos, skidding, on_ground));
    }

    /// Reset both sides.
    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}

/// Renderer-side accumulation of skid events for one wheel side.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkidTrail {
    /// Closed and open strokes, oldest first
    pub strokes: Vec<Vec<Vec3>>,
    /// Number of breaks seen
    pub breaks: usize,
    open: bool,
}

impl SkidTrail {
    /// Empty trail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event.
    pub fn apply(&mut self, event: &SkidEvent) {
        match event.kind {
            SkidEventKind::Start => {
                self.strokes.push(vec![event.point]);
                self.open = true;
            }
            SkidEventKind::Extend => match self.strokes.last_mut() {
                Some(stroke) if self.open => stroke.push(event.point),
                _ => {
                    self.strokes.push(vec![event.point]);
                    self.open = true;
                }
            },
            SkidEventKind::Break => {
                self.breaks += 1;
                self.open = false;
            }
        }
    }
}

impl KartState {
    /// Advance the skid trail from this frame's skid and ground flags and
    /// queue the resulting events.
    pub fn process_skid_marks(&mut self) {
        let mut events = Vec::with_capacity(2);
        self.skid_marks
            .process(&self.position, self.skidding, self.sensors.on_ground, &mut events);
        for event in events {
            self.push_event(KartEventData::Skid(event));
        }
    }
}
