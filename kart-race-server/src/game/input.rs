//! Control Input
//!
//! `KartControls` is what the dynamics model reads each frame.
//! `ControlFrame` is the packed form recorded for replays and sent over the
//! wire; its conversion to floats is exact and platform independent.
//! Sensor reports fed in from outside are recorded next to the controls.

use serde::{Serialize, Deserialize};

use crate::game::kart::KartSensors;

// =============================================================================
// CONTROLS
// =============================================================================

/// Driver or AI controls for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KartControls {
    /// Throttle, 0..1
    pub accel: f32,
    /// Brake (reverse when stopped)
    pub brake: bool,
    /// Steering, -1 (left) ..1 (right)
    pub steer: f32,
    /// Jump requested
    pub jump: bool,
    /// Use the held collectable
    pub fire: bool,
}

impl KartControls {
    /// Clamp analog axes into range; non-finite values become 0.
    pub fn sanitized(self) -> Self {
        let clean = |v: f32, lo: f32, hi: f32| if v.is_finite() { v.clamp(lo, hi) } else { 0.0 };
        Self {
            accel: clean(self.accel, 0.0, 1.0),
            steer: clean(self.steer, -1.0, 1.0),
            ..self
        }
    }
}

// =============================================================================
// PACKED FRAME
// =============================================================================

/// Packed control record: 3 bytes per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFrame {
    /// Throttle 0..=255
    pub accel: u8,
    /// Steering -127..=127 (-128 treated as centered)
    pub steer: i8,
    /// Button flags (FLAG_*)
    pub flags: u8,
}

impl ControlFrame {
    /// Brake flag bit
    pub const FLAG_BRAKE: u8 = 0x01;
    /// Jump flag bit
    pub const FLAG_JUMP: u8 = 0x02;
    /// Fire flag bit
    pub const FLAG_FIRE: u8 = 0x04;

    /// Idle frame.
    pub const fn new() -> Self {
        Self { accel: 0, steer: 0, flags: 0 }
    }

    /// Frame with throttle and steering only.
    pub const fn driving(accel: u8, steer: i8) -> Self {
        Self { accel, steer, flags: 0 }
    }

    /// Set or clear a flag bit.
    #[inline]
    pub fn set_flag(&mut self, flag: u8, pressed: bool) {
        if pressed {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    /// Builder form of `set_flag`.
    pub fn with_flag(mut self, flag: u8) -> Self {
        self.set_flag(flag, true);
        self
    }

    /// Unpack into float controls.
    pub fn to_controls(self) -> KartControls {
        let steer = if self.steer == i8::MIN { 0 } else { self.steer };
        KartControls {
            accel: self.accel as f32 / 255.0,
            brake: self.flags & Self::FLAG_BRAKE != 0,
            steer: steer as f32 / 127.0,
            jump: self.flags & Self::FLAG_JUMP != 0,
            fire: self.flags & Self::FLAG_FIRE != 0,
        }
    }
}

// =============================================================================
// RECORDING
// =============================================================================

/// Delta-compressed control history for one kart.
///
/// Only frames where the input changed are stored. Sensor reports are kept
/// per frame they were made on.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ControlRecording {
    deltas: Vec<(u64, ControlFrame)>,
    last_frame: ControlFrame,
    end_frame: u64,
    #[serde(default)]
    sensor_reports: Vec<(u64, KartSensors)>,
}

impl ControlRecording {
    /// Empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the input used at `frame`. Frames must be recorded in order.
    pub fn record(&mut self, frame: u64, input: ControlFrame) {
        self.end_frame = frame;
        if self.deltas.is_empty() || input != self.last_frame {
            self.deltas.push((frame, input));
            self.last_frame = input;
        }
    }

    /// Input in effect at `frame` (idle before the first record).
    pub fn input_at(&self, frame: u64) -> ControlFrame {
        let idx = self.deltas.partition_point(|(f, _)| *f <= frame);
        if idx == 0 {
            ControlFrame::new()
        } else {
            self.deltas[idx - 1].1
        }
    }

    /// Record the sensor state reported before the update of `frame`.
    /// A later report for the same frame replaces the earlier one.
    pub fn record_sensors(&mut self, frame: u64, sensors: KartSensors) {
        match self.sensor_reports.last_mut() {
            Some((f, last)) if *f == frame => *last = sensors,
            _ => self.sensor_reports.push((frame, sensors)),
        }
    }

    /// Sensor report made at exactly `frame`.
    pub fn sensors_at(&self, frame: u64) -> Option<KartSensors> {
        self.sensor_reports
            .binary_search_by_key(&frame, |(f, _)| *f)
            .ok()
            .map(|idx| self.sensor_reports[idx].1)
    }

    /// Number of stored deltas.
    pub fn delta_count(&self) -> usize {
        self.deltas.len()
    }

    /// Last recorded frame number.
    pub fn end_frame(&self) -> u64 {
        self.end_frame
    }
}
