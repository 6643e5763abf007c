//! Sonar pulses and echo memory
//!
//! A pulse is a single ray cast inside the sonar cone. Only the nearest wall
//! it crosses answers. Readings are normalized into [-1, 1] and kept in a
//! fixed-length memory that doubles as the agent's observation.

use std::collections::VecDeque;
use std::f32::consts::PI;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{BodyVec, Segment, body_to_world, segment_intersection, world_to_body};
use crate::consts::*;
use crate::wrap_angle;

/// Sonar parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SonarConfig {
    /// Maximum sensing range (meters); a wall exactly at this range is heard
    pub max_range: f32,
    /// Half-width of the emission cone around the forward axis (radians)
    pub half_angle: f32,
    /// Number of readings kept in memory
    pub n_memory: usize,
}

impl Default for SonarConfig {
    fn default() -> Self {
        Self {
            max_range: SONAR_RANGE,
            half_angle: PULSE_HALF_ANGLE,
            n_memory: N_MEMORY,
        }
    }
}

/// One normalized echo reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EchoReading {
    /// Distance / max_range, in [0, 1]
    pub distance: f32,
    /// Bearing / π, in [-1, 1]
    pub bearing: f32,
}

impl EchoReading {
    /// Nothing heard: maximum distance, straight ahead
    pub const ABSENT: Self = Self {
        distance: 1.0,
        bearing: 0.0,
    };

    /// Normalize a raw (meters, radians) measurement
    pub fn from_measurement(distance: f32, bearing: f32, max_range: f32) -> Self {
        let distance = if max_range > 0.0 {
            distance / max_range
        } else {
            1.0
        };
        Self {
            distance: clip(distance, 0.0, 1.0),
            bearing: clip(wrap_angle(bearing) / PI, -1.0, 1.0),
        }
    }

    pub fn is_absent(&self) -> bool {
        *self == Self::ABSENT
    }
}

impl Default for EchoReading {
    fn default() -> Self {
        Self::ABSENT
    }
}

/// Clamp that maps NaN to `lo`
#[inline]
fn clip(value: f32, lo: f32, hi: f32) -> f32 {
    if value.is_nan() { lo } else { value.clamp(lo, hi) }
}

/// A detected reflector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Echo {
    /// Index of the wall that answered
    pub wall_index: usize,
    /// Reflection point (world frame)
    pub hit_point: Vec2,
    /// Distance from the bat to the reflection point (meters)
    pub distance: f32,
    /// Bearing of the reflection point relative to heading, in (-π, π]
    pub bearing: f32,
    /// Normalized reading stored in memory
    pub reading: EchoReading,
}

/// Fixed-length recency buffer of echo readings, newest first
///
/// Always holds exactly `capacity` readings; pushing evicts the oldest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VecDeque<EchoReading>", into = "VecDeque<EchoReading>")]
pub struct EchoMemory {
    readings: VecDeque<EchoReading>,
}

impl TryFrom<VecDeque<EchoReading>> for EchoMemory {
    type Error = String;

    fn try_from(readings: VecDeque<EchoReading>) -> Result<Self, Self::Error> {
        if readings.is_empty() {
            return Err("echo memory needs at least one reading".to_string());
        }
        Ok(Self { readings })
    }
}

impl From<EchoMemory> for VecDeque<EchoReading> {
    fn from(memory: EchoMemory) -> Self {
        memory.readings
    }
}

impl EchoMemory {
    /// Create a memory filled with `ABSENT` readings (capacity at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            readings: std::iter::repeat_n(EchoReading::ABSENT, capacity).collect(),
        }
    }

    /// Push the newest reading, evicting the oldest
    pub fn push(&mut self, reading: EchoReading) {
        self.readings.pop_back();
        self.readings.push_front(reading);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Never true; kept for API symmetry with `len`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// The most recent reading
    pub fn newest(&self) -> EchoReading {
        self.readings.front().copied().unwrap_or(EchoReading::ABSENT)
    }

    /// Readings from newest to oldest
    pub fn iter(&self) -> impl Iterator<Item = &EchoReading> {
        self.readings.iter()
    }

    /// Flatten to `[d0, b0, d1, b1, ...]`, newest first, clipped to [-1, 1]
    pub fn flatten(&self) -> Vec<f32> {
        self.readings
            .iter()
            .flat_map(|r| [clip(r.distance, -1.0, 1.0), clip(r.bearing, -1.0, 1.0)])
            .collect()
    }
}

/// Clamp a body-frame pulse direction into the emission cone
///
/// Returns the body-frame angle actually used. A zero or non-finite pulse
/// goes straight ahead.
pub fn cone_clamped_angle(pulse: BodyVec, half_angle: f32) -> f32 {
    let half_angle = half_angle.clamp(0.0, PI);
    pulse
        .angle()
        .map_or(0.0, |angle| angle.clamp(-half_angle, half_angle))
}

/// Cast a pulse and return the nearest echo, if any wall answers
pub fn emit_pulse(
    position: Vec2,
    heading: f32,
    pulse: BodyVec,
    walls: &[Segment],
    sonar: &SonarConfig,
) -> Option<Echo> {
    let angle = cone_clamped_angle(pulse, sonar.half_angle);
    let direction = body_to_world(BodyVec::from_angle(angle), heading);
    cast_ray(position, heading, direction, walls, sonar)
}

/// Nearest wall crossing along `direction` (world frame, unit length)
pub fn cast_ray(
    position: Vec2,
    heading: f32,
    direction: Vec2,
    walls: &[Segment],
    sonar: &SonarConfig,
) -> Option<Echo> {
    if walls.is_empty() || sonar.max_range.is_nan() || sonar.max_range <= 0.0 {
        return None;
    }

    let ray = Segment::new(position, position + direction * sonar.max_range);
    let mut nearest: Option<(usize, Vec2, f32)> = None;

    for (idx, wall) in walls.iter().enumerate() {
        let Some(point) = segment_intersection(&ray, wall) else {
            continue;
        };
        let offset = point - position;
        if offset.dot(direction) < 0.0 {
            continue;
        }
        let distance = offset.length();
        if distance > sonar.max_range {
            continue;
        }
        if nearest.is_none_or(|(_, _, d)| distance < d) {
            nearest = Some((idx, point, distance));
        }
    }

    nearest.map(|(wall_index, hit_point, distance)| {
        let bearing = world_to_body(hit_point - position, heading)
            .angle()
            .map_or(0.0, wrap_angle);
        Echo {
            wall_index,
            hit_point,
            distance,
            bearing,
            reading: EchoReading::from_measurement(distance, bearing, sonar.max_range),
        }
    })
}
