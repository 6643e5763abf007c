//! Bat state and core simulation configuration
//!
//! `BatState` is the only thing the core mutates. It is rebuilt wholesale on
//! every episode reset.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::BumpResponse;
use super::echo::{Echo, EchoMemory, SonarConfig};
use super::geometry::unit_vector;
use crate::consts::*;
use crate::wrap_angle;

/// Initial pose handed to `reset`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatPose {
    pub position: Vec2,
    /// Heading (radians, world frame)
    pub heading: f32,
    /// Initial speed along the heading
    pub speed: f32,
}

impl BatPose {
    pub const fn new(position: Vec2, heading: f32, speed: f32) -> Self {
        Self {
            position,
            heading,
            speed,
        }
    }
}

/// Physical parameters of the bat and its sonar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatConfig {
    /// Speed limit applied after every integration step (m/s)
    pub max_speed: f32,
    /// Body size, render only
    pub body_size: f32,
    /// Velocity response when the bat's path crosses a wall
    pub bump_response: BumpResponse,
    pub sonar: SonarConfig,
}

impl Default for BatConfig {
    fn default() -> Self {
        Self {
            max_speed: MAX_SPEED,
            body_size: BODY_SIZE,
            bump_response: BumpResponse::default(),
            sonar: SonarConfig::default(),
        }
    }
}

/// The flying bat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatState {
    /// Position (world frame)
    pub position: Vec2,
    /// Heading in (-π, π]
    pub heading: f32,
    /// Velocity (world frame)
    pub velocity: Vec2,
    /// Render size; collisions treat the bat as a point
    pub body_size: f32,
    /// Whether a pulse was fired on the most recent tick
    pub emitted_this_tick: bool,
    /// Most recent echo readings (newest first)
    pub echo_memory: EchoMemory,
    /// Echo detected by the most recent pulse, if any
    pub last_echo: Option<Echo>,
    /// World-frame direction of the most recent pulse
    pub last_pulse: Option<Vec2>,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Flattened echo memory exposed to the agent
    observation: Vec<f32>,
}

impl BatState {
    /// Create a bat at `pose` with an absence-filled echo memory
    pub fn new(pose: BatPose, config: &BatConfig) -> Self {
        let heading = wrap_angle(pose.heading);
        let speed = if pose.speed.is_finite() { pose.speed } else { 0.0 };
        let velocity = (unit_vector(heading) * speed).clamp_length_max(config.max_speed.max(0.0));
        let echo_memory = EchoMemory::new(config.sonar.n_memory);
        let observation = echo_memory.flatten();

        Self {
            position: pose.position,
            heading,
            velocity,
            body_size: config.body_size,
            emitted_this_tick: false,
            echo_memory,
            last_echo: None,
            last_pulse: None,
            time_ticks: 0,
            observation,
        }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Current observation (length `2 * n_memory`, values in [-1, 1])
    pub fn observation(&self) -> &[f32] {
        &self.observation
    }

    /// Recompute the observation from the echo memory
    pub fn refresh_observation(&mut self) {
        self.observation.clear();
        self.observation.extend(self.echo_memory.flatten());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_new_bat_defaults() {
        let config = BatConfig::default();
        let state = BatState::new(BatPose::new(Vec2::new(1.0, 2.0), 0.0, 3.0), &config);
        assert_eq!(state.position, Vec2::new(1.0, 2.0));
        assert!((state.velocity - Vec2::new(3.0, 0.0)).length() < 1e-6);
        assert_eq!(state.echo_memory.len(), config.sonar.n_memory);
        assert_eq!(state.observation().len(), 2 * config.sonar.n_memory);
        assert!(!state.emitted_this_tick);
        assert_eq!(state.time_ticks, 0);
    }

    #[test]
    fn test_new_bat_wraps_heading_and_clamps_speed() {
        let config = BatConfig::default();
        let state = BatState::new(BatPose::new(Vec2::ZERO, -PI, 1000.0), &config);
        assert_eq!(state.heading, PI);
        assert!(state.speed() <= config.max_speed * (1.0 + 1e-6));
    }

    #[test]
    fn test_initial_observation_is_absence() {
        let state = BatState::new(BatPose::new(Vec2::ZERO, 0.0, 0.0), &BatConfig::default());
        for pair in state.observation().chunks(2) {
            assert_eq!(pair, &[1.0, 0.0]);
        }
    }
}
