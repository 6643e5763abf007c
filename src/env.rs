//! Episode orchestration
//!
//! Turns raw agent actions into tick commands, gates pulse emission, assigns
//! reward and decides termination. Everything random lives here, driven by a
//! single seeded `Pcg32`.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::arena::{boundary_walls, scatter_obstacles, spawn_pose};
use crate::settings::{ActionLayout, EnvSettings, SettingsError};
use crate::sim::{
    BatPose, BatState, BodyVec, Segment, TickInput, body_to_world, observation_of, reset, tick,
};

/// One agent action, in normalized units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// World-frame acceleration and body-frame pulse vector
    Cartesian {
        accel: Vec2,
        pulse: Vec2,
        pulse_proba: f32,
    },
    /// Magnitudes and angles relative to the heading
    Polar {
        accel: f32,
        accel_angle: f32,
        pulse_proba: f32,
        pulse_angle: f32,
    },
}

impl Action {
    /// Build an action from a raw vector, clipped to the layout's bounds
    ///
    /// Returns `None` when the vector has the wrong length.
    pub fn from_slice(layout: ActionLayout, raw: &[f32]) -> Option<Self> {
        if raw.len() != layout.dim() {
            return None;
        }
        let action = match layout {
            ActionLayout::Cartesian => Action::Cartesian {
                accel: Vec2::new(raw[0], raw[1]),
                pulse: Vec2::new(raw[2], raw[3]),
                pulse_proba: raw[4],
            },
            ActionLayout::Polar => Action::Polar {
                accel: raw[0],
                accel_angle: raw[1],
                pulse_proba: raw[2],
                pulse_angle: raw[3],
            },
        };
        Some(action.clipped())
    }

    pub fn layout(&self) -> ActionLayout {
        match self {
            Action::Cartesian { .. } => ActionLayout::Cartesian,
            Action::Polar { .. } => ActionLayout::Polar,
        }
    }

    /// Flatten back to the raw layout order
    pub fn to_vec(&self) -> Vec<f32> {
        match *self {
            Action::Cartesian {
                accel,
                pulse,
                pulse_proba,
            } => vec![accel.x, accel.y, pulse.x, pulse.y, pulse_proba],
            Action::Polar {
                accel,
                accel_angle,
                pulse_proba,
                pulse_angle,
            } => vec![accel, accel_angle, pulse_proba, pulse_angle],
        }
    }

    /// Clip every component into its bounds (NaN becomes the lower bound)
    pub fn clipped(&self) -> Self {
        let layout = self.layout();
        let raw: Vec<f32> = self
            .to_vec()
            .into_iter()
            .zip(layout.low().iter().zip(layout.high()))
            .map(|(v, (&lo, &hi))| if v.is_nan() { lo } else { v.clamp(lo, hi) })
            .collect();
        match layout {
            ActionLayout::Cartesian => Action::Cartesian {
                accel: Vec2::new(raw[0], raw[1]),
                pulse: Vec2::new(raw[2], raw[3]),
                pulse_proba: raw[4],
            },
            ActionLayout::Polar => Action::Polar {
                accel: raw[0],
                accel_angle: raw[1],
                pulse_proba: raw[2],
                pulse_angle: raw[3],
            },
        }
    }
}

/// Action translated into physical commands
#[derive(Debug, Clone, Copy)]
struct Command {
    acceleration: Vec2,
    pulse: BodyVec,
    pulse_proba: f32,
    /// Normalized effort terms used by the reward
    accel_effort: f32,
    accel_angle_effort: f32,
    pulse_forward: f32,
}

impl Command {
    fn from_action(action: &Action, heading: f32, settings: &EnvSettings) -> Self {
        match action.clipped() {
            Action::Cartesian {
                accel,
                pulse,
                pulse_proba,
            } => Self {
                acceleration: accel * settings.max_accel,
                pulse: BodyVec(pulse),
                pulse_proba,
                accel_effort: accel.length(),
                accel_angle_effort: 0.0,
                pulse_forward: pulse.dot(Vec2::X),
            },
            Action::Polar {
                accel,
                accel_angle,
                pulse_proba,
                pulse_angle,
            } => {
                let direction = BodyVec::from_angle(accel_angle * settings.max_accel_angle);
                let pulse = BodyVec::from_angle(pulse_angle * settings.sonar().half_angle);
                Self {
                    acceleration: body_to_world(direction, heading) * accel * settings.max_accel,
                    pulse,
                    pulse_proba,
                    accel_effort: accel.abs(),
                    accel_angle_effort: accel_angle.abs(),
                    pulse_forward: pulse.0.x,
                }
            }
        }
    }
}

/// Diagnostics for a single step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub bumped: bool,
    pub pulse_fired: bool,
    /// Speed after the step (m/s)
    pub speed: f32,
    /// Episode time after the step (seconds)
    pub elapsed: f32,
}

/// Result of `BatEnv::step`
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub observation: Vec<f32>,
    pub reward: f32,
    pub done: bool,
    pub info: StepInfo,
}

/// A single-bat echolocation environment
#[derive(Debug, Clone)]
pub struct BatEnv {
    settings: EnvSettings,
    walls: Vec<Segment>,
    bat: BatState,
    rng: Pcg32,
    seed: u64,
    elapsed_ticks: u64,
    episode: u64,
}

impl BatEnv {
    /// Validate settings and start the first episode
    pub fn new(settings: EnvSettings, seed: u64) -> Result<Self, SettingsError> {
        settings.validate()?;
        // Replaced by the first `reset` below
        let bat = reset(BatPose::new(Vec2::ZERO, 0.0, 0.0), &settings.bat);

        let mut env = Self {
            settings,
            walls: Vec::new(),
            bat,
            rng: Pcg32::seed_from_u64(seed),
            seed,
            elapsed_ticks: 0,
            episode: 0,
        };
        env.reset();
        Ok(env)
    }

    /// Reseed the episode RNG
    pub fn seed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
    }

    /// Start a new episode: fresh layout, fresh bat. Returns the first observation.
    pub fn reset(&mut self) -> Vec<f32> {
        let s = &self.settings;
        self.walls = boundary_walls(s.world_width, s.world_height, s.wall_margin);
        if let Some(layout) = &s.obstacles {
            self.walls.extend(scatter_obstacles(layout, &mut self.rng));
        }

        let pose = spawn_pose(&s.spawn, s.world_width, s.world_height, &mut self.rng);
        self.bat = reset(pose, &s.bat);
        self.elapsed_ticks = 0;
        self.episode += 1;

        log::debug!(
            "Episode {} reset: {} walls, bat at ({:.2}, {:.2}) heading {:.2}",
            self.episode,
            self.walls.len(),
            pose.position.x,
            pose.position.y,
            pose.heading
        );

        self.observation().to_vec()
    }

    /// Advance one tick with `action`
    pub fn step(&mut self, action: &Action) -> StepResult {
        if action.layout() != self.settings.action_layout {
            log::warn!(
                "{:?} action given to a {:?} environment",
                action.layout(),
                self.settings.action_layout
            );
        }

        let weights = self.settings.reward;
        let command = Command::from_action(action, self.bat.heading, &self.settings);

        // Always draw so the RNG stream does not depend on the gate settings
        let draw: f32 = self.rng.random();
        let fire = draw < self.settings.emission_gate.fire_probability(command.pulse_proba);

        let input = TickInput {
            acceleration: command.acceleration,
            pulse: fire.then_some(command.pulse),
        };
        let outcome = tick(
            &mut self.bat,
            &input,
            &self.walls,
            self.settings.dt,
            &self.settings.bat,
        );
        self.elapsed_ticks += 1;

        let mut reward = weights.flying
            + weights.accel * command.accel_effort
            + weights.accel_angle * command.accel_angle_effort;
        if outcome.bumped {
            reward += weights.bump;
        }
        if outcome.pulse_fired {
            reward += weights.pulse + weights.pulse_angle * command.pulse_forward;
        }
        let speed = self.bat.speed();
        if speed < self.settings.low_speed_threshold {
            reward += weights.low_speed;
        }

        let done = self.elapsed_ticks >= self.settings.episode_ticks();
        if done {
            log::debug!(
                "Episode {} finished after {} ticks",
                self.episode,
                self.elapsed_ticks
            );
        }

        StepResult {
            observation: self.observation().to_vec(),
            reward,
            done,
            info: StepInfo {
                bumped: outcome.bumped,
                pulse_fired: outcome.pulse_fired,
                speed,
                elapsed: self.elapsed(),
            },
        }
    }

    /// Current observation
    pub fn observation(&self) -> &[f32] {
        observation_of(&self.bat)
    }

    /// Observation length (`2 * n_memory`)
    pub fn observation_len(&self) -> usize {
        2 * self.settings.sonar().n_memory
    }

    /// Episode time (seconds)
    pub fn elapsed(&self) -> f32 {
        self.elapsed_ticks as f32 * self.settings.dt
    }

    pub fn bat(&self) -> &BatState {
        &self.bat
    }

    pub fn walls(&self) -> &[Segment] {
        &self.walls
    }

    pub fn settings(&self) -> &EnvSettings {
        &self.settings
    }

    pub fn episode(&self) -> u64 {
        self.episode
    }

    pub fn current_seed(&self) -> u64 {
        self.seed
    }
}
