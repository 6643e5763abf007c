//! Environment settings and presets
//!
//! The flying and lidar environment variants differ only in constants, so
//! both are expressed as presets of one `EnvSettings` struct. Settings can be
//! loaded from and saved to JSON.

use std::f32::consts::PI;
use std::fmt;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::{BatConfig, BatPose, BumpResponse, SonarConfig};

/// Built-in environment variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EnvPreset {
    /// Random spawn, scattered obstacles, shaped reward
    #[default]
    Flying,
    /// Fixed spawn in an empty room, bump penalty only
    Lidar,
}

impl EnvPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvPreset::Flying => "flying",
            EnvPreset::Lidar => "lidar",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "flying" | "fly" => Some(EnvPreset::Flying),
            "lidar" => Some(EnvPreset::Lidar),
            _ => None,
        }
    }
}

/// How raw agent actions are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionLayout {
    /// `[accel_x, accel_y, pulse_x, pulse_y, pulse_proba]`: world-frame
    /// acceleration, body-frame pulse vector
    Cartesian,
    /// `[accel, accel_angle, pulse_proba, pulse_angle]`: signed thrust and
    /// angles relative to the heading (negative thrust brakes)
    Polar,
}

impl ActionLayout {
    /// Number of action components
    pub fn dim(&self) -> usize {
        match self {
            ActionLayout::Cartesian => 5,
            ActionLayout::Polar => 4,
        }
    }

    /// Per-component lower bounds
    pub fn low(&self) -> &'static [f32] {
        match self {
            ActionLayout::Cartesian => &[-1.0, -1.0, -1.0, -1.0, 0.0],
            ActionLayout::Polar => &[-1.0, -1.0, 0.0, -1.0],
        }
    }

    /// Per-component upper bounds
    pub fn high(&self) -> &'static [f32] {
        match self {
            ActionLayout::Cartesian => &[1.0; 5],
            ActionLayout::Polar => &[1.0; 4],
        }
    }
}

/// Where the bat starts each episode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SpawnPolicy {
    /// Uniform heading and position at least `margin` from the world edge
    Random { margin: f32, speed: f32 },
    Fixed(BatPose),
}

/// Interior walls scattered on a jittered square grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleLayout {
    /// First grid coordinate (both axes)
    pub grid_min: f32,
    /// Last grid coordinate (both axes)
    pub grid_max: f32,
    /// Grid points per axis
    pub grid_count: usize,
    /// Uniform jitter applied to each centre, ±jitter
    pub jitter: f32,
    /// Length of each wall
    pub wall_length: f32,
}

impl Default for ObstacleLayout {
    fn default() -> Self {
        Self {
            grid_min: 1.5,
            grid_max: 3.5,
            grid_count: 3,
            jitter: 0.3,
            wall_length: 0.3,
        }
    }
}

/// Probability that a pulse fires: `clamp(floor + scale * proba, 0, 1)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionGate {
    pub floor: f32,
    pub scale: f32,
}

impl EmissionGate {
    pub fn fire_probability(&self, proba: f32) -> f32 {
        let p = self.floor + self.scale * proba;
        if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
    }
}

/// Reward weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardWeights {
    /// Reward for every step survived
    pub flying: f32,
    /// Per unit of normalized acceleration magnitude
    pub accel: f32,
    /// Per unit of normalized acceleration angle (polar actions)
    pub accel_angle: f32,
    /// Per emitted pulse
    pub pulse: f32,
    /// Per unit of pulse vector projected on the forward axis
    pub pulse_angle: f32,
    /// Per bump
    pub bump: f32,
    /// Per step below `low_speed_threshold`
    pub low_speed: f32,
}

/// Complete environment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvSettings {
    pub preset: EnvPreset,

    // === World ===
    pub world_width: f32,
    pub world_height: f32,
    /// Inset of the boundary walls from the world edge
    pub wall_margin: f32,
    /// Interior obstacles, `None` for an empty room
    pub obstacles: Option<ObstacleLayout>,
    /// Simulation timestep (seconds)
    pub dt: f32,
    /// Episode length (seconds)
    pub episode_duration: f32,

    // === Bat ===
    pub bat: BatConfig,
    pub spawn: SpawnPolicy,

    // === Actions ===
    pub action_layout: ActionLayout,
    /// Scale applied to normalized acceleration (m/s²)
    pub max_accel: f32,
    /// Scale applied to normalized acceleration angle (polar actions)
    pub max_accel_angle: f32,
    pub emission_gate: EmissionGate,

    // === Reward ===
    pub reward: RewardWeights,
    /// Speed below which the low-speed penalty applies (m/s)
    pub low_speed_threshold: f32,
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self::from_preset(EnvPreset::Flying)
    }
}

impl EnvSettings {
    /// Settings for a built-in preset
    pub fn from_preset(preset: EnvPreset) -> Self {
        match preset {
            EnvPreset::Flying => Self {
                preset,
                world_width: WORLD_WIDTH,
                world_height: WORLD_HEIGHT,
                wall_margin: 0.01,
                obstacles: Some(ObstacleLayout::default()),
                dt: SIM_DT,
                episode_duration: 5.0,
                bat: BatConfig::default(),
                spawn: SpawnPolicy::Random {
                    margin: 0.2,
                    speed: 5.0,
                },
                action_layout: ActionLayout::Cartesian,
                max_accel: MAX_ACCEL,
                max_accel_angle: MAX_ACCEL_ANGLE,
                emission_gate: EmissionGate {
                    floor: 0.3,
                    scale: 0.5,
                },
                reward: RewardWeights {
                    flying: 1.0,
                    accel: -0.0001,
                    accel_angle: -0.0001,
                    pulse: -0.0001,
                    pulse_angle: -0.0001,
                    bump: -100.0,
                    low_speed: -100.0,
                },
                low_speed_threshold: 1.0,
            },
            EnvPreset::Lidar => Self {
                preset,
                world_width: WORLD_WIDTH,
                world_height: WORLD_HEIGHT,
                wall_margin: 0.1,
                obstacles: None,
                dt: SIM_DT,
                episode_duration: 5.0,
                bat: BatConfig::default(),
                spawn: SpawnPolicy::Fixed(BatPose::new(Vec2::new(0.3, 0.75), 0.0, 3.0)),
                action_layout: ActionLayout::Polar,
                max_accel: MAX_ACCEL,
                max_accel_angle: MAX_ACCEL_ANGLE,
                // Fires unless the agent asks to stay quiet
                emission_gate: EmissionGate {
                    floor: 1.0,
                    scale: -1.0,
                },
                reward: RewardWeights {
                    flying: 0.0,
                    accel: 0.0,
                    accel_angle: 0.0,
                    pulse: 0.0,
                    pulse_angle: 0.0,
                    bump: -1.0,
                    low_speed: 0.0,
                },
                low_speed_threshold: 0.0,
            },
        }
    }

    /// Sonar settings shortcut
    pub fn sonar(&self) -> &SonarConfig {
        &self.bat.sonar
    }

    /// Number of simulation ticks in one episode
    pub fn episode_ticks(&self) -> u64 {
        (self.episode_duration / self.dt).round().max(1.0) as u64
    }

    /// Check every value the simulation relies on
    pub fn validate(&self) -> Result<(), SettingsError> {
        fn positive(field: &'static str, value: f32) -> Result<(), SettingsError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SettingsError::Invalid {
                    field,
                    reason: format!("must be positive and finite, got {value}"),
                })
            }
        }

        positive("world_width", self.world_width)?;
        positive("world_height", self.world_height)?;
        positive("dt", self.dt)?;
        positive("episode_duration", self.episode_duration)?;
        positive("bat.max_speed", self.bat.max_speed)?;
        positive("bat.sonar.max_range", self.bat.sonar.max_range)?;
        positive("max_accel", self.max_accel)?;

        let margin = self.wall_margin;
        if !(margin >= 0.0 && 2.0 * margin < self.world_width.min(self.world_height)) {
            return Err(SettingsError::Invalid {
                field: "wall_margin",
                reason: format!("{margin} leaves no room inside the walls"),
            });
        }

        let half_angle = self.bat.sonar.half_angle;
        if !(half_angle > 0.0 && half_angle <= PI) {
            return Err(SettingsError::Invalid {
                field: "bat.sonar.half_angle",
                reason: format!("must be in (0, π], got {half_angle}"),
            });
        }

        if self.bat.sonar.n_memory == 0 {
            return Err(SettingsError::Invalid {
                field: "bat.sonar.n_memory",
                reason: "echo memory needs at least one slot".to_string(),
            });
        }

        if let BumpResponse::Reflect { restitution } = self.bat.bump_response
            && !(0.0..=1.0).contains(&restitution)
        {
            return Err(SettingsError::Invalid {
                field: "bat.bump_response.restitution",
                reason: format!("must be in [0, 1], got {restitution}"),
            });
        }

        if let Some(layout) = &self.obstacles {
            positive("obstacles.wall_length", layout.wall_length)?;
            if layout.grid_max < layout.grid_min || !(layout.jitter >= 0.0) {
                return Err(SettingsError::Invalid {
                    field: "obstacles",
                    reason: "grid range must be ordered and jitter non-negative".to_string(),
                });
            }
        }

        if let SpawnPolicy::Random { margin, speed } = self.spawn {
            let room = self.world_width.min(self.world_height);
            if !(margin >= 0.0 && 2.0 * margin < room) || !speed.is_finite() {
                return Err(SettingsError::Invalid {
                    field: "spawn",
                    reason: format!("margin {margin} / speed {speed} out of range"),
                });
            }
        }

        Ok(())
    }

    /// Load and validate settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded {} settings from {}", settings.preset.as_str(), path.display());
        Ok(settings)
    }

    /// Parse and validate settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json).map_err(SettingsError::Parse)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(SettingsError::Parse)?;
        std::fs::write(path, json).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

/// Errors from loading or validating settings
#[derive(Debug)]
pub enum SettingsError {
    Io {
        path: String,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot access settings file {path}: {source}"),
            Self::Parse(err) => write!(f, "malformed settings JSON: {err}"),
            Self::Invalid { field, reason } => write!(f, "invalid setting `{field}`: {reason}"),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}
