//! Bat Sonar - an echolocating bat flying among walls
//!
//! Core modules:
//! - `sim`: Deterministic physics + sensor core (geometry, kinematics, bumps, echoes)
//! - `arena`: Wall layouts and spawn poses
//! - `env`: Episode orchestration (actions, emission gate, reward, termination)
//! - `settings`: Data-driven environment configuration and presets
//! - `renderer`: Stateless scene-to-vertex rendering

pub mod arena;
pub mod env;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use env::{Action, BatEnv, StepInfo, StepResult};
pub use settings::{EnvPreset, EnvSettings, SettingsError};

/// Simulation configuration constants
pub mod consts {
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    /// Fixed simulation timestep (seconds)
    pub const SIM_DT: f32 = 0.005;
    /// Frames per second for rendered playback
    pub const FPS: u32 = 60;

    /// Default world dimensions (meters)
    pub const WORLD_WIDTH: f32 = 4.5;
    pub const WORLD_HEIGHT: f32 = 4.5;

    /// Maximum acceleration magnitude (m/s²)
    pub const MAX_ACCEL: f32 = 50.0;
    /// Maximum acceleration angle for polar actions (radians)
    pub const MAX_ACCEL_ANGLE: f32 = FRAC_PI_2;
    /// Maximum speed (m/s)
    pub const MAX_SPEED: f32 = 10.0;
    /// Bat body size, render only (meters)
    pub const BODY_SIZE: f32 = 0.07;

    /// Sonar beam half-angle (radians)
    pub const PULSE_HALF_ANGLE: f32 = FRAC_PI_4;
    /// Sonar range (meters)
    pub const SONAR_RANGE: f32 = 3.0;
    /// Number of echo readings kept in the observation
    pub const N_MEMORY: usize = 3;
}

/// Wrap an angle into (-π, π]
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    if !angle.is_finite() {
        return 0.0;
    }
    let mut angle = angle % TAU;
    if angle > PI {
        angle -= TAU;
    }
    if angle <= -PI {
        angle += TAU;
    }
    angle
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::PI;

    #[test]
    fn test_wrap_angle_boundaries() {
        assert_eq!(wrap_angle(PI), PI);
        assert_eq!(wrap_angle(-PI), PI);
        assert_eq!(wrap_angle(0.0), 0.0);
        assert!((wrap_angle(3.0 * PI) - PI).abs() < 1e-5);
        assert!((wrap_angle(-PI / 2.0 - 2.0 * PI) + PI / 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_wrap_angle_non_finite() {
        assert_eq!(wrap_angle(f32::NAN), 0.0);
        assert_eq!(wrap_angle(f32::INFINITY), 0.0);
    }

    proptest! {
        #[test]
        fn prop_wrap_angle_range(angle in -1.0e4f32..1.0e4) {
            let wrapped = wrap_angle(angle);
            prop_assert!(wrapped > -PI && wrapped <= PI);
        }
    }
}
