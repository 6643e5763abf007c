//! Fixed timestep simulation tick
//!
//! One tick: integrate, resolve bumps, then fire the pulse (if any) and fold
//! the result into echo memory.

use glam::Vec2;

use super::collision::{BumpResult, resolve};
use super::echo::{Echo, EchoReading, cone_clamped_angle, emit_pulse};
use super::geometry::{BodyVec, Segment, body_to_world};
use super::kinematics::{advance, follow_velocity};
use super::state::{BatConfig, BatPose, BatState};

/// Commands for a single tick (already scaled and gated by the orchestrator)
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Acceleration (world frame, m/s²)
    pub acceleration: Vec2,
    /// Pulse direction in body frame, `None` when no pulse fires this tick
    pub pulse: Option<BodyVec>,
}

/// What happened during a tick
#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    /// The bat's path crossed a wall
    pub bumped: bool,
    /// A pulse was emitted
    pub pulse_fired: bool,
    /// Echo heard by this tick's pulse
    pub echo: Option<Echo>,
    /// Bump details when `bumped`
    pub bump: Option<BumpResult>,
}

/// Start an episode with a fresh bat at `pose`
pub fn reset(pose: BatPose, config: &BatConfig) -> BatState {
    BatState::new(pose, config)
}

/// Advance the bat by one fixed timestep against `walls`
pub fn tick(
    state: &mut BatState,
    input: &TickInput,
    walls: &[Segment],
    dt: f32,
    config: &BatConfig,
) -> TickOutcome {
    let mut outcome = TickOutcome::default();

    // Motion
    let old_position = state.position;
    advance(state, input.acceleration, dt, config.max_speed);
    let bump = resolve(
        old_position,
        state.position,
        state.velocity,
        walls,
        config.bump_response,
    );
    if bump.bumped {
        state.position = bump.position;
        state.velocity = bump.velocity;
        follow_velocity(state);
        outcome.bumped = true;
        outcome.bump = Some(bump);
    }

    // Sonar
    state.emitted_this_tick = input.pulse.is_some();
    state.last_echo = None;
    state.last_pulse = None;
    let reading = match input.pulse {
        Some(pulse) => {
            outcome.pulse_fired = true;
            let angle = cone_clamped_angle(pulse, config.sonar.half_angle);
            state.last_pulse = Some(body_to_world(BodyVec::from_angle(angle), state.heading));
            let echo = emit_pulse(state.position, state.heading, pulse, walls, &config.sonar);
            state.last_echo = echo;
            outcome.echo = echo;
            echo.map_or(EchoReading::ABSENT, |e| e.reading)
        }
        None => EchoReading::ABSENT,
    };
    state.echo_memory.push(reading);
    state.refresh_observation();
    state.time_ticks += 1;

    outcome
}

/// The agent-facing observation of `state`
pub fn observation_of(state: &BatState) -> &[f32] {
    state.observation()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::BumpResponse;
    use crate::sim::echo::SonarConfig;
    use proptest::prelude::*;

    fn config() -> BatConfig {
        BatConfig {
            max_speed: 20.0,
            body_size: 0.1,
            bump_response: BumpResponse::Stop,
            sonar: SonarConfig {
                max_range: 3.0,
                half_angle: std::f32::consts::FRAC_PI_4,
                n_memory: 4,
            },
        }
    }

    fn room() -> Vec<Segment> {
        let (a, b, c, d) = (
            Vec2::new(0.1, 0.1),
            Vec2::new(0.1, 3.9),
            Vec2::new(3.9, 3.9),
            Vec2::new(3.9, 0.1),
        );
        vec![
            Segment::new(a, b),
            Segment::new(b, c),
            Segment::new(c, d),
            Segment::new(d, a),
        ]
    }

    #[test]
    fn test_tick_without_pulse_pushes_absence() {
        let config = config();
        let mut state = reset(BatPose::new(Vec2::new(2.0, 2.0), 0.0, 1.0), &config);
        let outcome = tick(&mut state, &TickInput::default(), &room(), 0.01, &config);
        assert!(!outcome.pulse_fired);
        assert!(!state.emitted_this_tick);
        assert!(state.echo_memory.newest().is_absent());
        assert_eq!(observation_of(&state).len(), 8);
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_tick_with_pulse_records_echo() {
        let config = config();
        let mut state = reset(BatPose::new(Vec2::new(2.0, 2.0), 0.0, 0.0), &config);
        let input = TickInput {
            acceleration: Vec2::ZERO,
            pulse: Some(BodyVec::FORWARD),
        };
        let outcome = tick(&mut state, &input, &room(), 0.01, &config);
        assert!(outcome.pulse_fired);
        assert!(state.emitted_this_tick);
        let echo = outcome.echo.unwrap();
        assert_eq!(echo.wall_index, 2);
        assert!((echo.distance - 1.9).abs() < 1e-4);
        let obs = observation_of(&state);
        assert!((obs[0] - 1.9 / 3.0).abs() < 1e-4);
        assert!(obs[1].abs() < 1e-5);
        assert!(state.last_pulse.is_some());
    }

    #[test]
    fn test_pulse_with_nothing_in_range() {
        let config = config();
        let mut state = reset(BatPose::new(Vec2::new(2.0, 2.0), 0.0, 0.0), &config);
        let input = TickInput {
            acceleration: Vec2::ZERO,
            pulse: Some(BodyVec::FORWARD),
        };
        let outcome = tick(&mut state, &input, &[], 0.01, &config);
        assert!(outcome.pulse_fired);
        assert!(outcome.echo.is_none());
        assert!(state.echo_memory.newest().is_absent());
    }

    #[test]
    fn test_tick_bump_restores_position() {
        let config = config();
        let walls = [Segment::new(Vec2::new(1.0, -1.0), Vec2::new(1.0, 1.0))];
        let mut state = reset(BatPose::new(Vec2::new(0.95, 0.0), 0.0, 10.0), &config);
        let outcome = tick(&mut state, &TickInput::default(), &walls, 0.1, &config);
        assert!(outcome.bumped);
        assert_eq!(state.position, Vec2::new(0.95, 0.0));
        assert_eq!(state.velocity, Vec2::ZERO);
        assert_eq!(outcome.bump.unwrap().wall_index, Some(0));
    }

    #[test]
    fn test_stopped_bat_flies_off_a_wall() {
        let config = config();
        let walls = [Segment::new(Vec2::new(-1.0, 1.0), Vec2::new(1.0, 1.0))];
        let start = Vec2::new(0.0, 1.0 - 5e-6);
        let mut state = reset(BatPose::new(start, 0.0, 0.0), &config);
        let input = TickInput {
            acceleration: Vec2::new(0.0, -50.0),
            pulse: None,
        };
        let mut bumps = 0;
        for _ in 0..100 {
            bumps += u32::from(tick(&mut state, &input, &walls, 0.005, &config).bumped);
        }
        assert_eq!(bumps, 0);
        assert!(state.position.y < start.y - 0.1);
    }

    #[test]
    fn test_reflect_turns_heading_around() {
        let mut config = config();
        config.bump_response = BumpResponse::Reflect { restitution: 1.0 };
        let walls = [Segment::new(Vec2::new(1.0, -1.0), Vec2::new(1.0, 1.0))];
        let mut state = reset(BatPose::new(Vec2::new(0.95, 0.0), 0.0, 10.0), &config);
        tick(&mut state, &TickInput::default(), &walls, 0.1, &config);
        assert!(state.velocity.x < 0.0);
        assert!((state.heading.abs() - std::f32::consts::PI).abs() < 1e-5);
    }

    #[test]
    fn test_determinism() {
        let config = config();
        let walls = room();
        let inputs: Vec<TickInput> = (0..200)
            .map(|i| {
                let t = i as f32 * 0.1;
                TickInput {
                    acceleration: Vec2::new(t.cos(), t.sin()) * 40.0,
                    pulse: (i % 3 == 0).then_some(BodyVec::from_angle(t.sin())),
                }
            })
            .collect();

        let run = || {
            let mut state = reset(BatPose::new(Vec2::new(1.0, 1.0), 0.3, 2.0), &config);
            for input in &inputs {
                tick(&mut state, input, &walls, 0.005, &config);
            }
            state
        };

        let a = run();
        let b = run();
        assert_eq!(a.position.to_array(), b.position.to_array());
        assert_eq!(a.heading.to_bits(), b.heading.to_bits());
        assert_eq!(a.observation(), b.observation());
    }

    proptest! {
        #[test]
        fn prop_memory_and_observation_invariants(
            steps in proptest::collection::vec(
                (-50.0f32..50.0, -50.0f32..50.0, proptest::option::of(-3.2f32..3.2)),
                1..60,
            ),
            x in 0.2f32..3.8,
            y in 0.2f32..3.8,
            heading in -3.2f32..3.2,
        ) {
            let config = config();
            let walls = room();
            let mut state = reset(BatPose::new(Vec2::new(x, y), heading, 1.0), &config);
            prop_assert_eq!(state.echo_memory.len(), 4);

            for (ax, ay, pulse) in steps {
                let input = TickInput {
                    acceleration: Vec2::new(ax, ay),
                    pulse: pulse.map(BodyVec::from_angle),
                };
                tick(&mut state, &input, &walls, 0.02, &config);
                prop_assert_eq!(state.echo_memory.len(), 4);
                prop_assert_eq!(observation_of(&state).len(), 8);
                prop_assert!(observation_of(&state).iter().all(|v| (-1.0..=1.0).contains(v)));
                prop_assert!(state.heading > -std::f32::consts::PI);
                prop_assert!(state.heading <= std::f32::consts::PI);
                // The bat never tunnels out of the room
                prop_assert!(state.position.x > 0.0999 && state.position.x < 3.9001);
                prop_assert!(state.position.y > 0.0999 && state.position.y < 3.9001);
            }
        }
    }
}
