//! Semi-implicit Euler integrator for the bat's flight

use glam::Vec2;

use super::state::BatState;
use crate::wrap_angle;

/// Below this speed the heading is held (atan2 has no useful direction at rest)
pub const SPEED_EPSILON: f32 = 1e-6;

/// Advance the bat's pose by one timestep
///
/// Velocity is updated first and clamped to `max_speed`, then position is
/// moved with the new velocity. Non-finite commands are dropped before
/// anything is written to `state`.
pub fn advance(state: &mut BatState, acceleration: Vec2, dt: f32, max_speed: f32) {
    if !dt.is_finite() || dt <= 0.0 {
        log::warn!("Ignoring integration step with invalid dt {dt}");
        return;
    }
    let acceleration = if acceleration.is_finite() {
        acceleration
    } else {
        log::warn!("Dropping non-finite acceleration command {acceleration:?}");
        Vec2::ZERO
    };

    let velocity = clamp_speed(state.velocity + acceleration * dt, max_speed);
    let position = state.position + velocity * dt;
    if !position.is_finite() {
        log::warn!("Integration produced non-finite position, holding pose");
        return;
    }

    state.velocity = velocity;
    state.position = position;
    follow_velocity(state);
}

/// Clamp a velocity's magnitude to `max_speed`
#[inline]
pub fn clamp_speed(velocity: Vec2, max_speed: f32) -> Vec2 {
    velocity.clamp_length_max(max_speed.max(0.0))
}

/// Point the heading along the velocity when moving
pub fn follow_velocity(state: &mut BatState) {
    if state.velocity.length() > SPEED_EPSILON {
        state.heading = wrap_angle(state.velocity.y.atan2(state.velocity.x));
    }
}
