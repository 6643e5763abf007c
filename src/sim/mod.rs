//! Deterministic simulation core
//!
//! Physics and sonar for a single bat. This module must stay pure and
//! deterministic:
//! - Fixed timestep only
//! - No RNG (gating and layouts live in the orchestrator)
//! - Stable iteration order (walls in slice order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod echo;
pub mod geometry;
pub mod kinematics;
pub mod state;
pub mod tick;

pub use collision::{BumpResponse, BumpResult, reflect_velocity, resolve};
pub use echo::{Echo, EchoMemory, EchoReading, SonarConfig, emit_pulse};
pub use geometry::{
    BodyVec, Segment, body_to_world, line_intersection, point_on_segment, rotate,
    segment_intersection, unit_vector, world_to_body,
};
pub use kinematics::advance;
pub use state::{BatConfig, BatPose, BatState};
pub use tick::{TickInput, TickOutcome, observation_of, reset, tick};
