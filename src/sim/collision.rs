//! Bump detection and response
//!
//! The bat is a point. A bump happens when the segment it traced during a
//! tick crosses a wall; the move is then undone and the velocity responds to
//! the wall's orientation.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Segment, segment_intersection};

/// How velocity responds to a bump
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BumpResponse {
    /// Velocity is zeroed
    Stop,
    /// Perpendicular component is inverted and scaled by `restitution`,
    /// parallel component is kept
    Reflect { restitution: f32 },
}

impl Default for BumpResponse {
    fn default() -> Self {
        BumpResponse::Reflect { restitution: 1.0 }
    }
}

/// Outcome of a bump check
#[derive(Debug, Clone, PartialEq)]
pub struct BumpResult {
    /// Whether the path crossed a wall
    pub bumped: bool,
    /// Corrected position (the old position on a bump)
    pub position: Vec2,
    /// Corrected velocity
    pub velocity: Vec2,
    /// Index of the wall that was hit
    pub wall_index: Option<usize>,
    /// Where the path crossed that wall
    pub contact: Option<Vec2>,
}

impl BumpResult {
    pub fn clear(position: Vec2, velocity: Vec2) -> Self {
        Self {
            bumped: false,
            position,
            velocity,
            wall_index: None,
            contact: None,
        }
    }
}

/// First wall crossed by the path `old -> new`
///
/// "First" means nearest to `old`; equal distances go to the lower index.
/// Crossings at or behind `old` (inside the point tolerance) are ignored, so a
/// path leaving a wall it starts on is free.
pub fn first_crossing(old: Vec2, new: Vec2, walls: &[Segment]) -> Option<(usize, Vec2)> {
    let path = Segment::new(old, new);
    let travel = new - old;
    let mut best: Option<(usize, Vec2, f32)> = None;

    for (idx, wall) in walls.iter().enumerate() {
        let Some(point) = segment_intersection(&path, wall) else {
            continue;
        };
        if (point - old).dot(travel) <= 0.0 {
            continue;
        }
        let dist = point.distance_squared(old);
        if best.is_none_or(|(_, _, d)| dist < d) {
            best = Some((idx, point, dist));
        }
    }

    best.map(|(idx, point, _)| (idx, point))
}

/// Check the tick's path against the walls and undo it on a bump
pub fn resolve(
    old_position: Vec2,
    new_position: Vec2,
    velocity: Vec2,
    walls: &[Segment],
    response: BumpResponse,
) -> BumpResult {
    let Some((wall_index, contact)) = first_crossing(old_position, new_position, walls) else {
        return BumpResult::clear(new_position, velocity);
    };

    let wall = &walls[wall_index];
    let velocity = match response {
        BumpResponse::Stop => Vec2::ZERO,
        BumpResponse::Reflect { restitution } => {
            reflect_velocity(velocity, wall.normal(), restitution.clamp(0.0, 1.0))
        }
    };

    log::debug!(
        "Bump on wall {} at ({:.3}, {:.3})",
        wall_index,
        contact.x,
        contact.y
    );

    BumpResult {
        bumped: true,
        position: old_position,
        velocity,
        wall_index: Some(wall_index),
        contact: Some(contact),
    }
}

/// Reflect velocity off a surface with unit `normal`
///
/// v' = v - (1 + e)(v·n)n, which keeps the tangential part and flips the
/// normal part scaled by the restitution `e`.
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2, restitution: f32) -> Vec2 {
    velocity - (1.0 + restitution) * velocity.dot(normal) * normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::geometry::unit_vector;
    use proptest::prelude::*;

    fn vertical_wall(x: f32) -> Segment {
        Segment::new(Vec2::new(x, -2.0), Vec2::new(x, 2.0))
    }

    #[test]
    fn test_no_crossing_keeps_motion() {
        let walls = [vertical_wall(1.0)];
        let result = resolve(
            Vec2::new(0.0, 0.0),
            Vec2::new(0.5, 0.0),
            Vec2::new(5.0, 0.0),
            &walls,
            BumpResponse::default(),
        );
        assert!(!result.bumped);
        assert_eq!(result.position, Vec2::new(0.5, 0.0));
        assert_eq!(result.velocity, Vec2::new(5.0, 0.0));
        assert_eq!(result.wall_index, None);
    }

    #[test]
    fn test_crossing_resets_position() {
        // Moving at (10, 0) for 0.1 s from x = 0.95 through the wall at x = 1
        let walls = [vertical_wall(1.0)];
        let old = Vec2::new(0.95, 0.0);
        let velocity = Vec2::new(10.0, 0.0);
        let result = resolve(old, old + velocity * 0.1, velocity, &walls, BumpResponse::Stop);
        assert!(result.bumped);
        assert_eq!(result.position.x, 0.95);
        assert_eq!(result.velocity, Vec2::ZERO);
        assert_eq!(result.wall_index, Some(0));
        assert!((result.contact.unwrap().x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_reflection_flips_perpendicular_component() {
        let walls = [vertical_wall(1.0)];
        let velocity = Vec2::new(4.0, 3.0);
        let result = resolve(
            Vec2::new(0.9, 0.0),
            Vec2::new(1.1, 0.15),
            velocity,
            &walls,
            BumpResponse::Reflect { restitution: 1.0 },
        );
        assert!(result.bumped);
        assert!((result.velocity - Vec2::new(-4.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn test_reflection_damped() {
        let reflected = reflect_velocity(Vec2::new(4.0, 3.0), Vec2::new(-1.0, 0.0), 0.5);
        assert!((reflected - Vec2::new(-2.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn test_nearest_crossing_wins() {
        // Far wall listed first; the nearer one must be chosen
        let walls = [vertical_wall(1.5), vertical_wall(1.0)];
        let result = resolve(
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(20.0, 0.0),
            &walls,
            BumpResponse::Stop,
        );
        assert_eq!(result.wall_index, Some(1));
    }

    #[test]
    fn test_stationary_bat_never_bumps() {
        let walls = [vertical_wall(0.0)];
        let p = Vec2::new(0.0, 0.0);
        let result = resolve(p, p, Vec2::ZERO, &walls, BumpResponse::Stop);
        assert!(!result.bumped);
    }

    #[test]
    fn test_leaving_a_wall_is_not_a_bump() {
        // Start a few micrometres below a horizontal wall and fly away from it
        let walls = [Segment::new(Vec2::new(-1.0, 1.0), Vec2::new(1.0, 1.0))];
        let old = Vec2::new(0.0, 1.0 - 5e-6);
        let new = Vec2::new(0.0, 0.9);
        let result = resolve(old, new, Vec2::new(0.0, -10.0), &walls, BumpResponse::Stop);
        assert!(!result.bumped);
        assert_eq!(result.position, new);
        assert_eq!(first_crossing(old, new, &walls), None);

        // Moving towards it from the same spot still bumps
        let result = resolve(old, Vec2::new(0.0, 1.1), Vec2::Y, &walls, BumpResponse::Stop);
        assert!(result.bumped);
    }

    #[test]
    fn test_empty_walls() {
        let result = resolve(Vec2::ZERO, Vec2::ONE, Vec2::ONE, &[], BumpResponse::Stop);
        assert!(!result.bumped);
        assert_eq!(result.position, Vec2::ONE);
    }

    proptest! {
        #[test]
        fn prop_crossing_always_restores_old_position(
            wall_angle in -3.1f32..3.1,
            dir_angle in -3.1f32..3.1,
            before in 0.01f32..1.0,
            after in 0.01f32..1.0,
        ) {
            // A wall through the origin at any orientation, crossed by a path
            // that straddles it
            let along = unit_vector(wall_angle);
            let wall = Segment::new(-along * 5.0, along * 5.0);
            let dir = unit_vector(dir_angle);
            prop_assume!(dir.perp_dot(along).abs() > 0.05);

            let old = -dir * before;
            let new = dir * after;
            let result = resolve(old, new, dir * 3.0, &[wall], BumpResponse::default());
            prop_assert!(result.bumped);
            prop_assert_eq!(result.position, old);
        }
    }
}
