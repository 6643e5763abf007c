//! Triangle-list builders for scene primitives

use glam::Vec2;
use std::f32::consts::{PI, TAU};

use super::vertex::Vertex;

/// Wing sweep of the bat glyph (radians from the nose)
const WING_ANGLE: f32 = 4.0 * PI / 5.0;

/// Thick line from `a` to `b` as a quad (two triangles)
pub fn thick_line(a: Vec2, b: Vec2, width: f32, color: [f32; 4]) -> Vec<Vertex> {
    let side = (b - a).normalize_or_zero().perp() * (width / 2.0);
    if side == Vec2::ZERO {
        return Vec::new();
    }
    [a + side, a - side, b + side, b + side, a - side, b - side]
        .into_iter()
        .map(|p| Vertex::at(p, color))
        .collect()
}

/// Filled disc as a fan of `segments` triangles (at least 3)
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let segments = segments.max(3);
    let step = TAU / segments as f32;
    (0..segments)
        .flat_map(|i| {
            let rim0 = center + Vec2::from_angle(i as f32 * step) * radius;
            let rim1 = center + Vec2::from_angle((i + 1) as f32 * step) * radius;
            [center, rim0, rim1]
        })
        .map(|p| Vertex::at(p, color))
        .collect()
}

/// Arrow-head glyph for the bat: nose along `heading`, two swept wing tips
pub fn bat_glyph(center: Vec2, heading: f32, size: f32, color: [f32; 4]) -> Vec<Vertex> {
    let r = size / 2.0;
    [heading, heading - WING_ANGLE, heading + WING_ANGLE]
        .into_iter()
        .map(|angle| Vertex::at(center + Vec2::from_angle(angle) * r, color))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

    #[test]
    fn test_thick_line_quad() {
        let v = thick_line(Vec2::ZERO, Vec2::new(2.0, 0.0), 0.2, RED);
        assert_eq!(v.len(), 6);
        for vertex in &v {
            assert!((vertex.position[1].abs() - 0.1).abs() < 1e-6);
        }
    }

    #[test]
    fn test_degenerate_line_is_empty() {
        assert!(thick_line(Vec2::ONE, Vec2::ONE, 0.2, RED).is_empty());
    }

    #[test]
    fn test_circle_vertex_count() {
        assert_eq!(circle(Vec2::ZERO, 1.0, RED, 16).len(), 48);
        assert_eq!(circle(Vec2::ZERO, 1.0, RED, 0).len(), 9);
    }

    #[test]
    fn test_bat_glyph_points_along_heading() {
        let v = bat_glyph(Vec2::ZERO, 0.0, 2.0, RED);
        assert_eq!(v.len(), 3);
        assert!((v[0].position[0] - 1.0).abs() < 1e-6);
        // Wing tips sit behind the centre, mirrored across the heading
        assert!(v[1].position[0] < 0.0 && v[2].position[0] < 0.0);
        assert!((v[1].position[1] + v[2].position[1]).abs() < 1e-6);
    }
}
