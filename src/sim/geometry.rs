//! Segment geometry and frame conversions
//!
//! World-frame vectors are plain `Vec2`. Anything expressed relative to the
//! bat's heading is wrapped in `BodyVec` so the two frames cannot be mixed
//! without an explicit `body_to_world` / `world_to_body` call.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Relative determinant below which two lines count as parallel
pub const PARALLEL_EPSILON: f32 = 1e-6;
/// Slack added around a segment's bounding box in `point_on_segment`
pub const POINT_TOLERANCE: f32 = 1e-5;

/// A static wall between two endpoints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub p0: Vec2,
    pub p1: Vec2,
}

impl Segment {
    pub const fn new(p0: Vec2, p1: Vec2) -> Self {
        Self { p0, p1 }
    }

    /// Direction from `p0` to `p1` (not normalized)
    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.p1 - self.p0
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.direction().length()
    }

    /// Unit normal (left of `p0 -> p1`), zero for a degenerate segment
    pub fn normal(&self) -> Vec2 {
        self.direction().perp().normalize_or_zero()
    }

    pub fn midpoint(&self) -> Vec2 {
        (self.p0 + self.p1) * 0.5
    }
}

/// A vector in the bat's body frame (x = forward, y = left)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BodyVec(pub Vec2);

impl BodyVec {
    pub const FORWARD: Self = Self(Vec2::X);

    pub const fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }

    /// Unit body-frame direction at `angle` from the forward axis
    pub fn from_angle(angle: f32) -> Self {
        Self(unit_vector(angle))
    }

    /// Angle from the forward axis, `None` for a zero or non-finite vector
    pub fn angle(&self) -> Option<f32> {
        if !self.0.is_finite() || self.0.length_squared() <= f32::EPSILON {
            return None;
        }
        Some(self.0.y.atan2(self.0.x))
    }
}

/// (cos, sin) of `angle`
#[inline]
pub fn unit_vector(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Rotate `v` counter-clockwise by `angle`
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    let (s, c) = angle.sin_cos();
    Vec2::new(c * v.x - s * v.y, s * v.x + c * v.y)
}

/// Body frame -> world frame (rotate by +heading)
#[inline]
pub fn body_to_world(v: BodyVec, heading: f32) -> Vec2 {
    rotate(v.0, heading)
}

/// World frame -> body frame (rotate by -heading)
#[inline]
pub fn world_to_body(v: Vec2, heading: f32) -> BodyVec {
    BodyVec(rotate(v, -heading))
}

/// Intersection of the infinite lines through `a` and `b`
///
/// Returns `None` for parallel, collinear, near-parallel or zero-length
/// segments. The parallel test is relative to both segment lengths so the
/// guard does not depend on world scale.
pub fn line_intersection(a: &Segment, b: &Segment) -> Option<Vec2> {
    let da = a.direction();
    let db = b.direction();
    let det = da.perp_dot(db);
    let scale = da.length() * db.length();

    if !det.is_finite() || det.abs() <= PARALLEL_EPSILON * scale {
        return None;
    }

    let t = (b.p0 - a.p0).perp_dot(db) / det;
    let point = a.p0 + da * t;
    point.is_finite().then_some(point)
}

/// Whether `point` lies within the (slightly widened) bounding box of `segment`
pub fn point_on_segment(point: Vec2, segment: &Segment) -> bool {
    let min = segment.p0.min(segment.p1) - Vec2::splat(POINT_TOLERANCE);
    let max = segment.p0.max(segment.p1) + Vec2::splat(POINT_TOLERANCE);
    point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
}

/// Crossing point of two finite segments
pub fn segment_intersection(a: &Segment, b: &Segment) -> Option<Vec2> {
    line_intersection(a, b).filter(|p| point_on_segment(*p, a) && point_on_segment(*p, b))
}
