//! Render vertex format

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// Position + RGBA color, laid out for direct upload
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    #[inline]
    pub fn at(point: Vec2, color: [f32; 4]) -> Self {
        Self {
            position: point.to_array(),
            color,
        }
    }

    /// Byte stride of one vertex in a buffer
    pub const STRIDE: usize = std::mem::size_of::<Vertex>();
}

/// Scene palette
pub mod colors {
    pub const BAT: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
    pub const WALL: [f32; 4] = [0.5, 0.5, 0.5, 1.0];
    pub const PULSE: [f32; 4] = [0.2, 0.4, 0.9, 1.0];
    pub const ECHO_SOURCE: [f32; 4] = [0.9, 0.65, 0.4, 1.0];
}
