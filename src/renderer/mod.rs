//! Scene rendering to a flat vertex buffer
//!
//! Rendering is a pure function of the bat state and wall set; nothing here
//! feeds back into the simulation. The output is a triangle list in world
//! units multiplied by `scale` (e.g. pixels per metre).

pub mod shapes;
pub mod vertex;

use serde::{Deserialize, Serialize};

use crate::sim::{BatState, Segment};

pub use vertex::{Vertex, colors};

/// Segments used for the echo source dot
const ECHO_SEGMENTS: u32 = 12;

/// Which cues to draw and how large
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Draw a line along the most recent pulse direction
    pub draw_pulse_direction: bool,
    /// Draw a dot where the most recent echo came from
    pub draw_echo_source: bool,
    /// Length of the pulse line (m)
    pub pulse_length: f32,
    /// Radius of the echo source dot (m)
    pub echo_radius: f32,
    /// Wall thickness (m)
    pub wall_width: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            draw_pulse_direction: true,
            draw_echo_source: true,
            pulse_length: 0.5,
            echo_radius: 0.04,
            wall_width: 0.02,
        }
    }
}

/// One frame of triangle-list vertices
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub vertices: Vec<Vertex>,
}

impl Frame {
    /// Raw vertex bytes, ready for upload to a vertex buffer
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }
}

/// Build the vertex list for the current scene
pub fn render_scene(
    state: &BatState,
    walls: &[Segment],
    options: &RenderOptions,
    scale: f32,
) -> Frame {
    let mut vertices = Vec::new();

    for wall in walls {
        vertices.extend(shapes::thick_line(
            wall.p0 * scale,
            wall.p1 * scale,
            options.wall_width * scale,
            colors::WALL,
        ));
    }

    let centre = state.position * scale;

    if state.emitted_this_tick {
        if options.draw_pulse_direction
            && let Some(direction) = state.last_pulse
        {
            let tip = centre + direction * (options.pulse_length * scale);
            vertices.extend(shapes::thick_line(
                centre,
                tip,
                options.wall_width * scale,
                colors::PULSE,
            ));
        }
        if options.draw_echo_source
            && let Some(echo) = &state.last_echo
        {
            vertices.extend(shapes::circle(
                echo.hit_point * scale,
                options.echo_radius * scale,
                colors::ECHO_SOURCE,
                ECHO_SEGMENTS,
            ));
        }
    }

    // Bat last so it sits on top
    vertices.extend(shapes::bat_glyph(
        centre,
        state.heading,
        state.body_size * scale,
        colors::BAT,
    ));

    Frame { vertices }
}

/// Simulation ticks between rendered frames at `consts::FPS`
pub fn ticks_per_frame(dt: f32) -> u32 {
    if dt.is_nan() || dt <= 0.0 {
        return 1;
    }
    ((1.0 / (crate::consts::FPS as f32 * dt)).round() as u32).max(1)
}
