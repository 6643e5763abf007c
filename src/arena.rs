//! Wall layouts and spawn poses
//!
//! Layouts are generated by the orchestrator; the simulation core only ever
//! sees the resulting wall slice.

use std::f32::consts::PI;

use glam::Vec2;
use rand::Rng;

use crate::settings::{ObstacleLayout, SpawnPolicy};
use crate::sim::{BatPose, Segment, unit_vector};

/// Four walls on the rectangle inset by `margin` from the world edge
pub fn boundary_walls(width: f32, height: f32, margin: f32) -> Vec<Segment> {
    let p0 = Vec2::new(margin, margin);
    let p1 = Vec2::new(margin, height - margin);
    let p2 = Vec2::new(width - margin, height - margin);
    let p3 = Vec2::new(width - margin, margin);
    vec![
        Segment::new(p0, p1),
        Segment::new(p1, p2),
        Segment::new(p2, p3),
        Segment::new(p3, p0),
    ]
}

/// `n` evenly spaced values from `min` to `max` inclusive
fn linspace(min: f32, max: f32, n: usize) -> impl Iterator<Item = f32> {
    let step = if n > 1 { (max - min) / (n - 1) as f32 } else { 0.0 };
    (0..n).map(move |i| min + step * i as f32)
}

/// Short walls centred on a jittered grid with random orientation
pub fn scatter_obstacles<R: Rng>(layout: &ObstacleLayout, rng: &mut R) -> Vec<Segment> {
    let coords: Vec<f32> = linspace(layout.grid_min, layout.grid_max, layout.grid_count).collect();
    let mut walls = Vec::with_capacity(coords.len() * coords.len());

    for &y in &coords {
        for &x in &coords {
            let centre = Vec2::new(x + jitter(rng, layout.jitter), y + jitter(rng, layout.jitter));
            let angle = rng.random_range(-PI..PI);
            let half = unit_vector(angle) * (layout.wall_length / 2.0);
            walls.push(Segment::new(centre + half, centre - half));
        }
    }

    walls
}

fn jitter<R: Rng>(rng: &mut R, amount: f32) -> f32 {
    if amount > 0.0 {
        rng.random_range(-amount..amount)
    } else {
        0.0
    }
}

/// Starting pose for a new episode
pub fn spawn_pose<R: Rng>(policy: &SpawnPolicy, width: f32, height: f32, rng: &mut R) -> BatPose {
    match *policy {
        SpawnPolicy::Fixed(pose) => pose,
        SpawnPolicy::Random { margin, speed } => {
            let heading = rng.random_range(-PI..PI);
            let x = rng.random_range(margin..width - margin);
            let y = rng.random_range(margin..height - margin);
            BatPose::new(Vec2::new(x, y), heading, speed)
        }
    }
}
