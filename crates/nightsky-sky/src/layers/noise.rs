//! Value noise, fbm and cell hashing shared by the sky layer shaders.
//!
//! [`NOISE_WGSL`] is prepended to every noise-driven layer; the Rust functions
//! here mirror it so layer output can be tested on the CPU.

use glam::{Mat2, Vec2};

/// Rotation between fbm octaves, in radians.
pub const OCTAVE_ROTATION: f32 = 0.5;
/// Offset added between octaves so lattice points never line up.
pub const OCTAVE_SHIFT: f32 = 100.0;
/// Fraction of cells that hold no star.
pub const EMPTY_CELL_THRESHOLD: f32 = 0.85;

pub const NOISE_WGSL: &str = r#"
const OCTAVE_ROTATION: f32 = 0.5;
const OCTAVE_SHIFT: f32 = 100.0;
const EMPTY_CELL_THRESHOLD: f32 = 0.85;

fn hash21(p: vec2<f32>) -> f32 {
    return fract(sin(dot(p, vec2<f32>(127.1, 311.7))) * 43758.5453);
}

fn value_noise(p: vec2<f32>) -> f32 {
    let i = floor(p);
    let f = fract(p);
    let u = f * f * (3.0 - 2.0 * f);
    let a = hash21(i);
    let b = hash21(i + vec2<f32>(1.0, 0.0));
    let c = hash21(i + vec2<f32>(0.0, 1.0));
    let d = hash21(i + vec2<f32>(1.0, 1.0));
    return mix(mix(a, b, u.x), mix(c, d, u.x), u.y);
}

fn fbm(p_in: vec2<f32>, octaves: i32) -> f32 {
    let rot = mat2x2<f32>(cos(OCTAVE_ROTATION), sin(OCTAVE_ROTATION), -sin(OCTAVE_ROTATION), cos(OCTAVE_ROTATION));
    var p = p_in;
    var sum = 0.0;
    var amp = 0.5;
    for (var i = 0; i < octaves; i = i + 1) {
        sum = sum + amp * value_noise(p);
        p = rot * p * 2.0 + vec2<f32>(OCTAVE_SHIFT, OCTAVE_SHIFT);
        amp = amp * 0.5;
    }
    return sum;
}

// x: brightness, y: size, z,w: offset in cell. x < 0 for empty cells.
fn cell_star(cell: vec2<f32>) -> vec4<f32> {
    let h = hash21(cell);
    if h < EMPTY_CELL_THRESHOLD {
        return vec4<f32>(-1.0, 0.0, 0.0, 0.0);
    }
    let brightness = (h - EMPTY_CELL_THRESHOLD) / (1.0 - EMPTY_CELL_THRESHOLD);
    let size = mix(0.03, 0.09, hash21(cell + vec2<f32>(47.0, 47.0)));
    let offset = vec2<f32>(hash21(cell + vec2<f32>(17.0, 17.0)), hash21(cell + vec2<f32>(31.0, 31.0))) * 0.8 + 0.1;
    return vec4<f32>(brightness, size, offset);
}
"#;

fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// Pseudo-random value in `[0, 1)` for a lattice point.
pub fn hash21(p: Vec2) -> f32 {
    fract((p.dot(Vec2::new(127.1, 311.7))).sin() * 43758.545)
}

/// Smooth 2D value noise in `[0, 1]`.
pub fn value_noise(p: Vec2) -> f32 {
    let i = p.floor();
    let f = p - i;
    let u = f * f * (Vec2::splat(3.0) - 2.0 * f);
    let a = hash21(i);
    let b = hash21(i + Vec2::X);
    let c = hash21(i + Vec2::Y);
    let d = hash21(i + Vec2::ONE);
    let bottom = a + (b - a) * u.x;
    let top = c + (d - c) * u.x;
    bottom + (top - bottom) * u.y
}

/// Fractal sum of `octaves` rotated value-noise layers, in `[0, 1)`.
pub fn fbm(mut p: Vec2, octaves: u32) -> f32 {
    let rot = Mat2::from_angle(OCTAVE_ROTATION);
    let mut sum = 0.0;
    let mut amp = 0.5;
    for _ in 0..octaves {
        sum += amp * value_noise(p);
        p = rot * p * 2.0 + Vec2::splat(OCTAVE_SHIFT);
        amp *= 0.5;
    }
    sum
}

/// A star living in one grid cell of the distant star layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellStar {
    /// In `[0, 1]`.
    pub brightness: f32,
    /// Radius in cell units.
    pub size: f32,
    /// Position inside the cell, kept away from the borders.
    pub offset: Vec2,
}

/// The star of `cell`, if that cell holds one.
pub fn cell_star(cell: Vec2) -> Option<CellStar> {
    let h = hash21(cell);
    if h < EMPTY_CELL_THRESHOLD {
        return None;
    }
    let size_t = hash21(cell + Vec2::splat(47.0));
    Some(CellStar {
        brightness: (h - EMPTY_CELL_THRESHOLD) / (1.0 - EMPTY_CELL_THRESHOLD),
        size: 0.03 + (0.09 - 0.03) * size_t,
        offset: Vec2::new(
            hash21(cell + Vec2::splat(17.0)),
            hash21(cell + Vec2::splat(31.0)),
        ) * 0.8
            + Vec2::splat(0.1),
    })
}
