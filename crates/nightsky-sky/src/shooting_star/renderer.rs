//! Head and trail shading for the shooting star.
//!
//! One camera-facing quad centered on the head covers the whole trail. The
//! head reuses the star glow with a spinning flare. The trail is a capsule
//! distance field from the head toward `direction * length`, colored by a
//! three-stop gradient and faded toward the tail.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use nightsky_render::{
    BlendMode, CameraFrame, EPSILON, MaterialDescriptor, MaterialError, MaterialRegistry,
    QuadMesh, QuadVertex, UniformSlot,
};

use super::ShootingStar;
use crate::glow::{ALPHA_EPSILON, GLOW_WGSL, GlowSample, glow_alpha, glow_brightness, rotate2};
use crate::materials::SHOOTING_STAR;

/// Head glow radius in world units.
pub const HEAD_SIZE: f32 = 2.0;
/// World length of a trail with length 1.
pub const TRAIL_WORLD_LENGTH: f32 = 18.0;
/// Falloff of the bright trail core across the capsule.
pub const TRAIL_CORE_FALLOFF: f32 = 8.0;
/// Falloff of the soft trail glow.
pub const TRAIL_SOFT_FALLOFF: f32 = 1.5;
/// Weight of the soft trail glow.
pub const TRAIL_SOFT_WEIGHT: f32 = 0.35;
/// Higher values dim the tail sooner.
pub const TRAIL_FADE_EXPONENT: f32 = 1.5;

/// Trail colors from head to tail.
pub const TRAIL_HEAD_COLOR: Vec3 = Vec3::new(1.0, 0.97, 0.9);
pub const TRAIL_MID_COLOR: Vec3 = Vec3::new(0.55, 0.75, 1.0);
pub const TRAIL_TAIL_COLOR: Vec3 = Vec3::new(0.6, 0.35, 0.9);

const SHOOTING_STAR_WGSL: &str = r#"
struct ShootingStarUniforms {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    head: vec3<f32>,
    brightness: f32,
    trail_direction: vec2<f32>,
    trail_length: f32,
    spin: f32,
    head_size: f32,
    trail_world_length: f32,
    _pad0: f32,
    _pad1: f32,
};

@group(0) @binding(0) var<uniform> star: ShootingStarUniforms;

const TRAIL_CORE_FALLOFF: f32 = 8.0;
const TRAIL_SOFT_FALLOFF: f32 = 1.5;
const TRAIL_SOFT_WEIGHT: f32 = 0.35;
const TRAIL_FADE_EXPONENT: f32 = 1.5;
const TRAIL_HEAD_COLOR: vec3<f32> = vec3<f32>(1.0, 0.97, 0.9);
const TRAIL_MID_COLOR: vec3<f32> = vec3<f32>(0.55, 0.75, 1.0);
const TRAIL_TAIL_COLOR: vec3<f32> = vec3<f32>(0.6, 0.35, 0.9);

struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) q: vec2<f32>,
};

@vertex
fn vs_main(@location(0) corner: vec2<f32>) -> VertexOutput {
    let extent = star.head_size + star.trail_world_length;
    var view_pos = star.view * vec4<f32>(star.head, 1.0);
    view_pos = vec4<f32>(view_pos.xy + corner * extent, view_pos.z, view_pos.w);
    var out: VertexOutput;
    out.clip = star.proj * view_pos;
    out.q = corner * extent;
    return out;
}

fn trail_color(h: f32) -> vec3<f32> {
    if h < 0.5 {
        return mix(TRAIL_HEAD_COLOR, TRAIL_MID_COLOR, h * 2.0);
    }
    return mix(TRAIL_MID_COLOR, TRAIL_TAIL_COLOR, (h - 0.5) * 2.0);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let u = in.q / star.head_size;
    let head_b = glow_brightness(u, rotate2(u, star.spin), 1.0);
    let head_a = glow_alpha(head_b, length(u));

    let seg = star.trail_direction * star.trail_length * star.trail_world_length;
    let seg_len2 = dot(seg, seg);
    var h = 0.0;
    if seg_len2 > 1e-8 {
        h = clamp(dot(in.q, seg) / seg_len2, 0.0, 1.0);
    }
    let d = length(in.q - seg * h);
    let cross_section = exp(-d * TRAIL_CORE_FALLOFF) + TRAIL_SOFT_WEIGHT * exp(-d * TRAIL_SOFT_FALLOFF);
    let trail = clamp(cross_section * pow(1.0 - h, TRAIL_FADE_EXPONENT), 0.0, 1.0);

    let alpha = clamp(max(head_a, trail), 0.0, 1.0) * star.brightness;
    if alpha < ALPHA_EPSILON {
        discard;
    }
    let color = (vec3<f32>(1.0, 1.0, 1.0) * head_b + trail_color(h) * trail) * star.brightness;
    return vec4<f32>(color, alpha);
}
"#;

pub(crate) fn shooting_star_material() -> MaterialDescriptor {
    MaterialDescriptor {
        source: format!("{GLOW_WGSL}{SHOOTING_STAR_WGSL}"),
        vertex_entry: "vs_main",
        fragment_entry: "fs_main",
        vertex_buffers: vec![QuadVertex::LAYOUT],
        blend: BlendMode::Additive,
    }
}

/// Trail gradient at parameter `h` (0 at the head, 1 at the tail).
pub fn trail_color(h: f32) -> Vec3 {
    let h = h.clamp(0.0, 1.0);
    if h < 0.5 {
        TRAIL_HEAD_COLOR.lerp(TRAIL_MID_COLOR, h * 2.0)
    } else {
        TRAIL_MID_COLOR.lerp(TRAIL_TAIL_COLOR, (h - 0.5) * 2.0)
    }
}

/// Trail geometry in view-plane units around the head.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailShading {
    /// Head-to-tail direction, unit length.
    pub direction: Vec2,
    /// In `[0, 1]`.
    pub length: f32,
    pub spin: f32,
    /// Overall brightness in `[0, 1]`.
    pub brightness: f32,
}

impl TrailShading {
    pub fn of(star: &ShootingStar) -> Self {
        Self {
            direction: star.trail.direction,
            length: star.trail.length,
            spin: star.spin,
            brightness: star.brightness,
        }
    }

    /// Distance from `q` to the trail segment and the segment parameter of the
    /// closest point.
    pub fn closest(&self, q: Vec2) -> (f32, f32) {
        let seg = self.direction * self.length * TRAIL_WORLD_LENGTH;
        let seg_len2 = seg.length_squared();
        let h = if seg_len2 > EPSILON * EPSILON {
            (q.dot(seg) / seg_len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        ((q - seg * h).length(), h)
    }
}

/// Shade the fragment at view-plane offset `q` from the head.
pub fn shade_shooting_star(q: Vec2, shading: &TrailShading) -> Option<GlowSample> {
    let u = q / HEAD_SIZE;
    let head_b = glow_brightness(u, rotate2(u, shading.spin), 1.0);
    let head_a = glow_alpha(head_b, u.length());

    let (d, h) = shading.closest(q);
    let cross_section =
        (-d * TRAIL_CORE_FALLOFF).exp() + TRAIL_SOFT_WEIGHT * (-d * TRAIL_SOFT_FALLOFF).exp();
    let trail = (cross_section * (1.0 - h).powf(TRAIL_FADE_EXPONENT)).clamp(0.0, 1.0);

    let brightness = shading.brightness.clamp(0.0, 1.0);
    let alpha = head_a.max(trail).clamp(0.0, 1.0) * brightness;
    (alpha >= ALPHA_EPSILON).then_some(GlowSample {
        brightness: (head_b + trail).clamp(0.0, 1.0) * brightness,
        alpha,
    })
}

/// Uniform block of the shooting star material.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ShootingStarUniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub head: [f32; 3],
    pub brightness: f32,
    pub trail_direction: [f32; 2],
    pub trail_length: f32,
    pub spin: f32,
    pub head_size: f32,
    pub trail_world_length: f32,
    pub _padding: [f32; 2],
}

impl ShootingStarUniforms {
    pub fn new(star: &ShootingStar, camera: &CameraFrame) -> Self {
        Self {
            view: camera.view.to_cols_array_2d(),
            proj: camera.proj.to_cols_array_2d(),
            head: star.position.to_array(),
            brightness: star.brightness.clamp(0.0, 1.0),
            trail_direction: star.trail.direction.to_array(),
            trail_length: star.trail.length,
            spin: star.spin,
            head_size: HEAD_SIZE,
            trail_world_length: TRAIL_WORLD_LENGTH,
            _padding: [0.0; 2],
        }
    }
}

struct ShootingStarGpu {
    pipeline: wgpu::RenderPipeline,
    quad: QuadMesh,
    uniforms: UniformSlot<ShootingStarUniforms>,
}

/// GPU handles for the shooting star; empty until attached.
#[derive(Default)]
pub struct ShootingStarRenderer {
    gpu: Option<ShootingStarGpu>,
}

impl ShootingStarRenderer {
    pub fn attach(
        &mut self,
        device: &wgpu::Device,
        registry: &MaterialRegistry,
        format: wgpu::TextureFormat,
    ) -> Result<(), MaterialError> {
        let uniforms = UniformSlot::new(device, SHOOTING_STAR.name(), &ShootingStarUniforms::zeroed());
        let pipeline =
            registry.create_pipeline(device, SHOOTING_STAR, format, &[uniforms.layout()])?;
        self.gpu = Some(ShootingStarGpu {
            pipeline,
            quad: QuadMesh::new(device, SHOOTING_STAR.name()),
            uniforms,
        });
        log::info!("Shooting star renderer initialized");
        Ok(())
    }

    pub fn is_attached(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn prepare(&self, queue: &wgpu::Queue, star: &ShootingStar, camera: &CameraFrame) {
        if let Some(gpu) = &self.gpu {
            gpu.uniforms.write(queue, &ShootingStarUniforms::new(star, camera));
        }
    }

    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(gpu) = &self.gpu else {
            return;
        };
        pass.set_pipeline(&gpu.pipeline);
        pass.set_bind_group(0, gpu.uniforms.bind_group(), &[]);
        gpu.quad.draw_instanced(pass, 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shooting_star::{Flight, Phase, ShootingStarInput};
    use nightsky_render::Camera;

    fn shading(length: f32) -> TrailShading {
        TrailShading {
            direction: Vec2::new(-1.0, 0.0),
            length,
            spin: 0.3,
            brightness: 1.0,
        }
    }

    fn view_plane() -> impl Iterator<Item = Vec2> {
        let extent = HEAD_SIZE + TRAIL_WORLD_LENGTH;
        (0..=60).flat_map(move |i| {
            (0..=60).map(move |j| {
                Vec2::new(i as f32 / 30.0 - 1.0, j as f32 / 30.0 - 1.0) * extent
            })
        })
    }

    #[test]
    fn test_brightness_and_alpha_in_unit_range() {
        for length in [0.0, 0.03, 0.5, 1.0] {
            for brightness in [0.0, 0.35, 0.7, 1.0] {
                let s = TrailShading {
                    brightness,
                    ..shading(length)
                };
                for q in view_plane() {
                    if let Some(sample) = shade_shooting_star(q, &s) {
                        assert!((0.0..=1.0).contains(&sample.brightness));
                        assert!((0.0..=1.0).contains(&sample.alpha));
                    }
                }
            }
        }
    }

    #[test]
    fn test_trail_extends_behind_head_only() {
        let s = shading(1.0);
        let behind = shade_shooting_star(Vec2::new(-8.0, 0.0), &s).map_or(0.0, |x| x.alpha);
        let ahead = shade_shooting_star(Vec2::new(8.0, 0.0), &s).map_or(0.0, |x| x.alpha);
        assert!(behind > 0.2, "trail should be visible behind the head");
        assert!(ahead < behind * 0.5);
    }

    #[test]
    fn test_tail_dimmer_than_head_end() {
        let s = shading(1.0);
        let (_, near_h) = s.closest(Vec2::new(-2.0, 0.0));
        let (_, far_h) = s.closest(Vec2::new(-16.0, 0.0));
        assert!(near_h < far_h);
        let near = shade_shooting_star(Vec2::new(-3.0, 0.0), &s).map_or(0.0, |x| x.brightness);
        let far = shade_shooting_star(Vec2::new(-16.0, 0.0), &s).map_or(0.0, |x| x.brightness);
        assert!(near > far);
    }

    #[test]
    fn test_collapsed_trail_has_no_nan() {
        let s = shading(0.0);
        let (d, h) = s.closest(Vec2::new(3.0, 4.0));
        assert_eq!(h, 0.0);
        assert!((d - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_gradient_stops() {
        assert_eq!(trail_color(0.0), TRAIL_HEAD_COLOR);
        assert!((trail_color(0.5) - TRAIL_MID_COLOR).length() < 1e-6);
        assert!((trail_color(1.0) - TRAIL_TAIL_COLOR).length() < 1e-6);
    }

    #[test]
    fn test_uniforms_follow_star_state() {
        let flight = Flight {
            start: Vec3::new(-10.0, 5.0, -40.0),
            target: Vec3::new(0.0, 0.0, -30.0),
            exit_speed: 30.0,
            look_easing: 0.05,
        };
        let camera = Camera::default().frame();
        let input = ShootingStarInput {
            exit_requested: false,
            camera,
            latest_star: None,
        };
        let mut star = ShootingStar::spawn(flight);
        for _ in 0..20 {
            star = star.step(1.0 / 60.0, &input).0;
        }
        assert_eq!(star.phase, Phase::Entering);
        let uniforms = ShootingStarUniforms::new(&star, &camera);
        assert_eq!(uniforms.head, star.position.to_array());
        assert_eq!(uniforms.trail_length, star.trail.length);
        assert_eq!(std::mem::size_of::<ShootingStarUniforms>(), 176);
    }

    #[test]
    fn test_material_reuses_glow_functions() {
        let material = shooting_star_material();
        assert!(material.source.contains("fn glow_brightness"));
        assert_eq!(material.blend, BlendMode::Additive);
    }
}
