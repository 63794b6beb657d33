//! Billboarded glow stars: core glow, cross-flare spikes and twinkle.
//!
//! The same shading model draws journal stars, background field stars and the
//! shooting star head. [`GLOW_WGSL`] holds the shared shader functions; the
//! Rust functions in this module mirror them one-to-one so the shading math can
//! be checked without a GPU.
//!
//! Quads are billboarded in view space: each instance center is transformed by
//! the view matrix and the corner offsets are added afterwards, so the quad
//! always faces the camera.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use nightsky_render::{
    BlendMode, CameraFrame, MaterialDescriptor, MaterialError, MaterialId, MaterialRegistry,
    QuadMesh, QuadVertex, UniformSlot,
};

use crate::star::StarCatalog;
use crate::starfield::StarField;

/// Falloff rate of the wide halo.
pub const GLOW_WIDE: f32 = 3.0;
/// Falloff rate of the bright nucleus.
pub const GLOW_TIGHT: f32 = 24.0;
/// Spike sharpness: smaller is thinner.
pub const SPIKE_K: f32 = 0.02;
/// Exponent that sharpens the combined spikes.
pub const SPIKE_POWER: f32 = 1.5;
/// Weight of spikes in the final brightness.
pub const SPIKE_WEIGHT: f32 = 0.4;
/// Seed multiplier that spreads twinkle phases apart.
pub const TWINKLE_SEED_SCALE: f32 = 1000.0;
/// Fragments with less alpha than this are discarded.
pub const ALPHA_EPSILON: f32 = 0.01;

/// Shared WGSL glow functions. Must stay in sync with the Rust mirrors below.
pub const GLOW_WGSL: &str = r#"
const GLOW_WIDE: f32 = 3.0;
const GLOW_TIGHT: f32 = 24.0;
const SPIKE_K: f32 = 0.02;
const SPIKE_POWER: f32 = 1.5;
const SPIKE_WEIGHT: f32 = 0.4;
const TWINKLE_SEED_SCALE: f32 = 1000.0;
const ALPHA_EPSILON: f32 = 0.01;

fn core_glow(r: f32) -> f32 {
    return 0.6 * exp(-r * GLOW_WIDE) + 0.9 * exp(-r * GLOW_TIGHT);
}

fn spikes(u: vec2<f32>) -> f32 {
    let horizontal = SPIKE_K / (abs(u.y) + SPIKE_K) * max(1.0 - abs(u.x), 0.0);
    let vertical = SPIKE_K / (abs(u.x) + SPIKE_K) * max(1.0 - abs(u.y), 0.0);
    return pow(0.5 * (horizontal + vertical), SPIKE_POWER);
}

fn twinkle(time: f32, freq: f32, seed: f32, amplitude: f32, base: f32) -> f32 {
    return sin(time * freq + seed * TWINKLE_SEED_SCALE) * amplitude + base;
}

fn rotate2(u: vec2<f32>, angle: f32) -> vec2<f32> {
    let c = cos(angle);
    let s = sin(angle);
    return vec2<f32>(c * u.x - s * u.y, s * u.x + c * u.y);
}

fn glow_brightness(u: vec2<f32>, flare: vec2<f32>, tw: f32) -> f32 {
    let b = (core_glow(length(u)) + SPIKE_WEIGHT * spikes(flare)) * tw;
    return clamp(b, 0.0, 1.0);
}

fn glow_alpha(brightness: f32, r: f32) -> f32 {
    let a = smoothstep(0.02, 0.35, brightness) * (1.0 - smoothstep(0.7, 1.0, r));
    return clamp(a, 0.0, 1.0);
}
"#;

const STAR_GLOW_WGSL: &str = r#"
struct GlowUniforms {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    time: f32,
    size: f32,
    twinkle_freq: f32,
    twinkle_amplitude: f32,
    twinkle_base: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
};

@group(0) @binding(0) var<uniform> glow: GlowUniforms;

struct VertexInput {
    @location(0) corner: vec2<f32>,
    @location(1) offset: vec3<f32>,
    @location(2) scale: f32,
    @location(3) color: vec3<f32>,
    @location(4) random: f32,
};

struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec3<f32>,
    @location(2) random: f32,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var view_pos = glow.view * vec4<f32>(in.offset, 1.0);
    view_pos = vec4<f32>(view_pos.xy + in.corner * in.scale * glow.size, view_pos.z, view_pos.w);
    var out: VertexOutput;
    out.clip = glow.proj * view_pos;
    out.uv = in.corner;
    out.color = in.color;
    out.random = in.random;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let tw = twinkle(glow.time, glow.twinkle_freq, in.random, glow.twinkle_amplitude, glow.twinkle_base);
    let brightness = glow_brightness(in.uv, in.uv, tw);
    let alpha = glow_alpha(brightness, length(in.uv));
    if alpha < ALPHA_EPSILON {
        discard;
    }
    return vec4<f32>(in.color * brightness, alpha);
}
"#;

/// Radial core: wide halo plus tight nucleus.
pub fn core_glow(r: f32) -> f32 {
    0.6 * (-r * GLOW_WIDE).exp() + 0.9 * (-r * GLOW_TIGHT).exp()
}

/// Four-way cross flare in quad space, in `[0, 1]`.
pub fn spikes(u: Vec2) -> f32 {
    let horizontal = SPIKE_K / (u.y.abs() + SPIKE_K) * (1.0 - u.x.abs()).max(0.0);
    let vertical = SPIKE_K / (u.x.abs() + SPIKE_K) * (1.0 - u.y.abs()).max(0.0);
    (0.5 * (horizontal + vertical)).powf(SPIKE_POWER)
}

/// How strongly a star's brightness oscillates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Twinkle {
    /// Full swing between 0 and 1.
    Full,
    /// Gentle swing between 0.7 and 1.
    Subtle,
}

impl Twinkle {
    /// `(amplitude, base)` of the sine modulation.
    pub fn amplitude_base(self) -> (f32, f32) {
        match self {
            Twinkle::Full => (0.5, 0.5),
            Twinkle::Subtle => (0.15, 0.85),
        }
    }
}

/// Twinkle factor for one star at `time`.
pub fn twinkle(time: f32, freq: f32, seed: f32, mode: Twinkle) -> f32 {
    let (amplitude, base) = mode.amplitude_base();
    (time * freq + seed * TWINKLE_SEED_SCALE).sin() * amplitude + base
}

/// Rotate a quad-space point counter-clockwise by `angle` radians.
pub fn rotate2(u: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(u)
}

/// Final brightness in `[0, 1]`. `flare` is `u` with any head rotation applied.
pub fn glow_brightness(u: Vec2, flare: Vec2, twinkle: f32) -> f32 {
    ((core_glow(u.length()) + SPIKE_WEIGHT * spikes(flare)) * twinkle).clamp(0.0, 1.0)
}

/// Alpha from brightness, masked radially so the square never shows.
pub fn glow_alpha(brightness: f32, r: f32) -> f32 {
    (smoothstep(0.02, 0.35, brightness) * (1.0 - smoothstep(0.7, 1.0, r))).clamp(0.0, 1.0)
}

/// Shaded brightness and alpha of one fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowSample {
    pub brightness: f32,
    pub alpha: f32,
}

/// Shade the fragment at quad-space `u`; `None` where it would be discarded.
pub fn shade(u: Vec2, twinkle: f32) -> Option<GlowSample> {
    let brightness = glow_brightness(u, u, twinkle);
    let alpha = glow_alpha(brightness, u.length());
    (alpha >= ALPHA_EPSILON).then_some(GlowSample { brightness, alpha })
}

pub(crate) fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Per-star instance data.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GlowInstance {
    pub offset: [f32; 3],
    pub scale: f32,
    pub color: [f32; 3],
    pub random: f32,
}

impl GlowInstance {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<GlowInstance>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &[
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 1,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32,
                offset: 12,
                shader_location: 2,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 16,
                shader_location: 3,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32,
                offset: 28,
                shader_location: 4,
            },
        ],
    };

    /// One instance per generated background star.
    pub fn from_field(field: &StarField) -> Vec<Self> {
        field
            .offsets
            .chunks_exact(3)
            .zip(field.colors.chunks_exact(3))
            .zip(field.scales.iter().zip(&field.randoms))
            .map(|((offset, color), (&scale, &random))| Self {
                offset: [offset[0], offset[1], offset[2]],
                scale,
                color: [color[0], color[1], color[2]],
                random,
            })
            .collect()
    }

    /// One instance per journal star, in catalog order.
    pub fn from_catalog(catalog: &StarCatalog) -> Vec<Self> {
        catalog
            .stars()
            .iter()
            .map(|star| Self {
                offset: star.position,
                scale: star.scale,
                color: star.color,
                random: star.random_seed,
            })
            .collect()
    }
}

/// Uniform block shared by both star-glow materials.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GlowUniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub time: f32,
    pub size: f32,
    pub twinkle_freq: f32,
    pub twinkle_amplitude: f32,
    pub twinkle_base: f32,
    pub _padding: [f32; 3],
}

/// Per-material look of a glow layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowStyle {
    /// World-space half size per unit of instance scale.
    pub size: f32,
    /// Twinkle angular frequency in radians per second.
    pub twinkle_freq: f32,
    pub twinkle: Twinkle,
}

impl GlowStyle {
    /// Journal stars: large, gentle twinkle.
    pub const JOURNAL: GlowStyle = GlowStyle {
        size: 0.6,
        twinkle_freq: 1.5,
        twinkle: Twinkle::Subtle,
    };

    /// Background field: small, full twinkle.
    pub const BACKGROUND: GlowStyle = GlowStyle {
        size: 0.5,
        twinkle_freq: 2.0,
        twinkle: Twinkle::Full,
    };
}

pub(crate) fn star_glow_material() -> MaterialDescriptor {
    MaterialDescriptor {
        source: format!("{GLOW_WGSL}{STAR_GLOW_WGSL}"),
        vertex_entry: "vs_main",
        fragment_entry: "fs_main",
        vertex_buffers: vec![QuadVertex::LAYOUT, GlowInstance::LAYOUT],
        blend: BlendMode::Additive,
    }
}

struct GlowGpu {
    pipeline: wgpu::RenderPipeline,
    quad: QuadMesh,
    uniforms: UniformSlot<GlowUniforms>,
    instance_buffer: Option<wgpu::Buffer>,
    instance_capacity: usize,
    uploaded: usize,
}

/// Instanced glow renderer for one set of stars.
///
/// CPU state (clock, instances, uniforms) lives here regardless of whether GPU
/// resources are attached; without them [`prepare`](Self::prepare) and
/// [`render`](Self::render) do nothing.
pub struct BillboardGlowRenderer {
    style: GlowStyle,
    time: f32,
    instances: Vec<GlowInstance>,
    dirty: bool,
    gpu: Option<GlowGpu>,
}

impl BillboardGlowRenderer {
    pub fn new(style: GlowStyle) -> Self {
        Self {
            style,
            time: 0.0,
            instances: Vec::new(),
            dirty: false,
            gpu: None,
        }
    }

    /// Compile the material and create GPU resources.
    pub fn attach(
        &mut self,
        device: &wgpu::Device,
        registry: &MaterialRegistry,
        material: MaterialId,
        format: wgpu::TextureFormat,
    ) -> Result<(), MaterialError> {
        let uniforms = UniformSlot::new(device, material.name(), &self.uniforms(None));
        let pipeline = registry.create_pipeline(device, material, format, &[uniforms.layout()])?;
        self.gpu = Some(GlowGpu {
            pipeline,
            quad: QuadMesh::new(device, material.name()),
            uniforms,
            instance_buffer: None,
            instance_capacity: 0,
            uploaded: 0,
        });
        self.dirty = true;
        log::info!("Glow renderer '{material}' initialized");
        Ok(())
    }

    pub fn is_attached(&self) -> bool {
        self.gpu.is_some()
    }

    /// Advance the twinkle clock.
    pub fn advance(&mut self, delta: f32) {
        self.time += delta.max(0.0);
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn instances(&self) -> &[GlowInstance] {
        &self.instances
    }

    /// Replace the instance set; uploaded on the next [`prepare`](Self::prepare).
    pub fn set_instances(&mut self, instances: Vec<GlowInstance>) {
        self.instances = instances;
        self.dirty = true;
    }

    /// Uniform block for the current clock and camera.
    pub fn uniforms(&self, frame: Option<&CameraFrame>) -> GlowUniforms {
        let (view, proj) = frame
            .map(|f| (f.view, f.proj))
            .unwrap_or((glam::Mat4::IDENTITY, glam::Mat4::IDENTITY));
        let (twinkle_amplitude, twinkle_base) = self.style.twinkle.amplitude_base();
        GlowUniforms {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            time: self.time,
            size: self.style.size,
            twinkle_freq: self.style.twinkle_freq,
            twinkle_amplitude,
            twinkle_base,
            _padding: [0.0; 3],
        }
    }

    /// Upload pending instances and this frame's uniforms.
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, frame: &CameraFrame) {
        let uniforms = self.uniforms(Some(frame));
        let Some(gpu) = self.gpu.as_mut() else {
            log::trace!("Glow renderer not attached, skipping frame");
            return;
        };
        gpu.uniforms.write(queue, &uniforms);

        if !self.dirty {
            return;
        }
        self.dirty = false;
        gpu.uploaded = self.instances.len();
        if self.instances.is_empty() {
            return;
        }
        if self.instances.len() > gpu.instance_capacity {
            use wgpu::util::DeviceExt;
            gpu.instance_buffer = Some(device.create_buffer_init(
                &wgpu::util::BufferInitDescriptor {
                    label: Some("glow-instances"),
                    contents: bytemuck::cast_slice(&self.instances),
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                },
            ));
            gpu.instance_capacity = self.instances.len();
        } else if let Some(buffer) = &gpu.instance_buffer {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(&self.instances));
        }
    }

    /// Draw all uploaded instances.
    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(gpu) = &self.gpu else {
            return;
        };
        let Some(instances) = &gpu.instance_buffer else {
            return;
        };
        if gpu.uploaded == 0 {
            return;
        }
        pass.set_pipeline(&gpu.pipeline);
        pass.set_bind_group(0, gpu.uniforms.bind_group(), &[]);
        pass.set_vertex_buffer(1, instances.slice(..));
        gpu.quad.draw_instanced(pass, gpu.uploaded as u32);
    }
}
