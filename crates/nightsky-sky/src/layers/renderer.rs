//! GPU side of the sky layers: full-screen triangle shaders and per-layer
//! pipeline state.

use bytemuck::{Pod, Zeroable};
use nightsky_render::{
    BlendMode, MaterialDescriptor, MaterialError, MaterialId, MaterialRegistry, UniformSlot,
};

use super::noise::NOISE_WGSL;

/// Uniform block of every sky layer.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SkyLayerUniforms {
    pub color_a: [f32; 4],
    pub color_b: [f32; 4],
    pub color_c: [f32; 4],
    pub resolution: [f32; 2],
    pub time: f32,
    pub intensity: f32,
    /// Parallax shift in sky units, larger for nearer layers.
    pub offset: [f32; 2],
    pub _padding: [f32; 2],
}

const LAYER_HEADER_WGSL: &str = r#"
struct SkyLayerUniforms {
    color_a: vec4<f32>,
    color_b: vec4<f32>,
    color_c: vec4<f32>,
    resolution: vec2<f32>,
    time: f32,
    intensity: f32,
    offset: vec2<f32>,
    _padding: vec2<f32>,
};

@group(0) @binding(0) var<uniform> layer: SkyLayerUniforms;

@vertex
fn vs_fullscreen(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {
    let x = f32(i32(index & 1u) * 4 - 1);
    let y = f32(i32(index >> 1u) * 4 - 1);
    return vec4<f32>(x, y, 0.0, 1.0);
}

// Pixel position to aspect-correct coordinates, y up, height spanning [0, 1],
// shifted by the layer's parallax offset.
fn sky_uv(frag: vec2<f32>) -> vec2<f32> {
    let res = max(layer.resolution, vec2<f32>(1.0, 1.0));
    return vec2<f32>(frag.x / res.y, 1.0 - frag.y / res.y) + layer.offset;
}
"#;

const GRADIENT_WGSL: &str = r#"
@fragment
fn fs_main(@builtin(position) frag: vec4<f32>) -> @location(0) vec4<f32> {
    let uv = sky_uv(frag.xy);
    let breathe = 0.03 * sin(layer.time * 0.1);
    let t = clamp(uv.y + breathe, 0.0, 1.0);
    let low = mix(layer.color_c.rgb, layer.color_b.rgb, smoothstep(0.0, 0.35, t));
    let color = mix(low, layer.color_a.rgb, smoothstep(0.35, 1.0, t));
    return vec4<f32>(color, 1.0);
}
"#;

const NEBULA_WGSL: &str = r#"
@fragment
fn fs_main(@builtin(position) frag: vec4<f32>) -> @location(0) vec4<f32> {
    let uv = sky_uv(frag.xy) * 3.0;
    let drift = vec2<f32>(layer.time * 0.015, layer.time * -0.008);
    let warp = fbm(uv + drift, 4);
    let n = fbm(uv + vec2<f32>(warp * 1.7, warp * 0.9) - drift, 5);
    let color = mix(layer.color_a.rgb, layer.color_b.rgb, smoothstep(0.3, 0.7, n));
    let tint = mix(color, layer.color_c.rgb, smoothstep(0.55, 0.85, warp));
    let alpha = smoothstep(0.35, 0.85, n) * layer.intensity;
    return vec4<f32>(tint, clamp(alpha, 0.0, 1.0));
}
"#;

const DISTANT_STARS_WGSL: &str = r#"
const CELLS_PER_HEIGHT: f32 = 90.0;

@fragment
fn fs_main(@builtin(position) frag: vec4<f32>) -> @location(0) vec4<f32> {
    let p = sky_uv(frag.xy) * CELLS_PER_HEIGHT;
    let cell = floor(p);
    let star = cell_star(cell);
    if star.x < 0.0 {
        discard;
    }
    let d = length(fract(p) - star.zw);
    let phase = hash21(cell + vec2<f32>(5.0, 5.0));
    let tw = sin(layer.time * (1.0 + phase * 3.0) + phase * 100.0) * 0.5 + 0.5;
    let b = (1.0 - smoothstep(0.0, star.y, d)) * star.x * tw * layer.intensity;
    if b < 0.01 {
        discard;
    }
    let color = mix(layer.color_a.rgb, layer.color_b.rgb, phase);
    return vec4<f32>(color * b, clamp(b, 0.0, 1.0));
}
"#;

const FOG_WGSL: &str = r#"
@fragment
fn fs_main(@builtin(position) frag: vec4<f32>) -> @location(0) vec4<f32> {
    let uv = sky_uv(frag.xy);
    let drift = vec2<f32>(layer.time * 0.02, 0.0);
    let n = fbm(uv * vec2<f32>(2.0, 6.0) + drift, 5);
    let low = 1.0 - smoothstep(0.0, 0.45, uv.y);
    let alpha = n * low * layer.intensity;
    let color = mix(layer.color_a.rgb, layer.color_b.rgb, n);
    return vec4<f32>(color, clamp(alpha, 0.0, 1.0));
}
"#;

fn fullscreen(body: &str, noise: bool, blend: BlendMode) -> MaterialDescriptor {
    let noise = if noise { NOISE_WGSL } else { "" };
    MaterialDescriptor {
        source: format!("{LAYER_HEADER_WGSL}{noise}{body}"),
        vertex_entry: "vs_fullscreen",
        fragment_entry: "fs_main",
        vertex_buffers: Vec::new(),
        blend,
    }
}

pub(crate) fn gradient_material() -> MaterialDescriptor {
    fullscreen(GRADIENT_WGSL, false, BlendMode::Alpha)
}

pub(crate) fn nebula_material() -> MaterialDescriptor {
    fullscreen(NEBULA_WGSL, true, BlendMode::Additive)
}

pub(crate) fn distant_stars_material() -> MaterialDescriptor {
    fullscreen(DISTANT_STARS_WGSL, true, BlendMode::Additive)
}

pub(crate) fn fog_material() -> MaterialDescriptor {
    fullscreen(FOG_WGSL, true, BlendMode::Alpha)
}

/// Pipeline and uniforms of one attached layer.
pub(crate) struct LayerGpu {
    pipeline: wgpu::RenderPipeline,
    uniforms: UniformSlot<SkyLayerUniforms>,
}

impl LayerGpu {
    pub(crate) fn new(
        device: &wgpu::Device,
        registry: &MaterialRegistry,
        material: MaterialId,
        format: wgpu::TextureFormat,
        initial: &SkyLayerUniforms,
    ) -> Result<Self, MaterialError> {
        let uniforms = UniformSlot::new(device, material.name(), initial);
        let pipeline = registry.create_pipeline(device, material, format, &[uniforms.layout()])?;
        Ok(Self { pipeline, uniforms })
    }

    pub(crate) fn write(&self, queue: &wgpu::Queue, uniforms: &SkyLayerUniforms) {
        self.uniforms.write(queue, uniforms);
    }

    pub(crate) fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, self.uniforms.bind_group(), &[]);
        pass.draw(0..3, 0..1);
    }
}
