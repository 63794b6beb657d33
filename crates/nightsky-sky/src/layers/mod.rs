//! Layered sky background: depth-ordered translucent full-screen planes.
//!
//! Layers never test or write depth. Order comes only from their depth value:
//! the composer keeps them sorted farthest first and draws them in that order.
//! Layers nearer than [`FOREGROUND_DEPTH`] are drawn after the stars.

pub mod noise;
mod renderer;

use glam::{Vec2, Vec3};
use nightsky_render::{CameraFrame, MaterialError, MaterialId, MaterialRegistry};

pub use renderer::SkyLayerUniforms;
pub(crate) use renderer::{
    distant_stars_material, fog_material, gradient_material, nebula_material,
};
use renderer::LayerGpu;

use crate::materials::{SKY_DISTANT_STARS, SKY_FOG, SKY_GRADIENT, SKY_NEBULA};

/// Layers with a smaller depth are drawn in front of the stars.
pub const FOREGROUND_DEPTH: f32 = 100.0;

/// Depth at which a layer shifts one sky unit per radian of view rotation.
pub const PARALLAX_DEPTH: f32 = 50.0;

/// Sky-space shift of a layer at `depth` for a camera looking along `forward`.
///
/// Yaw is measured from -Z and pitch from the horizon; the shift scales with
/// `PARALLAX_DEPTH / depth` so nearer layers slide further.
pub fn parallax_offset(forward: Vec3, depth: f32) -> Vec2 {
    let Some(forward) = forward.try_normalize() else {
        return Vec2::ZERO;
    };
    let yaw = forward.x.atan2(-forward.z);
    let pitch = forward.y.clamp(-1.0, 1.0).asin();
    Vec2::new(yaw, pitch) * (PARALLAX_DEPTH / depth.max(1.0))
}

/// The kinds of sky layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Gradient,
    Nebula,
    DistantStars,
    Fog,
}

impl LayerKind {
    pub const ALL: [LayerKind; 4] = [
        LayerKind::Gradient,
        LayerKind::Nebula,
        LayerKind::DistantStars,
        LayerKind::Fog,
    ];

    /// Placement depth; larger is farther.
    pub fn depth(self) -> f32 {
        match self {
            LayerKind::Gradient => 1000.0,
            LayerKind::Nebula => 900.0,
            LayerKind::DistantStars => 800.0,
            LayerKind::Fog => 50.0,
        }
    }

    pub fn material(self) -> MaterialId {
        match self {
            LayerKind::Gradient => SKY_GRADIENT,
            LayerKind::Nebula => SKY_NEBULA,
            LayerKind::DistantStars => SKY_DISTANT_STARS,
            LayerKind::Fog => SKY_FOG,
        }
    }

    fn palette(self) -> [[f32; 4]; 3] {
        match self {
            // zenith, mid sky, horizon
            LayerKind::Gradient => [
                [0.005, 0.008, 0.03, 1.0],
                [0.02, 0.03, 0.09, 1.0],
                [0.06, 0.05, 0.14, 1.0],
            ],
            LayerKind::Nebula => [
                [0.10, 0.04, 0.22, 1.0],
                [0.05, 0.14, 0.30, 1.0],
                [0.30, 0.08, 0.25, 1.0],
            ],
            LayerKind::DistantStars => [
                [0.85, 0.90, 1.00, 1.0],
                [1.00, 0.92, 0.80, 1.0],
                [0.0; 4],
            ],
            LayerKind::Fog => [
                [0.08, 0.08, 0.16, 1.0],
                [0.14, 0.12, 0.22, 1.0],
                [0.0; 4],
            ],
        }
    }

    fn intensity(self) -> f32 {
        match self {
            LayerKind::Gradient => 1.0,
            LayerKind::Nebula => 0.35,
            LayerKind::DistantStars => 0.8,
            LayerKind::Fog => 0.25,
        }
    }
}

/// One animated sky plane.
pub struct SkyLayer {
    kind: LayerKind,
    depth: f32,
    material: MaterialId,
    time: f32,
    colors: [[f32; 4]; 3],
    intensity: f32,
    resolution: [f32; 2],
    offset: Vec2,
    gpu: Option<LayerGpu>,
}

impl SkyLayer {
    pub fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            depth: kind.depth(),
            material: kind.material(),
            time: 0.0,
            colors: kind.palette(),
            intensity: kind.intensity(),
            resolution: [1.0, 1.0],
            offset: Vec2::ZERO,
            gpu: None,
        }
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn resolution(&self) -> [f32; 2] {
        self.resolution
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn advance(&mut self, delta: f32) {
        self.time += delta.max(0.0);
    }

    pub fn uniforms(&self) -> SkyLayerUniforms {
        SkyLayerUniforms {
            color_a: self.colors[0],
            color_b: self.colors[1],
            color_c: self.colors[2],
            resolution: self.resolution,
            time: self.time,
            intensity: self.intensity,
            offset: self.offset.to_array(),
            _padding: [0.0; 2],
        }
    }
}

/// Owns the sky layers and keeps them sorted back-to-front.
#[derive(Default)]
pub struct LayeredSkyComposer {
    layers: Vec<SkyLayer>,
}

impl LayeredSkyComposer {
    /// Build a composer holding one layer per distinct kind.
    pub fn new(kinds: impl IntoIterator<Item = LayerKind>) -> Self {
        let mut layers: Vec<SkyLayer> = Vec::new();
        for kind in kinds {
            if layers.iter().all(|layer| layer.kind != kind) {
                layers.push(SkyLayer::new(kind));
            }
        }
        layers.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        Self { layers }
    }

    /// Layers in draw order, farthest first.
    pub fn layers(&self) -> &[SkyLayer] {
        &self.layers
    }

    /// Create pipelines for every layer.
    pub fn attach(
        &mut self,
        device: &wgpu::Device,
        registry: &MaterialRegistry,
        format: wgpu::TextureFormat,
    ) -> Result<(), MaterialError> {
        for layer in &mut self.layers {
            let gpu = LayerGpu::new(device, registry, layer.material, format, &layer.uniforms())?;
            layer.gpu = Some(gpu);
        }
        log::info!("Sky composer initialized with {} layers", self.layers.len());
        Ok(())
    }

    /// Advance every layer clock by `delta` seconds.
    pub fn advance(&mut self, delta: f32) {
        for layer in &mut self.layers {
            layer.advance(delta);
        }
    }

    /// Forward a new canvas size in physical pixels.
    pub fn resize(&mut self, width: u32, height: u32) {
        let resolution = [width.max(1) as f32, height.max(1) as f32];
        for layer in &mut self.layers {
            layer.resolution = resolution;
        }
    }

    /// Follow the camera orientation.
    pub fn set_view(&mut self, camera: &CameraFrame) {
        for layer in &mut self.layers {
            layer.offset = parallax_offset(camera.forward, layer.depth);
        }
    }

    /// Write this frame's uniforms. Layers without GPU state are skipped.
    pub fn prepare(&self, queue: &wgpu::Queue) {
        for layer in &self.layers {
            match &layer.gpu {
                Some(gpu) => gpu.write(queue, &layer.uniforms()),
                None => log::trace!("Sky layer {:?} not attached, skipping", layer.kind),
            }
        }
    }

    /// Draw the layers behind the stars.
    pub fn render_backdrop(&self, pass: &mut wgpu::RenderPass<'_>) {
        self.draw_where(pass, |depth| depth >= FOREGROUND_DEPTH);
    }

    /// Draw the layers in front of the stars.
    pub fn render_foreground(&self, pass: &mut wgpu::RenderPass<'_>) {
        self.draw_where(pass, |depth| depth < FOREGROUND_DEPTH);
    }

    fn draw_where(&self, pass: &mut wgpu::RenderPass<'_>, keep: impl Fn(f32) -> bool) {
        for layer in self.layers.iter().filter(|layer| keep(layer.depth)) {
            if let Some(gpu) = &layer.gpu {
                gpu.draw(pass);
            }
        }
    }
}
