//! Per-frame command encoding.
//!
//! The sky is drawn in a single color pass with no depth attachment: every
//! layer is translucent and ordered back-to-front by the caller.

use std::sync::Arc;

/// Near-black blue used under the sky gradient.
pub const NIGHT_CLEAR: wgpu::Color = wgpu::Color {
    r: 0.004,
    g: 0.006,
    b: 0.02,
    a: 1.0,
};

/// Manages per-frame command encoding lifecycle with automatic submission.
pub struct FrameEncoder {
    encoder: Option<wgpu::CommandEncoder>,
    queue: Arc<wgpu::Queue>,
    surface_texture: Option<wgpu::SurfaceTexture>,
    surface_view: wgpu::TextureView,
    submitted: bool,
}

impl FrameEncoder {
    /// Create a new frame encoder for the given device, queue, and surface texture.
    pub fn new(
        device: &wgpu::Device,
        queue: Arc<wgpu::Queue>,
        surface_texture: wgpu::SurfaceTexture,
    ) -> Self {
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("nightsky-frame-encoder"),
        });

        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            encoder: Some(encoder),
            queue,
            surface_texture: Some(surface_texture),
            surface_view,
            submitted: false,
        }
    }

    /// Begin the sky pass, clearing to `clear`.
    ///
    /// Returns `None` once the frame has been submitted.
    pub fn begin_sky_pass(&mut self, clear: wgpu::Color) -> Option<wgpu::RenderPass<'_>> {
        let encoder = self.encoder.as_mut()?;
        let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("nightsky-sky-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.surface_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        Some(pass)
    }

    /// Submit the command buffer and present the surface texture.
    /// Consumes self to prevent double-submission.
    pub fn submit(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if self.submitted {
            return;
        }
        if let (Some(encoder), Some(surface_texture)) =
            (self.encoder.take(), self.surface_texture.take())
        {
            self.queue.submit([encoder.finish()]);
            surface_texture.present();
            self.submitted = true;
        }
    }
}

impl Drop for FrameEncoder {
    fn drop(&mut self) {
        if !self.submitted {
            log::warn!("FrameEncoder dropped without explicit submit() - auto-submitting");
            self.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_night_clear_is_dark_and_blue() {
        assert!(NIGHT_CLEAR.b > NIGHT_CLEAR.r);
        assert!(NIGHT_CLEAR.b < 0.05);
        assert_eq!(NIGHT_CLEAR.a, 1.0);
    }
}
