//! Material registry: maps a [`MaterialId`] to the constructor of its shader
//! description.
//!
//! The registry is assembled once at startup through
//! [`MaterialRegistryBuilder`] and is immutable afterwards. Renderers ask it to
//! compile a pipeline for their material instead of registering shaders into
//! any global table.

use std::collections::HashMap;

use thiserror::Error;

/// Identifier of a registered material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub &'static str);

impl MaterialId {
    /// The identifier as a string, also used as the GPU debug label.
    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for MaterialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Errors returned by the registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MaterialError {
    /// The same id was registered twice.
    #[error("material '{0}' registered twice")]
    Duplicate(MaterialId),

    /// The id was never registered.
    #[error("unknown material '{0}'")]
    Unknown(MaterialId),
}

/// How a material's fragments combine with what is already drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendMode {
    /// `src * alpha + dst`: glows accumulate.
    Additive,
    /// Standard premultiplied-free alpha blending.
    Alpha,
}

impl BlendMode {
    /// The wgpu blend state for this mode.
    pub fn state(self) -> wgpu::BlendState {
        match self {
            BlendMode::Additive => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent::OVER,
            },
            BlendMode::Alpha => wgpu::BlendState::ALPHA_BLENDING,
        }
    }
}

/// Everything needed to compile a material into a render pipeline.
#[derive(Clone, Debug)]
pub struct MaterialDescriptor {
    /// Full WGSL source.
    pub source: String,
    /// Vertex entry point.
    pub vertex_entry: &'static str,
    /// Fragment entry point.
    pub fragment_entry: &'static str,
    /// Vertex buffer layouts, empty for full-screen triangles.
    pub vertex_buffers: Vec<wgpu::VertexBufferLayout<'static>>,
    /// Blend mode of the color target.
    pub blend: BlendMode,
}

/// Constructor stored in the registry.
pub type MaterialConstructor = fn() -> MaterialDescriptor;

/// Collects material constructors before the registry is frozen.
#[derive(Default)]
pub struct MaterialRegistryBuilder {
    constructors: HashMap<MaterialId, MaterialConstructor>,
}

impl MaterialRegistryBuilder {
    /// Start an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `constructor` under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`MaterialError::Duplicate`] if `id` is already registered.
    pub fn register(
        mut self,
        id: MaterialId,
        constructor: MaterialConstructor,
    ) -> Result<Self, MaterialError> {
        if self.constructors.insert(id, constructor).is_some() {
            return Err(MaterialError::Duplicate(id));
        }
        Ok(self)
    }

    /// Freeze the registry.
    pub fn build(self) -> MaterialRegistry {
        log::debug!("Material registry built with {} materials", self.constructors.len());
        MaterialRegistry {
            constructors: self.constructors,
        }
    }
}

/// Immutable mapping from material id to constructor.
pub struct MaterialRegistry {
    constructors: HashMap<MaterialId, MaterialConstructor>,
}

impl MaterialRegistry {
    /// Start building a registry.
    pub fn builder() -> MaterialRegistryBuilder {
        MaterialRegistryBuilder::new()
    }

    /// Number of registered materials.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: MaterialId) -> bool {
        self.constructors.contains_key(&id)
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> Vec<MaterialId> {
        let mut ids: Vec<_> = self.constructors.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Run the constructor for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`MaterialError::Unknown`] if `id` was never registered.
    pub fn descriptor(&self, id: MaterialId) -> Result<MaterialDescriptor, MaterialError> {
        self.constructors
            .get(&id)
            .map(|constructor| constructor())
            .ok_or(MaterialError::Unknown(id))
    }

    /// Compile the material into a pipeline targeting `format`.
    ///
    /// Pipelines never test or write depth: sky layers are translucent and
    /// ordered purely by draw order.
    ///
    /// # Errors
    ///
    /// Returns [`MaterialError::Unknown`] if `id` was never registered.
    pub fn create_pipeline(
        &self,
        device: &wgpu::Device,
        id: MaterialId,
        format: wgpu::TextureFormat,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
    ) -> Result<wgpu::RenderPipeline, MaterialError> {
        let descriptor = self.descriptor(id)?;
        let label = id.name();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(descriptor.source.into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts,
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(descriptor.vertex_entry),
                buffers: &descriptor.vertex_buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(descriptor.fragment_entry),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(descriptor.blend.state()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        log::info!("Compiled material '{label}'");
        Ok(pipeline)
    }
}
