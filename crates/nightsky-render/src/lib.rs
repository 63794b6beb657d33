//! wgpu plumbing for the night sky: device and surface management, camera and
//! orbit rig, per-frame encoding, and the material registry.

pub mod camera;
pub mod ease;
pub mod frame;
pub mod gpu;
pub mod material;
pub mod orbit;
pub mod quad;

pub use camera::{Camera, CameraFrame, Projection, Ray};
pub use ease::{EPSILON, per_frame_lerp};
pub use frame::{FrameEncoder, NIGHT_CLEAR};
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use material::{
    BlendMode, MaterialConstructor, MaterialDescriptor, MaterialError, MaterialId,
    MaterialRegistry, MaterialRegistryBuilder,
};
pub use orbit::OrbitRig;
pub use quad::{QuadMesh, QuadVertex, UniformSlot};
