//! The night sky scene core: journal stars, the procedural background field,
//! layered sky planes and the shooting star.
//!
//! Everything here keeps its CPU-side state separate from GPU resources, so
//! clocks, state machines and shading math run without a device.

pub mod glow;
pub mod layers;
pub mod materials;
pub mod picking;
pub mod shooting_star;
pub mod star;
pub mod starfield;

pub use glow::{BillboardGlowRenderer, GlowInstance, GlowStyle, Twinkle};
pub use layers::{LayerKind, LayeredSkyComposer, SkyLayer};
pub use materials::{
    BACKGROUND_STARS, JOURNAL_STARS, SHOOTING_STAR, SKY_DISTANT_STARS, SKY_FOG, SKY_GRADIENT,
    SKY_NEBULA, sky_materials,
};
pub use picking::{Selection, pick};
pub use shooting_star::{
    CameraCommand, Flight, Phase, ShootingStar, ShootingStarController, ShootingStarInput,
    ShootingStarOutput,
};
pub use star::{CatalogError, Star, StarCatalog};
pub use starfield::{StarField, StarFieldGenerator};
