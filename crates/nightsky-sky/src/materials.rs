//! Material ids of the sky scene and the registry that maps them to shaders.

use nightsky_render::{MaterialError, MaterialId, MaterialRegistry};

use crate::glow::star_glow_material;
use crate::layers::{distant_stars_material, fog_material, gradient_material, nebula_material};
use crate::shooting_star::shooting_star_material;

pub const JOURNAL_STARS: MaterialId = MaterialId("journal-stars");
pub const BACKGROUND_STARS: MaterialId = MaterialId("background-stars");
pub const SHOOTING_STAR: MaterialId = MaterialId("shooting-star");
pub const SKY_GRADIENT: MaterialId = MaterialId("sky-gradient");
pub const SKY_NEBULA: MaterialId = MaterialId("sky-nebula");
pub const SKY_DISTANT_STARS: MaterialId = MaterialId("sky-distant-stars");
pub const SKY_FOG: MaterialId = MaterialId("sky-fog");

/// Registry holding every material the scene draws with.
pub fn sky_materials() -> Result<MaterialRegistry, MaterialError> {
    Ok(MaterialRegistry::builder()
        .register(JOURNAL_STARS, star_glow_material)?
        .register(BACKGROUND_STARS, star_glow_material)?
        .register(SHOOTING_STAR, shooting_star_material)?
        .register(SKY_GRADIENT, gradient_material)?
        .register(SKY_NEBULA, nebula_material)?
        .register(SKY_DISTANT_STARS, distant_stars_material)?
        .register(SKY_FOG, fog_material)?
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::LayerKind;

    #[test]
    fn test_registry_holds_every_material() {
        let registry = sky_materials().unwrap();
        assert_eq!(registry.len(), 7);
        for kind in LayerKind::ALL {
            assert!(registry.contains(kind.material()), "{:?} not registered", kind);
        }
        assert!(registry.contains(JOURNAL_STARS));
        assert!(registry.contains(BACKGROUND_STARS));
        assert!(registry.contains(SHOOTING_STAR));
    }

    #[test]
    fn test_every_descriptor_names_its_entry_points() {
        let registry = sky_materials().unwrap();
        for id in registry.ids() {
            let descriptor = registry.descriptor(id).unwrap();
            assert!(
                descriptor.source.contains(&format!("fn {}", descriptor.vertex_entry)),
                "{id} is missing its vertex entry"
            );
            assert!(
                descriptor.source.contains(&format!("fn {}", descriptor.fragment_entry)),
                "{id} is missing its fragment entry"
            );
        }
    }
}
