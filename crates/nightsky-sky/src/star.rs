//! Persistent journal stars and the ordered catalog the scene reads them from.
//!
//! Stars are created outside the rendering core (one per journal entry) and
//! handed over as an append-only [`StarCatalog`]. The core never mutates or
//! removes a star.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A persistent star, one per journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Star {
    /// Stable unique identifier.
    pub id: u64,
    /// World position, fixed at creation.
    pub position: [f32; 3],
    /// Linear RGB in `[0, 1]`.
    pub color: [f32; 3],
    /// Visual size multiplier, positive.
    pub scale: f32,
    /// Twinkle desynchronization phase in `[0, 1)`.
    pub random_seed: f32,
}

impl Star {
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

/// Errors from loading or appending to a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Failed to read the catalog file.
    #[error("failed to read star catalog: {0}")]
    ReadError(#[source] std::io::Error),

    /// Failed to parse RON content.
    #[error("failed to parse star catalog: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    /// Failed to write the catalog file.
    #[error("failed to write star catalog: {0}")]
    WriteError(#[source] std::io::Error),

    /// Failed to serialize the catalog to RON.
    #[error("failed to serialize star catalog: {0}")]
    SerializeError(#[source] ron::Error),

    /// A star with this id is already present.
    #[error("star {0} is already in the catalog")]
    DuplicateId(u64),
}

/// Ordered, append-only collection of journal stars.
#[derive(Debug, Clone, Default)]
pub struct StarCatalog {
    stars: Vec<Star>,
    revision: u64,
}

impl StarCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from stars in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] on the first repeated id.
    pub fn from_stars(stars: impl IntoIterator<Item = Star>) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for star in stars {
            catalog.push(star)?;
        }
        Ok(catalog)
    }

    /// Parse a RON list of stars.
    pub fn from_ron_str(contents: &str) -> Result<Self, CatalogError> {
        let stars: Vec<Star> = ron::from_str(contents).map_err(CatalogError::ParseError)?;
        Self::from_stars(stars)
    }

    /// Load a RON list of stars from `path`.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path).map_err(CatalogError::ReadError)?;
        let catalog = Self::from_ron_str(&contents)?;
        log::info!("Loaded {} journal stars from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Write the catalog to `path` as a RON list, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(CatalogError::WriteError)?;
        }
        let pretty = ron::ser::PrettyConfig::new().depth_limit(2);
        let serialized =
            ron::ser::to_string_pretty(&self.stars, pretty).map_err(CatalogError::SerializeError)?;
        std::fs::write(path, serialized).map_err(CatalogError::WriteError)
    }

    /// Append a newly created star.
    pub fn push(&mut self, star: Star) -> Result<(), CatalogError> {
        if self.stars.iter().any(|s| s.id == star.id) {
            return Err(CatalogError::DuplicateId(star.id));
        }
        self.stars.push(star);
        self.revision += 1;
        Ok(())
    }

    /// Stars in creation order.
    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    /// The most recently created star.
    pub fn latest(&self) -> Option<&Star> {
        self.stars.last()
    }

    /// Next id that is not yet taken.
    ///
    /// One past the largest id, or the smallest free id once `u64::MAX` is
    /// in use.
    pub fn next_id(&self) -> u64 {
        let Some(max) = self.stars.iter().map(|s| s.id).max() else {
            return 0;
        };
        if let Some(next) = max.checked_add(1) {
            return next;
        }
        let mut ids: Vec<u64> = self.stars.iter().map(|s| s.id).collect();
        ids.sort_unstable();
        ids.iter()
            .zip(0u64..)
            .find(|&(&id, expected)| id != expected)
            .map_or(ids.len() as u64, |(_, free)| free)
    }

    /// Bumped on every append; renderers compare it to decide on re-upload.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star(id: u64) -> Star {
        Star {
            id,
            position: [id as f32, 0.0, -10.0],
            color: [0.8, 0.9, 1.0],
            scale: 3.0,
            random_seed: 0.25,
        }
    }

    #[test]
    fn test_latest_is_last_appended() {
        let mut catalog = StarCatalog::new();
        assert!(catalog.latest().is_none());
        catalog.push(star(7)).unwrap();
        catalog.push(star(3)).unwrap();
        assert_eq!(catalog.latest().map(|s| s.id), Some(3));
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut catalog = StarCatalog::new();
        catalog.push(star(1)).unwrap();
        let err = catalog.push(star(1)).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId(1)));
        assert_eq!(catalog.len(), 1, "rejected star must not be stored");
    }

    #[test]
    fn test_revision_bumps_on_append() {
        let mut catalog = StarCatalog::new();
        let before = catalog.revision();
        catalog.push(star(1)).unwrap();
        assert!(catalog.revision() > before);
        assert_eq!(catalog.next_id(), 2);
    }

    #[test]
    fn test_next_id_reuses_gap_after_max_id() {
        let catalog = StarCatalog::from_stars([star(0), star(u64::MAX), star(1)]).unwrap();
        assert_eq!(catalog.next_id(), 2);

        let mut catalog = StarCatalog::from_stars([star(u64::MAX)]).unwrap();
        let id = catalog.next_id();
        assert_eq!(id, 0);
        catalog.push(star(id)).unwrap();
    }

    #[test]
    fn test_parse_ron_list() {
        let ron = r#"[
            (id: 1, position: (1.0, 2.0, 3.0), color: (1.0, 0.5, 0.2), scale: 4.0, random_seed: 0.1),
            (id: 2, position: (0.0, 0.0, 0.0), color: (0.2, 0.5, 1.0), scale: 2.0, random_seed: 0.9),
        ]"#;
        let catalog = StarCatalog::from_ron_str(ron).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.stars()[0].position(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stars.ron");
        let stars = vec![star(1), star(2)];
        std::fs::write(&path, ron::to_string(&stars).unwrap()).unwrap();

        let catalog = StarCatalog::load(&path).unwrap();
        assert_eq!(catalog.stars(), stars.as_slice());
    }

    #[test]
    fn test_save_then_load_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("journal.ron");
        let catalog = StarCatalog::from_stars([star(5), star(2), star(9)]).unwrap();
        catalog.save(&path).unwrap();

        let loaded = StarCatalog::load(&path).unwrap();
        let ids: Vec<u64> = loaded.stars().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![5, 2, 9], "creation order must survive a save");
        assert_eq!(loaded.latest().map(|s| s.id), Some(9));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StarCatalog::load(&dir.path().join("absent.ron")).unwrap_err();
        assert!(matches!(err, CatalogError::ReadError(_)));
    }

    #[test]
    fn test_invalid_ron_is_parse_error() {
        let err = StarCatalog::from_ron_str("[(id: oops)]").unwrap_err();
        assert!(matches!(err, CatalogError::ParseError(_)));
    }
}
