//! Click hit-testing against journal stars and the idle shooting star.

use nightsky_render::Ray;

use crate::shooting_star::{HEAD_SIZE, ShootingStar};
use crate::star::{Star, StarCatalog};

/// Hit radius per unit of star scale.
pub const STAR_PICK_RADIUS: f32 = 0.8;

/// What a click landed on.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// A journal star, with its full record.
    JournalStar(Star),
    ShootingStar,
}

/// Nearest selectable object along `ray`.
///
/// The shooting star is only hittable while idle.
pub fn pick(
    ray: &Ray,
    catalog: &StarCatalog,
    shooting_star: Option<&ShootingStar>,
) -> Option<Selection> {
    let mut best: Option<(f32, Selection)> = None;
    let mut consider = |distance: f32, selection: Selection| {
        if best.as_ref().is_none_or(|(d, _)| distance < *d) {
            best = Some((distance, selection));
        }
    };

    for star in catalog.stars() {
        if let Some(distance) = ray.intersect_sphere(star.position(), star.scale * STAR_PICK_RADIUS) {
            consider(distance, Selection::JournalStar(star.clone()));
        }
    }

    if let Some(shooting) = shooting_star.filter(|s| s.is_selectable()) {
        if let Some(distance) = ray.intersect_sphere(shooting.position, HEAD_SIZE) {
            consider(distance, Selection::ShootingStar);
        }
    }

    best.map(|(_, selection)| selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shooting_star::{Flight, Phase};
    use glam::Vec3;

    fn ray() -> Ray {
        Ray {
            origin: Vec3::ZERO,
            direction: Vec3::NEG_Z,
        }
    }

    fn star(id: u64, z: f32) -> Star {
        Star {
            id,
            position: [0.0, 0.0, z],
            color: [1.0; 3],
            scale: 2.0,
            random_seed: 0.5,
        }
    }

    fn shooting(phase: Phase, z: f32) -> ShootingStar {
        let flight = Flight {
            start: Vec3::new(0.0, 0.0, z),
            target: Vec3::new(0.0, 0.0, z),
            exit_speed: 30.0,
            look_easing: 0.05,
        };
        ShootingStar {
            phase,
            ..ShootingStar::spawn(flight)
        }
    }

    #[test]
    fn test_nearest_journal_star_wins() {
        let catalog = StarCatalog::from_stars([star(1, -50.0), star(2, -20.0)]).unwrap();
        assert_eq!(pick(&ray(), &catalog, None), Some(Selection::JournalStar(star(2, -20.0))));
    }

    #[test]
    fn test_miss_returns_none() {
        let catalog = StarCatalog::from_stars([Star {
            position: [30.0, 0.0, -20.0],
            ..star(1, 0.0)
        }])
        .unwrap();
        assert_eq!(pick(&ray(), &catalog, None), None);
    }

    #[test]
    fn test_idle_shooting_star_is_hittable() {
        let catalog = StarCatalog::from_stars([star(1, -50.0)]).unwrap();
        let idle = shooting(Phase::Idle, -10.0);
        assert_eq!(pick(&ray(), &catalog, Some(&idle)), Some(Selection::ShootingStar));
    }

    #[test]
    fn test_shooting_star_ignored_outside_idle() {
        let catalog = StarCatalog::new();
        for phase in [Phase::Entering, Phase::Exiting, Phase::Gone] {
            let s = shooting(phase, -10.0);
            assert_eq!(pick(&ray(), &catalog, Some(&s)), None, "{phase:?}");
        }
    }

    #[test]
    fn test_larger_scale_widens_hit_volume() {
        let off_axis = |scale: f32| Star {
            position: [2.5, 0.0, -20.0],
            scale,
            ..star(1, 0.0)
        };
        let small = StarCatalog::from_stars([off_axis(2.0)]).unwrap();
        let large = StarCatalog::from_stars([off_axis(4.0)]).unwrap();
        assert!(pick(&ray(), &small, None).is_none());
        assert!(pick(&ray(), &large, None).is_some());
    }
}
