//! Trail derivation: a smoothed screen-space direction and length computed
//! from the head's observed motion.

use glam::{Vec2, Vec3};
use nightsky_render::{CameraFrame, EPSILON};

/// Per-frame lerp factor of the trail direction.
pub const DIRECTION_SMOOTHING: f32 = 0.15;
/// Per-frame lerp factor of the trail length.
pub const LENGTH_SMOOTHING: f32 = 0.12;
/// Trail length per world unit per second of speed.
pub const SPEED_TO_LENGTH: f32 = 0.02;
/// Length the trail shrinks to while the head is at rest.
pub const REST_LENGTH: f32 = 0.03;
/// Relaxation rate toward [`REST_LENGTH`], per second.
pub const REST_RELAX_RATE: f32 = 3.0;

/// Smoothed trail state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trail {
    /// Unit vector in camera right/up space, pointing from head to tail.
    pub direction: Vec2,
    /// In `[0, 1]`.
    pub length: f32,
    previous_position: Option<Vec3>,
}

impl Default for Trail {
    fn default() -> Self {
        Self::new(Vec2::NEG_Y)
    }
}

impl Trail {
    /// A collapsed trail pointing along `direction`.
    pub fn new(direction: Vec2) -> Self {
        Self {
            direction: direction.try_normalize().unwrap_or(Vec2::NEG_Y),
            length: REST_LENGTH,
            previous_position: None,
        }
    }

    /// Position observed on the previous update.
    pub fn previous_position(&self) -> Option<Vec3> {
        self.previous_position
    }

    /// Fold in the head position observed this frame.
    ///
    /// The first call only records the position.
    pub fn observe(self, position: Vec3, delta: f32, camera: &CameraFrame) -> Trail {
        let mut next = Trail {
            previous_position: Some(position),
            ..self
        };
        let Some(previous) = self.previous_position else {
            return next;
        };

        let displacement = position - previous;
        let distance = displacement.length();
        if distance > EPSILON && delta > 0.0 {
            let screen = Vec2::new(displacement.dot(camera.right), displacement.dot(camera.up));
            if let Some(target) = (-screen).try_normalize() {
                next.direction = smooth_direction(self.direction, target);
            }
            let target_length = (distance / delta * SPEED_TO_LENGTH).min(1.0);
            next.length += (target_length - self.length) * LENGTH_SMOOTHING;
        } else {
            let rate = (REST_RELAX_RATE * delta.max(0.0)).min(LENGTH_SMOOTHING);
            next.length += (REST_LENGTH - self.length) * rate;
        }
        next
    }
}

/// Lerp toward `target` and renormalize. An exactly opposite target stays on
/// the current line, so the direction holds until travel bends off-axis.
fn smooth_direction(current: Vec2, target: Vec2) -> Vec2 {
    current
        .lerp(target, DIRECTION_SMOOTHING)
        .try_normalize()
        .unwrap_or(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nightsky_render::Camera;

    const DT: f32 = 1.0 / 60.0;

    fn frame() -> CameraFrame {
        Camera::default().frame()
    }

    fn angle(a: Vec2, b: Vec2) -> f32 {
        a.dot(b).clamp(-1.0, 1.0).acos()
    }

    #[test]
    fn test_first_observation_only_records() {
        let trail = Trail::default().observe(Vec3::ONE, DT, &frame());
        assert_eq!(trail.previous_position(), Some(Vec3::ONE));
        assert_eq!(trail.direction, Vec2::NEG_Y);
        assert_eq!(trail.length, REST_LENGTH);
    }

    #[test]
    fn test_constant_velocity_converges_opposite_travel() {
        let camera = frame();
        let goal = Vec2::new(-1.0, 0.0);
        let mut trail = Trail::new(Vec2::Y);
        let mut last_angle = angle(trail.direction, goal);
        for i in 0..10 {
            let position = Vec3::new(10.0 * DT * i as f32, 0.0, -30.0);
            trail = trail.observe(position, DT, &camera);
            if i > 0 {
                let current = angle(trail.direction, goal);
                assert!(current < last_angle, "frame {i} moved away from (-1, 0)");
                last_angle = current;
            }
        }
        assert!(
            trail.direction.dot(goal) > 0.9,
            "direction {:?} should approach (-1, 0)",
            trail.direction
        );

        for i in 10..200 {
            let position = Vec3::new(10.0 * DT * i as f32, 0.0, -30.0);
            trail = trail.observe(position, DT, &camera);
        }
        assert!(trail.direction.dot(goal) > 0.9999);
        let expected_length = 10.0 * SPEED_TO_LENGTH;
        assert!((trail.length - expected_length).abs() < 1e-3);
    }

    #[test]
    fn test_direction_uses_camera_basis() {
        let camera = Camera::looking_at(Vec3::ZERO, Vec3::X, Camera::default().projection).frame();
        let mut trail = Trail::new(Vec2::new(-1.0, 0.0));
        let right = camera.right;
        for i in 0..120 {
            trail = trail.observe(right * i as f32 * 0.1, DT, &camera);
        }
        assert!(trail.direction.dot(Vec2::new(-1.0, 0.0)) > 0.999);
    }

    #[test]
    fn test_per_frame_changes_stay_bounded() {
        let camera = frame();
        let max_turn = (DIRECTION_SMOOTHING / (1.0 - DIRECTION_SMOOTHING)).asin() + 1e-4;
        let mut trail = Trail::new(Vec2::X);
        for i in 0..400 {
            let t = i as f32 * DT;
            // Zig-zag path with a pause in the middle.
            let position = if (100..160).contains(&i) {
                Vec3::new(5.0, 5.0, -30.0)
            } else {
                Vec3::new((t * 3.0).sin() * 40.0, (t * 7.0).cos() * 25.0, -30.0)
            };
            let next = trail.observe(position, DT, &camera);
            assert!(
                angle(trail.direction, next.direction) <= max_turn,
                "direction jumped at frame {i}"
            );
            assert!(
                (next.length - trail.length).abs() <= LENGTH_SMOOTHING + 1e-6,
                "length jumped at frame {i}"
            );
            assert!((next.direction.length() - 1.0).abs() < 1e-4);
            assert!((0.0..=1.0).contains(&next.length));
            trail = next;
        }
    }

    #[test]
    fn test_exact_reversal_holds_direction() {
        let camera = frame();
        let start = Vec2::new(-1.0, 0.0);
        let mut trail = Trail::new(start).observe(Vec3::ZERO, DT, &camera);
        let mut position = Vec3::ZERO;
        // Travel along -X puts the target exactly opposite the current direction.
        for _ in 0..120 {
            position.x -= 1.0;
            trail = trail.observe(position, DT, &camera);
            assert!((trail.direction - start).length() < 1e-6, "{:?}", trail.direction);
        }
    }

    #[test]
    fn test_near_reversal_turns_around() {
        let camera = frame();
        let mut trail = Trail::new(Vec2::new(-1.0, 0.0)).observe(Vec3::ZERO, DT, &camera);
        let travel = Vec3::new(-1.0, -0.02, 0.0);
        let mut position = Vec3::ZERO;
        for _ in 0..600 {
            position += travel;
            trail = trail.observe(position, DT, &camera);
            assert!((trail.direction.length() - 1.0).abs() < 1e-5);
        }
        let target = Vec2::new(1.0, 0.02).normalize();
        assert!(trail.direction.dot(target) > 0.99, "{:?}", trail.direction);
    }

    #[test]
    fn test_rest_relaxes_toward_rest_length() {
        let camera = frame();
        let mut trail = Trail {
            length: 0.8,
            ..Trail::default()
        };
        trail = trail.observe(Vec3::ZERO, DT, &camera);
        let mut previous = trail.length;
        for _ in 0..600 {
            trail = trail.observe(Vec3::ZERO, DT, &camera);
            assert!(trail.length <= previous, "length must shrink while resting");
            assert!(trail.length >= REST_LENGTH - 1e-6);
            previous = trail.length;
        }
        assert!((trail.length - REST_LENGTH).abs() < 1e-3);
        assert_eq!(trail.direction, Vec2::NEG_Y, "direction holds while resting");
    }

    #[test]
    fn test_zero_delta_is_harmless() {
        let camera = frame();
        let trail = Trail::default().observe(Vec3::ZERO, DT, &camera);
        let next = trail.observe(Vec3::X, 0.0, &camera);
        assert!(next.length.is_finite());
        assert_eq!(next.direction, trail.direction);
    }
}
