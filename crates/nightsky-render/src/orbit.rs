//! Orbit camera rig: the camera host that scene components steer.
//!
//! The rig orbits a target point at a fixed distance. Components never move
//! the camera directly; they ask the rig to ease its target toward a point or
//! to focus on a point over the following frames.

use glam::{Vec2, Vec3};

use crate::camera::{Camera, Projection};
use crate::ease::per_frame_lerp;

/// Pitch limit that keeps the orbit away from the poles.
const MAX_PITCH: f32 = 1.45;

/// Focus is considered reached below this distance.
const FOCUS_ARRIVAL: f32 = 0.01;

/// Orbit camera state.
#[derive(Debug, Clone)]
pub struct OrbitRig {
    /// Point the camera orbits and looks at.
    pub target: Vec3,
    /// Rotation around +Y in radians. Zero places the camera on +Z.
    pub yaw: f32,
    /// Elevation in radians, clamped to avoid the poles.
    pub pitch: f32,
    /// Distance from the target.
    pub distance: f32,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Viewport width / height.
    pub aspect_ratio: f32,
    /// Per-frame (60 Hz) lerp factor toward a focus point.
    pub focus_easing: f32,
    focus: Option<Vec3>,
}

impl OrbitRig {
    /// Create a rig orbiting the origin.
    pub fn new(distance: f32, fov_y: f32, focus_easing: f32) -> Self {
        Self {
            target: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            distance: distance.max(0.1),
            fov_y,
            aspect_ratio: 16.0 / 9.0,
            focus_easing,
            focus: None,
        }
    }

    /// Current camera position derived from target, yaw, pitch and distance.
    pub fn eye(&self) -> Vec3 {
        let offset = Vec3::new(
            self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.cos() * self.pitch.cos(),
        );
        self.target + offset * self.distance
    }

    /// Move the orbit target a fraction of the way toward `point`.
    ///
    /// Cancels any pending focus so the two commands never fight.
    pub fn ease_look_at(&mut self, point: Vec3, factor: f32) {
        self.focus = None;
        self.target = self.target.lerp(point, factor.clamp(0.0, 1.0));
    }

    /// Ease toward `point` over the following frames.
    pub fn focus_on(&mut self, point: Vec3) {
        self.focus = Some(point);
    }

    /// Pending focus point, if a focus is still in progress.
    pub fn focus(&self) -> Option<Vec3> {
        self.focus
    }

    /// Rotate the orbit by a drag delta in radians.
    pub fn rotate(&mut self, delta: Vec2) {
        self.yaw -= delta.x;
        self.pitch = (self.pitch + delta.y).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Change the orbit distance, keeping it positive.
    pub fn zoom(&mut self, factor: f32) {
        self.distance = (self.distance * factor).clamp(1.0, 1000.0);
    }

    /// Update the aspect ratio after a viewport resize.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect_ratio = width as f32 / height as f32;
        }
    }

    /// Advance focus easing by `delta` seconds.
    pub fn update(&mut self, delta: f32) {
        let Some(goal) = self.focus else {
            return;
        };
        let t = per_frame_lerp(self.focus_easing, delta);
        self.target = self.target.lerp(goal, t);
        if self.target.distance(goal) < FOCUS_ARRIVAL {
            self.target = goal;
            self.focus = None;
        }
    }

    /// Build the camera for the current rig state.
    pub fn camera(&self) -> Camera {
        Camera::looking_at(
            self.eye(),
            self.target,
            Projection::Perspective {
                fov_y: self.fov_y,
                aspect_ratio: self.aspect_ratio,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> OrbitRig {
        OrbitRig::new(80.0, 1.0, 0.1)
    }

    #[test]
    fn test_default_eye_sits_on_positive_z() {
        let eye = rig().eye();
        assert!((eye - Vec3::new(0.0, 0.0, 80.0)).length() < 1e-4);
    }

    #[test]
    fn test_camera_looks_at_target() {
        let mut rig = rig();
        rig.target = Vec3::new(3.0, 2.0, -1.0);
        rig.rotate(Vec2::new(0.4, 0.2));
        let camera = rig.camera();
        let expected = (rig.target - camera.position).normalize();
        assert!((camera.forward() - expected).length() < 1e-4);
    }

    #[test]
    fn test_ease_look_at_moves_partially() {
        let mut rig = rig();
        rig.ease_look_at(Vec3::new(10.0, 0.0, 0.0), 0.25);
        assert!((rig.target.x - 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_focus_converges_and_clears() {
        let mut rig = rig();
        let goal = Vec3::new(20.0, -4.0, 6.0);
        rig.focus_on(goal);
        for _ in 0..600 {
            rig.update(1.0 / 60.0);
        }
        assert_eq!(rig.target, goal);
        assert!(rig.focus().is_none());
    }

    #[test]
    fn test_look_at_cancels_focus() {
        let mut rig = rig();
        rig.focus_on(Vec3::X * 50.0);
        rig.ease_look_at(Vec3::Y, 0.5);
        assert!(rig.focus().is_none());
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut rig = rig();
        rig.rotate(Vec2::new(0.0, 10.0));
        assert!(rig.pitch <= MAX_PITCH);
        assert!(rig.camera().rotation.is_finite());
    }

    #[test]
    fn test_zoom_stays_positive() {
        let mut rig = rig();
        rig.zoom(0.0);
        assert!(rig.distance >= 1.0);
    }
}
