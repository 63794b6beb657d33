//! Camera system for view and projection matrix generation.

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

/// A camera that generates view and projection matrices for rendering.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Position in world space.
    pub position: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    /// Projection parameters.
    pub projection: Projection,
    /// Near clip plane distance (always positive).
    pub near: f32,
    /// Far clip plane distance (always positive, > near).
    pub far: f32,
}

/// Projection type for the camera.
#[derive(Debug, Clone)]
pub enum Projection {
    /// Perspective projection for 3D scenes.
    Perspective {
        /// Vertical field of view in radians.
        fov_y: f32,
        /// Width / height.
        aspect_ratio: f32,
    },
    /// Orthographic projection, mostly useful for tests and 2D previews.
    Orthographic {
        /// Half-width of the view volume in world units.
        half_width: f32,
        /// Half-height of the view volume in world units.
        half_height: f32,
    },
}

/// A world-space ray used for picking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin.
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl Ray {
    /// Distance along the ray to the first intersection with a sphere, if any.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrt_d = discriminant.sqrt();
        let near = -b - sqrt_d;
        let far = -b + sqrt_d;
        if near >= 0.0 {
            Some(near)
        } else if far >= 0.0 {
            // Origin is inside the sphere.
            Some(0.0)
        } else {
            None
        }
    }
}

/// Snapshot of the camera for one frame: basis vectors and matrices.
///
/// Components read this instead of the live camera so a frame sees one
/// consistent view.
#[derive(Debug, Clone, Copy)]
pub struct CameraFrame {
    pub position: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
    pub view: Mat4,
    pub proj: Mat4,
    pub view_proj: Mat4,
}

impl CameraFrame {
    /// Project a world point to normalized device coordinates.
    ///
    /// Returns `None` for points behind the camera.
    pub fn project_ndc(&self, point: Vec3) -> Option<Vec2> {
        let clip = self.view_proj * point.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        Some(Vec2::new(clip.x / clip.w, clip.y / clip.w))
    }
}

impl Camera {
    /// Build a camera at `position` looking toward `target` with +Y up.
    ///
    /// Falls back to +Z as the up hint when looking straight up or down, and
    /// keeps the identity orientation when `target == position`.
    pub fn looking_at(position: Vec3, target: Vec3, projection: Projection) -> Self {
        Self {
            position,
            rotation: look_rotation(position, target),
            projection,
            ..Self::default()
        }
    }

    /// Compute the view matrix (inverse of camera transform).
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    /// Compute the projection matrix with reverse-Z.
    pub fn projection_matrix(&self) -> Mat4 {
        match &self.projection {
            Projection::Perspective {
                fov_y,
                aspect_ratio,
            } => {
                // Reverse-Z: near plane maps to z=1, far plane maps to z=0.
                Mat4::perspective_rh(*fov_y, *aspect_ratio, self.far, self.near)
            }
            Projection::Orthographic {
                half_width,
                half_height,
            } => Mat4::orthographic_rh(
                -*half_width,
                *half_width,
                -*half_height,
                *half_height,
                self.far,
                self.near,
            ),
        }
    }

    /// Compute the combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// The forward direction vector (-Z in camera space).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// The up direction vector (+Y in camera space).
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// The right direction vector (+X in camera space).
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Update the aspect ratio for perspective projection.
    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        if height <= 0.0 {
            return;
        }
        if let Projection::Perspective { aspect_ratio, .. } = &mut self.projection {
            *aspect_ratio = width / height;
        }
    }

    /// Capture basis vectors and matrices for the current frame.
    pub fn frame(&self) -> CameraFrame {
        let view = self.view_matrix();
        let proj = self.projection_matrix();
        CameraFrame {
            position: self.position,
            right: self.right(),
            up: self.up(),
            forward: self.forward(),
            view,
            proj,
            view_proj: proj * view,
        }
    }

    /// Ray from the camera through a pixel of a `width` x `height` viewport.
    pub fn screen_ray(&self, pixel: Vec2, width: f32, height: f32) -> Ray {
        let ndc_x = 2.0 * pixel.x / width.max(1.0) - 1.0;
        let ndc_y = 1.0 - 2.0 * pixel.y / height.max(1.0);
        let inv_view_proj = self.view_projection_matrix().inverse();

        // Reverse-Z: z=1 is the near plane, z=0 the far plane.
        let near = unproject(inv_view_proj, Vec4::new(ndc_x, ndc_y, 1.0, 1.0));
        let far = unproject(inv_view_proj, Vec4::new(ndc_x, ndc_y, 0.0, 1.0));

        let direction = (far - near).try_normalize().unwrap_or(self.forward());
        let origin = match self.projection {
            Projection::Perspective { .. } => self.position,
            Projection::Orthographic { .. } => near,
        };
        Ray { origin, direction }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            projection: Projection::Perspective {
                fov_y: std::f32::consts::FRAC_PI_3,
                aspect_ratio: 16.0 / 9.0,
            },
            near: 0.1,
            far: 5000.0,
        }
    }
}

fn unproject(inv_view_proj: Mat4, clip: Vec4) -> Vec3 {
    let world = inv_view_proj * clip;
    world.truncate() / world.w
}

fn look_rotation(position: Vec3, target: Vec3) -> Quat {
    let Some(forward) = (target - position).try_normalize() else {
        return Quat::IDENTITY;
    };
    let up_hint = if forward.dot(Vec3::Y).abs() > 0.999 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let view = Mat4::look_to_rh(position, forward, up_hint);
    Quat::from_mat4(&view.inverse()).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_identity_camera_looks_down_neg_z() {
        let forward = Camera::default().forward();
        assert!((forward - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn test_looking_at_points_forward_at_target() {
        let camera = Camera::looking_at(
            Vec3::new(0.0, 0.0, 80.0),
            Vec3::new(10.0, -5.0, 0.0),
            Camera::default().projection,
        );
        let expected = (Vec3::new(10.0, -5.0, 0.0) - camera.position).normalize();
        assert!((camera.forward() - expected).length() < 1e-4);
        assert!(camera.right().y.abs() < 1e-4, "horizon should stay level");
    }

    #[test]
    fn test_looking_straight_up_is_finite() {
        let camera = Camera::looking_at(Vec3::ZERO, Vec3::Y * 10.0, Camera::default().projection);
        assert!(camera.rotation.is_finite());
        assert!((camera.forward() - Vec3::Y).length() < 1e-4);
    }

    #[test]
    fn test_degenerate_target_keeps_identity() {
        let camera = Camera::looking_at(Vec3::ONE, Vec3::ONE, Camera::default().projection);
        assert_eq!(camera.rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_set_aspect_ratio_ignores_zero_height() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(1920.0, 0.0);
        if let Projection::Perspective { aspect_ratio, .. } = camera.projection {
            assert!((aspect_ratio - 16.0 / 9.0).abs() < 1e-6);
        }
        camera.set_aspect_ratio(1000.0, 500.0);
        if let Projection::Perspective { aspect_ratio, .. } = camera.projection {
            assert!((aspect_ratio - 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_view_matrix_inverse_is_camera_transform() {
        let camera = Camera {
            position: Vec3::new(10.0, 20.0, 30.0),
            rotation: Quat::from_rotation_y(FRAC_PI_2),
            ..Camera::default()
        };
        let reconstructed = camera.view_matrix().inverse().col(3).truncate();
        assert!((reconstructed - camera.position).length() < 1e-4);
    }

    #[test]
    fn test_frame_basis_is_orthonormal() {
        let camera = Camera {
            rotation: Quat::from_euler(glam::EulerRot::YXZ, 1.0, 0.5, 0.3),
            ..Camera::default()
        };
        let frame = camera.frame();
        for v in [frame.right, frame.up, frame.forward] {
            assert!((v.length() - 1.0).abs() < 1e-5);
        }
        assert!(frame.right.dot(frame.up).abs() < 1e-5);
        assert!(frame.right.dot(frame.forward).abs() < 1e-5);
        assert!(frame.up.dot(frame.forward).abs() < 1e-5);
    }

    #[test]
    fn test_project_ndc_center_and_behind() {
        let frame = Camera::default().frame();
        let center = frame.project_ndc(Vec3::new(0.0, 0.0, -10.0)).unwrap();
        assert!(center.length() < 1e-5);
        assert!(frame.project_ndc(Vec3::new(0.0, 0.0, 10.0)).is_none());
    }

    #[test]
    fn test_screen_ray_through_center_matches_forward() {
        let camera = Camera::default();
        let ray = camera.screen_ray(Vec2::new(640.0, 360.0), 1280.0, 720.0);
        assert!((ray.direction - camera.forward()).length() < 1e-3);
        assert!((ray.origin - camera.position).length() < 1e-6);
    }

    #[test]
    fn test_screen_ray_top_left_points_up_and_left() {
        let camera = Camera::default();
        let ray = camera.screen_ray(Vec2::ZERO, 1280.0, 720.0);
        assert!(ray.direction.x < 0.0);
        assert!(ray.direction.y > 0.0);
        assert!(ray.direction.z < 0.0);
    }

    #[test]
    fn test_ray_sphere_hit_and_miss() {
        let ray = Ray {
            origin: Vec3::ZERO,
            direction: Vec3::NEG_Z,
        };
        let hit = ray.intersect_sphere(Vec3::new(0.0, 0.0, -10.0), 2.0).unwrap();
        assert!((hit - 8.0).abs() < 1e-5);
        assert!(ray.intersect_sphere(Vec3::new(5.0, 0.0, -10.0), 2.0).is_none());
        assert!(ray.intersect_sphere(Vec3::new(0.0, 0.0, 10.0), 2.0).is_none());
        assert_eq!(ray.intersect_sphere(Vec3::ZERO, 1.0), Some(0.0));
    }
}
