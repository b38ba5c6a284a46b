//! A camera owning a [`Transform`] plus projection parameters.
//!
//! Unlike [`Transform`], the camera's matrices are recomputed *explicitly*:
//! [`Camera::update_view_matrix`] after moving the transform, and
//! [`Camera::update_projection_matrix`] when the surface aspect ratio
//! changes. There is no automatic dirty propagation from the transform to the
//! cached view matrix; the caller drives both updates.

use glam::{Mat4, Vec3};

use crate::transform::Transform;

/// A perspective camera with explicitly refreshed view/projection caches.
#[derive(Clone, Debug)]
pub struct Camera {
    transform: Transform,
    view: Mat4,
    projection: Mat4,

    fov_y: f32,
    near_clip: f32,
    far_clip: f32,
}

impl Camera {
    /// Creates a camera at `position` with the given vertical field of view
    /// (radians) and clip planes, and computes both matrices once.
    pub fn new(
        aspect_ratio: f32,
        position: Vec3,
        fov_y: f32,
        near_clip: f32,
        far_clip: f32,
    ) -> Self {
        let mut transform = Transform::new();
        transform.set_position(position);

        let mut camera = Self {
            transform,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            fov_y,
            near_clip,
            far_clip,
        };
        camera.update_projection_matrix(aspect_ratio);
        camera.update_view_matrix();
        camera
    }

    /// A camera matching the stock demo scene: at (0, 0, -10), 45 degree
    /// vertical field of view, near 0.01, far 1000.
    pub fn demo(aspect_ratio: f32) -> Self {
        Self::new(
            aspect_ratio,
            Vec3::new(0.0, 0.0, -10.0),
            45f32.to_radians(),
            0.01,
            1000.0,
        )
    }

    /// View matrix as of the last [`update_view_matrix`](Self::update_view_matrix) call.
    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    /// Projection matrix as of the last
    /// [`update_projection_matrix`](Self::update_projection_matrix) call.
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// Vertical field of view in radians.
    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Mutable access to the owned transform.
    ///
    /// The view matrix does not follow the transform automatically; call
    /// [`update_view_matrix`](Self::update_view_matrix) after mutating it.
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Recomputes the cached projection matrix for a new aspect ratio.
    pub fn update_projection_matrix(&mut self, aspect_ratio: f32) {
        self.projection =
            Mat4::perspective_rh(self.fov_y, aspect_ratio, self.near_clip, self.far_clip);
    }

    /// Recomputes the cached view matrix from the transform's current
    /// position and facing direction (world up stays +Y).
    pub fn update_view_matrix(&mut self) {
        let position = self.transform.position();
        let forward = self.transform.forward();
        self.view = Mat4::look_to_rh(position, forward, Vec3::Y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_is_explicit_not_lazy() {
        let mut camera = Camera::demo(16.0 / 9.0);
        let stale = camera.view_matrix();

        camera.transform_mut().move_absolute(Vec3::new(5.0, 0.0, 0.0));
        // Moving the transform alone must not touch the cached view.
        assert_eq!(camera.view_matrix().to_cols_array(), stale.to_cols_array());

        camera.update_view_matrix();
        assert_ne!(camera.view_matrix().to_cols_array(), stale.to_cols_array());
    }

    #[test]
    fn projection_tracks_aspect_changes() {
        let mut camera = Camera::demo(1.0);
        let square = camera.projection_matrix();

        camera.update_projection_matrix(2.0);
        let wide = camera.projection_matrix();
        assert_ne!(square.to_cols_array(), wide.to_cols_array());

        // Horizontal scale halves when the aspect ratio doubles.
        assert!((wide.x_axis.x - square.x_axis.x / 2.0).abs() < 1e-6);
    }

    #[test]
    fn view_looks_along_transform_forward() {
        let camera = Camera::demo(1.0);
        // Camera sits at -10 on Z facing +Z, so the origin is 10 units ahead.
        let eye_space = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert!((eye_space.z.abs() - 10.0).abs() < 1e-5);
    }
}
