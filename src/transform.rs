//! Spatial transforms with lazily cached world matrices.
//!
//! [`Transform`] owns position, rotation, and scale for a single object and
//! derives a world matrix plus its inverse transpose on demand. The matrices
//! are memoized behind a dirty flag: mutators only mark the cache stale, and
//! the next matrix read recomputes both matrices in one pass.
//!
//! # Example
//!
//! ```
//! use aspis::Transform;
//! use glam::Vec3;
//!
//! let mut t = Transform::new();
//! t.set_position(Vec3::new(1.0, 0.0, 0.0));
//! t.scale_by(Vec3::new(2.0, 1.0, 1.0));
//!
//! // Scale is applied before translation: local (1,0,0) lands at (3,0,0).
//! let world = t.world_matrix();
//! assert_eq!(world.transform_point3(Vec3::X), Vec3::new(3.0, 0.0, 0.0));
//! ```

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Position, rotation, and scale with a dirty-flag matrix cache.
///
/// Rotation is stored as pitch/yaw/roll Euler angles (radians, intrinsic
/// X·Y·Z order). The world matrix composes scale, then rotation, then
/// translation. Both the world matrix and its inverse transpose (needed for
/// normal transformation under non-uniform scale) are refreshed together,
/// never separately.
///
/// Each `Transform` is exclusively owned by its [`Entity`](crate::Entity) or
/// [`Camera`](crate::Camera); there is no sharing and therefore no locking.
#[derive(Clone, Debug)]
pub struct Transform {
    translation: Vec3,
    pitch_yaw_roll: Vec3,
    scale: Vec3,

    world: Mat4,
    world_inverse_transpose: Mat4,
    dirty: bool,
    recompute_count: u32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            pitch_yaw_roll: Vec3::ZERO,
            scale: Vec3::ONE,
            world: Mat4::IDENTITY,
            world_inverse_transpose: Mat4::IDENTITY,
            dirty: false,
            recompute_count: 0,
        }
    }
}

impl Transform {
    /// Creates an identity transform: origin, no rotation, unit scale.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transform at the given position.
    pub fn from_position(position: Vec3) -> Self {
        let mut t = Self::default();
        t.set_position(position);
        t
    }

    /// Current translation.
    pub fn position(&self) -> Vec3 {
        self.translation
    }

    /// Current rotation as pitch/yaw/roll in radians.
    pub fn pitch_yaw_roll(&self) -> Vec3 {
        self.pitch_yaw_roll
    }

    /// Current per-axis scale factors.
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Whether the cached matrices are stale.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replaces the translation.
    pub fn set_position(&mut self, position: Vec3) {
        self.translation = position;
        self.dirty = true;
    }

    /// Replaces the rotation with pitch/yaw/roll in radians.
    pub fn set_rotation(&mut self, pitch_yaw_roll: Vec3) {
        self.pitch_yaw_roll = pitch_yaw_roll;
        self.dirty = true;
    }

    /// Replaces the per-axis scale.
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.dirty = true;
    }

    /// Adds a world-space offset to the translation.
    pub fn move_absolute(&mut self, offset: Vec3) {
        self.translation += offset;
        self.dirty = true;
    }

    /// Adds an offset rotated by the current orientation.
    ///
    /// "Forward 1 unit" moves along wherever this transform is facing rather
    /// than along the world Z axis.
    pub fn move_relative(&mut self, offset: Vec3) {
        self.translation += self.rotation_quat() * offset;
        self.dirty = true;
    }

    /// Adds to the current pitch/yaw/roll.
    pub fn rotate(&mut self, pitch_yaw_roll: Vec3) {
        self.pitch_yaw_roll += pitch_yaw_roll;
        self.dirty = true;
    }

    /// Multiplies the current scale component-wise.
    pub fn scale_by(&mut self, factor: Vec3) {
        self.scale *= factor;
        self.dirty = true;
    }

    /// The world axis +Z rotated by the current orientation.
    pub fn forward(&self) -> Vec3 {
        self.rotation_quat() * Vec3::Z
    }

    /// The world axis +Y rotated by the current orientation.
    pub fn up(&self) -> Vec3 {
        self.rotation_quat() * Vec3::Y
    }

    /// The world axis +X rotated by the current orientation.
    pub fn right(&self) -> Vec3 {
        self.rotation_quat() * Vec3::X
    }

    /// The world matrix as of the most recent mutation.
    ///
    /// Recomputes lazily: the composition is scale, then rotation, then
    /// translation. Calling this twice without an intervening mutator returns
    /// bit-identical matrices and performs no second recomputation.
    pub fn world_matrix(&mut self) -> Mat4 {
        self.refresh();
        self.world
    }

    /// The inverse transpose of the world matrix.
    ///
    /// Refreshed together with [`world_matrix`](Self::world_matrix); reading
    /// it never observes a matrix from an older world matrix than the one the
    /// last `world_matrix` call returned.
    pub fn world_inverse_transpose_matrix(&mut self) -> Mat4 {
        self.refresh();
        self.world_inverse_transpose
    }

    fn rotation_quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.pitch_yaw_roll.x,
            self.pitch_yaw_roll.y,
            self.pitch_yaw_roll.z,
        )
    }

    fn refresh(&mut self) {
        if !self.dirty {
            return;
        }
        self.world = Mat4::from_scale_rotation_translation(
            self.scale,
            self.rotation_quat(),
            self.translation,
        );
        self.world_inverse_transpose = self.world.inverse().transpose();
        self.dirty = false;
        self.recompute_count += 1;
    }

    #[cfg(test)]
    pub(crate) fn recompute_count(&self) -> u32 {
        self.recompute_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_idempotent() {
        let mut t = Transform::new();
        t.set_position(Vec3::new(1.0, 2.0, 3.0));

        let first = t.world_matrix();
        let count = t.recompute_count();
        let second = t.world_matrix();

        assert_eq!(first.to_cols_array(), second.to_cols_array());
        assert_eq!(t.recompute_count(), count, "second read must not recompute");
    }

    #[test]
    fn every_mutator_marks_dirty() {
        let mutators: &[fn(&mut Transform)] = &[
            |t| t.set_position(Vec3::ONE),
            |t| t.set_rotation(Vec3::new(0.1, 0.2, 0.3)),
            |t| t.set_scale(Vec3::splat(2.0)),
            |t| t.move_absolute(Vec3::X),
            |t| t.move_relative(Vec3::Z),
            |t| t.rotate(Vec3::new(0.0, 0.5, 0.0)),
            |t| t.scale_by(Vec3::splat(0.5)),
        ];

        for mutate in mutators {
            let mut t = Transform::new();
            let _ = t.world_matrix();
            let before = t.recompute_count();

            mutate(&mut t);
            assert!(t.is_dirty());

            let _ = t.world_matrix();
            assert_eq!(t.recompute_count(), before + 1);
            assert!(!t.is_dirty());
        }
    }

    #[test]
    fn composition_is_scale_then_rotate_then_translate() {
        let mut t = Transform::new();
        t.set_position(Vec3::new(1.0, 0.0, 0.0));
        t.set_scale(Vec3::new(2.0, 1.0, 1.0));

        // Local (1,0,0) scales to (2,0,0), then translates to (3,0,0).
        let world = t.world_matrix();
        let p = world.transform_point3(Vec3::X);
        assert_eq!(p, Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn inverse_transpose_tracks_world() {
        let mut t = Transform::new();
        t.set_scale(Vec3::new(2.0, 1.0, 0.5));
        t.set_rotation(Vec3::new(0.3, 1.1, -0.4));

        let world = t.world_matrix();
        let wit = t.world_inverse_transpose_matrix();
        let expected = world.inverse().transpose();
        assert!((wit - expected).abs().to_cols_array().iter().all(|d| *d < 1e-6));

        // Reading the inverse transpose first must refresh both.
        t.move_absolute(Vec3::Y);
        let wit = t.world_inverse_transpose_matrix();
        assert!(!t.is_dirty());
        let expected = t.world_matrix().inverse().transpose();
        assert!((wit - expected).abs().to_cols_array().iter().all(|d| *d < 1e-6));
    }

    #[test]
    fn move_relative_follows_orientation() {
        let mut t = Transform::new();
        // Yaw 90 degrees: local +Z now points along world +X.
        t.set_rotation(Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0));
        t.move_relative(Vec3::new(0.0, 0.0, 1.0));

        let p = t.position();
        assert!((p.x - 1.0).abs() < 1e-6);
        assert!(p.y.abs() < 1e-6);
        assert!(p.z.abs() < 1e-6);
    }

    #[test]
    fn move_absolute_ignores_orientation() {
        let mut t = Transform::new();
        t.set_rotation(Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0));
        t.move_absolute(Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(t.position(), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn directional_queries_rotate_world_axes() {
        let t = Transform::new();
        assert_eq!(t.forward(), Vec3::Z);
        assert_eq!(t.up(), Vec3::Y);
        assert_eq!(t.right(), Vec3::X);

        let mut t = Transform::new();
        t.set_rotation(Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0));
        let f = t.forward();
        assert!((f - Vec3::X).length() < 1e-6);
    }
}
