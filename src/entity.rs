//! Renderable entities: a mesh, a material, and an owned transform.

use crate::material::MaterialId;
use crate::mesh::MeshId;
use crate::transform::Transform;

/// Handle to an entity stored in a [`Scene`](crate::Scene).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityId(pub(crate) usize);

/// One drawable object: shared mesh and material handles plus an exclusively
/// owned [`Transform`].
///
/// Meshes and materials are deliberately aliasable — a hundred entities can
/// point at the same sphere — while the transform is per-entity state, so it
/// lives here by value.
#[derive(Clone, Debug)]
pub struct Entity {
    mesh: MeshId,
    material: MaterialId,
    transform: Transform,
}

impl Entity {
    pub fn new(mesh: MeshId, material: MaterialId) -> Self {
        Self {
            mesh,
            material,
            transform: Transform::new(),
        }
    }

    pub fn with_transform(mesh: MeshId, material: MaterialId, transform: Transform) -> Self {
        Self {
            mesh,
            material,
            transform,
        }
    }

    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    /// Swaps the material; takes effect on the next frame build.
    pub fn set_material(&mut self, material: MaterialId) {
        self.material = material;
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn entity_owns_its_transform() {
        let mut a = Entity::new(MeshId(0), MaterialId(0));
        let b = Entity::new(MeshId(0), MaterialId(0));

        a.transform_mut().set_position(Vec3::X);
        assert_eq!(a.transform().position(), Vec3::X);
        assert_eq!(b.transform().position(), Vec3::ZERO);
    }

    #[test]
    fn set_material_swaps_handle() {
        let mut e = Entity::new(MeshId(3), MaterialId(1));
        e.set_material(MaterialId(7));
        assert_eq!(e.material(), MaterialId(7));
        assert_eq!(e.mesh(), MeshId(3));
    }
}
