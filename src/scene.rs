//! Scene storage: arenas of meshes, textures, materials, and entities,
//! plus the shared light rig and texture binding table.
//!
//! A [`Scene`] is plain CPU-side bookkeeping. Resources are appended and
//! referred to by typed handles; nothing is ever removed, so handles stay
//! valid for the life of the scene. The renderer and ray tracer walk the
//! arenas each frame but never own them.

use glam::Vec3;

use crate::entity::{Entity, EntityId};
use crate::light::LightRig;
use crate::material::{BindingTable, Material, MaterialId};
use crate::mesh::{Mesh, MeshId};
use crate::texture::{Texture, TextureId};

/// Append-only resource arenas and the per-frame light rig.
#[derive(Default)]
pub struct Scene {
    meshes: Vec<Mesh>,
    textures: Vec<Texture>,
    materials: Vec<Material>,
    entities: Vec<Entity>,
    lights: LightRig,
    binding_table: Option<BindingTable>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a mesh and returns its handle.
    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    /// Stores a texture and returns its handle.
    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        self.textures.push(texture);
        TextureId(self.textures.len() - 1)
    }

    /// Stores a material and returns its handle.
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    /// Creates an entity at the origin.
    pub fn spawn(&mut self, mesh: MeshId, material: MaterialId) -> EntityId {
        self.entities.push(Entity::new(mesh, material));
        EntityId(self.entities.len() - 1)
    }

    /// Creates an entity at `position`.
    pub fn spawn_at(&mut self, mesh: MeshId, material: MaterialId, position: Vec3) -> EntityId {
        let id = self.spawn(mesh, material);
        if let Some(entity) = self.entity_mut(id) {
            entity.transform_mut().set_position(position);
        }
        id
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(id.0)
    }

    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id.0)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id.0)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.0)
    }

    /// All entities in spawn order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| (EntityId(i), e))
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut Entity)> {
        self.entities
            .iter_mut()
            .enumerate()
            .map(|(i, e)| (EntityId(i), e))
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn lights(&self) -> &LightRig {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut LightRig {
        &mut self.lights
    }

    /// Finalizes every material that has not been finalized yet.
    ///
    /// The binding table is created on first call with `fallback` backing its
    /// gap entries; later calls reuse the existing table (and its original
    /// fallback). Called by the renderer before the first draw that uses a
    /// material, and harmless to call again.
    pub fn finalize_materials(&mut self, fallback: TextureId) {
        let table = self
            .binding_table
            .get_or_insert_with(|| BindingTable::new(fallback));
        for material in &mut self.materials {
            material.finalize(table);
        }
    }

    /// The shared binding table, once any material has been finalized.
    pub fn binding_table(&self) -> Option<&BindingTable> {
        self.binding_table.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::PipelineId;

    #[test]
    fn handles_index_in_insertion_order() {
        let mut scene = Scene::new();
        let m0 = scene.add_material(Material::new(PipelineId::DEFAULT));
        let m1 = scene.add_material(Material::new(PipelineId::DEFAULT));
        assert_eq!(m0, MaterialId(0));
        assert_eq!(m1, MaterialId(1));
        assert!(scene.material(m1).is_some());
    }

    #[test]
    fn spawn_at_positions_the_entity() {
        let mut scene = Scene::new();
        let mat = scene.add_material(Material::new(PipelineId::DEFAULT));
        let id = scene.spawn_at(MeshId(0), mat, Vec3::new(0.0, 2.5, 0.0));

        let entity = scene.entity(id).unwrap();
        assert_eq!(entity.transform().position(), Vec3::new(0.0, 2.5, 0.0));
    }

    #[test]
    fn finalize_materials_finalizes_everything_once() {
        let mut scene = Scene::new();
        let a = scene.add_material(Material::new(PipelineId::DEFAULT));
        let b = scene.add_material({
            let mut m = Material::new(PipelineId::DEFAULT);
            m.add_texture(TextureId(5), 0);
            m
        });

        scene.finalize_materials(TextureId(0));
        assert!(scene.material(a).unwrap().is_finalized());
        assert!(scene.material(b).unwrap().is_finalized());
        let len = scene.binding_table().unwrap().len();

        scene.finalize_materials(TextureId(0));
        assert_eq!(scene.binding_table().unwrap().len(), len);
    }
}
