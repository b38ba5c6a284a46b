//! Materials and the shared texture binding table.
//!
//! A [`Material`] maps a handful of texture slots to texture handles and, at
//! finalization, compacts the occupied slots into one contiguous range of the
//! renderer-owned [`BindingTable`]. The shader addresses all of a material's
//! textures through the single base handle recorded at finalization plus a
//! fixed stride, so a draw binds exactly one texture table regardless of how
//! many slots the material uses.
//!
//! # Finalization protocol
//!
//! - [`Material::add_texture`] before finalization assigns a slot; out-of-range
//!   slots and post-finalization calls are silent no-ops.
//! - [`Material::finalize`] copies slots 0 through the highest occupied slot
//!   *inclusive* into the table, in slot order, and records the handle of the
//!   first copy. It is idempotent.
//! - Until finalization the material's handle is [`BindingTableHandle::NULL`],
//!   which the renderer treats as "no textures bound".

use glam::{Vec2, Vec3};

use crate::texture::TextureId;

/// Texture slots per material. Matches the shader-side table stride.
pub const MAX_MATERIAL_TEXTURES: usize = 4;

/// Capacity of the shared binding table.
pub const BINDING_TABLE_CAPACITY: usize = 1024;

/// Handle to a material stored in a [`Scene`](crate::Scene).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialId(pub(crate) usize);

/// Handle to a shading pipeline owned by the frame renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PipelineId(pub(crate) usize);

impl PipelineId {
    /// The renderer's built-in forward pipeline.
    pub const DEFAULT: PipelineId = PipelineId(0);
}

/// Base handle of a material's contiguous range in the [`BindingTable`].
///
/// The zero value is the `NULL` sentinel: it never names a live range and
/// consumers must fall back to "no textures bound" when they see it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BindingTableHandle(u32);

impl BindingTableHandle {
    pub const NULL: BindingTableHandle = BindingTableHandle(0);

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    fn from_index(index: usize) -> Self {
        BindingTableHandle(index as u32 + 1)
    }

    fn index(&self) -> usize {
        debug_assert!(!self.is_null());
        self.0 as usize - 1
    }
}

/// The shared, fixed-capacity table of texture references that draws bind.
///
/// Owned by the renderer side of the system; materials append into it exactly
/// once each, at finalization. Entries are never freed — the table lives as
/// long as the scene, mirroring a shader-visible descriptor heap.
pub struct BindingTable {
    entries: Vec<TextureId>,
    fallback: TextureId,
}

impl BindingTable {
    /// Creates an empty table. `fallback` backs unoccupied slots below a
    /// material's highest occupied slot, keeping base-plus-stride addressing
    /// aligned.
    pub fn new(fallback: TextureId) -> Self {
        Self {
            entries: Vec::new(),
            fallback,
        }
    }

    pub fn fallback(&self) -> TextureId {
        self.fallback
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copies one texture reference into the next free entry.
    ///
    /// Returns `NULL` when the table is exhausted; running out of table space
    /// is a scene-setup error, so it is also logged.
    fn copy(&mut self, texture: TextureId) -> BindingTableHandle {
        if self.entries.len() >= BINDING_TABLE_CAPACITY {
            log::error!("binding table exhausted ({BINDING_TABLE_CAPACITY} entries)");
            return BindingTableHandle::NULL;
        }
        self.entries.push(texture);
        BindingTableHandle::from_index(self.entries.len() - 1)
    }

    /// Resolves a material's range: `len` entries starting at `base`.
    ///
    /// A `NULL` base or out-of-range span yields an empty slice.
    pub fn range(&self, base: BindingTableHandle, len: usize) -> &[TextureId] {
        if base.is_null() {
            return &[];
        }
        let start = base.index();
        let end = start + len;
        if end > self.entries.len() {
            return &[];
        }
        &self.entries[start..end]
    }
}

/// Shading parameters plus the per-material texture slot table.
#[derive(Clone, Debug)]
pub struct Material {
    pipeline: PipelineId,
    color_tint: Vec3,
    uv_scale: Vec2,
    uv_offset: Vec2,
    roughness: f32,
    metalness: f32,

    slots: [Option<TextureId>; MAX_MATERIAL_TEXTURES],
    finalized: bool,
    table_handle: BindingTableHandle,
}

impl Material {
    pub fn new(pipeline: PipelineId) -> Self {
        Self {
            pipeline,
            color_tint: Vec3::ONE,
            uv_scale: Vec2::ONE,
            uv_offset: Vec2::ZERO,
            roughness: 1.0,
            metalness: 0.0,
            slots: [None; MAX_MATERIAL_TEXTURES],
            finalized: false,
            table_handle: BindingTableHandle::NULL,
        }
    }

    pub fn with_color_tint(mut self, color_tint: Vec3) -> Self {
        self.color_tint = color_tint;
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    pub fn with_metalness(mut self, metalness: f32) -> Self {
        self.metalness = metalness;
        self
    }

    pub fn with_uv_transform(mut self, scale: Vec2, offset: Vec2) -> Self {
        self.uv_scale = scale;
        self.uv_offset = offset;
        self
    }

    pub fn pipeline(&self) -> PipelineId {
        self.pipeline
    }

    pub fn color_tint(&self) -> Vec3 {
        self.color_tint
    }

    pub fn set_color_tint(&mut self, color_tint: Vec3) {
        self.color_tint = color_tint;
    }

    pub fn uv_scale(&self) -> Vec2 {
        self.uv_scale
    }

    pub fn set_uv_scale(&mut self, uv_scale: Vec2) {
        self.uv_scale = uv_scale;
    }

    pub fn uv_offset(&self) -> Vec2 {
        self.uv_offset
    }

    pub fn set_uv_offset(&mut self, uv_offset: Vec2) {
        self.uv_offset = uv_offset;
    }

    pub fn roughness(&self) -> f32 {
        self.roughness
    }

    pub fn metalness(&self) -> f32 {
        self.metalness
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// The texture currently assigned to `slot`, if any.
    pub fn texture_in_slot(&self, slot: usize) -> Option<TextureId> {
        self.slots.get(slot).copied().flatten()
    }

    /// Assigns a texture to a slot.
    ///
    /// Rejected as a no-op (not an error) when the material is already
    /// finalized or the slot is outside `0..MAX_MATERIAL_TEXTURES`.
    pub fn add_texture(&mut self, texture: TextureId, slot: usize) {
        if self.finalized {
            return;
        }
        let Some(entry) = self.slots.get_mut(slot) else {
            return;
        };
        *entry = Some(texture);
    }

    /// Compacts the occupied slots into the shared binding table.
    ///
    /// Copies every slot from 0 through the highest occupied slot inclusive,
    /// in slot order; unoccupied slots in that span copy the table's fallback
    /// texture. The handle of the first copy becomes this material's base
    /// handle. Idempotent: a second call changes nothing.
    pub fn finalize(&mut self, table: &mut BindingTable) {
        if self.finalized {
            return;
        }

        if let Some(highest) = self.highest_occupied_slot() {
            for slot in 0..=highest {
                let texture = self.slots[slot].unwrap_or(table.fallback());
                let handle = table.copy(texture);
                if slot == 0 {
                    self.table_handle = handle;
                }
            }
        }

        self.finalized = true;
    }

    /// The base handle recorded at finalization, or `NULL` before it.
    pub fn binding_table_handle(&self) -> BindingTableHandle {
        self.table_handle
    }

    /// Number of binding-table entries this material occupies once finalized.
    pub fn table_len(&self) -> usize {
        match self.highest_occupied_slot() {
            Some(highest) => highest + 1,
            None => 0,
        }
    }

    fn highest_occupied_slot(&self) -> Option<usize> {
        self.slots
            .iter()
            .rposition(|slot| slot.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tex(id: usize) -> TextureId {
        TextureId(id)
    }

    fn table() -> BindingTable {
        BindingTable::new(tex(999))
    }

    #[test]
    fn finalize_compacts_in_slot_order() {
        let mut table = table();
        let mut mat = Material::new(PipelineId::DEFAULT);
        mat.add_texture(tex(10), 0);
        mat.add_texture(tex(11), 1);
        mat.add_texture(tex(12), 2);
        mat.finalize(&mut table);

        let base = mat.binding_table_handle();
        assert!(!base.is_null());
        assert_eq!(table.range(base, mat.table_len()), &[tex(10), tex(11), tex(12)]);
    }

    #[test]
    fn finalize_is_idempotent() {
        let mut table = table();
        let mut mat = Material::new(PipelineId::DEFAULT);
        mat.add_texture(tex(1), 0);

        mat.finalize(&mut table);
        let first = mat.binding_table_handle();
        let len = table.len();

        mat.finalize(&mut table);
        assert_eq!(mat.binding_table_handle(), first);
        assert_eq!(table.len(), len, "second finalize must not copy again");
    }

    #[test]
    fn add_texture_after_finalize_is_ignored() {
        let mut table = table();
        let mut mat = Material::new(PipelineId::DEFAULT);
        mat.add_texture(tex(1), 0);
        mat.finalize(&mut table);
        let handle = mat.binding_table_handle();

        mat.add_texture(tex(2), 1);
        assert_eq!(mat.texture_in_slot(1), None);
        assert_eq!(mat.binding_table_handle(), handle);
    }

    #[test]
    fn out_of_range_slot_is_ignored() {
        let mut mat = Material::new(PipelineId::DEFAULT);
        mat.add_texture(tex(1), MAX_MATERIAL_TEXTURES);
        mat.add_texture(tex(2), MAX_MATERIAL_TEXTURES + 100);
        for slot in 0..MAX_MATERIAL_TEXTURES {
            assert_eq!(mat.texture_in_slot(slot), None);
        }
    }

    #[test]
    fn highest_occupied_slot_is_copied_inclusive() {
        // Slot 2 occupied, slots 0 and 1 empty: the span 0..=2 is copied with
        // the fallback standing in for the gaps.
        let mut table = table();
        let mut mat = Material::new(PipelineId::DEFAULT);
        mat.add_texture(tex(42), 2);
        mat.finalize(&mut table);

        let base = mat.binding_table_handle();
        assert_eq!(mat.table_len(), 3);
        assert_eq!(
            table.range(base, mat.table_len()),
            &[tex(999), tex(999), tex(42)]
        );
    }

    #[test]
    fn textureless_material_keeps_null_handle() {
        let mut table = table();
        let mut mat = Material::new(PipelineId::DEFAULT);
        mat.finalize(&mut table);

        assert!(mat.is_finalized());
        assert!(mat.binding_table_handle().is_null());
        assert!(table.is_empty());
        assert_eq!(table.range(BindingTableHandle::NULL, 4), &[]);
    }

    #[test]
    fn two_materials_get_distinct_ranges() {
        let mut table = table();
        let mut a = Material::new(PipelineId::DEFAULT);
        a.add_texture(tex(1), 0);
        a.add_texture(tex(2), 1);
        a.finalize(&mut table);

        let mut b = Material::new(PipelineId::DEFAULT);
        b.add_texture(tex(3), 0);
        b.finalize(&mut table);

        assert_ne!(a.binding_table_handle(), b.binding_table_handle());
        assert_eq!(table.range(a.binding_table_handle(), 2), &[tex(1), tex(2)]);
        assert_eq!(table.range(b.binding_table_handle(), 1), &[tex(3)]);
    }
}
