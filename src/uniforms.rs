//! Fixed constant-block layouts shared between CPU and shaders.
//!
//! Every struct here is `#[repr(C)]` + [`bytemuck::Pod`] and mirrors a WGSL
//! declaration in `src/shaders/`. Layouts are asserted by tests; the WGSL
//! side packs awkward members (vec3 + scalar pairs) into vec4 slots so the
//! byte images match exactly.

use glam::{Mat4, Vec2, Vec3};

use crate::light::{GpuLight, LightRig, MAX_LIGHTS};

/// Per-draw vertex-stage constant block, bound at group 0.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexStageUniforms {
    pub world: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub world_inverse_transpose: [[f32; 4]; 4],
}

impl VertexStageUniforms {
    pub fn new(world: Mat4, view: Mat4, projection: Mat4, world_inverse_transpose: Mat4) -> Self {
        Self {
            world: world.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            world_inverse_transpose: world_inverse_transpose.to_cols_array_2d(),
        }
    }
}

/// Per-draw pixel-stage constant block, bound at group 1.
///
/// Carries the material's uv transform, the camera position for specular
/// math, and the full fixed-capacity light array.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PixelStageUniforms {
    pub uv_scale: [f32; 2],
    pub uv_offset: [f32; 2],
    pub camera_position: [f32; 3],
    pub light_count: i32,
    pub lights: [GpuLight; MAX_LIGHTS],
}

impl PixelStageUniforms {
    pub fn new(uv_scale: Vec2, uv_offset: Vec2, camera_position: Vec3, rig: &LightRig) -> Self {
        Self {
            uv_scale: uv_scale.to_array(),
            uv_offset: uv_offset.to_array(),
            camera_position: camera_position.to_array(),
            light_count: rig.count() as i32,
            lights: *rig.packed(),
        }
    }
}

/// Scene constants for the trace dispatch.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RaySceneUniforms {
    pub inverse_view_projection: [[f32; 4]; 4],
    pub camera_position: [f32; 3],
    pub _pad: f32,
}

impl RaySceneUniforms {
    pub fn new(view: Mat4, projection: Mat4, camera_position: Vec3) -> Self {
        Self {
            inverse_view_projection: (projection * view).inverse().to_cols_array_2d(),
            camera_position: camera_position.to_array(),
            _pad: 0.0,
        }
    }
}

/// Per-instance shading record for the ray-traced path: 64 bytes, indexed by
/// the instance's custom index inside its BLAS slot.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RayMaterialRecord {
    pub color: [f32; 3],
    pub roughness: f32,
    pub uv_scale: [f32; 2],
    pub uv_offset: [f32; 2],
    pub metalness: f32,
    pub _pad: [f32; 3],
    pub texture_indices: [u32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn vertex_block_is_four_matrices() {
        assert_eq!(size_of::<VertexStageUniforms>(), 4 * 64);
    }

    #[test]
    fn pixel_block_layout_matches_wgsl() {
        assert_eq!(offset_of!(PixelStageUniforms, uv_scale), 0);
        assert_eq!(offset_of!(PixelStageUniforms, uv_offset), 8);
        assert_eq!(offset_of!(PixelStageUniforms, camera_position), 16);
        assert_eq!(offset_of!(PixelStageUniforms, light_count), 28);
        assert_eq!(offset_of!(PixelStageUniforms, lights), 32);
        assert_eq!(size_of::<PixelStageUniforms>(), 32 + MAX_LIGHTS * 64);
    }

    #[test]
    fn ray_scene_block_is_80_bytes() {
        assert_eq!(size_of::<RaySceneUniforms>(), 80);
    }

    #[test]
    fn ray_material_record_is_64_bytes() {
        assert_eq!(size_of::<RayMaterialRecord>(), 64);
        assert_eq!(offset_of!(RayMaterialRecord, uv_scale), 16);
        assert_eq!(offset_of!(RayMaterialRecord, metalness), 32);
        assert_eq!(offset_of!(RayMaterialRecord, texture_indices), 48);
    }
}
