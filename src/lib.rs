//! # Aspis
//!
//! **A small real-time rendering engine built on wgpu.**
//!
//! Aspis renders scenes of mesh/material entities through a forward
//! rasterized path or, on capable hardware, a ray-traced path over wgpu's
//! experimental acceleration structures. The moving parts are deliberately
//! explicit: you own the [`Scene`], the [`Camera`], and the frame loop; the
//! engine owns the GPU plumbing.
//!
//! ## Quick Start
//!
//! ```no_run
//! use aspis::*;
//! use glam::Vec3;
//! # use std::sync::Arc;
//! # fn demo(window: Arc<winit::window::Window>) {
//! let gpu = GpuContext::new(window);
//! let mut renderer = Renderer::new(&gpu);
//!
//! let mut scene = Scene::new();
//! let sphere = scene.add_mesh(Mesh::sphere(&gpu, 32, 16));
//! let material = scene.add_material(Material::new(PipelineId::DEFAULT));
//! scene.spawn_at(sphere, material, Vec3::new(-2.5, 0.0, 0.0));
//! scene.spawn(sphere, material);
//! scene.spawn_at(sphere, material, Vec3::new(2.5, 0.0, 0.0));
//! *scene.lights_mut() = LightRig::demo_rig();
//!
//! let camera = Camera::demo(gpu.aspect());
//!
//! // Per frame:
//! renderer.render(&gpu, &mut scene, &camera).unwrap();
//! # }
//! ```
//!
//! ## Design notes
//!
//! - **Lazy where it pays** — world matrices recompute behind a dirty flag
//!   ([`Transform`]), BLASes attach and build on first traced use.
//! - **Plan, then submit** — [`DrawPlan`] and [`RayScenePlan`] assemble a
//!   frame entirely on the CPU, so frame logic is testable without a device.
//! - **Type-safe handles** — [`MeshId`], [`TextureId`], [`MaterialId`], and
//!   [`EntityId`] prevent mix-ups at compile time.

mod camera;
mod entity;
mod geometry;
mod gpu;
mod light;
mod material;
mod mesh;
mod raytrace;
mod renderer;
mod ring;
mod scene;
mod sync;
mod texture;
mod transform;
mod uniforms;

pub use camera::Camera;
pub use entity::{Entity, EntityId};
pub use geometry::{GeometryError, RawGeometry};
pub use gpu::{GpuContext, GpuOptions};
pub use light::{GpuLight, Light, LightRig, MAX_LIGHTS};
pub use material::{
    BindingTable, BindingTableHandle, Material, MaterialId, PipelineId, BINDING_TABLE_CAPACITY,
    MAX_MATERIAL_TEXTURES,
};
pub use mesh::{Mesh, MeshId, Vertex3d};
pub use raytrace::{
    RayInstance, RayScenePlan, RayTraceError, RayTracer, MAX_INSTANCES_PER_BLAS, TLAS_CAPACITY,
};
pub use renderer::{DrawCommand, DrawPlan, RenderError, Renderer};
pub use ring::{RingCursor, UniformRing, UNIFORM_ALIGN};
pub use scene::Scene;
pub use sync::{DeviceFence, FramePacer, GpuFence, FRAMES_IN_FLIGHT};
pub use texture::{Texture, TextureId};
pub use transform::Transform;
pub use uniforms::{PixelStageUniforms, RayMaterialRecord, RaySceneUniforms, VertexStageUniforms};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
