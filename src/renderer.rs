//! The forward frame renderer.
//!
//! Rendering is split into a pure planning step and a GPU submission step.
//! [`DrawPlan::build`] walks the scene and snapshots everything a frame
//! needs — world matrices, constant blocks, binding-table handles — without
//! touching the device, so frame assembly is testable on the CPU.
//! [`Renderer::render`] then plays a plan back: it waits for its frame slot,
//! acquires the surface, streams the constant blocks through the uniform
//! rings, records one clear-and-draw pass, submits, and presents.
//!
//! Bind group model:
//! - group 0: vertex-stage constants, one dynamic-offset uniform binding
//! - group 1: pixel-stage constants, one dynamic-offset uniform binding
//! - group 2: the material's texture table slice (a fixed four views plus
//!   the shared sampler), cached per binding-table handle

use std::collections::HashMap;

use crate::camera::Camera;
use crate::gpu::GpuContext;
use crate::material::{BindingTableHandle, PipelineId, MAX_MATERIAL_TEXTURES};
use crate::mesh::{MeshId, Vertex3d};
use crate::ring::UniformRing;
use crate::scene::Scene;
use crate::sync::{DeviceFence, FramePacer, FRAMES_IN_FLIGHT};
use crate::texture::{Texture, TextureId};
use crate::uniforms::{PixelStageUniforms, VertexStageUniforms};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

// Per-frame-slot budgets: the pixel block carries the full light array, so
// its ring is the larger one.
const VS_RING_CAPACITY: u64 = 1024 * 1024;
const PS_RING_CAPACITY: u64 = 8 * 1024 * 1024;

/// Errors surfaced by [`Renderer::render`].
///
/// Transient surface conditions (outdated, timeout) are handled inside the
/// renderer by skipping the frame; only unrecoverable states reach the
/// caller.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("uniform ring exhausted (frame exceeds its per-slot budget)")]
    RingExhausted,
    #[error("unknown pipeline {0:?}")]
    UnknownPipeline(PipelineId),
}

/// Everything one draw needs, captured on the CPU.
#[derive(Clone, Debug)]
pub struct DrawCommand {
    pub mesh: MeshId,
    pub pipeline: PipelineId,
    pub table_handle: BindingTableHandle,
    pub table_len: usize,
    pub vertex_uniforms: VertexStageUniforms,
    pub pixel_uniforms: PixelStageUniforms,
}

/// A frame's worth of draw commands in entity order.
#[derive(Clone, Debug, Default)]
pub struct DrawPlan {
    pub commands: Vec<DrawCommand>,
}

impl DrawPlan {
    /// Snapshots the scene into draw commands.
    ///
    /// Needs `&mut Scene` because reading a world matrix refreshes the
    /// transform's lazy cache. Entities whose material handle does not
    /// resolve are skipped.
    pub fn build(scene: &mut Scene, camera: &Camera) -> Self {
        let view = camera.view_matrix();
        let projection = camera.projection_matrix();
        let camera_position = camera.transform().position();
        let lights = scene.lights().clone();

        let mut commands = Vec::with_capacity(scene.entity_count());
        for i in 0..scene.entity_count() {
            let id = crate::entity::EntityId(i);
            let Some(entity) = scene.entity(id) else {
                continue;
            };
            let mesh = entity.mesh();
            let material_id = entity.material();

            let Some(material) = scene.material(material_id) else {
                log::warn!("entity {i} references missing material {material_id:?}");
                continue;
            };
            let pipeline = material.pipeline();
            let uv_scale = material.uv_scale();
            let uv_offset = material.uv_offset();
            let table_handle = material.binding_table_handle();
            let table_len = material.table_len();

            let Some(entity) = scene.entity_mut(id) else {
                continue;
            };
            let transform = entity.transform_mut();
            let world = transform.world_matrix();
            let world_inverse_transpose = transform.world_inverse_transpose_matrix();

            commands.push(DrawCommand {
                mesh,
                pipeline,
                table_handle,
                table_len,
                vertex_uniforms: VertexStageUniforms::new(
                    world,
                    view,
                    projection,
                    world_inverse_transpose,
                ),
                pixel_uniforms: PixelStageUniforms::new(
                    uv_scale,
                    uv_offset,
                    camera_position,
                    &lights,
                ),
            });
        }

        Self { commands }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// The forward renderer: pipelines, uniform rings, bind group caches, depth
/// buffer, and the frame pacer.
pub struct Renderer {
    pipelines: Vec<wgpu::RenderPipeline>,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,

    vs_ring: UniformRing,
    ps_ring: UniformRing,
    vs_bind_group: wgpu::BindGroup,
    ps_bind_group: wgpu::BindGroup,

    sampler: wgpu::Sampler,
    fallback_texture: Option<TextureId>,
    fallback_bind_group: Option<wgpu::BindGroup>,
    // One cached bind group per finalized material range.
    texture_groups: HashMap<BindingTableHandle, wgpu::BindGroup>,

    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),

    pacer: FramePacer<wgpu::SubmissionIndex>,
    clear_color: wgpu::Color,
}

impl Renderer {
    /// Builds the renderer and registers the built-in forward pipeline as
    /// [`PipelineId::DEFAULT`].
    pub fn new(gpu: &GpuContext) -> Self {
        let vs_layout = dynamic_uniform_layout(
            gpu,
            wgpu::ShaderStages::VERTEX,
            std::mem::size_of::<VertexStageUniforms>() as u64,
            "Vertex Stage Uniform Layout",
        );
        let ps_layout = dynamic_uniform_layout(
            gpu,
            wgpu::ShaderStages::FRAGMENT,
            std::mem::size_of::<PixelStageUniforms>() as u64,
            "Pixel Stage Uniform Layout",
        );

        let mut texture_entries = Vec::new();
        for slot in 0..MAX_MATERIAL_TEXTURES as u32 {
            texture_entries.push(wgpu::BindGroupLayoutEntry {
                binding: slot,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
        }
        texture_entries.push(wgpu::BindGroupLayoutEntry {
            binding: MAX_MATERIAL_TEXTURES as u32,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
        let texture_layout =
            gpu.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Material Texture Table Layout"),
                    entries: &texture_entries,
                });

        let pipeline_layout = gpu
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Forward Pipeline Layout"),
                bind_group_layouts: &[&vs_layout, &ps_layout, &texture_layout],
                push_constant_ranges: &[],
            });

        let vs_ring = UniformRing::new(
            gpu,
            VS_RING_CAPACITY,
            FRAMES_IN_FLIGHT,
            "Vertex Stage Uniform Ring",
        );
        let ps_ring = UniformRing::new(
            gpu,
            PS_RING_CAPACITY,
            FRAMES_IN_FLIGHT,
            "Pixel Stage Uniform Ring",
        );

        let vs_bind_group = ring_bind_group(
            gpu,
            &vs_layout,
            &vs_ring,
            std::mem::size_of::<VertexStageUniforms>() as u64,
            "Vertex Stage Uniform Bind Group",
        );
        let ps_bind_group = ring_bind_group(
            gpu,
            &ps_layout,
            &ps_ring,
            std::mem::size_of::<PixelStageUniforms>() as u64,
            "Pixel Stage Uniform Bind Group",
        );

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Material Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            anisotropy_clamp: 16,
            ..Default::default()
        });

        let (depth_view, depth_size) = create_depth(gpu);

        let shader = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Forward Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("shaders/forward.wgsl").into()),
            });
        let forward = create_pipeline(gpu, &pipeline_layout, &shader, "Forward Pipeline");

        Self {
            pipelines: vec![forward],
            texture_layout,
            pipeline_layout,
            vs_ring,
            ps_ring,
            vs_bind_group,
            ps_bind_group,
            sampler,
            fallback_texture: None,
            fallback_bind_group: None,
            texture_groups: HashMap::new(),
            depth_view,
            depth_size,
            pacer: FramePacer::new(FRAMES_IN_FLIGHT),
            clear_color: wgpu::Color {
                // Cornflower blue.
                r: 0.392,
                g: 0.584,
                b: 0.929,
                a: 1.0,
            },
        }
    }

    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.clear_color = color;
    }

    /// Compiles an additional shading pipeline against the shared layouts.
    ///
    /// The WGSL must declare the same three bind groups as the forward
    /// shader: entry points `vs_main` and `fs_main`.
    pub fn register_pipeline(&mut self, gpu: &GpuContext, wgsl: &str, label: &str) -> PipelineId {
        let shader = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(wgsl.into()),
            });
        let pipeline = create_pipeline(gpu, &self.pipeline_layout, &shader, label);
        self.pipelines.push(pipeline);
        PipelineId(self.pipelines.len() - 1)
    }

    /// Frames rendered so far.
    pub fn frame_index(&self) -> u64 {
        self.pacer.frame_index()
    }

    /// Renders one frame of `scene` through `camera`.
    ///
    /// Waits for this frame's slot, finalizes any new materials, uploads the
    /// per-draw constant blocks, records the pass, submits, and presents.
    /// A lost or outdated surface reconfigures and skips the frame.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        scene: &mut Scene,
        camera: &Camera,
    ) -> Result<(), RenderError> {
        let slot = self.pacer.begin_frame(&mut DeviceFence::new(gpu));
        self.vs_ring.begin_frame(slot);
        self.ps_ring.begin_frame(slot);

        self.finalize_scene(gpu, scene);
        let plan = DrawPlan::build(scene, camera);

        let frame = match gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost/outdated, reconfiguring and skipping frame");
                gpu.surface.configure(&gpu.device, &gpu.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface acquire timed out, skipping frame");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        let target = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.ensure_depth(gpu);
        self.ensure_texture_groups(gpu, scene, &plan);

        // Stream every draw's constants before the pass borrows the rings.
        let mut offsets = Vec::with_capacity(plan.commands.len());
        for command in &plan.commands {
            let vs = self
                .vs_ring
                .push(gpu, bytemuck::bytes_of(&command.vertex_uniforms))
                .ok_or(RenderError::RingExhausted)?;
            let ps = self
                .ps_ring
                .push(gpu, bytemuck::bytes_of(&command.pixel_uniforms))
                .ok_or(RenderError::RingExhausted)?;
            offsets.push((vs, ps));
        }

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Forward Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for (command, &(vs_offset, ps_offset)) in plan.commands.iter().zip(&offsets) {
                let Some(pipeline) = self.pipelines.get(command.pipeline.0) else {
                    return Err(RenderError::UnknownPipeline(command.pipeline));
                };
                let Some(mesh) = scene.mesh(command.mesh) else {
                    log::warn!("draw references missing mesh {:?}", command.mesh);
                    continue;
                };

                let textures = self
                    .texture_groups
                    .get(&command.table_handle)
                    .or(self.fallback_bind_group.as_ref());
                let Some(textures) = textures else {
                    continue;
                };

                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(0, &self.vs_bind_group, &[vs_offset]);
                rpass.set_bind_group(1, &self.ps_bind_group, &[ps_offset]);
                rpass.set_bind_group(2, textures, &[]);
                rpass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                rpass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        let submission = gpu.queue.submit(Some(encoder.finish()));
        frame.present();
        self.pacer.end_frame(submission);

        Ok(())
    }

    /// Waits out all in-flight frames. Call before dropping GPU resources.
    pub fn wait_idle(&mut self, gpu: &GpuContext) {
        self.pacer.drain(&mut DeviceFence::new(gpu));
        gpu.wait_idle();
    }

    /// Ensures the scene has a fallback texture and every material is
    /// finalized into the binding table.
    fn finalize_scene(&mut self, gpu: &GpuContext, scene: &mut Scene) {
        let fallback = match self.fallback_texture {
            Some(id) => id,
            None => {
                let id = scene.add_texture(Texture::white(gpu));
                self.fallback_texture = Some(id);
                id
            }
        };
        scene.finalize_materials(fallback);
    }

    /// Builds (and caches) the group-2 bind group for every draw in the plan.
    fn ensure_texture_groups(&mut self, gpu: &GpuContext, scene: &Scene, plan: &DrawPlan) {
        let Some(fallback_id) = self.fallback_texture else {
            return;
        };
        let Some(fallback) = scene.texture(fallback_id) else {
            return;
        };

        if self.fallback_bind_group.is_none() {
            let views = [&fallback.view; MAX_MATERIAL_TEXTURES];
            self.fallback_bind_group = Some(texture_bind_group(
                gpu,
                &self.texture_layout,
                &self.sampler,
                views,
                "Fallback Texture Table",
            ));
        }

        let Some(table) = scene.binding_table() else {
            return;
        };

        for command in &plan.commands {
            if command.table_handle.is_null()
                || self.texture_groups.contains_key(&command.table_handle)
            {
                continue;
            }

            let range = table.range(command.table_handle, command.table_len);
            let mut views = [&fallback.view; MAX_MATERIAL_TEXTURES];
            for (slot, texture_id) in range.iter().enumerate().take(MAX_MATERIAL_TEXTURES) {
                if let Some(texture) = scene.texture(*texture_id) {
                    views[slot] = &texture.view;
                }
            }

            let group = texture_bind_group(
                gpu,
                &self.texture_layout,
                &self.sampler,
                views,
                "Material Texture Table",
            );
            self.texture_groups.insert(command.table_handle, group);
        }
    }

    fn ensure_depth(&mut self, gpu: &GpuContext) {
        let size = (gpu.width(), gpu.height());
        if size != self.depth_size {
            let (view, size) = create_depth(gpu);
            self.depth_view = view;
            self.depth_size = size;
        }
    }
}

fn dynamic_uniform_layout(
    gpu: &GpuContext,
    visibility: wgpu::ShaderStages,
    size: u64,
    label: &str,
) -> wgpu::BindGroupLayout {
    gpu.device
        .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(size),
                },
                count: None,
            }],
        })
}

fn ring_bind_group(
    gpu: &GpuContext,
    layout: &wgpu::BindGroupLayout,
    ring: &UniformRing,
    block_size: u64,
    label: &str,
) -> wgpu::BindGroup {
    gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: ring.buffer(),
                offset: 0,
                size: wgpu::BufferSize::new(block_size),
            }),
        }],
    })
}

fn texture_bind_group(
    gpu: &GpuContext,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    views: [&wgpu::TextureView; MAX_MATERIAL_TEXTURES],
    label: &str,
) -> wgpu::BindGroup {
    let mut entries = Vec::with_capacity(MAX_MATERIAL_TEXTURES + 1);
    for (slot, view) in views.iter().enumerate() {
        entries.push(wgpu::BindGroupEntry {
            binding: slot as u32,
            resource: wgpu::BindingResource::TextureView(view),
        });
    }
    entries.push(wgpu::BindGroupEntry {
        binding: MAX_MATERIAL_TEXTURES as u32,
        resource: wgpu::BindingResource::Sampler(sampler),
    });

    gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &entries,
    })
}

fn create_depth(gpu: &GpuContext) -> (wgpu::TextureView, (u32, u32)) {
    let size = (gpu.width().max(1), gpu.height().max(1));
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Buffer"),
        size: wgpu::Extent3d {
            width: size.0,
            height: size.1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (view, size)
}

fn create_pipeline(
    gpu: &GpuContext,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    label: &str,
) -> wgpu::RenderPipeline {
    gpu.device
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Vertex3d::LAYOUT],
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::LightRig;
    use crate::material::Material;
    use glam::Vec3;

    /// The stock demo layout: three entities in a row, five lights.
    fn demo_scene() -> Scene {
        let mut scene = Scene::new();
        let mat = scene.add_material(Material::new(PipelineId::DEFAULT));
        scene.spawn_at(MeshId(0), mat, Vec3::new(-2.5, 0.0, 0.0));
        scene.spawn_at(MeshId(0), mat, Vec3::ZERO);
        scene.spawn_at(MeshId(0), mat, Vec3::new(2.5, 0.0, 0.0));
        *scene.lights_mut() = LightRig::demo_rig();
        scene
    }

    #[test]
    fn plan_captures_every_entity_in_order() {
        let mut scene = demo_scene();
        let camera = Camera::demo(16.0 / 9.0);
        let plan = DrawPlan::build(&mut scene, &camera);

        assert_eq!(plan.commands.len(), 3);
        let xs: Vec<f32> = plan
            .commands
            .iter()
            .map(|c| c.vertex_uniforms.world[3][0])
            .collect();
        assert_eq!(xs, vec![-2.5, 0.0, 2.5]);
    }

    #[test]
    fn plan_snapshots_camera_and_lights() {
        let mut scene = demo_scene();
        let camera = Camera::demo(16.0 / 9.0);
        let plan = DrawPlan::build(&mut scene, &camera);

        for command in &plan.commands {
            assert_eq!(command.pixel_uniforms.light_count, 5);
            assert_eq!(command.pixel_uniforms.camera_position, [0.0, 0.0, -10.0]);
            assert_eq!(
                command.vertex_uniforms.view,
                camera.view_matrix().to_cols_array_2d()
            );
            assert_eq!(
                command.vertex_uniforms.projection,
                camera.projection_matrix().to_cols_array_2d()
            );
        }
    }

    #[test]
    fn plan_carries_finalized_table_handles() {
        let mut scene = Scene::new();
        let mut a = Material::new(PipelineId::DEFAULT);
        a.add_texture(TextureId(1), 0);
        a.add_texture(TextureId(2), 1);
        let a = scene.add_material(a);

        let mut b = Material::new(PipelineId::DEFAULT);
        b.add_texture(TextureId(3), 0);
        let b = scene.add_material(b);

        scene.spawn(MeshId(0), a);
        scene.spawn(MeshId(0), b);
        scene.finalize_materials(TextureId(0));

        let camera = Camera::demo(1.0);
        let plan = DrawPlan::build(&mut scene, &camera);

        assert_eq!(plan.commands.len(), 2);
        assert!(!plan.commands[0].table_handle.is_null());
        assert!(!plan.commands[1].table_handle.is_null());
        assert_ne!(plan.commands[0].table_handle, plan.commands[1].table_handle);
        assert_eq!(plan.commands[0].table_len, 2);
        assert_eq!(plan.commands[1].table_len, 1);
    }

    #[test]
    fn plan_keeps_null_handle_for_unfinalized_materials() {
        let mut scene = demo_scene();
        let camera = Camera::demo(1.0);
        let plan = DrawPlan::build(&mut scene, &camera);
        for command in &plan.commands {
            assert!(command.table_handle.is_null());
            assert_eq!(command.table_len, 0);
        }
    }

    #[test]
    fn plan_refreshes_stale_world_matrices() {
        let mut scene = demo_scene();
        let camera = Camera::demo(1.0);

        let id = crate::entity::EntityId(1);
        scene
            .entity_mut(id)
            .unwrap()
            .transform_mut()
            .set_position(Vec3::new(0.0, 7.0, 0.0));

        let plan = DrawPlan::build(&mut scene, &camera);
        assert_eq!(plan.commands[1].vertex_uniforms.world[3][1], 7.0);
        assert!(!scene.entity(id).unwrap().transform().is_dirty());
    }
}
