//! Ray-traced rendering via wgpu's experimental acceleration structures.
//!
//! Mirrors the renderer's split: [`RayScenePlan::build`] is the pure CPU
//! step that groups entities by mesh into BLAS slots, flattens their world
//! matrices into instance transforms, and lays out the per-instance shading
//! records. [`RayTracer::render`] consumes a plan: it builds any BLASes not
//! yet on the GPU (each exactly once — meshes are static), rebuilds the TLAS
//! from scratch every frame, traces the scene from a compute shader with ray
//! queries into a storage image, and blits that image to the surface.
//!
//! Instance identity: an instance's 24-bit custom index is
//! `blas_slot * MAX_INSTANCES_PER_BLAS + instance_within_blas`, which doubles
//! as its index into the flat shading-record buffer.

use std::collections::HashMap;

use bytemuck::Zeroable;

use crate::camera::Camera;
use crate::gpu::GpuContext;
use crate::mesh::MeshId;
use crate::scene::Scene;
use crate::sync::{DeviceFence, FramePacer, FRAMES_IN_FLIGHT};
use crate::uniforms::{RayMaterialRecord, RaySceneUniforms};

/// Instances of one mesh beyond this are dropped from the traced scene.
pub const MAX_INSTANCES_PER_BLAS: usize = 100;

/// Hard cap on TLAS instances per frame.
pub const TLAS_CAPACITY: u32 = 1024;

/// Sentinel for unused entries in a record's `texture_indices`.
pub const NO_TEXTURE: u32 = u32::MAX;

#[derive(Debug, thiserror::Error)]
pub enum RayTraceError {
    #[error("device was created without the ray-tracing features")]
    Unsupported,
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

/// One TLAS instance, CPU side.
#[derive(Clone, Copy, Debug)]
pub struct RayInstance {
    pub mesh: MeshId,
    /// Row-major 3x4 world transform, the acceleration-structure layout.
    pub transform: [f32; 12],
    pub custom_index: u32,
}

/// A frame's traced scene, assembled without touching the GPU.
#[derive(Clone, Debug)]
pub struct RayScenePlan {
    /// Meshes in BLAS-slot order; slot i is `blas_order[i]`.
    pub blas_order: Vec<MeshId>,
    pub instances: Vec<RayInstance>,
    /// `blas_order.len() * MAX_INSTANCES_PER_BLAS` records, addressed by
    /// instance custom index. Slots with no instance stay zeroed.
    pub records: Vec<RayMaterialRecord>,
    pub uniforms: RaySceneUniforms,
}

impl RayScenePlan {
    /// Groups the scene's entities into BLAS slots and instance records.
    ///
    /// Entities sharing a mesh share a BLAS slot; the slot's instance count
    /// caps at [`MAX_INSTANCES_PER_BLAS`] and overflow is dropped with a
    /// warning rather than corrupting a neighbouring slot's records.
    pub fn build(scene: &mut Scene, camera: &Camera) -> Self {
        let uniforms = RaySceneUniforms::new(
            camera.view_matrix(),
            camera.projection_matrix(),
            camera.transform().position(),
        );

        let mut blas_order: Vec<MeshId> = Vec::new();
        let mut slot_of: HashMap<MeshId, usize> = HashMap::new();
        let mut counts: Vec<usize> = Vec::new();
        let mut instances = Vec::new();
        let mut records: Vec<RayMaterialRecord> = Vec::new();

        for i in 0..scene.entity_count() {
            let id = crate::entity::EntityId(i);
            let Some(entity) = scene.entity(id) else {
                continue;
            };
            let mesh = entity.mesh();
            let material_id = entity.material();
            let Some(material) = scene.material(material_id) else {
                continue;
            };

            let mut texture_indices = [NO_TEXTURE; 4];
            if let Some(table) = scene.binding_table() {
                let range = table.range(material.binding_table_handle(), material.table_len());
                for (slot, texture) in range.iter().enumerate().take(4) {
                    texture_indices[slot] = texture.0 as u32;
                }
            }
            let record = RayMaterialRecord {
                color: material.color_tint().to_array(),
                roughness: material.roughness(),
                uv_scale: material.uv_scale().to_array(),
                uv_offset: material.uv_offset().to_array(),
                metalness: material.metalness(),
                _pad: [0.0; 3],
                texture_indices,
            };

            let slot = *slot_of.entry(mesh).or_insert_with(|| {
                blas_order.push(mesh);
                counts.push(0);
                records.resize(blas_order.len() * MAX_INSTANCES_PER_BLAS, RayMaterialRecord::zeroed());
                blas_order.len() - 1
            });

            if counts[slot] >= MAX_INSTANCES_PER_BLAS {
                log::warn!(
                    "mesh {mesh:?} exceeds {MAX_INSTANCES_PER_BLAS} traced instances, dropping entity {i}"
                );
                continue;
            }
            let custom_index = (slot * MAX_INSTANCES_PER_BLAS + counts[slot]) as u32;
            counts[slot] += 1;

            let Some(entity) = scene.entity_mut(id) else {
                continue;
            };
            let world = entity.transform_mut().world_matrix();
            let mut transform = [0.0f32; 12];
            transform[0..4].copy_from_slice(&world.row(0).to_array());
            transform[4..8].copy_from_slice(&world.row(1).to_array());
            transform[8..12].copy_from_slice(&world.row(2).to_array());

            records[custom_index as usize] = record;
            instances.push(RayInstance {
                mesh,
                transform,
                custom_index,
            });
        }

        Self {
            blas_order,
            instances,
            records,
            uniforms,
        }
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn blas_count(&self) -> usize {
        self.blas_order.len()
    }
}

/// The traced-path renderer: TLAS, trace pipeline, storage image, blit.
pub struct RayTracer {
    tlas: wgpu::Tlas,
    live_instances: usize,

    trace_layout: wgpu::BindGroupLayout,
    trace_pipeline: wgpu::ComputePipeline,
    uniform_buffer: wgpu::Buffer,
    record_buffer: wgpu::Buffer,
    record_capacity: usize,

    output_view: wgpu::TextureView,
    output_size: (u32, u32),

    blit_layout: wgpu::BindGroupLayout,
    blit_pipeline: wgpu::RenderPipeline,
    blit_sampler: wgpu::Sampler,

    pacer: FramePacer<wgpu::SubmissionIndex>,
}

impl RayTracer {
    /// Creates the tracer. Fails if the context lacks the acceleration
    /// structure and ray-query features (see
    /// [`GpuOptions::raytracing`](crate::GpuOptions)).
    pub fn new(gpu: &GpuContext) -> Result<Self, RayTraceError> {
        if !gpu.supports_raytracing() {
            return Err(RayTraceError::Unsupported);
        }

        let tlas = gpu.device.create_tlas(&wgpu::CreateTlasDescriptor {
            label: Some("Scene TLAS"),
            max_instances: TLAS_CAPACITY,
            flags: wgpu::AccelerationStructureFlags::PREFER_FAST_TRACE,
            update_mode: wgpu::AccelerationStructureUpdateMode::Build,
        });

        let trace_layout = gpu
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Trace Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::AccelerationStructure {
                            vertex_return: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<
                                RaySceneUniforms,
                            >()
                                as u64),
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: true },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 3,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::StorageTexture {
                            access: wgpu::StorageTextureAccess::WriteOnly,
                            format: wgpu::TextureFormat::Rgba8Unorm,
                            view_dimension: wgpu::TextureViewDimension::D2,
                        },
                        count: None,
                    },
                ],
            });

        let trace_shader = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Trace Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("shaders/raytrace.wgsl").into()),
            });
        let trace_pipeline_layout =
            gpu.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("Trace Pipeline Layout"),
                    bind_group_layouts: &[&trace_layout],
                    push_constant_ranges: &[],
                });
        let trace_pipeline =
            gpu.device
                .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some("Trace Pipeline"),
                    layout: Some(&trace_pipeline_layout),
                    module: &trace_shader,
                    entry_point: Some("trace"),
                    compilation_options: Default::default(),
                    cache: None,
                });

        let uniform_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Ray Scene Uniforms"),
            size: std::mem::size_of::<RaySceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let record_capacity = MAX_INSTANCES_PER_BLAS;
        let record_buffer = create_record_buffer(gpu, record_capacity);

        let (output_view, output_size) = create_output(gpu);

        let blit_layout = gpu
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Blit Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });
        let blit_shader = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Blit Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
            });
        let blit_pipeline_layout =
            gpu.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("Blit Pipeline Layout"),
                    bind_group_layouts: &[&blit_layout],
                    push_constant_ranges: &[],
                });
        let blit_pipeline =
            gpu.device
                .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("Blit Pipeline"),
                    layout: Some(&blit_pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &blit_shader,
                        entry_point: Some("vs_main"),
                        compilation_options: Default::default(),
                        buffers: &[],
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &blit_shader,
                        entry_point: Some("fs_main"),
                        compilation_options: Default::default(),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: gpu.config.format,
                            blend: None,
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                    }),
                    primitive: wgpu::PrimitiveState::default(),
                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                    cache: None,
                });
        let blit_sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Blit Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Ok(Self {
            tlas,
            live_instances: 0,
            trace_layout,
            trace_pipeline,
            uniform_buffer,
            record_buffer,
            record_capacity,
            output_view,
            output_size,
            blit_layout,
            blit_pipeline,
            blit_sampler,
            pacer: FramePacer::new(FRAMES_IN_FLIGHT),
        })
    }

    /// Traces one frame of `scene` through `camera` and presents it.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        scene: &mut Scene,
        camera: &Camera,
    ) -> Result<(), RayTraceError> {
        self.pacer.begin_frame(&mut DeviceFence::new(gpu));

        let plan = RayScenePlan::build(scene, camera);

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

        self.ensure_output(gpu);

        // Attach BLAS records before taking any immutable borrows of the
        // scene; the actual builds are encoded below.
        for mesh_id in &plan.blas_order {
            if let Some(mesh) = scene.mesh_mut(*mesh_id) {
                mesh.ensure_blas(gpu);
            }
        }

        // Encode a build for every BLAS that has never been built.
        let mut blas_builds = Vec::new();
        for mesh_id in &plan.blas_order {
            let Some(mesh) = scene.mesh(*mesh_id) else {
                continue;
            };
            let Some(record) = mesh.raytracing.as_ref() else {
                continue;
            };
            if record.built {
                continue;
            }
            blas_builds.push(wgpu::BlasBuildEntry {
                blas: &record.blas,
                geometry: wgpu::BlasGeometries::TriangleGeometries(vec![
                    wgpu::BlasTriangleGeometry {
                        size: &record.size,
                        vertex_buffer: &mesh.vertex_buffer,
                        first_vertex: 0,
                        vertex_stride: std::mem::size_of::<crate::mesh::Vertex3d>() as u64,
                        index_buffer: Some(&mesh.index_buffer),
                        first_index: Some(0),
                        transform_buffer: None,
                        transform_buffer_offset: None,
                    },
                ]),
            });
        }

        // Rewrite the TLAS instance list from the plan.
        for i in 0..self.live_instances {
            self.tlas[i] = None;
        }
        let mut live = 0;
        for instance in &plan.instances {
            if live as u32 >= TLAS_CAPACITY {
                log::warn!("TLAS capacity {TLAS_CAPACITY} exceeded, dropping remaining instances");
                break;
            }
            let Some(mesh) = scene.mesh(instance.mesh) else {
                continue;
            };
            let Some(record) = mesh.raytracing.as_ref() else {
                continue;
            };
            self.tlas[live] = Some(wgpu::TlasInstance::new(
                &record.blas,
                instance.transform,
                instance.custom_index,
                0xff,
            ));
            live += 1;
        }
        self.live_instances = live;

        gpu.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&plan.uniforms),
        );
        if plan.records.len() > self.record_capacity {
            self.record_capacity = plan.records.len();
            self.record_buffer = create_record_buffer(gpu, self.record_capacity);
        }
        if !plan.records.is_empty() {
            gpu.queue
                .write_buffer(&self.record_buffer, 0, bytemuck::cast_slice(&plan.records));
        }

        let trace_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Trace Bind Group"),
            layout: &self.trace_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::AccelerationStructure(&self.tlas),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.record_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&self.output_view),
                },
            ],
        });
        let blit_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Blit Bind Group"),
            layout: &self.blit_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&self.output_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.blit_sampler),
                },
            ],
        });

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Trace Encoder"),
            });

        encoder.build_acceleration_structures(blas_builds.iter(), std::iter::once(&self.tlas));
        drop(blas_builds);

        {
            let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Trace Pass"),
                timestamp_writes: None,
            });
            cpass.set_pipeline(&self.trace_pipeline);
            cpass.set_bind_group(0, &trace_group, &[]);
            cpass.dispatch_workgroups(
                self.output_size.0.div_ceil(8),
                self.output_size.1.div_ceil(8),
                1,
            );
        }

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Blit Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_pipeline(&self.blit_pipeline);
            rpass.set_bind_group(0, &blit_group, &[]);
            rpass.draw(0..3, 0..1);
        }

        let submission = gpu.queue.submit(Some(encoder.finish()));
        frame.present();
        self.pacer.end_frame(submission);

        // The builds just submitted cover these meshes for good.
        for mesh_id in &plan.blas_order {
            if let Some(mesh) = scene.mesh_mut(*mesh_id) {
                if let Some(record) = mesh.raytracing.as_mut() {
                    record.built = true;
                }
            }
        }

        Ok(())
    }

    /// Waits out all in-flight frames.
    pub fn wait_idle(&mut self, gpu: &GpuContext) {
        self.pacer.drain(&mut DeviceFence::new(gpu));
        gpu.wait_idle();
    }

    fn ensure_output(&mut self, gpu: &GpuContext) {
        let size = (gpu.width().max(1), gpu.height().max(1));
        if size != self.output_size {
            let (view, size) = create_output(gpu);
            self.output_view = view;
            self.output_size = size;
        }
    }
}

fn create_record_buffer(gpu: &GpuContext, capacity: usize) -> wgpu::Buffer {
    gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Ray Material Records"),
        size: (capacity * std::mem::size_of::<RayMaterialRecord>()) as u64,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_output(gpu: &GpuContext) -> (wgpu::TextureView, (u32, u32)) {
    let size = (gpu.width().max(1), gpu.height().max(1));
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Trace Output"),
        size: wgpu::Extent3d {
            width: size.0,
            height: size.1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (view, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{Material, PipelineId};
    use glam::Vec3;

    fn scene_with_one_material() -> (Scene, crate::material::MaterialId) {
        let mut scene = Scene::new();
        let mat = scene.add_material(
            Material::new(PipelineId::DEFAULT).with_color_tint(Vec3::new(1.0, 0.5, 0.25)),
        );
        (scene, mat)
    }

    #[test]
    fn shared_meshes_share_a_blas_slot() {
        let (mut scene, mat) = scene_with_one_material();
        scene.spawn(MeshId(0), mat);
        scene.spawn(MeshId(0), mat);
        scene.spawn(MeshId(1), mat);

        let camera = Camera::demo(1.0);
        let plan = RayScenePlan::build(&mut scene, &camera);

        assert_eq!(plan.blas_count(), 2);
        assert_eq!(plan.instance_count(), 3);
        assert_eq!(plan.instances[0].custom_index, 0);
        assert_eq!(plan.instances[1].custom_index, 1);
        assert_eq!(
            plan.instances[2].custom_index,
            MAX_INSTANCES_PER_BLAS as u32
        );
    }

    #[test]
    fn records_follow_custom_indices() {
        let (mut scene, red) = scene_with_one_material();
        let blue = scene.add_material(
            Material::new(PipelineId::DEFAULT).with_color_tint(Vec3::new(0.0, 0.0, 1.0)),
        );
        scene.spawn(MeshId(0), red);
        scene.spawn(MeshId(1), blue);

        let camera = Camera::demo(1.0);
        let plan = RayScenePlan::build(&mut scene, &camera);

        assert_eq!(plan.records.len(), 2 * MAX_INSTANCES_PER_BLAS);
        assert_eq!(plan.records[0].color, [1.0, 0.5, 0.25]);
        assert_eq!(
            plan.records[MAX_INSTANCES_PER_BLAS].color,
            [0.0, 0.0, 1.0]
        );
        // Unoccupied record slots stay zeroed.
        assert_eq!(plan.records[1].color, [0.0; 3]);
    }

    #[test]
    fn instance_transforms_are_row_major_world_matrices() {
        let (mut scene, mat) = scene_with_one_material();
        let id = scene.spawn_at(MeshId(0), mat, Vec3::new(1.0, 2.0, 3.0));
        scene
            .entity_mut(id)
            .unwrap()
            .transform_mut()
            .set_scale(Vec3::splat(2.0));

        let camera = Camera::demo(1.0);
        let plan = RayScenePlan::build(&mut scene, &camera);

        let t = plan.instances[0].transform;
        // Row-major 3x4: translation sits in each row's last column.
        assert_eq!([t[3], t[7], t[11]], [1.0, 2.0, 3.0]);
        assert_eq!([t[0], t[5], t[10]], [2.0, 2.0, 2.0]);
    }

    #[test]
    fn instances_beyond_the_blas_cap_are_dropped() {
        let (mut scene, mat) = scene_with_one_material();
        for _ in 0..MAX_INSTANCES_PER_BLAS + 7 {
            scene.spawn(MeshId(0), mat);
        }

        let camera = Camera::demo(1.0);
        let plan = RayScenePlan::build(&mut scene, &camera);

        assert_eq!(plan.instance_count(), MAX_INSTANCES_PER_BLAS);
        assert_eq!(plan.records.len(), MAX_INSTANCES_PER_BLAS);
    }

    #[test]
    fn moving_an_entity_moves_its_instance() {
        let (mut scene, mat) = scene_with_one_material();
        let id = scene.spawn(MeshId(0), mat);
        let camera = Camera::demo(1.0);

        let before = RayScenePlan::build(&mut scene, &camera);
        scene
            .entity_mut(id)
            .unwrap()
            .transform_mut()
            .move_absolute(Vec3::new(0.0, 4.0, 0.0));
        let after = RayScenePlan::build(&mut scene, &camera);

        assert_eq!(before.instances[0].transform[7], 0.0);
        assert_eq!(after.instances[0].transform[7], 4.0);
        // Same mesh, same slot, same identity.
        assert_eq!(
            before.instances[0].custom_index,
            after.instances[0].custom_index
        );
    }
}
