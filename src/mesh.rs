//! GPU-resident mesh geometry and its optional ray-tracing record.
//!
//! A [`Mesh`] owns immutable vertex/index buffers built once from a
//! [`RawGeometry`]. When the device was created with ray tracing enabled, a
//! mesh can additionally carry a [`MeshBlas`]: the bottom-level acceleration
//! structure over its triangles plus the geometry descriptor needed to build
//! it. The BLAS is attached lazily — meshes that are never traced never pay
//! for one — and built exactly once, since mesh geometry never deforms.

use glam::Vec3;

use crate::geometry::{GeometryError, RawGeometry};
use crate::gpu::GpuContext;

/// Handle to a mesh stored in a [`Scene`](crate::Scene).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub(crate) usize);

/// A vertex with position, normal, and texture coordinates: 32 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex3d {
    /// Vertex buffer layout: position (loc 0), normal (loc 1), uv (loc 2).
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Per-mesh ray-tracing record: the bottom-level acceleration structure and
/// the descriptors the scene builder needs to (re)reference it.
pub struct MeshBlas {
    pub(crate) blas: wgpu::Blas,
    pub(crate) size: wgpu::BlasTriangleGeometrySizeDescriptor,
    /// Set by the ray tracer after the one-time build is submitted.
    pub(crate) built: bool,
}

/// GPU mesh geometry, immutable after construction.
pub struct Mesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
    pub(crate) vertex_count: u32,
    pub(crate) raytracing: Option<MeshBlas>,
}

impl Mesh {
    /// Uploads raw geometry to GPU buffers.
    ///
    /// On ray-tracing-capable devices the buffers are additionally flagged as
    /// acceleration-structure build inputs so a BLAS can attach later.
    pub fn from_raw(gpu: &GpuContext, geometry: &RawGeometry) -> Self {
        use wgpu::util::DeviceExt;

        let blas_input = if gpu.supports_raytracing() {
            wgpu::BufferUsages::BLAS_INPUT
        } else {
            wgpu::BufferUsages::empty()
        };

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(&geometry.vertices),
                usage: wgpu::BufferUsages::VERTEX | blas_input,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(&geometry.indices),
                usage: wgpu::BufferUsages::INDEX | blas_input,
            });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices.len() as u32,
            vertex_count: geometry.vertices.len() as u32,
            raytracing: None,
        }
    }

    /// Loads a mesh from a model file (see [`RawGeometry::from_file`]).
    pub fn from_file(gpu: &GpuContext, path: &str) -> Result<Self, GeometryError> {
        let geometry = RawGeometry::from_file(path)?;
        Ok(Self::from_raw(gpu, &geometry))
    }

    /// A unit cube centered at the origin.
    pub fn cube(gpu: &GpuContext) -> Self {
        Self::from_raw(gpu, &cube_geometry())
    }

    /// A UV sphere of diameter 1 centered at the origin.
    pub fn sphere(gpu: &GpuContext, segments: u32, rings: u32) -> Self {
        Self::from_raw(gpu, &sphere_geometry(segments, rings))
    }

    /// A square XZ ground plane with +Y normals.
    pub fn plane(gpu: &GpuContext, size: f32) -> Self {
        Self::from_raw(gpu, &plane_geometry(size))
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Whether a BLAS record is attached.
    pub fn has_blas(&self) -> bool {
        self.raytracing.is_some()
    }

    /// Attaches the ray-tracing record on first use and returns it.
    ///
    /// The BLAS handle is created here; the actual GPU build is submitted by
    /// the ray tracer the first time the mesh appears in a traced scene.
    /// Calling this on a device without the ray-tracing features is a
    /// programming error.
    pub fn ensure_blas(&mut self, gpu: &GpuContext) -> &MeshBlas {
        debug_assert!(
            gpu.supports_raytracing(),
            "ensure_blas requires a ray-tracing device"
        );

        if self.raytracing.is_none() {
            let size = wgpu::BlasTriangleGeometrySizeDescriptor {
                vertex_format: wgpu::VertexFormat::Float32x3,
                vertex_count: self.vertex_count,
                index_format: Some(wgpu::IndexFormat::Uint32),
                index_count: Some(self.index_count),
                flags: wgpu::AccelerationStructureGeometryFlags::OPAQUE,
            };

            let blas = gpu.device.create_blas(
                &wgpu::CreateBlasDescriptor {
                    label: Some("Mesh BLAS"),
                    flags: wgpu::AccelerationStructureFlags::PREFER_FAST_TRACE,
                    update_mode: wgpu::AccelerationStructureUpdateMode::Build,
                },
                wgpu::BlasGeometrySizeDescriptors::Triangles {
                    descriptors: vec![size.clone()],
                },
            );

            self.raytracing = Some(MeshBlas {
                blas,
                size,
                built: false,
            });
        }

        self.raytracing.as_ref().expect("just attached")
    }
}

/// Unit cube: 4 vertices per face for hard normals, CCW winding.
pub(crate) fn cube_geometry() -> RawGeometry {
    // (normal, face u axis, face v axis); cross(u, v) == normal keeps the
    // winding counter-clockwise from outside.
    const FACES: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    ];
    const CORNERS: [(f32, f32, [f32; 2]); 4] = [
        (-0.5, -0.5, [0.0, 0.0]),
        (0.5, -0.5, [1.0, 0.0]),
        (0.5, 0.5, [1.0, 1.0]),
        (-0.5, 0.5, [0.0, 1.0]),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in FACES {
        let base = vertices.len() as u32;
        for (du, dv, uv) in CORNERS {
            let p = normal * 0.5 + u * du + v * dv;
            vertices.push(Vertex3d::new(p.into(), normal.into(), uv));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    RawGeometry::new(vertices, indices)
}

/// Latitude/longitude sphere of radius 0.5 with equirectangular UVs.
pub(crate) fn sphere_geometry(segments: u32, rings: u32) -> RawGeometry {
    let segments = segments.max(3);
    let rings = rings.max(2);

    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for ring in 0..=rings {
        let phi = std::f32::consts::PI * ring as f32 / rings as f32;
        let y = phi.cos();
        let ring_radius = phi.sin();

        for seg in 0..=segments {
            let theta = std::f32::consts::TAU * seg as f32 / segments as f32;
            let normal = Vec3::new(ring_radius * theta.cos(), y, ring_radius * theta.sin());
            let uv = [seg as f32 / segments as f32, ring as f32 / rings as f32];
            vertices.push(Vertex3d::new((normal * 0.5).into(), normal.into(), uv));
        }
    }

    for ring in 0..rings {
        for seg in 0..segments {
            let current = ring * (segments + 1) + seg;
            let next = current + segments + 1;
            indices.extend_from_slice(&[current, next, current + 1]);
            indices.extend_from_slice(&[current + 1, next, next + 1]);
        }
    }

    RawGeometry::new(vertices, indices)
}

pub(crate) fn plane_geometry(size: f32) -> RawGeometry {
    let half = size * 0.5;
    let up = [0.0, 1.0, 0.0];
    let vertices = vec![
        Vertex3d::new([-half, 0.0, -half], up, [0.0, 0.0]),
        Vertex3d::new([half, 0.0, -half], up, [1.0, 0.0]),
        Vertex3d::new([half, 0.0, half], up, [1.0, 1.0]),
        Vertex3d::new([-half, 0.0, half], up, [0.0, 1.0]),
    ];
    let indices = vec![0, 1, 2, 2, 3, 0];
    RawGeometry::new(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_32_bytes() {
        assert_eq!(std::mem::size_of::<Vertex3d>(), 32);
    }

    #[test]
    fn cube_has_24_vertices_12_triangles() {
        let cube = cube_geometry();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);

        // Every position sits on the surface of the unit cube.
        for v in &cube.vertices {
            let p = Vec3::from(v.position).abs();
            assert!((p.max_element() - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn cube_normals_point_outward() {
        let cube = cube_geometry();
        for tri in cube.indices.chunks_exact(3) {
            let p0 = Vec3::from(cube.vertices[tri[0] as usize].position);
            let p1 = Vec3::from(cube.vertices[tri[1] as usize].position);
            let p2 = Vec3::from(cube.vertices[tri[2] as usize].position);
            let face = (p1 - p0).cross(p2 - p0);
            let stored = Vec3::from(cube.vertices[tri[0] as usize].normal);
            assert!(face.dot(stored) > 0.0, "winding disagrees with normal");
        }
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let sphere = sphere_geometry(16, 8);
        for v in &sphere.vertices {
            let r = Vec3::from(v.position).length();
            assert!((r - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn plane_spans_requested_size() {
        let plane = plane_geometry(10.0);
        let (min, max) = plane.bounds();
        assert_eq!(min, Vec3::new(-5.0, 0.0, -5.0));
        assert_eq!(max, Vec3::new(5.0, 0.0, 5.0));
    }
}
