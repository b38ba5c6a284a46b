//! CPU-side geometry: raw vertex/index arrays and STL model loading.
//!
//! [`RawGeometry`] is the intermediate representation between a model file
//! (or procedural generator) and a GPU [`Mesh`](crate::Mesh). Model parsing
//! is deliberately thin — STL via `stl_io` — because asset loading is a
//! collaborator of the renderer, not part of it.

use glam::Vec3;
use std::path::Path;

use crate::mesh::Vertex3d;

/// Errors from geometry loading.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown geometry format: '{0}'")]
    UnknownFormat(String),
    #[error("parse error: {0}")]
    Parse(String),
}

/// Vertex/index arrays before GPU upload.
#[derive(Clone, Debug)]
pub struct RawGeometry {
    pub vertices: Vec<Vertex3d>,
    pub indices: Vec<u32>,
}

impl RawGeometry {
    pub fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Loads geometry from a file, detecting the format from the extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GeometryError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "stl" => Self::from_stl_file(path),
            _ => Err(GeometryError::UnknownFormat(ext)),
        }
    }

    /// Loads an STL file (binary or ASCII).
    pub fn from_stl_file(path: impl AsRef<Path>) -> Result<Self, GeometryError> {
        let file = std::fs::File::open(path)?;
        let mut reader = std::io::BufReader::new(file);
        Self::parse_stl(&mut reader)
    }

    /// Parses STL geometry from bytes (`include_bytes!` assets).
    pub fn from_stl_bytes(bytes: &[u8]) -> Result<Self, GeometryError> {
        let mut cursor = std::io::Cursor::new(bytes);
        Self::parse_stl(&mut cursor)
    }

    fn parse_stl<R: std::io::Read + std::io::Seek>(reader: &mut R) -> Result<Self, GeometryError> {
        let stl = stl_io::read_stl(reader)
            .map_err(|e| GeometryError::Parse(format!("STL parse error: {e}")))?;

        let mut vertices = Vec::with_capacity(stl.faces.len() * 3);
        let mut indices = Vec::with_capacity(stl.faces.len() * 3);

        for (i, face) in stl.faces.iter().enumerate() {
            let normal: [f32; 3] = face.normal.into();
            for &vertex_idx in &face.vertices {
                let position: [f32; 3] = stl.vertices[vertex_idx].into();
                // STL carries no UVs.
                vertices.push(Vertex3d::new(position, normal, [0.0, 0.0]));
            }
            let base = (i * 3) as u32;
            indices.extend_from_slice(&[base, base + 1, base + 2]);
        }

        Ok(Self::new(vertices, indices))
    }

    /// Axis-aligned bounding box as `(min, max)`.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for v in &self.vertices {
            let p = Vec3::from(v.position);
            min = min.min(p);
            max = max.max(p);
        }
        (min, max)
    }

    pub fn center(&self) -> Vec3 {
        let (min, max) = self.bounds();
        (min + max) * 0.5
    }

    /// Translates every vertex by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        for v in &mut self.vertices {
            v.position[0] += offset.x;
            v.position[1] += offset.y;
            v.position[2] += offset.z;
        }
    }

    /// Uniformly scales every vertex around the origin.
    pub fn scale(&mut self, factor: f32) {
        for v in &mut self.vertices {
            v.position[0] *= factor;
            v.position[1] *= factor;
            v.position[2] *= factor;
        }
    }

    /// Moves the bounding-box center to the origin.
    pub fn recenter(&mut self) {
        let center = self.center();
        self.translate(-center);
    }

    /// Recomputes smooth vertex normals by area-weighted averaging of the
    /// face normals sharing each vertex. Useful for STL input, which only
    /// has per-face normals.
    pub fn recalculate_normals(&mut self) {
        for v in &mut self.vertices {
            v.normal = [0.0, 0.0, 0.0];
        }

        for tri in self.indices.chunks_exact(3) {
            let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let p0 = Vec3::from(self.vertices[i0].position);
            let p1 = Vec3::from(self.vertices[i1].position);
            let p2 = Vec3::from(self.vertices[i2].position);
            let face_normal = (p1 - p0).cross(p2 - p0);

            for &i in &[i0, i1, i2] {
                self.vertices[i].normal[0] += face_normal.x;
                self.vertices[i].normal[1] += face_normal.y;
                self.vertices[i].normal[2] += face_normal.z;
            }
        }

        for v in &mut self.vertices {
            v.normal = Vec3::from(v.normal).normalize_or_zero().into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_geometry_bounds() {
        let vertices = vec![
            Vertex3d::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([-1.0, -1.0, -1.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        ];
        let geom = RawGeometry::new(vertices, vec![0, 1, 2]);

        let (min, max) = geom.bounds();
        assert_eq!(min, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn raw_geometry_recenter() {
        let vertices = vec![
            Vertex3d::new([2.0, 2.0, 2.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([4.0, 4.0, 4.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        ];
        let mut geom = RawGeometry::new(vertices, vec![0, 1, 0]);
        geom.recenter();
        assert!(geom.center().length() < 1e-3);
    }

    #[test]
    fn recalculated_normals_face_up_for_flat_triangle() {
        let vertices = vec![
            Vertex3d::new([0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([0.0, 0.0, 1.0], [0.0, 0.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0]),
        ];
        let mut geom = RawGeometry::new(vertices, vec![0, 1, 2]);
        geom.recalculate_normals();
        for v in &geom.vertices {
            assert!((Vec3::from(v.normal) - Vec3::Y).length() < 1e-6);
        }
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = RawGeometry::from_file("model.gltf").unwrap_err();
        assert!(matches!(err, GeometryError::UnknownFormat(ext) if ext == "gltf"));
    }
}
