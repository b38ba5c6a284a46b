//! GPU textures and the handles materials store in their slot tables.

use crate::gpu::GpuContext;

/// Handle to a texture stored in a [`Scene`](crate::Scene).
///
/// Newtype wrapper so texture indices cannot be confused with mesh or
/// material indices at compile time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub(crate) usize);

/// A GPU texture with a shader-visible view.
#[derive(Debug)]
pub struct Texture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Creates a texture from raw RGBA8 data.
    pub fn from_rgba(gpu: &GpuContext, data: &[u8], width: u32, height: u32, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            width,
            height,
        }
    }

    /// Loads a texture from an image file.
    pub fn from_file(gpu: &GpuContext, path: &str) -> Result<Self, image::ImageError> {
        let img = image::open(path)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba(gpu, &img, width, height, path))
    }

    /// Loads a texture from encoded bytes (PNG, JPEG, ...).
    pub fn from_bytes(
        gpu: &GpuContext,
        bytes: &[u8],
        label: &str,
    ) -> Result<Self, image::ImageError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba(gpu, &img, width, height, label))
    }

    /// A 1x1 opaque white texture; the fallback bound wherever a material
    /// leaves a slot empty.
    pub fn white(gpu: &GpuContext) -> Self {
        Self::from_rgba(gpu, &[255, 255, 255, 255], 1, 1, "White Fallback Texture")
    }

    /// A two-tone checkerboard, handy for eyeballing uv transforms.
    pub fn checkerboard(gpu: &GpuContext, size: u32, cell: u32) -> Self {
        let cell = cell.max(1);
        let mut data = vec![0u8; (size * size * 4) as usize];
        for y in 0..size {
            for x in 0..size {
                let idx = ((y * size + x) * 4) as usize;
                let dark = ((x / cell) + (y / cell)) % 2 == 0;
                let v = if dark { 60 } else { 220 };
                data[idx] = v;
                data[idx + 1] = v;
                data[idx + 2] = v;
                data[idx + 3] = 255;
            }
        }
        Self::from_rgba(gpu, &data, size, size, "Checkerboard Texture")
    }
}
