//! Scene lighting: an ergonomic tagged light type and its flat GPU layout.
//!
//! Lights are authored as the [`Light`] sum type and serialized into the
//! fixed [`GpuLight`] wire layout only when packed into a [`LightRig`]. The
//! rig is the fixed-capacity array shared by every draw in a frame; it is
//! written at scene-setup time and read-only while rendering.

use bytemuck::Zeroable;
use glam::Vec3;

/// Maximum number of lights uploaded per frame. Pushes beyond this are
/// silently dropped.
pub const MAX_LIGHTS: usize = 128;

pub(crate) const LIGHT_TYPE_DIRECTIONAL: i32 = 0;
pub(crate) const LIGHT_TYPE_POINT: i32 = 1;
pub(crate) const LIGHT_TYPE_SPOT: i32 = 2;

/// A single light source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Light {
    /// Parallel rays from a direction, e.g. the sun.
    Directional {
        direction: Vec3,
        color: Vec3,
        intensity: f32,
    },
    /// Omnidirectional light with a falloff range.
    Point {
        position: Vec3,
        range: f32,
        color: Vec3,
        intensity: f32,
    },
    /// A cone of light; `spot_falloff` shapes the cone edge.
    Spot {
        position: Vec3,
        direction: Vec3,
        range: f32,
        color: Vec3,
        intensity: f32,
        spot_falloff: f32,
    },
}

impl Light {
    /// Serializes to the flat GPU layout.
    pub fn pack(&self) -> GpuLight {
        let mut packed = GpuLight::zeroed();
        match *self {
            Light::Directional {
                direction,
                color,
                intensity,
            } => {
                packed.light_type = LIGHT_TYPE_DIRECTIONAL;
                packed.direction = direction.to_array();
                packed.color = color.to_array();
                packed.intensity = intensity;
            }
            Light::Point {
                position,
                range,
                color,
                intensity,
            } => {
                packed.light_type = LIGHT_TYPE_POINT;
                packed.position = position.to_array();
                packed.range = range;
                packed.color = color.to_array();
                packed.intensity = intensity;
            }
            Light::Spot {
                position,
                direction,
                range,
                color,
                intensity,
                spot_falloff,
            } => {
                packed.light_type = LIGHT_TYPE_SPOT;
                packed.position = position.to_array();
                packed.direction = direction.to_array();
                packed.range = range;
                packed.color = color.to_array();
                packed.intensity = intensity;
                packed.spot_falloff = spot_falloff;
            }
        }
        packed
    }
}

/// Wire layout of one light: 64 bytes, 16-byte-aligned fields, copied
/// verbatim into the pixel-stage constant block.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuLight {
    pub light_type: i32,
    pub direction: [f32; 3],
    pub range: f32,
    pub position: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    pub spot_falloff: f32,
    pub _padding: [f32; 3],
}

/// A fixed-capacity array of packed lights shared by all entities.
#[derive(Clone)]
pub struct LightRig {
    lights: [GpuLight; MAX_LIGHTS],
    count: u32,
}

impl Default for LightRig {
    fn default() -> Self {
        Self {
            lights: [GpuLight::zeroed(); MAX_LIGHTS],
            count: 0,
        }
    }
}

impl LightRig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a light. A full rig ignores the push.
    pub fn push(&mut self, light: Light) {
        let Some(slot) = self.lights.get_mut(self.count as usize) else {
            return;
        };
        *slot = light.pack();
        self.count += 1;
    }

    /// Number of active lights.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// The full fixed-size packed array (inactive entries are zeroed).
    pub fn packed(&self) -> &[GpuLight; MAX_LIGHTS] {
        &self.lights
    }

    pub fn clear(&mut self) {
        self.lights = [GpuLight::zeroed(); MAX_LIGHTS];
        self.count = 0;
    }

    /// The stock five-light rig: three white directionals and two points.
    pub fn demo_rig() -> Self {
        let mut rig = Self::new();
        rig.push(Light::Directional {
            direction: Vec3::new(1.0, -1.0, 0.0),
            color: Vec3::ONE,
            intensity: 1.0,
        });
        rig.push(Light::Directional {
            direction: Vec3::new(1.0, 0.0, 0.0),
            color: Vec3::ONE,
            intensity: 1.0,
        });
        rig.push(Light::Directional {
            direction: Vec3::new(0.0, 1.0, 1.0),
            color: Vec3::ONE,
            intensity: 1.0,
        });
        rig.push(Light::Point {
            position: Vec3::new(0.0, 10.0, 0.0),
            range: 20.0,
            color: Vec3::ONE,
            intensity: 1.0,
        });
        rig.push(Light::Point {
            position: Vec3::new(-2.5, 0.0, 0.0),
            range: 5.0,
            color: Vec3::ONE,
            intensity: 1.0,
        });
        rig
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_light_is_64_bytes() {
        assert_eq!(std::mem::size_of::<GpuLight>(), 64);
    }

    #[test]
    fn pack_preserves_variant_fields() {
        let spot = Light::Spot {
            position: Vec3::new(1.0, 2.0, 3.0),
            direction: Vec3::new(0.0, -1.0, 0.0),
            range: 8.0,
            color: Vec3::new(1.0, 0.5, 0.25),
            intensity: 2.0,
            spot_falloff: 10.0,
        };
        let packed = spot.pack();
        assert_eq!(packed.light_type, LIGHT_TYPE_SPOT);
        assert_eq!(packed.position, [1.0, 2.0, 3.0]);
        assert_eq!(packed.direction, [0.0, -1.0, 0.0]);
        assert_eq!(packed.range, 8.0);
        assert_eq!(packed.spot_falloff, 10.0);

        let dir = Light::Directional {
            direction: Vec3::X,
            color: Vec3::ONE,
            intensity: 1.0,
        };
        let packed = dir.pack();
        assert_eq!(packed.light_type, LIGHT_TYPE_DIRECTIONAL);
        // Fields the variant does not carry stay zeroed.
        assert_eq!(packed.position, [0.0; 3]);
        assert_eq!(packed.range, 0.0);
    }

    #[test]
    fn rig_ignores_overflow() {
        let mut rig = LightRig::new();
        for _ in 0..MAX_LIGHTS + 10 {
            rig.push(Light::Directional {
                direction: Vec3::NEG_Y,
                color: Vec3::ONE,
                intensity: 1.0,
            });
        }
        assert_eq!(rig.count(), MAX_LIGHTS as u32);
    }

    #[test]
    fn demo_rig_matches_stock_scene() {
        let rig = LightRig::demo_rig();
        assert_eq!(rig.count(), 5);
        let packed = rig.packed();
        assert_eq!(packed[0].light_type, LIGHT_TYPE_DIRECTIONAL);
        assert_eq!(packed[3].light_type, LIGHT_TYPE_POINT);
        assert_eq!(packed[4].position, [-2.5, 0.0, 0.0]);
    }
}
