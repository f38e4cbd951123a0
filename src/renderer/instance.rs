//! Instance data for point rendering

use bytemuck::{Pod, Zeroable};

/// One instanced quad/box: where, how big, which way, what colour
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PointInstance {
    pub position: [f32; 2],
    pub scale: f32,
    pub rotation: f32,
    pub color: [f32; 4],
}

impl PointInstance {
    /// Floats per instance when flattened for upload
    pub const FLOATS: usize = std::mem::size_of::<PointInstance>() / std::mem::size_of::<f32>();

    pub const fn new(x: f32, y: f32, scale: f32, rotation: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            scale,
            rotation,
            color,
        }
    }
}

/// Colors for scene elements
pub mod colors {
    use crate::consts::MAP_BASELINE_RGB;

    pub const MAP_BASELINE: [f32; 4] = [MAP_BASELINE_RGB[0], MAP_BASELINE_RGB[1], MAP_BASELINE_RGB[2], 1.0];
    pub const CURSOR: [f32; 4] = [1.0, 1.0, 1.0, 0.9];

    /// Opaque RGBA from an RGB triple
    #[inline]
    pub fn opaque(rgb: [f32; 3]) -> [f32; 4] {
        [rgb[0], rgb[1], rgb[2], 1.0]
    }
}
