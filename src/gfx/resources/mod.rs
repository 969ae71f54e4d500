//! GPU resource management
//!
//! Uniform layouts, bind groups and textures shared by the render passes.

pub mod global_bindings;
pub mod light_bindings;
pub mod object_bindings;
pub mod texture_resource;

pub use global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO};
pub use light_bindings::{LightBindings, ShadowViewUniform, SpotUniform};
pub use object_bindings::{ObjectBindings, ObjectUniform};
pub use texture_resource::{ImageTexture, TextureResource};

/// Converts an sRGB colour to linear space for shading.
pub fn linear_rgb(color: [f32; 3]) -> [f32; 3] {
    color.map(|c| {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::linear_rgb;

    #[test]
    fn test_linear_rgb_endpoints() {
        let ends = linear_rgb([0.0, 1.0, 0.0]);
        assert_eq!(ends[0], 0.0);
        assert!((ends[1] - 1.0).abs() < 1e-5);
        let mid = linear_rgb([0.5; 3])[0];
        assert!((mid - 0.214).abs() < 1e-3);
    }
}
