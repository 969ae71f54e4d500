//! Material definitions for scene meshes
//!
//! Each mesh node owns its material outright. The renderer watches
//! [`Material::revision`] to know when texture bindings must be rebuilt.

use crate::assets::texture::TextureHandle;

/// Converts a `0xRRGGBB` colour into normalised RGB components.
pub fn color_from_hex(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

/// Texture addressing mode outside the [0, 1] UV range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wrap {
    #[default]
    Clamp,
    Repeat,
}

/// A texture bound to a material slot together with its addressing state.
#[derive(Debug, Clone)]
pub struct TextureMap {
    pub texture: TextureHandle,
    pub wrap: Wrap,
    pub repeat: [f32; 2],
}

impl TextureMap {
    /// Clamped, unscaled map as produced straight out of the loader
    pub fn new(texture: TextureHandle) -> Self {
        Self {
            texture,
            wrap: Wrap::Clamp,
            repeat: [1.0, 1.0],
        }
    }

    /// Tiled map with the same repeat count on both axes
    pub fn repeating(texture: TextureHandle, repeat: f32) -> Self {
        Self {
            texture,
            wrap: Wrap::Repeat,
            repeat: [repeat, repeat],
        }
    }

    pub fn source_path(&self) -> &str {
        self.texture.path()
    }
}

/// Metal/rough surface description used by every lit mesh.
#[derive(Debug, Clone)]
pub struct Material {
    pub color: [f32; 3],
    pub metalness: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
    pub map: Option<TextureMap>,
    pub bump_map: Option<TextureMap>,
    pub bump_scale: f32,
    pub normal_map: Option<TextureMap>,
    pub normal_scale: [f32; 2],
    revision: u64,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            metalness: 0.0,
            roughness: 1.0,
            emissive: [0.0, 0.0, 0.0],
            emissive_intensity: 1.0,
            map: None,
            bump_map: None,
            bump_scale: 1.0,
            normal_map: None,
            normal_scale: [1.0, 1.0],
            revision: 0,
        }
    }
}

impl Material {
    pub fn new(color: [f32; 3], metalness: f32, roughness: f32) -> Self {
        Self {
            color,
            metalness: metalness.clamp(0.0, 1.0),
            roughness: roughness.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    /// Black, self-lit material used by light proxies
    pub fn emissive(color: [f32; 3], intensity: f32) -> Self {
        Self {
            color: [0.0, 0.0, 0.0],
            emissive: color,
            emissive_intensity: intensity,
            ..Default::default()
        }
    }

    pub fn with_map(mut self, map: TextureMap) -> Self {
        self.set_map(Some(map));
        self
    }

    pub fn with_bump_map(mut self, map: TextureMap, scale: f32) -> Self {
        self.bump_map = Some(map);
        self.bump_scale = scale;
        self.mark_dirty();
        self
    }

    pub fn with_normal_map(mut self, map: TextureMap, scale: [f32; 2]) -> Self {
        self.normal_map = Some(map);
        self.normal_scale = scale;
        self.mark_dirty();
        self
    }

    /// Replaces (or clears) the diffuse map
    pub fn set_map(&mut self, map: Option<TextureMap>) {
        self.map = map;
        self.mark_dirty();
    }

    /// Sets the diffuse map repeat count; a no-op without a map.
    pub fn set_map_repeat(&mut self, repeat: f32) -> bool {
        match self.map.as_mut() {
            Some(map) => {
                map.repeat = [repeat, repeat];
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    /// Swaps in a whole new material, keeping the revision moving forward.
    pub fn replace(&mut self, mut other: Material) {
        other.revision = self.revision.max(other.revision) + 1;
        *self = other;
    }

    /// Signals that texture bindings changed and GPU state must be rebuilt.
    pub fn mark_dirty(&mut self) {
        self.revision += 1;
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_conversion() {
        assert_eq!(color_from_hex(0xff0000), [1.0, 0.0, 0.0]);
        let grey = color_from_hex(0x333333);
        assert!((grey[0] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_repeat_without_map_is_ignored() {
        let mut material = Material::new([0.8, 0.8, 0.8], 0.2, 0.8);
        let before = material.revision();
        assert!(!material.set_map_repeat(4.0));
        assert_eq!(material.revision(), before);
    }
}
