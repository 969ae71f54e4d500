//! Static asset tables: model presets and the named texture sets.

use std::f32::consts::{FRAC_PI_2, TAU};

use rand::Rng;

use crate::gfx::scene::{color_from_hex, Material, Transform};

/// Directory under the asset root holding every OBJ file
pub const MODELS_DIR: &str = "models";

/// How a preset's freshly placed copies are oriented.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PresetRotation {
    None,
    /// Stand the model up from a Z-up export
    UprightX,
    /// Random heading about Y
    RandomY,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialPreset {
    pub color: u32,
    pub metalness: f32,
    pub roughness: f32,
}

impl MaterialPreset {
    pub fn material(&self) -> Material {
        Material::new(color_from_hex(self.color), self.metalness, self.roughness)
    }
}

/// Extra texture slots a character model is shipped with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetailMap {
    Bump { path: &'static str, scale: f32 },
    Normal { path: &'static str, scale: f32 },
}

impl DetailMap {
    pub fn path(&self) -> &'static str {
        match self {
            DetailMap::Bump { path, .. } | DetailMap::Normal { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPreset {
    pub name: &'static str,
    /// File name inside [`MODELS_DIR`]
    pub file: &'static str,
    pub scale: f32,
    pub material: MaterialPreset,
    pub diffuse: Option<&'static str>,
    pub detail: Option<DetailMap>,
    pub rotation: PresetRotation,
}

impl ModelPreset {
    /// Path of the OBJ relative to the asset root
    pub fn model_path(&self) -> String {
        format!("{}/{}", MODELS_DIR, self.file)
    }

    /// Every texture the preset needs before it can be placed.
    pub fn texture_paths(&self) -> impl Iterator<Item = &'static str> {
        self.diffuse
            .into_iter()
            .chain(self.detail.map(|detail| detail.path()))
    }

    /// A placement transform for the Add buttons: random spot on the ground.
    pub fn random_placement(&self, rng: &mut impl Rng) -> Transform {
        let x = rng.random_range(-2.0..2.0);
        let z = rng.random_range(-2.0..2.0);
        let transform = Transform::from_position(x, 0.0, z);
        match self.rotation {
            PresetRotation::None => transform,
            PresetRotation::UprightX => transform.with_rotation(-FRAC_PI_2, 0.0, 0.0),
            PresetRotation::RandomY => transform.with_rotation(0.0, rng.random_range(0.0..TAU), 0.0),
        }
    }
}

pub const CAT: ModelPreset = ModelPreset {
    name: "Cat",
    file: "cat.obj",
    scale: 0.03,
    material: MaterialPreset {
        color: 0xffffff,
        metalness: 0.1,
        roughness: 0.8,
    },
    diffuse: Some("textures/cat_diffuse.jpg"),
    detail: Some(DetailMap::Bump {
        path: "textures/cat_bump.jpg",
        scale: 0.05,
    }),
    rotation: PresetRotation::UprightX,
};

pub const HUMAN: ModelPreset = ModelPreset {
    name: "Human",
    file: "human.obj",
    scale: 0.2,
    material: MaterialPreset {
        color: 0xcccccc,
        metalness: 0.2,
        roughness: 0.8,
    },
    diffuse: None,
    detail: None,
    rotation: PresetRotation::None,
};

pub const MALE: ModelPreset = ModelPreset {
    name: "Male",
    file: "male.obj",
    scale: 0.022,
    material: MaterialPreset {
        color: 0xffffff,
        metalness: 0.2,
        roughness: 0.8,
    },
    diffuse: Some("textures/male_diffuse.jpg"),
    detail: Some(DetailMap::Normal {
        path: "textures/male_normal.jpg",
        scale: 0.5,
    }),
    rotation: PresetRotation::RandomY,
};

pub const FEMALE: ModelPreset = ModelPreset {
    name: "Female",
    file: "female.obj",
    scale: 0.022,
    material: MaterialPreset {
        color: 0xffffff,
        metalness: 0.0,
        roughness: 0.5,
    },
    diffuse: Some("textures/female_diffuse.jpg"),
    detail: Some(DetailMap::Normal {
        path: "textures/female_normal.jpg",
        scale: 1.0,
    }),
    rotation: PresetRotation::RandomY,
};

pub const DUCK: ModelPreset = ModelPreset {
    name: "Duck",
    file: "duck.obj",
    scale: 0.015,
    material: MaterialPreset {
        color: 0xffffff,
        metalness: 0.0,
        roughness: 0.5,
    },
    diffuse: Some("textures/duck_diffuse.jpg"),
    detail: None,
    rotation: PresetRotation::UprightX,
};

/// Presets in the order the Add buttons show them
pub const MODEL_PRESETS: [ModelPreset; 5] = [CAT, HUMAN, MALE, FEMALE, DUCK];

/// Session start batch with fixed placements: (preset, position, XYZ rotation)
pub const INITIAL_MODELS: [(ModelPreset, [f32; 3], [f32; 3]); 4] = [
    (CAT, [-2.0, 0.0, -2.0], [-FRAC_PI_2, 0.0, 0.0]),
    (MALE, [-2.0, 0.0, 2.0], [0.0, std::f32::consts::FRAC_PI_4, 0.0]),
    (FEMALE, [2.0, 0.0, 2.0], [0.0, -std::f32::consts::FRAC_PI_4, 0.0]),
    (DUCK, [2.0, 0.0, -2.0], [-FRAC_PI_2, 0.0, 0.0]),
];

/// Choice label meaning "no texture" in every table
pub const NONE_TEXTURE: &str = "None";

/// Name to path tables. `None` maps to no texture.
pub type TextureTable = &'static [(&'static str, Option<&'static str>)];

pub const OBJECT_TEXTURES: TextureTable = &[
    (NONE_TEXTURE, None),
    ("Bricks", Some("textures/extra/bricks.jpg")),
    ("Grass", Some("textures/extra/grass.jpg")),
    ("Water", Some("textures/extra/water.jpg")),
    ("Wood", Some("textures/extra/wood.jpg")),
    ("Cat", Some("textures/cat_diffuse.jpg")),
    ("Duck", Some("textures/duck_diffuse.jpg")),
    ("Female", Some("textures/female_diffuse.jpg")),
    ("Male", Some("textures/male_diffuse.jpg")),
];

pub const SURFACE_TEXTURES: TextureTable = &[
    (NONE_TEXTURE, None),
    ("Bricks", Some("textures/extra/bricks.jpg")),
    ("Grass", Some("textures/extra/grass.jpg")),
    ("Water", Some("textures/extra/water.jpg")),
    ("Wood", Some("textures/extra/wood.jpg")),
];

pub const SCENE_TEXTURES: TextureTable = &[
    (NONE_TEXTURE, None),
    ("Sky", Some("textures/scene/sky-scene.jpg")),
    ("Space", Some("textures/scene/space-scene.jpg")),
];

/// Finds a table entry by its display name.
pub fn texture_by_name(
    table: TextureTable,
    name: &str,
) -> Option<(&'static str, Option<&'static str>)> {
    table.iter().copied().find(|(entry, _)| *entry == name)
}

/// Name of the entry whose path is exactly `path`, if any.
pub fn texture_name_for_path(table: TextureTable, path: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(_, entry)| *entry == Some(path))
        .map(|(name, _)| *name)
}

pub fn texture_names(table: TextureTable) -> Vec<&'static str> {
    table.iter().map(|(name, _)| *name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_name_lookup_is_exact() {
        assert_eq!(
            texture_name_for_path(OBJECT_TEXTURES, "textures/duck_diffuse.jpg"),
            Some("Duck")
        );
        // No substring matching: a different directory is a different texture.
        assert_eq!(
            texture_name_for_path(OBJECT_TEXTURES, "other/textures/duck_diffuse.jpg"),
            None
        );
        assert_eq!(texture_by_name(SCENE_TEXTURES, NONE_TEXTURE), Some((NONE_TEXTURE, None)));
    }

    #[test]
    fn test_character_presets_list_their_maps() {
        let paths: Vec<_> = CAT.texture_paths().collect();
        assert_eq!(paths, vec!["textures/cat_diffuse.jpg", "textures/cat_bump.jpg"]);
        assert_eq!(HUMAN.texture_paths().count(), 0);
        assert_eq!(DUCK.model_path(), "models/duck.obj");
    }

    #[test]
    fn test_random_placement_stays_on_the_ground() {
        let mut rng = rand::rng();
        for preset in MODEL_PRESETS {
            let transform = preset.random_placement(&mut rng);
            assert_eq!(transform.position.y, 0.0);
            assert!((-2.0..2.0).contains(&transform.position.x));
            assert!((-2.0..2.0).contains(&transform.position.z));
            if preset.rotation == PresetRotation::UprightX {
                assert_eq!(transform.rotation.x, -FRAC_PI_2);
            }
        }
    }
}
