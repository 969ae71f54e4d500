use std::{f32::consts::FRAC_PI_2, sync::Arc};

use crate::{
    assets::texture::TextureHandle,
    gfx::geometry::{generate_grid_lines, generate_plane},
};

use super::{
    graph::SceneGraph,
    light::{AmbientLight, DirectionalLight, SpotLight},
    material::{color_from_hex, Material, TextureMap},
    mesh::{MeshData, Topology},
    node::{MeshNode, Node, NodeId, NodeKind, Transform},
};

pub const GROUND_SIZE: f32 = 20.0;
pub const GROUND_COLOR: u32 = 0x333333;
pub const GRID_DIVISIONS: u32 = 20;
pub const GRID_COLOR: u32 = 0x444444;
/// Repeat count applied when a surface texture is first chosen
pub const SURFACE_TEXTURE_REPEAT: f32 = 4.0;

/// What fills the screen behind the scene.
#[derive(Debug, Clone)]
pub enum Background {
    Color([f32; 3]),
    Texture(TextureHandle),
}

/// The world: node hierarchy plus the fixed lights, ground and grid.
pub struct Scene {
    pub graph: SceneGraph,
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    pub background: Background,
    background_color: [f32; 3],
    ground: NodeId,
    grid: NodeId,
    scene_light: f32,
}

fn ground_material() -> Material {
    Material::new(color_from_hex(GROUND_COLOR), 0.2, 0.8)
}

impl Scene {
    /// Creates a scene with the ground plane, grid helper and default lights.
    pub fn new(background_color: [f32; 3]) -> Self {
        let mut graph = SceneGraph::new();

        let plane = MeshData::from_geometry(
            "ground",
            &generate_plane(GROUND_SIZE, GROUND_SIZE, 1, 1),
        );
        let ground = graph.insert(
            None,
            Node::mesh("Ground", Arc::new(plane), ground_material())
                .with_transform(Transform::default().with_rotation(-FRAC_PI_2, 0.0, 0.0))
                .with_shadows(false, true),
        );

        let grid_geometry = generate_grid_lines(GROUND_SIZE, GRID_DIVISIONS);
        let (vertices, indices) = grid_geometry.to_scene_format();
        let grid_mesh = MeshData::with_topology("grid", vertices, indices, Topology::Lines);
        let grid = graph.insert(
            None,
            Node::mesh(
                "Grid",
                Arc::new(grid_mesh),
                Material::new(color_from_hex(GRID_COLOR), 0.0, 1.0),
            ),
        );

        let mut scene = Self {
            graph,
            ambient: AmbientLight {
                color: [1.0, 1.0, 1.0],
                intensity: 0.5,
            },
            directional: DirectionalLight {
                color: [1.0, 1.0, 1.0],
                intensity: 1.0,
                position: [5.0, 5.0, 5.0],
                cast_shadow: true,
            },
            background: Background::Color(background_color),
            background_color,
            ground,
            grid,
            scene_light: 1.0,
        };
        scene.set_scene_light(1.0);
        scene
    }

    pub fn ground(&self) -> NodeId {
        self.ground
    }

    pub fn grid(&self) -> NodeId {
        self.grid
    }

    pub fn scene_light(&self) -> f32 {
        self.scene_light
    }

    /// Scales the fixed lights: ambient gets half of `value`, directional all of it.
    pub fn set_scene_light(&mut self, value: f32) {
        self.scene_light = value;
        self.ambient.intensity = value * 0.5;
        self.directional.intensity = value;
    }

    pub fn surface_visible(&self) -> bool {
        self.graph.get(self.ground).is_some_and(|n| n.visible)
    }

    pub fn set_surface_visible(&mut self, visible: bool) {
        for id in [self.ground, self.grid] {
            if let Some(node) = self.graph.get_mut(id) {
                node.visible = visible;
            }
        }
    }

    /// Puts a tiled texture on the ground, or restores the plain surface.
    pub fn set_surface_texture(&mut self, texture: Option<TextureHandle>) {
        let material = match texture {
            Some(texture) => Material::new([1.0, 1.0, 1.0], 0.2, 0.8)
                .with_map(TextureMap::repeating(texture, SURFACE_TEXTURE_REPEAT)),
            None => ground_material(),
        };
        if let Some(mesh) = self.graph.get_mut(self.ground).and_then(Node::as_mesh_mut) {
            mesh.material.replace(material);
        }
    }

    /// Changes the surface texture tiling. Returns false without a texture.
    pub fn set_surface_repeat(&mut self, repeat: f32) -> bool {
        self.graph
            .get_mut(self.ground)
            .and_then(Node::as_mesh_mut)
            .is_some_and(|mesh| mesh.material.set_map_repeat(repeat))
    }

    pub fn background_color(&self) -> [f32; 3] {
        self.background_color
    }

    /// Changes the clear colour and drops any background texture.
    pub fn set_background_color(&mut self, color: [f32; 3]) {
        self.background_color = color;
        self.background = Background::Color(color);
    }

    /// Shows a texture behind the scene, or falls back to the clear colour.
    pub fn set_background_texture(&mut self, texture: Option<TextureHandle>) {
        self.background = match texture {
            Some(texture) => Background::Texture(texture),
            None => Background::Color(self.background_color),
        };
    }

    /// Spotlights whose whole ancestry is visible.
    pub fn spot_lights(&self) -> impl Iterator<Item = (NodeId, &SpotLight)> + '_ {
        self.graph
            .iter_depth_first()
            .filter(|node| self.graph.is_visible(node.id()))
            .filter_map(|node| node.as_spot_light().map(|light| (node.id(), light)))
    }

    /// Visible mesh parts in draw order.
    pub fn visible_meshes(&self) -> impl Iterator<Item = (NodeId, &Node, &MeshNode)> + '_ {
        self.graph
            .iter_depth_first()
            .filter(|node| self.graph.is_visible(node.id()))
            .filter_map(|node| node.as_mesh().map(|mesh| (node.id(), node, mesh)))
    }

    /// Total triangle count of all mesh parts, for the stats overlay.
    pub fn triangle_count(&self) -> usize {
        self.graph
            .iter_depth_first()
            .filter_map(|node| match &node.kind {
                NodeKind::Mesh(mesh) => Some(mesh.mesh.triangle_count()),
                _ => None,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    #[test]
    fn test_scene_light_scales_fixed_lights() {
        let mut scene = Scene::new(color_from_hex(0x2a2a2a));
        scene.set_scene_light(2.0);
        assert_eq!(scene.ambient.intensity, 1.0);
        assert_eq!(scene.directional.intensity, 2.0);
    }

    #[test]
    fn test_ground_lies_flat() {
        let scene = Scene::new([0.0; 3]);
        let world = scene.graph.world_matrix(scene.ground()).unwrap();
        let normal = (world * cgmath::Vector4::new(0.0, 0.0, 1.0, 0.0)).truncate();
        assert!((normal - cgmath::Vector3::new(0.0, 1.0, 0.0)).magnitude() < 1e-5);
    }

    #[test]
    fn test_surface_toggle_hides_ground_and_grid() {
        let mut scene = Scene::new([0.0; 3]);
        let meshes = scene.visible_meshes().count();
        scene.set_surface_visible(false);
        assert!(!scene.surface_visible());
        assert_eq!(scene.visible_meshes().count(), meshes - 2);
    }

    #[test]
    fn test_surface_repeat_needs_texture() {
        let mut scene = Scene::new([0.0; 3]);
        assert!(!scene.set_surface_repeat(3.0));
    }

    #[test]
    fn test_background_color_without_texture() {
        let mut scene = Scene::new([0.0; 3]);
        scene.set_background_color([1.0, 0.0, 0.0]);
        assert!(matches!(scene.background, Background::Color(c) if c == [1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_background_color_replaces_texture() {
        let mut scene = Scene::new([0.0; 3]);
        let sky = Arc::new(crate::assets::texture::TextureData::solid("sky", [0, 0, 255, 255]));
        scene.set_background_texture(Some(sky));
        assert!(matches!(scene.background, Background::Texture(_)));

        scene.set_background_color([0.0, 1.0, 0.0]);
        assert!(matches!(scene.background, Background::Color(c) if c == [0.0, 1.0, 0.0]));
    }
}
