//! Which interactive node is selected, and its highlight.

use crate::gfx::scene::{color_from_hex, NodeId, Scene};

use super::registry::Registry;

/// Emissive intensity of a selected light proxy
pub const LIGHT_HIGHLIGHT_INTENSITY: f32 = 2.0;
/// Flat emissive tint of a selected model part
pub const MODEL_HIGHLIGHT_EMISSIVE: u32 = 0x333333;

/// Material state saved before highlighting, restored on deselect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Highlight {
    LightProxy { baseline_intensity: f32 },
    ModelPart { baseline_emissive: [f32; 3] },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Selection {
    #[default]
    Idle,
    Selected { node: NodeId, highlight: Highlight },
}

impl Selection {
    pub fn selected(&self) -> Option<NodeId> {
        match self {
            Selection::Idle => None,
            Selection::Selected { node, .. } => Some(*node),
        }
    }

    /// Runs a click transition. `hit` is the nearest interactive node under
    /// the pointer. Returns the node that is selected afterwards.
    pub fn click(
        &mut self,
        hit: Option<NodeId>,
        scene: &mut Scene,
        registry: &Registry,
    ) -> Option<NodeId> {
        self.clear(scene);
        let node = hit?;
        let is_light = registry.lookup(node)?.is_light();
        let material = &mut scene
            .graph
            .get_mut(node)?
            .as_mesh_mut()?
            .material;

        let highlight = if is_light {
            let baseline_intensity = material.emissive_intensity;
            material.emissive_intensity = LIGHT_HIGHLIGHT_INTENSITY;
            Highlight::LightProxy { baseline_intensity }
        } else {
            let baseline_emissive = material.emissive;
            material.emissive = color_from_hex(MODEL_HIGHLIGHT_EMISSIVE);
            Highlight::ModelPart { baseline_emissive }
        };

        log::debug!("Selected {}", node);
        *self = Selection::Selected { node, highlight };
        Some(node)
    }

    /// Restores the highlighted material and returns to idle.
    pub fn clear(&mut self, scene: &mut Scene) {
        let Selection::Selected { node, highlight } = std::mem::take(self) else {
            return;
        };
        log::debug!("Deselected {}", node);

        let Some(mesh) = scene.graph.get_mut(node).and_then(|n| n.as_mesh_mut()) else {
            return;
        };
        match highlight {
            Highlight::LightProxy { baseline_intensity } => {
                mesh.material.emissive_intensity = baseline_intensity;
            }
            Highlight::ModelPart { baseline_emissive } => {
                mesh.material.emissive = baseline_emissive;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::registry::RegistryEntry;
    use crate::gfx::{
        geometry::generate_sphere,
        scene::{Material, MeshData, Node, NodeKind},
    };
    use std::sync::Arc;

    fn sphere_node(material: Material) -> Node {
        Node::mesh(
            "sphere",
            Arc::new(MeshData::from_geometry("sphere", &generate_sphere(0.2, 8, 8))),
            material,
        )
    }

    fn setup() -> (Scene, Registry, NodeId, NodeId) {
        let mut scene = Scene::new([0.0; 3]);
        let mut registry = Registry::new();

        let light = scene.graph.insert(None, Node::new("light", NodeKind::Group));
        let proxy = scene
            .graph
            .insert(Some(light), sphere_node(Material::emissive([1.0; 3], 1.0)));
        registry.register(proxy, RegistryEntry::light(light, light)).unwrap();

        let part = scene
            .graph
            .insert(None, sphere_node(Material::new([1.0; 3], 0.0, 0.5)));
        registry.register(part, RegistryEntry::model("duck.obj", None)).unwrap();

        (scene, registry, proxy, part)
    }

    fn material(scene: &Scene, id: NodeId) -> &Material {
        &scene.graph.get(id).unwrap().as_mesh().unwrap().material
    }

    #[test]
    fn test_select_then_deselect_restores_baseline() {
        let (mut scene, registry, proxy, part) = setup();
        let mut selection = Selection::default();

        assert_eq!(selection.click(Some(proxy), &mut scene, &registry), Some(proxy));
        assert_eq!(material(&scene, proxy).emissive_intensity, 2.0);

        // Switching to the model part clears the light highlight first.
        selection.click(Some(part), &mut scene, &registry);
        assert_eq!(material(&scene, proxy).emissive_intensity, 1.0);
        assert_eq!(material(&scene, part).emissive, color_from_hex(0x333333));

        assert_eq!(selection.click(None, &mut scene, &registry), None);
        assert_eq!(material(&scene, part).emissive, [0.0; 3]);
        assert_eq!(selection, Selection::Idle);
    }

    #[test]
    fn test_reclicking_selection_does_not_stack_highlight() {
        let (mut scene, registry, proxy, _) = setup();
        let mut selection = Selection::default();
        selection.click(Some(proxy), &mut scene, &registry);
        selection.click(Some(proxy), &mut scene, &registry);
        selection.clear(&mut scene);
        assert_eq!(material(&scene, proxy).emissive_intensity, 1.0);
    }

    #[test]
    fn test_unregistered_hit_selects_nothing() {
        let (mut scene, registry, _, _) = setup();
        let ground = scene.ground();
        let mut selection = Selection::default();
        assert_eq!(selection.click(Some(ground), &mut scene, &registry), None);
        assert_eq!(selection.selected(), None);
    }
}
