//! The "Selected Object" panel: field descriptors bound to one node.
//!
//! A panel is rebuilt from scratch whenever the selection changes. The UI
//! draws its folders, and every edit comes back through
//! [`PropertyPanel::apply`], which snaps the value to the field's range and
//! writes it to the scene.

use cgmath::{Deg, Rad};

use crate::{
    assets::{
        catalog::{self, NONE_TEXTURE, OBJECT_TEXTURES},
        AssetLoader, TextureRequest, TextureTarget,
    },
    gfx::scene::{NodeId, Scene},
};

use super::{
    light_rig,
    registry::{EntryKind, Registry},
};

/// Range and quantisation of a slider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub min: f32,
    pub max: f32,
    pub step: Option<f32>,
}

impl FieldSpec {
    pub const fn continuous(min: f32, max: f32) -> Self {
        Self {
            min,
            max,
            step: None,
        }
    }

    pub const fn stepped(min: f32, max: f32, step: f32) -> Self {
        Self {
            min,
            max,
            step: Some(step),
        }
    }

    /// Clamps into range, then rounds to the nearest step counted from `min`.
    pub fn snap(&self, value: f32) -> f32 {
        let clamped = value.clamp(self.min, self.max);
        match self.step {
            Some(step) if step > 0.0 => {
                let steps = ((clamped - self.min) / step).round();
                (self.min + steps * step).min(self.max)
            }
            _ => clamped,
        }
    }
}

const POSITION_XZ: FieldSpec = FieldSpec::stepped(-10.0, 10.0, 0.1);
const POSITION_Y: FieldSpec = FieldSpec::stepped(0.0, 10.0, 0.1);
const ROTATION: FieldSpec = FieldSpec::stepped(-180.0, 180.0, 1.0);
const SCALE: FieldSpec = FieldSpec::stepped(0.1, 2.0, 0.1);
const INTENSITY: FieldSpec = FieldSpec::continuous(0.0, 100.0);
const DISTANCE: FieldSpec = FieldSpec::continuous(0.0, 100.0);
const DECAY: FieldSpec = FieldSpec::continuous(0.0, 2.0);
const SHADOW_BLUR: FieldSpec = FieldSpec::continuous(0.0, 15.0);
const SHADOW_BIAS: FieldSpec = FieldSpec::stepped(-0.1, 0.1, 0.001);
const SHADOW_RESOLUTION: FieldSpec = FieldSpec::stepped(256.0, 2048.0, 256.0);
const SHADOW_NEAR: FieldSpec = FieldSpec::continuous(0.1, 10.0);
const CONE_ANGLE: FieldSpec = FieldSpec::continuous(0.0, 180.0);
const UNIT: FieldSpec = FieldSpec::continuous(0.0, 1.0);
const TEXTURE_SCALE: FieldSpec = FieldSpec::continuous(0.1, 10.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    PositionX,
    PositionY,
    PositionZ,
    RotationX,
    RotationY,
    RotationZ,
    Scale,
    Intensity,
    Distance,
    Decay,
    Color,
    ShadowBlur,
    ShadowBias,
    ShadowResolution,
    ShadowNear,
    Angle,
    Metalness(NodeId),
    Roughness(NodeId),
    Texture(NodeId),
    TextureScale(NodeId),
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    Slider(FieldSpec),
    Color,
    Choice(Vec<&'static str>),
    Action,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Number(f32),
    Color([f32; 3]),
    Choice(&'static str),
    Trigger,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub id: FieldId,
    pub label: &'static str,
    pub control: Control,
    pub value: FieldValue,
}

impl Field {
    fn slider(id: FieldId, label: &'static str, spec: FieldSpec, value: f32) -> Self {
        Self {
            id,
            label,
            control: Control::Slider(spec),
            value: FieldValue::Number(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Folder {
    pub title: &'static str,
    pub fields: Vec<Field>,
}

/// Which field set the panel was built with.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelKind {
    Model { parts: Vec<NodeId> },
    Light { light: NodeId, target: NodeId },
}

/// What the session must do after an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelOutcome {
    Applied,
    /// Unknown field or a value of the wrong shape
    Ignored,
    /// The Delete action fired; the panel must be torn down first
    Delete,
}

/// Everything an edit may touch.
pub struct PanelContext<'a> {
    pub scene: &'a mut Scene,
    pub registry: &'a mut Registry,
    pub loader: &'a mut AssetLoader,
}

#[derive(Debug, Clone)]
pub struct PropertyPanel {
    node: NodeId,
    kind: PanelKind,
    folders: Vec<Folder>,
}

impl PropertyPanel {
    /// Builds the panel for an interactive node. `None` for unregistered nodes.
    pub fn build(scene: &Scene, registry: &Registry, node: NodeId) -> Option<Self> {
        let entry = registry.lookup(node)?;
        let kind = match entry.kind {
            EntryKind::Light { light, target } => PanelKind::Light { light, target },
            EntryKind::Model { .. } => PanelKind::Model {
                parts: scene
                    .graph
                    .descendants(node)
                    .into_iter()
                    .filter(|&id| scene.graph.get(id).is_some_and(|n| n.as_mesh().is_some()))
                    .collect(),
            },
        };

        let mut panel = Self {
            node,
            kind,
            folders: Vec::new(),
        };
        let transform = panel.transform_folder(scene);
        panel.folders.push(transform);
        match &panel.kind {
            PanelKind::Light { light, .. } => {
                panel.folders.extend(light_folders(scene, node, *light));
            }
            PanelKind::Model { parts } => {
                panel.folders.extend(model_folders(scene, registry, parts));
            }
        }
        panel.folders.push(Folder {
            title: "Actions",
            fields: vec![Field {
                id: FieldId::Delete,
                label: "Delete",
                control: Control::Action,
                value: FieldValue::Trigger,
            }],
        });
        Some(panel)
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn kind(&self) -> &PanelKind {
        &self.kind
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.folders.iter().flat_map(|f| &f.fields).find(|f| f.id == id)
    }

    fn field_mut(&mut self, id: FieldId) -> Option<&mut Field> {
        self.folders
            .iter_mut()
            .flat_map(|f| &mut f.fields)
            .find(|f| f.id == id)
    }

    /// Node whose position the transform fields edit. Lights move as a whole.
    fn moved_node(&self) -> NodeId {
        match self.kind {
            PanelKind::Light { light, .. } => light,
            PanelKind::Model { .. } => self.node,
        }
    }

    fn transform_folder(&self, scene: &Scene) -> Folder {
        let moved = scene.graph.get(self.moved_node()).map(|n| n.transform);
        let own = scene.graph.get(self.node).map(|n| n.transform);
        let position = moved.map_or([0.0; 3], |t| t.position.into());
        let scale = own.map_or(1.0, |t| t.scale.x);
        let rotation = match self.kind {
            PanelKind::Light { light, target } => {
                light_rig::displayed_rotation(&scene.graph, light, target)
            }
            PanelKind::Model { .. } => own.map_or([0.0; 3], |t| {
                [t.rotation.x, t.rotation.y, t.rotation.z].map(|r| Deg::from(Rad(r)).0)
            }),
        };

        Folder {
            title: "Transform",
            fields: vec![
                Field::slider(FieldId::PositionX, "Position X", POSITION_XZ, position[0]),
                Field::slider(FieldId::PositionY, "Position Y", POSITION_Y, position[1]),
                Field::slider(FieldId::PositionZ, "Position Z", POSITION_XZ, position[2]),
                Field::slider(FieldId::RotationX, "Rotation X", ROTATION, rotation[0]),
                Field::slider(FieldId::RotationY, "Rotation Y", ROTATION, rotation[1]),
                Field::slider(FieldId::RotationZ, "Rotation Z", ROTATION, rotation[2]),
                Field::slider(FieldId::Scale, "Scale", SCALE, scale),
            ],
        }
    }

    /// Re-reads the transform folder after the node was moved elsewhere (drag).
    pub fn sync_transform(&mut self, scene: &Scene) {
        let folder = self.transform_folder(scene);
        if let Some(existing) = self.folders.iter_mut().find(|f| f.title == "Transform") {
            *existing = folder;
        }
    }

    /// Shows `name` in a part's texture selector, if this panel has one.
    pub fn set_texture_choice(&mut self, part: NodeId, name: &'static str) {
        if let Some(field) = self.field_mut(FieldId::Texture(part)) {
            field.value = FieldValue::Choice(name);
        }
    }

    /// Applies one edit from the UI.
    pub fn apply(&mut self, ctx: PanelContext<'_>, id: FieldId, value: FieldValue) -> PanelOutcome {
        let Some(field) = self.field_mut(id) else {
            return PanelOutcome::Ignored;
        };
        let value = match (&field.control, value) {
            (Control::Slider(spec), FieldValue::Number(v)) => FieldValue::Number(spec.snap(v)),
            (Control::Color, FieldValue::Color(c)) => FieldValue::Color(c),
            (Control::Choice(names), FieldValue::Choice(name)) if names.contains(&name) => {
                FieldValue::Choice(name)
            }
            (Control::Action, FieldValue::Trigger) => FieldValue::Trigger,
            _ => return PanelOutcome::Ignored,
        };
        field.value = value;

        match (id, value) {
            (FieldId::Delete, _) => PanelOutcome::Delete,
            (_, FieldValue::Number(v)) => self.apply_number(ctx, id, v),
            (FieldId::Color, FieldValue::Color(color)) => self.apply_color(ctx.scene, color),
            (FieldId::Texture(part), FieldValue::Choice(name)) => {
                request_part_texture(ctx, part, name)
            }
            _ => PanelOutcome::Ignored,
        }
    }

    fn apply_number(&mut self, ctx: PanelContext<'_>, id: FieldId, v: f32) -> PanelOutcome {
        let PanelContext { scene, .. } = ctx;
        let graph = &mut scene.graph;
        let light_ids = match self.kind {
            PanelKind::Light { light, target } => Some((light, target)),
            PanelKind::Model { .. } => None,
        };

        match id {
            FieldId::PositionX | FieldId::PositionY | FieldId::PositionZ => {
                let axis = match id {
                    FieldId::PositionX => 0,
                    FieldId::PositionY => 1,
                    _ => 2,
                };
                if let Some(node) = graph.get_mut(self.moved_node()) {
                    node.transform.position[axis] = v;
                }
            }
            FieldId::RotationX | FieldId::RotationY | FieldId::RotationZ => {
                let angle = Rad::from(Deg(v));
                match (id, light_ids) {
                    (FieldId::RotationX, Some((_, target))) => {
                        light_rig::apply_rotation_x(graph, self.node, target, angle)
                    }
                    (FieldId::RotationY, Some((_, target))) => {
                        light_rig::apply_rotation_y(graph, self.node, target, angle)
                    }
                    (FieldId::RotationZ, Some((light, _))) => {
                        light_rig::apply_rotation_z(graph, self.node, light, angle)
                    }
                    _ => {
                        let axis = match id {
                            FieldId::RotationX => 0,
                            FieldId::RotationY => 1,
                            _ => 2,
                        };
                        if let Some(node) = graph.get_mut(self.node) {
                            node.transform.rotation[axis] = angle.0;
                        }
                    }
                }
            }
            FieldId::Scale => {
                if let Some(node) = graph.get_mut(self.node) {
                    node.transform.scale = cgmath::Vector3::new(v, v, v);
                }
            }
            FieldId::Metalness(part) | FieldId::Roughness(part) | FieldId::TextureScale(part) => {
                let Some(mesh) = graph.get_mut(part).and_then(|n| n.as_mesh_mut()) else {
                    return PanelOutcome::Ignored;
                };
                match id {
                    FieldId::Metalness(_) => mesh.material.metalness = v,
                    FieldId::Roughness(_) => mesh.material.roughness = v,
                    _ => {
                        mesh.material.set_map_repeat(v);
                    }
                }
            }
            _ => {
                let Some((light, _)) = light_ids else {
                    return PanelOutcome::Ignored;
                };
                let Some(spot) = graph.get_mut(light).and_then(|n| n.as_spot_light_mut()) else {
                    return PanelOutcome::Ignored;
                };
                match id {
                    FieldId::Intensity => spot.intensity = v,
                    FieldId::Distance => {
                        spot.distance = v;
                        spot.update_projection();
                    }
                    FieldId::Decay => spot.decay = v,
                    FieldId::ShadowBlur => spot.shadow.radius = v,
                    FieldId::ShadowBias => spot.shadow.bias = v,
                    FieldId::ShadowResolution => {
                        let size = spot.shadow.set_map_size(v.round() as u32);
                        log::debug!("Shadow map of {} set to {}x{}", light, size, size);
                    }
                    FieldId::ShadowNear => spot.set_shadow_near(v),
                    FieldId::Angle => spot.set_angle(Deg(v)),
                    _ => return PanelOutcome::Ignored,
                }
            }
        }
        PanelOutcome::Applied
    }

    fn apply_color(&mut self, scene: &mut Scene, color: [f32; 3]) -> PanelOutcome {
        let PanelKind::Light { light, .. } = self.kind else {
            return PanelOutcome::Ignored;
        };
        if let Some(spot) = scene.graph.get_mut(light).and_then(|n| n.as_spot_light_mut()) {
            spot.color = color;
        }
        if let Some(proxy) = scene.graph.get_mut(self.node).and_then(|n| n.as_mesh_mut()) {
            proxy.material.emissive = color;
        }
        PanelOutcome::Applied
    }
}

/// Clears the part's map right away for "None", otherwise starts a fetch.
fn request_part_texture(ctx: PanelContext<'_>, part: NodeId, name: &'static str) -> PanelOutcome {
    let PanelContext {
        scene,
        registry,
        loader,
    } = ctx;
    let Some(EntryKind::Model {
        texture,
        pending_texture,
        ..
    }) = registry.lookup_mut(part).map(|e| &mut e.kind)
    else {
        return PanelOutcome::Ignored;
    };

    match catalog::texture_by_name(OBJECT_TEXTURES, name) {
        Some((_, Some(path))) => {
            let ticket = loader.next_ticket();
            *pending_texture = Some(ticket);
            loader.request_texture(TextureRequest {
                ticket,
                name,
                path,
                target: TextureTarget::Part(part),
            });
        }
        _ => {
            *pending_texture = None;
            *texture = None;
            if let Some(mesh) = scene.graph.get_mut(part).and_then(|n| n.as_mesh_mut()) {
                mesh.material.set_map(None);
            }
        }
    }
    PanelOutcome::Applied
}

fn light_folders(scene: &Scene, proxy: NodeId, light: NodeId) -> Vec<Folder> {
    let Some(spot) = scene.graph.get(light).and_then(|n| n.as_spot_light()) else {
        return Vec::new();
    };
    let proxy_emissive = scene
        .graph
        .get(proxy)
        .and_then(|n| n.as_mesh())
        .map_or(spot.color, |m| m.material.emissive);

    vec![
        Folder {
            title: "Light Properties",
            fields: vec![
                Field::slider(FieldId::Intensity, "Intensity", INTENSITY, spot.intensity),
                Field::slider(FieldId::Distance, "Distance", DISTANCE, spot.distance),
                Field::slider(FieldId::Decay, "Decay", DECAY, spot.decay),
                Field {
                    id: FieldId::Color,
                    label: "Color",
                    control: Control::Color,
                    value: FieldValue::Color(proxy_emissive),
                },
            ],
        },
        Folder {
            title: "Shadow Settings",
            fields: vec![
                Field::slider(FieldId::ShadowBlur, "Blur", SHADOW_BLUR, spot.shadow.radius),
                Field::slider(FieldId::ShadowBias, "Bias", SHADOW_BIAS, spot.shadow.bias),
                Field::slider(
                    FieldId::ShadowResolution,
                    "Resolution",
                    SHADOW_RESOLUTION,
                    spot.shadow.map_size() as f32,
                ),
                Field::slider(FieldId::ShadowNear, "Near", SHADOW_NEAR, spot.shadow.camera.near),
                Field::slider(FieldId::Angle, "Angle", CONE_ANGLE, spot.angle_degrees()),
            ],
        },
    ]
}

fn model_folders(scene: &Scene, registry: &Registry, parts: &[NodeId]) -> Vec<Folder> {
    let mut material = Vec::new();
    let mut textures = Vec::new();

    for &part in parts {
        let Some(mesh) = scene.graph.get(part).and_then(|n| n.as_mesh()) else {
            continue;
        };
        let selected = match registry.lookup(part).map(|e| &e.kind) {
            Some(EntryKind::Model {
                texture: Some(name),
                ..
            }) => *name,
            _ => NONE_TEXTURE,
        };
        let repeat = mesh.material.map.as_ref().map_or(1.0, |map| map.repeat[0]);

        material.push(Field::slider(
            FieldId::Metalness(part),
            "Metalness",
            UNIT,
            mesh.material.metalness,
        ));
        material.push(Field::slider(
            FieldId::Roughness(part),
            "Roughness",
            UNIT,
            mesh.material.roughness,
        ));
        textures.push(Field {
            id: FieldId::Texture(part),
            label: "Texture",
            control: Control::Choice(catalog::texture_names(OBJECT_TEXTURES)),
            value: FieldValue::Choice(selected),
        });
        textures.push(Field::slider(
            FieldId::TextureScale(part),
            "Texture Scale",
            TEXTURE_SCALE,
            repeat,
        ));
    }

    vec![
        Folder {
            title: "Material",
            fields: material,
        },
        Folder {
            title: "Textures",
            fields: textures,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        editor::{light_rig::spawn_spotlight, registry::RegistryEntry},
        gfx::scene::{Material, MeshData, Node, Transform},
    };
    use std::sync::Arc;

    fn add_part(scene: &mut Scene, registry: &mut Registry) -> NodeId {
        let mesh = MeshData::from_flat(
            "part",
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            &[],
            &[],
            vec![0, 1, 2],
        );
        let part = scene.graph.insert(
            None,
            Node::mesh("part", Arc::new(mesh), Material::new([1.0; 3], 0.0, 0.5)),
        );
        registry.register(part, RegistryEntry::model("duck.obj", None)).unwrap();
        part
    }

    fn ctx<'a>(
        scene: &'a mut Scene,
        registry: &'a mut Registry,
        loader: &'a mut AssetLoader,
    ) -> PanelContext<'a> {
        PanelContext {
            scene,
            registry,
            loader,
        }
    }

    #[test]
    fn test_snap_is_anchored_at_min() {
        assert_eq!(SHADOW_RESOLUTION.snap(700.0), 768.0);
        assert_eq!(SHADOW_RESOLUTION.snap(10_000.0), 2048.0);
        assert_eq!(ROTATION.snap(12.4), 12.0);
        assert!((POSITION_Y.snap(-3.0)).abs() < 1e-6);
        assert_eq!(UNIT.snap(0.37), 0.37);
    }

    #[test]
    fn test_unregistered_node_has_no_panel() {
        let scene = Scene::new([0.0; 3]);
        let registry = Registry::new();
        assert!(PropertyPanel::build(&scene, &registry, scene.ground()).is_none());
    }

    #[test]
    fn test_model_panel_fields() {
        let mut scene = Scene::new([0.0; 3]);
        let mut registry = Registry::new();
        let part = add_part(&mut scene, &mut registry);

        let panel = PropertyPanel::build(&scene, &registry, part).unwrap();
        let titles: Vec<_> = panel.folders().iter().map(|f| f.title).collect();
        assert_eq!(titles, vec!["Transform", "Material", "Textures", "Actions"]);
        for id in [
            FieldId::Metalness(part),
            FieldId::Roughness(part),
            FieldId::Texture(part),
            FieldId::TextureScale(part),
            FieldId::Delete,
        ] {
            assert!(panel.field(id).is_some(), "missing {:?}", id);
        }
        assert_eq!(
            panel.field(FieldId::Texture(part)).unwrap().value,
            FieldValue::Choice(NONE_TEXTURE)
        );
        assert!(panel.field(FieldId::Intensity).is_none());
    }

    #[test]
    fn test_model_rotation_is_stored_in_radians() {
        let mut scene = Scene::new([0.0; 3]);
        let mut registry = Registry::new();
        let mut loader = AssetLoader::new("assets");
        let part = add_part(&mut scene, &mut registry);
        let mut panel = PropertyPanel::build(&scene, &registry, part).unwrap();

        let outcome = panel.apply(
            ctx(&mut scene, &mut registry, &mut loader),
            FieldId::RotationY,
            FieldValue::Number(90.4),
        );
        assert_eq!(outcome, PanelOutcome::Applied);
        let rotation = scene.graph.get(part).unwrap().transform.rotation;
        assert!((rotation.y - std::f32::consts::FRAC_PI_2).abs() < 1e-5);

        panel.apply(
            ctx(&mut scene, &mut registry, &mut loader),
            FieldId::Scale,
            FieldValue::Number(5.0),
        );
        assert_eq!(scene.graph.get(part).unwrap().transform.scale.z, 2.0);
    }

    #[test]
    fn test_light_resolution_lands_on_discrete_set() {
        let mut scene = Scene::new([0.0; 3]);
        let mut registry = Registry::new();
        let mut loader = AssetLoader::new("assets");
        let rig = spawn_spotlight(&mut scene);
        registry
            .register(rig.proxy, RegistryEntry::light(rig.light, rig.target))
            .unwrap();
        let mut panel = PropertyPanel::build(&scene, &registry, rig.proxy).unwrap();
        let revision = scene
            .graph
            .get(rig.light)
            .unwrap()
            .as_spot_light()
            .unwrap()
            .shadow
            .map_revision();

        for requested in [100.0, 300.0, 1000.0, 1900.0, 4096.0] {
            panel.apply(
                ctx(&mut scene, &mut registry, &mut loader),
                FieldId::ShadowResolution,
                FieldValue::Number(requested),
            );
            let shadow = scene.graph.get(rig.light).unwrap().as_spot_light().unwrap().shadow;
            assert_eq!(shadow.map_size() % 256, 0);
            assert!((256..=2048).contains(&shadow.map_size()));
        }
        let shadow = scene.graph.get(rig.light).unwrap().as_spot_light().unwrap().shadow;
        assert!(shadow.map_revision() > revision);
    }

    #[test]
    fn test_light_position_moves_light_and_color_reaches_proxy() {
        let mut scene = Scene::new([0.0; 3]);
        let mut registry = Registry::new();
        let mut loader = AssetLoader::new("assets");
        let rig = spawn_spotlight(&mut scene);
        registry
            .register(rig.proxy, RegistryEntry::light(rig.light, rig.target))
            .unwrap();
        let mut panel = PropertyPanel::build(&scene, &registry, rig.proxy).unwrap();
        assert_eq!(panel.field(FieldId::PositionY).unwrap().value, FieldValue::Number(5.0));

        panel.apply(
            ctx(&mut scene, &mut registry, &mut loader),
            FieldId::PositionX,
            FieldValue::Number(3.0),
        );
        assert_eq!(scene.graph.get(rig.light).unwrap().transform.position.x, 3.0);
        assert_eq!(
            scene.graph.get(rig.proxy).unwrap().transform,
            Transform::default()
        );

        panel.apply(
            ctx(&mut scene, &mut registry, &mut loader),
            FieldId::Color,
            FieldValue::Color([1.0, 0.0, 0.0]),
        );
        let spot = scene.graph.get(rig.light).unwrap().as_spot_light().unwrap();
        assert_eq!(spot.color, [1.0, 0.0, 0.0]);
        let proxy = scene.graph.get(rig.proxy).unwrap().as_mesh().unwrap();
        assert_eq!(proxy.material.emissive, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_texture_choice_requests_then_none_clears() {
        let mut scene = Scene::new([0.0; 3]);
        let mut registry = Registry::new();
        let mut loader = AssetLoader::new("missing-assets");
        let part = add_part(&mut scene, &mut registry);
        let mut panel = PropertyPanel::build(&scene, &registry, part).unwrap();

        panel.apply(
            ctx(&mut scene, &mut registry, &mut loader),
            FieldId::Texture(part),
            FieldValue::Choice("Bricks"),
        );
        assert_eq!(loader.in_flight(), 1);
        assert!(matches!(
            registry.lookup(part).unwrap().kind,
            EntryKind::Model { pending_texture: Some(_), .. }
        ));

        panel.apply(
            ctx(&mut scene, &mut registry, &mut loader),
            FieldId::Texture(part),
            FieldValue::Choice(NONE_TEXTURE),
        );
        assert!(matches!(
            registry.lookup(part).unwrap().kind,
            EntryKind::Model { pending_texture: None, texture: None, .. }
        ));
        assert!(scene.graph.get(part).unwrap().as_mesh().unwrap().material.map.is_none());
    }

    #[test]
    fn test_unknown_choice_is_ignored() {
        let mut scene = Scene::new([0.0; 3]);
        let mut registry = Registry::new();
        let mut loader = AssetLoader::new("assets");
        let part = add_part(&mut scene, &mut registry);
        let mut panel = PropertyPanel::build(&scene, &registry, part).unwrap();
        let outcome = panel.apply(
            ctx(&mut scene, &mut registry, &mut loader),
            FieldId::Texture(part),
            FieldValue::Choice("Marble"),
        );
        assert_eq!(outcome, PanelOutcome::Ignored);
        assert_eq!(loader.in_flight(), 0);
    }
}
