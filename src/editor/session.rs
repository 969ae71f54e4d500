//! The editor session: one explicit context object per scene.

use std::collections::HashSet;

use cgmath::{InnerSpace, Vector3};

use crate::{
    assets::{
        catalog::{
            self, DetailMap, NONE_TEXTURE, OBJECT_TEXTURES, SCENE_TEXTURES, SURFACE_TEXTURES,
        },
        AssetLoader, LoadEvent, LoadedModel, ModelPreset, ModelRequest, TextureHandle,
        TextureRequest, TextureTarget,
    },
    config::EditorConfig,
    gfx::{
        camera::CameraManager,
        picking::{ObjectPicker, Plane, Ray},
        scene::{
            scene::SURFACE_TEXTURE_REPEAT, Node, NodeId, NodeKind, Scene, TextureMap,
            Transform,
        },
    },
};

use super::{
    light_rig::{self, LightRig},
    panel::{FieldId, FieldValue, PanelContext, PanelOutcome, PropertyPanel},
    registry::{EntryKind, Registry, RegistryEntry},
    selection::Selection,
};

/// Pointer travel, in pixels, below which a press and release count as a click
pub const CLICK_SLOP: f32 = 4.0;

pub const LOADING_MESSAGE: &str = "Loading Models...";

/// Scene-wide values shown in the main controls window.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneControls {
    pub background_color: [f32; 3],
    pub scene_light: f32,
    pub surface_texture: &'static str,
    pub surface_scale: f32,
    pub scene_texture: &'static str,
    pub show_surface: bool,
    pub move_speed: f32,
}

/// Something the UI asked for during the last frame.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    SetBackgroundColor([f32; 3]),
    ResetScene,
    SetSurfaceTexture(&'static str),
    SetSurfaceScale(f32),
    SetSceneTexture(&'static str),
    SetShowSurface(bool),
    SetSceneLight(f32),
    AddLight,
    AddModel(ModelPreset),
    SetMoveSpeed(f32),
    Edit(FieldId, FieldValue),
}

/// Progress of the initial model batch, plus the last load error.
#[derive(Debug, Default)]
pub struct LoadingStatus {
    initial: HashSet<u64>,
    message: Option<String>,
}

impl LoadingStatus {
    pub fn is_loading(&self) -> bool {
        !self.initial.is_empty()
    }

    pub fn text(&self) -> Option<&str> {
        if self.is_loading() {
            Some(LOADING_MESSAGE)
        } else {
            self.message.as_deref()
        }
    }
}

/// Object being dragged on a camera-facing plane.
#[derive(Debug, Clone, Copy)]
struct Drag {
    /// The clicked node
    picked: NodeId,
    /// The node that actually moves (the light for a proxy)
    moved: NodeId,
    plane: Plane,
    offset: Vector3<f32>,
    dragged: bool,
}

/// A texture request per scene slot; later requests win.
#[derive(Debug, Default)]
struct SlotTickets {
    surface: Option<u64>,
    background: Option<u64>,
}

pub struct EditorSession {
    config: EditorConfig,
    pub scene: Scene,
    pub registry: Registry,
    selection: Selection,
    panel: Option<PropertyPanel>,
    loader: AssetLoader,
    pub camera: CameraManager,
    pub controls: SceneControls,
    status: LoadingStatus,
    tickets: SlotTickets,
    applied_surface: &'static str,
    applied_scene_texture: &'static str,
    picker: ObjectPicker,
    drag: Option<Drag>,
    press: Option<(f32, f32)>,
}

impl EditorSession {
    /// Starts a session and kicks off the initial model batch.
    pub fn new(config: EditorConfig, aspect: f32) -> Self {
        let scene = Scene::new(config.background_color);
        let controls = SceneControls {
            background_color: config.background_color,
            scene_light: scene.scene_light(),
            surface_texture: NONE_TEXTURE,
            surface_scale: 1.0,
            scene_texture: NONE_TEXTURE,
            show_surface: true,
            move_speed: config.move_speed,
        };

        let mut session = Self {
            scene,
            registry: Registry::new(),
            selection: Selection::default(),
            panel: None,
            loader: AssetLoader::new(config.asset_root.clone()),
            camera: CameraManager::editor_default(aspect, config.move_speed),
            controls,
            status: LoadingStatus::default(),
            tickets: SlotTickets::default(),
            applied_surface: NONE_TEXTURE,
            applied_scene_texture: NONE_TEXTURE,
            picker: ObjectPicker::new(),
            drag: None,
            press: None,
            config,
        };

        if session.config.load_initial_models {
            for (preset, [x, y, z], [rx, ry, rz]) in catalog::INITIAL_MODELS {
                let transform = Transform::from_position(x, y, z).with_rotation(rx, ry, rz);
                let ticket = session.request_model(preset, transform);
                session.status.initial.insert(ticket);
            }
        }
        session
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn panel(&self) -> Option<&PropertyPanel> {
        self.panel.as_ref()
    }

    pub fn status(&self) -> &LoadingStatus {
        &self.status
    }

    pub fn pending_loads(&self) -> usize {
        self.loader.in_flight()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some_and(|d| d.dragged)
    }

    /// Per-frame step: apply finished loads, then held movement keys.
    pub fn update(&mut self) {
        for event in self.loader.poll() {
            self.handle_event(event);
        }
        self.camera.update();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.camera.resize_projection(width, height);
    }

    pub fn apply_action(&mut self, action: EditorAction) {
        match action {
            EditorAction::SetBackgroundColor(color) => {
                self.controls.background_color = color;
                self.tickets.background = None;
                self.applied_scene_texture = NONE_TEXTURE;
                self.controls.scene_texture = NONE_TEXTURE;
                self.scene.set_background_color(color);
            }
            EditorAction::ResetScene => self.reset(),
            EditorAction::SetSurfaceTexture(name) => self.set_surface_texture(name),
            EditorAction::SetSurfaceScale(scale) => {
                self.controls.surface_scale = scale.clamp(1.0, 10.0);
                self.scene.set_surface_repeat(self.controls.surface_scale);
            }
            EditorAction::SetSceneTexture(name) => self.set_scene_texture(name),
            EditorAction::SetShowSurface(show) => {
                self.controls.show_surface = show;
                self.scene.set_surface_visible(show);
            }
            EditorAction::SetSceneLight(value) => {
                self.controls.scene_light = value.clamp(0.0, 2.0);
                self.scene.set_scene_light(self.controls.scene_light);
            }
            EditorAction::AddLight => {
                self.add_light();
            }
            EditorAction::AddModel(preset) => self.add_model(preset),
            EditorAction::SetMoveSpeed(speed) => {
                self.camera.controller.set_move_speed(speed);
                self.controls.move_speed = self.camera.controller.move_speed();
            }
            EditorAction::Edit(id, value) => self.edit_field(id, value),
        }
    }

    /// Throws the scene away and starts over with the same configuration.
    pub fn reset(&mut self) {
        log::info!("Resetting scene");
        let aspect = self.camera.camera.aspect;
        *self = Self::new(self.config.clone(), aspect);
    }

    fn request_model(&mut self, preset: ModelPreset, transform: Transform) -> u64 {
        let ticket = self.loader.next_ticket();
        self.loader.request_model(ModelRequest {
            ticket,
            preset,
            transform,
        });
        ticket
    }

    /// Loads a preset at a random spot near the origin.
    pub fn add_model(&mut self, preset: ModelPreset) {
        let transform = preset.random_placement(&mut rand::rng());
        self.request_model(preset, transform);
    }

    pub fn add_light(&mut self) -> LightRig {
        let rig = light_rig::spawn_spotlight(&mut self.scene);
        if let Err(err) = self
            .registry
            .register(rig.proxy, RegistryEntry::light(rig.light, rig.target))
        {
            log::warn!("{}", err);
        }
        log::info!("Added spotlight {}", rig.light);
        rig
    }

    pub fn handle_event(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Model { request, result } => {
                let initial = self.status.initial.remove(&request.ticket);
                match result {
                    Ok(loaded) => {
                        self.place_model(&request.preset, request.transform, loaded);
                    }
                    Err(err) => {
                        log::error!("Error loading model: {}", err);
                        if initial {
                            self.status.message = Some(format!("Error loading models: {}", err));
                        }
                    }
                }
            }
            LoadEvent::Texture { request, result } => match request.target {
                TextureTarget::Part(part) => self.finish_part_texture(part, &request, result),
                TextureTarget::Surface => self.finish_surface_texture(&request, result),
                TextureTarget::Background => self.finish_scene_texture(&request, result),
            },
        }
    }

    /// Adds a loaded model under a scaled group and registers every part.
    pub fn place_model(
        &mut self,
        preset: &ModelPreset,
        transform: Transform,
        loaded: LoadedModel,
    ) -> NodeId {
        loaded.model.log_diagnostics();

        let mut material = preset.material.material();
        let diffuse = preset
            .diffuse
            .and_then(|path| loaded.textures.get(path).cloned());
        if let Some(texture) = diffuse {
            material = material.with_map(TextureMap::new(texture));
        }
        if let Some(detail) = preset.detail {
            if let Some(texture) = loaded.textures.get(detail.path()).cloned() {
                material = match detail {
                    DetailMap::Bump { scale, .. } => {
                        material.with_bump_map(TextureMap::new(texture), scale)
                    }
                    DetailMap::Normal { scale, .. } => {
                        material.with_normal_map(TextureMap::new(texture), [scale, scale])
                    }
                };
            }
        }
        let texture_name = preset
            .diffuse
            .and_then(|path| catalog::texture_name_for_path(OBJECT_TEXTURES, path));

        let group = self.scene.graph.insert(
            None,
            Node::new(preset.name, NodeKind::Group)
                .with_transform(transform.with_uniform_scale(preset.scale)),
        );
        for part in &loaded.model.parts {
            let id = self.scene.graph.insert(
                Some(group),
                Node::mesh(part.name.clone(), part.clone(), material.clone()).with_shadows(true, true),
            );
            if let Err(err) = self
                .registry
                .register(id, RegistryEntry::model(preset.file, texture_name))
            {
                log::warn!("{}", err);
            }
        }
        log::info!(
            "Placed {} with {} parts",
            preset.name,
            loaded.model.parts.len()
        );
        group
    }

    fn finish_part_texture(
        &mut self,
        part: NodeId,
        request: &TextureRequest,
        result: Result<TextureHandle, crate::assets::AssetError>,
    ) {
        let Some(EntryKind::Model {
            texture,
            pending_texture,
            ..
        }) = self.registry.lookup_mut(part).map(|e| &mut e.kind)
        else {
            log::debug!("Dropping texture {} for removed part {}", request.name, part);
            return;
        };
        if *pending_texture != Some(request.ticket) {
            log::debug!("Dropping stale texture {} for {}", request.name, part);
            return;
        }
        *pending_texture = None;

        match result {
            Ok(handle) => {
                if let Some(mesh) = self.scene.graph.get_mut(part).and_then(Node::as_mesh_mut) {
                    mesh.material.set_map(Some(TextureMap::repeating(handle, 1.0)));
                }
                *texture = Some(request.name);
                log::info!("Applied texture {} to {}", request.name, part);
            }
            Err(err) => {
                log::error!("Error loading texture: {}", err);
                let current = texture.unwrap_or(NONE_TEXTURE);
                if let Some(panel) = self.panel.as_mut() {
                    panel.set_texture_choice(part, current);
                }
            }
        }
    }

    fn set_surface_texture(&mut self, name: &'static str) {
        self.controls.surface_texture = name;
        match catalog::texture_by_name(SURFACE_TEXTURES, name) {
            Some((_, Some(path))) => {
                let ticket = self.loader.next_ticket();
                self.tickets.surface = Some(ticket);
                self.loader.request_texture(TextureRequest {
                    ticket,
                    name,
                    path,
                    target: TextureTarget::Surface,
                });
            }
            _ => {
                self.tickets.surface = None;
                self.applied_surface = NONE_TEXTURE;
                self.controls.surface_texture = NONE_TEXTURE;
                self.scene.set_surface_texture(None);
            }
        }
    }

    fn finish_surface_texture(
        &mut self,
        request: &TextureRequest,
        result: Result<TextureHandle, crate::assets::AssetError>,
    ) {
        if self.tickets.surface != Some(request.ticket) {
            return;
        }
        self.tickets.surface = None;
        match result {
            Ok(handle) => {
                self.scene.set_surface_texture(Some(handle));
                self.applied_surface = request.name;
                self.controls.surface_scale = SURFACE_TEXTURE_REPEAT;
                log::info!("Surface texture set to {}", request.name);
            }
            Err(err) => {
                log::error!("Error loading surface texture: {}", err);
                self.controls.surface_texture = self.applied_surface;
            }
        }
    }

    fn set_scene_texture(&mut self, name: &'static str) {
        self.controls.scene_texture = name;
        match catalog::texture_by_name(SCENE_TEXTURES, name) {
            Some((_, Some(path))) => {
                let ticket = self.loader.next_ticket();
                self.tickets.background = Some(ticket);
                self.loader.request_texture(TextureRequest {
                    ticket,
                    name,
                    path,
                    target: TextureTarget::Background,
                });
            }
            _ => {
                self.tickets.background = None;
                self.applied_scene_texture = NONE_TEXTURE;
                self.controls.scene_texture = NONE_TEXTURE;
                self.scene.set_background_texture(None);
            }
        }
    }

    fn finish_scene_texture(
        &mut self,
        request: &TextureRequest,
        result: Result<TextureHandle, crate::assets::AssetError>,
    ) {
        if self.tickets.background != Some(request.ticket) {
            return;
        }
        self.tickets.background = None;
        match result {
            Ok(handle) => {
                self.scene.set_background_texture(Some(handle));
                self.applied_scene_texture = request.name;
                log::info!("Scene texture set to {}", request.name);
            }
            Err(err) => {
                log::error!("Error loading scene texture: {}", err);
                self.controls.scene_texture = self.applied_scene_texture;
            }
        }
    }

    /// Routes a panel edit. Delete tears the panel down before anything else.
    pub fn edit_field(&mut self, id: FieldId, value: FieldValue) {
        let Some(panel) = self.panel.as_mut() else {
            return;
        };
        let outcome = panel.apply(
            PanelContext {
                scene: &mut self.scene,
                registry: &mut self.registry,
                loader: &mut self.loader,
            },
            id,
            value,
        );
        if outcome == PanelOutcome::Delete {
            self.delete_selected();
        }
    }

    /// Removes the selected object: the whole subtree for a light.
    pub fn delete_selected(&mut self) {
        self.panel = None;
        let Some(node) = self.selection.selected() else {
            return;
        };
        self.selection.clear(&mut self.scene);
        self.drag = None;

        let root = match self.registry.lookup(node).map(|e| &e.kind) {
            Some(EntryKind::Light { light, .. }) => *light,
            Some(EntryKind::Model { .. }) => node,
            None => return,
        };
        let removed = self.scene.graph.detach_subtree(root);
        for id in &removed {
            self.registry.unregister(*id);
        }
        log::info!("Deleted {} ({} nodes)", node, removed.len());
    }

    /// Changes the selection to `hit` and rebuilds the panel from scratch.
    pub fn select(&mut self, hit: Option<NodeId>) -> Option<NodeId> {
        self.panel = None;
        let selected = self.selection.click(hit, &mut self.scene, &self.registry);
        self.panel = selected.and_then(|node| PropertyPanel::build(&self.scene, &self.registry, node));
        selected
    }

    pub fn pick_ray(&self, ray: &Ray) -> Option<NodeId> {
        self.picker
            .pick(ray, &self.scene, self.registry.interactive().iter().copied())
            .map(|hit| hit.node)
    }

    /// Click selection along an already computed ray.
    pub fn click_ray(&mut self, ray: &Ray) -> Option<NodeId> {
        let hit = self.pick_ray(ray);
        self.select(hit)
    }

    pub fn screen_ray(&self, position: (f32, f32), size: (f32, f32)) -> Ray {
        self.picker.screen_to_ray(position, size, &self.camera.camera)
    }

    /// Grabs the interactive object under the ray, if any, and suspends orbiting.
    pub fn begin_drag(&mut self, ray: &Ray) -> bool {
        let Some(picked) = self.pick_ray(ray) else {
            return false;
        };
        let moved = match self.registry.lookup(picked).map(|e| &e.kind) {
            Some(EntryKind::Light { light, .. }) => *light,
            _ => picked,
        };
        let (Some(anchor), Some(origin)) = (
            self.scene.graph.world_position(picked),
            self.scene.graph.world_position(moved),
        ) else {
            return false;
        };

        let camera = &self.camera.camera;
        let plane = Plane::new(anchor, (camera.target - camera.eye).normalize());
        let Some(t) = ray.intersect_plane(&plane) else {
            return false;
        };
        self.drag = Some(Drag {
            picked,
            moved,
            plane,
            offset: origin - ray.point_at(t),
            dragged: false,
        });
        self.camera.controller.enabled = false;
        true
    }

    pub fn drag_to(&mut self, ray: &Ray) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let Some(t) = ray.intersect_plane(&drag.plane) else {
            return;
        };
        drag.dragged = true;
        let drag = *drag;
        self.scene
            .graph
            .set_world_position(drag.moved, ray.point_at(t) + drag.offset);
        if let Some(panel) = self.panel.as_mut().filter(|p| p.node() == drag.picked) {
            panel.sync_transform(&self.scene);
        }
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
        self.camera.controller.enabled = true;
    }

    /// Left button pressed inside the viewport.
    pub fn pointer_pressed(&mut self, position: (f32, f32), size: (f32, f32)) {
        self.press = Some(position);
        let ray = self.screen_ray(position, size);
        self.begin_drag(&ray);
    }

    pub fn pointer_moved(&mut self, position: (f32, f32), size: (f32, f32)) {
        if self.drag.is_some() {
            let ray = self.screen_ray(position, size);
            self.drag_to(&ray);
        }
    }

    /// Left button released. A release close to the press is a click.
    pub fn pointer_released(&mut self, position: (f32, f32), size: (f32, f32)) {
        if let Some((x, y)) = self.press.take() {
            let travel = ((position.0 - x).powi(2) + (position.1 - y).powi(2)).sqrt();
            if travel <= CLICK_SLOP {
                let ray = self.screen_ray(position, size);
                self.click_ray(&ray);
            }
        }
        self.end_drag();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{catalog::DUCK, load_preset, TextureData};
    use crate::gfx::scene::Background;
    use std::{path::Path, sync::Arc, time::Duration};

    fn quiet_config(root: &Path) -> EditorConfig {
        EditorConfig {
            asset_root: root.to_path_buf(),
            load_initial_models: false,
            ..EditorConfig::default()
        }
    }

    fn write_duck(root: &Path) {
        std::fs::create_dir_all(root.join("models")).unwrap();
        std::fs::create_dir_all(root.join("textures")).unwrap();
        std::fs::write(
            root.join("models/duck.obj"),
            "o Body\nv -1 -1 0\nv 1 -1 0\nv 1 1 0\nv -1 1 0\nf 1 2 3 4\n\
             o Head\nv -1 -1 1\nv 1 -1 1\nv 0 1 1\nf 5 6 7\n",
        )
        .unwrap();
        image::RgbImage::from_pixel(2, 2, image::Rgb([230, 200, 40]))
            .save(root.join("textures/duck_diffuse.jpg"))
            .unwrap();
    }

    fn duck_session(dir: &Path) -> (EditorSession, NodeId) {
        write_duck(dir);
        let mut session = EditorSession::new(quiet_config(dir), 1.6);
        let loaded = load_preset(dir, &DUCK).unwrap();
        let group = session.place_model(
            &DUCK,
            Transform::from_position(2.0, 0.0, -2.0).with_rotation(-std::f32::consts::FRAC_PI_2, 0.0, 0.0),
            loaded,
        );
        (session, group)
    }

    fn down_at(x: f32, z: f32) -> Ray {
        Ray::new(Vector3::new(x, 20.0, z), Vector3::new(0.0, -1.0, 0.0))
    }

    fn texture(name: &'static str) -> TextureHandle {
        Arc::new(TextureData::solid(name, [255, 255, 255, 255]))
    }

    fn pending_ticket(session: &EditorSession, part: NodeId) -> Option<u64> {
        match session.registry.lookup(part).map(|e| &e.kind) {
            Some(EntryKind::Model { pending_texture, .. }) => *pending_texture,
            _ => None,
        }
    }

    fn texture_event(part: NodeId, ticket: u64, name: &'static str, ok: bool) -> LoadEvent {
        let path = catalog::texture_by_name(OBJECT_TEXTURES, name).unwrap().1.unwrap();
        let result = if ok {
            Ok(texture(path))
        } else {
            Err(crate::assets::AssetError::EmptyModel {
                path: path.to_string(),
            })
        };
        LoadEvent::Texture {
            request: TextureRequest {
                ticket,
                name,
                path,
                target: TextureTarget::Part(part),
            },
            result,
        }
    }

    #[test]
    fn test_duck_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, group) = duck_session(dir.path());

        let parts = session.scene.graph.get(group).unwrap().children().to_vec();
        assert_eq!(parts.len(), 2);
        assert_eq!(session.registry.len(), 2);
        for part in &parts {
            match &session.registry.lookup(*part).unwrap().kind {
                EntryKind::Model { path, texture, .. } => {
                    assert_eq!(path, "duck.obj");
                    assert_eq!(*texture, Some("Duck"));
                }
                other => panic!("unexpected entry {:?}", other),
            }
        }
        let scale = session.scene.graph.get(group).unwrap().transform.scale;
        assert_eq!(scale.x, 0.015);

        // The duck is stood up, so its body faces up at (2, _, -2).
        let selected = session.click_ray(&down_at(2.0, -2.0));
        assert!(selected.is_some_and(|node| parts.contains(&node)));
        let panel = session.panel().unwrap();
        let part = panel.node();
        for id in [
            FieldId::Metalness(part),
            FieldId::Roughness(part),
            FieldId::Texture(part),
            FieldId::TextureScale(part),
            FieldId::Delete,
        ] {
            assert!(panel.field(id).is_some());
        }
        assert_eq!(
            panel.field(FieldId::Texture(part)).unwrap().value,
            FieldValue::Choice("Duck")
        );

        // Empty ground closes the panel and leaves the registry alone.
        assert_eq!(session.click_ray(&down_at(-5.0, 5.0)), None);
        assert!(session.panel().is_none());
        assert_eq!(session.registry.len(), 2);
    }

    #[test]
    fn test_deleted_light_is_no_longer_clickable() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = EditorSession::new(quiet_config(dir.path()), 1.6);
        session.apply_action(EditorAction::AddLight);
        let rig_count = session.scene.graph.len();

        let ray = down_at(0.013, 0.004);
        let proxy = session.click_ray(&ray).expect("proxy under the ray");
        let (light, target) = match session.registry.lookup(proxy).unwrap().kind {
            EntryKind::Light { light, target } => (light, target),
            _ => panic!("proxy registered as a model"),
        };

        session.apply_action(EditorAction::Edit(FieldId::Delete, FieldValue::Trigger));
        assert!(session.panel().is_none());
        assert_eq!(*session.selection(), Selection::Idle);
        assert!(session.registry.is_empty());
        for id in [light, proxy, target] {
            assert!(!session.scene.graph.contains(id));
        }
        assert_eq!(session.scene.graph.len(), rig_count - 3);
        assert_eq!(session.click_ray(&ray), None);
    }

    #[test]
    fn test_deleting_one_part_keeps_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, group) = duck_session(dir.path());
        let parts = session.scene.graph.get(group).unwrap().children().to_vec();

        session.select(Some(parts[0]));
        session.edit_field(FieldId::Delete, FieldValue::Trigger);
        assert!(!session.scene.graph.contains(parts[0]));
        assert!(session.scene.graph.contains(parts[1]));
        assert_eq!(session.registry.interactive(), &[parts[1]]);
    }

    #[test]
    fn test_texture_then_none_leaves_map_empty() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, group) = duck_session(dir.path());
        let part = session.scene.graph.get(group).unwrap().children()[0];
        session.select(Some(part));

        session.edit_field(FieldId::Texture(part), FieldValue::Choice("Bricks"));
        let ticket = pending_ticket(&session, part).unwrap();
        session.handle_event(texture_event(part, ticket, "Bricks", true));

        let material = &session.scene.graph.get(part).unwrap().as_mesh().unwrap().material;
        let map = material.map.as_ref().unwrap();
        assert_eq!(map.wrap, crate::gfx::scene::Wrap::Repeat);
        assert_eq!(map.repeat, [1.0, 1.0]);
        assert!(matches!(
            session.registry.lookup(part).unwrap().kind,
            EntryKind::Model { texture: Some("Bricks"), .. }
        ));

        session.edit_field(FieldId::TextureScale(part), FieldValue::Number(3.0));
        let material = &session.scene.graph.get(part).unwrap().as_mesh().unwrap().material;
        assert_eq!(material.map.as_ref().unwrap().repeat, [3.0, 3.0]);

        session.edit_field(FieldId::Texture(part), FieldValue::Choice(NONE_TEXTURE));
        let material = &session.scene.graph.get(part).unwrap().as_mesh().unwrap().material;
        assert!(material.map.is_none());
    }

    #[test]
    fn test_stale_texture_completion_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, group) = duck_session(dir.path());
        let part = session.scene.graph.get(group).unwrap().children()[0];
        session.select(Some(part));

        session.edit_field(FieldId::Texture(part), FieldValue::Choice("Bricks"));
        let first = pending_ticket(&session, part).unwrap();
        session.edit_field(FieldId::Texture(part), FieldValue::Choice("Wood"));
        let second = pending_ticket(&session, part).unwrap();

        session.handle_event(texture_event(part, second, "Wood", true));
        session.handle_event(texture_event(part, first, "Bricks", true));

        let material = &session.scene.graph.get(part).unwrap().as_mesh().unwrap().material;
        assert_eq!(
            material.map.as_ref().unwrap().source_path(),
            "textures/extra/wood.jpg"
        );
    }

    #[test]
    fn test_failed_texture_leaves_material_and_reverts_choice() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, group) = duck_session(dir.path());
        let part = session.scene.graph.get(group).unwrap().children()[0];
        session.select(Some(part));
        let before = session.scene.graph.get(part).unwrap().as_mesh().unwrap().material.revision();

        session.edit_field(FieldId::Texture(part), FieldValue::Choice("Grass"));
        let ticket = pending_ticket(&session, part).unwrap();
        session.handle_event(texture_event(part, ticket, "Grass", false));

        let material = &session.scene.graph.get(part).unwrap().as_mesh().unwrap().material;
        assert_eq!(material.revision(), before);
        assert_eq!(
            material.map.as_ref().unwrap().source_path(),
            "textures/duck_diffuse.jpg"
        );
        assert_eq!(
            session.panel().unwrap().field(FieldId::Texture(part)).unwrap().value,
            FieldValue::Choice("Duck")
        );
    }

    #[test]
    fn test_dragging_a_proxy_moves_the_light() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = EditorSession::new(quiet_config(dir.path()), 1.6);
        let rig = session.add_light();
        let eye = session.camera.camera.eye;

        // Both aim points lie on the camera-facing plane through the proxy.
        let grab = Ray::new(eye, Vector3::new(0.03, 5.02, -0.01) - eye);
        assert!(session.begin_drag(&grab));
        assert!(!session.camera.controller.enabled);

        session.drag_to(&Ray::new(eye, Vector3::new(1.03, 5.02, -0.01) - eye));
        let light = session.scene.graph.world_position(rig.light).unwrap();
        assert!((light - Vector3::new(1.0, 5.0, 0.0)).magnitude() < 1e-3);
        assert_eq!(
            session.scene.graph.get(rig.proxy).unwrap().transform.position,
            Vector3::new(0.0, 0.0, 0.0)
        );

        session.end_drag();
        assert!(session.camera.controller.enabled);
    }

    #[test]
    fn test_scene_controls() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = EditorSession::new(quiet_config(dir.path()), 1.6);

        session.apply_action(EditorAction::SetSceneLight(5.0));
        assert_eq!(session.controls.scene_light, 2.0);
        assert_eq!(session.scene.ambient.intensity, 1.0);

        session.apply_action(EditorAction::SetShowSurface(false));
        assert!(!session.scene.surface_visible());

        session.apply_action(EditorAction::SetMoveSpeed(3.0));
        assert_eq!(session.controls.move_speed, 1.0);

        session.apply_action(EditorAction::SetSurfaceTexture("Grass"));
        assert_eq!(session.pending_loads(), 1);
        session.apply_action(EditorAction::SetSurfaceTexture(NONE_TEXTURE));
        assert_eq!(session.controls.surface_texture, NONE_TEXTURE);
    }

    #[test]
    fn test_background_color_drops_scene_texture() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = EditorSession::new(quiet_config(dir.path()), 1.6);
        let sky = |ticket| LoadEvent::Texture {
            request: TextureRequest {
                ticket,
                name: "Sky",
                path: "textures/scene/sky-scene.jpg",
                target: TextureTarget::Background,
            },
            result: Ok(texture("sky")),
        };

        session.apply_action(EditorAction::SetSceneTexture("Sky"));
        let ticket = session.tickets.background.unwrap();
        session.handle_event(sky(ticket));
        assert!(matches!(session.scene.background, Background::Texture(_)));

        session.apply_action(EditorAction::SetBackgroundColor([0.2, 0.4, 0.6]));
        assert_eq!(session.controls.scene_texture, NONE_TEXTURE);
        assert!(matches!(session.scene.background, Background::Color(c) if c == [0.2, 0.4, 0.6]));

        // A load still in flight when the colour changes is dropped.
        session.apply_action(EditorAction::SetSceneTexture("Sky"));
        let ticket = session.tickets.background.unwrap();
        session.apply_action(EditorAction::SetBackgroundColor([0.1, 0.1, 0.1]));
        session.handle_event(sky(ticket));
        assert!(matches!(session.scene.background, Background::Color(_)));
    }

    #[test]
    fn test_each_added_light_registers_its_proxy() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = EditorSession::new(quiet_config(dir.path()), 1.6);
        let first = session.add_light();
        let second = session.add_light();

        assert_eq!(session.registry.len(), 2);
        for rig in [first, second] {
            assert!(matches!(
                session.registry.lookup(rig.proxy).unwrap().kind,
                EntryKind::Light { light, target } if light == rig.light && target == rig.target
            ));
        }
    }

    #[test]
    fn test_reset_starts_from_an_empty_scene() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, group) = duck_session(dir.path());
        session.add_light();
        session.apply_action(EditorAction::ResetScene);
        assert!(session.registry.is_empty());
        assert!(!session.scene.graph.contains(group));
        assert!(session.panel().is_none());
    }

    #[test]
    fn test_initial_batch_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig {
            asset_root: dir.path().to_path_buf(),
            ..EditorConfig::default()
        };
        let mut session = EditorSession::new(config, 1.6);
        assert_eq!(session.status().text(), Some(LOADING_MESSAGE));

        for _ in 0..500 {
            session.update();
            if !session.status().is_loading() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(!session.status().is_loading());
        assert!(session
            .status()
            .text()
            .is_some_and(|text| text.starts_with("Error loading models")));
        assert!(session.registry.is_empty());
    }
}
