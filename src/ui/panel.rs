//! Editor windows
//!
//! Every widget only reads the session and reports what the user changed as
//! [`EditorAction`]s; the session applies them after the UI frame is built.

use imgui::{Condition, TreeNodeFlags, WindowFlags};

use crate::{
    assets::catalog::{self, MODEL_PRESETS, SCENE_TEXTURES, SURFACE_TEXTURES},
    editor::{Control, EditorAction, EditorSession, Field, FieldValue, PropertyPanel, SceneControls},
    gfx::camera::camera_controller::{MAX_MOVE_SPEED, MIN_MOVE_SPEED},
};

const PANEL_WIDTH: f32 = 340.0;

/// Builds every editor window for this frame and returns the requested actions.
pub fn editor_ui(ui: &imgui::Ui, session: &EditorSession) -> Vec<EditorAction> {
    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return Vec::new();
    }

    let mut actions = Vec::new();
    scene_controls_window(ui, &session.controls, &mut actions);
    if let Some(panel) = session.panel() {
        property_window(ui, panel, display_size, &mut actions);
    }
    status_overlay(ui, session.status().text(), session.scene.triangle_count(), display_size);
    actions
}

/// The scene-wide controls: background, surface, lights, models and camera.
pub fn scene_controls_window(ui: &imgui::Ui, controls: &SceneControls, actions: &mut Vec<EditorAction>) {
    ui.window("Scene")
        .size([PANEL_WIDTH, 520.0], Condition::FirstUseEver)
        .position([20.0, 20.0], Condition::FirstUseEver)
        .collapsible(true)
        .build(|| {
            let mut background = controls.background_color;
            if ui.color_edit3("Background", &mut background) {
                actions.push(EditorAction::SetBackgroundColor(background));
            }

            if ui.collapsing_header("General", TreeNodeFlags::DEFAULT_OPEN) {
                if ui.button("Reset Scene") {
                    actions.push(EditorAction::ResetScene);
                }
                if let Some(name) = texture_combo(ui, "Surface Texture", SURFACE_TEXTURES, controls.surface_texture) {
                    actions.push(EditorAction::SetSurfaceTexture(name));
                }
                let mut scale = controls.surface_scale;
                if ui.slider("Surface Scale", 1.0, 10.0, &mut scale) {
                    actions.push(EditorAction::SetSurfaceScale(scale));
                }
                if let Some(name) = texture_combo(ui, "Scene Texture", SCENE_TEXTURES, controls.scene_texture) {
                    actions.push(EditorAction::SetSceneTexture(name));
                }
                let mut show = controls.show_surface;
                if ui.checkbox("Show Surface", &mut show) {
                    actions.push(EditorAction::SetShowSurface(show));
                }
            }

            if ui.collapsing_header("Lights", TreeNodeFlags::DEFAULT_OPEN) {
                let mut scene_light = controls.scene_light;
                if ui.slider("Scene Light", 0.0, 2.0, &mut scene_light) {
                    actions.push(EditorAction::SetSceneLight(scene_light));
                }
                if ui.button("Add Light") {
                    actions.push(EditorAction::AddLight);
                }
            }

            if ui.collapsing_header("Models", TreeNodeFlags::DEFAULT_OPEN) {
                for preset in MODEL_PRESETS {
                    if ui.button(format!("Add {}", preset.name)) {
                        actions.push(EditorAction::AddModel(preset));
                    }
                }
            }

            if ui.collapsing_header("Camera Controls", TreeNodeFlags::empty()) {
                let mut speed = controls.move_speed;
                if ui.slider("Movement Speed", MIN_MOVE_SPEED, MAX_MOVE_SPEED, &mut speed) {
                    actions.push(EditorAction::SetMoveSpeed(speed));
                }
            }
        });
}

/// The property panel of the selected object, one header per folder.
pub fn property_window(
    ui: &imgui::Ui,
    panel: &PropertyPanel,
    display_size: [f32; 2],
    actions: &mut Vec<EditorAction>,
) {
    ui.window("Selected Object")
        .size([PANEL_WIDTH, 480.0], Condition::FirstUseEver)
        .position([display_size[0] - PANEL_WIDTH - 20.0, 20.0], Condition::FirstUseEver)
        .build(|| {
            for (folder_index, folder) in panel.folders().iter().enumerate() {
                let _folder_id = ui.push_id_usize(folder_index);
                if folder.title.is_empty() {
                    fields(ui, &folder.fields, actions);
                } else if ui.collapsing_header(folder.title, TreeNodeFlags::DEFAULT_OPEN) {
                    fields(ui, &folder.fields, actions);
                }
            }
        });
}

fn fields(ui: &imgui::Ui, fields: &[Field], actions: &mut Vec<EditorAction>) {
    for (index, field) in fields.iter().enumerate() {
        // Part folders repeat labels, so ids come from the position
        let _field_id = ui.push_id_usize(index);
        if let Some(value) = field_widget(ui, field) {
            actions.push(EditorAction::Edit(field.id, value));
        }
    }
}

fn field_widget(ui: &imgui::Ui, field: &Field) -> Option<FieldValue> {
    match (&field.control, field.value) {
        (Control::Slider(spec), FieldValue::Number(current)) => {
            let mut value = current;
            ui.slider_config(field.label, spec.min, spec.max)
                .display_format(slider_format(spec.step))
                .build(&mut value)
                .then_some(FieldValue::Number(value))
        }
        (Control::Color, FieldValue::Color(current)) => {
            let mut value = current;
            ui.color_edit3(field.label, &mut value)
                .then_some(FieldValue::Color(value))
        }
        (Control::Choice(names), FieldValue::Choice(current)) => {
            let mut index = choice_index(names, current);
            if ui.combo_simple_string(field.label, &mut index, names.as_slice()) {
                names.get(index).map(|name| FieldValue::Choice(*name))
            } else {
                None
            }
        }
        (Control::Action, _) => ui.button(field.label).then_some(FieldValue::Trigger),
        _ => None,
    }
}

/// Loading progress and scene statistics in the bottom left corner.
pub fn status_overlay(ui: &imgui::Ui, status: Option<&str>, triangles: usize, display_size: [f32; 2]) {
    ui.window("Status")
        .position([20.0, display_size[1] - 20.0], Condition::Always)
        .position_pivot([0.0, 1.0])
        .bg_alpha(0.35)
        .flags(
            WindowFlags::NO_DECORATION
                | WindowFlags::ALWAYS_AUTO_RESIZE
                | WindowFlags::NO_SAVED_SETTINGS
                | WindowFlags::NO_FOCUS_ON_APPEARING
                | WindowFlags::NO_NAV
                | WindowFlags::NO_MOVE,
        )
        .build(|| {
            if let Some(text) = status {
                ui.text(text);
            }
            ui.text(format!("Surfaces: {}", triangles));
        });
}

fn texture_combo(
    ui: &imgui::Ui,
    label: &str,
    table: catalog::TextureTable,
    current: &'static str,
) -> Option<&'static str> {
    let names = catalog::texture_names(table);
    let mut index = choice_index(&names, current);
    if ui.combo_simple_string(label, &mut index, names.as_slice()) {
        names.get(index).copied().filter(|name| *name != current)
    } else {
        None
    }
}

/// printf format showing as many decimals as the slider's step.
fn slider_format(step: Option<f32>) -> &'static str {
    match step {
        Some(step) if step >= 1.0 => "%.0f",
        Some(step) if step >= 0.1 => "%.1f",
        Some(step) if step >= 0.01 => "%.2f",
        Some(_) => "%.3f",
        None => "%.2f",
    }
}

fn choice_index(names: &[&'static str], current: &str) -> usize {
    names.iter().position(|name| *name == current).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slider_format_follows_step() {
        assert_eq!(slider_format(Some(256.0)), "%.0f");
        assert_eq!(slider_format(Some(1.0)), "%.0f");
        assert_eq!(slider_format(Some(0.1)), "%.1f");
        assert_eq!(slider_format(Some(0.001)), "%.3f");
        assert_eq!(slider_format(None), "%.2f");
    }

    #[test]
    fn test_unknown_choice_falls_back_to_first_entry() {
        let names = catalog::texture_names(SURFACE_TEXTURES);
        assert_eq!(choice_index(&names, "Grass"), 2);
        assert_eq!(choice_index(&names, "Marble"), 0);
        assert_eq!(names[0], catalog::NONE_TEXTURE);
    }
}
