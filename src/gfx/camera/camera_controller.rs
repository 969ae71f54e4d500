use std::collections::HashSet;

use cgmath::Vector3;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
};

use super::orbit_camera::OrbitCamera;

/// Slowest keyboard movement step per frame
pub const MIN_MOVE_SPEED: f32 = 0.1;
/// Fastest keyboard movement step per frame
pub const MAX_MOVE_SPEED: f32 = 1.0;

/// Mouse and keyboard navigation for the orbit camera.
///
/// Left drag orbits, right drag (or shift + left drag) pans and the wheel
/// zooms. Held movement keys are polled once per frame by [`Self::update`].
pub struct CameraController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    move_speed: f32,
    /// Cleared while an object drag owns the pointer
    pub enabled: bool,
    is_shift_held: bool,
    is_left_pressed: bool,
    is_right_pressed: bool,
    keys_pressed: HashSet<KeyCode>,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed: 0.01,
            move_speed: MIN_MOVE_SPEED,
            enabled: true,
            is_shift_held: false,
            is_left_pressed: false,
            is_right_pressed: false,
            keys_pressed: HashSet::new(),
        }
    }

    pub fn move_speed(&self) -> f32 {
        self.move_speed
    }

    pub fn set_move_speed(&mut self, speed: f32) {
        self.move_speed = speed.clamp(MIN_MOVE_SPEED, MAX_MOVE_SPEED);
    }

    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        let pressed = state == ElementState::Pressed;
        match button {
            MouseButton::Left => self.is_left_pressed = pressed,
            MouseButton::Right => self.is_right_pressed = pressed,
            _ => (),
        }
    }

    /// Releases every held button, used when another system takes the pointer.
    pub fn release_buttons(&mut self) {
        self.is_left_pressed = false;
        self.is_right_pressed = false;
    }

    pub fn process_scroll(&mut self, delta: &MouseScrollDelta, camera: &mut OrbitCamera) {
        if !self.enabled {
            return;
        }
        let scroll_amount = -match delta {
            MouseScrollDelta::LineDelta(_, scroll) => *scroll,
            MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => *scroll as f32 * 0.05,
        };
        camera.add_distance(scroll_amount * self.zoom_speed);
    }

    /// Applies raw mouse motion as orbit or pan depending on held buttons.
    pub fn process_mouse_motion(&mut self, delta: (f64, f64), camera: &mut OrbitCamera) {
        if !self.enabled {
            return;
        }
        if self.is_panning() {
            camera.pan((
                -delta.0 as f32 * self.pan_speed,
                delta.1 as f32 * self.pan_speed,
            ));
        } else if self.is_rotating() {
            camera.add_yaw(-delta.0 as f32 * self.rotate_speed);
            camera.add_pitch(delta.1 as f32 * self.rotate_speed);
        }
    }

    pub fn process_keyed_events(&mut self, event: &KeyEvent, camera: &mut OrbitCamera) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let pressed = event.state == ElementState::Pressed;

        match code {
            KeyCode::ShiftLeft | KeyCode::ShiftRight => self.is_shift_held = pressed,
            KeyCode::KeyC if pressed && self.is_shift_held => {
                log::info!("Resetting camera to default position");
                camera.reset_to_default();
            }
            _ => {
                if pressed {
                    self.keys_pressed.insert(code);
                } else {
                    self.keys_pressed.remove(&code);
                }
            }
        }
    }

    /// Forgets held keys, e.g. after the window loses focus.
    pub fn clear_keys(&mut self) {
        self.keys_pressed.clear();
        self.is_shift_held = false;
    }

    /// Eye offset for this frame from the held movement keys.
    pub fn movement(&self) -> Vector3<f32> {
        let d = self.move_speed;
        let held = |a: KeyCode, b: KeyCode| self.keys_pressed.contains(&a) || self.keys_pressed.contains(&b);

        let mut offset = Vector3::new(0.0, 0.0, 0.0);
        if held(KeyCode::KeyW, KeyCode::ArrowUp) {
            offset.y += d;
            offset.z -= d;
        }
        if held(KeyCode::KeyS, KeyCode::ArrowDown) {
            offset.y -= d;
            offset.z += d;
        }
        if held(KeyCode::KeyA, KeyCode::ArrowLeft) {
            offset.x -= d;
        }
        if held(KeyCode::KeyD, KeyCode::ArrowRight) {
            offset.x += d;
        }
        offset
    }

    /// Per-frame keyboard movement. Returns true when the camera moved.
    pub fn update(&mut self, camera: &mut OrbitCamera) -> bool {
        let offset = self.movement();
        if offset == Vector3::new(0.0, 0.0, 0.0) {
            return false;
        }
        camera.set_eye(camera.eye + offset);
        true
    }

    /// Returns true if currently panning
    pub fn is_panning(&self) -> bool {
        self.is_right_pressed || (self.is_left_pressed && self.is_shift_held)
    }

    /// Returns true if currently rotating
    pub fn is_rotating(&self) -> bool {
        self.is_left_pressed && !self.is_shift_held
    }

    pub fn is_shift_held(&self) -> bool {
        self.is_shift_held
    }

    /// Adjust panning sensitivity
    pub fn set_pan_speed(&mut self, speed: f32) {
        self.pan_speed = speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_speed_is_clamped() {
        let mut controller = CameraController::new(0.005, 0.5);
        controller.set_move_speed(5.0);
        assert_eq!(controller.move_speed(), MAX_MOVE_SPEED);
        controller.set_move_speed(0.0);
        assert_eq!(controller.move_speed(), MIN_MOVE_SPEED);
    }

    #[test]
    fn test_forward_moves_up_and_in() {
        let mut controller = CameraController::new(0.005, 0.5);
        controller.keys_pressed.insert(KeyCode::KeyW);
        controller.keys_pressed.insert(KeyCode::ArrowLeft);
        let offset = controller.movement();
        assert_eq!(offset, Vector3::new(-0.1, 0.1, -0.1));

        let mut camera = OrbitCamera::editor_default(1.0);
        assert!(controller.update(&mut camera));
        assert!((camera.eye.y - 5.1).abs() < 1e-4);
        assert!((camera.eye.z - 9.9).abs() < 1e-4);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut controller = CameraController::new(0.005, 0.5);
        controller.keys_pressed.insert(KeyCode::KeyA);
        controller.keys_pressed.insert(KeyCode::KeyD);
        let mut camera = OrbitCamera::editor_default(1.0);
        assert!(!controller.update(&mut camera));
    }

    #[test]
    fn test_disabled_controller_ignores_motion() {
        let mut controller = CameraController::new(0.005, 0.5);
        controller.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        controller.enabled = false;
        let mut camera = OrbitCamera::editor_default(1.0);
        let eye = camera.eye;
        controller.process_mouse_motion((40.0, 10.0), &mut camera);
        assert_eq!(camera.eye, eye);
    }
}
