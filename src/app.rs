//! Window, event loop and per-frame orchestration.

use std::sync::Arc;

use anyhow::Context;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    config::EditorConfig,
    editor::EditorSession,
    gfx::RenderEngine,
    ui::{editor_ui, UiManager},
};

pub struct DioramaApp {
    event_loop: EventLoop<()>,
    app_state: AppState,
}

struct AppState {
    config: EditorConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    session: EditorSession,
    cursor: (f32, f32),
    error: Option<anyhow::Error>,
}

impl DioramaApp {
    /// Creates the event loop and starts the editor session.
    ///
    /// The initial model batch starts loading immediately; the window and GPU
    /// come up when the event loop resumes.
    pub fn new(config: EditorConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("Failed to create event loop")?;
        let (width, height) = config.window_size;
        let session = EditorSession::new(config.clone(), width as f32 / height.max(1) as f32);

        Ok(Self {
            event_loop,
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                ui_manager: None,
                session,
                cursor: (0.0, 0.0),
                error: None,
            },
        })
    }

    /// Runs until the window closes. GPU setup failures are returned.
    pub fn run(mut self) -> anyhow::Result<()> {
        self.event_loop.set_control_flow(ControlFlow::Poll);
        self.event_loop
            .run_app(&mut self.app_state)
            .context("Event loop failed")?;

        match self.app_state.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Whether a button or key event goes past the UI to the viewport.
///
/// Releases always get through so no button or key stays held.
fn reaches_scene(captured: bool, state: ElementState) -> bool {
    !captured || state == ElementState::Released
}

impl AppState {
    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let (width, height) = self.config.window_size;
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title("Diorama")
                    .with_inner_size(winit::dpi::LogicalSize::new(width, height)),
            )
            .context("Failed to create window")?;
        let window = Arc::new(window);

        let PhysicalSize { width, height } = window.inner_size();
        let render_engine = pollster::block_on(RenderEngine::new(window.clone(), width, height))?;

        let mut ui_manager = UiManager::new(
            render_engine.device(),
            render_engine.queue(),
            render_engine.surface_format(),
            &window,
        );
        ui_manager.update_display_size(width, height);
        self.session.resize(width, height);

        self.ui_manager = Some(ui_manager);
        self.render_engine = Some(render_engine);
        self.window = Some(window);
        Ok(())
    }

    fn viewport_size(&self) -> (f32, f32) {
        self.render_engine.as_ref().map_or((1.0, 1.0), |engine| {
            let (width, height) = engine.get_surface_size();
            (width as f32, height as f32)
        })
    }

    fn mouse_input(&mut self, state: ElementState, button: MouseButton) {
        let size = self.viewport_size();
        if button == MouseButton::Left {
            match state {
                ElementState::Pressed => self.session.pointer_pressed(self.cursor, size),
                ElementState::Released => self.session.pointer_released(self.cursor, size),
            }
        }
        self.session.camera.process_mouse_button(button, state);
    }

    fn keyboard_input(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.physical_key == PhysicalKey::Code(KeyCode::Escape) && event.state.is_pressed() {
            event_loop.exit();
            return;
        }
        self.session.camera.process_keyboard_event(event);
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.session.update();

        let (Some(window), Some(render_engine), Some(ui_manager)) = (
            self.window.as_ref(),
            self.render_engine.as_mut(),
            self.ui_manager.as_mut(),
        ) else {
            return;
        };

        let mut actions = Vec::new();
        ui_manager.update_logic(window, |ui| actions = editor_ui(ui, &self.session));
        for action in actions {
            self.session.apply_action(action);
        }

        let camera = self.session.camera.camera.uniform;
        let result = render_engine.render_frame(&self.session.scene, camera, |device, queue, encoder, view| {
            ui_manager.render_display_only(device, queue, encoder, view);
        });
        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory, exiting");
                event_loop.exit();
            }
            Err(e) => log::warn!("Dropped frame: {}", e),
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.init_graphics(event_loop) {
            log::error!("Failed to initialise graphics: {:#}", e);
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };

        let captured = self
            .ui_manager
            .as_mut()
            .is_some_and(|ui_manager| ui_manager.handle_window_event(&window, window_id, &event));

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
                if width > 0 && height > 0 {
                    self.session.resize(width, height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x as f32, position.y as f32);
                if !captured {
                    let size = self.viewport_size();
                    self.session.pointer_moved(self.cursor, size);
                }
            }
            WindowEvent::MouseInput { state, button, .. } if reaches_scene(captured, state) => {
                self.mouse_input(state, button);
            }
            WindowEvent::MouseWheel { delta, .. } if !captured => {
                self.session.camera.process_scroll(&delta);
            }
            WindowEvent::KeyboardInput { event, .. } if reaches_scene(captured, event.state) => {
                self.keyboard_input(event_loop, &event);
            }
            WindowEvent::Focused(false) => {
                self.session.camera.controller.clear_keys();
                self.session.camera.controller.release_buttons();
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let ui_wants_mouse = self.ui_manager.as_ref().is_some_and(UiManager::wants_mouse);
        if ui_wants_mouse || self.session.is_dragging() {
            return;
        }

        if let DeviceEvent::MouseMotion { delta } = event {
            self.session.camera.process_mouse_motion(delta);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}
