//! # User Interface Module
//!
//! Dear ImGui overlay for the editor.
//!
//! - [`UiManager`] - ImGui integration with winit and wgpu, input capture
//! - [`panel`] - the scene controls, selected object and status windows
//!
//! Windows never mutate the session directly. They return
//! [`EditorAction`](crate::editor::EditorAction)s that the app applies once
//! the frame's UI is built, and pointer events the UI captures never reach
//! picking or the camera.

pub mod manager;
pub mod panel;

pub use manager::UiManager;
pub use panel::editor_ui;
