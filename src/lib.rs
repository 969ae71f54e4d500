//! Diorama
//!
//! A desktop 3D scene editor: load textured OBJ models, place and light them,
//! and edit their materials through a live property panel.

pub mod app;
pub mod assets;
pub mod config;
pub mod editor;
pub mod gfx;
pub mod ui;
pub mod wgpu_utils;

pub use app::DioramaApp;
pub use config::EditorConfig;
