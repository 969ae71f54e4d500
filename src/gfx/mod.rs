//! # Graphics Module
//!
//! Everything between the editor state and the screen.
//!
//! - **Scene graph** ([`scene`]) - nodes, meshes, materials and lights
//! - **Geometry** ([`geometry`]) - procedural ground, grid and light proxy meshes
//! - **Camera System** ([`camera`]) - orbit camera with mouse and keyboard controls
//! - **Picking** ([`picking`]) - screen-space ray casts against mesh parts
//! - **Resource Management** ([`resources`]) - uniform layouts, textures and bind groups
//! - **Rendering Pipeline** ([`rendering`]) - shadow, lit, grid and composite passes
//!
//! The editor only talks to the GPU through [`RenderEngine`]:
//!
//! ```no_run
//! # async fn run(window: std::sync::Arc<winit::window::Window>) -> anyhow::Result<()> {
//! use diorama::gfx::{camera::CameraUniform, scene::Scene, RenderEngine};
//!
//! let mut engine = RenderEngine::new(window, 1280, 800).await?;
//! let scene = Scene::new([0.16, 0.16, 0.16]);
//! engine.render_frame(&scene, CameraUniform::default(), |_, _, _, _| {})?;
//! # Ok(())
//! # }
//! ```

pub mod camera;
pub mod geometry;
pub mod picking;
pub mod rendering;
pub mod resources;
pub mod scene;

pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
