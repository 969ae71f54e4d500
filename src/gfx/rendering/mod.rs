//! Core rendering functionality
//!
//! Handles render pipelines, GPU copies of scene data, shadow maps and frame
//! rendering.

pub mod gpu_cache;
pub mod pipeline_manager;
pub mod render_engine;
pub mod render_pass_ext;
pub mod shadow_maps;

pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use render_engine::RenderEngine;
