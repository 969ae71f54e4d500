//! # Procedural Geometry Generation
//!
//! Builds the handful of primitive shapes the editor needs without any model
//! files: the spotlight proxy sphere, the ground plane and the grid helper.
//!
//! ## Usage
//!
//! ```rust
//! use diorama::gfx::geometry::{generate_grid_lines, generate_plane, generate_sphere};
//!
//! // Light proxy
//! let proxy = generate_sphere(0.2, 16, 16);
//!
//! // 20x20 ground, single quad
//! let ground = generate_plane(20.0, 20.0, 1, 1);
//!
//! // 20 cells across a 20 unit square
//! let grid = generate_grid_lines(20.0, 20);
//! assert_eq!(grid.indices.len() % 2, 0);
//! ```

pub mod primitives;

pub use primitives::*;

use crate::gfx::scene::vertex::Vertex3D;

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Texture coordinates (u, v)
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding), or line pairs for grids
    pub indices: Vec<u32>,
}

impl GeometryData {
    /// Create a new empty geometry data structure
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of vertices in this geometry
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles in this geometry
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Interleaves the attribute streams into the renderer's vertex format.
    pub fn to_scene_format(&self) -> (Vec<Vertex3D>, Vec<u32>) {
        let vertices = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, &position)| Vertex3D {
                position,
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                tex_coords: self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
            })
            .collect();

        (vertices, self.indices.clone())
    }
}
