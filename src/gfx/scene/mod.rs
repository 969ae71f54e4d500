//! # Scene Graph Module
//!
//! This module holds the editor's world: a hierarchy of nodes with local
//! transforms, the meshes and materials hung off them, spotlights with their
//! shadow settings, and the fixed ambient/directional lighting, ground plane
//! and grid that every session starts with.
//!
//! ## Key Components
//!
//! - [`Scene`] - The world container: graph, fixed lights, ground, background
//! - [`SceneGraph`] - Parent/child hierarchy keyed by [`NodeId`]
//! - [`Node`] / [`NodeKind`] - A node and what it carries (group, mesh, light)
//! - [`Material`] - Metal/rough surface with optional diffuse, bump and normal maps
//! - [`SpotLight`] - Cone light with target and shadow map settings
//! - [`MeshData`] - Immutable CPU geometry shared between nodes
//!
//! ## Usage
//!
//! ```no_run
//! use diorama::gfx::scene::{Node, NodeKind, Scene, Transform};
//!
//! let mut scene = Scene::new([0.16, 0.16, 0.16]);
//! let group = scene.graph.insert(
//!     None,
//!     Node::new("model", NodeKind::Group).with_transform(Transform::from_position(2.0, 0.0, -2.0)),
//! );
//! assert!(scene.graph.contains(group));
//! ```

pub mod graph;
pub mod light;
pub mod material;
pub mod mesh;
pub mod node;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use graph::SceneGraph;
pub use light::{AmbientLight, DirectionalLight, ShadowSettings, SpotLight};
pub use material::{color_from_hex, Material, TextureMap, Wrap};
pub use mesh::{MeshData, MeshId, Topology};
pub use node::{MeshNode, Node, NodeId, NodeKind, Transform};
pub use scene::{Background, Scene};
pub use vertex::Vertex3D;
