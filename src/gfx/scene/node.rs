//! Scene graph nodes and their local transforms.

use std::sync::Arc;

use cgmath::{Matrix4, Rad, Vector3};

use super::{light::SpotLight, material::Material, mesh::MeshData};

/// Stable handle to a node, never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Local transform: translation, XYZ Euler rotation in radians, scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn from_position(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Vector3::new(x, y, z);
        self
    }

    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vector3::new(scale, scale, scale);
        self
    }

    /// Rotation matrix for the XYZ Euler order (`Rx * Ry * Rz`).
    pub fn rotation_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_angle_x(Rad(self.rotation.x))
            * Matrix4::from_angle_y(Rad(self.rotation.y))
            * Matrix4::from_angle_z(Rad(self.rotation.z))
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        let t = Matrix4::from_translation(self.position);
        let s = Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z);
        t * self.rotation_matrix() * s // Order matters: T * R * S
    }
}

/// A drawable part: shared geometry plus its own material.
#[derive(Debug, Clone)]
pub struct MeshNode {
    pub mesh: Arc<MeshData>,
    pub material: Material,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Group,
    /// Transform-only node, used as a light target
    Empty,
    Mesh(MeshNode),
    SpotLight(SpotLight),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub(super) id: NodeId,
    pub name: String,
    pub transform: Transform,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
    pub visible: bool,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: NodeId(0),
            name: name.into(),
            transform: Transform::default(),
            parent: None,
            children: Vec::new(),
            visible: true,
            cast_shadow: false,
            receive_shadow: false,
            kind,
        }
    }

    pub fn mesh(name: impl Into<String>, mesh: Arc<MeshData>, material: Material) -> Self {
        Self::new(name, NodeKind::Mesh(MeshNode { mesh, material }))
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_shadows(mut self, cast: bool, receive: bool) -> Self {
        self.cast_shadow = cast;
        self.receive_shadow = receive;
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn as_mesh(&self) -> Option<&MeshNode> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn as_mesh_mut(&mut self) -> Option<&mut MeshNode> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn as_spot_light(&self) -> Option<&SpotLight> {
        match &self.kind {
            NodeKind::SpotLight(light) => Some(light),
            _ => None,
        }
    }

    pub fn as_spot_light_mut(&mut self) -> Option<&mut SpotLight> {
        match &mut self.kind {
            NodeKind::SpotLight(light) => Some(light),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector4};

    #[test]
    fn test_trs_order() {
        let transform = Transform::from_position(1.0, 0.0, 0.0)
            .with_rotation(0.0, std::f32::consts::FRAC_PI_2, 0.0)
            .with_uniform_scale(2.0);
        // Scale, then rotate +X onto -Z, then translate.
        let p = transform.matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert!((p.truncate() - Vector3::new(1.0, 0.0, -2.0)).magnitude() < 1e-5);
    }

    #[test]
    fn test_euler_xyz_order() {
        let transform = Transform::default().with_rotation(
            std::f32::consts::FRAC_PI_2,
            std::f32::consts::FRAC_PI_2,
            0.0,
        );
        // Ry first takes +Z to +X, Rx leaves +X alone.
        let p = transform.rotation_matrix() * Vector4::new(0.0, 0.0, 1.0, 0.0);
        assert!((p.truncate() - Vector3::new(1.0, 0.0, 0.0)).magnitude() < 1e-5);
    }
}
