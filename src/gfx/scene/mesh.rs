//! CPU-side mesh geometry shared between scene nodes and the renderer.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::gfx::{geometry::GeometryData, picking::Aabb};

use super::vertex::Vertex3D;

static NEXT_MESH_ID: AtomicU64 = AtomicU64::new(1);

/// Identity used by the renderer to cache vertex and index buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

/// How the index buffer is assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    Lines,
}

/// Immutable geometry for one drawable part.
#[derive(Debug)]
pub struct MeshData {
    id: MeshId,
    pub name: String,
    pub vertices: Vec<Vertex3D>,
    pub indices: Vec<u32>,
    pub topology: Topology,
    bounds: Aabb,
}

impl MeshData {
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex3D>, indices: Vec<u32>) -> Self {
        Self::with_topology(name, vertices, indices, Topology::Triangles)
    }

    pub fn with_topology(
        name: impl Into<String>,
        vertices: Vec<Vertex3D>,
        indices: Vec<u32>,
        topology: Topology,
    ) -> Self {
        let positions: Vec<[f32; 3]> = vertices.iter().map(|v| v.position).collect();
        Self {
            id: MeshId(NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            bounds: Aabb::from_vertices(&positions),
            vertices,
            indices,
            topology,
        }
    }

    /// Builds a mesh from flat position/normal/uv arrays as produced by `tobj`.
    ///
    /// Missing normals are replaced by averaged face normals and missing
    /// texture coordinates by zeroes.
    pub fn from_flat(
        name: impl Into<String>,
        positions: &[f32],
        normals: &[f32],
        tex_coords: &[f32],
        indices: Vec<u32>,
    ) -> Self {
        let vertex_count = positions.len() / 3;
        let normals = if normals.len() == positions.len() {
            normals.to_vec()
        } else {
            calculate_face_normals(positions, &indices)
        };

        let vertices = (0..vertex_count)
            .map(|i| Vertex3D {
                position: [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]],
                normal: [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]],
                tex_coords: if tex_coords.len() >= (i + 1) * 2 {
                    [tex_coords[i * 2], 1.0 - tex_coords[i * 2 + 1]]
                } else {
                    [0.0, 0.0]
                },
            })
            .collect();

        Self::new(name, vertices, indices)
    }

    pub fn from_geometry(name: impl Into<String>, geometry: &GeometryData) -> Self {
        let (vertices, indices) = geometry.to_scene_format();
        Self::new(name, vertices, indices)
    }

    pub fn id(&self) -> MeshId {
        self.id
    }

    /// Local-space bounding box of all vertices
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn triangle_count(&self) -> usize {
        match self.topology {
            Topology::Triangles => self.indices.len() / 3,
            Topology::Lines => 0,
        }
    }

    /// Iterates triangles as vertex position triples.
    pub fn triangles(&self) -> impl Iterator<Item = [[f32; 3]; 3]> + '_ {
        let indices: &[u32] = match self.topology {
            Topology::Triangles => &self.indices,
            Topology::Lines => &[],
        };
        indices.chunks_exact(3).map(move |tri| {
            [
                self.vertices[tri[0] as usize].position,
                self.vertices[tri[1] as usize].position,
                self.vertices[tri[2] as usize].position,
            ]
        })
    }

    /// Reports whether any two consecutive vertex normals differ, which is
    /// how a part is classified as curved rather than flat.
    pub fn has_curved_surfaces(&self) -> bool {
        self.vertices
            .windows(2)
            .any(|pair| pair[0].normal != pair[1].normal)
    }
}

/// Averages face normals onto vertices for meshes that ship without normals.
pub fn calculate_face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let vertex_count = positions.len() / 3;
    let mut normals = vec![0.0; positions.len()];
    let mut counts = vec![0u32; vertex_count];

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        let v = |i: usize| [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]];
        let (v0, v1, v2) = (v(i0), v(i1), v(i2));

        let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
        let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
        let face_normal = [
            edge1[1] * edge2[2] - edge1[2] * edge2[1],
            edge1[2] * edge2[0] - edge1[0] * edge2[2],
            edge1[0] * edge2[1] - edge1[1] * edge2[0],
        ];

        for &vertex_idx in &[i0, i1, i2] {
            normals[vertex_idx * 3] += face_normal[0];
            normals[vertex_idx * 3 + 1] += face_normal[1];
            normals[vertex_idx * 3 + 2] += face_normal[2];
            counts[vertex_idx] += 1;
        }
    }

    for i in 0..vertex_count {
        if counts[i] == 0 {
            continue;
        }
        let n = &mut normals[i * 3..i * 3 + 3];
        let length = (n[0].powi(2) + n[1].powi(2) + n[2].powi(2)).sqrt();
        if length > 0.0 {
            n.iter_mut().for_each(|c| *c /= length);
        }
    }

    normals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshData {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
        MeshData::from_flat("quad", &positions, &[], &[], vec![0, 1, 2, 0, 2, 3])
    }

    #[test]
    fn test_generated_normals_face_the_winding() {
        let mesh = quad();
        for vertex in &mesh.vertices {
            assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
        }
        assert!(!mesh.has_curved_surfaces());
    }

    #[test]
    fn test_bounds_and_triangle_count() {
        let mesh = quad();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.triangles().count(), 2);
        assert_eq!(mesh.bounds().max.x, 1.0);
        assert_eq!(mesh.bounds().min.y, 0.0);
    }

    #[test]
    fn test_mesh_ids_are_unique() {
        assert_ne!(quad().id(), quad().id());
    }
}
