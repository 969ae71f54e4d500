//! # Object Picking System
//!
//! Turns a pointer position into a world-space ray and finds the nearest
//! interactive node it hits. Each candidate is tested with a world-space
//! bounding box first and then triangle by triangle in the mesh's local
//! space.
//!
//! ## Usage
//!
//! ```no_run
//! use diorama::gfx::picking::ObjectPicker;
//! # fn demo(scene: &diorama::gfx::scene::Scene, camera: &diorama::gfx::OrbitCamera,
//! #         candidates: &[diorama::gfx::scene::NodeId]) {
//! let picker = ObjectPicker::new();
//! let ray = picker.screen_to_ray((640.0, 400.0), (1280.0, 800.0), camera);
//! if let Some(hit) = picker.pick(&ray, scene, candidates.iter().copied()) {
//!     log::info!("Hit {} at distance {}", hit.node, hit.distance);
//! }
//! # }
//! ```

use cgmath::{ElementWise, InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4, Zero};

use crate::gfx::{
    camera::orbit_camera::OrbitCamera,
    scene::{NodeId, Scene},
};

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Ray origin point in world space
    pub origin: Vector3<f32>,
    /// Ray direction (normalized)
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Create a new ray
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }

    /// Re-expresses the ray in another space. The direction is not
    /// renormalised so distances stay comparable with the source space.
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Self {
        let origin = matrix * self.origin.extend(1.0);
        let direction = matrix * self.direction.extend(0.0);
        Self {
            origin: origin.truncate() / origin.w,
            direction: direction.truncate(),
        }
    }

    /// Möller–Trumbore intersection; returns the ray parameter of the hit.
    /// Both faces count as hits.
    pub fn intersect_triangle(&self, triangle: &[[f32; 3]; 3]) -> Option<f32> {
        const EPSILON: f32 = 1e-7;
        let v0 = Vector3::from(triangle[0]);
        let edge1 = Vector3::from(triangle[1]) - v0;
        let edge2 = Vector3::from(triangle[2]) - v0;

        let h = self.direction.cross(edge2);
        let a = edge1.dot(h);
        if a.abs() < EPSILON {
            return None;
        }
        let f = 1.0 / a;
        let s = self.origin - v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(edge1);
        let v = f * self.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = f * edge2.dot(q);
        (t > EPSILON).then_some(t)
    }

    /// Distance along the ray to a plane, if it lies in front of the origin.
    pub fn intersect_plane(&self, plane: &Plane) -> Option<f32> {
        let denom = plane.normal.dot(self.direction);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = (plane.point - self.origin).dot(plane.normal) / denom;
        (t >= 0.0).then_some(t)
    }
}

/// Infinite plane through `point` with unit `normal`
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    pub point: Vector3<f32>,
    pub normal: Vector3<f32>,
}

impl Plane {
    pub fn new(point: Vector3<f32>, normal: Vector3<f32>) -> Self {
        Self {
            point,
            normal: normal.normalize(),
        }
    }
}

/// Axis-aligned bounding box for intersection testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vector3<f32>,
    /// Maximum corner of the bounding box
    pub max: Vector3<f32>,
}

impl Aabb {
    /// Create a new AABB
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Create AABB from a set of vertices
    pub fn from_vertices(vertices: &[[f32; 3]]) -> Self {
        let Some(first) = vertices.first() else {
            return Self::new(Vector3::zero(), Vector3::zero());
        };

        let mut min = Vector3::from(*first);
        let mut max = min;

        for vertex in vertices.iter().skip(1) {
            min.x = min.x.min(vertex[0]);
            min.y = min.y.min(vertex[1]);
            min.z = min.z.min(vertex[2]);
            max.x = max.x.max(vertex[0]);
            max.y = max.y.max(vertex[1]);
            max.z = max.z.max(vertex[2]);
        }

        Self::new(min, max)
    }

    /// Test ray-AABB intersection
    /// Returns the distance to intersection point, or None if no intersection
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = Vector3::new(
            1.0 / ray.direction.x,
            1.0 / ray.direction.y,
            1.0 / ray.direction.z,
        );

        let t_min = (self.min - ray.origin).mul_element_wise(inv_dir);
        let t_max = (self.max - ray.origin).mul_element_wise(inv_dir);

        let t_near = t_min.x.min(t_max.x).max(t_min.y.min(t_max.y)).max(t_min.z.min(t_max.z));
        let t_far = t_min.x.max(t_max.x).min(t_min.y.max(t_max.y)).min(t_min.z.max(t_max.z));

        if t_near <= t_far && t_far >= 0.0 {
            Some(if t_near >= 0.0 { t_near } else { t_far })
        } else {
            None
        }
    }

    /// Apply a transformation matrix to the AABB
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        let corners: Vec<[f32; 3]> = (0..8)
            .map(|i| {
                let corner = Vector4::new(
                    if i & 1 == 0 { self.min.x } else { self.max.x },
                    if i & 2 == 0 { self.min.y } else { self.max.y },
                    if i & 4 == 0 { self.min.z } else { self.max.z },
                    1.0,
                );
                let p = matrix * corner;
                [p.x / p.w, p.y / p.w, p.z / p.w]
            })
            .collect();

        Self::from_vertices(&corners)
    }
}

/// Result of an object picking operation
#[derive(Debug, Clone, Copy)]
pub struct PickResult {
    /// The node whose geometry was hit
    pub node: NodeId,
    /// Distance from camera to intersection point
    pub distance: f32,
    /// World space intersection point
    pub intersection_point: Vector3<f32>,
}

/// Object picker for 3D mouse selection
#[derive(Debug, Default)]
pub struct ObjectPicker;

impl ObjectPicker {
    /// Create a new object picker
    pub fn new() -> Self {
        Self
    }

    /// Convert screen coordinates to a world-space ray
    pub fn screen_to_ray(
        &self,
        screen_pos: (f32, f32),
        screen_size: (f32, f32),
        camera: &OrbitCamera,
    ) -> Ray {
        let (mouse_x, mouse_y) = screen_pos;
        let (screen_width, screen_height) = screen_size;

        // Normalized device coordinates, Y up
        let ndc_x = (2.0 * mouse_x) / screen_width.max(1.0) - 1.0;
        let ndc_y = 1.0 - (2.0 * mouse_y) / screen_height.max(1.0);

        let view_proj = camera.projection_matrix() * camera.view_matrix();
        let inv_view_proj = view_proj.invert().unwrap_or(Matrix4::identity());

        // wgpu clip space depth runs from 0 (near) to 1 (far)
        let unproject = |z: f32| {
            let p = inv_view_proj * Vector4::new(ndc_x, ndc_y, z, 1.0);
            p.truncate() / p.w
        };
        let near = unproject(0.0);
        let far = unproject(1.0);

        Ray::new(near, far - near)
    }

    /// Finds the nearest hit among `candidates`.
    ///
    /// Candidates that are hidden, missing or not meshes are skipped. Line
    /// meshes never register hits.
    pub fn pick(
        &self,
        ray: &Ray,
        scene: &Scene,
        candidates: impl IntoIterator<Item = NodeId>,
    ) -> Option<PickResult> {
        let mut closest: Option<PickResult> = None;

        for node_id in candidates {
            if !scene.graph.is_visible(node_id) {
                continue;
            }
            let Some(mesh) = scene.graph.get(node_id).and_then(|n| n.as_mesh()) else {
                continue;
            };
            let Some(world) = scene.graph.world_matrix(node_id) else {
                continue;
            };

            // Broad phase
            let Some(box_distance) = mesh.mesh.bounds().transform(&world).intersect_ray(ray) else {
                continue;
            };
            if closest.is_some_and(|c| box_distance > c.distance) {
                continue;
            }

            // Narrow phase, in the mesh's own space
            let Some(inverse) = world.invert() else {
                continue;
            };
            let local_ray = ray.transformed(&inverse);
            let Some(t) = mesh
                .mesh
                .triangles()
                .filter_map(|tri| local_ray.intersect_triangle(&tri))
                .min_by(f32::total_cmp)
            else {
                continue;
            };

            let local_hit = local_ray.origin + local_ray.direction * t;
            let world_hit = (world * local_hit.extend(1.0)).truncate();
            let distance = (world_hit - ray.origin).magnitude();

            if closest.map_or(true, |c| distance < c.distance) {
                closest = Some(PickResult {
                    node: node_id,
                    distance,
                    intersection_point: world_hit,
                });
            }
        }

        closest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        geometry::generate_sphere,
        scene::{Material, MeshData, Node, Transform},
    };
    use std::sync::Arc;

    fn sphere_at(scene: &mut Scene, x: f32, z: f32) -> NodeId {
        let mesh = Arc::new(MeshData::from_geometry("sphere", &generate_sphere(0.5, 16, 16)));
        scene.graph.insert(
            None,
            Node::mesh("sphere", mesh, Material::default())
                .with_transform(Transform::from_position(x, 0.5, z)),
        )
    }

    #[test]
    fn test_aabb_creation() {
        let vertices = vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [-1.0, -1.0, -1.0]];
        let aabb = Aabb::from_vertices(&vertices);

        assert_eq!(aabb.min, Vector3::new(-1.0, -1.0, -1.0));
        assert_eq!(aabb.max, Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_ray_aabb_intersection() {
        let aabb = Aabb::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));

        let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(aabb.intersect_ray(&ray), Some(4.0));

        let ray_miss = Ray::new(Vector3::new(5.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&ray_miss).is_none());
    }

    #[test]
    fn test_ray_triangle_intersection() {
        let triangle = [[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [0.0, 1.0, 0.0]];
        let ray = Ray::new(Vector3::new(0.0, 0.0, 3.0), Vector3::new(0.0, 0.0, -1.0));
        let t = ray.intersect_triangle(&triangle).unwrap();
        assert!((t - 3.0).abs() < 1e-5);

        let miss = Ray::new(Vector3::new(2.0, 0.0, 3.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(miss.intersect_triangle(&triangle).is_none());
    }

    #[test]
    fn test_ray_plane_intersection() {
        let plane = Plane::new(Vector3::zero(), Vector3::unit_y());
        let ray = Ray::new(Vector3::new(0.0, 2.0, 0.0), Vector3::new(0.0, -1.0, 0.0));
        assert_eq!(ray.intersect_plane(&plane), Some(2.0));
        let away = Ray::new(Vector3::new(0.0, 2.0, 0.0), Vector3::new(0.0, 1.0, 0.0));
        assert!(away.intersect_plane(&plane).is_none());
    }

    #[test]
    fn test_pick_nearest_candidate() {
        let mut scene = Scene::new([0.0; 3]);
        let near = sphere_at(&mut scene, 0.0, 2.0);
        let far = sphere_at(&mut scene, 0.0, -2.0);

        // Slightly off-axis so the ray does not graze a shared vertex.
        let ray = Ray::new(Vector3::new(0.02, 0.53, 10.0), Vector3::new(0.0, 0.0, -1.0));
        let hit = ObjectPicker::new().pick(&ray, &scene, [far, near]).unwrap();
        assert_eq!(hit.node, near);
        assert!((hit.distance - 7.5).abs() < 0.05);
    }

    #[test]
    fn test_pick_ignores_non_candidates() {
        let mut scene = Scene::new([0.0; 3]);
        let _sphere = sphere_at(&mut scene, 0.0, 0.0);
        let ray = Ray::new(Vector3::new(0.0, 0.5, 10.0), Vector3::new(0.0, 0.0, -1.0));
        // Neither the sphere nor the ground are candidates.
        assert!(ObjectPicker::new().pick(&ray, &scene, []).is_none());
    }

    #[test]
    fn test_screen_centre_ray_points_at_target() {
        let camera = OrbitCamera::editor_default(1.6);
        let ray = ObjectPicker::new().screen_to_ray((640.0, 400.0), (1280.0, 800.0), &camera);
        let expected = (camera.target - camera.eye).normalize();
        assert!((ray.direction - expected).magnitude() < 1e-3);
    }
}
