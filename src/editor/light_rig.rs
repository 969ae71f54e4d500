//! Spotlight subtrees: a light node carrying a proxy sphere and an aim target.
//!
//! The proxy is what the user clicks and edits. Its X and Y rotation fields
//! never rotate the sphere itself; they swing the target around the light on
//! the matching axis, keeping the target's distance in that plane.

use std::{f32::consts::FRAC_PI_4, sync::Arc};

use cgmath::{Deg, Rad, Vector3};

use crate::gfx::{
    geometry::generate_sphere,
    scene::{Material, MeshData, Node, NodeId, NodeKind, Scene, SceneGraph, SpotLight, Transform},
};

/// Below this projected distance the target is put back at unit distance.
pub const AXIS_EPSILON: f32 = 1e-6;

pub const PROXY_RADIUS: f32 = 0.2;
pub const LIGHT_START: [f32; 3] = [0.0, 5.0, 0.0];

/// Node ids of one spotlight subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightRig {
    pub light: NodeId,
    pub proxy: NodeId,
    pub target: NodeId,
}

/// Adds a shadow-casting white spotlight above the origin, aimed along -Z.
pub fn spawn_spotlight(scene: &mut Scene) -> LightRig {
    let placeholder = NodeId::from_raw(0);
    let mut spot = SpotLight::new([1.0, 1.0, 1.0], 1.0, placeholder);
    spot.cast_shadow = true;
    spot.penumbra = 0.1;
    spot.decay = 1.0;
    spot.distance = 100.0;
    spot.set_angle(Rad(FRAC_PI_4));

    let [x, y, z] = LIGHT_START;
    let light = scene.graph.insert(
        None,
        Node::new("Spot Light", NodeKind::SpotLight(spot))
            .with_transform(Transform::from_position(x, y, z)),
    );

    let sphere = MeshData::from_geometry("light proxy", &generate_sphere(PROXY_RADIUS, 16, 16));
    let proxy = scene.graph.insert(
        Some(light),
        Node::mesh("Light Proxy", Arc::new(sphere), Material::emissive([1.0, 1.0, 1.0], 1.0)),
    );
    let target = scene.graph.insert(
        Some(light),
        Node::new("Light Target", NodeKind::Empty)
            .with_transform(Transform::from_position(0.0, 0.0, -1.0)),
    );

    if let Some(spot) = scene.graph.get_mut(light).and_then(Node::as_spot_light_mut) {
        spot.target = target;
    }

    LightRig { light, proxy, target }
}

fn target_position(graph: &mut SceneGraph, target: NodeId) -> Option<&mut Vector3<f32>> {
    graph.get_mut(target).map(|node| &mut node.transform.position)
}

fn zero_proxy_axis(graph: &mut SceneGraph, proxy: NodeId, axis: usize) {
    if let Some(node) = graph.get_mut(proxy) {
        node.transform.rotation[axis] = 0.0;
    }
}

/// Swings the target in the YZ plane at unit distance: `y = sin θ`, `z = -cos θ`.
///
/// X is left alone, so the aim keeps any Y swing already applied.
pub fn apply_rotation_x(graph: &mut SceneGraph, proxy: NodeId, target: NodeId, angle: Rad<f32>) {
    if let Some(position) = target_position(graph, target) {
        position.y = angle.0.sin();
        position.z = -angle.0.cos();
    }
    zero_proxy_axis(graph, proxy, 0);
}

/// Swings the target in the XZ plane: `x = sin θ · d`, `z = -cos θ · d`.
pub fn apply_rotation_y(graph: &mut SceneGraph, proxy: NodeId, target: NodeId, angle: Rad<f32>) {
    if let Some(position) = target_position(graph, target) {
        let mut d = (position.x * position.x + position.z * position.z).sqrt();
        if d < AXIS_EPSILON {
            d = 1.0;
        }
        position.x = angle.0.sin() * d;
        position.z = -angle.0.cos() * d;
    }
    zero_proxy_axis(graph, proxy, 1);
}

/// Rolls the light node itself about Z.
pub fn apply_rotation_z(graph: &mut SceneGraph, proxy: NodeId, light: NodeId, angle: Rad<f32>) {
    if let Some(node) = graph.get_mut(light) {
        node.transform.rotation.z = angle.0;
    }
    zero_proxy_axis(graph, proxy, 2);
}

/// Rotation field values (degrees) as implied by the current target and roll.
pub fn displayed_rotation(graph: &SceneGraph, light: NodeId, target: NodeId) -> [f32; 3] {
    let aim = graph
        .get(target)
        .map(|node| node.transform.position)
        .unwrap_or(Vector3::new(0.0, 0.0, -1.0));
    let roll = graph.get(light).map_or(0.0, |node| node.transform.rotation.z);
    [
        Deg::from(Rad(aim.y.atan2(-aim.z))).0,
        Deg::from(Rad(aim.x.atan2(-aim.z))).0,
        Deg::from(Rad(roll)).0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    fn target_of(scene: &Scene, rig: &LightRig) -> Vector3<f32> {
        scene.graph.get(rig.target).unwrap().transform.position
    }

    #[test]
    fn test_spawned_rig_layout() {
        let mut scene = Scene::new([0.0; 3]);
        let rig = spawn_spotlight(&mut scene);
        let light = scene.graph.get(rig.light).unwrap();
        assert_eq!(light.children(), &[rig.proxy, rig.target]);

        let spot = light.as_spot_light().unwrap();
        assert_eq!(spot.target, rig.target);
        assert!(spot.cast_shadow);
        assert!((spot.angle_degrees() - 45.0).abs() < 1e-4);

        let target = scene.graph.world_position(rig.target).unwrap();
        assert!((target - Vector3::new(0.0, 5.0, -1.0)).magnitude() < 1e-5);
    }

    #[test]
    fn test_rotation_x_follows_spherical_projection() {
        let mut scene = Scene::new([0.0; 3]);
        let rig = spawn_spotlight(&mut scene);
        let theta = Rad::from(Deg(30.0));

        apply_rotation_x(&mut scene.graph, rig.proxy, rig.target, theta);
        let t = target_of(&scene, &rig);
        assert!((t.y - theta.0.sin()).abs() < 1e-5);
        assert!((t.z + theta.0.cos()).abs() < 1e-5);
        assert_eq!(scene.graph.get(rig.proxy).unwrap().transform.rotation.x, 0.0);

        apply_rotation_x(&mut scene.graph, rig.proxy, rig.target, Rad(0.0));
        let t = target_of(&scene, &rig);
        assert!((t - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-5);
    }

    #[test]
    fn test_rotation_x_ignores_previous_y_swing() {
        let mut scene = Scene::new([0.0; 3]);
        let rig = spawn_spotlight(&mut scene);
        let thirty = Rad::from(Deg(30.0));

        apply_rotation_x(&mut scene.graph, rig.proxy, rig.target, thirty);
        apply_rotation_y(&mut scene.graph, rig.proxy, rig.target, Rad::from(Deg(90.0)));
        apply_rotation_x(&mut scene.graph, rig.proxy, rig.target, thirty);

        let t = target_of(&scene, &rig);
        let expected = Vector3::new(thirty.0.cos(), thirty.0.sin(), -thirty.0.cos());
        assert!((t - expected).magnitude() < 1e-4);
    }

    #[test]
    fn test_rotation_y_keeps_planar_distance() {
        let mut scene = Scene::new([0.0; 3]);
        let rig = spawn_spotlight(&mut scene);
        scene.graph.get_mut(rig.target).unwrap().transform.position = Vector3::new(0.0, 0.0, -3.0);

        apply_rotation_y(&mut scene.graph, rig.proxy, rig.target, Rad::from(Deg(90.0)));
        let t = target_of(&scene, &rig);
        assert!((t - Vector3::new(3.0, 0.0, 0.0)).magnitude() < 1e-4);
    }

    #[test]
    fn test_degenerate_distance_falls_back_to_unit() {
        let mut scene = Scene::new([0.0; 3]);
        let rig = spawn_spotlight(&mut scene);
        scene.graph.get_mut(rig.target).unwrap().transform.position = Vector3::new(0.0, 2.0, 0.0);

        // Nothing in the XZ plane to preserve.
        apply_rotation_y(&mut scene.graph, rig.proxy, rig.target, Rad(0.0));
        let t = target_of(&scene, &rig);
        assert!((t - Vector3::new(0.0, 2.0, -1.0)).magnitude() < 1e-5);
    }

    #[test]
    fn test_rotation_z_rolls_light_not_proxy() {
        let mut scene = Scene::new([0.0; 3]);
        let rig = spawn_spotlight(&mut scene);
        scene.graph.get_mut(rig.proxy).unwrap().transform.rotation.z = 1.0;

        apply_rotation_z(&mut scene.graph, rig.proxy, rig.light, Rad(0.5));
        assert_eq!(scene.graph.get(rig.light).unwrap().transform.rotation.z, 0.5);
        assert_eq!(scene.graph.get(rig.proxy).unwrap().transform.rotation.z, 0.0);
    }

    #[test]
    fn test_displayed_rotation_reads_back_edit() {
        let mut scene = Scene::new([0.0; 3]);
        let rig = spawn_spotlight(&mut scene);
        apply_rotation_x(&mut scene.graph, rig.proxy, rig.target, Rad::from(Deg(40.0)));
        let [x, y, _] = displayed_rotation(&scene.graph, rig.light, rig.target);
        assert!((x - 40.0).abs() < 1e-3);
        assert!(y.abs() < 1e-3);
    }
}
