//! Parent/child hierarchy of scene nodes.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};

use cgmath::{Matrix4, SquareMatrix, Vector3, Vector4};

use super::node::{Node, NodeId};

// Shared across graphs: ids stay unique after a scene rebuild.
static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Owns every node in the scene and the links between them.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, Node>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `node` under `parent` (or as a root) and returns its new id.
    ///
    /// A parent that is no longer in the graph demotes the node to a root.
    pub fn insert(&mut self, parent: Option<NodeId>, mut node: Node) -> NodeId {
        let id = NodeId::from_raw(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed));
        node.id = id;
        node.children.clear();

        match parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(parent_node) => {
                parent_node.children.push(id);
                node.parent = Some(parent_node.id);
            }
            None => {
                if let Some(missing) = parent {
                    log::warn!("Parent {} not found, inserting '{}' as a root", missing, node.name);
                }
                node.parent = None;
                self.roots.push(id);
            }
        }

        self.nodes.insert(id, node);
        id
    }

    /// Removes a node and everything below it, returning the removed ids in
    /// pre-order. Unknown ids remove nothing.
    pub fn detach_subtree(&mut self, id: NodeId) -> Vec<NodeId> {
        let removed = self.descendants(id);
        if removed.is_empty() {
            return removed;
        }

        match self.nodes.get(&id).and_then(|n| n.parent) {
            Some(parent) => {
                if let Some(parent_node) = self.nodes.get_mut(&parent) {
                    parent_node.children.retain(|&c| c != id);
                }
            }
            None => self.roots.retain(|&r| r != id),
        }

        for node in &removed {
            self.nodes.remove(node);
        }
        removed
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Pre-order traversal of the subtree rooted at `id`, `id` included.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Every node reachable from the roots, parents before children.
    pub fn iter_depth_first(&self) -> impl Iterator<Item = &Node> + '_ {
        self.roots
            .iter()
            .flat_map(move |&root| self.descendants(root))
            .filter_map(move |id| self.nodes.get(&id))
    }

    pub fn world_matrix(&self, id: NodeId) -> Option<Matrix4<f32>> {
        let mut node = self.nodes.get(&id)?;
        let mut matrix = node.transform.matrix();
        while let Some(parent) = node.parent.and_then(|p| self.nodes.get(&p)) {
            matrix = parent.transform.matrix() * matrix;
            node = parent;
        }
        Some(matrix)
    }

    pub fn world_position(&self, id: NodeId) -> Option<Vector3<f32>> {
        self.world_matrix(id).map(|m| m.w.truncate())
    }

    /// True when the node and all of its ancestors are visible.
    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut current = self.nodes.get(&id);
        while let Some(node) = current {
            if !node.visible {
                return false;
            }
            current = node.parent.and_then(|p| self.nodes.get(&p));
        }
        true
    }

    /// Moves a node so its world-space origin lands on `world`.
    pub fn set_world_position(&mut self, id: NodeId, world: Vector3<f32>) -> bool {
        let Some(parent) = self.nodes.get(&id).map(|n| n.parent) else {
            return false;
        };
        let local = match parent.and_then(|p| self.world_matrix(p)) {
            Some(parent_world) => match parent_world.invert() {
                Some(inverse) => (inverse * Vector4::new(world.x, world.y, world.z, 1.0)).truncate(),
                None => return false,
            },
            None => world,
        };
        if let Some(node) = self.nodes.get_mut(&id) {
            node.transform.position = local;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::node::{NodeKind, Transform};
    use cgmath::InnerSpace;

    fn group(name: &str, transform: Transform) -> Node {
        Node::new(name, NodeKind::Group).with_transform(transform)
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut graph = SceneGraph::new();
        let a = graph.insert(None, group("a", Transform::default()));
        graph.detach_subtree(a);
        let b = graph.insert(None, group("b", Transform::default()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_detach_removes_whole_subtree() {
        let mut graph = SceneGraph::new();
        let light = graph.insert(None, group("light", Transform::default()));
        let proxy = graph.insert(Some(light), group("proxy", Transform::default()));
        let target = graph.insert(Some(light), group("target", Transform::default()));
        let other = graph.insert(None, group("other", Transform::default()));

        let removed = graph.detach_subtree(light);
        assert_eq!(removed, vec![light, proxy, target]);
        assert!(!graph.contains(proxy));
        assert_eq!(graph.roots(), &[other]);
        assert!(graph.detach_subtree(light).is_empty());
    }

    #[test]
    fn test_world_matrix_composes_parents() {
        let mut graph = SceneGraph::new();
        let parent = graph.insert(
            None,
            group("parent", Transform::from_position(0.0, 5.0, 0.0).with_uniform_scale(2.0)),
        );
        let child = graph.insert(Some(parent), group("child", Transform::from_position(0.0, 0.0, -1.0)));
        let world = graph.world_position(child).unwrap();
        assert!((world - Vector3::new(0.0, 5.0, -2.0)).magnitude() < 1e-5);
    }

    #[test]
    fn test_set_world_position_inverts_parent() {
        let mut graph = SceneGraph::new();
        let parent = graph.insert(
            None,
            group("parent", Transform::from_position(1.0, 0.0, 0.0).with_uniform_scale(0.5)),
        );
        let child = graph.insert(Some(parent), group("child", Transform::default()));
        assert!(graph.set_world_position(child, Vector3::new(2.0, 1.0, 0.0)));
        let local = graph.get(child).unwrap().transform.position;
        assert!((local - Vector3::new(2.0, 2.0, 0.0)).magnitude() < 1e-5);
        let world = graph.world_position(child).unwrap();
        assert!((world - Vector3::new(2.0, 1.0, 0.0)).magnitude() < 1e-5);
    }

    #[test]
    fn test_hidden_parent_hides_children() {
        let mut graph = SceneGraph::new();
        let parent = graph.insert(None, group("parent", Transform::default()));
        let child = graph.insert(Some(parent), group("child", Transform::default()));
        graph.get_mut(parent).unwrap().visible = false;
        assert!(!graph.is_visible(child));
    }
}
