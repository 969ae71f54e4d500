//! Side-table of editor metadata for every interactive node.

use std::collections::HashMap;

use thiserror::Error;

use crate::gfx::scene::NodeId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("node {0} is already registered")]
    AlreadyRegistered(NodeId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryKind {
    /// One mesh part of a loaded model
    Model {
        /// Model file the part came from
        path: String,
        /// Selected name from the object texture table
        texture: Option<&'static str>,
        /// Ticket of the texture fetch still in flight for this part
        pending_texture: Option<u64>,
    },
    /// The proxy sphere of a spotlight
    Light { light: NodeId, target: NodeId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub kind: EntryKind,
}

impl RegistryEntry {
    pub fn model(path: impl Into<String>, texture: Option<&'static str>) -> Self {
        Self {
            kind: EntryKind::Model {
                path: path.into(),
                texture,
                pending_texture: None,
            },
        }
    }

    pub fn light(light: NodeId, target: NodeId) -> Self {
        Self {
            kind: EntryKind::Light { light, target },
        }
    }

    pub fn is_light(&self) -> bool {
        matches!(self.kind, EntryKind::Light { .. })
    }
}

/// Maps interactive nodes to their metadata and keeps them in pick order.
///
/// The interactive list and the entry map only change together, so a node has
/// an entry exactly when it is interactive.
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<NodeId, RegistryEntry>,
    interactive: Vec<NodeId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: NodeId, entry: RegistryEntry) -> Result<(), RegistryError> {
        if self.entries.contains_key(&id) {
            log::warn!("Node {} registered twice, keeping the first entry", id);
            return Err(RegistryError::AlreadyRegistered(id));
        }
        self.entries.insert(id, entry);
        self.interactive.push(id);
        Ok(())
    }

    /// `None` means the node is not interactive (ground, grid, light target).
    pub fn lookup(&self, id: NodeId) -> Option<&RegistryEntry> {
        self.entries.get(&id)
    }

    pub fn lookup_mut(&mut self, id: NodeId) -> Option<&mut RegistryEntry> {
        self.entries.get_mut(&id)
    }

    pub fn unregister(&mut self, id: NodeId) -> Option<RegistryEntry> {
        let entry = self.entries.remove(&id)?;
        self.interactive.retain(|&node| node != id);
        Some(entry)
    }

    pub fn interactive(&self) -> &[NodeId] {
        &self.interactive
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> NodeId {
        NodeId::from_raw(raw)
    }

    fn assert_consistent(registry: &Registry) {
        for &node in registry.interactive() {
            assert!(registry.lookup(node).is_some());
        }
        assert_eq!(registry.interactive().len(), registry.len());
    }

    #[test]
    fn test_lookup_iff_interactive() {
        let mut registry = Registry::new();
        registry.register(id(1), RegistryEntry::model("duck.obj", None)).unwrap();
        registry.register(id(2), RegistryEntry::light(id(3), id(4))).unwrap();
        assert_consistent(&registry);
        assert!(registry.lookup(id(3)).is_none());

        registry.unregister(id(1));
        assert_consistent(&registry);
        assert_eq!(registry.interactive(), &[id(2)]);
    }

    #[test]
    fn test_double_registration_keeps_first_entry() {
        let mut registry = Registry::new();
        registry.register(id(1), RegistryEntry::model("cat.obj", None)).unwrap();
        let err = registry
            .register(id(1), RegistryEntry::model("duck.obj", None))
            .unwrap_err();
        assert_eq!(err, RegistryError::AlreadyRegistered(id(1)));
        assert_eq!(registry.interactive().len(), 1);
        assert!(matches!(
            &registry.lookup(id(1)).unwrap().kind,
            EntryKind::Model { path, .. } if path == "cat.obj"
        ));
    }

    #[test]
    fn test_unregister_missing_is_noop() {
        let mut registry = Registry::new();
        assert!(registry.unregister(id(9)).is_none());
        assert!(registry.is_empty());
    }
}
