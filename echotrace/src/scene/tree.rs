//! In-memory host scene graph.
//!
//! `SceneTree` is a small reference host: it owns a node hierarchy, computes
//! world transforms from local ones, and queues [`SceneEvent`]s in the same
//! order a game engine would fire them (parent before children on add,
//! children before parent on remove).

use crate::math::Affine3A;
use crate::scene::geometry::NodeGeometry;
use crate::scene::graph::{NodeId, SceneEvent, SceneGraph};
use crate::scene::material::MaterialAnnotation;
use std::collections::HashMap;

/// Data carried by a node.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub local_transform: Affine3A,
    pub geometry: Option<NodeGeometry>,
    pub material: Option<MaterialAnnotation>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local_transform: Affine3A::IDENTITY,
            geometry: None,
            material: None,
        }
    }

    pub fn with_transform(mut self, transform: Affine3A) -> Self {
        self.local_transform = transform;
        self
    }

    pub fn with_geometry(mut self, geometry: NodeGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_material(mut self, material: MaterialAnnotation) -> Self {
        self.material = Some(material);
        self
    }
}

#[derive(Debug)]
struct NodeEntry {
    node: SceneNode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
pub struct SceneTree {
    nodes: HashMap<NodeId, NodeEntry>,
    root: NodeId,
    next_id: u64,
    pending: Vec<SceneEvent>,
}

impl SceneTree {
    pub fn new() -> Self {
        let root = NodeId::new(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            NodeEntry {
                node: SceneNode::new("root"),
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            nodes,
            root,
            next_id: 1,
            pending: Vec::new(),
        }
    }

    /// Adds `node` under `parent` and queues a `NodeAdded` event.
    ///
    /// Returns `None` if the parent does not exist.
    pub fn add_child(&mut self, parent: NodeId, node: SceneNode) -> Option<NodeId> {
        if !self.nodes.contains_key(&parent) {
            return None;
        }

        let id = NodeId::new(self.next_id);
        self.next_id += 1;

        self.nodes.insert(
            id,
            NodeEntry {
                node,
                parent: Some(parent),
                children: Vec::new(),
            },
        );
        if let Some(entry) = self.nodes.get_mut(&parent) {
            entry.children.push(id);
        }
        self.pending.push(SceneEvent::NodeAdded(id));
        Some(id)
    }

    /// Removes `node` and its whole subtree, queueing `NodeRemoved` events
    /// children-first. The root cannot be removed.
    ///
    /// Returns the number of nodes removed.
    pub fn remove(&mut self, node: NodeId) -> usize {
        if node == self.root || !self.nodes.contains_key(&node) {
            return 0;
        }

        let mut order = Vec::new();
        self.collect_post_order(node, &mut order);

        if let Some(parent) = self.nodes.get(&node).and_then(|e| e.parent) {
            if let Some(entry) = self.nodes.get_mut(&parent) {
                entry.children.retain(|child| *child != node);
            }
        }

        for id in &order {
            self.nodes.remove(id);
            self.pending.push(SceneEvent::NodeRemoved(*id));
        }
        order.len()
    }

    fn collect_post_order(&self, node: NodeId, out: &mut Vec<NodeId>) {
        for child in self.children(node) {
            self.collect_post_order(*child, out);
        }
        out.push(node);
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id).map(|e| &e.node)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id).map(|e| &mut e.node)
    }

    pub fn set_local_transform(&mut self, id: NodeId, transform: Affine3A) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.local_transform = transform;
                true
            }
            None => false,
        }
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

    /// Takes the events queued since the last call, in firing order.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.pending)
    }
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph for SceneTree {
    fn root(&self) -> NodeId {
        self.root
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|e| e.parent)
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(&node)
            .map(|e| e.children.as_slice())
            .unwrap_or(&[])
    }

    fn name(&self, node: NodeId) -> &str {
        self.nodes
            .get(&node)
            .map(|e| e.node.name.as_str())
            .unwrap_or("<removed>")
    }

    fn global_transform(&self, node: NodeId) -> Affine3A {
        let mut transform = Affine3A::IDENTITY;
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(entry) = self.nodes.get(&id) else {
                break;
            };
            transform = entry.node.local_transform * transform;
            current = entry.parent;
        }
        transform
    }

    fn geometry(&self, node: NodeId) -> Option<&NodeGeometry> {
        self.nodes.get(&node).and_then(|e| e.node.geometry.as_ref())
    }

    fn material(&self, node: NodeId) -> Option<&MaterialAnnotation> {
        self.nodes.get(&node).and_then(|e| e.node.material.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn test_event_order() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let a = tree.add_child(root, SceneNode::new("a")).unwrap();
        let b = tree.add_child(a, SceneNode::new("b")).unwrap();
        let c = tree.add_child(b, SceneNode::new("c")).unwrap();

        assert_eq!(
            tree.drain_events(),
            vec![
                SceneEvent::NodeAdded(a),
                SceneEvent::NodeAdded(b),
                SceneEvent::NodeAdded(c)
            ]
        );

        assert_eq!(tree.remove(a), 3);
        assert_eq!(
            tree.drain_events(),
            vec![
                SceneEvent::NodeRemoved(c),
                SceneEvent::NodeRemoved(b),
                SceneEvent::NodeRemoved(a)
            ]
        );
        assert!(tree.children(root).is_empty());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_root_cannot_be_removed() {
        let mut tree = SceneTree::new();
        assert_eq!(tree.remove(tree.root()), 0);
        assert!(tree.drain_events().is_empty());
    }

    #[test]
    fn test_global_transform_composes_parents() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let parent = tree
            .add_child(
                root,
                SceneNode::new("parent")
                    .with_transform(Affine3A::from_translation(Vec3::new(10.0, 0.0, 0.0))),
            )
            .unwrap();
        let child = tree
            .add_child(
                parent,
                SceneNode::new("child")
                    .with_transform(Affine3A::from_translation(Vec3::new(0.0, 2.0, 0.0))),
            )
            .unwrap();

        let origin = tree.global_transform(child).translation;
        assert_eq!(Vec3::from(origin), Vec3::new(10.0, 2.0, 0.0));
    }
}
