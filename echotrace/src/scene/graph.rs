//! Host scene-graph interface.

use crate::math::Affine3A;
use crate::scene::geometry::NodeGeometry;
use crate::scene::material::MaterialAnnotation;

/// Stable identifier of a host scene node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Structural mutation notification raised by the host.
///
/// Additions arrive parent before children, removals child before parent.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SceneEvent {
    NodeAdded(NodeId),
    NodeRemoved(NodeId),
}

/// Read-only view of the host's node hierarchy.
///
/// The acoustic world never mutates the hierarchy; it only walks it, reads
/// transforms, geometry and material annotations. Queries on unknown nodes
/// return empty/identity values rather than failing.
pub trait SceneGraph {
    fn root(&self) -> NodeId;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> &[NodeId];

    /// Display name, used only for log messages.
    fn name(&self, node: NodeId) -> &str;

    fn global_transform(&self, node: NodeId) -> Affine3A;

    fn geometry(&self, node: NodeId) -> Option<&NodeGeometry>;

    fn material(&self, node: NodeId) -> Option<&MaterialAnnotation>;
}
