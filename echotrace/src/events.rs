//! Advisory events reported by the acoustic world.
//!
//! Nothing here is fatal. Each event is also logged when it is raised; hosts
//! that want to react programmatically drain them with
//! [`AcousticWorld::poll_events`](crate::AcousticWorld::poll_events).

use crate::scene::{MaterialId, NodeId, PrimitiveHandle};

/// Sending half of the event channel, cloned into every reporting component.
pub type EventSender = crossbeam_channel::Sender<EchotraceEvent>;

#[derive(Debug, Clone, PartialEq)]
pub enum EchotraceEvent {
    PrimitiveCreated {
        node: NodeId,
        handle: PrimitiveHandle,
        material: MaterialId,
    },
    PrimitiveRemoved {
        node: NodeId,
        handle: PrimitiveHandle,
    },
    /// The node's shape kind changed, so its primitive was rebuilt.
    PrimitiveRecreated {
        node: NodeId,
        old_handle: PrimitiveHandle,
        new_handle: PrimitiveHandle,
    },
    PrimitiveSkipped {
        node: NodeId,
        reason: String,
    },
    /// A node asked for a primitive while already owning one.
    DuplicatePrimitive {
        node: NodeId,
    },
    UnknownMaterial {
        node: NodeId,
        name: String,
    },
    MaterialRegistered {
        id: MaterialId,
        name: String,
    },
    MaterialRejected {
        name: String,
        reason: String,
    },
    DeviceLost,
    DeviceRecreated,
}

impl EchotraceEvent {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::PrimitiveCreated { node, .. }
            | Self::PrimitiveRemoved { node, .. }
            | Self::PrimitiveRecreated { node, .. }
            | Self::PrimitiveSkipped { node, .. }
            | Self::DuplicatePrimitive { node }
            | Self::UnknownMaterial { node, .. } => Some(*node),
            _ => None,
        }
    }

    /// Conditions a host would usually want to surface as a warning.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::PrimitiveSkipped { .. }
                | Self::DuplicatePrimitive { .. }
                | Self::UnknownMaterial { .. }
                | Self::MaterialRejected { .. }
        )
    }

    pub fn is_primitive_event(&self) -> bool {
        matches!(
            self,
            Self::PrimitiveCreated { .. }
                | Self::PrimitiveRemoved { .. }
                | Self::PrimitiveRecreated { .. }
                | Self::PrimitiveSkipped { .. }
                | Self::DuplicatePrimitive { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_classification() {
        let node = NodeId::new(7);
        let skipped = EchotraceEvent::PrimitiveSkipped {
            node,
            reason: "no triangles".to_string(),
        };
        assert_eq!(skipped.node(), Some(node));
        assert!(skipped.is_warning());
        assert!(skipped.is_primitive_event());

        let unknown = EchotraceEvent::UnknownMaterial {
            node,
            name: "velvet".to_string(),
        };
        assert_eq!(unknown.node(), Some(node));
        assert!(!unknown.is_primitive_event());

        assert_eq!(EchotraceEvent::DeviceLost.node(), None);
        assert!(!EchotraceEvent::DeviceLost.is_warning());
    }
}
