//! Primitive registry: the node → primitive side-table.
//!
//! The registry owns every acoustic primitive it creates. The raytracer only
//! ever sees them by reference, keyed by the [`PrimitiveHandle`] stored here.

use std::collections::HashMap;

use crate::convert;
use crate::events::{EchotraceEvent, EventSender};
use crate::math::Aabb;
use crate::scene::{
    AcousticPrimitive, AcousticRaytracer, MaterialId, NodeId, PrimitiveHandle, SceneGraph,
};

#[derive(Debug)]
struct RegisteredPrimitive {
    handle: PrimitiveHandle,
    primitive: AcousticPrimitive,
}

pub struct PrimitiveRegistry {
    entries: HashMap<NodeId, RegisteredPrimitive>,
    next_handle: u64,
    events: EventSender,
}

impl PrimitiveRegistry {
    pub fn new(events: EventSender) -> Self {
        Self {
            entries: HashMap::new(),
            next_handle: 0,
            events,
        }
    }

    fn allocate_handle(&mut self) -> PrimitiveHandle {
        let handle = PrimitiveHandle::new(self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// Creates and registers a primitive for `node` if it has convertible
    /// geometry and a non-air material.
    ///
    /// Calling this for a node that already owns a primitive is reported and
    /// otherwise ignored; the existing handle is returned.
    pub fn add_or_update(
        &mut self,
        scene: &dyn SceneGraph,
        node: NodeId,
        material: MaterialId,
        world_bounds: &Aabb,
        raytracer: &mut dyn AcousticRaytracer,
    ) -> Option<PrimitiveHandle> {
        if let Some(existing) = self.entries.get(&node) {
            log::error!(
                "'{}' ({}) already owns {}, not creating another primitive",
                scene.name(node),
                node,
                existing.handle
            );
            let _ = self.events.send(EchotraceEvent::DuplicatePrimitive { node });
            return Some(existing.handle);
        }

        let geometry = scene.geometry(node)?;
        if material.is_air() {
            log::debug!(
                "Skipping '{}': material resolves to air",
                scene.name(node)
            );
            return None;
        }

        let transform = scene.global_transform(node);
        let shape = match convert::convert(geometry, &transform, world_bounds) {
            Ok(shape) => shape,
            Err(err) => {
                log::warn!(
                    "No primitive created for '{}' ({}): {}",
                    scene.name(node),
                    geometry.kind_name(),
                    err
                );
                let _ = self.events.send(EchotraceEvent::PrimitiveSkipped {
                    node,
                    reason: err.to_string(),
                });
                return None;
            }
        };

        let handle = self.allocate_handle();
        let primitive = AcousticPrimitive::new(shape, material);
        raytracer.add_primitive(handle, &primitive);
        log::debug!(
            "Created {:?} primitive {} for '{}' with material {}",
            primitive.kind(),
            handle,
            scene.name(node),
            material
        );
        self.entries.insert(node, RegisteredPrimitive { handle, primitive });
        let _ = self.events.send(EchotraceEvent::PrimitiveCreated {
            node,
            handle,
            material,
        });
        Some(handle)
    }

    /// Unregisters the primitive owned by `node`. Returns false (and makes no
    /// raytracer call) if the node owns none.
    pub fn remove(&mut self, node: NodeId, raytracer: &mut dyn AcousticRaytracer) -> bool {
        let Some(entry) = self.entries.remove(&node) else {
            return false;
        };
        raytracer.remove_primitive(entry.handle);
        log::debug!("Removed primitive {} of {}", entry.handle, node);
        let _ = self.events.send(EchotraceEvent::PrimitiveRemoved {
            node,
            handle: entry.handle,
        });
        true
    }

    /// Pushes current transforms and dimensions for every primitive owned by a
    /// node in the subtree under `root`. Returns the number of primitives
    /// updated in place.
    ///
    /// Primitives are updated in place. If a node's geometry now converts to a
    /// different shape kind, its primitive is replaced; if the geometry is
    /// gone or no longer convertible, the primitive is removed.
    pub fn refresh_transforms(
        &mut self,
        scene: &dyn SceneGraph,
        root: NodeId,
        world_bounds: &Aabb,
        raytracer: &mut dyn AcousticRaytracer,
    ) -> usize {
        if self.entries.is_empty() {
            return 0;
        }

        let mut updated = 0;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            stack.extend(scene.children(node).iter().rev().copied());

            let Some(entry) = self.entries.get_mut(&node) else {
                continue;
            };

            let geometry = scene.geometry(node);
            let expected = geometry.and_then(convert::expected_kind);
            let Some((geometry, kind)) = geometry.zip(expected) else {
                log::info!(
                    "'{}' no longer has convertible geometry, removing its primitive",
                    scene.name(node)
                );
                self.remove(node, raytracer);
                continue;
            };

            let transform = scene.global_transform(node);

            if kind != entry.primitive.kind() {
                let old_handle = entry.handle;
                let material = entry.primitive.material;
                self.recreate(scene, node, old_handle, material, world_bounds, raytracer);
                continue;
            }

            match convert::refresh(geometry, &transform, world_bounds, &mut entry.primitive.shape) {
                Ok(()) => {
                    raytracer.update_primitive(entry.handle, &entry.primitive);
                    updated += 1;
                }
                Err(err) => {
                    log::warn!(
                        "Could not refresh primitive {} of '{}': {}",
                        entry.handle,
                        scene.name(node),
                        err
                    );
                }
            }
        }
        updated
    }

    fn recreate(
        &mut self,
        scene: &dyn SceneGraph,
        node: NodeId,
        old_handle: PrimitiveHandle,
        material: MaterialId,
        world_bounds: &Aabb,
        raytracer: &mut dyn AcousticRaytracer,
    ) {
        log::info!(
            "Shape kind of '{}' changed, rebuilding primitive {}",
            scene.name(node),
            old_handle
        );
        self.entries.remove(&node);
        raytracer.remove_primitive(old_handle);

        let Some(geometry) = scene.geometry(node) else {
            return;
        };
        let transform = scene.global_transform(node);
        match convert::convert(geometry, &transform, world_bounds) {
            Ok(shape) => {
                let new_handle = self.allocate_handle();
                let primitive = AcousticPrimitive::new(shape, material);
                raytracer.add_primitive(new_handle, &primitive);
                self.entries.insert(
                    node,
                    RegisteredPrimitive {
                        handle: new_handle,
                        primitive,
                    },
                );
                let _ = self.events.send(EchotraceEvent::PrimitiveRecreated {
                    node,
                    old_handle,
                    new_handle,
                });
            }
            Err(err) => {
                log::warn!(
                    "Rebuilding primitive for '{}' failed: {}",
                    scene.name(node),
                    err
                );
                let _ = self.events.send(EchotraceEvent::PrimitiveRemoved {
                    node,
                    handle: old_handle,
                });
                let _ = self.events.send(EchotraceEvent::PrimitiveSkipped {
                    node,
                    reason: err.to_string(),
                });
            }
        }
    }

    /// Drops ownership of every primitive under `root` without notifying the
    /// raytracer. Used when the raytracer context is about to be released.
    pub fn forget_subtree(&mut self, scene: &dyn SceneGraph, root: NodeId) -> usize {
        let mut forgotten = 0;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            stack.extend_from_slice(scene.children(node));
            if self.entries.remove(&node).is_some() {
                forgotten += 1;
            }
        }
        forgotten
    }

    /// Drops every entry, including ones for nodes no longer in the scene.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn handle_of(&self, node: NodeId) -> Option<PrimitiveHandle> {
        self.entries.get(&node).map(|e| e.handle)
    }

    pub fn primitive(&self, node: NodeId) -> Option<&AcousticPrimitive> {
        self.entries.get(&node).map(|e| &e.primitive)
    }

    /// Number of live handles owned by nodes in the subtree under `root`.
    pub fn count_in_subtree(&self, scene: &dyn SceneGraph, root: NodeId) -> usize {
        let mut count = 0;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            stack.extend_from_slice(scene.children(node));
            if self.entries.contains_key(&node) {
                count += 1;
            }
        }
        count
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, PrimitiveHandle, &AcousticPrimitive)> {
        self.entries
            .iter()
            .map(|(node, entry)| (*node, entry.handle, &entry.primitive))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
