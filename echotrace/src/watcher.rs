//! Scene watcher: drives the registry from the initial scene traversal and
//! from host add/remove notifications.

use crate::math::Aabb;
use crate::registry::PrimitiveRegistry;
use crate::scene::{AcousticRaytracer, MaterialId, MaterialResolver, NodeId, SceneEvent, SceneGraph};

/// Collaborators the watcher needs for one call. Passed in explicitly rather
/// than looked up from the world.
pub struct SyncContext<'a> {
    pub resolver: &'a MaterialResolver,
    pub registry: &'a mut PrimitiveRegistry,
    pub raytracer: &'a mut dyn AcousticRaytracer,
    pub world_bounds: Aabb,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum WatcherState {
    /// Scene not loaded yet; notifications are ignored
    #[default]
    Uninitialized,
    Watching,
}

#[derive(Debug, Default)]
pub struct SceneWatcher {
    state: WatcherState,
    root: Option<NodeId>,
}

impl SceneWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn is_watching(&self) -> bool {
        self.state == WatcherState::Watching
    }

    /// Root of the watched scene, while watching.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Enters `Watching`: walks the whole scene pre-order from its root,
    /// creating primitives with inherited materials. Returns how many
    /// primitives were created.
    pub fn start(&mut self, scene: &dyn SceneGraph, ctx: SyncContext<'_>) -> usize {
        if self.is_watching() {
            log::warn!("Scene watcher already started, ignoring second scene load");
            return 0;
        }

        let root = scene.root();
        let mut created = 0;
        let mut stack = vec![(root, MaterialId::AIR)];
        while let Some((node, inherited)) = stack.pop() {
            let material = ctx.resolver.resolve(scene, node, inherited);
            if ctx
                .registry
                .add_or_update(scene, node, material, &ctx.world_bounds, &mut *ctx.raytracer)
                .is_some()
            {
                created += 1;
            }
            stack.extend(
                scene
                    .children(node)
                    .iter()
                    .rev()
                    .map(|child| (*child, material)),
            );
        }

        self.state = WatcherState::Watching;
        self.root = Some(root);
        log::info!(
            "Scene watcher started: {} primitives from initial traversal",
            created
        );
        created
    }

    /// Applies one host notification. Ignored unless watching.
    pub fn handle_event(&mut self, scene: &dyn SceneGraph, event: SceneEvent, ctx: SyncContext<'_>) {
        if !self.is_watching() {
            log::trace!("Ignoring {:?} before the scene is loaded", event);
            return;
        }

        match event {
            SceneEvent::NodeAdded(node) => {
                let material = ctx.resolver.resolve_inherited(scene, node);
                ctx.registry.add_or_update(
                    scene,
                    node,
                    material,
                    &ctx.world_bounds,
                    &mut *ctx.raytracer,
                );
            }
            SceneEvent::NodeRemoved(node) => {
                ctx.registry.remove(node, &mut *ctx.raytracer);
            }
        }
    }

    /// Per-physics-step transform sync. Returns the number of primitives updated.
    pub fn refresh(&self, scene: &dyn SceneGraph, ctx: SyncContext<'_>) -> usize {
        match (self.state, self.root) {
            (WatcherState::Watching, Some(root)) => ctx.registry.refresh_transforms(
                scene,
                root,
                &ctx.world_bounds,
                &mut *ctx.raytracer,
            ),
            _ => 0,
        }
    }

    /// Leaves `Watching`, stripping every registry ownership token in the
    /// watched subtree. The raytracer context is released by the caller.
    pub fn stop(&mut self, scene: &dyn SceneGraph, registry: &mut PrimitiveRegistry) -> usize {
        let Some(root) = self.root.take() else {
            self.state = WatcherState::Uninitialized;
            return 0;
        };
        let forgotten = registry.forget_subtree(scene, root);
        registry.clear();
        self.state = WatcherState::Uninitialized;
        log::info!("Scene watcher stopped, released {} primitives", forgotten);
        forgotten
    }
}
