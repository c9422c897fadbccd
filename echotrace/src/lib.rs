//! # echotrace
//!
//! Keeps an external acoustic raytracer in sync with a hierarchical 3D scene
//! and turns the raytracer's reverb results into smoothed, panned effect
//! parameters for a 3D audio backend.
//!
//! The host owns the scene graph and calls into an [`AcousticWorld`] from its
//! frame loop. The world mirrors qualifying scene geometry into acoustic
//! primitives, resolves their materials, keeps their transforms current, and
//! aggregates reverb zone results into effect parameters every frame.
//!
//! ## Quick Start
//!
//! ```no_run
//! use echotrace::*;
//! use echotrace::scene::{
//!     AcousticRaytracer, CollisionShape, MaterialAnnotation, NodeGeometry, SceneGraph, SceneNode,
//!     SceneTree,
//! };
//!
//! fn run<R: AcousticRaytracer, B: AudioBackend>(backend: B) -> Result<()> {
//!     let mut world: AcousticWorld<R, B> =
//!         AcousticWorld::new(EchotraceWorldDesc::default(), Vec::new(), backend)?;
//!
//!     // Build (or borrow) the host scene
//!     let mut scene = SceneTree::new();
//!     let root = scene.root();
//!     scene.add_child(
//!         root,
//!         SceneNode::new("wall")
//!             .with_geometry(NodeGeometry::Collision(CollisionShape::Box { size: Vec3::splat(2.0) }))
//!             .with_material(MaterialAnnotation::name("concrete")),
//!     );
//!     scene.drain_events();
//!
//!     // Once the scene is loaded, mirror it
//!     world.scene_loaded(&scene);
//!
//!     // Every frame
//!     for event in scene.drain_events() {
//!         world.handle_scene_event(&scene, event);
//!     }
//!     world.physics_process(&scene);
//!     world.process(Pose::from_pitch_yaw(Vec3::new(0.0, 1.7, 4.0), 0.0, 0.0));
//!
//!     for event in world.poll_events() {
//!         if event.is_warning() {
//!             println!("{:?}", event);
//!         }
//!     }
//!
//!     world.shutdown(&scene);
//!     Ok(())
//! }
//! ```
//!
//! ## Key Components
//!
//! - **[`convert`]**: host geometry → acoustic primitive shapes, with winding correction
//! - **[`MaterialResolver`](scene::MaterialResolver)**: annotation → material ID, custom materials
//! - **[`PrimitiveRegistry`](registry::PrimitiveRegistry)**: node → primitive side-table
//! - **[`SceneWatcher`](watcher::SceneWatcher)**: initial traversal and add/remove tracking
//! - **[`AcousticAggregator`](acoustics::AcousticAggregator)**: reverb smoothing and pan attenuation
//! - **[`AcousticRaytracer`](scene::AcousticRaytracer)** / **[`AudioBackend`]**: the external engines

pub mod acoustics;
pub mod audio;
pub mod config;
pub mod convert;
pub mod error;
pub mod events;
pub mod math;
pub mod registry;
pub mod scene;
pub mod watcher;
pub mod world;

#[cfg(test)]
mod test_support;

pub use audio::{AudioBackend, DeviceEvent, EmitterId, EmitterKind};
pub use config::{EchotraceWorldDesc, RayCounts};
pub use error::{EchotraceError, Result};
pub use events::EchotraceEvent;
pub use math::{Pose, Vec3};
pub use world::AcousticWorld;
