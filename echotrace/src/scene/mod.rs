//! Scene-side types: the host interface, node geometry, materials,
//! acoustic primitives and the raytracer boundary.

pub mod geometry;
pub mod graph;
pub mod material;
pub mod primitive;
pub mod raytracer;
pub mod tree;

pub use geometry::{CollisionShape, MeshSurface, NodeGeometry, TriangleMesh};
pub use graph::{NodeId, SceneEvent, SceneGraph};
pub use material::{
    BUILTIN_MATERIALS, CustomMaterial, MaterialAnnotation, MaterialId, MaterialProperties,
    MaterialResolver,
};
pub use primitive::{AcousticPrimitive, MeshPrimitive, PrimitiveHandle, PrimitiveKind, PrimitiveShape};
pub use raytracer::{
    AcousticRaytracer, MaterialEntry, RaytracerSettings, VoiceId, VoiceResult,
};
pub use tree::{SceneNode, SceneTree};
