//! Geometry resources a scene node can carry.
//!
//! The set of kinds is closed: every host shape maps onto one of these
//! variants, and anything the converter cannot express is tagged
//! [`CollisionShape::Unsupported`] so the skip is reported instead of
//! silently ignored.

use crate::math::Vec3;
use std::sync::Arc;

/// One surface of a render mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshSurface {
    pub vertices: Vec<Vec3>,
    /// Per-vertex authored normals, used to fix triangle winding
    pub normals: Option<Vec<Vec3>>,
    /// Triangle-list indices; `None` means vertices are already in triangle order
    pub indices: Option<Vec<u32>>,
}

impl MeshSurface {
    pub fn new(vertices: Vec<Vec3>) -> Self {
        Self {
            vertices,
            normals: None,
            indices: None,
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }
}

/// Render mesh made of one or more surfaces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    pub surfaces: Vec<MeshSurface>,
}

impl TriangleMesh {
    pub fn new(surfaces: Vec<MeshSurface>) -> Self {
        Self { surfaces }
    }

    pub fn single(surface: MeshSurface) -> Self {
        Self {
            surfaces: vec![surface],
        }
    }
}

/// Shapes attachable to a static collision volume.
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionShape {
    Box {
        size: Vec3,
    },
    Sphere {
        radius: f32,
    },
    /// `height` includes both hemispherical caps
    Capsule {
        radius: f32,
        height: f32,
    },
    Cylinder {
        radius: f32,
        height: f32,
    },
    /// Infinite plane `dot(normal, p) = distance` in node space
    WorldBoundary {
        normal: Vec3,
        distance: f32,
    },
    /// Triangulated hull surface, three vertices per triangle
    ConvexHull {
        faces: Vec<Vec3>,
    },
    /// Triangle soup, three vertices per triangle
    ConcavePolygon {
        faces: Vec<Vec3>,
    },
    /// Row-major grid of `width * depth` samples, one unit apart, centered on the origin
    HeightMap {
        width: usize,
        depth: usize,
        heights: Vec<f32>,
    },
    /// A host shape the converter has no mapping for
    Unsupported {
        kind: String,
    },
}

/// Geometry carried by a scene node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeGeometry {
    /// Procedural box solid
    CsgBox { size: Vec3 },
    /// Procedural cylinder solid; a cone when `cone` is set
    CsgCylinder { radius: f32, height: f32, cone: bool },
    /// Static collision volume
    Collision(CollisionShape),
    /// Render mesh instance; the mesh resource may be unassigned
    Mesh(Option<Arc<TriangleMesh>>),
}

impl NodeGeometry {
    /// Short name of the concrete kind, for log messages.
    pub fn kind_name(&self) -> &str {
        match self {
            Self::CsgBox { .. } => "csg box",
            Self::CsgCylinder { cone: true, .. } => "csg cone",
            Self::CsgCylinder { .. } => "csg cylinder",
            Self::Collision(shape) => match shape {
                CollisionShape::Box { .. } => "box shape",
                CollisionShape::Sphere { .. } => "sphere shape",
                CollisionShape::Capsule { .. } => "capsule shape",
                CollisionShape::Cylinder { .. } => "cylinder shape",
                CollisionShape::WorldBoundary { .. } => "world boundary shape",
                CollisionShape::ConvexHull { .. } => "convex hull shape",
                CollisionShape::ConcavePolygon { .. } => "concave polygon shape",
                CollisionShape::HeightMap { .. } => "height map shape",
                CollisionShape::Unsupported { kind } => kind,
            },
            Self::Mesh(_) => "mesh",
        }
    }
}
