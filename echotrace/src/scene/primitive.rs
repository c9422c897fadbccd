//! Canonical acoustic primitives handed to the raytracer.

use crate::math::{Aabb, Affine3A, Vec3};
use crate::scene::material::MaterialId;

/// Opaque token linking a scene node to its registered primitive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveHandle(u64);

impl PrimitiveHandle {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PrimitiveHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrimitiveHandle({})", self.0)
    }
}

/// Triangle mesh primitive. Vertices are in node space; `transform` places them.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshPrimitive {
    /// Three vertices per triangle
    pub triangles: Vec<Vec3>,
    pub bounds: Aabb,
    pub transform: Affine3A,
    /// Whether permeation rays may pass through this mesh
    pub supports_permeation: bool,
}

impl MeshPrimitive {
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveShape {
    Prism {
        size: Vec3,
        transform: Affine3A,
    },
    Sphere {
        center: Vec3,
        radius: f32,
    },
    /// `length` excludes the hemispherical caps
    Capsule {
        radius: f32,
        length: f32,
        transform: Affine3A,
    },
    Cylinder {
        radius: f32,
        length: f32,
        transform: Affine3A,
    },
    /// Base at the local origin, apex along local +Y
    Cone {
        radius: f32,
        height: f32,
        transform: Affine3A,
    },
    /// Finite plane spanning local X/Z, facing local +Y
    Plane {
        width: f32,
        height: f32,
        transform: Affine3A,
    },
    Mesh(MeshPrimitive),
}

/// Discriminant of [`PrimitiveShape`], used to detect shape-kind changes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Prism,
    Sphere,
    Capsule,
    Cylinder,
    Cone,
    Plane,
    Mesh,
}

impl PrimitiveShape {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Self::Prism { .. } => PrimitiveKind::Prism,
            Self::Sphere { .. } => PrimitiveKind::Sphere,
            Self::Capsule { .. } => PrimitiveKind::Capsule,
            Self::Cylinder { .. } => PrimitiveKind::Cylinder,
            Self::Cone { .. } => PrimitiveKind::Cone,
            Self::Plane { .. } => PrimitiveKind::Plane,
            Self::Mesh(_) => PrimitiveKind::Mesh,
        }
    }

    /// World placement of the primitive. Spheres have no rotation.
    pub fn transform(&self) -> Affine3A {
        match self {
            Self::Sphere { center, .. } => Affine3A::from_translation(*center),
            Self::Prism { transform, .. }
            | Self::Capsule { transform, .. }
            | Self::Cylinder { transform, .. }
            | Self::Cone { transform, .. }
            | Self::Plane { transform, .. } => *transform,
            Self::Mesh(mesh) => mesh.transform,
        }
    }
}

/// A shape plus the material the raytracer should assign to it.
#[derive(Debug, Clone, PartialEq)]
pub struct AcousticPrimitive {
    pub shape: PrimitiveShape,
    pub material: MaterialId,
}

impl AcousticPrimitive {
    pub fn new(shape: PrimitiveShape, material: MaterialId) -> Self {
        Self { shape, material }
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.shape.kind()
    }
}
