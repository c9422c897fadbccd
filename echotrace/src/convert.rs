//! Shape conversion: host geometry → acoustic primitive shapes.
//!
//! Parametric shapes (boxes, spheres, capsules, cylinders, cones, planes) map
//! to parametric primitives. Everything else is flattened into a triangle
//! list with bounds, with winding fixed wherever an orientation hint exists.

use crate::error::{EchotraceError, Result};
use crate::math::{Aabb, Affine3A, Mat3, Vec3, max_axis_scale};
use crate::scene::geometry::{CollisionShape, NodeGeometry, TriangleMesh};
use crate::scene::primitive::{MeshPrimitive, PrimitiveKind, PrimitiveShape};

/// Flattened triangle list: three vertices per triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleList {
    pub vertices: Vec<Vec3>,
    /// Bounds of every emitted vertex; zero when nothing was emitted
    pub bounds: Aabb,
}

impl TriangleList {
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Accumulates triangles and their bounds.
///
/// Bounds are seeded from the first emitted vertex rather than from
/// ±infinity, so an empty builder never reports a sentinel box.
#[derive(Debug, Default)]
struct TriangleListBuilder {
    vertices: Vec<Vec3>,
    bounds: Option<Aabb>,
}

impl TriangleListBuilder {
    fn with_capacity(triangles: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(triangles * 3),
            bounds: None,
        }
    }

    fn push(&mut self, [v0, v1, v2]: [Vec3; 3]) {
        for v in [v0, v1, v2] {
            match self.bounds.as_mut() {
                Some(bounds) => bounds.extend(v),
                None => self.bounds = Some(Aabb::from_point(v)),
            }
            self.vertices.push(v);
        }
    }

    fn push_oriented(&mut self, triangle: [Vec3; 3], reference: Option<Vec3>) {
        match reference {
            Some(normal) => self.push(orient_triangle(triangle, normal)),
            None => self.push(triangle),
        }
    }

    fn finish(self) -> TriangleList {
        TriangleList {
            vertices: self.vertices,
            bounds: self.bounds.unwrap_or(Aabb::ZERO),
        }
    }
}

/// Geometric (unnormalized) normal of a triangle.
pub fn triangle_normal([v0, v1, v2]: [Vec3; 3]) -> Vec3 {
    (v1 - v0).cross(v2 - v0)
}

/// Returns the triangle with its winding flipped to `(v0, v2, v1)` when its
/// geometric normal points away from `reference`.
pub fn orient_triangle(triangle: [Vec3; 3], reference: Vec3) -> [Vec3; 3] {
    let [v0, v1, v2] = triangle;
    if triangle_normal(triangle).dot(reference) < 0.0 {
        [v0, v2, v1]
    } else {
        triangle
    }
}

/// Flattens every surface of a render mesh.
///
/// Indexed and non-indexed surfaces are both grouped in consecutive
/// triples; trailing vertices that do not complete a triangle are dropped.
/// When the surface has normals, each triangle is oriented to agree with the
/// authored normal at its first vertex.
pub fn mesh_triangles(mesh: &TriangleMesh) -> TriangleList {
    let mut builder = TriangleListBuilder::default();
    let mut out_of_range = 0usize;

    for surface in &mesh.surfaces {
        if surface.vertices.is_empty() {
            continue;
        }
        let normals = surface.normals.as_deref();
        let normal_at = |index: usize| normals.and_then(|n| n.get(index)).copied();

        match surface.indices.as_deref() {
            None => {
                for (i, tri) in surface.vertices.chunks_exact(3).enumerate() {
                    builder.push_oriented([tri[0], tri[1], tri[2]], normal_at(i * 3));
                }
            }
            Some(indices) => {
                for tri in indices.chunks_exact(3) {
                    let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
                    let (Some(v0), Some(v1), Some(v2)) = (
                        surface.vertices.get(i0),
                        surface.vertices.get(i1),
                        surface.vertices.get(i2),
                    ) else {
                        out_of_range += 1;
                        continue;
                    };
                    builder.push_oriented([*v0, *v1, *v2], normal_at(i0));
                }
            }
        }
    }

    if out_of_range > 0 {
        log::warn!(
            "Skipped {} triangles with out-of-range indices while flattening mesh",
            out_of_range
        );
    }

    builder.finish()
}

/// Triangle soup taken as-is.
pub fn concave_triangles(faces: &[Vec3]) -> TriangleList {
    let mut builder = TriangleListBuilder::with_capacity(faces.len() / 3);
    for tri in faces.chunks_exact(3) {
        builder.push([tri[0], tri[1], tri[2]]);
    }
    builder.finish()
}

/// Triangulated convex hull, oriented so every face points away from the
/// hull's vertex centroid.
pub fn convex_triangles(faces: &[Vec3]) -> TriangleList {
    let usable = faces.len() - faces.len() % 3;
    if usable == 0 {
        return TriangleList::default();
    }

    let centroid = faces[..usable].iter().copied().sum::<Vec3>() / usable as f32;

    let mut builder = TriangleListBuilder::with_capacity(usable / 3);
    for tri in faces[..usable].chunks_exact(3) {
        let triangle = [tri[0], tri[1], tri[2]];
        let face_center = (tri[0] + tri[1] + tri[2]) / 3.0;
        builder.push_oriented(triangle, Some(face_center - centroid));
    }
    builder.finish()
}

/// Terrain grid of `width * depth` samples spaced one unit apart and centered
/// on the origin. Two upward-facing triangles per cell; cells touching a
/// non-finite sample are holes.
pub fn heightmap_triangles(width: usize, depth: usize, heights: &[f32]) -> TriangleList {
    let too_short = width.checked_mul(depth).is_none_or(|samples| heights.len() < samples);
    if width < 2 || depth < 2 || too_short {
        return TriangleList::default();
    }

    let half_width = (width - 1) as f32 / 2.0;
    let half_depth = (depth - 1) as f32 / 2.0;
    let point = |x: usize, z: usize, h: f32| {
        Vec3::new(x as f32 - half_width, h, z as f32 - half_depth)
    };

    let mut builder = TriangleListBuilder::with_capacity((width - 1) * (depth - 1) * 2);
    for z in 0..depth - 1 {
        for x in 0..width - 1 {
            let h00 = heights[z * width + x];
            let h10 = heights[z * width + x + 1];
            let h01 = heights[(z + 1) * width + x];
            let h11 = heights[(z + 1) * width + x + 1];

            if ![h00, h10, h01, h11].iter().all(|h| h.is_finite()) {
                continue;
            }

            let v00 = point(x, z, h00);
            let v10 = point(x + 1, z, h10);
            let v01 = point(x, z + 1, h01);
            let v11 = point(x + 1, z + 1, h11);

            builder.push([v00, v01, v10]);
            builder.push([v10, v01, v11]);
        }
    }
    builder.finish()
}

/// Orthonormal right-handed basis whose Y axis is `up`.
///
/// Uses world Z as the reference axis, falling back to world X when `up` is
/// nearly parallel to it.
pub fn basis_with_up(up: Vec3) -> Mat3 {
    let up = up.normalize_or_zero();
    let up = if up == Vec3::ZERO { Vec3::Y } else { up };

    let reference = if up.dot(Vec3::Z).abs() > 0.999 {
        Vec3::X
    } else {
        Vec3::Z
    };

    let right = up.cross(reference).normalize();
    let forward = right.cross(up);
    Mat3::from_cols(right, up, forward)
}

/// Approximates an infinite plane with a finite one large enough to cover the
/// whole world from any point inside it (twice the world diagonal).
pub fn world_boundary_plane(
    normal: Vec3,
    distance: f32,
    transform: &Affine3A,
    world_bounds: &Aabb,
) -> PrimitiveShape {
    let local_normal = normal.normalize_or_zero();
    let local_normal = if local_normal == Vec3::ZERO {
        Vec3::Y
    } else {
        local_normal
    };

    // Normals go through the inverse transpose to stay perpendicular under
    // non-uniform scale.
    let world_normal = transform
        .matrix3
        .inverse()
        .transpose()
        .mul_vec3(local_normal)
        .normalize_or_zero();
    let origin = transform.transform_point3(local_normal * distance);
    let extent = world_bounds.diagonal().length() * 2.0;

    PrimitiveShape::Plane {
        width: extent,
        height: extent,
        transform: Affine3A::from_mat3_translation(basis_with_up(world_normal), origin),
    }
}

/// Moves a midpoint-centered cone onto a base-at-origin frame.
fn cone_transform(transform: &Affine3A, height: f32) -> Affine3A {
    *transform * Affine3A::from_translation(Vec3::new(0.0, -height * 0.5, 0.0))
}

fn mesh_shape(triangles: TriangleList, transform: &Affine3A, what: &str) -> Result<PrimitiveShape> {
    if triangles.is_empty() {
        return Err(EchotraceError::EmptyGeometry(what.to_string()));
    }
    Ok(PrimitiveShape::Mesh(MeshPrimitive {
        triangles: triangles.vertices,
        bounds: triangles.bounds,
        transform: *transform,
        supports_permeation: true,
    }))
}

/// Converts node geometry at `transform` into a primitive shape.
///
/// # Errors
///
/// - [`EchotraceError::UnsupportedGeometry`] for shapes with no mapping
/// - [`EchotraceError::MissingGeometry`] for a mesh node without a mesh
/// - [`EchotraceError::EmptyGeometry`] when triangulation emits nothing
pub fn convert(
    geometry: &NodeGeometry,
    transform: &Affine3A,
    world_bounds: &Aabb,
) -> Result<PrimitiveShape> {
    let shape = match geometry {
        NodeGeometry::CsgBox { size } => PrimitiveShape::Prism {
            size: *size,
            transform: *transform,
        },
        NodeGeometry::CsgCylinder {
            radius,
            height,
            cone: true,
        } => PrimitiveShape::Cone {
            radius: *radius,
            height: *height,
            transform: cone_transform(transform, *height),
        },
        NodeGeometry::CsgCylinder { radius, height, .. } => PrimitiveShape::Cylinder {
            radius: *radius,
            length: *height,
            transform: *transform,
        },
        NodeGeometry::Mesh(None) => {
            return Err(EchotraceError::MissingGeometry(
                "mesh instance has no mesh assigned".to_string(),
            ));
        }
        NodeGeometry::Mesh(Some(mesh)) => {
            return mesh_shape(mesh_triangles(mesh), transform, "mesh");
        }
        NodeGeometry::Collision(shape) => match shape {
            CollisionShape::Box { size } => PrimitiveShape::Prism {
                size: *size,
                transform: *transform,
            },
            CollisionShape::Sphere { radius } => PrimitiveShape::Sphere {
                center: transform.translation.into(),
                radius: radius * max_axis_scale(transform),
            },
            CollisionShape::Capsule { radius, height } => PrimitiveShape::Capsule {
                radius: *radius,
                length: (height - 2.0 * radius).max(0.0),
                transform: *transform,
            },
            CollisionShape::Cylinder { radius, height } => PrimitiveShape::Cylinder {
                radius: *radius,
                length: *height,
                transform: *transform,
            },
            CollisionShape::WorldBoundary { normal, distance } => {
                world_boundary_plane(*normal, *distance, transform, world_bounds)
            }
            CollisionShape::ConvexHull { faces } => {
                return mesh_shape(convex_triangles(faces), transform, "convex hull");
            }
            CollisionShape::ConcavePolygon { faces } => {
                return mesh_shape(concave_triangles(faces), transform, "concave polygon");
            }
            CollisionShape::HeightMap {
                width,
                depth,
                heights,
            } => {
                return mesh_shape(
                    heightmap_triangles(*width, *depth, heights),
                    transform,
                    "height map",
                );
            }
            CollisionShape::Unsupported { kind } => {
                return Err(EchotraceError::UnsupportedGeometry(format!(
                    "collision shape '{}'",
                    kind
                )));
            }
        },
    };
    Ok(shape)
}

/// Primitive kind `geometry` converts to, without doing the conversion.
/// `None` for geometry that cannot be converted at all.
pub fn expected_kind(geometry: &NodeGeometry) -> Option<PrimitiveKind> {
    match geometry {
        NodeGeometry::CsgBox { .. } => Some(PrimitiveKind::Prism),
        NodeGeometry::CsgCylinder { cone: true, .. } => Some(PrimitiveKind::Cone),
        NodeGeometry::CsgCylinder { .. } => Some(PrimitiveKind::Cylinder),
        NodeGeometry::Mesh(Some(_)) => Some(PrimitiveKind::Mesh),
        NodeGeometry::Mesh(None) => None,
        NodeGeometry::Collision(shape) => match shape {
            CollisionShape::Box { .. } => Some(PrimitiveKind::Prism),
            CollisionShape::Sphere { .. } => Some(PrimitiveKind::Sphere),
            CollisionShape::Capsule { .. } => Some(PrimitiveKind::Capsule),
            CollisionShape::Cylinder { .. } => Some(PrimitiveKind::Cylinder),
            CollisionShape::WorldBoundary { .. } => Some(PrimitiveKind::Plane),
            CollisionShape::ConvexHull { .. }
            | CollisionShape::ConcavePolygon { .. }
            | CollisionShape::HeightMap { .. } => Some(PrimitiveKind::Mesh),
            CollisionShape::Unsupported { .. } => None,
        },
    }
}

/// Refreshes `shape` in place from the node's current geometry and transform.
///
/// Parametric shapes are recomputed (transform and dimensions); meshes only
/// take the new transform, their triangles are never rebuilt. The caller is
/// responsible for checking that the kind still matches.
pub fn refresh(
    geometry: &NodeGeometry,
    transform: &Affine3A,
    world_bounds: &Aabb,
    shape: &mut PrimitiveShape,
) -> Result<()> {
    if let PrimitiveShape::Mesh(mesh) = shape {
        mesh.transform = *transform;
        return Ok(());
    }
    *shape = convert(geometry, transform, world_bounds)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Quat;
    use crate::scene::geometry::MeshSurface;
    use std::sync::Arc;

    fn world() -> Aabb {
        Aabb::new(Vec3::new(-100.0, 0.0, -100.0), Vec3::new(100.0, 100.0, 100.0))
    }

    fn assert_well_formed(list: &TriangleList) {
        assert_eq!(list.vertices.len() % 3, 0);
        assert!(list.bounds.is_valid());
        if list.is_empty() {
            assert_eq!(list.bounds, Aabb::ZERO);
        }
        for v in &list.vertices {
            assert!(list.bounds.contains(*v));
        }
    }

    #[test]
    fn test_winding_flipped_against_authored_normal() {
        let v0 = Vec3::ZERO;
        let v1 = Vec3::X;
        let v2 = Vec3::Z;
        // (X) x (Z) = -Y, so an authored +Y normal disagrees
        let surface = MeshSurface::new(vec![v0, v1, v2]).with_normals(vec![Vec3::Y; 3]);
        let list = mesh_triangles(&TriangleMesh::single(surface));

        assert_eq!(list.vertices, vec![v0, v2, v1]);
        let corrected = triangle_normal([list.vertices[0], list.vertices[1], list.vertices[2]]);
        assert!(corrected.dot(Vec3::Y) > 0.0);
        assert_well_formed(&list);
    }

    #[test]
    fn test_winding_kept_when_normal_agrees() {
        let tri = [Vec3::ZERO, Vec3::Z, Vec3::X];
        let surface = MeshSurface::new(tri.to_vec()).with_normals(vec![Vec3::Y; 3]);
        let list = mesh_triangles(&TriangleMesh::single(surface));
        assert_eq!(list.vertices, tri.to_vec());
    }

    #[test]
    fn test_indexed_mesh_uses_first_vertex_normal() {
        let vertices = vec![Vec3::ZERO, Vec3::X, Vec3::Z, Vec3::new(1.0, 0.0, 1.0)];
        let normals = vec![Vec3::Y, Vec3::NEG_Y, Vec3::NEG_Y, Vec3::NEG_Y];
        let surface = MeshSurface::new(vertices)
            .with_normals(normals)
            .with_indices(vec![0, 1, 2, 1, 3, 2, 0]);
        let list = mesh_triangles(&TriangleMesh::single(surface));

        assert_eq!(list.triangle_count(), 2);
        // First triangle keyed by vertex 0 (+Y): flipped
        assert_eq!(&list.vertices[..3], &[Vec3::ZERO, Vec3::Z, Vec3::X]);
        // Second keyed by vertex 1 (-Y), already facing down
        let second = [list.vertices[3], list.vertices[4], list.vertices[5]];
        assert!(triangle_normal(second).dot(Vec3::NEG_Y) > 0.0);
        assert_well_formed(&list);
    }

    #[test]
    fn test_out_of_range_indices_are_skipped() {
        let surface = MeshSurface::new(vec![Vec3::ZERO, Vec3::X, Vec3::Z]).with_indices(vec![0, 1, 7]);
        let list = mesh_triangles(&TriangleMesh::single(surface));
        assert!(list.is_empty());
        assert_well_formed(&list);
    }

    #[test]
    fn test_empty_mesh_has_zero_bounds() {
        let list = mesh_triangles(&TriangleMesh::default());
        assert!(list.is_empty());
        assert_eq!(list.bounds, Aabb::ZERO);
    }

    #[test]
    fn test_bounds_cover_negative_only_geometry() {
        let faces = vec![
            Vec3::new(-5.0, -4.0, -3.0),
            Vec3::new(-2.0, -4.0, -3.0),
            Vec3::new(-5.0, -1.0, -3.0),
        ];
        let list = concave_triangles(&faces);
        assert_eq!(list.bounds.min, Vec3::new(-5.0, -4.0, -3.0));
        assert_eq!(list.bounds.max, Vec3::new(-2.0, -1.0, -3.0));
        assert_well_formed(&list);
    }

    #[test]
    fn test_convex_hull_faces_point_outward() {
        // Tetrahedron with deliberately inconsistent winding
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 1.0, 0.0);
        let d = Vec3::new(0.0, 0.0, 1.0);
        let faces = vec![a, b, c, a, d, b, a, c, d, b, c, d];
        let list = convex_triangles(&faces);

        let centroid = (a + b + c + d) / 4.0;
        for tri in list.vertices.chunks_exact(3) {
            let face_center = (tri[0] + tri[1] + tri[2]) / 3.0;
            let normal = triangle_normal([tri[0], tri[1], tri[2]]);
            assert!(normal.dot(face_center - centroid) > 0.0);
        }
        assert_well_formed(&list);
    }

    #[test]
    fn test_heightmap_triangles_face_up_and_skip_holes() {
        let heights = vec![0.0, 0.0, 0.0, 1.0, 1.0, f32::NAN, 2.0, 2.0, 2.0];
        let list = heightmap_triangles(3, 3, &heights);

        // Four cells, the two touching the NaN sample are holes
        assert_eq!(list.triangle_count(), 4);
        // Surviving cells are both in the x = 0 column
        for tri in list.vertices.chunks_exact(3) {
            assert!(triangle_normal([tri[0], tri[1], tri[2]]).y > 0.0);
        }
        assert_eq!(list.bounds.min, Vec3::new(-1.0, 0.0, -1.0));
        assert_eq!(list.bounds.max, Vec3::new(0.0, 2.0, 1.0));
        assert_well_formed(&list);
    }

    #[test]
    fn test_heightmap_rejects_short_data() {
        let list = heightmap_triangles(3, 3, &[0.0; 8]);
        assert!(list.is_empty());
        assert_well_formed(&list);
    }

    #[test]
    fn test_heightmap_rejects_oversized_grid() {
        assert!(heightmap_triangles(usize::MAX, 2, &[0.0; 4]).is_empty());
        assert!(heightmap_triangles(2, usize::MAX, &[0.0; 4]).is_empty());
    }

    #[test]
    fn test_box_becomes_prism() {
        let geometry = NodeGeometry::Collision(CollisionShape::Box {
            size: Vec3::splat(2.0),
        });
        let shape = convert(&geometry, &Affine3A::IDENTITY, &world()).unwrap();
        assert_eq!(
            shape,
            PrimitiveShape::Prism {
                size: Vec3::splat(2.0),
                transform: Affine3A::IDENTITY
            }
        );
    }

    #[test]
    fn test_sphere_uses_scale_and_origin() {
        let transform =
            Affine3A::from_scale_rotation_translation(Vec3::splat(2.0), Quat::IDENTITY, Vec3::new(1.0, 2.0, 3.0));
        let geometry = NodeGeometry::Collision(CollisionShape::Sphere { radius: 1.5 });
        let shape = convert(&geometry, &transform, &world()).unwrap();
        assert_eq!(
            shape,
            PrimitiveShape::Sphere {
                center: Vec3::new(1.0, 2.0, 3.0),
                radius: 3.0
            }
        );
    }

    #[test]
    fn test_capsule_length_excludes_caps() {
        let geometry = NodeGeometry::Collision(CollisionShape::Capsule {
            radius: 0.5,
            height: 3.0,
        });
        match convert(&geometry, &Affine3A::IDENTITY, &world()).unwrap() {
            PrimitiveShape::Capsule { radius, length, .. } => {
                assert_eq!(radius, 0.5);
                assert_eq!(length, 2.0);
            }
            other => panic!("expected capsule, got {:?}", other),
        }

        let squat = NodeGeometry::Collision(CollisionShape::Capsule {
            radius: 1.0,
            height: 1.0,
        });
        match convert(&squat, &Affine3A::IDENTITY, &world()).unwrap() {
            PrimitiveShape::Capsule { length, .. } => assert_eq!(length, 0.0),
            other => panic!("expected capsule, got {:?}", other),
        }
    }

    #[test]
    fn test_cone_base_moved_to_origin() {
        let transform = Affine3A::from_translation(Vec3::new(0.0, 5.0, 0.0));
        let geometry = NodeGeometry::CsgCylinder {
            radius: 1.0,
            height: 4.0,
            cone: true,
        };
        match convert(&geometry, &transform, &world()).unwrap() {
            PrimitiveShape::Cone {
                height, transform, ..
            } => {
                assert_eq!(height, 4.0);
                assert_eq!(Vec3::from(transform.translation), Vec3::new(0.0, 3.0, 0.0));
            }
            other => panic!("expected cone, got {:?}", other),
        }
    }

    #[test]
    fn test_cone_offset_follows_local_up() {
        // Node rotated upside down: the base moves up in world space
        let transform = Affine3A::from_rotation_translation(
            Quat::from_rotation_x(std::f32::consts::PI),
            Vec3::ZERO,
        );
        let geometry = NodeGeometry::CsgCylinder {
            radius: 1.0,
            height: 2.0,
            cone: true,
        };
        let shape = convert(&geometry, &transform, &world()).unwrap();
        let base = Vec3::from(shape.transform().translation);
        assert!((base - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_world_boundary_plane_covers_world() {
        let geometry = NodeGeometry::Collision(CollisionShape::WorldBoundary {
            normal: Vec3::Y,
            distance: 0.0,
        });
        let bounds = world();
        match convert(&geometry, &Affine3A::IDENTITY, &bounds).unwrap() {
            PrimitiveShape::Plane {
                width,
                height,
                transform,
            } => {
                let diagonal = bounds.diagonal().length();
                assert!((width - diagonal * 2.0).abs() < 1e-3);
                assert_eq!(width, height);
                let up = transform.transform_vector3(Vec3::Y);
                assert!((up - Vec3::Y).length() < 1e-5);
            }
            other => panic!("expected plane, got {:?}", other),
        }
    }

    #[test]
    fn test_basis_with_up_is_orthonormal_right_handed() {
        for up in [
            Vec3::Y,
            Vec3::Z,
            Vec3::NEG_Z,
            Vec3::new(0.3, -0.8, 0.2),
            Vec3::new(0.0, 0.0001, 1.0),
        ] {
            let basis = basis_with_up(up);
            let n = up.normalize();
            assert!((basis.y_axis - n).length() < 1e-5);
            assert!((basis.determinant() - 1.0).abs() < 1e-4);
            assert!(basis.x_axis.dot(basis.y_axis).abs() < 1e-5);
            assert!(basis.x_axis.dot(basis.z_axis).abs() < 1e-5);
            assert!(basis.is_finite());
        }
    }

    #[test]
    fn test_world_boundary_plane_offset_along_normal() {
        let transform = Affine3A::from_translation(Vec3::new(0.0, 1.0, 0.0));
        let shape = world_boundary_plane(Vec3::new(0.0, 0.0, 2.0), 3.0, &transform, &world());
        let origin = Vec3::from(shape.transform().translation);
        assert!((origin - Vec3::new(0.0, 1.0, 3.0)).length() < 1e-5);
        let up = shape.transform().transform_vector3(Vec3::Y);
        assert!((up - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_world_boundary_normal_survives_non_uniform_scale() {
        let transform = Affine3A::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        let shape = world_boundary_plane(normal, 0.0, &transform, &world());

        let up = shape.transform().transform_vector3(Vec3::Y);
        let expected = Vec3::new(0.5, 1.0, 0.0).normalize();
        assert!((up - expected).length() < 1e-5);

        // Still perpendicular to a direction lying in the scaled plane
        let in_plane = transform.transform_vector3(Vec3::new(1.0, -1.0, 0.0));
        assert!(up.dot(in_plane).abs() < 1e-5);
    }

    #[test]
    fn test_failures_are_reported() {
        let unsupported = NodeGeometry::Collision(CollisionShape::Unsupported {
            kind: "SeparationRayShape3D".to_string(),
        });
        assert!(matches!(
            convert(&unsupported, &Affine3A::IDENTITY, &world()),
            Err(EchotraceError::UnsupportedGeometry(_))
        ));

        assert!(matches!(
            convert(&NodeGeometry::Mesh(None), &Affine3A::IDENTITY, &world()),
            Err(EchotraceError::MissingGeometry(_))
        ));

        let empty = NodeGeometry::Mesh(Some(Arc::new(TriangleMesh::default())));
        assert!(matches!(
            convert(&empty, &Affine3A::IDENTITY, &world()),
            Err(EchotraceError::EmptyGeometry(_))
        ));

        let flat = NodeGeometry::Collision(CollisionShape::ConcavePolygon {
            faces: vec![Vec3::ZERO, Vec3::X],
        });
        assert!(matches!(
            convert(&flat, &Affine3A::IDENTITY, &world()),
            Err(EchotraceError::EmptyGeometry(_))
        ));
    }

    #[test]
    fn test_expected_kind_matches_conversion() {
        let transform = Affine3A::IDENTITY;
        let cases = vec![
            NodeGeometry::CsgBox { size: Vec3::ONE },
            NodeGeometry::CsgCylinder {
                radius: 1.0,
                height: 2.0,
                cone: false,
            },
            NodeGeometry::CsgCylinder {
                radius: 1.0,
                height: 2.0,
                cone: true,
            },
            NodeGeometry::Collision(CollisionShape::Sphere { radius: 1.0 }),
            NodeGeometry::Collision(CollisionShape::Cylinder {
                radius: 1.0,
                height: 2.0,
            }),
            NodeGeometry::Collision(CollisionShape::HeightMap {
                width: 2,
                depth: 2,
                heights: vec![0.0; 4],
            }),
        ];
        for geometry in cases {
            let shape = convert(&geometry, &transform, &world()).unwrap();
            assert_eq!(expected_kind(&geometry), Some(shape.kind()));
        }
    }

    #[test]
    fn test_refresh_updates_dimensions_and_keeps_mesh_triangles() {
        let mut prism = convert(
            &NodeGeometry::CsgBox { size: Vec3::ONE },
            &Affine3A::IDENTITY,
            &world(),
        )
        .unwrap();
        let moved = Affine3A::from_translation(Vec3::new(4.0, 0.0, 0.0));
        refresh(
            &NodeGeometry::CsgBox {
                size: Vec3::splat(3.0),
            },
            &moved,
            &world(),
            &mut prism,
        )
        .unwrap();
        assert_eq!(
            prism,
            PrimitiveShape::Prism {
                size: Vec3::splat(3.0),
                transform: moved
            }
        );

        let faces = vec![Vec3::ZERO, Vec3::X, Vec3::Z];
        let geometry = NodeGeometry::Collision(CollisionShape::ConcavePolygon { faces });
        let mut mesh = convert(&geometry, &Affine3A::IDENTITY, &world()).unwrap();
        let before = match &mesh {
            PrimitiveShape::Mesh(m) => m.triangles.clone(),
            _ => unreachable!(),
        };
        refresh(&geometry, &moved, &world(), &mut mesh).unwrap();
        match &mesh {
            PrimitiveShape::Mesh(m) => {
                assert_eq!(m.triangles, before);
                assert_eq!(m.transform, moved);
            }
            _ => unreachable!(),
        }
    }
}
