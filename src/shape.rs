//! Collision Shapes
//!
//! Convex polygon geometry attached to a collision body: local-space
//! vertices fixed at construction, world-space vertices and edge normals
//! refreshed whenever the owner's transform changes, and a derived integer
//! AABB for broad-phase hashing.
//!
//! Which edges contribute normals is decided once, from local-space
//! geometry: parallel and anti-parallel edges share a separating axis, so
//! only distinct directions are kept (an axis-aligned rectangle carries 2
//! normals, not 4). Linear transforms preserve parallelism, so the
//! selection stays valid under every `update_transform`.
//!
//! Author: Moroya Sakamoto

use core::fmt;

use crate::aabb::Aabb;
use crate::body::BodyId;
use crate::error::PhysicsError;
use crate::math::Vec2;

/// Handle to a registered shape.
///
/// Ids increase monotonically for the lifetime of the server and are never
/// reused; the broad phase orders pair keys by id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeId(pub(crate) u64);

impl ShapeId {
    /// Raw id value.
    #[inline]
    #[must_use]
    pub const fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape#{}", self.0)
    }
}

/// Convex polygon collision shape in world space.
#[derive(Clone, Debug)]
pub struct ConvexShape {
    /// Process-unique shape id (assigned at registration).
    pub id: ShapeId,
    /// Owning collision body. The shape never outlives its owner.
    pub owner: BodyId,
    /// World-space vertices, refreshed by [`ConvexShape::update_transform`].
    pub vertices: Vec<Vec2>,
    /// World-space outward unit normals, one per distinct edge direction.
    pub normals: Vec<Vec2>,
    /// Conservative integer bounds of `vertices`.
    pub aabb: Aabb,
    /// Whether the shape is currently registered with the server.
    pub is_inside_tree: bool,
    /// Marked by a deferred removal; excluded from pairing until flushed.
    pub queued_for_deletion: bool,
    local_vertices: Vec<Vec2>,
    normal_edges: Vec<usize>,
}

impl ConvexShape {
    /// Build a shape from local-space polygon vertices.
    ///
    /// Winding may be either direction but is fixed per instance. Fails on
    /// fewer than 3 vertices, non-finite coordinates, or a polygon whose
    /// edges collapse to fewer than 2 distinct directions.
    pub(crate) fn new(
        id: ShapeId,
        owner: BodyId,
        local_vertices: Vec<Vec2>,
    ) -> Result<Self, PhysicsError> {
        if local_vertices.len() < 3 {
            return Err(PhysicsError::DegenerateShape {
                got: local_vertices.len(),
            });
        }
        if local_vertices.iter().any(|v| !v.is_finite()) {
            return Err(PhysicsError::NonFinite {
                context: "shape vertices",
            });
        }
        let normal_edges = distinct_edge_indices(&local_vertices);
        if normal_edges.len() < 2 {
            return Err(PhysicsError::DegenerateShape {
                got: local_vertices.len(),
            });
        }
        let count = local_vertices.len();
        let mut shape = Self {
            id,
            owner,
            vertices: vec![Vec2::ZERO; count],
            normals: vec![Vec2::ZERO; normal_edges.len()],
            aabb: Aabb::default(),
            is_inside_tree: false,
            queued_for_deletion: false,
            local_vertices,
            normal_edges,
        };
        shape.update_transform(Vec2::ZERO, 0.0, Vec2::ONE);
        Ok(shape)
    }

    /// Build an axis-aligned rectangle from half-extents.
    pub(crate) fn new_rect(
        id: ShapeId,
        owner: BodyId,
        half_extents: Vec2,
    ) -> Result<Self, PhysicsError> {
        if !half_extents.is_finite() || half_extents.x <= 0.0 || half_extents.y <= 0.0 {
            return Err(PhysicsError::NonFinite {
                context: "rect half extents",
            });
        }
        let h = half_extents;
        Self::new(
            id,
            owner,
            vec![
                Vec2::new(-h.x, -h.y),
                Vec2::new(h.x, -h.y),
                Vec2::new(h.x, h.y),
                Vec2::new(-h.x, h.y),
            ],
        )
    }

    /// Recompute world vertices, normals and AABB from the owner's
    /// transform.
    ///
    /// Each world vertex is `rotate(local, rotation) * scale + position`.
    /// Idempotent for identical inputs; must run before the shape takes
    /// part in a tick's hashing, and allocates nothing.
    pub fn update_transform(&mut self, position: Vec2, rotation: f64, scale: Vec2) {
        if !position.is_finite() || !rotation.is_finite() || !scale.is_finite() {
            // Fault-tolerant posture: report and keep the last good state.
            log::warn!("{}: non-finite transform ignored", self.id);
            return;
        }
        for (world, local) in self.vertices.iter_mut().zip(&self.local_vertices) {
            *world = local.rotate(rotation).scale_by(scale) + position;
        }

        // Winding can flip under a mirrored scale; orient normals outward
        // from the current world-space winding.
        let n = self.vertices.len();
        let mut doubled_area = 0.0;
        for i in 0..n {
            doubled_area += self.vertices[i].cross_scalar(self.vertices[(i + 1) % n]);
        }
        let ccw = doubled_area >= 0.0;

        for (slot, &edge_index) in self.normals.iter_mut().zip(&self.normal_edges) {
            let edge = self.vertices[(edge_index + 1) % n] - self.vertices[edge_index];
            let outward = if ccw {
                Vec2::new(edge.y, -edge.x)
            } else {
                Vec2::new(-edge.y, edge.x)
            };
            *slot = outward.normalize();
        }

        self.aabb = Aabb::from_points(&self.vertices);
    }

    /// Number of polygon vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

/// Edge indices whose directions are pairwise distinct (anti-parallel
/// counts as the same axis). Zero-length edges are dropped.
fn distinct_edge_indices(vertices: &[Vec2]) -> Vec<usize> {
    const PARALLEL_DOT: f64 = 1.0 - 1e-9;

    let n = vertices.len();
    let mut kept: Vec<usize> = Vec::new();
    let mut kept_dirs: Vec<Vec2> = Vec::new();
    for i in 0..n {
        let dir = (vertices[(i + 1) % n] - vertices[i]).normalize();
        if dir == Vec2::ZERO {
            continue;
        }
        if kept_dirs.iter().any(|k| k.dot(dir).abs() > PARALLEL_DOT) {
            continue;
        }
        kept.push(i);
        kept_dirs.push(dir);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(half: Vec2) -> ConvexShape {
        ConvexShape::new_rect(ShapeId(1), BodyId(0), half).unwrap()
    }

    #[test]
    fn test_rect_has_two_normals() {
        let shape = rect(Vec2::new(2.0, 1.0));
        assert_eq!(shape.normals.len(), 2, "axis-aligned rect collapses to 2 normals");
    }

    #[test]
    fn test_triangle_has_three_normals() {
        let shape = ConvexShape::new(
            ShapeId(1),
            BodyId(0),
            vec![Vec2::ZERO, Vec2::new(4.0, 0.0), Vec2::new(0.0, 3.0)],
        )
        .unwrap();
        assert_eq!(shape.normals.len(), 3);
    }

    #[test]
    fn test_update_transform_translates_aabb() {
        let mut shape = rect(Vec2::new(1.0, 1.0));
        shape.update_transform(Vec2::new(10.0, 20.0), 0.0, Vec2::ONE);
        assert_eq!(shape.aabb, Aabb::new(9, 19, 11, 21));
    }

    #[test]
    fn test_update_transform_idempotent() {
        let mut shape = rect(Vec2::new(1.5, 0.5));
        shape.update_transform(Vec2::new(3.0, -2.0), 0.7, Vec2::new(2.0, 1.0));
        let vertices = shape.vertices.clone();
        let aabb = shape.aabb;
        shape.update_transform(Vec2::new(3.0, -2.0), 0.7, Vec2::new(2.0, 1.0));
        assert_eq!(shape.vertices, vertices);
        assert_eq!(shape.aabb, aabb);
    }

    #[test]
    fn test_rotated_rect_aabb_grows() {
        let mut shape = rect(Vec2::new(1.0, 1.0));
        shape.update_transform(Vec2::ZERO, core::f64::consts::FRAC_PI_4, Vec2::ONE);
        // A unit square rotated 45 degrees spans sqrt(2) per side.
        assert!(shape.aabb.right >= 1);
        assert!(shape.aabb.left <= -1);
        // All four edge directions are now two distinct axes still.
        assert_eq!(shape.normals.len(), 2);
    }

    #[test]
    fn test_normals_point_outward() {
        let shape = rect(Vec2::new(1.0, 1.0));
        // Every normal, evaluated at an edge midpoint, points away from the
        // centroid.
        let centroid = shape
            .vertices
            .iter()
            .fold(Vec2::ZERO, |acc, &v| acc + v)
            / shape.vertices.len() as f64;
        for (slot, &edge) in shape.normals.iter().zip(&[0usize, 1]) {
            let n = shape.vertices.len();
            let mid = (shape.vertices[edge] + shape.vertices[(edge + 1) % n]) * 0.5;
            assert!(slot.dot(mid - centroid) > 0.0, "normal points outward");
        }
    }

    #[test]
    fn test_degenerate_rejected() {
        let err = ConvexShape::new(ShapeId(1), BodyId(0), vec![Vec2::ZERO, Vec2::ONE]);
        assert!(matches!(err, Err(PhysicsError::DegenerateShape { got: 2 })));

        let err = ConvexShape::new(
            ShapeId(1),
            BodyId(0),
            vec![Vec2::ZERO, Vec2::new(f64::NAN, 0.0), Vec2::ONE],
        );
        assert!(matches!(err, Err(PhysicsError::NonFinite { .. })));
    }

    #[test]
    fn test_non_finite_transform_keeps_last_state() {
        let mut shape = rect(Vec2::new(1.0, 1.0));
        shape.update_transform(Vec2::new(5.0, 5.0), 0.0, Vec2::ONE);
        let aabb = shape.aabb;
        shape.update_transform(Vec2::new(f64::NAN, 0.0), 0.0, Vec2::ONE);
        assert_eq!(shape.aabb, aabb, "NaN transform must not corrupt geometry");
    }
}
