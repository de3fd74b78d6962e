//! Pair Classification & Collision Resolution
//!
//! Every candidate pair reported by the broad phase runs the same gauntlet:
//! cheap filters, once-per-tick dedup, canonical ordering, then either the
//! body-vs-body branch (full SAT with a pooled response record, positional
//! correction and bounce for rigid bodies) or the area branch (overlap-only
//! SAT feeding the trigger sets).
//!
//! Nothing in here returns an error: malformed state is skipped with a log
//! line and the tick continues.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::body::{BodyId, BodyKind, CollisionBody};
use crate::event::{record_area_overlap, record_body_overlap, AreaEvent};
use crate::filter::{excepted, scan_match};
use crate::math::Vec2;
use crate::sat;
use crate::server::{ScratchPools, StepStats};
use crate::shape::{ConvexShape, ShapeId};

/// Angular tolerance around ±90° within which a contact counts as grazing.
///
/// Grazing contacts get a direct positional push along the normal instead
/// of the `overlap / cos(angle)` back-off, which would blow up as the angle
/// approaches perpendicular.
pub(crate) const GRAZING_TOLERANCE: f64 = 0.1 * core::f64::consts::PI;

/// Borrowed server state threaded through pair resolution.
pub(crate) struct PairContext<'a> {
    pub bodies: &'a mut Vec<Option<CollisionBody>>,
    pub shapes: &'a mut FxHashMap<ShapeId, ConvexShape>,
    pub pools: &'a ScratchPools,
    pub events: &'a mut Vec<AreaEvent>,
    pub checked: &'a mut FxHashSet<(ShapeId, ShapeId)>,
    pub stats: &'a mut StepStats,
}

#[inline]
fn live_body(bodies: &[Option<CollisionBody>], id: BodyId) -> Option<&CollisionBody> {
    bodies.get(id.index()).and_then(|slot| slot.as_ref())
}

/// Run one candidate pair through filters, dedup and the matching branch.
pub(crate) fn classify_pair(ctx: &mut PairContext<'_>, s_a: ShapeId, s_b: ShapeId) {
    // Filter 1: same shape/owner, or either side mid-removal.
    if s_a == s_b {
        return;
    }
    let (owner_a, owner_b) = {
        let (Some(sa), Some(sb)) = (ctx.shapes.get(&s_a), ctx.shapes.get(&s_b)) else {
            return;
        };
        if sa.queued_for_deletion || sb.queued_for_deletion || sa.owner == sb.owner {
            return;
        }
        (sa.owner, sb.owner)
    };
    let (Some(body_a), Some(body_b)) = (
        live_body(ctx.bodies, owner_a),
        live_body(ctx.bodies, owner_b),
    ) else {
        log::debug!("candidate pair with unregistered owner, skipping");
        return;
    };

    // Filter 2: statics never interact with each other.
    if body_a.kind == BodyKind::Static && body_b.kind == BodyKind::Static {
        return;
    }

    // Filter 3: neither side scans the other.
    if !scan_match(body_a, body_b) {
        return;
    }

    // Filter 4: each unordered shape pair resolves at most once per tick,
    // however many cells it co-occupies.
    let key = if s_a < s_b { (s_a, s_b) } else { (s_b, s_a) };
    if !ctx.checked.insert(key) {
        return;
    }
    ctx.stats.pair_checks += 1;

    // Canonical ordering: lower pair priority first. Bookkeeping only.
    let swap = body_b.kind.pair_priority() < body_a.kind.pair_priority();
    let (first_shape, second_shape) = if swap { (s_b, s_a) } else { (s_a, s_b) };
    let (first_id, second_id) = if swap {
        (owner_b, owner_a)
    } else {
        (owner_a, owner_b)
    };
    let first_kind = if swap { body_b.kind } else { body_a.kind };
    let second_kind = if swap { body_a.kind } else { body_b.kind };

    if first_kind == BodyKind::Area {
        resolve_area_pair(ctx, first_shape, second_shape, first_id, second_id, second_kind);
    } else {
        if excepted(body_a, body_b) {
            return;
        }
        resolve_body_pair(ctx, first_shape, second_shape, first_id, first_kind);
    }
}

/// Area branch: overlap-only SAT (no response record), feeding the trigger
/// sets. Area-vs-area is mutual; area-vs-body only touches the area's side.
fn resolve_area_pair(
    ctx: &mut PairContext<'_>,
    first_shape: ShapeId,
    second_shape: ShapeId,
    first_id: BodyId,
    second_id: BodyId,
    second_kind: BodyKind,
) {
    ctx.stats.sat_pair_tests += 1;
    let separated = {
        let (Some(sa), Some(sb)) = (ctx.shapes.get(&first_shape), ctx.shapes.get(&second_shape))
        else {
            return;
        };
        let (Some(a), Some(b)) = (
            live_body(ctx.bodies, first_id),
            live_body(ctx.bodies, second_id),
        ) else {
            return;
        };
        sat::test_pair(
            a.position,
            &sa.vertices,
            &sa.normals,
            b.position,
            &sb.vertices,
            &sb.normals,
            None,
        )
    };
    if separated {
        return;
    }
    ctx.stats.area_overlaps += 1;

    if second_kind == BodyKind::Area {
        if let Some(area) = ctx.bodies[first_id.index()].as_mut() {
            record_area_overlap(area, second_id, ctx.events);
        }
        if let Some(area) = ctx.bodies[second_id.index()].as_mut() {
            record_area_overlap(area, first_id, ctx.events);
        }
    } else if let Some(area) = ctx.bodies[first_id.index()].as_mut() {
        record_body_overlap(area, second_id, ctx.events);
    }
}

/// Body-vs-body branch: full SAT into a pooled record; rigid canonical
/// bodies get positionally corrected and bounced.
fn resolve_body_pair(
    ctx: &mut PairContext<'_>,
    first_shape: ShapeId,
    second_shape: ShapeId,
    first_id: BodyId,
    first_kind: BodyKind,
) {
    ctx.stats.sat_pair_tests += 1;
    // Copy the pool reference out so the lease's borrow is independent of
    // `ctx`, which the correction below needs mutably.
    let pools = ctx.pools;
    let mut best = pools.collisions.acquire();
    let separated = {
        let (Some(sa), Some(sb)) = (ctx.shapes.get(&first_shape), ctx.shapes.get(&second_shape))
        else {
            return;
        };
        let (Some(a), Some(b)) = (
            live_body(ctx.bodies, sa.owner),
            live_body(ctx.bodies, sb.owner),
        ) else {
            return;
        };
        sat::test_pair(
            a.position,
            &sa.vertices,
            &sa.normals,
            b.position,
            &sb.vertices,
            &sb.normals,
            Some(&mut best),
        )
    };
    if separated || !best.recorded() {
        return;
    }

    if first_kind == BodyKind::Rigid {
        let normal = best.normal;
        let overlap = best.overlap;
        apply_rigid_correction(ctx, first_id, normal, overlap);
        ctx.stats.body_resolutions += 1;
    }
}

/// Separate a rigid body out of penetration and adjust its velocity.
///
/// A sleeping body is corrected like any other — penetration always
/// resolves — but it is not woken; integration for it stays parked until
/// an explicit impulse arrives.
pub(crate) fn apply_rigid_correction(
    ctx: &mut PairContext<'_>,
    body_id: BodyId,
    normal: Vec2,
    overlap: f64,
) {
    let Some(body) = ctx
        .bodies
        .get_mut(body_id.index())
        .and_then(|slot| slot.as_mut())
    else {
        return;
    };

    let motion_dir = body.motion.normalize();
    let cos = normal.dot(motion_dir).clamp(-1.0, 1.0);
    let angle = cos.acos();

    if (angle - core::f64::consts::FRAC_PI_2).abs() < GRAZING_TOLERANCE {
        // Grazing contact: push straight out along the normal and keep only
        // the tangential velocity. A zero motion vector lands here too
        // (its angle degenerates to exactly 90 degrees).
        body.position += normal * overlap;
        body.linear_velocity = body.linear_velocity.slide(normal);
    } else {
        // Back the body off along its own motion far enough to clear the
        // overlap, then reflect velocity scaled by restitution.
        let push = overlap / cos;
        let correction = motion_dir * push;
        body.position += correction;
        body.motion += correction;
        body.linear_velocity = body.linear_velocity.reflect(normal) * body.bounce;
    }

    let position = body.position;
    let rotation = body.rotation;
    let scale = body.scale;
    let pools = ctx.pools;
    let mut shape_ids = pools.shape_ids.acquire();
    shape_ids.extend_from_slice(&body.shape_ids);

    // Later pairs this tick test against these shapes; their geometry must
    // reflect the corrected position now, not next tick.
    for &sid in shape_ids.iter() {
        if let Some(shape) = ctx.shapes.get_mut(&sid) {
            shape.update_transform(position, rotation, scale);
        }
    }
}
