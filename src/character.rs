//! Kinematic Motion Queries
//!
//! Caller-driven movement for kinematic bodies: `body_test_motion` sweeps a
//! requested displacement against the world and stops at the first blocking
//! contact, and `move_and_slide` layers floor/wall/ceiling classification
//! and bounded slide iterations on top of it. Neither runs automatically
//! each tick — a character controller probes as often as it likes, inside
//! or outside the main tick.
//!
//! Author: Moroya Sakamoto

use crate::body::{BodyId, BodyKind};
use crate::filter::{excepted, scan_match};
use crate::math::Vec2;
use crate::resolve::GRAZING_TOLERANCE;
use crate::sat::{self, Collision};
use crate::server::PhysicsServer;

/// Slack added to the floor angle threshold when classifying normals.
const FLOOR_ANGLE_EPSILON: f64 = 0.01;

/// Parameters for [`PhysicsServer::move_and_slide`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlideParams {
    /// Unit direction that counts as "up" (`(0, -1)` in a Y-down world).
    pub floor_normal: Vec2,
    /// Maximum angle (radians) between a contact normal and `floor_normal`
    /// that still counts as floor.
    pub floor_max_angle: f64,
    /// Slide iterations before giving up on the remaining motion.
    pub max_bounces: usize,
}

impl Default for SlideParams {
    fn default() -> Self {
        Self {
            floor_normal: Vec2::new(0.0, -1.0),
            floor_max_angle: core::f64::consts::FRAC_PI_4,
            max_bounces: 4,
        }
    }
}

/// Outcome of a [`PhysicsServer::move_and_slide`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SlideResult {
    /// Input velocity with every contacted normal's component slid off.
    pub velocity: Vec2,
    /// A contact normal matched the floor direction.
    pub on_floor: bool,
    /// A contact normal matched the inverted floor direction.
    pub on_ceiling: bool,
    /// A contact matched neither floor nor ceiling.
    pub on_wall: bool,
    /// Velocity of the last floor collider (moving-platform inheritance).
    pub floor_velocity: Vec2,
    /// Number of blocking contacts consumed.
    pub collision_count: usize,
}

impl PhysicsServer {
    /// Sweep `body` along `motion`, stopping at the first blocking contact.
    ///
    /// The motion is applied provisionally; each of the body's shapes is
    /// hashed with the union of its pre- and post-motion AABB so the broad
    /// phase catches everything the sweep passes through. Areas never
    /// block. On contact, the position is corrected exactly like the rigid
    /// resolution branch and the (pooled, copied-out) record is returned;
    /// with no contact the full motion stands and `None` comes back.
    ///
    /// The contact returned is the first one found in hash iteration
    /// order, which is not necessarily the nearest along the sweep; pick
    /// probe distances accordingly. Candidates come from the spatial hash
    /// as of the most recent `step`.
    pub fn body_test_motion(&mut self, body_id: BodyId, motion: Vec2) -> Option<Collision> {
        if !motion.is_finite() {
            log::warn!("body_test_motion: non-finite motion for {body_id}");
            return None;
        }
        let (start_pos, rotation, scale) = {
            let body = self.body(body_id)?;
            (body.position, body.rotation, body.scale)
        };
        let provisional = start_pos + motion;

        let mut mover_ids = self.pools.shape_ids.acquire();
        {
            let body = self.body(body_id)?;
            mover_ids.extend_from_slice(&body.shape_ids);
        }

        // Provisionally move, hashing each shape's swept bounds.
        if let Some(body) = self.bodies.get_mut(body_id.index()).and_then(|s| s.as_mut()) {
            body.position = provisional;
        }
        let mut candidates = self.pools.shape_ids.acquire();
        for &sid in mover_ids.iter() {
            let Some(shape) = self.shapes.get_mut(&sid) else {
                continue;
            };
            let pre = shape.aabb;
            shape.update_transform(provisional, rotation, scale);
            let swept = pre.merge(shape.aabb);
            self.spatial.query(swept, &mut candidates);
        }
        candidates.sort_unstable();
        candidates.dedup();

        for &sid in mover_ids.iter() {
            for &cand in candidates.iter() {
                if cand == sid || mover_ids.contains(&cand) {
                    continue;
                }
                let contact = {
                    let Some(other_shape) = self.shape(cand) else {
                        continue;
                    };
                    if other_shape.queued_for_deletion || other_shape.owner == body_id {
                        continue;
                    }
                    let Some(other_body) = self.body(other_shape.owner) else {
                        continue;
                    };
                    if other_body.kind == BodyKind::Area {
                        continue;
                    }
                    let Some(mover) = self.body(body_id) else {
                        return None;
                    };
                    if !scan_match(mover, other_body) || excepted(mover, other_body) {
                        continue;
                    }
                    let Some(mover_shape) = self.shape(sid) else {
                        continue;
                    };
                    let mut best = self.pools.collisions.acquire();
                    let separated = sat::test_pair(
                        mover.position,
                        &mover_shape.vertices,
                        &mover_shape.normals,
                        other_body.position,
                        &other_shape.vertices,
                        &other_shape.normals,
                        Some(&mut best),
                    );
                    if separated || !best.recorded() {
                        None
                    } else {
                        Some((
                            best.normal,
                            best.overlap,
                            other_shape.owner,
                            other_body.linear_velocity,
                        ))
                    }
                };
                let Some((normal, overlap, collider, collider_velocity)) = contact else {
                    continue;
                };

                // First blocking contact wins: correct and return.
                let motion_dir = motion.normalize();
                let cos = normal.dot(motion_dir).clamp(-1.0, 1.0);
                let angle = cos.acos();
                let corrected =
                    if (angle - core::f64::consts::FRAC_PI_2).abs() < GRAZING_TOLERANCE {
                        provisional + normal * overlap
                    } else {
                        provisional + motion_dir * (overlap / cos)
                    };

                if let Some(body) =
                    self.bodies.get_mut(body_id.index()).and_then(|s| s.as_mut())
                {
                    body.position = corrected;
                }
                for &ms in mover_ids.iter() {
                    if let Some(shape) = self.shapes.get_mut(&ms) {
                        shape.update_transform(corrected, rotation, scale);
                    }
                }

                let travel = corrected - start_pos;
                return Some(Collision {
                    collider: Some(collider),
                    collider_velocity,
                    normal,
                    travel,
                    remainder: motion - travel,
                    overlap,
                });
            }
        }

        None
    }

    /// Move with sliding: repeatedly consume blocking contacts, sliding the
    /// remaining motion and the velocity along each contact normal, up to
    /// `params.max_bounces` times.
    ///
    /// Contact normals are classified against `params.floor_normal`: floor
    /// when `normal . floor_normal >= cos(floor_max_angle + eps)`, ceiling
    /// against the inverted floor normal, wall otherwise. Floor contacts
    /// record the collider's velocity for moving-platform inheritance.
    pub fn move_and_slide(
        &mut self,
        body_id: BodyId,
        velocity: Vec2,
        delta: f64,
        params: &SlideParams,
    ) -> SlideResult {
        let mut result = SlideResult {
            velocity,
            ..SlideResult::default()
        };
        let floor_cos = (params.floor_max_angle + FLOOR_ANGLE_EPSILON).cos();
        let mut motion = velocity * delta;

        for _ in 0..params.max_bounces {
            let Some(collision) = self.body_test_motion(body_id, motion) else {
                break;
            };
            result.collision_count += 1;

            if collision.normal.dot(params.floor_normal) >= floor_cos {
                result.on_floor = true;
                result.floor_velocity = collision.collider_velocity;
            } else if collision.normal.dot(-params.floor_normal) >= floor_cos {
                result.on_ceiling = true;
            } else {
                result.on_wall = true;
            }

            motion = collision.remainder.slide(collision.normal);
            result.velocity = result.velocity.slide(collision.normal);
            if motion == Vec2::ZERO {
                break;
            }
        }

        result
    }
}
