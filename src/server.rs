//! Physics Server
//!
//! The per-tick orchestrator and owner of all collision state: bodies,
//! shapes, the spatial hash, the checked-pair set, scratch pools and the
//! event queue. One `step` call runs a complete tick:
//!
//! 1. apply shape removals deferred from the previous tick,
//! 2. roll area touch sets and clear per-tick state,
//! 3. per-object callbacks, rigid integration, transform refresh,
//! 4. rebuild the spatial hash, pair-testing at insertion time,
//! 5. end-of-tick bookkeeping: sleep timers, area enter/exit diffs,
//!    area callbacks.
//!
//! `step` runs to completion, single-threaded, and never fails mid-tick;
//! detected invariant violations are logged and skipped. The only
//! cross-tick deferral is shape removal: `remove_shape` during tick N takes
//! effect at the start of tick N+1, so no bucket list is ever invalidated
//! mid-iteration.
//!
//! Author: Moroya Sakamoto

use rustc_hash::{FxHashMap, FxHashSet};

use crate::aabb::Aabb;
use crate::body::{BodyId, BodyKind, CollisionBody};
use crate::error::PhysicsError;
use crate::event::{emit_exit_events, AreaEvent};
use crate::math::Vec2;
use crate::pool::Pool;
use crate::resolve::{classify_pair, PairContext};
use crate::sat::Collision;
use crate::shape::{ConvexShape, ShapeId};
use crate::sleeping::{update_sleep, SleepConfig};
use crate::spatial::{SpatialHash, DEFAULT_SPATIAL_SHIFT};
use crate::tilemap::{CollisionMap, MapId};

/// Server construction parameters, fixed for the server's lifetime.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsConfig {
    /// Spatial hash granularity: cells are `1 << spatial_shift` units.
    pub spatial_shift: u32,
    /// Sleep thresholds for rigid bodies.
    pub sleep: SleepConfig,
    /// Objects each scratch pool retains between ticks.
    pub pool_capacity: usize,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            spatial_shift: DEFAULT_SPATIAL_SHIFT,
            sleep: SleepConfig::default(),
            pool_capacity: 64,
        }
    }
}

/// Per-tick diagnostic counters, reset at the top of each `step`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Shapes that took part in the broad phase.
    pub live_shapes: usize,
    /// Candidate pairs reported by the spatial hash (with duplicates).
    pub candidate_pairs: usize,
    /// Unique pairs that survived the filters (checked-set insertions).
    pub pair_checks: usize,
    /// Full SAT pair tests actually executed.
    pub sat_pair_tests: usize,
    /// Rigid-body positional corrections applied.
    pub body_resolutions: usize,
    /// Non-separated pairs on the area branch.
    pub area_overlaps: usize,
    /// Events queued this tick.
    pub events_emitted: usize,
    /// Rigid bodies asleep at end of tick.
    pub sleeping_bodies: usize,
}

/// The server-owned scratch pools (never globals).
pub struct ScratchPools {
    /// Narrow-phase response records.
    pub collisions: Pool<Collision>,
    /// Scratch shape-id buffers (broad-phase candidates, owned-shape lists).
    pub shape_ids: Pool<Vec<ShapeId>>,
}

impl ScratchPools {
    fn new(capacity: usize) -> Self {
        Self {
            collisions: Pool::with_capacity(capacity),
            shape_ids: Pool::with_capacity(capacity),
        }
    }

    /// Total leases currently alive across all pools.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.collisions.outstanding() + self.shape_ids.outstanding()
    }
}

/// Per-object callback invoked by the orchestrator: once per tick for rigid
/// and kinematic bodies during the main pass, and for areas at end of tick.
///
/// The hook receives the server mutably, so it may apply forces, drive
/// kinematic motion queries, or queue shape removals (which defer to the
/// next tick as usual).
pub trait PhysicsHook {
    /// Called once per tick for each participating body.
    fn physics_process(&mut self, server: &mut PhysicsServer, body: BodyId, delta: f64);
}

/// Hook that does nothing; used by [`PhysicsServer::step`].
pub struct NullHook;

impl PhysicsHook for NullHook {
    fn physics_process(&mut self, _server: &mut PhysicsServer, _body: BodyId, _delta: f64) {}
}

impl<F: FnMut(&mut PhysicsServer, BodyId, f64)> PhysicsHook for F {
    fn physics_process(&mut self, server: &mut PhysicsServer, body: BodyId, delta: f64) {
        self(server, body, delta);
    }
}

/// The 2D collision server.
pub struct PhysicsServer {
    config: PhysicsConfig,
    pub(crate) bodies: Vec<Option<CollisionBody>>,
    pub(crate) shapes: FxHashMap<ShapeId, ConvexShape>,
    /// Live shapes in registration order; broad-phase insertion order.
    shape_list: Vec<ShapeId>,
    next_shape_id: u64,
    pub(crate) spatial: SpatialHash,
    checked: FxHashSet<(ShapeId, ShapeId)>,
    delete_queue: Vec<ShapeId>,
    events: Vec<AreaEvent>,
    pub(crate) pools: ScratchPools,
    maps: FxHashMap<MapId, CollisionMap>,
    next_map_id: u32,
    stats: StepStats,
    scratch_bodies: Vec<BodyId>,
    tick: u64,
}

impl PhysicsServer {
    /// Create a server with the given configuration.
    #[must_use]
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            bodies: Vec::new(),
            shapes: FxHashMap::default(),
            shape_list: Vec::new(),
            next_shape_id: 1,
            spatial: SpatialHash::new(config.spatial_shift),
            checked: FxHashSet::default(),
            delete_queue: Vec::new(),
            events: Vec::new(),
            pools: ScratchPools::new(config.pool_capacity),
            maps: FxHashMap::default(),
            next_map_id: 1,
            stats: StepStats::default(),
            scratch_bodies: Vec::new(),
            tick: 0,
        }
    }

    /// Create a server with default configuration.
    #[must_use]
    pub fn new_default() -> Self {
        Self::new(PhysicsConfig::default())
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a collision body. Handles are never reused, so a body
    /// destroyed and recreated is a distinct instance.
    pub fn add_body(&mut self, mut body: CollisionBody) -> BodyId {
        let id = BodyId(self.bodies.len() as u32);
        body.id = id;
        self.bodies.push(Some(body));
        id
    }

    /// Unregister a body. Its shapes are queued for the usual deferred
    /// removal at the start of the next tick.
    pub fn remove_body(&mut self, id: BodyId) -> Result<(), PhysicsError> {
        let body = self
            .bodies
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(PhysicsError::UnknownBody(id))?;
        for sid in body.shape_ids {
            // Already-queued shapes are tolerated.
            let _ = self.remove_shape(sid);
        }
        Ok(())
    }

    /// Attach an axis-aligned rectangle shape (given as half-extents) to a
    /// body.
    pub fn add_rect_shape(
        &mut self,
        owner: BodyId,
        half_extents: Vec2,
    ) -> Result<ShapeId, PhysicsError> {
        let id = ShapeId(self.next_shape_id);
        let shape = ConvexShape::new_rect(id, owner, half_extents)?;
        self.register_shape(shape)
    }

    /// Attach a convex polygon shape (local-space vertices) to a body.
    pub fn add_polygon_shape(
        &mut self,
        owner: BodyId,
        vertices: Vec<Vec2>,
    ) -> Result<ShapeId, PhysicsError> {
        let id = ShapeId(self.next_shape_id);
        let shape = ConvexShape::new(id, owner, vertices)?;
        self.register_shape(shape)
    }

    fn register_shape(&mut self, mut shape: ConvexShape) -> Result<ShapeId, PhysicsError> {
        let owner = shape.owner;
        let (position, rotation, scale) = {
            let body = self
                .body(owner)
                .ok_or(PhysicsError::UnknownBody(owner))?;
            (body.position, body.rotation, body.scale)
        };
        shape.update_transform(position, rotation, scale);
        shape.is_inside_tree = true;
        let id = shape.id;
        self.next_shape_id += 1;
        if let Some(body) = self.body_mut(owner) {
            body.shape_ids.push(id);
        }
        self.shapes.insert(id, shape);
        self.shape_list.push(id);
        Ok(id)
    }

    /// Queue a shape for removal. Deferred: the shape stays in the live
    /// list (excluded from pairing) until the start of the next tick, so
    /// removal can never invalidate an in-progress iteration.
    pub fn remove_shape(&mut self, id: ShapeId) -> Result<(), PhysicsError> {
        let shape = self
            .shapes
            .get_mut(&id)
            .ok_or(PhysicsError::UnknownShape(id))?;
        if shape.queued_for_deletion {
            return Ok(()); // double removal is a no-op
        }
        shape.queued_for_deletion = true;
        self.delete_queue.push(id);
        Ok(())
    }

    /// Register a collision map for the tile-trace query path.
    pub fn add_collision_map(&mut self, map: CollisionMap) -> MapId {
        let id = MapId(self.next_map_id);
        self.next_map_id += 1;
        self.maps.insert(id, map);
        id
    }

    /// Unregister a collision map.
    pub fn remove_collision_map(&mut self, id: MapId) -> Result<(), PhysicsError> {
        self.maps
            .remove(&id)
            .map(|_| ())
            .ok_or(PhysicsError::UnknownMap(id))
    }

    // ========================================================================
    // Access
    // ========================================================================

    /// Look up a live body.
    #[inline]
    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&CollisionBody> {
        self.bodies.get(id.index()).and_then(|slot| slot.as_ref())
    }

    /// Look up a live body mutably.
    #[inline]
    #[must_use]
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut CollisionBody> {
        self.bodies.get_mut(id.index()).and_then(|slot| slot.as_mut())
    }

    /// Look up a registered shape.
    #[inline]
    #[must_use]
    pub fn shape(&self, id: ShapeId) -> Option<&ConvexShape> {
        self.shapes.get(&id)
    }

    /// Iterate all live bodies.
    pub fn iter_bodies(&self) -> impl Iterator<Item = &CollisionBody> {
        self.bodies.iter().flatten()
    }

    /// Registered collision maps.
    pub(crate) fn maps(&self) -> impl Iterator<Item = &CollisionMap> {
        self.maps.values()
    }

    /// Number of live bodies.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.iter().flatten().count()
    }

    /// Number of live shapes (queued removals still count until flushed).
    #[must_use]
    pub fn shape_count(&self) -> usize {
        self.shape_list.len()
    }

    /// Events queued by the last `step`. Drained copies via
    /// [`PhysicsServer::drain_events`].
    #[must_use]
    pub fn events(&self) -> &[AreaEvent] {
        &self.events
    }

    /// Take the queued events, leaving the queue empty.
    pub fn drain_events(&mut self) -> Vec<AreaEvent> {
        core::mem::take(&mut self.events)
    }

    /// Counters from the last `step`.
    #[must_use]
    pub fn stats(&self) -> StepStats {
        self.stats
    }

    /// Completed tick count.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// The configuration the server was built with.
    #[must_use]
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Merged integer bounds of a body's shapes, if it has any.
    #[must_use]
    pub fn body_bounds(&self, id: BodyId) -> Option<Aabb> {
        let body = self.body(id)?;
        let mut bounds: Option<Aabb> = None;
        for sid in &body.shape_ids {
            if let Some(shape) = self.shapes.get(sid) {
                bounds = Some(match bounds {
                    Some(b) => b.merge(shape.aabb),
                    None => shape.aabb,
                });
            }
        }
        bounds
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advance one tick without per-object callbacks.
    pub fn step(&mut self, delta: f64) {
        self.step_with(delta, &mut NullHook);
    }

    /// Advance one tick, invoking `hook` once per rigid/kinematic body
    /// during the main pass and once per area at end of tick.
    pub fn step_with(&mut self, delta: f64, hook: &mut dyn PhysicsHook) {
        if !delta.is_finite() {
            log::warn!("non-finite tick delta ignored");
            return;
        }

        self.flush_removals();
        self.stats = StepStats::default();
        self.checked.clear();
        self.spatial.clear();
        self.events.clear();

        for body in self.bodies.iter_mut().flatten() {
            if body.kind == BodyKind::Area {
                body.roll_touched_sets();
            }
        }

        // Main pass: callbacks, integration, transform refresh. Ids are
        // snapshotted so the hook may add or remove bodies freely.
        let mut ids = core::mem::take(&mut self.scratch_bodies);
        ids.clear();
        ids.extend(self.bodies.iter().flatten().map(|b| b.id));
        for &id in &ids {
            let Some(kind) = self.body(id).map(|b| b.kind) else {
                continue;
            };
            match kind {
                BodyKind::Rigid => {
                    hook.physics_process(self, id, delta);
                    self.integrate_rigid(id, delta);
                    self.refresh_body_shapes(id);
                }
                BodyKind::Kinematic => {
                    hook.physics_process(self, id, delta);
                    self.refresh_body_shapes(id);
                }
                BodyKind::Static | BodyKind::Area => {
                    self.refresh_body_shapes(id);
                }
            }
        }

        // Broad phase: insert every live shape, pair-testing each new shape
        // against bucket occupants at insertion time.
        self.stats.live_shapes = self.shape_list.len();
        for i in 0..self.shape_list.len() {
            let sid = self.shape_list[i];
            let Some((aabb, passive)) = self.shape_hash_entry(sid) else {
                continue;
            };
            let mut candidates = self.pools.shape_ids.acquire();
            self.spatial.insert(sid, aabb, passive, &mut candidates);
            self.stats.candidate_pairs += candidates.len();
            for j in 0..candidates.len() {
                let other = candidates[j];
                let mut ctx = PairContext {
                    bodies: &mut self.bodies,
                    shapes: &mut self.shapes,
                    pools: &self.pools,
                    events: &mut self.events,
                    checked: &mut self.checked,
                    stats: &mut self.stats,
                };
                classify_pair(&mut ctx, sid, other);
            }
        }

        // End of tick: once per dynamic object, however many pairs it was
        // part of.
        for &id in &ids {
            let Some(kind) = self.body(id).map(|b| b.kind) else {
                continue;
            };
            match kind {
                BodyKind::Rigid => {
                    let sleep = self.config.sleep;
                    let asleep = match self
                        .bodies
                        .get_mut(id.index())
                        .and_then(|slot| slot.as_mut())
                    {
                        Some(body) => {
                            update_sleep(body, &sleep, delta);
                            body.sleeping
                        }
                        None => false,
                    };
                    if asleep {
                        self.stats.sleeping_bodies += 1;
                    }
                }
                BodyKind::Area => {
                    if let Some(body) = self.bodies.get(id.index()).and_then(|slot| slot.as_ref())
                    {
                        emit_exit_events(body, &mut self.events);
                    }
                    hook.physics_process(self, id, delta);
                }
                BodyKind::Static | BodyKind::Kinematic => {}
            }
        }

        self.stats.events_emitted = self.events.len();
        ids.clear();
        self.scratch_bodies = ids;

        debug_assert_eq!(
            self.pools.outstanding(),
            0,
            "a pool lease leaked out of the tick"
        );
        self.tick += 1;
    }

    /// AABB and passivity for a shape about to enter the hash, or `None`
    /// if it should be skipped this tick.
    fn shape_hash_entry(&self, sid: ShapeId) -> Option<(Aabb, bool)> {
        let shape = self.shapes.get(&sid)?;
        if shape.queued_for_deletion {
            return None;
        }
        let owner = self.body(shape.owner)?;
        // Kinematic shapes sit in the hash for others to find, but never
        // initiate pair tests; they are probed through motion queries.
        Some((shape.aabb, owner.kind == BodyKind::Kinematic))
    }

    /// Apply removals queued during the previous tick.
    fn flush_removals(&mut self) {
        if self.delete_queue.is_empty() {
            return;
        }
        let queue = core::mem::take(&mut self.delete_queue);
        for sid in queue {
            if let Some(shape) = self.shapes.remove(&sid) {
                if let Some(body) = self
                    .bodies
                    .get_mut(shape.owner.index())
                    .and_then(|slot| slot.as_mut())
                {
                    body.shape_ids.retain(|&s| s != sid);
                }
            }
        }
        let shapes = &self.shapes;
        self.shape_list.retain(|sid| shapes.contains_key(sid));
    }

    /// Velocity integration for one rigid body. Sleeping bodies are parked:
    /// no integration, zero motion.
    fn integrate_rigid(&mut self, id: BodyId, delta: f64) {
        let Some(body) = self.bodies.get_mut(id.index()).and_then(|slot| slot.as_mut()) else {
            return;
        };
        if body.kind != BodyKind::Rigid {
            return;
        }
        if body.sleeping {
            body.motion = Vec2::ZERO;
            return;
        }
        body.motion = body.linear_velocity * delta;
        body.position += body.motion;
        body.rotation += body.angular_velocity * delta;
    }

    /// Push a body's current transform into all of its shapes.
    fn refresh_body_shapes(&mut self, id: BodyId) {
        let Some(body) = self.bodies.get(id.index()).and_then(|slot| slot.as_ref()) else {
            return;
        };
        let position = body.position;
        let rotation = body.rotation;
        let scale = body.scale;
        for sid in &body.shape_ids {
            if let Some(shape) = self.shapes.get_mut(sid) {
                shape.update_transform(position, rotation, scale);
            }
        }
    }
}
