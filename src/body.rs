//! Collision Bodies
//!
//! The four body variants the server simulates — static, kinematic, rigid
//! and area — share one struct with a [`BodyKind`] tag; the orchestrator
//! dispatches on the tag with exhaustive matches. World transforms are
//! supplied by the owning scene node; the server only writes back corrected
//! positions for rigid bodies and kinematic motion queries.

use core::fmt;

use crate::math::Vec2;
use crate::shape::ShapeId;

/// Handle to a registered collision body.
///
/// Slots are never reused: a destroyed-then-recreated body is a distinct
/// instance, which is what makes area re-entry events fire again for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub(crate) u32);

impl BodyId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw id value.
    #[inline]
    #[must_use]
    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

/// The four collision object variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyKind {
    /// Immovable level geometry. Never interacts with other statics.
    Static,
    /// Externally driven body, moved through explicit motion queries.
    Kinematic,
    /// Simulated body with velocity, bounce and sleep state.
    Rigid,
    /// Overlap sensor: detects contacts, never responds physically.
    Area,
}

impl BodyKind {
    /// Canonical ordering for pair bookkeeping: Area < Rigid < Kinematic <
    /// Static.
    ///
    /// This is an explicit tie-break, deliberately decoupled from the enum's
    /// declaration order. It decides which body of a candidate pair is
    /// "first" for bookkeeping; it never changes the physics outcome.
    #[inline]
    #[must_use]
    pub const fn pair_priority(self) -> u8 {
        match self {
            Self::Area => 0,
            Self::Rigid => 1,
            Self::Kinematic => 2,
            Self::Static => 3,
        }
    }
}

/// A collision object: owns shapes, carries layer/mask bits, and — for the
/// rigid and area variants — the per-kind simulation state.
#[derive(Clone, Debug)]
pub struct CollisionBody {
    /// Handle assigned at registration.
    pub id: BodyId,
    /// Variant tag the orchestrator dispatches on.
    pub kind: BodyKind,
    /// Bitmask: what this body *is*.
    pub collision_layer: u32,
    /// Bitmask: what this body scans against.
    pub collision_mask: u32,
    /// Bodies excluded from pairwise testing with this one (symmetric,
    /// body–body only; area overlap ignores it).
    pub collision_exceptions: Vec<BodyId>,
    /// Shapes registered for this body.
    pub shape_ids: Vec<ShapeId>,

    /// World position, supplied by the scene graph.
    pub position: Vec2,
    /// World rotation in radians.
    pub rotation: f64,
    /// World per-axis scale.
    pub scale: Vec2,

    // Rigid-only state. Inert on the other variants.
    /// Linear velocity (units per second).
    pub linear_velocity: Vec2,
    /// Angular velocity (radians per second).
    pub angular_velocity: f64,
    /// Mass; use [`CollisionBody::set_mass`] to keep the inverse in sync.
    pub mass: f64,
    /// Cached `1 / mass`.
    pub inv_mass: f64,
    /// Moment of inertia.
    pub inertia: f64,
    /// Cached `1 / inertia`.
    pub inv_inertia: f64,
    /// Restitution applied when velocity reflects off a contact.
    pub bounce: f64,
    /// Friction coefficient. Stored for the API; the current resolution
    /// does not consume it.
    pub friction: f64,
    /// Whether the sleep state machine may ever put this body to sleep.
    pub can_sleep: bool,
    /// Sleeping bodies skip force integration but stay collidable. A
    /// sleeping body struck by another is pushed, not woken; only an
    /// explicit impulse wakes it.
    pub sleeping: bool,
    /// Seconds spent continuously below the sleep velocity thresholds.
    pub still_time: f64,
    /// World-space displacement accumulated this tick.
    pub motion: Vec2,

    // Area-only state.
    /// Areas overlapped this tick.
    pub touched_areas: Vec<BodyId>,
    /// Bodies overlapped this tick.
    pub touched_bodies: Vec<BodyId>,
    /// Areas overlapped on the previous tick.
    pub prev_touched_areas: Vec<BodyId>,
    /// Bodies overlapped on the previous tick.
    pub prev_touched_bodies: Vec<BodyId>,
}

impl CollisionBody {
    fn base(kind: BodyKind, position: Vec2) -> Self {
        Self {
            id: BodyId(u32::MAX),
            kind,
            collision_layer: 1,
            collision_mask: 1,
            collision_exceptions: Vec::new(),
            shape_ids: Vec::new(),
            position,
            rotation: 0.0,
            scale: Vec2::ONE,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            mass: 1.0,
            inv_mass: 1.0,
            inertia: 1.0,
            inv_inertia: 1.0,
            bounce: 0.0,
            friction: 1.0,
            can_sleep: true,
            sleeping: false,
            still_time: 0.0,
            motion: Vec2::ZERO,
            touched_areas: Vec::new(),
            touched_bodies: Vec::new(),
            prev_touched_areas: Vec::new(),
            prev_touched_bodies: Vec::new(),
        }
    }

    /// Create static level geometry.
    #[must_use]
    pub fn new_static(position: Vec2) -> Self {
        let mut body = Self::base(BodyKind::Static, position);
        body.mass = 0.0;
        body.inv_mass = 0.0;
        body.inertia = 0.0;
        body.inv_inertia = 0.0;
        body
    }

    /// Create a kinematic body (driven by motion queries).
    #[must_use]
    pub fn new_kinematic(position: Vec2) -> Self {
        let mut body = Self::base(BodyKind::Kinematic, position);
        body.mass = 0.0;
        body.inv_mass = 0.0;
        body.inertia = 0.0;
        body.inv_inertia = 0.0;
        body
    }

    /// Create a simulated rigid body.
    #[must_use]
    pub fn new_rigid(position: Vec2, mass: f64) -> Self {
        let mut body = Self::base(BodyKind::Rigid, position);
        body.set_mass(mass);
        body
    }

    /// Create an overlap-sensing area.
    #[must_use]
    pub fn new_area(position: Vec2) -> Self {
        Self::base(BodyKind::Area, position)
    }

    /// Set mass and refresh the cached inverse (zero mass pins the body).
    pub fn set_mass(&mut self, mass: f64) {
        self.mass = mass;
        self.inv_mass = if mass == 0.0 { 0.0 } else { 1.0 / mass };
        // Until a dedicated inertia computation is wired up, inertia tracks
        // mass one-to-one.
        self.inertia = mass;
        self.inv_inertia = self.inv_mass;
    }

    /// Builder-style layer assignment.
    #[must_use]
    pub fn with_layer(mut self, layer: u32) -> Self {
        self.collision_layer = layer;
        self
    }

    /// Builder-style mask assignment.
    #[must_use]
    pub fn with_mask(mut self, mask: u32) -> Self {
        self.collision_mask = mask;
        self
    }

    /// Apply an impulse at an offset from the center of mass.
    ///
    /// Wakes the body: clears `sleeping` and resets the stillness timer.
    pub fn apply_impulse(&mut self, offset: Vec2, impulse: Vec2) {
        if self.kind != BodyKind::Rigid {
            return;
        }
        self.linear_velocity += impulse * self.inv_mass;
        self.angular_velocity += offset.cross_scalar(impulse) * self.inv_inertia;
        self.sleeping = false;
        self.still_time = 0.0;
    }

    /// Apply an impulse at the center of mass (no angular effect).
    ///
    /// Wakes the body: clears `sleeping` and resets the stillness timer.
    pub fn apply_central_impulse(&mut self, impulse: Vec2) {
        if self.kind != BodyKind::Rigid {
            return;
        }
        self.linear_velocity += impulse * self.inv_mass;
        self.sleeping = false;
        self.still_time = 0.0;
    }

    /// Apply a force over `dt` seconds.
    ///
    /// Resets the stillness timer but does not clear `sleeping`; a sleeping
    /// body ignores forces until an impulse wakes it.
    pub fn apply_force(&mut self, force: Vec2, dt: f64) {
        if self.kind != BodyKind::Rigid {
            return;
        }
        self.linear_velocity += force * (self.inv_mass * dt);
        self.still_time = 0.0;
    }

    /// Register `other` as a collision exception (idempotent).
    pub fn add_collision_exception(&mut self, other: BodyId) {
        if !self.collision_exceptions.contains(&other) {
            self.collision_exceptions.push(other);
        }
    }

    /// Remove a collision exception if present.
    pub fn remove_collision_exception(&mut self, other: BodyId) {
        self.collision_exceptions.retain(|&b| b != other);
    }

    /// `true` for the two externally pinned variants.
    #[inline]
    #[must_use]
    pub fn is_static_or_kinematic(&self) -> bool {
        matches!(self.kind, BodyKind::Static | BodyKind::Kinematic)
    }

    /// Roll the area touch sets: current becomes previous, current clears.
    pub(crate) fn roll_touched_sets(&mut self) {
        core::mem::swap(&mut self.prev_touched_areas, &mut self.touched_areas);
        self.touched_areas.clear();
        core::mem::swap(&mut self.prev_touched_bodies, &mut self.touched_bodies);
        self.touched_bodies.clear();
    }
}
