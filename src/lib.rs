//! # ALICE-Physics2D
//!
//! **Arcade-Style 2D Collision Server**
//!
//! A self-contained 2D physics core for scene-tree game runtimes: the scene
//! layer owns the objects and supplies world transforms; this crate owns
//! collision. One `step` call per frame runs the whole pipeline.
//!
//! | Stage | Description |
//! |-------|-------------|
//! | **Broad phase** | Sparse spatial hash over integer AABBs (32-unit cells) |
//! | **Narrow phase** | SAT over convex polygons, least-penetration axis |
//! | **Resolution** | Positional correction + bounce for rigid bodies |
//! | **Triggers** | Per-area touch sets diffed into enter/exit events |
//! | **Motion queries** | `body_test_motion` / `move_and_slide` for kinematic bodies |
//! | **Tile maps** | Axis-clamped sweeps against solid tile grids |
//!
//! # Design Principles
//!
//! - **One tick, run to completion**: no mid-tick failures, no partial
//!   state. Invariant violations are logged and skipped.
//! - **Deferred removal**: `remove_shape` during tick N takes effect at the
//!   start of tick N+1 — iteration is never invalidated.
//! - **Pooled scratch**: response records and id buffers recycle through
//!   RAII leases; the steady-state hot path does not allocate.
//! - **Caller-driven kinematics**: kinematic bodies are probed on demand,
//!   not simulated per tick.
//!
//! # Quick Start
//!
//! ```
//! use alice_physics2d::prelude::*;
//!
//! let mut server = PhysicsServer::new_default();
//!
//! // Static floor.
//! let floor = server.add_body(CollisionBody::new_static(Vec2::new(0.0, 100.0)));
//! server.add_rect_shape(floor, Vec2::new(200.0, 10.0)).unwrap();
//!
//! // Falling crate.
//! let crate_body = server.add_body(CollisionBody::new_rigid(Vec2::new(0.0, 0.0), 1.0));
//! server.add_rect_shape(crate_body, Vec2::new(8.0, 8.0)).unwrap();
//!
//! // Drive gravity from the per-tick hook and step.
//! let mut gravity = |srv: &mut PhysicsServer, id: BodyId, dt: f64| {
//!     if let Some(body) = srv.body_mut(id) {
//!         body.linear_velocity.y += 98.0 * dt;
//!     }
//! };
//! for _ in 0..60 {
//!     server.step_with(1.0 / 60.0, &mut gravity);
//! }
//! assert!(server.body(crate_body).unwrap().position.y > 0.0);
//! ```

pub mod aabb;
pub mod body;
pub mod character;
pub mod error;
pub mod event;
pub mod filter;
pub mod math;
pub mod pool;
pub mod sat;
pub mod server;
pub mod shape;
pub mod sleeping;
pub mod spatial;
pub mod tilemap;

mod resolve;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::aabb::Aabb;
    pub use crate::body::{BodyId, BodyKind, CollisionBody};
    pub use crate::character::{SlideParams, SlideResult};
    pub use crate::error::PhysicsError;
    pub use crate::event::{AreaEvent, AreaEventKind};
    pub use crate::math::Vec2;
    pub use crate::sat::Collision;
    pub use crate::server::{
        PhysicsConfig, PhysicsHook, PhysicsServer, StepStats,
    };
    pub use crate::shape::{ConvexShape, ShapeId};
    pub use crate::sleeping::SleepConfig;
    pub use crate::tilemap::{CollisionMap, MapId, MapSweep};
}

// Re-export main types at crate root
pub use prelude::*;
