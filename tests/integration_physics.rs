//! Integration tests for the 2D collision server
//!
//! End-to-end behaviour through the public API only: a falling crate
//! bouncing to rest on a floor, kinematic wall slides, area enter/exit
//! episodes, deferred shape removal and broad-phase soundness.

use alice_physics2d::prelude::*;

const DT: f64 = 1.0 / 60.0;

// ============================================================================
// Helpers
// ============================================================================

/// Step `server` for `ticks` frames with a constant downward gravity of
/// `g` units/s^2 applied to every rigid body through the per-tick hook.
fn run_with_gravity(server: &mut PhysicsServer, ticks: usize, g: f64) {
    let mut gravity = move |srv: &mut PhysicsServer, id: BodyId, dt: f64| {
        if let Some(body) = srv.body_mut(id) {
            if body.kind == BodyKind::Rigid {
                body.linear_velocity.y += g * dt;
            }
        }
    };
    for _ in 0..ticks {
        server.step_with(DT, &mut gravity);
    }
}

fn add_floor(server: &mut PhysicsServer, top: f64) -> BodyId {
    // 200-wide, 20-thick slab whose top surface sits at `top`.
    let floor = server.add_body(CollisionBody::new_static(Vec2::new(0.0, top + 10.0)));
    server
        .add_rect_shape(floor, Vec2::new(100.0, 10.0))
        .expect("floor shape");
    floor
}

// ============================================================================
// Falling crate comes to rest
// ============================================================================

/// A rigid body with bounce 0.5 dropped onto a static floor under gravity
/// must bounce itself quiet, fall asleep, and rest exactly on the surface.
#[test]
fn test_falling_body_rests_and_sleeps() {
    let mut server = PhysicsServer::new_default();
    add_floor(&mut server, 90.0);

    let crate_id = server.add_body(CollisionBody::new_rigid(Vec2::new(0.0, 16.0), 1.0));
    server.add_rect_shape(crate_id, Vec2::new(8.0, 8.0)).unwrap();
    server.body_mut(crate_id).unwrap().bounce = 0.5;

    run_with_gravity(&mut server, 600, 98.0);

    let body = server.body(crate_id).unwrap();
    assert!(body.sleeping, "crate should be asleep within 10 seconds");
    // Resting position: floor top minus half height.
    assert!(
        (body.position.y - 82.0).abs() < 0.1,
        "resting y = {}, expected ~82",
        body.position.y
    );
}

/// A sleeping body stays parked even though the gravity hook keeps pumping
/// its velocity field.
#[test]
fn test_sleeping_body_position_is_frozen() {
    let mut server = PhysicsServer::new_default();
    add_floor(&mut server, 90.0);
    let crate_id = server.add_body(CollisionBody::new_rigid(Vec2::new(0.0, 70.0), 1.0));
    server.add_rect_shape(crate_id, Vec2::new(8.0, 8.0)).unwrap();
    server.body_mut(crate_id).unwrap().bounce = 0.3;

    run_with_gravity(&mut server, 600, 98.0);
    let rest_y = server.body(crate_id).unwrap().position.y;
    assert!(server.body(crate_id).unwrap().sleeping);

    run_with_gravity(&mut server, 120, 98.0);
    let later_y = server.body(crate_id).unwrap().position.y;
    assert_eq!(rest_y, later_y, "asleep means no integration at all");
}

// ============================================================================
// Sleep hysteresis
// ============================================================================

#[test]
fn test_sleep_hysteresis_and_impulse_wake() {
    let config = PhysicsConfig::default();
    let time_before_sleep = config.sleep.time_before_sleep;
    let mut server = PhysicsServer::new(config);

    let id = server.add_body(CollisionBody::new_rigid(Vec2::ZERO, 1.0));
    server.add_rect_shape(id, Vec2::ONE).unwrap();
    server.body_mut(id).unwrap().linear_velocity = Vec2::new(0.5, 0.0);

    // Stay just under the time threshold: still awake.
    let dt = 0.1;
    let ticks_under = ((time_before_sleep / dt).ceil() as usize) - 1;
    for _ in 0..ticks_under {
        server.step(dt);
    }
    assert!(!server.body(id).unwrap().sleeping);

    // Cross the threshold: asleep.
    server.step(dt);
    server.step(dt);
    assert!(server.body(id).unwrap().sleeping);

    // Any impulse wakes immediately and restarts the clock.
    server.body_mut(id).unwrap().apply_central_impulse(Vec2::new(0.1, 0.0));
    let body = server.body(id).unwrap();
    assert!(!body.sleeping);
    assert_eq!(body.still_time, 0.0);
}

// ============================================================================
// Kinematic slide against a wall
// ============================================================================

/// Flush against a vertical wall, sliding diagonally into it: the normal
/// component of the position must stay put while the tangential component
/// advances by the full tangential projection of the motion.
#[test]
fn test_kinematic_wall_slide() {
    let mut server = PhysicsServer::new_default();

    // Wall spans x [50, 70].
    let wall = server.add_body(CollisionBody::new_static(Vec2::new(60.0, 0.0)));
    server.add_rect_shape(wall, Vec2::new(10.0, 100.0)).unwrap();

    // Mover flush against the wall: right edge at x = 50.
    let mover = server.add_body(CollisionBody::new_kinematic(Vec2::new(42.0, 0.0)));
    server.add_rect_shape(mover, Vec2::new(8.0, 8.0)).unwrap();

    // Register shapes in the hash.
    server.step(DT);

    let result = server.move_and_slide(mover, Vec2::new(6.0, 10.0), 1.0, &SlideParams::default());

    let body = server.body(mover).unwrap();
    assert!(
        (body.position.x - 42.0).abs() < 1e-4,
        "wall-normal component unchanged, got x = {}",
        body.position.x
    );
    assert!(
        (body.position.y - 10.0).abs() < 1e-4,
        "tangential component advances fully, got y = {}",
        body.position.y
    );
    assert!(result.on_wall);
    assert!(!result.on_floor);
    assert!((result.velocity.x).abs() < 1e-9, "velocity slid off the wall normal");
}

/// Dropping a kinematic body onto a floor classifies the contact as floor
/// and stops exactly on the surface.
#[test]
fn test_kinematic_floor_landing() {
    let mut server = PhysicsServer::new_default();
    add_floor(&mut server, 90.0);

    let mover = server.add_body(CollisionBody::new_kinematic(Vec2::new(0.0, 70.0)));
    server.add_rect_shape(mover, Vec2::new(8.0, 8.0)).unwrap();
    server.step(DT);

    let result = server.move_and_slide(mover, Vec2::new(0.0, 15.0), 1.0, &SlideParams::default());
    assert!(result.on_floor);
    assert!(!result.on_wall);
    assert_eq!(result.floor_velocity, Vec2::ZERO, "static floor has no velocity");

    let body = server.body(mover).unwrap();
    assert!(
        (body.position.y - 82.0).abs() < 1e-4,
        "landed on the surface, got y = {}",
        body.position.y
    );
}

/// With nothing in the way the full motion is consumed and no collision is
/// reported.
#[test]
fn test_motion_query_free_path() {
    let mut server = PhysicsServer::new_default();
    let mover = server.add_body(CollisionBody::new_kinematic(Vec2::ZERO));
    server.add_rect_shape(mover, Vec2::new(4.0, 4.0)).unwrap();
    server.step(DT);

    let collision = server.body_test_motion(mover, Vec2::new(25.0, -10.0));
    assert!(collision.is_none());
    let body = server.body(mover).unwrap();
    assert!((body.position.x - 25.0).abs() < 1e-9);
    assert!((body.position.y + 10.0).abs() < 1e-9);
}

/// The motion-query result carries the blocking body and the split of the
/// requested motion into travel and remainder.
#[test]
fn test_motion_query_reports_collider() {
    let mut server = PhysicsServer::new_default();
    let wall = server.add_body(CollisionBody::new_static(Vec2::new(60.0, 0.0)));
    server.add_rect_shape(wall, Vec2::new(10.0, 100.0)).unwrap();
    let mover = server.add_body(CollisionBody::new_kinematic(Vec2::new(30.0, 0.0)));
    server.add_rect_shape(mover, Vec2::new(8.0, 8.0)).unwrap();
    server.step(DT);

    let collision = server
        .body_test_motion(mover, Vec2::new(18.0, 0.0))
        .expect("wall blocks the sweep");
    assert_eq!(collision.collider, Some(wall));
    assert!((collision.normal.x + 1.0).abs() < 1e-9);
    // travel + remainder == requested motion
    let total = collision.travel + collision.remainder;
    assert!((total.x - 18.0).abs() < 1e-9);
    assert!((total.y).abs() < 1e-9);
    // Stopped flush at the wall face (x = 50), give or take the bias.
    let body = server.body(mover).unwrap();
    assert!((body.position.x - 42.0).abs() < 1e-4);
}

// ============================================================================
// Area enter/exit episodes
// ============================================================================

#[test]
fn test_area_entered_fires_once_per_episode() {
    let mut server = PhysicsServer::new_default();

    let sensor = server.add_body(CollisionBody::new_area(Vec2::ZERO));
    server.add_rect_shape(sensor, Vec2::new(16.0, 16.0)).unwrap();

    let visitor = server.add_body(CollisionBody::new_static(Vec2::new(8.0, 0.0)));
    server.add_rect_shape(visitor, Vec2::new(8.0, 8.0)).unwrap();

    // Tick 1: entered.
    server.step(DT);
    let events = server.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0],
        AreaEvent {
            area: sensor,
            other: visitor,
            kind: AreaEventKind::BodyEntered
        }
    );

    // Ticks 2 and 3: still touching, silence.
    server.step(DT);
    assert!(server.drain_events().is_empty());
    server.step(DT);
    assert!(server.drain_events().is_empty());
}

#[test]
fn test_area_reentry_with_new_body_fires_again() {
    let mut server = PhysicsServer::new_default();
    let sensor = server.add_body(CollisionBody::new_area(Vec2::ZERO));
    server.add_rect_shape(sensor, Vec2::new(16.0, 16.0)).unwrap();

    let first = server.add_body(CollisionBody::new_static(Vec2::new(8.0, 0.0)));
    server.add_rect_shape(first, Vec2::new(8.0, 8.0)).unwrap();

    server.step(DT);
    assert_eq!(server.drain_events().len(), 1, "first enter");

    // Remove the visitor; next tick its shape is flushed and the area
    // reports the exit.
    server.remove_body(first).unwrap();
    server.step(DT);
    let events = server.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, AreaEventKind::BodyExited);
    assert_eq!(events[0].other, first);

    // An identical body at the same spot is a distinct instance: enter
    // fires again.
    let second = server.add_body(CollisionBody::new_static(Vec2::new(8.0, 0.0)));
    server.add_rect_shape(second, Vec2::new(8.0, 8.0)).unwrap();
    server.step(DT);
    let events = server.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0],
        AreaEvent {
            area: sensor,
            other: second,
            kind: AreaEventKind::BodyEntered
        }
    );
}

#[test]
fn test_area_vs_area_is_mutual() {
    let mut server = PhysicsServer::new_default();
    let a = server.add_body(CollisionBody::new_area(Vec2::ZERO));
    server.add_rect_shape(a, Vec2::new(10.0, 10.0)).unwrap();
    let b = server.add_body(CollisionBody::new_area(Vec2::new(5.0, 0.0)));
    server.add_rect_shape(b, Vec2::new(10.0, 10.0)).unwrap();

    server.step(DT);
    let mut events = server.drain_events();
    events.sort_by_key(|e| e.area);
    assert_eq!(events.len(), 2, "both areas signal");
    assert!(events
        .iter()
        .all(|e| e.kind == AreaEventKind::AreaEntered));
    assert_eq!(events[0].area, a);
    assert_eq!(events[0].other, b);
    assert_eq!(events[1].area, b);
    assert_eq!(events[1].other, a);
}

// ============================================================================
// Deferred removal
// ============================================================================

/// A removal issued from inside the tick (via the hook) must leave the
/// shape in the live list for the rest of that tick and flush it at the
/// start of the next one.
#[test]
fn test_mid_tick_removal_defers_to_next_tick() {
    let mut server = PhysicsServer::new_default();
    let body = server.add_body(CollisionBody::new_rigid(Vec2::ZERO, 1.0));
    let shape = server.add_rect_shape(body, Vec2::ONE).unwrap();

    let mut removed = false;
    let mut hook = |srv: &mut PhysicsServer, _id: BodyId, _dt: f64| {
        if !removed {
            srv.remove_shape(shape).unwrap();
            removed = true;
        }
    };
    server.step_with(DT, &mut hook);
    assert_eq!(server.shape_count(), 1, "marked but still listed");

    server.step(DT);
    assert_eq!(server.shape_count(), 0, "flushed at next tick's start");
}

// ============================================================================
// Broad-phase soundness
// ============================================================================

/// Far-apart shapes never reach the narrow phase.
#[test]
fn test_disjoint_shapes_never_sat_tested() {
    let mut server = PhysicsServer::new_default();
    let a = server.add_body(CollisionBody::new_rigid(Vec2::ZERO, 1.0));
    server.add_rect_shape(a, Vec2::new(4.0, 4.0)).unwrap();
    let b = server.add_body(CollisionBody::new_static(Vec2::new(1000.0, 1000.0)));
    server.add_rect_shape(b, Vec2::new(4.0, 4.0)).unwrap();

    server.step(DT);
    let stats = server.stats();
    assert_eq!(stats.pair_checks, 0);
    assert_eq!(stats.sat_pair_tests, 0);
}

/// Kinematic bodies sit passively in the hash: overlapping a static does
/// not move either of them.
#[test]
fn test_kinematic_is_not_auto_resolved() {
    let mut server = PhysicsServer::new_default();
    let k = server.add_body(CollisionBody::new_kinematic(Vec2::new(2.0, 0.0)));
    server.add_rect_shape(k, Vec2::new(4.0, 4.0)).unwrap();
    let s = server.add_body(CollisionBody::new_static(Vec2::ZERO));
    server.add_rect_shape(s, Vec2::new(4.0, 4.0)).unwrap();

    server.step(DT);
    assert_eq!(server.body(k).unwrap().position, Vec2::new(2.0, 0.0));
    assert_eq!(server.body(s).unwrap().position, Vec2::ZERO);
    assert_eq!(server.stats().body_resolutions, 0);
}

/// Collision exceptions suppress an otherwise-matching pair symmetrically.
#[test]
fn test_collision_exception_suppresses_pair() {
    let mut server = PhysicsServer::new_default();
    add_floor(&mut server, 90.0);
    let crate_id = server.add_body(CollisionBody::new_rigid(Vec2::new(0.0, 85.0), 1.0));
    server.add_rect_shape(crate_id, Vec2::new(8.0, 8.0)).unwrap();

    // Except the floor: the crate falls straight through it.
    let floor_id = server
        .iter_bodies()
        .find(|b| b.kind == BodyKind::Static)
        .unwrap()
        .id;
    server
        .body_mut(crate_id)
        .unwrap()
        .add_collision_exception(floor_id);

    run_with_gravity(&mut server, 120, 98.0);
    assert!(
        server.body(crate_id).unwrap().position.y > 110.0,
        "no resolution against the excepted floor"
    );
}

// ============================================================================
// Collision maps
// ============================================================================

#[test]
fn test_body_against_collision_map() {
    let mut server = PhysicsServer::new_default();
    let mut map = CollisionMap::new(16.0, Vec2::ZERO);
    for x in 0..8 {
        map.set_solid(x, 4, true); // floor row: world y [64, 80)
    }
    server.add_collision_map(map);

    let mover = server.add_body(CollisionBody::new_kinematic(Vec2::new(32.0, 50.0)));
    server.add_rect_shape(mover, Vec2::new(6.0, 6.0)).unwrap();
    server.step(DT);

    let sweep = server
        .test_body_against_map(mover, Vec2::new(0.0, 30.0))
        .expect("body has shapes");
    assert!(sweep.blocked_y);
    assert!(!sweep.blocked_x);
    // Bottom edge at 56; floor top at 64: 8 units of clearance.
    assert!((sweep.motion.y - 8.0).abs() < 1e-9);
}

#[test]
fn test_collision_map_registration_roundtrip() {
    let mut server = PhysicsServer::new_default();
    let id = server.add_collision_map(CollisionMap::new(16.0, Vec2::ZERO));
    assert!(server.remove_collision_map(id).is_ok());
    assert!(server.remove_collision_map(id).is_err(), "double removal fails");
}
