#![no_main]
use alice_physics2d::prelude::*;
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct MotionInput {
    /// Obstacle positions.
    obstacles: Vec<(i8, i8)>,
    /// Motion probes to run from the kinematic body.
    probes: Vec<(i8, i8)>,
}

// Sweep a kinematic body through arbitrary obstacle fields. Must never
// panic and must never leak a pool lease.
fuzz_target!(|input: MotionInput| {
    let mut server = PhysicsServer::new_default();

    for &(x, y) in input.obstacles.iter().take(16) {
        let id = server.add_body(CollisionBody::new_static(Vec2::new(
            f64::from(x),
            f64::from(y),
        )));
        let _ = server.add_rect_shape(id, Vec2::new(4.0, 4.0));
    }

    let mover = server.add_body(CollisionBody::new_kinematic(Vec2::ZERO));
    let _ = server.add_rect_shape(mover, Vec2::new(3.0, 3.0));
    server.step(1.0 / 60.0);

    for &(dx, dy) in input.probes.iter().take(32) {
        let motion = Vec2::new(f64::from(dx), f64::from(dy));
        let _ = server.body_test_motion(mover, motion);
        let _ = server.move_and_slide(mover, motion, 1.0 / 60.0, &SlideParams::default());
    }
});
