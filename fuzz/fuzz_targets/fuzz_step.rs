#![no_main]
use alice_physics2d::prelude::*;
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct StepInput {
    /// Body positions, close together to force collisions.
    positions: Vec<(i8, i8)>,
    /// Kind selector per body.
    kinds: Vec<u8>,
    /// Ticks to run.
    steps: u8,
}

// Cram arbitrary bodies together and step. Must never panic, whatever the
// overlap configuration.
fuzz_target!(|input: StepInput| {
    let mut server = PhysicsServer::new_default();

    for (i, &(x, y)) in input.positions.iter().take(16).enumerate() {
        let position = Vec2::new(f64::from(x), f64::from(y));
        let body = match input.kinds.get(i).copied().unwrap_or(0) % 4 {
            0 => CollisionBody::new_rigid(position, 1.0),
            1 => CollisionBody::new_static(position),
            2 => CollisionBody::new_kinematic(position),
            _ => CollisionBody::new_area(position),
        };
        let id = server.add_body(body);
        let _ = server.add_rect_shape(id, Vec2::new(4.0, 4.0));
    }

    for _ in 0..input.steps.min(32) {
        server.step(1.0 / 60.0);
    }
    let _ = server.drain_events();
});
