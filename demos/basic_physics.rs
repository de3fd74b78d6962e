//! Basic physics demo: a crate drops onto a floor, bounces to rest and
//! falls asleep, while a sensor area reports it passing through.
//!
//! Run with: `cargo run --example basic_physics`

use alice_physics2d::prelude::*;

fn main() {
    env_logger::init();

    let mut server = PhysicsServer::new_default();

    // Floor slab, top surface at y = 90.
    let floor = server.add_body(CollisionBody::new_static(Vec2::new(0.0, 100.0)));
    server
        .add_rect_shape(floor, Vec2::new(200.0, 10.0))
        .expect("floor shape");

    // Sensor covering the fall corridor.
    let sensor = server.add_body(CollisionBody::new_area(Vec2::new(0.0, 50.0)));
    server
        .add_rect_shape(sensor, Vec2::new(20.0, 20.0))
        .expect("sensor shape");

    // The falling crate.
    let crate_id = server.add_body(CollisionBody::new_rigid(Vec2::new(0.0, 0.0), 1.0));
    server
        .add_rect_shape(crate_id, Vec2::new(8.0, 8.0))
        .expect("crate shape");
    server.body_mut(crate_id).expect("crate body").bounce = 0.5;

    let mut gravity = |srv: &mut PhysicsServer, id: BodyId, dt: f64| {
        if let Some(body) = srv.body_mut(id) {
            if body.kind == BodyKind::Rigid {
                body.linear_velocity.y += 98.0 * dt;
            }
        }
    };

    let dt = 1.0 / 60.0;
    for tick in 0..600 {
        server.step_with(dt, &mut gravity);

        for event in server.drain_events() {
            println!("tick {tick:3}: {:?} ({} / {})", event.kind, event.area, event.other);
        }

        if tick % 60 == 0 {
            let body = server.body(crate_id).expect("crate body");
            println!(
                "tick {tick:3}: y = {:7.3}  vy = {:7.3}  sleeping = {}",
                body.position.y, body.linear_velocity.y, body.sleeping
            );
        }

        if server.body(crate_id).map(|b| b.sleeping) == Some(true) {
            let body = server.body(crate_id).expect("crate body");
            println!(
                "crate settled at y = {:.4} after {} ticks; last tick stats: {:?}",
                body.position.y,
                tick,
                server.stats()
            );
            break;
        }
    }
}
