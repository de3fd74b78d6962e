//! Benchmarks for the 2D collision server
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use alice_physics2d::prelude::*;

const DT: f64 = 1.0 / 60.0;

fn build_stack(bodies: usize) -> (PhysicsServer, Vec<BodyId>) {
    let mut server = PhysicsServer::new_default();

    let floor = server.add_body(CollisionBody::new_static(Vec2::new(0.0, 200.0)));
    server
        .add_rect_shape(floor, Vec2::new(400.0, 10.0))
        .expect("floor shape");

    let mut ids = Vec::with_capacity(bodies);
    for i in 0..bodies {
        let column = (i % 16) as f64;
        let row = (i / 16) as f64;
        let id = server.add_body(CollisionBody::new_rigid(
            Vec2::new(column * 20.0 - 160.0, row * 20.0),
            1.0,
        ));
        server
            .add_rect_shape(id, Vec2::new(8.0, 8.0))
            .expect("crate shape");
        ids.push(id);
    }
    (server, ids)
}

fn gravity_hook() -> impl FnMut(&mut PhysicsServer, BodyId, f64) {
    |srv: &mut PhysicsServer, id: BodyId, dt: f64| {
        if let Some(body) = srv.body_mut(id) {
            if body.kind == BodyKind::Rigid {
                body.linear_velocity.y += 98.0 * dt;
            }
        }
    }
}

// ============================================================================
// Full tick benchmarks
// ============================================================================

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");

    group.bench_function("ten_crates_60_ticks", |b| {
        b.iter(|| {
            let (mut server, ids) = build_stack(10);
            let mut hook = gravity_hook();
            for _ in 0..60 {
                server.step_with(black_box(DT), &mut hook);
            }
            server.body(ids[0]).map(|body| body.position)
        });
    });

    group.bench_function("hundred_crates_60_ticks", |b| {
        b.iter(|| {
            let (mut server, ids) = build_stack(100);
            let mut hook = gravity_hook();
            for _ in 0..60 {
                server.step_with(black_box(DT), &mut hook);
            }
            server.body(ids[0]).map(|body| body.position)
        });
    });

    group.finish();
}

// ============================================================================
// Motion query benchmarks
// ============================================================================

fn bench_motion_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("motion");

    group.bench_function("move_and_slide_against_wall", |b| {
        let mut server = PhysicsServer::new_default();
        let wall = server.add_body(CollisionBody::new_static(Vec2::new(60.0, 0.0)));
        server.add_rect_shape(wall, Vec2::new(10.0, 200.0)).unwrap();
        let mover = server.add_body(CollisionBody::new_kinematic(Vec2::new(30.0, 0.0)));
        server.add_rect_shape(mover, Vec2::new(8.0, 8.0)).unwrap();
        server.step(DT);
        let params = SlideParams::default();

        b.iter(|| {
            // Reset the probe position so every iteration does the same work.
            if let Some(body) = server.body_mut(mover) {
                body.position = Vec2::new(30.0, 0.0);
            }
            server.move_and_slide(mover, black_box(Vec2::new(40.0, 6.0)), DT, &params)
        });
    });

    group.bench_function("map_sweep", |b| {
        let mut map = CollisionMap::new(16.0, Vec2::ZERO);
        for x in 0..64 {
            map.set_solid(x, 10, true);
        }
        b.iter(|| {
            map.sweep(
                black_box(Vec2::new(4.0, 100.0)),
                black_box(Vec2::new(12.0, 108.0)),
                black_box(Vec2::new(3.0, 80.0)),
            )
        });
    });

    group.finish();
}

criterion_group!(benches, bench_step, bench_motion_queries);
criterion_main!(benches);
