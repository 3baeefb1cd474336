//! # ECS Benchmark
//!
//! Measures entity churn, component add/remove and signature routing.
//!
//! Run with: `cargo bench --package ember_ecs`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ember_ecs::{FrameData, System, SystemContext, World, MAX_ENTITIES};

#[derive(Clone, Copy)]
struct Position([f32; 3]);

#[derive(Clone, Copy)]
struct Velocity([f32; 3]);

struct Integrate;

impl System for Integrate {
    fn update(&mut self, ctx: &mut SystemContext<'_>, frame: &FrameData) {
        let entities: Vec<_> = ctx.entities().iter().copied().collect();
        for entity in entities {
            let Some(&Velocity(v)) = ctx.component::<Velocity>(entity) else {
                continue;
            };
            if let Some(Position(p)) = ctx.component_mut::<Position>(entity) {
                for (axis, dv) in p.iter_mut().zip(v) {
                    *axis += dv * frame.dt;
                }
            }
        }
    }
}

fn populated_world() -> World {
    let mut world = World::new();
    let signature = world.signature_of::<(Position, Velocity)>();
    world.register_system(signature, Integrate);

    for i in 0..MAX_ENTITIES {
        let entity = world.create_entity("body");
        world.add_component(entity, Position([0.0; 3]));
        if i % 2 == 0 {
            world.add_component(entity, Velocity([1.0, 0.0, 0.0]));
        }
    }
    world
}

fn bench_entity_churn(c: &mut Criterion) {
    c.bench_function("create_destroy_all", |b| {
        let mut world = World::new();
        b.iter(|| {
            for _ in 0..MAX_ENTITIES {
                black_box(world.create_entity("e"));
            }
            for handle in 0..MAX_ENTITIES {
                world.destroy_entity(u16::try_from(handle).unwrap_or(u16::MAX));
            }
        });
    });
}

fn bench_component_toggle(c: &mut Criterion) {
    c.bench_function("velocity_add_remove", |b| {
        let mut world = populated_world();
        b.iter(|| {
            // Odd entities lack a velocity; toggle one on and off.
            world.add_component(1, Velocity([0.0, 1.0, 0.0]));
            black_box(world.remove_component::<Velocity>(1));
        });
    });
}

fn bench_run_frame(c: &mut Criterion) {
    c.bench_function("run_frame_5000", |b| {
        let mut world = populated_world();
        let mut frame = FrameData::new(0.016);
        b.iter(|| {
            world.run_frame(black_box(&frame));
            frame = frame.next(0.016);
        });
    });
}

criterion_group!(
    benches,
    bench_entity_churn,
    bench_component_toggle,
    bench_run_frame
);
criterion_main!(benches);
