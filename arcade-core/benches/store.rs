// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Benchmarks for entity store queries and a full frame
//!
//! These benchmarks measure:
//! - Entity creation with a typical component set
//! - Multi-kind queries over mixed populations
//! - One scheduler frame with the built-in systems

use arcade_core::ecs::components::{Collision, CollisionLayer, Input, Movement, Position, Render};
use arcade_core::ecs::{ComponentKind, EntityStore};
use arcade_core::{Engine, EngineConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn populate(store: &mut EntityStore, count: usize) {
    for i in 0..count {
        let id = store.create_entity();
        let x = (i % 80) as f64 * 10.0;
        let y = (i / 80 % 60) as f64 * 10.0;
        store.add_component(id, Position::new(x, y));
        if i % 2 == 0 {
            store.add_component(id, Movement::default().with_velocity(20.0, -10.0));
        }
        if i % 3 == 0 {
            store.add_component(id, Collision::new(4.0, CollisionLayer::Enemy));
        }
        if i % 5 == 0 {
            store.add_component(id, Render::new("enemy"));
        }
    }
}

/// Benchmark: create N entities with components
fn bench_store_populate(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_populate");

    for entity_count in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*entity_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(entity_count),
            entity_count,
            |b, &count| {
                b.iter(|| {
                    let mut store = EntityStore::new();
                    populate(&mut store, count);
                    black_box(store);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: multi-kind query over a mixed population
fn bench_store_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_query");

    for entity_count in [100, 1000, 10000].iter() {
        let mut store = EntityStore::new();
        populate(&mut store, *entity_count);

        group.throughput(Throughput::Elements(*entity_count as u64));
        group.bench_with_input(
            BenchmarkId::new("position_movement", entity_count),
            entity_count,
            |b, _| {
                b.iter(|| {
                    black_box(
                        store.get_entities_with(&[ComponentKind::Position, ComponentKind::Movement]),
                    )
                });
            },
        );
        group.bench_with_input(
            BenchmarkId::new("position_render", entity_count),
            entity_count,
            |b, _| {
                b.iter(|| {
                    black_box(store.get_entities_with(&[ComponentKind::Position, ComponentKind::Render]))
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: one engine frame with input, movement and collision
fn bench_engine_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_frame");

    for entity_count in [100, 1000, 5000].iter() {
        let mut engine = match Engine::new(EngineConfig::default()) {
            Ok(engine) => engine,
            Err(e) => panic!("default config rejected: {}", e),
        };
        populate(engine.store_mut(), *entity_count);
        let player = engine.store_mut().create_entity();
        engine.store_mut().add_component(player, Position::new(400.0, 300.0));
        engine.store_mut().add_component(player, Movement::default());
        engine.store_mut().add_component(player, Input::arrows_and_wasd());
        engine.inject_input("ArrowRight", true);

        group.throughput(Throughput::Elements(*entity_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(entity_count),
            entity_count,
            |b, _| {
                b.iter(|| engine.tick(black_box(1.0 / 60.0)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_store_populate, bench_store_query, bench_engine_frame);
criterion_main!(benches);
