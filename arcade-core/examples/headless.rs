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
//! Headless arcade level
//!
//! Builds a small level, drives the player with a scripted key sequence, and
//! applies collision events the way a game layer would. Set `RUST_LOG=debug`
//! for engine logs and `ARCADE_CORE_CONFIG=path.toml` to override tuning.

use arcade_core::collision::{PLAYER_COLLECT, PLAYER_ENEMY_CONTACT};
use arcade_core::ecs::components::{
    Collectible, Collision, CollisionLayer, Follow, Hazard, Health, Input, Movement, Position,
    Render,
};
use arcade_core::ecs::{ComponentKind, EntityId, EntityStore};
use arcade_core::Engine;
use std::sync::{Arc, Mutex};

const FRAME: f64 = 1.0 / 60.0;
const INVULNERABLE_FRAMES: u32 = 45;

/// What the game layer learned from this frame's events
#[derive(Debug, Default)]
struct Outcome {
    score: u32,
    pending_damage: u32,
}

fn spawn_level(store: &mut EntityStore) -> EntityId {
    let player = store.create_entity();
    store.add_component(player, Position::new(100.0, 300.0));
    store.add_component(player, Movement::new(220.0, 12.0, 0.85));
    store.add_component(player, Collision::new(14.0, CollisionLayer::Player));
    store.add_component(player, Input::arrows_and_wasd());
    store.add_component(player, Health::new(3));
    store.add_component(player, Render::new("hero"));

    for (i, x) in [180.0, 240.0, 300.0, 360.0].into_iter().enumerate() {
        let coin = store.create_entity();
        store.add_component(coin, Position::new(x, 300.0));
        store.add_component(coin, Collision::new(8.0, CollisionLayer::Collectible));
        let kind = if i == 3 { "gem" } else { "coin" };
        store.add_component(coin, Collectible::new(kind, 10 * (i as u32 + 1)));
        store.add_component(coin, Render::new("pickup"));
    }

    for y in [180.0, 420.0] {
        let pillar = store.create_entity();
        store.add_component(pillar, Position::new(480.0, y));
        store.add_component(pillar, Collision::solid(50.0, CollisionLayer::Wall));
    }

    let bat = store.create_entity();
    store.add_component(bat, Position::new(560.0, 300.0));
    store.add_component(bat, Movement::new(90.0, 4.0, 0.95).with_velocity(-60.0, 0.0));
    store.add_component(bat, Collision::new(12.0, CollisionLayer::Enemy));
    store.add_component(bat, Hazard { damage: 1 });
    store.add_component(bat, Follow { target: player, speed: 60.0 });
    store.add_component(bat, Render::new("bat"));

    player
}

/// Keys held during a frame
fn script(frame: u32) -> &'static [&'static str] {
    match frame {
        0..=89 => &["ArrowRight"],
        90..=119 => &["ArrowRight", "ArrowUp"],
        120..=179 => &["KeyD"],
        _ => &[],
    }
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut engine = match Engine::from_env() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Failed to start engine: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = Arc::new(Mutex::new(Outcome::default()));
    let scored = outcome.clone();
    engine.on_collision(PLAYER_COLLECT, move |event| {
        let points = event.data["points"]
            .as_u64()
            .ok_or_else(|| "collect event without points".to_string())?;
        scored.lock().map_err(|e| e.to_string())?.score += points as u32;
        Ok(())
    });
    let hurt = outcome.clone();
    engine.on_collision(PLAYER_ENEMY_CONTACT, move |event| {
        let damage = event.data["damage"].as_u64().unwrap_or(1);
        hurt.lock().map_err(|e| e.to_string())?.pending_damage += damage as u32;
        Ok(())
    });

    println!("Arcade Core - Headless Level");
    println!("============================\n");

    let player = spawn_level(engine.store_mut());
    let mut held: Vec<&str> = Vec::new();
    let mut invulnerable_for = 0u32;

    for frame in 0..240 {
        let keys = script(frame);
        for key in held.iter().filter(|k| !keys.contains(*k)) {
            engine.inject_input(*key, false);
        }
        for key in keys {
            engine.inject_input(*key, true);
        }
        held = keys.to_vec();

        engine.tick(FRAME);

        // Game rules live outside the core: apply damage and i-frames
        let damage = outcome
            .lock()
            .map(|mut o| std::mem::take(&mut o.pending_damage))
            .unwrap_or(0);
        if let Some(health) = engine.store_mut().get_mut::<Health>(player) {
            if damage > 0 && !health.invulnerable {
                health.current = health.current.saturating_sub(damage);
                health.invulnerable = true;
                invulnerable_for = INVULNERABLE_FRAMES;
                println!(
                    "frame {:3}: hit for {}, health {}/{}",
                    frame, damage, health.current, health.max
                );
            } else if invulnerable_for > 0 {
                invulnerable_for -= 1;
                health.invulnerable = invulnerable_for > 0;
            }
        }

        if frame % 60 == 59 {
            if let Some(position) = engine.store().get::<Position>(player) {
                println!(
                    "frame {:3}: player at ({:.1}, {:.1}) facing {:.2} rad",
                    frame, position.x, position.y, position.rotation
                );
            }
        }
    }

    let store = engine.store();
    let visible = store.get_entities_with(&[ComponentKind::Position, ComponentKind::Render]);
    println!("\nScore: {}", outcome.lock().map(|o| o.score).unwrap_or(0));
    println!("Entities left: {} ({} renderable)", store.entity_count(), visible.len());

    println!("\nPerformance report:");
    match serde_json::to_string_pretty(&engine.performance_report()) {
        Ok(report) => println!("{}", report),
        Err(e) => eprintln!("Failed to serialize report: {}", e),
    }
}
