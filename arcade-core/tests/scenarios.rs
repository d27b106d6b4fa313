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
//! End-to-end scenarios driving the scheduler and the built-in systems
//! together, the way a game host would.

use approx::assert_relative_eq;
use arcade_core::collision::{CollisionEvent, PLAYER_COLLECT, PLAYER_ENEMY_CONTACT};
use arcade_core::ecs::components::{
    Collectible, Collision, CollisionLayer, Hazard, Input, Movement, Position,
};
use arcade_core::ecs::{EntityStore, Scheduler};
use arcade_core::systems::{
    CollisionSystem, InputDevice, InputError, InputSystem, KeySink, ListenerId, MovementSystem,
    COLLISION_SYSTEM_NAME,
};
use arcade_core::{Engine, EngineConfig};
use std::sync::{Arc, Mutex};

fn record(
    collision: &mut CollisionSystem,
    event_type: &str,
) -> Arc<Mutex<Vec<CollisionEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    collision.register_collision_handler(event_type, move |event: &CollisionEvent| {
        sink.lock().unwrap().push(event.clone());
        Ok(())
    });
    events
}

#[test]
fn test_player_collect_scenario() {
    let mut store = EntityStore::new();
    let a = store.create_entity();
    store.add_component(a, Position::new(100.0, 100.0));
    store.add_component(a, Collision::new(20.0, CollisionLayer::Player));
    let b = store.create_entity();
    store.add_component(b, Position::new(115.0, 100.0));
    store.add_component(b, Collision::new(10.0, CollisionLayer::Collectible));

    let mut collision = CollisionSystem::new();
    assert_relative_eq!(collision.cell_size(), 100.0);
    let events = record(&mut collision, PLAYER_COLLECT);

    let mut scheduler = Scheduler::new();
    scheduler.add_system(collision).unwrap();
    scheduler.update(&mut store, 0.016);

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, PLAYER_COLLECT);
    assert_eq!(events[0].entity_a, a);
    assert_eq!(events[0].entity_b, b);
    assert_eq!(events[0].data["collectible_type"], "collectible");
    assert!(!store.contains(b));
    assert!(store.contains(a));
}

#[test]
fn test_acceleration_scenario() {
    let mut store = EntityStore::new();
    let player = store.create_entity();
    store.add_component(player, Position::new(100.0, 300.0));
    store.add_component(player, Movement::new(200.0, 800.0, 0.85));
    store.add_component(player, Input::arrows_and_wasd());

    let mut input = InputSystem::new();
    input.inject_input("ArrowRight", true);
    let mut scheduler = Scheduler::new();
    scheduler.add_system(input).unwrap();
    scheduler.add_system(MovementSystem::new()).unwrap();

    let mut previous = 0.0;
    for _ in 0..30 {
        scheduler.update(&mut store, 0.016);
        let speed = store.get::<Movement>(player).unwrap().speed();
        assert!(speed >= previous, "speed dropped from {} to {}", previous, speed);
        assert!(speed <= 200.0 + 1e-9, "speed overshot to {}", speed);
        previous = speed;
    }
    assert_relative_eq!(previous, 200.0, epsilon = 1e-9);
}

#[test]
fn test_gentle_acceleration_approaches_max_speed() {
    let mut store = EntityStore::new();
    let player = store.create_entity();
    store.add_component(player, Position::new(100.0, 300.0));
    store.add_component(player, Movement::new(200.0, 5.0, 0.85));
    store.add_component(player, Input::arrows_and_wasd());

    let mut input = InputSystem::new();
    input.inject_input("KeyD", true);
    let mut scheduler = Scheduler::new();
    scheduler.add_system(input).unwrap();
    scheduler.add_system(MovementSystem::new()).unwrap();

    let mut previous = 0.0;
    for _ in 0..30 {
        scheduler.update(&mut store, 0.016);
        let vx = store.get::<Movement>(player).unwrap().velocity.x;
        assert!(vx > previous);
        assert!(vx < 200.0);
        previous = vx;
    }
}

#[test]
fn test_release_coasts_to_rest() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let store = engine.store_mut();
    let player = store.create_entity();
    store.add_component(player, Position::new(200.0, 300.0));
    store.add_component(player, Movement::new(200.0, 60.0, 0.85));
    store.add_component(player, Input::arrows_and_wasd());

    engine.inject_input("ArrowRight", true);
    for _ in 0..20 {
        engine.tick(1.0 / 60.0);
    }
    assert!(engine.store().get::<Movement>(player).unwrap().speed() > 100.0);

    engine.inject_input("ArrowRight", false);
    for _ in 0..120 {
        engine.tick(1.0 / 60.0);
    }
    let movement = engine.store().get::<Movement>(player).unwrap();
    assert_eq!(movement.speed(), 0.0);
}

#[test]
fn test_slide_along_wall() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let store = engine.store_mut();
    let wall = store.create_entity();
    store.add_component(wall, Position::new(400.0, 300.0));
    store.add_component(wall, Collision::solid(40.0, CollisionLayer::Wall));
    let player = store.create_entity();
    store.add_component(player, Position::new(340.0, 260.0));
    store.add_component(player, Movement::new(150.0, 60.0, 0.85));
    store.add_component(player, Collision::new(10.0, CollisionLayer::Player));
    store.add_component(player, Input::arrows_and_wasd());

    engine.inject_input("ArrowRight", true);
    engine.inject_input("ArrowDown", true);
    for _ in 0..90 {
        engine.tick(1.0 / 60.0);
        let p = engine.store().get::<Position>(player).unwrap();
        let w = engine.store().get::<Position>(wall).unwrap();
        let distance = (p.as_vec() - w.as_vec()).length();
        assert!(distance >= 50.0 - 1e-6, "player sank into wall: {}", distance);
    }

    // Deflected around the wall rather than stuck on it
    let p = engine.store().get::<Position>(player).unwrap();
    assert!(p.y > 300.0);
}

#[test]
fn test_enemy_contact_through_engine() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let hits = Arc::new(Mutex::new(Vec::new()));
    let sink = hits.clone();
    engine.on_collision(PLAYER_ENEMY_CONTACT, move |event| {
        sink.lock().unwrap().push(event.data["damage"].as_u64().unwrap_or(0));
        Ok(())
    });

    let store = engine.store_mut();
    let player = store.create_entity();
    store.add_component(player, Position::new(300.0, 300.0));
    store.add_component(player, Collision::new(12.0, CollisionLayer::Player));
    let enemy = store.create_entity();
    store.add_component(enemy, Position::new(310.0, 300.0));
    store.add_component(enemy, Collision::new(12.0, CollisionLayer::Enemy));
    store.add_component(enemy, Hazard { damage: 2 });

    engine.tick(1.0 / 60.0);
    engine.tick(1.0 / 60.0);

    // Contact is reported every frame while overlapping
    assert_eq!(*hits.lock().unwrap(), vec![2, 2]);
}

/// Device that hands its sink back to the test
#[derive(Default)]
struct Keyboard {
    sink: Arc<Mutex<Option<KeySink>>>,
}

impl InputDevice for Keyboard {
    fn attach(&mut self, sink: KeySink) -> Result<ListenerId, InputError> {
        *self.sink.lock().unwrap() = Some(sink);
        Ok(ListenerId(1))
    }

    fn detach(&mut self, _listener: ListenerId) {
        *self.sink.lock().unwrap() = None;
    }
}

#[test]
fn test_device_keys_move_player() {
    let keyboard = Keyboard::default();
    let handle = keyboard.sink.clone();
    let mut engine =
        Engine::with_input(EngineConfig::default(), InputSystem::with_device(Box::new(keyboard)))
            .unwrap();

    let store = engine.store_mut();
    let player = store.create_entity();
    store.add_component(player, Position::new(400.0, 300.0));
    store.add_component(player, Movement::default());
    store.add_component(player, Input::arrows_and_wasd());

    let sink = handle.lock().unwrap().clone().expect("device attached");
    // The default keys are bound from the moment the device attaches
    assert!(sink.is_bound("KeyW"));
    assert!(!sink.is_bound("Space"));

    assert!(sink.key_down("KeyW"));
    for _ in 0..10 {
        engine.tick(1.0 / 60.0);
    }
    assert!(engine.store().get::<Position>(player).unwrap().y < 300.0);

    // Removing the input system detaches the device
    assert!(engine.scheduler_mut().remove_system("input"));
    assert!(handle.lock().unwrap().is_none());
    assert!(!sink.key_down("KeyS"));
}

#[test]
fn test_disabled_collision_skips_pickups() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let store = engine.store_mut();
    let player = store.create_entity();
    store.add_component(player, Position::new(100.0, 100.0));
    store.add_component(player, Collision::new(20.0, CollisionLayer::Player));
    let coin = store.create_entity();
    store.add_component(coin, Position::new(110.0, 100.0));
    store.add_component(coin, Collision::new(10.0, CollisionLayer::Collectible));
    store.add_component(coin, Collectible::new("coin", 1));

    assert!(engine.scheduler_mut().set_system_enabled(COLLISION_SYSTEM_NAME, false));
    engine.tick(1.0 / 60.0);
    assert!(engine.store().contains(coin));

    engine.scheduler_mut().set_system_enabled(COLLISION_SYSTEM_NAME, true);
    engine.tick(1.0 / 60.0);
    assert!(!engine.store().contains(coin));
}

#[test]
fn test_config_file_shapes_world() {
    let config = EngineConfig::from_toml_str(
        r#"
        [world]
        max_x = 200.0
        max_y = 100.0

        [collision]
        cell_size = 25.0
        "#,
    )
    .unwrap();
    let mut engine = Engine::new(config).unwrap();
    assert_relative_eq!(engine.collision_mut().unwrap().cell_size(), 25.0);

    let store = engine.store_mut();
    let ball = store.create_entity();
    store.add_component(ball, Position::new(150.0, 50.0));
    store.add_component(ball, Movement::default().with_velocity(1500.0, 0.0));
    store.add_component(ball, Collision::new(5.0, CollisionLayer::Projectile));

    engine.tick(1.0 / 30.0);
    let position = engine.store().get::<Position>(ball).unwrap();
    assert_relative_eq!(position.x, 195.0);
    assert_eq!(engine.store().get::<Movement>(ball).unwrap().velocity.x, 0.0);
}
