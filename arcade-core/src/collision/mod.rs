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
//! Collision system: grid broad phase, circle narrow phase, layer dispatch
//!
//! Each frame the system rebuilds a [`SpatialGrid`] from current positions,
//! takes the candidate pairs that share a cell, and for each pair that still
//! exists and actually overlaps (`distance < ra + rb`) applies the rule for
//! its layer combination:
//!
//! | key                  | effect                                             |
//! |----------------------|----------------------------------------------------|
//! | `collectible:player` | mark consumed, emit `player_collect`, remove pickup |
//! | `enemy:player`       | emit `player_enemy_contact` unless invulnerable    |
//! | `enemy:wall`         | push the enemy out of the wall                     |
//! | `player:wall`        | push the player out of the wall                    |
//!
//! Other pairs emit an event if the caller mapped them with
//! [`CollisionSystem::map_interaction`], get pushed out if exactly one side
//! is solid, and are otherwise only counted. Handler failures are logged and
//! never stop the frame.

pub mod events;
pub mod grid;
pub mod layers;

pub use events::{
    CollisionEvent, CollisionHandler, HandlerRegistry, HandlerResult, PLAYER_COLLECT,
    PLAYER_ENEMY_CONTACT,
};
pub use grid::{CandidatePair, CellKey, SpatialGrid};
pub use layers::{interaction_key, Interaction};

use crate::config::CollisionConfig;
use crate::ecs::components::{Collectible, Collision, CollisionLayer, Hazard, Health, Movement, Position};
use crate::ecs::scheduler::priorities;
use crate::ecs::{ComponentKind, EntityId, EntityStore, System};
use crate::math::Vec2;
use layers::Side;
use serde::Serialize;
use serde_json::json;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};

/// Name the collision system registers under
pub const COLLISION_SYSTEM_NAME: &str = "collision";

/// Push-out direction when two centers coincide
const FALLBACK_NORMAL: Vec2 = Vec2::new(1.0, 0.0);

/// Counters from the most recent frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollisionStats {
    /// Colliders inserted into the grid
    pub colliders: usize,
    /// Non-empty grid cells
    pub cells: usize,
    /// Most colliders sharing one cell
    pub max_cell_occupancy: usize,
    /// Pairs produced by the broad phase
    pub candidates: usize,
    /// Candidate pairs that actually overlap
    pub hits: usize,
    /// Events emitted
    pub events: usize,
    /// Solid pairs pushed apart
    pub resolved: usize,
    /// Handlers that returned an error or panicked
    pub handler_failures: usize,
    /// Overlapping pairs with no rule, by interaction key
    pub unrecognized: BTreeMap<String, usize>,
}

/// Snapshot of one collider read from the store
#[derive(Debug, Clone)]
struct Body {
    center: Vec2,
    radius: f64,
    layer: CollisionLayer,
    solid: bool,
}

impl Body {
    fn read(store: &EntityStore, id: EntityId) -> Option<Body> {
        let position = store.get::<Position>(id)?;
        let collision = store.get::<Collision>(id)?;
        Some(Body {
            center: position.as_vec(),
            radius: collision.radius,
            layer: collision.layer.clone(),
            solid: collision.solid,
        })
    }
}

/// Detects overlaps and dispatches them by layer
pub struct CollisionSystem {
    grid: SpatialGrid,
    handlers: HandlerRegistry,
    /// Interaction key to caller-chosen event type
    mapped: HashMap<String, String>,
    stats: CollisionStats,
}

impl CollisionSystem {
    /// Create a collision system with the default cell size
    pub fn new() -> Self {
        Self::with_config(CollisionConfig::default())
    }

    /// Create a collision system from configuration
    ///
    /// # Panics
    ///
    /// Panics if `config.cell_size` is not positive.
    pub fn with_config(config: CollisionConfig) -> Self {
        CollisionSystem {
            grid: SpatialGrid::new(config.cell_size),
            handlers: HandlerRegistry::new(),
            mapped: HashMap::new(),
            stats: CollisionStats::default(),
        }
    }

    /// Register a handler for an event type
    ///
    /// Handlers run in registration order. An `Err` or a panic is logged
    /// and counted; the remaining handlers and pairs still run.
    pub fn register_collision_handler<F>(&mut self, event_type: impl Into<String>, handler: F)
    where
        F: FnMut(&CollisionEvent) -> HandlerResult + Send + Sync + 'static,
    {
        let event_type = event_type.into();
        log::debug!("registered collision handler for {}", event_type);
        self.handlers.register(event_type, Box::new(handler));
    }

    /// Drop every registered handler
    pub fn clear_handlers(&mut self) {
        self.handlers.clear();
    }

    /// Number of handlers registered for an event type
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.handlers.count(event_type)
    }

    /// Make a layer pair emit `event_type` when it overlaps
    ///
    /// The event carries `{layer_a, layer_b}`. Pairs with a built-in rule
    /// cannot be remapped; returns false for those.
    pub fn map_interaction(
        &mut self,
        a: &CollisionLayer,
        b: &CollisionLayer,
        event_type: impl Into<String>,
    ) -> bool {
        let key = interaction_key(a, b);
        if layers::is_builtin(&key) {
            log::warn!("cannot remap built-in interaction {}", key);
            return false;
        }
        self.mapped.insert(key, event_type.into());
        true
    }

    /// Counters from the most recent frame
    pub fn stats(&self) -> &CollisionStats {
        &self.stats
    }

    /// Current grid cell size
    pub fn cell_size(&self) -> f64 {
        self.grid.cell_size()
    }

    /// Change the grid cell size
    ///
    /// # Panics
    ///
    /// Panics if `cell_size` is not positive.
    pub fn set_cell_size(&mut self, cell_size: f64) {
        self.grid.set_cell_size(cell_size);
    }

    /// The grid as built by the most recent frame
    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    fn emit(&mut self, event: CollisionEvent, stats: &mut CollisionStats) {
        log::trace!(
            "{} between {} and {}",
            event.event_type,
            event.entity_a,
            event.entity_b
        );
        stats.events += 1;
        stats.handler_failures += self.handlers.dispatch(&event);
    }

    fn collect(
        &mut self,
        store: &mut EntityStore,
        player: EntityId,
        collectible: EntityId,
        stats: &mut CollisionStats,
    ) {
        let data = match store.get_mut::<Collectible>(collectible) {
            Some(item) if item.consumed => return,
            Some(item) => {
                item.consumed = true;
                json!({
                    "collectible_type": item.collectible_type,
                    "points": item.points,
                })
            }
            None => {
                // Bare pickups report their layer tag and no points
                let mut marker = Collectible::new(CollisionLayer::Collectible.as_str(), 0);
                marker.consumed = true;
                store.add_component(collectible, marker);
                json!({
                    "collectible_type": CollisionLayer::Collectible.as_str(),
                    "points": 0,
                })
            }
        };

        self.emit(
            CollisionEvent::new(player, collectible, PLAYER_COLLECT, data),
            stats,
        );
        store.remove_entity(collectible);
    }

    fn enemy_contact(
        &mut self,
        store: &EntityStore,
        player: EntityId,
        enemy: EntityId,
        stats: &mut CollisionStats,
    ) {
        if store
            .get::<Health>(player)
            .map_or(false, |health| health.invulnerable)
        {
            return;
        }
        let damage = store
            .get::<Hazard>(enemy)
            .copied()
            .unwrap_or_default()
            .damage;

        self.emit(
            CollisionEvent::new(player, enemy, PLAYER_ENEMY_CONTACT, json!({ "damage": damage })),
            stats,
        );
    }

    /// Push `body` out of `wall` along the center axis and drop the part of
    /// its velocity pointing into the wall. Tangential velocity is kept.
    fn resolve_solid(store: &mut EntityStore, wall: &Body, body_id: EntityId, body: &Body) -> bool {
        let offset = body.center - wall.center;
        let distance = offset.length();
        let overlap = wall.radius + body.radius - distance;
        if overlap <= 0.0 {
            return false;
        }
        let normal = offset.normalized().unwrap_or(FALLBACK_NORMAL);

        let Some(position) = store.get_mut::<Position>(body_id) else {
            return false;
        };
        position.set_vec(body.center + normal * overlap);

        if let Some(movement) = store.get_mut::<Movement>(body_id) {
            let into_wall = movement.velocity.dot(normal);
            if into_wall < 0.0 {
                movement.velocity = movement.velocity - normal * into_wall;
            }
        }
        true
    }
}

impl Default for CollisionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for CollisionSystem {
    fn name(&self) -> &str {
        COLLISION_SYSTEM_NAME
    }

    fn required_components(&self) -> &[ComponentKind] {
        &[ComponentKind::Position, ComponentKind::Collision]
    }

    fn priority(&self) -> i32 {
        priorities::COLLISION
    }

    fn process(&mut self, entities: &[EntityId], store: &mut EntityStore, _delta: f64) {
        let mut stats = CollisionStats {
            colliders: self.grid.rebuild(store, entities),
            cells: self.grid.cell_count(),
            max_cell_occupancy: self.grid.max_occupancy(),
            ..CollisionStats::default()
        };

        let candidates = self.grid.candidate_pairs();
        stats.candidates = candidates.len();

        for (a, b) in candidates {
            // Earlier pairs this frame may have removed or moved either side
            let (Some(body_a), Some(body_b)) = (Body::read(store, a), Body::read(store, b)) else {
                continue;
            };
            let distance = (body_b.center - body_a.center).length();
            if distance >= body_a.radius + body_b.radius {
                continue;
            }
            stats.hits += 1;

            let interaction = layers::classify(
                Side {
                    id: a,
                    layer: &body_a.layer,
                    solid: body_a.solid,
                },
                Side {
                    id: b,
                    layer: &body_b.layer,
                    solid: body_b.solid,
                },
                &self.mapped,
            );

            match interaction {
                Interaction::Collect {
                    player,
                    collectible,
                } => self.collect(store, player, collectible, &mut stats),
                Interaction::EnemyContact { player, enemy } => {
                    self.enemy_contact(store, player, enemy, &mut stats)
                }
                Interaction::Solid { wall, body } => {
                    let (wall_body, moving) = if wall == a {
                        (&body_a, &body_b)
                    } else {
                        (&body_b, &body_a)
                    };
                    if Self::resolve_solid(store, wall_body, body, moving) {
                        stats.resolved += 1;
                    }
                }
                Interaction::Mapped { event_type } => {
                    let data = json!({
                        "layer_a": body_a.layer.as_str(),
                        "layer_b": body_b.layer.as_str(),
                    });
                    self.emit(CollisionEvent::new(a, b, event_type, data), &mut stats);
                }
                Interaction::Unrecognized(key) => {
                    *stats.unrecognized.entry(key).or_default() += 1;
                }
            }
        }

        if stats.handler_failures > 0 {
            log::warn!(
                "{} collision handler failures this frame",
                stats.handler_failures
            );
        }
        self.stats = stats;
    }

    fn diagnostics(&self) -> serde_json::Value {
        json!({
            "cell_size": self.grid.cell_size(),
            "mapped": self.mapped,
            "stats": self.stats,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn collider(
        store: &mut EntityStore,
        x: f64,
        y: f64,
        radius: f64,
        layer: CollisionLayer,
    ) -> EntityId {
        let id = store.create_entity();
        store.add_component(id, Position::new(x, y));
        store.add_component(id, Collision::new(radius, layer));
        id
    }

    fn recorder(system: &mut CollisionSystem, event_type: &str) -> Arc<Mutex<Vec<CollisionEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        system.register_collision_handler(event_type, move |e: &CollisionEvent| {
            sink.lock().unwrap().push(e.clone());
            Ok(())
        });
        events
    }

    #[test]
    fn test_player_collects_pickup() {
        let mut store = EntityStore::new();
        let player = collider(&mut store, 100.0, 100.0, 20.0, CollisionLayer::Player);
        let coin = collider(&mut store, 115.0, 100.0, 10.0, CollisionLayer::Collectible);
        store.add_component(coin, Collectible::new("coin", 10));

        let mut system = CollisionSystem::new();
        let events = recorder(&mut system, PLAYER_COLLECT);
        system.update(&mut store, 0.016);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].entity_a, player);
        assert_eq!(events[0].entity_b, coin);
        assert_eq!(events[0].data["collectible_type"], "coin");
        assert_eq!(events[0].data["points"], 10);
        assert!(!store.contains(coin));
        assert_eq!(system.stats().events, 1);
    }

    #[test]
    fn test_consumed_pickup_is_skipped() {
        let mut store = EntityStore::new();
        collider(&mut store, 100.0, 100.0, 20.0, CollisionLayer::Player);
        let coin = collider(&mut store, 110.0, 100.0, 10.0, CollisionLayer::Collectible);
        let mut pickup = Collectible::new("gem", 50);
        pickup.consumed = true;
        store.add_component(coin, pickup);

        let mut system = CollisionSystem::new();
        let events = recorder(&mut system, PLAYER_COLLECT);
        system.update(&mut store, 0.016);
        system.update(&mut store, 0.016);

        assert!(events.lock().unwrap().is_empty());
        assert!(store.contains(coin));
    }

    #[test]
    fn test_two_players_one_pickup() {
        let mut store = EntityStore::new();
        collider(&mut store, 100.0, 100.0, 20.0, CollisionLayer::Player);
        collider(&mut store, 130.0, 100.0, 20.0, CollisionLayer::Player);
        let coin = collider(&mut store, 115.0, 100.0, 10.0, CollisionLayer::Collectible);
        store.add_component(coin, Collectible::new("coin", 1));

        let mut system = CollisionSystem::new();
        let events = recorder(&mut system, PLAYER_COLLECT);
        system.update(&mut store, 0.016);

        assert_eq!(events.lock().unwrap().len(), 1);
        assert!(!store.contains(coin));
    }

    #[test]
    fn test_bare_pickup_collected_by_layer() {
        let mut store = EntityStore::new();
        collider(&mut store, 100.0, 100.0, 20.0, CollisionLayer::Player);
        collider(&mut store, 130.0, 100.0, 20.0, CollisionLayer::Player);
        let orb = collider(&mut store, 115.0, 100.0, 10.0, CollisionLayer::Collectible);

        let mut system = CollisionSystem::new();
        let events = recorder(&mut system, PLAYER_COLLECT);
        system.update(&mut store, 0.016);
        system.update(&mut store, 0.016);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].entity_b, orb);
        assert_eq!(events[0].data["collectible_type"], "collectible");
        assert_eq!(events[0].data["points"], 0);
        assert!(!store.contains(orb));
    }

    #[test]
    fn test_touching_is_not_overlapping() {
        let mut store = EntityStore::new();
        collider(&mut store, 100.0, 100.0, 10.0, CollisionLayer::Player);
        let coin = collider(&mut store, 120.0, 100.0, 10.0, CollisionLayer::Collectible);
        store.add_component(coin, Collectible::new("coin", 1));

        let mut system = CollisionSystem::new();
        system.update(&mut store, 0.016);

        assert!(store.contains(coin));
        assert_eq!(system.stats().candidates, 1);
        assert_eq!(system.stats().hits, 0);
    }

    #[test]
    fn test_enemy_contact_damage() {
        let mut store = EntityStore::new();
        let player = collider(&mut store, 50.0, 50.0, 10.0, CollisionLayer::Player);
        let enemy = collider(&mut store, 55.0, 50.0, 10.0, CollisionLayer::Enemy);
        store.add_component(enemy, Hazard { damage: 3 });

        let mut system = CollisionSystem::new();
        let events = recorder(&mut system, PLAYER_ENEMY_CONTACT);
        system.update(&mut store, 0.016);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].entity_a, player);
        assert_eq!(events[0].entity_b, enemy);
        assert_eq!(events[0].data["damage"], 3);
    }

    #[test]
    fn test_invulnerable_player_ignores_enemy() {
        let mut store = EntityStore::new();
        let player = collider(&mut store, 50.0, 50.0, 10.0, CollisionLayer::Player);
        collider(&mut store, 55.0, 50.0, 10.0, CollisionLayer::Enemy);
        let mut health = Health::new(3);
        health.invulnerable = true;
        store.add_component(player, health);

        let mut system = CollisionSystem::new();
        let events = recorder(&mut system, PLAYER_ENEMY_CONTACT);
        system.update(&mut store, 0.016);

        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_wall_pushes_player_out() {
        let mut store = EntityStore::new();
        let wall = collider(&mut store, 100.0, 100.0, 20.0, CollisionLayer::Wall);
        let player = collider(&mut store, 125.0, 100.0, 10.0, CollisionLayer::Player);
        store.add_component(player, Movement::default().with_velocity(-50.0, 30.0));

        let mut system = CollisionSystem::new();
        system.update(&mut store, 0.016);

        let pos = store.get::<Position>(player).unwrap();
        assert!((pos.x - 130.0).abs() < 1e-9);
        assert_eq!(pos.y, 100.0);
        let v = store.get::<Movement>(player).unwrap().velocity;
        assert!(v.x.abs() < 1e-9);
        assert_eq!(v.y, 30.0);
        // The wall never moves
        assert_eq!(store.get::<Position>(wall).unwrap().x, 100.0);
        assert_eq!(system.stats().resolved, 1);
    }

    #[test]
    fn test_enormous_wall_still_resolves() {
        let mut store = EntityStore::new();
        collider(&mut store, 0.0, 0.0, 1.0e6, CollisionLayer::Wall);
        let player = collider(&mut store, 1.0e6 - 5.0, 0.0, 10.0, CollisionLayer::Player);

        let mut system = CollisionSystem::new();
        system.update(&mut store, 0.016);

        assert_eq!(system.grid().oversized_count(), 1);
        assert!(system.grid().cell_count() <= 4);
        assert_eq!(system.stats().resolved, 1);
        let pos = store.get::<Position>(player).unwrap();
        assert!((pos.x - (1.0e6 + 10.0)).abs() < 1e-6);
    }

    #[test]
    fn test_custom_player_tag_hits_wall() {
        let mut store = EntityStore::new();
        collider(&mut store, 100.0, 100.0, 20.0, CollisionLayer::Wall);
        let tag = CollisionLayer::Custom("player".into());
        let player = collider(&mut store, 125.0, 100.0, 10.0, tag);

        let mut system = CollisionSystem::new();
        system.update(&mut store, 0.016);

        assert!((store.get::<Position>(player).unwrap().x - 130.0).abs() < 1e-9);
        assert_eq!(system.stats().resolved, 1);
        assert!(system.stats().unrecognized.is_empty());
    }

    #[test]
    fn test_wall_keeps_outward_velocity() {
        let mut store = EntityStore::new();
        collider(&mut store, 100.0, 100.0, 20.0, CollisionLayer::Wall);
        let enemy = collider(&mut store, 125.0, 100.0, 10.0, CollisionLayer::Enemy);
        store.add_component(enemy, Movement::default().with_velocity(40.0, 0.0));

        let mut system = CollisionSystem::new();
        system.update(&mut store, 0.016);

        assert_eq!(store.get::<Movement>(enemy).unwrap().velocity.x, 40.0);
    }

    #[test]
    fn test_coincident_centers_use_fallback_normal() {
        let mut store = EntityStore::new();
        collider(&mut store, 100.0, 100.0, 20.0, CollisionLayer::Wall);
        let player = collider(&mut store, 100.0, 100.0, 10.0, CollisionLayer::Player);

        let mut system = CollisionSystem::new();
        system.update(&mut store, 0.016);

        let pos = store.get::<Position>(player).unwrap();
        assert_eq!(pos.x, 130.0);
        assert_eq!(pos.y, 100.0);
    }

    #[test]
    fn test_handler_failure_does_not_stop_frame() {
        let mut store = EntityStore::new();
        collider(&mut store, 100.0, 100.0, 20.0, CollisionLayer::Player);
        let coin = collider(&mut store, 110.0, 100.0, 10.0, CollisionLayer::Collectible);
        store.add_component(coin, Collectible::new("coin", 1));
        let wall = collider(&mut store, 400.0, 400.0, 20.0, CollisionLayer::Wall);
        let enemy = collider(&mut store, 420.0, 400.0, 10.0, CollisionLayer::Enemy);

        let mut system = CollisionSystem::new();
        system.register_collision_handler(PLAYER_COLLECT, |_| panic!("scoring bug"));
        system.update(&mut store, 0.016);

        assert!(!store.contains(coin));
        assert_eq!(system.stats().handler_failures, 1);
        // The later wall pair was still resolved
        let enemy_x = store.get::<Position>(enemy).unwrap().x;
        assert!((enemy_x - 430.0).abs() < 1e-9);
        assert!(store.contains(wall));
    }

    #[test]
    fn test_mapped_interaction() {
        let mut store = EntityStore::new();
        let shot = collider(&mut store, 10.0, 10.0, 2.0, CollisionLayer::Projectile);
        let enemy = collider(&mut store, 12.0, 10.0, 5.0, CollisionLayer::Enemy);

        let mut system = CollisionSystem::new();
        assert!(system.map_interaction(&CollisionLayer::Enemy, &CollisionLayer::Projectile, "enemy_hit"));
        assert!(!system.map_interaction(&CollisionLayer::Wall, &CollisionLayer::Player, "bump"));
        let events = recorder(&mut system, "enemy_hit");
        system.update(&mut store, 0.016);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].entity_a, shot);
        assert_eq!(events[0].entity_b, enemy);
        assert_eq!(events[0].data["layer_a"], "projectile");
        assert_eq!(events[0].data["layer_b"], "enemy");
    }

    #[test]
    fn test_unrecognized_pairs_are_counted() {
        let mut store = EntityStore::new();
        collider(&mut store, 10.0, 10.0, 5.0, CollisionLayer::Enemy);
        collider(&mut store, 12.0, 10.0, 5.0, CollisionLayer::Enemy);

        let mut system = CollisionSystem::new();
        system.update(&mut store, 0.016);

        assert_eq!(system.stats().hits, 1);
        assert_eq!(system.stats().unrecognized.get("enemy:enemy"), Some(&1));
        assert_eq!(system.diagnostics()["stats"]["unrecognized"]["enemy:enemy"], 1);
    }

    #[test]
    fn test_handler_registry_management() {
        let mut system = CollisionSystem::new();
        system.register_collision_handler(PLAYER_COLLECT, |_| Ok(()));
        system.register_collision_handler(PLAYER_COLLECT, |_| Ok(()));
        assert_eq!(system.handler_count(PLAYER_COLLECT), 2);

        system.clear_handlers();
        assert_eq!(system.handler_count(PLAYER_COLLECT), 0);
    }

    #[test]
    fn test_set_cell_size() {
        let mut system = CollisionSystem::new();
        system.set_cell_size(32.0);
        assert_eq!(system.cell_size(), 32.0);
    }
}
