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
//! Layer pair classification
//!
//! A candidate pair is described by an interaction key built from both
//! layer tags sorted alphabetically and joined with `:`, so `player` +
//! `wall` and `wall` + `player` land on the same rule. Built-in rules match
//! on the typed layers; caller mappings are looked up by key. A `Custom`
//! tag that spells a built-in name is treated as that built-in layer.

use crate::ecs::components::CollisionLayer;
use crate::ecs::EntityId;
use std::collections::HashMap;

/// Order-independent key for a pair of layers
pub fn interaction_key(a: &CollisionLayer, b: &CollisionLayer) -> String {
    let (first, second) = if a.as_str() <= b.as_str() {
        (a.as_str(), b.as_str())
    } else {
        (b.as_str(), a.as_str())
    };
    format!("{}:{}", first, second)
}

/// Whether a key is handled by a built-in rule
pub fn is_builtin(key: &str) -> bool {
    matches!(
        key,
        "collectible:player" | "enemy:player" | "enemy:wall" | "player:wall"
    )
}

/// One side of a candidate pair
#[derive(Debug, Clone, Copy)]
pub struct Side<'a> {
    /// Entity on this side
    pub id: EntityId,
    /// Its collision layer
    pub layer: &'a CollisionLayer,
    /// Whether its collider is marked solid
    pub solid: bool,
}

/// What a touching pair means
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// A player picked up a collectible
    Collect {
        /// The collecting player
        player: EntityId,
        /// The pickup
        collectible: EntityId,
    },
    /// A player touched an enemy
    EnemyContact {
        /// The player
        player: EntityId,
        /// The enemy
        enemy: EntityId,
    },
    /// A moving body overlaps a solid one and is pushed out
    Solid {
        /// The immovable side
        wall: EntityId,
        /// The side that gets pushed
        body: EntityId,
    },
    /// A caller-mapped pair that emits a generic contact event
    Mapped {
        /// Event type handlers are registered under
        event_type: String,
    },
    /// No rule applies
    Unrecognized(String),
}

/// Classify a touching pair
pub fn classify(a: Side<'_>, b: Side<'_>, mapped: &HashMap<String, String>) -> Interaction {
    use CollisionLayer::*;

    let (layer_a, layer_b) = (a.layer.canonical(), b.layer.canonical());
    let a = Side { layer: &*layer_a, ..a };
    let b = Side { layer: &*layer_b, ..b };

    // Normalize so each built-in rule is written once
    for (x, y) in [(a, b), (b, a)] {
        match (x.layer, y.layer) {
            (Player, Collectible) => {
                return Interaction::Collect {
                    player: x.id,
                    collectible: y.id,
                }
            }
            (Player, Enemy) => {
                return Interaction::EnemyContact {
                    player: x.id,
                    enemy: y.id,
                }
            }
            (Player | Enemy, Wall) => {
                return Interaction::Solid {
                    wall: y.id,
                    body: x.id,
                }
            }
            _ => {}
        }
    }

    let key = interaction_key(a.layer, b.layer);
    if let Some(event_type) = mapped.get(&key) {
        return Interaction::Mapped {
            event_type: event_type.clone(),
        };
    }

    match (a.solid, b.solid) {
        (true, false) => Interaction::Solid {
            wall: a.id,
            body: b.id,
        },
        (false, true) => Interaction::Solid {
            wall: b.id,
            body: a.id,
        },
        _ => Interaction::Unrecognized(key),
    }
}
