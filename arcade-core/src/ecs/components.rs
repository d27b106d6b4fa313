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
//! Component data for 2D arcade entities
//!
//! This module provides the well-known component kinds the core systems
//! consume (position, movement, collision, input) plus the small set of
//! gameplay kinds the collision dispatch reads (health, collectible, hazard).
//! Components are plain data; behaviour lives in systems.

use crate::ecs::EntityId;
use crate::math::Vec2;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// World-space placement of an entity
///
/// # Examples
///
/// ```
/// use arcade_core::ecs::components::Position;
///
/// let pos = Position::new(10.0, 20.0);
/// assert_eq!(pos.rotation, 0.0);
/// assert!(pos.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate in world units
    pub x: f64,
    /// Y coordinate in world units
    pub y: f64,
    /// Facing in radians, kept in `[-π, π]` by the movement system
    pub rotation: f64,
}

impl Position {
    /// Create a position with zero rotation
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y, rotation: 0.0 }
    }

    /// Set the initial rotation
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// The position as a vector
    pub fn as_vec(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Move to the given point, keeping rotation
    pub fn set_vec(&mut self, v: Vec2) {
        self.x = v.x;
        self.y = v.y;
    }

    /// Check if all fields are finite
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.rotation.is_finite()
    }
}

/// Kinematic state and tuning for anything that moves
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    /// Current velocity in world units per second
    pub velocity: Vec2,
    /// Top speed reached under input
    pub max_speed: f64,
    /// Responsiveness of the approach toward the input target velocity
    pub acceleration: f64,
    /// Per-frame damping factor at 60 fps, in `[0, 1]`; lower stops faster
    pub friction: f64,
}

impl Movement {
    /// Create a movement component at rest
    pub fn new(max_speed: f64, acceleration: f64, friction: f64) -> Self {
        Movement {
            velocity: Vec2::ZERO,
            max_speed,
            acceleration,
            friction,
        }
    }

    /// Set the initial velocity
    pub fn with_velocity(mut self, vx: f64, vy: f64) -> Self {
        self.velocity = Vec2::new(vx, vy);
        self
    }

    /// Current speed
    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }
}

impl Default for Movement {
    fn default() -> Self {
        Movement::new(200.0, 10.0, 0.85)
    }
}

/// Classification of a collider, used to pick the interaction rule
///
/// The set is closed so the dispatch table can match on it exhaustively;
/// `Custom` carries game-specific tags the core treats as opaque.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionLayer {
    /// The player avatar
    Player,
    /// Anything that hurts the player on contact
    Enemy,
    /// Pickups consumed on contact
    Collectible,
    /// Static solid geometry
    Wall,
    /// Bullets and other short-lived shots
    Projectile,
    /// Game-defined layer
    Custom(String),
}

impl CollisionLayer {
    /// Lowercase tag used in interaction keys
    pub fn as_str(&self) -> &str {
        match self {
            CollisionLayer::Player => "player",
            CollisionLayer::Enemy => "enemy",
            CollisionLayer::Collectible => "collectible",
            CollisionLayer::Wall => "wall",
            CollisionLayer::Projectile => "projectile",
            CollisionLayer::Custom(tag) => tag,
        }
    }

    /// Layer for a tag, using the typed variant for built-in names
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "player" => CollisionLayer::Player,
            "enemy" => CollisionLayer::Enemy,
            "collectible" => CollisionLayer::Collectible,
            "wall" => CollisionLayer::Wall,
            "projectile" => CollisionLayer::Projectile,
            other => CollisionLayer::Custom(other.to_string()),
        }
    }

    /// The typed variant when a `Custom` tag spells a built-in name
    pub fn canonical(&self) -> Cow<'_, CollisionLayer> {
        match self {
            CollisionLayer::Custom(tag) => match CollisionLayer::from_tag(tag) {
                CollisionLayer::Custom(_) => Cow::Borrowed(self),
                builtin => Cow::Owned(builtin),
            },
            _ => Cow::Borrowed(self),
        }
    }
}

impl fmt::Display for CollisionLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Circular collider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collision {
    /// Radius in world units
    pub radius: f64,
    /// Interaction layer
    pub layer: CollisionLayer,
    /// Whether the collider blocks movement
    pub solid: bool,
}

impl Collision {
    /// Create a non-solid collider
    pub fn new(radius: f64, layer: CollisionLayer) -> Self {
        Collision {
            radius,
            layer,
            solid: false,
        }
    }

    /// Create a solid collider
    pub fn solid(radius: f64, layer: CollisionLayer) -> Self {
        Collision {
            radius,
            layer,
            solid: true,
        }
    }
}

/// Logical movement direction an input binding maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Negative y
    Up,
    /// Positive y
    Down,
    /// Negative x
    Left,
    /// Positive x
    Right,
}

impl Direction {
    /// All four directions
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];
}

/// Movement intent computed from pressed keys
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Intent {
    /// Horizontal intent in `[-1, 1]`
    pub x: f64,
    /// Vertical intent in `[-1, 1]`
    pub y: f64,
    /// Whether any bound key was held
    pub has_input: bool,
}

impl Intent {
    /// The intent as a vector
    pub fn as_vec(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Key bindings and the latest intent derived from them
///
/// The input system writes `current_intent`; the movement system reads it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Input {
    /// Raw key identifiers bound to each direction
    pub bindings: BTreeMap<Direction, BTreeSet<String>>,
    /// Intent from the most recent input update
    pub current_intent: Intent,
}

impl Input {
    /// Create an input component with no bindings
    pub fn new() -> Self {
        Input::default()
    }

    /// Arrow keys plus WASD, using DOM `KeyboardEvent.code` names
    pub fn arrows_and_wasd() -> Self {
        Input::new()
            .bind(Direction::Up, "ArrowUp")
            .bind(Direction::Up, "KeyW")
            .bind(Direction::Down, "ArrowDown")
            .bind(Direction::Down, "KeyS")
            .bind(Direction::Left, "ArrowLeft")
            .bind(Direction::Left, "KeyA")
            .bind(Direction::Right, "ArrowRight")
            .bind(Direction::Right, "KeyD")
    }

    /// Bind a raw key to a direction
    pub fn bind(mut self, direction: Direction, key: impl Into<String>) -> Self {
        self.bindings.entry(direction).or_default().insert(key.into());
        self
    }

    /// Keys bound to a direction
    pub fn keys_for(&self, direction: Direction) -> impl Iterator<Item = &str> {
        self.bindings
            .get(&direction)
            .into_iter()
            .flat_map(|keys| keys.iter().map(String::as_str))
    }

    /// Every key bound to any direction
    pub fn bound_keys(&self) -> impl Iterator<Item = &str> {
        self.bindings
            .values()
            .flat_map(|keys| keys.iter().map(String::as_str))
    }
}

/// Hit points and damage immunity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    /// Current hit points
    pub current: u32,
    /// Maximum hit points
    pub max: u32,
    /// While set, enemy contact is ignored
    pub invulnerable: bool,
}

impl Health {
    /// Create a full health pool
    pub fn new(max: u32) -> Self {
        Health {
            current: max,
            max,
            invulnerable: false,
        }
    }
}

/// Pickup payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collectible {
    /// Game-defined pickup tag, reported in the collect event
    pub collectible_type: String,
    /// Score value, reported in the collect event
    pub points: u32,
    /// Set once the pickup has been collected
    pub consumed: bool,
}

impl Collectible {
    /// Create an unconsumed pickup
    pub fn new(collectible_type: impl Into<String>, points: u32) -> Self {
        Collectible {
            collectible_type: collectible_type.into(),
            points,
            consumed: false,
        }
    }
}

/// Contact damage dealt by an enemy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    /// Damage per contact event
    pub damage: u32,
}

impl Default for Hazard {
    fn default() -> Self {
        Hazard { damage: 1 }
    }
}

/// Presentation hints for an external renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Render {
    /// Renderer-defined sprite key
    pub sprite: String,
    /// Draw order; higher draws later
    pub z_index: i32,
    /// Whether to draw at all
    pub visible: bool,
}

impl Render {
    /// Create a visible render component at z 0
    pub fn new(sprite: impl Into<String>) -> Self {
        Render {
            sprite: sprite.into(),
            z_index: 0,
            visible: true,
        }
    }
}

/// Chase behaviour target, held by id only
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Follow {
    /// Entity to chase; may no longer exist
    pub target: EntityId,
    /// Chase speed in world units per second
    pub speed: f64,
}
