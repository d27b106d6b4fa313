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
//! # Arcade Core
//!
//! A small ECS core for 2D arcade games: an entity store, a priority-ordered
//! scheduler, and the three systems most top-down games need.
//!
//! ## Features
//!
//! - **ECS Architecture**: closed set of component kinds over an ordered entity store
//! - **Input**: key state from a device or injected presses, turned into per-entity intent
//! - **Movement**: velocity integration with bounds clamping and frame-rate independent damping
//! - **Collision**: uniform-grid broad phase, circle narrow phase, layer-based dispatch
//! - **Parallelization**: optional Rayon broad phase behind the `parallel` feature
//!
//! ## Example
//!
//! ```rust
//! use arcade_core::ecs::components::{Collision, CollisionLayer, Input, Movement, Position};
//! use arcade_core::{Engine, EngineConfig};
//!
//! let mut engine = Engine::new(EngineConfig::default()).unwrap();
//!
//! let store = engine.store_mut();
//! let player = store.create_entity();
//! store.add_component(player, Position::new(400.0, 300.0));
//! store.add_component(player, Movement::default());
//! store.add_component(player, Collision::new(16.0, CollisionLayer::Player));
//! store.add_component(player, Input::arrows_and_wasd());
//!
//! engine.inject_input("ArrowRight", true);
//! engine.tick(1.0 / 60.0);
//!
//! let position = engine.store().get::<Position>(player).unwrap();
//! assert!(position.x > 400.0);
//! ```

#![warn(missing_docs)]

/// Entity Component System implementation
pub mod ecs;

/// Built-in input and movement systems
pub mod systems;

/// Broad and narrow phase collision with layer dispatch
pub mod collision;

/// Engine configuration loaded from TOML
pub mod config;

/// Store, scheduler and built-in systems bundled together
pub mod engine;

/// 2D vector math
pub mod math;

pub use config::{ConfigError, EngineConfig};
pub use ecs::{EntityId, EntityStore, Scheduler, System};
pub use engine::{Engine, EngineError};
pub use math::Vec2;
