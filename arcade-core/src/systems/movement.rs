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
//! Movement system: velocity integration with arcade damping
//!
//! For every entity with `position` + `movement`:
//!
//! 1. `position += velocity * delta`
//! 2. clamp into the world bounds inset by the collision radius, zeroing
//!    velocity on each clamped axis
//! 3. when there is no input, damp velocity by `friction^(delta * 60)`,
//!    snapping tiny components to zero
//! 4. turn the facing toward the direction of travel at a fixed rate
//!
//! Damping is normalized to a 60 fps baseline so frame-time spikes do not
//! change how far an idle entity coasts.

use crate::config::{MovementConfig, WorldBounds};
use crate::ecs::components::{Collision, Input, Movement, Position};
use crate::ecs::scheduler::priorities;
use crate::ecs::{ComponentKind, EntityId, EntityStore, System};
use crate::math::{shortest_angle_delta, wrap_angle, Vec2};
use serde::Serialize;
use std::any::Any;
use std::collections::HashSet;

/// Name the movement system registers under
pub const MOVEMENT_SYSTEM_NAME: &str = "movement";

/// Frames per second the friction factor is expressed against
const DAMPING_BASELINE_FPS: f64 = 60.0;

/// Counters from the most recent frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MovementStats {
    /// Entities integrated
    pub moved: usize,
    /// Entities clamped on at least one axis
    pub clamped: usize,
    /// Entities whose velocity was damped
    pub damped: usize,
    /// Entities skipped because integration produced non-finite values
    pub invalid: usize,
}

/// Integrates velocity into position
pub struct MovementSystem {
    bounds: WorldBounds,
    config: MovementConfig,
    /// Entities exempt from damping on their next update
    undamped: HashSet<EntityId>,
    stats: MovementStats,
}

impl MovementSystem {
    /// Create a movement system with default bounds and tuning
    pub fn new() -> Self {
        Self::with_config(WorldBounds::default(), MovementConfig::default())
    }

    /// Create a movement system with explicit bounds and tuning
    pub fn with_config(bounds: WorldBounds, config: MovementConfig) -> Self {
        MovementSystem {
            bounds,
            config,
            undamped: HashSet::new(),
            stats: MovementStats::default(),
        }
    }

    /// Replace the world bounds
    pub fn set_world_bounds(&mut self, bounds: WorldBounds) {
        self.bounds = bounds;
    }

    /// Current world bounds
    pub fn world_bounds(&self) -> WorldBounds {
        self.bounds
    }

    /// Counters from the most recent frame
    pub fn stats(&self) -> MovementStats {
        self.stats
    }

    /// Add an impulse to an entity's velocity
    ///
    /// The entity skips damping on its next update so knockback is not
    /// immediately eaten by friction. Returns whether the entity moves.
    pub fn apply_force(&mut self, store: &mut EntityStore, id: EntityId, fx: f64, fy: f64) -> bool {
        match store.get_mut::<Movement>(id) {
            Some(movement) => {
                movement.velocity += Vec2::new(fx, fy);
                self.undamped.insert(id);
                true
            }
            None => false,
        }
    }

    /// Overwrite an entity's velocity, skipping damping on its next update
    pub fn set_velocity(&mut self, store: &mut EntityStore, id: EntityId, vx: f64, vy: f64) -> bool {
        match store.get_mut::<Movement>(id) {
            Some(movement) => {
                movement.velocity = Vec2::new(vx, vy);
                self.undamped.insert(id);
                true
            }
            None => false,
        }
    }

    /// Clamp one axis into `[min, max]`, returning the clamped value and
    /// whether it moved. Degenerate ranges collapse to their midpoint.
    fn clamp_axis(value: f64, min: f64, max: f64) -> (f64, bool) {
        if min > max {
            let mid = (min + max) * 0.5;
            return (mid, value != mid);
        }
        if value < min {
            (min, true)
        } else if value > max {
            (max, true)
        } else {
            (value, false)
        }
    }

    fn damp(&self, velocity: Vec2, friction: f64, delta: f64) -> Vec2 {
        let factor = friction.clamp(0.0, 1.0).powf(delta * DAMPING_BASELINE_FPS);
        let snap = |v: f64| {
            if v.abs() < self.config.velocity_epsilon {
                0.0
            } else {
                v
            }
        };
        let damped = velocity * factor;
        Vec2::new(snap(damped.x), snap(damped.y))
    }

    fn turn_toward_travel(&self, rotation: f64, velocity: Vec2, delta: f64) -> f64 {
        if velocity.length() <= self.config.min_rotation_speed {
            return wrap_angle(rotation);
        }
        let target = velocity.angle();
        let diff = shortest_angle_delta(rotation, target);
        let max_turn = self.config.rotation_speed * delta;
        if diff.abs() <= max_turn {
            wrap_angle(target)
        } else {
            wrap_angle(rotation + max_turn * diff.signum())
        }
    }
}

impl Default for MovementSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MovementSystem {
    fn name(&self) -> &str {
        MOVEMENT_SYSTEM_NAME
    }

    fn required_components(&self) -> &[ComponentKind] {
        &[ComponentKind::Position, ComponentKind::Movement]
    }

    fn priority(&self) -> i32 {
        priorities::MOVEMENT
    }

    fn process(&mut self, entities: &[EntityId], store: &mut EntityStore, delta: f64) {
        let mut stats = MovementStats::default();

        for &id in entities {
            let (Some(&movement), Some(&position)) =
                (store.get::<Movement>(id), store.get::<Position>(id))
            else {
                continue;
            };
            let radius = store
                .get::<Collision>(id)
                .map_or(self.config.default_radius, |c| c.radius);
            let has_input = store
                .get::<Input>(id)
                .map_or(false, |input| input.current_intent.has_input);
            let exempt = self.undamped.remove(&id);

            let mut velocity = movement.velocity;
            let mut next = position;
            next.x += velocity.x * delta;
            next.y += velocity.y * delta;

            let (x, clamped_x) = Self::clamp_axis(
                next.x,
                self.bounds.min_x + radius,
                self.bounds.max_x - radius,
            );
            let (y, clamped_y) = Self::clamp_axis(
                next.y,
                self.bounds.min_y + radius,
                self.bounds.max_y - radius,
            );
            next.x = x;
            next.y = y;
            if clamped_x {
                velocity.x = 0.0;
            }
            if clamped_y {
                velocity.y = 0.0;
            }

            if !has_input && !exempt {
                velocity = self.damp(velocity, movement.friction, delta);
                stats.damped += 1;
            }

            next.rotation = self.turn_toward_travel(next.rotation, velocity, delta);

            if !next.is_valid() || !velocity.is_valid() {
                log::warn!("movement produced invalid state for {}, skipping", id);
                stats.invalid += 1;
                continue;
            }

            if let Some(p) = store.get_mut::<Position>(id) {
                *p = next;
            }
            if let Some(m) = store.get_mut::<Movement>(id) {
                m.velocity = velocity;
            }

            stats.moved += 1;
            if clamped_x || clamped_y {
                stats.clamped += 1;
            }
        }

        // Exemptions for entities that were not processed this frame expire
        self.undamped.clear();
        self.stats = stats;
    }

    fn diagnostics(&self) -> serde_json::Value {
        serde_json::json!({
            "bounds": self.bounds,
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
