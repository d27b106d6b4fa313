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
//! Engine facade
//!
//! Bundles a store, a scheduler preloaded with the input, movement and
//! collision systems, and the configuration they were built from. Hosts
//! call [`Engine::tick`] once per rendered frame.

use crate::collision::{CollisionEvent, CollisionSystem, HandlerResult, COLLISION_SYSTEM_NAME};
use crate::config::{ConfigError, EngineConfig};
use crate::ecs::{EntityStore, PerformanceReport, Scheduler, SchedulerError};
use crate::systems::{InputSystem, MovementSystem, INPUT_SYSTEM_NAME, MOVEMENT_SYSTEM_NAME};
use thiserror::Error;

/// Failure to assemble an engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration could not be loaded or failed validation
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A built-in system could not be registered
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Store, scheduler and configuration for one running game
pub struct Engine {
    store: EntityStore,
    scheduler: Scheduler,
    config: EngineConfig,
}

impl Engine {
    /// Validate `config` and build an engine with the built-in systems
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_input(config, InputSystem::new())
    }

    /// Build an engine around a preconfigured input system, typically one
    /// attached to a device with [`InputSystem::with_device`]
    pub fn with_input(config: EngineConfig, input: InputSystem) -> Result<Self, EngineError> {
        config.validate()?;

        let mut scheduler = Scheduler::with_frame_config(config.frame);
        scheduler.add_system(input)?;
        scheduler.add_system(MovementSystem::with_config(config.world, config.movement))?;
        scheduler.add_system(CollisionSystem::with_config(config.collision))?;
        log::info!(
            "engine ready: {}x{} world, cell size {}",
            config.world.width(),
            config.world.height(),
            config.collision.cell_size
        );

        Ok(Engine {
            store: EntityStore::new(),
            scheduler,
            config,
        })
    }

    /// Build an engine from the file named by `ARCADE_CORE_CONFIG`, or defaults
    pub fn from_env() -> Result<Self, EngineError> {
        Self::new(EngineConfig::from_env()?)
    }

    /// Advance one host frame of `delta` seconds; returns sub-steps run
    pub fn tick(&mut self, delta: f64) -> u32 {
        self.scheduler.tick(&mut self.store, delta)
    }

    /// Run exactly one step of `delta` seconds without frame clamping
    pub fn step(&mut self, delta: f64) {
        self.scheduler.update(&mut self.store, delta);
    }

    /// The entity store
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Mutable access to the entity store
    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    /// The scheduler
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Mutable access to the scheduler
    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Configuration the engine was built from
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The input system, unless it was removed
    pub fn input_mut(&mut self) -> Option<&mut InputSystem> {
        self.scheduler.get_system_mut::<InputSystem>(INPUT_SYSTEM_NAME)
    }

    /// The movement system, unless it was removed
    pub fn movement_mut(&mut self) -> Option<&mut MovementSystem> {
        self.scheduler.get_system_mut::<MovementSystem>(MOVEMENT_SYSTEM_NAME)
    }

    /// The collision system, unless it was removed
    pub fn collision_mut(&mut self) -> Option<&mut CollisionSystem> {
        self.scheduler.get_system_mut::<CollisionSystem>(COLLISION_SYSTEM_NAME)
    }

    /// Register a collision handler; returns false if the collision system
    /// was removed
    pub fn on_collision<F>(&mut self, event_type: impl Into<String>, handler: F) -> bool
    where
        F: FnMut(&CollisionEvent) -> HandlerResult + Send + Sync + 'static,
    {
        match self.collision_mut() {
            Some(collision) => {
                collision.register_collision_handler(event_type, handler);
                true
            }
            None => false,
        }
    }

    /// Forward a key press or release to the input system
    pub fn inject_input(&mut self, key: impl Into<String>, pressed: bool) {
        if let Some(input) = self.input_mut() {
            input.inject_input(key, pressed);
        }
    }

    /// Drop every entity and held key, keeping systems and handlers
    pub fn reset_level(&mut self) {
        self.store.clear();
        if let Some(input) = self.input_mut() {
            input.clear_inputs();
        }
        log::info!("level reset");
    }

    /// Timing snapshot for every system
    pub fn performance_report(&self) -> PerformanceReport {
        self.scheduler.performance_report()
    }
}
