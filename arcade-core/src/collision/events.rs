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
//! Collision events and handler registry

use crate::ecs::EntityId;
use serde::Serialize;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Emitted when a player touches an unconsumed collectible
pub const PLAYER_COLLECT: &str = "player_collect";

/// Emitted when a vulnerable player touches an enemy
pub const PLAYER_ENEMY_CONTACT: &str = "player_enemy_contact";

/// A touching pair with gameplay meaning
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollisionEvent {
    /// First participant (the player for built-in events)
    pub entity_a: EntityId,
    /// Second participant
    pub entity_b: EntityId,
    /// Event type handlers are registered under
    pub event_type: String,
    /// Event-specific payload
    pub data: serde_json::Value,
}

impl CollisionEvent {
    /// Create an event
    pub fn new(
        entity_a: EntityId,
        entity_b: EntityId,
        event_type: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        CollisionEvent {
            entity_a,
            entity_b,
            event_type: event_type.into(),
            data,
        }
    }
}

/// Result returned by a handler; the error is logged and counted
pub type HandlerResult = Result<(), String>;

/// Callback invoked for every event of the type it was registered under
pub type CollisionHandler = Box<dyn FnMut(&CollisionEvent) -> HandlerResult + Send + Sync>;

/// Handlers grouped by event type, invoked in registration order
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Vec<CollisionHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler for an event type
    pub fn register(&mut self, event_type: impl Into<String>, handler: CollisionHandler) {
        self.handlers.entry(event_type.into()).or_default().push(handler);
    }

    /// Number of handlers for an event type
    pub fn count(&self, event_type: &str) -> usize {
        self.handlers.get(event_type).map_or(0, Vec::len)
    }

    /// Drop every handler
    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Invoke every handler for the event's type
    ///
    /// Errors and panics are logged and never escape. Returns the number of
    /// handlers that failed.
    pub fn dispatch(&mut self, event: &CollisionEvent) -> usize {
        let Some(handlers) = self.handlers.get_mut(&event.event_type) else {
            log::trace!("no handlers for {}", event.event_type);
            return 0;
        };

        let mut failures = 0;
        for handler in handlers.iter_mut() {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => {}
                Ok(Err(message)) => {
                    log::error!(
                        "{} handler failed for {} / {}: {}",
                        event.event_type,
                        event.entity_a,
                        event.entity_b,
                        message
                    );
                    failures += 1;
                }
                Err(panic) => {
                    let message = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    log::error!(
                        "{} handler panicked for {} / {}: {}",
                        event.event_type,
                        event.entity_a,
                        event.entity_b,
                        message
                    );
                    failures += 1;
                }
            }
        }
        failures
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&str, usize> = self
            .handlers
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &counts)
            .finish()
    }
}
