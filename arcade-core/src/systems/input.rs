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
//! Input system: raw key state to per-entity movement intent
//!
//! The system owns a key-state table fed by two paths only: events from an
//! attached [`InputDevice`] and [`InputSystem::inject_input`] calls (touch
//! buttons, gamepads, tests). Each frame it turns the table into a
//! normalized intent for every entity with `input` + `movement`, and eases
//! that entity's velocity toward `intent * max_speed`.

use crate::ecs::components::{Direction, Input, Intent, Movement};
use crate::ecs::scheduler::priorities;
use crate::ecs::{ComponentKind, EntityId, EntityStore, System};
use serde_json::json;
use std::any::Any;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thiserror::Error;

/// Name the input system registers under
pub const INPUT_SYSTEM_NAME: &str = "input";

/// Device attachment failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// The host has no usable input device (headless runs, tests)
    #[error("input device unavailable: {0}")]
    DeviceUnavailable(String),
}

/// A raw key transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Host-specific key identifier, e.g. `"ArrowUp"` or `"KeyW"`
    pub key: String,
    /// `true` for key-down, `false` for key-up
    pub pressed: bool,
}

impl KeyEvent {
    /// A key-down event
    pub fn down(key: impl Into<String>) -> Self {
        KeyEvent {
            key: key.into(),
            pressed: true,
        }
    }

    /// A key-up event
    pub fn up(key: impl Into<String>) -> Self {
        KeyEvent {
            key: key.into(),
            pressed: false,
        }
    }
}

/// Handle returned by [`InputDevice::attach`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Host-side source of key events
///
/// Implemented by whatever owns the real keyboard. The input system attaches
/// in `on_added` and detaches in `on_removed`.
pub trait InputDevice: Send + Sync {
    /// Start forwarding key events into `sink`
    fn attach(&mut self, sink: KeySink) -> Result<ListenerId, InputError>;

    /// Stop forwarding events for `listener`
    fn detach(&mut self, listener: ListenerId);
}

/// Channel a device pushes key events into
///
/// Cloneable and thread-safe. Once the owning system detaches, the sink is
/// disconnected and drops every further event, so a host that forgets to
/// release it cannot double-deliver input to a re-added system.
#[derive(Debug, Clone)]
pub struct KeySink {
    queue: Arc<Mutex<VecDeque<KeyEvent>>>,
    bound_keys: Arc<RwLock<HashSet<String>>>,
    connected: Arc<AtomicBool>,
}

impl KeySink {
    fn new() -> Self {
        KeySink {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            bound_keys: Arc::new(RwLock::new(HashSet::new())),
            connected: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Forward an event
    ///
    /// Returns `true` when the key is bound to a movement direction, in
    /// which case the host should suppress its default handling (page
    /// scrolling on arrow keys, for example).
    pub fn send(&self, event: KeyEvent) -> bool {
        if !self.is_connected() {
            return false;
        }
        let bound = self.is_bound(&event.key);
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(event);
        bound
    }

    /// Forward a key-down
    pub fn key_down(&self, key: impl Into<String>) -> bool {
        self.send(KeyEvent::down(key))
    }

    /// Forward a key-up
    pub fn key_up(&self, key: impl Into<String>) -> bool {
        self.send(KeyEvent::up(key))
    }

    /// Whether `key` is bound on any input entity as of the last update
    ///
    /// Until the first update this reports the default arrows and WASD keys.
    pub fn is_bound(&self, key: &str) -> bool {
        self.bound_keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    /// Whether the owning system still listens
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn drain(&self) -> Vec<KeyEvent> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    fn set_bound_keys(&self, keys: HashSet<String>) {
        *self.bound_keys.write().unwrap_or_else(PoisonError::into_inner) = keys;
    }
}

/// Translates key state into movement intent
pub struct InputSystem {
    key_state: HashMap<String, bool>,
    device: Option<Box<dyn InputDevice>>,
    listener: Option<ListenerId>,
    sink: Option<KeySink>,
    events_received: u64,
    last_entity_count: usize,
}

impl InputSystem {
    /// Create an input system driven only by [`inject_input`](Self::inject_input)
    pub fn new() -> Self {
        InputSystem {
            key_state: HashMap::new(),
            device: None,
            listener: None,
            sink: None,
            events_received: 0,
            last_entity_count: 0,
        }
    }

    /// Create an input system that listens to a host device once added
    pub fn with_device(device: Box<dyn InputDevice>) -> Self {
        let mut system = Self::new();
        system.device = Some(device);
        system
    }

    /// Set a key's pressed state directly
    ///
    /// Drives the system exactly like a device event would.
    pub fn inject_input(&mut self, key: impl Into<String>, pressed: bool) {
        self.key_state.insert(key.into(), pressed);
    }

    /// Release every key and discard queued device events
    pub fn clear_inputs(&mut self) {
        self.key_state.clear();
        if let Some(sink) = &self.sink {
            sink.drain();
        }
    }

    /// Whether a key is currently held
    pub fn is_pressed(&self, key: &str) -> bool {
        self.key_state.get(key).copied().unwrap_or(false)
    }

    /// Every held key, sorted
    pub fn pressed_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .key_state
            .iter()
            .filter(|(_, &pressed)| pressed)
            .map(|(key, _)| key.as_str())
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Whether a device listener is currently attached
    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    /// Compute the intent for one set of bindings
    ///
    /// Opposite directions cancel. Diagonals are normalized so they are no
    /// faster than a single axis.
    pub fn compute_intent(&self, input: &Input) -> Intent {
        let held = |direction: Direction| input.keys_for(direction).any(|key| self.is_pressed(key));

        let mut x = 0.0;
        let mut y = 0.0;
        if held(Direction::Left) {
            x -= 1.0;
        }
        if held(Direction::Right) {
            x += 1.0;
        }
        if held(Direction::Up) {
            y -= 1.0;
        }
        if held(Direction::Down) {
            y += 1.0;
        }

        if x != 0.0 && y != 0.0 {
            let len = f64::hypot(x, y);
            x /= len;
            y /= len;
        }

        Intent {
            x,
            y,
            has_input: x != 0.0 || y != 0.0,
        }
    }

    /// Publish the keys bound in `store` to the device sink
    ///
    /// Runs at the start of every update. Hosts that spawn entities with
    /// custom bindings can call it to refresh the set before the first frame.
    pub fn publish_bound_keys(&self, store: &EntityStore) {
        if let Some(sink) = &self.sink {
            sink.set_bound_keys(bound_keys(store).into_iter().collect());
        }
    }

    fn drain_device_events(&mut self) {
        let Some(sink) = &self.sink else {
            return;
        };
        let events = sink.drain();
        self.events_received += events.len() as u64;
        for event in events {
            self.key_state.insert(event.key, event.pressed);
        }
    }
}

impl Default for InputSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for InputSystem {
    fn name(&self) -> &str {
        INPUT_SYSTEM_NAME
    }

    fn required_components(&self) -> &[ComponentKind] {
        &[ComponentKind::Input, ComponentKind::Movement]
    }

    fn priority(&self) -> i32 {
        priorities::INPUT
    }

    fn process(&mut self, entities: &[EntityId], store: &mut EntityStore, delta: f64) {
        self.publish_bound_keys(store);
        self.drain_device_events();
        self.last_entity_count = entities.len();

        for &id in entities {
            let intent = match store.get::<Input>(id) {
                Some(input) => self.compute_intent(input),
                None => continue,
            };

            if let Some(input) = store.get_mut::<Input>(id) {
                input.current_intent = intent;
            }

            if !intent.has_input {
                continue;
            }

            if let Some(movement) = store.get_mut::<Movement>(id) {
                let target = intent.as_vec() * movement.max_speed;
                let t = (movement.acceleration * delta).clamp(0.0, 1.0);
                let velocity = movement.velocity.lerp(target, t);
                if velocity.is_valid() {
                    movement.velocity = velocity;
                } else {
                    log::warn!("input produced invalid velocity for {}, leaving unchanged", id);
                }
            }
        }
    }

    fn on_added(&mut self) {
        let Some(device) = self.device.as_mut() else {
            log::debug!("input system has no device, relying on injected input");
            return;
        };

        // Never hold two listeners at once
        if let (Some(listener), Some(sink)) = (self.listener.take(), self.sink.take()) {
            sink.disconnect();
            device.detach(listener);
        }

        let sink = KeySink::new();
        sink.set_bound_keys(
            Input::arrows_and_wasd()
                .bound_keys()
                .map(str::to_string)
                .collect(),
        );
        match device.attach(sink.clone()) {
            Ok(listener) => {
                log::info!("input device attached ({:?})", listener);
                self.listener = Some(listener);
                self.sink = Some(sink);
            }
            Err(err) => {
                log::warn!("{}; continuing with injected input only", err);
                sink.disconnect();
            }
        }
    }

    fn on_removed(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.disconnect();
        }
        if let Some(listener) = self.listener.take() {
            if let Some(device) = self.device.as_mut() {
                device.detach(listener);
            }
            log::info!("input device detached ({:?})", listener);
        }
    }

    fn diagnostics(&self) -> serde_json::Value {
        json!({
            "pressed_keys": self.pressed_keys(),
            "listening": self.is_listening(),
            "events_received": self.events_received,
            "entities": self.last_entity_count,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Keys bound on any input entity in `store`, sorted
pub fn bound_keys(store: &EntityStore) -> BTreeSet<String> {
    store
        .get_entities_with(&[ComponentKind::Input])
        .into_iter()
        .filter_map(|id| store.get::<Input>(id))
        .flat_map(|input| input.bound_keys().map(str::to_string))
        .collect()
}
