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
//! System execution framework
//!
//! Systems contain the logic that operates on entities and components.
//! Each system declares the component kinds it needs; the provided
//! [`System::update`] queries the store for matching entities and hands
//! them to [`System::process`].

use crate::ecs::{ComponentKind, EntityId, EntityStore};
use serde::Serialize;
use std::any::Any;
use std::time::{Duration, Instant};

/// Trait for per-frame units of work
///
/// Systems mutate only the component kinds they declare, with one documented
/// exception: the input system writes `Input::current_intent`, which the
/// movement system reads.
pub trait System: Send + Sync + Any {
    /// Unique name, used for lookup and diagnostics
    fn name(&self) -> &str;

    /// Component kinds an entity must have to be processed
    fn required_components(&self) -> &[ComponentKind];

    /// Scheduling priority; lower values run earlier in the frame
    fn priority(&self) -> i32 {
        0
    }

    /// Per-entity logic for one frame
    ///
    /// `delta` is in seconds.
    fn process(&mut self, entities: &[EntityId], store: &mut EntityStore, delta: f64);

    /// Query matching entities and process them
    ///
    /// Returns the wall-clock time spent in `process`; the query is not
    /// included.
    fn update(&mut self, store: &mut EntityStore, delta: f64) -> Duration {
        let entities = store.get_entities_with(self.required_components());
        let start = Instant::now();
        self.process(&entities, store, delta);
        start.elapsed()
    }

    /// Called once when the system is added to a scheduler
    fn on_added(&mut self) {}

    /// Called once when the system is removed from a scheduler
    fn on_removed(&mut self) {}

    /// System-specific diagnostic snapshot for debug overlays
    fn diagnostics(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    /// Allow downcasting to the concrete system type
    fn as_any(&self) -> &dyn Any;

    /// Allow mutable downcasting to the concrete system type
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Accumulated wall-clock timing for one system
///
/// Diagnostic only; nothing in the frame reads it back.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTiming {
    runs: u64,
    last: Duration,
    total: Duration,
    max: Duration,
}

impl SystemTiming {
    /// Record one run
    pub fn record(&mut self, elapsed: Duration) {
        self.runs += 1;
        self.last = elapsed;
        self.total += elapsed;
        self.max = self.max.max(elapsed);
    }

    /// Number of recorded runs
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// Duration of the most recent run
    pub fn last(&self) -> Duration {
        self.last
    }

    /// Mean duration over all runs
    pub fn average(&self) -> Duration {
        if self.runs == 0 {
            Duration::ZERO
        } else {
            self.total.div_f64(self.runs as f64)
        }
    }

    /// Longest recorded run
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Forget all recorded runs
    pub fn reset(&mut self) {
        *self = SystemTiming::default();
    }
}

/// Snapshot of one system's scheduling state and timing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemMetrics {
    /// System name
    pub name: String,
    /// Scheduling priority
    pub priority: i32,
    /// Whether the system currently runs
    pub enabled: bool,
    /// Number of completed runs
    pub runs: u64,
    /// Most recent run time in milliseconds
    pub last_ms: f64,
    /// Mean run time in milliseconds
    pub average_ms: f64,
    /// Longest run time in milliseconds
    pub max_ms: f64,
}

impl SystemMetrics {
    pub(crate) fn new(name: &str, priority: i32, enabled: bool, timing: &SystemTiming) -> Self {
        SystemMetrics {
            name: name.to_string(),
            priority,
            enabled,
            runs: timing.runs(),
            last_ms: timing.last().as_secs_f64() * 1000.0,
            average_ms: timing.average().as_secs_f64() * 1000.0,
            max_ms: timing.max().as_secs_f64() * 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::Position;

    struct CountingSystem {
        seen: usize,
    }

    impl System for CountingSystem {
        fn name(&self) -> &str {
            "counting"
        }

        fn required_components(&self) -> &[ComponentKind] {
            &[ComponentKind::Position]
        }

        fn process(&mut self, entities: &[EntityId], _store: &mut EntityStore, _delta: f64) {
            self.seen += entities.len();
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_update_passes_matching_entities() {
        let mut store = EntityStore::new();
        let a = store.create_entity();
        store.add_component(a, Position::new(0.0, 0.0));
        store.create_entity();

        let mut system = CountingSystem { seen: 0 };
        let elapsed = system.update(&mut store, 0.016);
        assert_eq!(system.seen, 1);
        assert!(elapsed < Duration::from_secs(1));
        assert_eq!(system.priority(), 0);
        assert!(system.diagnostics().is_null());
    }

    #[test]
    fn test_timing_accumulates() {
        let mut timing = SystemTiming::default();
        assert_eq!(timing.average(), Duration::ZERO);

        timing.record(Duration::from_millis(2));
        timing.record(Duration::from_millis(4));

        assert_eq!(timing.runs(), 2);
        assert_eq!(timing.last(), Duration::from_millis(4));
        assert_eq!(timing.average(), Duration::from_millis(3));
        assert_eq!(timing.max(), Duration::from_millis(4));

        timing.reset();
        assert_eq!(timing.runs(), 0);
    }

    #[test]
    fn test_metrics_in_milliseconds() {
        let mut timing = SystemTiming::default();
        timing.record(Duration::from_micros(1500));
        let metrics = SystemMetrics::new("x", 3, true, &timing);
        assert!((metrics.last_ms - 1.5).abs() < 1e-9);
        assert_eq!(metrics.priority, 3);
    }
}
