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
//! Priority-ordered system scheduler
//!
//! The scheduler keeps its systems sorted by priority (lower first, ties in
//! insertion order) and runs them one after another every frame. Ordering is
//! part of correctness: state written by an earlier system is visible to
//! later systems in the same frame.

use crate::config::FrameConfig;
use crate::ecs::system::{SystemMetrics, SystemTiming};
use crate::ecs::{EntityStore, System};
use serde::Serialize;
use thiserror::Error;

/// Misuse reported by the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// A system with this name is already registered
    #[error("system '{0}' is already registered")]
    DuplicateSystem(String),
}

/// Standard priorities for the core systems
pub mod priorities {
    /// Device input to intent
    pub const INPUT: i32 = 0;

    /// Velocity integration and bounds
    pub const MOVEMENT: i32 = 10;

    /// Overlap detection and resolution
    pub const COLLISION: i32 = 20;
}

/// A system with scheduling state
struct ScheduledSystem {
    system: Box<dyn System>,
    enabled: bool,
    timing: SystemTiming,
}

/// Per-system timing snapshot for a debug overlay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    /// Number of completed `update` passes
    pub frame_count: u64,
    /// Sum of the most recent run times in milliseconds
    pub total_last_ms: f64,
    /// Metrics for each system in execution order
    pub systems: Vec<SystemMetrics>,
}

/// Runs systems in priority order once per frame
///
/// # Examples
///
/// ```
/// use arcade_core::ecs::scheduler::Scheduler;
/// use arcade_core::ecs::EntityStore;
/// use arcade_core::systems::MovementSystem;
///
/// let mut scheduler = Scheduler::new();
/// scheduler.add_system(MovementSystem::new()).unwrap();
///
/// let mut store = EntityStore::new();
/// scheduler.update(&mut store, 1.0 / 60.0);
/// assert_eq!(scheduler.frame_count(), 1);
/// ```
pub struct Scheduler {
    systems: Vec<ScheduledSystem>,
    frame: FrameConfig,
    frame_count: u64,
}

impl Scheduler {
    /// Create a new scheduler with default frame limits
    pub fn new() -> Self {
        Self::with_frame_config(FrameConfig::default())
    }

    /// Create a scheduler with explicit delta clamping limits
    pub fn with_frame_config(frame: FrameConfig) -> Self {
        Scheduler {
            systems: Vec::new(),
            frame,
            frame_count: 0,
        }
    }

    /// Add a system and call its `on_added` hook
    ///
    /// The list is re-sorted by priority with a stable sort, so systems with
    /// equal priority keep their insertion order. A duplicate name is
    /// rejected and the new system dropped without its hook being called.
    pub fn add_system<S: System>(&mut self, system: S) -> Result<(), SchedulerError> {
        self.add_boxed(Box::new(system))
    }

    /// Add an already boxed system
    pub fn add_boxed(&mut self, mut system: Box<dyn System>) -> Result<(), SchedulerError> {
        let name = system.name().to_string();
        if self.position_of(&name).is_some() {
            log::warn!("system '{}' is already registered, ignoring", name);
            return Err(SchedulerError::DuplicateSystem(name));
        }

        system.on_added();
        self.systems.push(ScheduledSystem {
            system,
            enabled: true,
            timing: SystemTiming::default(),
        });
        self.systems.sort_by_key(|s| s.system.priority());
        log::info!("added system '{}'", name);
        Ok(())
    }

    /// Remove a system by name, calling its `on_removed` hook first
    ///
    /// Returns whether a system with that name existed.
    pub fn remove_system(&mut self, name: &str) -> bool {
        match self.position_of(name) {
            Some(index) => {
                let mut scheduled = self.systems.remove(index);
                scheduled.system.on_removed();
                log::info!("removed system '{}'", name);
                true
            }
            None => {
                log::debug!("remove_system: no system named '{}'", name);
                false
            }
        }
    }

    /// Run every enabled system once, in priority order
    ///
    /// `delta` is in seconds and is passed through unchanged; use
    /// [`tick`](Self::tick) to apply the frame clamping policy.
    pub fn update(&mut self, store: &mut EntityStore, delta: f64) {
        for scheduled in &mut self.systems {
            if !scheduled.enabled {
                continue;
            }
            let elapsed = scheduled.system.update(store, delta);
            scheduled.timing.record(elapsed);
        }
        self.frame_count += 1;
    }

    /// Advance one host frame
    ///
    /// Non-finite or negative deltas are ignored. Large deltas are split into
    /// sub-steps no longer than `max_step`; anything beyond `max_substeps`
    /// sub-steps is dropped so a stalled tab does not replay seconds of
    /// simulation. Returns the number of sub-steps run.
    pub fn tick(&mut self, store: &mut EntityStore, delta: f64) -> u32 {
        if !delta.is_finite() || delta < 0.0 {
            log::warn!("ignoring invalid frame delta {}", delta);
            return 0;
        }

        let max_step = self.frame.max_step;
        let max_substeps = self.frame.max_substeps.max(1);
        let needed = (delta / max_step).ceil().max(1.0);

        let (steps, step) = if needed > f64::from(max_substeps) {
            log::debug!(
                "frame delta {:.3}s exceeds {} sub-steps, dropping {:.3}s",
                delta,
                max_substeps,
                delta - max_step * f64::from(max_substeps)
            );
            (max_substeps, max_step)
        } else {
            // needed is a small positive integer here
            let steps = needed as u32;
            (steps, delta / f64::from(steps))
        };

        for _ in 0..steps {
            self.update(store, step);
        }
        steps
    }

    /// Look up a system by name
    pub fn get_system(&self, name: &str) -> Option<&dyn System> {
        self.position_of(name)
            .map(|index| self.systems[index].system.as_ref())
    }

    /// Look up a system by name and downcast it to its concrete type
    pub fn get_system_mut<T: System>(&mut self, name: &str) -> Option<&mut T> {
        let index = self.position_of(name)?;
        self.systems[index].system.as_any_mut().downcast_mut::<T>()
    }

    /// Enable or disable a system; returns whether the system exists
    pub fn set_system_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.position_of(name) {
            Some(index) => {
                self.systems[index].enabled = enabled;
                log::debug!("system '{}' enabled = {}", name, enabled);
                true
            }
            None => {
                log::debug!("set_system_enabled: no system named '{}'", name);
                false
            }
        }
    }

    /// Whether a system exists and is enabled
    pub fn is_system_enabled(&self, name: &str) -> bool {
        self.position_of(name)
            .map_or(false, |index| self.systems[index].enabled)
    }

    /// Timing snapshot for one system
    pub fn system_metrics(&self, name: &str) -> Option<SystemMetrics> {
        self.position_of(name).map(|index| self.metrics_at(index))
    }

    /// Timing snapshot for every system, in execution order
    pub fn performance_report(&self) -> PerformanceReport {
        let systems: Vec<SystemMetrics> = (0..self.systems.len())
            .map(|index| self.metrics_at(index))
            .collect();
        let total_last_ms = systems.iter().map(|m| m.last_ms).sum();

        PerformanceReport {
            frame_count: self.frame_count,
            total_last_ms,
            systems,
        }
    }

    /// Disable every system
    ///
    /// A safety valve for fatal-error recovery; systems stay registered and
    /// can be re-enabled individually.
    pub fn emergency_shutdown(&mut self) {
        log::error!("emergency shutdown: disabling {} systems", self.systems.len());
        for scheduled in &mut self.systems {
            scheduled.enabled = false;
        }
    }

    /// Names of all systems in execution order
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.system.name()).collect()
    }

    /// Get the number of registered systems
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Number of completed `update` passes
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Remove every system, calling each `on_removed` hook
    pub fn clear(&mut self) {
        for mut scheduled in self.systems.drain(..) {
            scheduled.system.on_removed();
        }
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        self.systems.iter().position(|s| s.system.name() == name)
    }

    fn metrics_at(&self, index: usize) -> SystemMetrics {
        let scheduled = &self.systems[index];
        SystemMetrics::new(
            scheduled.system.name(),
            scheduled.system.priority(),
            scheduled.enabled,
            &scheduled.timing,
        )
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
