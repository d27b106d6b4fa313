//! Entity Component System (ECS) core implementation
//!
//! This module provides the foundational ECS architecture including:
//! - Entity identity and the entity store
//! - A closed set of component kinds
//! - The system trait and the priority-ordered scheduler

mod entity;
mod component;
mod store;
mod system;

/// Concrete component types
pub mod components;

/// Priority-ordered system execution
pub mod scheduler;

pub use entity::EntityId;
pub use component::{Component, ComponentData, ComponentKind};
pub use store::{Entity, EntityStore, StoreError};
pub use system::{System, SystemMetrics, SystemTiming};
pub use scheduler::{PerformanceReport, Scheduler, SchedulerError};
