//! Entity store
//!
//! The store is the central container for all ECS data. It owns entity
//! identities and their components, and answers the "every active entity
//! with all of these kinds" query that each system runs per frame.

use crate::ecs::{Component, ComponentData, ComponentKind, EntityId};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Misuse reported by the store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// An explicit id was requested that is already in use
    #[error("entity id {0} is already in use")]
    DuplicateEntity(EntityId),
}

/// An entity record: identity, active flag, and components keyed by kind
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    active: bool,
    components: HashMap<ComponentKind, Component>,
}

impl Entity {
    fn new(id: EntityId) -> Self {
        Entity {
            id,
            active: true,
            components: HashMap::new(),
        }
    }

    /// The entity's id
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Whether queries include this entity
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the entity has a component of `kind`
    pub fn has(&self, kind: ComponentKind) -> bool {
        self.components.contains_key(&kind)
    }

    /// Whether the entity has every kind in `kinds`
    pub fn has_all(&self, kinds: &[ComponentKind]) -> bool {
        kinds.iter().all(|kind| self.components.contains_key(kind))
    }

    /// Typed component access
    pub fn get<T: ComponentData>(&self) -> Option<&T> {
        self.components.get(&T::KIND).and_then(T::from_component)
    }

    /// Iterate over all attached components
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }
}

/// The entity/component store shared by every system
///
/// Lookups on missing entities or components return `None` (or an empty
/// list); absence is an expected outcome, not an error.
///
/// # Examples
///
/// ```
/// use arcade_core::ecs::{EntityStore, ComponentKind};
/// use arcade_core::ecs::components::{Position, Movement};
///
/// let mut store = EntityStore::new();
/// let ship = store.create_entity();
/// store.add_component(ship, Position::new(0.0, 0.0));
/// store.add_component(ship, Movement::default());
///
/// let movers = store.get_entities_with(&[ComponentKind::Position, ComponentKind::Movement]);
/// assert_eq!(movers, vec![ship]);
/// ```
#[derive(Debug, Default)]
pub struct EntityStore {
    next_entity_id: u64,
    entities: BTreeMap<EntityId, Entity>,
}

impl EntityStore {
    /// Create a new empty store
    pub fn new() -> Self {
        EntityStore {
            next_entity_id: 0,
            entities: BTreeMap::new(),
        }
    }

    /// Create a new entity with an auto-allocated id
    pub fn create_entity(&mut self) -> EntityId {
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id += 1;

        self.entities.insert(id, Entity::new(id));
        log::trace!("created {}", id);
        id
    }

    /// Create a new entity with a caller-chosen id
    ///
    /// Rejects ids that are already in use; the existing entity is left
    /// untouched. Call [`clear`](Self::clear) first to reuse fixed ids across
    /// level resets.
    pub fn create_entity_with_id(&mut self, id: EntityId) -> Result<EntityId, StoreError> {
        if self.entities.contains_key(&id) {
            log::warn!("refusing to create {}: id already in use", id);
            return Err(StoreError::DuplicateEntity(id));
        }

        self.entities.insert(id, Entity::new(id));
        if id.raw() >= self.next_entity_id {
            self.next_entity_id = id.raw().saturating_add(1);
        }
        Ok(id)
    }

    /// Attach a component, replacing any existing component of the same kind
    ///
    /// Silently ignored if the entity does not exist, so gameplay code that
    /// removed an entity earlier in the frame cannot break later systems.
    /// Returns whether the component was stored.
    pub fn add_component(&mut self, id: EntityId, component: impl Into<Component>) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                let component = component.into();
                entity.components.insert(component.kind(), component);
                true
            }
            None => {
                log::debug!("add_component ignored: {} does not exist", id);
                false
            }
        }
    }

    /// Get a component by kind
    pub fn get_component(&self, id: EntityId, kind: ComponentKind) -> Option<&Component> {
        self.entities.get(&id)?.components.get(&kind)
    }

    /// Get a mutable component by kind
    pub fn get_component_mut(&mut self, id: EntityId, kind: ComponentKind) -> Option<&mut Component> {
        self.entities.get_mut(&id)?.components.get_mut(&kind)
    }

    /// Typed component access
    pub fn get<T: ComponentData>(&self, id: EntityId) -> Option<&T> {
        self.get_component(id, T::KIND).and_then(T::from_component)
    }

    /// Typed mutable component access
    pub fn get_mut<T: ComponentData>(&mut self, id: EntityId) -> Option<&mut T> {
        self.get_component_mut(id, T::KIND)
            .and_then(T::from_component_mut)
    }

    /// Check if an entity has a component of `kind`
    pub fn has_component(&self, id: EntityId, kind: ComponentKind) -> bool {
        self.entities
            .get(&id)
            .map_or(false, |entity| entity.has(kind))
    }

    /// Detach a component, returning it if it was present
    pub fn remove_component(&mut self, id: EntityId, kind: ComponentKind) -> Option<Component> {
        self.entities.get_mut(&id)?.components.remove(&kind)
    }

    /// Destroy an entity and all its components
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        match self.entities.remove(&id) {
            Some(_) => {
                log::trace!("removed {}", id);
                true
            }
            None => false,
        }
    }

    /// Every active entity that has all of `kinds`, in ascending id order
    ///
    /// An empty `kinds` list matches every active entity.
    pub fn get_entities_with(&self, kinds: &[ComponentKind]) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|entity| entity.active && entity.has_all(kinds))
            .map(|entity| entity.id)
            .collect()
    }

    /// Look up an entity record
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Check if an entity exists (active or not)
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Include or exclude an entity from queries
    pub fn set_active(&mut self, id: EntityId, active: bool) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.active = active;
                true
            }
            None => false,
        }
    }

    /// Whether an entity exists and is active
    pub fn is_active(&self, id: EntityId) -> bool {
        self.entities.get(&id).map_or(false, |entity| entity.active)
    }

    /// Get the number of entities, active or not
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Get the total number of attached components
    pub fn component_count(&self) -> usize {
        self.entities.values().map(|e| e.components.len()).sum()
    }

    /// Iterate over all entity ids in ascending order
    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Remove every entity and restart id allocation
    pub fn clear(&mut self) {
        self.entities.clear();
        self.next_entity_id = 0;
    }
}
