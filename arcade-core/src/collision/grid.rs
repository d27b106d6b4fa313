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
//! Uniform spatial grid for the broad phase
//!
//! The grid is rebuilt from scratch every frame. An entity is inserted into
//! every cell its bounding box touches, so two circles that overlap always
//! share at least one cell. Candidate pairs are collected per cell and
//! merged into an ordered set; with the `parallel` feature the per-cell work
//! runs on the rayon pool and produces the same set.
//!
//! A circle whose bounding box spans more than [`MAX_SPAN_CELLS`] cells on
//! either axis is kept out of the cells and paired with every other
//! inserted entity instead.

use crate::ecs::components::{Collision, Position};
use crate::ecs::{ComponentKind, EntityId, EntityStore};
use std::collections::{BTreeSet, HashMap};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Integer cell coordinates
pub type CellKey = (i64, i64);

/// Unordered entity pair, stored as (lower id, higher id)
pub type CandidatePair = (EntityId, EntityId);

/// Widest bounding box, in cells per axis, that is rasterized into the grid
pub const MAX_SPAN_CELLS: i64 = 32;

/// Uniform grid of square cells
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<EntityId>>,
    oversized: Vec<EntityId>,
    inserted: Vec<EntityId>,
}

impl SpatialGrid {
    /// Create an empty grid
    ///
    /// # Panics
    ///
    /// Panics if `cell_size` is not a positive finite number.
    pub fn new(cell_size: f64) -> Self {
        assert!(
            cell_size.is_finite() && cell_size > 0.0,
            "Cell size must be positive"
        );
        SpatialGrid {
            cell_size,
            cells: HashMap::new(),
            oversized: Vec::new(),
            inserted: Vec::new(),
        }
    }

    /// Side length of a cell
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Change the cell size, dropping current contents
    ///
    /// # Panics
    ///
    /// Panics if `cell_size` is not a positive finite number.
    pub fn set_cell_size(&mut self, cell_size: f64) {
        assert!(
            cell_size.is_finite() && cell_size > 0.0,
            "Cell size must be positive"
        );
        self.cell_size = cell_size;
        self.clear();
    }

    /// Remove every entity
    pub fn clear(&mut self) {
        self.cells.clear();
        self.oversized.clear();
        self.inserted.clear();
    }

    /// Cell index containing a coordinate
    pub fn cell_index(&self, coordinate: f64) -> i64 {
        (coordinate / self.cell_size).floor() as i64
    }

    /// Insert a circle into every cell its bounding box touches
    ///
    /// Returns false, inserting nothing, for non-finite input. Circles wider
    /// than [`MAX_SPAN_CELLS`] go to the oversized list rather than the cells.
    pub fn insert(&mut self, id: EntityId, x: f64, y: f64, radius: f64) -> bool {
        if !(x.is_finite() && y.is_finite() && radius.is_finite()) {
            log::debug!("skipping {} in spatial grid: non-finite bounds", id);
            return false;
        }
        let radius = radius.abs();
        let (min_cx, max_cx) = (self.cell_index(x - radius), self.cell_index(x + radius));
        let (min_cy, max_cy) = (self.cell_index(y - radius), self.cell_index(y + radius));
        self.inserted.push(id);

        if max_cx.saturating_sub(min_cx) >= MAX_SPAN_CELLS
            || max_cy.saturating_sub(min_cy) >= MAX_SPAN_CELLS
        {
            log::trace!("{} spans too many cells, pairing it with everything", id);
            self.oversized.push(id);
            return true;
        }

        for cx in min_cx..=max_cx {
            for cy in min_cy..=max_cy {
                self.cells.entry((cx, cy)).or_default().push(id);
            }
        }
        true
    }

    /// Clear and re-insert every entity with `position` + `collision`
    ///
    /// Returns the number of entities inserted.
    pub fn rebuild(&mut self, store: &EntityStore, entities: &[EntityId]) -> usize {
        self.clear();
        let mut inserted = 0;
        for &id in entities {
            let (Some(position), Some(collision)) =
                (store.get::<Position>(id), store.get::<Collision>(id))
            else {
                continue;
            };
            if self.insert(id, position.x, position.y, collision.radius) {
                inserted += 1;
            }
        }
        inserted
    }

    /// Clear and re-insert every active collider in the store
    pub fn rebuild_from_store(&mut self, store: &EntityStore) -> usize {
        let entities =
            store.get_entities_with(&[ComponentKind::Position, ComponentKind::Collision]);
        self.rebuild(store, &entities)
    }

    /// Entities in a cell, in insertion order
    pub fn entities_in(&self, cell: CellKey) -> &[EntityId] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of entities kept out of the cells for their size
    pub fn oversized_count(&self) -> usize {
        self.oversized.len()
    }

    /// Largest number of entities sharing one cell
    pub fn max_occupancy(&self) -> usize {
        self.cells.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Every unordered pair of entities sharing at least one cell
    ///
    /// Oversized entities pair with every other inserted entity.
    pub fn candidate_pairs(&self) -> BTreeSet<CandidatePair> {
        let mut pairs = self.cell_pairs();
        for &big in &self.oversized {
            for &other in &self.inserted {
                if big != other {
                    pairs.insert(if big < other { (big, other) } else { (other, big) });
                }
            }
        }
        pairs
    }

    fn cell_pairs(&self) -> BTreeSet<CandidatePair> {
        #[cfg(feature = "parallel")]
        {
            self.cells
                .par_iter()
                .fold(BTreeSet::new, |mut pairs, (_, members)| {
                    collect_cell_pairs(members, &mut pairs);
                    pairs
                })
                .reduce(BTreeSet::new, |mut left, mut right| {
                    left.append(&mut right);
                    left
                })
        }

        #[cfg(not(feature = "parallel"))]
        {
            let mut pairs = BTreeSet::new();
            for members in self.cells.values() {
                collect_cell_pairs(members, &mut pairs);
            }
            pairs
        }
    }
}

fn collect_cell_pairs(members: &[EntityId], pairs: &mut BTreeSet<CandidatePair>) {
    for (i, &a) in members.iter().enumerate() {
        for &b in &members[i + 1..] {
            if a != b {
                pairs.insert(if a < b { (a, b) } else { (b, a) });
            }
        }
    }
}
