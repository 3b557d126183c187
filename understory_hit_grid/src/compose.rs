// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grid ownership and composition.
//!
//! All grids live in a [`GridSet`]. A grid refers to the grids composed into it
//! by [`GridId`], which stops resolving once that grid is removed from the set.
//! Edges to removed grids are skipped by queries and dropped by
//! [`GridSet::purge_stale`].

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use hashbrown::HashSet;
use smallvec::SmallVec;

use crate::error::GridError;
use crate::grid::{AppendedGrid, HitTestGrid};

/// Generational handle for a grid in a [`GridSet`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GridId(u32, u32);

impl GridId {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Grid ids are 32-bit; a set never holds 2^32 grids."
    )]
    const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

struct Slot<K> {
    generation: u32,
    grid: Option<HitTestGrid<K>>,
}

/// Owner of every hit-test grid, and the entry point for queries.
///
/// Queries name a target grid and see it together with every grid composed
/// into it, transitively.
pub struct GridSet<K> {
    slots: Vec<Slot<K>>,
    free_list: Vec<usize>,
}

impl<K: Debug> Debug for GridSet<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let live = self.slots.iter().filter(|s| s.grid.is_some()).count();
        f.debug_struct("GridSet")
            .field("total_slots", &self.slots.len())
            .field("live", &live)
            .finish_non_exhaustive()
    }
}

impl<K: Copy + Eq + Hash + Debug> Default for GridSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Hash + Debug> GridSet<K> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Take ownership of a grid.
    pub fn insert(&mut self, grid: HitTestGrid<K>) -> GridId {
        if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx];
            slot.generation = slot.generation.wrapping_add(1);
            slot.grid = Some(grid);
            GridId::new(idx, slot.generation)
        } else {
            self.slots.push(Slot {
                generation: 1,
                grid: Some(grid),
            });
            GridId::new(self.slots.len() - 1, 1)
        }
    }

    /// Remove a grid, invalidating its id.
    ///
    /// Grids it was composed into keep a dead edge until purged.
    pub fn remove(&mut self, id: GridId) -> Option<HitTestGrid<K>> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        let grid = slot.grid.take()?;
        self.free_list.push(id.idx());
        tracing::debug!(?id, "hit-test grid removed");
        Some(grid)
    }

    /// Whether `id` refers to a live grid.
    pub fn contains(&self, id: GridId) -> bool {
        self.get(id).is_some()
    }

    /// Borrow a grid.
    pub fn get(&self, id: GridId) -> Option<&HitTestGrid<K>> {
        let slot = self.slots.get(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        slot.grid.as_ref()
    }

    /// Mutably borrow a grid.
    pub fn get_mut(&mut self, id: GridId) -> Option<&mut HitTestGrid<K>> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        slot.grid.as_mut()
    }

    /// Compose `other` into `target`.
    ///
    /// `other` must have an owner, differ from `target`, and cover the same
    /// area. Composition must keep the graph acyclic and must not make `other`
    /// reachable from `target` twice. Composing an already composed grid is a
    /// no-op.
    ///
    /// When `other` is not composable (self, ownerless, or a different area)
    /// any existing edge to it is removed before the error is returned. A
    /// rejected cycle leaves everything unchanged.
    pub fn add_grid(&mut self, target: GridId, other: GridId) -> Result<(), GridError> {
        let result = self.check_composable(target, other);
        if let Err(err) = result {
            tracing::warn!(?target, ?other, %err, "declined grid composition");
            if !matches!(err, GridError::Cycle) {
                self.remove_grid(target, other);
            }
            return result;
        }

        let (Some(target_grid), Some(other_grid)) = (self.get(target), self.get(other)) else {
            return Err(GridError::UnknownGrid);
        };
        if target_grid.appended.iter().any(|edge| edge.grid == other) {
            return Ok(());
        }
        let Some(owner) = other_grid.owner() else {
            return Err(GridError::MissingOwner);
        };

        if let Some(grid) = self.get_mut(target) {
            grid.appended.push(AppendedGrid { owner, grid: other });
        }
        tracing::debug!(?target, ?other, "composed hit-test grid");
        Ok(())
    }

    fn check_composable(&self, target: GridId, other: GridId) -> Result<(), GridError> {
        if target == other {
            return Err(GridError::SelfComposition);
        }
        let (Some(target_grid), Some(other_grid)) = (self.get(target), self.get(other)) else {
            return Err(GridError::UnknownGrid);
        };
        if other_grid.owner().is_none() {
            return Err(GridError::MissingOwner);
        }
        if target_grid.area() != other_grid.area() {
            return Err(GridError::AreaMismatch);
        }
        if target_grid.appended.iter().any(|edge| edge.grid == other) {
            return Ok(());
        }
        if self.reaches(target, other) || self.reaches(other, target) {
            return Err(GridError::Cycle);
        }
        Ok(())
    }

    /// Whether `to` is reachable from `from` through live composition edges.
    fn reaches(&self, from: GridId, to: GridId) -> bool {
        let mut visited: HashSet<GridId> = HashSet::new();
        let mut stack: SmallVec<[GridId; 8]> = SmallVec::new();
        stack.push(from);
        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            if !visited.insert(id) {
                continue;
            }
            if let Some(grid) = self.get(id) {
                stack.extend(grid.appended.iter().map(|edge| edge.grid));
            }
        }
        false
    }

    /// Remove the edge from `target` to `other`, if present.
    pub fn remove_grid(&mut self, target: GridId, other: GridId) -> bool {
        self.remove_edge_where(target, |edge| edge.grid == other)
    }

    /// Remove the edge from `target` to the grid owned by `owner`, if present.
    pub fn remove_grid_by_owner(&mut self, target: GridId, owner: &K) -> bool {
        self.remove_edge_where(target, |edge| edge.owner == *owner)
    }

    fn remove_edge_where(
        &mut self,
        target: GridId,
        pred: impl Fn(&AppendedGrid<K>) -> bool,
    ) -> bool {
        let Some(grid) = self.get_mut(target) else {
            return false;
        };
        let Some(pos) = grid.appended.iter().position(pred) else {
            return false;
        };
        grid.appended.remove(pos);
        true
    }

    /// Grids directly composed into `target`, live or not.
    pub fn composed_into(&self, target: GridId) -> impl Iterator<Item = GridId> + '_ {
        self.get(target)
            .into_iter()
            .flat_map(|grid| grid.appended.iter().map(|edge| edge.grid))
    }

    /// `target` followed by every grid composed into it, depth first.
    ///
    /// Each grid appears once. Dead edges and grids whose area no longer
    /// matches are skipped.
    pub fn collect_composed(&self, target: GridId) -> SmallVec<[GridId; 4]> {
        let mut out = SmallVec::new();
        if let Some(grid) = self.get(target) {
            self.collect_into(target, grid, &mut out);
        }
        out
    }

    fn collect_into(&self, id: GridId, grid: &HitTestGrid<K>, out: &mut SmallVec<[GridId; 4]>) {
        out.push(id);
        for edge in &grid.appended {
            let Some(child) = self.get(edge.grid) else {
                continue;
            };
            // Also reached through another path, or a cycle.
            if out.contains(&edge.grid) || child.area() != grid.area() {
                continue;
            }
            self.collect_into(edge.grid, child, out);
        }
    }

    /// Drop `target`'s edges to removed grids or grids whose area changed.
    ///
    /// Returns the number of edges removed.
    pub fn purge_stale(&mut self, target: GridId) -> usize {
        let Some(grid) = self.get(target) else {
            return 0;
        };
        let area = *grid.area();
        let stale: SmallVec<[GridId; 4]> = grid
            .appended
            .iter()
            .map(|edge| edge.grid)
            .filter(|&id| self.get(id).is_none_or(|g| *g.area() != area))
            .collect();
        if stale.is_empty() {
            return 0;
        }
        if let Some(grid) = self.get_mut(target) {
            grid.appended.retain(|edge| !stale.contains(&edge.grid));
        }
        tracing::debug!(?target, purged = stale.len(), "purged stale composed grids");
        stale.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Point, Size};

    fn owned_grid(owner: u32, size: f64) -> HitTestGrid<u32> {
        let mut grid = HitTestGrid::new();
        grid.set_area(Point::ORIGIN, Point::ORIGIN, Size::new(size, size));
        grid.set_owner(Some(owner));
        grid
    }

    #[test]
    fn rejects_self_unowned_and_mismatched() {
        let mut set = GridSet::new();
        let a = set.insert(owned_grid(1, 256.0));
        let mut unowned = owned_grid(2, 256.0);
        unowned.set_owner(None);
        let b = set.insert(unowned);
        let c = set.insert(owned_grid(3, 512.0));

        assert_eq!(set.add_grid(a, a), Err(GridError::SelfComposition));
        assert_eq!(set.add_grid(a, b), Err(GridError::MissingOwner));
        assert_eq!(set.add_grid(a, c), Err(GridError::AreaMismatch));
        assert_eq!(set.collect_composed(a).as_slice(), &[a]);
    }

    #[test]
    fn rejects_cycles_and_duplicate_paths() {
        let mut set = GridSet::new();
        let a = set.insert(owned_grid(1, 256.0));
        let b = set.insert(owned_grid(2, 256.0));
        let c = set.insert(owned_grid(3, 256.0));

        assert_eq!(set.add_grid(a, b), Ok(()));
        assert_eq!(set.add_grid(a, b), Ok(()));
        assert_eq!(set.add_grid(b, a), Err(GridError::Cycle));
        assert_eq!(set.add_grid(b, c), Ok(()));
        // `c` is already reachable from `a` through `b`.
        assert_eq!(set.add_grid(a, c), Err(GridError::Cycle));
        assert_eq!(set.add_grid(c, a), Err(GridError::Cycle));

        assert_eq!(set.collect_composed(a).as_slice(), &[a, b, c]);
        assert_eq!(set.composed_into(a).collect::<Vec<_>>(), [b]);
        assert_eq!(set.composed_into(b).collect::<Vec<_>>(), [c]);
    }

    #[test]
    fn declined_append_removes_existing_edge() {
        let mut set = GridSet::new();
        let a = set.insert(owned_grid(1, 256.0));
        let b = set.insert(owned_grid(2, 256.0));
        set.add_grid(a, b).unwrap();

        set.get_mut(b).unwrap().set_owner(None);
        assert_eq!(set.add_grid(a, b), Err(GridError::MissingOwner));
        assert_eq!(set.composed_into(a).count(), 0);
    }

    #[test]
    fn remove_by_grid_and_owner() {
        let mut set = GridSet::new();
        let a = set.insert(owned_grid(1, 256.0));
        let b = set.insert(owned_grid(2, 256.0));
        let c = set.insert(owned_grid(3, 256.0));
        set.add_grid(a, b).unwrap();
        set.add_grid(a, c).unwrap();

        assert!(set.remove_grid(a, b));
        assert!(!set.remove_grid(a, b));
        assert!(set.remove_grid_by_owner(a, &3));
        assert_eq!(set.collect_composed(a).as_slice(), &[a]);
    }

    #[test]
    fn stale_edges_are_skipped_then_purged() {
        let mut set = GridSet::new();
        let a = set.insert(owned_grid(1, 256.0));
        let b = set.insert(owned_grid(2, 256.0));
        let c = set.insert(owned_grid(3, 256.0));
        set.add_grid(a, b).unwrap();
        set.add_grid(a, c).unwrap();

        set.remove(b);
        set.get_mut(c)
            .unwrap()
            .set_area(Point::ORIGIN, Point::ORIGIN, Size::new(128.0, 128.0));
        assert_eq!(set.collect_composed(a).as_slice(), &[a]);
        assert_eq!(set.composed_into(a).count(), 2);

        assert_eq!(set.purge_stale(a), 2);
        assert_eq!(set.composed_into(a).count(), 0);
        assert_eq!(set.purge_stale(a), 0);
    }

    #[test]
    fn removed_ids_do_not_resolve_after_reuse() {
        let mut set = GridSet::new();
        let a = set.insert(owned_grid(1, 256.0));
        assert!(set.remove(a).is_some());
        let b = set.insert(owned_grid(2, 256.0));
        assert!(!set.contains(a));
        assert!(set.contains(b));
        assert_eq!(set.add_grid(b, a), Err(GridError::UnknownGrid));
    }
}
