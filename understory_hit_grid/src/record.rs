// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stable-indexed widget records.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use hashbrown::HashMap;

use crate::types::{CellCoord, UserIndex};
use crate::widget::CustomHitTestPath;

/// Generational handle for a widget record.
///
/// A key stays valid until its record is removed; after that, lookups with it
/// fail even if the slot has been reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordKey(u32, u32);

impl RecordKey {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Record keys are 32-bit; a grid never holds 2^32 widgets."
    )]
    pub(crate) const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Everything the grid remembers about one widget.
pub struct WidgetRecord<K> {
    /// The widget key.
    pub widget: K,
    /// First covered cell.
    pub upper_left: CellCoord,
    /// Last covered cell, inclusive.
    pub lower_right: CellCoord,
    /// `(batch_priority, layer)` packed by [`crate::WidgetSort::primary`].
    pub primary_sort: i64,
    /// Tie breaker for equal primary keys.
    pub secondary_sort: i32,
    /// User the widget answers to.
    pub user: UserIndex,
    pub(crate) custom_path: Option<Weak<dyn CustomHitTestPath<K>>>,
}

impl<K> WidgetRecord<K> {
    /// The registered custom hit-test path, if one is set and still alive.
    pub fn custom_path(&self) -> Option<Rc<dyn CustomHitTestPath<K>>> {
        self.custom_path.as_ref().and_then(Weak::upgrade)
    }

    /// `(primary_sort, secondary_sort)`, ascending back to front.
    pub fn sort_key(&self) -> (i64, i32) {
        (self.primary_sort, self.secondary_sort)
    }

    pub(crate) fn covers(&self, upper_left: CellCoord, lower_right: CellCoord) -> bool {
        self.upper_left == upper_left && self.lower_right == lower_right
    }
}

impl<K: Debug> Debug for WidgetRecord<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WidgetRecord")
            .field("widget", &self.widget)
            .field("upper_left", &self.upper_left)
            .field("lower_right", &self.lower_right)
            .field("primary_sort", &self.primary_sort)
            .field("secondary_sort", &self.secondary_sort)
            .field("user", &self.user)
            .field("custom_path", &self.custom_path.is_some())
            .finish()
    }
}

struct Slot<K> {
    generation: u32,
    record: Option<WidgetRecord<K>>,
}

/// Slot arena of records plus a widget-to-key map.
pub(crate) struct RecordStore<K> {
    slots: Vec<Slot<K>>,
    free_list: Vec<usize>,
    by_widget: HashMap<K, RecordKey>,
}

impl<K: Debug> Debug for RecordStore<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RecordStore")
            .field("total_slots", &self.slots.len())
            .field("live", &self.by_widget.len())
            .finish_non_exhaustive()
    }
}

impl<K: Copy + Eq + Hash> RecordStore<K> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            by_widget: HashMap::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.by_widget.len()
    }

    pub(crate) fn key_of(&self, widget: &K) -> Option<RecordKey> {
        self.by_widget.get(widget).copied()
    }

    /// Store a record for a widget that has none.
    pub(crate) fn insert(&mut self, record: WidgetRecord<K>) -> RecordKey {
        debug_assert!(
            !self.by_widget.contains_key(&record.widget),
            "widget already has a record"
        );
        let widget = record.widget;
        let key = if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx];
            slot.generation = slot.generation.wrapping_add(1);
            slot.record = Some(record);
            RecordKey::new(idx, slot.generation)
        } else {
            self.slots.push(Slot {
                generation: 1,
                record: Some(record),
            });
            RecordKey::new(self.slots.len() - 1, 1)
        };
        self.by_widget.insert(widget, key);
        key
    }

    pub(crate) fn remove(&mut self, key: RecordKey) -> Option<WidgetRecord<K>> {
        let slot = self.slots.get_mut(key.idx())?;
        if slot.generation != key.1 {
            return None;
        }
        let record = slot.record.take()?;
        self.free_list.push(key.idx());
        self.by_widget.remove(&record.widget);
        Some(record)
    }

    pub(crate) fn get(&self, key: RecordKey) -> Option<&WidgetRecord<K>> {
        let slot = self.slots.get(key.idx())?;
        if slot.generation != key.1 {
            return None;
        }
        slot.record.as_ref()
    }

    pub(crate) fn get_mut(&mut self, key: RecordKey) -> Option<&mut WidgetRecord<K>> {
        let slot = self.slots.get_mut(key.idx())?;
        if slot.generation != key.1 {
            return None;
        }
        slot.record.as_mut()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (RecordKey, &WidgetRecord<K>)> + '_ {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.record
                .as_ref()
                .map(|r| (RecordKey::new(idx, slot.generation), r))
        })
    }

    /// Drop every record. Generations survive so old keys stay dead.
    pub(crate) fn clear(&mut self) {
        self.free_list.clear();
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            slot.record = None;
            self.free_list.push(idx);
        }
        self.by_widget.clear();
    }
}
