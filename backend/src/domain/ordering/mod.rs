//! Step ordering engine.
//!
//! Positions are 1-based and contiguous. Every mutation works on one
//! manual's sequence in memory, keeps it sorted, and reports exactly which
//! rows moved so adapters only write what changed. Sequences loaded with
//! gaps or duplicates are normalised on load and those corrections are
//! reported by the first mutation.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use super::{Step, StepId};

/// Item with a stable identity and a mutable 1-based position.
pub trait Ordered {
    type Id: Copy + Eq + Hash + Ord + fmt::Display + fmt::Debug;

    fn id(&self) -> Self::Id;
    fn order_number(&self) -> u32;
    fn set_order_number(&mut self, order_number: u32);
}

impl Ordered for Step {
    type Id = StepId;

    fn id(&self) -> StepId {
        self.id
    }

    fn order_number(&self) -> u32 {
        self.order_number
    }

    fn set_order_number(&mut self, order_number: u32) {
        self.order_number = order_number;
    }
}

/// One row whose position changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderChange<Id> {
    pub id: Id,
    pub from: u32,
    pub to: u32,
}

/// Failures raised by sequence mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderingError<Id: fmt::Display> {
    #[error("position {requested} is outside the valid range 1..={max}")]
    OutOfRange { requested: u32, max: u32 },
    #[error("{id} is not part of this sequence")]
    NotFound { id: Id },
    #[error("{reason}")]
    Conflict { reason: String },
}

/// Sorted, contiguous sequence plus the positions last persisted.
#[derive(Debug, Clone)]
pub struct OrderedSequence<T: Ordered> {
    items: Vec<T>,
    baseline: HashMap<T::Id, u32>,
}

impl<T: Ordered> OrderedSequence<T> {
    /// Build a sequence from stored rows.
    ///
    /// Rows are sorted by order number then id and renumbered `1..=N`. The
    /// stored numbers are kept as the baseline for change reporting.
    pub fn load(mut items: Vec<T>) -> Self {
        let baseline = items
            .iter()
            .map(|item| (item.id(), item.order_number()))
            .collect();
        items.sort_by_key(|item| (item.order_number(), item.id()));
        let mut sequence = Self { items, baseline };
        sequence.renumber_from(0);
        sequence
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Current 1-based position of `id`.
    pub fn position_of(&self, id: T::Id) -> Option<u32> {
        self.index_of(id).map(position_for)
    }

    /// Whether stored positions differ from the normalised ones.
    pub fn needs_normalisation(&self) -> bool {
        self.items
            .iter()
            .any(|item| self.baseline.get(&item.id()) != Some(&item.order_number()))
    }

    /// Shift existing rows to free a position for a row that has no id yet.
    ///
    /// `None` appends at `len + 1`. Returns the freed position and the rows
    /// that moved. The sequence keeps a gap until the caller persists the
    /// new row; use [`OrderedSequence::insert`] when the row already exists.
    pub fn open_slot(
        &mut self,
        requested: Option<u32>,
    ) -> Result<(u32, Vec<OrderChange<T::Id>>), OrderingError<T::Id>> {
        let max = position_for(self.items.len());
        let position = match requested {
            None => max,
            Some(position) if (1..=max).contains(&position) => position,
            Some(position) => {
                return Err(OrderingError::OutOfRange {
                    requested: position,
                    max,
                });
            }
        };
        for item in self.items.iter_mut().skip(index_for(position)) {
            item.set_order_number(item.order_number().saturating_add(1));
        }
        Ok((position, self.take_changes()))
    }

    /// Insert `item` at `requested` (or append), shifting later rows down.
    pub fn insert(
        &mut self,
        mut item: T,
        requested: Option<u32>,
    ) -> Result<Vec<OrderChange<T::Id>>, OrderingError<T::Id>> {
        if self.index_of(item.id()).is_some() {
            return Err(OrderingError::Conflict {
                reason: format!("{} is already part of this sequence", item.id()),
            });
        }
        let (position, changes) = self.open_slot(requested)?;
        item.set_order_number(position);
        self.baseline.insert(item.id(), position);
        self.items.insert(index_for(position), item);
        Ok(changes)
    }

    /// Remove `id`, closing the gap behind it.
    pub fn remove(&mut self, id: T::Id) -> Result<(T, Vec<OrderChange<T::Id>>), OrderingError<T::Id>> {
        let index = self.index_of(id).ok_or(OrderingError::NotFound { id })?;
        let removed = self.items.remove(index);
        self.baseline.remove(&id);
        self.renumber_from(index);
        Ok((removed, self.take_changes()))
    }

    /// Move `id` to `new_position`, shifting only the rows in between.
    pub fn reorder(
        &mut self,
        id: T::Id,
        new_position: u32,
    ) -> Result<Vec<OrderChange<T::Id>>, OrderingError<T::Id>> {
        let from = self.index_of(id).ok_or(OrderingError::NotFound { id })?;
        let max = position_for(self.items.len().saturating_sub(1));
        if !(1..=max).contains(&new_position) {
            return Err(OrderingError::OutOfRange {
                requested: new_position,
                max,
            });
        }
        let to = index_for(new_position);
        if from != to {
            let item = self.items.remove(from);
            self.items.insert(to, item);
            self.renumber_from(from.min(to));
        }
        Ok(self.take_changes())
    }

    /// Replace every position at once.
    ///
    /// `updates` must name each row exactly once and its positions must be
    /// a permutation of `1..=N`.
    pub fn apply_bulk(
        &mut self,
        updates: &[(T::Id, i64)],
    ) -> Result<Vec<OrderChange<T::Id>>, OrderingError<T::Id>> {
        let count = self.items.len();
        if updates.len() != count {
            return Err(conflict(format!(
                "expected {count} positions, got {}",
                updates.len()
            )));
        }

        let mut targets: HashMap<T::Id, u32> = HashMap::with_capacity(count);
        let mut seen_positions = HashSet::with_capacity(count);
        for (id, raw) in updates {
            if self.index_of(*id).is_none() {
                return Err(conflict(format!("{id} does not belong to this manual")));
            }
            let position = u32::try_from(*raw)
                .ok()
                .filter(|position| (1..=position_for(count.saturating_sub(1))).contains(position))
                .ok_or_else(|| conflict(format!("position {raw} is outside 1..={count}")))?;
            if !seen_positions.insert(position) {
                return Err(conflict(format!("position {position} is assigned twice")));
            }
            if targets.insert(*id, position).is_some() {
                return Err(conflict(format!("{id} is listed more than once")));
            }
        }

        for item in &mut self.items {
            if let Some(position) = targets.get(&item.id()) {
                item.set_order_number(*position);
            }
        }
        self.items.sort_by_key(Ordered::order_number);
        Ok(self.take_changes())
    }

    fn index_of(&self, id: T::Id) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    fn renumber_from(&mut self, start: usize) {
        for (index, item) in self.items.iter_mut().enumerate().skip(start) {
            item.set_order_number(position_for(index));
        }
    }

    /// Diff against the baseline, then adopt the current positions.
    fn take_changes(&mut self) -> Vec<OrderChange<T::Id>> {
        let changes = self
            .items
            .iter()
            .filter_map(|item| {
                let from = *self.baseline.get(&item.id())?;
                let to = item.order_number();
                (from != to).then_some(OrderChange {
                    id: item.id(),
                    from,
                    to,
                })
            })
            .collect();
        self.baseline = self
            .items
            .iter()
            .map(|item| (item.id(), item.order_number()))
            .collect();
        changes
    }
}

fn conflict<Id: fmt::Display>(reason: String) -> OrderingError<Id> {
    OrderingError::Conflict { reason }
}

fn position_for(index: usize) -> u32 {
    u32::try_from(index).map_or(u32::MAX, |value| value.saturating_add(1))
}

fn index_for(position: u32) -> usize {
    usize::try_from(position.saturating_sub(1)).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests;
