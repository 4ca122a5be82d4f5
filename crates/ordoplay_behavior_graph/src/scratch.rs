// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-node ephemeral state.
//!
//! Each node kind keeps its run state (cached lookups, timer handles,
//! observer ids) in its own type; the store holds at most one value per
//! type. The graph clears every store on start and stop.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Typed scratch store, one slot per value type
#[derive(Default)]
pub struct Scratch {
    slots: HashMap<TypeId, Box<dyn Any>>,
}

impl Scratch {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value of type `T`
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.slots
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_ref::<T>())
    }

    /// Get the value of type `T` mutably
    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.slots
            .get_mut(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_mut::<T>())
    }

    /// Store a value, returning the previous value of the same type
    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        self.slots
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Remove and return the value of type `T`
    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.slots
            .remove(&TypeId::of::<T>())
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Check if a value of type `T` is stored
    pub fn contains<T: 'static>(&self) -> bool {
        self.slots.contains_key(&TypeId::of::<T>())
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop every stored value
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

impl fmt::Debug for Scratch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scratch").field("len", &self.slots.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Counter(u32);

    #[derive(Debug, PartialEq)]
    struct Label(&'static str);

    #[test]
    fn test_one_slot_per_type() {
        let mut scratch = Scratch::new();
        assert!(scratch.insert(Counter(1)).is_none());
        scratch.insert(Label("cached"));

        assert_eq!(scratch.insert(Counter(2)), Some(Counter(1)));
        assert_eq!(scratch.len(), 2);

        if let Some(counter) = scratch.get_mut::<Counter>() {
            counter.0 += 1;
        }
        assert_eq!(scratch.get::<Counter>(), Some(&Counter(3)));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut scratch = Scratch::new();
        scratch.insert(Counter(7));
        scratch.insert(Label("x"));

        assert_eq!(scratch.remove::<Counter>(), Some(Counter(7)));
        assert!(!scratch.contains::<Counter>());

        scratch.clear();
        assert!(scratch.is_empty());
        assert!(scratch.get::<Label>().is_none());
    }
}
