//! Slot Registry - Index allocation with a free pool.
//!
//! Manages storage for nodes and components:
//! - Dense slot vector addressed by index
//! - Free index pool for O(1) reuse
//! - Per-slot generation so a released id never resolves to the slot's next tenant
//!
//! Invokers hold ids across user callbacks that may destroy components, so a
//! stale id must fail lookups instead of aliasing a reused slot.

use std::fmt;

// =============================================================================
// Ids
// =============================================================================

/// Generational slot id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawId {
    index: u32,
    generation: u32,
}

impl RawId {
    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Handle to a node in a [`Scene`](super::Scene).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(RawId);

/// Handle to a component in a [`Scene`](super::Scene).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(RawId);

impl NodeId {
    pub fn from_raw(raw: RawId) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> RawId {
        self.0
    }
}

impl ComponentId {
    pub fn from_raw(raw: RawId) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> RawId {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "comp#{}", self.0)
    }
}

// =============================================================================
// Registry
// =============================================================================

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot arena with index reuse.
pub struct Registry<T> {
    slots: Vec<Slot<T>>,
    free_indices: Vec<u32>,
    len: usize,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_indices: Vec::new(),
            len: 0,
        }
    }

    /// Store a value, reusing a freed index when one is available.
    pub fn insert(&mut self, value: T) -> RawId {
        self.len += 1;

        if let Some(index) = self.free_indices.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return RawId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        RawId {
            index,
            generation: 0,
        }
    }

    /// Release a slot back to the pool.
    ///
    /// Bumps the slot generation so outstanding ids stop resolving.
    pub fn remove(&mut self, id: RawId) -> Option<T> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_indices.push(id.index);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, id: RawId) -> Option<&T> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, id: RawId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    pub fn contains(&self, id: RawId) -> bool {
        self.get(id).is_some()
    }

    /// Count of live values.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Highest index that would be allocated next if the pool is empty.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Ids of all live values, in index order.
    pub fn ids(&self) -> Vec<RawId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.value.is_some())
            .map(|(index, slot)| RawId {
                index: index as u32,
                generation: slot.generation,
            })
            .collect()
    }

    /// Drop every value and reset allocation.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_indices.clear();
        self.len = 0;
    }
}
