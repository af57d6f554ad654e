//! Independent heap allocations.
//!
//! The [`HeapStore`] is the last tier: nodes whose size fits neither the
//! raw list nor a cluster slot, and every node of a heap-mode context,
//! live here. Slots are recycled through a free list and validated with
//! the same generation stamps as the other tiers.

use crate::handle::{NodeHandle, NodeLocation};

struct HeapSlot<T> {
    generation: u32,
    node: Option<T>,
}

/// Generation-checked slot storage without capacity limits.
pub struct HeapStore<T> {
    slots: Vec<HeapSlot<T>>,
    free_list: Vec<u32>,
    live: usize,
}

impl<T> HeapStore<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }

    /// Store `node`, reusing a free slot when one exists.
    pub fn alloc(&mut self, node: T, generation: u32) -> NodeHandle {
        let slot = HeapSlot {
            generation,
            node: Some(node),
        };
        let index = if let Some(reuse) = self.free_list.pop() {
            self.slots[reuse as usize] = slot;
            reuse
        } else {
            self.slots.push(slot);
            (self.slots.len() - 1) as u32
        };
        self.live += 1;
        NodeHandle::new(generation, NodeLocation::Heap { slot: index })
    }

    /// Take the node behind `handle` and recycle its slot.
    pub fn free(&mut self, handle: NodeHandle) -> Option<T> {
        let NodeLocation::Heap { slot } = handle.location else {
            return None;
        };
        let entry = self.slots.get_mut(slot as usize)?;
        if entry.generation != handle.generation {
            return None;
        }
        let node = entry.node.take()?;
        self.free_list.push(slot);
        self.live -= 1;
        Some(node)
    }

    /// Shared access to a live node.
    pub fn get(&self, handle: NodeHandle) -> Option<&T> {
        let NodeLocation::Heap { slot } = handle.location else {
            return None;
        };
        let entry = self.slots.get(slot as usize)?;
        if entry.generation != handle.generation {
            return None;
        }
        entry.node.as_ref()
    }

    /// Mutable access to a live node.
    pub fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut T> {
        let NodeLocation::Heap { slot } = handle.location else {
            return None;
        };
        let entry = self.slots.get_mut(slot as usize)?;
        if entry.generation != handle.generation {
            return None;
        }
        entry.node.as_mut()
    }

    /// Drop every node.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.live = 0;
    }

    /// Drop every node and release slot storage.
    pub fn purge(&mut self) {
        self.clear();
        self.slots.shrink_to_fit();
        self.free_list.shrink_to_fit();
    }

    /// Number of live nodes.
    pub fn live_count(&self) -> usize {
        self.live
    }
}

impl<T> Default for HeapStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
