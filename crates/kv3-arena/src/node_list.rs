//! Raw spillover storage for oversized arrays and tables.
//!
//! A [`NodeList`] is a bump allocator with byte accounting. Each entry
//! reserves `total_size_of(initial_size)` bytes plus a fixed per-entry
//! overhead. Releasing an entry tears down its contents but never
//! returns its bytes; space is reclaimed only when the whole list is
//! cleared.

use kv3_core::growth::{calc_new_buffer_size, ALLOC_NODE_LIST_MAX, ALLOC_NODE_LIST_MIN};

use crate::error::ArenaError;
use crate::handle::{NodeHandle, NodeLocation};
use crate::node::ClusterNode;

/// Bytes of bookkeeping charged to every entry.
pub const ENTRY_OVERHEAD: usize = 8;

/// Smallest byte requirement considered when placing a node.
pub const MIN_ENTRY_BYTES: usize = 32;

struct Entry<T> {
    generation: u32,
    node: Option<T>,
}

/// A growable bump arena of nodes.
pub struct NodeList<T> {
    entries: Vec<Entry<T>>,
    used_bytes: usize,
    allocated_bytes: usize,
}

impl<T: ClusterNode> NodeList<T> {
    /// Create an empty list with no reserved bytes.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            used_bytes: 0,
            allocated_bytes: 0,
        }
    }

    /// Grow the reservation so that at least `bytes_needed` bytes exist.
    ///
    /// Growth follows the shared buffer policy, bounded by
    /// [`ALLOC_NODE_LIST_MAX`].
    pub fn ensure_byte_size(&mut self, bytes_needed: usize) -> Result<(), ArenaError> {
        if bytes_needed <= self.allocated_bytes {
            return Ok(());
        }
        let new_size = calc_new_buffer_size(
            self.allocated_bytes,
            bytes_needed,
            ALLOC_NODE_LIST_MIN,
            ALLOC_NODE_LIST_MAX,
        );
        if new_size < bytes_needed {
            return Err(ArenaError::CapacityExceeded {
                requested: bytes_needed,
                capacity: ALLOC_NODE_LIST_MAX,
            });
        }
        if new_size != self.allocated_bytes {
            tracing::debug!(
                from = self.allocated_bytes,
                to = new_size,
                "grew raw node list"
            );
        }
        self.allocated_bytes = new_size;
        Ok(())
    }

    /// Whether a node needing `bytes` can be placed without growing.
    pub fn fits(&self, bytes: usize) -> bool {
        !self.is_full() && bytes <= self.free_bytes()
    }

    /// Bump-allocate a node built for `initial_size` elements.
    pub fn alloc(&mut self, initial_size: usize, generation: u32) -> Result<NodeHandle, ArenaError> {
        let entry_bytes = T::total_size_of(initial_size);
        let needed = self.used_bytes + entry_bytes + ENTRY_OVERHEAD;
        self.ensure_byte_size(needed)?;

        let node = T::construct(initial_size, entry_bytes);
        let entry = self.entries.len() as u32;
        self.entries.push(Entry {
            generation,
            node: Some(node),
        });
        self.used_bytes = needed;
        Ok(NodeHandle::new(generation, NodeLocation::Raw { entry }))
    }

    /// Take the node behind `handle`, leaving its bytes in place.
    pub fn release(&mut self, handle: NodeHandle) -> Option<T> {
        self.entry_mut(handle)?.node.take()
    }

    /// Shared access to a live node.
    pub fn get(&self, handle: NodeHandle) -> Option<&T> {
        let NodeLocation::Raw { entry } = handle.location else {
            return None;
        };
        let entry = self.entries.get(entry as usize)?;
        if entry.generation != handle.generation {
            return None;
        }
        entry.node.as_ref()
    }

    /// Mutable access to a live node.
    pub fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut T> {
        self.entry_mut(handle)?.node.as_mut()
    }

    fn entry_mut(&mut self, handle: NodeHandle) -> Option<&mut Entry<T>> {
        let NodeLocation::Raw { entry } = handle.location else {
            return None;
        };
        let entry = self.entries.get_mut(entry as usize)?;
        if entry.generation != handle.generation {
            return None;
        }
        Some(entry)
    }

    /// Drop every entry and rewind the bump cursor, keeping the
    /// reservation.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.used_bytes = 0;
    }

    /// Drop every entry and release the reservation.
    pub fn purge(&mut self) {
        self.clear();
        self.entries.shrink_to_fit();
        self.allocated_bytes = 0;
    }

    /// Bytes consumed by entries so far.
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    /// Bytes reserved.
    pub fn allocated_bytes(&self) -> usize {
        self.allocated_bytes
    }

    /// Reserved bytes not yet consumed.
    pub fn free_bytes(&self) -> usize {
        self.allocated_bytes - self.used_bytes
    }

    /// Whether the reservation is exhausted.
    pub fn is_full(&self) -> bool {
        self.used_bytes >= self.allocated_bytes
    }

    /// Number of entries whose node has not been released.
    pub fn live_count(&self) -> usize {
        self.entries.iter().filter(|e| e.node.is_some()).count()
    }

    /// Number of entries allocated since the last clear.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

impl<T: ClusterNode> Default for NodeList<T> {
    fn default() -> Self {
        Self::new()
    }
}
