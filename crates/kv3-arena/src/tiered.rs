//! Two-tier node storage with heap fallback.
//!
//! A [`TieredStore`] routes each allocation to the raw node list, the
//! cluster pool, or the heap store, and hands out handles that the
//! other operations route back to the right tier. It also owns the
//! generation counter shared by all three tiers, so a handle can never
//! match a node allocated after it in any tier.

use crate::config::AllocationMode;
use crate::error::ArenaError;
use crate::handle::{NodeHandle, NodeLocation};
use crate::heap::HeapStore;
use crate::node::ClusterNode;
use crate::node_list::{NodeList, MIN_ENTRY_BYTES};
use crate::pool::ClusterPool;

/// Occupancy counters for one tiered store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TierStats {
    /// Live nodes in clusters.
    pub cluster_live: usize,
    /// Clusters currently allocated.
    pub clusters: usize,
    /// Clusters on the partial chain.
    pub partial_clusters: usize,
    /// Clusters on the full chain.
    pub full_clusters: usize,
    /// Live nodes in the raw node list.
    pub raw_live: usize,
    /// Raw bytes consumed.
    pub raw_used_bytes: usize,
    /// Raw bytes reserved.
    pub raw_allocated_bytes: usize,
    /// Live nodes in the heap store.
    pub heap_live: usize,
}

impl TierStats {
    /// Live nodes across all tiers.
    pub fn live(&self) -> usize {
        self.cluster_live + self.raw_live + self.heap_live
    }
}

/// Node storage for one node kind.
pub struct TieredStore<T> {
    mode: AllocationMode,
    pool: ClusterPool<T>,
    raw: NodeList<T>,
    heap: HeapStore<T>,
    generation: u32,
}

impl<T: ClusterNode> TieredStore<T> {
    /// Create a store whose clusters hold `cluster_size` nodes.
    pub fn new(mode: AllocationMode, cluster_size: u16, embedded: bool) -> Self {
        Self {
            mode,
            pool: ClusterPool::new(cluster_size, embedded && mode == AllocationMode::Clustered),
            raw: NodeList::new(),
            heap: HeapStore::new(),
            generation: 0,
        }
    }

    fn next_generation(&mut self) -> u32 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    /// Allocate a node built for `initial_size` elements.
    ///
    /// Raw list first when it has room for the exact byte requirement,
    /// then the cluster pool when `initial_size` fits a slot, then heap.
    pub fn alloc(&mut self, initial_size: usize) -> NodeHandle {
        let generation = self.next_generation();
        if self.mode == AllocationMode::Clustered {
            let needed = T::total_size_of(initial_size).max(MIN_ENTRY_BYTES);
            if self.raw.fits(needed) {
                match self.raw.alloc(initial_size, generation) {
                    Ok(handle) => return handle,
                    Err(err) => tracing::trace!(%err, "raw node list refused allocation"),
                }
            } else if initial_size <= T::DATA_SIZE {
                let node = T::construct(initial_size, T::total_size_of(T::DATA_SIZE));
                return self.pool.alloc(node, generation);
            }
            tracing::trace!(initial_size, "falling back to heap allocation");
        }
        let node = T::construct(initial_size, T::total_size_of(initial_size));
        self.heap.alloc(node, generation)
    }

    /// Release the node behind `handle` from whichever tier holds it.
    ///
    /// Raw entries keep their bytes until the next clear.
    pub fn free(&mut self, handle: NodeHandle) -> Option<T> {
        match handle.location {
            NodeLocation::Cluster { .. } => self.pool.free(handle),
            NodeLocation::Raw { .. } => self.raw.release(handle),
            NodeLocation::Heap { .. } => self.heap.free(handle),
        }
    }

    /// Shared access to a live node.
    pub fn get(&self, handle: NodeHandle) -> Option<&T> {
        match handle.location {
            NodeLocation::Cluster { .. } => self.pool.get(handle),
            NodeLocation::Raw { .. } => self.raw.get(handle),
            NodeLocation::Heap { .. } => self.heap.get(handle),
        }
    }

    /// Mutable access to a live node.
    pub fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut T> {
        match handle.location {
            NodeLocation::Cluster { .. } => self.pool.get_mut(handle),
            NodeLocation::Raw { .. } => self.raw.get_mut(handle),
            NodeLocation::Heap { .. } => self.heap.get_mut(handle),
        }
    }

    /// Like [`get`](Self::get), reporting stale handles as errors.
    pub fn try_get(&self, handle: NodeHandle) -> Result<&T, ArenaError> {
        self.get(handle).ok_or(ArenaError::StaleHandle { handle })
    }

    /// Move the node out of its slot, leaving `T::default()` behind.
    ///
    /// Used to operate on a node while the owner allocates or frees other
    /// nodes of the same kind; pair with [`restore`](Self::restore).
    pub fn take(&mut self, handle: NodeHandle) -> Option<T> {
        self.get_mut(handle).map(std::mem::take)
    }

    /// Put a node taken with [`take`](Self::take) back.
    ///
    /// Returns `false` if the slot no longer belongs to `handle`.
    pub fn restore(&mut self, handle: NodeHandle, node: T) -> bool {
        match self.get_mut(handle) {
            Some(slot) => {
                *slot = node;
                true
            }
            None => false,
        }
    }

    /// Grow the raw node list so that `bytes` are reserved.
    pub fn reserve_raw(&mut self, bytes: usize) -> Result<(), ArenaError> {
        self.raw.ensure_byte_size(bytes)
    }

    /// Drop every node in every tier, keeping clusters and reservations.
    pub fn clear(&mut self) {
        self.pool.clear();
        self.raw.clear();
        self.heap.clear();
    }

    /// Drop every node and release all non-embedded memory.
    pub fn purge(&mut self) {
        self.pool.purge();
        self.raw.purge();
        self.heap.purge();
    }

    /// Tier routing mode.
    pub fn mode(&self) -> AllocationMode {
        self.mode
    }

    /// Occupancy counters.
    pub fn stats(&self) -> TierStats {
        TierStats {
            cluster_live: self.pool.live_count(),
            clusters: self.pool.cluster_count(),
            partial_clusters: self.pool.partial_len(),
            full_clusters: self.pool.full_len(),
            raw_live: self.raw.live_count(),
            raw_used_bytes: self.raw.used_bytes(),
            raw_allocated_bytes: self.raw.allocated_bytes(),
            heap_live: self.heap.live_count(),
        }
    }
}
