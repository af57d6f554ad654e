//! Cluster chains: the slab tier of a tiered store.
//!
//! A [`ClusterPool`] keeps every cluster on exactly one of two doubly
//! linked chains. Clusters with at least one free slot are on the
//! *partial* chain; allocation always uses its tail, so it never scans.
//! A cluster that fills up moves to the *full* chain and comes back on
//! the first release. Emptied heap clusters are released outright; the
//! optional embedded base cluster is only ever reset.

use kv3_core::fatal::fatal;

use crate::cluster::Cluster;
use crate::handle::{NodeHandle, NodeLocation};

#[derive(Clone, Copy, Debug, Default)]
struct Chain {
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ChainKind {
    Partial,
    Full,
}

/// Slab allocator built from chained fixed-capacity clusters.
pub struct ClusterPool<T> {
    /// Cluster storage; released clusters leave a `None` hole.
    clusters: Vec<Option<Cluster<T>>>,
    /// Holes in `clusters` available for the next new cluster.
    vacant: Vec<u32>,
    partial: Chain,
    full: Chain,
    cluster_size: u16,
    embedded: bool,
}

impl<T> ClusterPool<T> {
    /// Create a pool of clusters holding `cluster_size` nodes each.
    ///
    /// With `embedded`, cluster 0 is created up front, never released,
    /// and reset on purge.
    pub fn new(cluster_size: u16, embedded: bool) -> Self {
        let mut pool = Self {
            clusters: Vec::new(),
            vacant: Vec::new(),
            partial: Chain::default(),
            full: Chain::default(),
            cluster_size: cluster_size.max(1),
            embedded,
        };
        if embedded {
            pool.clusters.push(Some(Cluster::new(pool.cluster_size, true)));
            pool.link(ChainKind::Partial, 0);
        }
        pool
    }

    /// Allocate a slot for `node` from the partial chain's tail.
    pub fn alloc(&mut self, node: T, generation: u32) -> NodeHandle {
        let index = match self.partial.tail {
            Some(index) => index,
            None => self.new_cluster(),
        };
        let Some(cluster) = self.cluster_mut(index) else {
            fatal("cluster chain references a released cluster");
        };
        let Some(slot) = cluster.alloc(node, generation) else {
            fatal("partial cluster chain holds a full cluster");
        };
        if cluster.is_full() {
            self.unlink(ChainKind::Partial, index);
            self.link(ChainKind::Full, index);
        }
        NodeHandle::new(
            generation,
            NodeLocation::Cluster {
                cluster: index,
                slot,
            },
        )
    }

    /// Release the node behind `handle`.
    ///
    /// Returns `None` for handles that are stale or not cluster handles.
    pub fn free(&mut self, handle: NodeHandle) -> Option<T> {
        let NodeLocation::Cluster {
            cluster: index,
            slot,
        } = handle.location
        else {
            return None;
        };
        let cluster = self.cluster_mut(index)?;
        let was_full = cluster.is_full();
        let node = cluster.free(slot, handle.generation)?;
        let release = cluster.is_empty() && !cluster.is_embedded();

        let chain = if was_full {
            ChainKind::Full
        } else {
            ChainKind::Partial
        };
        if release {
            self.unlink(chain, index);
            self.clusters[index as usize] = None;
            self.vacant.push(index);
            tracing::debug!(cluster = index, "released empty cluster");
        } else if was_full {
            self.unlink(ChainKind::Full, index);
            self.link(ChainKind::Partial, index);
        }
        Some(node)
    }

    /// Shared access to a live node.
    pub fn get(&self, handle: NodeHandle) -> Option<&T> {
        let NodeLocation::Cluster {
            cluster: index,
            slot,
        } = handle.location
        else {
            return None;
        };
        self.clusters
            .get(index as usize)?
            .as_ref()?
            .get(slot, handle.generation)
    }

    /// Mutable access to a live node.
    pub fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut T> {
        let NodeLocation::Cluster {
            cluster: index,
            slot,
        } = handle.location
        else {
            return None;
        };
        self.cluster_mut(index)?.get_mut(slot, handle.generation)
    }

    /// Drop every node, keep every cluster, and move all clusters to the
    /// partial chain.
    pub fn clear(&mut self) {
        for cluster in self.clusters.iter_mut().flatten() {
            cluster.clear();
        }
        while let Some(index) = self.full.tail {
            self.unlink(ChainKind::Full, index);
            self.link(ChainKind::Partial, index);
        }
    }

    /// Drop every node and release every non-embedded cluster.
    pub fn purge(&mut self) {
        let released = self.cluster_count() - usize::from(self.embedded);
        self.clusters.clear();
        self.vacant.clear();
        self.partial = Chain::default();
        self.full = Chain::default();
        if self.embedded {
            self.clusters
                .push(Some(Cluster::new(self.cluster_size, true)));
            self.link(ChainKind::Partial, 0);
        }
        tracing::debug!(released, "purged cluster pool");
    }

    /// Number of clusters currently allocated.
    pub fn cluster_count(&self) -> usize {
        self.clusters.iter().flatten().count()
    }

    /// Number of clusters on the partial chain.
    pub fn partial_len(&self) -> usize {
        self.partial.len
    }

    /// Number of clusters on the full chain.
    pub fn full_len(&self) -> usize {
        self.full.len
    }

    /// Number of live nodes across all clusters.
    pub fn live_count(&self) -> usize {
        self.clusters.iter().flatten().map(Cluster::count).sum()
    }

    /// Nodes per cluster.
    pub fn cluster_size(&self) -> u16 {
        self.cluster_size
    }

    fn new_cluster(&mut self) -> u32 {
        let cluster = Cluster::new(self.cluster_size, false);
        let index = match self.vacant.pop() {
            Some(index) => {
                self.clusters[index as usize] = Some(cluster);
                index
            }
            None => {
                self.clusters.push(Some(cluster));
                (self.clusters.len() - 1) as u32
            }
        };
        self.link(ChainKind::Partial, index);
        tracing::debug!(
            cluster = index,
            size = self.cluster_size,
            "allocated heap cluster"
        );
        index
    }

    fn cluster_mut(&mut self, index: u32) -> Option<&mut Cluster<T>> {
        self.clusters.get_mut(index as usize)?.as_mut()
    }

    fn chain_mut(&mut self, kind: ChainKind) -> &mut Chain {
        match kind {
            ChainKind::Partial => &mut self.partial,
            ChainKind::Full => &mut self.full,
        }
    }

    /// Append cluster `index` at the tail of a chain.
    fn link(&mut self, kind: ChainKind, index: u32) {
        let old_tail = self.chain_mut(kind).tail;
        if let Some(cluster) = self.cluster_mut(index) {
            cluster.prev = old_tail;
            cluster.next = None;
        }
        match old_tail {
            Some(tail) => {
                if let Some(cluster) = self.cluster_mut(tail) {
                    cluster.next = Some(index);
                }
            }
            None => self.chain_mut(kind).head = Some(index),
        }
        let chain = self.chain_mut(kind);
        chain.tail = Some(index);
        chain.len += 1;
    }

    /// Remove cluster `index` from a chain.
    fn unlink(&mut self, kind: ChainKind, index: u32) {
        let (prev, next) = match self.cluster_mut(index) {
            Some(cluster) => (cluster.prev.take(), cluster.next.take()),
            None => return,
        };
        match prev {
            Some(p) => {
                if let Some(cluster) = self.cluster_mut(p) {
                    cluster.next = next;
                }
            }
            None => self.chain_mut(kind).head = next,
        }
        match next {
            Some(n) => {
                if let Some(cluster) = self.cluster_mut(n) {
                    cluster.prev = prev;
                }
            }
            None => self.chain_mut(kind).tail = prev,
        }
        self.chain_mut(kind).len -= 1;
    }
}
