//! Fixed-capacity slabs with an intrusive free list.
//!
//! A [`Cluster`] owns `capacity` slots. Vacant slots are threaded into a
//! singly-linked free list through their `next_free` field, so both
//! allocation and release are O(1). Each occupied slot records the
//! generation stamp it was allocated with.

struct Slot<T> {
    generation: u32,
    node: Option<T>,
    next_free: Option<u16>,
}

/// A fixed-capacity pool of homogeneous nodes.
///
/// Clusters move between the partial and full chains of their
/// [`ClusterPool`](crate::pool::ClusterPool); the chain links live here.
pub struct Cluster<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u16>,
    count: u16,
    /// Embedded clusters are never released, only reset.
    embedded: bool,
    pub(crate) prev: Option<u32>,
    pub(crate) next: Option<u32>,
}

impl<T> Cluster<T> {
    /// Create a fresh cluster with every slot on the free list.
    pub fn new(capacity: u16, embedded: bool) -> Self {
        let mut cluster = Self {
            slots: Vec::with_capacity(capacity as usize),
            free_head: None,
            count: 0,
            embedded,
            prev: None,
            next: None,
        };
        for _ in 0..capacity {
            cluster.slots.push(Slot {
                generation: 0,
                node: None,
                next_free: None,
            });
        }
        cluster.rebuild_free_list();
        cluster
    }

    /// Pop the free-list head and store `node` there.
    ///
    /// Returns the slot index, or `None` if the cluster is full.
    pub fn alloc(&mut self, node: T, generation: u32) -> Option<u16> {
        let slot_index = self.free_head?;
        let slot = &mut self.slots[slot_index as usize];
        self.free_head = slot.next_free.take();
        slot.generation = generation;
        slot.node = Some(node);
        self.count += 1;
        Some(slot_index)
    }

    /// Release the node in `slot` and push the slot onto the free list.
    ///
    /// Returns `None` (and changes nothing) if the slot is vacant or was
    /// reallocated since `generation` was issued.
    pub fn free(&mut self, slot_index: u16, generation: u32) -> Option<T> {
        let slot = self.slots.get_mut(slot_index as usize)?;
        if slot.generation != generation {
            return None;
        }
        let node = slot.node.take()?;
        slot.next_free = self.free_head;
        self.free_head = Some(slot_index);
        self.count -= 1;
        Some(node)
    }

    /// Shared access to a live node.
    pub fn get(&self, slot_index: u16, generation: u32) -> Option<&T> {
        let slot = self.slots.get(slot_index as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.node.as_ref()
    }

    /// Mutable access to a live node.
    pub fn get_mut(&mut self, slot_index: u16, generation: u32) -> Option<&mut T> {
        let slot = self.slots.get_mut(slot_index as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.node.as_mut()
    }

    /// Drop every live node and rebuild the free list.
    ///
    /// Nodes are dropped wholesale; nothing is returned to callers, so
    /// children referenced by handles are not visited individually.
    /// Returns the number of nodes dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.count as usize;
        for slot in &mut self.slots {
            slot.node = None;
        }
        self.rebuild_free_list();
        self.count = 0;
        dropped
    }

    fn rebuild_free_list(&mut self) {
        let len = self.slots.len();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.next_free = if i + 1 < len {
                Some((i + 1) as u16)
            } else {
                None
            };
        }
        self.free_head = if len > 0 { Some(0) } else { None };
    }

    /// Number of live nodes.
    pub fn count(&self) -> usize {
        self.count as usize
    }

    /// Total slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Whether every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.free_head.is_none()
    }

    /// Whether no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether this is the pool's embedded base cluster.
    pub fn is_embedded(&self) -> bool {
        self.embedded
    }
}
