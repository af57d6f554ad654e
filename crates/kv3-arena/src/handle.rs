//! Node handles and location descriptors.
//!
//! A [`NodeHandle`] encodes which tier and slot a node lives in. It is
//! generation-scoped: every allocation takes a fresh generation stamp, so
//! a handle whose slot has since been freed, reused or cleared no longer
//! matches and resolves to `None`.

use std::fmt;

/// Location and generation of one allocated node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct NodeHandle {
    /// Generation stamp taken when the node was allocated.
    pub(crate) generation: u32,
    /// Which tier and slot holds the node.
    pub(crate) location: NodeLocation,
}

impl NodeHandle {
    /// Create a new handle.
    pub(crate) fn new(generation: u32, location: NodeLocation) -> Self {
        Self {
            generation,
            location,
        }
    }

    /// The generation this handle belongs to.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// The location descriptor.
    pub fn location(&self) -> NodeLocation {
        self.location
    }

    /// Whether the node lives in a cluster slot.
    pub fn is_clustered(&self) -> bool {
        matches!(self.location, NodeLocation::Cluster { .. })
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeHandle(gen={}, {:?})", self.generation, self.location)
    }
}

/// Describes which tier a [`NodeHandle`] points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeLocation {
    /// A slot in a fixed-capacity cluster.
    Cluster {
        /// Index of the cluster within its pool.
        cluster: u32,
        /// Slot within the cluster.
        slot: u16,
    },
    /// An entry in the raw spillover list.
    Raw {
        /// Entry index, in allocation order.
        entry: u32,
    },
    /// A slot in the heap fallback store.
    Heap {
        /// Slot index.
        slot: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_round_trip() {
        let loc = NodeLocation::Cluster {
            cluster: 3,
            slot: 17,
        };
        let h = NodeHandle::new(42, loc);
        assert_eq!(h.generation(), 42);
        assert_eq!(h.location(), loc);
        assert!(h.is_clustered());
    }

    #[test]
    fn raw_and_heap_are_not_clustered() {
        assert!(!NodeHandle::new(1, NodeLocation::Raw { entry: 0 }).is_clustered());
        assert!(!NodeHandle::new(1, NodeLocation::Heap { slot: 0 }).is_clustered());
    }

    #[test]
    fn display_includes_generation() {
        let h = NodeHandle::new(7, NodeLocation::Heap { slot: 2 });
        assert_eq!(h.to_string(), "NodeHandle(gen=7, Heap { slot: 2 })");
    }
}
