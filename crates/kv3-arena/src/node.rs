//! The contract between a node type and the allocation tiers.

/// A node type that can live in a cluster, a raw node list or the heap.
///
/// The size model mirrors the packed layout of the node so that tier
/// selection and raw-list byte accounting stay faithful to it.
pub trait ClusterNode: Default {
    /// Elements (or members) that fit in one cluster slot.
    const DATA_SIZE: usize;

    /// Bytes needed for a node built for `initial_size` elements.
    fn total_size_of(initial_size: usize) -> usize;

    /// Build a node for `initial_size` elements into a slot of
    /// `available_bytes`.
    ///
    /// Implementations treat a slot smaller than
    /// `total_size_of(initial_size)` as a fatal contract violation.
    fn construct(initial_size: usize, available_bytes: usize) -> Self;
}
