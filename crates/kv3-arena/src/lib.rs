//! Cluster, spillover and heap allocation tiers for KV3 contexts.
//!
//! Nodes (values, arrays, tables) are stored in typed slots addressed by
//! generation-checked [`NodeHandle`]s instead of raw pointers. A stale
//! handle (freed slot, cleared context) resolves to `None`.
//!
//! # Architecture
//!
//! ```text
//! TieredStore<T> (one per node kind, owned by a context)
//! ├── ClusterPool<T>
//! │   ├── Cluster<T>[] (fixed capacity, intrusive free list over slots)
//! │   ├── partial chain (clusters with free slots, alloc from the tail)
//! │   └── full chain (never scanned by alloc)
//! ├── NodeList<T> (raw spillover: bump-allocated, reclaimed only on clear)
//! └── HeapStore<T> (independent fallback when neither tier fits)
//! SymbolTable (interned strings, stable ids until clear)
//! ```
//!
//! # Tier selection
//!
//! The raw node list is tried first when it has room for the node's exact
//! byte requirement. Otherwise nodes whose initial size fits the cluster
//! slot layout go to the cluster pool, and everything else falls back to
//! the heap tier. In heap mode every node goes to the heap tier.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cluster;
pub mod config;
pub mod error;
pub mod handle;
pub mod heap;
pub mod node;
pub mod node_list;
pub mod pool;
pub mod symbols;
pub mod tiered;

// Public re-exports for the primary API surface.
pub use config::{AllocationMode, ArenaConfig};
pub use error::ArenaError;
pub use handle::{NodeHandle, NodeLocation};
pub use node::ClusterNode;
pub use symbols::SymbolTable;
pub use tiered::{TierStats, TieredStore};
