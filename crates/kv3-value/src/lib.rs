//! Value model and arena context for the KV3 hierarchical value format.
//!
//! A KV3 document is a tree of [`Value`] nodes. Each node is a tagged
//! scalar, string, binary blob, array or table. Nodes never own each
//! other directly: they live in a [`Context`] and refer to their children
//! through generation-checked handles ([`ValueId`], [`ArrayId`],
//! [`TableId`]).
//!
//! # Architecture
//!
//! ```text
//! Context<'a>
//! ├── TieredStore<Value>   (cluster pool, raw list, heap)
//! ├── TieredStore<Array>   (ordered child handles)
//! ├── TieredStore<Table>   (hashes, child handles, names, flags, index)
//! ├── SymbolTable          (interned member names)
//! ├── metadata side-table  (optional, keyed by ValueId)
//! └── root value           (absent for pool contexts)
//! ```
//!
//! Reads go through [`ValueRef`], writes through [`ValueMut`]. Both are
//! cursors that pair a handle with the context that owns it.
//!
//! ```
//! use kv3_core::SubType;
//! use kv3_value::Context;
//!
//! let mut ctx = Context::new();
//! ctx.root_mut().find_or_create_member("x").0.set_int(42);
//! ctx.root_mut()
//!     .find_or_create_member("name")
//!     .0
//!     .set_string("player", SubType::String);
//!
//! let root = ctx.root();
//! assert_eq!(root.find_member("X").map(|v| v.get_int(0)), Some(42));
//! assert_eq!(root.find_member("name").map(|v| v.to_string()).as_deref(), Some("player"));
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod alloc;
pub mod array;
pub mod context;
mod copy;
pub mod fast_search;
pub mod format;
pub mod owned;
pub mod packed;
pub mod read;
mod scalar;
pub mod table;
pub mod value;
pub mod write;

// Public re-exports for the primary API surface.
pub use alloc::ValueAllocator;
pub use array::Array;
pub use context::{Context, ContextStats};
pub use fast_search::FastSearch;
pub use owned::OwnedValue;
pub use packed::{PackedArray, PackedElement};
pub use read::ValueRef;
pub use table::{MemberFlags, StoredName, Table};
pub use value::{ArrayId, Data, ShortString, TableId, Value, ValueId};
pub use write::ValueMut;
