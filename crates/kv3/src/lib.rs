//! KV3: the KeyValues3 hierarchical value format.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the KV3 sub-crates. For most users, adding `kv3` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use kv3::prelude::*;
//!
//! let mut ctx = Context::new();
//! {
//!     let mut root = ctx.root_mut();
//!     root.find_or_create_member("classname")
//!         .0
//!         .set_string("info_player_start", SubType::String);
//!     root.find_or_create_member("origin")
//!         .0
//!         .set_vector(Vector { x: 0.0, y: 64.0, z: 8.0 });
//! }
//!
//! let root = ctx.root();
//! assert_eq!(root.get_member_count(), 2);
//! let origin = root.find_member("Origin").unwrap();
//! assert_eq!(origin.get_sub_type(), SubType::Vector);
//! assert_eq!(origin.to_string(), "0 64 8");
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `kv3-core` | Type tags, member names, flags, geometry, metadata |
//! | [`arena`] | `kv3-arena` | Cluster pool, raw spillover, heap tier, symbols |
//! | [`value`] | `kv3-value` | Values, arrays, tables, contexts, cursors |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Type tags, member names, flags and geometry (`kv3-core`).
///
/// Also home to [`types::fatal::set_fatal_hook`], which observes contract
/// violations before they panic.
pub use kv3_core as types;

/// Allocation tiers and configuration (`kv3-arena`).
///
/// Most users only need [`arena::ArenaConfig`] and
/// [`arena::AllocationMode`] from this module.
pub use kv3_arena as arena;

/// The value model (`kv3-value`).
///
/// [`value::Context`] owns documents; [`value::ValueRef`] and
/// [`value::ValueMut`] read and write them.
pub use kv3_value as value;

/// Common imports for typical KV3 usage.
///
/// ```rust
/// use kv3::prelude::*;
/// ```
pub mod prelude {
    // Configuration
    pub use kv3_arena::{AllocationMode, ArenaConfig, ArenaError};

    // Type tags and names
    pub use kv3_core::{MemberName, SubType, ToStringFlags, Type, TypeEx};

    // Geometry and handles
    pub use kv3_core::{
        Color, EHandle, Matrix3x4, QAngle, Quaternion, StringToken, Vector, Vector2D, Vector4D,
    };

    // Metadata
    pub use kv3_core::{MetaData, MetaDataFlags};

    // Values
    pub use kv3_value::{Context, OwnedValue, ValueId, ValueMut, ValueRef};
}
