//! Core types for the KV3 hierarchical value format.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the arena and the value model: type and
//! subtype enumerations, member-name hashing, the buffer growth policy,
//! flag sets, geometry value types, the metadata record, and the fatal
//! error hook used for contract violations.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod fatal;
pub mod flags;
pub mod geometry;
pub mod growth;
pub mod id;
pub mod metadata;
pub mod name;
pub mod types;

pub use error::CoreError;
pub use flags::{MetaDataFlags, ToStringFlags};
pub use geometry::{Color, Matrix3x4, QAngle, Quaternion, Vector, Vector2D, Vector4D};
pub use id::{EHandle, StringToken, Symbol};
pub use metadata::MetaData;
pub use name::MemberName;
pub use types::{SubType, Type, TypeEx, TypeOpt};
