//! The tagged value node and its handles.
//!
//! A [`Value`] owns exactly one payload, selected by its [`Data`]
//! variant. The extended type is derived from the variant, so the tag
//! and the payload can never disagree.

use std::borrow::Cow;
use std::fmt;

use kv3_arena::{ClusterNode, NodeHandle};
use kv3_core::growth::SHORT_STRING_CAPACITY;
use kv3_core::{SubType, Type, TypeEx, TypeOpt};

use crate::packed::PackedArray;

/// Handle to a value owned by a [`Context`](crate::Context).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValueId(pub(crate) NodeHandle);

/// Handle to an array container owned by a [`Context`](crate::Context).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArrayId(pub(crate) NodeHandle);

/// Handle to a table container owned by a [`Context`](crate::Context).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TableId(pub(crate) NodeHandle);

impl ValueId {
    /// The underlying arena handle.
    pub fn handle(self) -> NodeHandle {
        self.0
    }
}

impl ArrayId {
    /// The underlying arena handle.
    pub fn handle(self) -> NodeHandle {
        self.0
    }
}

impl TableId {
    /// The underlying arena handle.
    pub fn handle(self) -> NodeHandle {
        self.0
    }
}

/// A string of at most seven bytes stored inline.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ShortString {
    len: u8,
    bytes: [u8; SHORT_STRING_CAPACITY],
}

impl ShortString {
    /// Store `s` inline, or `None` if it is longer than seven bytes.
    pub fn new(s: &str) -> Option<Self> {
        if s.len() > SHORT_STRING_CAPACITY {
            return None;
        }
        let mut bytes = [0; SHORT_STRING_CAPACITY];
        bytes[..s.len()].copy_from_slice(s.as_bytes());
        Some(Self {
            len: s.len() as u8,
            bytes,
        })
    }

    /// The stored text.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes[..usize::from(self.len)]).unwrap_or_default()
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        usize::from(self.len)
    }

    /// Whether the string is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for ShortString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

/// The payload of a value. Each variant selects one storage option.
#[derive(Debug, Default)]
pub enum Data<'a> {
    /// No valid type.
    Invalid,
    /// The null value.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer of any width.
    Int(i64),
    /// Unsigned integer of any width, pointer, token or entity handle.
    UInt(u64),
    /// Floating point of either width.
    Double(f64),
    /// Owned string of eight bytes or more.
    String(Box<str>),
    /// Inline string of at most seven bytes.
    ShortString(ShortString),
    /// Borrowed string that must outlive the context.
    ExternString(&'a str),
    /// Owned binary blob.
    Blob(Box<[u8]>),
    /// Blob borrowed from the caller, or handed over by it.
    ExternBlob(Cow<'a, [u8]>),
    /// Boxed array of child values.
    Array(ArrayId),
    /// Packed array of primitive elements.
    Packed(PackedArray),
    /// Table of named child values.
    Table(TableId),
}

impl<'a> Data<'a> {
    /// The extended type this payload encodes.
    pub fn type_ex(&self) -> TypeEx {
        match self {
            Data::Invalid => TypeEx::INVALID,
            Data::Null => TypeEx::NULL,
            Data::Bool(_) => TypeEx::BOOL,
            Data::Int(_) => TypeEx::INT,
            Data::UInt(_) => TypeEx::UINT,
            Data::Double(_) => TypeEx::DOUBLE,
            Data::String(_) => TypeEx::STRING,
            Data::ShortString(_) => TypeEx::STRING_SHORT,
            Data::ExternString(_) => TypeEx::STRING_EXTERN,
            Data::Blob(_) => TypeEx::BINARY_BLOB,
            Data::ExternBlob(_) => TypeEx::BINARY_BLOB_EXTERN,
            Data::Array(_) => TypeEx::ARRAY,
            Data::Packed(packed) => packed.type_ex(),
            Data::Table(_) => TypeEx::TABLE,
        }
    }

    /// An empty payload of `type_ex`.
    ///
    /// Boxed arrays and tables need a container from the arena and map to
    /// [`Data::Null`] here; the context allocates the container.
    pub(crate) fn empty_for(type_ex: TypeEx) -> Data<'a> {
        match type_ex {
            TypeEx::NULL | TypeEx::ARRAY | TypeEx::TABLE => Data::Null,
            TypeEx::BOOL => Data::Bool(false),
            TypeEx::INT => Data::Int(0),
            TypeEx::UINT => Data::UInt(0),
            TypeEx::DOUBLE => Data::Double(0.0),
            TypeEx::STRING => Data::String(Box::from("")),
            TypeEx::STRING_SHORT => Data::ShortString(ShortString::default()),
            TypeEx::STRING_EXTERN => Data::ExternString(""),
            TypeEx::BINARY_BLOB => Data::Blob(Box::default()),
            TypeEx::BINARY_BLOB_EXTERN => Data::ExternBlob(Cow::Borrowed(&[])),
            other if other.base() == Type::Array => match PackedArray::empty(other.opt()) {
                Some(packed) => Data::Packed(packed),
                None => Data::Invalid,
            },
            _ => Data::Invalid,
        }
    }

    /// The string payload, for any of the three string encodings.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Data::String(s) => Some(s),
            Data::ShortString(s) => Some(s.as_str()),
            Data::ExternString(s) => Some(s),
            _ => None,
        }
    }

    /// A copy of a leaf payload that borrows nothing from the context.
    ///
    /// External strings and blobs become owned. Containers return `None`.
    pub(crate) fn detach(&self) -> Option<Data<'static>> {
        Some(match self {
            Data::Invalid => Data::Invalid,
            Data::Null => Data::Null,
            Data::Bool(v) => Data::Bool(*v),
            Data::Int(v) => Data::Int(*v),
            Data::UInt(v) => Data::UInt(*v),
            Data::Double(v) => Data::Double(*v),
            Data::String(s) => Data::String(s.clone()),
            Data::ShortString(s) => Data::ShortString(*s),
            Data::ExternString(s) => Data::String(Box::from(*s)),
            Data::Blob(b) => Data::Blob(b.clone()),
            Data::ExternBlob(b) => Data::Blob(Box::from(b.as_ref())),
            Data::Packed(p) => Data::Packed(p.clone()),
            Data::Array(_) | Data::Table(_) => return None,
        })
    }
}

/// One node of a KV3 document.
#[derive(Debug)]
pub struct Value<'a> {
    pub(crate) data: Data<'a>,
    pub(crate) subtype: SubType,
    pub(crate) flags: u8,
}

/// What a stale handle reads as.
pub(crate) static INVALID_VALUE: Value<'static> = Value {
    data: Data::Invalid,
    subtype: SubType::Invalid,
    flags: 0,
};

impl<'a> Value<'a> {
    /// The active payload.
    pub fn data(&self) -> &Data<'a> {
        &self.data
    }

    /// Base type.
    pub fn get_type(&self) -> Type {
        self.data.type_ex().base()
    }

    /// Extended type.
    pub fn type_ex(&self) -> TypeEx {
        self.data.type_ex()
    }

    /// Storage option of the extended type.
    pub fn type_opt(&self) -> TypeOpt {
        self.data.type_ex().opt()
    }

    /// Semantic subtype.
    pub fn subtype(&self) -> SubType {
        self.subtype
    }

    /// Free-form flag byte.
    pub fn flags(&self) -> u8 {
        self.flags
    }
}

impl Default for Value<'_> {
    fn default() -> Self {
        Self {
            data: Data::Null,
            subtype: SubType::Null,
            flags: 0,
        }
    }
}

impl ClusterNode for Value<'_> {
    const DATA_SIZE: usize = 1;

    fn total_size_of(_initial_size: usize) -> usize {
        16
    }

    fn construct(_initial_size: usize, _available_bytes: usize) -> Self {
        Self::default()
    }
}
