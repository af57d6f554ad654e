//! Type, storage-option and subtype enumerations.
//!
//! A value's tag has three parts: the base [`Type`] (nine kinds plus
//! `Invalid`), a [`TypeOpt`] selecting the physical encoding, and a
//! purely descriptive [`SubType`]. [`TypeEx`] packs the first two into
//! one byte (`base | opt << 4`), which is the form encoders round-trip.

use std::fmt;

use crate::error::CoreError;

/// Base kind of a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Type {
    /// Not a valid value. Only produced by corrupt input.
    Invalid = 0,
    /// The null value.
    Null = 1,
    /// Boolean.
    Bool = 2,
    /// Signed 64-bit integer.
    Int = 3,
    /// Unsigned 64-bit integer.
    UInt = 4,
    /// 64-bit float.
    Double = 5,
    /// UTF-8 string.
    String = 6,
    /// Opaque byte buffer.
    BinaryBlob = 7,
    /// Ordered sequence of values.
    Array = 8,
    /// Ordered sequence of named members.
    Table = 9,
}

impl Type {
    /// Every base type, in discriminant order.
    pub const ALL: [Type; 10] = [
        Type::Invalid,
        Type::Null,
        Type::Bool,
        Type::Int,
        Type::UInt,
        Type::Double,
        Type::String,
        Type::BinaryBlob,
        Type::Array,
        Type::Table,
    ];

    /// Lowercase name used in diagnostics and text output.
    pub fn as_str(self) -> &'static str {
        match self {
            Type::Invalid => "invalid",
            Type::Null => "null",
            Type::Bool => "bool",
            Type::Int => "int",
            Type::UInt => "uint",
            Type::Double => "double",
            Type::String => "string",
            Type::BinaryBlob => "binary_blob",
            Type::Array => "array",
            Type::Table => "table",
        }
    }

    /// Name for a raw discriminant, `"<unknown>"` when out of range.
    pub fn name_of(raw: u8) -> &'static str {
        Type::try_from(raw).map_or("<unknown>", Type::as_str)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for Type {
    type Error = CoreError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Type::ALL
            .get(raw as usize)
            .copied()
            .ok_or(CoreError::InvalidDiscriminant {
                kind: "type",
                value: raw,
            })
    }
}

/// Physical encoding selected for a value of a given base type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TypeOpt {
    /// The default encoding of the base type.
    None = 0,
    /// Up to 7 string bytes stored inline.
    StringShort = 1,
    /// Borrowed string owned by the caller.
    StringExtern = 2,
    /// Borrowed (or handed-over) blob buffer.
    BinaryBlobExtern = 3,
    /// Packed `f32` buffer.
    ArrayFloat32 = 4,
    /// Packed `f64` buffer.
    ArrayFloat64 = 5,
    /// Packed `i16` buffer.
    ArrayInt16 = 6,
    /// Packed `i32` buffer.
    ArrayInt32 = 7,
    /// Up to 8 `u8` stored inline.
    ArrayUInt8Short = 8,
    /// Up to 4 `i16` stored inline.
    ArrayInt16Short = 9,
}

impl TypeOpt {
    const ALL: [TypeOpt; 10] = [
        TypeOpt::None,
        TypeOpt::StringShort,
        TypeOpt::StringExtern,
        TypeOpt::BinaryBlobExtern,
        TypeOpt::ArrayFloat32,
        TypeOpt::ArrayFloat64,
        TypeOpt::ArrayInt16,
        TypeOpt::ArrayInt32,
        TypeOpt::ArrayUInt8Short,
        TypeOpt::ArrayInt16Short,
    ];
}

impl TryFrom<u8> for TypeOpt {
    type Error = CoreError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        TypeOpt::ALL
            .get(raw as usize)
            .copied()
            .ok_or(CoreError::InvalidDiscriminant {
                kind: "type option",
                value: raw,
            })
    }
}

/// Base type and storage option packed into one byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeEx(u8);

impl TypeEx {
    /// Invalid value.
    pub const INVALID: TypeEx = TypeEx::from_parts(Type::Invalid, TypeOpt::None);
    /// Null.
    pub const NULL: TypeEx = TypeEx::from_parts(Type::Null, TypeOpt::None);
    /// Boolean.
    pub const BOOL: TypeEx = TypeEx::from_parts(Type::Bool, TypeOpt::None);
    /// Signed integer.
    pub const INT: TypeEx = TypeEx::from_parts(Type::Int, TypeOpt::None);
    /// Unsigned integer.
    pub const UINT: TypeEx = TypeEx::from_parts(Type::UInt, TypeOpt::None);
    /// Float.
    pub const DOUBLE: TypeEx = TypeEx::from_parts(Type::Double, TypeOpt::None);
    /// Owned string.
    pub const STRING: TypeEx = TypeEx::from_parts(Type::String, TypeOpt::None);
    /// Inline short string.
    pub const STRING_SHORT: TypeEx = TypeEx::from_parts(Type::String, TypeOpt::StringShort);
    /// Borrowed string.
    pub const STRING_EXTERN: TypeEx = TypeEx::from_parts(Type::String, TypeOpt::StringExtern);
    /// Owned blob.
    pub const BINARY_BLOB: TypeEx = TypeEx::from_parts(Type::BinaryBlob, TypeOpt::None);
    /// External blob.
    pub const BINARY_BLOB_EXTERN: TypeEx =
        TypeEx::from_parts(Type::BinaryBlob, TypeOpt::BinaryBlobExtern);
    /// Boxed array of child values.
    pub const ARRAY: TypeEx = TypeEx::from_parts(Type::Array, TypeOpt::None);
    /// Packed `f32` array.
    pub const ARRAY_FLOAT32: TypeEx = TypeEx::from_parts(Type::Array, TypeOpt::ArrayFloat32);
    /// Packed `f64` array.
    pub const ARRAY_FLOAT64: TypeEx = TypeEx::from_parts(Type::Array, TypeOpt::ArrayFloat64);
    /// Packed `i16` array.
    pub const ARRAY_INT16: TypeEx = TypeEx::from_parts(Type::Array, TypeOpt::ArrayInt16);
    /// Packed `i32` array.
    pub const ARRAY_INT32: TypeEx = TypeEx::from_parts(Type::Array, TypeOpt::ArrayInt32);
    /// Inline `u8` array.
    pub const ARRAY_UINT8_SHORT: TypeEx =
        TypeEx::from_parts(Type::Array, TypeOpt::ArrayUInt8Short);
    /// Inline `i16` array.
    pub const ARRAY_INT16_SHORT: TypeEx =
        TypeEx::from_parts(Type::Array, TypeOpt::ArrayInt16Short);
    /// Table.
    pub const TABLE: TypeEx = TypeEx::from_parts(Type::Table, TypeOpt::None);

    /// Pack a base type and storage option.
    pub const fn from_parts(base: Type, opt: TypeOpt) -> Self {
        Self(base as u8 | ((opt as u8) << 4))
    }

    /// The raw packed byte.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// The base type (low four bits).
    pub fn base(self) -> Type {
        Type::try_from(self.0 & 0xF).unwrap_or(Type::Invalid)
    }

    /// The storage option (high four bits).
    pub fn opt(self) -> TypeOpt {
        TypeOpt::try_from(self.0 >> 4).unwrap_or(TypeOpt::None)
    }
}

impl Default for TypeEx {
    fn default() -> Self {
        TypeEx::NULL
    }
}

impl From<Type> for TypeEx {
    fn from(base: Type) -> Self {
        TypeEx::from_parts(base, TypeOpt::None)
    }
}

impl TryFrom<u8> for TypeEx {
    type Error = CoreError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        let base = Type::try_from(raw & 0xF)?;
        let opt = TypeOpt::try_from(raw >> 4)?;
        Ok(TypeEx::from_parts(base, opt))
    }
}

impl fmt::Display for TypeEx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}", self.base(), self.opt())
    }
}

/// Fine-grained semantic tag. Descriptive only: it never changes storage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum SubType {
    Invalid = 0,
    Resource,
    ResourceName,
    Panorama,
    SoundEvent,
    Subclass,
    EntityName,
    Localize,
    /// Resolved to the canonical subtype of the base type on assignment.
    #[default]
    Unspecified,
    Null,
    BinaryBlob,
    Array,
    Table,
    Bool8,
    Char8,
    UChar32,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    String,
    Pointer,
    Color32,
    Vector,
    Vector2D,
    Vector4D,
    RotationVector,
    Quaternion,
    QAngle,
    Matrix3x4,
    Transform,
    StringToken,
    EHandle,
}

impl SubType {
    /// Every subtype, in discriminant order.
    pub const ALL: [SubType; 39] = [
        SubType::Invalid,
        SubType::Resource,
        SubType::ResourceName,
        SubType::Panorama,
        SubType::SoundEvent,
        SubType::Subclass,
        SubType::EntityName,
        SubType::Localize,
        SubType::Unspecified,
        SubType::Null,
        SubType::BinaryBlob,
        SubType::Array,
        SubType::Table,
        SubType::Bool8,
        SubType::Char8,
        SubType::UChar32,
        SubType::Int8,
        SubType::UInt8,
        SubType::Int16,
        SubType::UInt16,
        SubType::Int32,
        SubType::UInt32,
        SubType::Int64,
        SubType::UInt64,
        SubType::Float32,
        SubType::Float64,
        SubType::String,
        SubType::Pointer,
        SubType::Color32,
        SubType::Vector,
        SubType::Vector2D,
        SubType::Vector4D,
        SubType::RotationVector,
        SubType::Quaternion,
        SubType::QAngle,
        SubType::Matrix3x4,
        SubType::Transform,
        SubType::StringToken,
        SubType::EHandle,
    ];

    /// Lowercase name used in diagnostics and text output.
    pub fn as_str(self) -> &'static str {
        match self {
            SubType::Invalid => "invalid",
            SubType::Resource => "resource",
            SubType::ResourceName => "resource_name",
            SubType::Panorama => "panorama",
            SubType::SoundEvent => "soundevent",
            SubType::Subclass => "subclass",
            SubType::EntityName => "entity_name",
            SubType::Localize => "localize",
            SubType::Unspecified => "unspecified",
            SubType::Null => "null",
            SubType::BinaryBlob => "binary_blob",
            SubType::Array => "array",
            SubType::Table => "table",
            SubType::Bool8 => "bool8",
            SubType::Char8 => "char8",
            SubType::UChar32 => "uchar32",
            SubType::Int8 => "int8",
            SubType::UInt8 => "uint8",
            SubType::Int16 => "int16",
            SubType::UInt16 => "uint16",
            SubType::Int32 => "int32",
            SubType::UInt32 => "uint32",
            SubType::Int64 => "int64",
            SubType::UInt64 => "uint64",
            SubType::Float32 => "float32",
            SubType::Float64 => "float64",
            SubType::String => "string",
            SubType::Pointer => "pointer",
            SubType::Color32 => "color32",
            SubType::Vector => "vector",
            SubType::Vector2D => "vector2d",
            SubType::Vector4D => "vector4d",
            SubType::RotationVector => "rotation_vector",
            SubType::Quaternion => "quaternion",
            SubType::QAngle => "qangle",
            SubType::Matrix3x4 => "matrix3x4",
            SubType::Transform => "transform",
            SubType::StringToken => "string_token",
            SubType::EHandle => "ehandle",
        }
    }

    /// Canonical subtype for a base type.
    pub fn resolve_unspecified(base: Type) -> SubType {
        match base {
            Type::Null => SubType::Null,
            Type::Bool => SubType::Bool8,
            Type::Int => SubType::Int64,
            Type::UInt => SubType::UInt64,
            Type::Double => SubType::Float64,
            Type::String => SubType::String,
            Type::BinaryBlob => SubType::BinaryBlob,
            Type::Array => SubType::Array,
            Type::Table => SubType::Table,
            Type::Invalid => SubType::Invalid,
        }
    }

    /// `self`, or the canonical subtype of `base` when unspecified.
    pub fn or_resolved(self, base: Type) -> SubType {
        if self == SubType::Unspecified {
            SubType::resolve_unspecified(base)
        } else {
            self
        }
    }
}

impl fmt::Display for SubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for SubType {
    type Error = CoreError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        SubType::ALL
            .get(raw as usize)
            .copied()
            .ok_or(CoreError::InvalidDiscriminant {
                kind: "subtype",
                value: raw,
            })
    }
}
