//! Packed arrays of primitive elements.
//!
//! A packed array stores its elements natively instead of as child
//! values. Short forms keep up to eight bytes of elements inline; pointer
//! forms own a buffer of at most [`PACKED_MAX_ELEMENTS`] elements.
//! Anything larger is stored as a boxed array of child values.

use kv3_core::growth::PACKED_MAX_ELEMENTS;
use kv3_core::{SubType, TypeEx, TypeOpt};

use crate::value::Data;

/// Natively stored array elements.
#[derive(Clone, Debug, PartialEq)]
pub enum PackedArray {
    /// `f32` elements in an owned buffer.
    Float32(Box<[f32]>),
    /// `f64` elements in an owned buffer.
    Float64(Box<[f64]>),
    /// `i16` elements in an owned buffer.
    Int16(Box<[i16]>),
    /// `i32` elements in an owned buffer.
    Int32(Box<[i32]>),
    /// Up to eight `u8` elements inline.
    UInt8Short {
        /// Element count.
        len: u8,
        /// Element storage; only the first `len` entries are meaningful.
        data: [u8; 8],
    },
    /// Up to four `i16` elements inline.
    Int16Short {
        /// Element count.
        len: u8,
        /// Element storage; only the first `len` entries are meaningful.
        data: [i16; 4],
    },
}

/// One element read out of a packed array.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PackedElement {
    /// From a `Float32` array.
    Float32(f32),
    /// From a `Float64` array.
    Float64(f64),
    /// From an `Int16` or `Int16Short` array.
    Int16(i16),
    /// From an `Int32` array.
    Int32(i32),
    /// From a `UInt8Short` array.
    UInt8(u8),
}

impl PackedElement {
    /// The element as a scalar payload.
    pub fn to_data(self) -> Data<'static> {
        match self {
            PackedElement::Float32(v) => Data::Double(f64::from(v)),
            PackedElement::Float64(v) => Data::Double(v),
            PackedElement::Int16(v) => Data::Int(i64::from(v)),
            PackedElement::Int32(v) => Data::Int(i64::from(v)),
            PackedElement::UInt8(v) => Data::UInt(u64::from(v)),
        }
    }

    /// The element as `f32`, for float arrays only.
    pub fn as_f32(self) -> Option<f32> {
        match self {
            PackedElement::Float32(v) => Some(v),
            PackedElement::Float64(v) => Some(v as f32),
            _ => None,
        }
    }

    /// The element as `i32`, for integer arrays only.
    pub fn as_i32(self) -> Option<i32> {
        match self {
            PackedElement::Int16(v) => Some(i32::from(v)),
            PackedElement::Int32(v) => Some(v),
            PackedElement::UInt8(v) => Some(i32::from(v)),
            _ => None,
        }
    }
}

impl PackedArray {
    /// An empty array of the given storage option.
    pub fn empty(opt: TypeOpt) -> Option<Self> {
        Some(match opt {
            TypeOpt::ArrayFloat32 => PackedArray::Float32(Box::default()),
            TypeOpt::ArrayFloat64 => PackedArray::Float64(Box::default()),
            TypeOpt::ArrayInt16 => PackedArray::Int16(Box::default()),
            TypeOpt::ArrayInt32 => PackedArray::Int32(Box::default()),
            TypeOpt::ArrayUInt8Short => PackedArray::UInt8Short {
                len: 0,
                data: [0; 8],
            },
            TypeOpt::ArrayInt16Short => PackedArray::Int16Short {
                len: 0,
                data: [0; 4],
            },
            _ => return None,
        })
    }

    /// Pack `f32` elements, or `None` if there are too many.
    pub fn from_f32(data: &[f32]) -> Option<Self> {
        (data.len() <= PACKED_MAX_ELEMENTS).then(|| PackedArray::Float32(data.into()))
    }

    /// Pack `f64` elements, or `None` if there are too many.
    pub fn from_f64(data: &[f64]) -> Option<Self> {
        (data.len() <= PACKED_MAX_ELEMENTS).then(|| PackedArray::Float64(data.into()))
    }

    /// Pack `i16` elements inline when four or fewer, otherwise in a
    /// buffer; `None` if there are too many.
    pub fn from_i16(data: &[i16]) -> Option<Self> {
        if data.len() <= 4 {
            let mut inline = [0; 4];
            inline[..data.len()].copy_from_slice(data);
            return Some(PackedArray::Int16Short {
                len: data.len() as u8,
                data: inline,
            });
        }
        (data.len() <= PACKED_MAX_ELEMENTS).then(|| PackedArray::Int16(data.into()))
    }

    /// Pack `i32` elements, or `None` if there are too many.
    pub fn from_i32(data: &[i32]) -> Option<Self> {
        (data.len() <= PACKED_MAX_ELEMENTS).then(|| PackedArray::Int32(data.into()))
    }

    /// Pack `u8` elements inline; `None` above eight elements.
    pub fn from_u8(data: &[u8]) -> Option<Self> {
        if data.len() > 8 {
            return None;
        }
        let mut inline = [0; 8];
        inline[..data.len()].copy_from_slice(data);
        Some(PackedArray::UInt8Short {
            len: data.len() as u8,
            data: inline,
        })
    }

    /// Extended type of this encoding.
    pub fn type_ex(&self) -> TypeEx {
        match self {
            PackedArray::Float32(_) => TypeEx::ARRAY_FLOAT32,
            PackedArray::Float64(_) => TypeEx::ARRAY_FLOAT64,
            PackedArray::Int16(_) => TypeEx::ARRAY_INT16,
            PackedArray::Int32(_) => TypeEx::ARRAY_INT32,
            PackedArray::UInt8Short { .. } => TypeEx::ARRAY_UINT8_SHORT,
            PackedArray::Int16Short { .. } => TypeEx::ARRAY_INT16_SHORT,
        }
    }

    /// Type and subtype each element takes when boxed.
    pub fn element_tag(&self) -> (TypeEx, SubType) {
        match self {
            PackedArray::Float32(_) => (TypeEx::DOUBLE, SubType::Float32),
            PackedArray::Float64(_) => (TypeEx::DOUBLE, SubType::Float64),
            PackedArray::Int16(_) | PackedArray::Int16Short { .. } => {
                (TypeEx::INT, SubType::Int16)
            }
            PackedArray::Int32(_) => (TypeEx::INT, SubType::Int32),
            PackedArray::UInt8Short { .. } => (TypeEx::UINT, SubType::UInt8),
        }
    }

    /// Element count.
    pub fn len(&self) -> usize {
        match self {
            PackedArray::Float32(v) => v.len(),
            PackedArray::Float64(v) => v.len(),
            PackedArray::Int16(v) => v.len(),
            PackedArray::Int32(v) => v.len(),
            PackedArray::UInt8Short { len, .. } | PackedArray::Int16Short { len, .. } => {
                usize::from(*len)
            }
        }
    }

    /// Whether there are no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element `i`.
    pub fn get(&self, i: usize) -> Option<PackedElement> {
        if i >= self.len() {
            return None;
        }
        Some(match self {
            PackedArray::Float32(v) => PackedElement::Float32(v[i]),
            PackedArray::Float64(v) => PackedElement::Float64(v[i]),
            PackedArray::Int16(v) => PackedElement::Int16(v[i]),
            PackedArray::Int32(v) => PackedElement::Int32(v[i]),
            PackedArray::UInt8Short { data, .. } => PackedElement::UInt8(data[i]),
            PackedArray::Int16Short { data, .. } => PackedElement::Int16(data[i]),
        })
    }

    /// Elements in order.
    pub fn iter(&self) -> impl Iterator<Item = PackedElement> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_forms_are_chosen_when_data_fits() {
        assert_eq!(
            PackedArray::from_i16(&[1, 2, 3, 4]).unwrap().type_ex(),
            TypeEx::ARRAY_INT16_SHORT
        );
        assert_eq!(
            PackedArray::from_i16(&[1, 2, 3, 4, 5]).unwrap().type_ex(),
            TypeEx::ARRAY_INT16
        );
        assert_eq!(
            PackedArray::from_u8(&[255, 0, 0]).unwrap().type_ex(),
            TypeEx::ARRAY_UINT8_SHORT
        );
        assert!(PackedArray::from_u8(&[0; 9]).is_none());
    }

    #[test]
    fn pointer_forms_cap_at_31_elements() {
        assert!(PackedArray::from_f32(&[0.0; 31]).is_some());
        assert!(PackedArray::from_f32(&[0.0; 32]).is_none());
        assert!(PackedArray::from_i32(&[0; 32]).is_none());
        assert!(PackedArray::from_f64(&[0.0; 31]).is_some());
    }

    #[test]
    fn elements_read_back_in_order() {
        let packed = PackedArray::from_i16(&[-3, 7]).unwrap();
        let items: Vec<_> = packed.iter().collect();
        assert_eq!(items, vec![PackedElement::Int16(-3), PackedElement::Int16(7)]);
        assert_eq!(packed.get(2), None);
        assert_eq!(packed.element_tag(), (TypeEx::INT, SubType::Int16));
    }

    #[test]
    fn element_conversions() {
        assert_eq!(PackedElement::UInt8(200).as_i32(), Some(200));
        assert_eq!(PackedElement::Float64(2.75).as_f32(), Some(2.75));
        assert_eq!(PackedElement::Float32(-1.9).as_i32(), None);
        assert_eq!(PackedElement::Int16(4).as_f32(), None);
        assert!(matches!(PackedElement::Int32(-5).to_data(), Data::Int(-5)));
    }

    #[test]
    fn empty_matches_storage_option() {
        for opt in [
            TypeOpt::ArrayFloat32,
            TypeOpt::ArrayFloat64,
            TypeOpt::ArrayInt16,
            TypeOpt::ArrayInt32,
            TypeOpt::ArrayUInt8Short,
            TypeOpt::ArrayInt16Short,
        ] {
            let packed = PackedArray::empty(opt).unwrap();
            assert_eq!(packed.type_ex().opt(), opt);
            assert!(packed.is_empty());
        }
        assert!(PackedArray::empty(TypeOpt::StringShort).is_none());
    }
}
