//! Shared, read-only access to a value.
//!
//! Getters never fail: a payload of the wrong kind yields the caller's
//! default (scalars), `None` (handles, blobs, children) or zero (counts).

use std::fmt;

use kv3_core::geometry::FloatComponents;
use kv3_core::{
    Color, EHandle, Matrix3x4, MemberName, QAngle, Quaternion, StringToken, SubType, Type,
    TypeEx, Vector, Vector2D, Vector4D,
};

use crate::array::Array;
use crate::context::Context;
use crate::packed::{PackedArray, PackedElement};
use crate::scalar::{split_numeric_list, Scalar};
use crate::table::{MemberFlags, Table};
use crate::value::{Data, Value, ValueId};

/// A live value and the context that owns it.
#[derive(Clone, Copy)]
pub struct ValueRef<'c, 'a> {
    ctx: &'c Context<'a>,
    id: ValueId,
    node: &'c Value<'a>,
}

impl<'c, 'a> ValueRef<'c, 'a> {
    pub(crate) fn new(ctx: &'c Context<'a>, id: ValueId, node: &'c Value<'a>) -> Self {
        Self { ctx, id, node }
    }

    /// Handle of this value.
    pub fn id(&self) -> ValueId {
        self.id
    }

    /// The owning context.
    pub fn context(&self) -> &'c Context<'a> {
        self.ctx
    }

    /// The underlying node.
    pub fn node(&self) -> &'c Value<'a> {
        self.node
    }

    /// The active payload.
    pub fn data(&self) -> &'c Data<'a> {
        &self.node.data
    }

    // ── Tags ────────────────────────────────────────────────────

    /// Base type.
    pub fn get_type(&self) -> Type {
        self.node.get_type()
    }

    /// Extended type.
    pub fn get_type_ex(&self) -> TypeEx {
        self.node.type_ex()
    }

    /// Semantic subtype.
    pub fn get_sub_type(&self) -> SubType {
        self.node.subtype
    }

    /// Name of the base type.
    pub fn get_type_as_str(&self) -> &'static str {
        self.get_type().as_str()
    }

    /// Name of the subtype.
    pub fn get_sub_type_as_str(&self) -> &'static str {
        self.node.subtype.as_str()
    }

    /// Free-form flag byte.
    pub fn flags(&self) -> u8 {
        self.node.flags
    }

    // ── Scalars ─────────────────────────────────────────────────

    fn get_value<T: Scalar>(&self, default: T) -> T {
        match &self.node.data {
            Data::Bool(v) => T::from_bool(*v),
            Data::Int(v) => T::from_i64(*v),
            Data::UInt(v) if self.node.subtype != SubType::Pointer => T::from_u64(*v),
            Data::Double(v) => T::from_f64(*v),
            data => data.as_str().and_then(T::parse).unwrap_or(default),
        }
    }

    /// As `bool`.
    pub fn get_bool(&self, default: bool) -> bool {
        self.get_value(default)
    }

    /// As `i8` character.
    pub fn get_char(&self, default: i8) -> i8 {
        self.get_value(default)
    }

    /// As a 32-bit code point.
    pub fn get_uchar32(&self, default: u32) -> u32 {
        self.get_value(default)
    }

    /// As `i8`.
    pub fn get_int8(&self, default: i8) -> i8 {
        self.get_value(default)
    }

    /// As `u8`.
    pub fn get_uint8(&self, default: u8) -> u8 {
        self.get_value(default)
    }

    /// As `i16`.
    pub fn get_short(&self, default: i16) -> i16 {
        self.get_value(default)
    }

    /// As `u16`.
    pub fn get_ushort(&self, default: u16) -> u16 {
        self.get_value(default)
    }

    /// As `i32`.
    pub fn get_int(&self, default: i32) -> i32 {
        self.get_value(default)
    }

    /// As `u32`.
    pub fn get_uint(&self, default: u32) -> u32 {
        self.get_value(default)
    }

    /// As `i64`.
    pub fn get_int64(&self, default: i64) -> i64 {
        self.get_value(default)
    }

    /// As `u64`.
    pub fn get_uint64(&self, default: u64) -> u64 {
        self.get_value(default)
    }

    /// As `f32`.
    pub fn get_float(&self, default: f32) -> f32 {
        self.get_value(default)
    }

    /// As `f64`.
    pub fn get_double(&self, default: f64) -> f64 {
        self.get_value(default)
    }

    fn tagged_uint(&self, subtype: SubType) -> Option<u64> {
        match self.node.data {
            Data::UInt(v) if self.node.subtype == subtype => Some(v),
            _ => None,
        }
    }

    /// The stored pointer, if this is a pointer value.
    pub fn get_pointer(&self, default: u64) -> u64 {
        self.tagged_uint(SubType::Pointer).unwrap_or(default)
    }

    /// The stored token, if this is a string-token value.
    pub fn get_string_token(&self, default: StringToken) -> StringToken {
        self.tagged_uint(SubType::StringToken)
            .map_or(default, |v| StringToken(v as u32))
    }

    /// The stored entity handle, if this is an entity-handle value.
    pub fn get_ehandle(&self, default: EHandle) -> EHandle {
        self.tagged_uint(SubType::EHandle)
            .map_or(default, |v| EHandle(v as u32))
    }

    // ── Strings and blobs ───────────────────────────────────────

    /// String text in any of the three encodings, else `default`.
    pub fn get_string(&self, default: &'c str) -> &'c str {
        self.node.data.as_str().unwrap_or(default)
    }

    /// Blob bytes; `None` for non-blobs and empty blobs.
    pub fn get_binary_blob(&self) -> Option<&'c [u8]> {
        let bytes: &'c [u8] = match &self.node.data {
            Data::Blob(bytes) => bytes,
            Data::ExternBlob(bytes) => bytes,
            _ => return None,
        };
        (!bytes.is_empty()).then_some(bytes)
    }

    /// Blob length in bytes, 0 for non-blobs.
    pub fn get_binary_blob_size(&self) -> usize {
        self.get_binary_blob().map_or(0, <[u8]>::len)
    }

    // ── Numeric arrays and geometry ─────────────────────────────

    fn read_array<T: Scalar + Default>(
        &self,
        dst: &mut [T],
        from_packed: impl Fn(PackedElement) -> Option<T>,
        from_child: impl Fn(&ValueRef<'c, 'a>) -> T,
    ) -> bool {
        let src_len = match &self.node.data {
            Data::Packed(packed) if packed.iter().all(|e| from_packed(e).is_some()) => {
                for (slot, element) in dst.iter_mut().zip(packed.iter()) {
                    *slot = from_packed(element).unwrap_or_default();
                }
                packed.len()
            }
            Data::Packed(_) => 0,
            Data::Array(id) => {
                let elements = self.ctx.array(*id).map_or(&[][..], Array::elements);
                for (slot, child) in dst.iter_mut().zip(elements) {
                    *slot = self
                        .ctx
                        .value(*child)
                        .map_or_else(T::default, |child| from_child(&child));
                }
                elements.len()
            }
            data => match data.as_str() {
                Some(text) => {
                    let mut count = 0;
                    for field in split_numeric_list(text) {
                        if let Some(slot) = dst.get_mut(count) {
                            *slot = T::parse(field).unwrap_or_default();
                        }
                        count += 1;
                    }
                    count
                }
                None => 0,
            },
        };
        for slot in dst.iter_mut().skip(src_len) {
            *slot = T::default();
        }
        src_len == dst.len()
    }

    /// Copy up to `dst.len()` floats out of a numeric array or a
    /// space-separated string, zero-filling the rest.
    ///
    /// Packed sources must hold floats; a packed integer array reads as
    /// empty. Returns `true` only when the source length matches exactly.
    pub fn read_array_float32(&self, dst: &mut [f32]) -> bool {
        self.read_array(dst, PackedElement::as_f32, |child| child.get_float(0.0))
    }

    /// Integer counterpart of [`read_array_float32`](Self::read_array_float32).
    ///
    /// Packed sources must hold integers.
    pub fn read_array_int32(&self, dst: &mut [i32]) -> bool {
        self.read_array(dst, PackedElement::as_i32, |child| child.get_int(0))
    }

    fn read_components<G: FloatComponents>(&self, default: G) -> G {
        let mut buf = [0.0f32; 12];
        let components = &mut buf[..G::LEN];
        if self.read_array_float32(components) {
            G::from_components(components)
        } else {
            default
        }
    }

    /// Four channels, or three with opaque alpha, else `default`.
    pub fn get_color(&self, default: Color) -> Color {
        let mut rgba = [0i32; 4];
        if self.read_array_int32(&mut rgba) {
            let [r, g, b, a] = rgba;
            return Color::new(r as u8, g as u8, b as u8, a as u8);
        }
        let mut rgb = [0i32; 3];
        if self.read_array_int32(&mut rgb) {
            let [r, g, b] = rgb;
            return Color::new(r as u8, g as u8, b as u8, 255);
        }
        default
    }

    /// Three components, else `default`.
    pub fn get_vector(&self, default: Vector) -> Vector {
        self.read_components(default)
    }

    /// Two components, else `default`.
    pub fn get_vector2d(&self, default: Vector2D) -> Vector2D {
        self.read_components(default)
    }

    /// Four components, else `default`.
    pub fn get_vector4d(&self, default: Vector4D) -> Vector4D {
        self.read_components(default)
    }

    /// Four components, else `default`.
    pub fn get_quaternion(&self, default: Quaternion) -> Quaternion {
        self.read_components(default)
    }

    /// Three components, else `default`.
    pub fn get_qangle(&self, default: QAngle) -> QAngle {
        self.read_components(default)
    }

    /// Twelve components, else `default`.
    pub fn get_matrix3x4(&self, default: Matrix3x4) -> Matrix3x4 {
        self.read_components(default)
    }

    // ── Arrays ──────────────────────────────────────────────────

    fn array(&self) -> Option<&'c Array> {
        match self.node.data {
            Data::Array(id) => self.ctx.array(id),
            _ => None,
        }
    }

    /// Element count of a boxed or packed array, 0 otherwise.
    pub fn get_array_element_count(&self) -> usize {
        match &self.node.data {
            Data::Packed(packed) => packed.len(),
            Data::Array(_) => self.array().map_or(0, Array::count),
            _ => 0,
        }
    }

    /// Element `i` of a boxed array.
    ///
    /// Packed arrays have no child values: read them through
    /// [`get_packed_array`](Self::get_packed_array), or address elements
    /// with [`ValueMut::array_element_mut`](crate::ValueMut::array_element_mut),
    /// which normalizes first.
    pub fn get_array_element(&self, i: usize) -> Option<ValueRef<'c, 'a>> {
        let id = self.array()?.element(i)?;
        self.ctx.value(id)
    }

    /// Elements of a boxed array in order.
    pub fn array_elements(&self) -> impl Iterator<Item = ValueRef<'c, 'a>> + 'c {
        let ctx = self.ctx;
        self.array()
            .map_or(&[][..], Array::elements)
            .iter()
            .filter_map(move |id| ctx.value(*id))
    }

    /// The packed payload, if this is a packed array.
    pub fn get_packed_array(&self) -> Option<&'c PackedArray> {
        match &self.node.data {
            Data::Packed(packed) => Some(packed),
            _ => None,
        }
    }

    // ── Tables ──────────────────────────────────────────────────

    fn table(&self) -> Option<&'c Table<'a>> {
        match self.node.data {
            Data::Table(id) => self.ctx.table(id),
            _ => None,
        }
    }

    /// Member count of a table, 0 otherwise.
    pub fn get_member_count(&self) -> usize {
        self.table().map_or(0, Table::count)
    }

    /// Value of member `id`.
    pub fn get_member(&self, id: usize) -> Option<ValueRef<'c, 'a>> {
        let value = self.table()?.member(id)?;
        self.ctx.value(value)
    }

    /// Name of member `id`.
    pub fn get_member_name(&self, id: usize) -> Option<&'c str> {
        let name = self.table()?.name(id)?;
        Some(self.ctx.resolve_name(name))
    }

    /// Name and hash of member `id`; the empty name when out of range.
    pub fn get_member_name_ex(&self, id: usize) -> MemberName<'c> {
        match (self.get_member_hash(id), self.get_member_name(id)) {
            (Some(hash), Some(name)) => MemberName::from_hash(hash, name),
            _ => MemberName::default(),
        }
    }

    /// Hash of member `id`.
    pub fn get_member_hash(&self, id: usize) -> Option<u32> {
        self.table()?.hash(id)
    }

    /// Flags of member `id`.
    pub fn get_member_flags(&self, id: usize) -> Option<MemberFlags> {
        self.table()?.member_flags(id)
    }

    /// Id of the first member named `name`.
    pub fn find_member_id<'n>(&self, name: impl Into<MemberName<'n>>) -> Option<usize> {
        self.table()?.find_member(&name.into())
    }

    /// Value of the first member named `name`.
    pub fn find_member<'n>(&self, name: impl Into<MemberName<'n>>) -> Option<ValueRef<'c, 'a>> {
        let table = self.table()?;
        let id = table.find_member(&name.into())?;
        self.ctx.value(table.member(id)?)
    }

    /// Members in order as `(name, value)` pairs.
    pub fn members(&self) -> impl Iterator<Item = (&'c str, ValueRef<'c, 'a>)> + 'c {
        let this = *self;
        (0..self.get_member_count()).filter_map(move |i| {
            Some((this.get_member_name(i)?, this.get_member(i)?))
        })
    }
}

impl fmt::Debug for ValueRef<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueRef")
            .field("id", &self.id)
            .field("type", &self.get_type_ex())
            .field("subtype", &self.node.subtype)
            .finish()
    }
}
