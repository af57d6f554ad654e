//! Exclusive, mutating access to a value.
//!
//! Every setter releases the old payload before installing the new one.
//! Array writers promote a null value to an empty array and normalize
//! packed arrays; other types are left alone. Table writers promote any
//! value of another type to an empty table.

use std::borrow::Cow;

use kv3_core::fatal::fatal;
use kv3_core::geometry::FloatComponents;
use kv3_core::{
    Color, EHandle, Matrix3x4, MemberName, QAngle, Quaternion, StringToken, SubType, TypeEx,
    Vector, Vector2D, Vector4D,
};

use crate::context::Context;
use crate::copy::Snapshot;
use crate::packed::PackedArray;
use crate::read::ValueRef;
use crate::value::{ArrayId, Data, ShortString, TableId, ValueId, INVALID_VALUE};

/// A live value with exclusive access to its context.
pub struct ValueMut<'c, 'a> {
    ctx: &'c mut Context<'a>,
    id: ValueId,
}

enum ArrayState {
    Boxed(ArrayId),
    Packed,
    Empty,
    Other,
}

impl<'c, 'a> ValueMut<'c, 'a> {
    pub(crate) fn new(ctx: &'c mut Context<'a>, id: ValueId) -> Self {
        Self { ctx, id }
    }

    /// Handle of this value.
    pub fn id(&self) -> ValueId {
        self.id
    }

    /// The owning context.
    pub fn context(&mut self) -> &mut Context<'a> {
        self.ctx
    }

    /// Shared view of this value.
    pub fn view(&self) -> ValueRef<'_, 'a> {
        match self.ctx.value(self.id) {
            Some(value) => value,
            None => ValueRef::new(self.ctx, self.id, &INVALID_VALUE),
        }
    }

    /// A shorter-lived cursor on the same value.
    pub fn reborrow(&mut self) -> ValueMut<'_, 'a> {
        ValueMut::new(self.ctx, self.id)
    }

    /// Set the free-form flag byte.
    pub fn set_flags(&mut self, flags: u8) {
        if let Some(node) = self.ctx.values.get_mut(self.id.0) {
            node.flags = flags;
        }
    }

    /// Retag this value; see [`Context::alloc_kv`] for subtype resolution.
    ///
    /// Keeping the same array or table type only changes the subtype.
    pub fn prepare_for_type(&mut self, type_ex: TypeEx, subtype: SubType) {
        self.ctx.prepare_for_type(self.id, type_ex, subtype);
    }

    fn set(&mut self, data: Data<'a>, subtype: SubType) {
        let subtype = subtype.or_resolved(data.type_ex().base());
        self.ctx.set_data(self.id, data, subtype);
    }

    // ── Scalars ─────────────────────────────────────────────────

    /// Make this value null.
    pub fn set_to_null(&mut self) {
        self.set(Data::Null, SubType::Null);
    }

    /// Store a boolean.
    pub fn set_bool(&mut self, v: bool) {
        self.set(Data::Bool(v), SubType::Bool8);
    }

    /// Store an 8-bit character.
    pub fn set_char(&mut self, v: i8) {
        self.set(Data::Int(i64::from(v)), SubType::Char8);
    }

    /// Store a 32-bit code point.
    pub fn set_uchar32(&mut self, v: u32) {
        self.set(Data::UInt(u64::from(v)), SubType::UChar32);
    }

    /// Store an `i8`.
    pub fn set_int8(&mut self, v: i8) {
        self.set(Data::Int(i64::from(v)), SubType::Int8);
    }

    /// Store a `u8`.
    pub fn set_uint8(&mut self, v: u8) {
        self.set(Data::UInt(u64::from(v)), SubType::UInt8);
    }

    /// Store an `i16`.
    pub fn set_short(&mut self, v: i16) {
        self.set(Data::Int(i64::from(v)), SubType::Int16);
    }

    /// Store a `u16`.
    pub fn set_ushort(&mut self, v: u16) {
        self.set(Data::UInt(u64::from(v)), SubType::UInt16);
    }

    /// Store an `i32`.
    pub fn set_int(&mut self, v: i32) {
        self.set(Data::Int(i64::from(v)), SubType::Int32);
    }

    /// Store a `u32`.
    pub fn set_uint(&mut self, v: u32) {
        self.set(Data::UInt(u64::from(v)), SubType::UInt32);
    }

    /// Store an `i64`.
    pub fn set_int64(&mut self, v: i64) {
        self.set(Data::Int(v), SubType::Int64);
    }

    /// Store a `u64`.
    pub fn set_uint64(&mut self, v: u64) {
        self.set(Data::UInt(v), SubType::UInt64);
    }

    /// Store an `f32`.
    pub fn set_float(&mut self, v: f32) {
        self.set(Data::Double(f64::from(v)), SubType::Float32);
    }

    /// Store an `f64`.
    pub fn set_double(&mut self, v: f64) {
        self.set(Data::Double(v), SubType::Float64);
    }

    /// Store an opaque pointer-sized value.
    pub fn set_pointer(&mut self, v: u64) {
        self.set(Data::UInt(v), SubType::Pointer);
    }

    /// Store a string token.
    pub fn set_string_token(&mut self, token: StringToken) {
        self.set(Data::UInt(u64::from(token.0)), SubType::StringToken);
    }

    /// Store an entity handle.
    pub fn set_ehandle(&mut self, handle: EHandle) {
        self.set(Data::UInt(u64::from(handle.0)), SubType::EHandle);
    }

    // ── Strings and blobs ───────────────────────────────────────

    /// Store a copy of `s`. Up to seven bytes are kept inline.
    pub fn set_string(&mut self, s: &str, subtype: SubType) {
        let data = match ShortString::new(s) {
            Some(short) => Data::ShortString(short),
            None => Data::String(Box::from(s)),
        };
        self.set(data, subtype);
    }

    /// Borrow `s` for the context's lifetime. Up to seven bytes are still
    /// copied inline.
    pub fn set_string_external(&mut self, s: &'a str, subtype: SubType) {
        let data = match ShortString::new(s) {
            Some(short) => Data::ShortString(short),
            None => Data::ExternString(s),
        };
        self.set(data, subtype);
    }

    /// Store a copy of `bytes`.
    pub fn set_to_binary_blob(&mut self, bytes: &[u8]) {
        self.set(Data::Blob(Box::from(bytes)), SubType::BinaryBlob);
    }

    /// Store a blob borrowed from the caller, or handed over by it.
    pub fn set_to_binary_blob_external(&mut self, blob: Cow<'a, [u8]>) {
        self.set(Data::ExternBlob(blob), SubType::BinaryBlob);
    }

    // ── Packed arrays and geometry ──────────────────────────────

    fn set_packed(&mut self, packed: PackedArray, subtype: SubType) {
        self.set(Data::Packed(packed), subtype);
    }

    /// Replace the payload with a boxed array of the given leaf payloads.
    fn set_boxed(
        &mut self,
        items: Vec<Data<'a>>,
        (type_ex, element_subtype): (TypeEx, SubType),
        subtype: SubType,
    ) {
        self.set_to_null();
        self.prepare_for_type(TypeEx::ARRAY, subtype);
        let Some(array_id) = self.array_id() else {
            return;
        };
        let children = self
            .ctx
            .with_array(array_id, |array, ctx| {
                array.set_count(ctx, items.len(), type_ex, element_subtype);
                array.elements().to_vec()
            })
            .unwrap_or_default();
        for (child, data) in children.into_iter().zip(items) {
            if let Some(node) = self.ctx.values.get_mut(child.0) {
                node.data = data;
            }
        }
    }

    /// Store `f32` elements packed when they fit, else boxed.
    pub fn set_array_float32(&mut self, data: &[f32], subtype: SubType) {
        match PackedArray::from_f32(data) {
            Some(packed) => self.set_packed(packed, subtype),
            None => self.set_boxed(
                data.iter().map(|v| Data::Double(f64::from(*v))).collect(),
                (TypeEx::DOUBLE, SubType::Float32),
                subtype,
            ),
        }
    }

    /// Store `f64` elements packed when they fit, else boxed.
    pub fn set_array_float64(&mut self, data: &[f64], subtype: SubType) {
        match PackedArray::from_f64(data) {
            Some(packed) => self.set_packed(packed, subtype),
            None => self.set_boxed(
                data.iter().map(|v| Data::Double(*v)).collect(),
                (TypeEx::DOUBLE, SubType::Float64),
                subtype,
            ),
        }
    }

    /// Store `i16` elements inline, packed, or boxed, whichever fits first.
    pub fn set_array_int16(&mut self, data: &[i16], subtype: SubType) {
        match PackedArray::from_i16(data) {
            Some(packed) => self.set_packed(packed, subtype),
            None => self.set_boxed(
                data.iter().map(|v| Data::Int(i64::from(*v))).collect(),
                (TypeEx::INT, SubType::Int16),
                subtype,
            ),
        }
    }

    /// Store `i32` elements packed when they fit, else boxed.
    pub fn set_array_int32(&mut self, data: &[i32], subtype: SubType) {
        match PackedArray::from_i32(data) {
            Some(packed) => self.set_packed(packed, subtype),
            None => self.set_boxed(
                data.iter().map(|v| Data::Int(i64::from(*v))).collect(),
                (TypeEx::INT, SubType::Int32),
                subtype,
            ),
        }
    }

    /// Store `u8` elements inline when eight or fewer, else boxed.
    pub fn set_array_uint8(&mut self, data: &[u8], subtype: SubType) {
        match PackedArray::from_u8(data) {
            Some(packed) => self.set_packed(packed, subtype),
            None => self.set_boxed(
                data.iter().map(|v| Data::UInt(u64::from(*v))).collect(),
                (TypeEx::UINT, SubType::UInt8),
                subtype,
            ),
        }
    }

    /// Store a color as three channels when opaque, else four.
    pub fn set_color(&mut self, color: Color) {
        let channels = color.to_array();
        let len = if color.a == 255 { 3 } else { 4 };
        self.set_array_uint8(&channels[..len], SubType::Color32);
    }

    fn set_components<G: FloatComponents>(&mut self, value: &G, subtype: SubType) {
        let mut buf = [0.0f32; 12];
        let components = &mut buf[..G::LEN];
        value.write_components(components);
        self.set_array_float32(components, subtype);
    }

    /// Store a 3-component vector.
    pub fn set_vector(&mut self, v: Vector) {
        self.set_components(&v, SubType::Vector);
    }

    /// Store a 2-component vector.
    pub fn set_vector2d(&mut self, v: Vector2D) {
        self.set_components(&v, SubType::Vector2D);
    }

    /// Store a 4-component vector.
    pub fn set_vector4d(&mut self, v: Vector4D) {
        self.set_components(&v, SubType::Vector4D);
    }

    /// Store a quaternion.
    pub fn set_quaternion(&mut self, q: Quaternion) {
        self.set_components(&q, SubType::Quaternion);
    }

    /// Store Euler angles.
    pub fn set_qangle(&mut self, a: QAngle) {
        self.set_components(&a, SubType::QAngle);
    }

    /// Store a 3x4 matrix.
    pub fn set_matrix3x4(&mut self, m: Matrix3x4) {
        self.set_components(&m, SubType::Matrix3x4);
    }

    /// Convert a packed array into a boxed array of child values.
    pub fn normalize_array(&mut self) {
        self.ctx.normalize(self.id);
    }

    // ── Arrays ──────────────────────────────────────────────────

    fn array_state(&self) -> ArrayState {
        match self.ctx.node(self.id).map(|node| &node.data) {
            Some(Data::Array(id)) => ArrayState::Boxed(*id),
            Some(Data::Packed(_)) => ArrayState::Packed,
            Some(Data::Null | Data::Invalid) => ArrayState::Empty,
            _ => ArrayState::Other,
        }
    }

    fn array_id(&self) -> Option<ArrayId> {
        match self.array_state() {
            ArrayState::Boxed(id) => Some(id),
            _ => None,
        }
    }

    /// The boxed array behind this value, normalizing a packed array.
    fn boxed_array(&mut self) -> Option<ArrayId> {
        match self.array_state() {
            ArrayState::Boxed(id) => Some(id),
            ArrayState::Packed => {
                self.ctx.normalize(self.id);
                self.array_id()
            }
            ArrayState::Empty | ArrayState::Other => None,
        }
    }

    /// Like `boxed_array`, but a null value becomes an empty array first.
    fn ensure_array(&mut self) -> Option<ArrayId> {
        if let ArrayState::Empty = self.array_state() {
            self.prepare_for_type(TypeEx::ARRAY, SubType::Array);
        }
        self.boxed_array()
    }

    fn child(&mut self, id: Option<ValueId>) -> Option<ValueMut<'_, 'a>> {
        let id = id?;
        self.ctx.values.get(id.0)?;
        Some(ValueMut::new(self.ctx, id))
    }

    /// Element `i`, normalizing a packed array first.
    pub fn array_element_mut(&mut self, i: usize) -> Option<ValueMut<'_, 'a>> {
        let array_id = self.boxed_array()?;
        let element = self.ctx.array(array_id)?.element(i);
        self.child(element)
    }

    /// Insert a null element before position `i` (`i == count` appends).
    ///
    /// `None` when `i` is past the end or the value is neither null nor an
    /// array.
    pub fn insert_array_element_before(&mut self, i: usize) -> Option<ValueMut<'_, 'a>> {
        let array_id = self.ensure_array()?;
        let element = self
            .ctx
            .with_array(array_id, |array, ctx| {
                let at = array.insert_multiple_before(ctx, i, 1)?;
                array.element(at)
            })
            .flatten();
        self.child(element)
    }

    /// Insert a null element after position `i`.
    pub fn insert_array_element_after(&mut self, i: usize) -> Option<ValueMut<'_, 'a>> {
        self.insert_array_element_before(i.checked_add(1)?)
    }

    /// Append a null element.
    pub fn add_array_element_to_tail(&mut self) -> Option<ValueMut<'_, 'a>> {
        let array_id = self.ensure_array()?;
        let count = self.ctx.array(array_id)?.count();
        self.insert_array_element_before(count)
    }

    /// Resize to `count` elements; new elements get the given type.
    pub fn set_array_element_count(&mut self, count: usize, type_ex: TypeEx, subtype: SubType) {
        let Some(array_id) = self.ensure_array() else {
            return;
        };
        self.ctx.with_array(array_id, |array, ctx| {
            array.set_count(ctx, count, type_ex, subtype);
        });
    }

    /// Make this value an empty boxed array.
    pub fn set_to_empty_array(&mut self) {
        self.prepare_for_type(TypeEx::ARRAY, SubType::Array);
        self.set_array_element_count(0, TypeEx::NULL, SubType::Null);
    }

    /// Remove `count` elements starting at `i`.
    ///
    /// Returns `false` (and changes nothing) for a value that is not an
    /// array or a range outside it.
    pub fn remove_array_elements(&mut self, i: usize, count: usize) -> bool {
        let Some(array_id) = self.boxed_array() else {
            return false;
        };
        self.ctx
            .with_array(array_id, |array, ctx| array.remove_multiple(ctx, i, count))
            .unwrap_or(false)
    }

    /// Remove element `i`.
    pub fn remove_array_element(&mut self, i: usize) -> bool {
        self.remove_array_elements(i, 1)
    }

    // ── Tables ──────────────────────────────────────────────────

    fn table_id(&self) -> Option<TableId> {
        match self.ctx.node(self.id).map(|node| &node.data) {
            Some(Data::Table(id)) => Some(*id),
            _ => None,
        }
    }

    fn ensure_table(&mut self) -> Option<TableId> {
        if let Some(id) = self.table_id() {
            return Some(id);
        }
        self.prepare_for_type(TypeEx::TABLE, SubType::Table);
        self.table_id()
    }

    /// Value of member `id`.
    pub fn member_mut(&mut self, id: usize) -> Option<ValueMut<'_, 'a>> {
        let table_id = self.table_id()?;
        let member = self.ctx.table(table_id)?.member(id);
        self.child(member)
    }

    /// Value of the first member named `name`.
    pub fn find_member_mut<'n>(
        &mut self,
        name: impl Into<MemberName<'n>>,
    ) -> Option<ValueMut<'_, 'a>> {
        let table_id = self.table_id()?;
        let table = self.ctx.table(table_id)?;
        let member = table.find_member(&name.into()).and_then(|i| table.member(i));
        self.child(member)
    }

    fn find_or_create_with(
        &mut self,
        name: MemberName<'_>,
        external: Option<&'a str>,
    ) -> (ValueMut<'_, 'a>, bool) {
        let found = self.ensure_table().and_then(|table_id| {
            self.ctx.with_table(table_id, |table, ctx| {
                let (id, created) = match table.find_member(&name) {
                    Some(id) => (id, false),
                    None => match external {
                        Some(text) => (table.create_member_external(ctx, text), true),
                        None => (table.create_member(ctx, name), true),
                    },
                };
                table.member(id).map(|member| (member, created))
            })
        });
        match found.flatten() {
            Some((member, created)) => (ValueMut::new(self.ctx, member), created),
            None => fatal("find_or_create_member: value is no longer live"),
        }
    }

    /// The first member named `name`, created (null) if missing.
    ///
    /// Promotes a non-table value to an empty table first. The flag is
    /// `true` when the member was created.
    pub fn find_or_create_member<'n>(
        &mut self,
        name: impl Into<MemberName<'n>>,
    ) -> (ValueMut<'_, 'a>, bool) {
        self.find_or_create_with(name.into(), None)
    }

    /// Like [`find_or_create_member`](Self::find_or_create_member), but a
    /// created member borrows `name` instead of storing it.
    pub fn find_or_create_member_external(&mut self, name: &'a str) -> (ValueMut<'_, 'a>, bool) {
        self.find_or_create_with(MemberName::new(name), Some(name))
    }

    /// Make this value an empty table.
    pub fn set_to_empty_table(&mut self) {
        if let Some(table_id) = self.ensure_table() {
            self.ctx
                .with_table(table_id, |table, ctx| table.remove_all(ctx, 0));
        }
    }

    /// Remove member `id`.
    pub fn remove_member(&mut self, id: usize) -> bool {
        let Some(table_id) = self.table_id() else {
            return false;
        };
        self.ctx
            .with_table(table_id, |table, ctx| table.remove_member(ctx, id))
            .unwrap_or(false)
    }

    /// Remove the first member named `name`.
    pub fn remove_member_by_name<'n>(&mut self, name: impl Into<MemberName<'n>>) -> bool {
        let name = name.into();
        let Some(table_id) = self.table_id() else {
            return false;
        };
        self.ctx
            .with_table(table_id, |table, ctx| match table.find_member(&name) {
                Some(id) => table.remove_member(ctx, id),
                None => false,
            })
            .unwrap_or(false)
    }

    /// Remove the member whose value is `value`.
    pub fn remove_member_value(&mut self, value: ValueId) -> bool {
        let Some(table_id) = self.table_id() else {
            return false;
        };
        self.ctx
            .with_table(table_id, |table, ctx| match table.find_member_value(value) {
                Some(id) => table.remove_member(ctx, id),
                None => false,
            })
            .unwrap_or(false)
    }

    /// Remove every member, reserving room for `hint` new ones.
    pub fn remove_all_members(&mut self, hint: usize) {
        if let Some(table_id) = self.table_id() {
            self.ctx
                .with_table(table_id, |table, ctx| table.remove_all(ctx, hint));
        }
    }

    // ── Copying ─────────────────────────────────────────────────

    /// Deep-copy `src` (from any other context) onto this value.
    ///
    /// Tags, flags, children and, when this context keeps metadata, the
    /// metadata records are copied. Same-context copies go through
    /// [`Context::copy_within`].
    pub fn copy_from(&mut self, src: ValueRef<'_, '_>) -> bool {
        let Some(snapshot) = Snapshot::capture(src.context(), src.id()) else {
            return false;
        };
        snapshot.apply(self.ctx, self.id)
    }
}

impl std::fmt::Debug for ValueMut<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.view(), f)
    }
}
