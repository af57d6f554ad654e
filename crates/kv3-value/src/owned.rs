//! Values that live outside any caller-managed context.

use std::fmt;

use kv3_core::{SubType, TypeEx};

use crate::context::Context;
use crate::copy::Snapshot;
use crate::read::ValueRef;
use crate::write::ValueMut;

/// A standalone value.
///
/// Backed by a private heap-mode [`Context`] with a root, so children are
/// allocated individually and released as soon as they are dropped from
/// the tree.
pub struct OwnedValue<'a> {
    ctx: Context<'a>,
}

impl<'a> OwnedValue<'a> {
    /// A null value.
    pub fn new() -> Self {
        Self {
            ctx: Context::heap(),
        }
    }

    /// A value of the given type, empty or zero.
    pub fn with_type(type_ex: TypeEx, subtype: SubType) -> Self {
        let mut value = Self::new();
        value.get_mut().prepare_for_type(type_ex, subtype);
        value
    }

    /// Read access.
    pub fn get(&self) -> ValueRef<'_, 'a> {
        self.ctx.root()
    }

    /// Write access.
    pub fn get_mut(&mut self) -> ValueMut<'_, 'a> {
        self.ctx.root_mut()
    }

    /// The backing context.
    pub fn context(&self) -> &Context<'a> {
        &self.ctx
    }
}

impl Default for OwnedValue<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for OwnedValue<'_> {
    fn clone(&self) -> Self {
        let mut out = Self::new();
        let root = out.ctx.root_id();
        if let Some(snapshot) = Snapshot::capture(&self.ctx, self.ctx.root_id()) {
            snapshot.apply(&mut out.ctx, root);
        }
        out
    }
}

impl fmt::Debug for OwnedValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OwnedValue").field(&self.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kv3_core::Type;

    #[test]
    fn with_type_builds_empty_containers() {
        let table = OwnedValue::with_type(TypeEx::TABLE, SubType::Unspecified);
        assert_eq!(table.get().get_type(), Type::Table);
        assert_eq!(table.get().get_sub_type(), SubType::Table);
        assert_eq!(table.get().get_member_count(), 0);

        let text = OwnedValue::with_type(TypeEx::STRING, SubType::Unspecified);
        assert_eq!(text.get().get_string("x"), "");
    }

    #[test]
    fn clones_are_independent() {
        let mut original = OwnedValue::new();
        original.get_mut().find_or_create_member("hp").0.set_int(100);

        let copy = original.clone();
        original.get_mut().find_or_create_member("hp").0.set_int(1);
        original.get_mut().find_or_create_member("extra");

        assert_eq!(copy.get().get_member_count(), 1);
        assert_eq!(copy.get().find_member("hp").map(|v| v.get_int(0)), Some(100));
        assert_eq!(original.get().find_member("HP").map(|v| v.get_int(0)), Some(1));
    }

    #[test]
    fn children_use_the_heap_tier() {
        let mut value = OwnedValue::new();
        value
            .get_mut()
            .set_array_element_count(4, TypeEx::INT, SubType::Unspecified);
        let stats = value.context().stats();
        assert_eq!(stats.values.heap_live, 5);
        assert_eq!(stats.values.clusters, 0);
        value.get_mut().set_to_null();
        assert_eq!(value.context().stats().values.heap_live, 1);
    }
}
