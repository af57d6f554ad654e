//! Deep copies between values.
//!
//! A copy first captures the source subtree into a [`Snapshot`] that
//! borrows nothing, then replays it onto the destination. The same path
//! serves copies inside one context (where the destination may sit inside
//! the source, or the other way round) and copies across contexts.

use kv3_core::{MetaData, SubType, TypeEx};

use crate::alloc::ValueAllocator;
use crate::context::Context;
use crate::table::MemberFlags;
use crate::value::{Data, ShortString, ValueId};

/// A detached copy of a value subtree.
#[derive(Debug)]
pub(crate) struct Snapshot {
    subtype: SubType,
    flags: u8,
    metadata: Option<(MetaData, Option<String>)>,
    body: Body,
}

#[derive(Debug)]
enum Body {
    Leaf(Data<'static>),
    Array(Vec<Snapshot>),
    Table(Vec<Member>),
}

#[derive(Debug)]
struct Member {
    hash: u32,
    name: String,
    value: Snapshot,
}

impl Snapshot {
    /// Capture `id` and everything below it. `None` for a stale handle.
    pub(crate) fn capture(ctx: &Context<'_>, id: ValueId) -> Option<Self> {
        let value = ctx.value(id)?;
        let metadata = ctx.metadata(id).map(|md| {
            let name = md.name.and_then(|s| ctx.resolve_symbol(s));
            (md.clone(), name.map(str::to_owned))
        });
        let body = match value.data() {
            Data::Array(_) => Body::Array(
                value
                    .array_elements()
                    .filter_map(|child| Self::capture(ctx, child.id()))
                    .collect(),
            ),
            Data::Table(_) => Body::Table(
                (0..value.get_member_count())
                    .filter_map(|i| {
                        Some(Member {
                            hash: value.get_member_hash(i)?,
                            name: value.get_member_name(i)?.to_owned(),
                            value: Self::capture(ctx, value.get_member(i)?.id())?,
                        })
                    })
                    .collect(),
            ),
            leaf => Body::Leaf(leaf.detach()?),
        };
        Some(Self {
            subtype: value.get_sub_type(),
            flags: value.flags(),
            metadata,
            body,
        })
    }

    /// Replay onto `dst`, replacing whatever it held.
    ///
    /// Strings are stored again, inline when short. Member names are
    /// stored by `ctx` and keep their original hashes. Metadata is copied
    /// only when `ctx` keeps metadata; a source without a record clears
    /// the destination's. Returns `false` for a stale `dst`.
    pub(crate) fn apply(self, ctx: &mut Context<'_>, dst: ValueId) -> bool {
        if ctx.node(dst).is_none() {
            return false;
        }
        ctx.set_data(dst, Data::Null, SubType::Null);
        if ctx.is_metadata_enabled() {
            ctx.apply_metadata(dst, self.metadata);
        }

        match self.body {
            Body::Leaf(data) => {
                let data = match data {
                    Data::String(s) => match ShortString::new(&s) {
                        Some(short) => Data::ShortString(short),
                        None => Data::String(s),
                    },
                    other => other,
                };
                ctx.set_data(dst, data, self.subtype);
            }
            Body::Array(elements) => {
                ctx.prepare_for_type(dst, TypeEx::ARRAY, self.subtype);
                let Some(Data::Array(array_id)) = ctx.node(dst).map(|node| &node.data) else {
                    return false;
                };
                let array_id = *array_id;
                let children = ctx
                    .with_array(array_id, |array, ctx| {
                        array.set_count(ctx, elements.len(), TypeEx::NULL, SubType::Null);
                        array.elements().to_vec()
                    })
                    .unwrap_or_default();
                for (child, element) in children.into_iter().zip(elements) {
                    element.apply(ctx, child);
                }
            }
            Body::Table(members) => {
                ctx.prepare_for_type(dst, TypeEx::TABLE, self.subtype);
                let Some(Data::Table(table_id)) = ctx.node(dst).map(|node| &node.data) else {
                    return false;
                };
                let table_id = *table_id;
                let children = ctx
                    .with_table(table_id, |table, ctx| {
                        table.remove_all(ctx, members.len());
                        let ids: Vec<_> = members
                            .iter()
                            .map(|member| {
                                let name = ctx.store_name(&member.name);
                                let id =
                                    table.push_member(ctx, member.hash, name, MemberFlags::empty());
                                table.member(id)
                            })
                            .collect();
                        table.enable_fast_search_if_large();
                        ids
                    })
                    .unwrap_or_default();
                for (child, member) in children.into_iter().zip(members) {
                    if let Some(child) = child {
                        member.value.apply(ctx, child);
                    }
                }
            }
        }

        if let Some(node) = ctx.values.get_mut(dst.0) {
            node.subtype = self.subtype;
            node.flags = self.flags;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kv3_core::{MetaDataFlags, Type};

    fn sample(ctx: &mut Context<'_>) -> ValueId {
        let root = ctx.root_id();
        let mut v = ctx.root_mut();
        v.find_or_create_member("name").0.set_string("a longer string", SubType::EntityName);
        v.find_or_create_member("short").0.set_string("abc", SubType::String);
        v.find_or_create_member("pos").0.set_vector(kv3_core::Vector { x: 1.0, y: 2.0, z: 3.0 });
        let (mut list, _) = v.find_or_create_member("list");
        list.add_array_element_to_tail().unwrap().set_int(4);
        list.add_array_element_to_tail().unwrap().set_to_binary_blob(&[9, 9]);
        list.set_flags(3);
        root
    }

    #[test]
    fn cross_context_copy_is_deep() {
        let mut src = Context::new();
        let root = sample(&mut src);

        let mut dst = Context::heap();
        let dst_root = dst.root_id();
        let snapshot = Snapshot::capture(&src, root).unwrap();
        assert!(snapshot.apply(&mut dst, dst_root));
        src.clear();

        let copy = dst.root();
        assert_eq!(copy.get_member_count(), 4);
        let name = copy.find_member("name").unwrap();
        assert_eq!(name.get_string(""), "a longer string");
        assert_eq!(name.get_sub_type(), SubType::EntityName);
        assert_eq!(copy.find_member("short").unwrap().get_type_ex(), TypeEx::STRING_SHORT);
        assert_eq!(copy.find_member("pos").unwrap().get_type_ex(), TypeEx::ARRAY_FLOAT32);
        let list = copy.find_member("list").unwrap();
        assert_eq!(list.flags(), 3);
        assert_eq!(list.get_array_element(0).map(|e| e.get_int(0)), Some(4));
        assert_eq!(
            list.get_array_element(1).and_then(|e| e.get_binary_blob()),
            Some(&[9u8, 9][..])
        );
    }

    #[test]
    fn copying_a_parent_into_its_child() {
        let mut ctx = Context::new();
        let root = sample(&mut ctx);
        let list = ctx.root().find_member("list").unwrap().id();
        assert!(ctx.copy_within(list, root));

        let list = ctx.value(list).unwrap();
        assert_eq!(list.get_type(), Type::Table);
        assert_eq!(list.get_member_count(), 4);
        let inner = list.find_member("list").unwrap();
        assert_eq!(inner.get_array_element_count(), 2);
    }

    #[test]
    fn copying_a_child_over_its_parent() {
        let mut ctx = Context::new();
        let root = sample(&mut ctx);
        let list = ctx.root().find_member("list").unwrap().id();
        assert!(ctx.copy_within(root, list));
        assert_eq!(ctx.root().get_type(), Type::Array);
        assert_eq!(ctx.root().get_array_element_count(), 2);
        assert!(ctx.value(list).is_none());
        assert_eq!(ctx.stats().tables.live(), 0);
    }

    #[test]
    fn external_strings_become_owned() {
        let text = String::from("borrowed for a while");
        let mut src = Context::new();
        src.root_mut().set_string_external(&text, SubType::String);
        let snapshot = Snapshot::capture(&src, src.root_id()).unwrap();
        drop(src);
        drop(text);

        let mut dst = Context::new();
        let dst_root = dst.root_id();
        assert!(snapshot.apply(&mut dst, dst_root));
        assert_eq!(dst.root().get_type_ex(), TypeEx::STRING);
        assert_eq!(dst.root().get_string(""), "borrowed for a while");
    }

    #[test]
    fn metadata_follows_only_into_enabled_contexts() {
        let mut src = Context::new();
        src.enable_metadata(true);
        let root = src.root_id();
        src.root_mut().set_int(1);
        if let Some(md) = src.metadata_mut(root) {
            md.line = 4;
            md.flags = MetaDataFlags::MULTILINE_STRING;
        }

        let mut plain = Context::new();
        assert!(plain.root_mut().copy_from(src.root()));
        assert!(plain.metadata(plain.root_id()).is_none());

        let mut tracked = Context::new();
        tracked.enable_metadata(true);
        let dst = tracked.root_id();
        assert!(tracked.root_mut().copy_from(src.root()));
        assert_eq!(tracked.metadata(dst).map(|md| md.line), Some(4));

        let bare = Context::new();
        assert!(tracked.root_mut().copy_from(bare.root()));
        assert!(tracked.metadata(dst).is_some_and(MetaData::is_empty));
    }

    #[test]
    fn copied_member_names_keep_hashes() {
        let mut src = Context::new();
        src.root_mut().find_or_create_member("Origin");
        let mut dst = Context::heap();
        dst.root_mut().copy_from(src.root());
        let copy = dst.root();
        assert_eq!(copy.get_member_name(0), Some("Origin"));
        assert_eq!(copy.get_member_hash(0), src.root().get_member_hash(0));
        assert!(copy.find_member("origin").is_some());
    }
}
