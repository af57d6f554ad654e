//! Integration tests: building, querying, copying and clearing documents
//! through the public API only.

use kv3_core::{MemberName, SubType, Type, TypeEx};
use kv3_value::{Context, OwnedValue};

// ── Scenarios ───────────────────────────────────────────────────────

#[test]
fn root_table_with_one_member() {
    let mut ctx = Context::new();
    let mut root = ctx.root_mut();
    root.set_to_empty_table();
    root.find_or_create_member("x").0.set_int(42);

    let root = ctx.root();
    assert_eq!(root.get_member(0).map(|v| v.get_int(0)), Some(42));
    assert_eq!(root.get_member_name(0), Some("x"));
    assert_eq!(root.get_member(0).map(|v| v.to_string()).as_deref(), Some("42"));
}

#[test]
fn standalone_float_array() {
    let mut v = OwnedValue::new();
    let mut w = v.get_mut();
    w.set_to_empty_array();
    if let Some(mut e) = w.add_array_element_to_tail() {
        e.set_float(1.5);
    }
    if let Some(mut e) = w.add_array_element_to_tail() {
        e.set_float(2.5);
    }
    assert_eq!(v.get().get_array_element_count(), 2);
    assert_eq!(v.get().get_array_element(1).map(|e| e.get_float(0.0)), Some(2.5));
    assert_eq!(v.get().to_string(), "1.5 2.5");
}

#[test]
fn standalone_to_string() {
    let mut v = OwnedValue::new();
    v.get_mut().set_string("hi", SubType::Unspecified);
    assert_eq!(v.get().to_string(), "hi");

    let mut n = OwnedValue::new();
    n.get_mut().set_int(-7);
    assert_eq!(n.get().to_string(), "-7");
}

// ── Properties ──────────────────────────────────────────────────────

#[test]
fn long_strings_are_owned_copies() {
    let mut text = String::from("a string of some length");
    let mut ctx = Context::new();
    ctx.root_mut().set_string(&text, SubType::String);
    text.replace_range(0..1, "Z");
    assert_eq!(ctx.root().get_string(""), "a string of some length");
    assert_eq!(ctx.root().get_type_ex(), TypeEx::STRING);
}

#[test]
fn find_or_create_is_idempotent() {
    let mut ctx = Context::new();
    let mut root = ctx.root_mut();
    let (first, created) = root.find_or_create_member("health");
    let first = first.id();
    assert!(created);
    let (second, created) = root.find_or_create_member("health");
    assert_eq!(second.id(), first);
    assert!(!created);
}

#[test]
fn append_and_remove_shift_elements() {
    let mut ctx = Context::new();
    let mut root = ctx.root_mut();
    for i in 0..10 {
        if let Some(mut e) = root.add_array_element_to_tail() {
            e.set_int(i);
        }
    }
    assert_eq!(root.view().get_array_element_count(), 10);
    assert!(root.remove_array_element(3));
    let values: Vec<i32> = root.view().array_elements().map(|e| e.get_int(-1)).collect();
    assert_eq!(values, vec![0, 1, 2, 4, 5, 6, 7, 8, 9]);
}

#[test]
fn deep_copy_does_not_share_children() {
    let mut src = Context::new();
    {
        let mut root = src.root_mut();
        let (mut inner, _) = root.find_or_create_member("inner");
        inner.find_or_create_member("hp").0.set_int(10);
        let (mut list, _) = inner.find_or_create_member("list");
        list.set_array_element_count(3, TypeEx::INT, SubType::Int32);
    }

    let mut dst = Context::new();
    assert!(dst.root_mut().copy_from(src.root()));
    {
        let mut root = dst.root_mut();
        let (mut inner, _) = root.find_or_create_member("inner");
        inner.find_or_create_member("hp").0.set_int(99);
        let (mut list, _) = inner.find_or_create_member("list");
        assert!(list.remove_array_element(0));
    }

    let inner = src.root().find_member("inner").unwrap();
    assert_eq!(inner.find_member("hp").map(|v| v.get_int(0)), Some(10));
    assert_eq!(inner.find_member("list").map(|v| v.get_array_element_count()), Some(3));

    let copied = dst.root().find_member("inner").unwrap();
    assert_eq!(copied.find_member("hp").map(|v| v.get_int(0)), Some(99));
    assert_eq!(copied.find_member("list").map(|v| v.get_array_element_count()), Some(2));
}

#[test]
fn clear_resets_root_and_invalidates_everything() {
    let mut ctx = Context::new();
    let mut handles = Vec::new();
    {
        let mut root = ctx.root_mut();
        for name in ["a", "b", "c"] {
            let (mut member, _) = root.find_or_create_member(name);
            member.set_array_element_count(2, TypeEx::DOUBLE, SubType::Unspecified);
            handles.push(member.id());
        }
        handles.push(root.id());
    }
    ctx.clear();

    let root = ctx.root();
    assert_eq!(root.get_type(), Type::Null);
    for id in handles {
        assert!(ctx.value(id).is_none());
    }
    assert_eq!(ctx.stats().values.live(), 1);
    assert_eq!(ctx.stats().arrays.live(), 0);
    assert_eq!(ctx.stats().tables.live(), 0);
}

#[test]
fn pool_contexts_hold_many_roots() {
    let mut ctx = Context::pool();
    let ids: Vec<_> = (0..300).map(|_| ctx.alloc_kv(TypeEx::TABLE, SubType::Unspecified)).collect();
    for (i, id) in ids.iter().enumerate() {
        if let Some(mut v) = ctx.value_mut(*id) {
            v.find_or_create_member("index").0.set_uint64(i as u64);
        }
    }
    assert!(ctx.stats().values.clusters >= 3);
    for id in ids.iter().step_by(2) {
        ctx.free_kv(*id);
    }
    assert_eq!(ctx.stats().values.live(), 300);
    assert_eq!(
        ctx.value(ids[299]).and_then(|v| v.find_member("index")).map(|v| v.get_uint64(0)),
        Some(299)
    );
}

#[test]
fn member_names_with_precomputed_hashes() {
    let mut ctx = Context::new();
    let name = MemberName::new("Angles");
    ctx.root_mut().find_or_create_member(name).0.set_bool(true);
    let again = MemberName::from_hash(name.hash(), "angles");
    assert_eq!(ctx.root().find_member(again).map(|v| v.get_bool(false)), Some(true));
}

// ── Contract violations ─────────────────────────────────────────────

#[test]
#[should_panic(expected = "FATAL: root() called on a pool context (no root available)")]
fn root_of_pool_context() {
    let mut ctx = Context::pool();
    let _ = ctx.root_mut();
}
