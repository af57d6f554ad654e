//! Benchmark documents for the KV3 value format.
//!
//! - [`entity_document`]: a table of entity tables, the shape of a typical
//!   map entity lump
//! - [`wide_table`]: one flat table with enough members to use the
//!   fast-search index

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use kv3_core::{QAngle, SubType, Vector};
use kv3_value::Context;

/// Fill the root of `ctx` with `entities` entity tables.
///
/// Each entity carries a class name, a target name long enough to be
/// stored out of line, an origin, angles, a health value and a short
/// list of outputs.
pub fn entity_document(ctx: &mut Context<'_>, entities: usize) {
    let mut root = ctx.root_mut();
    let (mut list, _) = root.find_or_create_member("entities");
    for i in 0..entities {
        let Some(mut entity) = list.add_array_element_to_tail() else {
            continue;
        };
        entity.set_to_empty_table();
        entity
            .find_or_create_member("classname")
            .0
            .set_string("prop_dynamic", SubType::String);
        entity
            .find_or_create_member("targetname")
            .0
            .set_string(&format!("entity_{i:05}"), SubType::EntityName);
        entity.find_or_create_member("origin").0.set_vector(Vector {
            x: i as f32,
            y: 0.0,
            z: 16.0,
        });
        entity.find_or_create_member("angles").0.set_qangle(QAngle {
            x: 0.0,
            y: 90.0,
            z: 0.0,
        });
        entity.find_or_create_member("health").0.set_int(100);
        let (mut outputs, _) = entity.find_or_create_member("outputs");
        for _ in 0..3 {
            if let Some(mut output) = outputs.add_array_element_to_tail() {
                output.set_string("OnTrigger", SubType::String);
            }
        }
    }
}

/// Fill the root of `ctx` with `members` integer members named
/// `key_{n}`.
pub fn wide_table(ctx: &mut Context<'_>, members: usize) {
    let mut root = ctx.root_mut();
    for i in 0..members {
        root.find_or_create_member(member_name(i).as_str())
            .0
            .set_int(i as i32);
    }
}

/// Name of member `i` in a [`wide_table`].
pub fn member_name(i: usize) -> String {
    format!("key_{i}")
}
