//! The table container.
//!
//! A [`Table`] keeps four parallel arrays (hashes, child values, names,
//! per-member flags) of equal length. Members stay in insertion order;
//! removing one shifts every later member down. Duplicate names are
//! allowed and lookups return the first match.

use std::cell::{Ref, RefCell};

use bitflags::bitflags;
use kv3_arena::{ClusterNode, SymbolTable};
use kv3_core::fatal::fatal;
use kv3_core::growth::{
    align8, calc_new_buffer_size, ALLOC_TABLE_MAX, ALLOC_TABLE_MIN, FAST_SEARCH_THRESHOLD,
    TABLE_MAX_FIXED_MEMBERS,
};
use kv3_core::{MemberName, SubType, Symbol, TypeEx};
use smallvec::SmallVec;

use crate::alloc::ValueAllocator;
use crate::fast_search::{FastSearch, Lookup};
use crate::value::ValueId;

bitflags! {
    /// Per-member flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MemberFlags: u8 {
        /// The name is borrowed from the caller.
        const NAME_EXTERNAL = 1;
    }
}

/// Where a member's name text lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoredName<'a> {
    /// Interned in the owning context's symbol table.
    Interned(Symbol),
    /// Owned by the table.
    Owned(Box<str>),
    /// Borrowed from the caller for the context's lifetime.
    External(&'a str),
}

impl<'a> StoredName<'a> {
    /// The name text. Interned names resolve through `symbols`.
    pub fn resolve<'s>(&'s self, symbols: &'s SymbolTable) -> &'s str {
        match self {
            StoredName::Interned(symbol) => symbols.resolve(*symbol).unwrap_or_default(),
            StoredName::Owned(name) => name,
            StoredName::External(name) => name,
        }
    }
}

type Inline<T> = SmallVec<[T; TABLE_MAX_FIXED_MEMBERS]>;

/// Named, ordered child values.
#[derive(Debug, Default)]
pub struct Table<'a> {
    hashes: Inline<u32>,
    members: Inline<ValueId>,
    names: Inline<StoredName<'a>>,
    flags: Inline<MemberFlags>,
    allocated: usize,
    initial_size: u8,
    dynamic: bool,
    fast_search: RefCell<FastSearch>,
}

impl<'a> Table<'a> {
    /// An empty table whose baseline capacity covers `initial_size`.
    pub fn new(initial_size: usize) -> Self {
        let allocated = initial_size.max(TABLE_MAX_FIXED_MEMBERS);
        Self {
            hashes: SmallVec::with_capacity(allocated),
            members: SmallVec::with_capacity(allocated),
            names: SmallVec::with_capacity(allocated),
            flags: SmallVec::with_capacity(allocated),
            allocated,
            initial_size: initial_size.min(usize::from(u8::MAX)) as u8,
            dynamic: false,
            fast_search: RefCell::new(FastSearch::Absent),
        }
    }

    /// Number of members.
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Whether the table has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members the current buffers hold without growing.
    pub fn capacity(&self) -> usize {
        self.allocated
    }

    /// Whether the buffers have grown past their baseline.
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Child value of member `id`.
    pub fn member(&self, id: usize) -> Option<ValueId> {
        self.members.get(id).copied()
    }

    /// All child values in member order.
    pub fn members(&self) -> &[ValueId] {
        &self.members
    }

    /// Name hash of member `id`.
    pub fn hash(&self, id: usize) -> Option<u32> {
        self.hashes.get(id).copied()
    }

    /// All name hashes in member order.
    pub fn hashes(&self) -> &[u32] {
        &self.hashes
    }

    /// Stored name of member `id`.
    pub fn name(&self, id: usize) -> Option<&StoredName<'a>> {
        self.names.get(id)
    }

    /// Flags of member `id`.
    pub fn member_flags(&self, id: usize) -> Option<MemberFlags> {
        self.flags.get(id).copied()
    }

    /// Current state of the member index.
    pub fn fast_search(&self) -> Ref<'_, FastSearch> {
        self.fast_search.borrow()
    }

    /// Make room for `count` members.
    ///
    /// With `force` the buffers grow to exactly `count`; otherwise growth
    /// follows the shared buffer policy. Never shrinks.
    pub fn ensure_member_capacity(&mut self, count: usize, force: bool) {
        if count <= self.allocated {
            return;
        }
        if count > ALLOC_TABLE_MAX {
            fatal(&format!(
                "ensure_member_capacity: member count overflow ({count})"
            ));
        }
        let new_allocated = if force {
            count
        } else {
            calc_new_buffer_size(self.allocated, count, ALLOC_TABLE_MIN, ALLOC_TABLE_MAX)
        };
        let extra = new_allocated.saturating_sub(self.members.len());
        self.hashes.reserve_exact(extra);
        self.members.reserve_exact(extra);
        self.names.reserve_exact(extra);
        self.flags.reserve_exact(extra);
        self.allocated = new_allocated;
        self.dynamic = true;
    }

    /// Append a member with a fresh null value; the name is stored the
    /// allocator's way. Returns the new member id.
    pub fn create_member(
        &mut self,
        alloc: &mut impl ValueAllocator<'a>,
        name: MemberName<'_>,
    ) -> usize {
        let stored = alloc.store_name(name.as_str());
        self.push_member(alloc, name.hash(), stored, MemberFlags::empty())
    }

    /// Append a member whose name is borrowed from the caller.
    pub fn create_member_external(
        &mut self,
        alloc: &mut impl ValueAllocator<'a>,
        name: &'a str,
    ) -> usize {
        let hash = MemberName::new(name).hash();
        self.push_member(
            alloc,
            hash,
            StoredName::External(name),
            MemberFlags::NAME_EXTERNAL,
        )
    }

    /// Append a member with an already stored name and hash.
    pub(crate) fn push_member(
        &mut self,
        alloc: &mut impl ValueAllocator<'a>,
        hash: u32,
        name: StoredName<'a>,
        flags: MemberFlags,
    ) -> usize {
        if self.count() >= FAST_SEARCH_THRESHOLD {
            self.fast_search.get_mut().enable(&self.hashes);
        }
        let id = self.count();
        self.ensure_member_capacity(id + 1, false);

        let value = alloc.alloc_value(TypeEx::NULL, SubType::Null);
        self.hashes.push(hash);
        self.members.push(value);
        self.names.push(name);
        self.flags.push(flags);
        self.fast_search.get_mut().insert(hash, id);
        id
    }

    /// First member whose name hashes like `name`.
    pub fn find_member(&self, name: &MemberName<'_>) -> Option<usize> {
        self.find_member_by_hash(name.hash())
    }

    /// First member with hash `hash`.
    ///
    /// Uses the index when it is live, or once a stale index has been
    /// bypassed often enough to be rebuilt.
    pub fn find_member_by_hash(&self, hash: u32) -> Option<usize> {
        match self.fast_search.borrow_mut().lookup(hash, &self.hashes) {
            Lookup::Indexed(found) => found,
            Lookup::Scan => self.hashes.iter().position(|h| *h == hash),
        }
    }

    /// Member id of the child value `value`.
    pub fn find_member_value(&self, value: ValueId) -> Option<usize> {
        self.members.iter().position(|m| *m == value)
    }

    /// Free member `id` and shift later members down.
    ///
    /// Returns `false` for an id past the end.
    pub fn remove_member(&mut self, alloc: &mut impl ValueAllocator<'a>, id: usize) -> bool {
        if id >= self.count() {
            return false;
        }
        self.hashes.remove(id);
        let value = self.members.remove(id);
        self.names.remove(id);
        self.flags.remove(id);
        alloc.free_value(value);
        self.fast_search.get_mut().invalidate();
        true
    }

    /// Free every member and reserve room for `hint` members.
    ///
    /// An existing index survives (emptied) only if `hint` still reaches
    /// the fast-search threshold.
    pub fn remove_all(&mut self, alloc: &mut impl ValueAllocator<'a>, hint: usize) {
        for value in std::mem::take(&mut self.members) {
            alloc.free_value(value);
        }
        self.hashes.clear();
        self.names.clear();
        self.flags.clear();
        if hint > TABLE_MAX_FIXED_MEMBERS {
            self.ensure_member_capacity(hint, true);
        } else if self.dynamic {
            self.purge_buffers();
        }
        self.fast_search
            .get_mut()
            .reset(hint >= FAST_SEARCH_THRESHOLD);
    }

    /// Release every member and drop the index.
    ///
    /// With `clearing` the child values are only forgotten, since the
    /// whole context is being reset and frees them wholesale.
    pub fn purge_content(&mut self, alloc: &mut impl ValueAllocator<'a>, clearing: bool) {
        let members = std::mem::take(&mut self.members);
        if !clearing {
            for value in members {
                alloc.free_value(value);
            }
        }
        self.hashes.clear();
        self.names.clear();
        self.flags.clear();
        *self.fast_search.get_mut() = FastSearch::Absent;
    }

    /// Drop the buffers and return to the baseline capacity.
    ///
    /// Remaining members are forgotten without being freed.
    pub fn purge_buffers(&mut self) {
        self.hashes = SmallVec::new();
        self.members = SmallVec::new();
        self.names = SmallVec::new();
        self.flags = SmallVec::new();
        self.allocated = usize::from(self.initial_size).max(TABLE_MAX_FIXED_MEMBERS);
        self.dynamic = false;
    }

    /// Build the index now if the table is large enough for one.
    pub(crate) fn enable_fast_search_if_large(&mut self) {
        if self.count() >= FAST_SEARCH_THRESHOLD {
            self.fast_search.get_mut().rebuild(&self.hashes);
        }
    }
}

impl ClusterNode for Table<'_> {
    const DATA_SIZE: usize = TABLE_MAX_FIXED_MEMBERS;

    fn total_size_of(initial_size: usize) -> usize {
        let n = initial_size;
        let data = align8(4 * n) + align8(8 * n) + align8(8 * n) + align8(n);
        align8(24 + data.max(8))
    }

    fn construct(initial_size: usize, available_bytes: usize) -> Self {
        let needed = Self::total_size_of(initial_size);
        if available_bytes < needed {
            fatal(&format!(
                "KeyValues3: pre-allocated table memory is too small for {initial_size} members ({available_bytes} bytes available, {needed} bytes needed)"
            ));
        }
        Self::new(initial_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("member_{i}")).collect()
    }

    #[test]
    fn create_and_find() {
        let mut ctx = Context::pool();
        let mut table = Table::new(0);
        let a = table.create_member(&mut ctx, MemberName::new("origin"));
        let b = table.create_member(&mut ctx, MemberName::new("angles"));
        assert_eq!((a, b), (0, 1));
        assert_eq!(table.find_member(&MemberName::new("ANGLES")), Some(1));
        assert_eq!(table.find_member(&MemberName::new("scale")), None);
        assert_eq!(
            table.name(0).map(|n| n.resolve(&ctx.symbols)),
            Some("origin")
        );
        assert_eq!(table.member_flags(0), Some(MemberFlags::empty()));
    }

    #[test]
    fn external_names_are_flagged() {
        let mut ctx = Context::pool();
        let mut table = Table::new(0);
        let id = table.create_member_external(&mut ctx, "targetname");
        assert_eq!(table.member_flags(id), Some(MemberFlags::NAME_EXTERNAL));
        assert_eq!(table.name(id), Some(&StoredName::External("targetname")));
        assert_eq!(
            table.find_member(&MemberName::new("targetname")),
            Some(id)
        );
    }

    #[test]
    fn duplicates_return_first() {
        let mut ctx = Context::pool();
        let mut table = Table::new(0);
        table.create_member(&mut ctx, MemberName::new("dup"));
        table.create_member(&mut ctx, MemberName::new("dup"));
        assert_eq!(table.find_member(&MemberName::new("dup")), Some(0));
    }

    #[test]
    fn remove_shifts_parallel_arrays() {
        let mut ctx = Context::pool();
        let mut table = Table::new(0);
        for name in ["a", "b", "c"] {
            table.create_member(&mut ctx, MemberName::new(name));
        }
        let c_value = table.member(2);
        assert!(table.remove_member(&mut ctx, 1));
        assert_eq!(table.count(), 2);
        assert_eq!(table.member(1), c_value);
        assert_eq!(table.hash(1), Some(MemberName::new("c").hash()));
        assert_eq!(table.name(1).map(|n| n.resolve(&ctx.symbols)), Some("c"));
        assert!(!table.remove_member(&mut ctx, 5));
        assert_eq!(ctx.stats().values.live(), 2);
    }

    #[test]
    fn grows_past_inline_members() {
        let mut ctx = Context::pool();
        let mut table = Table::new(0);
        for name in names(9) {
            table.create_member(&mut ctx, MemberName::new(&name));
        }
        assert!(table.is_dynamic());
        assert_eq!(table.capacity(), 16);
    }

    #[test]
    fn index_built_at_threshold() {
        let mut ctx = Context::pool();
        let mut table = Table::new(0);
        let names = names(FAST_SEARCH_THRESHOLD + 1);
        for name in &names[..FAST_SEARCH_THRESHOLD] {
            table.create_member(&mut ctx, MemberName::new(name));
        }
        assert!(!table.fast_search().exists());
        table.create_member(&mut ctx, MemberName::new(&names[FAST_SEARCH_THRESHOLD]));
        assert!(table.fast_search().is_live());
        for (i, name) in names.iter().enumerate() {
            assert_eq!(table.find_member(&MemberName::new(name)), Some(i));
        }
    }

    #[test]
    fn removal_makes_index_stale_then_rebuilds() {
        let mut ctx = Context::pool();
        let mut table = Table::new(0);
        let names = names(200);
        for name in &names {
            table.create_member(&mut ctx, MemberName::new(name));
        }
        table.remove_member(&mut ctx, 0);
        assert_eq!(table.fast_search().stale_lookups(), Some(1));
        for i in 1..5 {
            assert_eq!(table.find_member(&MemberName::new(&names[i])), Some(i - 1));
        }
        assert!(table.fast_search().is_live());
        assert_eq!(table.find_member(&MemberName::new(&names[199])), Some(198));
        assert_eq!(table.find_member(&MemberName::new(&names[0])), None);
    }

    #[test]
    fn remove_all_resets_index_by_hint() {
        let mut ctx = Context::pool();
        let mut table = Table::new(0);
        for name in names(130) {
            table.create_member(&mut ctx, MemberName::new(&name));
        }
        table.remove_all(&mut ctx, 200);
        assert!(table.is_empty());
        assert!(table.fast_search().is_live());
        assert_eq!(table.capacity(), 256);
        assert_eq!(ctx.stats().values.live(), 0);

        table.create_member(&mut ctx, MemberName::new("x"));
        assert_eq!(table.find_member(&MemberName::new("x")), Some(0));
        table.remove_all(&mut ctx, 0);
        assert!(!table.fast_search().exists());
        assert!(!table.is_dynamic());
    }

    #[test]
    fn size_model() {
        assert_eq!(Table::total_size_of(0), 32);
        assert_eq!(Table::total_size_of(8), 24 + 32 + 64 + 64 + 8);
    }

    #[test]
    #[should_panic(expected = "pre-allocated table memory is too small for 9 members")]
    fn undersized_construction_is_fatal() {
        let _ = Table::construct(9, Table::total_size_of(8));
    }

    #[test]
    #[should_panic(expected = "member count overflow")]
    fn capacity_overflow_is_fatal() {
        let mut table = Table::new(0);
        table.ensure_member_capacity(ALLOC_TABLE_MAX + 1, false);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn index_agrees_with_linear_scan(
                ops in prop::collection::vec((any::<bool>(), 0usize..40), 150..400),
            ) {
                let mut ctx = Context::pool();
                let mut table = Table::new(0);
                for (create, n) in ops {
                    if create || table.is_empty() {
                        table.create_member(&mut ctx, MemberName::new(&format!("k{n}")));
                    } else {
                        table.remove_member(&mut ctx, n % table.count());
                    }
                    let name = format!("k{n}");
                    let key = MemberName::new(&name);
                    let scanned = table.hashes().iter().position(|h| *h == key.hash());
                    prop_assert_eq!(table.find_member(&key), scanned);
                }
            }
        }
    }
}
