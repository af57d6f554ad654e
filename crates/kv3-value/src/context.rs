//! The arena that owns every node of a KV3 document.
//!
//! A [`Context`] holds one [`TieredStore`] per node kind (values, arrays,
//! tables) plus the symbol table, the optional metadata side-table, a
//! scratch byte buffer and, unless it was built as a pool, a root value.
//! Nodes are created and destroyed only through the context; containers
//! receive it as their [`ValueAllocator`].
//!
//! Clearing or purging the context invalidates every handle it issued.

use indexmap::IndexMap;
use kv3_arena::{AllocationMode, ArenaConfig, ArenaError, SymbolTable, TierStats, TieredStore};
use kv3_core::fatal::fatal;
use kv3_core::{MetaData, SubType, Symbol, TypeEx};

use crate::alloc::ValueAllocator;
use crate::array::Array;
use crate::copy::Snapshot;
use crate::read::ValueRef;
use crate::table::{StoredName, Table};
use crate::value::{ArrayId, Data, TableId, Value, ValueId};
use crate::write::ValueMut;

/// Occupancy counters for a whole context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContextStats {
    /// Value store.
    pub values: TierStats,
    /// Array store.
    pub arrays: TierStats,
    /// Table store.
    pub tables: TierStats,
    /// Interned strings.
    pub symbols: usize,
}

/// Arena owning values, containers, strings and metadata.
///
/// `'a` is the lifetime of caller-owned data that external strings,
/// external blobs and external member names borrow.
pub struct Context<'a> {
    config: ArenaConfig,
    pub(crate) values: TieredStore<Value<'a>>,
    pub(crate) arrays: TieredStore<Array>,
    pub(crate) tables: TieredStore<Table<'a>>,
    pub(crate) symbols: SymbolTable,
    metadata: Option<IndexMap<ValueId, MetaData>>,
    binary_data: Vec<u8>,
    root: Option<ValueId>,
}

impl<'a> Context<'a> {
    /// A clustered context with a root value.
    pub fn new() -> Self {
        Self::build(ArenaConfig::new())
    }

    /// A clustered context without a root, used as a node pool.
    pub fn pool() -> Self {
        Self::build(ArenaConfig::pool())
    }

    /// A heap-mode context with a root value. Every node is an
    /// independent heap allocation.
    pub fn heap() -> Self {
        Self::build(ArenaConfig::heap())
    }

    /// A context built from a validated configuration.
    ///
    /// Raw spillover reservations in the config are made up front.
    pub fn with_config(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        let raw_array_bytes = config.raw_array_bytes;
        let raw_table_bytes = config.raw_table_bytes;
        let mut ctx = Self::build(config);
        if raw_array_bytes > 0 {
            ctx.reserve_raw_arrays(raw_array_bytes)?;
        }
        if raw_table_bytes > 0 {
            ctx.reserve_raw_tables(raw_table_bytes)?;
        }
        Ok(ctx)
    }

    fn build(config: ArenaConfig) -> Self {
        let mode = config.mode;
        let mut ctx = Self {
            values: TieredStore::new(mode, config.value_cluster_size, true),
            arrays: TieredStore::new(mode, config.array_cluster_size, false),
            tables: TieredStore::new(mode, config.table_cluster_size, false),
            symbols: SymbolTable::new(),
            metadata: config.metadata.then(IndexMap::new),
            binary_data: Vec::new(),
            root: None,
            config,
        };
        ctx.create_root();
        ctx
    }

    fn create_root(&mut self) {
        self.root = None;
        if self.config.with_root {
            self.root = Some(self.alloc_kv(TypeEx::NULL, SubType::Null));
        }
    }

    /// The configuration this context was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Tier routing mode.
    pub fn mode(&self) -> AllocationMode {
        self.config.mode
    }

    // ── Node allocation ─────────────────────────────────────────

    /// Allocate a value of the given type.
    ///
    /// An `Unspecified` subtype resolves to the canonical subtype of the
    /// base type.
    pub fn alloc_kv(&mut self, type_ex: TypeEx, subtype: SubType) -> ValueId {
        let id = ValueId(self.values.alloc(1));
        self.prepare_for_type(id, type_ex, subtype);
        id
    }

    /// Release a value, everything it owns and its metadata.
    ///
    /// Stale handles are ignored.
    pub fn free_kv(&mut self, id: ValueId) {
        let Some(value) = self.values.free(id.0) else {
            return;
        };
        self.release_data(value.data);
        if let Some(metadata) = &mut self.metadata {
            metadata.swap_remove(&id);
        }
    }

    /// Allocate an empty array sized for `initial_size` elements.
    pub fn alloc_array(&mut self, initial_size: usize) -> ArrayId {
        ArrayId(self.arrays.alloc(initial_size))
    }

    /// Release an array and its elements.
    pub fn free_array(&mut self, id: ArrayId) {
        if let Some(mut array) = self.arrays.free(id.0) {
            array.purge_content(self, false);
        }
    }

    /// Allocate an empty table sized for `initial_size` members.
    pub fn alloc_table(&mut self, initial_size: usize) -> TableId {
        TableId(self.tables.alloc(initial_size))
    }

    /// Release a table and its members.
    pub fn free_table(&mut self, id: TableId) {
        if let Some(mut table) = self.tables.free(id.0) {
            table.purge_content(self, false);
        }
    }

    fn release_data(&mut self, data: Data<'a>) {
        match data {
            Data::Array(id) => self.free_array(id),
            Data::Table(id) => self.free_table(id),
            _ => {}
        }
    }

    /// Grow the raw array list ahead of bulk construction.
    pub fn reserve_raw_arrays(&mut self, bytes: usize) -> Result<(), ArenaError> {
        tracing::debug!(bytes, "reserving raw array bytes");
        self.arrays.reserve_raw(bytes)
    }

    /// Grow the raw table list ahead of bulk construction.
    pub fn reserve_raw_tables(&mut self, bytes: usize) -> Result<(), ArenaError> {
        tracing::debug!(bytes, "reserving raw table bytes");
        self.tables.reserve_raw(bytes)
    }

    // ── Typing ──────────────────────────────────────────────────

    /// Retag `id`, releasing its old payload first.
    ///
    /// Keeping the same array or table type only updates the subtype and
    /// leaves the container alone. Any other call replaces the payload
    /// with an empty one of `type_ex`.
    pub(crate) fn prepare_for_type(&mut self, id: ValueId, type_ex: TypeEx, subtype: SubType) {
        let subtype = subtype.or_resolved(type_ex.base());
        let Some(node) = self.values.get_mut(id.0) else {
            return;
        };
        if node.data.type_ex() == type_ex && matches!(type_ex, TypeEx::ARRAY | TypeEx::TABLE) {
            node.subtype = subtype;
            return;
        }
        let old = std::mem::take(&mut node.data);
        self.release_data(old);

        let data = match type_ex {
            TypeEx::ARRAY => Data::Array(self.alloc_array(0)),
            TypeEx::TABLE => Data::Table(self.alloc_table(0)),
            other => Data::empty_for(other),
        };
        if let Some(node) = self.values.get_mut(id.0) {
            node.data = data;
            node.subtype = subtype;
        }
    }

    /// Replace the payload and tag of `id` with a leaf payload.
    pub(crate) fn set_data(&mut self, id: ValueId, data: Data<'a>, subtype: SubType) {
        let Some(node) = self.values.get_mut(id.0) else {
            return;
        };
        let old = std::mem::replace(&mut node.data, data);
        node.subtype = subtype;
        self.release_data(old);
    }

    /// Convert a packed array into a boxed array of child values.
    ///
    /// Children take the element type of the packed encoding; the
    /// value's own subtype is kept. Anything else is left untouched.
    pub(crate) fn normalize(&mut self, id: ValueId) {
        let Some(node) = self.values.get_mut(id.0) else {
            return;
        };
        if !matches!(node.data, Data::Packed(_)) {
            return;
        }
        let Data::Packed(packed) = std::mem::take(&mut node.data) else {
            return;
        };
        let (type_ex, subtype) = packed.element_tag();
        let array_id = self.alloc_array(packed.len());
        let children = self
            .with_array(array_id, |array, ctx| {
                array.set_count(ctx, packed.len(), type_ex, subtype);
                array.elements().to_vec()
            })
            .unwrap_or_default();
        for (child, element) in children.into_iter().zip(packed.iter()) {
            if let Some(node) = self.values.get_mut(child.0) {
                node.data = element.to_data();
            }
        }
        if let Some(node) = self.values.get_mut(id.0) {
            node.data = Data::Array(array_id);
        }
    }

    /// Run `f` on an array while the context stays mutably available.
    ///
    /// The array is moved out of its slot for the duration and put back
    /// afterwards. `None` for a stale handle.
    pub(crate) fn with_array<R>(
        &mut self,
        id: ArrayId,
        f: impl FnOnce(&mut Array, &mut Self) -> R,
    ) -> Option<R> {
        let mut array = self.arrays.take(id.0)?;
        let out = f(&mut array, self);
        self.arrays.restore(id.0, array);
        Some(out)
    }

    /// Run `f` on a table while the context stays mutably available.
    pub(crate) fn with_table<R>(
        &mut self,
        id: TableId,
        f: impl FnOnce(&mut Table<'a>, &mut Self) -> R,
    ) -> Option<R> {
        let mut table = self.tables.take(id.0)?;
        let out = f(&mut table, self);
        self.tables.restore(id.0, table);
        Some(out)
    }

    // ── Access ──────────────────────────────────────────────────

    /// Shared access to a live value.
    pub fn value(&self, id: ValueId) -> Option<ValueRef<'_, 'a>> {
        self.values
            .get(id.0)
            .map(|node| ValueRef::new(self, id, node))
    }

    /// Like [`value`](Self::value), reporting stale handles as errors.
    pub fn try_value(&self, id: ValueId) -> Result<ValueRef<'_, 'a>, ArenaError> {
        self.values
            .try_get(id.0)
            .map(|node| ValueRef::new(self, id, node))
    }

    /// Exclusive access to a live value.
    pub fn value_mut(&mut self, id: ValueId) -> Option<ValueMut<'_, 'a>> {
        self.values.get(id.0)?;
        Some(ValueMut::new(self, id))
    }

    /// The raw node behind `id`.
    pub fn node(&self, id: ValueId) -> Option<&Value<'a>> {
        self.values.get(id.0)
    }

    /// The array container behind `id`.
    pub fn array(&self, id: ArrayId) -> Option<&Array> {
        self.arrays.get(id.0)
    }

    /// The table container behind `id`.
    pub fn table(&self, id: TableId) -> Option<&Table<'a>> {
        self.tables.get(id.0)
    }

    /// Handle of the root value.
    ///
    /// # Panics
    ///
    /// Fatal on a pool context.
    pub fn root_id(&self) -> ValueId {
        match self.root {
            Some(id) => id,
            None => fatal("FATAL: root() called on a pool context (no root available)"),
        }
    }

    /// The root value.
    ///
    /// # Panics
    ///
    /// Fatal on a pool context.
    pub fn root(&self) -> ValueRef<'_, 'a> {
        let id = self.root_id();
        match self.values.get(id.0) {
            Some(node) => ValueRef::new(self, id, node),
            None => fatal("FATAL: root() called on a pool context (no root available)"),
        }
    }

    /// The root value, mutably.
    ///
    /// # Panics
    ///
    /// Fatal on a pool context.
    pub fn root_mut(&mut self) -> ValueMut<'_, 'a> {
        let id = self.root_id();
        ValueMut::new(self, id)
    }

    /// Whether this context owns a root value.
    pub fn has_root(&self) -> bool {
        self.root.is_some()
    }

    // ── Lifecycle ───────────────────────────────────────────────

    /// Drop every node, string and metadata record, keeping allocated
    /// clusters and reservations for reuse. The root is re-created.
    pub fn clear(&mut self) {
        tracing::debug!(
            values = self.values.stats().live(),
            arrays = self.arrays.stats().live(),
            tables = self.tables.stats().live(),
            "clearing context"
        );
        self.values.clear();
        self.arrays.clear();
        self.tables.clear();
        self.symbols.clear();
        self.binary_data.clear();
        if let Some(metadata) = &mut self.metadata {
            metadata.clear();
        }
        self.create_root();
    }

    /// Like [`clear`](Self::clear), but also releases every
    /// non-embedded cluster, raw reservation and scratch buffer.
    pub fn purge(&mut self) {
        tracing::debug!(
            clusters = self.values.stats().clusters
                + self.arrays.stats().clusters
                + self.tables.stats().clusters,
            "purging context"
        );
        self.values.purge();
        self.arrays.purge();
        self.tables.purge();
        self.symbols.purge();
        self.binary_data = Vec::new();
        if let Some(metadata) = &mut self.metadata {
            *metadata = IndexMap::new();
        }
        self.create_root();
    }

    // ── Strings ─────────────────────────────────────────────────

    /// Intern `s`, returning its symbol.
    pub fn alloc_string(&mut self, s: &str) -> Symbol {
        self.symbols.intern(s)
    }

    /// Text of an interned symbol.
    pub fn resolve_symbol(&self, symbol: Symbol) -> Option<&str> {
        self.symbols.resolve(symbol)
    }

    /// Text of a stored member name.
    pub fn resolve_name<'s>(&'s self, name: &'s StoredName<'a>) -> &'s str {
        name.resolve(&self.symbols)
    }

    // ── Metadata ────────────────────────────────────────────────

    /// Turn the metadata side-table on or off. Turning it off drops
    /// every record.
    pub fn enable_metadata(&mut self, enable: bool) {
        match (enable, self.metadata.is_some()) {
            (true, false) => self.metadata = Some(IndexMap::new()),
            (false, true) => self.metadata = None,
            _ => {}
        }
    }

    /// Whether the metadata side-table is on.
    pub fn is_metadata_enabled(&self) -> bool {
        self.metadata.is_some()
    }

    /// Metadata recorded for `id`.
    pub fn metadata(&self, id: ValueId) -> Option<&MetaData> {
        self.metadata.as_ref()?.get(&id)
    }

    /// Metadata for `id`, created empty on first access.
    ///
    /// `None` when metadata is disabled or `id` is stale.
    pub fn metadata_mut(&mut self, id: ValueId) -> Option<&mut MetaData> {
        self.values.get(id.0)?;
        Some(self.metadata.as_mut()?.entry(id).or_default())
    }

    /// Copy the metadata of `src` in `src_ctx` onto `dst`.
    ///
    /// The name is re-interned here. A source without metadata clears the
    /// destination record. Returns `false` if this context keeps no
    /// metadata or `dst` is stale.
    pub fn copy_metadata(&mut self, dst: ValueId, src_ctx: &Context<'_>, src: ValueId) -> bool {
        let source = src_ctx.metadata(src).map(|md| {
            let name = md.name.and_then(|s| src_ctx.resolve_symbol(s));
            (md.clone(), name.map(str::to_owned))
        });
        self.apply_metadata(dst, source)
    }

    /// Install a detached metadata record (with its name text) on `dst`.
    pub(crate) fn apply_metadata(
        &mut self,
        dst: ValueId,
        source: Option<(MetaData, Option<String>)>,
    ) -> bool {
        let symbol = source
            .as_ref()
            .and_then(|(_, name)| name.as_deref())
            .map(|name| self.symbols.intern(name));
        let Some(record) = self.metadata_mut(dst) else {
            return false;
        };
        match source {
            Some((md, _)) => {
                *record = md;
                record.name = symbol;
            }
            None => record.clear(),
        }
        true
    }

    // ── Scratch buffer ──────────────────────────────────────────

    /// Scratch bytes owned by the context.
    pub fn binary_data(&self) -> &[u8] {
        &self.binary_data
    }

    /// Scratch bytes owned by the context, mutably.
    pub fn binary_data_mut(&mut self) -> &mut Vec<u8> {
        &mut self.binary_data
    }

    // ── Copying ─────────────────────────────────────────────────

    /// Deep-copy `src` onto `dst` within this context.
    ///
    /// Copying a value onto itself does nothing. Returns `false` if
    /// either handle is stale.
    pub fn copy_within(&mut self, dst: ValueId, src: ValueId) -> bool {
        if dst == src {
            return self.values.get(dst.0).is_some();
        }
        let Some(snapshot) = Snapshot::capture(self, src) else {
            return false;
        };
        snapshot.apply(self, dst)
    }

    // ── Diagnostics ─────────────────────────────────────────────

    /// Occupancy counters across every store.
    pub fn stats(&self) -> ContextStats {
        ContextStats {
            values: self.values.stats(),
            arrays: self.arrays.stats(),
            tables: self.tables.stats(),
            symbols: self.symbols.len(),
        }
    }
}

impl Default for Context<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ValueAllocator<'a> for Context<'a> {
    fn alloc_value(&mut self, type_ex: TypeEx, subtype: SubType) -> ValueId {
        self.alloc_kv(type_ex, subtype)
    }

    fn free_value(&mut self, id: ValueId) {
        self.free_kv(id);
    }

    fn store_name(&mut self, name: &str) -> StoredName<'a> {
        match self.values.mode() {
            AllocationMode::Clustered => StoredName::Interned(self.symbols.intern(name)),
            AllocationMode::Heap => StoredName::Owned(Box::from(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kv3_core::{MetaDataFlags, Type};

    #[test]
    fn new_context_has_null_root() {
        let ctx = Context::new();
        assert!(ctx.has_root());
        assert_eq!(ctx.root().get_type(), Type::Null);
        assert_eq!(ctx.stats().values.live(), 1);
    }

    #[test]
    #[should_panic(expected = "root() called on a pool context")]
    fn pool_root_is_fatal() {
        let ctx = Context::pool();
        let _ = ctx.root();
    }

    #[test]
    fn alloc_resolves_unspecified_subtype() {
        let mut ctx = Context::pool();
        let id = ctx.alloc_kv(TypeEx::INT, SubType::Unspecified);
        let value = ctx.value(id).unwrap();
        assert_eq!(value.get_type(), Type::Int);
        assert_eq!(value.get_sub_type(), SubType::Int64);
    }

    #[test]
    fn freeing_a_table_frees_its_members() {
        let mut ctx = Context::pool();
        let id = ctx.alloc_kv(TypeEx::TABLE, SubType::Unspecified);
        {
            let mut table = ctx.value_mut(id).unwrap();
            table.find_or_create_member("a").0.set_int(1);
            let (mut nested, _) = table.find_or_create_member("b");
            nested.add_array_element_to_tail();
        }
        assert_eq!(ctx.stats().values.live(), 4);
        assert_eq!(ctx.stats().tables.live(), 1);
        assert_eq!(ctx.stats().arrays.live(), 1);

        ctx.free_kv(id);
        let stats = ctx.stats();
        assert_eq!(stats.values.live(), 0);
        assert_eq!(stats.tables.live(), 0);
        assert_eq!(stats.arrays.live(), 0);
        assert!(ctx.value(id).is_none());
    }

    #[test]
    fn retyping_releases_old_container() {
        let mut ctx = Context::pool();
        let id = ctx.alloc_kv(TypeEx::ARRAY, SubType::Unspecified);
        ctx.value_mut(id).unwrap().set_array_element_count(3, TypeEx::INT, SubType::Int32);
        assert_eq!(ctx.stats().values.live(), 4);

        ctx.value_mut(id).unwrap().set_bool(true);
        assert_eq!(ctx.stats().values.live(), 1);
        assert_eq!(ctx.stats().arrays.live(), 0);
    }

    #[test]
    fn same_container_type_keeps_contents() {
        let mut ctx = Context::pool();
        let id = ctx.alloc_kv(TypeEx::ARRAY, SubType::Unspecified);
        ctx.value_mut(id).unwrap().add_array_element_to_tail();
        ctx.prepare_for_type(id, TypeEx::ARRAY, SubType::Vector);
        let value = ctx.value(id).unwrap();
        assert_eq!(value.get_array_element_count(), 1);
        assert_eq!(value.get_sub_type(), SubType::Vector);
    }

    #[test]
    fn clear_invalidates_handles_and_recreates_root() {
        let mut ctx = Context::new();
        let old_root = ctx.root_id();
        let member = ctx.root_mut().find_or_create_member("x").0.id();
        ctx.binary_data_mut().extend_from_slice(b"scratch");

        ctx.clear();
        assert!(ctx.value(member).is_none());
        assert!(ctx.value(old_root).is_none());
        assert_ne!(ctx.root_id(), old_root);
        assert_eq!(ctx.root().get_type(), Type::Null);
        assert!(ctx.binary_data().is_empty());
        assert_eq!(ctx.stats().symbols, 0);
        assert!(matches!(
            ctx.try_value(member),
            Err(ArenaError::StaleHandle { .. })
        ));
    }

    #[test]
    fn purge_releases_heap_clusters() {
        let mut ctx = Context::new();
        let root = ctx.root_id();
        ctx.value_mut(root)
            .unwrap()
            .set_array_element_count(600, TypeEx::NULL, SubType::Null);
        assert!(ctx.stats().values.clusters > 1);
        ctx.purge();
        let stats = ctx.stats();
        assert_eq!(stats.values.clusters, 1);
        assert_eq!(stats.values.live(), 1);
        assert_eq!(stats.arrays.clusters, 0);
    }

    #[test]
    fn raw_reservation_serves_large_arrays() {
        let config = ArenaConfig {
            raw_array_bytes: 4096,
            ..ArenaConfig::pool()
        };
        let mut ctx = Context::with_config(config).unwrap();
        let id = ctx.alloc_array(40);
        assert!(!id.handle().is_clustered());
        assert_eq!(ctx.stats().arrays.raw_live, 1);
        assert_eq!(ctx.array(id).map(Array::capacity), Some(40));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ArenaConfig {
            value_cluster_size: 0,
            ..ArenaConfig::new()
        };
        assert!(matches!(
            Context::with_config(config),
            Err(ArenaError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn heap_context_owns_member_names() {
        let mut ctx = Context::heap();
        assert!(matches!(ctx.store_name("abc"), StoredName::Owned(_)));
        let mut pool = Context::pool();
        assert!(matches!(pool.store_name("abc"), StoredName::Interned(_)));
    }

    #[test]
    fn metadata_is_created_on_demand_and_freed_with_value() {
        let mut ctx = Context::pool();
        let id = ctx.alloc_kv(TypeEx::NULL, SubType::Null);
        assert!(ctx.metadata_mut(id).is_none());

        ctx.enable_metadata(true);
        let name = ctx.alloc_string("origin");
        if let Some(md) = ctx.metadata_mut(id) {
            md.line = 12;
            md.name = Some(name);
        }
        assert_eq!(ctx.metadata(id).map(|md| md.line), Some(12));

        ctx.free_kv(id);
        assert!(ctx.metadata(id).is_none());
    }

    #[test]
    fn copy_metadata_reinterns_name() {
        let mut src = Context::pool();
        src.enable_metadata(true);
        let a = src.alloc_kv(TypeEx::NULL, SubType::Null);
        src.alloc_string("padding");
        let name = src.alloc_string("angles");
        if let Some(md) = src.metadata_mut(a) {
            md.name = Some(name);
            md.flags = MetaDataFlags::SINGLE_QUOTED_STRING;
        }

        let mut dst = Context::pool();
        dst.enable_metadata(true);
        let b = dst.alloc_kv(TypeEx::NULL, SubType::Null);
        assert!(dst.copy_metadata(b, &src, a));
        let md = dst.metadata(b).unwrap();
        assert_eq!(md.flags, MetaDataFlags::SINGLE_QUOTED_STRING);
        assert_eq!(md.name.and_then(|s| dst.resolve_symbol(s)), Some("angles"));
    }

    #[test]
    fn copy_within_self_is_noop() {
        let mut ctx = Context::pool();
        let id = ctx.alloc_kv(TypeEx::NULL, SubType::Null);
        ctx.value_mut(id).unwrap().set_int(5);
        assert!(ctx.copy_within(id, id));
        assert_eq!(ctx.value(id).unwrap().get_int(0), 5);
    }
}
