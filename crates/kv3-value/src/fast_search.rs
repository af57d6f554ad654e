//! Hash index for large tables.
//!
//! The index is built once a table reaches
//! [`FAST_SEARCH_THRESHOLD`](kv3_core::growth::FAST_SEARCH_THRESHOLD)
//! members. Removals do not update it: they mark it stale, and lookups
//! fall back to a linear scan until [`FAST_SEARCH_REBUILD_AFTER`] more
//! lookups have happened, at which point it is rebuilt from scratch.
//!
//! Every insertion keeps the first member seen for a hash, so the index
//! and the linear scan always agree on which duplicate is found.

use indexmap::IndexMap;
use kv3_core::growth::FAST_SEARCH_REBUILD_AFTER;

/// State of a table's member index.
#[derive(Debug, Default)]
pub enum FastSearch {
    /// No index; lookups scan.
    #[default]
    Absent,
    /// Up to date; lookups use it.
    Live(IndexMap<u32, usize>),
    /// Invalidated by a removal.
    Stale {
        /// The outdated index, kept for its allocation.
        index: IndexMap<u32, usize>,
        /// Lookups since the removal, starting at 1.
        lookups: u8,
    },
}

/// Outcome of consulting the index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup {
    /// The index answered.
    Indexed(Option<usize>),
    /// The caller must scan.
    Scan,
}

impl FastSearch {
    /// Whether an index exists, live or stale.
    pub fn exists(&self) -> bool {
        !matches!(self, FastSearch::Absent)
    }

    /// Whether the index is up to date.
    pub fn is_live(&self) -> bool {
        matches!(self, FastSearch::Live(_))
    }

    /// Lookups counted since the index went stale.
    pub fn stale_lookups(&self) -> Option<u8> {
        match self {
            FastSearch::Stale { lookups, .. } => Some(*lookups),
            _ => None,
        }
    }

    /// (Re)build the index from the member hashes.
    pub fn rebuild(&mut self, hashes: &[u32]) {
        let mut index = match std::mem::take(self) {
            FastSearch::Live(index) | FastSearch::Stale { index, .. } => index,
            FastSearch::Absent => IndexMap::with_capacity(hashes.len()),
        };
        index.clear();
        for (id, hash) in hashes.iter().enumerate() {
            index.entry(*hash).or_insert(id);
        }
        *self = FastSearch::Live(index);
    }

    /// Build the index if there is none yet.
    pub fn enable(&mut self, hashes: &[u32]) {
        if !self.exists() {
            tracing::trace!(members = hashes.len(), "building table fast-search index");
            self.rebuild(hashes);
        }
    }

    /// Record a new member. Only a live index is updated.
    pub fn insert(&mut self, hash: u32, id: usize) {
        if let FastSearch::Live(index) = self {
            index.entry(hash).or_insert(id);
        }
    }

    /// Mark the index stale after a removal.
    pub fn invalidate(&mut self) {
        *self = match std::mem::take(self) {
            FastSearch::Absent => FastSearch::Absent,
            FastSearch::Live(index) | FastSearch::Stale { index, .. } => {
                FastSearch::Stale { index, lookups: 1 }
            }
        };
    }

    /// Look `hash` up, rebuilding a stale index once it has been
    /// bypassed often enough.
    pub fn lookup(&mut self, hash: u32, hashes: &[u32]) -> Lookup {
        match self {
            FastSearch::Absent => Lookup::Scan,
            FastSearch::Live(index) => Lookup::Indexed(index.get(&hash).copied()),
            FastSearch::Stale { lookups, .. } => {
                *lookups = lookups.saturating_add(1);
                if *lookups <= FAST_SEARCH_REBUILD_AFTER {
                    return Lookup::Scan;
                }
                tracing::trace!(members = hashes.len(), "rebuilding stale fast-search index");
                self.rebuild(hashes);
                match self {
                    FastSearch::Live(index) => Lookup::Indexed(index.get(&hash).copied()),
                    _ => Lookup::Scan,
                }
            }
        }
    }

    /// Drop the contents after the table is emptied.
    ///
    /// With `keep` an existing index stays live and empty; otherwise it is
    /// dropped. An absent index stays absent.
    pub fn reset(&mut self, keep: bool) {
        *self = match std::mem::take(self) {
            FastSearch::Absent => FastSearch::Absent,
            FastSearch::Live(mut index) | FastSearch::Stale { mut index, .. } if keep => {
                index.clear();
                FastSearch::Live(index)
            }
            _ => FastSearch::Absent,
        };
    }
}
