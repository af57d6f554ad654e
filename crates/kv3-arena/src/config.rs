//! Arena configuration parameters.

use kv3_core::growth::{
    ALLOC_NODE_LIST_MAX, ARRAY_CLUSTER_SIZE, TABLE_CLUSTER_SIZE, VALUE_CLUSTER_SIZE,
};

use crate::error::ArenaError;

/// Where a context places its nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AllocationMode {
    /// Clusters first, raw spillover and heap as fallbacks.
    #[default]
    Clustered,
    /// Every node is an independent heap allocation. Used for
    /// standalone values that have no arena.
    Heap,
}

/// Configuration for a context's allocator.
///
/// Controls cluster sizing, raw spillover reservations, and optional
/// features. Validated at construction; immutable afterwards.
#[derive(Clone, Debug)]
pub struct ArenaConfig {
    /// Tier routing.
    pub mode: AllocationMode,

    /// Values per value cluster.
    ///
    /// Default: 253.
    pub value_cluster_size: u16,

    /// Arrays per array cluster.
    ///
    /// Default: 32.
    pub array_cluster_size: u16,

    /// Tables per table cluster.
    ///
    /// Default: 64.
    pub table_cluster_size: u16,

    /// Bytes reserved up front in the raw array list.
    ///
    /// Default: 0 (the raw tier is only used after an explicit reserve).
    pub raw_array_bytes: usize,

    /// Bytes reserved up front in the raw table list.
    pub raw_table_bytes: usize,

    /// Whether the per-value metadata side-table is enabled.
    pub metadata: bool,

    /// Whether the context owns a root value.
    pub with_root: bool,
}

impl ArenaConfig {
    /// Default values per value cluster.
    pub const DEFAULT_VALUE_CLUSTER_SIZE: u16 = VALUE_CLUSTER_SIZE;

    /// Default arrays per array cluster.
    pub const DEFAULT_ARRAY_CLUSTER_SIZE: u16 = ARRAY_CLUSTER_SIZE;

    /// Default tables per table cluster.
    pub const DEFAULT_TABLE_CLUSTER_SIZE: u16 = TABLE_CLUSTER_SIZE;

    /// Create a clustered config with a root value and default sizes.
    pub fn new() -> Self {
        Self {
            mode: AllocationMode::Clustered,
            value_cluster_size: Self::DEFAULT_VALUE_CLUSTER_SIZE,
            array_cluster_size: Self::DEFAULT_ARRAY_CLUSTER_SIZE,
            table_cluster_size: Self::DEFAULT_TABLE_CLUSTER_SIZE,
            raw_array_bytes: 0,
            raw_table_bytes: 0,
            metadata: false,
            with_root: true,
        }
    }

    /// A config for a context without a root value.
    pub fn pool() -> Self {
        Self {
            with_root: false,
            ..Self::new()
        }
    }

    /// A heap-mode config with a root value.
    pub fn heap() -> Self {
        Self {
            mode: AllocationMode::Heap,
            ..Self::new()
        }
    }

    /// Check every value is in range.
    pub fn validate(&self) -> Result<(), ArenaError> {
        for (name, size) in [
            ("value_cluster_size", self.value_cluster_size),
            ("array_cluster_size", self.array_cluster_size),
            ("table_cluster_size", self.table_cluster_size),
        ] {
            if size == 0 {
                return Err(ArenaError::InvalidConfig {
                    reason: format!("{name} must be at least 1"),
                });
            }
        }
        for (name, bytes) in [
            ("raw_array_bytes", self.raw_array_bytes),
            ("raw_table_bytes", self.raw_table_bytes),
        ] {
            if bytes > ALLOC_NODE_LIST_MAX {
                return Err(ArenaError::InvalidConfig {
                    reason: format!("{name} {bytes} exceeds {ALLOC_NODE_LIST_MAX}"),
                });
            }
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cluster_constants() {
        let config = ArenaConfig::new();
        assert_eq!(config.value_cluster_size, 253);
        assert_eq!(config.array_cluster_size, 32);
        assert_eq!(config.table_cluster_size, 64);
        assert!(config.with_root);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn pool_has_no_root() {
        assert!(!ArenaConfig::pool().with_root);
    }

    #[test]
    fn zero_cluster_size_rejected() {
        let config = ArenaConfig {
            table_cluster_size: 0,
            ..ArenaConfig::new()
        };
        assert!(matches!(
            config.validate(),
            Err(ArenaError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn oversized_reservation_rejected() {
        let config = ArenaConfig {
            raw_array_bytes: ALLOC_NODE_LIST_MAX + 1,
            ..ArenaConfig::new()
        };
        assert!(config.validate().is_err());
    }
}
