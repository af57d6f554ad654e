//! Buffer growth policy and allocation bounds.

/// Child slots an array stores inline before switching to a dynamic buffer.
pub const ARRAY_MAX_FIXED_MEMBERS: usize = 6;
/// Members a table stores inline before switching to a dynamic buffer.
pub const TABLE_MAX_FIXED_MEMBERS: usize = 8;

/// Smallest dynamic array buffer, in elements.
pub const ALLOC_ARRAY_MIN: usize = 4;
/// Largest array buffer, in elements.
pub const ALLOC_ARRAY_MAX: usize = 0x0FFF_FF7F;
/// Smallest dynamic table buffer, in members.
pub const ALLOC_TABLE_MIN: usize = 4;
/// Largest table buffer, in members.
pub const ALLOC_TABLE_MAX: usize = 0x0618_6154;
/// Smallest raw node-list buffer, in bytes.
pub const ALLOC_NODE_LIST_MIN: usize = 32;
/// Largest raw node-list buffer, in bytes.
pub const ALLOC_NODE_LIST_MAX: usize = i32::MAX as usize;

/// Values per value cluster.
pub const VALUE_CLUSTER_SIZE: u16 = 253;
/// Arrays per array cluster.
pub const ARRAY_CLUSTER_SIZE: u16 = 32;
/// Tables per table cluster.
pub const TABLE_CLUSTER_SIZE: u16 = 64;

/// Member count at which a table builds its fast-search index.
pub const FAST_SEARCH_THRESHOLD: usize = 128;
/// Lookups tolerated against a stale index before it is rebuilt.
pub const FAST_SEARCH_REBUILD_AFTER: u8 = 4;

/// Longest string stored inline (exclusive of the terminator byte).
pub const SHORT_STRING_CAPACITY: usize = 7;
/// Most elements a packed array can hold (5-bit count).
pub const PACKED_MAX_ELEMENTS: usize = 31;

/// Compute the next buffer size for a growable buffer.
///
/// Starts from `max(old, min)` and doubles until `required` fits. Once
/// doubling would pass `max / 2` the result saturates at `max`, which
/// may still be below `required`; callers treat that as overflow.
pub fn calc_new_buffer_size(old: usize, required: usize, min: usize, max: usize) -> usize {
    let mut size = old.max(min);
    while size < required {
        if size < max / 2 {
            size *= 2;
        } else {
            size = max;
            break;
        }
    }
    size
}

/// Round `n` up to a multiple of 8.
pub const fn align8(n: usize) -> usize {
    (n + 7) & !7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_starts_at_min() {
        assert_eq!(calc_new_buffer_size(0, 1, 4, 1024), 4);
        assert_eq!(calc_new_buffer_size(0, 0, 4, 1024), 4);
    }

    #[test]
    fn growth_doubles() {
        assert_eq!(calc_new_buffer_size(4, 5, 4, 1024), 8);
        assert_eq!(calc_new_buffer_size(8, 33, 4, 1024), 64);
        assert_eq!(calc_new_buffer_size(6, 7, 4, 1024), 12);
    }

    #[test]
    fn growth_saturates_at_max() {
        assert_eq!(calc_new_buffer_size(600, 700, 4, 1000), 1000);
        assert_eq!(calc_new_buffer_size(600, 5000, 4, 1000), 1000);
    }

    #[test]
    fn align8_rounds_up() {
        assert_eq!(align8(0), 0);
        assert_eq!(align8(1), 8);
        assert_eq!(align8(16), 16);
        assert_eq!(align8(17), 24);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn result_covers_request_or_saturates(old in 0usize..4096, req in 0usize..8192) {
                let size = calc_new_buffer_size(old, req, 4, 4096);
                prop_assert!(size >= old.max(4));
                prop_assert!(size >= req || size == 4096);
            }
        }
    }
}
