//! The boxed array container.
//!
//! An [`Array`] owns an ordered list of child values. The first six
//! handles live inline; past that the buffer becomes dynamic and grows by
//! the shared buffer policy. Children are created and released through a
//! [`ValueAllocator`], never directly.

use kv3_arena::ClusterNode;
use kv3_core::fatal::fatal;
use kv3_core::growth::{
    align8, calc_new_buffer_size, ALLOC_ARRAY_MAX, ALLOC_ARRAY_MIN, ARRAY_MAX_FIXED_MEMBERS,
};
use kv3_core::{SubType, TypeEx};
use smallvec::SmallVec;

use crate::alloc::ValueAllocator;
use crate::value::ValueId;

/// Ordered, owned child values.
#[derive(Debug, Default)]
pub struct Array {
    elements: SmallVec<[ValueId; ARRAY_MAX_FIXED_MEMBERS]>,
    allocated: usize,
    initial_size: u8,
    dynamic: bool,
}

impl Array {
    /// An empty array whose baseline capacity covers `initial_size`.
    pub fn new(initial_size: usize) -> Self {
        let allocated = initial_size.max(ARRAY_MAX_FIXED_MEMBERS);
        Self {
            elements: SmallVec::with_capacity(allocated),
            allocated,
            initial_size: initial_size.min(usize::from(u8::MAX)) as u8,
            dynamic: false,
        }
    }

    /// Number of elements.
    pub fn count(&self) -> usize {
        self.elements.len()
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Elements the current buffer holds without growing.
    pub fn capacity(&self) -> usize {
        self.allocated
    }

    /// Size the array was created for, saturated at 255.
    pub fn initial_size(&self) -> usize {
        usize::from(self.initial_size)
    }

    /// Whether the buffer has grown past its baseline.
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// All element handles in order.
    pub fn elements(&self) -> &[ValueId] {
        &self.elements
    }

    /// Element `i`.
    pub fn element(&self, i: usize) -> Option<ValueId> {
        self.elements.get(i).copied()
    }

    /// Index of the element with handle `id`.
    pub fn position_of(&self, id: ValueId) -> Option<usize> {
        self.elements.iter().position(|e| *e == id)
    }

    /// Make room for `count` elements.
    ///
    /// With `force` the buffer grows to exactly `count`; otherwise growth
    /// follows the shared buffer policy. Never shrinks.
    pub fn ensure_element_capacity(&mut self, count: usize, force: bool) {
        if count <= self.allocated {
            return;
        }
        if count > ALLOC_ARRAY_MAX {
            fatal(&format!(
                "ensure_element_capacity: element count overflow ({count})"
            ));
        }
        let new_allocated = if force {
            count
        } else {
            calc_new_buffer_size(self.allocated, count, ALLOC_ARRAY_MIN, ALLOC_ARRAY_MAX)
        };
        self.elements
            .reserve_exact(new_allocated.saturating_sub(self.elements.len()));
        self.allocated = new_allocated;
        self.dynamic = true;
    }

    /// Resize to `count` elements.
    ///
    /// Shrinking frees the trailing children; growing appends fresh
    /// children of the given type. Surviving children keep their values.
    pub fn set_count<'a>(
        &mut self,
        alloc: &mut impl ValueAllocator<'a>,
        count: usize,
        type_ex: TypeEx,
        subtype: SubType,
    ) {
        let old = self.elements.len();
        if count < old {
            for id in self.elements.drain(count..).collect::<SmallVec<[ValueId; 8]>>() {
                alloc.free_value(id);
            }
            return;
        }
        self.ensure_element_capacity(count, true);
        for _ in old..count {
            let id = alloc.alloc_value(type_ex, subtype);
            self.elements.push(id);
        }
    }

    /// Insert `count` null children before position `at`.
    ///
    /// Returns `at`, or `None` (and changes nothing) when `at` is past
    /// the end. `at == count()` appends.
    pub fn insert_multiple_before<'a>(
        &mut self,
        alloc: &mut impl ValueAllocator<'a>,
        at: usize,
        count: usize,
    ) -> Option<usize> {
        if at > self.elements.len() {
            return None;
        }
        let needed = self.elements.len() + count;
        self.ensure_element_capacity(needed, false);
        let fresh: SmallVec<[ValueId; 8]> = (0..count)
            .map(|_| alloc.alloc_value(TypeEx::NULL, SubType::Null))
            .collect();
        self.elements.insert_many(at, fresh);
        Some(at)
    }

    /// Free `count` children starting at `at` and close the gap.
    ///
    /// Returns `false` (and changes nothing) for a range that does not
    /// lie inside the array.
    pub fn remove_multiple<'a>(
        &mut self,
        alloc: &mut impl ValueAllocator<'a>,
        at: usize,
        count: usize,
    ) -> bool {
        let Some(end) = at.checked_add(count) else {
            return false;
        };
        if end > self.elements.len() {
            return false;
        }
        for id in self.elements.drain(at..end).collect::<SmallVec<[ValueId; 8]>>() {
            alloc.free_value(id);
        }
        true
    }

    /// Release every child.
    ///
    /// With `clearing` the children are only forgotten, since the whole
    /// context is being reset and frees them wholesale.
    pub fn purge_content<'a>(&mut self, alloc: &mut impl ValueAllocator<'a>, clearing: bool) {
        let elements = std::mem::take(&mut self.elements);
        if !clearing {
            for id in elements {
                alloc.free_value(id);
            }
        }
    }

    /// Drop the buffer and return to the baseline capacity.
    ///
    /// Any remaining handles are forgotten without being freed.
    pub fn purge_buffers(&mut self) {
        self.elements = SmallVec::new();
        self.allocated = self.initial_size().max(ARRAY_MAX_FIXED_MEMBERS);
        self.dynamic = false;
    }
}

impl ClusterNode for Array {
    const DATA_SIZE: usize = ARRAY_MAX_FIXED_MEMBERS;

    fn total_size_of(initial_size: usize) -> usize {
        align8(16 + (8 * initial_size).max(8))
    }

    fn construct(initial_size: usize, available_bytes: usize) -> Self {
        let needed = Self::total_size_of(initial_size);
        if available_bytes < needed {
            fatal(&format!(
                "KeyValues3: pre-allocated array memory is too small for {initial_size} elements ({available_bytes} bytes available, {needed} bytes needed)"
            ));
        }
        Self::new(initial_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    fn live_values(ctx: &Context<'_>) -> usize {
        ctx.stats().values.live()
    }

    #[test]
    fn set_count_grows_and_shrinks() {
        let mut ctx = Context::pool();
        let mut array = Array::new(0);
        array.set_count(&mut ctx, 10, TypeEx::INT, SubType::Int32);
        assert_eq!(array.count(), 10);
        assert!(array.is_dynamic());
        assert_eq!(array.capacity(), 10);
        assert_eq!(live_values(&ctx), 10);

        let first = array.element(0);
        array.set_count(&mut ctx, 3, TypeEx::NULL, SubType::Null);
        assert_eq!(array.count(), 3);
        assert_eq!(array.element(0), first);
        assert_eq!(live_values(&ctx), 3);
        // Capacity never shrinks.
        assert_eq!(array.capacity(), 10);
    }

    #[test]
    fn inline_storage_until_six() {
        let mut ctx = Context::pool();
        let mut array = Array::new(0);
        array.set_count(&mut ctx, 6, TypeEx::NULL, SubType::Null);
        assert!(!array.is_dynamic());
        assert_eq!(array.insert_multiple_before(&mut ctx, 6, 1), Some(6));
        assert!(array.is_dynamic());
        assert_eq!(array.capacity(), 12);
    }

    #[test]
    fn insert_shifts_tail_right() {
        let mut ctx = Context::pool();
        let mut array = Array::new(0);
        array.set_count(&mut ctx, 3, TypeEx::NULL, SubType::Null);
        let before: Vec<_> = array.elements().to_vec();
        assert_eq!(array.insert_multiple_before(&mut ctx, 1, 2), Some(1));
        assert_eq!(array.count(), 5);
        assert_eq!(array.element(0), Some(before[0]));
        assert_eq!(array.element(3), Some(before[1]));
        assert_eq!(array.element(4), Some(before[2]));
    }

    #[test]
    fn insert_past_end_is_rejected() {
        let mut ctx = Context::pool();
        let mut array = Array::new(0);
        assert_eq!(array.insert_multiple_before(&mut ctx, 1, 1), None);
        assert!(array.is_empty());
        assert_eq!(live_values(&ctx), 0);
    }

    #[test]
    fn remove_compacts_and_frees() {
        let mut ctx = Context::pool();
        let mut array = Array::new(0);
        array.set_count(&mut ctx, 5, TypeEx::NULL, SubType::Null);
        let before: Vec<_> = array.elements().to_vec();
        assert!(array.remove_multiple(&mut ctx, 1, 2));
        assert_eq!(array.elements(), &[before[0], before[3], before[4]]);
        assert_eq!(live_values(&ctx), 3);
        assert!(!array.remove_multiple(&mut ctx, 2, 2));
        assert!(!array.remove_multiple(&mut ctx, usize::MAX, 2));
        assert_eq!(array.count(), 3);
    }

    #[test]
    fn purge_content_respects_clearing() {
        let mut ctx = Context::pool();
        let mut array = Array::new(0);
        array.set_count(&mut ctx, 4, TypeEx::NULL, SubType::Null);
        array.purge_content(&mut ctx, true);
        assert!(array.is_empty());
        assert_eq!(live_values(&ctx), 4);

        array.set_count(&mut ctx, 2, TypeEx::NULL, SubType::Null);
        array.purge_content(&mut ctx, false);
        assert_eq!(live_values(&ctx), 4);
    }

    #[test]
    fn purge_buffers_returns_to_baseline() {
        let mut ctx = Context::pool();
        let mut array = Array::new(2);
        array.set_count(&mut ctx, 40, TypeEx::NULL, SubType::Null);
        array.purge_content(&mut ctx, false);
        array.purge_buffers();
        assert!(!array.is_dynamic());
        assert_eq!(array.capacity(), ARRAY_MAX_FIXED_MEMBERS);
    }

    #[test]
    fn size_model() {
        assert_eq!(Array::total_size_of(0), 24);
        assert_eq!(Array::total_size_of(1), 24);
        assert_eq!(Array::total_size_of(6), 64);
        assert_eq!(Array::construct(40, Array::total_size_of(40)).capacity(), 40);
    }

    #[test]
    #[should_panic(expected = "pre-allocated array memory is too small for 7 elements")]
    fn undersized_construction_is_fatal() {
        let _ = Array::construct(7, Array::total_size_of(6));
    }

    #[test]
    #[should_panic(expected = "element count overflow")]
    fn capacity_overflow_is_fatal() {
        let mut array = Array::new(0);
        array.ensure_element_capacity(ALLOC_ARRAY_MAX + 1, true);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn count_never_exceeds_capacity(ops in prop::collection::vec((0usize..3, 0usize..20), 1..60)) {
                let mut ctx = Context::pool();
                let mut array = Array::new(0);
                for (op, n) in ops {
                    match op {
                        0 => array.set_count(&mut ctx, n, TypeEx::NULL, SubType::Null),
                        1 => {
                            let at = n.min(array.count());
                            let _ = array.insert_multiple_before(&mut ctx, at, n % 4);
                        }
                        _ => {
                            let at = n.min(array.count());
                            let _ = array.remove_multiple(&mut ctx, at, 1);
                        }
                    }
                    prop_assert!(array.count() <= array.capacity());
                    prop_assert_eq!(ctx.stats().values.live(), array.count());
                }
            }
        }
    }
}
