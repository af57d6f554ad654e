//! The allocation capability containers use for their children.

use kv3_core::{SubType, TypeEx};

use crate::table::StoredName;
use crate::value::ValueId;

/// Allocates and releases child values on behalf of a container.
///
/// Arrays and tables never locate their owning arena themselves; every
/// operation that creates or destroys children receives the allocator
/// explicitly. [`Context`](crate::Context) is the only production
/// implementation.
pub trait ValueAllocator<'a> {
    /// Allocate a value of the given type.
    fn alloc_value(&mut self, type_ex: TypeEx, subtype: SubType) -> ValueId;

    /// Release a value and everything it owns.
    fn free_value(&mut self, id: ValueId);

    /// Store a member name the way this allocator keeps names.
    fn store_name(&mut self, name: &str) -> StoredName<'a>;
}
