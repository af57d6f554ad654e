//! Flag sets shared by the value model and its encoders.

use bitflags::bitflags;

bitflags! {
    /// Options for stringifying a value.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ToStringFlags: u32 {
        /// Append to the buffer instead of clearing it first. Also
        /// disables `DONT_APPEND_STRINGS`.
        const DONT_CLEAR_BUFF = 1;
        /// Return bool and string text directly instead of copying it
        /// into the buffer.
        const DONT_APPEND_STRINGS = 2;
        /// Skip placeholders such as `<pointer>` and `<table: N members>`.
        const APPEND_ONLY_NUMERICS = 4;
        /// Return the buffer for non-numeric values instead of `None`.
        const RETURN_NON_NUMERICS = 8;
    }
}

bitflags! {
    /// Presentation hints recorded in a value's metadata.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MetaDataFlags: u32 {
        /// The string was written as a multi-line literal.
        const MULTILINE_STRING = 1;
        /// The string was written with single quotes.
        const SINGLE_QUOTED_STRING = 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_bits_are_stable() {
        assert_eq!(ToStringFlags::DONT_CLEAR_BUFF.bits(), 1);
        assert_eq!(ToStringFlags::DONT_APPEND_STRINGS.bits(), 2);
        assert_eq!(ToStringFlags::APPEND_ONLY_NUMERICS.bits(), 4);
        assert_eq!(ToStringFlags::RETURN_NON_NUMERICS.bits(), 8);
        assert_eq!(MetaDataFlags::SINGLE_QUOTED_STRING.bits(), 2);
    }
}
