//! Strongly-typed identifiers and token newtypes.

use std::fmt;

use crate::name::make_string_token;

/// Identifies an interned string within a context's symbol table.
///
/// Symbols are assigned sequentially on first interning and stay valid
/// until the owning context is cleared or purged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(pub u32);

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Symbol {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// A 32-bit hashed string, stored as an unsigned value with the
/// `string_token` subtype.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StringToken(pub u32);

impl StringToken {
    /// Hash a string the same way member names are hashed.
    pub fn from_str_hashed(s: &str) -> Self {
        Self(make_string_token(s))
    }
}

impl fmt::Display for StringToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl From<u32> for StringToken {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// An opaque 32-bit entity handle, stored with the `ehandle` subtype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EHandle(pub u32);

impl EHandle {
    /// The handle value that refers to no entity.
    pub const INVALID: EHandle = EHandle(u32::MAX);
}

impl Default for EHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for EHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EHandle {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_token_display_is_hex() {
        assert_eq!(StringToken(0x2a).to_string(), "0x0000002a");
    }

    #[test]
    fn default_ehandle_is_invalid() {
        assert_eq!(EHandle::default(), EHandle::INVALID);
    }

    #[test]
    fn string_token_matches_member_hash() {
        assert_eq!(StringToken::from_str_hashed("Name").0, 0x70e8_f456);
    }
}
