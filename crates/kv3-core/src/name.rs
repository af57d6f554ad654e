//! Member-name hashing.
//!
//! Table lookups compare 32-bit hashes only. Names are hashed with
//! MurmurHash2 over their ASCII-lowercased bytes, so lookups are
//! case-insensitive.

/// Seed used for every member-name and string-token hash.
pub const STRING_TOKEN_SEED: u32 = 0x3141_5926;

const MURMUR_M: u32 = 0x5bd1_e995;
const MURMUR_R: u32 = 24;

/// 32-bit MurmurHash2 of `bytes` with each byte ASCII-lowercased.
pub fn murmur2_lowercase(bytes: &[u8], seed: u32) -> u32 {
    let mut h = seed ^ bytes.len() as u32;

    let mut chunks = bytes.chunks_exact(4);
    for chunk in &mut chunks {
        let mut k = u32::from_le_bytes([
            chunk[0].to_ascii_lowercase(),
            chunk[1].to_ascii_lowercase(),
            chunk[2].to_ascii_lowercase(),
            chunk[3].to_ascii_lowercase(),
        ]);
        k = k.wrapping_mul(MURMUR_M);
        k ^= k >> MURMUR_R;
        k = k.wrapping_mul(MURMUR_M);

        h = h.wrapping_mul(MURMUR_M);
        h ^= k;
    }

    let tail = chunks.remainder();
    if tail.len() >= 3 {
        h ^= u32::from(tail[2].to_ascii_lowercase()) << 16;
    }
    if tail.len() >= 2 {
        h ^= u32::from(tail[1].to_ascii_lowercase()) << 8;
    }
    if !tail.is_empty() {
        h ^= u32::from(tail[0].to_ascii_lowercase());
        h = h.wrapping_mul(MURMUR_M);
    }

    h ^= h >> 13;
    h = h.wrapping_mul(MURMUR_M);
    h ^= h >> 15;
    h
}

/// Hash a string into a string token.
pub fn make_string_token(s: &str) -> u32 {
    murmur2_lowercase(s.as_bytes(), STRING_TOKEN_SEED)
}

/// A member name paired with its hash.
///
/// The empty name hashes to 0. A name built with [`MemberName::from_hash`]
/// carries a precomputed hash and an optional display string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemberName<'n> {
    hash: u32,
    name: &'n str,
}

impl<'n> MemberName<'n> {
    /// Hash `name`.
    pub fn new(name: &'n str) -> Self {
        let hash = if name.is_empty() {
            0
        } else {
            make_string_token(name)
        };
        Self { hash, name }
    }

    /// A name whose hash is already known.
    pub fn from_hash(hash: u32, name: &'n str) -> Self {
        Self { hash, name }
    }

    /// The 32-bit hash used for lookups.
    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// The name text (may be empty for hash-only names).
    pub fn as_str(&self) -> &'n str {
        self.name
    }
}

impl<'n> From<&'n str> for MemberName<'n> {
    fn from(name: &'n str) -> Self {
        Self::new(name)
    }
}

impl Default for MemberName<'_> {
    fn default() -> Self {
        Self { hash: 0, name: "" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_hashes() {
        assert_eq!(make_string_token("x"), 0xf386_10ff);
        assert_eq!(make_string_token("name"), 0x70e8_f456);
        assert_eq!(make_string_token("origin"), 0xe420_0216);
        assert_eq!(make_string_token("Hello World"), 0xe01e_cd1c);
    }

    #[test]
    fn hashing_ignores_ascii_case() {
        assert_eq!(make_string_token("ORIGIN"), make_string_token("origin"));
        assert_eq!(make_string_token("Hello World"), make_string_token("hello world"));
    }

    #[test]
    fn empty_member_name_hashes_to_zero() {
        assert_eq!(MemberName::new("").hash(), 0);
        assert_eq!(make_string_token(""), 0xb5d8_9f2f);
    }

    #[test]
    fn from_hash_keeps_hash() {
        let name = MemberName::from_hash(7, "seven");
        assert_eq!(name.hash(), 7);
        assert_eq!(name.as_str(), "seven");
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn case_insensitive(s in "[a-zA-Z0-9_]{0,40}") {
                prop_assert_eq!(
                    make_string_token(&s.to_ascii_uppercase()),
                    make_string_token(&s.to_ascii_lowercase())
                );
            }
        }
    }
}
