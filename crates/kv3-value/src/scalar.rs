//! Scalar coercion shared by the typed getters.
//!
//! Numeric payloads convert with `as` semantics. Strings are parsed,
//! and a string that does not parse yields the caller's default.

/// A primitive the typed getters can produce from any scalar payload.
pub(crate) trait Scalar: Copy {
    fn from_bool(v: bool) -> Self;
    fn from_i64(v: i64) -> Self;
    fn from_u64(v: u64) -> Self;
    fn from_f64(v: f64) -> Self;
    fn parse(s: &str) -> Option<Self>;
}

macro_rules! numeric_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl Scalar for $t {
                fn from_bool(v: bool) -> Self {
                    v as u8 as $t
                }

                fn from_i64(v: i64) -> Self {
                    v as $t
                }

                fn from_u64(v: u64) -> Self {
                    v as $t
                }

                fn from_f64(v: f64) -> Self {
                    v as $t
                }

                fn parse(s: &str) -> Option<Self> {
                    s.trim().parse().ok()
                }
            }
        )*
    };
}

numeric_scalar!(i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

impl Scalar for bool {
    fn from_bool(v: bool) -> Self {
        v
    }

    fn from_i64(v: i64) -> Self {
        v != 0
    }

    fn from_u64(v: u64) -> Self {
        v != 0
    }

    fn from_f64(v: f64) -> Self {
        v != 0.0
    }

    fn parse(s: &str) -> Option<Self> {
        parse_bool(s)
    }
}

/// `true`/`yes`/`1` and `false`/`no`/`0`, case-insensitive.
pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    let s = s.trim();
    if ["true", "yes", "1"].iter().any(|t| s.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if ["false", "no", "0"].iter().any(|t| s.eq_ignore_ascii_case(t)) {
        Some(false)
    } else {
        None
    }
}

/// Split a space-separated numeric list, skipping empty fields.
pub(crate) fn split_numeric_list(s: &str) -> impl Iterator<Item = &str> {
    s.split(' ').filter(|field| !field.is_empty())
}
