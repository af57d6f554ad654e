//! Text rendering of values.
//!
//! Numbers print the way C's `printf` would (`%lld`, `%llu`, `%g`);
//! everything else prints as a bracketed placeholder such as
//! `<table: 3 members>`, subject to [`ToStringFlags`].

use std::fmt;

use kv3_core::{SubType, ToStringFlags};

use crate::packed::PackedElement;
use crate::read::ValueRef;
use crate::value::Data;

/// Significant digits printed for floating-point values.
const PRECISION: i32 = 6;

/// Format `v` like C's `%g`.
pub fn format_g(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_owned();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_owned();
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0" } else { "0" }.to_owned();
    }

    // Rounding to the printed precision decides the exponent.
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, v);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= PRECISION {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", strip_zeros(mantissa), exp.unsigned_abs())
    } else {
        let decimals = (PRECISION - 1 - exp) as usize;
        strip_zeros(&format!("{v:.decimals$}")).to_owned()
    }
}

fn strip_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

fn packed_text(element: PackedElement) -> String {
    match element {
        PackedElement::Float32(v) => format_g(f64::from(v)),
        PackedElement::Float64(v) => format_g(v),
        PackedElement::Int16(v) => v.to_string(),
        PackedElement::Int32(v) => v.to_string(),
        PackedElement::UInt8(v) => v.to_string(),
    }
}

/// Append a placeholder and decide whether it is returned.
fn non_numeric<'s>(
    buf: &'s mut String,
    flags: ToStringFlags,
    placeholder: impl FnOnce() -> String,
) -> Option<&'s str> {
    if !flags.contains(ToStringFlags::APPEND_ONLY_NUMERICS) {
        buf.push_str(&placeholder());
    }
    if flags.contains(ToStringFlags::RETURN_NON_NUMERICS) {
        Some(buf.as_str())
    } else {
        None
    }
}

fn text<'s>(buf: &'s mut String, flags: ToStringFlags, text: &'s str) -> Option<&'s str> {
    if flags.contains(ToStringFlags::DONT_APPEND_STRINGS) {
        return Some(text);
    }
    buf.push_str(text);
    Some(buf.as_str())
}

fn numeric<'s>(buf: &'s mut String, text: &str) -> Option<&'s str> {
    buf.push_str(text);
    Some(buf.as_str())
}

impl<'c, 'a> ValueRef<'c, 'a> {
    /// Render this value into `buf`.
    ///
    /// Returns the rendered text, which is `buf` itself except for bools
    /// and strings under [`ToStringFlags::DONT_APPEND_STRINGS`]. Values
    /// without a numeric rendering return `None` unless
    /// [`ToStringFlags::RETURN_NON_NUMERICS`] is set.
    pub fn to_string_into<'s>(&self, buf: &'s mut String, flags: ToStringFlags) -> Option<&'s str>
    where
        'c: 's,
    {
        let mut flags = flags;
        if flags.contains(ToStringFlags::DONT_CLEAR_BUFF) {
            flags.remove(ToStringFlags::DONT_APPEND_STRINGS);
        } else {
            buf.clear();
        }

        match self.data() {
            Data::Null => Some(buf.as_str()),
            Data::Bool(v) => text(buf, flags, if *v { "true" } else { "false" }),
            Data::Int(v) => numeric(buf, &v.to_string()),
            Data::UInt(_) if self.get_sub_type() == SubType::Pointer => {
                non_numeric(buf, flags, || "<pointer>".to_owned())
            }
            Data::UInt(v) => numeric(buf, &v.to_string()),
            Data::Double(v) => numeric(buf, &format_g(*v)),
            Data::String(_) | Data::ShortString(_) | Data::ExternString(_) => {
                text(buf, flags, self.get_string(""))
            }
            Data::Blob(_) | Data::ExternBlob(_) => {
                let size = self.get_binary_blob_size();
                non_numeric(buf, flags, || format!("<binary blob: {size} bytes>"))
            }
            Data::Array(_) | Data::Packed(_) => {
                let count = self.get_array_element_count();
                if (1..=4).contains(&count) {
                    if let Some(elements) = self.numeric_elements() {
                        return numeric(buf, &elements);
                    }
                }
                non_numeric(buf, flags, || format!("<array: {count} elements>"))
            }
            Data::Table(_) => {
                let count = self.get_member_count();
                non_numeric(buf, flags, || format!("<table: {count} members>"))
            }
            Data::Invalid => {
                let ty = self.get_type();
                non_numeric(buf, flags, || {
                    format!("<unknown KV3 basic type '{}' ({})>", ty.as_str(), ty as u8)
                })
            }
        }
    }

    /// Space-separated numeric elements, or `None` if any element has no
    /// numeric rendering.
    fn numeric_elements(&self) -> Option<String> {
        let parts: Vec<String> = match self.get_packed_array() {
            Some(packed) => packed.iter().map(packed_text).collect(),
            None => self
                .array_elements()
                .map(|element| match element.data() {
                    Data::Int(v) => Some(v.to_string()),
                    Data::UInt(v) if element.get_sub_type() != SubType::Pointer => {
                        Some(v.to_string())
                    }
                    Data::Double(v) => Some(format_g(*v)),
                    _ => None,
                })
                .collect::<Option<_>>()?,
        };
        Some(parts.join(" "))
    }
}

impl fmt::Display for ValueRef<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = String::new();
        let rendered = self.to_string_into(&mut buf, ToStringFlags::RETURN_NON_NUMERICS);
        f.write_str(rendered.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Context;
    use kv3_core::{EHandle, TypeEx};

    fn render(
        build: impl FnOnce(&mut crate::ValueMut<'_, '_>),
        flags: ToStringFlags,
    ) -> Option<String> {
        let mut ctx = Context::new();
        build(&mut ctx.root_mut());
        let mut buf = String::new();
        ctx.root().to_string_into(&mut buf, flags).map(str::to_owned)
    }

    #[test]
    fn percent_g_matches_c() {
        let cases = [
            (0.0, "0"),
            (0.1, "0.1"),
            (-2.5, "-2.5"),
            (100000.0, "100000"),
            (1e6, "1e+06"),
            (123456789.0, "1.23457e+08"),
            (1.5e-5, "1.5e-05"),
            (0.0001, "0.0001"),
            (1234.56789, "1234.57"),
            (999999.5, "1e+06"),
            (1e100, "1e+100"),
            (f64::INFINITY, "inf"),
            (f64::NEG_INFINITY, "-inf"),
            (f64::NAN, "nan"),
        ];
        for (v, expected) in cases {
            assert_eq!(format_g(v), expected, "formatting {v}");
        }
    }

    #[test]
    fn scalars() {
        let flags = ToStringFlags::empty();
        assert_eq!(render(|v| v.set_int(-7), flags).as_deref(), Some("-7"));
        assert_eq!(
            render(|v| v.set_uint64(u64::MAX), flags).as_deref(),
            Some("18446744073709551615")
        );
        assert_eq!(render(|v| v.set_float(0.25), flags).as_deref(), Some("0.25"));
        assert_eq!(render(|v| v.set_bool(true), flags).as_deref(), Some("true"));
        assert_eq!(render(|v| v.set_to_null(), flags).as_deref(), Some(""));
        assert_eq!(render(|v| v.set_ehandle(EHandle(3)), flags).as_deref(), Some("3"));
    }

    #[test]
    fn placeholders_follow_flags() {
        fn pointer(v: &mut crate::ValueMut<'_, '_>) {
            v.set_pointer(0xdead);
        }
        assert_eq!(render(pointer, ToStringFlags::empty()), None);
        assert_eq!(
            render(pointer, ToStringFlags::RETURN_NON_NUMERICS).as_deref(),
            Some("<pointer>")
        );
        assert_eq!(
            render(
                pointer,
                ToStringFlags::RETURN_NON_NUMERICS | ToStringFlags::APPEND_ONLY_NUMERICS
            )
            .as_deref(),
            Some("")
        );
        let flags = ToStringFlags::RETURN_NON_NUMERICS;
        assert_eq!(
            render(|v| v.set_to_binary_blob(&[1, 2, 3]), flags).as_deref(),
            Some("<binary blob: 3 bytes>")
        );
        assert_eq!(
            render(|v| { v.find_or_create_member("a"); }, flags).as_deref(),
            Some("<table: 1 members>")
        );
    }

    #[test]
    fn short_arrays_print_elements() {
        let flags = ToStringFlags::empty();
        assert_eq!(
            render(|v| v.set_array_float32(&[1.0, 0.5, -2.0], SubType::Vector), flags).as_deref(),
            Some("1 0.5 -2")
        );
        assert_eq!(
            render(|v| v.set_array_uint8(&[255, 0], SubType::Unspecified), flags).as_deref(),
            Some("255 0")
        );
        assert_eq!(
            render(
                |v| {
                    if let Some(mut e) = v.add_array_element_to_tail() {
                        e.set_int(-1);
                    }
                    if let Some(mut e) = v.add_array_element_to_tail() {
                        e.set_double(1e7);
                    }
                },
                flags
            )
            .as_deref(),
            Some("-1 1e+07")
        );
    }

    #[test]
    fn long_or_mixed_arrays_use_placeholder() {
        let flags = ToStringFlags::RETURN_NON_NUMERICS;
        assert_eq!(
            render(|v| v.set_array_int32(&[1, 2, 3, 4, 5], SubType::Unspecified), flags)
                .as_deref(),
            Some("<array: 5 elements>")
        );
        assert_eq!(
            render(
                |v| {
                    if let Some(mut e) = v.add_array_element_to_tail() {
                        e.set_string("x", SubType::String);
                    }
                },
                flags
            )
            .as_deref(),
            Some("<array: 1 elements>")
        );
        assert_eq!(
            render(|v| v.set_to_empty_array(), ToStringFlags::empty()),
            None
        );
    }

    #[test]
    fn strings_can_be_returned_without_copying() {
        let mut ctx = Context::new();
        ctx.root_mut().set_string("hello world", SubType::String);
        let mut buf = String::from("keep");
        let root = ctx.root();
        let out = root.to_string_into(&mut buf, ToStringFlags::DONT_APPEND_STRINGS);
        assert_eq!(out, Some("hello world"));
        assert!(buf.is_empty());

        let mut buf = String::from("keep ");
        let out = root.to_string_into(
            &mut buf,
            ToStringFlags::DONT_CLEAR_BUFF | ToStringFlags::DONT_APPEND_STRINGS,
        );
        assert_eq!(out, Some("keep hello world"));
    }

    #[test]
    fn invalid_value_names_its_type() {
        let mut ctx = Context::new();
        let root = ctx.root_id();
        ctx.prepare_for_type(root, TypeEx::INVALID, SubType::Invalid);
        let mut buf = String::new();
        assert_eq!(
            ctx.root().to_string_into(&mut buf, ToStringFlags::RETURN_NON_NUMERICS),
            Some("<unknown KV3 basic type 'invalid' (0)>")
        );
    }

    #[test]
    fn display_uses_placeholders() {
        let mut ctx = Context::new();
        ctx.root_mut().set_string("hi", SubType::String);
        assert_eq!(ctx.root().to_string(), "hi");
        ctx.root_mut().set_pointer(1);
        assert_eq!(ctx.root().to_string(), "<pointer>");
    }
}
