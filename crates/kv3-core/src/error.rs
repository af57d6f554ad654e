//! Error types for decoding raw tags.

use std::error::Error;
use std::fmt;

/// Errors from converting raw bytes into core enumerations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoreError {
    /// A raw discriminant does not name any variant.
    InvalidDiscriminant {
        /// Which enumeration was being decoded.
        kind: &'static str,
        /// The offending raw value.
        value: u8,
    },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDiscriminant { kind, value } => {
                write!(f, "invalid {kind} discriminant: {value}")
            }
        }
    }
}

impl Error for CoreError {}
