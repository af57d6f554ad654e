//! Arena-specific error types.

use std::error::Error;
use std::fmt;

use crate::handle::NodeHandle;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// A raw node list cannot grow to the requested size.
    CapacityExceeded {
        /// Number of bytes requested.
        requested: usize,
        /// Largest size the list may reach.
        capacity: usize,
    },
    /// A handle whose slot was freed, reused, or cleared.
    StaleHandle {
        /// The offending handle.
        handle: NodeHandle,
    },
    /// A configuration value is out of range.
    InvalidConfig {
        /// What is wrong with it.
        reason: String,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "node list capacity exceeded: requested {requested} bytes, capacity {capacity} bytes"
                )
            }
            Self::StaleHandle { handle } => write!(f, "stale handle: {handle}"),
            Self::InvalidConfig { reason } => write!(f, "invalid arena config: {reason}"),
        }
    }
}

impl Error for ArenaError {}
