//! Failure kinds surfaced by the runtime.
//!
//! Programmer errors (wrong handle kind, use after destroy, double delete) are
//! not represented here: they are asserted and abort the offending call.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrbError {
    #[error("insufficient resources allocating {what} ({size} bytes)")]
    ResourceExhausted { what: &'static str, size: usize },

    #[error("allocation of {requested} bytes exceeds the configured limit of {limit} bytes")]
    AllocationLimit { requested: usize, limit: usize },

    #[error("wait timed out")]
    Timeout,

    #[error("operation was unsuccessful")]
    Unsuccessful,

    #[error("platform `{platform}` cannot provide a {primitive}")]
    Unsupported {
        platform: &'static str,
        primitive: &'static str,
    },
}

impl OrbError {
    pub fn exhausted(what: &'static str, size: usize) -> Self {
        OrbError::ResourceExhausted { what, size }
    }

    /// Allocation failures of any origin; always rolled back before being returned.
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(
            self,
            OrbError::ResourceExhausted { .. } | OrbError::AllocationLimit { .. }
        )
    }

    /// The environment cannot supply the primitive at all; retrying is pointless.
    pub fn is_fatal(&self) -> bool {
        matches!(self, OrbError::Unsupported { .. })
    }
}

pub type Result<T> = std::result::Result<T, OrbError>;
