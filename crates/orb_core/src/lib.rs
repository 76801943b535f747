//! Core types for the orb object runtime.
//!
//! This crate contains the fundamental types that are independent of the runtime:
//! - `ObjectId` / `ObjectKind` - Identity and type tag of managed objects
//! - `OrbError` - Failure kinds returned by creation and wait operations
//! - `ContextTypeInfo` - Descriptor for per-object extension blocks
//! - `Platform` - Injected capability traits (locks, timers, allocation)

pub mod context;
pub mod error;
pub mod handle;
pub mod platform;

pub use context::ContextTypeInfo;
pub use error::{OrbError, Result};
pub use handle::{ObjectId, ObjectKind};
pub use platform::{
    Platform, RawSpinLock, RawTimer, RawWaitLock, TimerFire, WaitStatus, zeroed_buffer,
};
