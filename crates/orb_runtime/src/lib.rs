//! Orb object runtime.
//!
//! - `runtime` - Runtime handle, platform selection and object accounting
//! - `object` - Object lifecycle: ownership tree, reference counts, cascading delete
//! - `context` - Per-object extension blocks
//! - `sync` - Wait locks and spin locks
//! - `timer` / `work_item` - Deferred execution
//! - `collection` - Thread-safe ordered collections of handles
//! - `memory` - Byte buffers with object lifetime
//! - `platform` - Default std backend

/// Checks a programmer-error condition. Violations are logged and then panic;
/// they are never returned as errors.
macro_rules! invariant {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            tracing::error!($($arg)+);
            panic!($($arg)+);
        }
    };
}

pub(crate) use invariant;

mod collection;
mod config;
mod context;
mod memory;
mod object;
mod platform;
mod runtime;
mod sync;
mod timer;
mod work_item;

pub use collection::Collection;
pub use config::RuntimeConfig;
pub use context::ContextBlock;
pub use memory::Memory;
pub use object::{Object, ObjectAttributes, ObjectCallback, PayloadDestructor};
pub use platform::StdPlatform;
pub use runtime::{Runtime, RuntimeStats};
pub use sync::{SpinLock, SpinLockGuard, WaitLock, WaitLockGuard};
pub use timer::{Timer, TimerCallback, TimerConfig};
pub use work_item::{WorkItem, WorkItemCallback, WorkItemConfig};

pub use orb_core::{
    ContextTypeInfo, ObjectId, ObjectKind, OrbError, Platform, RawSpinLock, RawTimer, RawWaitLock,
    Result, TimerFire, WaitStatus, declare_context_type,
};
