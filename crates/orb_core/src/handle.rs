//! Object identity and type tags.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a managed object.
///
/// Ids are never reused, so a stale id can never alias a newer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl ObjectId {
    pub fn next() -> Self {
        ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Type tag stored in every object; typed handles check it on conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Generic,
    Memory,
    WaitLock,
    SpinLock,
    Timer,
    WorkItem,
    Collection,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Generic => "object",
            ObjectKind::Memory => "memory",
            ObjectKind::WaitLock => "wait-lock",
            ObjectKind::SpinLock => "spin-lock",
            ObjectKind::Timer => "timer",
            ObjectKind::WorkItem => "work-item",
            ObjectKind::Collection => "collection",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
