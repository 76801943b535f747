//! Wait locks and spin locks as managed objects.
//!
//! Both are thin wrappers over the platform's raw primitives. The explicit
//! acquire/release pairs mirror the raw contract; `lock()` adds a guard that
//! releases on drop.

use std::time::Duration;

use orb_core::{OrbError, RawSpinLock, RawWaitLock, Result, WaitStatus};
use tracing::debug;

use crate::object::{Object, ObjectAttributes, Payload, typed_handle};
use crate::runtime::Runtime;

typed_handle!(
    /// Blocking lock with optional timeout.
    WaitLock,
    WaitLock
);

typed_handle!(
    /// Non-suspending lock for short critical sections.
    SpinLock,
    SpinLock
);

impl WaitLock {
    fn raw(&self) -> &dyn RawWaitLock {
        match &self.0.inner.payload {
            Payload::WaitLock(raw) => raw.as_ref(),
            _ => unreachable!("wait lock handle without wait lock payload"),
        }
    }

    /// Blocks until the lock is free or `timeout` elapses. `None` waits
    /// forever; `Some(Duration::ZERO)` never suspends the caller.
    pub fn acquire(&self, timeout: Option<Duration>) -> Result<()> {
        self.0.assert_live("wait lock acquire");
        match self.raw().acquire(timeout) {
            WaitStatus::Acquired => Ok(()),
            WaitStatus::TimedOut => Err(OrbError::Timeout),
            WaitStatus::Failed => Err(OrbError::Unsuccessful),
        }
    }

    /// The caller must hold the lock.
    pub fn release(&self) {
        self.0.assert_live("wait lock release");
        self.raw().release();
    }

    pub fn lock(&self, timeout: Option<Duration>) -> Result<WaitLockGuard<'_>> {
        self.acquire(timeout)?;
        Ok(WaitLockGuard { lock: self })
    }
}

#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct WaitLockGuard<'a> {
    lock: &'a WaitLock,
}

impl Drop for WaitLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}

impl SpinLock {
    pub(crate) fn raw(&self) -> &dyn RawSpinLock {
        match &self.0.inner.payload {
            Payload::SpinLock(raw) => raw.as_ref(),
            _ => unreachable!("spin lock handle without spin lock payload"),
        }
    }

    pub fn acquire(&self) {
        self.0.assert_live("spin lock acquire");
        self.raw().acquire();
    }

    pub fn try_acquire(&self) -> bool {
        self.0.assert_live("spin lock acquire");
        self.raw().try_acquire()
    }

    /// The caller must hold the lock.
    pub fn release(&self) {
        self.0.assert_live("spin lock release");
        self.raw().release();
    }

    pub fn lock(&self) -> SpinLockGuard<'_> {
        self.acquire();
        SpinLockGuard { lock: self }
    }
}

#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct SpinLockGuard<'a> {
    lock: &'a SpinLock,
}

impl Drop for SpinLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}

impl Runtime {
    pub fn create_wait_lock(&self, attrs: &ObjectAttributes) -> Result<WaitLock> {
        let raw = self.shared.platform.create_wait_lock()?;
        let obj = Object::create(&self.shared, attrs, Payload::WaitLock(raw), None)?;
        debug!(object = %obj.id(), "wait lock created");
        Ok(WaitLock(obj))
    }

    pub fn create_spin_lock(&self, attrs: &ObjectAttributes) -> Result<SpinLock> {
        let raw = self.shared.platform.create_spin_lock()?;
        let obj = Object::create(&self.shared, attrs, Payload::SpinLock(raw), None)?;
        debug!(object = %obj.id(), "spin lock created");
        Ok(SpinLock(obj))
    }
}
