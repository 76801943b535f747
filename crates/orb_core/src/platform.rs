//! Platform capability traits for dependency injection.
//!
//! The runtime never touches OS primitives directly. A `Platform` is chosen once
//! when the runtime is built and every lock, timer and buffer is obtained from it.

use std::time::Duration;

use crate::error::{OrbError, Result};

/// Outcome of a blocking acquire on a [`RawWaitLock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    Acquired,
    TimedOut,
    Failed,
}

/// Blocking mutual exclusion with an optional timeout.
///
/// The lock is not owned by a thread: it may be released from a context other
/// than the one that acquired it.
pub trait RawWaitLock: Send + Sync {
    /// `None` waits forever; `Some(Duration::ZERO)` probes without blocking.
    fn acquire(&self, timeout: Option<Duration>) -> WaitStatus;
    fn release(&self);
}

/// Non-suspending mutual exclusion for very short critical sections.
pub trait RawSpinLock: Send + Sync {
    fn acquire(&self);
    fn try_acquire(&self) -> bool;
    fn release(&self);
}

/// Callback a [`RawTimer`] invokes on its own execution context.
pub type TimerFire = Box<dyn Fn() + Send + Sync>;

/// A one-shot (or periodic) deferred callback.
pub trait RawTimer: Send + Sync {
    /// Arms the timer to fire after `due`. Returns whether it was already armed.
    fn set(&self, due: Duration) -> bool;

    /// Disarms the timer. With `wait`, also blocks until an in-flight callback
    /// returns. Returns whether the timer was armed.
    fn cancel(&self, wait: bool) -> bool;

    /// Blocks until the timer is neither armed nor running its callback.
    fn flush(&self);

    /// Disarms the timer, waits for any callback and releases backend resources.
    /// No callback runs after `close` returns.
    fn close(&self);
}

pub trait Platform: Send + Sync {
    fn name(&self) -> &'static str;

    /// Called once when a runtime adopts this platform.
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Called once when the adopting runtime is dropped.
    fn uninitialize(&self) {}

    /// Returns a zero-filled buffer of exactly `size` bytes.
    fn allocate(&self, size: usize) -> Result<Box<[u8]>> {
        zeroed_buffer(size)
    }

    fn create_wait_lock(&self) -> Result<Box<dyn RawWaitLock>> {
        Err(self.unsupported("wait lock"))
    }

    fn create_spin_lock(&self) -> Result<Box<dyn RawSpinLock>> {
        Err(self.unsupported("spin lock"))
    }

    /// `period`, when set, re-arms the timer after every callback until cancelled.
    fn create_timer(
        &self,
        fire: TimerFire,
        period: Option<Duration>,
    ) -> Result<Box<dyn RawTimer>> {
        let _ = (fire, period);
        Err(self.unsupported("timer"))
    }

    fn unsupported(&self, primitive: &'static str) -> OrbError {
        OrbError::Unsupported {
            platform: self.name(),
            primitive,
        }
    }
}

/// Allocates a zeroed buffer without aborting the process on failure.
pub fn zeroed_buffer(size: usize) -> Result<Box<[u8]>> {
    let mut buf: Vec<u8> = Vec::new();
    buf.try_reserve_exact(size)
        .map_err(|_| OrbError::exhausted("buffer", size))?;
    buf.resize(size, 0);
    Ok(buf.into_boxed_slice())
}
