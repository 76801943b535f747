//! Default platform backed by std threads and parking_lot primitives.
//!
//! - wait locks are event-style: a flag plus a condition variable, so any
//!   thread may release what another acquired
//! - spin locks busy-wait, then yield the CPU after a configurable number of spins
//! - every timer owns one worker thread that sleeps until the due time

use std::hint;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use orb_core::{
    OrbError, Platform, RawSpinLock, RawTimer, RawWaitLock, Result, TimerFire, WaitStatus,
};
use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, trace, warn};

use crate::config::RuntimeConfig;

/// Due times beyond this are clamped so `Instant` arithmetic cannot overflow.
const MAX_DUE: Duration = Duration::from_secs(365 * 24 * 60 * 60);

static TIMER_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct StdPlatform {
    timer_thread_prefix: String,
    spin_yield_after: u32,
}

impl StdPlatform {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            timer_thread_prefix: config.timer_thread_prefix.clone(),
            spin_yield_after: config.spin_yield_after,
        }
    }
}

impl Default for StdPlatform {
    fn default() -> Self {
        Self::new(&RuntimeConfig::default())
    }
}

impl Platform for StdPlatform {
    fn name(&self) -> &'static str {
        "std"
    }

    fn create_wait_lock(&self) -> Result<Box<dyn RawWaitLock>> {
        Ok(Box::new(StdWaitLock::default()))
    }

    fn create_spin_lock(&self) -> Result<Box<dyn RawSpinLock>> {
        Ok(Box::new(StdSpinLock {
            locked: AtomicBool::new(false),
            yield_after: self.spin_yield_after,
        }))
    }

    fn create_timer(
        &self,
        fire: TimerFire,
        period: Option<Duration>,
    ) -> Result<Box<dyn RawTimer>> {
        let timer = StdTimer::spawn(&self.timer_thread_prefix, fire, period)?;
        Ok(Box::new(timer))
    }
}

#[derive(Default)]
struct StdWaitLock {
    held: Mutex<bool>,
    available: Condvar,
}

impl RawWaitLock for StdWaitLock {
    fn acquire(&self, timeout: Option<Duration>) -> WaitStatus {
        let mut held = self.held.lock();
        let deadline = match timeout {
            Some(t) if t.is_zero() => {
                if *held {
                    return WaitStatus::TimedOut;
                }
                None
            }
            Some(t) => Instant::now().checked_add(t),
            None => None,
        };
        while *held {
            match deadline {
                Some(deadline) => {
                    if self.available.wait_until(&mut held, deadline).timed_out() && *held {
                        return WaitStatus::TimedOut;
                    }
                }
                None => self.available.wait(&mut held),
            }
        }
        *held = true;
        WaitStatus::Acquired
    }

    fn release(&self) {
        let mut held = self.held.lock();
        crate::invariant!(*held, "wait lock released while not held");
        *held = false;
        drop(held);
        self.available.notify_one();
    }
}

struct StdSpinLock {
    locked: AtomicBool,
    yield_after: u32,
}

impl RawSpinLock for StdSpinLock {
    fn acquire(&self) {
        let mut spins = 0u32;
        while !self.try_acquire() {
            while self.locked.load(Ordering::Relaxed) {
                if spins < self.yield_after {
                    spins += 1;
                    hint::spin_loop();
                } else {
                    thread::yield_now();
                }
            }
        }
    }

    fn try_acquire(&self) -> bool {
        self.locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    fn release(&self) {
        let was_locked = self.locked.swap(false, Ordering::Release);
        crate::invariant!(was_locked, "spin lock released while not held");
    }
}

struct TimerShared {
    state: Mutex<TimerState>,
    changed: Condvar,
    fire: TimerFire,
    period: Option<Duration>,
}

#[derive(Default)]
struct TimerState {
    due: Option<Instant>,
    /// Bumped by every set or cancel; a periodic re-arm only applies when it is
    /// unchanged across the callback.
    generation: u64,
    running: bool,
    shutdown: bool,
}

struct StdTimer {
    shared: Arc<TimerShared>,
    worker: ThreadId,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl StdTimer {
    fn spawn(prefix: &str, fire: TimerFire, period: Option<Duration>) -> Result<Self> {
        let shared = Arc::new(TimerShared {
            state: Mutex::new(TimerState::default()),
            changed: Condvar::new(),
            fire,
            period,
        });
        let name = format!("{prefix}-{}", TIMER_SEQ.fetch_add(1, Ordering::Relaxed));
        let handle = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name(name.clone())
                .spawn(move || run_timer(&shared))
                .map_err(|e| {
                    warn!(thread = %name, error = %e, "failed to spawn timer thread");
                    OrbError::exhausted("timer thread", 0)
                })?
        };
        trace!(thread = %name, ?period, "timer thread spawned");
        Ok(Self {
            shared,
            worker: handle.thread().id(),
            handle: Mutex::new(Some(handle)),
        })
    }

    fn on_worker(&self) -> bool {
        thread::current().id() == self.worker
    }

    fn lock(&self) -> MutexGuard<'_, TimerState> {
        self.shared.state.lock()
    }
}

fn due_at(due: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(due.min(MAX_DUE)).unwrap_or(now)
}

fn run_timer(shared: &TimerShared) {
    let mut state = shared.state.lock();
    while !state.shutdown {
        let Some(due) = state.due else {
            shared.changed.wait(&mut state);
            continue;
        };
        if Instant::now() < due {
            shared.changed.wait_until(&mut state, due);
            continue;
        }

        state.due = None;
        state.running = true;
        let generation = state.generation;
        let outcome = MutexGuard::unlocked(&mut state, || {
            panic::catch_unwind(AssertUnwindSafe(|| (shared.fire)()))
        });
        state.running = false;
        if outcome.is_err() {
            warn!("timer callback panicked");
        }
        if let Some(period) = shared.period {
            if state.generation == generation && !state.shutdown && state.due.is_none() {
                state.due = Some(due_at(period));
            }
        }
        shared.changed.notify_all();
    }
    debug!("timer thread exiting");
}

impl RawTimer for StdTimer {
    fn set(&self, due: Duration) -> bool {
        let mut state = self.lock();
        let was_armed = state.due.is_some();
        state.due = Some(due_at(due));
        state.generation += 1;
        self.shared.changed.notify_all();
        was_armed
    }

    fn cancel(&self, wait: bool) -> bool {
        let mut state = self.lock();
        let was_armed = state.due.take().is_some();
        state.generation += 1;
        self.shared.changed.notify_all();
        if wait && !self.on_worker() {
            while state.running {
                self.shared.changed.wait(&mut state);
            }
        }
        was_armed
    }

    fn flush(&self) {
        if self.on_worker() {
            return;
        }
        let mut state = self.lock();
        while !state.shutdown && (state.due.is_some() || state.running) {
            self.shared.changed.wait(&mut state);
        }
    }

    fn close(&self) {
        {
            let mut state = self.lock();
            state.shutdown = true;
            state.due = None;
            state.generation += 1;
            self.shared.changed.notify_all();
        }
        let handle = self.handle.lock().take();
        // Closed from its own callback: the thread exits once the callback returns.
        if let Some(handle) = handle.filter(|_| !self.on_worker()) {
            if handle.join().is_err() {
                warn!("timer thread terminated abnormally");
            }
        }
    }
}

impl Drop for StdTimer {
    fn drop(&mut self) {
        self.close();
    }
}
