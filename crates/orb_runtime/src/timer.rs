//! Cancellable timers.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use orb_core::{RawTimer, Result, TimerFire};
use tracing::debug;

use crate::object::{Object, ObjectAttributes, ObjectInner, Payload, typed_handle};
use crate::runtime::Runtime;

typed_handle!(
    /// Deferred callback that runs after an elapsed duration.
    Timer,
    Timer
);

pub type TimerCallback = Arc<dyn Fn(&Timer) + Send + Sync>;

#[derive(Clone)]
pub struct TimerConfig {
    pub callback: TimerCallback,
    /// Re-arm interval after each callback; `None` for one-shot timers.
    pub period: Option<Duration>,
}

impl TimerConfig {
    pub fn new(callback: impl Fn(&Timer) + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
            period: None,
        }
    }

    pub fn periodic(period: Duration, callback: impl Fn(&Timer) + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
            period: Some(period).filter(|p| !p.is_zero()),
        }
    }
}

impl fmt::Debug for TimerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerConfig")
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}

pub(crate) struct TimerPayload {
    pub(crate) raw: Box<dyn RawTimer>,
}

/// Slot the fire closure reads its owner from. Filled once the object exists,
/// and weak so the backend never keeps the object alive.
pub(crate) type OwnerSlot = Arc<OnceLock<Weak<ObjectInner>>>;

/// Owner of a fire closure, if it was created and has not been destroyed.
pub(crate) fn live_owner(slot: &OwnerSlot) -> Option<Object> {
    slot.get()
        .and_then(Object::from_weak)
        .filter(|obj| !obj.is_destroyed())
}

impl Timer {
    fn raw(&self) -> &dyn RawTimer {
        match &self.0.inner.payload {
            Payload::Timer(t) => t.raw.as_ref(),
            _ => unreachable!("timer handle without timer payload"),
        }
    }

    /// Arms the timer to fire after `due`. Returns whether it was already armed;
    /// re-arming replaces the previous due time.
    pub fn start(&self, due: Duration) -> bool {
        self.0.assert_live("timer start");
        self.raw().set(due)
    }

    /// Disarms the timer. With `wait`, also blocks until a running callback
    /// returns, so no callback is in flight or pending afterwards. Returns
    /// whether the timer was armed.
    pub fn stop(&self, wait: bool) -> bool {
        self.0.assert_live("timer stop");
        self.raw().cancel(wait)
    }
}

impl Runtime {
    pub fn create_timer(&self, config: &TimerConfig, attrs: &ObjectAttributes) -> Result<Timer> {
        let slot: OwnerSlot = Arc::new(OnceLock::new());
        let fire: TimerFire = {
            let slot = Arc::clone(&slot);
            let callback = Arc::clone(&config.callback);
            Box::new(move || {
                if let Some(obj) = live_owner(&slot) {
                    callback(&Timer(obj));
                }
            })
        };
        let raw = self.shared.platform.create_timer(fire, config.period)?;
        let obj = Object::create(&self.shared, attrs, Payload::Timer(TimerPayload { raw }), None)?;
        let _ = slot.set(obj.downgrade());
        debug!(object = %obj.id(), period = ?config.period, "timer created");
        Ok(Timer(obj))
    }
}
