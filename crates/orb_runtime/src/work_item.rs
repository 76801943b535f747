//! Work items: callbacks run as soon as possible on another execution context.
//!
//! A work item is a zero-delay timer underneath. Enqueueing an item that is
//! already pending coalesces into the single pending invocation.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use orb_core::{RawTimer, Result, TimerFire};
use tracing::debug;

use crate::object::{Object, ObjectAttributes, Payload, typed_handle};
use crate::runtime::Runtime;
use crate::timer::{OwnerSlot, live_owner};

typed_handle!(
    /// Deferred callback run on an independent execution context.
    WorkItem,
    WorkItem
);

pub type WorkItemCallback = Arc<dyn Fn(&WorkItem) + Send + Sync>;

#[derive(Clone)]
pub struct WorkItemConfig {
    pub callback: WorkItemCallback,
}

impl WorkItemConfig {
    pub fn new(callback: impl Fn(&WorkItem) + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
        }
    }
}

impl fmt::Debug for WorkItemConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItemConfig").finish_non_exhaustive()
    }
}

pub(crate) struct WorkItemPayload {
    pub(crate) raw: Box<dyn RawTimer>,
}

impl WorkItem {
    fn raw(&self) -> &dyn RawTimer {
        match &self.0.inner.payload {
            Payload::WorkItem(w) => w.raw.as_ref(),
            _ => unreachable!("work item handle without work item payload"),
        }
    }

    /// Requests the callback. Returns immediately; the callback never runs on
    /// the caller's context.
    pub fn enqueue(&self) {
        self.0.assert_live("work item enqueue");
        self.raw().set(Duration::ZERO);
    }

    /// Blocks until the pending invocation, if any, has completed.
    /// Called from the item's own callback it returns immediately.
    pub fn flush(&self) {
        self.0.assert_live("work item flush");
        self.raw().flush();
    }
}

impl Runtime {
    pub fn create_work_item(
        &self,
        config: &WorkItemConfig,
        attrs: &ObjectAttributes,
    ) -> Result<WorkItem> {
        let slot: OwnerSlot = Arc::new(OnceLock::new());
        let fire: TimerFire = {
            let slot = Arc::clone(&slot);
            let callback = Arc::clone(&config.callback);
            Box::new(move || {
                if let Some(obj) = live_owner(&slot) {
                    callback(&WorkItem(obj));
                }
            })
        };
        let raw = self.shared.platform.create_timer(fire, None)?;
        let obj = Object::create(
            &self.shared,
            attrs,
            Payload::WorkItem(WorkItemPayload { raw }),
            None,
        )?;
        let _ = slot.set(obj.downgrade());
        debug!(object = %obj.id(), "work item created");
        Ok(WorkItem(obj))
    }
}
