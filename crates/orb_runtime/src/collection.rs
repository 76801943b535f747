//! Thread-safe, insertion-ordered collections of object handles.
//!
//! Entries are associations only: adding an object does not reference it and
//! deleting the collection does not delete its entries.

use std::cell::UnsafeCell;
use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};

use orb_core::{OrbError, RawSpinLock, Result};
use tracing::debug;

use crate::object::{Object, ObjectAttributes, Payload, typed_handle};
use crate::runtime::Runtime;

typed_handle!(
    /// Insertion-ordered sequence of object handles guarded by a spin lock.
    Collection,
    Collection
);

pub(crate) struct CollectionPayload {
    lock: Box<dyn RawSpinLock>,
    items: UnsafeCell<VecDeque<Object>>,
}

// SAFETY: `items` is only reached through `Entries`, which holds `lock`.
unsafe impl Sync for CollectionPayload {}

struct Entries<'a> {
    payload: &'a CollectionPayload,
}

impl CollectionPayload {
    fn entries(&self) -> Entries<'_> {
        self.lock.acquire();
        Entries { payload: self }
    }

    pub(crate) fn clear(&self) {
        let drained: VecDeque<Object> = std::mem::take(&mut *self.entries());
        drop(drained);
    }
}

impl Deref for Entries<'_> {
    type Target = VecDeque<Object>;

    fn deref(&self) -> &VecDeque<Object> {
        // SAFETY: the spin lock is held for the lifetime of `self`.
        unsafe { &*self.payload.items.get() }
    }
}

impl DerefMut for Entries<'_> {
    fn deref_mut(&mut self) -> &mut VecDeque<Object> {
        // SAFETY: the spin lock is held for the lifetime of `self`, and
        // `&mut self` rules out a second borrow through this guard.
        unsafe { &mut *self.payload.items.get() }
    }
}

impl Drop for Entries<'_> {
    fn drop(&mut self) {
        self.payload.lock.release();
    }
}

impl Collection {
    fn payload(&self) -> &CollectionPayload {
        match &self.0.inner.payload {
            Payload::Collection(c) => c,
            _ => unreachable!("collection handle without collection payload"),
        }
    }

    fn entries(&self) -> Entries<'_> {
        self.0.assert_live("collection access");
        self.payload().entries()
    }

    pub fn count(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Appends `item` after every existing entry.
    pub fn add(&self, item: &Object) -> Result<()> {
        let mut entries = self.entries();
        entries
            .try_reserve(1)
            .map_err(|_| OrbError::exhausted("collection entry", std::mem::size_of::<Object>()))?;
        entries.push_back(item.clone());
        Ok(())
    }

    /// Removes the first entry identical to `item`. Absent items are ignored.
    pub fn remove(&self, item: &Object) {
        let removed = {
            let mut entries = self.entries();
            let pos = entries.iter().position(|e| e == item);
            pos.and_then(|pos| entries.remove(pos))
        };
        // Dropped outside the spin lock: the last handle may release backend resources.
        drop(removed);
    }

    /// Removes the entry at `index`. Out-of-range indices are ignored.
    pub fn remove_at(&self, index: usize) {
        let removed = self.entries().remove(index);
        drop(removed);
    }

    pub fn get(&self, index: usize) -> Option<Object> {
        self.entries().get(index).cloned()
    }

    pub fn first(&self) -> Option<Object> {
        self.entries().front().cloned()
    }

    pub fn last(&self) -> Option<Object> {
        self.entries().back().cloned()
    }

    /// Snapshot of every entry in order.
    pub fn to_vec(&self) -> Vec<Object> {
        self.entries().iter().cloned().collect()
    }
}

impl Runtime {
    pub fn create_collection(&self, attrs: &ObjectAttributes) -> Result<Collection> {
        let lock = self.shared.platform.create_spin_lock().map_err(|e| match e {
            OrbError::ResourceExhausted { size, .. } => OrbError::exhausted("collection", size),
            other => other,
        })?;
        let payload = CollectionPayload {
            lock,
            items: UnsafeCell::new(VecDeque::new()),
        };
        let obj = Object::create(&self.shared, attrs, Payload::Collection(payload), None)?;
        debug!(object = %obj.id(), "collection created");
        Ok(Collection(obj))
    }
}
