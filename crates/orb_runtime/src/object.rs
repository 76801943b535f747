//! Object lifecycle: creation, ownership tree, reference counting and
//! cascading destruction.
//!
//! Every object carries a logical reference count that starts at 1. `delete`
//! drops one reference; the drop that reaches zero destroys the object and,
//! before it, every descendant in the ownership tree. Handles (`Object` and the
//! typed wrappers) are plain pointers to the control block: holding one keeps
//! the memory valid but has no effect on the logical lifetime.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use ahash::RandomState;
use indexmap::IndexMap;
use orb_core::{ContextTypeInfo, ObjectId, ObjectKind, RawSpinLock, RawWaitLock, Result};
use parking_lot::{Mutex, MutexGuard};
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::collection::CollectionPayload;
use crate::context::ContextBlock;
use crate::memory::MemoryPayload;
use crate::runtime::{Runtime, RuntimeShared};
use crate::timer::TimerPayload;
use crate::work_item::WorkItemPayload;

/// Cleanup and destroy callbacks receive the object they were registered on.
pub type ObjectCallback = Arc<dyn Fn(&Object) + Send + Sync>;

/// Runs once, after the destroy callback, right before the payload is released.
pub type PayloadDestructor = Box<dyn FnOnce(&Object) + Send>;

/// Options recognized by every creation operation.
#[derive(Clone, Default)]
pub struct ObjectAttributes {
    pub parent: Option<Object>,
    pub cleanup: Option<ObjectCallback>,
    pub destroy: Option<ObjectCallback>,
    pub context_type: Option<&'static ContextTypeInfo>,
}

impl ObjectAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(mut self, parent: &Object) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    pub fn on_cleanup(mut self, f: impl Fn(&Object) + Send + Sync + 'static) -> Self {
        self.cleanup = Some(Arc::new(f));
        self
    }

    pub fn on_destroy(mut self, f: impl Fn(&Object) + Send + Sync + 'static) -> Self {
        self.destroy = Some(Arc::new(f));
        self
    }

    pub fn with_context(mut self, info: &'static ContextTypeInfo) -> Self {
        self.context_type = Some(info);
        self
    }
}

impl fmt::Debug for ObjectAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectAttributes")
            .field("parent", &self.parent)
            .field("cleanup", &self.cleanup.is_some())
            .field("destroy", &self.destroy.is_some())
            .field("context_type", &self.context_type)
            .finish()
    }
}

/// Type-specific data of an object.
pub(crate) enum Payload {
    Bytes(Mutex<Box<[u8]>>),
    Memory(MemoryPayload),
    WaitLock(Box<dyn RawWaitLock>),
    SpinLock(Box<dyn RawSpinLock>),
    Timer(TimerPayload),
    WorkItem(WorkItemPayload),
    Collection(CollectionPayload),
}

impl Payload {
    fn kind(&self) -> ObjectKind {
        match self {
            Payload::Bytes(_) => ObjectKind::Generic,
            Payload::Memory(_) => ObjectKind::Memory,
            Payload::WaitLock(_) => ObjectKind::WaitLock,
            Payload::SpinLock(_) => ObjectKind::SpinLock,
            Payload::Timer(_) => ObjectKind::Timer,
            Payload::WorkItem(_) => ObjectKind::WorkItem,
            Payload::Collection(_) => ObjectKind::Collection,
        }
    }

    /// Releases backend resources. Deferred callbacks never run after this returns.
    fn teardown(&self) {
        match self {
            Payload::Timer(t) => t.raw.close(),
            Payload::WorkItem(w) => w.raw.close(),
            Payload::Collection(c) => c.clear(),
            Payload::Bytes(_) | Payload::Memory(_) | Payload::WaitLock(_) | Payload::SpinLock(_) => {}
        }
    }
}

pub(crate) struct ObjectInner {
    id: ObjectId,
    refs: AtomicUsize,
    destroyed: AtomicBool,
    cleanup: Option<ObjectCallback>,
    destroy: Option<ObjectCallback>,
    state: Mutex<ObjectState>,
    pub(crate) payload: Payload,
    payload_destructor: Mutex<Option<PayloadDestructor>>,
    pub(crate) runtime: Arc<RuntimeShared>,
}

/// Guarded by the object's own lock.
pub(crate) struct ObjectState {
    parent: Option<Weak<ObjectInner>>,
    children: IndexMap<ObjectId, Object, RandomState>,
    pub(crate) extensions: SmallVec<[Arc<ContextBlock>; 2]>,
}

/// Handle to a managed object.
#[derive(Clone)]
pub struct Object {
    pub(crate) inner: Arc<ObjectInner>,
}

impl Object {
    /// Builds the control block around an already constructed payload and
    /// links it into the parent. Nothing escapes on failure: the payload is
    /// torn down and the parent is left untouched.
    pub(crate) fn create(
        runtime: &Arc<RuntimeShared>,
        attrs: &ObjectAttributes,
        payload: Payload,
        destructor: Option<PayloadDestructor>,
    ) -> Result<Object> {
        let obj = Object {
            inner: Arc::new(ObjectInner {
                id: ObjectId::next(),
                refs: AtomicUsize::new(1),
                destroyed: AtomicBool::new(false),
                cleanup: attrs.cleanup.clone(),
                destroy: attrs.destroy.clone(),
                state: Mutex::new(ObjectState {
                    parent: None,
                    children: IndexMap::with_hasher(RandomState::new()),
                    extensions: SmallVec::new(),
                }),
                payload,
                payload_destructor: Mutex::new(destructor),
                runtime: Arc::clone(runtime),
            }),
        };

        if let Some(info) = attrs.context_type.filter(|info| info.size() > 0) {
            if let Err(e) = obj.attach_context(info) {
                debug!(object = %obj.id(), context = info.name(), error = %e, "creation rolled back");
                obj.inner.payload.teardown();
                obj.inner.destroyed.store(true, Ordering::Release);
                return Err(e);
            }
        }

        if let Some(parent) = &attrs.parent {
            parent.assert_live("attach child");
            // Back-pointer first: the child must be complete once the parent can see it.
            obj.inner.state.lock().parent = Some(Arc::downgrade(&parent.inner));
            parent
                .inner
                .state
                .lock()
                .children
                .insert(obj.id(), obj.clone());
        }

        runtime.note_created();
        trace!(
            object = %obj.id(),
            kind = %obj.kind(),
            parent = ?attrs.parent.as_ref().map(Object::id),
            "created"
        );
        Ok(obj)
    }

    pub fn id(&self) -> ObjectId {
        self.inner.id
    }

    pub fn kind(&self) -> ObjectKind {
        self.inner.payload.kind()
    }

    /// Current logical reference count; zero once destroyed.
    pub fn ref_count(&self) -> usize {
        self.inner.refs.load(Ordering::Acquire)
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::Acquire)
    }

    /// Owning parent, if any. Does not touch reference counts.
    pub fn parent(&self) -> Option<Object> {
        let state = self.inner.state.lock();
        state
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Object { inner })
    }

    pub fn child_count(&self) -> usize {
        self.inner.state.lock().children.len()
    }

    /// Snapshot of the live children in creation order.
    pub fn children(&self) -> Vec<Object> {
        self.inner.state.lock().children.values().cloned().collect()
    }

    /// Adds a logical reference. Each reference needs its own `delete`, unless
    /// a parent is destroyed first: that drops every outstanding reference.
    pub fn reference(&self) {
        let prev = self
            .inner
            .refs
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n > 0).then(|| n + 1)
            });
        crate::invariant!(
            prev.is_ok(),
            "reference taken on destroyed {} {}",
            self.kind(),
            self.id()
        );
        trace!(object = %self.id(), refs = prev.map_or(0, |n| n + 1), "referenced");
    }

    /// Drops one logical reference. The cleanup callback runs on every call;
    /// the call that drops the last reference destroys this object and all of
    /// its descendants before returning.
    pub fn delete(&self) {
        if self.release() == 0 {
            destroy_tree(self.clone());
        }
    }

    /// Decrements the count and runs the cleanup callback. Returns the new count.
    fn release(&self) -> usize {
        let prev = self
            .inner
            .refs
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        crate::invariant!(
            prev.is_ok(),
            "delete on {} {} with no references left",
            self.kind(),
            self.id()
        );
        let remaining = prev.map_or(0, |n| n - 1);
        trace!(object = %self.id(), refs = remaining, "released");
        if let Some(cleanup) = &self.inner.cleanup {
            cleanup(self);
        }
        remaining
    }

    /// Runs the destroy sequence for an object whose count reached zero and
    /// whose children have already been destroyed.
    fn finalize(&self) {
        if let Some(destroy) = &self.inner.destroy {
            destroy(self);
        }

        let parent = self.inner.state.lock().parent.take();
        if let Some(parent) = parent.and_then(|weak| weak.upgrade()) {
            parent.state.lock().children.shift_remove(&self.id());
        }

        let destructor = self.inner.payload_destructor.lock().take();
        if let Some(destructor) = destructor {
            destructor(self);
        }
        self.inner.payload.teardown();
        self.inner.state.lock().extensions.clear();

        self.inner.runtime.note_destroyed();
        self.inner.destroyed.store(true, Ordering::Release);
        debug!(object = %self.id(), kind = %self.kind(), "destroyed");
    }

    pub(crate) fn assert_live(&self, op: &str) {
        crate::invariant!(
            !self.is_destroyed(),
            "{op} on destroyed {} {}",
            self.kind(),
            self.id()
        );
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, ObjectState> {
        self.inner.state.lock()
    }

    pub(crate) fn from_weak(weak: &Weak<ObjectInner>) -> Option<Object> {
        weak.upgrade().map(|inner| Object { inner })
    }

    pub(crate) fn downgrade(&self) -> Weak<ObjectInner> {
        Arc::downgrade(&self.inner)
    }

    /// Runs `f` on the payload of a generic object; `None` for other kinds.
    pub fn with_payload<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> Option<R> {
        self.assert_live("payload access");
        match &self.inner.payload {
            Payload::Bytes(bytes) => Some(f(&mut bytes.lock()[..])),
            _ => None,
        }
    }

    pub fn payload_len(&self) -> usize {
        match &self.inner.payload {
            Payload::Bytes(bytes) => bytes.lock().len(),
            _ => 0,
        }
    }
}

/// Post-order destruction without recursion: an object is finalized only
/// after every child has been finalized. Each child is released until its
/// count reaches zero, so extra references never keep a descendant alive.
/// Only one object lock is held at any time.
fn destroy_tree(root: Object) {
    let mut stack: Vec<(Object, bool)> = vec![(root, false)];
    while let Some((obj, expanded)) = stack.pop() {
        if expanded {
            if obj.child_count() == 0 {
                obj.finalize();
            } else {
                // Children attached while this node was being walked.
                stack.push((obj, false));
            }
            continue;
        }
        let children: SmallVec<[Object; 8]> = obj.lock_state().children.values().cloned().collect();
        stack.push((obj, true));
        for child in children.into_iter().rev() {
            let mut remaining = child.release();
            if remaining > 0 {
                warn!(child = %child.id(), refs = remaining, "parent destroyed; dropping outstanding references");
            }
            while remaining > 0 {
                remaining = child.release();
            }
            stack.push((child, false));
        }
    }
}

impl Drop for ObjectInner {
    /// A tree dropped without `delete` is unwound iteratively, so depth never
    /// reaches the stack.
    fn drop(&mut self) {
        let mut pending: Vec<Object> = self
            .state
            .get_mut()
            .children
            .drain(..)
            .map(|(_, child)| child)
            .collect();
        while let Some(child) = pending.pop() {
            if let Some(mut inner) = Arc::into_inner(child.inner) {
                pending.extend(inner.state.get_mut().children.drain(..).map(|(_, c)| c));
            }
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Object {}

impl Hash for Object {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind(), self.id())
    }
}

impl Runtime {
    /// Creates a generic object with a zeroed payload of `payload_size` bytes.
    pub fn create_object(
        &self,
        attrs: &ObjectAttributes,
        payload_size: usize,
        destructor: Option<PayloadDestructor>,
    ) -> Result<Object> {
        let bytes = self.shared.allocate("object payload", payload_size)?;
        Object::create(
            &self.shared,
            attrs,
            Payload::Bytes(Mutex::new(bytes)),
            destructor,
        )
    }
}

/// Generates a typed handle around [`Object`] with a checked conversion.
macro_rules! typed_handle {
    ($(#[$meta:meta])* $name:ident, $kind:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash)]
        pub struct $name(pub(crate) $crate::object::Object);

        impl $name {
            /// Checked conversion from a generic handle.
            pub fn from_object(obj: &$crate::object::Object) -> Option<Self> {
                (obj.kind() == orb_core::ObjectKind::$kind).then(|| Self(obj.clone()))
            }

            pub fn as_object(&self) -> &$crate::object::Object {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = $crate::object::Object;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Debug::fmt(&self.0, f)
            }
        }

        impl From<$name> for $crate::object::Object {
            fn from(handle: $name) -> Self {
                handle.0
            }
        }
    };
}

pub(crate) use typed_handle;
