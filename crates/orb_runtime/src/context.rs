//! Per-object extension blocks, looked up by descriptor identity.

use std::fmt;
use std::sync::Arc;

use orb_core::{ContextTypeInfo, Result};
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::trace;

use crate::object::Object;

/// A zero-initialized data block attached to one object.
///
/// Blocks are never detached individually; they are released together when
/// the owning object is destroyed.
pub struct ContextBlock {
    type_info: &'static ContextTypeInfo,
    data: Mutex<Box<[u8]>>,
}

impl ContextBlock {
    pub fn type_info(&self) -> &'static ContextTypeInfo {
        self.type_info
    }

    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exclusive access to the block. The guard derefs to a slice, so the
    /// block's length cannot change through it.
    pub fn lock(&self) -> MappedMutexGuard<'_, [u8]> {
        MutexGuard::map(self.data.lock(), |data| &mut **data)
    }

    pub fn read<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.data.lock()[..])
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        f(&mut self.data.lock()[..])
    }
}

impl fmt::Debug for ContextBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextBlock")
            .field("type", &self.type_info.name())
            .field("len", &self.len())
            .finish()
    }
}

impl Object {
    /// Attaches a block sized by the descriptor.
    pub fn attach_context(&self, info: &'static ContextTypeInfo) -> Result<Arc<ContextBlock>> {
        self.attach_context_with_size(info, info.size())
    }

    /// Attaches a block of `size` bytes under `info`. Attaching the same
    /// descriptor twice keeps both blocks; lookups keep returning the first.
    pub fn attach_context_with_size(
        &self,
        info: &'static ContextTypeInfo,
        size: usize,
    ) -> Result<Arc<ContextBlock>> {
        self.assert_live("attach context");
        let data = self.inner.runtime.allocate("context", size)?;
        let block = Arc::new(ContextBlock {
            type_info: info,
            data: Mutex::new(data),
        });
        self.lock_state().extensions.push(Arc::clone(&block));
        trace!(object = %self.id(), context = info.name(), size, "context attached");
        Ok(block)
    }

    /// First block attached under exactly this descriptor.
    pub fn context(&self, info: &'static ContextTypeInfo) -> Option<Arc<ContextBlock>> {
        self.lock_state()
            .extensions
            .iter()
            .find(|block| block.type_info.is(info))
            .cloned()
    }
}
