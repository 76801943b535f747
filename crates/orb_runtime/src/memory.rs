//! Memory objects: byte buffers with object lifetime.

use orb_core::Result;
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::debug;

use crate::object::{Object, ObjectAttributes, Payload, typed_handle};
use crate::runtime::Runtime;

typed_handle!(
    /// Byte buffer owned by the object tree.
    Memory,
    Memory
);

pub(crate) struct MemoryPayload {
    buffer: Mutex<Box<[u8]>>,
    preallocated: bool,
}

impl Memory {
    fn payload(&self) -> &MemoryPayload {
        match &self.0.inner.payload {
            Payload::Memory(m) => m,
            _ => unreachable!("memory handle without memory payload"),
        }
    }

    pub fn len(&self) -> usize {
        self.payload().buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exclusive access to the buffer, fixed at its creation length.
    pub fn buffer(&self) -> MappedMutexGuard<'_, [u8]> {
        self.0.assert_live("memory access");
        MutexGuard::map(self.payload().buffer.lock(), |buf| &mut **buf)
    }

    /// Whether the buffer was supplied by the caller rather than allocated here.
    pub fn is_preallocated(&self) -> bool {
        self.payload().preallocated
    }
}

impl Runtime {
    /// Allocates a zeroed buffer of `size` bytes through the platform.
    pub fn create_memory(&self, attrs: &ObjectAttributes, size: usize) -> Result<Memory> {
        let buffer = self.shared.allocate("memory", size)?;
        self.wrap_memory(attrs, buffer, false)
    }

    /// Adopts `buffer` without allocating.
    pub fn create_memory_preallocated(
        &self,
        attrs: &ObjectAttributes,
        buffer: Box<[u8]>,
    ) -> Result<Memory> {
        self.wrap_memory(attrs, buffer, true)
    }

    fn wrap_memory(
        &self,
        attrs: &ObjectAttributes,
        buffer: Box<[u8]>,
        preallocated: bool,
    ) -> Result<Memory> {
        let size = buffer.len();
        let payload = MemoryPayload {
            buffer: Mutex::new(buffer),
            preallocated,
        };
        let obj = Object::create(&self.shared, attrs, Payload::Memory(payload), None)?;
        debug!(object = %obj.id(), size, preallocated, "memory created");
        Ok(Memory(obj))
    }
}
