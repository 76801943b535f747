//! Extension (context) type descriptors.

use std::fmt;

/// Describes an extension block: a name for diagnostics and the block size.
///
/// Descriptors are compared by address, never by content. Declare them as
/// `static` items (see [`declare_context_type!`](crate::declare_context_type))
/// so every use refers to the same instance.
pub struct ContextTypeInfo {
    name: &'static str,
    size: usize,
}

impl ContextTypeInfo {
    pub const fn new(name: &'static str, size: usize) -> Self {
        Self { name, size }
    }

    /// Descriptor sized for a value of type `T`.
    pub const fn sized_for<T>(name: &'static str) -> Self {
        Self {
            name,
            size: std::mem::size_of::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is(&self, other: &ContextTypeInfo) -> bool {
        std::ptr::eq(self, other)
    }
}

impl fmt::Debug for ContextTypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextTypeInfo")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("addr", &(self as *const Self))
            .finish()
    }
}

/// Declares a `static` [`ContextTypeInfo`].
///
/// ```
/// orb_core::declare_context_type!(DEVICE_CONTEXT, "DeviceContext", 64);
/// assert_eq!(DEVICE_CONTEXT.size(), 64);
/// ```
#[macro_export]
macro_rules! declare_context_type {
    ($vis:vis $ident:ident, $name:expr, $size:expr) => {
        $vis static $ident: $crate::ContextTypeInfo = $crate::ContextTypeInfo::new($name, $size);
    };
}
