//! The runtime: platform selection, configuration and object accounting.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use orb_core::{OrbError, Platform, Result};
use tracing::{debug, trace};

use crate::config::RuntimeConfig;
use crate::platform::StdPlatform;

/// Entry point for creating objects.
///
/// A runtime is cheap to clone; every clone and every object created through it
/// shares the same platform and counters.
#[derive(Clone)]
pub struct Runtime {
    pub(crate) shared: Arc<RuntimeShared>,
}

pub(crate) struct RuntimeShared {
    pub(crate) platform: Box<dyn Platform>,
    pub(crate) config: RuntimeConfig,
    created: AtomicU64,
    destroyed: AtomicU64,
}

/// Snapshot of object accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuntimeStats {
    pub created: u64,
    pub destroyed: u64,
}

impl RuntimeStats {
    /// Objects created but not yet destroyed.
    pub fn live(&self) -> u64 {
        self.created.saturating_sub(self.destroyed)
    }
}

impl Runtime {
    /// Runtime on the std backend with default configuration.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Runtime on the std backend.
    pub fn with_config(config: RuntimeConfig) -> Self {
        let platform = StdPlatform::new(&config);
        Self::from_parts(config, Box::new(platform))
    }

    /// Runtime on an injected platform. The platform is initialized here and
    /// uninitialized once the runtime and every object created through it are gone.
    pub fn with_platform(config: RuntimeConfig, platform: Box<dyn Platform>) -> Result<Self> {
        platform.initialize()?;
        Ok(Self::from_parts(config, platform))
    }

    fn from_parts(config: RuntimeConfig, platform: Box<dyn Platform>) -> Self {
        debug!(platform = platform.name(), ?config, "runtime started");
        Self {
            shared: Arc::new(RuntimeShared {
                platform,
                config,
                created: AtomicU64::new(0),
                destroyed: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.shared.config
    }

    pub fn platform_name(&self) -> &'static str {
        self.shared.platform.name()
    }

    pub fn stats(&self) -> RuntimeStats {
        // Destroyed first: a snapshot never shows more destroyed than created.
        let destroyed = self.shared.destroyed.load(Ordering::Acquire);
        let created = self.shared.created.load(Ordering::Acquire);
        RuntimeStats { created, destroyed }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("platform", &self.platform_name())
            .field("stats", &self.stats())
            .finish()
    }
}

impl RuntimeShared {
    /// Zeroed buffer from the platform, bounded by `max_allocation`.
    pub(crate) fn allocate(&self, what: &'static str, size: usize) -> Result<Box<[u8]>> {
        let limit = self.config.max_allocation;
        if size > limit {
            return Err(OrbError::AllocationLimit {
                requested: size,
                limit,
            });
        }
        self.platform.allocate(size).map_err(|e| match e {
            OrbError::ResourceExhausted { size, .. } => OrbError::exhausted(what, size),
            other => other,
        })
    }

    pub(crate) fn note_created(&self) {
        self.created.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn note_destroyed(&self) {
        self.destroyed.fetch_add(1, Ordering::AcqRel);
    }
}

impl Drop for RuntimeShared {
    fn drop(&mut self) {
        trace!(platform = self.platform.name(), "runtime shut down");
        self.platform.uninitialize();
    }
}
