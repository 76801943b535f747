//! Runtime configuration.

use tracing::warn;

const DEFAULT_MAX_ALLOCATION: usize = 256 * 1024 * 1024;

/// Runtime configuration options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Largest single payload, extension or memory buffer the runtime will allocate.
    pub max_allocation: usize,
    /// Name prefix for the threads the std timer backend spawns.
    pub timer_thread_prefix: String,
    /// Busy-wait iterations before the std spin lock starts yielding the CPU.
    pub spin_yield_after: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_allocation: DEFAULT_MAX_ALLOCATION,
            timer_thread_prefix: "orb-timer".to_string(),
            spin_yield_after: 128,
        }
    }
}

impl RuntimeConfig {
    /// Defaults overlaid with `ORB_MAX_ALLOCATION`, `ORB_TIMER_THREAD_PREFIX`
    /// and `ORB_SPIN_YIELD_AFTER`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(v) = lookup("ORB_MAX_ALLOCATION") {
            match v.trim().parse::<usize>() {
                Ok(n) => config.max_allocation = n,
                Err(e) => warn!(value = %v, error = %e, "ignoring malformed ORB_MAX_ALLOCATION"),
            }
        }
        if let Some(v) = lookup("ORB_TIMER_THREAD_PREFIX") {
            let v = v.trim();
            if v.is_empty() {
                warn!("ignoring empty ORB_TIMER_THREAD_PREFIX");
            } else {
                config.timer_thread_prefix = v.to_string();
            }
        }
        if let Some(v) = lookup("ORB_SPIN_YIELD_AFTER") {
            match v.trim().parse::<u32>() {
                Ok(n) => config.spin_yield_after = n,
                Err(e) => warn!(value = %v, error = %e, "ignoring malformed ORB_SPIN_YIELD_AFTER"),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn overlays_known_keys() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("ORB_MAX_ALLOCATION", "4096"),
            ("ORB_TIMER_THREAD_PREFIX", "drv"),
            ("ORB_SPIN_YIELD_AFTER", " 7 "),
        ]));
        assert_eq!(config.max_allocation, 4096);
        assert_eq!(config.timer_thread_prefix, "drv");
        assert_eq!(config.spin_yield_after, 7);
    }

    #[test]
    fn malformed_values_keep_defaults() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("ORB_MAX_ALLOCATION", "lots"),
            ("ORB_TIMER_THREAD_PREFIX", "   "),
        ]));
        assert_eq!(config, RuntimeConfig::default());
    }
}
