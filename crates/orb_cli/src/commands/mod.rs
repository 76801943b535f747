pub(crate) mod demo;
pub(crate) mod info;
pub(crate) mod stress;

use orb_runtime::{Runtime, RuntimeConfig};

pub(crate) fn runtime() -> Runtime {
    Runtime::with_config(RuntimeConfig::from_env())
}
