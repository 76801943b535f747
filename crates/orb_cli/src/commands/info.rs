use std::io::Write;

use orb_core::Result;

pub(crate) fn run() -> Result<()> {
    let rt = super::runtime();
    let config = rt.config();
    let mut out = std::io::stdout().lock();
    let _ = writeln!(out, "orb {}", env!("CARGO_PKG_VERSION"));
    let _ = writeln!(out, "platform: {}", rt.platform_name());
    let _ = writeln!(out, "max_allocation: {}", config.max_allocation);
    let _ = writeln!(out, "timer_thread_prefix: {}", config.timer_thread_prefix);
    let _ = writeln!(out, "spin_yield_after: {}", config.spin_yield_after);
    Ok(())
}
