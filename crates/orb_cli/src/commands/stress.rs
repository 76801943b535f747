//! Concurrent create/register/delete churn against one shared collection.

use std::thread;
use std::time::Instant;

use orb_core::{OrbError, Result};
use orb_runtime::ObjectAttributes;
use tracing::debug;

pub(crate) fn run(threads: usize, items: usize) -> Result<()> {
    let rt = super::runtime();
    let registry = rt.create_collection(&ObjectAttributes::new())?;
    let start = Instant::now();

    let workers: Vec<_> = (0..threads)
        .map(|t| {
            let rt = rt.clone();
            let registry = registry.clone();
            thread::spawn(move || -> Result<()> {
                let parent = rt.create_object(&ObjectAttributes::new(), 0, None)?;
                let attrs = ObjectAttributes::new().with_parent(&parent);
                for _ in 0..items {
                    let child = rt.create_object(&attrs, 8, None)?;
                    registry.add(&child)?;
                }
                for child in parent.children().iter().step_by(2) {
                    registry.remove(child);
                }
                parent.delete();
                debug!(thread = t, items, "stress worker finished");
                Ok(())
            })
        })
        .collect();

    for worker in workers {
        worker.join().map_err(|_| OrbError::Unsuccessful)??;
    }

    let registered = registry.count();
    registry.delete();
    let stats = rt.stats();
    println!(
        "stress: threads={threads} items={items} registered={registered} created={} destroyed={} live={} elapsed={:.1}ms",
        stats.created,
        stats.destroyed,
        stats.live(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    if stats.live() != 0 {
        return Err(OrbError::Unsuccessful);
    }
    Ok(())
}
