//! Walks through every primitive once and tears the whole tree down with a
//! single delete.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Duration;

use orb_core::{OrbError, Result};
use orb_runtime::{ObjectAttributes, TimerConfig, WorkItemConfig, declare_context_type};
use parking_lot::Mutex;
use tracing::info;

declare_context_type!(DEMO_CONTEXT, "DemoContext", 16);

pub(crate) fn run() -> Result<()> {
    let rt = super::runtime();
    let destroyed = Arc::new(AtomicUsize::new(0));
    let counted = |attrs: ObjectAttributes| {
        let destroyed = Arc::clone(&destroyed);
        attrs.on_destroy(move |_| {
            destroyed.fetch_add(1, Ordering::SeqCst);
        })
    };

    let root_attrs = counted(ObjectAttributes::new().with_context(&DEMO_CONTEXT));
    let root = rt.create_object(&root_attrs, 0, None)?;
    let under = || counted(ObjectAttributes::new().with_parent(&root));
    info!(root = %root.id(), "demo tree root created");

    if let Some(block) = root.context(&DEMO_CONTEXT) {
        block.write(|b| b[..4].copy_from_slice(b"orb!"));
        println!("context: {} ({} bytes)", block.type_info().name(), block.len());
    }

    let lock = rt.create_wait_lock(&under())?;
    {
        let _held = lock.lock(None)?;
        let probe = lock.acquire(Some(Duration::ZERO));
        println!(
            "wait lock: second acquire {}",
            if probe == Err(OrbError::Timeout) { "timed out" } else { "succeeded" }
        );
    }

    let spin = rt.create_spin_lock(&under())?;
    drop(spin.lock());

    let runs = Arc::new(AtomicUsize::new(0));
    let work = {
        let runs = Arc::clone(&runs);
        rt.create_work_item(
            &WorkItemConfig::new(move |_| {
                runs.fetch_add(1, Ordering::SeqCst);
            }),
            &under(),
        )?
    };
    work.enqueue();
    work.flush();
    println!("work item: ran {} time(s)", runs.load(Ordering::SeqCst));

    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    let timer = rt.create_timer(
        &TimerConfig::new(move |_| {
            let _ = tx.lock().send(());
        }),
        &under(),
    )?;
    timer.start(Duration::from_millis(10));
    let fired = rx.recv_timeout(Duration::from_secs(5)).is_ok();
    println!("timer: {}", if fired { "fired" } else { "did not fire" });

    let coll = rt.create_collection(&under())?;
    let mem = rt.create_memory(&under(), 256)?;
    for item in [lock.as_object(), spin.as_object(), mem.as_object()] {
        coll.add(item)?;
    }
    coll.remove_at(0);
    println!(
        "collection: {} entries, first is {}",
        coll.count(),
        coll.first().map(|o| o.kind().as_str()).unwrap_or("none")
    );

    println!("tree: {} children under root", root.child_count());
    root.delete();
    let stats = rt.stats();
    println!(
        "destroyed {} objects ({} callbacks), {} live",
        stats.destroyed,
        destroyed.load(Ordering::SeqCst),
        stats.live()
    );
    Ok(())
}
