#![allow(dead_code)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use orb_runtime::{Object, ObjectAttributes};
use parking_lot::Mutex;

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().clone()
}

/// Attributes that record `destroy:<label>` and `cleanup:<label>` into `log`.
pub fn traced(log: &Log, label: &str, parent: Option<&Object>) -> ObjectAttributes {
    let on_destroy = {
        let log = Arc::clone(log);
        let label = label.to_string();
        move |_: &Object| log.lock().push(format!("destroy:{label}"))
    };
    let on_cleanup = {
        let log = Arc::clone(log);
        let label = label.to_string();
        move |_: &Object| log.lock().push(format!("cleanup:{label}"))
    };
    let attrs = ObjectAttributes::new()
        .on_destroy(on_destroy)
        .on_cleanup(on_cleanup);
    match parent {
        Some(p) => attrs.with_parent(p),
        None => attrs,
    }
}

pub fn position(log: &[String], entry: &str) -> usize {
    log.iter()
        .position(|e| e == entry)
        .unwrap_or_else(|| panic!("{entry} missing from {log:?}"))
}

/// Polls `cond` until it holds or five seconds pass.
pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}
