use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use orb_runtime::{ObjectAttributes, ObjectKind, OrbError, Runtime};

#[test]
fn zero_timeout_probe_does_not_block() {
    let rt = Runtime::new();
    let lock = rt.create_wait_lock(&ObjectAttributes::new()).unwrap();
    assert_eq!(lock.kind(), ObjectKind::WaitLock);
    lock.acquire(None).unwrap();

    let start = Instant::now();
    assert_eq!(lock.acquire(Some(Duration::ZERO)), Err(OrbError::Timeout));
    assert!(start.elapsed() < Duration::from_secs(1));

    lock.release();
    lock.acquire(Some(Duration::ZERO)).unwrap();
    lock.release();
    lock.delete();
}

#[test]
fn bounded_wait_times_out() {
    let rt = Runtime::new();
    let lock = rt.create_wait_lock(&ObjectAttributes::new()).unwrap();
    let _held = lock.lock(None).unwrap();
    let start = Instant::now();
    let err = lock.acquire(Some(Duration::from_millis(30))).unwrap_err();
    assert_eq!(err, OrbError::Timeout);
    assert!(start.elapsed() >= Duration::from_millis(30));
}

#[test]
fn wait_lock_can_be_released_by_another_thread() {
    let rt = Runtime::new();
    let lock = rt.create_wait_lock(&ObjectAttributes::new()).unwrap();
    lock.acquire(None).unwrap();
    let releaser = {
        let lock = lock.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            lock.release();
        })
    };
    lock.acquire(Some(Duration::from_secs(5))).unwrap();
    releaser.join().unwrap();
    lock.release();
}

#[test]
fn wait_lock_serializes_threads() {
    let rt = Runtime::new();
    let lock = rt.create_wait_lock(&ObjectAttributes::new()).unwrap();
    let inside = Arc::new(AtomicUsize::new(0));
    let total = Arc::new(AtomicUsize::new(0));
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let lock = lock.clone();
            let inside = Arc::clone(&inside);
            let total = Arc::clone(&total);
            thread::spawn(move || {
                for _ in 0..200 {
                    let _guard = lock.lock(None).unwrap();
                    assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                    total.fetch_add(1, Ordering::SeqCst);
                    inside.fetch_sub(1, Ordering::SeqCst);
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }
    assert_eq!(total.load(Ordering::SeqCst), 800);
}

#[test]
fn spin_lock_serializes_threads() {
    let rt = Runtime::new();
    let lock = rt.create_spin_lock(&ObjectAttributes::new()).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let lock = lock.clone();
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                for _ in 0..1000 {
                    let _guard = lock.lock();
                    let n = counter.load(Ordering::Relaxed);
                    counter.store(n + 1, Ordering::Relaxed);
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }
    assert_eq!(counter.load(Ordering::Relaxed), 4000);
    assert!(lock.try_acquire());
    assert!(!lock.try_acquire());
    lock.release();
}

#[test]
fn locks_live_in_the_ownership_tree() {
    let rt = Runtime::new();
    let owner = rt.create_object(&ObjectAttributes::new(), 0, None).unwrap();
    let lock = rt
        .create_spin_lock(&ObjectAttributes::new().with_parent(&owner))
        .unwrap();
    assert_eq!(owner.child_count(), 1);
    owner.delete();
    assert!(lock.is_destroyed());
}

#[test]
#[should_panic(expected = "released while not held")]
fn releasing_an_unheld_wait_lock_panics() {
    let rt = Runtime::new();
    let lock = rt.create_wait_lock(&ObjectAttributes::new()).unwrap();
    lock.release();
}

#[test]
#[should_panic(expected = "spin lock acquire on destroyed")]
fn destroyed_lock_cannot_be_used() {
    let rt = Runtime::new();
    let lock = rt.create_spin_lock(&ObjectAttributes::new()).unwrap();
    lock.delete();
    lock.acquire();
}
