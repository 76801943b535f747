use std::collections::HashSet;
use std::thread;

use orb_runtime::{Collection, Object, ObjectAttributes, ObjectKind, Runtime};

fn objects(rt: &Runtime, n: usize) -> Vec<Object> {
    (0..n)
        .map(|_| rt.create_object(&ObjectAttributes::new(), 0, None).unwrap())
        .collect()
}

#[test]
fn order_is_preserved_across_add_and_remove() {
    let rt = Runtime::new();
    let coll = rt.create_collection(&ObjectAttributes::new()).unwrap();
    assert_eq!(coll.kind(), ObjectKind::Collection);
    let [a, b, c]: [Object; 3] = objects(&rt, 3).try_into().unwrap();

    coll.add(&a).unwrap();
    coll.add(&b).unwrap();
    coll.add(&c).unwrap();
    assert_eq!(coll.count(), 3);
    assert_eq!(coll.get(1), Some(b.clone()));

    coll.remove_at(0);
    assert_eq!(coll.count(), 2);
    assert_eq!(coll.first(), Some(b.clone()));
    assert_eq!(coll.last(), Some(c.clone()));
}

#[test]
fn missing_entries_are_not_found() {
    let rt = Runtime::new();
    let coll = rt.create_collection(&ObjectAttributes::new()).unwrap();
    assert!(coll.is_empty());
    assert_eq!(coll.first(), None);
    assert_eq!(coll.last(), None);
    assert_eq!(coll.get(0), None);

    let [a, b]: [Object; 2] = objects(&rt, 2).try_into().unwrap();
    coll.add(&a).unwrap();
    coll.remove(&b);
    coll.remove_at(5);
    assert_eq!(coll.to_vec(), vec![a]);
}

#[test]
fn remove_takes_the_first_identical_entry() {
    let rt = Runtime::new();
    let coll = rt.create_collection(&ObjectAttributes::new()).unwrap();
    let [a, b]: [Object; 2] = objects(&rt, 2).try_into().unwrap();
    for item in [&a, &b, &a] {
        coll.add(item).unwrap();
    }
    coll.remove(&a);
    assert_eq!(coll.to_vec(), vec![b.clone(), a.clone()]);
    coll.remove(&a);
    assert_eq!(coll.to_vec(), vec![b]);
}

#[test]
fn entries_are_associations_only() {
    let rt = Runtime::new();
    let coll = rt.create_collection(&ObjectAttributes::new()).unwrap();
    let item = rt.create_object(&ObjectAttributes::new(), 0, None).unwrap();
    coll.add(&item).unwrap();
    assert_eq!(item.ref_count(), 1);
    assert_eq!(coll.child_count(), 0);

    coll.delete();
    assert!(coll.is_destroyed());
    assert!(!item.is_destroyed());
    item.delete();
    assert_eq!(rt.stats().live(), 0);
}

#[test]
fn collections_accept_any_handle_kind() {
    let rt = Runtime::new();
    let coll = rt.create_collection(&ObjectAttributes::new()).unwrap();
    let lock = rt.create_wait_lock(&ObjectAttributes::new()).unwrap();
    let nested = rt.create_collection(&ObjectAttributes::new()).unwrap();
    coll.add(&lock).unwrap();
    coll.add(&nested).unwrap();
    let back = coll.last().and_then(|o| Collection::from_object(&o));
    assert_eq!(back, Some(nested));
}

#[test]
fn concurrent_adds_are_never_lost() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 250;

    let rt = Runtime::new();
    let coll = rt.create_collection(&ObjectAttributes::new()).unwrap();
    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let rt = rt.clone();
            let coll = coll.clone();
            thread::spawn(move || {
                for item in objects(&rt, PER_THREAD) {
                    coll.add(&item).unwrap();
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    assert_eq!(coll.count(), THREADS * PER_THREAD);
    let ids: HashSet<_> = (0..coll.count())
        .map(|i| coll.get(i).unwrap().id())
        .collect();
    assert_eq!(ids.len(), THREADS * PER_THREAD);
}

#[test]
fn concurrent_add_and_remove_keep_count_consistent() {
    let rt = Runtime::new();
    let coll = rt.create_collection(&ObjectAttributes::new()).unwrap();
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let rt = rt.clone();
            let coll = coll.clone();
            thread::spawn(move || {
                let mine = objects(&rt, 100);
                for item in &mine {
                    coll.add(item).unwrap();
                }
                for item in mine.iter().step_by(2) {
                    coll.remove(item);
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }
    assert_eq!(coll.count(), 200);
    assert_eq!(coll.to_vec().len(), 200);
}
