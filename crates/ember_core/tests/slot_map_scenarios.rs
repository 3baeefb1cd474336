//! Integration tests for slot map handles shared across threads.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use ember_core::{shared, SlotMap, SlotMapHandle, SmartHandle};

#[test]
fn test_insert_erase_pack_scenario() {
    let mut map = SlotMap::new();
    let h1 = map.insert(5);
    let h2 = map.insert(10);
    let h3 = map.insert(15);

    assert_eq!(map.erase(h2), Some(10));
    let h4 = map.insert(20);

    let issued: HashSet<SlotMapHandle> = [h1, h2, h3, h4].into_iter().collect();
    assert_eq!(issued.len(), 4);
    assert_eq!(map.slot_of(h4), Some(1));

    let mut values: Vec<i32> = map.values().copied().collect();
    values.sort_unstable();
    assert_eq!(values, vec![5, 15, 20]);

    map.pack();
    assert_eq!(map.get(h1), Some(&5));
    assert_eq!(map.get(h3), Some(&15));
    assert_eq!(map.get(h4), Some(&20));
    assert_eq!(map.get(h2), None);
}

#[test]
fn test_pack_after_churn() {
    let mut map = SlotMap::new();
    let mut live = Vec::new();

    for i in 0..200u32 {
        let h = map.insert(i);
        if i % 4 == 1 {
            map.erase(h);
        } else {
            live.push((h, i));
        }
        if i % 7 == 0 {
            if let Some((h, _)) = live.pop() {
                map.erase(h);
            }
        }
    }

    map.pack();
    assert_eq!(map.slot_count(), live.len());
    for (h, v) in live {
        assert_eq!(map.get(h), Some(&v));
    }
}

#[test]
fn test_cross_thread_drops_fire_once() {
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    let handle = SmartHandle::new(SlotMapHandle::from_raw(1), move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let workers: Vec<_> = (0..threads)
        .map(|_| {
            let copy = handle.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let weak = copy.downgrade();
                let extra: Vec<_> = (0..100).map(|_| copy.clone()).collect();
                barrier.wait();
                drop(extra);
                drop(copy);
                drop(weak);
            })
        })
        .collect();

    drop(handle);
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn test_background_holder_keeps_resource_alive() {
    let map = shared(SlotMap::new());
    let main = SmartHandle::insert_into(&map, String::from("mesh"));
    let raw = main.handle();
    let background = main.clone();

    drop(main);
    assert!(map.lock().has(raw));

    let worker = thread::spawn(move || {
        assert_eq!(background.ref_counts().strong, 1);
        drop(background);
    });
    worker.join().unwrap();

    assert!(!map.lock().has(raw));
}

#[test]
fn test_racing_upgrades_never_resurrect() {
    let map = shared(SlotMap::new());
    let handle = SmartHandle::insert_into(&map, 7u64);
    let weak = handle.downgrade();

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let weak = weak.clone();
            let map = Arc::clone(&map);
            thread::spawn(move || {
                for _ in 0..1000 {
                    if let Ok(strong) = weak.upgrade() {
                        assert!(map.lock().has(strong.handle()));
                    }
                }
            })
        })
        .collect();

    drop(handle);
    for worker in workers {
        worker.join().unwrap();
    }

    assert!(!weak.valid());
    assert!(weak.upgrade().is_err());
    assert!(map.lock().is_empty());
}
