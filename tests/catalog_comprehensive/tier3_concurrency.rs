//! Tier 3: Concurrent allocation and flush

use std::collections::HashMap;
use std::sync::{Arc, Barrier};
use std::thread;

use parking_lot::Mutex;

use crate::test_utils::*;
use tsid::{FieldType, MetricId};

const THREADS: usize = 8;

#[test]
fn test_concurrent_allocation_with_flushes() {
    let t = Arc::new(TestCatalog::new());
    let barrier = Arc::new(Barrier::new(THREADS + 1));
    let seen: Arc<Mutex<HashMap<String, MetricId>>> = Arc::new(Mutex::new(HashMap::new()));

    let mut handles = Vec::new();
    for thread_id in 0..THREADS {
        let t = Arc::clone(&t);
        let barrier = Arc::clone(&barrier);
        let seen = Arc::clone(&seen);
        handles.push(thread::spawn(move || {
            barrier.wait();
            let ids = t.catalog().sequencer();
            for i in 0..200 {
                // Half the names are shared between threads
                let name = if i % 2 == 0 {
                    format!("shared{}", i)
                } else {
                    format!("t{}_{}", thread_id, i)
                };
                let id = ids.gen_metric_id(&name).unwrap();
                ids.gen_tag_id(id, "host").unwrap();
                ids.gen_field_id(id, "value", FieldType::Sum).unwrap();

                let mut seen = seen.lock();
                let prev = *seen.entry(name).or_insert(id);
                assert_eq!(prev, id);
            }
        }));
    }

    let flusher = {
        let t = Arc::clone(&t);
        thread::spawn(move || {
            for _ in 0..20 {
                t.catalog().flush().unwrap();
                thread::yield_now();
            }
        })
    };

    barrier.wait();
    for handle in handles {
        handle.join().unwrap();
    }
    flusher.join().unwrap();
    t.catalog().flush().unwrap();

    let seen = seen.lock();
    let ids = t.catalog().sequencer();
    let stats = ids.stats();
    assert_eq!(stats.metric_sequence as usize, seen.len());
    assert_eq!(stats.committed_metrics, seen.len());
    assert_eq!(stats.young_metrics, 0);
    assert_eq!(stats.young_tag_keys, 0);
    assert_eq!(stats.young_fields, 0);

    // Every metric got exactly one tag key and one field
    assert_eq!(stats.tag_key_sequence as usize, seen.len());
    for (name, id) in seen.iter() {
        assert_eq!(ids.get_metric_id(name).unwrap(), *id);
        assert_eq!(ids.get_field_id(*id, "value").unwrap(), (1, FieldType::Sum));
    }
}

#[test]
fn test_ids_unique_across_threads() {
    let t = Arc::new(TestCatalog::new());
    let handles: Vec<_> = (0..THREADS)
        .map(|thread_id| {
            let t = Arc::clone(&t);
            thread::spawn(move || {
                let ids = t.catalog().sequencer();
                (0..100)
                    .map(|i| ids.gen_tag_id(1, &format!("t{}_{}", thread_id, i)).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut all: Vec<_> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all.sort_unstable();
    let expected: Vec<_> = (1..=(THREADS * 100) as u32).collect();
    assert_eq!(all, expected);
}
