//! Tier 2: Restart recovery

use crate::test_utils::*;
use tsid::{FieldType, NAME_IDS_DIR};

#[test]
fn test_flushed_state_survives_restart() {
    let mut t = TestCatalog::new();
    {
        let ids = t.catalog().sequencer();
        let cpu = ids.gen_metric_id("cpu").unwrap();
        ids.gen_tag_id(cpu, "host").unwrap();
        ids.gen_field_id(cpu, "usage", FieldType::Gauge).unwrap();
        t.catalog().flush().unwrap();
    }

    let ids = t.reopen().sequencer();
    assert_eq!(ids.get_metric_id("cpu").unwrap(), 1);
    assert_eq!(ids.get_tag_id(1, "host").unwrap(), 1);
    assert_eq!(ids.get_field_id(1, "usage").unwrap(), (1, FieldType::Gauge));

    let stats = ids.stats();
    assert_eq!(stats.committed_metrics, 1);
    assert_eq!(stats.metric_sequence, 1);
    assert_eq!(stats.tag_key_sequence, 1);
}

#[test]
fn test_unflushed_state_is_dropped_on_restart() {
    let mut t = TestCatalog::new();
    {
        let ids = t.catalog().sequencer();
        ids.gen_metric_id("cpu").unwrap();
        t.catalog().flush().unwrap();
        ids.gen_metric_id("never_flushed").unwrap();
    }

    let ids = t.reopen().sequencer();
    assert!(ids
        .get_metric_id("never_flushed")
        .unwrap_err()
        .is_not_found());
    assert_eq!(ids.gen_metric_id("next").unwrap(), 2);
}

#[test]
fn test_sequences_persist_without_names() {
    let mut t = TestCatalog::new();
    {
        let ids = t.catalog().sequencer();
        for i in 0..5 {
            ids.gen_tag_id(1, &format!("k{}", i)).unwrap();
        }
        t.catalog().flush().unwrap();
    }

    let ids = t.reopen().sequencer();
    assert_eq!(ids.stats().tag_key_sequence, 5);
    assert_eq!(ids.gen_tag_id(2, "k0").unwrap(), 6);
}

#[test]
fn test_repeated_restarts_accumulate_segments() {
    let mut t = TestCatalog::new();
    for round in 0..4 {
        let catalog = t.reopen();
        let id = catalog.sequencer().gen_metric_id(&format!("m{}", round)).unwrap();
        assert_eq!(id, round + 1);
        catalog.flush().unwrap();
    }
    t.close();

    assert_eq!(table_files(&t.path().join(NAME_IDS_DIR)).len(), 4);
    let ids = t.reopen().sequencer();
    assert_eq!(ids.suggest_metrics("m", 10), vec!["m0", "m1", "m2", "m3"]);
}

#[test]
fn test_leftover_tmp_file_is_ignored() {
    let mut t = TestCatalog::new();
    t.catalog().sequencer().gen_metric_id("cpu").unwrap();
    t.catalog().flush().unwrap();
    t.close();

    let tmp = t.path().join(NAME_IDS_DIR).join("000002.tmp");
    std::fs::write(&tmp, b"interrupted").unwrap();

    let ids = t.reopen().sequencer();
    assert_eq!(ids.get_metric_id("cpu").unwrap(), 1);
    assert!(!tmp.exists());
}

#[test]
fn test_meta_flush_alone_keeps_tag_key_ids_unique() {
    let mut t = TestCatalog::new();
    {
        let ids = t.catalog().sequencer();
        let cpu = ids.gen_metric_id("cpu").unwrap();
        ids.gen_tag_id(cpu, "host").unwrap();
        ids.gen_tag_id(cpu, "region").unwrap();
        ids.flush_metrics_meta().unwrap();
    }
    t.close();

    let ids = t.reopen().sequencer();
    assert_eq!(ids.get_tag_id(1, "host").unwrap(), 1);
    assert_eq!(ids.get_tag_id(1, "region").unwrap(), 2);

    let mem = ids.gen_metric_id("mem").unwrap();
    assert_ne!(mem, 1);
    assert_eq!(ids.gen_tag_id(mem, "zone").unwrap(), 3);
}
