//! Tier 1: Allocation semantics

use crate::test_utils::*;
use tsid::{CatalogConfig, Error, FieldType};

// ============================================================================
// Metric IDs
// ============================================================================

#[test]
fn test_metric_ids_start_above_sequence() {
    let t = TestCatalog::new();
    let ids = t.catalog().sequencer();

    assert_eq!(ids.gen_metric_id("docker").unwrap(), 1);
    assert_eq!(ids.gen_metric_id("docker").unwrap(), 1);
    assert_eq!(ids.gen_metric_id("cpu").unwrap(), 2);
    assert_eq!(ids.gen_metric_id("cpu").unwrap(), 2);
    assert_eq!(ids.gen_metric_id("cpu1").unwrap(), 3);
}

#[test]
fn test_get_metric_id_sees_young_and_committed() {
    let t = TestCatalog::new();
    let ids = t.catalog().sequencer();

    let cpu = ids.gen_metric_id("cpu").unwrap();
    assert_eq!(ids.get_metric_id("cpu").unwrap(), cpu);

    t.catalog().flush().unwrap();
    assert_eq!(ids.get_metric_id("cpu").unwrap(), cpu);
    assert!(ids.get_metric_id("disk").unwrap_err().is_not_found());
}

// ============================================================================
// Tag keys
// ============================================================================

#[test]
fn test_tag_key_ids_are_catalog_wide() {
    let t = TestCatalog::new();
    let ids = t.catalog().sequencer();

    let cpu = ids.gen_metric_id("cpu").unwrap();
    let mem = ids.gen_metric_id("mem").unwrap();
    let a = ids.gen_tag_id(cpu, "host").unwrap();
    let b = ids.gen_tag_id(mem, "host").unwrap();
    assert_ne!(a, b);
    assert_eq!(ids.gen_tag_id(cpu, "host").unwrap(), a);
}

// ============================================================================
// Fields
// ============================================================================

#[test]
fn test_field_ids_dense_per_metric() {
    let t = TestCatalog::new();
    let ids = t.catalog().sequencer();

    assert_eq!(ids.gen_field_id(1, "a", FieldType::Sum).unwrap(), 1);
    assert_eq!(ids.gen_field_id(1, "b", FieldType::Min).unwrap(), 2);
    assert_eq!(ids.gen_field_id(2, "a", FieldType::Sum).unwrap(), 1);

    t.catalog().flush().unwrap();
    assert_eq!(ids.gen_field_id(1, "c", FieldType::Max).unwrap(), 3);
    assert_eq!(ids.get_field_id(1, "b").unwrap(), (2, FieldType::Min));
}

#[test]
fn test_field_type_is_immutable() {
    let t = TestCatalog::new();
    let ids = t.catalog().sequencer();

    ids.gen_field_id(1, "latency", FieldType::Histogram).unwrap();
    t.catalog().flush().unwrap();

    let err = ids
        .gen_field_id(1, "latency", FieldType::Summary)
        .unwrap_err();
    match err {
        Error::FieldTypeConflict {
            field,
            existing,
            requested,
        } => {
            assert_eq!(field, "latency");
            assert_eq!(existing, FieldType::Histogram);
            assert_eq!(requested, FieldType::Summary);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_field_cap_from_config_file() {
    let t = TestCatalog::with_config(CatalogConfig::default().with_max_fields_per_metric(3));
    let ids = t.catalog().sequencer();

    for name in ["a", "b", "c"] {
        ids.gen_field_id(7, name, FieldType::Gauge).unwrap();
    }
    t.catalog().flush().unwrap();

    assert!(matches!(
        ids.gen_field_id(7, "d", FieldType::Gauge),
        Err(Error::TooManyFields {
            metric_id: 7,
            limit: 3
        })
    ));
    assert_eq!(ids.stats().young_fields, 0);
}

// ============================================================================
// Suggestions
// ============================================================================

#[test]
fn test_suggestions_after_flush() {
    let t = TestCatalog::new();
    let ids = t.catalog().sequencer();

    for name in ["cpu.idle", "cpu.user", "cpu.system", "disk.read"] {
        let id = ids.gen_metric_id(name).unwrap();
        ids.gen_tag_id(id, "host").unwrap();
        ids.gen_tag_id(id, "region").unwrap();
    }
    assert!(ids.suggest_metrics("cpu", 10).is_empty());

    t.catalog().flush().unwrap();
    assert_eq!(
        ids.suggest_metrics("cpu", 10),
        vec!["cpu.idle", "cpu.system", "cpu.user"]
    );
    assert_eq!(ids.suggest_metrics("cpu", 1), vec!["cpu.idle"]);
    assert_eq!(
        ids.suggest_tag_keys("disk.read", "", 10),
        vec!["host", "region"]
    );
    assert_eq!(ids.suggest_tag_keys("disk.read", "r", 10), vec!["region"]);
}
