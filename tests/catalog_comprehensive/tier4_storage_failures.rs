//! Tier 4: On-disk damage and storage failures

use std::sync::Arc;

use tsid::{Catalog, CatalogConfig, Error, IdSequencer, METRICS_META_DIR, NAME_IDS_DIR};
use tsid_storage::testing::{FaultPoint, FaultyFamily};
use tsid_storage::VersionedFamily;

use crate::test_utils::*;

// ============================================================================
// Damaged table files
// ============================================================================

fn flushed_catalog() -> TestCatalog {
    let mut t = TestCatalog::new();
    let ids = t.catalog().sequencer();
    let cpu = ids.gen_metric_id("cpu").unwrap();
    ids.gen_tag_id(cpu, "host").unwrap();
    t.catalog().flush().unwrap();
    t.close();
    t
}

#[test]
fn test_flipped_byte_in_name_table_fails_open() {
    let t = flushed_catalog();
    let file = &table_files(&t.path().join(NAME_IDS_DIR))[0];
    let mut bytes = std::fs::read(file).unwrap();
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0x01;
    std::fs::write(file, bytes).unwrap();

    assert!(matches!(
        Catalog::open(t.path()),
        Err(Error::Corruption(_))
    ));
}

#[test]
fn test_truncated_meta_table_fails_open() {
    let t = flushed_catalog();
    let file = &table_files(&t.path().join(METRICS_META_DIR))[0];
    let bytes = std::fs::read(file).unwrap();
    std::fs::write(file, &bytes[..bytes.len() - 3]).unwrap();

    let err = Catalog::open(t.path()).err().unwrap();
    assert!(err.is_storage());
}

#[test]
fn test_foreign_file_is_ignored() {
    let mut t = flushed_catalog();
    std::fs::write(t.path().join(NAME_IDS_DIR).join("notes.txt"), b"hello").unwrap();
    let ids = t.reopen().sequencer();
    assert_eq!(ids.get_metric_id("cpu").unwrap(), 1);
}

// ============================================================================
// Injected failures
// ============================================================================

struct FaultyCatalog {
    name_ids: FaultyFamily,
    meta: FaultyFamily,
    ids: IdSequencer,
}

fn faulty_catalog() -> FaultyCatalog {
    init_tracing();
    let name_ids = FaultyFamily::new(VersionedFamily::in_memory(NAME_IDS_DIR));
    let meta = FaultyFamily::new(VersionedFamily::in_memory(METRICS_META_DIR));
    let ids = IdSequencer::open(
        CatalogConfig::default(),
        Arc::new(name_ids.clone()),
        Arc::new(meta.clone()),
    )
    .unwrap();
    FaultyCatalog {
        name_ids,
        meta,
        ids,
    }
}

#[test]
fn test_lookup_failures_surface_as_storage_errors() {
    let c = faulty_catalog();
    c.meta.inject(FaultPoint::FindReaders);

    assert!(c.ids.get_tag_id(1, "host").unwrap_err().is_storage());
    assert!(c.ids.gen_tag_id(1, "host").unwrap_err().is_storage());
    assert!(c.ids.get_field_id(1, "f").unwrap_err().is_storage());
    assert!(c
        .ids
        .gen_field_id(1, "f", tsid::FieldType::Sum)
        .unwrap_err()
        .is_storage());

    // Nothing was allocated and no snapshot leaked
    assert_eq!(c.ids.stats().tag_key_sequence, 0);
    assert_eq!(c.ids.stats().young_fields, 0);
    assert_eq!(c.meta.active_snapshots(), 0);
}

#[test]
fn test_failed_flushes_are_retryable() {
    let c = faulty_catalog();
    let cpu = c.ids.gen_metric_id("cpu").unwrap();
    c.ids.gen_tag_id(cpu, "host").unwrap();

    c.meta.inject(FaultPoint::Commit);
    c.name_ids.inject(FaultPoint::Commit);
    assert!(c.ids.flush_metrics_meta().is_err());
    assert!(c.ids.flush_name_ids().is_err());

    let stats = c.ids.stats();
    assert_eq!(stats.young_metrics, 1);
    assert_eq!(stats.young_tag_keys, 1);

    c.meta.heal_all();
    c.name_ids.heal_all();
    c.ids.flush_metrics_meta().unwrap();
    c.ids.flush_name_ids().unwrap();

    let stats = c.ids.stats();
    assert_eq!(stats.young_metrics, 0);
    assert_eq!(stats.young_tag_keys, 0);
    assert_eq!(c.ids.get_tag_id(cpu, "host").unwrap(), 1);
}

#[test]
fn test_suggest_tag_keys_degrades_to_empty() {
    let c = faulty_catalog();
    let cpu = c.ids.gen_metric_id("cpu").unwrap();
    c.ids.gen_tag_id(cpu, "host").unwrap();
    c.ids.flush_metrics_meta().unwrap();
    assert_eq!(c.ids.suggest_tag_keys("cpu", "", 10), vec!["host"]);

    c.meta.inject(FaultPoint::FindReaders);
    assert!(c.ids.suggest_tag_keys("cpu", "", 10).is_empty());
    assert_eq!(c.meta.active_snapshots(), 0);
}
