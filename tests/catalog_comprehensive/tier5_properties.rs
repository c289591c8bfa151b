//! Tier 5: Property tests

use proptest::prelude::*;
use std::collections::BTreeMap;

use crate::test_utils::*;
use tsid::MetricId;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Whatever was flushed before a restart resolves to the same IDs after it
    #[test]
    fn prop_restart_preserves_flushed_ids(
        batches in proptest::collection::vec(
            proptest::collection::vec("[a-e]{1,3}", 1..10),
            1..5,
        )
    ) {
        let mut t = TestCatalog::new();
        let mut expected: BTreeMap<String, MetricId> = BTreeMap::new();
        for batch in &batches {
            let catalog = t.catalog();
            for name in batch {
                let id = catalog.sequencer().gen_metric_id(name).unwrap();
                prop_assert_eq!(*expected.entry(name.clone()).or_insert(id), id);
            }
            catalog.flush().unwrap();
        }

        let ids = t.reopen().sequencer();
        for (name, id) in &expected {
            prop_assert_eq!(ids.get_metric_id(name).unwrap(), *id);
        }
        prop_assert_eq!(ids.stats().metric_sequence as usize, expected.len());

        let names: Vec<String> = expected.keys().cloned().collect();
        prop_assert_eq!(ids.suggest_metrics("", usize::MAX), names);
    }

    /// Suggestions honour the limit and stay sorted
    #[test]
    fn prop_suggest_limit(
        names in proptest::collection::btree_set("[a-c]{1,4}", 1..30),
        prefix in "[a-c]{0,2}",
        limit in 0usize..40,
    ) {
        let t = TestCatalog::new();
        let ids = t.catalog().sequencer();
        for name in &names {
            ids.gen_metric_id(name).unwrap();
        }
        t.catalog().flush().unwrap();

        let got = ids.suggest_metrics(&prefix, limit);
        let matching = names.iter().filter(|n| n.starts_with(prefix.as_str())).count();
        prop_assert_eq!(got.len(), matching.min(limit));
        prop_assert!(got.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(got.iter().all(|n| n.starts_with(prefix.as_str())));
    }
}
