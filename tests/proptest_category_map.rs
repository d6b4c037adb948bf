mod proptest_helpers;

use proptest::prelude::*;
use proptest_helpers::{arb_category_ids, distinct_sorted, proptest_config};
use trackprep::ir::CategoryMap;

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn dense_ids_cover_zero_to_n(ids in arb_category_ids(24)) {
        let map = CategoryMap::build(ids.clone()).expect("non-empty input");
        let distinct = distinct_sorted(&ids);

        prop_assert_eq!(map.len(), distinct.len());
        let mut dense: Vec<usize> = ids.iter().map(|id| map.get(id).expect("in domain")).collect();
        dense.sort_unstable();
        dense.dedup();
        prop_assert_eq!(dense, (0..distinct.len()).collect::<Vec<_>>());
    }

    #[test]
    fn mapping_preserves_source_order(ids in arb_category_ids(24)) {
        let map = CategoryMap::build(ids.clone()).expect("non-empty input");

        for pair in distinct_sorted(&ids).windows(2) {
            prop_assert!(map.get(&pair[0]) < map.get(&pair[1]));
        }
    }

    #[test]
    fn source_id_inverts_get(ids in arb_category_ids(24)) {
        let map = CategoryMap::build(ids.clone()).expect("non-empty input");

        for id in &ids {
            let dense = map.get(id).expect("in domain");
            prop_assert_eq!(map.source_id(dense), Some(id));
        }
    }

    #[test]
    fn arrival_order_is_irrelevant(ids in arb_category_ids(24)) {
        let forward = CategoryMap::build(ids.clone()).expect("non-empty input");
        let reversed = CategoryMap::build(ids.into_iter().rev()).expect("non-empty input");

        prop_assert_eq!(forward, reversed);
    }
}
