#![allow(dead_code)]

use std::collections::BTreeSet;

use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use trackprep::ir::{BBoxXYWH, CategoryId, Pixel};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// An image size plus a box with integer corners strictly inside it.
pub fn arb_image_and_bbox() -> BoxedStrategy<((u32, u32), BBoxXYWH<Pixel>)> {
    (2u32..=4096, 2u32..=4096, any::<(u32, u32, u32, u32)>())
        .prop_map(|(width, height, (sx, sy, sw, sh))| {
            ((width, height), bbox_from_seed(width, height, sx, sy, sw, sh))
        })
        .boxed()
}

/// A non-empty set of sparse category ids, in an arbitrary arrival order.
pub fn arb_category_ids(max: usize) -> BoxedStrategy<Vec<CategoryId>> {
    proptest::collection::vec(any::<u64>(), 1..=max)
        .prop_map(|ids| ids.into_iter().map(CategoryId::new).collect())
        .boxed()
}

pub fn distinct_sorted(ids: &[CategoryId]) -> Vec<CategoryId> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

fn bbox_from_seed(width: u32, height: u32, sx: u32, sy: u32, sw: u32, sh: u32) -> BBoxXYWH<Pixel> {
    let x = sx % (width - 1);
    let y = sy % (height - 1);
    let w = 1 + sw % (width - x);
    let h = 1 + sh % (height - y);

    BBoxXYWH::new(x as f64, y as f64, w as f64, h as f64)
}
