//! Feeds arbitrary bytes to the COCO annotation document parser.
//!
//! Run with:
//!   cargo +nightly fuzz run coco_json_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use trackprep::ir::io_coco_json::from_coco_slice;

fuzz_target!(|data: &[u8]| {
    // Annotation documents for a single split rarely exceed a few MB.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(document) = from_coco_slice(data) {
        // Anything that parses must plan or fail cleanly.
        let _ = trackprep::convert::plan_labels(&document, std::path::Path::new("<fuzz>"));
    }
});
