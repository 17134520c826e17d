//! Fuzz target for COCO JSON parsing and loader indexing.
//!
//! Run with:
//!   cargo +nightly fuzz run coco_json_parse

#![no_main]

use cocodet::dataset::CocoDetectionDataset;
use cocodet::ir::io_coco_json::from_coco_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(dataset) = from_coco_slice(data) else {
        return;
    };

    // Indexing and target building must not panic on any parsed document.
    let indexed = CocoDetectionDataset::from_dataset(dataset, "");
    for index in 0..indexed.len() {
        let _ = indexed.target(index);
    }
});
