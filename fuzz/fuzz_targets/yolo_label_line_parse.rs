//! Fuzz target for single-line YOLO label parsing.
//!
//! Run with:
//!   cargo +nightly fuzz run yolo_label_line_parse

#![no_main]

use std::path::Path;

use cocodet::convert::{parse_label_line, LabelLine};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(LabelLine::Row(row)) = parse_label_line(line, Path::new("fuzz.txt"), 1) {
        let _ = row.class_index();
    }
});
