#![allow(dead_code)]

use cocodet::ir::{Annotation, BBoxXYXY, Category, Dataset, Image};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub const EPS_XYWH: f64 = 1e-9;

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

/// A box inside a 4096x4096 canvas, as `(x, y, w, h)`.
pub fn arb_xywh() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    (0.0..4096.0f64, 0.0..4096.0f64, 0.0..2048.0f64, 0.0..2048.0f64)
}

/// One well-formed YOLO line with normalized fields.
pub fn arb_label_line() -> impl Strategy<Value = String> {
    (0u8..5, 0.0..1.0f64, 0.0..1.0f64, 0.0..1.0f64, 0.0..1.0f64)
        .prop_map(|(class, cx, cy, w, h)| format!("{class} {cx} {cy} {w} {h}"))
}

/// A line with the wrong number of fields (1..=4 or 6..=8).
pub fn arb_malformed_line() -> impl Strategy<Value = String> {
    prop_oneof![1usize..=4, 6usize..=8]
        .prop_map(|fields| vec!["0.5"; fields].join(" "))
}

/// Label file contents mixing good lines, malformed lines and blanks.
pub fn arb_label_file() -> impl Strategy<Value = Vec<LineKind>> {
    proptest::collection::vec(
        prop_oneof![
            6 => arb_label_line().prop_map(LineKind::Good),
            1 => arb_malformed_line().prop_map(LineKind::Malformed),
            1 => Just(LineKind::Blank),
        ],
        0..8,
    )
}

#[derive(Clone, Debug)]
pub enum LineKind {
    Good(String),
    Malformed(String),
    Blank,
}

impl LineKind {
    pub fn text(&self) -> &str {
        match self {
            LineKind::Good(s) | LineKind::Malformed(s) => s,
            LineKind::Blank => "",
        }
    }

    pub fn is_good(&self) -> bool {
        matches!(self, LineKind::Good(_))
    }
}

/// A COCO dataset with images `1..=n_images` and annotations pointing at
/// random images (some of them possibly at unknown ids).
pub fn arb_dataset(max_images: u64, max_annotations: usize) -> impl Strategy<Value = Dataset> {
    (1..=max_images).prop_flat_map(move |n_images| {
        proptest::collection::vec((1..=n_images + 1, 1u64..=3, arb_xywh()), 0..=max_annotations)
            .prop_map(move |anns| Dataset {
                images: (1..=n_images)
                    .map(|id| Image::new(id, format!("{id}.png"), 4096, 4096))
                    .collect(),
                annotations: anns
                    .into_iter()
                    .enumerate()
                    .map(|(i, (image_id, cat, (x, y, w, h)))| {
                        Annotation::new(
                            i as u64 + 1,
                            image_id,
                            cat,
                            BBoxXYXY::from_xywh(x, y, w, h),
                        )
                    })
                    .collect(),
                categories: (1..=3u64).map(|id| Category::new(id, format!("c{id}"))).collect(),
            })
    })
}
