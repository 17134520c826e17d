use std::fs;

use cocodet::convert::{convert_yolo_to_coco, ConvertOptions};
use cocodet::dataset::{collate, CocoDetectionDataset};
use cocodet::ir::io_coco_json::{from_coco_str, to_coco_string};
use cocodet::ir::{BBoxXYXY, Pixel};
use proptest::prelude::*;

mod common;
mod proptest_helpers;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn xywh_to_xyxy_and_back_recovers_values((x, y, w, h) in proptest_helpers::arb_xywh()) {
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_xywh(x, y, w, h);
        let (x2, y2, w2, h2) = bbox.to_xywh();

        prop_assert!((x - x2).abs() < proptest_helpers::EPS_XYWH);
        prop_assert!((y - y2).abs() < proptest_helpers::EPS_XYWH);
        prop_assert!((w - w2).abs() < proptest_helpers::EPS_XYWH);
        prop_assert!((h - h2).abs() < proptest_helpers::EPS_XYWH);
    }

    #[test]
    fn targets_hold_every_annotation_of_their_image(dataset in proptest_helpers::arb_dataset(6, 24)) {
        let restored = from_coco_str(&to_coco_string(&dataset).expect("serialize")).expect("parse");
        let loaded = CocoDetectionDataset::from_dataset(restored, "unused");

        prop_assert_eq!(loaded.len(), dataset.images.len());
        for index in 0..loaded.len() {
            let target = loaded.target(index).expect("target");
            let expected = dataset
                .annotations
                .iter()
                .filter(|ann| ann.image_id == target.image_id)
                .count();
            prop_assert_eq!(target.boxes.len(), target.labels.len());
            prop_assert_eq!(target.len(), expected);
        }
    }

    #[test]
    fn collate_preserves_order(pairs in proptest::collection::vec((any::<u32>(), any::<i64>()), 0..16)) {
        let (images, targets) = collate(pairs.clone());
        prop_assert_eq!(images, pairs.iter().map(|p| p.0).collect::<Vec<_>>());
        prop_assert_eq!(targets, pairs.iter().map(|p| p.1).collect::<Vec<_>>());
    }

    #[test]
    fn converter_emits_one_annotation_per_good_line(
        files in proptest::collection::vec(proptest_helpers::arb_label_file(), 1..5)
    ) {
        let temp = tempfile::tempdir().expect("create temp dir");
        let labels = temp.path().join("labels");
        let images = temp.path().join("images");
        fs::create_dir_all(&labels).expect("create labels dir");

        for (i, lines) in files.iter().enumerate() {
            let text: Vec<&str> = lines.iter().map(|l| l.text()).collect();
            common::write_label(&labels.join(format!("f{i:02}.txt")), &text.join("\n"));
            common::write_png(&images.join(format!("f{i:02}.png")), 16, 8);
        }

        let (dataset, report) = convert_yolo_to_coco(&labels, &images, &ConvertOptions::default())
            .expect("convert");

        let good: usize = files.iter().flatten().filter(|l| l.is_good()).count();
        let malformed: usize = files
            .iter()
            .flatten()
            .filter(|l| matches!(l, proptest_helpers::LineKind::Malformed(_)))
            .count();

        prop_assert_eq!(dataset.images.len(), files.len());
        prop_assert_eq!(dataset.annotations.len(), good);
        prop_assert_eq!(report.skipped_lines(), malformed);

        let ids: Vec<u64> = dataset.annotations.iter().map(|a| a.id.as_u64()).collect();
        prop_assert_eq!(ids, (1..=good as u64).collect::<Vec<_>>());
        prop_assert!(dataset.annotations.iter().all(|a| a.category_id.as_u64() == 1));
    }
}
