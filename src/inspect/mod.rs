//! Dataset sanity checks before training.
//!
//! Looks at a COCO annotation file the way the loader will see it: counts,
//! per-category box totals, images with nothing to learn from, and boxes
//! that fall outside their image.

mod report;

pub use report::{CategoryCount, InspectReport, InspectSummary};

use std::collections::BTreeMap;

use crate::dataset::CocoDetectionDataset;
use crate::ir::CategoryId;

/// Boxes may overhang the image edge by this many pixels before they count
/// as out of bounds.
const OOB_TOLERANCE_PX: f64 = 0.5;

#[derive(Clone, Copy, Debug, Default)]
pub struct InspectOptions {
    /// Also check that every image file exists under the image directory.
    pub check_files: bool,
}

pub fn inspect_dataset(dataset: &CocoDetectionDataset, opts: &InspectOptions) -> InspectReport {
    let mut per_category: BTreeMap<CategoryId, usize> = dataset
        .categories()
        .keys()
        .map(|&id| (id, 0))
        .collect();

    let mut summary = InspectSummary {
        images: dataset.len(),
        categories: dataset.categories().len(),
        ..Default::default()
    };
    let mut unannotated_images = Vec::new();
    let mut missing_files = Vec::new();

    for index in 0..dataset.len() {
        let Ok(image) = dataset.image(index) else {
            continue;
        };
        let annotations = dataset.annotations_for(image.id);

        if annotations.is_empty() {
            unannotated_images.push(image.file_name.clone());
        }
        if opts.check_files && !dataset.image_dir().join(&image.file_name).is_file() {
            missing_files.push(image.file_name.clone());
        }

        for ann in annotations {
            summary.annotations += 1;
            *per_category.entry(ann.category_id).or_default() += 1;

            if ann.iscrowd {
                summary.crowd_annotations += 1;
            }
            let (w, h) = (f64::from(image.width), f64::from(image.height));
            let b = &ann.bbox;
            if b.xmin() < -OOB_TOLERANCE_PX
                || b.ymin() < -OOB_TOLERANCE_PX
                || b.xmax() > w + OOB_TOLERANCE_PX
                || b.ymax() > h + OOB_TOLERANCE_PX
            {
                summary.out_of_bounds_boxes += 1;
            }
            if !b.is_ordered() || b.area() <= 0.0 {
                summary.degenerate_boxes += 1;
            }
        }
    }

    let per_category = per_category
        .into_iter()
        .map(|(id, annotations)| CategoryCount {
            id: id.as_u64(),
            name: dataset
                .category_name(id)
                .map(str::to_string)
                .unwrap_or_else(|| format!("<unknown {id}>")),
            annotations,
        })
        .collect();

    InspectReport {
        summary,
        per_category,
        unannotated_images,
        missing_files: opts.check_files.then_some(missing_files),
    }
}
