//! YOLO label files to a single COCO JSON document.
//!
//! Image ids come from each label file's 1-based position in the sorted
//! listing of the labels directory. A skipped label file keeps its
//! position, so ids can have gaps but never depend on which images exist.
//! Annotation ids are global, 1-based and contiguous over accepted lines.
//!
//! By default every box is mapped to one fixed category and the YOLO class
//! id is discarded; see [`ClassIdPolicy`].

pub mod labels;
pub mod report;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

pub use labels::{parse_label_line, read_class_names, LabelLine, YoloLabelRow, MAX_CLASS_ID};
pub use report::{
    ConversionCounts, ConversionIssue, ConversionIssueCode, ConversionReport, ConversionSeverity,
};

use crate::error::CocodetError;
use crate::ir::io_coco_json::write_coco_json;
use crate::ir::{
    Annotation, AnnotationId, BBoxXYXY, Category, CategoryId, Dataset, Image, ImageId, Normalized,
};

/// What to do when input has to be dropped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SkipPolicy {
    /// Drop the label file or line, record it in the report, keep going.
    #[default]
    Skip,
    /// Stop at the first label file or line that would be dropped.
    Fail,
}

/// How YOLO class ids map to COCO categories.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClassIdPolicy {
    /// Every box goes to category 1; the class id field is read and discarded.
    #[default]
    Collapse,
    /// Class id `k` becomes category `k + 1`.
    Keep,
}

#[derive(Clone, Debug)]
pub struct ConvertOptions {
    /// Extension of the companion image, without the dot.
    pub image_extension: String,
    /// Name of the single category used by [`ClassIdPolicy::Collapse`].
    pub category_name: String,
    pub class_ids: ClassIdPolicy,
    /// `classes.txt` or `data.yaml` naming the classes for [`ClassIdPolicy::Keep`].
    pub class_names: Option<PathBuf>,
    pub skip_policy: SkipPolicy,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            image_extension: "png".to_string(),
            category_name: "object".to_string(),
            class_ids: ClassIdPolicy::Collapse,
            class_names: None,
            skip_policy: SkipPolicy::Skip,
        }
    }
}

/// Converts a directory of YOLO label files into a COCO dataset.
///
/// `images_dir` must contain `<label stem>.<image_extension>` for each label
/// file; only the image header is read, for its width and height.
pub fn convert_yolo_to_coco(
    labels_dir: &Path,
    images_dir: &Path,
    options: &ConvertOptions,
) -> Result<(Dataset, ConversionReport), CocodetError> {
    let label_files = labels::collect_label_files(labels_dir)?;
    let class_names = options
        .class_names
        .as_deref()
        .map(read_class_names)
        .transpose()?;

    let mut report = ConversionReport::new();
    report.label_files = label_files.len();

    let mut images = Vec::new();
    let mut annotations = Vec::new();
    let mut seen_classes = BTreeSet::new();
    let mut next_annotation_id: u64 = 1;

    for (index, label_path) in label_files.iter().enumerate() {
        let image_id = ImageId::new(index as u64 + 1);
        let stem = label_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let image_file_name = format!("{}.{}", stem, options.image_extension);
        let image_path = images_dir.join(&image_file_name);

        if !image_path.is_file() {
            match options.skip_policy {
                SkipPolicy::Fail => {
                    return Err(CocodetError::MissingCompanionImage {
                        label_path: label_path.clone(),
                        image_path,
                    })
                }
                SkipPolicy::Skip => {
                    warn!(
                        "skipping {}: image {} not found",
                        label_path.display(),
                        image_path.display()
                    );
                    report.add(ConversionIssue::warning(
                        ConversionIssueCode::MissingCompanionImage,
                        format!(
                            "{}: image '{}' not found",
                            label_path.display(),
                            image_file_name
                        ),
                    ));
                    continue;
                }
            }
        }

        let (width, height) = read_image_dimensions(&image_path)?;
        debug!("image {} {} ({}x{})", image_id, image_file_name, width, height);
        images.push(Image::new(image_id, image_file_name, width, height));

        let content = fs::read_to_string(label_path).map_err(CocodetError::Io)?;
        for (line_idx, line) in content.lines().enumerate() {
            let line_num = line_idx + 1;
            let row = match parse_label_line(line, label_path, line_num)? {
                LabelLine::Empty => continue,
                LabelLine::Row(row) => row,
                LabelLine::WrongFieldCount(fields) => match options.skip_policy {
                    SkipPolicy::Fail => {
                        return Err(CocodetError::MalformedLabelLine {
                            path: label_path.clone(),
                            line: line_num,
                            fields,
                        })
                    }
                    SkipPolicy::Skip => {
                        warn!(
                            "skipping {}:{}: expected 5 fields, found {}",
                            label_path.display(),
                            line_num,
                            fields
                        );
                        report.add(ConversionIssue::warning(
                            ConversionIssueCode::MalformedLabelLine,
                            format!(
                                "{}:{}: expected 5 fields, found {}",
                                label_path.display(),
                                line_num,
                                fields
                            ),
                        ));
                        continue;
                    }
                },
            };

            let category_id = match options.class_ids {
                ClassIdPolicy::Collapse => {
                    seen_classes.insert(row.class_id.to_bits());
                    CategoryId::new(1)
                }
                ClassIdPolicy::Keep => {
                    let class_index =
                        checked_class_index(&row, class_names.as_deref(), label_path, line_num)?;
                    let class_index = class_index as u64;
                    let category = class_index.checked_add(1).ok_or_else(|| {
                        CocodetError::LabelParse {
                            path: label_path.clone(),
                            line: line_num,
                            message: format!("class_id {class_index} has no category id"),
                        }
                    })?;
                    seen_classes.insert(class_index);
                    CategoryId::new(category)
                }
            };

            annotations.push(yolo_row_to_annotation(
                &row,
                AnnotationId::new(next_annotation_id),
                image_id,
                category_id,
                width,
                height,
            ));
            next_annotation_id += 1;
        }
    }

    let categories = match options.class_ids {
        ClassIdPolicy::Collapse => {
            if !seen_classes.is_empty() {
                report.add(ConversionIssue::info(
                    ConversionIssueCode::ClassIdsCollapsed,
                    format!(
                        "{} distinct YOLO class id(s) mapped to category 1 '{}'",
                        seen_classes.len(),
                        options.category_name
                    ),
                ));
            }
            vec![Category::new(1u64, options.category_name.clone())]
        }
        ClassIdPolicy::Keep => {
            let names = class_names.unwrap_or_else(|| {
                let count = seen_classes.iter().next_back().map_or(0, |max| max + 1);
                (0..count).map(|k| format!("class_{k}")).collect()
            });
            names
                .into_iter()
                .enumerate()
                .map(|(k, name)| Category::new(k as u64 + 1, name))
                .collect()
        }
    };

    let last_id = images.last().map(|img| img.id.as_u64());
    if last_id.is_some_and(|id| id != images.len() as u64) {
        report.add(ConversionIssue::info(
            ConversionIssueCode::ImageIdGaps,
            "image ids follow label file order; skipped files leave gaps",
        ));
    }

    report.output = ConversionCounts {
        images: images.len(),
        categories: categories.len(),
        annotations: annotations.len(),
    };

    Ok((
        Dataset {
            images,
            annotations,
            categories,
        },
        report,
    ))
}

/// Converts and writes the COCO document to `output_path`.
pub fn run_conversion(
    labels_dir: &Path,
    images_dir: &Path,
    output_path: &Path,
    options: &ConvertOptions,
) -> Result<ConversionReport, CocodetError> {
    let (dataset, report) = convert_yolo_to_coco(labels_dir, images_dir, options)?;
    write_coco_json(output_path, &dataset)?;

    info!(
        "wrote {} images and {} annotations to {}",
        report.output.images,
        report.output.annotations,
        output_path.display()
    );
    Ok(report)
}

/// Maps one normalized YOLO row to a pixel-space COCO annotation.
///
/// `x = (cx - w/2) * W`, `y = (cy - h/2) * H`, width `w * W`, height `h * H`.
pub fn yolo_row_to_annotation(
    row: &YoloLabelRow,
    id: AnnotationId,
    image_id: ImageId,
    category_id: CategoryId,
    image_width: u32,
    image_height: u32,
) -> Annotation {
    let (img_w, img_h) = (image_width as f64, image_height as f64);
    let pixel =
        BBoxXYXY::<Normalized>::from_cxcywh(row.cx, row.cy, row.w, row.h).to_pixel(img_w, img_h);
    let (x, y) = (pixel.xmin(), pixel.ymin());
    let (abs_w, abs_h) = (row.w * img_w, row.h * img_h);

    Annotation::new(id, image_id, category_id, BBoxXYXY::from_xywh(x, y, abs_w, abs_h))
        .with_area(abs_w * abs_h)
}

fn checked_class_index(
    row: &YoloLabelRow,
    class_names: Option<&[String]>,
    label_path: &Path,
    line_num: usize,
) -> Result<usize, CocodetError> {
    let index = row.class_index().ok_or_else(|| CocodetError::LabelParse {
        path: label_path.to_path_buf(),
        line: line_num,
        message: format!(
            "class_id {} is not an integer in 0..={}",
            row.class_id,
            MAX_CLASS_ID
        ),
    })?;

    match class_names {
        Some(names) if index >= names.len() => Err(CocodetError::LabelParse {
            path: label_path.to_path_buf(),
            line: line_num,
            message: format!(
                "class_id {} is out of range for {} class name(s)",
                index,
                names.len()
            ),
        }),
        _ => Ok(index),
    }
}

fn read_image_dimensions(path: &Path) -> Result<(u32, u32), CocodetError> {
    let size = imagesize::size(path).map_err(|source| CocodetError::ImageDimensionRead {
        path: path.to_path_buf(),
        source,
    })?;

    dimensions_to_u32(path, size.width, size.height)
}

fn dimensions_to_u32(path: &Path, width: usize, height: usize) -> Result<(u32, u32), CocodetError> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(CocodetError::ImageTooLarge {
            path: path.to_path_buf(),
            width,
            height,
        }),
    }
}
