//! COCO JSON reader and writer.
//!
//! COCO stores boxes as `[x, y, width, height]` with `(x, y)` the top-left
//! corner in absolute pixels. Reading converts them to [`BBoxXYXY`];
//! writing converts back.
//!
//! The three top-level arrays `images`, `annotations` and `categories` are
//! required. A document missing any of them is rejected as malformed rather
//! than treated as empty.
//!
//! Output is compact (not pretty-printed) and deterministic: records are
//! sorted by id, and field order is fixed by the schema structs below.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::model::{Annotation, Category, Dataset, Image};
use super::{AnnotationId, BBoxXYXY, CategoryId, ImageId, Pixel};
use crate::error::CocodetError;

#[derive(Debug, Serialize, Deserialize)]
struct CocoDocument {
    images: Vec<CocoImage>,
    annotations: Vec<CocoAnnotation>,
    categories: Vec<CocoCategory>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoImage {
    id: u64,
    file_name: String,
    width: u32,
    height: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoAnnotation {
    id: u64,
    image_id: u64,
    category_id: u64,
    bbox: [f64; 4],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    area: Option<f64>,
    #[serde(default)]
    iscrowd: CrowdFlag,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoCategory {
    id: u64,
    name: String,
}

/// `iscrowd` is an integer in COCO proper, but some exporters write a bool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
enum CrowdFlag {
    Int(u8),
    Bool(bool),
}

impl Default for CrowdFlag {
    fn default() -> Self {
        CrowdFlag::Int(0)
    }
}

impl CrowdFlag {
    fn is_crowd(self) -> bool {
        match self {
            CrowdFlag::Int(v) => v != 0,
            CrowdFlag::Bool(v) => v,
        }
    }
}

/// Reads a dataset from a COCO JSON file.
///
/// # Errors
/// `Io` if the file cannot be opened, `MalformedAnnotationFile` if it is not
/// valid JSON or lacks one of the required arrays.
///
/// ```no_run
/// use std::path::Path;
/// use cocodet::ir::io_coco_json::read_coco_json;
///
/// let dataset = read_coco_json(Path::new("annotations.json"))?;
/// # Ok::<(), cocodet::CocodetError>(())
/// ```
pub fn read_coco_json(path: &Path) -> Result<Dataset, CocodetError> {
    let file = File::open(path).map_err(CocodetError::Io)?;
    let reader = BufReader::new(file);

    let coco: CocoDocument = serde_json::from_reader(reader).map_err(|source| {
        CocodetError::MalformedAnnotationFile {
            path: path.to_path_buf(),
            source,
        }
    })?;

    Ok(coco_to_ir(coco))
}

/// Writes a dataset as a single compact COCO JSON document.
pub fn write_coco_json(path: &Path, dataset: &Dataset) -> Result<(), CocodetError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(CocodetError::Io)?;
    }

    let file = File::create(path).map_err(CocodetError::Io)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer(&mut writer, &ir_to_coco(dataset)).map_err(|source| {
        CocodetError::CocoJsonWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.flush().map_err(CocodetError::Io)
}

/// Parses a COCO JSON string. Useful for tests.
pub fn from_coco_str(json: &str) -> Result<Dataset, serde_json::Error> {
    let coco: CocoDocument = serde_json::from_str(json)?;
    Ok(coco_to_ir(coco))
}

/// Parses COCO JSON bytes without a UTF-8 pass.
pub fn from_coco_slice(bytes: &[u8]) -> Result<Dataset, serde_json::Error> {
    let coco: CocoDocument = serde_json::from_slice(bytes)?;
    Ok(coco_to_ir(coco))
}

/// Serializes a dataset to a compact COCO JSON string.
pub fn to_coco_string(dataset: &Dataset) -> Result<String, serde_json::Error> {
    serde_json::to_string(&ir_to_coco(dataset))
}

fn coco_to_ir(coco: CocoDocument) -> Dataset {
    let images = coco
        .images
        .into_iter()
        .map(|img| Image::new(img.id, img.file_name, img.width, img.height))
        .collect();

    let annotations = coco
        .annotations
        .into_iter()
        .map(|ann| {
            let [x, y, w, h] = ann.bbox;
            let bbox = BBoxXYXY::<Pixel>::from_xywh(x, y, w, h);
            let area = ann.area.unwrap_or(w * h);

            Annotation::new(
                AnnotationId::new(ann.id),
                ImageId::new(ann.image_id),
                CategoryId::new(ann.category_id),
                bbox,
            )
            .with_area(area)
            .with_crowd(ann.iscrowd.is_crowd())
        })
        .collect();

    let categories = coco
        .categories
        .into_iter()
        .map(|cat| Category::new(cat.id, cat.name))
        .collect();

    Dataset {
        images,
        annotations,
        categories,
    }
}

fn ir_to_coco(dataset: &Dataset) -> CocoDocument {
    let mut images: Vec<CocoImage> = dataset
        .images
        .iter()
        .map(|img| CocoImage {
            id: img.id.as_u64(),
            file_name: img.file_name.clone(),
            width: img.width,
            height: img.height,
        })
        .collect();
    images.sort_by_key(|img| img.id);

    let mut annotations: Vec<CocoAnnotation> = dataset
        .annotations
        .iter()
        .map(|ann| {
            let (x, y, w, h) = ann.bbox.to_xywh();
            CocoAnnotation {
                id: ann.id.as_u64(),
                image_id: ann.image_id.as_u64(),
                category_id: ann.category_id.as_u64(),
                bbox: [x, y, w, h],
                area: Some(ann.area),
                iscrowd: CrowdFlag::Int(u8::from(ann.iscrowd)),
            }
        })
        .collect();
    annotations.sort_by_key(|ann| ann.id);

    let mut categories: Vec<CocoCategory> = dataset
        .categories
        .iter()
        .map(|cat| CocoCategory {
            id: cat.id.as_u64(),
            name: cat.name.clone(),
        })
        .collect();
    categories.sort_by_key(|cat| cat.id);

    CocoDocument {
        images,
        annotations,
        categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_coco_json() -> &'static str {
        r#"{
            "images": [
                {"id": 1, "file_name": "img1.png", "width": 100, "height": 200},
                {"id": 2, "file_name": "img2.png", "width": 64, "height": 64}
            ],
            "annotations": [
                {"id": 1, "image_id": 1, "category_id": 1,
                 "bbox": [40.0, 60.0, 20.0, 80.0], "area": 1600.0, "iscrowd": 0}
            ],
            "categories": [{"id": 1, "name": "object"}]
        }"#
    }

    #[test]
    fn reads_images_annotations_and_categories() {
        let dataset = from_coco_str(sample_coco_json()).expect("parse failed");

        assert_eq!(dataset.images.len(), 2);
        assert_eq!(dataset.annotations.len(), 1);
        assert_eq!(dataset.categories.len(), 1);

        let ann = &dataset.annotations[0];
        assert_eq!(ann.bbox.to_xyxy(), [40.0, 60.0, 60.0, 140.0]);
        assert_eq!(ann.area, 1600.0);
        assert!(!ann.iscrowd);
        assert_eq!(dataset.categories[0].name, "object");
    }

    #[test]
    fn missing_required_array_is_rejected() {
        let json = r#"{"images": [], "annotations": []}"#;
        let err = from_coco_str(json).unwrap_err();
        assert!(err.to_string().contains("categories"));
    }

    #[test]
    fn missing_area_and_crowd_default_from_box() {
        let json = r#"{
            "images": [{"id": 1, "file_name": "a.png", "width": 10, "height": 10}],
            "annotations": [{"id": 5, "image_id": 1, "category_id": 2, "bbox": [1, 2, 3, 4]}],
            "categories": [{"id": 2, "name": "Y"}]
        }"#;
        let dataset = from_coco_str(json).expect("parse failed");
        assert_eq!(dataset.annotations[0].area, 12.0);
        assert!(!dataset.annotations[0].iscrowd);
    }

    #[test]
    fn boolean_crowd_flag_accepted() {
        let json = r#"{
            "images": [],
            "annotations": [{"id": 1, "image_id": 1, "category_id": 1,
                             "bbox": [0, 0, 1, 1], "iscrowd": true}],
            "categories": []
        }"#;
        let dataset = from_coco_str(json).expect("parse failed");
        assert!(dataset.annotations[0].iscrowd);
    }

    #[test]
    fn writer_emits_compact_schema_in_field_order() {
        let dataset = from_coco_str(sample_coco_json()).expect("parse failed");
        let json = to_coco_string(&dataset).expect("serialize failed");

        assert!(!json.contains('\n'));
        assert!(json.starts_with(r#"{"images":[{"id":1,"file_name":"img1.png","width":100,"height":200}"#));
        assert!(json.contains(
            r#"{"id":1,"image_id":1,"category_id":1,"bbox":[40.0,60.0,20.0,80.0],"area":1600.0,"iscrowd":0}"#
        ));
        assert!(json.ends_with(r#""categories":[{"id":1,"name":"object"}]}"#));
    }

    #[test]
    fn writer_sorts_records_by_id() {
        let dataset = Dataset {
            images: vec![
                Image::new(3u64, "c.png", 10, 10),
                Image::new(1u64, "a.png", 10, 10),
            ],
            annotations: vec![],
            categories: vec![Category::new(2u64, "Y"), Category::new(1u64, "P")],
        };
        let parsed: serde_json::Value =
            serde_json::from_str(&to_coco_string(&dataset).unwrap()).unwrap();

        assert_eq!(parsed["images"][0]["id"], 1);
        assert_eq!(parsed["images"][1]["id"], 3);
        assert_eq!(parsed["categories"][0]["name"], "P");
    }

    #[test]
    fn read_reports_malformed_file_with_path() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("broken.json");
        std::fs::write(&path, "{ not json").expect("write file");

        let err = read_coco_json(&path).unwrap_err();
        assert!(matches!(err, CocodetError::MalformedAnnotationFile { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn write_then_read_preserves_boxes() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("nested/out.json");
        let original = from_coco_str(sample_coco_json()).expect("parse failed");

        write_coco_json(&path, &original).expect("write failed");
        let restored = read_coco_json(&path).expect("read failed");

        assert_eq!(original.annotations, restored.annotations);
        assert_eq!(original.images, restored.images);
    }
}
