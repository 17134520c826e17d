//! Core dataset records shared by the converter, the loader and the trainer.
//!
//! Records mirror the three COCO arrays. They are plain data: built once by a
//! reader or the converter and never mutated afterwards.

use super::bbox::BBoxXYXY;
use super::ids::{AnnotationId, CategoryId, ImageId};
use super::space::Pixel;

/// A detection dataset: images, their box annotations, and category names.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub images: Vec<Image>,
    pub annotations: Vec<Annotation>,
    pub categories: Vec<Category>,
}

impl Dataset {
    /// Number of annotations referencing `image_id`.
    pub fn annotation_count(&self, image_id: ImageId) -> usize {
        self.annotations
            .iter()
            .filter(|ann| ann.image_id == image_id)
            .count()
    }
}

/// Image metadata. Dimensions come from the decoded file, not the labels.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub id: ImageId,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

impl Image {
    pub fn new(
        id: impl Into<ImageId>,
        file_name: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            width,
            height,
        }
    }
}

/// A category id to name mapping entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One labelled box on one image.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub id: AnnotationId,
    pub image_id: ImageId,
    pub category_id: CategoryId,
    pub bbox: BBoxXYXY<Pixel>,
    /// Box area in square pixels, as stored in the file.
    pub area: f64,
    pub iscrowd: bool,
}

impl Annotation {
    /// Creates a non-crowd annotation whose area is derived from the box.
    pub fn new(
        id: impl Into<AnnotationId>,
        image_id: impl Into<ImageId>,
        category_id: impl Into<CategoryId>,
        bbox: BBoxXYXY<Pixel>,
    ) -> Self {
        Self {
            id: id.into(),
            image_id: image_id.into(),
            category_id: category_id.into(),
            area: bbox.area(),
            bbox,
            iscrowd: false,
        }
    }

    pub fn with_area(mut self, area: f64) -> Self {
        self.area = area;
        self
    }

    pub fn with_crowd(mut self, iscrowd: bool) -> Self {
        self.iscrowd = iscrowd;
        self
    }
}
