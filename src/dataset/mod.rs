//! Indexed, random-access view of a COCO detection dataset.
//!
//! [`CocoDetectionDataset`] parses the annotation file once and builds
//! immutable lookup tables; [`CocoDetectionDataset::get`] then decodes one
//! image and builds its [`Target`] on every call. Nothing is cached and
//! nothing is mutated after construction, so concurrent `get` calls with
//! different indices are safe.

mod collate;
mod decode;
mod loader;
mod target;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::debug;

pub use self::collate::{collate, Batch};
pub use self::decode::load_image_tensor;
pub use self::loader::{DataLoader, EpochBatches, LoaderConfig};
pub use self::target::{ImageTensor, Sample, Target};

use crate::error::CocodetError;
use crate::ir::io_coco_json::read_coco_json;
use crate::ir::{Annotation, CategoryId, Dataset, Image, ImageId};

/// A COCO-style dataset indexed for training.
#[derive(Clone, Debug)]
pub struct CocoDetectionDataset {
    image_dir: PathBuf,
    /// Iteration order is the order of first appearance in `images`.
    images: IndexMap<ImageId, Image>,
    annotations: HashMap<ImageId, Vec<Annotation>>,
    categories: BTreeMap<CategoryId, String>,
}

impl CocoDetectionDataset {
    /// Reads `annotation_path` and indexes it; images are resolved under `image_dir`.
    ///
    /// # Errors
    /// `MalformedAnnotationFile` if the file is not valid JSON or lacks the
    /// `images`, `annotations` or `categories` array.
    pub fn open(
        annotation_path: impl AsRef<Path>,
        image_dir: impl Into<PathBuf>,
    ) -> Result<Self, CocodetError> {
        let dataset = read_coco_json(annotation_path.as_ref())?;
        Ok(Self::from_dataset(dataset, image_dir))
    }

    /// Indexes an in-memory dataset.
    ///
    /// A repeated image id keeps the position of its first appearance and
    /// the record of its last.
    pub fn from_dataset(dataset: Dataset, image_dir: impl Into<PathBuf>) -> Self {
        let Dataset {
            images: image_records,
            annotations: annotation_records,
            categories: category_records,
        } = dataset;

        let mut images = IndexMap::with_capacity(image_records.len());
        for image in image_records {
            images.insert(image.id, image);
        }

        let mut annotations: HashMap<ImageId, Vec<Annotation>> = HashMap::new();
        for ann in annotation_records {
            annotations.entry(ann.image_id).or_default().push(ann);
        }

        let categories = category_records
            .into_iter()
            .map(|cat| (cat.id, cat.name))
            .collect();

        let indexed = Self {
            image_dir: image_dir.into(),
            images,
            annotations,
            categories,
        };
        debug!(
            "indexed {} images, {} annotated, {} categories",
            indexed.images.len(),
            indexed.annotations.len(),
            indexed.categories.len()
        );
        indexed
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Image ids in iteration order.
    pub fn image_ids(&self) -> impl Iterator<Item = ImageId> + '_ {
        self.images.keys().copied()
    }

    /// Image record at `index`.
    pub fn image(&self, index: usize) -> Result<&Image, CocodetError> {
        self.images
            .get_index(index)
            .map(|(_, image)| image)
            .ok_or(CocodetError::IndexOutOfRange {
                index,
                len: self.images.len(),
            })
    }

    /// Annotations of `image_id` in file order; empty if it has none.
    pub fn annotations_for(&self, image_id: ImageId) -> &[Annotation] {
        self.annotations
            .get(&image_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn category_name(&self, id: CategoryId) -> Option<&str> {
        self.categories.get(&id).map(String::as_str)
    }

    /// Category id to name mapping, ordered by id.
    pub fn categories(&self) -> &BTreeMap<CategoryId, String> {
        &self.categories
    }

    /// Number of foreground categories declared by the annotation file.
    pub fn num_foreground_classes(&self) -> usize {
        self.categories.len()
    }

    /// Builds the target of the image at `index` without decoding pixels.
    pub fn target(&self, index: usize) -> Result<Target, CocodetError> {
        let image = self.image(index)?;
        Ok(Target::from_annotations(
            image.id,
            self.annotations_for(image.id),
        ))
    }

    /// Decodes the image at `index` and pairs it with its target.
    ///
    /// # Errors
    /// `IndexOutOfRange` when `index >= len()`; `ImageRead` when the file is
    /// missing or cannot be decoded.
    pub fn get(&self, index: usize) -> Result<Sample, CocodetError> {
        let image = self.image(index)?;
        let tensor = load_image_tensor(&self.image_dir.join(&image.file_name))?;
        let target = Target::from_annotations(image.id, self.annotations_for(image.id));
        Ok((tensor, target))
    }
}
