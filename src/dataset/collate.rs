//! Turning a list of samples into a batch.

use super::target::{ImageTensor, Sample, Target};

/// Splits `(image, target)` pairs into parallel image and target lists.
///
/// Order is preserved. Items are neither validated nor padded, so boxes
/// per image may differ within a batch.
pub fn collate<I, T>(pairs: Vec<(I, T)>) -> (Vec<I>, Vec<T>) {
    pairs.into_iter().unzip()
}

/// A batch as the training loop consumes it.
#[derive(Clone, Debug, Default)]
pub struct Batch {
    pub images: Vec<ImageTensor>,
    pub targets: Vec<Target>,
}

impl Batch {
    pub fn from_samples(samples: Vec<Sample>) -> Self {
        let (images, targets) = collate(samples);
        Self { images, targets }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Annotation, BBoxXYXY, ImageId};

    #[test]
    fn collate_unzips_in_order() {
        let (images, targets) = collate(vec![("imgA", "targetA"), ("imgB", "targetB")]);
        assert_eq!(images, vec!["imgA", "imgB"]);
        assert_eq!(targets, vec!["targetA", "targetB"]);
    }

    #[test]
    fn collate_of_nothing_is_empty() {
        let (images, targets): (Vec<u8>, Vec<u8>) = collate(Vec::new());
        assert!(images.is_empty() && targets.is_empty());
    }

    #[test]
    fn batch_keeps_ragged_box_counts() {
        let two_boxes = Target::from_annotations(
            ImageId(1),
            &[
                Annotation::new(1u64, 1u64, 1u64, BBoxXYXY::from_xywh(0.0, 0.0, 1.0, 1.0)),
                Annotation::new(2u64, 1u64, 1u64, BBoxXYXY::from_xywh(1.0, 1.0, 1.0, 1.0)),
            ],
        );
        let no_boxes = Target::from_annotations(ImageId(2), &[]);

        let batch = Batch::from_samples(vec![
            (ImageTensor::zeros((3, 2, 2)), two_boxes),
            (ImageTensor::zeros((3, 4, 5)), no_boxes),
        ]);

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.targets[0].len(), 2);
        assert!(batch.targets[1].is_empty());
        assert_eq!(batch.images[1].shape(), &[3, 4, 5]);
    }
}
