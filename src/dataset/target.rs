//! Per-image training targets.

use ndarray::{Array2, Array3};

use crate::ir::{Annotation, BBoxXYXY, CategoryId, ImageId, Pixel};

/// A decoded image: `f32` values in `[0, 1]`, shape `(3, height, width)`, RGB.
pub type ImageTensor = Array3<f32>;

/// One dataset item as handed to the model.
pub type Sample = (ImageTensor, Target);

/// Boxes and labels for one image.
///
/// `boxes` and `labels` are parallel and always the same length. An image
/// without annotations has both empty.
#[derive(Clone, Debug, PartialEq)]
pub struct Target {
    /// Absolute pixel boxes in (xmin, ymin, xmax, ymax) order.
    pub boxes: Vec<BBoxXYXY<Pixel>>,
    pub labels: Vec<CategoryId>,
    pub image_id: ImageId,
}

impl Target {
    /// Builds a target from annotations in their stored order.
    pub fn from_annotations(image_id: ImageId, annotations: &[Annotation]) -> Self {
        let (boxes, labels) = annotations
            .iter()
            .map(|ann| (ann.bbox, ann.category_id))
            .unzip();
        Self {
            boxes,
            labels,
            image_id,
        }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Boxes as an `(N, 4)` array; `(0, 4)` when there are none.
    pub fn boxes_array(&self) -> Array2<f32> {
        let mut array = Array2::zeros((self.boxes.len(), 4));
        for (mut row, bbox) in array.outer_iter_mut().zip(&self.boxes) {
            for (slot, value) in row.iter_mut().zip(bbox.to_xyxy()) {
                *slot = value as f32;
            }
        }
        array
    }

    pub fn labels_i64(&self) -> Vec<i64> {
        self.labels.iter().map(|id| id.as_u64() as i64).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxes_and_labels_stay_parallel() {
        let anns = vec![
            Annotation::new(1u64, 7u64, 1u64, BBoxXYXY::from_xywh(10.0, 20.0, 30.0, 40.0)),
            Annotation::new(2u64, 7u64, 2u64, BBoxXYXY::from_xywh(0.0, 0.0, 5.0, 5.0)),
        ];
        let target = Target::from_annotations(ImageId(7), &anns);

        assert_eq!(target.len(), 2);
        assert_eq!(target.labels, vec![CategoryId(1), CategoryId(2)]);
        assert_eq!(target.boxes[0].to_xyxy(), [10.0, 20.0, 40.0, 60.0]);
        assert_eq!(target.labels_i64(), vec![1, 2]);
    }

    #[test]
    fn boxes_array_has_one_row_per_box() {
        let anns = vec![Annotation::new(
            1u64,
            1u64,
            1u64,
            BBoxXYXY::from_xywh(1.0, 2.0, 3.0, 4.0),
        )];
        let array = Target::from_annotations(ImageId(1), &anns).boxes_array();
        assert_eq!(array.shape(), &[1, 4]);
        assert_eq!(array.row(0).to_vec(), vec![1.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn empty_target_yields_zero_row_array() {
        let target = Target::from_annotations(ImageId(3), &[]);
        assert!(target.is_empty());
        assert_eq!(target.boxes_array().shape(), &[0, 4]);
    }
}
