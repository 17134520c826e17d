//! The boundary between the training loop and a detection framework.

use std::collections::BTreeMap;
use std::ops::Add;
use std::path::Path;

use super::SgdConfig;
use crate::dataset::Batch;
use crate::error::CocodetError;

/// Named loss terms returned by one training-mode forward pass,
/// e.g. `bbox_regression` and `classification` for SSD.
pub type LossTerms<L> = BTreeMap<String, L>;

/// A detector that can be fine-tuned by [`Trainer`](super::Trainer).
///
/// Implementations own their parameters, optimizer state and device
/// placement. The trainer only sequences calls and sums loss terms.
pub trait DetectionModel {
    /// A scalar loss the framework can differentiate.
    type Loss: Add<Output = Self::Loss>;

    /// Swaps the classification head for one that predicts `num_classes`
    /// classes, background included. Other weights stay pretrained.
    fn replace_classification_head(&mut self, num_classes: usize) -> Result<(), CocodetError>;

    /// Builds the optimizer over every trainable parameter. Called after
    /// the head swap so the new head is included.
    fn init_optimizer(&mut self, sgd: &SgdConfig) -> Result<(), CocodetError>;

    fn set_train(&mut self);

    /// Runs the model in training mode on one batch.
    fn forward_losses(&mut self, batch: &Batch) -> Result<LossTerms<Self::Loss>, CocodetError>;

    fn loss_value(&self, loss: &Self::Loss) -> Result<f64, CocodetError>;

    /// Clears gradients, backpropagates `loss` and applies one optimizer step.
    fn backward_step(&mut self, loss: &Self::Loss) -> Result<(), CocodetError>;

    /// Persists the learned parameters.
    fn save(&self, path: &Path) -> Result<(), CocodetError>;
}
