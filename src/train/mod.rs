//! Fine-tuning loop for a pretrained detector.
//!
//! The loop is framework-agnostic: it drives any [`DetectionModel`] with
//! batches from a [`DataLoader`]. With the `tch` feature enabled,
//! [`TorchScriptSsd`] runs a TorchScript SSD export on libtorch.

mod model;
#[cfg(feature = "tch")]
mod torchscript;

use std::path::PathBuf;

use log::{debug, info};

use crate::dataset::{CocoDetectionDataset, DataLoader, LoaderConfig};
use crate::error::CocodetError;

pub use self::model::{DetectionModel, LossTerms};
#[cfg(feature = "tch")]
pub use self::torchscript::TorchScriptSsd;

/// Stochastic gradient descent hyperparameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SgdConfig {
    pub learning_rate: f64,
    pub momentum: f64,
    pub weight_decay: f64,
}

impl Default for SgdConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.005,
            momentum: 0.9,
            weight_decay: 0.0005,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrainConfig {
    pub epochs: usize,
    /// Object classes, not counting background.
    pub num_foreground_classes: usize,
    pub loader: LoaderConfig,
    pub sgd: SgdConfig,
    pub output_path: PathBuf,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 5,
            num_foreground_classes: 2,
            loader: LoaderConfig::default(),
            sgd: SgdConfig::default(),
            output_path: PathBuf::from("models/detector_weights.pt"),
        }
    }
}

impl TrainConfig {
    /// Classes the new head predicts, background included.
    pub fn num_classes(&self) -> usize {
        self.num_foreground_classes + 1
    }

    pub fn validate(&self) -> Result<(), CocodetError> {
        if self.epochs == 0 {
            return Err(CocodetError::InvalidConfig(
                "epochs must be at least 1".to_string(),
            ));
        }
        if self.num_foreground_classes == 0 {
            return Err(CocodetError::InvalidConfig(
                "at least one foreground class is required".to_string(),
            ));
        }
        if self.loader.batch_size == 0 {
            return Err(CocodetError::InvalidConfig(
                "batch size must be at least 1".to_string(),
            ));
        }
        let lr = self.sgd.learning_rate;
        if !lr.is_finite() || lr <= 0.0 {
            return Err(CocodetError::InvalidConfig(format!(
                "learning rate must be a positive number, got {lr}"
            )));
        }
        if !self.sgd.momentum.is_finite() || self.sgd.momentum < 0.0 {
            return Err(CocodetError::InvalidConfig(format!(
                "momentum must be non-negative, got {}",
                self.sgd.momentum
            )));
        }
        if !self.sgd.weight_decay.is_finite() || self.sgd.weight_decay < 0.0 {
            return Err(CocodetError::InvalidConfig(format!(
                "weight decay must be non-negative, got {}",
                self.sgd.weight_decay
            )));
        }
        Ok(())
    }
}

/// What a completed run did.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainSummary {
    pub epochs: usize,
    /// Optimizer steps taken, one per batch.
    pub steps: usize,
    /// Mean summed loss per epoch; `NaN` for an epoch with no batches.
    pub epoch_mean_losses: Vec<f64>,
    /// Summed loss of the last step, if any step ran.
    pub final_loss: Option<f64>,
}

/// Runs the fine-tuning loop for a model.
pub struct Trainer<M> {
    model: M,
    config: TrainConfig,
}

impl<M: DetectionModel> Trainer<M> {
    pub fn new(model: M, config: TrainConfig) -> Result<Self, CocodetError> {
        config.validate()?;
        Ok(Self { model, config })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    /// Trains on `dataset` for the configured number of epochs, then saves
    /// the weights to the output path.
    ///
    /// Errors from data loading or the model end the run immediately;
    /// nothing is saved in that case.
    pub fn fit(&mut self, dataset: &CocoDetectionDataset) -> Result<TrainSummary, CocodetError> {
        let num_classes = self.config.num_classes();
        info!("replacing classification head: {num_classes} classes (including background)");
        self.model.replace_classification_head(num_classes)?;
        self.model.init_optimizer(&self.config.sgd)?;
        self.model.set_train();

        let mut loader = DataLoader::new(dataset, self.config.loader.clone())?;
        info!(
            "training on {} images: {} epochs, {} batches per epoch",
            dataset.len(),
            self.config.epochs,
            loader.num_batches()
        );

        let mut steps = 0;
        let mut final_loss = None;
        let mut epoch_mean_losses = Vec::with_capacity(self.config.epochs);

        for epoch in 1..=self.config.epochs {
            let mut total = 0.0;
            let mut batches = 0usize;

            for batch in loader.epoch() {
                let batch = batch?;
                debug!("epoch {epoch}: batch of {} images", batch.len());

                let terms = self.model.forward_losses(&batch)?;
                let loss = sum_loss_terms(terms)?;
                let value = self.model.loss_value(&loss)?;
                self.model.backward_step(&loss)?;

                info!("Epoch {epoch}, Loss: {value:.4}");
                total += value;
                batches += 1;
                steps += 1;
                final_loss = Some(value);
            }

            epoch_mean_losses.push(if batches == 0 {
                f64::NAN
            } else {
                total / batches as f64
            });
        }

        self.model.save(&self.config.output_path)?;
        info!("saved weights to {}", self.config.output_path.display());

        Ok(TrainSummary {
            epochs: self.config.epochs,
            steps,
            epoch_mean_losses,
            final_loss,
        })
    }
}

/// Adds every loss term into one scalar.
pub fn sum_loss_terms<L>(terms: LossTerms<L>) -> Result<L, CocodetError>
where
    L: std::ops::Add<Output = L>,
{
    terms
        .into_values()
        .reduce(|acc, term| acc + term)
        .ok_or(CocodetError::EmptyLoss)
}
