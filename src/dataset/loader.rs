//! Epoch and batch iteration over a [`CocoDetectionDataset`].

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::collate::Batch;
use super::CocoDetectionDataset;
use crate::error::CocodetError;

/// Batching and shuffling settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderConfig {
    pub batch_size: usize,
    /// Draw a fresh uniform permutation of the images every epoch.
    pub shuffle: bool,
    /// Seed for the shuffle; the thread RNG is used when unset.
    pub seed: Option<u64>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 2,
            shuffle: true,
            seed: None,
        }
    }
}

/// Drives a dataset in fixed-size batches, one epoch at a time.
///
/// The final batch of an epoch is smaller when the dataset size is not a
/// multiple of the batch size; it is yielded, not dropped.
pub struct DataLoader<'a> {
    dataset: &'a CocoDetectionDataset,
    config: LoaderConfig,
    rng: Option<StdRng>,
}

impl<'a> DataLoader<'a> {
    pub fn new(
        dataset: &'a CocoDetectionDataset,
        config: LoaderConfig,
    ) -> Result<Self, CocodetError> {
        if config.batch_size == 0 {
            return Err(CocodetError::InvalidConfig(
                "batch size must be at least 1".to_string(),
            ));
        }

        let rng = config.seed.map(StdRng::seed_from_u64);
        Ok(Self {
            dataset,
            config,
            rng,
        })
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Batches per epoch, counting a trailing partial batch.
    pub fn num_batches(&self) -> usize {
        self.dataset.len().div_ceil(self.config.batch_size)
    }

    /// Dataset indices for the next epoch.
    pub fn epoch_order(&mut self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        if self.config.shuffle {
            match self.rng.as_mut() {
                Some(rng) => order.shuffle(rng),
                None => order.shuffle(&mut rand::rng()),
            }
        }
        order
    }

    /// Starts a new epoch, reshuffling if enabled.
    pub fn epoch(&mut self) -> EpochBatches<'a> {
        EpochBatches {
            dataset: self.dataset,
            order: self.epoch_order(),
            batch_size: self.config.batch_size,
            position: 0,
        }
    }
}

/// Batches of one epoch. Each item decodes its images on demand.
pub struct EpochBatches<'a> {
    dataset: &'a CocoDetectionDataset,
    order: Vec<usize>,
    batch_size: usize,
    position: usize,
}

impl EpochBatches<'_> {
    /// Dataset indices this epoch visits, in order.
    pub fn order(&self) -> &[usize] {
        &self.order
    }
}

impl Iterator for EpochBatches<'_> {
    type Item = Result<Batch, CocodetError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.order.len() {
            return None;
        }

        let end = (self.position + self.batch_size).min(self.order.len());
        let indices = &self.order[self.position..end];
        self.position = end;

        let samples = indices
            .iter()
            .map(|&index| self.dataset.get(index))
            .collect::<Result<Vec<_>, _>>();
        Some(samples.map(Batch::from_samples))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.order.len() - self.position).div_ceil(self.batch_size);
        (remaining, Some(remaining))
    }
}
