//! libtorch backend for a TorchScript export of an SSD detector.
//!
//! The export is expected to come from torchvision's
//! `ssdlite320_mobilenet_v3_large(pretrained=True)` wrapped in a module that
//! additionally exports
//! `reset_classification_head(self, num_classes: int) -> None`, which
//! rebuilds `head.classification_head` with the backbone's output channels
//! and the anchor generator's anchors per location. In training mode its
//! forward takes `(List[Tensor], List[Dict[str, Tensor]])` and returns the
//! loss dict, either bare or as the first element of a tuple.

use std::path::Path;

use log::{debug, info};
use tch::{CModule, COptimizer, Device, IValue, Kind, Tensor};

use super::model::{DetectionModel, LossTerms};
use super::SgdConfig;
use crate::dataset::{Batch, ImageTensor, Target};
use crate::error::CocodetError;

const RESET_HEAD_METHOD: &str = "reset_classification_head";

pub struct TorchScriptSsd {
    module: CModule,
    device: Device,
    optimizer: Option<COptimizer>,
}

impl TorchScriptSsd {
    /// Loads the export onto CUDA when available, otherwise the CPU.
    pub fn load(path: &Path) -> Result<Self, CocodetError> {
        Self::load_on_device(path, Device::cuda_if_available())
    }

    pub fn load_on_device(path: &Path, device: Device) -> Result<Self, CocodetError> {
        info!("loading TorchScript model {} on {device:?}", path.display());
        let module = CModule::load_on_device(path, device)?;
        Ok(Self {
            module,
            device,
            optimizer: None,
        })
    }

    pub fn device(&self) -> Device {
        self.device
    }

    fn image_to_tensor(&self, image: &ImageTensor) -> Tensor {
        let dims: Vec<i64> = image.shape().iter().map(|&d| d as i64).collect();
        let data: Vec<f32> = image.iter().copied().collect();
        Tensor::of_slice(data.as_slice()).reshape(&dims).to_device(self.device)
    }

    fn target_to_ivalue(&self, target: &Target) -> IValue {
        let boxes: Vec<f32> = target.boxes_array().iter().copied().collect();
        let boxes = Tensor::of_slice(boxes.as_slice())
            .reshape(&[target.len() as i64, 4])
            .to_device(self.device);
        let labels = Tensor::of_slice(target.labels_i64().as_slice()).to_device(self.device);
        let image_id = Tensor::of_slice(&[target.image_id.as_u64() as i64]).to_device(self.device);

        IValue::GenericDict(vec![
            (IValue::String("boxes".to_string()), IValue::Tensor(boxes)),
            (IValue::String("labels".to_string()), IValue::Tensor(labels)),
            (IValue::String("image_id".to_string()), IValue::Tensor(image_id)),
        ])
    }

    fn optimizer(&mut self) -> Result<&mut COptimizer, CocodetError> {
        self.optimizer
            .as_mut()
            .ok_or_else(|| CocodetError::Model("optimizer not initialized".to_string()))
    }
}

impl DetectionModel for TorchScriptSsd {
    type Loss = Tensor;

    fn replace_classification_head(&mut self, num_classes: usize) -> Result<(), CocodetError> {
        self.module
            .method_is(RESET_HEAD_METHOD, &[IValue::Int(num_classes as i64)])?;
        // The new head is created on the CPU inside the script.
        self.module.to(self.device, Kind::Float, false);
        Ok(())
    }

    fn init_optimizer(&mut self, sgd: &SgdConfig) -> Result<(), CocodetError> {
        let mut optimizer =
            COptimizer::sgd(sgd.learning_rate, sgd.momentum, 0.0, sgd.weight_decay, false)?;

        let mut trainable = 0;
        for (name, param) in self.module.named_parameters()? {
            if param.requires_grad() {
                optimizer.add_parameters(&param, 0)?;
                trainable += 1;
            } else {
                debug!("frozen parameter {name}");
            }
        }
        info!("optimizing {trainable} parameter tensors");

        self.optimizer = Some(optimizer);
        Ok(())
    }

    fn set_train(&mut self) {
        self.module.set_train();
    }

    fn forward_losses(&mut self, batch: &Batch) -> Result<LossTerms<Tensor>, CocodetError> {
        let images = batch
            .images
            .iter()
            .map(|image| self.image_to_tensor(image))
            .collect();
        let targets = batch
            .targets
            .iter()
            .map(|target| self.target_to_ivalue(target))
            .collect();

        let output = self.module.forward_is(&[
            IValue::TensorList(images),
            IValue::GenericList(targets),
        ])?;
        parse_loss_dict(output)
    }

    fn loss_value(&self, loss: &Tensor) -> Result<f64, CocodetError> {
        if loss.numel() != 1 {
            return Err(CocodetError::Model(format!(
                "expected a scalar loss, got shape {:?}",
                loss.size()
            )));
        }
        Ok(loss.double_value(&[]))
    }

    fn backward_step(&mut self, loss: &Tensor) -> Result<(), CocodetError> {
        let optimizer = self.optimizer()?;
        optimizer.zero_grad()?;
        loss.backward();
        optimizer.step()?;
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<(), CocodetError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let named = self.module.named_parameters()?;
        Tensor::save_multi(&named, path)?;
        Ok(())
    }
}

fn parse_loss_dict(output: IValue) -> Result<LossTerms<Tensor>, CocodetError> {
    let entries = match output {
        IValue::GenericDict(entries) => entries,
        IValue::Tuple(items) => match items.into_iter().next() {
            Some(IValue::GenericDict(entries)) => entries,
            _ => {
                return Err(CocodetError::Model(
                    "first element of model output is not a loss dict".to_string(),
                ))
            }
        },
        _ => {
            return Err(CocodetError::Model(
                "model output is neither a loss dict nor a tuple".to_string(),
            ))
        }
    };

    entries
        .into_iter()
        .map(|(key, value)| match (key, value) {
            (IValue::String(name), IValue::Tensor(loss)) => Ok((name, loss)),
            _ => Err(CocodetError::Model(
                "loss dict must map names to tensors".to_string(),
            )),
        })
        .collect()
}
