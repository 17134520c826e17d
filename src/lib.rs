//! cocodet: COCO detection data plumbing for fine-tuning SSD detectors.
//!
//! Converts YOLO label directories to COCO JSON, loads COCO annotations as
//! `(image, target)` training samples, batches them, and drives a
//! fine-tuning loop over a pretrained detector.
//!
//! # Modules
//!
//! - [`ir`]: Dataset types, bounding boxes and COCO JSON I/O
//! - [`convert`]: YOLO to COCO conversion with a skip report
//! - [`dataset`]: Annotation loader, batch collation and epoch batching
//! - [`train`]: The training loop and the detection model seam
//! - [`inspect`]: Dataset sanity checks
//! - [`error`]: Error types for cocodet operations

pub mod convert;
pub mod dataset;
pub mod error;
pub mod inspect;
pub mod ir;
pub mod train;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use error::CocodetError;

/// The cocodet CLI application.
#[derive(Parser)]
#[command(name = "cocodet")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Convert a directory of YOLO label files to one COCO JSON file.
    Convert(ConvertArgs),
    /// Fine-tune a pretrained SSD detector on a COCO dataset.
    Train(TrainArgs),
    /// Summarize a COCO annotation file before training on it.
    Inspect(InspectArgs),
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Directory containing YOLO `.txt` label files.
    #[arg(long = "labels", env = "COCODET_LABELS_DIR")]
    labels_dir: PathBuf,

    /// Directory containing the companion images.
    #[arg(long = "images", env = "COCODET_IMAGES_DIR")]
    images_dir: PathBuf,

    /// COCO JSON file to write.
    #[arg(long, env = "COCODET_OUTPUT")]
    output: PathBuf,

    /// Extension of the companion images, without the dot.
    #[arg(long, default_value = "png", env = "COCODET_IMAGE_EXT")]
    image_ext: String,

    /// Name of the single category when class ids are collapsed.
    #[arg(long, default_value = "object")]
    category_name: String,

    /// Map YOLO class k to COCO category k+1 instead of collapsing to one category.
    #[arg(long)]
    keep_class_ids: bool,

    /// `classes.txt` or `data.yaml` naming the classes (implies --keep-class-ids).
    #[arg(long)]
    classes: Option<PathBuf>,

    /// Fail on the first missing image or malformed line instead of skipping it.
    #[arg(long)]
    strict: bool,

    /// Output format for the conversion report ('text' or 'json').
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    report: String,
}

#[derive(clap::Args)]
struct TrainArgs {
    /// COCO JSON annotation file.
    #[arg(long, env = "COCODET_ANNOTATIONS")]
    annotations: PathBuf,

    /// Directory the annotation file names are relative to.
    #[arg(long = "images", env = "COCODET_IMAGES_DIR")]
    images_dir: PathBuf,

    /// TorchScript export of the pretrained detector.
    #[arg(long, env = "COCODET_MODEL")]
    model: PathBuf,

    /// Where to save the fine-tuned weights.
    #[arg(long, env = "COCODET_WEIGHTS_OUTPUT")]
    output: PathBuf,

    #[arg(long, default_value_t = 2, env = "COCODET_BATCH_SIZE")]
    batch_size: usize,

    #[arg(long, default_value_t = 5, env = "COCODET_EPOCHS")]
    epochs: usize,

    /// SGD learning rate.
    #[arg(long = "lr", default_value_t = 0.005, env = "COCODET_LR")]
    learning_rate: f64,

    #[arg(long, default_value_t = 0.9, env = "COCODET_MOMENTUM")]
    momentum: f64,

    #[arg(long, default_value_t = 0.0005, env = "COCODET_WEIGHT_DECAY")]
    weight_decay: f64,

    /// Object classes, not counting background.
    #[arg(long, default_value_t = 2, env = "COCODET_NUM_CLASSES")]
    num_classes: usize,

    /// Visit images in file order every epoch.
    #[arg(long)]
    no_shuffle: bool,

    /// Seed for the per-epoch shuffle.
    #[arg(long, env = "COCODET_SEED")]
    seed: Option<u64>,
}

#[derive(clap::Args)]
struct InspectArgs {
    /// COCO JSON annotation file.
    #[arg(long, env = "COCODET_ANNOTATIONS")]
    annotations: PathBuf,

    /// Image directory; when given, also check that every image file exists.
    #[arg(long = "images")]
    images_dir: Option<PathBuf>,

    /// Output format ('text' or 'json').
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    output: String,
}

/// Run the cocodet CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), CocodetError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Convert(args)) => run_convert(args),
        Some(Commands::Train(args)) => run_train(args),
        Some(Commands::Inspect(args)) => run_inspect(args),
        None => {
            println!("cocodet {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("COCO detection data plumbing for fine-tuning SSD detectors.");
            println!();
            println!("Run 'cocodet --help' for usage information.");
            Ok(())
        }
    }
}

fn run_convert(args: ConvertArgs) -> Result<(), CocodetError> {
    let keep = args.keep_class_ids || args.classes.is_some();
    let options = convert::ConvertOptions {
        image_extension: args.image_ext.trim_start_matches('.').to_string(),
        category_name: args.category_name,
        class_ids: if keep {
            convert::ClassIdPolicy::Keep
        } else {
            convert::ClassIdPolicy::Collapse
        },
        class_names: args.classes,
        skip_policy: if args.strict {
            convert::SkipPolicy::Fail
        } else {
            convert::SkipPolicy::Skip
        },
    };

    let report =
        convert::run_conversion(&args.labels_dir, &args.images_dir, &args.output, &options)?;

    match args.report.as_str() {
        "json" => println!("{}", to_json(&report)?),
        _ => {
            println!(
                "Converted {} label files to {}",
                report.label_files,
                args.output.display()
            );
            print!("{report}");
        }
    }
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<(), CocodetError> {
    let config = train::TrainConfig {
        epochs: args.epochs,
        num_foreground_classes: args.num_classes,
        loader: dataset::LoaderConfig {
            batch_size: args.batch_size,
            shuffle: !args.no_shuffle,
            seed: args.seed,
        },
        sgd: train::SgdConfig {
            learning_rate: args.learning_rate,
            momentum: args.momentum,
            weight_decay: args.weight_decay,
        },
        output_path: args.output,
    };
    config.validate()?;

    train_with_backend(&args.annotations, &args.images_dir, &args.model, config)
}

#[cfg(feature = "tch")]
fn train_with_backend(
    annotations: &std::path::Path,
    images_dir: &std::path::Path,
    model_path: &std::path::Path,
    config: train::TrainConfig,
) -> Result<(), CocodetError> {
    let data = dataset::CocoDetectionDataset::open(annotations, images_dir)?;
    let model = train::TorchScriptSsd::load(model_path)?;
    let mut trainer = train::Trainer::new(model, config)?;
    let summary = trainer.fit(&data)?;

    if let Some(loss) = summary.final_loss {
        println!(
            "Trained {} epochs ({} steps), final loss {loss:.4}",
            summary.epochs, summary.steps
        );
    }
    Ok(())
}

#[cfg(not(feature = "tch"))]
fn train_with_backend(
    _annotations: &std::path::Path,
    _images_dir: &std::path::Path,
    _model_path: &std::path::Path,
    _config: train::TrainConfig,
) -> Result<(), CocodetError> {
    Err(CocodetError::BackendUnavailable { feature: "tch" })
}

fn run_inspect(args: InspectArgs) -> Result<(), CocodetError> {
    let check_files = args.images_dir.is_some();
    let image_dir = args.images_dir.unwrap_or_default();
    let data = dataset::CocoDetectionDataset::open(&args.annotations, image_dir)?;
    let report = inspect::inspect_dataset(&data, &inspect::InspectOptions { check_files });

    match args.output.as_str() {
        "json" => println!("{}", to_json(&report)?),
        _ => print!("{report}"),
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CocodetError> {
    serde_json::to_string_pretty(value).map_err(CocodetError::ReportJson)
}
