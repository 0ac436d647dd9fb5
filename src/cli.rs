use std::path::PathBuf;

use burn::{
    data::dataset::vision::MnistDataset, optim::AdamConfig, tensor::backend::AutodiffBackend,
};
use clap::{Parser, Subcommand};

use crate::{
    decode::join_digits,
    digit::DigitImage,
    evaluation::evaluate,
    inference::{export_model, Recognizer},
    model::ModelConfig,
    show::save_examples,
    training::{train, TrainingConfig},
    Result,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Train a digit classifier and recognize hand-drawn digits")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the classifier on MNIST and save it with its evaluation
    Train {
        #[arg(long, default_value = "/tmp/digit-sketchpad")]
        artifact_dir: String,
        #[arg(long, default_value_t = 10)]
        num_epochs: usize,
        #[arg(long, default_value_t = 512)]
        batch_size: usize,
        #[arg(long, default_value_t = 4)]
        num_workers: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 1.0e-3)]
        learning_rate: f64,
    },
    /// Report accuracy and the confusion matrix on sampled test images
    Evaluate {
        #[arg(long, default_value = "/tmp/digit-sketchpad")]
        artifact_dir: String,
        #[arg(long, default_value_t = 500)]
        size: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Recognize digits drawn in picture files
    Recognize {
        #[arg(long, default_value = "/tmp/digit-sketchpad")]
        artifact_dir: String,
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Write the model in the binary form loaded by the web page
    Export {
        #[arg(long, default_value = "/tmp/digit-sketchpad")]
        artifact_dir: String,
        /// Output path, `.mpk` is appended
        #[arg(long, default_value = "web-model")]
        output: PathBuf,
    },
    /// Save sampled test images as pictures
    Examples {
        #[arg(long, default_value = "/tmp/digit-sketchpad")]
        artifact_dir: String,
        #[arg(long, default_value_t = 20)]
        count: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

impl Commands {
    /// Training renders its own dashboard and logs to the artifact directory.
    pub fn logs_to_terminal(&self) -> bool {
        !matches!(self, Commands::Train { .. })
    }
}

pub fn run<B: AutodiffBackend>(cli: Cli, device: B::Device) -> Result<()> {
    match cli.command {
        Commands::Train {
            artifact_dir,
            num_epochs,
            batch_size,
            num_workers,
            seed,
            learning_rate,
        } => {
            let config = TrainingConfig::new(ModelConfig::new(), AdamConfig::new())
                .with_num_epochs(num_epochs)
                .with_batch_size(batch_size)
                .with_num_workers(num_workers)
                .with_seed(seed)
                .with_learning_rate(learning_rate);
            train::<B>(&artifact_dir, config, device)?;
        }
        Commands::Evaluate {
            artifact_dir,
            size,
            seed,
        } => {
            let recognizer =
                Recognizer::<B::InnerBackend>::from_artifacts(&artifact_dir, device.clone())?;
            let evaluation =
                evaluate(recognizer.model(), MnistDataset::test(), size, seed, &device);
            evaluation.log();
            println!("{}", evaluation.confusion_matrix());
        }
        Commands::Recognize {
            artifact_dir,
            images,
        } => {
            let recognizer = Recognizer::<B::InnerBackend>::from_artifacts(&artifact_dir, device)?;
            let images = images
                .iter()
                .map(DigitImage::open)
                .collect::<Result<Vec<_>>>()?;
            println!("{}", join_digits(&recognizer.recognize(&images)));
        }
        Commands::Export {
            artifact_dir,
            output,
        } => {
            let recognizer = Recognizer::<B::InnerBackend>::from_artifacts(&artifact_dir, device)?;
            export_model(recognizer.model().clone(), output)?;
        }
        Commands::Examples {
            artifact_dir,
            count,
            seed,
        } => {
            let dir = PathBuf::from(artifact_dir).join("examples");
            save_examples(MnistDataset::test(), count, seed, dir)?;
        }
    }

    Ok(())
}
