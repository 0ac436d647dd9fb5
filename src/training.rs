use std::path::Path;

use burn::{
    config::Config,
    data::dataloader::DataLoaderBuilder,
    module::{AutodiffModule, Module},
    nn::loss::CrossEntropyLossConfig,
    optim::AdamConfig,
    record::CompactRecorder,
    tensor::{
        backend::{AutodiffBackend, Backend},
        Int, Tensor,
    },
    train::{
        metric::{AccuracyMetric, LossMetric},
        ClassificationOutput, LearnerBuilder, TrainOutput, TrainStep, ValidStep,
    },
};

use crate::{
    data::{test_split, train_split, MnistBatch, MnistBatcher},
    evaluation::evaluate,
    inference::{export_model, WEB_MODEL},
    model::{Model, ModelConfig},
    show::save_examples,
};

#[derive(Config)]
pub struct TrainingConfig {
    pub model: ModelConfig,
    pub optimizer: AdamConfig,
    #[config(default = 10)]
    pub num_epochs: usize,
    #[config(default = 512)]
    pub batch_size: usize,
    #[config(default = 4)]
    pub num_workers: usize,
    #[config(default = 42)]
    pub seed: u64,
    #[config(default = 1.0e-3)]
    pub learning_rate: f64,
    #[config(default = 55000)]
    pub train_size: usize,
    #[config(default = 10000)]
    pub test_size: usize,
    /// Test items sampled for the accuracy and confusion report.
    #[config(default = 500)]
    pub eval_size: usize,
    /// Test items written as pictures before training.
    #[config(default = 20)]
    pub num_examples: usize,
}

impl<B: Backend> Model<B> {
    pub fn forward_classification(
        &self,
        images: Tensor<B, 3>,
        targets: Tensor<B, 1, Int>,
    ) -> ClassificationOutput<B> {
        let output = self.forward(images);
        let loss = CrossEntropyLossConfig::new()
            .init(&output.device())
            .forward(output.clone(), targets.clone());

        ClassificationOutput::new(loss, output, targets)
    }
}

impl<B: AutodiffBackend> TrainStep<MnistBatch<B>, ClassificationOutput<B>> for Model<B> {
    fn step(&self, batch: MnistBatch<B>) -> TrainOutput<ClassificationOutput<B>> {
        let item = self.forward_classification(batch.images, batch.targets);

        TrainOutput::new(self, item.loss.backward(), item)
    }
}

impl<B: Backend> ValidStep<MnistBatch<B>, ClassificationOutput<B>> for Model<B> {
    fn step(&self, batch: MnistBatch<B>) -> ClassificationOutput<B> {
        self.forward_classification(batch.images, batch.targets)
    }
}

fn create_artifact_dir(artifact_dir: &str) -> crate::Result<()> {
    // Remove existing artifacts before to get an accurate learner summary
    std::fs::remove_dir_all(artifact_dir).ok();
    std::fs::create_dir_all(artifact_dir)?;
    Ok(())
}

/// Logs the layer stack and its size.
pub fn log_summary<B: Backend>(model: &Model<B>) {
    log::info!("Model architecture:\n{model}");
    log::info!("Trainable parameters: {}", model.num_params());
}

pub fn train<B: AutodiffBackend>(
    artifact_dir: &str,
    config: TrainingConfig,
    device: B::Device,
) -> crate::Result<Model<B::InnerBackend>> {
    config.model.validate()?;
    create_artifact_dir(artifact_dir)?;
    config.save(format!("{artifact_dir}/config.json"))?;

    save_examples(
        test_split(config.test_size),
        config.num_examples,
        config.seed,
        Path::new(artifact_dir).join("examples"),
    )?;

    B::seed(config.seed);

    let model = config.model.init::<B>(&device);
    log_summary(&model);

    let batcher_train = MnistBatcher::<B>::new(device.clone());
    let batcher_valid = MnistBatcher::<B::InnerBackend>::new(device.clone());

    let dataloader_train = DataLoaderBuilder::new(batcher_train)
        .batch_size(config.batch_size)
        .shuffle(config.seed)
        .num_workers(config.num_workers)
        .build(train_split(config.train_size));

    // The test split doubles as validation data.
    let dataloader_test = DataLoaderBuilder::new(batcher_valid)
        .batch_size(config.batch_size)
        .shuffle(config.seed)
        .num_workers(config.num_workers)
        .build(test_split(config.test_size));

    let learner = LearnerBuilder::new(artifact_dir)
        .metric_train_numeric(AccuracyMetric::new())
        .metric_valid_numeric(AccuracyMetric::new())
        .metric_train_numeric(LossMetric::new())
        .metric_valid_numeric(LossMetric::new())
        .with_file_checkpointer(CompactRecorder::new())
        .devices(vec![device.clone()])
        .num_epochs(config.num_epochs)
        .summary()
        .build(model, config.optimizer.init(), config.learning_rate);

    let model_trained = learner.fit(dataloader_train, dataloader_test);

    model_trained
        .clone()
        .save_file(format!("{artifact_dir}/model"), &CompactRecorder::new())?;

    let model_valid = model_trained.valid();
    export_model(model_valid.clone(), format!("{artifact_dir}/{WEB_MODEL}"))?;

    let evaluation = evaluate(
        &model_valid,
        test_split(config.test_size),
        config.eval_size,
        config.seed,
        &device,
    );
    evaluation.log();
    evaluation.save(format!("{artifact_dir}/evaluation.json"))?;

    Ok(model_valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::data::dataloader::batcher::Batcher;
    use burn::data::dataset::vision::MnistItem;

    type TestBackend = Autodiff<NdArray<f32>>;

    fn batch(device: &<TestBackend as Backend>::Device) -> MnistBatch<TestBackend> {
        let items = (0..4u8)
            .map(|label| MnistItem {
                image: [[label as f32 * 60.0; 28]; 28],
                label,
            })
            .collect();

        MnistBatcher::<TestBackend>::new(device.clone()).batch(items)
    }

    #[test]
    fn defaults_match_the_demo() {
        let config = TrainingConfig::new(ModelConfig::new(), AdamConfig::new());

        assert_eq!(config.num_epochs, 10);
        assert_eq!(config.batch_size, 512);
        assert_eq!(config.train_size, 55000);
        assert_eq!(config.test_size, 10000);
        assert_eq!(config.eval_size, 500);
        assert_eq!(config.learning_rate, 1.0e-3);
    }

    #[test]
    fn config_survives_json() {
        let config = TrainingConfig::new(ModelConfig::new(), AdamConfig::new()).with_num_epochs(2);

        let json = config.to_string();
        let loaded = TrainingConfig::load_binary(json.as_bytes()).unwrap();

        assert_eq!(loaded.num_epochs, 2);
        assert_eq!(loaded.model.conv2_channels, 16);
    }

    #[test]
    fn train_step_produces_gradients() {
        let device = Default::default();
        let model = ModelConfig::new().init::<TestBackend>(&device);

        let output = TrainStep::step(&model, batch(&device));

        let loss = output.item.loss.into_scalar();
        assert!(loss.is_finite());
        assert!(loss > 0.0);
    }

    #[test]
    fn valid_step_keeps_targets() {
        let device = Default::default();
        let model = ModelConfig::new().init::<TestBackend>(&device).valid();
        let batch = batch(&device);
        let batch = MnistBatch {
            images: batch.images.inner(),
            targets: batch.targets.inner(),
        };

        let output = ValidStep::step(&model, batch);

        assert_eq!(output.output.dims(), [4, 10]);
        let targets: Vec<i64> = output.targets.into_data().iter::<i64>().collect();
        assert_eq!(targets, vec![0, 1, 2, 3]);
    }
}
