use burn::{
    module::Module,
    record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder},
    tensor::{activation::softmax, backend::Backend},
};

use crate::{
    decode::index_of_max,
    digit::DigitImage,
    model::{Model, ModelConfig},
    sketchpad::Board,
    Result,
};

/// File name, without the `.mpk` extension, of the weights served to the web page.
pub const WEB_MODEL: &str = "web-model";

/// A trained model ready to classify digits.
pub struct Recognizer<B: Backend> {
    model: Model<B>,
    device: B::Device,
}

impl<B: Backend> Recognizer<B> {
    pub fn new(model: Model<B>, device: B::Device) -> Self {
        Self { model, device }
    }

    /// Loads the config and weights written by a training run.
    #[cfg(not(target_family = "wasm"))]
    pub fn from_artifacts(artifact_dir: &str, device: B::Device) -> Result<Self> {
        use burn::{config::Config, record::CompactRecorder};

        use crate::{training::TrainingConfig, Error};

        let config = TrainingConfig::load(format!("{artifact_dir}/config.json"))
            .map_err(|err| Error::Config(format!("{err:?}")))?;
        config.model.validate()?;
        let record = CompactRecorder::new().load(format!("{artifact_dir}/model").into(), &device)?;
        let model = config.model.init::<B>(&device).load_record(record);

        Ok(Self::new(model, device))
    }

    /// Loads weights exported with [`export_model`] or [`to_bytes`].
    pub fn from_bytes(config: &ModelConfig, bytes: Vec<u8>, device: B::Device) -> Result<Self> {
        config.validate()?;
        let record = NamedMpkBytesRecorder::<FullPrecisionSettings>::default().load(bytes, &device)?;
        let model = config.init::<B>(&device).load_record(record);

        Ok(Self::new(model, device))
    }

    pub fn model(&self) -> &Model<B> {
        &self.model
    }

    /// Softmax distribution over the classes, one row per image.
    pub fn probabilities(&self, images: &[DigitImage]) -> Vec<Vec<f32>> {
        if images.is_empty() {
            return Vec::new();
        }

        let input = DigitImage::batch::<B>(images, &self.device);
        let output = softmax(self.model.forward(input), 1);
        let [_, num_classes] = output.dims();

        let values: Vec<f32> = output.into_data().iter::<f32>().collect();
        values.chunks(num_classes).map(<[f32]>::to_vec).collect()
    }

    /// Most likely class of every image.
    pub fn recognize(&self, images: &[DigitImage]) -> Vec<Option<usize>> {
        self.probabilities(images)
            .iter()
            .map(|row| index_of_max(row))
            .collect()
    }

    pub fn recognize_board(&self, board: &Board) -> Vec<Option<usize>> {
        self.recognize(&board.images())
    }
}

/// Serializes the weights in the MessagePack form loaded by [`Recognizer::from_bytes`].
pub fn to_bytes<B: Backend>(model: Model<B>) -> Result<Vec<u8>> {
    let recorder = NamedMpkBytesRecorder::<FullPrecisionSettings>::default();
    let bytes = Recorder::<B>::record(&recorder, model.into_record(), ())?;
    Ok(bytes)
}

/// Writes `<path>.mpk`, the file served to the web page.
#[cfg(not(target_family = "wasm"))]
pub fn export_model<B: Backend>(model: Model<B>, path: impl Into<std::path::PathBuf>) -> Result<()> {
    use burn::record::NamedMpkFileRecorder;

    let path = path.into();
    model.save_file(path.clone(), &NamedMpkFileRecorder::<FullPrecisionSettings>::new())?;
    log::info!("Exported web model to {}.mpk", path.display());
    Ok(())
}
