use thiserror::Error;

/// Errors raised while drawing, loading models or reading images.
#[derive(Error, Debug)]
pub enum Error {
    #[error("sketchpad {index} does not exist, the board has {count} pads")]
    PadOutOfRange { index: usize, count: usize },

    #[error("digit images hold {expected} pixels, got {actual}")]
    InvalidImageSize { expected: usize, actual: usize },

    #[error("no model is loaded")]
    ModelNotLoaded,

    /// Burn recorder failures, kept as text since the recorder error is not `std::error::Error`.
    #[error("model record could not be processed: {0}")]
    Record(String),

    #[error("config could not be read: {0}")]
    Config(String),

    #[cfg(not(target_family = "wasm"))]
    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, Error>;

impl From<burn::record::RecorderError> for Error {
    fn from(err: burn::record::RecorderError) -> Self {
        Error::Record(format!("{err:?}"))
    }
}
