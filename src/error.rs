use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("onnx runtime error: {0}")]
    Model(#[from] ort::OrtError),

    #[error("tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("failed to read anchors: {0}")]
    Anchors(#[from] ndarray_npy::ReadNpyError),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("encoding error: {0}")]
    Encode(String),
}

impl Error {
    /// Errors caused by the uploaded data rather than by the models.
    pub fn is_bad_input(&self) -> bool {
        matches!(self, Error::Image(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
