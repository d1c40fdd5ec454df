use thiserror::Error;

/// Everything that can go wrong between raw bytes and a class label.
///
/// The `Decode` and `Model` variants are transparent so the message reaching
/// an HTTP client is exactly what the image decoder or TensorFlow reported.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Decode(#[from] image::ImageError),

    #[error(transparent)]
    Model(#[from] tensorflow::Status),

    #[error("Could not load labels from {path}: {reason}")]
    Labels { path: String, reason: String },

    #[error("Model produced {actual} class scores but {expected} labels are loaded")]
    OutputShape { expected: usize, actual: usize },

    #[error("Model produced no usable class scores")]
    EmptyOutput,

    #[error("Could not fetch image: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClassifyError>;
