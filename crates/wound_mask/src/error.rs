use thiserror::Error;

use crate::types::MaskRejection;

#[derive(Error, Debug)]
pub enum MaskError {
    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Mask shape {actual:?} does not match image shape {expected:?}")]
    ShapeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors raised by a segmentation oracle. These never leave the inference
/// service; they are turned into an [`InferenceFailure`](crate::inference::InferenceFailure).
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Oracle unavailable: {0}")]
    Unavailable(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Malformed oracle output: {0}")]
    Protocol(String),

    #[error("Mask rejected: {0}")]
    Rejected(#[from] MaskRejection),

    #[error("Failed to read oracle mask: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MaskError>;
