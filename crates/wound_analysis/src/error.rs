use healing::HealingError;
use thiserror::Error;
use wound_mask::MaskError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
    #[error(transparent)]
    Invalid(#[from] MaskError),
    #[error(transparent)]
    InvalidModel(#[from] HealingError),
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] MaskError),

    #[error("Invalid image data: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Unsupported image layout: {0}")]
    UnsupportedImage(String),

    #[error("Measurement field `{field}` is not a finite number")]
    DataIntegrity { field: &'static str },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
