//! Image intake: base64 payloads and decoded images become an 8-bit RGB grid.

use std::io::Cursor;

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageReader, RgbImage};

use crate::error::{AnalysisError, Result};

/// An 8-bit, three-channel RGB photograph
#[derive(Debug, Clone, PartialEq)]
pub struct WoundImage(RgbImage);

impl WoundImage {
    pub fn as_rgb(&self) -> &RgbImage {
        &self.0
    }

    pub fn into_rgb(self) -> RgbImage {
        self.0
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    /// Open an image file and convert it to RGB
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Ok(Self::from_decoded(image::open(path)?))
    }

    /// Convert whatever the decoder produced to 8-bit RGB
    pub fn from_decoded(image: DynamicImage) -> Self {
        Self(image.into_rgb8())
    }
}

impl From<RgbImage> for WoundImage {
    fn from(image: RgbImage) -> Self {
        Self(image)
    }
}

/// Accepts only images that already are 8-bit RGB
impl TryFrom<DynamicImage> for WoundImage {
    type Error = AnalysisError;

    fn try_from(image: DynamicImage) -> Result<Self> {
        match image {
            DynamicImage::ImageRgb8(rgb) => Ok(Self(rgb)),
            other => Err(AnalysisError::UnsupportedImage(format!(
                "expected 8-bit RGB, got {:?}",
                other.color()
            ))),
        }
    }
}

/// Decode a base64 image, with or without a `data:<mime>;base64,` prefix
pub fn decode_base64_image(payload: &str) -> Result<WoundImage> {
    let encoded = match payload.split_once(',') {
        Some((header, data)) if header.starts_with("data:") => data,
        _ => payload,
    };
    let bytes = STANDARD.decode(encoded.trim())?;
    let decoded = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?
        .decode()?;
    Ok(WoundImage::from_decoded(decoded))
}
