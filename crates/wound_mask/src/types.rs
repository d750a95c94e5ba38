use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wound_common::SegmentationSource;

use crate::inference::InferenceFailure;

/// Binary H x W mask. Every pixel holds 0 or 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask(GrayImage);

impl BinaryMask {
    /// An all-zero mask
    pub fn empty(width: u32, height: u32) -> Self {
        Self(GrayImage::new(width, height))
    }

    /// Binarize any luma image: non-zero pixels become 1
    pub fn from_luma(image: &GrayImage) -> Self {
        let mut mask = image.clone();
        for pixel in mask.pixels_mut() {
            pixel.0[0] = u8::from(pixel.0[0] != 0);
        }
        Self(mask)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y).0[0] != 0
    }

    pub fn set(&mut self, x: u32, y: u32, on: bool) {
        self.0.put_pixel(x, y, Luma([u8::from(on)]));
    }

    /// Number of set pixels
    pub fn count(&self) -> u64 {
        self.0.pixels().filter(|p| p.0[0] != 0).count() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.0.pixels().all(|p| p.0[0] == 0)
    }

    /// Fraction of the grid covered by the mask
    pub fn coverage(&self) -> f64 {
        let total = u64::from(self.width()) * u64::from(self.height());
        if total == 0 {
            return 0.0;
        }
        self.count() as f64 / total as f64
    }

    /// Number of pixels set in both masks
    pub fn overlap(&self, other: &BinaryMask) -> u64 {
        self.0
            .pixels()
            .zip(other.0.pixels())
            .filter(|(a, b)| a.0[0] != 0 && b.0[0] != 0)
            .count() as u64
    }

    /// Raw 0/1 image
    pub fn as_image(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_image(self) -> GrayImage {
        self.0
    }

    /// 0/255 image suitable for saving or display
    pub fn to_visual(&self) -> GrayImage {
        let mut visual = self.0.clone();
        for pixel in visual.pixels_mut() {
            pixel.0[0] = if pixel.0[0] != 0 { 255 } else { 0 };
        }
        visual
    }
}

/// One mask proposal returned by a segmentation oracle
#[derive(Debug, Clone)]
pub struct CandidateMask {
    /// Mask at the oracle's own resolution; non-zero pixels are foreground
    pub mask: GrayImage,
    pub score: f32,
}

/// Reasons a model mask is refused
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MaskRejection {
    #[error("mask is {actual:?}, image is {expected:?}")]
    ShapeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("mask is empty")]
    Empty,
    #[error("mask covers {coverage:.3} of the image (limit {limit:.3})")]
    Oversized { coverage: f64, limit: f64 },
}

/// Why the circular fallback was used
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    DemoMode,
    Inference(InferenceFailure),
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DemoMode => write!(f, "demo mode"),
            Self::Inference(failure) => write!(f, "{failure}"),
        }
    }
}

/// Provenance of a wound mask
#[derive(Debug, Clone, PartialEq)]
pub enum MaskSource {
    Model { score: f32 },
    Fallback { reason: FallbackReason },
}

/// Wound and peri-wound masks for one image
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub wound_mask: BinaryMask,
    pub peri_wound_mask: BinaryMask,
    pub source: MaskSource,
}

impl Segmentation {
    pub fn used_fallback(&self) -> bool {
        matches!(self.source, MaskSource::Fallback { .. })
    }

    pub fn segmentation_source(&self) -> SegmentationSource {
        match self.source {
            MaskSource::Model { .. } => SegmentationSource::Model,
            MaskSource::Fallback { .. } => SegmentationSource::Fallback,
        }
    }
}
