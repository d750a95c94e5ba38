pub mod builder;

use image::RgbImage;
use serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use tracing::{debug, warn};
use wound_common::PixelPoint;

use crate::{
    algorithms::{circular_mask, peri_wound_mask},
    error::{MaskError, Result},
    inference::{InferenceOutcome, InferenceService},
    types::{FallbackReason, MaskSource, Segmentation},
};

/// Geometry of the fallback and peri-wound masks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Radius of the circular fallback mask in pixels
    pub fallback_radius_px: u32,
    /// Width of the peri-wound ring in pixels
    pub peri_wound_radius_px: u8,
    /// Largest fraction of the image a model mask may cover
    #[schemars(range(min = 0.0, max = 1.0))]
    pub max_coverage: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            fallback_radius_px: crate::DEFAULT_FALLBACK_RADIUS_PX,
            peri_wound_radius_px: crate::DEFAULT_PERI_WOUND_RADIUS_PX,
            max_coverage: crate::DEFAULT_MAX_COVERAGE,
        }
    }
}

impl SegmentationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fallback_radius_px == 0 {
            return Err(MaskError::InvalidConfig("fallback_radius_px must be positive".into()));
        }
        if self.peri_wound_radius_px == 0 || self.peri_wound_radius_px == u8::MAX {
            return Err(MaskError::InvalidConfig(
                "peri_wound_radius_px must be between 1 and 254".into(),
            ));
        }
        if !(self.max_coverage > 0.0 && self.max_coverage <= 1.0) {
            return Err(MaskError::InvalidConfig("max_coverage must be in (0, 1]".into()));
        }
        Ok(())
    }
}

/// Wound segmentation with a deterministic circular fallback
pub struct Segmenter {
    inference: InferenceService,
    config: SegmentationConfig,
}

impl Segmenter {
    /// Create a new segmenter builder
    pub fn builder() -> builder::SegmenterBuilder {
        builder::SegmenterBuilder::new()
    }

    pub fn new(mut inference: InferenceService, config: SegmentationConfig) -> Self {
        inference.set_max_coverage(config.max_coverage);
        Self { inference, config }
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    pub fn inference(&self) -> &InferenceService {
        &self.inference
    }

    /// Produce wound and peri-wound masks for the wound around `point`.
    ///
    /// Only malformed input is an error. In demo mode, or whenever the model
    /// cannot deliver a valid mask, the circular fallback is returned instead.
    pub fn segment(&self, image: &RgbImage, point: PixelPoint, demo_mode: bool) -> Result<Segmentation> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(MaskError::InvalidInput(format!("image has no pixels ({width}x{height})")));
        }
        if !point.is_within(width, height) {
            return Err(MaskError::InvalidInput(format!(
                "prompt point ({}, {}) lies outside the {width}x{height} image",
                point.x, point.y
            )));
        }

        let (wound_mask, source) = if demo_mode {
            debug!("demo mode: using circular fallback mask");
            (self.fallback(width, height, point), MaskSource::Fallback { reason: FallbackReason::DemoMode })
        } else {
            match self.inference.infer(image, point) {
                InferenceOutcome::Mask { mask, score } => {
                    debug!(score, pixels = mask.count(), "model mask accepted");
                    (mask, MaskSource::Model { score })
                }
                InferenceOutcome::Failed(failure) => {
                    warn!(reason = %failure, "model segmentation unavailable, using circular fallback");
                    (
                        self.fallback(width, height, point),
                        MaskSource::Fallback { reason: FallbackReason::Inference(failure) },
                    )
                }
            }
        };

        let peri_wound_mask = peri_wound_mask(&wound_mask, self.config.peri_wound_radius_px);
        Ok(Segmentation {
            wound_mask,
            peri_wound_mask,
            source,
        })
    }

    fn fallback(&self, width: u32, height: u32, point: PixelPoint) -> crate::types::BinaryMask {
        circular_mask(width, height, point, self.config.fallback_radius_px)
    }
}
