//! Load-once wrapper around an injected [`SegmentationOracle`].
//!
//! The service never returns an error: every way the oracle can fail is
//! reported as an [`InferenceOutcome::Failed`] so the caller decides about the
//! fallback in plain sight.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::OnceLock,
};

use image::{RgbImage, imageops::FilterType};
use thiserror::Error;
use tracing::{debug, info, warn};
use wound_common::PixelPoint;

use crate::{
    algorithms::validation::validate_mask,
    traits::SegmentationOracle,
    types::{BinaryMask, CandidateMask, MaskRejection},
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceFailure {
    #[error("model not ready: {0}")]
    NotReady(String),
    #[error("oracle error: {0}")]
    Oracle(String),
    #[error("oracle panicked during inference")]
    Panicked,
    #[error("oracle returned no candidate masks")]
    NoCandidates,
    #[error("invalid mask: {0}")]
    InvalidMask(MaskRejection),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InferenceOutcome {
    Mask { mask: BinaryMask, score: f32 },
    Failed(InferenceFailure),
}

pub struct InferenceService {
    oracle: Option<Box<dyn SegmentationOracle>>,
    load_state: OnceLock<Result<(), String>>,
    max_coverage: f64,
}

impl InferenceService {
    pub fn new<O>(oracle: O) -> Self
    where
        O: SegmentationOracle + 'static,
    {
        Self::from_boxed(Some(Box::new(oracle)))
    }

    /// A service without a model: every inference fails and falls back
    pub fn unavailable() -> Self {
        Self::from_boxed(None)
    }

    pub(crate) fn from_boxed(oracle: Option<Box<dyn SegmentationOracle>>) -> Self {
        Self {
            oracle,
            load_state: OnceLock::new(),
            max_coverage: crate::DEFAULT_MAX_COVERAGE,
        }
    }

    pub(crate) fn set_max_coverage(&mut self, max_coverage: f64) {
        self.max_coverage = max_coverage;
    }

    /// Load the oracle on first use. Concurrent callers block until the single
    /// load attempt finishes; a failed load is remembered and not retried.
    pub fn ensure_loaded(&self) -> bool {
        self.load_state
            .get_or_init(|| match &self.oracle {
                None => Err("no segmentation oracle configured".to_string()),
                Some(oracle) => {
                    info!(oracle = oracle.name(), "loading segmentation model");
                    oracle.load().map_err(|e| {
                        warn!(oracle = oracle.name(), error = %e, "segmentation model failed to load");
                        e.to_string()
                    })
                }
            })
            .is_ok()
    }

    /// Whether a load has been attempted and succeeded
    pub fn is_ready(&self) -> bool {
        matches!(self.load_state.get(), Some(Ok(())))
    }

    pub fn infer(&self, image: &RgbImage, point: PixelPoint) -> InferenceOutcome {
        let Some(oracle) = self.oracle.as_ref() else {
            return InferenceOutcome::Failed(InferenceFailure::NotReady(
                "no segmentation oracle configured".to_string(),
            ));
        };
        if !self.ensure_loaded() {
            let reason = match self.load_state.get() {
                Some(Err(reason)) => reason.clone(),
                _ => "model not loaded".to_string(),
            };
            return InferenceOutcome::Failed(InferenceFailure::NotReady(reason));
        }

        let prediction = panic::catch_unwind(AssertUnwindSafe(|| oracle.predict(image, point)));
        let candidates = match prediction {
            Err(_) => return InferenceOutcome::Failed(InferenceFailure::Panicked),
            Ok(Err(e)) => return InferenceOutcome::Failed(InferenceFailure::Oracle(e.to_string())),
            Ok(Ok(candidates)) => candidates,
        };
        debug!(count = candidates.len(), "oracle returned candidates");

        let Some(best) = select_best(candidates) else {
            return InferenceOutcome::Failed(InferenceFailure::NoCandidates);
        };

        let mask = fit_to_image(&best, image.width(), image.height());
        match validate_mask(&mask, image.width(), image.height(), self.max_coverage) {
            Ok(()) => InferenceOutcome::Mask {
                mask,
                score: best.score,
            },
            Err(rejection) => InferenceOutcome::Failed(InferenceFailure::InvalidMask(rejection)),
        }
    }
}

/// Highest-scoring candidate; NaN scores rank lowest
pub fn select_best(candidates: Vec<CandidateMask>) -> Option<CandidateMask> {
    candidates.into_iter().max_by(|a, b| {
        let a = if a.score.is_nan() { f32::NEG_INFINITY } else { a.score };
        let b = if b.score.is_nan() { f32::NEG_INFINITY } else { b.score };
        a.total_cmp(&b)
    })
}

/// Nearest-neighbour resize to the image resolution, then binarize
pub fn fit_to_image(candidate: &CandidateMask, width: u32, height: u32) -> BinaryMask {
    let (w, h) = candidate.mask.dimensions();
    if (w, h) == (width, height) || w == 0 || h == 0 {
        return BinaryMask::from_luma(&candidate.mask);
    }
    let resized = image::imageops::resize(&candidate.mask, width, height, FilterType::Nearest);
    BinaryMask::from_luma(&resized)
}
