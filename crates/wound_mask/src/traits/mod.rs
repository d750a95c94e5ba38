use image::RgbImage;
use wound_common::PixelPoint;

use crate::{error::OracleError, types::CandidateMask};

/// Point-prompt segmentation model, treated as an opaque oracle
pub trait SegmentationOracle: Send + Sync {
    /// Human-readable name used in logs
    fn name(&self) -> &str {
        "segmentation-oracle"
    }

    /// Load weights or otherwise prepare the model. Called at most once.
    fn load(&self) -> Result<(), OracleError>;

    /// Propose masks for the region containing `point`
    fn predict(&self, image: &RgbImage, point: PixelPoint) -> Result<Vec<CandidateMask>, OracleError>;
}
