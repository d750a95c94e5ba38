use crate::{
    inference::InferenceService,
    pipeline::{SegmentationConfig, Segmenter},
    traits::SegmentationOracle,
};

/// Builder for creating segmenters with a fluent API
pub struct SegmenterBuilder {
    oracle: Option<Box<dyn SegmentationOracle>>,
    config: SegmentationConfig,
}

impl SegmenterBuilder {
    /// Create a new segmenter builder without a model
    pub fn new() -> Self {
        Self {
            oracle: None,
            config: SegmentationConfig::default(),
        }
    }

    /// Set the segmentation oracle (replaces any existing one)
    pub fn with_oracle<O>(mut self, oracle: O) -> Self
    where
        O: SegmentationOracle + 'static,
    {
        self.oracle = Some(Box::new(oracle));
        self
    }

    /// Set an already boxed oracle, or clear it with `None`
    pub fn with_boxed_oracle(mut self, oracle: Option<Box<dyn SegmentationOracle>>) -> Self {
        self.oracle = oracle;
        self
    }

    /// Replace the whole geometry configuration
    pub fn with_config(mut self, config: SegmentationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn fallback_radius(mut self, radius_px: u32) -> Self {
        self.config.fallback_radius_px = radius_px;
        self
    }

    pub fn peri_wound_radius(mut self, radius_px: u8) -> Self {
        self.config.peri_wound_radius_px = radius_px;
        self
    }

    pub fn max_coverage(mut self, max_coverage: f64) -> Self {
        self.config.max_coverage = max_coverage;
        self
    }

    pub fn build(self) -> Segmenter {
        Segmenter::new(InferenceService::from_boxed(self.oracle), self.config)
    }
}

impl Default for SegmenterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
