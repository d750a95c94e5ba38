use std::sync::Arc;

use healing::SessionStore;
use serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use tracing::{debug, info};
use wound_common::{LayeredResult, PatientMetadata, PixelPoint};
use wound_mask::{InferenceService, Segmentation, SegmentationOracle, Segmenter};

use crate::{
    assembler::{ResponseAssembler, ResponseOptions},
    config::AnalysisConfig,
    error::Result,
    input::WoundImage,
};

pub const DEFAULT_SESSION_ID: &str = "default_session";

/// One photograph to analyze
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub image: WoundImage,
    /// Prompt point; the image centre when absent
    pub point: Option<PixelPoint>,
    pub session_id: Option<String>,
    pub metadata: Option<PatientMetadata>,
    /// Falls back to the configured default when absent
    pub enable_simulation: Option<bool>,
}

impl AnalysisRequest {
    pub fn new(image: WoundImage) -> Self {
        Self {
            image,
            point: None,
            session_id: None,
            metadata: None,
            enable_simulation: None,
        }
    }

    pub fn with_point(mut self, point: PixelPoint) -> Self {
        self.point = Some(point);
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: PatientMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_simulation(mut self, enabled: bool) -> Self {
        self.enable_simulation = Some(enabled);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HealthReport {
    pub status: String,
    pub model_loaded: bool,
    pub simulation_enabled: bool,
    pub demo_mode: bool,
}

/// Layered result together with the masks it was measured on
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub result: LayeredResult,
    pub segmentation: Segmentation,
}

/// Segmentation, measurement, session tracking and simulation behind one call
pub struct WoundAnalyzer {
    segmenter: Segmenter,
    assembler: ResponseAssembler,
    config: AnalysisConfig,
}

impl WoundAnalyzer {
    pub fn new(inference: InferenceService, store: Arc<SessionStore>, config: AnalysisConfig) -> Self {
        let segmenter = Segmenter::new(inference, config.segmentation.clone());
        let assembler = ResponseAssembler::new(store, &config);
        Self {
            segmenter,
            assembler,
            config,
        }
    }

    /// Analyzer backed by `oracle` with a fresh session store
    pub fn with_oracle<O>(oracle: O, config: AnalysisConfig) -> Self
    where
        O: SegmentationOracle + 'static,
    {
        Self::new(InferenceService::new(oracle), Arc::new(SessionStore::new()), config)
    }

    /// Analyzer without a model; every photograph uses the circular fallback
    pub fn without_model(config: AnalysisConfig) -> Self {
        Self::new(InferenceService::unavailable(), Arc::new(SessionStore::new()), config)
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        self.assembler.store()
    }

    pub fn analyze(&self, request: AnalysisRequest) -> Result<LayeredResult> {
        self.analyze_with_masks(request).map(|outcome| outcome.result)
    }

    pub fn analyze_with_masks(&self, request: AnalysisRequest) -> Result<AnalysisOutcome> {
        let image = request.image.as_rgb();
        let (width, height) = image.dimensions();
        let point = request.point.unwrap_or_else(|| PixelPoint::center_of(width, height));
        let session_id = request.session_id.as_deref().unwrap_or(DEFAULT_SESSION_ID);
        let demo_mode = self.config.demo_mode;

        debug!(session_id, width, height, x = point.x, y = point.y, demo_mode, "analyzing photograph");
        let segmentation = self.segmenter.segment(image, point, demo_mode)?;

        let options = ResponseOptions {
            session_id,
            metadata: request.metadata.as_ref(),
            demo_mode,
            fallback_used: segmentation.used_fallback(),
            enable_simulation: request.enable_simulation.unwrap_or(self.config.enable_simulation),
        };
        let result = self.assembler.build_response(
            image,
            &segmentation.wound_mask,
            &segmentation.peri_wound_mask,
            &options,
        )?;

        Ok(AnalysisOutcome { result, segmentation })
    }

    /// Loads the model if that has not been attempted yet
    pub fn health(&self) -> HealthReport {
        let model_loaded = !self.config.demo_mode && self.segmenter.inference().ensure_loaded();
        HealthReport {
            status: "ok".to_string(),
            model_loaded,
            simulation_enabled: self.config.enable_simulation,
            demo_mode: self.config.demo_mode,
        }
    }

    pub fn clear_session(&self, session_id: &str) -> bool {
        let cleared = self.store().clear(session_id);
        info!(session_id, cleared, "session cleared");
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use wound_common::{RiskLevel, SegmentationSource};
    use wound_mask::{CandidateMask, OracleError};

    const TISSUE: Rgb<u8> = Rgb([150, 130, 120]);

    /// Returns a centred square of `side` pixels
    struct SquareOracle {
        side: u32,
    }

    impl SegmentationOracle for SquareOracle {
        fn load(&self) -> std::result::Result<(), OracleError> {
            Ok(())
        }

        fn predict(&self, image: &RgbImage, point: PixelPoint) -> std::result::Result<Vec<CandidateMask>, OracleError> {
            let mut mask = GrayImage::new(image.width(), image.height());
            let half = self.side / 2;
            for y in point.y - half..point.y - half + self.side {
                for x in point.x - half..point.x - half + self.side {
                    mask.put_pixel(x, y, Luma([255]));
                }
            }
            Ok(vec![CandidateMask { mask, score: 0.9 }])
        }
    }

    struct BrokenOracle;

    impl SegmentationOracle for BrokenOracle {
        fn load(&self) -> std::result::Result<(), OracleError> {
            Err(OracleError::Unavailable("weights missing".to_string()))
        }

        fn predict(&self, _: &RgbImage, _: PixelPoint) -> std::result::Result<Vec<CandidateMask>, OracleError> {
            unreachable!("never loaded")
        }
    }

    fn photo() -> WoundImage {
        WoundImage::from(RgbImage::from_pixel(640, 480, TISSUE))
    }

    #[test]
    fn test_demo_mode_uses_centred_circle() {
        let config = AnalysisConfig {
            demo_mode: true,
            ..Default::default()
        };
        let analyzer = WoundAnalyzer::with_oracle(SquareOracle { side: 20 }, config);
        let outcome = analyzer
            .analyze_with_masks(AnalysisRequest::new(photo()))
            .expect("Should analyze");

        assert!(outcome.segmentation.wound_mask.is_set(320, 240));
        assert!(outcome.segmentation.wound_mask.is_set(320 + 39, 240));
        assert!(!outcome.segmentation.wound_mask.is_set(320 + 45, 240));
        assert!(outcome.segmentation.peri_wound_mask.is_set(320 + 45, 240));

        let expected = std::f64::consts::PI * 40.0 * 40.0 / 120.0;
        let result = outcome.result;
        assert!((result.measurement.area_cm2 - expected).abs() / expected < 0.05);
        assert!(result.flags.demo_mode);
        assert!(result.flags.fallback_segmentation);
        assert_eq!(result.measurement.risk_level, None);
        assert!(!result.measurement.alert);
    }

    #[test]
    fn test_model_masks_feed_the_session() {
        let analyzer = WoundAnalyzer::with_oracle(SquareOracle { side: 38 }, AnalysisConfig::default());
        let first = analyzer
            .analyze(AnalysisRequest::new(photo()).with_session("p1"))
            .expect("Should analyze");
        assert_eq!(first.flags.segmentation_source, SegmentationSource::Model);
        assert_eq!(first.measurement.area_cm2, 12.0);
        assert_eq!(first.measurement.risk_level, Some(RiskLevel::Green));
        assert_eq!(first.measurement.deviation_cm2, 0.0);

        let second = analyzer
            .analyze(AnalysisRequest::new(photo()).with_session("p1"))
            .expect("Should analyze");
        assert_eq!(second.metadata.observation_count, 2);
        assert_eq!(second.measurement.trajectory.actual, vec![12.0, 12.0]);
        // unchanged area is not a decrease
        assert_eq!(second.measurement.risk_level, Some(RiskLevel::Green));
    }

    #[test]
    fn test_broken_model_falls_back() {
        let analyzer = WoundAnalyzer::with_oracle(BrokenOracle, AnalysisConfig::default());
        let result = analyzer
            .analyze(AnalysisRequest::new(photo()))
            .expect("Fallback keeps the pipeline alive");
        assert!(result.flags.fallback_segmentation);
        assert!(!result.flags.demo_mode);
        assert_eq!(result.measurement.risk_level, None);
        assert!(!analyzer.health().model_loaded);
    }

    #[test]
    fn test_default_session_and_clear() {
        let analyzer = WoundAnalyzer::without_model(AnalysisConfig::default());
        analyzer.analyze(AnalysisRequest::new(photo())).unwrap();
        assert_eq!(analyzer.store().len(DEFAULT_SESSION_ID), 1);
        assert!(analyzer.clear_session(DEFAULT_SESSION_ID));
        assert_eq!(analyzer.store().len(DEFAULT_SESSION_ID), 0);
    }

    #[test]
    fn test_point_outside_image_is_rejected() {
        let analyzer = WoundAnalyzer::without_model(AnalysisConfig::default());
        let request = AnalysisRequest::new(photo()).with_point(PixelPoint::new(640, 10));
        assert!(analyzer.analyze(request).is_err());
        assert_eq!(analyzer.store().len(DEFAULT_SESSION_ID), 0);
    }

    #[test]
    fn test_simulation_default_follows_config() {
        let analyzer = WoundAnalyzer::without_model(AnalysisConfig::default());
        let metadata = PatientMetadata {
            has_diabetes: true,
            ..Default::default()
        };
        let simulated = analyzer
            .analyze(AnalysisRequest::new(photo()).with_metadata(metadata.clone()))
            .unwrap();
        assert!(simulated.simulation.is_some());

        let opted_out = analyzer
            .analyze(AnalysisRequest::new(photo()).with_metadata(metadata).with_simulation(false))
            .unwrap();
        assert!(opted_out.simulation.is_none());
    }

    #[test]
    fn test_health_report() {
        let analyzer = WoundAnalyzer::with_oracle(SquareOracle { side: 10 }, AnalysisConfig::default());
        let report = analyzer.health();
        assert_eq!(report.status, "ok");
        assert!(report.model_loaded);
        assert!(report.simulation_enabled);
        assert!(!report.demo_mode);
    }
}
