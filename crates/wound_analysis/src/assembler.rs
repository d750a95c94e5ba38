//! Builds the layered response: one immutable measurement, an optional
//! simulation derived from it, and the static research caveats.

use std::sync::Arc;

use chrono::Utc;
use healing::{GilmanModel, RiskEngine, SessionStore, SimulationEngine, deviation};
use image::RgbImage;
use tracing::{debug, info};
use uuid::Uuid;
use wound_common::{
    AnalysisFlags, AnalysisMetadata, LayeredResult, MeasurementResult, Observation, PatientMetadata,
    RiskLevel, SegmentationSource,
};
use wound_mask::{BinaryMask, MetricExtractor};

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};

pub const LIMITATIONS: [&str; 4] = [
    "Single-image analysis per capture",
    "No explicit image registration across observations",
    "Lighting normalized, not fully corrected",
    "Simulation outputs have LOW confidence",
];

/// Used when a non-green result has no rule reason attached
pub const GENERIC_ALERT_REASON: &str = "Wound monitoring indicates visual deviation from expected trend";

/// Per-request switches for [`ResponseAssembler::build_response`]
#[derive(Debug, Clone, Default)]
pub struct ResponseOptions<'a> {
    pub session_id: &'a str,
    pub metadata: Option<&'a PatientMetadata>,
    pub demo_mode: bool,
    /// This call's wound mask came from the circular fallback
    pub fallback_used: bool,
    pub enable_simulation: bool,
}

pub struct ResponseAssembler {
    store: Arc<SessionStore>,
    extractor: MetricExtractor,
    model: GilmanModel,
    risk: RiskEngine,
    simulation: SimulationEngine,
}

impl ResponseAssembler {
    pub fn new(store: Arc<SessionStore>, config: &AnalysisConfig) -> Self {
        Self {
            store,
            extractor: MetricExtractor::new(config.metrics.clone()),
            model: GilmanModel::new(config.trajectory.clone()),
            risk: RiskEngine::new(&config.risk),
            simulation: SimulationEngine::new(config.simulation.clone()),
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Measure one photograph, record it in its session and assemble the
    /// layered result.
    ///
    /// Non-finite metrics abort before the session is touched; a non-finite
    /// derived value rolls the new observation back.
    pub fn build_response(
        &self,
        image: &RgbImage,
        wound_mask: &BinaryMask,
        peri_wound_mask: &BinaryMask,
        options: &ResponseOptions<'_>,
    ) -> Result<LayeredResult> {
        let metrics = self.extractor.extract(image, wound_mask, peri_wound_mask)?;
        for (field, value) in [
            ("area_cm2", metrics.area_cm2),
            ("redness_pct", metrics.redness_pct),
            ("pus_pct", metrics.pus_pct),
        ] {
            if !value.is_finite() {
                return Err(AnalysisError::DataIntegrity { field });
            }
        }

        let segmentation_source = if options.fallback_used {
            SegmentationSource::Fallback
        } else {
            SegmentationSource::Model
        };
        let session_id = options.session_id;
        let observation = Observation::new(
            session_id,
            metrics.area_cm2,
            metrics.redness_pct,
            metrics.pus_pct,
            segmentation_source,
        );

        // The history is evaluated under the session lock; a failed guard
        // leaves the session as it was.
        let (observation_count, measurement) = self.store.record(observation, |history| {
            let trajectory = self.model.trajectory(history);
            let deviation_cm2 = deviation(&trajectory);
            let risk = self.risk.assess(history, options.fallback_used);

            let alert_reason = match (risk.risk_level, risk.alert_reasons.first()) {
                (_, Some(reason)) => Some(reason.clone()),
                (Some(RiskLevel::Amber | RiskLevel::Red), None) => Some(GENERIC_ALERT_REASON.to_string()),
                _ => None,
            };

            let measurement = MeasurementResult {
                area_cm2: metrics.area_cm2,
                redness_pct: metrics.redness_pct,
                pus_pct: metrics.pus_pct,
                risk_level: risk.risk_level,
                alert: risk.alert,
                alert_reason,
                alert_reasons: risk.alert_reasons,
                area_change_pct: risk.area_change_pct,
                trajectory,
                deviation_cm2,
            };
            match measurement.non_finite_field() {
                Some(field) => Err(AnalysisError::DataIntegrity { field }),
                None => Ok(measurement),
            }
        })?;

        let simulation = match options.metadata {
            Some(metadata) if options.enable_simulation => {
                Some(self.simulation.run_simulation(&measurement, metadata))
            }
            _ => None,
        };

        info!(
            session_id,
            observation_count,
            area_cm2 = measurement.area_cm2,
            risk = ?measurement.risk_level,
            source = %segmentation_source,
            "analysis assembled"
        );
        debug!(simulated = simulation.is_some(), deviation_cm2 = measurement.deviation_cm2, "response layers");

        Ok(LayeredResult {
            measurement,
            simulation,
            limitations: LIMITATIONS.iter().map(|s| s.to_string()).collect(),
            flags: AnalysisFlags {
                demo_mode: options.demo_mode,
                fallback_segmentation: options.fallback_used,
                segmentation_source,
                research_mode: true,
            },
            metadata: AnalysisMetadata {
                analysis_id: Uuid::new_v4().to_string(),
                captured_at: Utc::now(),
                day_index: observation_count,
                observation_count,
            },
        })
    }
}
