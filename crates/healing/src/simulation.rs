//! Hypothetical healing simulation.
//!
//! Everything here is derived from a finished [`MeasurementResult`] through a
//! shared borrow and returned as a separate [`SimulationResult`]. Nothing flows
//! back into the measurement.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;
use wound_common::{Confidence, MeasurementResult, PatientMetadata, SimulationResult, utils::round_to};

use crate::error::{HealingError, Result, non_negative, positive};

pub const BASE_MODEL_ASSUMPTION: &str = "Base healing model (no metadata)";
pub const REFERENCE_OBJECT_ASSUMPTION: &str = "Reference-normalized area (1-euro coin benchmark)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SimulationConfig {
    /// Healing velocity multiplier for smokers
    pub smoking_factor: f64,
    /// Healing velocity multiplier for diabetic patients
    pub diabetes_factor: f64,
    /// Area scale applied when a reference object is visible
    pub reference_object_factor: f64,
    /// Linear radial healing rate in cm per day
    pub base_rate_cm_per_day: f64,
    /// Points appended past the reference curve
    pub extrapolation_steps: usize,
    pub completion_min_factor: f64,
    pub completion_max_factor: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            smoking_factor: 0.80,
            diabetes_factor: 0.70,
            reference_object_factor: 0.98,
            base_rate_cm_per_day: 0.05,
            extrapolation_steps: 3,
            completion_min_factor: 0.8,
            completion_max_factor: 1.5,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        non_negative("smoking_factor", self.smoking_factor)?;
        non_negative("diabetes_factor", self.diabetes_factor)?;
        positive("reference_object_factor", self.reference_object_factor)?;
        positive("base_rate_cm_per_day", self.base_rate_cm_per_day)?;
        non_negative("completion_min_factor", self.completion_min_factor)?;
        non_negative("completion_max_factor", self.completion_max_factor)?;
        if self.completion_max_factor < self.completion_min_factor {
            return Err(HealingError::InvalidParameter {
                field: "completion_max_factor",
                value: self.completion_max_factor,
                expected: ">= completion_min_factor",
            });
        }
        Ok(())
    }
}

fn velocity_assumption(label: &str, factor: f64) -> String {
    format!("{label} adjustment: -{:.0}% healing velocity", (1.0 - factor) * 100.0)
}

/// Same curve, with every step away from the first point scaled by `velocity_multiplier`
pub fn reference_curve(expected: &[f64], velocity_multiplier: f64) -> Vec<f64> {
    let Some(&baseline) = expected.first() else {
        return Vec::new();
    };
    expected
        .iter()
        .map(|&v| round_to(baseline + (v - baseline) * velocity_multiplier, 2))
        .collect()
}

/// `curve` followed by `steps` points continuing the slope of its last two
/// points, floored at zero
pub fn extrapolate_curve(curve: &[f64], steps: usize) -> Vec<f64> {
    let [.., second_last, last] = curve else {
        return curve.to_vec();
    };
    let slope = last - second_last;
    curve
        .iter()
        .copied()
        .chain((1..=steps).map(|i| round_to((last + slope * i as f64).max(0.0), 2)))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct SimulationEngine {
    config: SimulationConfig,
}

impl SimulationEngine {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Product of the velocity factors that apply to this patient
    pub fn velocity_multiplier(&self, metadata: &PatientMetadata) -> f64 {
        let mut multiplier = 1.0;
        if metadata.is_smoker {
            multiplier *= self.config.smoking_factor;
        }
        if metadata.has_diabetes {
            multiplier *= self.config.diabetes_factor;
        }
        multiplier
    }

    /// `[min, max]` days until closure; `[0, 0]` when the adjusted rate is zero
    pub fn completion_window(&self, simulated_area: f64, velocity_multiplier: f64) -> [f64; 2] {
        let adjusted_rate = self.config.base_rate_cm_per_day * velocity_multiplier;
        if adjusted_rate <= 0.0 {
            return [0.0, 0.0];
        }
        let projected = simulated_area / (adjusted_rate * 2.0);
        [
            round_to(projected * self.config.completion_min_factor, 1),
            round_to(projected * self.config.completion_max_factor, 1),
        ]
    }

    pub fn run_simulation(&self, measurement: &MeasurementResult, metadata: &PatientMetadata) -> SimulationResult {
        let mut assumptions = Vec::new();

        let velocity_multiplier = self.velocity_multiplier(metadata);
        if metadata.is_smoker {
            assumptions.push(velocity_assumption("Smoking", self.config.smoking_factor));
        }
        if metadata.has_diabetes {
            assumptions.push(velocity_assumption("Diabetes", self.config.diabetes_factor));
        }

        let mut simulated_area = measurement.area_cm2;
        if metadata.has_reference_object {
            simulated_area *= self.config.reference_object_factor;
            assumptions.push(REFERENCE_OBJECT_ASSUMPTION.to_string());
        }

        if assumptions.is_empty() {
            assumptions.push(BASE_MODEL_ASSUMPTION.to_string());
        }

        let reference_curve = reference_curve(&measurement.trajectory.expected, velocity_multiplier);
        let extrapolated_curve = extrapolate_curve(&reference_curve, self.config.extrapolation_steps);
        let completion_window_days = self.completion_window(simulated_area, velocity_multiplier);

        debug!(velocity_multiplier, simulated_area, "simulation computed");

        SimulationResult {
            enabled: true,
            assumptions_used: assumptions,
            simulated_area_cm2: round_to(simulated_area, 2),
            reference_curve,
            extrapolated_curve,
            completion_window_days,
            confidence: Confidence::Low,
        }
    }

    /// Placeholder for callers that opted out of simulation
    pub fn disabled(measurement: &MeasurementResult) -> SimulationResult {
        SimulationResult {
            enabled: false,
            assumptions_used: Vec::new(),
            simulated_area_cm2: measurement.area_cm2,
            reference_curve: Vec::new(),
            extrapolated_curve: Vec::new(),
            completion_window_days: [0.0, 0.0],
            confidence: Confidence::Low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wound_common::{RiskLevel, TrajectoryData};

    fn measurement(expected: Vec<f64>) -> MeasurementResult {
        MeasurementResult {
            area_cm2: 12.0,
            redness_pct: 10.0,
            pus_pct: 1.0,
            risk_level: Some(RiskLevel::Green),
            alert: false,
            alert_reason: None,
            alert_reasons: vec!["Baseline observation established".to_string()],
            area_change_pct: 0.0,
            trajectory: TrajectoryData {
                expected,
                actual: vec![12.0],
            },
            deviation_cm2: 0.0,
        }
    }

    #[test]
    fn test_smoker_scales_reference_curve() {
        let engine = SimulationEngine::default();
        let m = measurement(vec![12.0, 11.41, 10.84, 10.29]);
        let metadata = PatientMetadata {
            is_smoker: true,
            ..Default::default()
        };

        let result = engine.run_simulation(&m, &metadata);
        assert!(result.enabled);
        assert_eq!(result.reference_curve[0], 12.0);
        assert_eq!(result.reference_curve[1], round_to(12.0 + (11.41 - 12.0) * 0.8, 2));
        assert_eq!(result.assumptions_used, vec!["Smoking adjustment: -20% healing velocity".to_string()]);
        assert_eq!(result.simulated_area_cm2, 12.0);
        assert_eq!(result.confidence, Confidence::Low);
    }

    #[test]
    fn test_all_factors_applied() {
        let engine = SimulationEngine::default();
        let metadata = PatientMetadata {
            is_smoker: true,
            has_diabetes: true,
            has_reference_object: true,
            ..Default::default()
        };
        assert!((engine.velocity_multiplier(&metadata) - 0.56).abs() < 1e-12);

        let result = engine.run_simulation(&measurement(vec![12.0, 11.41]), &metadata);
        assert_eq!(result.assumptions_used.len(), 3);
        assert_eq!(result.assumptions_used[1], "Diabetes adjustment: -30% healing velocity");
        assert_eq!(result.assumptions_used[2], REFERENCE_OBJECT_ASSUMPTION);
        assert_eq!(result.simulated_area_cm2, 11.76);
    }

    #[test]
    fn test_no_metadata_uses_base_model() {
        let engine = SimulationEngine::default();
        let result = engine.run_simulation(&measurement(vec![12.0, 11.41]), &PatientMetadata::default());
        assert_eq!(result.assumptions_used, vec![BASE_MODEL_ASSUMPTION.to_string()]);
        assert_eq!(result.reference_curve, vec![12.0, 11.41]);
        // 12 / (0.05 * 2) = 120 days
        assert_eq!(result.completion_window_days, [96.0, 180.0]);
    }

    #[test]
    fn test_extrapolation_continues_slope() {
        let reference = vec![12.0, 11.5, 11.0];
        let extrapolated = extrapolate_curve(&reference, 3);
        assert_eq!(extrapolated.len(), 6);
        assert_eq!(&extrapolated[..3], &reference[..]);

        let first_extension = extrapolated[3];
        assert!(((first_extension - 11.0) - (11.0 - 11.5)).abs() < 1e-9);
        assert_eq!(&extrapolated[3..], &[10.5, 10.0, 9.5]);
    }

    #[test]
    fn test_extrapolation_floors_at_zero() {
        assert_eq!(extrapolate_curve(&[2.0, 1.0], 3), vec![2.0, 1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_short_curves() {
        assert!(reference_curve(&[], 0.5).is_empty());
        assert_eq!(extrapolate_curve(&[4.0], 3), vec![4.0]);
        assert!(extrapolate_curve(&[], 3).is_empty());
    }

    #[test]
    fn test_zero_rate_gives_empty_window() {
        let engine = SimulationEngine::new(SimulationConfig {
            base_rate_cm_per_day: 0.0,
            ..Default::default()
        });
        assert_eq!(engine.completion_window(12.0, 1.0), [0.0, 0.0]);
    }

    #[test]
    fn test_measurement_unchanged_by_simulation() {
        let engine = SimulationEngine::default();
        let m = measurement(vec![12.0, 11.41, 10.84]);
        let before = m.clone();
        let metadata = PatientMetadata {
            is_smoker: true,
            has_diabetes: true,
            has_reference_object: true,
            age: Some(71),
            surgery_type: Some("abdominal".to_string()),
        };
        let _ = engine.run_simulation(&m, &metadata);
        assert_eq!(m.area_cm2.to_bits(), before.area_cm2.to_bits());
        assert_eq!(m.redness_pct.to_bits(), before.redness_pct.to_bits());
        assert_eq!(m.pus_pct.to_bits(), before.pus_pct.to_bits());
        assert_eq!(m, before);
    }

    #[test]
    fn test_disabled_simulation() {
        let m = measurement(vec![12.0]);
        let result = SimulationEngine::disabled(&m);
        assert!(!result.enabled);
        assert!(result.reference_curve.is_empty());
        assert!(result.extrapolated_curve.is_empty());
        assert_eq!(result.simulated_area_cm2, 12.0);
        assert_eq!(result.completion_window_days, [0.0, 0.0]);
    }

    #[test]
    fn test_config_validation() {
        assert!(SimulationConfig::default().validate().is_ok());

        let config = SimulationConfig {
            smoking_factor: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(HealingError::InvalidParameter { field: "smoking_factor", .. })
        ));

        let config = SimulationConfig {
            base_rate_cm_per_day: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SimulationConfig {
            completion_min_factor: 2.0,
            completion_max_factor: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
