//! Expected healing curve after Gilman: a circular wound whose radius shrinks
//! by a constant amount per day.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use wound_common::{Observation, TrajectoryData, utils::round_to};

use crate::error::{Result, positive};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TrajectoryConfig {
    /// Linear radial healing rate in cm per day
    pub healing_rate_cm_per_day: f64,
    /// Expected curves are never shorter than this many days
    pub min_curve_len: usize,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            healing_rate_cm_per_day: 0.05,
            min_curve_len: 7,
        }
    }
}

impl TrajectoryConfig {
    pub fn validate(&self) -> Result<()> {
        positive("healing_rate_cm_per_day", self.healing_rate_cm_per_day)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GilmanModel {
    config: TrajectoryConfig,
}

impl GilmanModel {
    pub fn new(config: TrajectoryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrajectoryConfig {
        &self.config
    }

    /// Equivalent-circle radius on `day`, never negative
    pub fn radius_at(&self, baseline_area: f64, day: usize) -> f64 {
        if !(baseline_area > 0.0 && baseline_area.is_finite()) {
            return 0.0;
        }
        let r0 = (baseline_area / PI).sqrt();
        (r0 - self.config.healing_rate_cm_per_day * day as f64).max(0.0)
    }

    pub fn expected_area(&self, baseline_area: f64, day: usize) -> f64 {
        let r = self.radius_at(baseline_area, day);
        round_to(PI * r * r, 2)
    }

    /// Expected areas for days `0..max(observations, min_curve_len)`
    pub fn expected_curve(&self, baseline_area: f64, observation_count: usize) -> Vec<f64> {
        let len = observation_count.max(self.config.min_curve_len);
        (0..len).map(|day| self.expected_area(baseline_area, day)).collect()
    }

    /// Expected versus observed areas for a session history
    pub fn trajectory(&self, history: &[Observation]) -> TrajectoryData {
        let baseline = history.first().map(|o| o.area_cm2).unwrap_or(0.0);
        TrajectoryData {
            expected: self.expected_curve(baseline, history.len()),
            actual: history.iter().map(|o| o.area_cm2).collect(),
        }
    }
}

/// `actual[-1] - expected[len(actual) - 1]`; 0 on the baseline day or when the
/// curves do not line up
pub fn deviation(trajectory: &TrajectoryData) -> f64 {
    if trajectory.actual.len() < 2 {
        return 0.0;
    }
    let index = trajectory.actual.len() - 1;
    match (trajectory.actual.last(), trajectory.expected.get(index)) {
        (Some(actual), Some(expected)) => round_to(actual - expected, 2),
        _ => 0.0,
    }
}
