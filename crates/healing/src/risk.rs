//! Rule-based risk tiers.
//!
//! Rules are plain data evaluated in a fixed order. The highest severity that
//! matches wins and only the reasons of that severity are reported, so a RED
//! result never carries AMBER reasons.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};
use wound_common::{Observation, RiskLevel, utils::round_to};

use crate::error::{Result, finite};

pub const PROGRESSING_REASON: &str = "Healing is progressing as expected";
pub const BASELINE_REASON: &str = "Baseline observation established";

/// Heuristic thresholds; values are strict lower bounds ("exceeds")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RiskThresholds {
    pub red_area_change_pct: f64,
    pub red_redness_pct: f64,
    pub red_pus_pct: f64,
    pub amber_area_change_pct: f64,
    pub amber_redness_pct: f64,
    pub amber_pus_pct: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            red_area_change_pct: 5.0,
            red_redness_pct: 25.0,
            red_pus_pct: 8.0,
            amber_area_change_pct: 0.0,
            amber_redness_pct: 15.0,
            amber_pus_pct: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum RiskMetric {
    AreaChangePct,
    RednessPct,
    PusPct,
}

/// Values a rule can look at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskInputs {
    pub area_change_pct: f64,
    pub redness_pct: f64,
    pub pus_pct: f64,
}

impl RiskInputs {
    fn get(&self, metric: RiskMetric) -> f64 {
        match metric {
            RiskMetric::AreaChangePct => self.area_change_pct,
            RiskMetric::RednessPct => self.redness_pct,
            RiskMetric::PusPct => self.pus_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskRule {
    pub severity: RiskLevel,
    pub metric: RiskMetric,
    pub threshold: f64,
    pub reason: String,
}

impl RiskRule {
    pub fn matches(&self, inputs: &RiskInputs) -> bool {
        inputs.get(self.metric) > self.threshold
    }
}

impl RiskThresholds {
    pub fn validate(&self) -> Result<()> {
        finite("red_area_change_pct", self.red_area_change_pct)?;
        finite("red_redness_pct", self.red_redness_pct)?;
        finite("red_pus_pct", self.red_pus_pct)?;
        finite("amber_area_change_pct", self.amber_area_change_pct)?;
        finite("amber_redness_pct", self.amber_redness_pct)?;
        finite("amber_pus_pct", self.amber_pus_pct)
    }

    /// Rules in evaluation order
    pub fn rules(&self) -> Vec<RiskRule> {
        let rule = |severity, metric, threshold: f64, reason: String| RiskRule {
            severity,
            metric,
            threshold,
            reason,
        };
        vec![
            rule(
                RiskLevel::Red,
                RiskMetric::AreaChangePct,
                self.red_area_change_pct,
                format!("Wound area increased by more than {}% since the previous observation", self.red_area_change_pct),
            ),
            rule(
                RiskLevel::Red,
                RiskMetric::RednessPct,
                self.red_redness_pct,
                format!("Peri-wound redness above {}%", self.red_redness_pct),
            ),
            rule(
                RiskLevel::Red,
                RiskMetric::PusPct,
                self.red_pus_pct,
                format!("Exudate coverage above {}% of the wound", self.red_pus_pct),
            ),
            rule(
                RiskLevel::Amber,
                RiskMetric::AreaChangePct,
                self.amber_area_change_pct,
                "Wound area not decreasing since the previous observation".to_string(),
            ),
            rule(
                RiskLevel::Amber,
                RiskMetric::RednessPct,
                self.amber_redness_pct,
                format!("Peri-wound redness above {}%", self.amber_redness_pct),
            ),
            rule(
                RiskLevel::Amber,
                RiskMetric::PusPct,
                self.amber_pus_pct,
                format!("Exudate coverage above {}% of the wound", self.amber_pus_pct),
            ),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// `None` means the risk was not evaluated
    pub risk_level: Option<RiskLevel>,
    pub alert: bool,
    pub alert_reasons: Vec<String>,
    pub area_change_pct: f64,
}

impl RiskAssessment {
    fn indeterminate() -> Self {
        Self {
            risk_level: None,
            alert: false,
            alert_reasons: Vec::new(),
            area_change_pct: 0.0,
        }
    }

    fn baseline() -> Self {
        Self {
            risk_level: Some(RiskLevel::Green),
            alert: false,
            alert_reasons: vec![BASELINE_REASON.to_string()],
            area_change_pct: 0.0,
        }
    }
}

/// Relative area change in percent; 0 when there is no usable previous area
pub fn area_change_pct(current: f64, previous: f64) -> f64 {
    if previous <= 0.0 || !previous.is_finite() {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

#[derive(Debug, Clone)]
pub struct RiskEngine {
    rules: Vec<RiskRule>,
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new(&RiskThresholds::default())
    }
}

impl RiskEngine {
    pub fn new(thresholds: &RiskThresholds) -> Self {
        Self::from_rules(thresholds.rules())
    }

    pub fn from_rules(rules: Vec<RiskRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[RiskRule] {
        &self.rules
    }

    /// Classify one observation against the previous one
    pub fn determine_risk(&self, current_area: f64, previous_area: f64, redness_pct: f64, pus_pct: f64) -> RiskAssessment {
        let inputs = RiskInputs {
            area_change_pct: area_change_pct(current_area, previous_area),
            redness_pct,
            pus_pct,
        };

        let matched: Vec<&RiskRule> = self.rules.iter().filter(|rule| rule.matches(&inputs)).collect();
        let area_change_pct = round_to(inputs.area_change_pct, 1);

        match matched.iter().map(|rule| rule.severity).max() {
            Some(severity) if severity > RiskLevel::Green => RiskAssessment {
                risk_level: Some(severity),
                alert: true,
                alert_reasons: matched
                    .iter()
                    .filter(|rule| rule.severity == severity)
                    .map(|rule| rule.reason.clone())
                    .collect(),
                area_change_pct,
            },
            _ => RiskAssessment {
                risk_level: Some(RiskLevel::Green),
                alert: false,
                alert_reasons: vec![PROGRESSING_REASON.to_string()],
                area_change_pct,
            },
        }
    }

    /// Classify the latest observation of a session history.
    ///
    /// A fallback mask says nothing about wound geometry, so its observation is
    /// left unclassified. The first observation of a session only establishes
    /// the baseline. When the previous observation came from the fallback
    /// there is no area to compare against and only the colour rules apply.
    pub fn assess(&self, history: &[Observation], fallback_used: bool) -> RiskAssessment {
        if fallback_used {
            return RiskAssessment::indeterminate();
        }
        match history {
            [] | [_] => RiskAssessment::baseline(),
            [.., previous, current] => {
                let previous_area = if previous.has_measured_area() { previous.area_cm2 } else { 0.0 };
                self.determine_risk(current.area_cm2, previous_area, current.redness_pct, current.pus_pct)
            }
        }
    }
}
