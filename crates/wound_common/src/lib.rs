//! # Wound Common - Shared Types and Utilities
//!
//! The data model shared by every crate of the wound analysis workspace:
//! observations, patient metadata, the ground-truth measurement layer, the
//! hypothetical simulation layer and the layered result that carries both.
//!
//! ## Example
//!
//! ```rust
//! use wound_common::{PatientMetadata, RiskLevel, utils::round_to};
//!
//! let metadata = PatientMetadata { is_smoker: true, ..Default::default() };
//! assert!(metadata.has_any_factor());
//! assert_eq!(RiskLevel::Amber.to_string(), "AMBER");
//! assert_eq!(round_to(41.8879, 1), 41.9);
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

// Re-exports for convenience
pub use chrono::{DateTime, Utc};

/// Pixel coordinate used as a segmentation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct PixelPoint {
    pub x: u32,
    pub y: u32,
}

impl PixelPoint {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Centre pixel of a `width` x `height` grid
    pub fn center_of(width: u32, height: u32) -> Self {
        Self {
            x: width / 2,
            y: height / 2,
        }
    }

    /// Check whether this point addresses a pixel of a `width` x `height` grid
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.x < width && self.y < height
    }
}

/// Coarse risk tier. Ordering follows severity.
#[derive(
    Debug, Clone, Copy,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
    PartialEq, Eq, PartialOrd, Ord, Hash
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Green,
    Amber,
    Red,
}

/// Confidence attached to simulated output
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, IntoStaticStr,
    PartialEq, Eq
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    #[default]
    Low,
}

/// Where the wound mask of an analysis came from
#[derive(
    Debug, Clone, Copy,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, IntoStaticStr,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SegmentationSource {
    /// Mask produced by the segmentation model
    Model,
    /// Deterministic circular mask
    Fallback,
}

/// A single recorded measurement in a session timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Observation {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub area_cm2: f64,
    pub redness_pct: f64,
    pub pus_pct: f64,
    /// Where the wound mask behind `area_cm2` came from
    pub source: SegmentationSource,
}

impl Observation {
    /// Observation captured now
    pub fn new(session_id: &str, area_cm2: f64, redness_pct: f64, pus_pct: f64, source: SegmentationSource) -> Self {
        Self {
            session_id: session_id.to_string(),
            timestamp: Utc::now(),
            area_cm2,
            redness_pct,
            pus_pct,
            source,
        }
    }

    /// Area measured on a model mask rather than the geometry-blind fallback circle
    pub fn has_measured_area(&self) -> bool {
        self.source == SegmentationSource::Model
    }
}

/// Patient risk factors used only by the simulation layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PatientMetadata {
    pub is_smoker: bool,
    pub has_diabetes: bool,
    pub age: Option<u32>,
    pub surgery_type: Option<String>,
    /// A calibration object (e.g. a coin) is visible in the photograph
    pub has_reference_object: bool,
}

impl PatientMetadata {
    /// True when at least one factor that adjusts the simulation is set
    pub fn has_any_factor(&self) -> bool {
        self.is_smoker || self.has_diabetes || self.has_reference_object
    }
}

/// Expected versus observed wound area, in cm², indexed by day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrajectoryData {
    pub expected: Vec<f64>,
    pub actual: Vec<f64>,
}

/// Ground-truth measurement layer
///
/// Built once by the response assembler and never modified afterwards. The
/// simulation engine only ever receives a shared reference to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MeasurementResult {
    pub area_cm2: f64,
    pub redness_pct: f64,
    pub pus_pct: f64,
    /// `None` when the risk could not be evaluated (fallback segmentation)
    pub risk_level: Option<RiskLevel>,
    pub alert: bool,
    pub alert_reason: Option<String>,
    pub alert_reasons: Vec<String>,
    pub area_change_pct: f64,
    pub trajectory: TrajectoryData,
    pub deviation_cm2: f64,
}

impl MeasurementResult {
    /// Name of the first numeric field holding NaN or infinity, if any
    pub fn non_finite_field(&self) -> Option<&'static str> {
        let scalars = [
            ("area_cm2", self.area_cm2),
            ("redness_pct", self.redness_pct),
            ("pus_pct", self.pus_pct),
            ("area_change_pct", self.area_change_pct),
            ("deviation_cm2", self.deviation_cm2),
        ];
        if let Some((name, _)) = scalars.iter().find(|(_, v)| !v.is_finite()) {
            return Some(name);
        }
        if self.trajectory.expected.iter().any(|v| !v.is_finite()) {
            return Some("trajectory.expected");
        }
        if self.trajectory.actual.iter().any(|v| !v.is_finite()) {
            return Some("trajectory.actual");
        }
        None
    }
}

/// Hypothetical simulation layer derived from a measurement and patient metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SimulationResult {
    pub enabled: bool,
    pub assumptions_used: Vec<String>,
    pub simulated_area_cm2: f64,
    pub reference_curve: Vec<f64>,
    pub extrapolated_curve: Vec<f64>,
    /// `[min_days, max_days]`
    pub completion_window_days: [f64; 2],
    pub confidence: Confidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisFlags {
    pub demo_mode: bool,
    pub fallback_segmentation: bool,
    pub segmentation_source: SegmentationSource,
    pub research_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisMetadata {
    pub analysis_id: String,
    pub captured_at: DateTime<Utc>,
    /// 1-based day of this observation within its session
    pub day_index: usize,
    pub observation_count: usize,
}

/// Complete analysis output: measurement and simulation kept side by side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LayeredResult {
    pub measurement: MeasurementResult,
    pub simulation: Option<SimulationResult>,
    pub limitations: Vec<String>,
    pub flags: AnalysisFlags,
    pub metadata: AnalysisMetadata,
}

impl LayeredResult {
    /// Get the JSON schema of the layered result
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(LayeredResult)
    }
}

/// Numeric helpers shared by the measurement and simulation layers
pub mod utils {
    /// Round half away from zero to `decimals` places
    pub fn round_to(value: f64, decimals: i32) -> f64 {
        let factor = 10f64.powi(decimals);
        (value * factor).round() / factor
    }

    /// Clamp a percentage into `[0, 100]`, mapping NaN to 0
    pub fn clamp_pct(value: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        value.clamp(0.0, 100.0)
    }

    /// `part / whole` as a clamped percentage rounded to one decimal, 0 when `whole` is 0
    pub fn percentage(part: u64, whole: u64) -> f64 {
        if whole == 0 {
            return 0.0;
        }
        round_to(clamp_pct(part as f64 / whole as f64 * 100.0), 1)
    }
}
