use healing::{RiskThresholds, SimulationConfig, TrajectoryConfig};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use wound_mask::{MetricThresholds, SegmentationConfig};

use crate::error::ConfigError;

/// Every tunable of the pipeline. Missing keys take their defaults, so a
/// config file only needs the values it changes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Skip the model and always use the circular fallback
    pub demo_mode: bool,
    /// Default for requests that do not say whether to simulate
    pub enable_simulation: bool,
    pub segmentation: SegmentationConfig,
    pub metrics: MetricThresholds,
    pub trajectory: TrajectoryConfig,
    pub risk: RiskThresholds,
    pub simulation: SimulationConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            demo_mode: false,
            enable_simulation: true,
            segmentation: SegmentationConfig::default(),
            metrics: MetricThresholds::default(),
            trajectory: TrajectoryConfig::default(),
            risk: RiskThresholds::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(ConfigError::UnsupportedFileFormat),
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.segmentation.validate()?;
        self.metrics.validate()?;
        self.trajectory.validate()?;
        self.risk.validate()?;
        self.simulation.validate()?;
        Ok(())
    }

    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalysisConfig)
    }
}

/// Load any serde type from a `.toml` or `.json` file
pub fn load_file<T, P>(path: P) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path_ref = path.as_ref();
    match path_ref.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => Ok(toml::from_str(&fs::read_to_string(path_ref)?)?),
        Some("json") => Ok(serde_json::from_str(&fs::read_to_string(path_ref)?)?),
        _ => Err(ConfigError::UnsupportedFileFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wound_common::PatientMetadata;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AnalysisConfig::from_toml(
            r#"
            demo_mode = true

            [risk]
            red_redness_pct = 30.0
            "#,
        )
        .expect("Should parse partial config");

        assert!(config.demo_mode);
        assert!(config.enable_simulation);
        assert_eq!(config.risk.red_redness_pct, 30.0);
        assert_eq!(config.risk.amber_redness_pct, 15.0);
        assert_eq!(config.segmentation, SegmentationConfig::default());
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let mut config = AnalysisConfig::default();
        config.segmentation.fallback_radius_px = 25;
        config.metrics.pixels_per_cm2 = 200.0;

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(config.to_json().unwrap().as_bytes()).unwrap();

        let loaded = AnalysisConfig::from_file(file.path()).expect("Should load JSON config");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let config = AnalysisConfig::default();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(config.to_toml().unwrap().as_bytes()).unwrap();

        let loaded = AnalysisConfig::from_file(file.path()).expect("Should load TOML config");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        assert!(matches!(
            AnalysisConfig::from_file(file.path()),
            Err(ConfigError::UnsupportedFileFormat)
        ));
    }

    #[test]
    fn test_invalid_segmentation_rejected() {
        let result = AnalysisConfig::from_json(r#"{"segmentation": {"fallback_radius_px": 0}}"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let result = AnalysisConfig::from_toml("[simulation]\nsmoking_factor = nan\n");
        assert!(matches!(result, Err(ConfigError::InvalidModel(_))));

        let result = AnalysisConfig::from_toml("[risk]\nred_area_change_pct = inf\n");
        assert!(matches!(result, Err(ConfigError::InvalidModel(_))));

        let result = AnalysisConfig::from_toml("[trajectory]\nhealing_rate_cm_per_day = -0.1\n");
        assert!(matches!(result, Err(ConfigError::InvalidModel(_))));

        let result = AnalysisConfig::from_toml("[metrics]\npixels_per_cm2 = inf\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_load_metadata_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"is_smoker = true\nage = 64\n").unwrap();

        let metadata: PatientMetadata = load_file(file.path()).expect("Should load metadata");
        assert!(metadata.is_smoker);
        assert!(!metadata.has_diabetes);
        assert_eq!(metadata.age, Some(64));
    }
}
