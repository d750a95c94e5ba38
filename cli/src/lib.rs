use sam_oracle::ScriptOracle;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use wound_common::PixelPoint;
use wound_mask::{InferenceService, Segmentation};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid point '{0}', expected 'x,y'")]
    InvalidPoint(String),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    ImageError(#[from] image::ImageError),
}

/// Parse a prompt point written as `x,y`
pub fn parse_point(value: &str) -> Result<PixelPoint, CliError> {
    let invalid = || CliError::InvalidPoint(value.to_string());
    let (x, y) = value.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse().map_err(|_| invalid())?;
    let y = y.trim().parse().map_err(|_| invalid())?;
    Ok(PixelPoint::new(x, y))
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct EnvelopeFlags {
    pub research_mode: bool,
}

/// Body printed instead of a result when analysis fails
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ErrorEnvelope {
    pub error: String,
    pub reason: String,
    pub flags: EnvelopeFlags,
}

impl ErrorEnvelope {
    /// The underlying error is only exposed in demo mode
    pub fn new(error: impl std::fmt::Display, demo_mode: bool) -> Self {
        Self {
            error: "Analysis failed".to_string(),
            reason: if demo_mode {
                error.to_string()
            } else {
                "Internal processing error".to_string()
            },
            flags: EnvelopeFlags { research_mode: true },
        }
    }
}

/// Model-backed inference when a predictor script is given, fallback-only otherwise
pub fn build_inference(script: Option<PathBuf>, uv_env: Option<PathBuf>, interpreter: Option<String>) -> InferenceService {
    match script {
        Some(script) => {
            let mut oracle = ScriptOracle::new(script, uv_env);
            if let Some(interpreter) = interpreter {
                oracle = oracle.with_interpreter(interpreter);
            }
            InferenceService::new(oracle)
        }
        None => InferenceService::unavailable(),
    }
}

/// Save the wound and peri-wound masks of one analysis as PNGs
pub fn write_masks(dir: &Path, stem: &str, segmentation: &Segmentation) -> Result<(PathBuf, PathBuf), CliError> {
    fs::create_dir_all(dir)?;
    let wound_path = dir.join(format!("{stem}_wound.png"));
    let peri_path = dir.join(format!("{stem}_peri_wound.png"));
    segmentation.wound_mask.to_visual().save(&wound_path)?;
    segmentation.peri_wound_mask.to_visual().save(&peri_path)?;
    Ok((wound_path, peri_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wound_mask::Segmenter;

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("320,240").unwrap(), PixelPoint::new(320, 240));
        assert_eq!(parse_point(" 3 , 4 ").unwrap(), PixelPoint::new(3, 4));
        assert!(matches!(parse_point("320"), Err(CliError::InvalidPoint(_))));
        assert!(parse_point("-1,2").is_err());
        assert!(parse_point("a,b").is_err());
    }

    #[test]
    fn test_error_envelope_hides_reason_outside_demo() {
        let error = std::io::Error::other("disk on fire");
        let hidden = ErrorEnvelope::new(&error, false);
        assert_eq!(hidden.error, "Analysis failed");
        assert_eq!(hidden.reason, "Internal processing error");
        assert!(hidden.flags.research_mode);

        let shown = ErrorEnvelope::new(&error, true);
        assert_eq!(shown.reason, "disk on fire");

        let json = serde_json::to_value(&shown).unwrap();
        assert_eq!(json["flags"]["research_mode"], true);
    }

    #[test]
    fn test_missing_script_means_no_model() {
        let inference = build_inference(Some(PathBuf::from("/no/such/predict.py")), None, None);
        assert!(!inference.ensure_loaded());
        assert!(!build_inference(None, None, None).ensure_loaded());
    }

    #[test]
    fn test_write_masks() {
        let dir = tempfile::tempdir().unwrap();
        let image = image::RgbImage::new(120, 100);
        let segmentation = Segmenter::builder()
            .build()
            .segment(&image, PixelPoint::new(60, 50), true)
            .expect("Should segment");

        let (wound, peri) = write_masks(dir.path(), "day_1", &segmentation).expect("Should write masks");
        assert!(wound.is_file());
        assert!(peri.is_file());
        let reloaded = image::open(&wound).unwrap().to_luma8();
        assert_eq!(reloaded.get_pixel(60, 50).0[0], 255);
    }
}
