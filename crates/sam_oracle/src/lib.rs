//! Point-prompt segmentation through an external predictor script.
//!
//! The script is invoked as `python <script> --input <json> --params <json>`
//! (or through `uv run python ...`). It must print a single JSON document on
//! stdout:
//!
//! ```json
//! {"candidates": [{"mask_path": "mask_0.png", "score": 0.93}]}
//! ```
//!
//! Relative mask paths are resolved against the `output_dir` passed in the
//! input file.

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use image::RgbImage;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use wound_common::PixelPoint;
use wound_mask::{CandidateMask, OracleError, SegmentationOracle};

#[derive(Debug, Deserialize)]
struct ScriptResponse {
    candidates: Vec<ScriptCandidate>,
}

#[derive(Debug, Deserialize)]
struct ScriptCandidate {
    mask_path: PathBuf,
    score: f32,
}

pub struct ScriptOracle {
    script_path: PathBuf,
    uv_env_path: Option<PathBuf>,
    interpreter: String,
}

impl ScriptOracle {
    pub fn new(script_path: impl Into<PathBuf>, uv_env_path: Option<PathBuf>) -> Self {
        Self {
            script_path: script_path.into(),
            uv_env_path,
            interpreter: "python".to_string(),
        }
    }

    /// Run the script with something other than `python`
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    fn command(&self) -> Command {
        if let Some(uv_path) = &self.uv_env_path {
            let mut c = Command::new(uv_path);
            c.arg("run").arg(&self.interpreter).arg(&self.script_path);
            c
        } else {
            let mut c = Command::new(&self.interpreter);
            c.arg(&self.script_path);
            c
        }
    }
}

/// Parse the script's stdout and load every candidate mask as luma
fn read_candidates(stdout: &[u8], output_dir: &Path) -> Result<Vec<CandidateMask>, OracleError> {
    let response: ScriptResponse = serde_json::from_slice(stdout)
        .map_err(|e| OracleError::Protocol(format!("unexpected script output: {e}")))?;

    response
        .candidates
        .into_iter()
        .map(|candidate| {
            let path = if candidate.mask_path.is_absolute() {
                candidate.mask_path
            } else {
                output_dir.join(candidate.mask_path)
            };
            let mask = image::open(&path)?.to_luma8();
            Ok(CandidateMask {
                mask,
                score: candidate.score,
            })
        })
        .collect()
}

impl SegmentationOracle for ScriptOracle {
    fn name(&self) -> &str {
        "sam-script"
    }

    fn load(&self) -> Result<(), OracleError> {
        if !self.script_path.is_file() {
            return Err(OracleError::Unavailable(format!(
                "predictor script not found at {}",
                self.script_path.display()
            )));
        }
        Ok(())
    }

    fn predict(&self, image: &RgbImage, point: PixelPoint) -> Result<Vec<CandidateMask>, OracleError> {
        let workdir = tempfile::tempdir()?;
        let image_path = workdir.path().join("input.png");
        image.save(&image_path)?;

        let temp_input = tempfile::NamedTempFile::new()?;
        let temp_params = tempfile::NamedTempFile::new()?;

        // Write input data
        serde_json::to_writer(&temp_input, &json!({
            "image_path": image_path,
            "output_dir": workdir.path(),
        }))?;

        // Write parameters
        serde_json::to_writer(&temp_params, &json!({
            "point": [point.x, point.y],
            "multimask_output": true,
        }))?;

        debug!(script = %self.script_path.display(), x = point.x, y = point.y, "running predictor script");
        let output = self
            .command()
            .arg("--input")
            .arg(temp_input.path())
            .arg("--params")
            .arg(temp_params.path())
            .output()?;

        if !output.status.success() {
            return Err(OracleError::Inference(format!(
                "predictor script failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        read_candidates(&output.stdout, workdir.path())
    }
}
