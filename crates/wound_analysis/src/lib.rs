//! # Wound Analysis
//!
//! End-to-end photograph analysis: segmentation from [`wound_mask`], session
//! history, trajectory, risk and simulation from [`healing`], assembled into a
//! [`LayeredResult`](wound_common::LayeredResult) that keeps the measured
//! values and the hypothetical simulation apart.
//!
//! ```rust,no_run
//! use wound_analysis::{AnalysisConfig, AnalysisRequest, WoundAnalyzer, WoundImage};
//!
//! let analyzer = WoundAnalyzer::without_model(AnalysisConfig::default());
//! let image = WoundImage::open("day1.jpg")?;
//! let result = analyzer.analyze(AnalysisRequest::new(image).with_session("patient-7"))?;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod analyzer;
pub mod assembler;
pub mod config;
pub mod error;
pub mod input;

pub use analyzer::{AnalysisOutcome, AnalysisRequest, DEFAULT_SESSION_ID, HealthReport, WoundAnalyzer};
pub use assembler::{GENERIC_ALERT_REASON, LIMITATIONS, ResponseAssembler, ResponseOptions};
pub use config::{AnalysisConfig, load_file};
pub use error::{AnalysisError, ConfigError, Result};
pub use input::{WoundImage, decode_base64_image};
