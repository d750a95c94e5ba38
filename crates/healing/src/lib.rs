//! # Healing
//!
//! Longitudinal side of the wound pipeline: per-session observation history,
//! the expected Gilman healing curve, rule-based risk tiers and the
//! hypothetical simulation layer.
//!
//! ```rust
//! use healing::{GilmanModel, RiskEngine, SessionStore};
//! use wound_common::{RiskLevel, SegmentationSource};
//!
//! let store = SessionStore::new();
//! store.append("patient-1", 12.0, 10.0, 1.0, SegmentationSource::Model);
//! store.append("patient-1", 13.5, 10.0, 1.0, SegmentationSource::Model);
//!
//! let history = store.read("patient-1");
//! let trajectory = GilmanModel::default().trajectory(&history);
//! assert_eq!(trajectory.expected[0], 12.0);
//!
//! let risk = RiskEngine::default().assess(&history, false);
//! assert_eq!(risk.risk_level, Some(RiskLevel::Red));
//! ```

pub mod error;
pub mod risk;
pub mod session;
pub mod simulation;
pub mod trajectory;

pub use error::{HealingError, Result};
pub use risk::{RiskAssessment, RiskEngine, RiskMetric, RiskRule, RiskThresholds};
pub use session::SessionStore;
pub use simulation::{SimulationConfig, SimulationEngine};
pub use trajectory::{GilmanModel, TrajectoryConfig, deviation};
