//! # Wound Mask Segmentation and Region Metrics
//!
//! Turns a photograph and a prompt point into a wound mask, the ring of skin
//! around it, and the colour metrics measured inside both regions.
//!
//! ## Core Features
//!
//! - **Oracle-based segmentation**: any point-prompt model plugs in through
//!   the [`SegmentationOracle`] trait and is loaded at most once
//! - **Deterministic fallback**: a fixed-radius circle replaces the model mask
//!   in demo mode or whenever the model cannot deliver a valid mask
//! - **Peri-wound ring**: `dilate(wound, r) \ wound`, disjoint by construction
//! - **Region metrics**: area, peri-wound redness and wound exudate
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wound_mask::{MetricExtractor, Segmenter};
//! use wound_common::PixelPoint;
//!
//! let segmenter = Segmenter::builder().build();
//! let image = image::open("wound.jpg")?.to_rgb8();
//! let point = PixelPoint::center_of(image.width(), image.height());
//!
//! let segmentation = segmenter.segment(&image, point, false)?;
//! let metrics = MetricExtractor::default().extract(
//!     &image,
//!     &segmentation.wound_mask,
//!     &segmentation.peri_wound_mask,
//! )?;
//! println!("{} cm², {}% red", metrics.area_cm2, metrics.redness_pct);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod inference;
pub mod pipeline;
pub mod metrics;

// Re-exports for convenience
pub use error::{MaskError, OracleError, Result};
pub use types::{BinaryMask, CandidateMask, FallbackReason, MaskRejection, MaskSource, Segmentation};
pub use traits::*;
pub use algorithms::*;
pub use inference::{InferenceFailure, InferenceOutcome, InferenceService};
pub use pipeline::{SegmentationConfig, Segmenter, builder::SegmenterBuilder};
pub use metrics::{HueRange, MetricExtractor, MetricThresholds, RegionMetrics};

/// Radius of the circular fallback mask
pub const DEFAULT_FALLBACK_RADIUS_PX: u32 = 40;
/// Width of the peri-wound ring
pub const DEFAULT_PERI_WOUND_RADIUS_PX: u8 = 15;
/// Model masks covering more of the image than this are rejected
pub const DEFAULT_MAX_COVERAGE: f64 = 0.9;
