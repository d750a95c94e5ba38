//! Colorspace heuristics over the wound and peri-wound regions.
//!
//! HSV follows the 8-bit convention used by most vision toolkits: hue in
//! `[0, 180]` (degrees halved), saturation and value in `[0, 255]`.

use image::{Rgb, RgbImage};
use palette::{Hsv, IntoColor, Srgb};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use wound_common::utils::{percentage, round_to};

use crate::{
    error::{MaskError, Result},
    types::BinaryMask,
};

/// Inclusive hue interval on the `[0, 180]` scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HueRange {
    pub low: u8,
    pub high: u8,
}

impl HueRange {
    pub fn contains(&self, hue: u8) -> bool {
        (self.low..=self.high).contains(&hue)
    }
}

/// Calibration and colour thresholds (heuristic, not diagnostic)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MetricThresholds {
    /// Fixed pixel-to-area calibration
    pub pixels_per_cm2: f64,
    /// Red wraps around the hue circle, hence several ranges
    pub red_hue_ranges: Vec<HueRange>,
    /// Pale skin tones stay below this saturation
    pub red_saturation_min: u8,
    pub exudate_saturation_max: u8,
    pub exudate_value_min: u8,
}

impl Default for MetricThresholds {
    fn default() -> Self {
        Self {
            pixels_per_cm2: 120.0,
            red_hue_ranges: vec![
                HueRange { low: 0, high: 10 },
                HueRange { low: 170, high: 180 },
            ],
            red_saturation_min: 80,
            exudate_saturation_max: 60,
            exudate_value_min: 180,
        }
    }
}

impl MetricThresholds {
    pub fn validate(&self) -> Result<()> {
        if !(self.pixels_per_cm2.is_finite() && self.pixels_per_cm2 > 0.0) {
            return Err(MaskError::InvalidConfig("pixels_per_cm2 must be finite and positive".into()));
        }
        if let Some(range) = self.red_hue_ranges.iter().find(|r| r.low > r.high || r.high > 180) {
            return Err(MaskError::InvalidConfig(format!(
                "red hue range [{}, {}] must satisfy low <= high <= 180",
                range.low, range.high
            )));
        }
        Ok(())
    }
}

/// Metrics of one image plus the pixel counts they were derived from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RegionMetrics {
    pub area_cm2: f64,
    pub redness_pct: f64,
    pub pus_pct: f64,
    pub wound_pixels: u64,
    pub peri_wound_pixels: u64,
    pub red_pixels: u64,
    pub exudate_pixels: u64,
}

/// Convert an RGB pixel to 8-bit HSV
pub fn hsv_8bit(pixel: &Rgb<u8>) -> [u8; 3] {
    let rgb: Srgb<f32> = Srgb::new(pixel[0], pixel[1], pixel[2]).into_format();
    let hsv: Hsv = rgb.into_color();
    let hue = hsv.hue.into_positive_degrees() / 2.0;
    [
        hue.round().clamp(0.0, 180.0) as u8,
        (hsv.saturation * 255.0).round().clamp(0.0, 255.0) as u8,
        (hsv.value * 255.0).round().clamp(0.0, 255.0) as u8,
    ]
}

#[derive(Debug, Clone, Default)]
pub struct MetricExtractor {
    thresholds: MetricThresholds,
}

impl MetricExtractor {
    pub fn new(thresholds: MetricThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &MetricThresholds {
        &self.thresholds
    }

    fn is_red(&self, hsv: [u8; 3]) -> bool {
        hsv[1] >= self.thresholds.red_saturation_min
            && self.thresholds.red_hue_ranges.iter().any(|range| range.contains(hsv[0]))
    }

    fn is_exudate(&self, hsv: [u8; 3]) -> bool {
        hsv[1] <= self.thresholds.exudate_saturation_max && hsv[2] >= self.thresholds.exudate_value_min
    }

    /// Area, peri-wound redness and wound exudate for one image
    pub fn extract(
        &self,
        image: &RgbImage,
        wound_mask: &BinaryMask,
        peri_wound_mask: &BinaryMask,
    ) -> Result<RegionMetrics> {
        let dimensions = image.dimensions();
        for mask in [wound_mask, peri_wound_mask] {
            if mask.dimensions() != dimensions {
                return Err(MaskError::ShapeMismatch {
                    expected: dimensions,
                    actual: mask.dimensions(),
                });
            }
        }
        if !(self.thresholds.pixels_per_cm2 > 0.0 && self.thresholds.pixels_per_cm2.is_finite()) {
            return Err(MaskError::InvalidConfig("pixels_per_cm2 must be positive".into()));
        }

        let mut wound_pixels = 0u64;
        let mut peri_wound_pixels = 0u64;
        let mut red_pixels = 0u64;
        let mut exudate_pixels = 0u64;

        for (x, y, pixel) in image.enumerate_pixels() {
            let in_wound = wound_mask.is_set(x, y);
            let in_peri = peri_wound_mask.is_set(x, y);
            if !in_wound && !in_peri {
                continue;
            }
            let hsv = hsv_8bit(pixel);
            if in_wound {
                wound_pixels += 1;
                if self.is_exudate(hsv) {
                    exudate_pixels += 1;
                }
            }
            if in_peri {
                peri_wound_pixels += 1;
                if self.is_red(hsv) {
                    red_pixels += 1;
                }
            }
        }

        Ok(RegionMetrics {
            area_cm2: round_to(wound_pixels as f64 / self.thresholds.pixels_per_cm2, 1),
            redness_pct: percentage(red_pixels, peri_wound_pixels),
            pus_pct: percentage(exudate_pixels, wound_pixels),
            wound_pixels,
            peri_wound_pixels,
            red_pixels,
            exudate_pixels,
        })
    }
}
