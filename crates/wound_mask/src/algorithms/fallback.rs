use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_circle_mut;
use wound_common::PixelPoint;

use crate::types::BinaryMask;

/// Keep a circle of `radius` inside `[0, len)` along one axis. When the axis is
/// shorter than the circle the centre goes to the middle.
fn clamp_axis(value: u32, radius: u32, len: u32) -> u32 {
    if len <= radius.saturating_mul(2) {
        return len / 2;
    }
    value.clamp(radius, len - 1 - radius)
}

/// Centre actually used for a fallback circle prompted at `point`
pub fn fallback_center(point: PixelPoint, radius: u32, width: u32, height: u32) -> PixelPoint {
    PixelPoint::new(
        clamp_axis(point.x, radius, width),
        clamp_axis(point.y, radius, height),
    )
}

/// Deterministic filled circle used whenever model segmentation is unavailable
pub fn circular_mask(width: u32, height: u32, point: PixelPoint, radius: u32) -> BinaryMask {
    let mut canvas = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return BinaryMask::from_luma(&canvas);
    }
    let center = fallback_center(point, radius, width, height);
    draw_filled_circle_mut(
        &mut canvas,
        (center.x as i32, center.y as i32),
        radius as i32,
        Luma([1u8]),
    );
    BinaryMask::from_luma(&canvas)
}
