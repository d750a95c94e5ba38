use imageproc::{distance_transform::Norm, morphology::dilate};

use crate::types::BinaryMask;

/// Ring around the wound: `dilate(wound, radius) \ wound`.
///
/// Dilation uses the L∞ norm, so the ring is `radius` pixels wide in every
/// axis direction.
pub fn peri_wound_mask(wound: &BinaryMask, radius: u8) -> BinaryMask {
    let dilated = dilate(wound.as_image(), Norm::LInf, radius);
    let (width, height) = wound.dimensions();
    let mut ring = BinaryMask::empty(width, height);
    for (x, y, pixel) in dilated.enumerate_pixels() {
        if pixel.0[0] != 0 && !wound.is_set(x, y) {
            ring.set(x, y, true);
        }
    }
    ring
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::circular_mask;
    use wound_common::PixelPoint;

    #[test]
    fn test_ring_is_disjoint_from_wound() {
        let wound = circular_mask(200, 200, PixelPoint::new(100, 100), 30);
        let ring = peri_wound_mask(&wound, 15);
        assert_eq!(wound.overlap(&ring), 0);
        assert!(ring.count() > 0);
    }

    #[test]
    fn test_ring_equals_dilation_minus_wound() {
        let mut wound = BinaryMask::empty(60, 40);
        for y in 10..20 {
            for x in 5..25 {
                wound.set(x, y, true);
            }
        }
        wound.set(50, 30, true);

        let ring = peri_wound_mask(&wound, 3);
        let dilated = dilate(wound.as_image(), Norm::LInf, 3);
        for (x, y, pixel) in dilated.enumerate_pixels() {
            let expected = pixel.0[0] != 0 && !wound.is_set(x, y);
            assert_eq!(ring.is_set(x, y), expected, "mismatch at ({x}, {y})");
        }
    }

    #[test]
    fn test_square_ring_width() {
        let mut wound = BinaryMask::empty(50, 50);
        wound.set(25, 25, true);
        let ring = peri_wound_mask(&wound, 2);
        // 5x5 block minus the centre
        assert_eq!(ring.count(), 24);
        assert!(ring.is_set(23, 23));
        assert!(!ring.is_set(22, 25));
    }

    #[test]
    fn test_empty_wound_gives_empty_ring() {
        let wound = BinaryMask::empty(30, 30);
        assert!(peri_wound_mask(&wound, 10).is_empty());
    }

    #[test]
    fn test_ring_values_are_binary() {
        let wound = circular_mask(80, 80, PixelPoint::new(40, 40), 10);
        let ring = peri_wound_mask(&wound, 5);
        assert!(ring.as_image().pixels().all(|p| p.0[0] <= 1));
    }
}
