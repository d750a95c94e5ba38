use crate::types::{BinaryMask, MaskRejection};

/// Accept a model mask only if it matches the image, is non-empty and does not
/// cover more than `max_coverage` of the image.
pub fn validate_mask(
    mask: &BinaryMask,
    width: u32,
    height: u32,
    max_coverage: f64,
) -> Result<(), MaskRejection> {
    if mask.dimensions() != (width, height) {
        return Err(MaskRejection::ShapeMismatch {
            expected: (width, height),
            actual: mask.dimensions(),
        });
    }
    if mask.is_empty() {
        return Err(MaskRejection::Empty);
    }
    let coverage = mask.coverage();
    if coverage > max_coverage {
        return Err(MaskRejection::Oversized {
            coverage,
            limit: max_coverage,
        });
    }
    Ok(())
}
