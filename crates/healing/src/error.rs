use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum HealingError {
    #[error("Invalid {field}: {value} ({expected})")]
    InvalidParameter {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, HealingError>;

/// `value` must be a finite number
pub(crate) fn finite(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(HealingError::InvalidParameter {
            field,
            value,
            expected: "finite",
        })
    }
}

/// `value` must be finite and strictly positive
pub(crate) fn positive(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(HealingError::InvalidParameter {
            field,
            value,
            expected: "finite and > 0",
        })
    }
}

/// `value` must be finite and not negative
pub(crate) fn non_negative(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(HealingError::InvalidParameter {
            field,
            value,
            expected: "finite and >= 0",
        })
    }
}
