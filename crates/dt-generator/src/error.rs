//! Validation errors for [`crate::params::GenerationParams`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be >= 1, got {value}")]
    TooSmall { field: &'static str, value: u32 },

    #[error("{field} must lie within [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f64 },

    #[error("{field} range must have min <= max, got ({min}, {max})")]
    InvalidRange { field: &'static str, min: f64, max: f64 },

    #[error("{field} range values must be non-negative, got ({min}, {max})")]
    NegativeRange { field: &'static str, min: f64, max: f64 },

    #[error("{field} range values must be positive, got ({min}, {max})")]
    NonPositiveRange { field: &'static str, min: f64, max: f64 },
}

pub type GeneratorResult<T> = Result<T, GeneratorError>;
