use thiserror::Error;

/// Rejected reward generator parameters
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeneratorError {
    #[error("bounds must satisfy 0 <= lower < upper <= 1, got [{lower}, {upper}]")]
    InvalidBounds { lower: f64, upper: f64 },

    #[error("step2flip must lie in [0, 1], got {0}")]
    InvalidStep2Flip(f64),

    #[error("drift mean must be finite, got {0}")]
    InvalidLoc(f64),

    #[error("drift scale must be finite and non-negative, got {0}")]
    InvalidScale(f64),

    #[error("block length must be at least 1")]
    ZeroBlockLength,
}
