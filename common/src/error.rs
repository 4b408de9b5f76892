use thiserror::Error;

/// Rejection reasons for an incoming tick. State is never mutated when one
/// of these is returned.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TickError {
    #[error("tick price is not finite: {0}")]
    NonFinitePrice(f64),

    #[error("tick size is not finite: {0}")]
    NonFiniteSize(f64),

    #[error("tick price must be positive, got {0}")]
    NonPositivePrice(f64),

    #[error("tick size must be non-negative, got {0}")]
    NegativeSize(f64),
}
