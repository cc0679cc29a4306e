use thiserror::Error;

/// Rejected input detected before any series is produced. A failed run
/// returns no partial results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInputError {
    #[error("analysis term must cover at least one year")]
    NonPositiveAnalysisTerm,
    #[error("mortgage term must cover at least one year")]
    NonPositiveMortgageTerm,
    #[error("loan principal must be non-negative, got {0}")]
    NegativePrincipal(f64),
    #[error("{name} must be non-negative, got {value}")]
    NegativeRate { name: &'static str, value: f64 },
    #[error("{name} must be non-negative, got {value}")]
    NegativeAmount { name: &'static str, value: f64 },
}
