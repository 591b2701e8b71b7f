use thiserror::Error;

/// Configuration violations detected before a run starts. Every variant is
/// recoverable by the operator correcting the inputs; nothing here is raised
/// once a state machine is running.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("digits cannot be both go and no-go: {digits:?}")]
    OverlappingDigits { digits: Vec<u8> },

    #[error("at least one go digit and one no-go digit are required")]
    EmptyDigitSet,

    #[error("non-zero weights are required for both go and no-go digits")]
    ZeroClassWeight,

    #[error("{field} must be positive")]
    NonPositive { field: &'static str },

    #[error("{field} must be non-negative")]
    Negative { field: &'static str },

    #[error("visual color must be in #RRGGBB format, got {value:?}")]
    BadColor { value: String },
}
