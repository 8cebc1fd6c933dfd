//! Unified error hierarchy for vitalscore
//!
//! Scoring itself never fails on missing data; these errors cover the
//! boundaries around it: input validation, configuration and I/O.

use thiserror::Error;

/// Top-level error type for all vitalscore operations
#[derive(Debug, Error)]
pub enum VitalsError {
    /// Input sample violates a basic invariant
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON input/output errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Calculation errors
    #[error("Calculation error: {0}")]
    Calculation(#[from] CalculationError),
}

/// Calculation errors
#[derive(Debug, Error)]
pub enum CalculationError {
    /// Insufficient data for calculation
    #[error("Insufficient data for {calculation}: {reason}")]
    InsufficientData { calculation: String, reason: String },

    /// Invalid parameter
    #[error("Invalid parameter for {calculation}: {parameter}={value}")]
    InvalidParameter {
        calculation: String,
        parameter: String,
        value: String,
    },
}

/// Result type alias for vitalscore operations
pub type Result<T> = std::result::Result<T, VitalsError>;

impl VitalsError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            VitalsError::Validation(_) => ErrorSeverity::Warning,
            VitalsError::Calculation(CalculationError::InsufficientData { .. }) => {
                ErrorSeverity::Warning
            }
            VitalsError::Configuration(_) => ErrorSeverity::Error,
            VitalsError::Io(_) => ErrorSeverity::Error,
            VitalsError::Serialization(_) => ErrorSeverity::Error,
            VitalsError::Calculation(_) => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            VitalsError::Calculation(CalculationError::InsufficientData {
                calculation,
                reason,
            }) => {
                format!("Not enough data to calculate {}: {}", calculation, reason)
            }
            VitalsError::Serialization(e) => {
                format!("Input file is not valid JSON for this command: {}", e)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents operation
    Error,
    /// Warning that doesn't prevent other operations
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}
