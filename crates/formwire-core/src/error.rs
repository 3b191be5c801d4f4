//! Core error types for formwire.
//!
//! [`NormalizationError`] is the one hard failure of value normalization.
//! [`FormwireError`] covers everything a caller of the form describer can
//! run into: normalization failures, bad configuration, unknown field names,
//! and serialization or IO problems.

use thiserror::Error;

/// A value could not be reduced to a wire-safe form.
///
/// This error is deterministic for a given input; retrying the same
/// normalization reproduces it.
///
/// # Examples
///
/// ```
/// use formwire_core::error::NormalizationError;
///
/// let err = NormalizationError::DepthExceeded { limit: 8 };
/// assert_eq!(err.to_string(), "Maximum normalization depth of 8 exceeded");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    /// A deferred value failed to force to a string and could not be
    /// iterated either.
    #[error("Unresolvable deferred value: {description}")]
    Unresolvable {
        /// A human-readable description of the offending value.
        description: String,
    },

    /// The input nests deeper than the configured limit.
    #[error("Maximum normalization depth of {limit} exceeded")]
    DepthExceeded {
        /// The configured maximum depth.
        limit: usize,
    },
}

impl NormalizationError {
    /// Creates an [`Unresolvable`](Self::Unresolvable) error.
    pub fn unresolvable(description: impl Into<String>) -> Self {
        Self::Unresolvable {
            description: description.into(),
        }
    }
}

/// The primary error type for formwire.
#[derive(Error, Debug)]
pub enum FormwireError {
    /// Value normalization failed.
    #[error("Normalization error: {0}")]
    Normalization(#[from] NormalizationError),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A field name passed to the describer does not exist on the form.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// The normalized output could not be encoded.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for FormwireError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// A convenience type alias for `Result<T, FormwireError>`.
pub type FormwireResult<T> = Result<T, FormwireError>;
