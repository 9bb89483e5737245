use thiserror::Error;

use crate::types::ModelEntry;

/// Aggregates every failure mode exposed by the Straico client and front end.
///
/// Validation and configuration failures are raised before any network call is made.
/// [`StraicoError::Api`] carries the remote status and, for unknown model identifiers,
/// the catalog entries that most closely resemble what the caller asked for.
#[derive(Debug, Error)]
pub enum StraicoError {
    /// Raised when building or validating configuration fails.
    #[error("invalid configuration for {field}: {reason}")]
    Config {
        /// Name of the configuration field that failed validation.
        field: String,
        /// Additional context explaining why the field is invalid.
        reason: String,
    },
    /// Signals malformed request parameters caught before any network call.
    #[error("invalid request: {message}")]
    Validation { message: String },
    /// The remote service answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code returned by the service.
        status: u16,
        /// Error message extracted from the response body, or the raw body.
        message: String,
        /// Model identifier the suggestions were computed for, if the failure was an
        /// unknown-model condition.
        requested_model: Option<String>,
        /// Closest catalog entries, best match first.
        suggestions: Vec<ModelEntry>,
    },
    /// The response body was not the structured data the client expected.
    #[error("failed to parse response: {message}")]
    Parse { message: String },
    /// Represents transport-layer or networking failures.
    #[error("transport error: {message}")]
    Transport { message: String },
    /// Terminal input or output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Surfaces a user-initiated cancellation.
    #[error("interrupted")]
    Interrupted,
}

impl StraicoError {
    /// Creates a [`StraicoError::Transport`] from a textual description.
    ///
    /// # Examples
    ///
    /// ```
    /// use straico::error::StraicoError;
    ///
    /// let err = StraicoError::transport("dns lookup failed");
    /// assert!(matches!(err, StraicoError::Transport { .. }));
    /// ```
    pub fn transport<T: Into<String>>(message: T) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a [`StraicoError::Validation`].
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a [`StraicoError::Parse`].
    pub fn parse<T: Into<String>>(message: T) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Creates a [`StraicoError::Config`] for the named field.
    pub fn config<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        Self::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` when the error reports an unknown model identifier.
    pub fn is_model_not_found(&self) -> bool {
        matches!(
            self,
            Self::Api {
                requested_model: Some(_),
                ..
            }
        )
    }

    /// Model suggestions attached to an unknown-model failure, best match first.
    pub fn suggestions(&self) -> &[ModelEntry] {
        match self {
            Self::Api { suggestions, .. } => suggestions,
            _ => &[],
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, StraicoError>;

/// Returns `true` when a remote error message says the requested model does not exist.
pub(crate) fn looks_like_model_not_found(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    const HINTS: [&str; 3] = ["model not found", "unknown model", "invalid model"];
    HINTS.iter().any(|needle| lower.contains(needle))
}

/// Picks the model identifier an unknown-model failure most likely refers to.
///
/// A single requested model wins outright. For a list, the first entry quoted in the
/// error message is preferred, falling back to the first entry.
pub(crate) fn blame_model(candidates: &[String], message: &str) -> Option<String> {
    match candidates {
        [] => None,
        [only] => Some(only.clone()),
        [first, ..] => candidates
            .iter()
            .find(|candidate| message.contains(candidate.as_str()))
            .or(Some(first))
            .cloned(),
    }
}
