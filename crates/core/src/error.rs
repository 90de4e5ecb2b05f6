//! Error types for the Auto Gateway platform

use thiserror::Error;

/// Platform-wide error type
///
/// The recommendation service maps internal failures onto this taxonomy at
/// its public boundary: configuration and database problems keep their
/// source, lookups of absent entities become `NotFound`, malformed caller
/// input becomes `InvalidInput`, and everything else is `Internal`.
#[derive(Debug, Error)]
pub enum AutoGatewayError {
    /// Invalid or missing configuration
    #[error("configuration error: {message}")]
    ConfigurationError {
        message: String,
        key: Option<String>,
    },

    /// Database access failure
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// A referenced entity does not exist
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// Malformed caller input (e.g. an unknown algorithm name)
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Unexpected internal failure
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl AutoGatewayError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AutoGatewayError::not_found("listing", "42");
        assert_eq!(err.to_string(), "listing not found: 42");

        let err = AutoGatewayError::invalid_input("unknown algorithm 'foo'");
        assert!(err.to_string().contains("unknown algorithm"));
    }
}
