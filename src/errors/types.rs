//! Error type definitions for tubestats
//!
//! A hierarchical error system: [`AppError`] at the top, with repository and
//! source specific enums underneath so each layer can report precise causes.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Repository layer errors
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// YouTube API errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Resource not found errors
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Repository layer specific errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// SQL query execution failures
    #[error("Query failed: {query} - {message}")]
    QueryFailed { query: String, message: String },

    /// Data serialization/deserialization failures
    #[error("Serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// Stored row could not be mapped onto a model
    #[error("Corrupt row: {table}.{field} - {message}")]
    CorruptRow {
        table: String,
        field: String,
        message: String,
    },

    /// Migration failures
    #[error("Migration failed: {version} - {message}")]
    MigrationFailed { version: String, message: String },
}

/// YouTube Data API specific errors
#[derive(Error, Debug)]
pub enum SourceError {
    /// Non-success HTTP status from the API
    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    /// Transport-level failure (connect, timeout, body read)
    #[error("Request failed: {endpoint} - {message}")]
    RequestFailed { endpoint: String, message: String },

    /// Payload did not match the expected record shape
    #[error("Invalid payload: {record} - {message}")]
    InvalidPayload { record: String, message: String },

    /// API key missing or rejected
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },
}

impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error for a specific resource
    pub fn not_found<R: Into<String>, I: Into<String>>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl RepositoryError {
    /// Create a query failed error
    pub fn query_failed<Q: Into<String>, M: Into<String>>(query: Q, message: M) -> Self {
        Self::QueryFailed {
            query: query.into(),
            message: message.into(),
        }
    }

    /// Create a corrupt row error
    pub fn corrupt_row<T: Into<String>, F: Into<String>, M: Into<String>>(
        table: T,
        field: F,
        message: M,
    ) -> Self {
        Self::CorruptRow {
            table: table.into(),
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        Self::query_failed("sqlite", err.to_string())
    }
}

impl SourceError {
    /// Create an invalid payload error
    pub fn invalid_payload<R: Into<String>, M: Into<String>>(record: R, message: M) -> Self {
        Self::InvalidPayload {
            record: record.into(),
            message: message.into(),
        }
    }

    /// Create a request failed error
    pub fn request_failed<E: Into<String>, M: Into<String>>(endpoint: E, message: M) -> Self {
        Self::RequestFailed {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = AppError::not_found("channel", "UC123");
        assert_eq!(err.to_string(), "Not found: channel with id UC123");
    }

    #[test]
    fn test_repository_error_converts_into_app_error() {
        let err: AppError = RepositoryError::corrupt_row("videos", "published_at", "bad").into();
        assert!(matches!(err, AppError::Repository(RepositoryError::CorruptRow { .. })));
        assert!(err.to_string().contains("videos.published_at"));
    }

    #[test]
    fn test_source_error_display() {
        let err = SourceError::Http {
            status: 403,
            message: "quotaExceeded".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error: 403 - quotaExceeded");
    }
}
