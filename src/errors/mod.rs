//! Centralized error handling for tubestats
//!
//! This module unifies error types across the application layers:
//!
//! - **Repository Errors**: SQLite queries, row mapping and migrations
//! - **Source Errors**: YouTube Data API requests and payload validation
//! - **Validation Errors**: Input validation at the web boundary
//!
//! History blobs never produce errors: undecodable series are recovered
//! as empty by [`crate::history`].

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Repository Results
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Convenience type alias for Source Results
pub type SourceResult<T> = Result<T, SourceError>;
