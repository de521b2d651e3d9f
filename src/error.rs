//! Crate-wide error type.
//!
//! Mirrors the error kinds named in the design: `NotFound`, `AlreadyExists`,
//! `InvalidName`, `QueryCompileError`, `MetaValidationError`,
//! `CircularDatasetDependency`, `Cancelled`, `StoreError`. Store errors are
//! inspected for a Postgres unique-violation code and mapped to
//! `AlreadyExists` rather than bubbling up as an opaque `StoreError`, so
//! callers never need to pattern-match on the underlying driver error.

use std::fmt;

/// One validation failure for a single metadata key, part of the
/// `MetaValidationError` envelope described in the EXTERNAL INTERFACES
/// section.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MetaFieldError {
    pub key: String,
    pub message: String,
}

impl fmt::Display for MetaFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("query compile error: {0}")]
    QueryCompileError(String),

    #[error("metadata validation failed: {0:?}")]
    MetaValidationError(Vec<MetaFieldError>),

    #[error("circular dataset dependency: {0}")]
    CircularDatasetDependency(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("store error: {0}")]
    StoreError(#[source] sqlx::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return CatalogError::AlreadyExists(db_err.message().to_string());
            }
        }
        tracing::error!(error = %err, "store error");
        CatalogError::StoreError(err)
    }
}

impl CatalogError {
    pub fn query_compile(msg: impl Into<String>) -> Self {
        CatalogError::QueryCompileError(msg.into())
    }

    pub fn invalid_name(msg: impl Into<String>) -> Self {
        CatalogError::InvalidName(msg.into())
    }
}
