//! Error types for trackfiles
//!
//! All errors use thiserror for structured error handling.
//! `AppError` is what callers see; `StoreError` stays behind the storage seam
//! and is logged rather than surfaced.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("{0}")]
    NotFound(String),

    /// Carries a caller-safe message only; the store detail is logged.
    #[error("{0}")]
    StorageFailure(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// HTTP status an outer surface should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::InvalidInput(_) => 400,
            AppError::PayloadTooLarge(_) => 413,
            AppError::UnsupportedMediaType(_) => 415,
            AppError::NotFound(_) => 404,
            AppError::StorageFailure(_) | AppError::Config(_) => 500,
        }
    }

    /// Whether the caller sent something this service will never accept
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Errors raised by document store implementations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt document {collection}/{id}: {reason}")]
    Corrupt {
        collection: String,
        id: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, AppError>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::InvalidInput("x".into()).status_code(), 400);
        assert_eq!(AppError::PayloadTooLarge("x".into()).status_code(), 413);
        assert_eq!(AppError::UnsupportedMediaType("x".into()).status_code(), 415);
        assert_eq!(AppError::NotFound("x".into()).status_code(), 404);
        assert_eq!(AppError::StorageFailure("x".into()).status_code(), 500);
        assert!(AppError::NotFound("x".into()).is_client_error());
        assert!(!AppError::StorageFailure("x".into()).is_client_error());
    }

    #[test]
    fn test_serializes_as_message() {
        let err = AppError::NotFound("Image not found".into());
        assert_eq!(serde_json::to_string(&err).unwrap(), "\"Image not found\"");
    }
}
