//! Storage configuration
//!
//! Default limits live here as named constants. The service itself only ever
//! sees a [`StorageConfig`], so tests can exercise boundary values directly.

use crate::error::{AppError, Result};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

// ===== Size Limits =====

/// Maximum raw upload size accepted before any processing (5 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Raw size above which compression is attempted (700 KiB).
/// Base64 adds roughly a third, so this keeps the encoded form under the
/// document ceiling with room for metadata.
pub const DEFAULT_TARGET_BYTES: usize = 700 * 1024;

/// Hard per-document ceiling enforced by the backing store
pub const DEFAULT_DOCUMENT_CEILING_BYTES: usize = 1_000_000;

/// Fixed allowance for the non-payload fields of a stored document
pub const DEFAULT_METADATA_OVERHEAD_BYTES: usize = 500;

// ===== Compression =====

/// Quality of the first re-encode attempt (1-100 scale)
pub const DEFAULT_INITIAL_QUALITY: u8 = 80;

/// Quality decrement between attempts
pub const DEFAULT_QUALITY_STEP: u8 = 10;

/// The loop stops once quality is no longer above this floor
pub const DEFAULT_MIN_QUALITY: u8 = 10;

/// Longest allowed edge of a compressed image in pixels
pub const DEFAULT_MAX_DIMENSION: u32 = 1200;

// ===== Storage =====

/// Collection holding stored files
pub const DEFAULT_FILES_COLLECTION: &str = "files";

/// Default SQLite database location
pub const DEFAULT_DATABASE_PATH: &str = "data/trackfiles.db";

/// Tuning for the progressive re-encode loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionPolicy {
    pub initial_quality: u8,
    pub quality_step: u8,
    pub min_quality: u8,
    pub max_dimension: u32,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self {
            initial_quality: DEFAULT_INITIAL_QUALITY,
            quality_step: DEFAULT_QUALITY_STEP,
            min_quality: DEFAULT_MIN_QUALITY,
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }
}

/// Limits and wiring options for file storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub collection: String,
    pub max_upload_bytes: usize,
    pub target_bytes: usize,
    pub document_ceiling_bytes: usize,
    pub metadata_overhead_bytes: usize,
    pub compression_enabled: bool,
    pub compression: CompressionPolicy,
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_FILES_COLLECTION.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            target_bytes: DEFAULT_TARGET_BYTES,
            document_ceiling_bytes: DEFAULT_DOCUMENT_CEILING_BYTES,
            metadata_overhead_bytes: DEFAULT_METADATA_OVERHEAD_BYTES,
            compression_enabled: true,
            compression: CompressionPolicy::default(),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
        }
    }
}

impl StorageConfig {
    /// Load configuration from `TRACKFILES_*` environment variables,
    /// falling back to the defaults above for anything unset.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            collection: try_load("TRACKFILES_COLLECTION", defaults.collection)?,
            max_upload_bytes: try_load("TRACKFILES_MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            target_bytes: try_load("TRACKFILES_TARGET_BYTES", defaults.target_bytes)?,
            document_ceiling_bytes: try_load(
                "TRACKFILES_DOCUMENT_CEILING_BYTES",
                defaults.document_ceiling_bytes,
            )?,
            metadata_overhead_bytes: try_load(
                "TRACKFILES_METADATA_OVERHEAD_BYTES",
                defaults.metadata_overhead_bytes,
            )?,
            compression_enabled: try_load("TRACKFILES_COMPRESSION", defaults.compression_enabled)?,
            compression: CompressionPolicy {
                initial_quality: try_load(
                    "TRACKFILES_INITIAL_QUALITY",
                    defaults.compression.initial_quality,
                )?,
                quality_step: try_load("TRACKFILES_QUALITY_STEP", defaults.compression.quality_step)?,
                min_quality: try_load("TRACKFILES_MIN_QUALITY", defaults.compression.min_quality)?,
                max_dimension: try_load(
                    "TRACKFILES_MAX_DIMENSION",
                    defaults.compression.max_dimension,
                )?,
            },
            database_path: try_load("TRACKFILES_DATABASE_PATH", defaults.database_path)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject combinations of limits that can never produce a valid document
    pub fn validate(&self) -> Result<()> {
        if self.collection.trim().is_empty() {
            return Err(AppError::Config("collection name must not be empty".into()));
        }
        if self.target_bytes > self.max_upload_bytes {
            return Err(AppError::Config(format!(
                "target size ({} bytes) exceeds upload ceiling ({} bytes)",
                self.target_bytes, self.max_upload_bytes
            )));
        }
        if self.metadata_overhead_bytes >= self.document_ceiling_bytes {
            return Err(AppError::Config(format!(
                "metadata overhead ({} bytes) leaves no room under the document ceiling ({} bytes)",
                self.metadata_overhead_bytes, self.document_ceiling_bytes
            )));
        }

        let policy = &self.compression;
        if !(1..=100).contains(&policy.initial_quality) || policy.min_quality > 100 {
            return Err(AppError::Config("quality values must be within 1-100".into()));
        }
        if policy.quality_step == 0 {
            return Err(AppError::Config("quality step must be positive".into()));
        }
        if policy.max_dimension == 0 {
            return Err(AppError::Config("max dimension must be positive".into()));
        }

        Ok(())
    }
}

fn try_load<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr + std::fmt::Debug,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("invalid {key} value {raw:?}: {e}"))),
        Err(_) => {
            tracing::debug!("{key} not set, using default: {default:?}");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = StorageConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_upload_bytes, 5_242_880);
        assert_eq!(config.target_bytes, 716_800);
        assert_eq!(config.document_ceiling_bytes, 1_000_000);
        assert_eq!(config.compression.initial_quality, 80);
    }

    #[test]
    fn test_target_above_upload_ceiling_rejected() {
        let config = StorageConfig {
            target_bytes: DEFAULT_MAX_UPLOAD_BYTES + 1,
            ..StorageConfig::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_overhead_must_fit_under_ceiling() {
        let config = StorageConfig {
            metadata_overhead_bytes: 1_000,
            document_ceiling_bytes: 1_000,
            ..StorageConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_quality_step_rejected() {
        let mut config = StorageConfig::default();
        config.compression.quality_step = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_try_load_parses_and_defaults() {
        std::env::set_var("TRACKFILES_TEST_TRY_LOAD", "42");
        let value: usize = try_load("TRACKFILES_TEST_TRY_LOAD", 7).unwrap();
        assert_eq!(value, 42);

        let missing: usize = try_load("TRACKFILES_TEST_TRY_LOAD_MISSING", 7).unwrap();
        assert_eq!(missing, 7);

        std::env::set_var("TRACKFILES_TEST_TRY_LOAD_BAD", "lots");
        let bad: Result<usize> = try_load("TRACKFILES_TEST_TRY_LOAD_BAD", 7);
        assert!(bad.is_err());
    }
}
