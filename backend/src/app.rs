//! Application state and initialization
//!
//! All services are constructed here. The choice of compressor is made once,
//! from configuration, and never revisited per request.

use crate::config::StorageConfig;
use crate::database::{create_pool, SqliteDocumentStore};
use crate::error::{AppError, Result};
use crate::services::{
    CodecCompressor, Compressor, FileStorageService, NoCompression, QrCodeService, RasterCodec,
};
use crate::storage::{DocumentStore, MemoryDocumentStore};
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub files: FileStorageService,
    pub qr_codes: QrCodeService,
}

impl AppState {
    /// Open the SQLite store named in `config` and wire up the services
    pub async fn initialize(config: StorageConfig) -> Result<Self> {
        tracing::info!("Initializing application");
        config.validate()?;

        let pool = create_pool(&config.database_path).await.map_err(|e| {
            tracing::error!("Failed to open database {:?}: {}", config.database_path, e);
            AppError::StorageFailure("Failed to open file storage".to_string())
        })?;

        let state = Self::with_store(Arc::new(SqliteDocumentStore::new(pool)), config);
        tracing::info!("Application initialized successfully");
        Ok(state)
    }

    /// Services over a throwaway in-memory store
    pub fn in_memory(config: StorageConfig) -> Self {
        Self::with_store(Arc::new(MemoryDocumentStore::new()), config)
    }

    pub fn with_store(store: Arc<dyn DocumentStore>, config: StorageConfig) -> Self {
        let compressor = select_compressor(&config);
        let files = FileStorageService::new(store, compressor, config);
        let qr_codes = QrCodeService::new(files.clone());
        Self { files, qr_codes }
    }
}

fn select_compressor(config: &StorageConfig) -> Arc<dyn Compressor> {
    if config.compression_enabled {
        tracing::info!(
            "Image compression enabled (quality {} down to {}, max {}px)",
            config.compression.initial_quality,
            config.compression.min_quality,
            config.compression.max_dimension
        );
        Arc::new(CodecCompressor::new(RasterCodec, config.compression.clone()))
    } else {
        tracing::warn!("Image compression disabled; oversized images are stored as uploaded");
        Arc::new(NoCompression)
    }
}
