//! File storage service
//!
//! Turns uploads into size-bounded base64 documents and reads them back.
//! Every operation touches exactly one document, identified by its id.
//!
//! Ingestion order: presence, upload ceiling, content type, optional
//! compression, then the hard document ceiling. Nothing is written unless
//! every check passes.

use crate::config::StorageConfig;
use crate::database::{NewStoredFile, StoredFile};
use crate::error::{AppError, Result, StoreError};
use crate::services::compression::{Compression, Compressor};
use crate::storage::DocumentStore;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::Rng;
use std::sync::Arc;

/// Length of generated file ids
pub const FILE_ID_LENGTH: usize = 16;

const FILE_ID_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// An uploaded file as received from the caller
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            data,
        }
    }
}

/// Service for storing files as documents
#[derive(Clone)]
pub struct FileStorageService {
    store: Arc<dyn DocumentStore>,
    compressor: Arc<dyn Compressor>,
    config: Arc<StorageConfig>,
}

impl FileStorageService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        compressor: Arc<dyn Compressor>,
        config: StorageConfig,
    ) -> Self {
        Self {
            store,
            compressor,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Store an uploaded image, compressing it when it exceeds the target size.
    /// Returns the generated file id.
    pub async fn ingest(&self, location: &str, upload: Option<Upload>) -> Result<String> {
        let upload = match upload {
            Some(upload) if !upload.data.is_empty() => upload,
            _ => return Err(AppError::InvalidInput("No file uploaded.".to_string())),
        };

        if upload.data.len() > self.config.max_upload_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "File too large. Maximum size is {}MB",
                format_megabytes(self.config.max_upload_bytes)
            )));
        }

        if !is_image_mime(&upload.mime_type) {
            return Err(AppError::UnsupportedMediaType(
                "Only image files are allowed".to_string(),
            ));
        }

        tracing::info!(
            "Storing image at {}: {} ({} bytes, {})",
            location,
            upload.filename,
            upload.data.len(),
            upload.mime_type
        );

        let Upload {
            filename,
            mime_type,
            data,
        } = upload;

        let (data, mime_type) = if data.len() > self.config.target_bytes {
            self.compress(data, mime_type).await?
        } else {
            (data, mime_type)
        };

        let id = self
            .persist(
                location,
                Some(filename.as_str()),
                data,
                mime_type,
                "Image is too large even after compression. Please use a smaller image.",
                "Failed to store image",
            )
            .await?;

        tracing::info!("Image stored: {}", id);
        Ok(id)
    }

    /// Store machine-generated bytes (rendered codes and the like) as-is.
    /// No upload checks and no compression; the document ceiling still applies.
    pub async fn ingest_raw_buffer(
        &self,
        location: &str,
        data: Vec<u8>,
        mime_type: &str,
    ) -> Result<String> {
        tracing::info!(
            "Storing buffer at {} ({} bytes, {})",
            location,
            data.len(),
            mime_type
        );

        let id = self
            .persist(
                location,
                None,
                data,
                mime_type.to_string(),
                "File is too large to store.",
                "Failed to store file",
            )
            .await?;

        tracing::info!("Buffer stored: {}", id);
        Ok(id)
    }

    /// Fetch a stored file as a data URI. Values that already are data URIs
    /// are passed through untouched.
    pub async fn retrieve(&self, file_id: &str) -> Result<String> {
        if file_id.starts_with("data:") {
            return Ok(file_id.to_string());
        }

        let file = self
            .load(file_id, "Image not found", "Failed to retrieve image")
            .await?;
        Ok(file.data_uri())
    }

    /// Fetch only the base64 payload of a stored file
    pub async fn retrieve_raw(&self, file_id: &str) -> Result<String> {
        let file = self
            .load(file_id, "File not found", "Failed to retrieve file")
            .await?;
        Ok(file.data)
    }

    /// Fetch the full stored record
    pub async fn retrieve_file(&self, file_id: &str) -> Result<StoredFile> {
        self.load(file_id, "File not found", "Failed to retrieve file")
            .await
    }

    /// Delete a stored file. Deleting an unknown id succeeds.
    pub async fn delete(&self, file_id: &str) -> Result<()> {
        tracing::info!("Deleting file: {}", file_id);

        self.store
            .delete(&self.config.collection, file_id)
            .await
            .map_err(|e| storage_failure(e, "Failed to delete image"))
    }

    async fn compress(&self, data: Vec<u8>, mime_type: String) -> Result<(Vec<u8>, String)> {
        let compressor = Arc::clone(&self.compressor);
        let target = self.config.target_bytes;
        let input_mime = mime_type.clone();

        let (data, outcome) = tokio::task::spawn_blocking(move || {
            let outcome = compressor.compress(&data, &input_mime, target);
            (data, outcome)
        })
        .await
        .map_err(|e| {
            tracing::error!("Compression task failed: {}", e);
            AppError::StorageFailure("Failed to store image".to_string())
        })?;

        match outcome {
            Compression::Compressed {
                data: compressed,
                mime_type: compressed_mime,
                quality,
            } => {
                if compressed.len() >= data.len() {
                    tracing::debug!(
                        "Re-encode did not shrink image ({} -> {} bytes), keeping original",
                        data.len(),
                        compressed.len()
                    );
                    return Ok((data, mime_type));
                }
                tracing::info!(
                    "Compressed image {} -> {} bytes ({} at quality {})",
                    data.len(),
                    compressed.len(),
                    compressed_mime,
                    quality
                );
                Ok((compressed, compressed_mime))
            }
            Compression::Skipped => Ok((data, mime_type)),
            Compression::Unavailable => {
                tracing::warn!("Image compression not available. Using original image.");
                Ok((data, mime_type))
            }
            Compression::Failed(e) => {
                tracing::warn!("Image compression failed ({}). Using original image.", e);
                Ok((data, mime_type))
            }
        }
    }

    async fn persist(
        &self,
        location: &str,
        filename: Option<&str>,
        data: Vec<u8>,
        mime_type: String,
        too_large_message: &str,
        failure_message: &str,
    ) -> Result<String> {
        let encoded = STANDARD.encode(&data);

        let estimated_doc_size = encoded.len() + self.config.metadata_overhead_bytes;
        if estimated_doc_size > self.config.document_ceiling_bytes {
            tracing::warn!(
                "Rejecting document of ~{} bytes (ceiling {} bytes)",
                estimated_doc_size,
                self.config.document_ceiling_bytes
            );
            return Err(AppError::PayloadTooLarge(too_large_message.to_string()));
        }

        let id = generate_file_id();
        let filename = filename
            .map(sanitize_filename)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("{}.{}", id, extension_for_mime(&mime_type)));

        let document = NewStoredFile {
            id: id.clone(),
            location: location.to_string(),
            filename,
            mime_type,
            size: data.len() as u64,
            data: encoded,
        }
        .into_document()
        .map_err(|e| storage_failure(StoreError::from(e), failure_message))?;

        self.store
            .put(&self.config.collection, &id, document)
            .await
            .map_err(|e| storage_failure(e, failure_message))?;

        Ok(id)
    }

    async fn load(
        &self,
        file_id: &str,
        not_found_message: &str,
        failure_message: &str,
    ) -> Result<StoredFile> {
        let document = self
            .store
            .get(&self.config.collection, file_id)
            .await
            .map_err(|e| storage_failure(e, failure_message))?
            .ok_or_else(|| AppError::NotFound(not_found_message.to_string()))?;

        StoredFile::from_document(document)
            .map_err(|e| storage_failure(StoreError::from(e), failure_message))
    }
}

fn storage_failure(error: StoreError, message: &str) -> AppError {
    tracing::error!("{}: {}", message, error);
    AppError::StorageFailure(message.to_string())
}

/// Random URL-safe identifier for a new file document
pub fn generate_file_id() -> String {
    let mut rng = rand::thread_rng();
    (0..FILE_ID_LENGTH)
        .map(|_| FILE_ID_ALPHABET[rng.gen_range(0..FILE_ID_ALPHABET.len())] as char)
        .collect()
}

/// File extension used for synthesized filenames
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        "image/webp" => "webp",
        _ => "bin",
    }
}

fn is_image_mime(mime_type: &str) -> bool {
    mime_type.trim().to_ascii_lowercase().starts_with("image/")
}

fn format_megabytes(bytes: usize) -> String {
    let mb = bytes as f64 / 1024.0 / 1024.0;
    if mb.fract() == 0.0 {
        format!("{}", mb as u64)
    } else {
        format!("{:.2}", mb)
    }
}

/// Sanitize filename to prevent path traversal
fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| *c != '/' && *c != '\\' && *c != '\0')
        .take(255)
        .collect()
}
