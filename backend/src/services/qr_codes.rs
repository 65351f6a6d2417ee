//! QR code service
//!
//! Renders product and batch payloads as QR codes and stores the rendered
//! SVG through [`FileStorageService::ingest_raw_buffer`].

use crate::error::{AppError, Result};
use crate::services::files::FileStorageService;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, Luma};
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use serde_json::Value;
use std::io::Cursor;

/// MIME type of stored QR codes
pub const SVG_MIME_TYPE: &str = "image/svg+xml";

/// Minimum rendered edge length in pixels
pub const QR_MIN_DIMENSION: u32 = 400;

/// Service for generating and storing QR codes
#[derive(Clone)]
pub struct QrCodeService {
    files: FileStorageService,
}

impl QrCodeService {
    pub fn new(files: FileStorageService) -> Self {
        Self { files }
    }

    /// Render `payload` as SVG and store it under `<location>/<id>`.
    /// The payload must carry a string `id`. Returns the stored file id.
    pub async fn store_qr_code(&self, payload: &Value, location: &str) -> Result<String> {
        let id = payload
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::InvalidInput("QR payload requires a string id".to_string()))?;

        let svg = render_svg(&content_for(payload))?;

        self.files
            .ingest_raw_buffer(&format!("{}/{}", location, id), svg.into_bytes(), SVG_MIME_TYPE)
            .await
    }

    /// PNG data URI for embedding, without storing anything
    pub fn data_uri(&self, payload: &Value) -> Result<String> {
        let png = render_png(&content_for(payload))?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }
}

/// Text encoded into the code: strings verbatim, anything else as compact JSON
pub fn content_for(payload: &Value) -> String {
    match payload {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn build_code(content: &str) -> Result<QrCode> {
    QrCode::with_error_correction_level(content.as_bytes(), EcLevel::Q).map_err(|e| {
        tracing::warn!("QR encoding failed for {} bytes: {}", content.len(), e);
        AppError::InvalidInput(format!("Failed to generate QR code: {}", e))
    })
}

/// Render black-on-white SVG with a quiet zone
pub fn render_svg(content: &str) -> Result<String> {
    let code = build_code(content)?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(QR_MIN_DIMENSION, QR_MIN_DIMENSION)
        .quiet_zone(true)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build())
}

/// Render as a grayscale PNG
pub fn render_png(content: &str) -> Result<Vec<u8>> {
    let code = build_code(content)?;
    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(QR_MIN_DIMENSION, QR_MIN_DIMENSION)
        .quiet_zone(true)
        .build();

    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).map_err(|e| {
        tracing::error!("Failed to encode QR code PNG: {}", e);
        AppError::StorageFailure("Failed to generate QR code".to_string())
    })?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::services::compression::NoCompression;
    use crate::storage::MemoryDocumentStore;
    use serde_json::json;
    use std::sync::Arc;

    fn create_test_service() -> (QrCodeService, FileStorageService) {
        let files = FileStorageService::new(
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(NoCompression),
            StorageConfig::default(),
        );
        (QrCodeService::new(files.clone()), files)
    }

    #[test]
    fn test_content_for() {
        assert_eq!(content_for(&json!("PRD-001")), "PRD-001");
        assert_eq!(content_for(&json!({ "id": "b1" })), r#"{"id":"b1"}"#);
    }

    #[test]
    fn test_render_svg() {
        let svg = render_svg("https://example.com/products/PRD-001").unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("#000000"));
    }

    #[test]
    fn test_render_png() {
        let png = render_png("PRD-001").unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert!(decoded.width() >= QR_MIN_DIMENSION);
        assert_eq!(decoded.width(), decoded.height());
    }

    #[test]
    fn test_oversized_content_rejected() {
        let content = "x".repeat(10_000);
        assert!(matches!(
            render_svg(&content),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_store_qr_code() {
        let (qr, files) = create_test_service();
        let payload = json!({ "id": "batch-7", "product": "coffee" });

        let file_id = qr.store_qr_code(&payload, "products/qr").await.unwrap();

        let file = files.retrieve_file(&file_id).await.unwrap();
        assert_eq!(file.location, "products/qr/batch-7");
        assert_eq!(file.mime_type, SVG_MIME_TYPE);
        assert_eq!(file.filename, format!("{}.svg", file_id));
        let svg = String::from_utf8(file.decode().unwrap()).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[tokio::test]
    async fn test_store_requires_id() {
        let (qr, _) = create_test_service();

        let err = qr
            .store_qr_code(&json!({ "product": "coffee" }), "products/qr")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_data_uri() {
        let (qr, _) = create_test_service();
        let uri = qr.data_uri(&json!("PRD-001")).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }
}
