//! QR code commands

use crate::app::AppState;
use serde_json::Value;

/// Store a QR code for `payload`, parsed as JSON when possible
pub async fn store(state: &AppState, location: &str, payload: &str) -> anyhow::Result<String> {
    let value = serde_json::from_str::<Value>(payload)
        .unwrap_or_else(|_| Value::String(payload.to_string()));

    let id = state.qr_codes.store_qr_code(&value, location).await?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;

    #[tokio::test]
    async fn test_store_json_payload() {
        let state = AppState::in_memory(StorageConfig::default());

        let id = store(&state, "products/qr", r#"{"id":"batch-1"}"#).await.unwrap();

        let file = state.files.retrieve_file(&id).await.unwrap();
        assert_eq!(file.location, "products/qr/batch-1");
    }

    #[tokio::test]
    async fn test_plain_text_payload_has_no_id() {
        let state = AppState::in_memory(StorageConfig::default());
        assert!(store(&state, "products/qr", "not json").await.is_err());
    }
}
