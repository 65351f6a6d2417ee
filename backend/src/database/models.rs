//! Database models
//!
//! Rust structs for the documents kept in the files collection.
//! Field names serialize in camelCase to match the stored document layout.

use crate::storage::{server_timestamp, Document};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file persisted as a single base64 document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub id: String,
    /// Caller-supplied purpose tag, e.g. `partner-logo/business1`
    pub location: String,
    pub filename: String,
    /// MIME type of the stored bytes, which may differ from the upload's
    pub mime_type: String,
    /// Byte length of the stored payload before base64 encoding
    pub size: u64,
    /// Standard base64 of the payload
    pub data: String,
    pub created_at: DateTime<Utc>,
}

impl StoredFile {
    pub fn from_document(document: Document) -> serde_json::Result<Self> {
        serde_json::from_value(serde_json::Value::Object(document))
    }

    /// `data:<mime>;base64,<data>`
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decode the payload back into raw bytes
    pub fn decode(&self) -> std::result::Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }
}

/// A file about to be written; `createdAt` is left to the store's clock
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStoredFile {
    pub id: String,
    pub location: String,
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
    pub data: String,
}

impl NewStoredFile {
    pub fn into_document(self) -> serde_json::Result<Document> {
        let mut document: Document = serde_json::from_value(serde_json::to_value(&self)?)?;
        document.insert("createdAt".to_string(), server_timestamp());
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::document_store::{is_server_timestamp, resolve_server_timestamps};

    fn new_file() -> NewStoredFile {
        NewStoredFile {
            id: "AbCdEfGhIjKlMnOp".to_string(),
            location: "partner-logo/business1".to_string(),
            filename: "logo.png".to_string(),
            mime_type: "image/png".to_string(),
            size: 3,
            data: STANDARD.encode([1u8, 2, 3]),
        }
    }

    #[test]
    fn test_document_layout() {
        let document = new_file().into_document().unwrap();

        assert_eq!(document["mimeType"], "image/png");
        assert_eq!(document["size"], 3);
        assert!(is_server_timestamp(&document["createdAt"]));
        assert!(!document.contains_key("mime_type"));
    }

    #[test]
    fn test_stored_file_from_resolved_document() {
        let mut document = new_file().into_document().unwrap();
        resolve_server_timestamps(&mut document, Utc::now());

        let file = StoredFile::from_document(document).unwrap();
        assert_eq!(file.id, "AbCdEfGhIjKlMnOp");
        assert_eq!(file.decode().unwrap(), vec![1, 2, 3]);
        assert_eq!(file.data_uri(), "data:image/png;base64,AQID");
    }

    #[test]
    fn test_unresolved_timestamp_is_rejected() {
        let document = new_file().into_document().unwrap();
        assert!(StoredFile::from_document(document).is_err());
    }
}
