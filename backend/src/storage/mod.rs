//! Storage module
//!
//! The document store capability the file service writes through, plus an
//! in-memory implementation. The SQLite-backed store lives in `database`.

pub mod document_store;
pub mod memory;

pub use document_store::{server_timestamp, Document, DocumentStore};
pub use memory::MemoryDocumentStore;
