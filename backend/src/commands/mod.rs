//! Command-line surface
//!
//! This module organizes commands into logical submodules:
//! - `files`: ingestion, retrieval and deletion of stored files
//! - `qr`: QR code generation

pub mod files;
pub mod qr;

use crate::app::AppState;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "trackfiles", version, about = "Document-backed file storage")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store an image, compressing it if needed
    Ingest {
        /// Purpose tag, e.g. partner-logo/acme
        location: String,
        path: PathBuf,
        /// Declared MIME type; guessed from the extension when omitted
        #[arg(long)]
        mime: Option<String>,
    },
    /// Store a file as-is, without image checks or compression
    StoreRaw {
        location: String,
        path: PathBuf,
        #[arg(long)]
        mime: Option<String>,
    },
    /// Print a stored file as a data URI
    Get { id: String },
    /// Print only the base64 payload
    GetRaw { id: String },
    /// Print stored metadata as JSON
    Info { id: String },
    /// Delete a stored file
    Delete { id: String },
    /// Render a JSON payload (with an `id` field) as a QR code and store it
    Qr { location: String, payload: String },
}

/// Execute a command, returning what should be printed
pub async fn run(state: &AppState, command: Command) -> anyhow::Result<String> {
    match command {
        Command::Ingest {
            location,
            path,
            mime,
        } => files::ingest(state, &location, &path, mime).await,
        Command::StoreRaw {
            location,
            path,
            mime,
        } => files::store_raw(state, &location, &path, mime).await,
        Command::Get { id } => files::get(state, &id).await,
        Command::GetRaw { id } => files::get_raw(state, &id).await,
        Command::Info { id } => files::info(state, &id).await,
        Command::Delete { id } => files::delete(state, &id).await,
        Command::Qr { location, payload } => qr::store(state, &location, &payload).await,
    }
}
