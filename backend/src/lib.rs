//! trackfiles library
//!
//! Document-backed file storage for the product tracking backend: image
//! ingestion with size policy and compression, retrieval as data URIs,
//! and QR code artifacts.

pub mod app;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
pub mod storage;
