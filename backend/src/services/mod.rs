//! Services module
//!
//! Business logic between the command surface and the document store.

pub mod compression;
pub mod files;
pub mod qr_codes;

pub use compression::{CodecCompressor, Compression, Compressor, NoCompression, RasterCodec};
pub use files::{FileStorageService, Upload};
pub use qr_codes::QrCodeService;
