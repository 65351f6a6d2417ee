//! Image compression
//!
//! Best-effort size reduction for uploads above the target threshold.
//! The service depends on the [`Compressor`] capability; whether a real codec
//! or [`NoCompression`] is wired in is decided once at startup.
//!
//! The loop does not guarantee reaching the target. It stops at the quality
//! floor, and the caller must still enforce the storage ceiling.

use crate::config::CompressionPolicy;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use thiserror::Error;

/// MIME type of everything the codec compressor produces
pub const COMPRESSED_MIME_TYPE: &str = "image/jpeg";

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("could not decode image: {0}")]
    Decode(String),

    #[error("could not encode image: {0}")]
    Encode(String),
}

/// Result of a compression attempt
#[derive(Debug)]
pub enum Compression {
    Compressed {
        data: Vec<u8>,
        mime_type: String,
        /// Quality of the final encode
        quality: u8,
    },
    /// Input was already within target, or the policy permits no attempt
    Skipped,
    /// No codec is wired in
    Unavailable,
    /// The codec rejected this input
    Failed(CodecError),
}

/// Capability that shrinks an encoded image toward a byte target
pub trait Compressor: Send + Sync {
    fn compress(&self, data: &[u8], mime_type: &str, target_bytes: usize) -> Compression;
}

/// Raster operations the compression loop needs
pub trait ImageCodec: Send + Sync {
    type Image;

    fn decode(&self, data: &[u8]) -> Result<Self::Image, CodecError>;

    fn dimensions(&self, image: &Self::Image) -> (u32, u32);

    /// Scale down so neither side exceeds its bound, keeping aspect ratio
    fn resize_to_fit(&self, image: Self::Image, max_width: u32, max_height: u32) -> Self::Image;

    /// Lossy re-encode at `quality` (1-100)
    fn encode(&self, image: &Self::Image, quality: u8) -> Result<Vec<u8>, CodecError>;
}

/// Compressor that never compresses
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCompression;

impl Compressor for NoCompression {
    fn compress(&self, _data: &[u8], _mime_type: &str, _target_bytes: usize) -> Compression {
        Compression::Unavailable
    }
}

/// Progressive quality reduction over an [`ImageCodec`]
pub struct CodecCompressor<C> {
    codec: C,
    policy: CompressionPolicy,
}

impl<C: ImageCodec> CodecCompressor<C> {
    pub fn new(codec: C, policy: CompressionPolicy) -> Self {
        Self { codec, policy }
    }

    fn run(&self, data: &[u8], target_bytes: usize) -> Result<Option<(Vec<u8>, u8)>, CodecError> {
        let max = self.policy.max_dimension;
        let mut quality = self.policy.initial_quality;
        let mut result: Option<(Vec<u8>, u8)> = None;
        let mut current_size = data.len();

        while current_size > target_bytes && quality > self.policy.min_quality {
            // Each attempt starts from the original bytes, never a previous encode.
            let mut image = self.codec.decode(data)?;
            let (width, height) = self.codec.dimensions(&image);
            if width > max || height > max {
                image = self.codec.resize_to_fit(image, max, max);
            }

            let encoded = self.codec.encode(&image, quality)?;
            tracing::debug!(
                "Re-encoded at quality {}: {} -> {} bytes",
                quality,
                data.len(),
                encoded.len()
            );

            current_size = encoded.len();
            result = Some((encoded, quality));
            quality = quality.saturating_sub(self.policy.quality_step);
        }

        Ok(result)
    }
}

impl<C: ImageCodec> Compressor for CodecCompressor<C> {
    fn compress(&self, data: &[u8], mime_type: &str, target_bytes: usize) -> Compression {
        match self.run(data, target_bytes) {
            Ok(Some((data, quality))) => Compression::Compressed {
                data,
                mime_type: COMPRESSED_MIME_TYPE.to_string(),
                quality,
            },
            Ok(None) => {
                tracing::debug!("No re-encode needed for {} ({} bytes)", mime_type, data.len());
                Compression::Skipped
            }
            Err(e) => Compression::Failed(e),
        }
    }
}

/// [`ImageCodec`] backed by the `image` crate, re-encoding as JPEG
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterCodec;

impl ImageCodec for RasterCodec {
    type Image = DynamicImage;

    fn decode(&self, data: &[u8]) -> Result<DynamicImage, CodecError> {
        image::load_from_memory(data).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn dimensions(&self, image: &DynamicImage) -> (u32, u32) {
        (image.width(), image.height())
    }

    fn resize_to_fit(&self, image: DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
        if image.width() <= max_width && image.height() <= max_height {
            return image;
        }
        image.resize(max_width, max_height, FilterType::Lanczos3)
    }

    fn encode(&self, image: &DynamicImage, quality: u8) -> Result<Vec<u8>, CodecError> {
        // JPEG has no alpha channel
        let rgb = image.to_rgb8();
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
            .encode_image(&rgb)
            .map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(out)
    }
}
