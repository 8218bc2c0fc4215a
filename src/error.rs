//! Error types for the gemini-unmark crate.

use std::path::PathBuf;

/// Errors that can occur while loading templates or processing image files.
///
/// The detection and removal math itself is infallible; everything here comes
/// from decoding embedded templates or from file I/O around the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to decode an embedded watermark template PNG.
    #[error("failed to decode watermark template PNG: {0}")]
    TemplateDecode(image::ImageError),

    /// An embedded template decoded to unexpected dimensions.
    #[error("watermark template is {width}x{height}, expected {expected}x{expected}")]
    TemplateDimensions {
        /// Decoded width in pixels.
        width: u32,
        /// Decoded height in pixels.
        height: u32,
        /// Logo size the template must have.
        expected: u32,
    },

    /// The input image does not exist.
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The output format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred while decoding or encoding an image.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
