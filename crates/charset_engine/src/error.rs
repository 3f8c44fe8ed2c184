//! Unified error types for charset_engine

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for charset_engine operations
#[derive(Debug, Error)]
pub enum CharsetError {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Font Errors ===
    #[error("Failed to open font '{path}': {message}")]
    FontLoad { path: PathBuf, message: String },

    #[error("Invalid font data: {message}")]
    InvalidFontData { message: String },

    // === Charmap Errors ===
    #[error("Too many glyph slots requested: {count} (maximum is 8192)")]
    TooManyGlyphs { count: usize },

    // === Atlas Errors ===
    #[error("Atlas width is too small for this charmap, at least {required} pixels are needed")]
    AtlasTooNarrow { required: usize },

    // === Format Errors ===
    #[error("Unsupported bits per pixel: {bpp}")]
    UnsupportedBpp { bpp: u8 },

    #[error("File too short to be valid")]
    FileTooShort,

    #[error("Invalid file ID or magic number mismatch")]
    IdMismatch,

    #[error("Unsupported charset version: {version:#06x}")]
    UnsupportedVersion { version: u16 },

    #[error("Invalid glyph count: {count}")]
    InvalidGlyphCount { count: usize },

    #[error("Data out of bounds at offset {offset}")]
    OutOfBounds { offset: usize },

    // === External Errors ===
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type alias for charset_engine operations
pub type Result<T> = std::result::Result<T, CharsetError>;
