//! Error types for raster import, printer configuration and printer I/O.
//!
//! Raster geometry never fails with an [`Error`]: an invalid crop returns
//! `None` and an invalid erase or paste returns the bitmap unchanged. The
//! variants below cover decoding, configuration and transport problems only.

use thiserror::Error;

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Pixel buffer does not match the declared bitmap size.
    ///
    /// A bitmap of `width x height` needs exactly `height * ceil(width / 8)`
    /// bytes of packed pixel data.
    #[error("Invalid content length: expected {expected} bytes, found {actual}")]
    InvalidContentLength { expected: usize, actual: usize },

    #[error(transparent)]
    Base64(#[from] base64::DecodeError),

    /// Image decoding or encoding error.
    ///
    /// Wraps errors from the `image` crate when a PNG cannot be read or
    /// written.
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// I/O error while talking to a printer device, socket or file.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A serial port could not be opened with the configured line settings.
    #[error(transparent)]
    Serial(#[from] serialport::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Hex(#[from] hex::FromHexError),

    /// Invalid configuration parameter provided.
    ///
    /// This error occurs when a printer entry has a missing address or a
    /// value the backend cannot use.
    #[error("Invalid configuration parameter: {0}")]
    InvalidConfig(String),

    #[error("No printer named {0:?}")]
    UnknownPrinter(String),

    #[error("Unknown printer type {0:?}")]
    UnknownPrinterType(String),

    /// The configuration did not yield a single usable printer.
    #[error("No printers configured or all failed to open")]
    NoPrinters,

    #[error("No data to print")]
    EmptyData,

    /// Bytes at `offset` are not a `GS v 0` raster block.
    #[error("Invalid raster command at offset {offset}")]
    InvalidRasterCommand { offset: usize },

    /// A glyph rectangle lies outside the reference image.
    #[error("Glyph area for {0:?} is outside the reference image")]
    InvalidGlyphArea(String),
}

/// Result type for fallible operations of this crate.
pub type Result<T> = std::result::Result<T, Error>;
