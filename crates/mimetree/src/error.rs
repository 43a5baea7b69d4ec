//! Error types for MIME operations.

use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
///
/// Parsing never fails: malformed input degrades to coarser structures.
/// These errors come from building parts (file I/O, missing configuration)
/// and from decoding stored content.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File referenced by a body or attachment does not exist.
    #[error("The file '{}' does not exist", .0.display())]
    FileNotFound(PathBuf),

    /// I/O error while reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Header value parameters requested without a delimiter.
    #[error("No delimiter has been set")]
    MissingDelimiter,

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Invalid encoding.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// UTF-8 decode error.
    #[error("UTF-8 decode error: {0}")]
    Utf8Decode(#[from] FromUtf8Error),
}

impl Error {
    /// Returns true if this error was caused by a missing file.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound(_))
    }
}
