//! Knowledge-base error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KbError {
    /// File could not be read.
    #[error("I/O error reading document: {0}")]
    Io(#[from] std::io::Error),

    /// PDF text extraction failed.
    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    /// The file extension has no extractor.
    #[error("Unsupported document format: {0}")]
    Unsupported(String),
}
