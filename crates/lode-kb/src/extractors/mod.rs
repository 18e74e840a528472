//! Format dispatch for document extraction.

use std::path::Path;

use crate::error::KbError;
use crate::types::ExtractedDocument;

pub mod html;
pub mod markdown;
pub mod pdf;
pub mod plain;

/// Extract a documentation file by extension.
///
/// # Errors
///
/// Returns [`KbError::Unsupported`] for unknown extensions, [`KbError::Io`]
/// for unreadable files, and [`KbError::Pdf`] for failed PDF extraction.
pub fn extract_document(path: &Path) -> Result<ExtractedDocument, KbError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string();

    match ext.as_str() {
        "md" | "markdown" | "mdx" => {
            let content = std::fs::read_to_string(path)?;
            Ok(markdown::extract(&content, &title))
        }
        "html" | "htm" => {
            let content = std::fs::read_to_string(path)?;
            Ok(html::extract(&content, &title))
        }
        "pdf" => pdf::extract(path, &title),
        "txt" | "text" | "rst" => {
            let content = std::fs::read_to_string(path)?;
            Ok(plain::extract(&content, &title))
        }
        other => Err(KbError::Unsupported(other.to_string())),
    }
}
