//! Extracted document types shared by all extractors.

use serde::{Deserialize, Serialize};

/// One section of an extracted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSection {
    /// Nearest heading, `None` for preamble before the first heading.
    pub heading: Option<String>,
    /// Heading level (1–6); 0 for preamble.
    pub level: u32,
    pub content: String,
    /// Source page for paginated formats (PDF).
    pub page_number: Option<u32>,
    /// Breadcrumb through the heading hierarchy, e.g.
    /// `["Getting Started", "Installation", "Linux"]`.
    pub section_path: Vec<String>,
}

/// A documentation file reduced to title + ordered sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub title: String,
    /// `markdown`, `html`, `pdf`, or `text`.
    pub format: String,
    pub sections: Vec<ExtractedSection>,
}

impl ExtractedDocument {
    /// Concatenated section text (heading lines included).
    #[must_use]
    pub fn full_text(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            if let Some(heading) = &section.heading {
                out.push_str(heading);
                out.push('\n');
            }
            out.push_str(&section.content);
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }
}
