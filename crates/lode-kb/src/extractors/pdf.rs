//! PDF extraction: per-page text with heading heuristics.

use std::path::Path;

use crate::error::KbError;
use crate::types::{ExtractedDocument, ExtractedSection};

/// Extract a PDF into sections, keeping page numbers.
///
/// # Errors
///
/// Returns [`KbError::Pdf`] if text extraction fails.
pub fn extract(path: &Path, title: &str) -> Result<ExtractedDocument, KbError> {
    let pages = pdf_extract::extract_text_by_pages(path).map_err(|e| KbError::Pdf(e.to_string()))?;
    Ok(extract_from_pages(&pages, title))
}

/// Section a list of page texts (separated out for testability).
#[must_use]
pub fn extract_from_pages(pages: &[String], title: &str) -> ExtractedDocument {
    let mut sections = Vec::new();
    let mut current_heading: Option<String> = None;
    let mut current_text = String::new();
    let mut current_page = 1u32;

    for (page_idx, page) in pages.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let page_number = page_idx as u32 + 1;

        for line in page.lines() {
            let sanitized = sanitize(line);
            if looks_like_heading(&sanitized) {
                flush(&mut sections, current_heading.take(), &current_text, current_page);
                current_text.clear();
                current_heading = Some(sanitized.trim().to_string());
                current_page = page_number;
            } else {
                current_text.push_str(&sanitized);
                current_text.push('\n');
            }
        }
    }
    flush(&mut sections, current_heading, &current_text, current_page);

    ExtractedDocument {
        title: title.to_string(),
        format: "pdf".to_string(),
        sections,
    }
}

fn flush(
    sections: &mut Vec<ExtractedSection>,
    heading: Option<String>,
    text: &str,
    page_number: u32,
) {
    let trimmed = text.trim();
    if trimmed.is_empty() && heading.is_none() {
        return;
    }
    let path = heading.iter().cloned().collect();
    sections.push(ExtractedSection {
        level: u32::from(heading.is_some()),
        heading,
        content: trimmed.to_string(),
        page_number: Some(page_number),
        section_path: path,
    });
}

/// Replace control characters PDF extraction sometimes leaves behind.
fn sanitize(line: &str) -> String {
    line.chars()
        .map(|c| if c.is_control() && c != '\t' { ' ' } else { c })
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Heading heuristics for extracted PDF text: numbered sections
/// (`3.2 Storage Layout`) or short ALL-CAPS lines.
fn looks_like_heading(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.len() > 80 {
        return false;
    }

    // Numbered section: 1. / 2.3 / 10.1.4 followed by a capitalized word
    let mut parts = trimmed.splitn(2, ' ');
    if let (Some(number), Some(rest)) = (parts.next(), parts.next())
        && number.chars().all(|c| c.is_ascii_digit() || c == '.')
        && number.chars().next().is_some_and(|c| c.is_ascii_digit())
        && rest.chars().next().is_some_and(char::is_uppercase)
    {
        return true;
    }

    let letters: Vec<char> = trimmed.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 3 && letters.iter().all(|c| c.is_uppercase()) && !trimmed.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pages_sectioned_by_headings() {
        let pages = vec![
            "INTRODUCTION\nThis manual covers the storage engine.\n".to_string(),
            "2.1 Storage Layout\nData lives in fixed-size pages.\n".to_string(),
        ];
        let doc = extract_from_pages(&pages, "manual");
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[0].heading.as_deref(), Some("INTRODUCTION"));
        assert_eq!(doc.sections[0].page_number, Some(1));
        assert_eq!(doc.sections[1].heading.as_deref(), Some("2.1 Storage Layout"));
        assert_eq!(doc.sections[1].page_number, Some(2));
        assert!(doc.sections[1].content.contains("fixed-size pages"));
    }

    #[test]
    fn body_sentences_not_headings() {
        assert!(!looks_like_heading("The quick brown fox jumps."));
        assert!(!looks_like_heading("10 times faster than before"));
        assert!(looks_like_heading("3.2 Query Planning"));
        assert!(looks_like_heading("APPENDIX"));
    }

    #[test]
    fn control_characters_sanitized() {
        assert_eq!(sanitize("text\u{0c}with\u{0} junk"), "text with  junk");
    }
}
