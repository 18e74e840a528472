//! Plain-text extraction with heading heuristics: underlined lines and short
//! ALL-CAPS lines start new sections.

use crate::types::{ExtractedDocument, ExtractedSection};

/// Extract a plain-text document.
#[must_use]
pub fn extract(content: &str, title: &str) -> ExtractedDocument {
    let lines: Vec<&str> = content.lines().collect();
    let mut sections = Vec::new();
    let mut current_heading: Option<String> = None;
    let mut current_text = String::new();

    let mut i = 0usize;
    while i < lines.len() {
        let line = lines[i];

        // Underlined heading: text followed by === or ---
        let is_underlined = lines.get(i + 1).is_some_and(|next| {
            let next = next.trim();
            let text = line.trim();
            !text.is_empty()
                && next.len() >= 3
                && (next.chars().all(|c| c == '=') || next.chars().all(|c| c == '-'))
        });

        if is_underlined {
            flush(&mut sections, current_heading.take(), &current_text);
            current_text.clear();
            current_heading = Some(line.trim().to_string());
            i += 2;
            continue;
        }

        if is_caps_heading(line) {
            flush(&mut sections, current_heading.take(), &current_text);
            current_text.clear();
            current_heading = Some(line.trim().to_string());
            i += 1;
            continue;
        }

        current_text.push_str(line);
        current_text.push('\n');
        i += 1;
    }
    flush(&mut sections, current_heading, &current_text);

    ExtractedDocument {
        title: title.to_string(),
        format: "text".to_string(),
        sections,
    }
}

fn flush(sections: &mut Vec<ExtractedSection>, heading: Option<String>, text: &str) {
    let trimmed = text.trim();
    if trimmed.is_empty() && heading.is_none() {
        return;
    }
    let path = heading.iter().cloned().collect();
    sections.push(ExtractedSection {
        level: u32::from(heading.is_some()),
        heading,
        content: trimmed.to_string(),
        page_number: None,
        section_path: path,
    });
}

/// Short ALL-CAPS line with at least two letters, e.g. `CHANGELOG`.
fn is_caps_heading(line: &str) -> bool {
    let trimmed = line.trim();
    let letters: Vec<char> = trimmed.chars().filter(|c| c.is_alphabetic()).collect();
    trimmed.len() < 60
        && letters.len() >= 2
        && letters.iter().all(|c| c.is_uppercase())
        && !trimmed.ends_with('.')
}
