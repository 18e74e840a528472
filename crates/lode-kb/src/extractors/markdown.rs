//! Markdown extraction: split by ATX and setext headings, tracking the
//! heading hierarchy to produce section paths.

use crate::types::{ExtractedDocument, ExtractedSection};

struct Heading {
    line: usize,
    level: u32,
    title: String,
}

/// Extract a markdown document into heading-delimited sections.
#[must_use]
pub fn extract(content: &str, title: &str) -> ExtractedDocument {
    let lines: Vec<&str> = content.lines().collect();
    let headings = find_headings(&lines);

    let mut sections = Vec::new();
    let mut heading_stack: Vec<(u32, String)> = Vec::new();

    // Preamble before the first heading
    let first_heading_line = headings.first().map_or(lines.len(), |h| h.line);
    let preamble = lines[..first_heading_line].join("\n");
    if !preamble.trim().is_empty() {
        sections.push(ExtractedSection {
            heading: None,
            level: 0,
            content: preamble.trim().to_string(),
            page_number: None,
            section_path: Vec::new(),
        });
    }

    for (i, heading) in headings.iter().enumerate() {
        while heading_stack
            .last()
            .is_some_and(|(level, _)| *level >= heading.level)
        {
            heading_stack.pop();
        }
        heading_stack.push((heading.level, heading.title.clone()));

        // Setext headings occupy two lines
        let body_start = heading.line + if is_setext(&lines, heading.line) { 2 } else { 1 };
        let body_end = headings.get(i + 1).map_or(lines.len(), |next| next.line);
        let body = if body_start < body_end {
            lines[body_start..body_end].join("\n")
        } else {
            String::new()
        };

        sections.push(ExtractedSection {
            heading: Some(heading.title.clone()),
            level: heading.level,
            content: body.trim().to_string(),
            page_number: None,
            section_path: heading_stack.iter().map(|(_, t)| t.clone()).collect(),
        });
    }

    // Prefer a top-level `# Title` over the file stem
    let doc_title = headings
        .iter()
        .find(|h| h.level == 1)
        .map_or_else(|| title.to_string(), |h| h.title.clone());

    ExtractedDocument {
        title: doc_title,
        format: "markdown".to_string(),
        sections,
    }
}

fn find_headings(lines: &[&str]) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut in_code_fence = false;

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim_end();
        if trimmed.trim_start().starts_with("```") || trimmed.trim_start().starts_with("~~~") {
            in_code_fence = !in_code_fence;
            continue;
        }
        if in_code_fence {
            continue;
        }

        // ATX: `## Title`
        if let Some(stripped) = trimmed.strip_prefix('#') {
            let mut level = 1u32;
            let mut rest = stripped;
            while let Some(more) = rest.strip_prefix('#') {
                level += 1;
                rest = more;
            }
            if level <= 6 && (rest.is_empty() || rest.starts_with(' ')) {
                let text = rest.trim().trim_end_matches('#').trim();
                if !text.is_empty() {
                    headings.push(Heading {
                        line: i,
                        level,
                        title: text.to_string(),
                    });
                }
                continue;
            }
        }

        // Setext: a text line underlined with === or ---
        if is_setext(lines, i) {
            let underline = lines[i + 1].trim();
            let level = if underline.starts_with('=') { 1 } else { 2 };
            headings.push(Heading {
                line: i,
                level,
                title: trimmed.trim().to_string(),
            });
        }
    }

    headings
}

fn is_setext(lines: &[&str], line: usize) -> bool {
    let Some(text) = lines.get(line) else {
        return false;
    };
    let Some(underline) = lines.get(line + 1) else {
        return false;
    };
    let text = text.trim();
    let underline = underline.trim();
    !text.is_empty()
        && !text.starts_with('#')
        && !text.starts_with('-')
        && underline.len() >= 3
        && (underline.chars().all(|c| c == '=') || underline.chars().all(|c| c == '-'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "Intro paragraph before any heading.\n\n# Getting Started\n\nWelcome text.\n\n## Installation\n\nRun the installer.\n\n### Linux\n\nUse the package manager.\n\n## Configuration\n\nEdit the config file.\n";

    #[test]
    fn preamble_and_sections() {
        let doc = extract(SAMPLE, "guide");
        assert_eq!(doc.title, "Getting Started");
        assert_eq!(doc.sections.len(), 5);
        assert!(doc.sections[0].heading.is_none());
        assert!(doc.sections[0].content.contains("Intro paragraph"));
    }

    #[test]
    fn section_paths_follow_hierarchy() {
        let doc = extract(SAMPLE, "guide");
        let linux = doc
            .sections
            .iter()
            .find(|s| s.heading.as_deref() == Some("Linux"))
            .unwrap();
        assert_eq!(
            linux.section_path,
            vec!["Getting Started", "Installation", "Linux"]
        );
        assert_eq!(linux.level, 3);

        let config = doc
            .sections
            .iter()
            .find(|s| s.heading.as_deref() == Some("Configuration"))
            .unwrap();
        assert_eq!(config.section_path, vec!["Getting Started", "Configuration"]);
    }

    #[test]
    fn setext_headings_detected() {
        let md = "Title Line\n==========\n\nBody text.\n\nSubtitle\n--------\n\nMore text.\n";
        let doc = extract(md, "doc");
        assert_eq!(doc.title, "Title Line");
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[1].heading.as_deref(), Some("Subtitle"));
        assert_eq!(doc.sections[1].level, 2);
        assert!(doc.sections[1].content.contains("More text."));
    }

    #[test]
    fn fenced_code_hash_lines_are_not_headings() {
        let md = "# Real Heading\n\n```bash\n# not a heading\necho hi\n```\n\nTail text.\n";
        let doc = extract(md, "doc");
        assert_eq!(doc.sections.len(), 1);
        assert!(doc.sections[0].content.contains("# not a heading"));
    }

    #[test]
    fn empty_document() {
        let doc = extract("", "empty");
        assert!(doc.sections.is_empty());
        assert_eq!(doc.title, "empty");
    }
}
