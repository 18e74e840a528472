//! HTML extraction via a DOM walk: headings delimit sections, block elements
//! contribute text, script/style are dropped.

use scraper::{ElementRef, Html, Node};

use crate::types::{ExtractedDocument, ExtractedSection};

/// Extract an HTML document into heading-delimited sections.
#[must_use]
pub fn extract(content: &str, title: &str) -> ExtractedDocument {
    let document = Html::parse_document(content);

    let doc_title = scraper::Selector::parse("title")
        .ok()
        .and_then(|sel| {
            document
                .select(&sel)
                .next()
                .map(|t| t.text().collect::<String>().trim().to_string())
        })
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| title.to_string());

    let mut sections = Vec::new();
    let mut heading_stack: Vec<(u32, String)> = Vec::new();
    let mut current_heading: Option<(u32, String)> = None;
    let mut current_text = String::new();

    let body = scraper::Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next());
    if let Some(body) = body {
        walk(
            body,
            &mut sections,
            &mut heading_stack,
            &mut current_heading,
            &mut current_text,
        );
    }
    flush_section(&mut sections, &heading_stack, current_heading.as_ref(), &current_text);

    ExtractedDocument {
        title: doc_title,
        format: "html".to_string(),
        sections,
    }
}

fn walk(
    element: ElementRef,
    sections: &mut Vec<ExtractedSection>,
    heading_stack: &mut Vec<(u32, String)>,
    current_heading: &mut Option<(u32, String)>,
    current_text: &mut String,
) {
    for child in element.children() {
        match child.value() {
            Node::Element(el) => {
                let name = el.name();
                if name == "script" || name == "style" || name == "noscript" {
                    continue;
                }
                let Some(child_ref) = ElementRef::wrap(child) else {
                    continue;
                };

                if let Some(level) = heading_level(name) {
                    // A heading closes the running section
                    flush_section(sections, heading_stack, current_heading.as_ref(), current_text);
                    current_text.clear();

                    let text = child_ref.text().collect::<String>().trim().to_string();
                    while heading_stack
                        .last()
                        .is_some_and(|(l, _)| *l >= level)
                    {
                        heading_stack.pop();
                    }
                    heading_stack.push((level, text.clone()));
                    *current_heading = Some((level, text));
                } else if name == "table" {
                    current_text.push_str(&render_table(child_ref));
                } else if matches!(name, "p" | "li" | "pre" | "blockquote" | "dd" | "dt") {
                    let text = child_ref.text().collect::<String>();
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        current_text.push_str(trimmed);
                        current_text.push('\n');
                    }
                } else {
                    walk(child_ref, sections, heading_stack, current_heading, current_text);
                }
            }
            Node::Text(text) => {
                // Bare text directly under a container
                let trimmed = text.trim();
                if !trimmed.is_empty() && element.value().name() == "body" {
                    current_text.push_str(trimmed);
                    current_text.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn flush_section(
    sections: &mut Vec<ExtractedSection>,
    heading_stack: &[(u32, String)],
    heading: Option<&(u32, String)>,
    text: &str,
) {
    let trimmed = text.trim();
    if trimmed.is_empty() && heading.is_none() {
        return;
    }
    sections.push(ExtractedSection {
        heading: heading.map(|(_, t)| t.clone()),
        level: heading.map_or(0, |(l, _)| *l),
        content: trimmed.to_string(),
        page_number: None,
        section_path: heading_stack.iter().map(|(_, t)| t.clone()).collect(),
    });
}

fn heading_level(name: &str) -> Option<u32> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Render a table as pipe-separated rows.
fn render_table(table: ElementRef) -> String {
    let mut out = String::new();
    let Ok(row_sel) = scraper::Selector::parse("tr") else {
        return out;
    };
    let Ok(cell_sel) = scraper::Selector::parse("td, th") else {
        return out;
    };
    for row in table.select(&row_sel) {
        let cells: Vec<String> = row
            .select(&cell_sel)
            .map(|c| c.text().collect::<String>().trim().to_string())
            .collect();
        if !cells.is_empty() {
            out.push_str(&cells.join(" | "));
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r"<html>
<head><title>API Reference</title><style>body { color: red; }</style></head>
<body>
<h1>Overview</h1>
<p>The service exposes a REST API.</p>
<script>console.log('tracking');</script>
<h2>Authentication</h2>
<p>Use bearer tokens.</p>
<table><tr><th>Header</th><th>Value</th></tr><tr><td>Authorization</td><td>Bearer ...</td></tr></table>
</body>
</html>";

    #[test]
    fn title_from_title_tag() {
        let doc = extract(SAMPLE, "fallback");
        assert_eq!(doc.title, "API Reference");
    }

    #[test]
    fn headings_delimit_sections() {
        let doc = extract(SAMPLE, "fallback");
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[0].heading.as_deref(), Some("Overview"));
        assert!(doc.sections[0].content.contains("REST API"));
        assert_eq!(doc.sections[1].heading.as_deref(), Some("Authentication"));
        assert_eq!(doc.sections[1].section_path, vec!["Overview", "Authentication"]);
    }

    #[test]
    fn scripts_and_styles_dropped() {
        let doc = extract(SAMPLE, "fallback");
        let all: String = doc.sections.iter().map(|s| s.content.clone()).collect();
        assert!(!all.contains("tracking"));
        assert!(!all.contains("color: red"));
    }

    #[test]
    fn tables_rendered_as_rows() {
        let doc = extract(SAMPLE, "fallback");
        assert!(doc.sections[1].content.contains("Header | Value"));
        assert!(doc.sections[1].content.contains("Authorization | Bearer ..."));
    }

    #[test]
    fn empty_body() {
        let doc = extract("<html><body></body></html>", "empty");
        assert!(doc.sections.is_empty());
        assert_eq!(doc.title, "empty");
    }
}
