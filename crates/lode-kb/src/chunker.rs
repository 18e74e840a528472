//! Document chunking for embedding.
//!
//! Turns an [`ExtractedDocument`] into overlapping, heading-preserving chunks:
//!
//! - One chunk per section when the section fits the target size
//! - Oversized sections split at paragraph boundaries with overlap
//! - Every chunk carries its section-path breadcrumb and detected topics
//! - Empty and whitespace-only chunks are skipped

use serde::{Deserialize, Serialize};

use crate::types::ExtractedDocument;

/// Chunk sizing knobs.
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Hard cap per chunk, in characters.
    pub max_chars: usize,
    /// Overlap carried between consecutive sub-chunks of one section.
    pub overlap_chars: usize,
    /// Sections below this size merge with the next one.
    pub min_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 4_000,
            overlap_chars: 400,
            min_chars: 200,
        }
    }
}

/// One embedding-ready piece of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocChunk {
    pub heading: Option<String>,
    pub section_path: Vec<String>,
    pub content: String,
    pub chunk_index: u32,
    pub page_number: Option<u32>,
    /// Rough token estimate (chars / 4).
    pub token_count_approx: u32,
    pub topics: Vec<String>,
}

/// Keyword table for topic detection on doc chunks.
const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    ("authentication", &["auth", "login", "token", "password", "credential"]),
    ("configuration", &["config", "setting", "environment variable", "option"]),
    ("limits", &["limit", "maximum", "minimum", "quota", "threshold", "at most"]),
    ("storage", &["database", "table", "schema", "index", "query"]),
    ("api", &["endpoint", "request", "response", "rest", "rpc"]),
    ("deployment", &["deploy", "docker", "kubernetes", "install", "release"]),
];

/// Chunk an extracted document.
#[must_use]
pub fn chunk_extracted(document: &ExtractedDocument, config: &ChunkingConfig) -> Vec<DocChunk> {
    let mut chunks = Vec::new();
    let mut chunk_index = 0u32;

    let mut pending: Option<PendingSection> = None;

    for section in &document.sections {
        let body = section.content.trim();
        // Heading-only sections are skipped: the heading already appears in
        // every child section's breadcrumb.
        if body.is_empty() {
            continue;
        }

        // Merge undersized sections into the following one to avoid
        // fragmenting retrieval over one-line sections.
        if let Some(prev) = pending.take() {
            if prev.content.len() < config.min_chars
                && prev.content.len() + body.len() < config.max_chars
            {
                let merged = PendingSection {
                    heading: prev.heading,
                    section_path: prev.section_path,
                    page_number: prev.page_number,
                    content: format!(
                        "{}\n\n{}{}",
                        prev.content,
                        section
                            .heading
                            .as_deref()
                            .map(|h| format!("{h}\n"))
                            .unwrap_or_default(),
                        body
                    ),
                };
                pending = Some(merged);
                continue;
            }
            emit(&prev, config, &mut chunks, &mut chunk_index);
        }

        pending = Some(PendingSection {
            heading: section.heading.clone(),
            section_path: section.section_path.clone(),
            page_number: section.page_number,
            content: body.to_string(),
        });
    }

    if let Some(last) = pending {
        emit(&last, config, &mut chunks, &mut chunk_index);
    }

    chunks
}

struct PendingSection {
    heading: Option<String>,
    section_path: Vec<String>,
    page_number: Option<u32>,
    content: String,
}

fn emit(
    section: &PendingSection,
    config: &ChunkingConfig,
    chunks: &mut Vec<DocChunk>,
    chunk_index: &mut u32,
) {
    if section.content.trim().is_empty() {
        return;
    }
    for piece in split_to_size(&section.content, config.max_chars, config.overlap_chars) {
        #[allow(clippy::cast_possible_truncation)]
        let token_count_approx = (piece.len() / 4) as u32;
        chunks.push(DocChunk {
            heading: section.heading.clone(),
            section_path: section.section_path.clone(),
            topics: detect_topics(&piece, &section.section_path),
            content: piece,
            chunk_index: *chunk_index,
            page_number: section.page_number,
            token_count_approx,
        });
        *chunk_index += 1;
    }
}

/// Split text at paragraph boundaries, carrying `overlap` characters of the
/// previous piece into the next.
fn split_to_size(text: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    if text.len() <= max_chars {
        return vec![text.to_string()];
    }

    let paragraphs: Vec<&str> = text.split("\n\n").collect();
    let mut pieces = Vec::new();
    let mut current = String::new();

    for paragraph in paragraphs {
        // A single oversized paragraph falls back to a hard character split
        if paragraph.len() > max_chars {
            if !current.trim().is_empty() {
                pieces.push(current.clone());
            }
            current = carry_overlap(pieces.last(), overlap);
            for hard in hard_split(paragraph, max_chars) {
                if !current.is_empty() {
                    current.push_str("\n\n");
                }
                current.push_str(&hard);
                pieces.push(current.clone());
                current = carry_overlap(pieces.last(), overlap);
            }
            continue;
        }

        if current.len() + paragraph.len() + 2 > max_chars && !current.trim().is_empty() {
            pieces.push(current.clone());
            current = carry_overlap(pieces.last(), overlap);
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }

    if !current.trim().is_empty() {
        pieces.push(current);
    }
    pieces
}

fn carry_overlap(previous: Option<&String>, overlap: usize) -> String {
    let Some(previous) = previous else {
        return String::new();
    };
    if overlap == 0 || previous.len() <= overlap {
        return String::new();
    }
    let mut start = previous.len() - overlap;
    while start < previous.len() && !previous.is_char_boundary(start) {
        start += 1;
    }
    previous[start..].to_string()
}

fn hard_split(text: &str, max_chars: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut start = 0usize;
    while start < text.len() {
        let mut end = (start + max_chars).min(text.len());
        while end < text.len() && !text.is_char_boundary(end) {
            end += 1;
        }
        out.push(text[start..end].to_string());
        start = end;
    }
    out
}

fn detect_topics(content: &str, section_path: &[String]) -> Vec<String> {
    let haystack = format!("{} {}", section_path.join(" "), content).to_lowercase();
    let mut topics = Vec::new();
    for (topic, keywords) in TOPIC_KEYWORDS {
        if keywords.iter().any(|kw| haystack.contains(kw)) {
            topics.push((*topic).to_string());
        }
    }
    topics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::markdown;
    use pretty_assertions::assert_eq;

    #[test]
    fn one_chunk_per_small_section() {
        let md = format!(
            "# Guide\n\n{}\n\n## Limits\n\n{}\n",
            "Overview paragraph with enough text to stand on its own. ".repeat(6),
            "Each user can have at most 10 active sessions. ".repeat(6),
        );
        let doc = markdown::extract(&md, "guide");
        let chunks = chunk_extracted(&doc, &ChunkingConfig::default());
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].heading.as_deref(), Some("Guide"));
        assert_eq!(chunks[1].section_path, vec!["Guide", "Limits"]);
        assert!(chunks[1].topics.contains(&"limits".to_string()));
    }

    #[test]
    fn oversized_section_splits_with_overlap() {
        let paragraph = "Sentences about configuration settings and options. ".repeat(8);
        let body: String = (0..20).map(|_| format!("{paragraph}\n\n")).collect();
        let md = format!("# Config\n\n{body}");
        let doc = markdown::extract(&md, "config");

        let config = ChunkingConfig {
            max_chars: 2_000,
            overlap_chars: 200,
            min_chars: 100,
        };
        let chunks = chunk_extracted(&doc, &config);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                chunk.content.len() <= config.max_chars + config.overlap_chars + 2,
                "chunk len {}",
                chunk.content.len()
            );
            assert_eq!(chunk.heading.as_deref(), Some("Config"));
        }
        // Consecutive chunks share overlap text
        let first_tail: String = chunks[0]
            .content
            .chars()
            .rev()
            .take(50)
            .collect::<String>()
            .chars()
            .rev()
            .collect();
        assert!(chunks[1].content.contains(&first_tail));
    }

    #[test]
    fn tiny_sections_merge_forward() {
        let md = "# A\n\nshort\n\n## B\n\nAlso short but the merge keeps these two sections in one chunk for retrieval.\n";
        let doc = markdown::extract(md, "doc");
        let chunks = chunk_extracted(&doc, &ChunkingConfig::default());
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].content.contains("short"));
        assert!(chunks[0].content.contains("B\n"));
    }

    #[test]
    fn chunk_indexes_are_sequential() {
        let md = "# One\n\nfirst section body long enough to not merge with the next one because it exceeds the minimum chunk size configured for this test case and then some.\n\n# Two\n\nsecond section body long enough to not merge with anything else because it also exceeds the minimum size threshold set in the configuration used here.\n";
        let doc = markdown::extract(md, "doc");
        let chunks = chunk_extracted(&doc, &ChunkingConfig::default());
        let indexes: Vec<u32> = chunks.iter().map(|c| c.chunk_index).collect();
        assert_eq!(indexes, (0..chunks.len() as u32).collect::<Vec<_>>());
    }

    #[test]
    fn empty_document_has_no_chunks() {
        let doc = markdown::extract("", "empty");
        assert!(chunk_extracted(&doc, &ChunkingConfig::default()).is_empty());
    }

    #[test]
    fn token_estimate_tracks_length() {
        let md = format!("# T\n\n{}\n", "word ".repeat(400));
        let doc = markdown::extract(&md, "doc");
        let chunks = chunk_extracted(&doc, &ChunkingConfig::default());
        assert_eq!(chunks.len(), 1);
        let expected = chunks[0].content.len() / 4;
        assert_eq!(chunks[0].token_count_approx as usize, expected);
    }
}
