//! Code chunking: file header + per-symbol chunks with a sliding window for
//! oversized content.
//!
//! Every chunk fits the embedding input budget: at most `MAX + OVERLAP`
//! characters. Oversized spans slide a `MAX + OVERLAP` window with stride
//! `MAX`, so consecutive chunks overlap by `OVERLAP` characters.

use lode_core::hashing::content_hash_str;

use crate::types::{CodeChunk, ParsedSymbol};

/// Maximum chunk size in characters. Sized so the largest chunk stays under
/// typical embedding-model input limits.
pub const MAX_CHUNK_CHARS: usize = 4_000;

/// Overlap between consecutive chunks of one span.
pub const OVERLAP_CHARS: usize = 500;

/// Produce chunks for a file: header chunk(s) covering everything before the
/// first symbol, then one or more chunks per symbol.
#[must_use]
pub fn create_chunks(source: &str, symbols: &[ParsedSymbol]) -> Vec<CodeChunk> {
    let mut chunks = Vec::new();

    chunks.extend(header_chunks(source, symbols));
    for symbol in symbols {
        chunks.extend(symbol_chunks(source, symbol));
    }

    chunks
}

/// Fixed-line chunks for files with no parser (default 100 lines, no overlap).
#[must_use]
pub fn plain_text_chunks(source: &str, max_lines: usize) -> Vec<CodeChunk> {
    let lines: Vec<&str> = source.split_inclusive('\n').collect();
    if lines.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = 0usize;
    while current < lines.len() {
        let end = (current + max_lines).min(lines.len());
        let content: String = lines[current..end].concat();
        #[allow(clippy::cast_possible_truncation)]
        chunks.push(CodeChunk {
            symbol_fqn: None,
            start_line: current as u32 + 1,
            end_line: end as u32,
            content_hash: content_hash_str(&content),
            content,
        });
        current = end;
    }
    chunks
}

/// One placeholder chunk for content that cannot be decoded as text.
#[must_use]
pub fn binary_placeholder_chunk(byte_len: usize) -> CodeChunk {
    let content = format!("[Binary file - {byte_len} bytes]");
    CodeChunk {
        symbol_fqn: None,
        start_line: 1,
        end_line: 1,
        content_hash: content_hash_str(&content),
        content,
    }
}

fn header_chunks(source: &str, symbols: &[ParsedSymbol]) -> Vec<CodeChunk> {
    let first_symbol_line = symbols
        .iter()
        .map(|s| s.start_line)
        .min()
        .unwrap_or_else(|| {
            #[allow(clippy::cast_possible_truncation)]
            let line_count = source.lines().count() as u32;
            line_count + 1
        });
    if first_symbol_line <= 1 {
        return Vec::new();
    }

    let header: String = source
        .split_inclusive('\n')
        .take(first_symbol_line as usize - 1)
        .collect();
    let trimmed = header.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if trimmed.len() <= MAX_CHUNK_CHARS {
        return vec![CodeChunk {
            symbol_fqn: None,
            start_line: 1,
            end_line: first_symbol_line - 1,
            content: trimmed.to_string(),
            content_hash: content_hash_str(trimmed),
        }];
    }

    slide_window(trimmed, 1, None)
}

fn symbol_chunks(source: &str, symbol: &ParsedSymbol) -> Vec<CodeChunk> {
    let bytes = source.as_bytes();
    let range = symbol.start_byte as usize..symbol.end_byte as usize;
    let content = match bytes.get(range) {
        Some(slice) => String::from_utf8_lossy(slice).into_owned(),
        None => return Vec::new(),
    };

    if content.len() <= MAX_CHUNK_CHARS {
        return vec![CodeChunk {
            symbol_fqn: Some(symbol.fqn.clone()),
            start_line: symbol.start_line,
            end_line: symbol.end_line,
            content_hash: symbol.content_hash.clone(),
            content,
        }];
    }

    slide_window(&content, symbol.start_line, Some(&symbol.fqn))
}

/// Slide a `MAX + OVERLAP` window over `content` with stride `MAX`, remapping
/// line numbers against `base_line`.
fn slide_window(content: &str, base_line: u32, symbol_fqn: Option<&str>) -> Vec<CodeChunk> {
    let mut chunks = Vec::new();
    let mut pos = 0usize;

    while pos < content.len() {
        // Stride is MAX, window is MAX + OVERLAP: the trailing OVERLAP of one
        // chunk is the leading OVERLAP of the next.
        let start = pos;
        let end = (start + MAX_CHUNK_CHARS + OVERLAP_CHARS).min(content.len());

        // Align to char boundaries so slicing never splits a code point
        let start = floor_char_boundary(content, start);
        let end = floor_char_boundary(content, end);
        let chunk_content = &content[start..end];

        #[allow(clippy::cast_possible_truncation)]
        let start_line = base_line + content[..start].matches('\n').count() as u32;
        #[allow(clippy::cast_possible_truncation)]
        let end_line = base_line + content[..end].matches('\n').count() as u32;

        chunks.push(CodeChunk {
            symbol_fqn: symbol_fqn.map(String::from),
            start_line,
            end_line,
            content: chunk_content.to_string(),
            content_hash: content_hash_str(chunk_content),
        });

        pos += MAX_CHUNK_CHARS;
    }

    chunks
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
