//! Template script extraction.
//!
//! Pulls embedded script source out of template files (`<script>` blocks in
//! HTML-family templates, frontmatter in Astro components) and combines the
//! blocks into a single parseable source with a line map back to the
//! original file. Every downstream line number (symbols, edges, chunks) is
//! remapped through that map before persistence.

use std::collections::HashMap;

use lode_core::enums::Language;

/// One extracted script block, with its position in the original file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptBlock {
    pub content: String,
    /// 1-indexed line of the block's first content line in the original file.
    pub start_line: u32,
    /// 1-indexed line of the block's last content line in the original file.
    pub end_line: u32,
    pub language: Language,
}

/// Maps combined-source line numbers (1-indexed) to original file lines.
pub type LineMap = HashMap<u32, u32>;

/// Extract script blocks from a template file.
///
/// - `.vue` / `.svelte` / HTML-family: every `<script>` block; a `lang="ts"`
///   attribute flips the block to TypeScript.
/// - `.astro`: the leading `---` frontmatter (typed source) plus `<script>`
///   blocks.
#[must_use]
pub fn extract_script_blocks(content: &str, extension: &str) -> Vec<ScriptBlock> {
    match extension {
        ".astro" => {
            let mut blocks = extract_frontmatter(content);
            blocks.extend(extract_html_script_tags(content));
            blocks
        }
        _ => extract_html_script_tags(content),
    }
}

/// Combine blocks into one source. Blocks are separated by a blank line; the
/// returned map sends each combined line to its original file line.
#[must_use]
pub fn combine_script_blocks(blocks: &[ScriptBlock]) -> (String, LineMap) {
    if blocks.is_empty() {
        return (String::new(), LineMap::new());
    }

    let mut combined_lines: Vec<&str> = Vec::new();
    let mut line_map = LineMap::new();
    let mut current_line = 1u32;

    for block in blocks {
        let mut original_line = block.start_line;
        for line in block.content.split('\n') {
            combined_lines.push(line);
            line_map.insert(current_line, original_line);
            current_line += 1;
            original_line += 1;
        }
        // Separator maps to the end of the block it follows
        combined_lines.push("");
        line_map.insert(current_line, block.end_line);
        current_line += 1;
    }

    (combined_lines.join("\n"), line_map)
}

/// Remap a line number through the map; lines outside the map pass through.
#[must_use]
pub fn remap_line(line_map: &LineMap, line: u32) -> u32 {
    line_map.get(&line).copied().unwrap_or(line)
}

fn script_open_regex() -> regex::Regex {
    regex::Regex::new(r"(?i)<script(\s+[^>]*)?>").unwrap_or_else(|_| unreachable!())
}

fn script_close_regex() -> regex::Regex {
    regex::Regex::new(r"(?i)</script>").unwrap_or_else(|_| unreachable!())
}

fn block_language(open_tag: &str) -> Language {
    let lowered = open_tag.to_lowercase();
    if lowered.contains("lang=\"ts\"")
        || lowered.contains("lang='ts'")
        || lowered.contains("type=\"text/typescript\"")
    {
        Language::Typescript
    } else {
        Language::Javascript
    }
}

#[allow(clippy::too_many_lines)]
fn extract_html_script_tags(content: &str) -> Vec<ScriptBlock> {
    let open_re = script_open_regex();
    let close_re = script_close_regex();
    let lines: Vec<&str> = content.split('\n').collect();
    let mut blocks = Vec::new();

    let mut i = 0usize;
    while i < lines.len() {
        let line = lines[i];
        let Some(open) = open_re.find(line) else {
            i += 1;
            continue;
        };
        let language = block_language(open.as_str());
        #[allow(clippy::cast_possible_truncation)]
        let tag_line = i as u32 + 1;

        // Opening and closing tag on the same line
        if let Some(close) = close_re.find_at(line, open.end()) {
            let script = &line[open.end()..close.start()];
            if !script.trim().is_empty() {
                blocks.push(ScriptBlock {
                    content: script.to_string(),
                    start_line: tag_line,
                    end_line: tag_line,
                    language,
                });
            }
            i += 1;
            continue;
        }

        // Multi-line block: collect until the closing tag. The block's
        // start_line is its first content line so the combined-source line
        // map lands on lines that actually hold the mapped text.
        let mut script_lines: Vec<&str> = Vec::new();
        let after_open = &line[open.end()..];
        let start_line = if after_open.trim().is_empty() {
            tag_line + 1
        } else {
            script_lines.push(after_open);
            tag_line
        };

        i += 1;
        while i < lines.len() {
            let line = lines[i];
            if let Some(close) = close_re.find(line) {
                let before_close = &line[..close.start()];
                if !before_close.trim().is_empty() {
                    script_lines.push(before_close);
                }
                #[allow(clippy::cast_possible_truncation)]
                let end_line = i as u32 + 1;
                let script = script_lines.join("\n");
                if !script.trim().is_empty() {
                    blocks.push(ScriptBlock {
                        content: script,
                        start_line,
                        end_line,
                        language,
                    });
                }
                break;
            }
            script_lines.push(line);
            i += 1;
        }

        i += 1;
    }

    blocks
}

/// Astro frontmatter: typed source between `---` fences at the top of the file.
fn extract_frontmatter(content: &str) -> Vec<ScriptBlock> {
    let lines: Vec<&str> = content.split('\n').collect();
    if lines.first().map(|l| l.trim()) != Some("---") {
        return Vec::new();
    }

    let mut frontmatter_lines: Vec<&str> = Vec::new();
    for (i, line) in lines.iter().enumerate().skip(1) {
        if line.trim() == "---" {
            let body = frontmatter_lines.join("\n");
            if body.trim().is_empty() {
                return Vec::new();
            }
            #[allow(clippy::cast_possible_truncation)]
            return vec![ScriptBlock {
                content: body,
                start_line: 2,
                end_line: i as u32,
                language: Language::Typescript,
            }];
        }
        frontmatter_lines.push(line);
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn multi_line_script_block() {
        let html = "<html>\n<body>\n<script>\nfunction greet() {\n  return 'hi';\n}\n</script>\n</body>\n</html>\n";
        let blocks = extract_script_blocks(html, ".html");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start_line, 4);
        assert_eq!(blocks[0].end_line, 7);
        assert_eq!(blocks[0].language, Language::Javascript);
        assert!(blocks[0].content.contains("function greet"));
    }

    #[test]
    fn lang_ts_flips_to_typescript() {
        let vue = "<template><div/></template>\n<script lang=\"ts\">\nconst n: number = 1;\n</script>\n";
        let blocks = extract_script_blocks(vue, ".vue");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].language, Language::Typescript);
    }

    #[test]
    fn single_line_script_tag() {
        let html = "<script>var x = 1;</script>\n";
        let blocks = extract_script_blocks(html, ".html");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content, "var x = 1;");
        assert_eq!(blocks[0].start_line, 1);
        assert_eq!(blocks[0].end_line, 1);
    }

    #[test]
    fn multiple_blocks_svelte() {
        let svelte = "<script context=\"module\">\nexport const kind = 'widget';\n</script>\n\n<script>\nlet count = 0;\n</script>\n\n<button>{count}</button>\n";
        let blocks = extract_script_blocks(svelte, ".svelte");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].start_line, 2);
        assert_eq!(blocks[1].start_line, 6);
    }

    #[test]
    fn astro_frontmatter_is_typescript() {
        let astro = "---\nconst title: string = 'Home';\n---\n<h1>{title}</h1>\n<script>\nconsole.log('hydrated');\n</script>\n";
        let blocks = extract_script_blocks(astro, ".astro");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].language, Language::Typescript);
        assert_eq!(blocks[0].start_line, 2);
        assert_eq!(blocks[0].end_line, 2);
        assert_eq!(blocks[1].language, Language::Javascript);
    }

    #[test]
    fn empty_template_yields_empty_source() {
        let html = "<html><body><p>No scripts here.</p></body></html>\n";
        let blocks = extract_script_blocks(html, ".html");
        assert!(blocks.is_empty());
        let (combined, map) = combine_script_blocks(&blocks);
        assert!(combined.is_empty());
        assert!(map.is_empty());
    }

    #[test]
    fn line_map_points_into_original_file() {
        let html = "<html>\n<script>\nfunction a() {}\nfunction b() {}\n</script>\n<script>\nfunction c() {}\n</script>\n</html>\n";
        let blocks = extract_script_blocks(html, ".html");
        let (combined, map) = combine_script_blocks(&blocks);

        // Every combined content line maps back to an original line holding it
        let original_lines: Vec<&str> = html.split('\n').collect();
        for (idx, line) in combined.split('\n').enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            #[allow(clippy::cast_possible_truncation)]
            let combined_line = idx as u32 + 1;
            let original = remap_line(&map, combined_line);
            assert_eq!(
                original_lines[original as usize - 1].trim(),
                line.trim(),
                "combined line {combined_line} should map to its source"
            );
        }

        // function c() lives on original line 7
        let c_combined = combined
            .split('\n')
            .position(|l| l.contains("function c"))
            .unwrap();
        #[allow(clippy::cast_possible_truncation)]
        let mapped = remap_line(&map, c_combined as u32 + 1);
        assert_eq!(mapped, 7);
    }

    #[test]
    fn unmapped_lines_pass_through() {
        let map = LineMap::new();
        assert_eq!(remap_line(&map, 42), 42);
    }
}
