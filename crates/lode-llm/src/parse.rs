//! JSON recovery from LLM output.
//!
//! Models wrap JSON in prose, markdown fences, or reasoning preambles. Three
//! fallbacks, in order: direct parse, fenced code block, bracketed scan.

use serde_json::Value;

/// Parse JSON from an LLM response, or `None` if nothing parseable is found.
#[must_use]
pub fn parse_json_response(text: &str) -> Option<Value> {
    let trimmed = text.trim();

    // 1. Direct parse
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    // 2. Markdown code block
    if let Some(block) = fenced_block(trimmed)
        && let Ok(value) = serde_json::from_str::<Value>(block.trim())
    {
        return Some(value);
    }

    // 3. First balanced object or array in the text
    for open in ['{', '['] {
        if let Some(candidate) = balanced_span(trimmed, open)
            && let Ok(value) = serde_json::from_str::<Value>(candidate)
        {
            return Some(value);
        }
    }

    None
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    // Skip an optional language tag on the fence line
    let content_start = after_fence.find('\n')? + 1;
    let content = &after_fence[content_start..];
    let end = content.find("```")?;
    Some(&content[..end])
}

/// The first balanced `{…}` or `[…]` span, string-literal aware.
fn balanced_span(text: &str, open: char) -> Option<&str> {
    let close = if open == '{' { '}' } else { ']' };
    let start = text.find(open)?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn direct_json() {
        let value = parse_json_response(r#"{"verdict": "match", "confidence": 0.9}"#).unwrap();
        assert_eq!(value["verdict"], "match");
    }

    #[test]
    fn fenced_json_block() {
        let text = "Here is the result:\n```json\n[{\"claim_text\": \"max 10\"}]\n```\nDone.";
        let value = parse_json_response(text).unwrap();
        assert_eq!(value[0]["claim_text"], "max 10");
    }

    #[test]
    fn fenced_block_without_language_tag() {
        let text = "```\n{\"ok\": true}\n```";
        let value = parse_json_response(text).unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[test]
    fn json_embedded_in_prose() {
        let text = "The verdict follows. {\"verdict\": \"mismatch\", \"actual_value\": \"20\"} as analyzed above.";
        let value = parse_json_response(text).unwrap();
        assert_eq!(value["actual_value"], "20");
    }

    #[test]
    fn array_embedded_in_prose() {
        let text = "Claims: [{\"topic\": \"limits\"}] — extracted.";
        let value = parse_json_response(text).unwrap();
        assert_eq!(value[0]["topic"], "limits");
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_the_scan() {
        let text = r#"note {"reasoning": "code uses {} literals", "verdict": "match"} end"#;
        let value = parse_json_response(text).unwrap();
        assert_eq!(value["verdict"], "match");
    }

    #[test]
    fn empty_array() {
        assert_eq!(parse_json_response("  []  ").unwrap(), json!([]));
    }

    #[test]
    fn garbage_returns_none() {
        assert!(parse_json_response("no json here at all").is_none());
        assert!(parse_json_response("{broken json").is_none());
    }
}
