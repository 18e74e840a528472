//! Statement-aware SQL chunking.
//!
//! Splits SQL text into statements (dollar-quote aware), then groups them
//! into chunks bounded by size and statement count. A category flip between
//! schema statements (DDL) and data statements (DML) starts a new chunk, so
//! `CREATE TABLE` clusters never mix with bulk `INSERT` runs.

use lode_core::hashing::content_hash_str;

use crate::types::CodeChunk;

/// A single parsed SQL statement.
#[derive(Debug, Clone)]
pub struct SqlStatement {
    /// Leading keyword, uppercased: `CREATE`, `INSERT`, `COPY`, …
    pub statement_type: String,
    pub content: String,
    pub start_line: u32,
    pub end_line: u32,
    pub is_data_statement: bool,
}

/// Aggregate statistics used to decide whether to skip data statements.
#[derive(Debug, Clone, Default)]
pub struct SqlStats {
    pub total_statements: usize,
    pub data_statements: usize,
    pub schema_statements: usize,
}

/// Split SQL text into statements, tracking line numbers.
///
/// Semicolons inside PostgreSQL dollar-quoted strings (`$$ … $$`, `$tag$ … $tag$`)
/// do not terminate statements.
#[must_use]
pub fn parse_sql_statements(sql: &str, skip_data_statements: bool) -> Vec<SqlStatement> {
    let mut statements = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_start = 0u32;
    let mut in_statement = false;
    let mut in_dollar_quote = false;
    let mut dollar_tag = String::new();

    let dollar_re = regex::Regex::new(r"\$(\w*)\$").unwrap_or_else(|_| unreachable!());

    for (idx, line) in sql.lines().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let line_num = idx as u32 + 1;
        let stripped = line.trim();

        if !in_statement && (stripped.is_empty() || stripped.starts_with("--")) {
            continue;
        }

        for capture in dollar_re.captures_iter(line) {
            let tag = capture.get(1).map_or("", |m| m.as_str());
            if in_dollar_quote {
                if tag == dollar_tag {
                    in_dollar_quote = false;
                    dollar_tag.clear();
                }
            } else {
                in_dollar_quote = true;
                dollar_tag = tag.to_string();
            }
        }

        if in_statement {
            current.push(line);
        } else {
            in_statement = true;
            current_start = line_num;
            current = vec![line];
        }

        if in_statement && !in_dollar_quote && line.contains(';') {
            push_statement(
                &mut statements,
                &current,
                current_start,
                line_num,
                skip_data_statements,
            );
            current = Vec::new();
            in_statement = false;
        }
    }

    // Unterminated trailing statement
    if !current.is_empty() {
        #[allow(clippy::cast_possible_truncation)]
        let last_line = sql.lines().count() as u32;
        push_statement(
            &mut statements,
            &current,
            current_start,
            last_line,
            skip_data_statements,
        );
    }

    statements
}

fn push_statement(
    statements: &mut Vec<SqlStatement>,
    lines: &[&str],
    start_line: u32,
    end_line: u32,
    skip_data_statements: bool,
) {
    let content = lines.join("\n");
    let statement_type = statement_type_of(&content);
    let is_data = is_data_statement(&statement_type);
    if skip_data_statements && is_data {
        return;
    }
    statements.push(SqlStatement {
        statement_type,
        content,
        start_line,
        end_line,
        is_data_statement: is_data,
    });
}

/// Statistics over all statements in a file.
#[must_use]
pub fn sql_stats(sql: &str) -> SqlStats {
    let statements = parse_sql_statements(sql, false);
    let mut stats = SqlStats {
        total_statements: statements.len(),
        ..SqlStats::default()
    };
    for statement in &statements {
        if statement.is_data_statement {
            stats.data_statements += 1;
        } else if is_schema_statement(&statement.statement_type) {
            stats.schema_statements += 1;
        }
    }
    stats
}

/// Group statements into chunks.
///
/// A new chunk starts when adding a statement would exceed `max_chunk_chars`,
/// when `max_statements_per_chunk` is reached, or when the statement category
/// flips between schema and data.
#[must_use]
pub fn chunk_sql_statements(
    statements: &[SqlStatement],
    max_chunk_chars: usize,
    max_statements_per_chunk: usize,
) -> Vec<CodeChunk> {
    let mut chunks = Vec::new();
    let mut group: Vec<&SqlStatement> = Vec::new();
    let mut group_size = 0usize;

    for statement in statements {
        let flip = group.first().is_some_and(|first| {
            is_schema_statement(&first.statement_type)
                != is_schema_statement(&statement.statement_type)
        });
        let over_size = !group.is_empty() && group_size + statement.content.len() > max_chunk_chars;
        let over_count = group.len() >= max_statements_per_chunk;

        if flip || over_size || over_count {
            chunks.push(chunk_from_group(&group));
            group.clear();
            group_size = 0;
        }

        group_size += statement.content.len();
        group.push(statement);
    }

    if !group.is_empty() {
        chunks.push(chunk_from_group(&group));
    }

    chunks
}

/// Chunk a whole SQL file, honoring the data-skip heuristic:
/// files with more than 100 statements of which over half are data keep only
/// the schema statements. When nothing survives, one summary chunk is
/// produced so the file still has retrieval presence.
#[must_use]
pub fn chunk_sql_file(
    sql: &str,
    max_chunk_chars: usize,
    max_statements_per_chunk: usize,
) -> Vec<CodeChunk> {
    let stats = sql_stats(sql);
    let auto_skip =
        stats.total_statements > 100 && stats.data_statements * 2 > stats.total_statements;
    if auto_skip {
        tracing::debug!(
            data = stats.data_statements,
            total = stats.total_statements,
            "skipping data statements in large SQL file"
        );
    }

    let statements = parse_sql_statements(sql, auto_skip);
    let chunks = chunk_sql_statements(&statements, max_chunk_chars, max_statements_per_chunk);

    if chunks.is_empty() && stats.data_statements > 0 {
        let summary = format!(
            "SQL file with {} data statements (schema statements extracted separately)",
            stats.data_statements
        );
        return vec![CodeChunk {
            symbol_fqn: None,
            start_line: 1,
            end_line: 1,
            content_hash: content_hash_str(&summary),
            content: summary,
        }];
    }

    chunks
}

fn chunk_from_group(group: &[&SqlStatement]) -> CodeChunk {
    let content = group
        .iter()
        .map(|s| s.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    CodeChunk {
        symbol_fqn: None,
        start_line: group.first().map_or(1, |s| s.start_line),
        end_line: group.last().map_or(1, |s| s.end_line),
        content_hash: content_hash_str(&content),
        content,
    }
}

fn statement_type_of(statement: &str) -> String {
    // Strip line and block comments, then take the first word
    let no_line_comments: String = statement
        .lines()
        .map(|l| l.split("--").next().unwrap_or(""))
        .collect::<Vec<_>>()
        .join(" ");
    let cleaned = regex::Regex::new(r"(?s)/\*.*?\*/")
        .map(|re| re.replace_all(&no_line_comments, " ").into_owned())
        .unwrap_or(no_line_comments);

    cleaned
        .split_whitespace()
        .next()
        .map_or_else(|| "UNKNOWN".to_string(), str::to_uppercase)
}

fn is_data_statement(statement_type: &str) -> bool {
    matches!(statement_type, "INSERT" | "COPY" | "LOAD" | "UPDATE" | "DELETE")
}

fn is_schema_statement(statement_type: &str) -> bool {
    matches!(
        statement_type,
        "CREATE" | "ALTER" | "DROP" | "GRANT" | "REVOKE" | "COMMENT" | "SET" | "BEGIN" | "COMMIT"
            | "ROLLBACK"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SCHEMA: &str = "-- users table\nCREATE TABLE users (\n    id uuid PRIMARY KEY,\n    name text NOT NULL\n);\n\nCREATE INDEX idx_users_name ON users(name);\n\nINSERT INTO users VALUES ('1', 'alice');\nINSERT INTO users VALUES ('2', 'bob');\n";

    #[test]
    fn statements_split_with_line_numbers() {
        let statements = parse_sql_statements(SCHEMA, false);
        assert_eq!(statements.len(), 4);
        assert_eq!(statements[0].statement_type, "CREATE");
        assert_eq!(statements[0].start_line, 2);
        assert_eq!(statements[0].end_line, 5);
        assert!(!statements[0].is_data_statement);
        assert!(statements[2].is_data_statement);
    }

    #[test]
    fn dollar_quoted_semicolons_do_not_split() {
        let sql = "CREATE FUNCTION bump() RETURNS trigger AS $$\nBEGIN\n  UPDATE t SET n = n + 1;\n  RETURN NEW;\nEND;\n$$ LANGUAGE plpgsql;\n";
        let statements = parse_sql_statements(sql, false);
        assert_eq!(statements.len(), 1);
        assert!(statements[0].content.contains("RETURN NEW"));
    }

    #[test]
    fn skip_data_statements_filters() {
        let statements = parse_sql_statements(SCHEMA, true);
        assert_eq!(statements.len(), 2);
        assert!(statements.iter().all(|s| !s.is_data_statement));
    }

    #[test]
    fn category_flip_starts_new_chunk() {
        let statements = parse_sql_statements(SCHEMA, false);
        let chunks = chunk_sql_statements(&statements, 5_000, 50);
        // DDL cluster, then DML cluster
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].content.contains("CREATE TABLE"));
        assert!(chunks[0].content.contains("CREATE INDEX"));
        assert!(chunks[1].content.contains("INSERT"));
    }

    #[test]
    fn statement_count_cap() {
        let sql: String = (0..10)
            .map(|i| format!("CREATE TABLE t{i} (id int);\n"))
            .collect();
        let statements = parse_sql_statements(&sql, false);
        let chunks = chunk_sql_statements(&statements, 100_000, 4);
        assert_eq!(chunks.len(), 3); // 4 + 4 + 2
    }

    #[test]
    fn size_cap_splits_groups() {
        let sql: String = (0..6)
            .map(|i| format!("CREATE TABLE table_number_{i} (id int, payload text);\n"))
            .collect();
        let statements = parse_sql_statements(&sql, false);
        let chunks = chunk_sql_statements(&statements, 120, 50);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.len() <= 120 + 60, "group stays near the cap");
        }
    }

    #[test]
    fn data_heavy_file_reduces_to_summary() {
        let mut sql = String::new();
        for i in 0..150 {
            sql.push_str(&format!("INSERT INTO big VALUES ({i});\n"));
        }
        let chunks = chunk_sql_file(&sql, 5_000, 50);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].content.contains("150 data statements"));
    }

    #[test]
    fn stats_count_categories() {
        let stats = sql_stats(SCHEMA);
        assert_eq!(stats.total_statements, 4);
        assert_eq!(stats.schema_statements, 2);
        assert_eq!(stats.data_statements, 2);
    }
}
