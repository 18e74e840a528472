//! SQL schema parsing: structured metadata from `CREATE TABLE`,
//! `CREATE FUNCTION`, `CREATE PROCEDURE`, and `CREATE TRIGGER` statements.
//!
//! The structured pass hand-parses the statement (paren-balanced column list,
//! keyword scanning). When it cannot make sense of a statement, a regex
//! fallback still recovers the name and span so incremental upsert keys stay
//! stable.

use serde::{Deserialize, Serialize};

use lode_core::hashing::content_hash_str;

use crate::sql_chunker::parse_sql_statements;

/// Parsed column definition from `CREATE TABLE`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedColumn {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
    /// `table(column)` reference text when the column is a foreign key.
    pub fk_references: Option<String>,
}

/// Parsed table-level constraint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedConstraint {
    pub name: Option<String>,
    /// `PRIMARY KEY`, `FOREIGN KEY`, `UNIQUE`, or `CHECK`.
    pub constraint_type: String,
    pub definition: String,
    pub columns: Vec<String>,
}

/// Parsed `CREATE TABLE` statement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedTable {
    pub schema_name: Option<String>,
    pub table_name: String,
    pub qualified_name: String,
    pub columns: Vec<ParsedColumn>,
    pub constraints: Vec<ParsedConstraint>,
    pub start_line: u32,
    pub end_line: u32,
    pub content_hash: String,
}

/// Parsed routine parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedParameter {
    pub name: Option<String>,
    pub data_type: String,
    /// `IN`, `OUT`, or `INOUT`.
    pub mode: String,
    pub default: Option<String>,
}

/// Parsed `CREATE FUNCTION` / `PROCEDURE` / `TRIGGER` statement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedRoutine {
    pub schema_name: Option<String>,
    pub routine_name: String,
    pub qualified_name: String,
    /// `FUNCTION`, `PROCEDURE`, or `TRIGGER`.
    pub routine_type: String,
    pub parameters: Vec<ParsedParameter>,
    pub return_type: Option<String>,
    pub language: Option<String>,
    pub volatility: Option<String>,
    pub trigger_table: Option<String>,
    pub trigger_events: Vec<String>,
    pub trigger_timing: Option<String>,
    pub start_line: u32,
    pub end_line: u32,
    pub content_hash: String,
}

/// Parse SQL text into structured table and routine metadata.
#[must_use]
pub fn parse_sql_schema(content: &str) -> (Vec<ParsedTable>, Vec<ParsedRoutine>) {
    let mut tables = Vec::new();
    let mut routines = Vec::new();

    for statement in parse_sql_statements(content, false) {
        let upper = statement.content.trim_start().to_uppercase();

        if upper.starts_with("CREATE TABLE") {
            if let Some(table) =
                parse_create_table(&statement.content, statement.start_line, statement.end_line)
            {
                tables.push(table);
            }
        } else if starts_with_create(&upper, "FUNCTION") {
            if let Some(routine) = parse_create_routine(
                &statement.content,
                "FUNCTION",
                statement.start_line,
                statement.end_line,
            ) {
                routines.push(routine);
            }
        } else if starts_with_create(&upper, "PROCEDURE") {
            if let Some(routine) = parse_create_routine(
                &statement.content,
                "PROCEDURE",
                statement.start_line,
                statement.end_line,
            ) {
                routines.push(routine);
            }
        } else if starts_with_create(&upper, "TRIGGER")
            && let Some(routine) =
                parse_create_trigger(&statement.content, statement.start_line, statement.end_line)
        {
            routines.push(routine);
        }
    }

    (tables, routines)
}

fn starts_with_create(upper: &str, object: &str) -> bool {
    upper.starts_with(&format!("CREATE {object}"))
        || upper.starts_with(&format!("CREATE OR REPLACE {object}"))
}

// ── CREATE TABLE ────────────────────────────────────────────────────────────

fn parse_create_table(statement: &str, start_line: u32, end_line: u32) -> Option<ParsedTable> {
    let name_re = regex::Regex::new(
        r#"(?i)CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?("?[\w.]+"?)"#,
    )
    .ok()?;
    let raw_name = name_re.captures(statement)?.get(1)?.as_str().replace('"', "");
    let (schema_name, table_name) = split_qualified(&raw_name);
    let qualified_name = raw_name;

    let mut table = ParsedTable {
        schema_name,
        table_name,
        qualified_name,
        columns: Vec::new(),
        constraints: Vec::new(),
        start_line,
        end_line,
        content_hash: content_hash_str(statement),
    };

    // Column list: balanced parens after the table name
    let Some(body) = parenthesized_body(statement) else {
        // Fallback: name and span only
        return Some(table);
    };

    let mut pk_columns: Vec<String> = Vec::new();
    for item in split_top_level(&body) {
        let trimmed = item.trim();
        if trimmed.is_empty() {
            continue;
        }
        let upper = trimmed.to_uppercase();
        if upper.starts_with("CONSTRAINT")
            || upper.starts_with("PRIMARY KEY")
            || upper.starts_with("FOREIGN KEY")
            || upper.starts_with("UNIQUE")
            || upper.starts_with("CHECK")
        {
            if let Some(constraint) = parse_constraint(trimmed) {
                if constraint.constraint_type == "PRIMARY KEY" {
                    pk_columns.extend(constraint.columns.iter().cloned());
                }
                table.constraints.push(constraint);
            }
        } else if let Some(column) = parse_column(trimmed) {
            table.columns.push(column);
        }
    }

    for column in &mut table.columns {
        if pk_columns.iter().any(|pk| pk == &column.name) {
            column.is_primary_key = true;
        }
    }

    Some(table)
}

fn parse_column(definition: &str) -> Option<ParsedColumn> {
    let mut tokens = definition.split_whitespace();
    let name = tokens.next()?.replace('"', "");
    let rest: Vec<&str> = tokens.collect();
    if rest.is_empty() {
        return None;
    }

    // Data type: tokens until a column-option keyword
    const STOP_WORDS: &[&str] = &[
        "NOT", "NULL", "DEFAULT", "PRIMARY", "REFERENCES", "UNIQUE", "CHECK", "CONSTRAINT",
        "GENERATED", "COLLATE",
    ];
    let mut type_tokens = Vec::new();
    for token in &rest {
        if STOP_WORDS.contains(&token.to_uppercase().as_str()) {
            break;
        }
        type_tokens.push(*token);
    }
    if type_tokens.is_empty() {
        return None;
    }
    let data_type = type_tokens.join(" ");

    let upper = definition.to_uppercase();
    let nullable = !upper.contains("NOT NULL");
    let is_primary_key = upper.contains("PRIMARY KEY");

    let default = regex::Regex::new(r"(?i)DEFAULT\s+((?:[^,\s]|\([^)]*\))+)")
        .ok()
        .and_then(|re| re.captures(definition))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    let fk_references = regex::Regex::new(r#"(?i)REFERENCES\s+("?[\w.]+"?\s*(?:\([^)]*\))?)"#)
        .ok()
        .and_then(|re| re.captures(definition))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().replace('"', "").trim().to_string());

    Some(ParsedColumn {
        name,
        data_type,
        nullable,
        default,
        is_primary_key,
        is_foreign_key: fk_references.is_some(),
        fk_references,
    })
}

fn parse_constraint(definition: &str) -> Option<ParsedConstraint> {
    let upper = definition.to_uppercase();

    let name = regex::Regex::new(r#"(?i)^CONSTRAINT\s+("?\w+"?)"#)
        .ok()
        .and_then(|re| re.captures(definition))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().replace('"', ""));

    let constraint_type = if upper.contains("PRIMARY KEY") {
        "PRIMARY KEY"
    } else if upper.contains("FOREIGN KEY") {
        "FOREIGN KEY"
    } else if upper.contains("UNIQUE") {
        "UNIQUE"
    } else if upper.contains("CHECK") {
        "CHECK"
    } else {
        return None;
    };

    // Columns: first parenthesized list after the constraint keyword
    let columns = regex::Regex::new(r"\(([^)]*)\)")
        .ok()
        .and_then(|re| re.captures(definition))
        .and_then(|c| c.get(1))
        .map(|m| {
            m.as_str()
                .split(',')
                .map(|c| c.trim().replace('"', ""))
                .filter(|c| !c.is_empty())
                .collect()
        })
        .unwrap_or_default();

    Some(ParsedConstraint {
        name,
        constraint_type: constraint_type.to_string(),
        definition: definition.to_string(),
        columns,
    })
}

// ── CREATE FUNCTION / PROCEDURE ─────────────────────────────────────────────

fn parse_create_routine(
    statement: &str,
    routine_type: &str,
    start_line: u32,
    end_line: u32,
) -> Option<ParsedRoutine> {
    let name_re = regex::Regex::new(&format!(
        r#"(?i)CREATE\s+(?:OR\s+REPLACE\s+)?{routine_type}\s+("?[\w.]+"?)"#
    ))
    .ok()?;
    let raw_name = name_re.captures(statement)?.get(1)?.as_str().replace('"', "");
    let (schema_name, routine_name) = split_qualified(&raw_name);

    let parameters = parenthesized_body(statement)
        .map(|body| {
            split_top_level(&body)
                .iter()
                .filter_map(|p| parse_parameter(p))
                .collect()
        })
        .unwrap_or_default();

    let return_type = if routine_type == "FUNCTION" {
        regex::Regex::new(r"(?is)RETURNS\s+(SETOF\s+[\w.\[\]]+|TABLE\s*\([^)]*\)|[\w.\[\]]+)")
            .ok()
            .and_then(|re| re.captures(statement))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
    } else {
        None
    };

    let language = regex::Regex::new(r"(?i)LANGUAGE\s+'?(\w+)'?")
        .ok()
        .and_then(|re| re.captures(statement))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase());

    let volatility = regex::Regex::new(r"(?i)\b(VOLATILE|STABLE|IMMUTABLE)\b")
        .ok()
        .and_then(|re| re.captures(statement))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_uppercase());

    Some(ParsedRoutine {
        schema_name,
        qualified_name: raw_name,
        routine_name,
        routine_type: routine_type.to_string(),
        parameters,
        return_type,
        language,
        volatility,
        trigger_table: None,
        trigger_events: Vec::new(),
        trigger_timing: None,
        start_line,
        end_line,
        content_hash: content_hash_str(statement),
    })
}

fn parse_parameter(definition: &str) -> Option<ParsedParameter> {
    let trimmed = definition.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut tokens: Vec<&str> = trimmed.split_whitespace().collect();
    let mut mode = "IN".to_string();
    if let Some(first) = tokens.first() {
        let upper = first.to_uppercase();
        if matches!(upper.as_str(), "IN" | "OUT" | "INOUT") {
            mode = upper;
            tokens.remove(0);
        }
    }

    let default = regex::Regex::new(r"(?i)(?:DEFAULT|=)\s*(.+)$")
        .ok()
        .and_then(|re| re.captures(trimmed))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string());
    // Drop the default clause from the token stream
    if let Some(pos) = tokens
        .iter()
        .position(|t| t.eq_ignore_ascii_case("DEFAULT") || *t == "=")
    {
        tokens.truncate(pos);
    }

    match tokens.len() {
        0 => None,
        // Type only (unnamed parameter)
        1 => Some(ParsedParameter {
            name: None,
            data_type: tokens[0].to_string(),
            mode,
            default,
        }),
        _ => Some(ParsedParameter {
            name: Some(tokens[0].replace('"', "")),
            data_type: tokens[1..].join(" "),
            mode,
            default,
        }),
    }
}

// ── CREATE TRIGGER ──────────────────────────────────────────────────────────

fn parse_create_trigger(statement: &str, start_line: u32, end_line: u32) -> Option<ParsedRoutine> {
    let name_re = regex::Regex::new(
        r#"(?i)CREATE\s+(?:OR\s+REPLACE\s+)?TRIGGER\s+(?:IF\s+NOT\s+EXISTS\s+)?("?[\w.]+"?)"#,
    )
    .ok()?;
    let raw_name = name_re.captures(statement)?.get(1)?.as_str().replace('"', "");
    let (schema_name, trigger_name) = split_qualified(&raw_name);

    let trigger_timing = regex::Regex::new(r"(?i)\b(BEFORE|AFTER|INSTEAD\s+OF)\b")
        .ok()
        .and_then(|re| re.captures(statement))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_uppercase().split_whitespace().collect::<Vec<_>>().join(" "));

    let mut trigger_events = Vec::new();
    for event in ["INSERT", "UPDATE", "DELETE", "TRUNCATE"] {
        let re = regex::Regex::new(&format!(r"(?i)\b{event}\b")).ok()?;
        if re.is_match(statement) {
            trigger_events.push(event.to_string());
        }
    }

    let trigger_table = regex::Regex::new(r#"(?i)\bON\s+("?[\w.]+"?)"#)
        .ok()
        .and_then(|re| re.captures(statement))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().replace('"', ""));

    Some(ParsedRoutine {
        schema_name,
        qualified_name: raw_name,
        routine_name: trigger_name,
        routine_type: "TRIGGER".to_string(),
        parameters: Vec::new(),
        return_type: None,
        language: None,
        volatility: None,
        trigger_table,
        trigger_events,
        trigger_timing,
        start_line,
        end_line,
        content_hash: content_hash_str(statement),
    })
}

// ── Shared text utilities ───────────────────────────────────────────────────

fn split_qualified(name: &str) -> (Option<String>, String) {
    match name.rsplit_once('.') {
        Some((schema, object)) => (Some(schema.to_string()), object.to_string()),
        None => (None, name.to_string()),
    }
}

/// Content of the first balanced parenthesis group.
fn parenthesized_body(statement: &str) -> Option<String> {
    let start = statement.find('(')?;
    let mut depth = 0usize;
    for (offset, c) in statement[start..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(statement[start + 1..start + offset].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on commas outside parentheses.
fn split_top_level(body: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in body.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                items.push(current.clone());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        items.push(current);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TABLE_SQL: &str = r#"CREATE TABLE public.users (
    id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
    email varchar(255) NOT NULL,
    org_id uuid REFERENCES orgs(id),
    created_at timestamp with time zone DEFAULT now(),
    CONSTRAINT users_email_unique UNIQUE (email),
    FOREIGN KEY (org_id) REFERENCES orgs (id)
);"#;

    #[test]
    fn table_name_and_schema() {
        let (tables, _) = parse_sql_schema(TABLE_SQL);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].schema_name.as_deref(), Some("public"));
        assert_eq!(tables[0].table_name, "users");
        assert_eq!(tables[0].qualified_name, "public.users");
        assert_eq!(tables[0].start_line, 1);
        assert_eq!(tables[0].content_hash.len(), 16);
    }

    #[test]
    fn columns_with_types_nullability_defaults() {
        let (tables, _) = parse_sql_schema(TABLE_SQL);
        let columns = &tables[0].columns;
        assert_eq!(columns.len(), 4);

        let id = &columns[0];
        assert_eq!(id.name, "id");
        assert_eq!(id.data_type, "uuid");
        assert!(id.is_primary_key);
        assert_eq!(id.default.as_deref(), Some("gen_random_uuid()"));

        let email = &columns[1];
        assert_eq!(email.data_type, "varchar(255)");
        assert!(!email.nullable);

        let org = &columns[2];
        assert!(org.is_foreign_key);
        assert_eq!(org.fk_references.as_deref(), Some("orgs(id)"));

        let created = &columns[3];
        assert_eq!(created.data_type, "timestamp with time zone");
        assert!(created.nullable);
    }

    #[test]
    fn table_constraints_extracted() {
        let (tables, _) = parse_sql_schema(TABLE_SQL);
        let constraints = &tables[0].constraints;
        assert_eq!(constraints.len(), 2);
        assert_eq!(constraints[0].constraint_type, "UNIQUE");
        assert_eq!(constraints[0].name.as_deref(), Some("users_email_unique"));
        assert_eq!(constraints[0].columns, vec!["email"]);
        assert_eq!(constraints[1].constraint_type, "FOREIGN KEY");
    }

    #[test]
    fn function_with_parameters_language_volatility() {
        let sql = r"CREATE OR REPLACE FUNCTION public.add_points(user_id uuid, amount integer DEFAULT 10, OUT total integer)
RETURNS integer
LANGUAGE plpgsql
STABLE
AS $$
BEGIN
  SELECT points + amount INTO total FROM accounts WHERE id = user_id;
END;
$$;";
        let (_, routines) = parse_sql_schema(sql);
        assert_eq!(routines.len(), 1);
        let function = &routines[0];
        assert_eq!(function.routine_type, "FUNCTION");
        assert_eq!(function.routine_name, "add_points");
        assert_eq!(function.schema_name.as_deref(), Some("public"));
        assert_eq!(function.return_type.as_deref(), Some("integer"));
        assert_eq!(function.language.as_deref(), Some("plpgsql"));
        assert_eq!(function.volatility.as_deref(), Some("STABLE"));

        assert_eq!(function.parameters.len(), 3);
        assert_eq!(function.parameters[0].name.as_deref(), Some("user_id"));
        assert_eq!(function.parameters[0].data_type, "uuid");
        assert_eq!(function.parameters[0].mode, "IN");
        assert_eq!(function.parameters[1].default.as_deref(), Some("10"));
        assert_eq!(function.parameters[2].mode, "OUT");
    }

    #[test]
    fn trigger_table_events_timing() {
        let sql = "CREATE TRIGGER bump_version\nBEFORE UPDATE ON public.documents\nFOR EACH ROW EXECUTE FUNCTION bump();";
        let (_, routines) = parse_sql_schema(sql);
        assert_eq!(routines.len(), 1);
        let trigger = &routines[0];
        assert_eq!(trigger.routine_type, "TRIGGER");
        assert_eq!(trigger.routine_name, "bump_version");
        assert_eq!(trigger.trigger_timing.as_deref(), Some("BEFORE"));
        assert_eq!(trigger.trigger_events, vec!["UPDATE"]);
        assert_eq!(trigger.trigger_table.as_deref(), Some("public.documents"));
    }

    #[test]
    fn unparseable_create_table_falls_back_to_name_and_span() {
        let sql = "CREATE TABLE broken_no_parens;";
        let (tables, _) = parse_sql_schema(sql);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].table_name, "broken_no_parens");
        assert!(tables[0].columns.is_empty());
    }

    #[test]
    fn procedure_detected() {
        let sql = "CREATE PROCEDURE cleanup(days integer)\nLANGUAGE sql\nAS $$ DELETE FROM logs; $$;";
        let (_, routines) = parse_sql_schema(sql);
        assert_eq!(routines.len(), 1);
        assert_eq!(routines[0].routine_type, "PROCEDURE");
        assert!(routines[0].return_type.is_none());
    }
}
