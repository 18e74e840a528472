//! SQL schema metadata: parsed tables and routines, replaced per file.

use lode_core::entities::{SqlRoutineMetadata, SqlTableMetadata};
use lode_core::ids::{PREFIX_SQL_ROUTINE, PREFIX_SQL_TABLE, generate_id};

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_json};
use crate::store::LodeStore;

/// Parsed table data ready for insertion.
#[derive(Debug, Clone)]
pub struct NewSqlTable {
    pub schema_name: Option<String>,
    pub table_name: String,
    pub qualified_name: String,
    pub columns: serde_json::Value,
    pub constraints: serde_json::Value,
    pub start_line: u32,
    pub end_line: u32,
    pub content_hash: String,
}

/// Parsed routine data ready for insertion.
#[derive(Debug, Clone)]
pub struct NewSqlRoutine {
    pub schema_name: Option<String>,
    pub routine_name: String,
    pub qualified_name: String,
    pub routine_type: String,
    pub parameters: serde_json::Value,
    pub return_type: Option<String>,
    pub language: Option<String>,
    pub volatility: Option<String>,
    pub trigger_table: Option<String>,
    pub trigger_events: serde_json::Value,
    pub trigger_timing: Option<String>,
    pub start_line: u32,
    pub end_line: u32,
    pub content_hash: String,
}

impl LodeStore {
    /// Replace all SQL metadata derived from one file, transactionally.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the transaction fails.
    pub async fn replace_sql_metadata(
        &self,
        repo_id: &str,
        file_id: &str,
        tables: &[NewSqlTable],
        routines: &[NewSqlRoutine],
    ) -> Result<(), DatabaseError> {
        let tx = self.db().transaction().await?;
        tx.execute(
            "DELETE FROM sql_table_metadata WHERE file_id = ?1",
            [file_id],
        )
        .await?;
        tx.execute(
            "DELETE FROM sql_routine_metadata WHERE file_id = ?1",
            [file_id],
        )
        .await?;

        for table in tables {
            let id = generate_id(PREFIX_SQL_TABLE)?;
            tx.execute(
                "INSERT OR IGNORE INTO sql_table_metadata
                     (id, repo_id, file_id, schema_name, table_name, qualified_name,
                      columns, constraints, start_line, end_line, content_hash)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                libsql::params![
                    id.as_str(),
                    repo_id,
                    file_id,
                    table.schema_name.as_deref(),
                    table.table_name.as_str(),
                    table.qualified_name.as_str(),
                    table.columns.to_string(),
                    table.constraints.to_string(),
                    i64::from(table.start_line),
                    i64::from(table.end_line),
                    table.content_hash.as_str()
                ],
            )
            .await?;
        }

        for routine in routines {
            let id = generate_id(PREFIX_SQL_ROUTINE)?;
            tx.execute(
                "INSERT OR IGNORE INTO sql_routine_metadata
                     (id, repo_id, file_id, schema_name, routine_name, qualified_name, routine_type,
                      parameters, return_type, language, volatility, trigger_table, trigger_events,
                      trigger_timing, start_line, end_line, content_hash)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                libsql::params![
                    id.as_str(),
                    repo_id,
                    file_id,
                    routine.schema_name.as_deref(),
                    routine.routine_name.as_str(),
                    routine.qualified_name.as_str(),
                    routine.routine_type.as_str(),
                    routine.parameters.to_string(),
                    routine.return_type.as_deref(),
                    routine.language.as_deref(),
                    routine.volatility.as_deref(),
                    routine.trigger_table.as_deref(),
                    routine.trigger_events.to_string(),
                    routine.trigger_timing.as_deref(),
                    i64::from(routine.start_line),
                    i64::from(routine.end_line),
                    routine.content_hash.as_str()
                ],
            )
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Parsed tables of a repository.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_sql_tables(
        &self,
        repo_id: &str,
    ) -> Result<Vec<SqlTableMetadata>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                "SELECT id, repo_id, file_id, schema_name, table_name, qualified_name,
                        columns, constraints, start_line, end_line, content_hash
                 FROM sql_table_metadata WHERE repo_id = ?1 ORDER BY qualified_name",
                [repo_id],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(SqlTableMetadata {
                id: row.get::<String>(0)?,
                repo_id: row.get::<String>(1)?,
                file_id: row.get::<String>(2)?,
                schema_name: get_opt_string(&row, 3)?,
                table_name: row.get::<String>(4)?,
                qualified_name: row.get::<String>(5)?,
                columns: parse_json(&row.get::<String>(6)?)?,
                constraints: parse_json(&row.get::<String>(7)?)?,
                start_line: u32::try_from(row.get::<i64>(8)?).unwrap_or(0),
                end_line: u32::try_from(row.get::<i64>(9)?).unwrap_or(0),
                content_hash: row.get::<String>(10)?,
            });
        }
        Ok(out)
    }

    /// Parsed routines of a repository.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_sql_routines(
        &self,
        repo_id: &str,
    ) -> Result<Vec<SqlRoutineMetadata>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                "SELECT id, repo_id, file_id, schema_name, routine_name, qualified_name,
                        routine_type, parameters, return_type, language, volatility,
                        trigger_table, trigger_events, trigger_timing, start_line, end_line, content_hash
                 FROM sql_routine_metadata WHERE repo_id = ?1 ORDER BY qualified_name",
                [repo_id],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(SqlRoutineMetadata {
                id: row.get::<String>(0)?,
                repo_id: row.get::<String>(1)?,
                file_id: row.get::<String>(2)?,
                schema_name: get_opt_string(&row, 3)?,
                routine_name: row.get::<String>(4)?,
                qualified_name: row.get::<String>(5)?,
                routine_type: row.get::<String>(6)?,
                parameters: parse_json(&row.get::<String>(7)?)?,
                return_type: get_opt_string(&row, 8)?,
                language: get_opt_string(&row, 9)?,
                volatility: get_opt_string(&row, 10)?,
                trigger_table: get_opt_string(&row, 11)?,
                trigger_events: parse_json(&row.get::<String>(12)?)?,
                trigger_timing: get_opt_string(&row, 13)?,
                start_line: u32::try_from(row.get::<i64>(14)?).unwrap_or(0),
                end_line: u32::try_from(row.get::<i64>(15)?).unwrap_or(0),
                content_hash: row.get::<String>(16)?,
            });
        }
        Ok(out)
    }
}
