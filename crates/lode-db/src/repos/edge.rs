//! Edge queries for graph traversal.

use lode_core::entities::{Edge, EdgeEvidence};
use lode_core::enums::EdgeKind;

use crate::error::DatabaseError;
use crate::helpers::parse_enum;
use crate::store::LodeStore;

fn row_to_edge(row: &libsql::Row) -> Result<Edge, DatabaseError> {
    Ok(Edge {
        id: row.get::<String>(0)?,
        repo_id: row.get::<String>(1)?,
        kind: parse_enum(&row.get::<String>(2)?)?,
        src_symbol_id: row.get::<Option<String>>(3)?,
        dst_symbol_id: row.get::<String>(4)?,
        evidence: EdgeEvidence {
            file_id: row.get::<String>(5)?,
            start_line: u32::try_from(row.get::<i64>(6)?).unwrap_or(0),
            end_line: u32::try_from(row.get::<i64>(7)?).unwrap_or(0),
        },
        confidence: row.get::<f64>(8)?,
    })
}

const EDGE_COLUMNS: &str = "id, repo_id, kind, src_symbol_id, dst_symbol_id, \
     evidence_file_id, evidence_start_line, evidence_end_line, confidence";

impl LodeStore {
    /// Edges of a kind leaving `symbol_id` (outgoing: callees, bases, …).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn edges_from(
        &self,
        symbol_id: &str,
        kind: EdgeKind,
    ) -> Result<Vec<Edge>, DatabaseError> {
        let sql = format!(
            "SELECT {EDGE_COLUMNS} FROM edge WHERE src_symbol_id = ?1 AND kind = ?2
             ORDER BY confidence DESC"
        );
        let mut rows = self
            .db()
            .query(&sql, libsql::params![symbol_id, kind.as_str()])
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_edge(&row)?);
        }
        Ok(out)
    }

    /// Edges of a kind arriving at `symbol_id` (incoming: callers, …).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn edges_to(
        &self,
        symbol_id: &str,
        kind: EdgeKind,
    ) -> Result<Vec<Edge>, DatabaseError> {
        let sql = format!(
            "SELECT {EDGE_COLUMNS} FROM edge WHERE dst_symbol_id = ?1 AND kind = ?2
             ORDER BY confidence DESC"
        );
        let mut rows = self
            .db()
            .query(&sql, libsql::params![symbol_id, kind.as_str()])
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_edge(&row)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use crate::repos::indexing::NewEdge;
    use crate::test_support::{empty_file_data, sample_symbol, test_store};
    use lode_core::enums::{EdgeKind, SymbolKind};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn edges_from_and_to() {
        let store = test_store().await;
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();

        let mut data = empty_file_data("calls.py", "h1");
        data.symbols = vec![
            sample_symbol("caller", "caller", SymbolKind::Function),
            sample_symbol("callee", "callee", SymbolKind::Function),
        ];
        data.edges = vec![NewEdge {
            kind: EdgeKind::Calls,
            src: Some("caller".to_string()),
            dst: "callee".to_string(),
            confidence: 0.5,
            evidence_start_line: 3,
            evidence_end_line: 3,
        }];
        store.apply_file_index(&repo.id, &data).await.unwrap();

        let caller = store
            .get_symbol_by_fqn(&repo.id, "caller")
            .await
            .unwrap()
            .unwrap();
        let callee = store
            .get_symbol_by_fqn(&repo.id, "callee")
            .await
            .unwrap()
            .unwrap();

        let outgoing = store.edges_from(&caller.id, EdgeKind::Calls).await.unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].dst_symbol_id, callee.id);

        let incoming = store.edges_to(&callee.id, EdgeKind::Calls).await.unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].src_symbol_id.as_deref(), Some(caller.id.as_str()));

        let none = store.edges_to(&caller.id, EdgeKind::Calls).await.unwrap();
        assert!(none.is_empty());
    }
}
