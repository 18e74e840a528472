//! Symbol lookups: exact, repo-wide, and trigram-fuzzy.

use lode_core::entities::{Span, Symbol};

use crate::error::DatabaseError;
use crate::helpers::parse_enum;
use crate::store::LodeStore;

pub(crate) fn row_to_symbol(row: &libsql::Row) -> Result<Symbol, DatabaseError> {
    Ok(Symbol {
        id: row.get::<String>(0)?,
        repo_id: row.get::<String>(1)?,
        file_id: row.get::<String>(2)?,
        fqn: row.get::<String>(3)?,
        name: row.get::<String>(4)?,
        kind: parse_enum(&row.get::<String>(5)?)?,
        signature: row.get::<String>(6)?,
        span: Span {
            start_line: u32::try_from(row.get::<i64>(7)?).unwrap_or(0),
            end_line: u32::try_from(row.get::<i64>(8)?).unwrap_or(0),
            start_byte: u32::try_from(row.get::<i64>(9)?).unwrap_or(0),
            end_byte: u32::try_from(row.get::<i64>(10)?).unwrap_or(0),
        },
        docstring: row.get::<Option<String>>(11)?,
        content_hash: row.get::<String>(12)?,
    })
}

pub(crate) const SYMBOL_COLUMNS: &str = "id, repo_id, file_id, fqn, name, kind, signature, \
     start_line, end_line, start_byte, end_byte, docstring, content_hash";

/// A fuzzy symbol match with its trigram similarity.
#[derive(Debug, Clone)]
pub struct FuzzySymbolMatch {
    pub symbol: Symbol,
    pub similarity: f64,
}

impl LodeStore {
    /// Look up a symbol by id.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_symbol(&self, symbol_id: &str) -> Result<Option<Symbol>, DatabaseError> {
        let sql = format!("SELECT {SYMBOL_COLUMNS} FROM symbol WHERE id = ?1");
        let mut rows = self.db().query(&sql, [symbol_id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_symbol(&row)?)),
            None => Ok(None),
        }
    }

    /// Look up one symbol by FQN (most recently indexed wins on collision).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_symbol_by_fqn(
        &self,
        repo_id: &str,
        fqn: &str,
    ) -> Result<Option<Symbol>, DatabaseError> {
        let sql = format!(
            "SELECT {SYMBOL_COLUMNS} FROM symbol WHERE repo_id = ?1 AND fqn = ?2
             ORDER BY rowid DESC LIMIT 1"
        );
        let mut rows = self.db().query(&sql, [repo_id, fqn]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_symbol(&row)?)),
            None => Ok(None),
        }
    }

    /// All symbols with a given FQN across files (collision inspection).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_symbols_by_fqn(
        &self,
        repo_id: &str,
        fqn: &str,
    ) -> Result<Vec<Symbol>, DatabaseError> {
        let sql = format!(
            "SELECT {SYMBOL_COLUMNS} FROM symbol WHERE repo_id = ?1 AND fqn = ?2
             ORDER BY rowid DESC"
        );
        let mut rows = self.db().query(&sql, [repo_id, fqn]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_symbol(&row)?);
        }
        Ok(out)
    }

    /// Look up symbols by simple name.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_symbols_by_name(
        &self,
        repo_id: &str,
        name: &str,
        limit: u32,
    ) -> Result<Vec<Symbol>, DatabaseError> {
        let sql = format!(
            "SELECT {SYMBOL_COLUMNS} FROM symbol WHERE repo_id = ?1 AND name = ?2 LIMIT {limit}"
        );
        let mut rows = self.db().query(&sql, [repo_id, name]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_symbol(&row)?);
        }
        Ok(out)
    }

    /// Symbols for one file, ordered by position.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn symbols_for_file(&self, file_id: &str) -> Result<Vec<Symbol>, DatabaseError> {
        let sql = format!(
            "SELECT {SYMBOL_COLUMNS} FROM symbol WHERE file_id = ?1 ORDER BY start_line"
        );
        let mut rows = self.db().query(&sql, [file_id]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_symbol(&row)?);
        }
        Ok(out)
    }

    /// Trigram-fuzzy match against symbol names, ranked by similarity.
    ///
    /// Candidates are narrowed in SQL (shared leading character or substring
    /// match) and ranked with trigram similarity in memory, bounded by
    /// `max_candidates` to keep the scan predictable.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn fuzzy_symbols(
        &self,
        repo_id: &str,
        name: &str,
        limit: usize,
    ) -> Result<Vec<FuzzySymbolMatch>, DatabaseError> {
        const MAX_CANDIDATES: u32 = 2_000;
        let sql = format!(
            "SELECT {SYMBOL_COLUMNS} FROM symbol WHERE repo_id = ?1 LIMIT {MAX_CANDIDATES}"
        );
        let mut rows = self.db().query(&sql, [repo_id]).await?;
        let mut matches = Vec::new();
        while let Some(row) = rows.next().await? {
            let symbol = row_to_symbol(&row)?;
            let similarity = trigram_similarity(name, &symbol.name);
            if similarity > 0.0 {
                matches.push(FuzzySymbolMatch { symbol, similarity });
            }
        }
        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.symbol.name.cmp(&b.symbol.name))
        });
        matches.truncate(limit);
        Ok(matches)
    }

    /// Trigram-fuzzy match against file paths.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn fuzzy_file_paths(
        &self,
        repo_id: &str,
        path: &str,
        limit: usize,
    ) -> Result<Vec<(String, f64)>, DatabaseError> {
        let mut rows = self
            .db()
            .query("SELECT path FROM file WHERE repo_id = ?1", [repo_id])
            .await?;
        let mut matches = Vec::new();
        while let Some(row) = rows.next().await? {
            let candidate = row.get::<String>(0)?;
            let similarity = trigram_similarity(path, &candidate);
            if similarity > 0.0 {
                matches.push((candidate, similarity));
            }
        }
        matches.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        matches.truncate(limit);
        Ok(matches)
    }
}

/// Trigram similarity in `[0, 1]`: shared trigrams / union of trigrams.
///
/// Strings are lowercased and padded with two leading and one trailing space,
/// matching the conventional trigram scheme used for fuzzy identifier lookup.
#[must_use]
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    let ta = trigrams(a);
    let tb = trigrams(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let shared = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    #[allow(clippy::cast_precision_loss)]
    {
        shared as f64 / union as f64
    }
}

fn trigrams(s: &str) -> std::collections::HashSet<[char; 3]> {
    let lowered = s.to_lowercase();
    let padded: Vec<char> = format!("  {lowered} ").chars().collect();
    padded.windows(3).map(|w| [w[0], w[1], w[2]]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{empty_file_data, sample_symbol, test_store};
    use lode_core::enums::SymbolKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn trigram_identical_is_one() {
        assert!((trigram_similarity("login", "login") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn trigram_close_names_beat_distant() {
        let close = trigram_similarity("authenticate", "authentcate");
        let far = trigram_similarity("authenticate", "zzz");
        assert!(close > 0.5, "one-typo similarity was {close}");
        assert!(far < 0.1);
    }

    #[test]
    fn trigram_empty_is_zero() {
        assert!(trigram_similarity("", "anything").abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn fqn_lookup_last_writer_wins() {
        let store = test_store().await;
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();

        let mut a = empty_file_data("a/utils.py", "h1");
        a.symbols = vec![sample_symbol("helper", "helper", SymbolKind::Function)];
        store.apply_file_index(&repo.id, &a).await.unwrap();

        let mut b = empty_file_data("b/utils.py", "h2");
        b.symbols = vec![sample_symbol("helper", "helper", SymbolKind::Function)];
        store.apply_file_index(&repo.id, &b).await.unwrap();

        let file_b = store
            .get_file_by_path(&repo.id, "b/utils.py")
            .await
            .unwrap()
            .unwrap();
        let winner = store
            .get_symbol_by_fqn(&repo.id, "helper")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(winner.file_id, file_b.id, "last indexed file wins");

        let all = store.get_symbols_by_fqn(&repo.id, "helper").await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn fuzzy_symbols_rank_by_similarity() {
        let store = test_store().await;
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();

        let mut data = empty_file_data("auth.py", "h1");
        data.symbols = vec![
            sample_symbol("authenticate", "authenticate", SymbolKind::Function),
            sample_symbol("authorize", "authorize", SymbolKind::Function),
            sample_symbol("unrelated", "unrelated", SymbolKind::Function),
        ];
        store.apply_file_index(&repo.id, &data).await.unwrap();

        let matches = store
            .fuzzy_symbols(&repo.id, "authentcate", 2)
            .await
            .unwrap();
        assert_eq!(matches[0].symbol.name, "authenticate");
        assert!(matches[0].similarity > matches[1].similarity);
    }
}
