//! Per-repository namespace management.
//!
//! Each repository gets a dedicated namespace — its own database file under
//! the storage root — so concurrent indexing of different repositories never
//! contends. A control database maps repository names to namespaces.
//! Initialization is idempotent: re-opening an existing namespace re-runs the
//! `IF NOT EXISTS` migrations and never drops data.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::LodeDb;
use crate::error::DatabaseError;
use crate::store::LodeStore;

/// Manages the control catalog and opens namespace-scoped stores.
pub struct SchemaManager {
    data_dir: PathBuf,
    control: LodeDb,
}

impl SchemaManager {
    /// Open the manager rooted at `data_dir`, creating the control database
    /// if needed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the directory cannot be created or the
    /// control database cannot be opened/migrated.
    pub async fn open(data_dir: &Path) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(data_dir)
            .map_err(|e| DatabaseError::Other(anyhow::anyhow!("create data dir: {e}")))?;
        let control = LodeDb::open_local(&data_dir.join("control.db")).await?;
        control.run_control_migrations().await?;
        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            control,
        })
    }

    /// Resolve a repository name to its namespace, if registered.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the catalog query fails.
    pub async fn namespace_for(&self, repo_name: &str) -> Result<Option<String>, DatabaseError> {
        let mut rows = self
            .control
            .query(
                "SELECT namespace FROM repo_namespace WHERE repo_name = ?1",
                [repo_name],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row.get::<String>(0)?)),
            None => Ok(None),
        }
    }

    /// Ensure a namespace exists for `repo_name` and open a store on it.
    /// Registers the mapping on first use; always re-runs the idempotent
    /// namespace migrations.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if registration, open, or migration fails.
    pub async fn ensure_namespace(&self, repo_name: &str) -> Result<LodeStore, DatabaseError> {
        let namespace = match self.namespace_for(repo_name).await? {
            Some(ns) => ns,
            None => {
                let ns = sanitize_namespace(repo_name);
                self.control
                    .execute(
                        "INSERT OR IGNORE INTO repo_namespace (repo_name, namespace, created_at)
                         VALUES (?1, ?2, ?3)",
                        libsql::params![repo_name, ns.as_str(), Utc::now().to_rfc3339()],
                    )
                    .await?;
                tracing::info!(repo = repo_name, namespace = %ns, "registered namespace");
                ns
            }
        };

        let db = LodeDb::open_local(&self.data_dir.join(format!("{namespace}.db"))).await?;
        db.run_migrations().await?;
        Ok(LodeStore::new(db, namespace))
    }

    /// Open an existing namespace; errors if the repository is unregistered.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NoResult`] for an unknown repository name.
    pub async fn open_namespace(&self, repo_name: &str) -> Result<LodeStore, DatabaseError> {
        let namespace = self
            .namespace_for(repo_name)
            .await?
            .ok_or(DatabaseError::NoResult)?;
        let db = LodeDb::open_local(&self.data_dir.join(format!("{namespace}.db"))).await?;
        db.run_migrations().await?;
        Ok(LodeStore::new(db, namespace))
    }

    /// List registered `(repo_name, namespace)` pairs.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the catalog query fails.
    pub async fn list_namespaces(&self) -> Result<Vec<(String, String)>, DatabaseError> {
        let mut rows = self
            .control
            .query(
                "SELECT repo_name, namespace FROM repo_namespace ORDER BY repo_name",
                (),
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push((row.get::<String>(0)?, row.get::<String>(1)?));
        }
        Ok(out)
    }
}

/// Derive a filesystem-safe namespace from a repository name.
fn sanitize_namespace(repo_name: &str) -> String {
    let mut ns: String = repo_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if ns.is_empty() {
        ns = "repo".to_string();
    }
    // Distinguish names that sanitize to the same string.
    format!(
        "ns_{ns}_{}",
        &lode_core::hashing::content_hash_str(repo_name)[..8]
    )
}
