//! Service layer over one repository namespace.
//!
//! `LodeStore` wraps a [`LodeDb`] opened on a namespace database. All entity
//! repository methods are implemented as `impl LodeStore` blocks under
//! [`crate::repos`].

use crate::LodeDb;
use crate::error::DatabaseError;

/// Scoped handle to one namespace. Every table referenced through this store
/// resolves inside the namespace without the caller naming it.
pub struct LodeStore {
    db: LodeDb,
    namespace: String,
}

impl LodeStore {
    /// Wrap an already-migrated database.
    #[must_use]
    pub fn new(db: LodeDb, namespace: String) -> Self {
        Self { db, namespace }
    }

    /// Open an in-memory store with migrations applied (tests and tools).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be created or migrated.
    pub async fn open_in_memory() -> Result<Self, DatabaseError> {
        let db = LodeDb::open_in_memory().await?;
        db.run_migrations().await?;
        Ok(Self {
            db,
            namespace: "memory".to_string(),
        })
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &LodeDb {
        &self.db
    }

    /// The namespace this store is scoped to.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}
