//! # lode-db
//!
//! libSQL storage for Lode.
//!
//! Handles all relational state: repositories, files, symbols, chunks, edges,
//! documents, tags, claims, verifications, and validity scores. Each
//! repository lives in its own namespace (a dedicated database file), so
//! concurrent indexing of different repositories never collides. A control
//! database maps repository names to namespaces.
//!
//! Uses the `libsql` crate (C SQLite fork) — native FTS5 with porter
//! stemming, vector functions (`vector32`, `vector_distance_cos`) for
//! embedding columns, and a stable async API.

mod db;
pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod schema_manager;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use db::LodeDb;
pub use error::DatabaseError;
pub use schema_manager::SchemaManager;
pub use store::LodeStore;
