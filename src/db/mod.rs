//! Database module
//!
//! Handles SQLite connection and migrations.

pub mod connection;
pub mod migrations;

pub use connection::{Database, DbError, DbResult};

/// In-memory database with the full schema applied
#[cfg(test)]
pub(crate) fn test_database() -> Database {
    let db = Database::in_memory().expect("in-memory pool");
    db.with_conn(migrations::run_migrations).expect("migrations");
    db
}
