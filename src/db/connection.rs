//! Database connection management
//!
//! Provides SQLite connection pooling and transaction helpers.

use std::path::Path;
use std::sync::Arc;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OpenFlags, Transaction};
use thiserror::Error;

/// Database error types
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] r2d2::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Journal document encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl Database {
    /// Create a new database connection pool backed by a file
    pub fn new<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let manager = SqliteConnectionManager::file(path)
            .with_flags(
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI,
            )
            .with_init(|conn| {
                conn.execute_batch(
                    "PRAGMA foreign_keys = ON;
                     PRAGMA journal_mode = WAL;
                     PRAGMA synchronous = NORMAL;
                     PRAGMA cache_size = -64000;
                     PRAGMA temp_store = MEMORY;",
                )?;
                Ok(())
            });

        let pool = Pool::builder().max_size(10).build(manager)?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Create a single-connection in-memory database.
    ///
    /// Every pooled connection to `:memory:` is a distinct database, so the
    /// pool is capped at one connection. Callers must not hold a connection
    /// while asking for another.
    pub fn in_memory() -> DbResult<Self> {
        let manager = SqliteConnectionManager::memory().with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });

        let pool = Pool::builder().max_size(1).build(manager)?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Get a connection from the pool
    pub fn get_conn(&self) -> DbResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Execute a closure with a database connection
    pub fn with_conn<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> DbResult<T>,
    {
        let conn = self.get_conn()?;
        f(&conn)
    }

    /// Execute a closure with a mutable database connection
    pub fn with_conn_mut<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&mut rusqlite::Connection) -> DbResult<T>,
    {
        let mut conn = self.get_conn()?;
        f(&mut conn)
    }

    /// Run a closure inside a single transaction.
    ///
    /// Commits when the closure returns `Ok`; any `Err` drops the transaction,
    /// which rolls every write back.
    pub fn with_transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<DbError>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction().map_err(DbError::from)?;
        let value = f(&tx)?;
        tx.commit().map_err(DbError::from)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute_batch("CREATE TABLE t (v INTEGER NOT NULL);")?;
            Ok(())
        })
        .unwrap();

        let result: DbResult<()> = db.with_transaction(|tx| {
            tx.execute("INSERT INTO t (v) VALUES (1)", [])?;
            Err(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
        });
        assert!(result.is_err());

        let count: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_transaction_commits_on_ok() {
        let db = Database::in_memory().unwrap();
        db.with_conn_mut(|conn| {
            conn.execute_batch("CREATE TABLE t (v INTEGER NOT NULL);")?;
            Ok(())
        })
        .unwrap();

        db.with_transaction(|tx| -> DbResult<()> {
            tx.execute("INSERT INTO t (v) VALUES (7)", [])?;
            Ok(())
        })
        .unwrap();

        let v: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT v FROM t", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(v, 7);
    }
}
