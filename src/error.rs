//! Coach operation errors

use thiserror::Error;

use crate::db::DbError;
use crate::models::ReorderError;

/// Failure of a coach operation. Nothing is written when one is returned.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{entity} not found with id: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{domain} record not found with id: {id}")]
    RecordNotFound { domain: &'static str, id: String },

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] DbError),
}

pub type ToolResult<T> = Result<T, ToolError>;

impl ToolError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        ToolError::NotFound { entity, id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ToolError::Validation(message.into())
    }
}

impl From<rusqlite::Error> for ToolError {
    fn from(e: rusqlite::Error) -> Self {
        ToolError::Database(DbError::Sqlite(e))
    }
}

impl From<ReorderError> for ToolError {
    fn from(e: ReorderError) -> Self {
        ToolError::Validation(format!("Invalid order: {}", e))
    }
}
