//! Sibling ordering
//!
//! Items within a meal or slot, and slots within a diet, carry a 1-based
//! `position`. Reordering rewrites every position in one pass and accepts
//! only an exact permutation of the current sibling ids.

use std::collections::HashSet;

use rusqlite::{params, Connection};
use thiserror::Error;

use crate::db::DbResult;

/// Why a proposed ordering was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReorderError {
    #[error("id {0} appears more than once in the new order")]
    Duplicate(i64),

    #[error("new order is missing ids {0:?}")]
    Missing(Vec<i64>),

    #[error("ids {0:?} do not belong to this list")]
    Foreign(Vec<i64>),
}

/// Check that `proposed` is a permutation of `existing`
pub fn validate_reorder(existing: &[i64], proposed: &[i64]) -> Result<(), ReorderError> {
    let mut seen = HashSet::with_capacity(proposed.len());
    for &id in proposed {
        if !seen.insert(id) {
            return Err(ReorderError::Duplicate(id));
        }
    }

    let current: HashSet<i64> = existing.iter().copied().collect();

    let foreign: Vec<i64> = proposed.iter().copied().filter(|id| !current.contains(id)).collect();
    if !foreign.is_empty() {
        return Err(ReorderError::Foreign(foreign));
    }

    let missing: Vec<i64> = existing.iter().copied().filter(|id| !seen.contains(id)).collect();
    if !missing.is_empty() {
        return Err(ReorderError::Missing(missing));
    }

    Ok(())
}

/// A positioned child table filtered by its parent
#[derive(Debug, Clone, Copy)]
pub struct SiblingSet {
    pub table: &'static str,
    pub parent_column: &'static str,
    pub parent_id: i64,
}

impl SiblingSet {
    /// Sibling ids in their current order
    pub fn ids(&self, conn: &Connection) -> DbResult<Vec<i64>> {
        let sql = format!(
            "SELECT id FROM {} WHERE {} = ?1 ORDER BY position ASC, id ASC",
            self.table, self.parent_column
        );
        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
            .query_map([self.parent_id], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    /// Position for a row appended at the end
    pub fn next_position(&self, conn: &Connection) -> DbResult<i64> {
        let sql = format!(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM {} WHERE {} = ?1",
            self.table, self.parent_column
        );
        Ok(conn.query_row(&sql, [self.parent_id], |row| row.get(0))?)
    }

    /// Assign positions `1..=N` following `ordered_ids`.
    ///
    /// Callers validate the ids first and run this inside a transaction.
    pub fn write_positions(&self, conn: &Connection, ordered_ids: &[i64]) -> DbResult<()> {
        let sql = format!(
            "UPDATE {} SET position = ?1 WHERE id = ?2 AND {} = ?3",
            self.table, self.parent_column
        );
        let mut stmt = conn.prepare(&sql)?;
        for (index, id) in ordered_ids.iter().enumerate() {
            stmt.execute(params![index as i64 + 1, id, self.parent_id])?;
        }
        Ok(())
    }
}
