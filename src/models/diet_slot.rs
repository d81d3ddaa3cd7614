//! Diet slot model
//!
//! A labelled, positioned part of a diet day (e.g. "Breakfast"). A slot may
//! link a meal template for one-click import, but its own items are the
//! source of truth once imported.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use super::position::SiblingSet;

/// A slot of a diet template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietSlot {
    pub id: i64,
    pub diet_template_id: i64,
    pub label: String,
    pub position: i64,
    pub meal_template_id: Option<i64>,
    pub multiplier: f64,
}

/// Editable slot fields, used for both create and update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietSlotInput {
    pub label: String,
    pub meal_template_id: Option<i64>,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

pub fn default_multiplier() -> f64 {
    1.0
}

impl DietSlot {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            diet_template_id: row.get("diet_template_id")?,
            label: row.get("label")?,
            position: row.get("position")?,
            meal_template_id: row.get("meal_template_id")?,
            multiplier: row.get("multiplier")?,
        })
    }

    pub fn siblings(diet_template_id: i64) -> SiblingSet {
        SiblingSet {
            table: "diet_slots",
            parent_column: "diet_template_id",
            parent_id: diet_template_id,
        }
    }

    /// Append a slot at the end of the diet
    pub fn create(conn: &Connection, diet_template_id: i64, data: &DietSlotInput) -> DbResult<Self> {
        let position = Self::siblings(diet_template_id).next_position(conn)?;
        conn.execute(
            r#"
            INSERT INTO diet_slots (diet_template_id, label, position, meal_template_id, multiplier)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                diet_template_id,
                data.label.trim(),
                position,
                data.meal_template_id,
                data.multiplier,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM diet_slots WHERE id = ?1")?;
        match stmt.query_row([id], Self::from_row) {
            Ok(slot) => Ok(Some(slot)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a slot only if its diet template belongs to the coach
    pub fn get_owned(conn: &Connection, coach_id: i64, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT s.* FROM diet_slots s
            INNER JOIN diet_templates d ON d.id = s.diet_template_id
            WHERE s.id = ?1 AND d.coach_id = ?2
            "#,
        )?;
        match stmt.query_row(params![id, coach_id], Self::from_row) {
            Ok(slot) => Ok(Some(slot)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Slots of a diet in display order
    pub fn list_for_diet(conn: &Connection, diet_template_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM diet_slots WHERE diet_template_id = ?1 ORDER BY position ASC, id ASC",
        )?;
        let slots = stmt
            .query_map([diet_template_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(slots)
    }

    pub fn update(conn: &Connection, id: i64, data: &DietSlotInput) -> DbResult<Option<Self>> {
        conn.execute(
            "UPDATE diet_slots SET label = ?1, meal_template_id = ?2, multiplier = ?3 WHERE id = ?4",
            params![data.label.trim(), data.meal_template_id, data.multiplier, id],
        )?;
        Self::get_by_id(conn, id)
    }

    /// Delete a slot with its items
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM diet_slots WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
