//! Diet template model
//!
//! A named day plan made of ordered slots.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// A coach diet template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietTemplate {
    pub id: i64,
    pub coach_id: i64,
    pub name: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a diet template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DietTemplateCreate {
    pub name: String,
    pub notes: Option<String>,
}

/// Data for updating a diet template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DietTemplateUpdate {
    pub name: Option<String>,
    pub notes: Option<String>,
}

impl DietTemplate {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            coach_id: row.get("coach_id")?,
            name: row.get("name")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn create(conn: &Connection, coach_id: i64, data: &DietTemplateCreate) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO diet_templates (coach_id, name, notes) VALUES (?1, ?2, ?3)",
            params![coach_id, data.name.trim(), data.notes],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_owned(conn, coach_id, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_owned(conn: &Connection, coach_id: i64, id: i64) -> DbResult<Option<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM diet_templates WHERE id = ?1 AND coach_id = ?2")?;

        match stmt.query_row(params![id, coach_id], Self::from_row) {
            Ok(diet) => Ok(Some(diet)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_owned(conn: &Connection, coach_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM diet_templates WHERE coach_id = ?1 ORDER BY name ASC, id ASC",
        )?;

        let diets = stmt
            .query_map([coach_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(diets)
    }

    pub fn update_owned(
        conn: &Connection,
        coach_id: i64,
        id: i64,
        data: &DietTemplateUpdate,
    ) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        macro_rules! add_update {
            ($field:ident, $col:expr) => {
                if let Some(ref val) = data.$field {
                    updates.push(format!("{} = ?{}", $col, params_vec.len() + 1));
                    params_vec.push(Box::new(val.trim().to_string()));
                }
            };
        }

        add_update!(name, "name");
        add_update!(notes, "notes");

        if updates.is_empty() {
            return Self::get_owned(conn, coach_id, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE diet_templates SET {} WHERE id = ?{} AND coach_id = ?{}",
            updates.join(", "),
            params_vec.len() + 1,
            params_vec.len() + 2
        );
        params_vec.push(Box::new(id));
        params_vec.push(Box::new(coach_id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_owned(conn, coach_id, id)
    }

    /// Delete a diet template with its slots and slot items
    pub fn delete_owned(conn: &Connection, coach_id: i64, id: i64) -> DbResult<bool> {
        let rows = conn.execute(
            "DELETE FROM diet_templates WHERE id = ?1 AND coach_id = ?2",
            params![id, coach_id],
        )?;
        Ok(rows > 0)
    }
}
