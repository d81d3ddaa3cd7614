//! Meal template model
//!
//! A named, ordered list of food items. A template with a parent is a
//! substitute for that parent; substitutes never have substitutes of their own.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// A coach meal template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealTemplate {
    pub id: i64,
    pub coach_id: i64,
    pub parent_meal_id: Option<i64>,
    pub name: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a meal template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MealTemplateCreate {
    pub name: String,
    pub notes: Option<String>,
    pub parent_meal_id: Option<i64>,
}

/// Data for updating a meal template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MealTemplateUpdate {
    pub name: Option<String>,
    pub notes: Option<String>,
}

impl MealTemplate {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            coach_id: row.get("coach_id")?,
            parent_meal_id: row.get("parent_meal_id")?,
            name: row.get("name")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn is_root(&self) -> bool {
        self.parent_meal_id.is_none()
    }

    /// Insert a meal template. The parent, if any, must already be checked.
    pub fn create(conn: &Connection, coach_id: i64, data: &MealTemplateCreate) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO meal_templates (coach_id, parent_meal_id, name, notes) VALUES (?1, ?2, ?3, ?4)",
            params![coach_id, data.parent_meal_id, data.name.trim(), data.notes],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_owned(conn, coach_id, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_owned(conn: &Connection, coach_id: i64, id: i64) -> DbResult<Option<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM meal_templates WHERE id = ?1 AND coach_id = ?2")?;

        match stmt.query_row(params![id, coach_id], Self::from_row) {
            Ok(meal) => Ok(Some(meal)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Every meal template of the coach, roots and substitutes, by name
    pub fn list_owned(conn: &Connection, coach_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM meal_templates WHERE coach_id = ?1 ORDER BY name ASC, id ASC",
        )?;

        let meals = stmt
            .query_map([coach_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(meals)
    }

    /// Substitutes of a root template, by name
    pub fn substitutes(conn: &Connection, parent_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM meal_templates WHERE parent_meal_id = ?1 ORDER BY name ASC, id ASC",
        )?;

        let meals = stmt
            .query_map([parent_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(meals)
    }

    pub fn update_owned(
        conn: &Connection,
        coach_id: i64,
        id: i64,
        data: &MealTemplateUpdate,
    ) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.trim().to_string()));
        }
        if let Some(ref notes) = data.notes {
            updates.push(format!("notes = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(notes.clone()));
        }

        if updates.is_empty() {
            return Self::get_owned(conn, coach_id, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE meal_templates SET {} WHERE id = ?{} AND coach_id = ?{}",
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

    /// Partition templates into roots, each paired with its substitutes.
    ///
    /// Input order is kept within each group. A substitute whose parent is
    /// not in the input is listed as a root.
    pub fn group_substitutes(meals: Vec<Self>) -> Vec<(Self, Vec<Self>)> {
        let root_ids: std::collections::HashSet<i64> =
            meals.iter().filter(|m| m.is_root()).map(|m| m.id).collect();

        let mut children: std::collections::HashMap<i64, Vec<Self>> =
            std::collections::HashMap::new();
        let mut roots = Vec::new();
        for meal in meals {
            match meal.parent_meal_id {
                Some(parent_id) if root_ids.contains(&parent_id) => {
                    children.entry(parent_id).or_default().push(meal)
                }
                _ => roots.push(meal),
            }
        }

        roots
            .into_iter()
            .map(|root| {
                let subs = children.remove(&root.id).unwrap_or_default();
                (root, subs)
            })
            .collect()
    }

    /// Delete a template with its items and substitutes
    pub fn delete_owned(conn: &Connection, coach_id: i64, id: i64) -> DbResult<bool> {
        let rows = conn.execute(
            "DELETE FROM meal_templates WHERE id = ?1 AND coach_id = ?2",
            params![id, coach_id],
        )?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_database;

    #[test]
    fn test_delete_cascades_to_substitutes() {
        let db = test_database();
        db.with_conn(|conn| {
            let root = MealTemplate::create(
                conn,
                1,
                &MealTemplateCreate { name: "Lunch".into(), ..Default::default() },
            )?;
            let sub = MealTemplate::create(
                conn,
                1,
                &MealTemplateCreate {
                    name: "Lunch B".into(),
                    parent_meal_id: Some(root.id),
                    ..Default::default()
                },
            )?;
            assert!(root.is_root());
            assert!(!sub.is_root());
            assert_eq!(MealTemplate::substitutes(conn, root.id)?.len(), 1);

            assert!(MealTemplate::delete_owned(conn, 1, root.id)?);
            assert!(MealTemplate::get_owned(conn, 1, sub.id)?.is_none());
            Ok(())
        })
        .unwrap();
    }

    fn meal(id: i64, parent_meal_id: Option<i64>, name: &str) -> MealTemplate {
        MealTemplate {
            id,
            coach_id: 1,
            parent_meal_id,
            name: name.to_string(),
            notes: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_group_substitutes() {
        let groups = MealTemplate::group_substitutes(vec![
            meal(1, None, "Breakfast"),
            meal(3, Some(1), "Breakfast B"),
            meal(2, None, "Dinner"),
            meal(4, Some(1), "Breakfast C"),
            meal(5, Some(99), "Orphan"),
        ]);

        let shape: Vec<(i64, Vec<i64>)> = groups
            .iter()
            .map(|(root, subs)| (root.id, subs.iter().map(|s| s.id).collect()))
            .collect();
        assert_eq!(shape, vec![(1, vec![3, 4]), (2, vec![]), (5, vec![])]);
    }

    #[test]
    fn test_partial_update() {
        let db = test_database();
        db.with_conn(|conn| {
            let meal = MealTemplate::create(
                conn,
                1,
                &MealTemplateCreate {
                    name: "Snack".into(),
                    notes: Some("post workout".into()),
                    ..Default::default()
                },
            )?;
            let updated = MealTemplate::update_owned(
                conn,
                1,
                meal.id,
                &MealTemplateUpdate { name: Some(" Snack 2 ".into()), notes: None },
            )?
            .unwrap();
            assert_eq!(updated.name, "Snack 2");
            assert_eq!(updated.notes.as_deref(), Some("post workout"));

            let other = MealTemplate::update_owned(conn, 2, meal.id, &MealTemplateUpdate::default())?;
            assert!(other.is_none());
            Ok(())
        })
        .unwrap();
    }
}
