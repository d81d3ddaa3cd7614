//! Custom food model
//!
//! Coach-authored foods with per-100 g macros and a sparse set of
//! micronutrients. Every query is filtered by the owning coach.

use std::collections::BTreeMap;

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::config::NutrientCodes;
use crate::db::{DbError, DbResult};
use super::{atwater_kcal, Per100g};

/// A coach custom food
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomFood {
    pub id: i64,
    pub coach_id: i64,
    pub name: String,
    pub per_100g: Per100g,
    pub created_at: String,
    pub updated_at: String,
}

/// Full set of editable fields, used for both create and update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomFoodInput {
    pub name: String,
    pub kcal_100g: Option<f64>,
    pub protein_100g: Option<f64>,
    pub carbs_100g: Option<f64>,
    pub fat_100g: Option<f64>,
    /// Micronutrient values per 100 g keyed by nutrient code
    #[serde(default)]
    pub micros: BTreeMap<i64, Option<f64>>,
}

impl CustomFoodInput {
    /// kcal to store: the explicit value when given, otherwise derived from
    /// whichever macros are present, otherwise none
    pub fn stored_kcal(&self) -> Option<f64> {
        if self.kcal_100g.is_some() {
            return self.kcal_100g;
        }
        if self.protein_100g.is_none() && self.carbs_100g.is_none() && self.fat_100g.is_none() {
            return None;
        }
        Some(atwater_kcal(
            self.protein_100g.unwrap_or(0.0),
            self.carbs_100g.unwrap_or(0.0),
            self.fat_100g.unwrap_or(0.0),
        ))
    }
}

impl CustomFood {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            coach_id: row.get("coach_id")?,
            name: row.get("name")?,
            per_100g: Per100g {
                kcal: row.get("kcal_100g")?,
                protein: row.get("protein_100g")?,
                carbs: row.get("carbs_100g")?,
                fat: row.get("fat_100g")?,
            },
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a custom food and its whitelisted micros.
    ///
    /// Writes several rows; run inside a transaction.
    pub fn create(
        conn: &Connection,
        coach_id: i64,
        data: &CustomFoodInput,
        codes: &NutrientCodes,
    ) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO custom_foods (coach_id, name, kcal_100g, protein_100g, carbs_100g, fat_100g)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                coach_id,
                data.name.trim(),
                data.stored_kcal(),
                data.protein_100g,
                data.carbs_100g,
                data.fat_100g,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::insert_micros(conn, id, &data.micros, codes)?;

        Self::get_owned(conn, coach_id, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get a custom food only if it belongs to the coach
    pub fn get_owned(conn: &Connection, coach_id: i64, id: i64) -> DbResult<Option<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM custom_foods WHERE id = ?1 AND coach_id = ?2")?;

        match stmt.query_row(params![id, coach_id], Self::from_row) {
            Ok(food) => Ok(Some(food)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_owned(conn: &Connection, coach_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM custom_foods WHERE coach_id = ?1 ORDER BY name ASC, id ASC",
        )?;

        let foods = stmt
            .query_map([coach_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(foods)
    }

    pub fn search_owned(
        conn: &Connection,
        coach_id: i64,
        query: &str,
        limit: i64,
    ) -> DbResult<Vec<Self>> {
        let pattern = format!("%{}%", query);
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM custom_foods
            WHERE coach_id = ?1 AND name LIKE ?2
            ORDER BY name ASC
            LIMIT ?3
            "#,
        )?;

        let foods = stmt
            .query_map(params![coach_id, pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(foods)
    }

    /// Replace every field of an owned custom food and its micros.
    ///
    /// Returns `None` when the food does not exist for this coach.
    pub fn update_owned(
        conn: &Connection,
        coach_id: i64,
        id: i64,
        data: &CustomFoodInput,
        codes: &NutrientCodes,
    ) -> DbResult<Option<Self>> {
        let rows = conn.execute(
            r#"
            UPDATE custom_foods SET
                name = ?1, kcal_100g = ?2, protein_100g = ?3, carbs_100g = ?4, fat_100g = ?5,
                updated_at = datetime('now')
            WHERE id = ?6 AND coach_id = ?7
            "#,
            params![
                data.name.trim(),
                data.stored_kcal(),
                data.protein_100g,
                data.carbs_100g,
                data.fat_100g,
                id,
                coach_id,
            ],
        )?;
        if rows == 0 {
            return Ok(None);
        }

        conn.execute(
            "DELETE FROM custom_food_nutrients WHERE custom_food_id = ?1",
            [id],
        )?;
        Self::insert_micros(conn, id, &data.micros, codes)?;

        Self::get_owned(conn, coach_id, id)
    }

    /// Delete an owned custom food; items referencing it are removed by cascade
    pub fn delete_owned(conn: &Connection, coach_id: i64, id: i64) -> DbResult<bool> {
        let rows = conn.execute(
            "DELETE FROM custom_foods WHERE id = ?1 AND coach_id = ?2",
            params![id, coach_id],
        )?;
        Ok(rows > 0)
    }

    /// Stored micros as `(const_code, value_100g)`, ordered by code
    pub fn micros(conn: &Connection, id: i64) -> DbResult<Vec<(i64, f64)>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT const_code, value_100g FROM custom_food_nutrients
            WHERE custom_food_id = ?1
            ORDER BY const_code
            "#,
        )?;

        let micros = stmt
            .query_map([id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(micros)
    }

    /// Number of meal and slot items that reference this food
    pub fn usage_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            r#"
            SELECT (SELECT COUNT(*) FROM meal_template_items WHERE custom_food_id = ?1)
                 + (SELECT COUNT(*) FROM diet_slot_items WHERE custom_food_id = ?1)
            "#,
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn insert_micros(
        conn: &Connection,
        id: i64,
        micros: &BTreeMap<i64, Option<f64>>,
        codes: &NutrientCodes,
    ) -> DbResult<()> {
        let mut stmt = conn.prepare(
            "INSERT INTO custom_food_nutrients (custom_food_id, const_code, value_100g) VALUES (?1, ?2, ?3)",
        )?;

        for (&code, value) in micros {
            let Some(value) = value else { continue };
            if codes.is_micro(code) {
                stmt.execute(params![id, code, value])?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_database;

    fn input(name: &str) -> CustomFoodInput {
        CustomFoodInput {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_stored_kcal_rule() {
        let explicit = CustomFoodInput {
            kcal_100g: Some(250.0),
            protein_100g: Some(20.0),
            ..input("Bar")
        };
        assert_eq!(explicit.stored_kcal(), Some(250.0));

        let derived = CustomFoodInput {
            protein_100g: Some(20.0),
            fat_100g: Some(10.0),
            ..input("Shake")
        };
        assert_eq!(derived.stored_kcal(), Some(170.0));

        assert_eq!(input("Water").stored_kcal(), None);
    }

    #[test]
    fn test_lookup_is_owner_scoped() {
        let db = test_database();
        let codes = NutrientCodes::default();
        db.with_conn(|conn| {
            let food = CustomFood::create(conn, 1, &input("Granola"), &codes)?;
            assert!(CustomFood::get_owned(conn, 1, food.id)?.is_some());
            assert!(CustomFood::get_owned(conn, 2, food.id)?.is_none());
            assert!(!CustomFood::delete_owned(conn, 2, food.id)?);
            assert!(CustomFood::update_owned(conn, 2, food.id, &input("Stolen"), &codes)?.is_none());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_only_whitelisted_micros_are_kept() {
        let db = test_database();
        let codes = NutrientCodes::default();
        let mut data = input("Spinach");
        data.micros.insert(10260, Some(2.7));
        data.micros.insert(10120, None);
        data.micros.insert(99999, Some(1.0));

        db.with_conn(|conn| {
            let food = CustomFood::create(conn, 1, &data, &codes)?;
            assert_eq!(CustomFood::micros(conn, food.id)?, vec![(10260, 2.7)]);

            let mut replaced = input("Spinach");
            replaced.micros.insert(10300, Some(0.5));
            CustomFood::update_owned(conn, 1, food.id, &replaced, &codes)?;
            assert_eq!(CustomFood::micros(conn, food.id)?, vec![(10300, 0.5)]);
            Ok(())
        })
        .unwrap();
    }
}
