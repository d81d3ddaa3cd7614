//! Template items
//!
//! Meal items and diet slot items share one shape: a food reference, a gram
//! quantity and a position. Only the table and parent column differ.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use super::position::SiblingSet;
use super::FoodRef;

/// Which list an item lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Meal,
    Slot,
}

impl ItemKind {
    pub(crate) fn table(self) -> &'static str {
        match self {
            ItemKind::Meal => "meal_template_items",
            ItemKind::Slot => "diet_slot_items",
        }
    }

    pub(crate) fn parent_column(self) -> &'static str {
        match self {
            ItemKind::Meal => "meal_template_id",
            ItemKind::Slot => "diet_slot_id",
        }
    }
}

/// The meal template or diet slot owning an item list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemParent {
    Meal(i64),
    Slot(i64),
}

impl ItemParent {
    pub fn kind(self) -> ItemKind {
        match self {
            ItemParent::Meal(_) => ItemKind::Meal,
            ItemParent::Slot(_) => ItemKind::Slot,
        }
    }

    pub fn id(self) -> i64 {
        match self {
            ItemParent::Meal(id) | ItemParent::Slot(id) => id,
        }
    }

    fn of(kind: ItemKind, id: i64) -> Self {
        match kind {
            ItemKind::Meal => ItemParent::Meal(id),
            ItemKind::Slot => ItemParent::Slot(id),
        }
    }

    pub fn siblings(self) -> SiblingSet {
        let kind = self.kind();
        SiblingSet {
            table: kind.table(),
            parent_column: kind.parent_column(),
            parent_id: self.id(),
        }
    }
}

/// A food line in a meal template or diet slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateItem {
    pub id: i64,
    #[serde(skip)]
    pub parent: ItemParent,
    pub food: FoodRef,
    pub quantity_g: f64,
    pub position: i64,
}

impl TemplateItem {
    fn from_row(kind: ItemKind, row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            parent: ItemParent::of(kind, row.get("parent_id")?),
            food: FoodRef::from_row(row)?,
            quantity_g: row.get("quantity_g")?,
            position: row.get("position")?,
        })
    }

    fn select_sql(kind: ItemKind, filter: &str) -> String {
        format!(
            "SELECT id, {} AS parent_id, source_type, alim_code, custom_food_id, quantity_g, position \
             FROM {} WHERE {}",
            kind.parent_column(),
            kind.table(),
            filter
        )
    }

    /// Items of a meal or slot in display order
    pub fn list(conn: &Connection, parent: ItemParent) -> DbResult<Vec<Self>> {
        let kind = parent.kind();
        let sql = format!(
            "{} ORDER BY position ASC, id ASC",
            Self::select_sql(kind, &format!("{} = ?1", kind.parent_column()))
        );
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map([parent.id()], |row| Self::from_row(kind, row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn get_by_id(conn: &Connection, kind: ItemKind, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare(&Self::select_sql(kind, "id = ?1"))?;
        match stmt.query_row([id], |row| Self::from_row(kind, row)) {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Append an item at the end of the list
    pub fn create(
        conn: &Connection,
        parent: ItemParent,
        food: FoodRef,
        quantity_g: f64,
    ) -> DbResult<Self> {
        let position = parent.siblings().next_position(conn)?;
        Self::insert_at(conn, parent, food, quantity_g, position)?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, parent.kind(), id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    fn insert_at(
        conn: &Connection,
        parent: ItemParent,
        food: FoodRef,
        quantity_g: f64,
        position: i64,
    ) -> DbResult<()> {
        let kind = parent.kind();
        let (source_type, alim_code, custom_food_id) = food.to_columns();
        let sql = format!(
            "INSERT INTO {} ({}, source_type, alim_code, custom_food_id, quantity_g, position) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            kind.table(),
            kind.parent_column()
        );
        conn.execute(
            &sql,
            params![parent.id(), source_type, alim_code, custom_food_id, quantity_g, position],
        )?;
        Ok(())
    }

    pub fn update_quantity(
        conn: &Connection,
        kind: ItemKind,
        id: i64,
        quantity_g: f64,
    ) -> DbResult<Option<Self>> {
        let sql = format!("UPDATE {} SET quantity_g = ?1 WHERE id = ?2", kind.table());
        conn.execute(&sql, params![quantity_g, id])?;
        Self::get_by_id(conn, kind, id)
    }

    pub fn delete(conn: &Connection, kind: ItemKind, id: i64) -> DbResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", kind.table());
        let rows = conn.execute(&sql, [id])?;
        Ok(rows > 0)
    }

    /// Replace the whole list with `lines`, positioned `1..=N` in order.
    ///
    /// Deletes then inserts; run inside a transaction.
    pub fn replace_all(
        conn: &Connection,
        parent: ItemParent,
        lines: &[(FoodRef, f64)],
    ) -> DbResult<Vec<Self>> {
        let kind = parent.kind();
        let sql = format!("DELETE FROM {} WHERE {} = ?1", kind.table(), kind.parent_column());
        conn.execute(&sql, [parent.id()])?;

        for (index, (food, quantity_g)) in lines.iter().enumerate() {
            Self::insert_at(conn, parent, *food, *quantity_g, index as i64 + 1)?;
        }

        Self::list(conn, parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_database;

    fn seed_meal(conn: &Connection) -> i64 {
        conn.execute(
            "INSERT INTO meal_templates (coach_id, name) VALUES (1, 'Breakfast')",
            [],
        )
        .unwrap();
        let meal_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO custom_foods (coach_id, name, kcal_100g) VALUES (1, 'Oats', 380)",
            [],
        )
        .unwrap();
        meal_id
    }

    #[test]
    fn test_items_append_in_order() {
        let db = test_database();
        db.with_conn(|conn| {
            let meal_id = seed_meal(conn);
            let food_id = conn.last_insert_rowid();
            let parent = ItemParent::Meal(meal_id);

            let a = TemplateItem::create(conn, parent, FoodRef::Custom(food_id), 50.0)?;
            let b = TemplateItem::create(conn, parent, FoodRef::Custom(food_id), 80.0)?;
            assert_eq!((a.position, b.position), (1, 2));

            let listed = TemplateItem::list(conn, parent)?;
            assert_eq!(listed.iter().map(|i| i.id).collect::<Vec<_>>(), vec![a.id, b.id]);
            assert_eq!(listed[1].parent, parent);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_non_positive_quantity_is_refused_by_schema() {
        let db = test_database();
        db.with_conn(|conn| {
            let meal_id = seed_meal(conn);
            let food_id = conn.last_insert_rowid();
            let result =
                TemplateItem::create(conn, ItemParent::Meal(meal_id), FoodRef::Custom(food_id), 0.0);
            assert!(result.is_err());
            Ok(())
        })
        .unwrap();
    }
}
