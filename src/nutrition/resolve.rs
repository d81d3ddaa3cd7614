//! Food composition lookup
//!
//! Loads the items of a meal or slot and resolves each food reference to
//! per-100 g macros and tracked micronutrients.

use rusqlite::{params, Connection, Row};
use serde::Serialize;

use crate::config::NutrientCodes;
use crate::db::DbResult;
use crate::models::{FoodRef, ItemParent, Macros, Per100g};

/// An item with its food's per-100 g values resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedItem {
    pub item_id: i64,
    pub food: FoodRef,
    pub food_name: Option<String>,
    pub quantity_g: f64,
    pub position: i64,
    pub macros_100g: Macros,
    /// `(nutrient code, amount per 100 g)` for tracked micros only
    pub micros_100g: Vec<(i64, f64)>,
}

struct ItemRow {
    item_id: i64,
    food: FoodRef,
    food_name: Option<String>,
    quantity_g: f64,
    position: i64,
    catalog: Per100g,
    custom: Per100g,
}

impl ItemRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            item_id: row.get("id")?,
            food: FoodRef::from_row(row)?,
            food_name: row.get("food_name")?,
            quantity_g: row.get("quantity_g")?,
            position: row.get("position")?,
            catalog: Per100g {
                kcal: row.get("catalog_kcal")?,
                protein: row.get("catalog_protein")?,
                carbs: row.get("catalog_carbs")?,
                fat: row.get("catalog_fat")?,
            },
            custom: Per100g {
                kcal: row.get("custom_kcal")?,
                protein: row.get("custom_protein")?,
                carbs: row.get("custom_carbs")?,
                fat: row.get("custom_fat")?,
            },
        })
    }

    fn macros_100g(&self) -> Macros {
        match self.food {
            FoodRef::Catalog(_) => self.catalog.to_macros(),
            FoodRef::Custom(_) => self.custom.to_macros_with_derived_kcal(),
        }
    }
}

/// Items of a meal or slot in position order, with composition resolved
pub fn load_resolved_items(
    conn: &Connection,
    parent: ItemParent,
    codes: &NutrientCodes,
) -> DbResult<Vec<ResolvedItem>> {
    let kind = parent.kind();
    let sql = format!(
        r#"
        SELECT i.id, i.source_type, i.alim_code, i.custom_food_id, i.quantity_g, i.position,
            COALESCE(cf.name, f.name_fr) AS food_name,
            cf.kcal_100g AS custom_kcal,
            cf.protein_100g AS custom_protein,
            cf.carbs_100g AS custom_carbs,
            cf.fat_100g AS custom_fat,
            (SELECT teneur FROM catalog_compositions c
                WHERE c.alim_code = i.alim_code AND c.const_code = ?2) AS catalog_kcal,
            (SELECT teneur FROM catalog_compositions c
                WHERE c.alim_code = i.alim_code AND c.const_code = ?3) AS catalog_protein,
            (SELECT teneur FROM catalog_compositions c
                WHERE c.alim_code = i.alim_code AND c.const_code = ?4) AS catalog_carbs,
            (SELECT teneur FROM catalog_compositions c
                WHERE c.alim_code = i.alim_code AND c.const_code = ?5) AS catalog_fat
        FROM {table} i
        LEFT JOIN custom_foods cf ON cf.id = i.custom_food_id
        LEFT JOIN catalog_foods f ON f.alim_code = i.alim_code
        WHERE i.{parent_column} = ?1
        ORDER BY i.position ASC, i.id ASC
        "#,
        table = kind.table(),
        parent_column = kind.parent_column(),
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(
            params![parent.id(), codes.kcal, codes.protein, codes.carbs, codes.fat],
            ItemRow::from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    let mut catalog_micros = conn.prepare(
        "SELECT const_code, teneur FROM catalog_compositions WHERE alim_code = ?1 AND teneur IS NOT NULL",
    )?;
    let mut custom_micros = conn.prepare(
        "SELECT const_code, value_100g FROM custom_food_nutrients WHERE custom_food_id = ?1",
    )?;

    let mut resolved = Vec::with_capacity(rows.len());
    for row in rows {
        let (stmt, key) = match row.food {
            FoodRef::Catalog(code) => (&mut catalog_micros, code),
            FoodRef::Custom(id) => (&mut custom_micros, id),
        };
        let micros_100g = stmt
            .query_map([key], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, f64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter(|(code, _)| codes.is_micro(*code))
            .collect();

        resolved.push(ResolvedItem {
            item_id: row.item_id,
            food: row.food,
            macros_100g: row.macros_100g(),
            food_name: row.food_name,
            quantity_g: row.quantity_g,
            position: row.position,
            micros_100g,
        });
    }

    Ok(resolved)
}
