//! Item list operations shared by meal templates and diet slots
//!
//! Adding, re-quantifying, deleting and reordering food lines, plus the
//! pieces every edit view is built from.

use rusqlite::Connection;
use serde::Serialize;

use crate::config::NutrientCodes;
use crate::error::{ToolError, ToolResult};
use crate::models::{
    validate_reorder, Constituent, FoodRef, ItemKind, ItemParent, Macros, TemplateItem,
};
use crate::nutrition::{aggregate, load_resolved_items, Aggregate, ResolvedItem};
use super::{require_positive, CoachContext};

/// One item line of an edit view
#[derive(Debug, Clone, Serialize)]
pub struct ItemLine {
    pub id: i64,
    pub position: i64,
    pub food: FoodRef,
    pub food_name: Option<String>,
    pub quantity_g: f64,
    pub macros: Macros,
}

impl From<&ResolvedItem> for ItemLine {
    fn from(item: &ResolvedItem) -> Self {
        Self {
            id: item.item_id,
            position: item.position,
            food: item.food,
            food_name: item.food_name.clone(),
            quantity_g: item.quantity_g,
            macros: item.macros(),
        }
    }
}

/// Name of a tracked micronutrient
#[derive(Debug, Clone, Serialize)]
pub struct MicroMeta {
    pub const_code: i64,
    pub name_fr: Option<String>,
    pub name_en: Option<String>,
}

/// Response for reorder operations
#[derive(Debug, Serialize)]
pub struct ReorderResponse {
    pub success: bool,
    pub parent_id: i64,
    pub order: Vec<i64>,
}

/// Response for item deletion
#[derive(Debug, Serialize)]
pub struct DeleteItemResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Item lines and totals of one meal or slot
pub(crate) fn load_lines(
    conn: &Connection,
    parent: ItemParent,
    codes: &NutrientCodes,
) -> ToolResult<(Vec<ItemLine>, Aggregate)> {
    let resolved = load_resolved_items(conn, parent, codes)?;
    let totals = aggregate(&resolved, &codes.micros);
    let lines = resolved.iter().map(ItemLine::from).collect();
    Ok((lines, totals))
}

/// Names for every tracked micro code, in code order
pub(crate) fn micro_meta(conn: &Connection, codes: &NutrientCodes) -> ToolResult<Vec<MicroMeta>> {
    let known = Constituent::list_for_codes(conn, &codes.micros)?;
    let mut sorted = codes.micros.clone();
    sorted.sort_unstable();
    sorted.dedup();

    Ok(sorted
        .into_iter()
        .map(|code| {
            let found = known.iter().find(|c| c.const_code == code);
            MicroMeta {
                const_code: code,
                name_fr: found.map(|c| c.name_fr.clone()),
                name_en: found.and_then(|c| c.name_en.clone()),
            }
        })
        .collect())
}

/// Append a food line to an owned meal or slot
pub fn add_item(
    ctx: &CoachContext,
    parent: ItemParent,
    food: FoodRef,
    quantity_g: f64,
) -> ToolResult<TemplateItem> {
    require_positive("quantity_g", quantity_g)?;

    let item = ctx.database.with_transaction(|tx| {
        ctx.scope.item_parent(tx, parent)?;
        ctx.scope.resolve_food_ref(tx, food)?;
        Ok::<_, ToolError>(TemplateItem::create(tx, parent, food, quantity_g)?)
    })?;

    tracing::debug!(item_id = item.id, parent = ?parent, "added item");
    Ok(item)
}

/// Change the quantity of an owned item
pub fn update_item(
    ctx: &CoachContext,
    kind: ItemKind,
    item_id: i64,
    quantity_g: f64,
) -> ToolResult<TemplateItem> {
    require_positive("quantity_g", quantity_g)?;

    let conn = ctx.database.get_conn()?;
    ctx.scope.item(&conn, kind, item_id)?;
    TemplateItem::update_quantity(&conn, kind, item_id, quantity_g)?
        .ok_or_else(|| ToolError::not_found("Item", item_id))
}

pub fn delete_item(ctx: &CoachContext, kind: ItemKind, item_id: i64) -> ToolResult<DeleteItemResponse> {
    let conn = ctx.database.get_conn()?;
    ctx.scope.item(&conn, kind, item_id)?;
    TemplateItem::delete(&conn, kind, item_id)?;

    tracing::debug!(item_id, kind = ?kind, "deleted item");
    Ok(DeleteItemResponse {
        success: true,
        deleted_id: item_id,
    })
}

/// Rewrite item positions to follow `ordered_ids` exactly
pub fn reorder_items(
    ctx: &CoachContext,
    parent: ItemParent,
    ordered_ids: Vec<i64>,
) -> ToolResult<ReorderResponse> {
    ctx.database.with_transaction(|tx| {
        ctx.scope.item_parent(tx, parent)?;
        let siblings = parent.siblings();
        validate_reorder(&siblings.ids(tx)?, &ordered_ids)?;
        siblings.write_positions(tx, &ordered_ids)?;
        Ok::<_, ToolError>(())
    })?;

    tracing::info!(parent = ?parent, count = ordered_ids.len(), "reordered items");
    Ok(ReorderResponse {
        success: true,
        parent_id: parent.id(),
        order: ordered_ids,
    })
}
