//! Coach ownership guard
//!
//! Every coach-owned row is fetched through [`CoachScope`]. A row owned by
//! another coach is reported exactly like a missing row.

use rusqlite::Connection;

use crate::error::{ToolError, ToolResult};
use crate::models::{
    CatalogFood, CustomFood, DietSlot, DietTemplate, FoodRef, ItemKind, ItemParent, MealTemplate,
    TemplateItem,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoachScope {
    coach_id: i64,
}

impl CoachScope {
    pub fn new(coach_id: i64) -> Self {
        Self { coach_id }
    }

    pub fn coach_id(&self) -> i64 {
        self.coach_id
    }

    pub fn meal_template(&self, conn: &Connection, id: i64) -> ToolResult<MealTemplate> {
        MealTemplate::get_owned(conn, self.coach_id, id)?
            .ok_or_else(|| ToolError::not_found("Meal template", id))
    }

    pub fn diet_template(&self, conn: &Connection, id: i64) -> ToolResult<DietTemplate> {
        DietTemplate::get_owned(conn, self.coach_id, id)?
            .ok_or_else(|| ToolError::not_found("Diet template", id))
    }

    pub fn diet_slot(&self, conn: &Connection, id: i64) -> ToolResult<DietSlot> {
        DietSlot::get_owned(conn, self.coach_id, id)?
            .ok_or_else(|| ToolError::not_found("Diet slot", id))
    }

    pub fn custom_food(&self, conn: &Connection, id: i64) -> ToolResult<CustomFood> {
        CustomFood::get_owned(conn, self.coach_id, id)?
            .ok_or_else(|| ToolError::not_found("Custom food", id))
    }

    /// Check that the meal or slot holding an item list is owned
    pub fn item_parent(&self, conn: &Connection, parent: ItemParent) -> ToolResult<()> {
        match parent {
            ItemParent::Meal(id) => self.meal_template(conn, id).map(|_| ()),
            ItemParent::Slot(id) => self.diet_slot(conn, id).map(|_| ()),
        }
    }

    /// An item whose meal or slot is owned
    pub fn item(&self, conn: &Connection, kind: ItemKind, id: i64) -> ToolResult<TemplateItem> {
        let entity = match kind {
            ItemKind::Meal => "Meal item",
            ItemKind::Slot => "Diet slot item",
        };
        let item = TemplateItem::get_by_id(conn, kind, id)?
            .ok_or_else(|| ToolError::not_found(entity, id))?;

        match self.item_parent(conn, item.parent) {
            Ok(()) => Ok(item),
            Err(ToolError::NotFound { .. }) => Err(ToolError::not_found(entity, id)),
            Err(e) => Err(e),
        }
    }

    /// A food reference usable by this coach: the catalogue food exists, or
    /// the custom food exists and is owned
    pub fn resolve_food_ref(&self, conn: &Connection, food: FoodRef) -> ToolResult<FoodRef> {
        match food {
            FoodRef::Catalog(code) => {
                if !CatalogFood::exists(conn, code)? {
                    return Err(ToolError::not_found("Catalog food", code));
                }
            }
            FoodRef::Custom(id) => {
                self.custom_food(conn, id)?;
            }
        }
        Ok(food)
    }
}
