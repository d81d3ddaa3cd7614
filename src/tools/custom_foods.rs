//! Custom Food Tools
//!
//! Create, read, update and delete coach custom foods.

use serde::Serialize;

use crate::error::{ToolError, ToolResult};
use crate::models::{CustomFood, CustomFoodInput, Per100g};
use super::{require_name, CoachContext};

/// A stored micronutrient value
#[derive(Debug, Serialize)]
pub struct MicroValue {
    pub const_code: i64,
    pub value_100g: f64,
}

/// Full custom food detail
#[derive(Debug, Serialize)]
pub struct CustomFoodDetail {
    pub id: i64,
    pub name: String,
    pub per_100g: Per100g,
    pub micros: Vec<MicroValue>,
    pub usage_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Response for list_custom_foods
#[derive(Debug, Serialize)]
pub struct ListCustomFoodsResponse {
    pub items: Vec<CustomFood>,
    pub total: usize,
}

/// Response for delete_custom_food
#[derive(Debug, Serialize)]
pub struct DeleteCustomFoodResponse {
    pub success: bool,
    pub deleted_id: i64,
    /// Meal and slot items removed along with the food
    pub items_removed: i64,
}

fn validate(data: &CustomFoodInput) -> ToolResult<()> {
    require_name("Custom food name", &data.name)?;

    let macros = [
        ("kcal_100g", data.kcal_100g),
        ("protein_100g", data.protein_100g),
        ("carbs_100g", data.carbs_100g),
        ("fat_100g", data.fat_100g),
    ];
    for (field, value) in macros {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(ToolError::validation(format!("{} cannot be negative", field)));
            }
        }
    }

    for (code, value) in &data.micros {
        if let Some(v) = value {
            if !v.is_finite() || *v < 0.0 {
                return Err(ToolError::validation(format!(
                    "micronutrient {} cannot be negative",
                    code
                )));
            }
        }
    }
    Ok(())
}

fn detail(conn: &rusqlite::Connection, food: CustomFood) -> ToolResult<CustomFoodDetail> {
    let micros = CustomFood::micros(conn, food.id)?
        .into_iter()
        .map(|(const_code, value_100g)| MicroValue { const_code, value_100g })
        .collect();
    let usage_count = CustomFood::usage_count(conn, food.id)?;

    Ok(CustomFoodDetail {
        id: food.id,
        name: food.name,
        per_100g: food.per_100g,
        micros,
        usage_count,
        created_at: food.created_at,
        updated_at: food.updated_at,
    })
}

/// Create a custom food. A blank kcal is derived from the macros.
pub fn create_custom_food(ctx: &CoachContext, data: CustomFoodInput) -> ToolResult<CustomFoodDetail> {
    validate(&data)?;

    let coach_id = ctx.scope.coach_id();
    let result = ctx.database.with_transaction(|tx| {
        let food = CustomFood::create(tx, coach_id, &data, &ctx.codes)?;
        detail(tx, food)
    })?;

    tracing::info!(coach_id, custom_food_id = result.id, "created custom food");
    Ok(result)
}

pub fn get_custom_food(ctx: &CoachContext, id: i64) -> ToolResult<CustomFoodDetail> {
    let conn = ctx.database.get_conn()?;
    let food = ctx.scope.custom_food(&conn, id)?;
    detail(&conn, food)
}

pub fn list_custom_foods(ctx: &CoachContext) -> ToolResult<ListCustomFoodsResponse> {
    let conn = ctx.database.get_conn()?;
    let items = CustomFood::list_owned(&conn, ctx.scope.coach_id())?;
    let total = items.len();
    Ok(ListCustomFoodsResponse { items, total })
}

/// Replace a custom food's fields and micros
pub fn update_custom_food(
    ctx: &CoachContext,
    id: i64,
    data: CustomFoodInput,
) -> ToolResult<CustomFoodDetail> {
    validate(&data)?;

    let coach_id = ctx.scope.coach_id();
    ctx.database.with_transaction(|tx| {
        let food = CustomFood::update_owned(tx, coach_id, id, &data, &ctx.codes)?
            .ok_or_else(|| ToolError::not_found("Custom food", id))?;
        tracing::debug!(coach_id, custom_food_id = id, "updated custom food");
        detail(tx, food)
    })
}

/// Delete a custom food together with the items that use it
pub fn delete_custom_food(ctx: &CoachContext, id: i64) -> ToolResult<DeleteCustomFoodResponse> {
    let coach_id = ctx.scope.coach_id();
    let items_removed = ctx.database.with_transaction(|tx| {
        ctx.scope.custom_food(tx, id)?;
        let usage = CustomFood::usage_count(tx, id)?;
        CustomFood::delete_owned(tx, coach_id, id)?;
        Ok::<_, ToolError>(usage)
    })?;

    tracing::info!(coach_id, custom_food_id = id, items_removed, "deleted custom food");
    Ok(DeleteCustomFoodResponse {
        success: true,
        deleted_id: id,
        items_removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{context, other_coach};

    fn input(name: &str) -> CustomFoodInput {
        CustomFoodInput {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_derives_blank_kcal() {
        let ctx = context();
        let food = create_custom_food(
            &ctx,
            CustomFoodInput {
                protein_100g: Some(25.0),
                carbs_100g: Some(50.0),
                fat_100g: Some(10.0),
                ..input("Protein bar")
            },
        )
        .unwrap();
        assert_eq!(food.per_100g.kcal, Some(390.0));
    }

    #[test]
    fn test_validation_rejects_blank_name_and_negative_macros() {
        let ctx = context();
        assert!(matches!(create_custom_food(&ctx, input("  ")), Err(ToolError::Validation(_))));

        let negative = CustomFoodInput { fat_100g: Some(-1.0), ..input("Oil") };
        assert!(matches!(create_custom_food(&ctx, negative), Err(ToolError::Validation(_))));
        assert_eq!(list_custom_foods(&ctx).unwrap().total, 0);
    }

    #[test]
    fn test_other_coach_gets_not_found() {
        let ctx = context();
        let food = create_custom_food(&ctx, input("Secret sauce")).unwrap();
        let other = other_coach(&ctx);

        assert!(matches!(get_custom_food(&other, food.id), Err(ToolError::NotFound { .. })));
        assert!(matches!(
            update_custom_food(&other, food.id, input("Mine now")),
            Err(ToolError::NotFound { .. })
        ));
        assert!(matches!(delete_custom_food(&other, food.id), Err(ToolError::NotFound { .. })));
        assert_eq!(get_custom_food(&ctx, food.id).unwrap().name, "Secret sauce");
    }

    #[test]
    fn test_update_replaces_fields() {
        let ctx = context();
        let food = create_custom_food(&ctx, CustomFoodInput { kcal_100g: Some(100.0), ..input("Yogurt") })
            .unwrap();

        let updated = update_custom_food(
            &ctx,
            food.id,
            CustomFoodInput { protein_100g: Some(10.0), ..input("Greek yogurt") },
        )
        .unwrap();
        assert_eq!(updated.name, "Greek yogurt");
        assert_eq!(updated.per_100g.kcal, Some(40.0));
    }

    #[test]
    fn test_delete_removes_items_using_the_food() {
        use crate::models::{
            DietSlotInput, DietTemplateCreate, FoodRef, ItemParent, MealTemplateCreate, TemplateItem,
        };
        use crate::tools::diets::{add_diet_slot, add_slot_item, create_diet_template};
        use crate::tools::meals::{add_meal_item, create_meal_template};
        use crate::tools::testing::APPLE;

        let ctx = context();
        let food = create_custom_food(&ctx, CustomFoodInput { kcal_100g: Some(120.0), ..input("Granola") })
            .unwrap();

        let meal = create_meal_template(
            &ctx,
            MealTemplateCreate { name: "Breakfast".into(), notes: None, parent_meal_id: None },
        )
        .unwrap();
        add_meal_item(&ctx, meal.id, FoodRef::Custom(food.id), 60.0).unwrap();
        add_meal_item(&ctx, meal.id, FoodRef::Catalog(APPLE), 100.0).unwrap();

        let diet = create_diet_template(&ctx, DietTemplateCreate { name: "Cut".into(), notes: None }).unwrap();
        let slot = add_diet_slot(
            &ctx,
            diet.id,
            DietSlotInput { label: "Snack".into(), meal_template_id: None, multiplier: 1.0 },
        )
        .unwrap();
        add_slot_item(&ctx, slot.id, FoodRef::Custom(food.id), 40.0).unwrap();

        let deleted = delete_custom_food(&ctx, food.id).unwrap();
        assert_eq!(deleted.items_removed, 2);

        let conn = ctx.database.get_conn().unwrap();
        let meal_foods: Vec<FoodRef> = TemplateItem::list(&conn, ItemParent::Meal(meal.id))
            .unwrap()
            .into_iter()
            .map(|i| i.food)
            .collect();
        assert_eq!(meal_foods, vec![FoodRef::Catalog(APPLE)]);
        assert!(TemplateItem::list(&conn, ItemParent::Slot(slot.id)).unwrap().is_empty());
        drop(conn);

        assert!(matches!(get_custom_food(&ctx, food.id), Err(ToolError::NotFound { .. })));
    }
}
