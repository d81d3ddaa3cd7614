//! Diet Template Tools
//!
//! Diet templates, their slots and slot items, importing a meal template
//! into a slot, and the day-level edit view.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{ToolError, ToolResult};
use crate::models::{
    validate_reorder, DietSlot, DietSlotInput, DietTemplate, DietTemplateCreate,
    DietTemplateUpdate, FoodRef, ItemKind, ItemParent, Macros, MealTemplate, MicroTotals,
    TemplateItem,
};
use crate::nutrition::sum_aggregates;
use super::items::{self, DeleteItemResponse, ItemLine, MicroMeta, ReorderResponse};
use super::{require_name, require_positive, CoachContext};

/// Response for list_diet_templates
#[derive(Debug, Serialize)]
pub struct ListDietTemplatesResponse {
    pub diets: Vec<DietTemplate>,
    pub total: usize,
}

/// Response for delete operations on diets and slots
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Response for import_meal_into_slot
#[derive(Debug, Serialize)]
pub struct SlotImportResponse {
    pub slot_id: i64,
    pub meal_template_id: i64,
    pub multiplier: f64,
    pub items: Vec<TemplateItem>,
}

/// One slot of the diet edit view
#[derive(Debug, Serialize)]
pub struct SlotView {
    #[serde(flatten)]
    pub slot: DietSlot,
    pub items: Vec<ItemLine>,
    pub totals: Macros,
    pub micros: MicroTotals,
}

/// A meal template the coach can link or import into a slot
#[derive(Debug, Clone, Serialize)]
pub struct MealOption {
    pub id: i64,
    pub parent_meal_id: Option<i64>,
    pub label: String,
}

/// Response for get_diet_edit_view
#[derive(Debug, Serialize)]
pub struct DietEditView {
    pub diet: DietTemplate,
    pub slots: Vec<SlotView>,
    pub day_totals: Macros,
    pub day_micros: MicroTotals,
    pub micro_meta: Vec<MicroMeta>,
    pub meal_options: Vec<MealOption>,
}

// ============================================================================
// Diet templates
// ============================================================================

pub fn create_diet_template(ctx: &CoachContext, data: DietTemplateCreate) -> ToolResult<DietTemplate> {
    require_name("Diet template name", &data.name)?;

    let conn = ctx.database.get_conn()?;
    let diet = DietTemplate::create(&conn, ctx.scope.coach_id(), &data)?;

    tracing::info!(coach_id = ctx.scope.coach_id(), diet_template_id = diet.id, "created diet template");
    Ok(diet)
}

pub fn get_diet_template(ctx: &CoachContext, id: i64) -> ToolResult<DietTemplate> {
    let conn = ctx.database.get_conn()?;
    ctx.scope.diet_template(&conn, id)
}

pub fn list_diet_templates(ctx: &CoachContext) -> ToolResult<ListDietTemplatesResponse> {
    let conn = ctx.database.get_conn()?;
    let diets = DietTemplate::list_owned(&conn, ctx.scope.coach_id())?;
    let total = diets.len();
    Ok(ListDietTemplatesResponse { diets, total })
}

pub fn update_diet_template(
    ctx: &CoachContext,
    id: i64,
    data: DietTemplateUpdate,
) -> ToolResult<DietTemplate> {
    if let Some(ref name) = data.name {
        require_name("Diet template name", name)?;
    }

    let conn = ctx.database.get_conn()?;
    DietTemplate::update_owned(&conn, ctx.scope.coach_id(), id, &data)?
        .ok_or_else(|| ToolError::not_found("Diet template", id))
}

/// Delete a diet template with its slots and slot items
pub fn delete_diet_template(ctx: &CoachContext, id: i64) -> ToolResult<DeleteResponse> {
    let conn = ctx.database.get_conn()?;
    if !DietTemplate::delete_owned(&conn, ctx.scope.coach_id(), id)? {
        return Err(ToolError::not_found("Diet template", id));
    }

    tracing::info!(coach_id = ctx.scope.coach_id(), diet_template_id = id, "deleted diet template");
    Ok(DeleteResponse {
        success: true,
        deleted_id: id,
    })
}

// ============================================================================
// Slots
// ============================================================================

fn validate_slot_input(ctx: &CoachContext, conn: &rusqlite::Connection, data: &DietSlotInput) -> ToolResult<()> {
    require_name("Slot label", &data.label)?;
    require_positive("multiplier", data.multiplier)?;
    if let Some(meal_id) = data.meal_template_id {
        ctx.scope.meal_template(conn, meal_id)?;
    }
    Ok(())
}

/// Append a slot at the end of an owned diet
pub fn add_diet_slot(ctx: &CoachContext, diet_id: i64, data: DietSlotInput) -> ToolResult<DietSlot> {
    let slot = ctx.database.with_transaction(|tx| {
        ctx.scope.diet_template(tx, diet_id)?;
        validate_slot_input(ctx, tx, &data)?;
        Ok::<_, ToolError>(DietSlot::create(tx, diet_id, &data)?)
    })?;

    tracing::info!(diet_template_id = diet_id, slot_id = slot.id, position = slot.position, "added diet slot");
    Ok(slot)
}

/// Replace a slot's label, linked meal and multiplier. Items are untouched.
pub fn update_diet_slot(ctx: &CoachContext, slot_id: i64, data: DietSlotInput) -> ToolResult<DietSlot> {
    let conn = ctx.database.get_conn()?;
    ctx.scope.diet_slot(&conn, slot_id)?;
    validate_slot_input(ctx, &conn, &data)?;

    DietSlot::update(&conn, slot_id, &data)?.ok_or_else(|| ToolError::not_found("Diet slot", slot_id))
}

pub fn delete_diet_slot(ctx: &CoachContext, slot_id: i64) -> ToolResult<DeleteResponse> {
    let conn = ctx.database.get_conn()?;
    ctx.scope.diet_slot(&conn, slot_id)?;
    DietSlot::delete(&conn, slot_id)?;

    tracing::info!(slot_id, "deleted diet slot");
    Ok(DeleteResponse {
        success: true,
        deleted_id: slot_id,
    })
}

/// Rewrite slot positions to follow `ordered_ids` exactly
pub fn reorder_diet_slots(
    ctx: &CoachContext,
    diet_id: i64,
    ordered_ids: Vec<i64>,
) -> ToolResult<ReorderResponse> {
    ctx.database.with_transaction(|tx| {
        ctx.scope.diet_template(tx, diet_id)?;
        let siblings = DietSlot::siblings(diet_id);
        validate_reorder(&siblings.ids(tx)?, &ordered_ids)?;
        siblings.write_positions(tx, &ordered_ids)?;
        Ok::<_, ToolError>(())
    })?;

    tracing::info!(diet_template_id = diet_id, count = ordered_ids.len(), "reordered diet slots");
    Ok(ReorderResponse {
        success: true,
        parent_id: diet_id,
        order: ordered_ids,
    })
}

// ============================================================================
// Slot items
// ============================================================================

pub fn add_slot_item(
    ctx: &CoachContext,
    slot_id: i64,
    food: FoodRef,
    quantity_g: f64,
) -> ToolResult<TemplateItem> {
    items::add_item(ctx, ItemParent::Slot(slot_id), food, quantity_g)
}

pub fn update_slot_item(ctx: &CoachContext, item_id: i64, quantity_g: f64) -> ToolResult<TemplateItem> {
    items::update_item(ctx, ItemKind::Slot, item_id, quantity_g)
}

pub fn delete_slot_item(ctx: &CoachContext, item_id: i64) -> ToolResult<DeleteItemResponse> {
    items::delete_item(ctx, ItemKind::Slot, item_id)
}

pub fn reorder_slot_items(
    ctx: &CoachContext,
    slot_id: i64,
    ordered_ids: Vec<i64>,
) -> ToolResult<ReorderResponse> {
    items::reorder_items(ctx, ItemParent::Slot(slot_id), ordered_ids)
}

/// Replace a slot's items with a copy of a meal template's items.
///
/// Uses `meal_template_id` when given, otherwise the meal linked to the
/// slot. Food references and quantities are copied unchanged; the slot
/// multiplier is not applied. Either every item is replaced or the slot is
/// left as it was.
pub fn import_meal_into_slot(
    ctx: &CoachContext,
    slot_id: i64,
    meal_template_id: Option<i64>,
) -> ToolResult<SlotImportResponse> {
    let response = ctx.database.with_transaction(|tx| {
        let slot = ctx.scope.diet_slot(tx, slot_id)?;
        let meal_id = meal_template_id.or(slot.meal_template_id).ok_or_else(|| {
            ToolError::validation(format!(
                "Diet slot {} has no linked meal template; pass meal_template_id",
                slot_id
            ))
        })?;
        let meal = ctx.scope.meal_template(tx, meal_id)?;

        let lines: Vec<(FoodRef, f64)> = TemplateItem::list(tx, ItemParent::Meal(meal.id))?
            .into_iter()
            .map(|item| (item.food, item.quantity_g))
            .collect();
        let items = TemplateItem::replace_all(tx, ItemParent::Slot(slot.id), &lines)?;

        Ok::<_, ToolError>(SlotImportResponse {
            slot_id: slot.id,
            meal_template_id: meal.id,
            multiplier: slot.multiplier,
            items,
        })
    })?;

    tracing::info!(
        slot_id,
        meal_template_id = response.meal_template_id,
        items = response.items.len(),
        "imported meal into slot"
    );
    Ok(response)
}

// ============================================================================
// Edit view
// ============================================================================

/// Meal templates ordered roots first, then by parent, then by name.
/// Substitutes are labelled `Parent / Child`.
fn meal_options(meals: &[MealTemplate]) -> Vec<MealOption> {
    let names: HashMap<i64, &str> = meals.iter().map(|m| (m.id, m.name.as_str())).collect();

    let mut sorted: Vec<&MealTemplate> = meals.iter().collect();
    sorted.sort_by(|a, b| {
        (a.parent_meal_id.is_some(), a.parent_meal_id, &a.name, a.id)
            .cmp(&(b.parent_meal_id.is_some(), b.parent_meal_id, &b.name, b.id))
    });

    sorted
        .into_iter()
        .map(|meal| {
            let label = match meal.parent_meal_id.and_then(|p| names.get(&p)) {
                Some(parent_name) => format!("{} / {}", parent_name, meal.name),
                None => meal.name.clone(),
            };
            MealOption {
                id: meal.id,
                parent_meal_id: meal.parent_meal_id,
                label,
            }
        })
        .collect()
}

/// Diet with every slot's items and totals, day totals and meal options
pub fn get_diet_edit_view(ctx: &CoachContext, diet_id: i64) -> ToolResult<DietEditView> {
    let conn = ctx.database.get_conn()?;
    let diet = ctx.scope.diet_template(&conn, diet_id)?;

    let mut slots = Vec::new();
    let mut slot_totals = Vec::new();
    for slot in DietSlot::list_for_diet(&conn, diet.id)? {
        let (lines, totals) = items::load_lines(&conn, ItemParent::Slot(slot.id), &ctx.codes)?;
        slot_totals.push(totals.clone());
        slots.push(SlotView {
            slot,
            items: lines,
            totals: totals.totals,
            micros: totals.micros,
        });
    }

    let day = sum_aggregates(&slot_totals, &ctx.codes.micros);
    let micro_meta = items::micro_meta(&conn, &ctx.codes)?;
    let meals = MealTemplate::list_owned(&conn, ctx.scope.coach_id())?;

    Ok(DietEditView {
        diet,
        slots,
        day_totals: day.totals,
        day_micros: day.micros,
        micro_meta,
        meal_options: meal_options(&meals),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{default_multiplier, MealTemplateCreate};
    use crate::tools::meals::{add_meal_item, create_meal_template};
    use crate::tools::testing::{context, other_coach, APPLE, SPINACH};

    fn new_diet(ctx: &CoachContext, name: &str) -> DietTemplate {
        create_diet_template(ctx, DietTemplateCreate { name: name.into(), notes: None }).unwrap()
    }

    fn new_slot(ctx: &CoachContext, diet_id: i64, label: &str, meal: Option<i64>, multiplier: f64) -> DietSlot {
        add_diet_slot(
            ctx,
            diet_id,
            DietSlotInput {
                label: label.into(),
                meal_template_id: meal,
                multiplier,
            },
        )
        .unwrap()
    }

    fn new_meal(ctx: &CoachContext, name: &str, parent: Option<i64>) -> MealTemplate {
        create_meal_template(
            ctx,
            MealTemplateCreate {
                name: name.into(),
                notes: None,
                parent_meal_id: parent,
            },
        )
        .unwrap()
    }

    fn slot_lines(ctx: &CoachContext, slot_id: i64) -> Vec<(FoodRef, f64, i64)> {
        let conn = ctx.database.get_conn().unwrap();
        TemplateItem::list(&conn, ItemParent::Slot(slot_id))
            .unwrap()
            .into_iter()
            .map(|i| (i.food, i.quantity_g, i.position))
            .collect()
    }

    #[test]
    fn test_slot_validation() {
        let ctx = context();
        let diet = new_diet(&ctx, "Cut");

        let blank = add_diet_slot(
            &ctx,
            diet.id,
            DietSlotInput { label: "  ".into(), meal_template_id: None, multiplier: 1.0 },
        );
        assert!(matches!(blank, Err(ToolError::Validation(_))));

        let zero = add_diet_slot(
            &ctx,
            diet.id,
            DietSlotInput { label: "Lunch".into(), meal_template_id: None, multiplier: 0.0 },
        );
        assert!(matches!(zero, Err(ToolError::Validation(_))));

        let foreign_meal = new_meal(&other_coach(&ctx), "Theirs", None);
        let linked = add_diet_slot(
            &ctx,
            diet.id,
            DietSlotInput {
                label: "Lunch".into(),
                meal_template_id: Some(foreign_meal.id),
                multiplier: 1.0,
            },
        );
        assert!(matches!(linked, Err(ToolError::NotFound { .. })));

        let foreign_diet = add_diet_slot(
            &other_coach(&ctx),
            diet.id,
            DietSlotInput { label: "Lunch".into(), meal_template_id: None, multiplier: 1.0 },
        );
        assert!(matches!(foreign_diet, Err(ToolError::NotFound { .. })));
    }

    #[test]
    fn test_import_copies_quantities_unscaled() {
        let ctx = context();
        let meal = new_meal(&ctx, "Breakfast", None);
        add_meal_item(&ctx, meal.id, FoodRef::Catalog(APPLE), 150.0).unwrap();
        add_meal_item(&ctx, meal.id, FoodRef::Catalog(SPINACH), 40.0).unwrap();

        let diet = new_diet(&ctx, "Bulk");
        let slot = new_slot(&ctx, diet.id, "Breakfast", Some(meal.id), 1.5);
        add_slot_item(&ctx, slot.id, FoodRef::Catalog(APPLE), 999.0).unwrap();

        let imported = import_meal_into_slot(&ctx, slot.id, None).unwrap();
        assert_eq!(imported.meal_template_id, meal.id);
        assert_eq!(imported.multiplier, 1.5);
        assert_eq!(
            slot_lines(&ctx, slot.id),
            vec![(FoodRef::Catalog(APPLE), 150.0, 1), (FoodRef::Catalog(SPINACH), 40.0, 2)]
        );
    }

    #[test]
    fn test_import_with_default_multiplier_is_exact_copy() {
        let ctx = context();
        let meal = new_meal(&ctx, "Lunch", None);
        add_meal_item(&ctx, meal.id, FoodRef::Catalog(SPINACH), 80.0).unwrap();

        let diet = new_diet(&ctx, "Maintenance");
        let slot = new_slot(&ctx, diet.id, "Lunch", None, default_multiplier());

        import_meal_into_slot(&ctx, slot.id, Some(meal.id)).unwrap();
        assert_eq!(slot_lines(&ctx, slot.id), vec![(FoodRef::Catalog(SPINACH), 80.0, 1)]);
    }

    #[test]
    fn test_failed_import_leaves_slot_intact() {
        let ctx = context();
        let diet = new_diet(&ctx, "Cut");
        let slot = new_slot(&ctx, diet.id, "Dinner", None, 1.0);
        add_slot_item(&ctx, slot.id, FoodRef::Catalog(APPLE), 100.0).unwrap();

        let no_meal = import_meal_into_slot(&ctx, slot.id, None);
        assert!(matches!(no_meal, Err(ToolError::Validation(_))));

        let foreign = new_meal(&other_coach(&ctx), "Theirs", None);
        let stolen = import_meal_into_slot(&ctx, slot.id, Some(foreign.id));
        assert!(matches!(stolen, Err(ToolError::NotFound { .. })));

        assert_eq!(slot_lines(&ctx, slot.id), vec![(FoodRef::Catalog(APPLE), 100.0, 1)]);
    }

    #[test]
    fn test_reorder_slots() {
        let ctx = context();
        let diet = new_diet(&ctx, "Cut");
        let a = new_slot(&ctx, diet.id, "Breakfast", None, 1.0);
        let b = new_slot(&ctx, diet.id, "Lunch", None, 1.0);
        let c = new_slot(&ctx, diet.id, "Dinner", None, 1.0);

        assert!(matches!(
            reorder_diet_slots(&ctx, diet.id, vec![a.id, a.id, b.id]),
            Err(ToolError::Validation(_))
        ));

        reorder_diet_slots(&ctx, diet.id, vec![c.id, a.id, b.id]).unwrap();
        let view = get_diet_edit_view(&ctx, diet.id).unwrap();
        let order: Vec<(i64, i64)> = view.slots.iter().map(|s| (s.slot.id, s.slot.position)).collect();
        assert_eq!(order, vec![(c.id, 1), (a.id, 2), (b.id, 3)]);
    }

    #[test]
    fn test_edit_view_day_totals() {
        let ctx = context();
        let diet = new_diet(&ctx, "Cut");
        let breakfast = new_slot(&ctx, diet.id, "Breakfast", None, 1.0);
        let dinner = new_slot(&ctx, diet.id, "Dinner", None, 1.0);
        new_slot(&ctx, diet.id, "Snack", None, 1.0);
        add_slot_item(&ctx, breakfast.id, FoodRef::Catalog(APPLE), 200.0).unwrap();
        add_slot_item(&ctx, dinner.id, FoodRef::Catalog(SPINACH), 200.0).unwrap();

        let view = get_diet_edit_view(&ctx, diet.id).unwrap();
        assert_eq!(view.slots.len(), 3);
        assert!((view.slots[0].totals.kcal - 104.0).abs() < 1e-9);
        assert_eq!(view.slots[2].totals, Macros::zero());
        assert!((view.day_totals.kcal - 150.0).abs() < 1e-9);
        assert!((view.day_micros.get(10260) - 5.4).abs() < 1e-9);
        assert_eq!(view.day_micros.len(), ctx.codes.micros.len());
    }

    #[test]
    fn test_meal_options_order_and_labels() {
        let ctx = context();
        let lunch = new_meal(&ctx, "Lunch", None);
        let breakfast = new_meal(&ctx, "Breakfast", None);
        new_meal(&ctx, "Oats", Some(breakfast.id));
        new_meal(&ctx, "Rice bowl", Some(lunch.id));
        new_meal(&ctx, "Eggs", Some(breakfast.id));

        let diet = new_diet(&ctx, "Cut");
        let labels: Vec<String> = get_diet_edit_view(&ctx, diet.id)
            .unwrap()
            .meal_options
            .into_iter()
            .map(|o| o.label)
            .collect();
        assert_eq!(
            labels,
            vec![
                "Breakfast",
                "Lunch",
                "Lunch / Rice bowl",
                "Breakfast / Eggs",
                "Breakfast / Oats",
            ]
        );
    }

    #[test]
    fn test_slot_update_and_delete() {
        let ctx = context();
        let diet = new_diet(&ctx, "Cut");
        let slot = new_slot(&ctx, diet.id, "Lunch", None, 1.0);
        add_slot_item(&ctx, slot.id, FoodRef::Catalog(APPLE), 100.0).unwrap();

        let updated = update_diet_slot(
            &ctx,
            slot.id,
            DietSlotInput { label: "Late lunch".into(), meal_template_id: None, multiplier: 2.0 },
        )
        .unwrap();
        assert_eq!(updated.label, "Late lunch");
        assert_eq!(updated.multiplier, 2.0);
        assert_eq!(slot_lines(&ctx, slot.id).len(), 1);

        assert!(matches!(delete_diet_slot(&other_coach(&ctx), slot.id), Err(ToolError::NotFound { .. })));
        delete_diet_slot(&ctx, slot.id).unwrap();
        assert!(get_diet_edit_view(&ctx, diet.id).unwrap().slots.is_empty());
    }
}
