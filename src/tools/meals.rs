//! Meal Template Tools
//!
//! Meal templates, their substitutes and item lists, and the aggregated
//! meal edit view.

use serde::Serialize;

use crate::error::{ToolError, ToolResult};
use crate::models::{
    FoodRef, ItemKind, ItemParent, Macros, MealTemplate, MealTemplateCreate, MealTemplateUpdate,
    MicroTotals, TemplateItem,
};
use crate::nutrition::{aggregate, load_resolved_items};
use super::items::{self, DeleteItemResponse, ItemLine, MicroMeta, ReorderResponse};
use super::{require_name, CoachContext};

/// Suffix given to a duplicated substitute
pub const SUBSTITUTE_SUFFIX: &str = " (substitut)";

/// Meal template with its own totals
#[derive(Debug, Serialize)]
pub struct MealSummary {
    pub id: i64,
    pub name: String,
    pub notes: Option<String>,
    pub item_count: usize,
    pub totals: Macros,
}

/// A root meal and its substitutes
#[derive(Debug, Serialize)]
pub struct MealGroup {
    #[serde(flatten)]
    pub meal: MealSummary,
    pub substitutes: Vec<MealSummary>,
}

/// Response for list_meal_templates
#[derive(Debug, Serialize)]
pub struct ListMealTemplatesResponse {
    pub meals: Vec<MealGroup>,
    pub total: usize,
}

/// Lightweight meal reference for edit views
#[derive(Debug, Serialize)]
pub struct MealRef {
    pub id: i64,
    pub name: String,
}

impl From<&MealTemplate> for MealRef {
    fn from(meal: &MealTemplate) -> Self {
        Self {
            id: meal.id,
            name: meal.name.clone(),
        }
    }
}

/// Response for get_meal_edit_view
#[derive(Debug, Serialize)]
pub struct MealEditView {
    pub meal: MealTemplate,
    pub parent: Option<MealRef>,
    pub substitutes: Vec<MealRef>,
    pub items: Vec<ItemLine>,
    pub totals: Macros,
    pub micros: MicroTotals,
    pub micro_meta: Vec<MicroMeta>,
}

/// Response for delete_meal_template
#[derive(Debug, Serialize)]
pub struct DeleteMealTemplateResponse {
    pub success: bool,
    pub deleted_id: i64,
    pub substitutes_deleted: usize,
}

/// Create a meal template, optionally as a substitute of a root template
pub fn create_meal_template(ctx: &CoachContext, data: MealTemplateCreate) -> ToolResult<MealTemplate> {
    require_name("Meal template name", &data.name)?;

    let coach_id = ctx.scope.coach_id();
    let meal = ctx.database.with_transaction(|tx| {
        if let Some(parent_id) = data.parent_meal_id {
            let parent = ctx.scope.meal_template(tx, parent_id)?;
            if !parent.is_root() {
                return Err(ToolError::validation(format!(
                    "Meal template {} is itself a substitute and cannot have substitutes",
                    parent_id
                )));
            }
        }
        Ok(MealTemplate::create(tx, coach_id, &data)?)
    })?;

    tracing::info!(coach_id, meal_template_id = meal.id, parent = ?meal.parent_meal_id, "created meal template");
    Ok(meal)
}

pub fn update_meal_template(
    ctx: &CoachContext,
    id: i64,
    data: MealTemplateUpdate,
) -> ToolResult<MealTemplate> {
    if let Some(ref name) = data.name {
        require_name("Meal template name", name)?;
    }

    let conn = ctx.database.get_conn()?;
    MealTemplate::update_owned(&conn, ctx.scope.coach_id(), id, &data)?
        .ok_or_else(|| ToolError::not_found("Meal template", id))
}

/// Delete a meal template with its items and substitutes
pub fn delete_meal_template(ctx: &CoachContext, id: i64) -> ToolResult<DeleteMealTemplateResponse> {
    let coach_id = ctx.scope.coach_id();
    let substitutes_deleted = ctx.database.with_transaction(|tx| {
        ctx.scope.meal_template(tx, id)?;
        let substitutes = MealTemplate::substitutes(tx, id)?.len();
        MealTemplate::delete_owned(tx, coach_id, id)?;
        Ok::<_, ToolError>(substitutes)
    })?;

    tracing::info!(coach_id, meal_template_id = id, substitutes_deleted, "deleted meal template");
    Ok(DeleteMealTemplateResponse {
        success: true,
        deleted_id: id,
        substitutes_deleted,
    })
}

/// Every meal template grouped as roots with substitutes, each with its own totals
pub fn list_meal_templates(ctx: &CoachContext) -> ToolResult<ListMealTemplatesResponse> {
    let conn = ctx.database.get_conn()?;
    let meals = MealTemplate::list_owned(&conn, ctx.scope.coach_id())?;

    let summarize = |meal: MealTemplate| -> ToolResult<MealSummary> {
        let resolved = load_resolved_items(&conn, ItemParent::Meal(meal.id), &ctx.codes)?;
        let totals = aggregate(&resolved, &[]).totals;
        Ok(MealSummary {
            id: meal.id,
            name: meal.name,
            notes: meal.notes,
            item_count: resolved.len(),
            totals,
        })
    };

    let mut groups = Vec::new();
    for (root, subs) in MealTemplate::group_substitutes(meals) {
        groups.push(MealGroup {
            meal: summarize(root)?,
            substitutes: subs.into_iter().map(&summarize).collect::<ToolResult<Vec<_>>>()?,
        });
    }

    let total = groups.len();
    Ok(ListMealTemplatesResponse { meals: groups, total })
}

/// Copy a root meal and its items into a new substitute of that meal
pub fn duplicate_as_substitute(ctx: &CoachContext, id: i64) -> ToolResult<MealTemplate> {
    let coach_id = ctx.scope.coach_id();
    let copy = ctx.database.with_transaction(|tx| {
        let source = ctx.scope.meal_template(tx, id)?;
        if !source.is_root() {
            return Err(ToolError::validation(format!(
                "Meal template {} is a substitute; only root meals can be duplicated as substitutes",
                id
            )));
        }

        let copy = MealTemplate::create(
            tx,
            coach_id,
            &MealTemplateCreate {
                name: format!("{}{}", source.name, SUBSTITUTE_SUFFIX),
                notes: source.notes.clone(),
                parent_meal_id: Some(source.id),
            },
        )?;

        let lines: Vec<(FoodRef, f64)> = TemplateItem::list(tx, ItemParent::Meal(source.id))?
            .into_iter()
            .map(|item| (item.food, item.quantity_g))
            .collect();
        TemplateItem::replace_all(tx, ItemParent::Meal(copy.id), &lines)?;
        Ok(copy)
    })?;

    tracing::info!(coach_id, source_id = id, substitute_id = copy.id, "duplicated meal as substitute");
    Ok(copy)
}

pub fn add_meal_item(
    ctx: &CoachContext,
    meal_id: i64,
    food: FoodRef,
    quantity_g: f64,
) -> ToolResult<TemplateItem> {
    items::add_item(ctx, ItemParent::Meal(meal_id), food, quantity_g)
}

pub fn update_meal_item(ctx: &CoachContext, item_id: i64, quantity_g: f64) -> ToolResult<TemplateItem> {
    items::update_item(ctx, ItemKind::Meal, item_id, quantity_g)
}

pub fn delete_meal_item(ctx: &CoachContext, item_id: i64) -> ToolResult<DeleteItemResponse> {
    items::delete_item(ctx, ItemKind::Meal, item_id)
}

pub fn reorder_meal_items(
    ctx: &CoachContext,
    meal_id: i64,
    ordered_ids: Vec<i64>,
) -> ToolResult<ReorderResponse> {
    items::reorder_items(ctx, ItemParent::Meal(meal_id), ordered_ids)
}

/// Meal with items, totals, micro totals and the substitute family
pub fn get_meal_edit_view(ctx: &CoachContext, id: i64) -> ToolResult<MealEditView> {
    let conn = ctx.database.get_conn()?;
    let meal = ctx.scope.meal_template(&conn, id)?;

    let parent = match meal.parent_meal_id {
        Some(parent_id) => Some(MealRef::from(&ctx.scope.meal_template(&conn, parent_id)?)),
        None => None,
    };
    let substitutes = if meal.is_root() {
        MealTemplate::substitutes(&conn, meal.id)?.iter().map(MealRef::from).collect()
    } else {
        Vec::new()
    };

    let (items, totals) = items::load_lines(&conn, ItemParent::Meal(meal.id), &ctx.codes)?;
    let micro_meta = items::micro_meta(&conn, &ctx.codes)?;

    Ok(MealEditView {
        meal,
        parent,
        substitutes,
        items,
        totals: totals.totals,
        micros: totals.micros,
        micro_meta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CustomFoodInput;
    use crate::tools::custom_foods::create_custom_food;
    use crate::tools::testing::{context, other_coach, APPLE, SPINACH};

    fn new_meal(ctx: &CoachContext, name: &str, parent: Option<i64>) -> MealTemplate {
        create_meal_template(
            ctx,
            MealTemplateCreate {
                name: name.to_string(),
                notes: None,
                parent_meal_id: parent,
            },
        )
        .unwrap()
    }

    fn item_ids(ctx: &CoachContext, meal_id: i64) -> Vec<i64> {
        get_meal_edit_view(ctx, meal_id).unwrap().items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_substitutes_are_one_level_deep() {
        let ctx = context();
        let root = new_meal(&ctx, "Breakfast", None);
        let sub = new_meal(&ctx, "Breakfast B", Some(root.id));

        let nested = create_meal_template(
            &ctx,
            MealTemplateCreate {
                name: "Breakfast C".into(),
                notes: None,
                parent_meal_id: Some(sub.id),
            },
        );
        assert!(matches!(nested, Err(ToolError::Validation(_))));

        let foreign_parent = create_meal_template(
            &other_coach(&ctx),
            MealTemplateCreate {
                name: "Sneaky".into(),
                notes: None,
                parent_meal_id: Some(root.id),
            },
        );
        assert!(matches!(foreign_parent, Err(ToolError::NotFound { .. })));
    }

    #[test]
    fn test_meal_view_totals() {
        let ctx = context();
        let meal = new_meal(&ctx, "Lunch", None);
        let bar = create_custom_food(
            &ctx,
            CustomFoodInput {
                name: "Bar".into(),
                kcal_100g: Some(400.0),
                ..Default::default()
            },
        )
        .unwrap();

        add_meal_item(&ctx, meal.id, FoodRef::Catalog(APPLE), 200.0).unwrap();
        add_meal_item(&ctx, meal.id, FoodRef::Custom(bar.id), 50.0).unwrap();

        let view = get_meal_edit_view(&ctx, meal.id).unwrap();
        assert_eq!(view.items.len(), 2);
        assert!((view.totals.kcal - 304.0).abs() < 1e-9);
        assert_eq!(view.micros.len(), ctx.codes.micros.len());
        assert_eq!(view.micro_meta.len(), ctx.codes.micros.len());
    }

    #[test]
    fn test_add_item_validation() {
        let ctx = context();
        let meal = new_meal(&ctx, "Dinner", None);

        let zero = add_meal_item(&ctx, meal.id, FoodRef::Catalog(APPLE), 0.0);
        assert!(matches!(zero, Err(ToolError::Validation(_))));

        let unknown = add_meal_item(&ctx, meal.id, FoodRef::Catalog(1), 10.0);
        assert!(matches!(unknown, Err(ToolError::NotFound { .. })));

        let foreign_food = create_custom_food(
            &other_coach(&ctx),
            CustomFoodInput { name: "Theirs".into(), ..Default::default() },
        )
        .unwrap();
        let foreign = add_meal_item(&ctx, meal.id, FoodRef::Custom(foreign_food.id), 10.0);
        assert!(matches!(foreign, Err(ToolError::NotFound { .. })));

        assert!(item_ids(&ctx, meal.id).is_empty());
    }

    #[test]
    fn test_reorder_rejects_mismatched_sets_without_writing() {
        let ctx = context();
        let meal = new_meal(&ctx, "Snack", None);
        let a = add_meal_item(&ctx, meal.id, FoodRef::Catalog(APPLE), 100.0).unwrap();
        let b = add_meal_item(&ctx, meal.id, FoodRef::Catalog(SPINACH), 50.0).unwrap();
        let c = add_meal_item(&ctx, meal.id, FoodRef::Catalog(APPLE), 25.0).unwrap();

        let other_meal = new_meal(&ctx, "Other", None);
        let foreign = add_meal_item(&ctx, other_meal.id, FoodRef::Catalog(APPLE), 10.0).unwrap();

        let missing = reorder_meal_items(&ctx, meal.id, vec![c.id, a.id]);
        assert!(matches!(missing, Err(ToolError::Validation(_))));
        let extra = reorder_meal_items(&ctx, meal.id, vec![c.id, b.id, a.id, foreign.id]);
        assert!(matches!(extra, Err(ToolError::Validation(_))));
        assert_eq!(item_ids(&ctx, meal.id), vec![a.id, b.id, c.id]);

        reorder_meal_items(&ctx, meal.id, vec![c.id, a.id, b.id]).unwrap();
        let view = get_meal_edit_view(&ctx, meal.id).unwrap();
        let order: Vec<(i64, i64)> = view.items.iter().map(|i| (i.id, i.position)).collect();
        assert_eq!(order, vec![(c.id, 1), (a.id, 2), (b.id, 3)]);
    }

    #[test]
    fn test_duplicate_as_substitute_copies_items() {
        let ctx = context();
        let root = new_meal(&ctx, "Breakfast", None);
        add_meal_item(&ctx, root.id, FoodRef::Catalog(SPINACH), 80.0).unwrap();
        add_meal_item(&ctx, root.id, FoodRef::Catalog(APPLE), 150.0).unwrap();

        let copy = duplicate_as_substitute(&ctx, root.id).unwrap();
        assert_eq!(copy.name, "Breakfast (substitut)");
        assert_eq!(copy.parent_meal_id, Some(root.id));

        let source = get_meal_edit_view(&ctx, root.id).unwrap();
        let copied = get_meal_edit_view(&ctx, copy.id).unwrap();
        let triples = |v: &MealEditView| -> Vec<(FoodRef, f64, i64)> {
            v.items.iter().map(|i| (i.food, i.quantity_g, i.position)).collect()
        };
        assert_eq!(triples(&source), triples(&copied));
        assert_eq!(source.substitutes.len(), 1);

        assert!(matches!(duplicate_as_substitute(&ctx, copy.id), Err(ToolError::Validation(_))));
    }

    #[test]
    fn test_list_groups_roots_with_own_totals() {
        let ctx = context();
        let root = new_meal(&ctx, "Breakfast", None);
        add_meal_item(&ctx, root.id, FoodRef::Catalog(APPLE), 100.0).unwrap();
        let sub = new_meal(&ctx, "Breakfast B", Some(root.id));
        add_meal_item(&ctx, sub.id, FoodRef::Catalog(SPINACH), 100.0).unwrap();

        let list = list_meal_templates(&ctx).unwrap();
        assert_eq!(list.total, 1);
        let group = &list.meals[0];
        assert!((group.meal.totals.kcal - 52.0).abs() < 1e-9);
        assert_eq!(group.substitutes.len(), 1);
        assert!((group.substitutes[0].totals.kcal - 23.0).abs() < 1e-9);
    }

    #[test]
    fn test_delete_cascades() {
        let ctx = context();
        let root = new_meal(&ctx, "Lunch", None);
        new_meal(&ctx, "Lunch B", Some(root.id));

        let deleted = delete_meal_template(&ctx, root.id).unwrap();
        assert_eq!(deleted.substitutes_deleted, 1);
        assert_eq!(list_meal_templates(&ctx).unwrap().total, 0);
    }

    #[test]
    fn test_item_updates_are_owner_scoped() {
        let ctx = context();
        let meal = new_meal(&ctx, "Lunch", None);
        let item = add_meal_item(&ctx, meal.id, FoodRef::Catalog(APPLE), 100.0).unwrap();

        let other = other_coach(&ctx);
        assert!(matches!(update_meal_item(&other, item.id, 5.0), Err(ToolError::NotFound { .. })));
        assert!(matches!(delete_meal_item(&other, item.id), Err(ToolError::NotFound { .. })));

        let updated = update_meal_item(&ctx, item.id, 120.0).unwrap();
        assert_eq!(updated.quantity_g, 120.0);
        delete_meal_item(&ctx, item.id).unwrap();
        assert!(item_ids(&ctx, meal.id).is_empty());
    }
}
