//! CoachPlan MCP Server Implementation
//!
//! Implements the MCP server with all CoachPlan tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{ToolError, ToolResult};
use crate::models::{
    default_multiplier, CustomFoodInput, DietSlotInput, DietTemplateCreate, DietTemplateUpdate,
    FoodRef, MealTemplateCreate, MealTemplateUpdate,
};
use crate::tools::catalog::{self, CatalogBatch};
use crate::tools::custom_foods;
use crate::tools::diets;
use crate::tools::journal::{self, JournalChange, JournalDomain};
use crate::tools::meals;
use crate::tools::status::StatusTracker;
use crate::tools::CoachContext;

/// CoachPlan MCP Service
#[derive(Clone)]
pub struct CoachPlanService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    context: CoachContext,
    tool_router: ToolRouter<CoachPlanService>,
}

impl CoachPlanService {
    pub fn new(database_path: PathBuf, schema_version: i32, context: CoachContext) -> Self {
        let tracker = StatusTracker::new(database_path, schema_version, context.scope.coach_id());
        Self {
            status_tracker: Arc::new(Mutex::new(tracker)),
            context,
            tool_router: Self::tool_router(),
        }
    }
}

/// Map a tool failure onto the MCP error it is reported as
fn mcp_error(error: ToolError) -> McpError {
    match error {
        ToolError::NotFound { .. } | ToolError::RecordNotFound { .. } => {
            McpError::resource_not_found(error.to_string(), None)
        }
        ToolError::Validation(message) => McpError::invalid_params(message, None),
        ToolError::Database(e) => {
            tracing::error!(error = %e, "database failure");
            McpError::internal_error(e.to_string(), None)
        }
    }
}

/// Pretty JSON of a tool result
fn respond<T: Serialize>(result: ToolResult<T>) -> Result<CallToolResult, McpError> {
    let value = result.map_err(mcp_error)?;
    let json = serde_json::to_string_pretty(&value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Shared Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReorderParams {
    /// Meal, slot or diet whose children are reordered
    pub parent_id: i64,
    /// Every child id exactly once, in the new order
    pub ordered_ids: Vec<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddItemParams {
    /// Meal template or diet slot id
    pub parent_id: i64,
    /// "catalog" or "custom"
    pub source_type: String,
    /// alim_code for catalog foods, custom food id for custom foods
    pub food_id: i64,
    pub quantity_g: f64,
}

impl AddItemParams {
    fn food(&self) -> ToolResult<FoodRef> {
        FoodRef::from_parts(&self.source_type, self.food_id).ok_or_else(|| {
            ToolError::validation(format!(
                "source_type must be 'catalog' or 'custom', got '{}'",
                self.source_type
            ))
        })
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateItemParams {
    pub item_id: i64,
    pub quantity_g: f64,
}

// ============================================================================
// Catalogue Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchFoodsParams {
    pub query: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetCatalogFoodParams {
    pub alim_code: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ImportCatalogBatchParams {
    /// Object with optional arrays: groups, foods, constituents, sources, compositions
    pub batch: serde_json::Value,
}

// ============================================================================
// Custom Food Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MicroParam {
    pub const_code: i64,
    /// Amount per 100 g; null clears the value
    pub value_100g: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CustomFoodParams {
    /// Required for updates
    pub id: Option<i64>,
    pub name: String,
    pub kcal_100g: Option<f64>,
    pub protein_100g: Option<f64>,
    pub carbs_100g: Option<f64>,
    pub fat_100g: Option<f64>,
    #[serde(default)]
    pub micros: Vec<MicroParam>,
}

impl CustomFoodParams {
    fn into_input(self) -> CustomFoodInput {
        CustomFoodInput {
            name: self.name,
            kcal_100g: self.kcal_100g,
            protein_100g: self.protein_100g,
            carbs_100g: self.carbs_100g,
            fat_100g: self.fat_100g,
            micros: self
                .micros
                .into_iter()
                .map(|m| (m.const_code, m.value_100g))
                .collect(),
        }
    }
}

// ============================================================================
// Meal Template Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateMealTemplateParams {
    pub name: String,
    pub notes: Option<String>,
    /// Root meal this one substitutes
    pub parent_meal_id: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateTemplateParams {
    pub id: i64,
    pub name: Option<String>,
    pub notes: Option<String>,
}

// ============================================================================
// Diet Template Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateDietTemplateParams {
    pub name: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DietSlotParams {
    /// Diet template id when adding, slot id when updating
    pub id: i64,
    pub label: String,
    pub meal_template_id: Option<i64>,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl DietSlotParams {
    fn input(&self) -> DietSlotInput {
        DietSlotInput {
            label: self.label.clone(),
            meal_template_id: self.meal_template_id,
            multiplier: self.multiplier,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ImportMealParams {
    pub slot_id: i64,
    /// Defaults to the meal linked to the slot
    pub meal_template_id: Option<i64>,
}

// ============================================================================
// Journal Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct JournalDomainParams {
    /// meals, measurements, progress_photos, check_ins, supplement_protocol or workout_logs
    pub domain: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct JournalRecordIdParams {
    pub domain: String,
    pub id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct JournalRecordParams {
    pub domain: String,
    /// The full record, including its string id
    pub record: serde_json::Value,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PersonalInfoParams {
    /// firstName, lastName, heightCm, goal, profilePhotoUri
    pub info: serde_json::Value,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct WorkoutDraftParams {
    /// Draft session: id, createdAtISO, sessionTitle and any further fields
    pub draft: serde_json::Value,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct WorkoutDraftIdParams {
    pub id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SupplementDayParams {
    /// YYYY-MM-DD
    pub day_key: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SupplementTakenParams {
    /// YYYY-MM-DD
    pub day_key: String,
    pub supplement_id: String,
    pub taken: bool,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl CoachPlanService {
    // --- Status ---

    #[tool(description = "Get the current status of the CoachPlan service including build info, database status, coach and process information")]
    async fn coachplan_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status();
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get instructions for building meal and diet templates. Call this when starting a planning session or when unsure how to use the tools.")]
    fn coach_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::COACH_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(COACH_INSTRUCTIONS)]))
    }

    // --- Catalogue ---

    #[tool(description = "Search catalogue foods (up to 20, with kcal/protein/carbs/fat per 100 g) and the coach's custom foods by name")]
    fn search_foods(&self, Parameters(p): Parameters<SearchFoodsParams>) -> Result<CallToolResult, McpError> {
        respond(catalog::search_foods(&self.context, &p.query))
    }

    #[tool(description = "Get a catalogue food with its group and every composition value")]
    fn get_catalog_food(&self, Parameters(p): Parameters<GetCatalogFoodParams>) -> Result<CallToolResult, McpError> {
        respond(catalog::get_catalog_food(&self.context, p.alim_code))
    }

    #[tool(description = "Load a batch of catalogue rows (groups, foods, constituents, sources, compositions). Existing rows are updated.")]
    fn import_catalog_batch(&self, Parameters(p): Parameters<ImportCatalogBatchParams>) -> Result<CallToolResult, McpError> {
        let batch: CatalogBatch = serde_json::from_value(p.batch)
            .map_err(|e| McpError::invalid_params(format!("Invalid catalogue batch: {}", e), None))?;
        respond(catalog::import_catalog_batch(&self.context, batch))
    }

    // --- Custom Foods ---

    #[tool(description = "Create a custom food with per-100 g values. kcal is derived from the macros when left out.")]
    fn create_custom_food(&self, Parameters(p): Parameters<CustomFoodParams>) -> Result<CallToolResult, McpError> {
        respond(custom_foods::create_custom_food(&self.context, p.into_input()))
    }

    #[tool(description = "Get a custom food with its micronutrients and the number of items using it")]
    fn get_custom_food(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        respond(custom_foods::get_custom_food(&self.context, p.id))
    }

    #[tool(description = "List the coach's custom foods by name")]
    fn list_custom_foods(&self) -> Result<CallToolResult, McpError> {
        respond(custom_foods::list_custom_foods(&self.context))
    }

    #[tool(description = "Replace every field of a custom food, micronutrients included")]
    fn update_custom_food(&self, Parameters(p): Parameters<CustomFoodParams>) -> Result<CallToolResult, McpError> {
        let id = p.id.ok_or_else(|| McpError::invalid_params("id is required", None))?;
        respond(custom_foods::update_custom_food(&self.context, id, p.into_input()))
    }

    #[tool(description = "Delete a custom food. Every meal and slot item using it is removed too.")]
    fn delete_custom_food(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        respond(custom_foods::delete_custom_food(&self.context, p.id))
    }

    // --- Meal Templates ---

    #[tool(description = "Create a meal template. Pass parent_meal_id to create a substitute of a root meal.")]
    fn create_meal_template(&self, Parameters(p): Parameters<CreateMealTemplateParams>) -> Result<CallToolResult, McpError> {
        let data = MealTemplateCreate {
            name: p.name,
            notes: p.notes,
            parent_meal_id: p.parent_meal_id,
        };
        respond(meals::create_meal_template(&self.context, data))
    }

    #[tool(description = "Rename a meal template or change its notes")]
    fn update_meal_template(&self, Parameters(p): Parameters<UpdateTemplateParams>) -> Result<CallToolResult, McpError> {
        let data = MealTemplateUpdate { name: p.name, notes: p.notes };
        respond(meals::update_meal_template(&self.context, p.id, data))
    }

    #[tool(description = "Delete a meal template with its items and substitutes")]
    fn delete_meal_template(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        respond(meals::delete_meal_template(&self.context, p.id))
    }

    #[tool(description = "List meal templates grouped as root meals with their substitutes, each with its own totals")]
    fn list_meal_templates(&self) -> Result<CallToolResult, McpError> {
        respond(meals::list_meal_templates(&self.context))
    }

    #[tool(description = "Copy a root meal and its items into a new substitute of that meal")]
    fn duplicate_as_substitute(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        respond(meals::duplicate_as_substitute(&self.context, p.id))
    }

    #[tool(description = "Get a meal template with items, per-item macros, totals, micronutrient totals and substitutes")]
    fn get_meal_edit_view(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        respond(meals::get_meal_edit_view(&self.context, p.id))
    }

    #[tool(description = "Append a food to a meal template")]
    fn add_meal_item(&self, Parameters(p): Parameters<AddItemParams>) -> Result<CallToolResult, McpError> {
        let food = p.food().map_err(mcp_error)?;
        respond(meals::add_meal_item(&self.context, p.parent_id, food, p.quantity_g))
    }

    #[tool(description = "Change the quantity of a meal item")]
    fn update_meal_item(&self, Parameters(p): Parameters<UpdateItemParams>) -> Result<CallToolResult, McpError> {
        respond(meals::update_meal_item(&self.context, p.item_id, p.quantity_g))
    }

    #[tool(description = "Delete a meal item")]
    fn delete_meal_item(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        respond(meals::delete_meal_item(&self.context, p.id))
    }

    #[tool(description = "Reorder meal items. ordered_ids must contain every item of the meal exactly once.")]
    fn reorder_meal_items(&self, Parameters(p): Parameters<ReorderParams>) -> Result<CallToolResult, McpError> {
        respond(meals::reorder_meal_items(&self.context, p.parent_id, p.ordered_ids))
    }

    // --- Diet Templates ---

    #[tool(description = "Create a diet template (one planned day)")]
    fn create_diet_template(&self, Parameters(p): Parameters<CreateDietTemplateParams>) -> Result<CallToolResult, McpError> {
        let data = DietTemplateCreate { name: p.name, notes: p.notes };
        respond(diets::create_diet_template(&self.context, data))
    }

    #[tool(description = "Get a diet template")]
    fn get_diet_template(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        respond(diets::get_diet_template(&self.context, p.id))
    }

    #[tool(description = "List the coach's diet templates by name")]
    fn list_diet_templates(&self) -> Result<CallToolResult, McpError> {
        respond(diets::list_diet_templates(&self.context))
    }

    #[tool(description = "Rename a diet template or change its notes")]
    fn update_diet_template(&self, Parameters(p): Parameters<UpdateTemplateParams>) -> Result<CallToolResult, McpError> {
        let data = DietTemplateUpdate { name: p.name, notes: p.notes };
        respond(diets::update_diet_template(&self.context, p.id, data))
    }

    #[tool(description = "Delete a diet template with its slots and slot items")]
    fn delete_diet_template(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        respond(diets::delete_diet_template(&self.context, p.id))
    }

    #[tool(description = "Append a slot to a diet template (id = diet template id). multiplier defaults to 1.")]
    fn add_diet_slot(&self, Parameters(p): Parameters<DietSlotParams>) -> Result<CallToolResult, McpError> {
        respond(diets::add_diet_slot(&self.context, p.id, p.input()))
    }

    #[tool(description = "Replace a slot's label, linked meal and multiplier (id = slot id). Items are not changed.")]
    fn update_diet_slot(&self, Parameters(p): Parameters<DietSlotParams>) -> Result<CallToolResult, McpError> {
        respond(diets::update_diet_slot(&self.context, p.id, p.input()))
    }

    #[tool(description = "Delete a diet slot with its items")]
    fn delete_diet_slot(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        respond(diets::delete_diet_slot(&self.context, p.id))
    }

    #[tool(description = "Reorder the slots of a diet. ordered_ids must contain every slot of the diet exactly once.")]
    fn reorder_diet_slots(&self, Parameters(p): Parameters<ReorderParams>) -> Result<CallToolResult, McpError> {
        respond(diets::reorder_diet_slots(&self.context, p.parent_id, p.ordered_ids))
    }

    #[tool(description = "Append a food to a diet slot")]
    fn add_slot_item(&self, Parameters(p): Parameters<AddItemParams>) -> Result<CallToolResult, McpError> {
        let food = p.food().map_err(mcp_error)?;
        respond(diets::add_slot_item(&self.context, p.parent_id, food, p.quantity_g))
    }

    #[tool(description = "Change the quantity of a diet slot item")]
    fn update_slot_item(&self, Parameters(p): Parameters<UpdateItemParams>) -> Result<CallToolResult, McpError> {
        respond(diets::update_slot_item(&self.context, p.item_id, p.quantity_g))
    }

    #[tool(description = "Delete a diet slot item")]
    fn delete_slot_item(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        respond(diets::delete_slot_item(&self.context, p.id))
    }

    #[tool(description = "Reorder slot items. ordered_ids must contain every item of the slot exactly once.")]
    fn reorder_slot_items(&self, Parameters(p): Parameters<ReorderParams>) -> Result<CallToolResult, McpError> {
        respond(diets::reorder_slot_items(&self.context, p.parent_id, p.ordered_ids))
    }

    #[tool(description = "Replace a slot's items with a copy of a meal template's items. Quantities are copied unchanged. Uses the slot's linked meal when meal_template_id is omitted.")]
    fn import_meal_into_slot(&self, Parameters(p): Parameters<ImportMealParams>) -> Result<CallToolResult, McpError> {
        respond(diets::import_meal_into_slot(&self.context, p.slot_id, p.meal_template_id))
    }

    #[tool(description = "Get a diet with every slot's items and totals, day totals, micronutrient totals and the meal templates available for slots")]
    fn get_diet_edit_view(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        respond(diets::get_diet_edit_view(&self.context, p.id))
    }

    // --- Journal ---

    #[tool(description = "List every record of a journal domain")]
    fn journal_list(&self, Parameters(p): Parameters<JournalDomainParams>) -> Result<CallToolResult, McpError> {
        let domain: JournalDomain = p.domain.parse().map_err(mcp_error)?;
        respond(journal::list_journal(&self.context, domain))
    }

    #[tool(description = "Get one journal record by its id")]
    fn journal_get(&self, Parameters(p): Parameters<JournalRecordIdParams>) -> Result<CallToolResult, McpError> {
        let domain: JournalDomain = p.domain.parse().map_err(mcp_error)?;
        respond(journal::get_journal_record(&self.context, domain, &p.id))
    }

    #[tool(description = "Add a record to a journal domain")]
    fn journal_add(&self, Parameters(p): Parameters<JournalRecordParams>) -> Result<CallToolResult, McpError> {
        let domain: JournalDomain = p.domain.parse().map_err(mcp_error)?;
        respond(journal::change_journal(&self.context, domain, JournalChange::Add(p.record)))
    }

    #[tool(description = "Replace the journal record with the same id")]
    fn journal_update(&self, Parameters(p): Parameters<JournalRecordParams>) -> Result<CallToolResult, McpError> {
        let domain: JournalDomain = p.domain.parse().map_err(mcp_error)?;
        respond(journal::change_journal(&self.context, domain, JournalChange::Update(p.record)))
    }

    #[tool(description = "Delete a journal record by id")]
    fn journal_delete(&self, Parameters(p): Parameters<JournalRecordIdParams>) -> Result<CallToolResult, McpError> {
        let domain: JournalDomain = p.domain.parse().map_err(mcp_error)?;
        respond(journal::change_journal(&self.context, domain, JournalChange::Delete(p.id)))
    }

    #[tool(description = "Get the athlete's personal info")]
    fn get_personal_info(&self) -> Result<CallToolResult, McpError> {
        respond(journal::get_personal_info(&self.context))
    }

    #[tool(description = "Save the athlete's personal info, replacing what was stored")]
    fn save_personal_info(&self, Parameters(p): Parameters<PersonalInfoParams>) -> Result<CallToolResult, McpError> {
        respond(journal::save_personal_info(&self.context, p.info))
    }

    #[tool(description = "Save an in-progress workout session, replacing any draft with the same id")]
    fn save_workout_draft(&self, Parameters(p): Parameters<WorkoutDraftParams>) -> Result<CallToolResult, McpError> {
        respond(journal::save_workout_draft(&self.context, p.draft))
    }

    #[tool(description = "Get a workout draft by id")]
    fn get_workout_draft(&self, Parameters(p): Parameters<WorkoutDraftIdParams>) -> Result<CallToolResult, McpError> {
        respond(journal::get_workout_draft(&self.context, &p.id))
    }

    #[tool(description = "Delete a workout draft by id. Unknown ids are ignored.")]
    fn delete_workout_draft(&self, Parameters(p): Parameters<WorkoutDraftIdParams>) -> Result<CallToolResult, McpError> {
        respond(journal::delete_workout_draft(&self.context, &p.id))
    }

    #[tool(description = "Get supplement intake for a day")]
    fn get_supplement_day(&self, Parameters(p): Parameters<SupplementDayParams>) -> Result<CallToolResult, McpError> {
        respond(journal::get_compliance_day(&self.context, &p.day_key))
    }

    #[tool(description = "Mark a supplement taken or not taken on a day. The first intake time of the day is kept.")]
    fn set_supplement_taken(&self, Parameters(p): Parameters<SupplementTakenParams>) -> Result<CallToolResult, McpError> {
        respond(journal::set_supplement_taken(&self.context, &p.day_key, &p.supplement_id, p.taken))
    }

    #[tool(description = "List days with recorded supplement intake, newest first")]
    fn list_supplement_days(&self) -> Result<CallToolResult, McpError> {
        respond(journal::compliance_days(&self.context))
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for CoachPlanService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "coachplan".into(),
                version: crate::build_info::BuildInfo::current().version.into(),
                title: Some("CoachPlan nutrition planner".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "CoachPlan - Meal and diet template planning for coaches. \
                 IMPORTANT: Call coach_instructions before building templates. \
                 Foods: search_foods, get_catalog_food, import_catalog_batch, \
                 create/get/list/update/delete_custom_food. \
                 Meals: create/update/delete/list_meal_templates, duplicate_as_substitute, get_meal_edit_view, \
                 add/update/delete/reorder_meal_item(s). \
                 Diets: create/get/list/update/delete_diet_template, add/update/delete/reorder_diet_slot(s), \
                 add/update/delete/reorder_slot_item(s), import_meal_into_slot, get_diet_edit_view. \
                 Journal: journal_list/get/add/update/delete, get/save_personal_info, \
                 save/get/delete_workout_draft, \
                 get_supplement_day, set_supplement_taken, list_supplement_days."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        let not_found = mcp_error(ToolError::not_found("Meal template", 4));
        assert_eq!(not_found.code, rmcp::model::ErrorCode::RESOURCE_NOT_FOUND);

        let invalid = mcp_error(ToolError::validation("quantity_g must be at least 0.001"));
        assert_eq!(invalid.code, rmcp::model::ErrorCode::INVALID_PARAMS);
        assert_eq!(invalid.message, "quantity_g must be at least 0.001");
    }

    #[test]
    fn test_item_params_food() {
        let params = AddItemParams {
            parent_id: 1,
            source_type: "Custom".into(),
            food_id: 9,
            quantity_g: 50.0,
        };
        assert_eq!(params.food().unwrap(), FoodRef::Custom(9));

        let bad = AddItemParams { source_type: "recipe".into(), ..params };
        assert!(matches!(bad.food(), Err(ToolError::Validation(_))));
    }
}
