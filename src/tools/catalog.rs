//! Catalogue Tools
//!
//! Food search across the catalogue and the coach's custom foods, catalogue
//! food detail, and batched ingestion of reference dataset rows.

use serde::{Deserialize, Serialize};

use crate::error::{ToolError, ToolResult};
use crate::models::{
    CatalogFood, CatalogFoodHit, CatalogGroup, CatalogSource, Composition, CompositionDetail,
    Constituent, CustomFood, Per100g,
};
use crate::nutrition::decimal::{is_placeholder, parse_dataset_decimal};
use super::CoachContext;

/// Maximum hits per source in search results
pub const SEARCH_LIMIT: i64 = 20;

/// Custom food search hit
#[derive(Debug, Serialize)]
pub struct CustomFoodHit {
    pub id: i64,
    pub name: String,
    pub per_100g: Per100g,
}

/// Response for search_foods
#[derive(Debug, Default, Serialize)]
pub struct SearchFoodsResponse {
    pub query: String,
    pub catalog: Vec<CatalogFoodHit>,
    pub custom: Vec<CustomFoodHit>,
}

/// Response for get_catalog_food
#[derive(Debug, Serialize)]
pub struct CatalogFoodDetail {
    pub food: CatalogFood,
    pub group: Option<CatalogGroup>,
    pub compositions: Vec<CompositionDetail>,
}

/// One composition cell as found in the dataset, values still raw text
#[derive(Debug, Clone, Deserialize)]
pub struct RawComposition {
    pub alim_code: i64,
    pub const_code: i64,
    pub teneur: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub code_confiance: Option<String>,
    pub source_code: Option<i64>,
}

impl RawComposition {
    fn parse(&self) -> Composition {
        let decimal = |cell: &Option<String>| cell.as_deref().and_then(parse_dataset_decimal);
        Composition {
            alim_code: self.alim_code,
            const_code: self.const_code,
            teneur: decimal(&self.teneur),
            min: decimal(&self.min),
            max: decimal(&self.max),
            code_confiance: self.code_confiance.clone(),
            source_code: self.source_code,
        }
    }
}

/// A batch of reference dataset rows
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogBatch {
    #[serde(default)]
    pub groups: Vec<CatalogGroup>,
    #[serde(default)]
    pub foods: Vec<CatalogFood>,
    #[serde(default)]
    pub constituents: Vec<Constituent>,
    #[serde(default)]
    pub sources: Vec<CatalogSource>,
    #[serde(default)]
    pub compositions: Vec<RawComposition>,
}

/// Response for import_catalog_batch
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct CatalogBatchResponse {
    pub groups: usize,
    pub foods: usize,
    pub constituents: usize,
    pub sources: usize,
    pub compositions: usize,
    /// Composition cells with a present but unreadable amount, stored as null
    pub unreadable_values: usize,
}

/// Search catalogue and custom foods by name substring
pub fn search_foods(ctx: &CoachContext, query: &str) -> ToolResult<SearchFoodsResponse> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(SearchFoodsResponse::default());
    }

    let conn = ctx.database.get_conn()?;
    let catalog = CatalogFood::search_with_macros(&conn, query, SEARCH_LIMIT, &ctx.codes)?;
    let custom = CustomFood::search_owned(&conn, ctx.scope.coach_id(), query, SEARCH_LIMIT)?
        .into_iter()
        .map(|food| CustomFoodHit {
            id: food.id,
            name: food.name,
            per_100g: food.per_100g,
        })
        .collect();

    Ok(SearchFoodsResponse {
        query: query.to_string(),
        catalog,
        custom,
    })
}

/// Catalogue food with its group and every composition row
pub fn get_catalog_food(ctx: &CoachContext, alim_code: i64) -> ToolResult<CatalogFoodDetail> {
    let conn = ctx.database.get_conn()?;
    let food = CatalogFood::get_by_code(&conn, alim_code)?
        .ok_or_else(|| ToolError::not_found("Catalog food", alim_code))?;
    let group = CatalogGroup::get_for_food(&conn, &food)?;
    let compositions = Composition::list_for_food(&conn, alim_code)?;

    Ok(CatalogFoodDetail {
        food,
        group,
        compositions,
    })
}

/// Upsert a batch of dataset rows in one transaction.
///
/// Re-importing the same batch leaves the tables unchanged.
pub fn import_catalog_batch(ctx: &CoachContext, batch: CatalogBatch) -> ToolResult<CatalogBatchResponse> {
    let unreadable_values = batch
        .compositions
        .iter()
        .flat_map(|c| [&c.teneur, &c.min, &c.max])
        .filter(|cell| {
            cell.as_deref()
                .is_some_and(|s| !is_placeholder(s) && parse_dataset_decimal(s).is_none())
        })
        .count();
    let compositions: Vec<Composition> = batch.compositions.iter().map(RawComposition::parse).collect();

    let response = ctx.database.with_transaction(|tx| {
        Ok::<_, ToolError>(CatalogBatchResponse {
            groups: CatalogGroup::upsert_many(tx, &batch.groups)?,
            foods: CatalogFood::upsert_many(tx, &batch.foods)?,
            constituents: Constituent::upsert_many(tx, &batch.constituents)?,
            sources: CatalogSource::upsert_many(tx, &batch.sources)?,
            compositions: Composition::upsert_many(tx, &compositions)?,
            unreadable_values,
        })
    })?;

    if unreadable_values > 0 {
        tracing::warn!(unreadable_values, "stored unreadable dataset values as null");
    }
    tracing::info!(
        foods = response.foods,
        compositions = response.compositions,
        "imported catalogue batch"
    );
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CustomFoodInput;
    use crate::tools::custom_foods::create_custom_food;
    use crate::tools::testing::{context, other_coach, APPLE};

    #[test]
    fn test_blank_query_returns_nothing() {
        let ctx = context();
        let result = search_foods(&ctx, "   ").unwrap();
        assert!(result.catalog.is_empty());
        assert!(result.custom.is_empty());
    }

    #[test]
    fn test_search_covers_catalog_and_own_custom_foods() {
        let ctx = context();
        create_custom_food(
            &ctx,
            CustomFoodInput { name: "Pommes sautees".into(), ..Default::default() },
        )
        .unwrap();
        create_custom_food(
            &other_coach(&ctx),
            CustomFoodInput { name: "Pomme secrete".into(), ..Default::default() },
        )
        .unwrap();

        let result = search_foods(&ctx, "Pomme").unwrap();
        assert_eq!(result.catalog.len(), 1);
        assert_eq!(result.catalog[0].alim_code, APPLE);
        assert_eq!(result.catalog[0].per_100g.kcal, Some(52.0));
        assert_eq!(result.catalog[0].per_100g.fat, None);
        assert_eq!(result.custom.len(), 1);
        assert_eq!(result.custom[0].name, "Pommes sautees");
    }

    #[test]
    fn test_catalog_food_detail() {
        let ctx = context();
        let detail = get_catalog_food(&ctx, APPLE).unwrap();
        assert_eq!(detail.food.name_fr, "Pomme, crue");
        assert_eq!(detail.compositions.len(), 4);
        assert_eq!(detail.compositions[0].constituent_name_fr.as_deref(), Some("Energie"));

        assert!(matches!(get_catalog_food(&ctx, 1), Err(ToolError::NotFound { .. })));
    }

    #[test]
    fn test_import_is_fail_soft_and_idempotent() {
        let ctx = context();
        let raw = |const_code: i64, teneur: &str| RawComposition {
            alim_code: 13005,
            const_code,
            teneur: Some(teneur.to_string()),
            min: None,
            max: None,
            code_confiance: Some("A".into()),
            source_code: None,
        };
        let batch = CatalogBatch {
            groups: vec![CatalogGroup {
                grp_code: "02".into(),
                ssgrp_code: "0201".into(),
                ssssgrp_code: "000000".into(),
                grp_name_fr: Some("fruits".into()),
                ssgrp_name_fr: None,
                ssssgrp_name_fr: None,
                grp_name_en: None,
                ssgrp_name_en: None,
                ssssgrp_name_en: None,
            }],
            foods: vec![CatalogFood {
                alim_code: 13005,
                name_fr: "Banane, crue".into(),
                name_en: Some("Banana, raw".into()),
                name_sci: None,
                grp_code: Some("02".into()),
                ssgrp_code: Some("0201".into()),
                ssssgrp_code: Some("000000".into()),
                facteur_jones: Some(6.25),
            }],
            compositions: vec![raw(328, "89,1"), raw(25000, "traces"), raw(31000, "n/a?")],
            ..Default::default()
        };

        let first = import_catalog_batch(&ctx, batch.clone()).unwrap();
        assert_eq!(first.compositions, 3);
        assert_eq!(first.unreadable_values, 1);
        let second = import_catalog_batch(&ctx, batch).unwrap();
        assert_eq!(first, second);

        let detail = get_catalog_food(&ctx, 13005).unwrap();
        assert_eq!(detail.group.and_then(|g| g.grp_name_fr).as_deref(), Some("fruits"));
        let values: Vec<Option<f64>> = detail.compositions.iter().map(|c| c.teneur).collect();
        assert_eq!(values, vec![Some(89.1), None, None]);
    }
}
