//! CoachPlan tools
//!
//! Coach operations behind the MCP surface. Each operation validates its
//! input, checks ownership through [`CoachScope`] and runs multi-row writes
//! in a single transaction.

pub mod catalog;
pub mod custom_foods;
pub mod diets;
pub mod items;
pub mod journal;
pub mod meals;
pub mod status;

use crate::config::NutrientCodes;
use crate::db::Database;
use crate::scope::CoachScope;

/// Everything a coach operation needs
#[derive(Clone)]
pub struct CoachContext {
    pub database: Database,
    pub scope: CoachScope,
    pub codes: NutrientCodes,
}

impl CoachContext {
    pub fn new(database: Database, coach_id: i64, codes: NutrientCodes) -> Self {
        Self {
            database,
            scope: CoachScope::new(coach_id),
            codes,
        }
    }
}

/// Quantities and multipliers must be at least this large
pub(crate) const MIN_POSITIVE: f64 = 0.001;

pub(crate) fn require_positive(field: &str, value: f64) -> crate::error::ToolResult<()> {
    if !value.is_finite() || value < MIN_POSITIVE {
        return Err(crate::error::ToolError::validation(format!(
            "{} must be at least {}",
            field, MIN_POSITIVE
        )));
    }
    Ok(())
}

pub(crate) fn require_name<'a>(field: &str, value: &'a str) -> crate::error::ToolResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::error::ToolError::validation(format!("{} cannot be empty", field)));
    }
    Ok(trimmed)
}

/// Shared fixtures for tool tests
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::db::test_database;
    use crate::models::{CatalogFood, Composition, Constituent};

    pub const APPLE: i64 = 13050;
    pub const SPINACH: i64 = 20047;

    /// Context for coach 1 over a fresh database with two catalogue foods
    pub fn context() -> CoachContext {
        let ctx = CoachContext::new(test_database(), 1, NutrientCodes::default());
        ctx.database
            .with_conn(|conn| {
                Constituent::upsert_many(
                    conn,
                    &[
                        constituent(328, "Energie"),
                        constituent(25000, "Proteines"),
                        constituent(31000, "Glucides"),
                        constituent(32000, "Lipides"),
                        constituent(10260, "Fer"),
                        constituent(10120, "Magnesium"),
                    ],
                )?;
                CatalogFood::upsert_many(conn, &[food(APPLE, "Pomme, crue"), food(SPINACH, "Epinard, cru")])?;
                Composition::upsert_many(
                    conn,
                    &[
                        composition(APPLE, 328, Some(52.0)),
                        composition(APPLE, 25000, Some(0.3)),
                        composition(APPLE, 31000, Some(11.6)),
                        composition(APPLE, 32000, None),
                        composition(SPINACH, 328, Some(23.0)),
                        composition(SPINACH, 25000, Some(2.9)),
                        composition(SPINACH, 10260, Some(2.7)),
                    ],
                )?;
                Ok(())
            })
            .expect("seed catalogue");
        ctx
    }

    /// Same database, acting as another coach
    pub fn other_coach(ctx: &CoachContext) -> CoachContext {
        CoachContext::new(ctx.database.clone(), 2, ctx.codes.clone())
    }

    fn constituent(code: i64, name: &str) -> Constituent {
        Constituent {
            const_code: code,
            name_fr: name.to_string(),
            name_en: None,
            infoods_code: None,
        }
    }

    fn food(code: i64, name: &str) -> CatalogFood {
        CatalogFood {
            alim_code: code,
            name_fr: name.to_string(),
            name_en: None,
            name_sci: None,
            grp_code: None,
            ssgrp_code: None,
            ssssgrp_code: None,
            facteur_jones: None,
        }
    }

    fn composition(alim_code: i64, const_code: i64, teneur: Option<f64>) -> Composition {
        Composition {
            alim_code,
            const_code,
            teneur,
            min: None,
            max: None,
            code_confiance: None,
            source_code: None,
        }
    }
}
