//! Reference catalogue models
//!
//! Foods, groups, constituents, sources and composition rows of the shared
//! nutrition dataset. Rows are keyed by the dataset's natural codes and
//! written only through idempotent upserts.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::config::NutrientCodes;
use crate::db::DbResult;
use super::Per100g;

/// A catalogue food
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogFood {
    pub alim_code: i64,
    pub name_fr: String,
    pub name_en: Option<String>,
    pub name_sci: Option<String>,
    pub grp_code: Option<String>,
    pub ssgrp_code: Option<String>,
    pub ssssgrp_code: Option<String>,
    pub facteur_jones: Option<f64>,
}

/// Three-level food classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogGroup {
    pub grp_code: String,
    pub ssgrp_code: String,
    pub ssssgrp_code: String,
    pub grp_name_fr: Option<String>,
    pub ssgrp_name_fr: Option<String>,
    pub ssssgrp_name_fr: Option<String>,
    pub grp_name_en: Option<String>,
    pub ssgrp_name_en: Option<String>,
    pub ssssgrp_name_en: Option<String>,
}

/// A nutrient constituent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constituent {
    pub const_code: i64,
    pub name_fr: String,
    pub name_en: Option<String>,
    pub infoods_code: Option<String>,
}

/// A bibliographic source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSource {
    pub source_code: i64,
    pub ref_citation: Option<String>,
}

/// One food x nutrient value, per 100 g
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub alim_code: i64,
    pub const_code: i64,
    pub teneur: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub code_confiance: Option<String>,
    pub source_code: Option<i64>,
}

/// Composition row joined with its constituent and source
#[derive(Debug, Clone, Serialize)]
pub struct CompositionDetail {
    pub const_code: i64,
    pub constituent_name_fr: Option<String>,
    pub constituent_name_en: Option<String>,
    pub teneur: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub code_confiance: Option<String>,
    pub source_code: Option<i64>,
    pub ref_citation: Option<String>,
}

/// Catalogue search hit with per-100 g macros
#[derive(Debug, Clone, Serialize)]
pub struct CatalogFoodHit {
    pub alim_code: i64,
    pub name_fr: String,
    pub name_en: Option<String>,
    pub per_100g: Per100g,
}

impl CatalogFood {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            alim_code: row.get("alim_code")?,
            name_fr: row.get("name_fr")?,
            name_en: row.get("name_en")?,
            name_sci: row.get("name_sci")?,
            grp_code: row.get("grp_code")?,
            ssgrp_code: row.get("ssgrp_code")?,
            ssssgrp_code: row.get("ssssgrp_code")?,
            facteur_jones: row.get("facteur_jones")?,
        })
    }

    pub fn get_by_code(conn: &Connection, alim_code: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM catalog_foods WHERE alim_code = ?1")?;

        match stmt.query_row([alim_code], Self::from_row) {
            Ok(food) => Ok(Some(food)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn exists(conn: &Connection, alim_code: i64) -> DbResult<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM catalog_foods WHERE alim_code = ?1",
            [alim_code],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Name-substring search with the configured macro codes resolved per 100 g
    pub fn search_with_macros(
        conn: &Connection,
        query: &str,
        limit: i64,
        codes: &NutrientCodes,
    ) -> DbResult<Vec<CatalogFoodHit>> {
        let pattern = format!("%{}%", query);
        let mut stmt = conn.prepare(
            r#"
            SELECT f.alim_code, f.name_fr, f.name_en,
                (SELECT teneur FROM catalog_compositions c
                    WHERE c.alim_code = f.alim_code AND c.const_code = ?2) AS kcal,
                (SELECT teneur FROM catalog_compositions c
                    WHERE c.alim_code = f.alim_code AND c.const_code = ?3) AS protein,
                (SELECT teneur FROM catalog_compositions c
                    WHERE c.alim_code = f.alim_code AND c.const_code = ?4) AS carbs,
                (SELECT teneur FROM catalog_compositions c
                    WHERE c.alim_code = f.alim_code AND c.const_code = ?5) AS fat
            FROM catalog_foods f
            WHERE f.name_fr LIKE ?1
            ORDER BY f.name_fr ASC
            LIMIT ?6
            "#,
        )?;

        let hits = stmt
            .query_map(
                params![pattern, codes.kcal, codes.protein, codes.carbs, codes.fat, limit],
                |row| {
                    Ok(CatalogFoodHit {
                        alim_code: row.get("alim_code")?,
                        name_fr: row.get("name_fr")?,
                        name_en: row.get("name_en")?,
                        per_100g: Per100g {
                            kcal: row.get("kcal")?,
                            protein: row.get("protein")?,
                            carbs: row.get("carbs")?,
                            fat: row.get("fat")?,
                        },
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(hits)
    }

    /// Insert or replace foods by `alim_code`
    pub fn upsert_many(conn: &Connection, foods: &[CatalogFood]) -> DbResult<usize> {
        let mut stmt = conn.prepare(
            r#"
            INSERT INTO catalog_foods (
                alim_code, name_fr, name_en, name_sci,
                grp_code, ssgrp_code, ssssgrp_code, facteur_jones
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(alim_code) DO UPDATE SET
                name_fr = excluded.name_fr,
                name_en = excluded.name_en,
                name_sci = excluded.name_sci,
                grp_code = excluded.grp_code,
                ssgrp_code = excluded.ssgrp_code,
                ssssgrp_code = excluded.ssssgrp_code,
                facteur_jones = excluded.facteur_jones
            "#,
        )?;

        for food in foods {
            stmt.execute(params![
                food.alim_code,
                food.name_fr,
                food.name_en,
                food.name_sci,
                food.grp_code,
                food.ssgrp_code,
                food.ssssgrp_code,
                food.facteur_jones,
            ])?;
        }
        Ok(foods.len())
    }
}

impl CatalogGroup {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            grp_code: row.get("grp_code")?,
            ssgrp_code: row.get("ssgrp_code")?,
            ssssgrp_code: row.get("ssssgrp_code")?,
            grp_name_fr: row.get("grp_name_fr")?,
            ssgrp_name_fr: row.get("ssgrp_name_fr")?,
            ssssgrp_name_fr: row.get("ssssgrp_name_fr")?,
            grp_name_en: row.get("grp_name_en")?,
            ssgrp_name_en: row.get("ssgrp_name_en")?,
            ssssgrp_name_en: row.get("ssssgrp_name_en")?,
        })
    }

    /// Group of a food, matched on the full code triple
    pub fn get_for_food(conn: &Connection, food: &CatalogFood) -> DbResult<Option<Self>> {
        let Some(grp_code) = food.grp_code.as_deref() else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM catalog_groups
            WHERE grp_code = ?1 AND ssgrp_code = ?2 AND ssssgrp_code = ?3
            "#,
        )?;

        let result = stmt.query_row(
            params![
                grp_code,
                food.ssgrp_code.as_deref().unwrap_or(""),
                food.ssssgrp_code.as_deref().unwrap_or(""),
            ],
            Self::from_row,
        );
        match result {
            Ok(group) => Ok(Some(group)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn upsert_many(conn: &Connection, groups: &[CatalogGroup]) -> DbResult<usize> {
        let mut stmt = conn.prepare(
            r#"
            INSERT INTO catalog_groups (
                grp_code, ssgrp_code, ssssgrp_code,
                grp_name_fr, ssgrp_name_fr, ssssgrp_name_fr,
                grp_name_en, ssgrp_name_en, ssssgrp_name_en
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(grp_code, ssgrp_code, ssssgrp_code) DO UPDATE SET
                grp_name_fr = excluded.grp_name_fr,
                ssgrp_name_fr = excluded.ssgrp_name_fr,
                ssssgrp_name_fr = excluded.ssssgrp_name_fr,
                grp_name_en = excluded.grp_name_en,
                ssgrp_name_en = excluded.ssgrp_name_en,
                ssssgrp_name_en = excluded.ssssgrp_name_en
            "#,
        )?;

        for g in groups {
            stmt.execute(params![
                g.grp_code,
                g.ssgrp_code,
                g.ssssgrp_code,
                g.grp_name_fr,
                g.ssgrp_name_fr,
                g.ssssgrp_name_fr,
                g.grp_name_en,
                g.ssgrp_name_en,
                g.ssssgrp_name_en,
            ])?;
        }
        Ok(groups.len())
    }
}

impl Constituent {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            const_code: row.get("const_code")?,
            name_fr: row.get("name_fr")?,
            name_en: row.get("name_en")?,
            infoods_code: row.get("infoods_code")?,
        })
    }

    /// Constituents for the given codes, ordered by code; unknown codes are skipped
    pub fn list_for_codes(conn: &Connection, codes: &[i64]) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM catalog_constituents WHERE const_code = ?1")?;

        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut found = Vec::with_capacity(sorted.len());
        for code in sorted {
            match stmt.query_row([code], Self::from_row) {
                Ok(c) => found.push(c),
                Err(rusqlite::Error::QueryReturnedNoRows) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(found)
    }

    pub fn upsert_many(conn: &Connection, constituents: &[Constituent]) -> DbResult<usize> {
        let mut stmt = conn.prepare(
            r#"
            INSERT INTO catalog_constituents (const_code, name_fr, name_en, infoods_code)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(const_code) DO UPDATE SET
                name_fr = excluded.name_fr,
                name_en = excluded.name_en,
                infoods_code = excluded.infoods_code
            "#,
        )?;

        for c in constituents {
            stmt.execute(params![c.const_code, c.name_fr, c.name_en, c.infoods_code])?;
        }
        Ok(constituents.len())
    }
}

impl CatalogSource {
    pub fn upsert_many(conn: &Connection, sources: &[CatalogSource]) -> DbResult<usize> {
        let mut stmt = conn.prepare(
            r#"
            INSERT INTO catalog_sources (source_code, ref_citation)
            VALUES (?1, ?2)
            ON CONFLICT(source_code) DO UPDATE SET ref_citation = excluded.ref_citation
            "#,
        )?;

        for s in sources {
            stmt.execute(params![s.source_code, s.ref_citation])?;
        }
        Ok(sources.len())
    }
}

impl Composition {
    /// Every composition row of a food, with constituent names and source citation
    pub fn list_for_food(conn: &Connection, alim_code: i64) -> DbResult<Vec<CompositionDetail>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT c.const_code, k.name_fr AS constituent_name_fr, k.name_en AS constituent_name_en,
                   c.teneur, c.min, c.max, c.code_confiance, c.source_code, s.ref_citation
            FROM catalog_compositions c
            LEFT JOIN catalog_constituents k ON k.const_code = c.const_code
            LEFT JOIN catalog_sources s ON s.source_code = c.source_code
            WHERE c.alim_code = ?1
            ORDER BY c.const_code ASC
            "#,
        )?;

        let rows = stmt
            .query_map([alim_code], |row| {
                Ok(CompositionDetail {
                    const_code: row.get("const_code")?,
                    constituent_name_fr: row.get("constituent_name_fr")?,
                    constituent_name_en: row.get("constituent_name_en")?,
                    teneur: row.get("teneur")?,
                    min: row.get("min")?,
                    max: row.get("max")?,
                    code_confiance: row.get("code_confiance")?,
                    source_code: row.get("source_code")?,
                    ref_citation: row.get("ref_citation")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Insert or replace compositions by `(alim_code, const_code)`
    pub fn upsert_many(conn: &Connection, rows: &[Composition]) -> DbResult<usize> {
        let mut stmt = conn.prepare(
            r#"
            INSERT INTO catalog_compositions (
                alim_code, const_code, teneur, min, max, code_confiance, source_code
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(alim_code, const_code) DO UPDATE SET
                teneur = excluded.teneur,
                min = excluded.min,
                max = excluded.max,
                code_confiance = excluded.code_confiance,
                source_code = excluded.source_code
            "#,
        )?;

        for r in rows {
            stmt.execute(params![
                r.alim_code,
                r.const_code,
                r.teneur,
                r.min,
                r.max,
                r.code_confiance,
                r.source_code,
            ])?;
        }
        Ok(rows.len())
    }
}
