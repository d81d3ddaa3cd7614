//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 2;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tracing::info!("applied schema migration v1");
    }

    if current_version < 2 {
        migrate_v2(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (2)", [])?;
        tracing::info!("applied schema migration v2");
    }

    Ok(())
}

/// Migration v1: reference catalogue and coach planning tables
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- REFERENCE CATALOGUE
        -- Shared nutrition dataset, keyed by natural codes
        -- ============================================
        CREATE TABLE catalog_groups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            grp_code TEXT NOT NULL,
            ssgrp_code TEXT NOT NULL DEFAULT '',
            ssssgrp_code TEXT NOT NULL DEFAULT '',
            grp_name_fr TEXT,
            ssgrp_name_fr TEXT,
            ssssgrp_name_fr TEXT,
            grp_name_en TEXT,
            ssgrp_name_en TEXT,
            ssssgrp_name_en TEXT,
            UNIQUE (grp_code, ssgrp_code, ssssgrp_code)
        );

        CREATE TABLE catalog_foods (
            alim_code INTEGER PRIMARY KEY,
            name_fr TEXT NOT NULL,
            name_en TEXT,
            name_sci TEXT,
            grp_code TEXT,
            ssgrp_code TEXT,
            ssssgrp_code TEXT,
            facteur_jones REAL
        );

        CREATE INDEX idx_catalog_foods_name ON catalog_foods(name_fr);

        CREATE TABLE catalog_constituents (
            const_code INTEGER PRIMARY KEY,
            name_fr TEXT NOT NULL,
            name_en TEXT,
            infoods_code TEXT
        );

        CREATE TABLE catalog_sources (
            source_code INTEGER PRIMARY KEY,
            ref_citation TEXT
        );

        CREATE TABLE catalog_compositions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            alim_code INTEGER NOT NULL REFERENCES catalog_foods(alim_code) ON DELETE CASCADE,
            const_code INTEGER NOT NULL REFERENCES catalog_constituents(const_code) ON DELETE CASCADE,
            teneur REAL,                         -- per 100 g, NULL when not determined
            min REAL,
            max REAL,
            code_confiance TEXT,
            source_code INTEGER,
            UNIQUE (alim_code, const_code)
        );

        CREATE INDEX idx_catalog_compositions_const ON catalog_compositions(const_code);

        -- ============================================
        -- CUSTOM FOODS
        -- Coach-authored foods, values per 100 g
        -- ============================================
        CREATE TABLE custom_foods (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            coach_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            kcal_100g REAL,
            protein_100g REAL,
            carbs_100g REAL,
            fat_100g REAL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_custom_foods_coach ON custom_foods(coach_id, name);

        CREATE TABLE custom_food_nutrients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            custom_food_id INTEGER NOT NULL REFERENCES custom_foods(id) ON DELETE CASCADE,
            const_code INTEGER NOT NULL,
            value_100g REAL NOT NULL,
            UNIQUE (custom_food_id, const_code)
        );

        -- ============================================
        -- MEAL TEMPLATES
        -- One level of substitutes via parent_meal_id
        -- ============================================
        CREATE TABLE meal_templates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            coach_id INTEGER NOT NULL,
            parent_meal_id INTEGER REFERENCES meal_templates(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_meal_templates_coach ON meal_templates(coach_id, parent_meal_id);

        CREATE TABLE meal_template_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meal_template_id INTEGER NOT NULL REFERENCES meal_templates(id) ON DELETE CASCADE,
            source_type TEXT NOT NULL CHECK (source_type IN ('catalog', 'custom')),
            alim_code INTEGER REFERENCES catalog_foods(alim_code),
            custom_food_id INTEGER REFERENCES custom_foods(id) ON DELETE CASCADE,
            quantity_g REAL NOT NULL CHECK (quantity_g > 0),
            position INTEGER NOT NULL,
            CHECK (
                (source_type = 'catalog' AND alim_code IS NOT NULL AND custom_food_id IS NULL)
                OR (source_type = 'custom' AND custom_food_id IS NOT NULL AND alim_code IS NULL)
            )
        );

        CREATE INDEX idx_meal_template_items_parent ON meal_template_items(meal_template_id, position);

        -- ============================================
        -- DIET TEMPLATES
        -- Ordered slots, each with its own item list
        -- ============================================
        CREATE TABLE diet_templates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            coach_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_diet_templates_coach ON diet_templates(coach_id);

        CREATE TABLE diet_slots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            diet_template_id INTEGER NOT NULL REFERENCES diet_templates(id) ON DELETE CASCADE,
            label TEXT NOT NULL,
            position INTEGER NOT NULL,
            meal_template_id INTEGER REFERENCES meal_templates(id) ON DELETE SET NULL,
            multiplier REAL NOT NULL DEFAULT 1 CHECK (multiplier > 0)
        );

        CREATE INDEX idx_diet_slots_parent ON diet_slots(diet_template_id, position);

        CREATE TABLE diet_slot_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            diet_slot_id INTEGER NOT NULL REFERENCES diet_slots(id) ON DELETE CASCADE,
            source_type TEXT NOT NULL CHECK (source_type IN ('catalog', 'custom')),
            alim_code INTEGER REFERENCES catalog_foods(alim_code),
            custom_food_id INTEGER REFERENCES custom_foods(id) ON DELETE CASCADE,
            quantity_g REAL NOT NULL CHECK (quantity_g > 0),
            position INTEGER NOT NULL,
            CHECK (
                (source_type = 'catalog' AND alim_code IS NOT NULL AND custom_food_id IS NULL)
                OR (source_type = 'custom' AND custom_food_id IS NOT NULL AND alim_code IS NULL)
            )
        );

        CREATE INDEX idx_diet_slot_items_parent ON diet_slot_items(diet_slot_id, position);
        "#,
    )?;

    Ok(())
}

/// Migration v2: athlete journal key/value store
fn migrate_v2(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE journal_entries (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,                 -- JSON document
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}
