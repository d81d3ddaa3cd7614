//! CoachPlan Status Tool
//!
//! Provides runtime status information about the CoachPlan service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Usage guide for AI assistants driving the coach tools
pub const COACH_INSTRUCTIONS: &str = r#"
# CoachPlan Instructions

CoachPlan holds a coach's nutrition planning data: a read-only food
composition catalogue, the coach's own custom foods, meal templates and
diet templates. Every template belongs to the coach the server was started
for; ids owned by someone else behave exactly like ids that do not exist.

---

## Foods

Foods are referenced in two ways:

| source_type | id | Meaning |
|-------------|----|---------|
| `catalog` | `alim_code` | A food from the composition catalogue |
| `custom` | custom food id | A food the coach created |

All nutrition values are **per 100 g**. Quantities on items are grams.

### Finding a food

1. Call `search_foods` with part of the name (case-insensitive).
2. Results come in two lists: `catalog` (up to 20, with kcal, protein,
   carbs and fat per 100 g) and `custom`.
3. Use `get_catalog_food` for the full composition of a catalogue food.

### Custom foods

Use `create_custom_food` when the catalogue has no match, e.g. a branded
protein bar. Give `name` and whatever per-100 g values are known. When
`kcal_100g` is left out it is derived as `protein*4 + carbs*4 + fat*9`.
Micronutrients go in `micros`, keyed by nutrient code.

Deleting a custom food also removes every meal and slot item using it;
`get_custom_food` reports how many items use it.

---

## Meal templates

A meal template is an ordered list of foods with quantities.

- `create_meal_template` with a `name`, optional `notes`.
- Pass `parent_meal_id` to create a **substitute**: an alternative version
  of a root meal. Substitutes cannot have substitutes.
- `duplicate_as_substitute` copies a root meal and all its items into a new
  substitute named `<name> (substitut)`.
- `add_meal_item`, `update_meal_item`, `delete_meal_item` manage lines.
- `reorder_meal_items` takes **every** item id of the meal exactly once,
  in the new order. Missing, extra or repeated ids are rejected and nothing
  changes.
- `get_meal_edit_view` returns items, per-item macros, totals and tracked
  micronutrient totals.

---

## Diet templates

A diet template is one planned day made of ordered slots ("Petit dej",
"Dejeuner", ...). Each slot has its own items.

- `create_diet_template`, then `add_diet_slot` with a `label`, an optional
  linked `meal_template_id` and a `multiplier` (default 1).
- `import_meal_into_slot` **replaces** the slot's items with a copy of a
  meal template's items. Foods and quantities are copied exactly; the
  multiplier is informational and is not applied to the copy.
  Without `meal_template_id` the slot's linked meal is used.
- Slot items are edited like meal items: `add_slot_item`,
  `update_slot_item`, `delete_slot_item`, `reorder_slot_items`.
- `reorder_diet_slots` follows the same exact-id-set rule as item reorders.
- `get_diet_edit_view` returns every slot with its totals, the day totals
  (sum of all slots) and the list of meal templates available for linking.

---

## Athlete journal

The journal keeps the athlete's own records as JSON documents:

| domain | Record fields |
|--------|---------------|
| `meals` | id, dateISO, type, photoUri?, notes? |
| `measurements` | id, dateISO, weightKg?, waistCm?, hipsCm?, chestCm?, armCm?, thighCm? |
| `progress_photos` | id, dateISO, frontUri?, sideUri?, backUri? |
| `check_ins` | id, dateISO, sleep, stress, energy, nutritionAdherence (1 to 10), painNotes? |
| `supplement_protocol` | id, nom, dosage, timing, description?, frequency? |
| `workout_logs` | id, createdAtISO, sessionTitle, plus any session details |

Use `journal_list`, `journal_get`, `journal_add`, `journal_update` and
`journal_delete` with the domain name. Personal info is a single record
(`get_personal_info`, `save_personal_info`). Supplement intake is tracked
per day with `set_supplement_taken` and read with `get_supplement_day`.
An unfinished workout is kept as a draft keyed by its id
(`save_workout_draft`, `get_workout_draft`, `delete_workout_draft`).

---

## Notes

- Totals are never rounded by the server; round for display only.
- A nutrient missing from a food counts as 0.
- Item quantities and slot multipliers must be at least 0.001.
"#;

/// Runtime status of the CoachPlan service
#[derive(Debug, Clone, Serialize)]
pub struct CoachPlanStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub schema_version: i32,

    pub coach_id: i64,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
    schema_version: i32,
    coach_id: i64,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf, schema_version: i32, coach_id: i64) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
            schema_version,
            coach_id,
        }
    }

    /// Get the current status
    pub fn get_status(&self) -> CoachPlanStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        CoachPlanStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            schema_version: self.schema_version,
            coach_id: self.coach_id,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reports_process_and_missing_database() {
        let tracker = StatusTracker::new(PathBuf::from("/nonexistent/coachplan.db"), 2, 7);
        let status = tracker.get_status();
        assert_eq!(status.process_id, std::process::id());
        assert_eq!(status.database_size_bytes, None);
        assert_eq!(status.coach_id, 7);
        assert_eq!(status.schema_version, 2);
    }

    #[test]
    fn test_instructions_name_every_journal_domain() {
        for domain in crate::tools::journal::JournalDomain::ALL {
            assert!(COACH_INSTRUCTIONS.contains(domain.name()), "{}", domain.name());
        }
    }
}
