//! Journal Tools
//!
//! Athlete journal documents: record lists addressed by domain name, the
//! personal profile, and daily supplement compliance.

use std::str::FromStr;

use chrono::{NaiveDate, SecondsFormat, Utc};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;

use crate::db::DbError;
use crate::error::{ToolError, ToolResult};
use crate::models::journal::{
    load_document, load_records, parse_compliance_map, parse_draft_map, save_document, CheckIn,
    ComplianceDay, ComplianceMap, DraftMap, JournalKey, JournalRecord, MealEntry, Measurement,
    PersonalInfo, ProgressPhoto, SupplementProtocolItem, WorkoutDraft, WorkoutLogEntry,
};
use super::CoachContext;

const PERSONAL_KEY: JournalKey = JournalKey::new("profile_personal_v1", Some("profile_personal"));
const COMPLIANCE_KEY: JournalKey = JournalKey::new("supplement_compliance_v1", None);
const DRAFTS_KEY: JournalKey = JournalKey::new("workout_log_drafts_v1", Some("workout_log_drafts"));

/// A list-shaped journal document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalDomain {
    Meals,
    Measurements,
    ProgressPhotos,
    CheckIns,
    SupplementProtocol,
    WorkoutLogs,
}

impl JournalDomain {
    pub const ALL: [JournalDomain; 6] = [
        JournalDomain::Meals,
        JournalDomain::Measurements,
        JournalDomain::ProgressPhotos,
        JournalDomain::CheckIns,
        JournalDomain::SupplementProtocol,
        JournalDomain::WorkoutLogs,
    ];

    pub fn name(self) -> &'static str {
        match self {
            JournalDomain::Meals => "meals",
            JournalDomain::Measurements => "measurements",
            JournalDomain::ProgressPhotos => "progress_photos",
            JournalDomain::CheckIns => "check_ins",
            JournalDomain::SupplementProtocol => "supplement_protocol",
            JournalDomain::WorkoutLogs => "workout_logs",
        }
    }

    pub fn key(self) -> JournalKey {
        match self {
            JournalDomain::Meals => JournalKey::new("nutrition_meals_v1", Some("nutrition_meals")),
            JournalDomain::Measurements => {
                JournalKey::new("profile_measurements_v1", Some("profile_measurements"))
            }
            JournalDomain::ProgressPhotos => {
                JournalKey::new("profile_progress_photos_v1", Some("profile_progress_photos"))
            }
            JournalDomain::CheckIns => JournalKey::new("checkins_v1", Some("checkins")),
            JournalDomain::SupplementProtocol => JournalKey::new("supplement_protocol_v1", None),
            JournalDomain::WorkoutLogs => JournalKey::new("workout_logs_v1", Some("workout_logs")),
        }
    }
}

impl FromStr for JournalDomain {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        JournalDomain::ALL
            .into_iter()
            .find(|d| d.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = JournalDomain::ALL.iter().map(|d| d.name()).collect();
                ToolError::validation(format!(
                    "Unknown journal domain '{}'. Expected one of: {}",
                    s,
                    names.join(", ")
                ))
            })
    }
}

/// A change to a record list
#[derive(Debug, Clone)]
pub enum JournalChange {
    Add(Value),
    Update(Value),
    Delete(String),
}

/// Response for journal list reads and writes
#[derive(Debug, Serialize)]
pub struct JournalListResponse {
    pub domain: &'static str,
    pub records: Vec<Value>,
    pub total: usize,
}

fn to_json<T: Serialize>(value: &T) -> ToolResult<Value> {
    serde_json::to_value(value).map_err(|e| ToolError::Database(DbError::from(e)))
}

fn decode_record<R: JournalRecord>(domain: JournalDomain, value: Value) -> ToolResult<R> {
    let record: R = serde_json::from_value(value).map_err(|e| {
        ToolError::validation(format!("Invalid {} record: {}", domain.name(), e))
    })?;
    if !record.is_valid() {
        return Err(ToolError::validation(format!(
            "Invalid {} record '{}'",
            domain.name(),
            record.id()
        )));
    }
    Ok(record)
}

fn list_response<R: JournalRecord>(domain: JournalDomain, records: &[R]) -> ToolResult<JournalListResponse> {
    let records = records.iter().map(to_json).collect::<ToolResult<Vec<_>>>()?;
    Ok(JournalListResponse {
        domain: domain.name(),
        total: records.len(),
        records,
    })
}

fn read_list<R: JournalRecord>(conn: &Connection, domain: JournalDomain) -> ToolResult<JournalListResponse> {
    let records: Vec<R> = load_records(conn, domain.key())?;
    list_response(domain, &records)
}

fn find_record<R: JournalRecord>(conn: &Connection, domain: JournalDomain, id: &str) -> ToolResult<Value> {
    let records: Vec<R> = load_records(conn, domain.key())?;
    records
        .iter()
        .find(|r| r.id() == id)
        .map(to_json)
        .unwrap_or_else(|| {
            Err(ToolError::RecordNotFound {
                domain: domain.name(),
                id: id.to_string(),
            })
        })
}

fn apply_change<R: JournalRecord>(
    conn: &Connection,
    domain: JournalDomain,
    change: JournalChange,
) -> ToolResult<JournalListResponse> {
    let key = domain.key();
    let mut records: Vec<R> = load_records(conn, key)?;
    let missing = |id: &str| ToolError::RecordNotFound {
        domain: domain.name(),
        id: id.to_string(),
    };

    match change {
        JournalChange::Add(value) => {
            let record: R = decode_record(domain, value)?;
            if records.iter().any(|r| r.id() == record.id()) {
                return Err(ToolError::validation(format!(
                    "A {} record with id '{}' already exists",
                    domain.name(),
                    record.id()
                )));
            }
            records.push(record);
        }
        JournalChange::Update(value) => {
            let record: R = decode_record(domain, value)?;
            let slot = records
                .iter_mut()
                .find(|r| r.id() == record.id())
                .ok_or_else(|| missing(record.id()))?;
            *slot = record;
        }
        JournalChange::Delete(id) => {
            let before = records.len();
            records.retain(|r| r.id() != id);
            if records.len() == before {
                return Err(missing(&id));
            }
        }
    }

    save_document(conn, key, &records)?;
    list_response(domain, &records)
}

/// Every readable record of a domain, in stored order
pub fn list_journal(ctx: &CoachContext, domain: JournalDomain) -> ToolResult<JournalListResponse> {
    ctx.database.with_transaction(|tx| match domain {
        JournalDomain::Meals => read_list::<MealEntry>(tx, domain),
        JournalDomain::Measurements => read_list::<Measurement>(tx, domain),
        JournalDomain::ProgressPhotos => read_list::<ProgressPhoto>(tx, domain),
        JournalDomain::CheckIns => read_list::<CheckIn>(tx, domain),
        JournalDomain::SupplementProtocol => read_list::<SupplementProtocolItem>(tx, domain),
        JournalDomain::WorkoutLogs => read_list::<WorkoutLogEntry>(tx, domain),
    })
}

pub fn get_journal_record(ctx: &CoachContext, domain: JournalDomain, id: &str) -> ToolResult<Value> {
    ctx.database.with_transaction(|tx| match domain {
        JournalDomain::Meals => find_record::<MealEntry>(tx, domain, id),
        JournalDomain::Measurements => find_record::<Measurement>(tx, domain, id),
        JournalDomain::ProgressPhotos => find_record::<ProgressPhoto>(tx, domain, id),
        JournalDomain::CheckIns => find_record::<CheckIn>(tx, domain, id),
        JournalDomain::SupplementProtocol => find_record::<SupplementProtocolItem>(tx, domain, id),
        JournalDomain::WorkoutLogs => find_record::<WorkoutLogEntry>(tx, domain, id),
    })
}

/// Add, replace or delete one record; the whole list is rewritten
pub fn change_journal(
    ctx: &CoachContext,
    domain: JournalDomain,
    change: JournalChange,
) -> ToolResult<JournalListResponse> {
    let response = ctx.database.with_transaction(|tx| match domain {
        JournalDomain::Meals => apply_change::<MealEntry>(tx, domain, change),
        JournalDomain::Measurements => apply_change::<Measurement>(tx, domain, change),
        JournalDomain::ProgressPhotos => apply_change::<ProgressPhoto>(tx, domain, change),
        JournalDomain::CheckIns => apply_change::<CheckIn>(tx, domain, change),
        JournalDomain::SupplementProtocol => apply_change::<SupplementProtocolItem>(tx, domain, change),
        JournalDomain::WorkoutLogs => apply_change::<WorkoutLogEntry>(tx, domain, change),
    })?;

    tracing::debug!(domain = domain.name(), total = response.total, "journal updated");
    Ok(response)
}

// ============================================================================
// Personal info
// ============================================================================

/// The athlete profile; empty when never saved
pub fn get_personal_info(ctx: &CoachContext) -> ToolResult<PersonalInfo> {
    ctx.database.with_transaction(|tx| {
        Ok::<_, ToolError>(load_document(tx, PERSONAL_KEY, PersonalInfo::parse)?.unwrap_or_default())
    })
}

pub fn save_personal_info(ctx: &CoachContext, value: Value) -> ToolResult<PersonalInfo> {
    let info = PersonalInfo::parse(value)
        .ok_or_else(|| ToolError::validation("Personal info must be a JSON object"))?;
    let conn = ctx.database.get_conn()?;
    save_document(&conn, PERSONAL_KEY, &info)?;
    Ok(info)
}

// ============================================================================
// Workout drafts
// ============================================================================

/// Response for delete_workout_draft
#[derive(Debug, Serialize)]
pub struct DeleteDraftResponse {
    pub success: bool,
    pub deleted_id: String,
    pub removed: bool,
}

fn load_drafts(conn: &Connection) -> ToolResult<DraftMap> {
    Ok(load_document(conn, DRAFTS_KEY, parse_draft_map)?.unwrap_or_default())
}

/// Store a draft under its id, replacing any earlier draft with that id
pub fn save_workout_draft(ctx: &CoachContext, value: Value) -> ToolResult<WorkoutDraft> {
    let draft: WorkoutDraft = serde_json::from_value(value)
        .map_err(|e| ToolError::validation(format!("Invalid workout draft: {}", e)))?;
    if draft.id.trim().is_empty() {
        return Err(ToolError::validation("Workout draft id cannot be empty"));
    }

    ctx.database.with_transaction(|tx| {
        let mut drafts = load_drafts(tx)?;
        drafts.insert(draft.id.clone(), draft.clone());
        save_document(tx, DRAFTS_KEY, &drafts)?;
        Ok::<_, ToolError>(())
    })?;

    tracing::debug!(draft_id = %draft.id, "workout draft saved");
    Ok(draft)
}

pub fn get_workout_draft(ctx: &CoachContext, id: &str) -> ToolResult<WorkoutDraft> {
    let mut drafts = ctx.database.with_transaction(|tx| load_drafts(tx))?;
    drafts.remove(id).ok_or_else(|| ToolError::RecordNotFound {
        domain: "workout_drafts",
        id: id.to_string(),
    })
}

/// Drop a draft; deleting an unknown id is not an error
pub fn delete_workout_draft(ctx: &CoachContext, id: &str) -> ToolResult<DeleteDraftResponse> {
    let removed = ctx.database.with_transaction(|tx| {
        let mut drafts = load_drafts(tx)?;
        let removed = drafts.remove(id).is_some();
        save_document(tx, DRAFTS_KEY, &drafts)?;
        Ok::<_, ToolError>(removed)
    })?;

    Ok(DeleteDraftResponse {
        success: true,
        deleted_id: id.to_string(),
        removed,
    })
}

// ============================================================================
// Supplement compliance
// ============================================================================

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn require_day_key(day_key: &str) -> ToolResult<()> {
    NaiveDate::parse_from_str(day_key, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ToolError::validation(format!("Day key '{}' must be YYYY-MM-DD", day_key)))
}

fn load_compliance(conn: &Connection) -> ToolResult<ComplianceMap> {
    Ok(load_document(conn, COMPLIANCE_KEY, parse_compliance_map)?.unwrap_or_default())
}

/// Intake for a day; a day with nothing recorded is returned empty and not stored
pub fn get_compliance_day(ctx: &CoachContext, day_key: &str) -> ToolResult<ComplianceDay> {
    require_day_key(day_key)?;
    let conn = ctx.database.get_conn()?;
    let mut map = load_compliance(&conn)?;
    Ok(map
        .remove(day_key)
        .unwrap_or_else(|| ComplianceDay::empty(day_key, &now_iso())))
}

pub fn set_supplement_taken(
    ctx: &CoachContext,
    day_key: &str,
    supplement_id: &str,
    taken: bool,
) -> ToolResult<ComplianceDay> {
    set_supplement_taken_at(ctx, day_key, supplement_id, taken, &now_iso())
}

fn set_supplement_taken_at(
    ctx: &CoachContext,
    day_key: &str,
    supplement_id: &str,
    taken: bool,
    now: &str,
) -> ToolResult<ComplianceDay> {
    require_day_key(day_key)?;
    if supplement_id.trim().is_empty() {
        return Err(ToolError::validation("supplement_id cannot be empty"));
    }

    let day = ctx.database.with_transaction(|tx| {
        let mut map = load_compliance(tx)?;
        let day = map
            .entry(day_key.to_string())
            .or_insert_with(|| ComplianceDay::empty(day_key, now));
        day.set_taken(supplement_id, taken, now);
        let day = day.clone();
        save_document(tx, COMPLIANCE_KEY, &map)?;
        Ok::<_, ToolError>(day)
    })?;

    tracing::debug!(day_key, supplement_id, taken, "supplement intake recorded");
    Ok(day)
}

/// Day keys with recorded intake, newest first
pub fn compliance_days(ctx: &CoachContext) -> ToolResult<Vec<String>> {
    let conn = ctx.database.get_conn()?;
    Ok(load_compliance(&conn)?.into_keys().rev().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::context;
    use serde_json::json;

    fn check_in(id: &str, sleep: f64) -> Value {
        json!({
            "id": id, "dateISO": "2025-05-01",
            "sleep": sleep, "stress": 4, "energy": 6, "nutritionAdherence": 8
        })
    }

    #[test]
    fn test_domain_names() {
        assert_eq!("check-ins".parse::<JournalDomain>().unwrap(), JournalDomain::CheckIns);
        assert_eq!(" Workout_Logs ".parse::<JournalDomain>().unwrap(), JournalDomain::WorkoutLogs);
        assert!(matches!("sleep".parse::<JournalDomain>(), Err(ToolError::Validation(_))));
    }

    #[test]
    fn test_add_update_delete() {
        let ctx = context();
        let domain = JournalDomain::CheckIns;

        change_journal(&ctx, domain, JournalChange::Add(check_in("a", 7.0))).unwrap();
        change_journal(&ctx, domain, JournalChange::Add(check_in("b", 5.0))).unwrap();

        let invalid = change_journal(&ctx, domain, JournalChange::Add(check_in("c", 0.0)));
        assert!(matches!(invalid, Err(ToolError::Validation(_))));
        let duplicate = change_journal(&ctx, domain, JournalChange::Add(check_in("a", 6.0)));
        assert!(matches!(duplicate, Err(ToolError::Validation(_))));

        change_journal(&ctx, domain, JournalChange::Update(check_in("a", 9.0))).unwrap();
        let a = get_journal_record(&ctx, domain, "a").unwrap();
        assert_eq!(a["sleep"], json!(9.0));

        let missing = change_journal(&ctx, domain, JournalChange::Update(check_in("z", 9.0)));
        assert!(matches!(missing, Err(ToolError::RecordNotFound { .. })));

        let after = change_journal(&ctx, domain, JournalChange::Delete("a".into())).unwrap();
        assert_eq!(after.total, 1);
        assert_eq!(after.records[0]["id"], json!("b"));
        assert!(matches!(
            get_journal_record(&ctx, domain, "a"),
            Err(ToolError::RecordNotFound { .. })
        ));
    }

    #[test]
    fn test_personal_info_round_trip() {
        let ctx = context();
        assert_eq!(get_personal_info(&ctx).unwrap(), PersonalInfo::default());

        let saved = save_personal_info(&ctx, json!({"firstName": "Sam", "heightCm": "tall"})).unwrap();
        assert_eq!(saved.first_name.as_deref(), Some("Sam"));
        assert_eq!(saved.height_cm, None);
        assert_eq!(get_personal_info(&ctx).unwrap(), saved);

        assert!(matches!(save_personal_info(&ctx, json!([1, 2])), Err(ToolError::Validation(_))));
    }

    fn draft(id: &str, title: &str) -> Value {
        json!({
            "id": id, "createdAtISO": "2025-06-01T07:00:00.000Z", "sessionTitle": title,
            "durationSeconds": 600, "exercises": [{"exerciseId": "bench", "sets": []}]
        })
    }

    #[test]
    fn test_workout_drafts_by_id() {
        let ctx = context();
        save_workout_draft(&ctx, draft("w1", "Push")).unwrap();
        save_workout_draft(&ctx, draft("w2", "Pull")).unwrap();
        save_workout_draft(&ctx, draft("w1", "Push day")).unwrap();

        let w1 = get_workout_draft(&ctx, "w1").unwrap();
        assert_eq!(w1.session_title, "Push day");
        assert_eq!(w1.details["durationSeconds"], json!(600));

        assert!(matches!(save_workout_draft(&ctx, json!({"id": "w3"})), Err(ToolError::Validation(_))));

        let deleted = delete_workout_draft(&ctx, "w1").unwrap();
        assert!(deleted.removed);
        assert!(!delete_workout_draft(&ctx, "w1").unwrap().removed);
        assert!(matches!(get_workout_draft(&ctx, "w1"), Err(ToolError::RecordNotFound { .. })));
        assert_eq!(get_workout_draft(&ctx, "w2").unwrap().session_title, "Pull");
    }

    #[test]
    fn test_legacy_drafts_are_migrated() {
        let ctx = context();
        {
            let conn = ctx.database.get_conn().unwrap();
            conn.execute(
                "INSERT INTO journal_entries (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
                rusqlite::params!["workout_log_drafts", json!({"old": draft("old", "Legs")}).to_string()],
            )
            .unwrap();
        }

        assert_eq!(get_workout_draft(&ctx, "old").unwrap().session_title, "Legs");

        let conn = ctx.database.get_conn().unwrap();
        let legacy: i64 = conn
            .query_row("SELECT COUNT(*) FROM journal_entries WHERE key = 'workout_log_drafts'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(legacy, 0);
    }

    #[test]
    fn test_compliance_days_newest_first() {
        let ctx = context();
        set_supplement_taken_at(&ctx, "2025-06-02", "zinc", true, "2025-06-02T08:00:00.000Z").unwrap();
        set_supplement_taken_at(&ctx, "2025-06-10", "zinc", true, "2025-06-10T08:00:00.000Z").unwrap();
        set_supplement_taken_at(&ctx, "2025-05-30", "zinc", false, "2025-05-30T08:00:00.000Z").unwrap();

        assert_eq!(compliance_days(&ctx).unwrap(), vec!["2025-06-10", "2025-06-02", "2025-05-30"]);
        assert!(matches!(
            set_supplement_taken(&ctx, "June 2nd", "zinc", true),
            Err(ToolError::Validation(_))
        ));
    }

    #[test]
    fn test_retaking_keeps_first_time() {
        let ctx = context();
        set_supplement_taken_at(&ctx, "2025-06-02", "zinc", true, "2025-06-02T08:00:00.000Z").unwrap();
        let day = set_supplement_taken_at(&ctx, "2025-06-02", "zinc", true, "2025-06-02T12:00:00.000Z")
            .unwrap();
        assert_eq!(
            day.taken_by_id["zinc"].taken_at_iso.as_deref(),
            Some("2025-06-02T08:00:00.000Z")
        );

        let stored = get_compliance_day(&ctx, "2025-06-02").unwrap();
        assert_eq!(stored, day);
        assert!(get_compliance_day(&ctx, "2025-06-03").unwrap().taken_by_id.is_empty());
    }
}
