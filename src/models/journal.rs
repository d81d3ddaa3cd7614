//! Athlete journal model
//!
//! A key/value store of JSON documents. Each document lives under a
//! versioned key and may still exist under an older, unversioned key; the
//! first load moves it across.
//!
//! Decoding is lenient: a document that is not valid JSON reads as absent,
//! a list record that fails to decode or validate is skipped, and an
//! optional field of the wrong type reads as missing.

use std::collections::BTreeMap;

use rusqlite::{params, Connection};
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::DbResult;

/// Storage key of a journal document, with the key it used to live under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalKey {
    pub current: &'static str,
    pub legacy: Option<&'static str>,
}

impl JournalKey {
    pub const fn new(current: &'static str, legacy: Option<&'static str>) -> Self {
        Self { current, legacy }
    }
}

fn read_raw(conn: &Connection, key: &str) -> DbResult<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM journal_entries WHERE key = ?1")?;
    match stmt.query_row([key], |row| row.get(0)) {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write_raw(conn: &Connection, key: &str, value: &str) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO journal_entries (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        params![key, value],
    )?;
    Ok(())
}

fn remove_raw(conn: &Connection, key: &str) -> DbResult<()> {
    conn.execute("DELETE FROM journal_entries WHERE key = ?1", [key])?;
    Ok(())
}

/// Load a document, decoding it with `parse`.
///
/// When the current key holds nothing usable, the legacy key is tried; a
/// usable legacy document is rewritten under the current key and the legacy
/// key removed. Run inside a transaction.
pub fn load_document<T, F>(conn: &Connection, key: JournalKey, parse: F) -> DbResult<Option<T>>
where
    T: Serialize,
    F: Fn(Value) -> Option<T>,
{
    let decode = |raw: Option<String>| {
        raw.and_then(|text| serde_json::from_str::<Value>(&text).ok())
            .and_then(&parse)
    };

    if let Some(current) = decode(read_raw(conn, key.current)?) {
        return Ok(Some(current));
    }

    let Some(legacy_key) = key.legacy else {
        return Ok(None);
    };
    let Some(legacy) = decode(read_raw(conn, legacy_key)?) else {
        return Ok(None);
    };

    save_document(conn, key, &legacy)?;
    remove_raw(conn, legacy_key)?;
    tracing::info!(from = legacy_key, to = key.current, "migrated legacy journal key");
    Ok(Some(legacy))
}

/// Store a document under the current key
pub fn save_document<T: Serialize>(conn: &Connection, key: JournalKey, value: &T) -> DbResult<()> {
    let text = serde_json::to_string(value)?;
    write_raw(conn, key.current, &text)
}

/// A record of a list-shaped journal document
pub trait JournalRecord: Serialize + DeserializeOwned {
    fn id(&self) -> &str;

    /// Extra checks beyond field types
    fn is_valid(&self) -> bool {
        true
    }
}

/// Decode a JSON array, keeping only records that decode and validate.
/// Anything other than an array is not a list.
pub fn parse_records<R: JournalRecord>(value: Value) -> Option<Vec<R>> {
    match value {
        Value::Array(entries) => Some(
            entries
                .into_iter()
                .filter_map(|entry| serde_json::from_value::<R>(entry).ok())
                .filter(R::is_valid)
                .collect(),
        ),
        _ => None,
    }
}

/// Load a record list; missing or unreadable documents read as empty
pub fn load_records<R: JournalRecord>(conn: &Connection, key: JournalKey) -> DbResult<Vec<R>> {
    Ok(load_document(conn, key, parse_records::<R>)?.unwrap_or_default())
}

/// Optional field that reads as `None` when present with the wrong type
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Finite numbers only
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::<D, f64>(deserializer)?.filter(|n| n.is_finite()))
}

// ============================================================================
// Records
// ============================================================================

/// Photo-journal meal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealEntry {
    pub id: String,
    #[serde(rename = "dateISO")]
    pub date_iso: String,
    #[serde(rename = "type")]
    pub meal_type: String,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub photo_uri: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl JournalRecord for MealEntry {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Body measurements on a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub id: String,
    #[serde(rename = "dateISO")]
    pub date_iso: String,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub waist_cm: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub hips_cm: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub chest_cm: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub arm_cm: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub thigh_cm: Option<f64>,
}

impl JournalRecord for Measurement {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPhoto {
    pub id: String,
    #[serde(rename = "dateISO")]
    pub date_iso: String,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub front_uri: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub side_uri: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub back_uri: Option<String>,
}

impl JournalRecord for ProgressPhoto {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Lowest and highest accepted check-in score
pub const CHECK_IN_SCORE_RANGE: std::ops::RangeInclusive<f64> = 1.0..=10.0;

/// Daily wellbeing check-in; every score must be within 1..=10
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    pub id: String,
    #[serde(rename = "dateISO")]
    pub date_iso: String,
    pub sleep: f64,
    pub stress: f64,
    pub energy: f64,
    pub nutrition_adherence: f64,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub pain_notes: Option<String>,
}

impl JournalRecord for CheckIn {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_valid(&self) -> bool {
        [self.sleep, self.stress, self.energy, self.nutrition_adherence]
            .iter()
            .all(|score| score.is_finite() && CHECK_IN_SCORE_RANGE.contains(score))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplementProtocolItem {
    pub id: String,
    pub nom: String,
    pub dosage: String,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub timing: String,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
}

impl JournalRecord for SupplementProtocolItem {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Completed workout session. Only the identifying fields are typed; the
/// rest of the session is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutLogEntry {
    pub id: String,
    #[serde(rename = "createdAtISO")]
    pub created_at_iso: String,
    pub session_title: String,
    #[serde(flatten)]
    pub details: serde_json::Map<String, Value>,
}

impl JournalRecord for WorkoutLogEntry {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Athlete profile, stored as a single document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub profile_photo_uri: Option<String>,
}

impl PersonalInfo {
    /// Any JSON object reads as personal info; anything else does not
    pub fn parse(value: Value) -> Option<Self> {
        match value {
            Value::Object(_) => serde_json::from_value(value).ok(),
            _ => None,
        }
    }
}

/// Whether one supplement was taken on a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementTaken {
    pub taken: bool,
    #[serde(rename = "takenAtISO", default, skip_serializing_if = "Option::is_none")]
    pub taken_at_iso: Option<String>,
}

/// Supplement intake for one day, keyed `YYYY-MM-DD`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceDay {
    pub day_key: String,
    #[serde(rename = "updatedAtISO")]
    pub updated_at_iso: String,
    #[serde(default)]
    pub taken_by_id: BTreeMap<String, SupplementTaken>,
}

impl ComplianceDay {
    pub fn empty(day_key: &str, now_iso: &str) -> Self {
        Self {
            day_key: day_key.to_string(),
            updated_at_iso: now_iso.to_string(),
            taken_by_id: BTreeMap::new(),
        }
    }

    /// Mark a supplement taken or not. Re-marking as taken keeps the first
    /// intake time; marking as not taken clears it.
    pub fn set_taken(&mut self, supplement_id: &str, taken: bool, now_iso: &str) {
        let state = if taken {
            let first = self
                .taken_by_id
                .get(supplement_id)
                .and_then(|prev| prev.taken_at_iso.clone())
                .unwrap_or_else(|| now_iso.to_string());
            SupplementTaken { taken: true, taken_at_iso: Some(first) }
        } else {
            SupplementTaken { taken: false, taken_at_iso: None }
        };
        self.taken_by_id.insert(supplement_id.to_string(), state);
        self.updated_at_iso = now_iso.to_string();
    }
}

/// Day key to compliance day; unreadable days are dropped
pub type ComplianceMap = BTreeMap<String, ComplianceDay>;

/// Decode a JSON object of keyed entries, dropping entries that fail to
/// decode. Anything other than an object is not a map.
fn parse_keyed<T: DeserializeOwned>(value: Value) -> Option<BTreeMap<String, T>> {
    match value {
        Value::Object(entries) => Some(
            entries
                .into_iter()
                .filter_map(|(key, entry)| serde_json::from_value::<T>(entry).ok().map(|e| (key, e)))
                .collect(),
        ),
        _ => None,
    }
}

pub fn parse_compliance_map(value: Value) -> Option<ComplianceMap> {
    parse_keyed(value)
}

/// In-progress workout session. A draft has the shape of a log entry
/// without the final rating and notes.
pub type WorkoutDraft = WorkoutLogEntry;

/// Draft id to draft
pub type DraftMap = BTreeMap<String, WorkoutDraft>;

pub fn parse_draft_map(value: Value) -> Option<DraftMap> {
    parse_keyed(value)
}
