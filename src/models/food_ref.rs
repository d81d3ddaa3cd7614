//! Food reference
//!
//! A template item points at exactly one food: a catalogue entry by code or
//! a coach custom food by id.

use rusqlite::types::Type;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "source_type", content = "id", rename_all = "lowercase")]
pub enum FoodRef {
    Catalog(i64),
    Custom(i64),
}

impl FoodRef {
    pub fn source_type(&self) -> &'static str {
        match self {
            FoodRef::Catalog(_) => "catalog",
            FoodRef::Custom(_) => "custom",
        }
    }

    /// Column values `(source_type, alim_code, custom_food_id)`
    pub fn to_columns(&self) -> (&'static str, Option<i64>, Option<i64>) {
        match *self {
            FoodRef::Catalog(code) => ("catalog", Some(code), None),
            FoodRef::Custom(id) => ("custom", None, Some(id)),
        }
    }

    /// Build from an API-style pair, `None` when the tag is unknown or the
    /// matching reference is missing
    pub fn from_parts(source_type: &str, id: i64) -> Option<Self> {
        match source_type.trim().to_lowercase().as_str() {
            "catalog" => Some(FoodRef::Catalog(id)),
            "custom" => Some(FoodRef::Custom(id)),
            _ => None,
        }
    }

    /// Read from the `source_type`, `alim_code` and `custom_food_id` columns
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let source_type: String = row.get("source_type")?;
        let alim_code: Option<i64> = row.get("alim_code")?;
        let custom_food_id: Option<i64> = row.get("custom_food_id")?;

        match (source_type.as_str(), alim_code, custom_food_id) {
            ("catalog", Some(code), None) => Ok(FoodRef::Catalog(code)),
            ("custom", None, Some(id)) => Ok(FoodRef::Custom(id)),
            _ => Err(rusqlite::Error::FromSqlConversionFailure(
                0,
                Type::Text,
                format!("inconsistent food reference for source_type {:?}", source_type).into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_are_exclusive() {
        assert_eq!(FoodRef::Catalog(13050).to_columns(), ("catalog", Some(13050), None));
        assert_eq!(FoodRef::Custom(4).to_columns(), ("custom", None, Some(4)));
    }

    #[test]
    fn test_from_parts() {
        assert_eq!(FoodRef::from_parts("Catalog", 1), Some(FoodRef::Catalog(1)));
        assert_eq!(FoodRef::from_parts("custom", 2), Some(FoodRef::Custom(2)));
        assert_eq!(FoodRef::from_parts("recipe", 2), None);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(FoodRef::Custom(9)).unwrap();
        assert_eq!(json, serde_json::json!({ "source_type": "custom", "id": 9 }));
    }
}
