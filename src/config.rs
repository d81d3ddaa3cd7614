//! Runtime configuration
//!
//! Read once from the environment at startup.

use std::path::PathBuf;

use thiserror::Error;

/// Reference nutrient codes for energy and macros (kcal, protein, carbs, fat)
pub const DEFAULT_MACRO_CODES: [i64; 4] = [328, 25000, 31000, 32000];

/// Micronutrients tracked in edit views: Mg, Fe, Zn, vitamin D, B1, B2, B3,
/// B5, B6, B9, B12
pub const DEFAULT_MICRO_CODES: [i64; 11] = [
    10120, 10260, 10300, 52100, 56100, 56200, 56310, 56400, 56500, 56700, 56600,
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be an integer, got {value:?}")]
    InvalidInteger { var: &'static str, value: String },

    #[error("{var} must list exactly {expected} codes, got {found}")]
    WrongCodeCount {
        var: &'static str,
        expected: usize,
        found: usize,
    },
}

/// Nutrient codes of the reference dataset used for aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct NutrientCodes {
    pub kcal: i64,
    pub protein: i64,
    pub carbs: i64,
    pub fat: i64,
    pub micros: Vec<i64>,
}

impl Default for NutrientCodes {
    fn default() -> Self {
        let [kcal, protein, carbs, fat] = DEFAULT_MACRO_CODES;
        Self {
            kcal,
            protein,
            carbs,
            fat,
            micros: DEFAULT_MICRO_CODES.to_vec(),
        }
    }
}

impl NutrientCodes {
    pub fn is_micro(&self, code: i64) -> bool {
        self.micros.contains(&code)
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    /// Coach every tool call acts on behalf of
    pub coach_id: i64,
    pub nutrient_codes: NutrientCodes,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let coach_id = match std::env::var("COACHPLAN_COACH_ID") {
            Ok(value) => parse_integer("COACHPLAN_COACH_ID", &value)?,
            Err(_) => 1,
        };

        let mut nutrient_codes = NutrientCodes::default();

        if let Ok(value) = std::env::var("COACHPLAN_MACRO_CODES") {
            let codes = parse_code_list("COACHPLAN_MACRO_CODES", &value)?;
            match codes.as_slice() {
                [kcal, protein, carbs, fat] => {
                    nutrient_codes.kcal = *kcal;
                    nutrient_codes.protein = *protein;
                    nutrient_codes.carbs = *carbs;
                    nutrient_codes.fat = *fat;
                }
                _ => {
                    return Err(ConfigError::WrongCodeCount {
                        var: "COACHPLAN_MACRO_CODES",
                        expected: 4,
                        found: codes.len(),
                    })
                }
            }
        }

        if let Ok(value) = std::env::var("COACHPLAN_MICRO_CODES") {
            nutrient_codes.micros = parse_code_list("COACHPLAN_MICRO_CODES", &value)?;
        }

        Ok(Self {
            database_path: database_path_from_env(),
            coach_id,
            nutrient_codes,
        })
    }
}

/// Database path from the environment, or `data/coachplan.db` at the project root
fn database_path_from_env() -> PathBuf {
    std::env::var("COACHPLAN_DATABASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut path = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));

            // Go up from target/release or target/debug to project root
            if path.ends_with("release") || path.ends_with("debug") {
                if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
                    path = grandparent.to_path_buf();
                }
            }

            path.push("data");
            path.push("coachplan.db");
            path
        })
}

fn parse_integer(var: &'static str, value: &str) -> Result<i64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidInteger {
            var,
            value: value.to_string(),
        })
}

fn parse_code_list(var: &'static str, value: &str) -> Result<Vec<i64>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_integer(var, s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_code_list() {
        let codes = parse_code_list("X", " 328, 25000 ,31000,32000,").unwrap();
        assert_eq!(codes, vec![328, 25000, 31000, 32000]);
        assert!(parse_code_list("X", "328,abc").is_err());
    }

    #[test]
    fn test_default_codes() {
        let codes = NutrientCodes::default();
        assert_eq!(codes.kcal, 328);
        assert_eq!(codes.fat, 32000);
        assert!(codes.is_micro(56600));
        assert!(!codes.is_micro(328));
    }
}
