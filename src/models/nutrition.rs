//! Shared nutrition data structures
//!
//! Used by custom foods, template items, edit views and aggregation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Macro totals (kcal and grams)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub kcal: f64,
    pub protein: f64, // grams
    pub carbs: f64,   // grams
    pub fat: f64,     // grams
}

impl Macros {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Scale macro values by a multiplier
    pub fn scale(&self, multiplier: f64) -> Self {
        Self {
            kcal: self.kcal * multiplier,
            protein: self.protein * multiplier,
            carbs: self.carbs * multiplier,
            fat: self.fat * multiplier,
        }
    }

    pub fn add(&self, other: &Macros) -> Self {
        Self {
            kcal: self.kcal + other.kcal,
            protein: self.protein + other.protein,
            carbs: self.carbs + other.carbs,
            fat: self.fat + other.fat,
        }
    }
}

impl std::ops::Add for Macros {
    type Output = Macros;

    fn add(self, other: Macros) -> Macros {
        Macros::add(&self, &other)
    }
}

impl std::ops::Mul<f64> for Macros {
    type Output = Macros;

    fn mul(self, multiplier: f64) -> Macros {
        self.scale(multiplier)
    }
}

impl std::iter::Sum for Macros {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Macros::zero(), |acc, m| acc + m)
    }
}

/// Per-100 g values as stored; `None` means "not determined"
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Per100g {
    pub kcal: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
}

impl Per100g {
    /// Resolve to summable macros, missing values count as zero
    pub fn to_macros(&self) -> Macros {
        Macros {
            kcal: self.kcal.unwrap_or(0.0),
            protein: self.protein.unwrap_or(0.0),
            carbs: self.carbs.unwrap_or(0.0),
            fat: self.fat.unwrap_or(0.0),
        }
    }

    /// Same as [`Per100g::to_macros`], but a missing kcal is derived from
    /// the Atwater factors of the other three macros
    pub fn to_macros_with_derived_kcal(&self) -> Macros {
        let mut macros = self.to_macros();
        if self.kcal.is_none() {
            macros.kcal = atwater_kcal(macros.protein, macros.carbs, macros.fat);
        }
        macros
    }
}

/// kcal from protein, carbohydrate and fat grams (4/4/9)
pub fn atwater_kcal(protein: f64, carbs: f64, fat: f64) -> f64 {
    protein * 4.0 + carbs * 4.0 + fat * 9.0
}

/// Micronutrient totals keyed by nutrient code.
///
/// Built from a whitelist so every tracked code is present, never null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MicroTotals(BTreeMap<i64, f64>);

impl MicroTotals {
    /// Totals with every whitelisted code at zero
    pub fn zeroed(codes: &[i64]) -> Self {
        Self(codes.iter().map(|&code| (code, 0.0)).collect())
    }

    /// Add an amount to a tracked code; untracked codes are ignored
    pub fn add_amount(&mut self, code: i64, amount: f64) {
        if let Some(total) = self.0.get_mut(&code) {
            *total += amount;
        }
    }

    /// Merge another set of totals into this one
    pub fn merge(&mut self, other: &MicroTotals) {
        for (&code, &amount) in &other.0 {
            self.add_amount(code, amount);
        }
    }

    pub fn get(&self, code: i64) -> f64 {
        self.0.get(&code).copied().unwrap_or(0.0)
    }

    pub fn codes(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macros_sum_and_scale() {
        let a = Macros { kcal: 100.0, protein: 10.0, carbs: 5.0, fat: 2.0 };
        let b = Macros { kcal: 50.0, protein: 1.0, carbs: 8.0, fat: 0.5 };
        let total: Macros = vec![a, b * 2.0].into_iter().sum();
        assert!((total.kcal - 200.0).abs() < 1e-9);
        assert!((total.protein - 12.0).abs() < 1e-9);
        assert!((total.carbs - 21.0).abs() < 1e-9);
        assert!((total.fat - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_kcal_is_derived() {
        let per100 = Per100g { kcal: None, protein: Some(10.0), carbs: Some(20.0), fat: None };
        assert!((per100.to_macros().kcal - 0.0).abs() < 1e-9);
        assert!((per100.to_macros_with_derived_kcal().kcal - 120.0).abs() < 1e-9);

        let explicit = Per100g { kcal: Some(99.0), ..per100 };
        assert!((explicit.to_macros_with_derived_kcal().kcal - 99.0).abs() < 1e-9);
    }

    #[test]
    fn test_micro_totals_default_to_zero() {
        let mut micros = MicroTotals::zeroed(&[10120, 10260]);
        micros.add_amount(10120, 3.5);
        micros.add_amount(99999, 1.0);
        assert_eq!(micros.len(), 2);
        assert!((micros.get(10120) - 3.5).abs() < 1e-9);
        assert_eq!(micros.get(10260), 0.0);
        assert_eq!(micros.get(99999), 0.0);
    }
}
