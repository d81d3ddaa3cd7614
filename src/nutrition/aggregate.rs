//! Macro and micronutrient aggregation
//!
//! Pure arithmetic over resolved items: every per-100 g value is scaled by
//! `quantity_g / 100` and summed. Nothing is rounded here.

use serde::Serialize;

use crate::models::{Macros, MicroTotals};
use super::resolve::ResolvedItem;

/// Totals for one list of items
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregate {
    pub totals: Macros,
    pub micros: MicroTotals,
}

impl Aggregate {
    /// Empty totals with every tracked micro at zero
    pub fn zeroed(micro_codes: &[i64]) -> Self {
        Self {
            totals: Macros::zero(),
            micros: MicroTotals::zeroed(micro_codes),
        }
    }

    pub fn merge(&mut self, other: &Aggregate) {
        self.totals = self.totals + other.totals;
        self.micros.merge(&other.micros);
    }
}

impl ResolvedItem {
    /// Ratio applied to per-100 g values
    pub fn factor(&self) -> f64 {
        self.quantity_g / 100.0
    }

    /// Macro contribution of this item
    pub fn macros(&self) -> Macros {
        self.macros_100g.scale(self.factor())
    }
}

/// Sum items into macro totals and tracked micro totals
pub fn aggregate(items: &[ResolvedItem], micro_codes: &[i64]) -> Aggregate {
    let mut result = Aggregate::zeroed(micro_codes);
    for item in items {
        result.totals = result.totals + item.macros();
        let factor = item.factor();
        for &(code, per_100g) in &item.micros_100g {
            result.micros.add_amount(code, per_100g * factor);
        }
    }
    result
}

/// Day totals: the sum of every slot's own totals
pub fn sum_aggregates<'a, I>(parts: I, micro_codes: &[i64]) -> Aggregate
where
    I: IntoIterator<Item = &'a Aggregate>,
{
    parts
        .into_iter()
        .fold(Aggregate::zeroed(micro_codes), |mut acc, part| {
            acc.merge(part);
            acc
        })
}
