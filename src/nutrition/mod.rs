//! Nutrition calculation module
//!
//! Composition lookup, quantity scaling and aggregation of macro and
//! micronutrient totals, plus dataset value parsing.

pub mod aggregate;
pub mod decimal;
pub mod resolve;

pub use aggregate::{aggregate, sum_aggregates, Aggregate};
pub use decimal::parse_dataset_decimal;
pub use resolve::{load_resolved_items, ResolvedItem};
