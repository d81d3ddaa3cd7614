//! CoachPlan Library
//!
//! Food catalogue, custom foods, meal and diet templates with nutrient
//! aggregation, and the athlete journal store.

pub mod build_info;
pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod scope;
pub mod tools;
