//! Data models
//!
//! Rust structs representing database entities.

mod catalog;
mod custom_food;
mod diet_slot;
mod diet_template;
mod food_ref;
pub mod journal;
mod meal_template;
mod nutrition;
pub mod position;
mod template_item;

pub use catalog::{
    CatalogFood, CatalogFoodHit, CatalogGroup, CatalogSource, Composition, CompositionDetail,
    Constituent,
};
pub use custom_food::{CustomFood, CustomFoodInput};
pub use diet_slot::{default_multiplier, DietSlot, DietSlotInput};
pub use diet_template::{DietTemplate, DietTemplateCreate, DietTemplateUpdate};
pub use food_ref::FoodRef;
pub use meal_template::{MealTemplate, MealTemplateCreate, MealTemplateUpdate};
pub use nutrition::{atwater_kcal, Macros, MicroTotals, Per100g};
pub use position::{validate_reorder, ReorderError, SiblingSet};
pub use template_item::{ItemKind, ItemParent, TemplateItem};
