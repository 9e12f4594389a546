//! Domain layer - Pure business abstractions
//!
//! This layer contains NO framework dependencies (no SeaORM, no Axum).
//! Only trait definitions, domain error types and the recipe/shopping-list
//! business rules.

pub mod errors;
pub mod ingredients;
pub mod repositories;
pub mod shopping_list;

pub use errors::{DomainError, ValidationErrors};
pub use repositories::*;
