//! Ingredient-list validation for recipe create/update.
//!
//! A submitted recipe carries a list of (ingredient id, amount) pairs. The
//! list must be non-empty, every id must resolve to a catalog ingredient,
//! every amount must be at least 1, and no id may repeat. The first violation
//! found rejects the whole list.

use std::collections::HashMap;

use serde::Deserialize;

use super::errors::ValidationErrors;

/// One submitted (ingredient, amount) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IngredientAmount {
    pub id: i32,
    pub amount: i32,
}

/// Validate a submitted ingredient list against the catalog.
///
/// `catalog` maps ingredient id to name for the ids that exist; names are
/// only used to word the error messages.
pub fn validate_ingredient_list(
    entries: &[IngredientAmount],
    catalog: &HashMap<i32, String>,
) -> Result<(), ValidationErrors> {
    if entries.is_empty() {
        return Err(ValidationErrors::single(
            "ingredients",
            "This list may not be empty.",
        ));
    }

    let mut seen: Vec<i32> = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = match catalog.get(&entry.id) {
            Some(name) => name,
            None => {
                return Err(ValidationErrors::single(
                    "ingredients",
                    format!("Ingredient {} does not exist.", entry.id),
                ));
            }
        };
        if entry.amount < 1 {
            return Err(ValidationErrors::single(
                "amount",
                format!("Provide a positive amount for {}.", name),
            ));
        }
        if seen.contains(&entry.id) {
            return Err(ValidationErrors::single(
                "ingredients",
                format!("Remove duplicated ingredients ({}).", name),
            ));
        }
        seen.push(entry.id);
    }

    Ok(())
}
