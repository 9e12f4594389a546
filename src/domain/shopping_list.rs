//! Shopping-list aggregation.
//!
//! Sums ingredient amounts across every recipe in a user's shopping cart,
//! keyed by (ingredient name, unit label) rather than ingredient row id,
//! since two catalog rows can share a name and unit. Output is sorted by
//! name, then unit label.

use std::collections::BTreeMap;

/// One ingredient line as pulled from a cart recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// A merged line of the downloadable shopping list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedLine {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

/// Merge lines by (name, unit) and sum their amounts.
///
/// Amounts are validated positive upstream at the ingredient-line level;
/// totals are widened to i64 so large carts cannot overflow.
pub fn aggregate(lines: impl IntoIterator<Item = IngredientLine>) -> Vec<AggregatedLine> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for line in lines {
        *totals
            .entry((line.name, line.measurement_unit))
            .or_default() += i64::from(line.amount);
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), total)| AggregatedLine {
            name,
            measurement_unit,
            total,
        })
        .collect()
}

/// Render the aggregated list as the body of shopping_cart.txt.
pub fn render(lines: &[AggregatedLine]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&format!(
            "- {} [{}]: {}\n",
            line.name, line.measurement_unit, line.total
        ));
    }
    out
}
