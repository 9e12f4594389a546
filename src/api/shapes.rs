//! Explicit response-shape builders.
//!
//! Each endpoint picks its recipe shape through [`RecipeShape`] rather than
//! any runtime serializer dispatch: list/detail/create/update return the full
//! aggregate, the favorite/shopping-cart actions return the compact form.

use serde_json::{json, Value};

use crate::domain::{RecipeBrief, RecipeRecord, User};
use crate::infrastructure::media;

/// Shape of a recipe payload, selected per endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeShape {
    Full,
    Brief,
}

/// Viewer-dependent fields of the full recipe shape.
#[derive(Debug, Clone)]
pub struct RecipeContext {
    pub author: Value,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

pub fn user_payload(user: &User, is_subscribed: bool) -> Value {
    json!({
        "email": user.email,
        "id": user.id,
        "username": user.username,
        "first_name": user.first_name,
        "last_name": user.last_name,
        "is_subscribed": is_subscribed,
    })
}

/// Registration response carries no subscription flag.
pub fn registered_user_payload(user: &User) -> Value {
    json!({
        "email": user.email,
        "id": user.id,
        "username": user.username,
        "first_name": user.first_name,
        "last_name": user.last_name,
    })
}

pub fn brief_payload(brief: &RecipeBrief) -> Value {
    json!({
        "id": brief.id,
        "name": brief.name,
        "image": media::media_url(&brief.image),
        "cooking_time": brief.cooking_time,
    })
}

/// Author payload with recipe briefs and count, used by the subscription
/// listing and the subscribe action response.
pub fn subscription_payload(
    author: &User,
    is_subscribed: bool,
    recipes: &[RecipeBrief],
    recipes_count: u64,
) -> Value {
    json!({
        "email": author.email,
        "id": author.id,
        "username": author.username,
        "first_name": author.first_name,
        "last_name": author.last_name,
        "is_subscribed": is_subscribed,
        "recipes": recipes.iter().map(brief_payload).collect::<Vec<_>>(),
        "recipes_count": recipes_count,
    })
}

pub fn recipe_payload(
    shape: RecipeShape,
    record: &RecipeRecord,
    context: Option<&RecipeContext>,
) -> Value {
    match shape {
        RecipeShape::Brief => json!({
            "id": record.id,
            "name": record.name,
            "image": media::media_url(&record.image),
            "cooking_time": record.cooking_time,
        }),
        RecipeShape::Full => {
            let ingredients: Vec<Value> = record
                .ingredients
                .iter()
                .map(|line| {
                    json!({
                        "id": line.id,
                        "name": line.name,
                        "measurement_unit": line.measurement_unit,
                        "amount": line.amount,
                    })
                })
                .collect();

            json!({
                "id": record.id,
                "tags": record.tags,
                "author": context.map(|c| c.author.clone()).unwrap_or(Value::Null),
                "ingredients": ingredients,
                "is_favorited": context.map(|c| c.is_favorited).unwrap_or(false),
                "is_in_shopping_cart": context.map(|c| c.is_in_shopping_cart).unwrap_or(false),
                "name": record.name,
                "image": media::media_url(&record.image),
                "text": record.text,
                "cooking_time": record.cooking_time,
            })
        }
    }
}
