use std::collections::HashMap;

use axum::{
    extract::{Path, RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::api::error::{ApiError, ApiResult};
use crate::api::shapes::{brief_payload, recipe_payload, user_payload, RecipeContext, RecipeShape};
use crate::domain::ingredients::{validate_ingredient_list, IngredientAmount};
use crate::domain::{
    shopping_list, DomainError, MarkKind, NewRecipe, RecipeFilter, RecipeRecord, RecipeUpdate,
};
use crate::infrastructure::auth::Claims;
use crate::infrastructure::{media, AppState};

/// Parse the recipe list query string. `tags` may repeat, which rules out
/// the plain `Query` extractor; viewer-relative filters are ignored for
/// anonymous callers.
fn parse_filter(query: Option<&str>, viewer: Option<i32>) -> RecipeFilter {
    let mut filter = RecipeFilter::default();
    let Some(query) = query else {
        return filter;
    };

    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        match key {
            "is_favorited" if value == "1" => filter.favorited_by = viewer,
            "is_in_shopping_cart" if value == "1" => filter.in_cart_of = viewer,
            "author" => {
                if let Ok(id) = value.parse::<i32>() {
                    filter.author = Some(id);
                }
            }
            "tags" if !value.is_empty() => filter.tag_slugs.push(value.to_string()),
            _ => {}
        }
    }
    filter
}

/// Viewer-dependent context of the full recipe shape.
async fn full_context(
    state: &AppState,
    viewer: Option<i32>,
    record: &RecipeRecord,
) -> ApiResult<RecipeContext> {
    let author = match record.author_id {
        Some(author_id) => match state.user_repo.find_by_id(author_id).await? {
            Some(author) => {
                let is_subscribed = match viewer {
                    Some(viewer_id) => {
                        state.subscription_repo.exists(viewer_id, author.id).await?
                    }
                    None => false,
                };
                user_payload(&author, is_subscribed)
            }
            None => Value::Null,
        },
        None => Value::Null,
    };

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer_id) => (
            state
                .mark_repo
                .exists(MarkKind::Favorite, viewer_id, record.id)
                .await?,
            state
                .mark_repo
                .exists(MarkKind::ShoppingCart, viewer_id, record.id)
                .await?,
        ),
        None => (false, false),
    };

    Ok(RecipeContext {
        author,
        is_favorited,
        is_in_shopping_cart,
    })
}

async fn render_full(
    state: &AppState,
    viewer: Option<i32>,
    record: &RecipeRecord,
) -> ApiResult<Value> {
    let context = full_context(state, viewer, record).await?;
    Ok(recipe_payload(RecipeShape::Full, record, Some(&context)))
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    responses(
        (status = 200, description = "Recipe list, filterable by author, tags and viewer marks")
    )
)]
pub async fn list_recipes(
    State(state): State<AppState>,
    claims: Option<Claims>,
    RawQuery(query): RawQuery,
) -> ApiResult<impl IntoResponse> {
    let viewer = claims.map(|c| c.uid);
    let filter = parse_filter(query.as_deref(), viewer);

    let records = state.recipe_repo.find(filter).await?;
    let mut payloads = Vec::with_capacity(records.len());
    for record in &records {
        payloads.push(render_full(&state, viewer, record).await?);
    }
    Ok(Json(payloads))
}

pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    claims: Option<Claims>,
) -> ApiResult<impl IntoResponse> {
    let record = state
        .recipe_repo
        .find_by_id(id)
        .await?
        .ok_or(DomainError::NotFound)?;
    let viewer = claims.map(|c| c.uid);
    Ok(Json(render_full(&state, viewer, &record).await?))
}

#[derive(Deserialize)]
pub struct CreateRecipeRequest {
    name: String,
    text: String,
    cooking_time: i32,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    tags: Vec<i32>,
    #[serde(default)]
    ingredients: Vec<IngredientAmount>,
}

fn validate_cooking_time(cooking_time: i32) -> Result<(), DomainError> {
    if cooking_time < 1 {
        return Err(DomainError::validation(
            "cooking_time",
            "Cooking time must be greater than 0.",
        ));
    }
    Ok(())
}

/// Resolve the submitted tag ids, rejecting unknown ones.
async fn check_tags(state: &AppState, tag_ids: &[i32]) -> Result<(), DomainError> {
    let found = state.tag_repo.find_by_ids(tag_ids).await?;
    for id in tag_ids {
        if !found.iter().any(|t| t.id == *id) {
            return Err(DomainError::validation(
                "tags",
                format!("Tag {} does not exist.", id),
            ));
        }
    }
    Ok(())
}

/// Validate the submitted ingredient list against the catalog.
async fn check_ingredients(
    state: &AppState,
    entries: &[IngredientAmount],
) -> Result<(), DomainError> {
    let ids: Vec<i32> = entries.iter().map(|e| e.id).collect();
    let catalog: HashMap<i32, String> = state
        .ingredient_repo
        .find_by_ids(&ids)
        .await?
        .into_iter()
        .map(|i| (i.id, i.name))
        .collect();
    validate_ingredient_list(entries, &catalog).map_err(DomainError::Validation)
}

fn store_image_field(state: &AppState, data_url: &str) -> Result<String, DomainError> {
    media::store_image(&state.media_root, data_url)
        .map_err(|msg| DomainError::validation("image", msg))
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    responses(
        (status = 201, description = "Recipe created"),
        (status = 400, description = "Validation failure, field-keyed messages"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn create_recipe(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<CreateRecipeRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_cooking_time(payload.cooking_time)?;
    check_tags(&state, &payload.tags).await?;
    check_ingredients(&state, &payload.ingredients).await?;

    let image = match payload.image.as_deref() {
        Some(data_url) => store_image_field(&state, data_url)?,
        None => String::new(),
    };

    let record = state
        .recipe_repo
        .create(
            claims.uid,
            NewRecipe {
                name: payload.name,
                image,
                text: payload.text,
                cooking_time: payload.cooking_time,
                tag_ids: payload.tags,
                ingredients: payload.ingredients,
            },
        )
        .await?;

    let body = render_full(&state, Some(claims.uid), &record).await?;
    Ok((StatusCode::CREATED, Json(body)))
}

#[derive(Deserialize)]
pub struct UpdateRecipeRequest {
    name: Option<String>,
    text: Option<String>,
    cooking_time: Option<i32>,
    image: Option<String>,
    tags: Option<Vec<i32>>,
    ingredients: Option<Vec<IngredientAmount>>,
}

/// Load a recipe and check the caller owns it.
async fn owned_recipe(
    state: &AppState,
    claims: &Claims,
    id: i32,
) -> ApiResult<RecipeRecord> {
    let record = state
        .recipe_repo
        .find_by_id(id)
        .await?
        .ok_or(DomainError::NotFound)?;
    if record.author_id != Some(claims.uid) {
        return Err(ApiError::forbidden());
    }
    Ok(record)
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}",
    params(("id" = i32, Path, description = "Recipe id")),
    responses(
        (status = 200, description = "Recipe updated"),
        (status = 403, description = "Caller is not the author"),
        (status = 404, description = "Recipe not found")
    )
)]
pub async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    claims: Claims,
    Json(payload): Json<UpdateRecipeRequest>,
) -> ApiResult<impl IntoResponse> {
    owned_recipe(&state, &claims, id).await?;

    if let Some(cooking_time) = payload.cooking_time {
        validate_cooking_time(cooking_time)?;
    }
    if let Some(tag_ids) = &payload.tags {
        check_tags(&state, tag_ids).await?;
    }
    if let Some(entries) = &payload.ingredients {
        check_ingredients(&state, entries).await?;
    }
    let image = match payload.image.as_deref() {
        Some(data_url) => Some(store_image_field(&state, data_url)?),
        None => None,
    };

    let record = state
        .recipe_repo
        .update(
            id,
            RecipeUpdate {
                name: payload.name,
                image,
                text: payload.text,
                cooking_time: payload.cooking_time,
                tag_ids: payload.tags,
                ingredients: payload.ingredients,
            },
        )
        .await?;

    Ok(Json(render_full(&state, Some(claims.uid), &record).await?))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    params(("id" = i32, Path, description = "Recipe id")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 403, description = "Caller is not the author"),
        (status = 404, description = "Recipe not found")
    )
)]
pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    claims: Claims,
) -> ApiResult<impl IntoResponse> {
    owned_recipe(&state, &claims, id).await?;
    state.recipe_repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST side of the favorite/shopping-cart toggle: absent -> present.
async fn mark_recipe(
    state: &AppState,
    claims: &Claims,
    id: i32,
    kind: MarkKind,
) -> ApiResult<Value> {
    let brief = state
        .recipe_repo
        .brief(id)
        .await?
        .ok_or(DomainError::NotFound)?;

    // The unique (user, recipe) constraint is the authoritative guard;
    // a duplicate insert comes back as the toggle conflict.
    state.mark_repo.add(kind, claims.uid, brief.id).await?;
    Ok(brief_payload(&brief))
}

/// DELETE side of the toggle: present -> absent.
async fn unmark_recipe(
    state: &AppState,
    claims: &Claims,
    id: i32,
    kind: MarkKind,
) -> ApiResult<()> {
    state
        .recipe_repo
        .brief(id)
        .await?
        .ok_or(DomainError::NotFound)?;
    state.mark_repo.remove(kind, claims.uid, id).await?;
    Ok(())
}

pub async fn add_favorite(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    claims: Claims,
) -> ApiResult<impl IntoResponse> {
    let body = mark_recipe(&state, &claims, id, MarkKind::Favorite).await?;
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    claims: Claims,
) -> ApiResult<impl IntoResponse> {
    unmark_recipe(&state, &claims, id, MarkKind::Favorite).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    claims: Claims,
) -> ApiResult<impl IntoResponse> {
    let body = mark_recipe(&state, &claims, id, MarkKind::ShoppingCart).await?;
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn remove_from_cart(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    claims: Claims,
) -> ApiResult<impl IntoResponse> {
    unmark_recipe(&state, &claims, id, MarkKind::ShoppingCart).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn download_shopping_cart(
    State(state): State<AppState>,
    claims: Claims,
) -> ApiResult<impl IntoResponse> {
    let lines = state.recipe_repo.cart_lines(claims.uid).await?;
    let body = shopping_list::render(&shopping_list::aggregate(lines));

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        "text/plain; charset=utf-8".parse().unwrap(),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        "attachment; filename=shopping_cart.txt".parse().unwrap(),
    );

    Ok((StatusCode::OK, headers, body))
}
