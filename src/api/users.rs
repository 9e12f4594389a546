use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::api::error::ApiResult;
use crate::api::shapes::{registered_user_payload, subscription_payload, user_payload};
use crate::domain::{DomainError, NewUser, ValidationErrors};
use crate::infrastructure::auth::{
    hash_password, validate_password_strength, verify_password, Claims,
};
use crate::infrastructure::AppState;

fn valid_username_chars(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    email: String,
    username: String,
    first_name: String,
    last_name: String,
    password: String,
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let username = payload.username.to_lowercase();
    let mut errors = ValidationErrors::new();

    if !payload.email.contains('@') {
        errors.push("email", "Enter a valid email address.");
    } else if state
        .user_repo
        .find_by_email(&payload.email)
        .await?
        .is_some()
    {
        errors.push("email", format!("Email {} already exists.", payload.email));
    }

    if username.is_empty() || !valid_username_chars(&username) {
        errors.push(
            "username",
            "Enter a valid username: letters, digits and @/./+/-/_ only.",
        );
    } else if state.user_repo.find_by_username(&username).await?.is_some() {
        errors.push(
            "username",
            format!("A user with username {} already exists.", username),
        );
    }

    if let Err(messages) = validate_password_strength(&payload.password) {
        for message in messages {
            errors.push("password", message);
        }
    }

    if !errors.is_empty() {
        return Err(DomainError::Validation(errors).into());
    }

    let password_hash = hash_password(&payload.password).map_err(DomainError::Internal)?;
    let user = state
        .user_repo
        .create(NewUser {
            email: payload.email,
            username,
            first_name: payload.first_name,
            last_name: payload.last_name,
            password_hash,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(registered_user_payload(&user))))
}

pub async fn list_users(
    State(state): State<AppState>,
    claims: Option<Claims>,
) -> ApiResult<impl IntoResponse> {
    let viewer = claims.map(|c| c.uid);
    let users = state.user_repo.find_all().await?;

    let mut payloads: Vec<Value> = Vec::with_capacity(users.len());
    for user in &users {
        let is_subscribed = match viewer {
            Some(viewer_id) => state.subscription_repo.exists(viewer_id, user.id).await?,
            None => false,
        };
        payloads.push(user_payload(user, is_subscribed));
    }
    Ok(Json(payloads))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    claims: Option<Claims>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .user_repo
        .find_by_id(id)
        .await?
        .ok_or(DomainError::NotFound)?;

    let is_subscribed = match claims {
        Some(claims) => state.subscription_repo.exists(claims.uid, user.id).await?,
        None => false,
    };
    Ok(Json(user_payload(&user, is_subscribed)))
}

pub async fn me(
    State(state): State<AppState>,
    claims: Claims,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .user_repo
        .find_by_id(claims.uid)
        .await?
        .ok_or(DomainError::NotFound)?;
    Ok(Json(user_payload(&user, false)))
}

#[derive(Deserialize)]
pub struct SetPasswordRequest {
    current_password: Option<String>,
    new_password: Option<String>,
}

pub async fn set_password(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<SetPasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .user_repo
        .find_by_id(claims.uid)
        .await?
        .ok_or(DomainError::NotFound)?;

    let current = payload.current_password.unwrap_or_default();
    if !verify_password(&current, &user.password_hash).unwrap_or(false) {
        return Err(
            DomainError::validation("current_password", "Current password is incorrect.").into(),
        );
    }

    let new_password = match payload.new_password {
        Some(p) if !p.is_empty() => p,
        _ => {
            return Err(
                DomainError::validation("new_password", "This field is required.").into(),
            );
        }
    };
    if let Err(messages) = validate_password_strength(&new_password) {
        let mut errors = ValidationErrors::new();
        for message in messages {
            errors.push("new_password", message);
        }
        return Err(DomainError::Validation(errors).into());
    }

    let password_hash = hash_password(&new_password).map_err(DomainError::Internal)?;
    state.user_repo.update_password(user.id, password_hash).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct SubscriptionsQuery {
    recipes_limit: Option<String>,
}

/// Cap on recipe briefs per author, taken from a digits-only query value.
fn parse_recipes_limit(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|v| v.parse::<u64>().ok()).filter(|&n| n > 0)
}

pub async fn subscriptions(
    State(state): State<AppState>,
    claims: Claims,
    Query(query): Query<SubscriptionsQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = parse_recipes_limit(query.recipes_limit.as_deref());
    let authors = state.subscription_repo.authors_of(claims.uid).await?;

    let mut payloads: Vec<Value> = Vec::with_capacity(authors.len());
    for author in &authors {
        let recipes = state.user_repo.author_recipes(author.id, limit).await?;
        let count = state.user_repo.recipes_count(author.id).await?;
        payloads.push(subscription_payload(author, true, &recipes, count));
    }
    Ok(Json(payloads))
}

pub async fn subscribe(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    let author = state
        .user_repo
        .find_by_id(id)
        .await?
        .ok_or(DomainError::NotFound)?;

    if author.id == claims.uid {
        return Err(DomainError::Conflict(
            "You cannot subscribe to yourself.".to_string(),
        )
        .into());
    }

    state.subscription_repo.add(claims.uid, author.id).await?;

    let recipes = state.user_repo.author_recipes(author.id, None).await?;
    let count = state.user_repo.recipes_count(author.id).await?;
    Ok((
        StatusCode::OK,
        Json(subscription_payload(&author, true, &recipes, count)),
    ))
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    let author = state
        .user_repo
        .find_by_id(id)
        .await?
        .ok_or(DomainError::NotFound)?;

    state.subscription_repo.remove(claims.uid, author.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
