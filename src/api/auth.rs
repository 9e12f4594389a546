use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use crate::api::error::ApiResult;
use crate::infrastructure::auth::{create_jwt, verify_password};
use crate::infrastructure::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    tracing::info!("Login attempt for {}", payload.email);

    let user = match state.user_repo.find_by_email(&payload.email).await? {
        Some(user) => user,
        None => {
            tracing::warn!("Unknown login email: {}", payload.email);
            return Ok((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "detail": "Invalid credentials" })),
            )
                .into_response());
        }
    };

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {
            let token = create_jwt(&user.username, user.id)
                .map_err(crate::domain::DomainError::Internal)?;
            Ok((StatusCode::OK, Json(json!({ "auth_token": token }))).into_response())
        }
        _ => {
            tracing::warn!("Password verification failed for {}", user.username);
            Ok((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "detail": "Invalid credentials" })),
            )
                .into_response())
        }
    }
}

/// Tokens are stateless JWTs; logout only acknowledges.
pub async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}
