use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use crate::api::error::ApiResult;
use crate::domain::DomainError;
use crate::infrastructure::AppState;

pub async fn list_tags(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let tags = state.tag_repo.find_all().await?;
    Ok(Json(tags))
}

pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    let tag = state
        .tag_repo
        .find_by_id(id)
        .await?
        .ok_or(DomainError::NotFound)?;
    Ok(Json(tag))
}
