use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::models::{ErrorResponse, User, UserCreateRequest};
use crate::AppState;

type ApiResult<T> = Result<(StatusCode, Json<T>), (StatusCode, Json<ErrorResponse>)>;

/// Register a user
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<UserCreateRequest>,
) -> ApiResult<User> {
    let user = state.engine.create_user(&request).await?;
    Ok((StatusCode::OK, Json(user)))
}

pub async fn get_user(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult<User> {
    let user = state.engine.get_user(&user_id).await?;
    Ok((StatusCode::OK, Json(user)))
}
