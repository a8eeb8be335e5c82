use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::models::{ErrorResponse, OptimalLocation, Room, RoomCreateRequest, RoomMembersResponse, RoomView};
use crate::AppState;

type ApiResult<T> = Result<(StatusCode, Json<T>), (StatusCode, Json<ErrorResponse>)>;

/// Create a room
pub async fn create_room(
    State(state): State<AppState>,
    Json(request): Json<RoomCreateRequest>,
) -> ApiResult<Room> {
    let room = state.engine.create_room(&request).await?;
    Ok((StatusCode::OK, Json(room)))
}

/// List active rooms
pub async fn list_rooms(State(state): State<AppState>) -> ApiResult<Vec<Room>> {
    let rooms = state.engine.list_rooms().await?;
    Ok((StatusCode::OK, Json(rooms)))
}

/// Get a room with its live members
pub async fn get_room(State(state): State<AppState>, Path(room_id): Path<String>) -> ApiResult<RoomView> {
    let view = state.engine.get_room(&room_id).await?;
    Ok((StatusCode::OK, Json(view)))
}

/// Live membership of a room
pub async fn room_members(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> ApiResult<RoomMembersResponse> {
    // 404 for rooms that do not exist
    let view = state.engine.get_room(&room_id).await?;
    let count = view.members.len();
    Ok((
        StatusCode::OK,
        Json(RoomMembersResponse {
            room_id,
            members: view.members,
            count,
        }),
    ))
}

/// Optimal meeting point for all pins in a room
pub async fn optimal_location(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> ApiResult<OptimalLocation> {
    let location = state.engine.optimal_location(&room_id).await?;
    info!(
        "Optimal location for room {} computed from {} pins",
        room_id, location.pin_count
    );
    Ok((StatusCode::OK, Json(location)))
}
