use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::models::{
    ErrorResponse, NearbyPinsResponse, NearbyQuery, Pin, PinCreateRequest, PinRemovedResponse, VoteQuery,
    VoteResponse,
};
use crate::store::voters::VoteAction;
use crate::AppState;

type ApiResult<T> = Result<(StatusCode, Json<T>), (StatusCode, Json<ErrorResponse>)>;

const DEFAULT_NEARBY_DISTANCE_M: f64 = 5000.0;

/// Add a pin; every member of the room receives `pin_added`
pub async fn create_pin(State(state): State<AppState>, Json(request): Json<PinCreateRequest>) -> ApiResult<Pin> {
    let new_pin = request.to_new_pin()?;
    let pin = state.engine.add_pin(&request.room_id, new_pin).await?;
    Ok((StatusCode::OK, Json(pin)))
}

/// Pins of a room in insertion order
pub async fn room_pins(State(state): State<AppState>, Path(room_id): Path<String>) -> ApiResult<Vec<Pin>> {
    let pins = state.engine.list_pins(&room_id).await?;
    Ok((StatusCode::OK, Json(pins)))
}

/// Toggle a vote; every member of the room receives `pin_modified`
pub async fn vote_pin(
    State(state): State<AppState>,
    Path(pin_id): Path<String>,
    Query(query): Query<VoteQuery>,
) -> ApiResult<VoteResponse> {
    let (pin, action) = state.engine.vote(&pin_id, &query.user_id).await?;
    let message = match action {
        VoteAction::Added => "Vote added",
        VoteAction::Removed => "Vote removed",
    };
    Ok((
        StatusCode::OK,
        Json(VoteResponse {
            message: message.to_string(),
            action,
            votes: pin.votes(),
            pin,
        }),
    ))
}

/// Remove a pin; every member of the room receives `pin_removed`
pub async fn remove_pin(State(state): State<AppState>, Path(pin_id): Path<String>) -> ApiResult<PinRemovedResponse> {
    let title = state.engine.remove_pin(&pin_id).await?;
    Ok((StatusCode::OK, Json(PinRemovedResponse { id: pin_id, title })))
}

/// Pins of a room near a point
pub async fn nearby_pins(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(query): Query<NearbyQuery>,
) -> ApiResult<NearbyPinsResponse> {
    let max_distance = query.max_distance.unwrap_or(DEFAULT_NEARBY_DISTANCE_M);
    let pins = state
        .engine
        .nearby_pins(&room_id, query.latitude, query.longitude, max_distance)
        .await?;
    let count = pins.len();
    Ok((StatusCode::OK, Json(NearbyPinsResponse { pins, count })))
}
