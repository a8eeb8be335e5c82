use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers::{
    create_pin, create_room, create_user, diagnostics, get_room, get_user, health_check, list_rooms, nearby_pins,
    optimal_location, ready_check, remove_pin, room_members, room_pins, root, vote_pin,
};
use crate::AppState;

/// Create API routes
pub fn create_api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/v1/diagnostics", get(diagnostics))
        .route("/rooms", post(create_room).get(list_rooms))
        .route("/rooms/:room_id", get(get_room))
        .route("/rooms/:room_id/members", get(room_members))
        .route("/rooms/:room_id/optimal-location", get(optimal_location))
        .route("/rooms/:room_id/pins/nearby", get(nearby_pins))
        .route("/pins", post(create_pin))
        .route("/pins/room/:room_id", get(room_pins))
        .route("/pins/:pin_id", delete(remove_pin))
        .route("/pins/:pin_id/vote", post(vote_pin))
        .route("/users", post(create_user))
        .route("/users/:user_id", get(get_user))
}
