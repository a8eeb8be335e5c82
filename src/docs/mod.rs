use utoipa::OpenApi;

use crate::models::*;
use crate::store::voters::VoteAction;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Readiness check endpoint
#[utoipa::path(
    get,
    path = "/api/ready",
    responses(
        (status = 200, description = "Storage is reachable", body = HealthResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn ready_check_doc() {}

/// Create a room
#[utoipa::path(
    post,
    path = "/api/rooms",
    request_body = RoomCreateRequest,
    responses(
        (status = 200, description = "Room created", body = Room),
        (status = 400, description = "Invalid room", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn create_room_doc() {}

/// List active rooms
#[utoipa::path(
    get,
    path = "/api/rooms",
    responses(
        (status = 200, description = "Active rooms", body = [Room])
    )
)]
#[allow(dead_code)]
pub async fn list_rooms_doc() {}

/// Get a room with its live members
#[utoipa::path(
    get,
    path = "/api/rooms/{room_id}",
    params(("room_id" = String, Path, description = "Room identifier")),
    responses(
        (status = 200, description = "Room", body = RoomView),
        (status = 404, description = "Room not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn get_room_doc() {}

/// Live members of a room
#[utoipa::path(
    get,
    path = "/api/rooms/{room_id}/members",
    params(("room_id" = String, Path, description = "Room identifier")),
    responses(
        (status = 200, description = "Members", body = RoomMembersResponse),
        (status = 404, description = "Room not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn room_members_doc() {}

/// Optimal meeting point of a room's pins
#[utoipa::path(
    get,
    path = "/api/rooms/{room_id}/optimal-location",
    params(("room_id" = String, Path, description = "Room identifier")),
    responses(
        (status = 200, description = "Spherical centroid of all pins", body = OptimalLocation),
        (status = 404, description = "Room not found or has no pins", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn optimal_location_doc() {}

/// Pins of a room near a point
#[utoipa::path(
    get,
    path = "/api/rooms/{room_id}/pins/nearby",
    params(("room_id" = String, Path, description = "Room identifier"), NearbyQuery),
    responses(
        (status = 200, description = "Pins nearest first", body = NearbyPinsResponse),
        (status = 400, description = "Invalid point or distance", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn nearby_pins_doc() {}

/// Add a pin
#[utoipa::path(
    post,
    path = "/api/pins",
    request_body = PinCreateRequest,
    responses(
        (status = 200, description = "Pin created and broadcast", body = Pin),
        (status = 400, description = "Invalid pin", body = ErrorResponse),
        (status = 404, description = "Room not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn create_pin_doc() {}

/// Pins of a room
#[utoipa::path(
    get,
    path = "/api/pins/room/{room_id}",
    params(("room_id" = String, Path, description = "Room identifier")),
    responses(
        (status = 200, description = "Pins in insertion order", body = [Pin])
    )
)]
#[allow(dead_code)]
pub async fn room_pins_doc() {}

/// Toggle a vote
#[utoipa::path(
    post,
    path = "/api/pins/{pin_id}/vote",
    params(("pin_id" = String, Path, description = "Pin identifier"), VoteQuery),
    responses(
        (status = 200, description = "Vote toggled and broadcast", body = VoteResponse),
        (status = 404, description = "Pin not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn vote_pin_doc() {}

/// Remove a pin
#[utoipa::path(
    delete,
    path = "/api/pins/{pin_id}",
    params(("pin_id" = String, Path, description = "Pin identifier")),
    responses(
        (status = 200, description = "Pin removed and broadcast", body = PinRemovedResponse),
        (status = 404, description = "Pin not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn remove_pin_doc() {}

/// Register a user
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = UserCreateRequest,
    responses(
        (status = 200, description = "User registered", body = User),
        (status = 400, description = "Invalid user", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn create_user_doc() {}

/// User profile with the room the user is connected to
#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(("user_id" = String, Path, description = "User identifier")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn get_user_doc() {}

/// Diagnostics
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics",
    responses(
        (status = 200, description = "Engine and process counters", body = DiagnosticsResponse)
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        ready_check_doc,
        create_room_doc,
        list_rooms_doc,
        get_room_doc,
        room_members_doc,
        optimal_location_doc,
        nearby_pins_doc,
        create_pin_doc,
        room_pins_doc,
        vote_pin_doc,
        remove_pin_doc,
        create_user_doc,
        get_user_doc,
        diagnostics_doc,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            Room,
            RoomCreateRequest,
            RoomView,
            MemberInfo,
            RoomMembersResponse,
            Pin,
            PinCreateRequest,
            VoteResponse,
            VoteAction,
            PinRemovedResponse,
            NearbyPin,
            NearbyPinsResponse,
            OptimalLocation,
            LocationPoint,
            User,
            UserCreateRequest,
            DiagnosticsResponse,
        )
    ),
    tags(
        (name = "api", description = "Room, pin, user and optimal location endpoints")
    )
)]
pub struct ApiDoc;
