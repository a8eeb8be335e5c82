use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::StorageError;
use crate::services::geometry::GeometryError;

/// Response for an error
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ErrorResponse {
    pub code: u16,
    pub status: String,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, error: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
        (
            status,
            Json(ErrorResponse {
                code: status.as_u16(),
                status: status.to_string(),
                error: error.into(),
            }),
        )
    }
}

/// Failure of a room synchronization operation.
///
/// These are always reported to the caller that issued the operation and
/// never broadcast to the rest of the room.
#[derive(Debug)]
pub enum SyncError {
    /// Malformed input: empty title, out-of-range coordinates, ...
    Validation(String),
    /// Unknown pin (or room, on the query surface)
    NotFound(String),
    /// Join attempted on a room the persistence layer does not know
    InvalidRoom(String),
    /// Pin or query operation from a connection that has not joined a room
    NotInRoom,
    /// Leave for a connection that is not a member of that room
    NotMember(String),
    /// Optimal location asked for a room without pins
    NoPins(String),
    Storage(StorageError),
    EmptyInput,
}

impl SyncError {
    /// Stable machine readable name, used in websocket error replies.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Validation(_) => "validation_error",
            SyncError::NotFound(_) => "not_found",
            SyncError::InvalidRoom(_) => "invalid_room",
            SyncError::NotInRoom => "not_in_room",
            SyncError::NotMember(_) => "not_member",
            SyncError::NoPins(_) => "no_pins",
            SyncError::Storage(_) => "storage_error",
            SyncError::EmptyInput => "empty_input",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            SyncError::Validation(_) => StatusCode::BAD_REQUEST,
            SyncError::NotFound(_) | SyncError::InvalidRoom(_) | SyncError::NoPins(_) => {
                StatusCode::NOT_FOUND
            }
            SyncError::NotInRoom | SyncError::NotMember(_) => StatusCode::CONFLICT,
            SyncError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            SyncError::EmptyInput => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Validation(msg) => write!(f, "Validation error: {}", msg),
            SyncError::NotFound(what) => write!(f, "{} not found", what),
            SyncError::InvalidRoom(room_id) => write!(f, "Room '{}' does not exist", room_id),
            SyncError::NotInRoom => write!(f, "Connection has not joined a room"),
            SyncError::NotMember(room_id) => write!(f, "Connection is not a member of room '{}'", room_id),
            SyncError::NoPins(room_id) => write!(f, "No pins found in room '{}'", room_id),
            SyncError::Storage(e) => write!(f, "Storage error: {}", e),
            SyncError::EmptyInput => write!(f, "No coordinates to compute from"),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<StorageError> for SyncError {
    fn from(e: StorageError) -> Self {
        SyncError::Storage(e)
    }
}

impl From<GeometryError> for SyncError {
    fn from(e: GeometryError) -> Self {
        match e {
            GeometryError::EmptyInput => SyncError::EmptyInput,
        }
    }
}

impl From<SyncError> for (StatusCode, Json<ErrorResponse>) {
    fn from(e: SyncError) -> Self {
        ErrorResponse::new(e.status_code(), e.to_string())
    }
}
