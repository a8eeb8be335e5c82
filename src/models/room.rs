use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::SyncError;

/// Durable room record. Live membership is tracked separately and never
/// persisted.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct Room {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Room {
    pub fn new(request: &RoomCreateRequest) -> Result<Self, SyncError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(SyncError::Validation("Room name cannot be empty".to_string()));
        }
        if request.created_by.trim().is_empty() {
            return Err(SyncError::Validation("Room creator cannot be empty".to_string()));
        }
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: request.description.clone().unwrap_or_default(),
            created_by: request.created_by.clone(),
            created_at: Utc::now(),
            is_active: true,
        })
    }
}

/// Request payload for creating a room
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct RoomCreateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_by: String,
}

/// A live membership entry
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct MemberInfo {
    pub connection_id: String,
    pub display_name: String,
    pub user_id: String,
}

/// Room record together with who is currently connected to it
#[derive(Serialize, Deserialize, ToSchema)]
pub struct RoomView {
    #[serde(flatten)]
    pub room: Room,
    pub members: Vec<MemberInfo>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RoomMembersResponse {
    pub room_id: String,
    pub members: Vec<MemberInfo>,
    pub count: usize,
}
