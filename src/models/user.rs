use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::SyncError;

/// Registered user profile.
///
/// `current_room` is not stored: it is filled from live membership when the
/// profile is read, and is `None` while the user is not in any room.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub current_room: Option<String>,
}

impl User {
    pub fn new(request: &UserCreateRequest) -> Result<Self, SyncError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(SyncError::Validation("User name cannot be empty".to_string()));
        }
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: request.email.as_deref().unwrap_or_default().trim().to_string(),
            avatar: request.avatar.as_deref().unwrap_or_default().trim().to_string(),
            current_room: None,
        })
    }
}

/// Request payload for registering a user
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct UserCreateRequest {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}
