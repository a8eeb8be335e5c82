use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use utoipa::{IntoParams, ToSchema};

use crate::models::SyncError;
use crate::store::voters::{VoteAction, VoterSet};

/// A user placed point of interest inside a room.
///
/// Coordinates never change after creation; moving a pin is a remove
/// followed by an add.
#[derive(Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct Pin {
    pub id: String,
    pub room_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub voted_by: VoterSet,
}

impl Pin {
    pub fn new(room_id: &str, new_pin: NewPin) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            room_id: room_id.to_string(),
            title: new_pin.title,
            description: new_pin.description,
            latitude: new_pin.latitude,
            longitude: new_pin.longitude,
            created_by: new_pin.created_by,
            created_at: Utc::now(),
            voted_by: VoterSet::new(),
        }
    }

    pub fn votes(&self) -> usize {
        self.voted_by.len()
    }

    pub fn toggle_vote(&mut self, user_id: &str) -> VoteAction {
        self.voted_by.toggle(user_id)
    }
}

// The vote count is derived from the voter set, so it is written out
// alongside it rather than stored.
impl Serialize for Pin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Pin", 10)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("room_id", &self.room_id)?;
        s.serialize_field("title", &self.title)?;
        s.serialize_field("description", &self.description)?;
        s.serialize_field("latitude", &self.latitude)?;
        s.serialize_field("longitude", &self.longitude)?;
        s.serialize_field("created_by", &self.created_by)?;
        s.serialize_field("created_at", &self.created_at)?;
        s.serialize_field("votes", &self.votes())?;
        s.serialize_field("voted_by", &self.voted_by)?;
        s.end()
    }
}

/// Validated input for a new pin.
#[derive(Debug, Clone)]
pub struct NewPin {
    pub title: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_by: String,
}

impl NewPin {
    pub fn parse(
        title: &str,
        description: Option<&str>,
        latitude: f64,
        longitude: f64,
        created_by: &str,
    ) -> Result<Self, SyncError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(SyncError::Validation("Pin title cannot be empty".to_string()));
        }
        validate_coordinate(latitude, longitude)?;
        Ok(Self {
            title: title.to_string(),
            description: description.unwrap_or_default().trim().to_string(),
            latitude,
            longitude,
            created_by: created_by.to_string(),
        })
    }
}

pub fn validate_coordinate(latitude: f64, longitude: f64) -> Result<(), SyncError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(SyncError::Validation(format!(
            "Latitude {} is outside [-90, 90]",
            latitude
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(SyncError::Validation(format!(
            "Longitude {} is outside [-180, 180]",
            longitude
        )));
    }
    Ok(())
}

/// Request payload for creating a pin
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct PinCreateRequest {
    pub room_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub created_by: String,
}

impl PinCreateRequest {
    pub fn to_new_pin(&self) -> Result<NewPin, SyncError> {
        NewPin::parse(
            &self.title,
            self.description.as_deref(),
            self.latitude,
            self.longitude,
            &self.created_by,
        )
    }
}

#[derive(Deserialize, IntoParams, Debug)]
#[into_params(parameter_in = Query)]
pub struct VoteQuery {
    pub user_id: String,
}

/// Response returned after toggling a vote
#[derive(Serialize, Deserialize, ToSchema)]
pub struct VoteResponse {
    pub message: String,
    pub action: VoteAction,
    pub votes: usize,
    pub pin: Pin,
}

/// Response returned after removing a pin
#[derive(Serialize, Deserialize, ToSchema)]
pub struct PinRemovedResponse {
    pub id: String,
    pub title: String,
}

#[derive(Deserialize, IntoParams, Debug)]
#[into_params(parameter_in = Query)]
pub struct NearbyQuery {
    pub latitude: f64,
    pub longitude: f64,
    /// Search radius in meters
    pub max_distance: Option<f64>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct NearbyPin {
    pub distance_m: f64,
    pub pin: Pin,
}

/// Pins near a point, nearest first
#[derive(Serialize, Deserialize, ToSchema)]
pub struct NearbyPinsResponse {
    pub pins: Vec<NearbyPin>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_title_is_rejected() {
        let err = NewPin::parse("   ", None, 0.0, 0.0, "ann").unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        assert!(NewPin::parse("Cafe", None, 90.5, 0.0, "ann").is_err());
        assert!(NewPin::parse("Cafe", None, 0.0, -180.1, "ann").is_err());
        assert!(NewPin::parse("Cafe", None, f64::NAN, 0.0, "ann").is_err());
        assert!(NewPin::parse("Cafe", None, -90.0, 180.0, "ann").is_ok());
    }

    #[test]
    fn serialized_pin_carries_vote_count() {
        let new_pin = NewPin::parse("Cafe", Some("corner"), 40.0, -74.0, "ann").unwrap();
        let mut pin = Pin::new("room-1", new_pin);
        pin.toggle_vote("bob");
        pin.toggle_vote("cy");

        let json = serde_json::to_value(&pin).unwrap();
        assert_eq!(json["votes"], 2);
        assert_eq!(json["voted_by"], serde_json::json!(["bob", "cy"]));
        assert_eq!(json["room_id"], "room-1");

        let back: Pin = serde_json::from_value(json).unwrap();
        assert_eq!(back, pin);
    }
}
