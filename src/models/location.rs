use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::services::geometry::{Centroid, Confidence};

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct LocationPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Derived meeting point of a room's pins. Never persisted.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct OptimalLocation {
    pub optimal_location: LocationPoint,
    pub algorithm: String,
    pub description: String,
    pub pin_count: usize,
    pub low_confidence: bool,
}

impl OptimalLocation {
    pub fn from_centroid(centroid: Centroid, pin_count: usize) -> Self {
        let low_confidence = centroid.confidence == Confidence::Low;
        let description = if low_confidence {
            "Arithmetic mean of pin coordinates; spherical centroid is undefined for these pins"
        } else {
            "Geographic center of all pins"
        };
        Self {
            optimal_location: LocationPoint {
                latitude: centroid.latitude,
                longitude: centroid.longitude,
                kind: "centroid".to_string(),
            },
            algorithm: "centroid".to_string(),
            description: description.to_string(),
            pin_count,
            low_confidence,
        }
    }
}
