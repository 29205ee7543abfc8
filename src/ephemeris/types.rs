use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::epoch;

/// Free-form provider fields, kept in document order.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// One parsed OEM feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EphemerisSnapshot {
    pub header: FieldMap,
    pub metadata: FieldMap,
    pub comments: Vec<String>,
    pub state_vectors: Vec<StateVector>,
}

/// Position (km) and velocity (km/s) of the ISS at a single epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct StateVector {
    #[serde(with = "epoch::canonical")]
    #[schema(value_type = String, example = "2024-02-16T12:00:00.000000Z")]
    pub epoch: DateTime<Utc>,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub x_dot: f64,
    pub y_dot: f64,
    pub z_dot: f64,
}

impl EphemerisSnapshot {
    /// First and last epoch of the segment.
    pub fn span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.state_vectors.first()?;
        let last = self.state_vectors.last()?;
        Some((first.epoch, last.epoch))
    }

    pub fn object_name(&self) -> Option<&str> {
        self.metadata.get("OBJECT_NAME").and_then(|v| v.as_str())
    }
}
