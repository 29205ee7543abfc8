use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/reverse";
pub const NO_LOCATION_DATA: &str = "No location data";

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Error retrieving address: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Error retrieving address: geocoder returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

/// Reverse geocoding: coordinates to a place name.
///
/// A lookup that succeeds without a match yields [`NO_LOCATION_DATA`].
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<String, GeocodeError>;
}

/// Client for a Nominatim-compatible `/reverse` endpoint.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(
        url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<String, GeocodeError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            log::error!("Geocoder returned HTTP {}", response.status());
            return Err(GeocodeError::Status(response.status()));
        }

        let body: ReverseResponse = response.json().await?;
        Ok(address_or_sentinel(body))
    }
}

fn address_or_sentinel(response: ReverseResponse) -> String {
    match response.display_name {
        Some(name) if !name.trim().is_empty() => name,
        _ => NO_LOCATION_DATA.to_string(),
    }
}
