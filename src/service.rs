use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use utoipa::ToSchema;

use crate::cache::{CacheGateway, GatewayError};
use crate::ephemeris::{find_exact, find_nearest, EphemerisSnapshot, FieldMap, StateVector};
use crate::geocode::{GeocodeError, Geocoder};
use crate::geodesy::{geodetic, speed};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Cache(#[from] GatewayError),
    #[error(transparent)]
    Geocode(#[from] GeocodeError),
    #[error("Epoch not found")]
    NotFound,
    #[error("No state vectors available")]
    EmptyDataset,
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SpeedView {
    pub speed: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct LocationView {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub geoposition: String,
}

/// Everything known about one epoch.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct EpochView {
    #[serde(flatten)]
    pub state: StateVector,
    pub speed: f64,
    #[serde(flatten)]
    pub location: LocationView,
}

/// Read access to the ISS ephemeris with derived quantities.
pub struct IssService {
    gateway: CacheGateway,
    geocoder: Arc<dyn Geocoder>,
}

impl IssService {
    pub fn new(gateway: CacheGateway, geocoder: Arc<dyn Geocoder>) -> Self {
        Self { gateway, geocoder }
    }

    pub async fn snapshot(&self) -> ServiceResult<Arc<EphemerisSnapshot>> {
        Ok(self.gateway.current().await?.snapshot)
    }

    pub async fn header(&self) -> ServiceResult<FieldMap> {
        Ok(self.snapshot().await?.header.clone())
    }

    pub async fn metadata(&self) -> ServiceResult<FieldMap> {
        Ok(self.snapshot().await?.metadata.clone())
    }

    pub async fn comments(&self) -> ServiceResult<Vec<String>> {
        Ok(self.snapshot().await?.comments.clone())
    }

    pub async fn epoch(&self, epoch: &DateTime<Utc>) -> ServiceResult<StateVector> {
        let snapshot = self.snapshot().await?;
        find_exact(&snapshot.state_vectors, epoch)
            .cloned()
            .ok_or(ServiceError::NotFound)
    }

    pub async fn speed(&self, epoch: &DateTime<Utc>) -> ServiceResult<SpeedView> {
        let vector = self.epoch(epoch).await?;
        Ok(SpeedView {
            speed: speed(vector.x_dot, vector.y_dot, vector.z_dot),
        })
    }

    pub async fn location(&self, epoch: &DateTime<Utc>) -> ServiceResult<LocationView> {
        let vector = self.epoch(epoch).await?;
        self.locate(&vector).await
    }

    pub async fn now(&self) -> ServiceResult<EpochView> {
        self.nearest(&Utc::now()).await
    }

    /// Full view of the vector closest to `reference`.
    pub async fn nearest(&self, reference: &DateTime<Utc>) -> ServiceResult<EpochView> {
        let snapshot = self.snapshot().await?;
        let state = find_nearest(&snapshot.state_vectors, reference)
            .cloned()
            .ok_or(ServiceError::EmptyDataset)?;

        let location = self.locate(&state).await?;
        Ok(EpochView {
            speed: speed(state.x_dot, state.y_dot, state.z_dot),
            state,
            location,
        })
    }

    async fn locate(&self, vector: &StateVector) -> ServiceResult<LocationView> {
        let position = geodetic(vector);
        let geoposition = self
            .geocoder
            .reverse(position.latitude_deg, position.longitude_deg)
            .await
            .map_err(|e| {
                log::error!("Error in reverse geocoding: {}", e);
                e
            })?;

        Ok(LocationView {
            latitude: position.latitude_deg,
            longitude: position.longitude_deg,
            altitude: position.altitude_km,
            geoposition,
        })
    }
}
