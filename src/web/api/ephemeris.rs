use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};

use crate::ephemeris::{epoch::parse_epoch, FieldMap, StateVector};
use crate::service::{EpochView, LocationView, SpeedView};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::api::params::{EpochsQuery, Page};
use crate::web::state::AppState;

fn parse_epoch_param(raw: &str) -> ApiResult<DateTime<Utc>> {
    parse_epoch(raw).map_err(|_| {
        ApiError::InvalidInput(format!(
            "Invalid date format for epoch: {raw}. Please use the ISO format: YYYY-MM-DDTHH:MM:SS"
        ))
    })
}

#[utoipa::path(
    get,
    path = "/header",
    tag = "ephemeris",
    responses(
        (status = 200, description = "Feed header fields"),
        (status = 500, description = "Feed unavailable", body = ErrorResponse)
    )
)]
pub async fn header(State(state): State<AppState>) -> ApiResult<Json<FieldMap>> {
    Ok(Json(state.service.header().await?))
}

#[utoipa::path(
    get,
    path = "/metadata",
    tag = "ephemeris",
    responses(
        (status = 200, description = "Segment metadata fields"),
        (status = 500, description = "Feed unavailable", body = ErrorResponse)
    )
)]
pub async fn metadata(State(state): State<AppState>) -> ApiResult<Json<FieldMap>> {
    Ok(Json(state.service.metadata().await?))
}

#[utoipa::path(
    get,
    path = "/comment",
    tag = "ephemeris",
    responses(
        (status = 200, description = "Segment comments", body = Vec<String>),
        (status = 500, description = "Feed unavailable", body = ErrorResponse)
    )
)]
pub async fn comments(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.service.comments().await?))
}

#[utoipa::path(
    get,
    path = "/epochs",
    tag = "ephemeris",
    params(
        ("limit" = Option<u32>, Query, description = "Maximum number of vectors to return (positive integer)"),
        ("offset" = Option<u32>, Query, description = "Index of the first vector to return (default 0)")
    ),
    responses(
        (status = 200, description = "State vectors", body = Vec<StateVector>),
        (status = 400, description = "Invalid limit or offset", body = ErrorResponse),
        (status = 500, description = "Feed unavailable", body = ErrorResponse)
    )
)]
pub async fn list_epochs(
    State(state): State<AppState>,
    Query(query): Query<EpochsQuery>,
) -> ApiResult<Json<Vec<StateVector>>> {
    let page = Page::from_query(&query).map_err(ApiError::InvalidInput)?;

    let snapshot = state.service.snapshot().await?;
    let vectors = page
        .apply(&snapshot.state_vectors)
        .map_err(ApiError::InvalidInput)?;

    Ok(Json(vectors.to_vec()))
}

#[utoipa::path(
    get,
    path = "/epochs/{epoch}",
    tag = "ephemeris",
    params(("epoch" = String, Path, description = "ISO-8601 epoch, e.g. 2024-02-16T12:00:00.000000Z")),
    responses(
        (status = 200, description = "State vector at the epoch", body = StateVector),
        (status = 400, description = "Malformed epoch", body = ErrorResponse),
        (status = 404, description = "Epoch not found", body = ErrorResponse),
        (status = 500, description = "Feed unavailable", body = ErrorResponse)
    )
)]
pub async fn get_epoch(
    State(state): State<AppState>,
    Path(epoch): Path<String>,
) -> ApiResult<Json<StateVector>> {
    let epoch = parse_epoch_param(&epoch)?;
    Ok(Json(state.service.epoch(&epoch).await?))
}

#[utoipa::path(
    get,
    path = "/epochs/{epoch}/speed",
    tag = "ephemeris",
    params(("epoch" = String, Path, description = "ISO-8601 epoch")),
    responses(
        (status = 200, description = "Speed in km/s", body = SpeedView),
        (status = 400, description = "Malformed epoch", body = ErrorResponse),
        (status = 404, description = "Epoch not found", body = ErrorResponse),
        (status = 500, description = "Feed unavailable", body = ErrorResponse)
    )
)]
pub async fn get_speed(
    State(state): State<AppState>,
    Path(epoch): Path<String>,
) -> ApiResult<Json<SpeedView>> {
    let epoch = parse_epoch_param(&epoch)?;
    Ok(Json(state.service.speed(&epoch).await?))
}

#[utoipa::path(
    get,
    path = "/epochs/{epoch}/location",
    tag = "ephemeris",
    params(("epoch" = String, Path, description = "ISO-8601 epoch")),
    responses(
        (status = 200, description = "Approximate ground position", body = LocationView),
        (status = 400, description = "Malformed epoch", body = ErrorResponse),
        (status = 404, description = "Epoch not found", body = ErrorResponse),
        (status = 500, description = "Feed or geocoder unavailable", body = ErrorResponse)
    )
)]
pub async fn get_location(
    State(state): State<AppState>,
    Path(epoch): Path<String>,
) -> ApiResult<Json<LocationView>> {
    let epoch = parse_epoch_param(&epoch)?;
    Ok(Json(state.service.location(&epoch).await?))
}

#[utoipa::path(
    get,
    path = "/now",
    tag = "ephemeris",
    responses(
        (status = 200, description = "State vector closest to the current time", body = EpochView),
        (status = 500, description = "Feed or geocoder unavailable", body = ErrorResponse)
    )
)]
pub async fn now(State(state): State<AppState>) -> ApiResult<Json<EpochView>> {
    Ok(Json(state.service.now().await?))
}
