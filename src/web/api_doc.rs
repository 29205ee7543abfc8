use utoipa::OpenApi;

use crate::ephemeris::StateVector;
use crate::service::{EpochView, LocationView, SpeedView};

use super::api::ephemeris;
use super::api::error::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        ephemeris::header,
        ephemeris::metadata,
        ephemeris::comments,
        ephemeris::list_epochs,
        ephemeris::get_epoch,
        ephemeris::get_speed,
        ephemeris::get_location,
        ephemeris::now,
    ),
    components(schemas(StateVector, SpeedView, LocationView, EpochView, ErrorResponse)),
    info(
        title = "ISS Tracker API",
        description = "ISS ephemeris from the NASA OEM feed with derived speed and ground position",
        version = "0.1.0"
    ),
    tags(
        (name = "ephemeris", description = "State vectors and derived quantities")
    )
)]
pub struct ApiDoc;
