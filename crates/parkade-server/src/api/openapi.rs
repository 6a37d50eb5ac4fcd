//! OpenAPI specification for the parkade API.
//!
//! Served at `/api/openapi.json` and written to disk by the `gen-openapi`
//! binary for client generation.

use axum::Json;
use parkade_core::{
    Invoice, LotStatus, ParkingSpot, SizeClass, SizeOccupancy, SpotId, StrategyKind, Ticket,
    TicketId, VehicleId, VehicleKind,
};
use utoipa::OpenApi;

use super::error::ErrorResponse;
use super::health::HealthResponse;
use super::lot::LotResponse;
use super::sessions::{HistoryResponse, ParkRequest, ParkResponse, UnparkRequest};
use super::spots::{AddSpotRequest, SpotsResponse};

/// Serve the OpenAPI specification as JSON.
pub async fn get_openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// The OpenAPI specification as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if the document cannot be serialized.
pub fn get_openapi_json() -> Result<String, serde_json::Error> {
    ApiDoc::openapi().to_pretty_json()
}

/// Main OpenAPI document structure for parkade.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "parkade API",
        version = "0.1.0",
        description = r#"
# parkade API

parkade assigns vehicles to parking spots and bills them by the hour.

## Overview

1. **Spots**: register and remove spots, each with a size class, hourly rate and location
2. **Sessions**: park a vehicle to receive a ticket and spot; unpark it to receive the fee
3. **Lot**: occupancy totals by size class

## Money

Rates and fees are decimal strings (e.g. `"2.50"`). A fee is elapsed hours
times the rate captured when the vehicle parked, rounded once to the
configured number of decimal places.

## Size classes

`1` compact, `2` standard, `3` oversized. A spot fits any vehicle whose
class is less than or equal to its own.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Local parkade server")
    ),
    tags(
        (name = "system", description = "Health checks"),
        (name = "lot", description = "Lot-wide occupancy"),
        (name = "spots", description = "Spot inventory management"),
        (name = "sessions", description = "Parking, unparking and ticket lookups")
    ),
    paths(
        super::health::health_check,
        super::lot::get_lot,
        super::spots::list_spots,
        super::spots::add_spot,
        super::spots::remove_spot,
        super::sessions::park,
        super::sessions::unpark,
        super::sessions::get_active_ticket,
        super::sessions::get_history,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            LotResponse,
            LotStatus,
            SizeOccupancy,
            StrategyKind,
            SpotsResponse,
            AddSpotRequest,
            ParkingSpot,
            ParkRequest,
            ParkResponse,
            UnparkRequest,
            HistoryResponse,
            Invoice,
            Ticket,
            TicketId,
            SpotId,
            VehicleId,
            SizeClass,
            VehicleKind,
        )
    )
)]
pub struct ApiDoc;
