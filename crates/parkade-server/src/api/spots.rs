//! Spot management endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use parkade_core::{ParkingSpot, SizeClass, SpotId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::state::SharedState;

/// Creates the spots router.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_spots).post(add_spot))
        .route("/{spot_id}", delete(remove_spot))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Every spot in the catalog, ordered by id.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SpotsResponse {
    /// Spots with their current availability.
    pub spots: Vec<ParkingSpot>,

    /// How many of them are free.
    #[schema(example = 4)]
    pub available: usize,
}

/// Request body for registering a spot.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[schema(example = json!({
    "spot_id": 12,
    "size_class": 2,
    "hourly_rate": "2.50",
    "location": 40
}))]
pub struct AddSpotRequest {
    /// New spot identity. Must not already exist.
    #[schema(example = 12)]
    pub spot_id: u64,

    /// Largest vehicle size class the spot holds (1 compact, 2 standard, 3 oversized).
    #[schema(example = 2, minimum = 1)]
    pub size_class: u8,

    /// Price per hour as a decimal string.
    #[schema(value_type = String, example = "2.50")]
    pub hourly_rate: Decimal,

    /// Position along the lot.
    #[serde(default)]
    #[schema(example = 40)]
    pub location: i64,
}

// ============================================================================
// Handlers
// ============================================================================

/// List spots.
#[utoipa::path(
    get,
    path = "/api/spots",
    tag = "spots",
    operation_id = "listSpots",
    summary = "List all spots",
    description = "Returns every spot in the catalog ordered by id, with its \
        size class, hourly rate, location and availability.",
    responses(
        (status = 200, description = "Spot catalog", body = SpotsResponse)
    )
)]
pub async fn list_spots(State(state): State<SharedState>) -> Json<SpotsResponse> {
    let spots = state.lot.spots();
    let available = spots.iter().filter(|spot| spot.is_available()).count();
    Json(SpotsResponse { spots, available })
}

/// Register a spot.
#[utoipa::path(
    post,
    path = "/api/spots",
    tag = "spots",
    operation_id = "addSpot",
    summary = "Add a spot",
    description = "Registers a new, available spot.",
    request_body = AddSpotRequest,
    responses(
        (status = 201, description = "Spot added", body = ParkingSpot),
        (status = 400, description = "Invalid size class or negative rate", body = ErrorResponse),
        (status = 409, description = "A spot with this id exists", body = ErrorResponse)
    )
)]
pub async fn add_spot(
    State(state): State<SharedState>,
    Json(request): Json<AddSpotRequest>,
) -> ApiResult<(StatusCode, Json<ParkingSpot>)> {
    if request.size_class == 0 {
        return Err(ApiError::bad_request(
            "INVALID_SIZE_CLASS",
            "Size class must be at least 1",
        ));
    }

    let spot = ParkingSpot::new(
        SpotId(request.spot_id),
        SizeClass(request.size_class),
        request.hourly_rate,
        request.location,
    );
    state.lot.add_spot(spot.clone())?;

    Ok((StatusCode::CREATED, Json(spot)))
}

/// Remove a spot.
#[utoipa::path(
    delete,
    path = "/api/spots/{spot_id}",
    tag = "spots",
    operation_id = "removeSpot",
    summary = "Remove a spot",
    description = "Removes an available spot. Occupied spots are rejected; \
        unpark the vehicle first.",
    params(("spot_id" = u64, Path, description = "Spot identity")),
    responses(
        (status = 200, description = "Spot removed", body = ParkingSpot),
        (status = 404, description = "Unknown spot", body = ErrorResponse),
        (status = 409, description = "Spot is occupied", body = ErrorResponse)
    )
)]
pub async fn remove_spot(
    State(state): State<SharedState>,
    Path(spot_id): Path<u64>,
) -> ApiResult<Json<ParkingSpot>> {
    let spot = state.lot.remove_spot(SpotId(spot_id))?;
    Ok(Json(spot))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_spot_request_location_defaults_to_zero() {
        let json = r#"{"spot_id": 4, "size_class": 1, "hourly_rate": "0.75"}"#;
        let request: AddSpotRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.location, 0);
        assert_eq!(request.hourly_rate, Decimal::new(75, 2));
    }
}
