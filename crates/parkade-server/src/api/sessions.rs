//! Parking session endpoints.
//!
//! A session starts when a vehicle parks and ends when it unparks, at which
//! point the fee is computed from the rate captured at entry.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use parkade_core::{
    is_valid_vehicle_id, Invoice, ParkingError, SizeClass, SpotId, Ticket, TicketId, Vehicle,
    VehicleId, VehicleKind,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::state::SharedState;

/// Creates the sessions router.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/park", post(park))
        .route("/unpark", post(unpark))
        .route("/{vehicle_id}", get(get_active_ticket))
        .route("/{vehicle_id}/history", get(get_history))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for parking a vehicle.
///
/// Exactly one of `size_class` and `kind` should be given; `size_class` wins
/// when both are.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[schema(example = json!({
    "vehicle_id": "KA-1234",
    "kind": "car",
    "entry_location": 5
}))]
pub struct ParkRequest {
    /// Licence plate or other vehicle identity.
    #[schema(example = "KA-1234", max_length = 16)]
    pub vehicle_id: String,

    /// Explicit vehicle size class.
    #[schema(example = 2, minimum = 1)]
    pub size_class: Option<u8>,

    /// Vehicle kind, mapped onto a size class.
    pub kind: Option<VehicleKind>,

    /// Entry time. Defaults to now.
    pub entry_time: Option<DateTime<Utc>>,

    /// Position of the entry gate along the lot.
    #[serde(default)]
    #[schema(example = 5)]
    pub entry_location: i64,
}

/// Response after a vehicle is parked.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "ticket_id": "01936f0e-8c1a-7cc0-9b9e-3f5a2d7e4b10",
    "spot_id": 3,
    "vehicle_id": "KA-1234",
    "entry_time": "2025-01-15T08:00:00Z"
}))]
pub struct ParkResponse {
    /// Ticket opened for the session.
    pub ticket_id: TicketId,

    /// Spot assigned to the vehicle.
    pub spot_id: SpotId,

    /// The parked vehicle.
    pub vehicle_id: VehicleId,

    /// Recorded entry time.
    pub entry_time: DateTime<Utc>,
}

/// Request body for ending a session.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[schema(example = json!({
    "vehicle_id": "KA-1234",
    "exit_time": "2025-01-15T09:30:00Z"
}))]
pub struct UnparkRequest {
    /// Vehicle leaving the lot.
    #[schema(example = "KA-1234", max_length = 16)]
    pub vehicle_id: String,

    /// Exit time. Defaults to now.
    pub exit_time: Option<DateTime<Utc>>,
}

/// Closed sessions for one vehicle, oldest first.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryResponse {
    /// The vehicle queried.
    pub vehicle_id: VehicleId,

    /// Closed tickets still held in the audit history.
    pub tickets: Vec<Ticket>,
}

impl ParkRequest {
    fn vehicle(&self) -> ApiResult<Vehicle> {
        let id = parse_vehicle_id(&self.vehicle_id)?;
        let size = match (self.size_class, self.kind) {
            (Some(0), _) => {
                return Err(ApiError::bad_request(
                    "INVALID_SIZE_CLASS",
                    "Size class must be at least 1",
                ))
            }
            (Some(size), _) => SizeClass(size),
            (None, Some(kind)) => kind.into(),
            (None, None) => {
                return Err(ApiError::bad_request(
                    "MISSING_SIZE",
                    "Either size_class or kind is required",
                ))
            }
        };
        Ok(Vehicle::new(id, size))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Park a vehicle.
#[utoipa::path(
    post,
    path = "/api/sessions/park",
    tag = "sessions",
    operation_id = "park",
    summary = "Park a vehicle",
    description = "Assigns an available spot that fits the vehicle using the \
        configured strategy and opens a ticket. The spot's hourly rate is \
        captured on the ticket.",
    request_body = ParkRequest,
    responses(
        (status = 201, description = "Vehicle parked", body = ParkResponse),
        (status = 400, description = "Invalid vehicle id or size", body = ErrorResponse),
        (status = 409, description = "Lot full or vehicle already parked", body = ErrorResponse)
    )
)]
pub async fn park(
    State(state): State<SharedState>,
    Json(request): Json<ParkRequest>,
) -> ApiResult<(StatusCode, Json<ParkResponse>)> {
    let vehicle = request.vehicle()?;
    let entry_time = request.entry_time.unwrap_or_else(Utc::now);

    let receipt = state
        .lot
        .park(&vehicle, entry_time, request.entry_location)?;

    Ok((
        StatusCode::CREATED,
        Json(ParkResponse {
            ticket_id: receipt.ticket_id,
            spot_id: receipt.spot_id,
            vehicle_id: vehicle.id,
            entry_time,
        }),
    ))
}

/// End a vehicle's session and bill it.
#[utoipa::path(
    post,
    path = "/api/sessions/unpark",
    tag = "sessions",
    operation_id = "unpark",
    summary = "Unpark a vehicle",
    description = "Closes the vehicle's open ticket, frees its spot and returns \
        the fee: elapsed hours times the rate captured at entry.",
    request_body = UnparkRequest,
    responses(
        (status = 200, description = "Session closed", body = Invoice),
        (status = 400, description = "Invalid vehicle id or exit before entry", body = ErrorResponse),
        (status = 404, description = "Vehicle has no open session", body = ErrorResponse)
    )
)]
pub async fn unpark(
    State(state): State<SharedState>,
    Json(request): Json<UnparkRequest>,
) -> ApiResult<Json<Invoice>> {
    let vehicle_id = parse_vehicle_id(&request.vehicle_id)?;
    let exit_time = request.exit_time.unwrap_or_else(Utc::now);

    let invoice = state.lot.unpark(&vehicle_id, exit_time)?;
    Ok(Json(invoice))
}

/// Get a vehicle's open ticket.
#[utoipa::path(
    get,
    path = "/api/sessions/{vehicle_id}",
    tag = "sessions",
    operation_id = "getActiveTicket",
    summary = "Get the open ticket for a vehicle",
    params(("vehicle_id" = String, Path, description = "Vehicle identity")),
    responses(
        (status = 200, description = "Open ticket", body = Ticket),
        (status = 404, description = "Vehicle has no open session", body = ErrorResponse)
    )
)]
pub async fn get_active_ticket(
    State(state): State<SharedState>,
    Path(vehicle_id): Path<String>,
) -> ApiResult<Json<Ticket>> {
    let vehicle_id = parse_vehicle_id(&vehicle_id)?;
    state
        .lot
        .active_ticket(&vehicle_id)
        .map(Json)
        .ok_or_else(|| ParkingError::NoActiveSession(vehicle_id).into())
}

/// Get a vehicle's closed sessions.
#[utoipa::path(
    get,
    path = "/api/sessions/{vehicle_id}/history",
    tag = "sessions",
    operation_id = "getHistory",
    summary = "Get closed sessions for a vehicle",
    description = "Returns the vehicle's closed tickets still held in the \
        bounded audit history, oldest first.",
    params(("vehicle_id" = String, Path, description = "Vehicle identity")),
    responses(
        (status = 200, description = "Closed tickets", body = HistoryResponse),
        (status = 400, description = "Invalid vehicle id", body = ErrorResponse)
    )
)]
pub async fn get_history(
    State(state): State<SharedState>,
    Path(vehicle_id): Path<String>,
) -> ApiResult<Json<HistoryResponse>> {
    let vehicle_id = parse_vehicle_id(&vehicle_id)?;
    let tickets = state.lot.history(&vehicle_id);
    Ok(Json(HistoryResponse {
        vehicle_id,
        tickets,
    }))
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_vehicle_id(raw: &str) -> ApiResult<VehicleId> {
    let trimmed = raw.trim();
    if !is_valid_vehicle_id(trimmed) {
        return Err(ParkingError::InvalidVehicleId(raw.to_string()).into());
    }
    Ok(VehicleId::new(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_park_request_kind_maps_to_size() {
        let json = r#"{"vehicle_id": "BUS 42", "kind": "bus"}"#;
        let request: ParkRequest = serde_json::from_str(json).unwrap();
        let vehicle = request.vehicle().unwrap();
        assert_eq!(vehicle.size, SizeClass::OVERSIZED);
        assert_eq!(request.entry_location, 0);
        assert!(request.entry_time.is_none());
    }

    #[test]
    fn test_park_request_size_class_wins_over_kind() {
        let json = r#"{"vehicle_id": "KA-1", "size_class": 3, "kind": "motorcycle"}"#;
        let request: ParkRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.vehicle().unwrap().size, SizeClass(3));
    }

    #[test]
    fn test_park_request_requires_a_size() {
        let json = r#"{"vehicle_id": "KA-1"}"#;
        let request: ParkRequest = serde_json::from_str(json).unwrap();
        assert!(matches!(
            request.vehicle(),
            Err(ApiError::BadRequest { ref error_code, .. }) if error_code == "MISSING_SIZE"
        ));
    }

    #[test]
    fn test_parse_vehicle_id() {
        assert_eq!(parse_vehicle_id(" KA-1 ").unwrap().as_str(), "KA-1");
        assert!(parse_vehicle_id("").is_err());
        assert!(parse_vehicle_id("-LEADING").is_err());
        assert!(parse_vehicle_id("WAY-TOO-LONG-PLATE-1").is_err());
    }
}
