//! Lot occupancy endpoint.

use axum::extract::State;
use axum::Json;
use parkade_core::{LotStatus, StrategyKind};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::SharedState;

/// Occupancy report for the whole lot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "name": "parkade",
    "strategy": "smallest_fit",
    "total_spots": 3,
    "available_spots": 2,
    "open_sessions": 1,
    "by_size": [
        { "size": 1, "total": 1, "available": 1 },
        { "size": 2, "total": 2, "available": 1 }
    ]
}))]
pub struct LotResponse {
    /// Configured lot name.
    pub name: String,

    /// Assignment strategy in use.
    pub strategy: StrategyKind,

    /// Counts across the catalog and ledger.
    #[serde(flatten)]
    pub status: LotStatus,
}

/// Get the lot's occupancy.
#[utoipa::path(
    get,
    path = "/api/lot",
    tag = "lot",
    operation_id = "getLot",
    summary = "Get lot occupancy",
    description = "Returns total and available spot counts, the number of open \
        sessions, and a breakdown by size class.",
    responses(
        (status = 200, description = "Occupancy report", body = LotResponse)
    )
)]
pub async fn get_lot(State(state): State<SharedState>) -> Json<LotResponse> {
    Json(LotResponse {
        name: state.config.lot.name.clone(),
        strategy: state.config.lot.strategy,
        status: state.lot.status(),
    })
}
