//! Parking session tracking.
//!
//! A [`Ticket`] is opened when a vehicle parks and closed, exactly once, when
//! it leaves. The [`TicketLedger`] guarantees that a vehicle never has two open
//! tickets and keeps a bounded audit trail of closed ones.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::catalog::ParkingSpot;
use crate::error::{ParkingError, Result};
use crate::types::{SpotId, Vehicle, VehicleId};

/// Identity of a ticket (UUID v7, so ids sort by creation time).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = String, format = Uuid)]
pub struct TicketId(pub Uuid);

impl TicketId {
    fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// The record of one parking session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[schema(example = json!({
    "id": "01936f0e-8c1a-7cc0-9b9e-3f5a2d7e4b10",
    "vehicle_id": "KA-1234",
    "spot_id": 1,
    "entry_time": "2025-01-15T08:00:00Z",
    "exit_time": null,
    "entry_location": 5,
    "hourly_rate": "2.50"
}))]
pub struct Ticket {
    id: TicketId,
    vehicle_id: VehicleId,
    spot_id: SpotId,
    entry_time: DateTime<Utc>,
    exit_time: Option<DateTime<Utc>>,
    entry_location: i64,
    #[schema(value_type = String)]
    hourly_rate: Decimal,
}

impl Ticket {
    /// Ticket identity.
    #[must_use]
    pub const fn id(&self) -> TicketId {
        self.id
    }

    /// The parked vehicle.
    #[must_use]
    pub const fn vehicle_id(&self) -> &VehicleId {
        &self.vehicle_id
    }

    /// The occupied spot.
    #[must_use]
    pub const fn spot_id(&self) -> SpotId {
        self.spot_id
    }

    /// When the session started.
    #[must_use]
    pub const fn entry_time(&self) -> DateTime<Utc> {
        self.entry_time
    }

    /// When the session ended, if it has.
    #[must_use]
    pub const fn exit_time(&self) -> Option<DateTime<Utc>> {
        self.exit_time
    }

    /// Where the vehicle entered the lot.
    #[must_use]
    pub const fn entry_location(&self) -> i64 {
        self.entry_location
    }

    /// Spot rate captured when the session opened.
    #[must_use]
    pub const fn hourly_rate(&self) -> Decimal {
        self.hourly_rate
    }

    /// Whether the session is still running.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }
}

#[derive(Debug)]
struct Inner {
    open: HashMap<VehicleId, Ticket>,
    closed: VecDeque<Ticket>,
}

/// Thread-safe ledger of open and closed tickets.
///
/// All mutations go through a single ledger-wide mutex.
#[derive(Debug)]
pub struct TicketLedger {
    inner: Mutex<Inner>,
    history_limit: usize,
}

impl Default for TicketLedger {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl TicketLedger {
    /// Create a ledger retaining at most `history_limit` closed tickets.
    #[must_use]
    pub fn new(history_limit: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                open: HashMap::new(),
                closed: VecDeque::new(),
            }),
            history_limit: history_limit.max(1),
        }
    }

    /// Open a session for `vehicle` on `spot`.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::DuplicateSession`] if the vehicle already has
    /// an open ticket.
    pub fn open(
        &self,
        vehicle: &Vehicle,
        spot: &ParkingSpot,
        entry_time: DateTime<Utc>,
        entry_location: i64,
    ) -> Result<Ticket> {
        let mut inner = self.inner.lock();
        if inner.open.contains_key(&vehicle.id) {
            return Err(ParkingError::DuplicateSession(vehicle.id.clone()));
        }

        let ticket = Ticket {
            id: TicketId::generate(),
            vehicle_id: vehicle.id.clone(),
            spot_id: spot.id,
            entry_time,
            exit_time: None,
            entry_location,
            hourly_rate: spot.hourly_rate,
        };
        inner.open.insert(vehicle.id.clone(), ticket.clone());
        info!(ticket = %ticket.id, vehicle = %vehicle.id, spot = %spot.id, "Ticket opened");
        Ok(ticket)
    }

    /// Close the vehicle's open ticket at `exit_time`.
    ///
    /// On error the ticket stays open.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::NoActiveSession`] if nothing is open and
    /// [`ParkingError::InvalidDuration`] if `exit_time` precedes the entry.
    pub fn close(&self, vehicle_id: &VehicleId, exit_time: DateTime<Utc>) -> Result<Ticket> {
        self.close_with(vehicle_id, exit_time, |_| Ok(()))
            .map(|(ticket, ())| ticket)
    }

    /// Close the vehicle's ticket only if `settle` succeeds on it first.
    ///
    /// `settle` sees the still-open ticket under the ledger lock; if it fails
    /// the ticket stays open and its error is returned.
    ///
    /// # Errors
    ///
    /// As [`TicketLedger::close`], plus any error from `settle`.
    pub fn close_with<T>(
        &self,
        vehicle_id: &VehicleId,
        exit_time: DateTime<Utc>,
        settle: impl FnOnce(&Ticket) -> Result<T>,
    ) -> Result<(Ticket, T)> {
        let mut inner = self.inner.lock();
        let open = inner
            .open
            .get(vehicle_id)
            .ok_or_else(|| ParkingError::NoActiveSession(vehicle_id.clone()))?;
        let entry_time = open.entry_time;
        if exit_time < entry_time {
            return Err(ParkingError::InvalidDuration(format!(
                "exit {exit_time} precedes entry {entry_time} for vehicle '{vehicle_id}'"
            )));
        }
        let settled = settle(open)?;

        let mut ticket = inner
            .open
            .remove(vehicle_id)
            .ok_or_else(|| ParkingError::NoActiveSession(vehicle_id.clone()))?;
        ticket.exit_time = Some(exit_time);

        if inner.closed.len() == self.history_limit {
            inner.closed.pop_front();
        }
        inner.closed.push_back(ticket.clone());
        info!(ticket = %ticket.id, vehicle = %vehicle_id, spot = %ticket.spot_id, "Ticket closed");
        Ok((ticket, settled))
    }

    /// The vehicle's open ticket, if any.
    #[must_use]
    pub fn active_ticket(&self, vehicle_id: &VehicleId) -> Option<Ticket> {
        self.inner.lock().open.get(vehicle_id).cloned()
    }

    /// Every open ticket, oldest entry first.
    #[must_use]
    pub fn open_tickets(&self) -> Vec<Ticket> {
        let mut tickets: Vec<Ticket> = self.inner.lock().open.values().cloned().collect();
        tickets.sort_by_key(|t| (t.entry_time, t.id));
        tickets
    }

    /// Number of open tickets.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.inner.lock().open.len()
    }

    /// Retained closed tickets for one vehicle, oldest first.
    #[must_use]
    pub fn history(&self, vehicle_id: &VehicleId) -> Vec<Ticket> {
        self.inner
            .lock()
            .closed
            .iter()
            .filter(|t| &t.vehicle_id == vehicle_id)
            .cloned()
            .collect()
    }

    /// All retained closed tickets, oldest first.
    #[must_use]
    pub fn closed_tickets(&self) -> Vec<Ticket> {
        self.inner.lock().closed.iter().cloned().collect()
    }
}
