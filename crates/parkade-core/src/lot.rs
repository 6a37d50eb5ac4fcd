//! Park/unpark orchestration.
//!
//! [`ParkingLot`] wires a [`SpotCatalog`], a [`TicketLedger`], an
//! [`AssignmentStrategy`] and a [`FeeCalculator`] together. The catalog and
//! ledger are injected so callers can share or inspect them; nothing here is
//! process-global.
//!
//! # Example
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use parkade_core::{ParkingLot, ParkingSpot, SizeClass, SpotId, Vehicle};
//! use rust_decimal::Decimal;
//!
//! let lot = ParkingLot::with_strategy(parkade_core::NearestStrategy);
//! lot.add_spot(ParkingSpot::new(SpotId(1), SizeClass::STANDARD, Decimal::TWO, 0))
//!     .unwrap();
//!
//! let car = Vehicle::new("KA-1234", SizeClass::STANDARD);
//! let entry = Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap();
//! let receipt = lot.park(&car, entry, 5).unwrap();
//! assert_eq!(receipt.spot_id, SpotId(1));
//!
//! let invoice = lot.unpark(&car.id, entry + Duration::minutes(90)).unwrap();
//! assert_eq!(invoice.fee, Decimal::new(3, 0));
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::billing::{elapsed_hours, FeeCalculator};
use crate::catalog::{ParkingSpot, SizeOccupancy, SpotCatalog};
use crate::config::LotConfig;
use crate::error::{ParkingError, Result};
use crate::ledger::{Ticket, TicketId, TicketLedger};
use crate::strategy::{AssignmentContext, AssignmentStrategy};
use crate::types::{SpotId, Vehicle, VehicleId};

/// Default bound on candidate re-queries after losing an occupy race.
pub const DEFAULT_MAX_PARK_ATTEMPTS: u32 = 3;

/// Result of a successful park.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ParkReceipt {
    /// The newly opened ticket.
    pub ticket_id: TicketId,
    /// The spot the vehicle was assigned.
    pub spot_id: SpotId,
}

/// Result of a successful unpark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Invoice {
    /// The closed ticket.
    pub ticket: Ticket,
    /// Billed duration in hours.
    #[schema(value_type = String, example = "1.5")]
    pub duration_hours: Decimal,
    /// Amount due.
    #[schema(value_type = String, example = "3.75")]
    pub fee: Decimal,
}

/// Point-in-time view of the lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LotStatus {
    /// Number of spots.
    pub total_spots: usize,
    /// Number of free spots.
    pub available_spots: usize,
    /// Number of open tickets.
    pub open_sessions: usize,
    /// Breakdown per size class.
    pub by_size: Vec<SizeOccupancy>,
}

/// The parking lot controller.
pub struct ParkingLot<S = Box<dyn AssignmentStrategy>> {
    catalog: Arc<SpotCatalog>,
    ledger: Arc<TicketLedger>,
    strategy: S,
    fees: FeeCalculator,
    max_park_attempts: u32,
}

impl<S: AssignmentStrategy> std::fmt::Debug for ParkingLot<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParkingLot")
            .field("strategy", &self.strategy.name())
            .field("spots", &self.catalog.len())
            .field("open_sessions", &self.ledger.open_count())
            .field("max_park_attempts", &self.max_park_attempts)
            .finish_non_exhaustive()
    }
}

impl ParkingLot {
    /// Build a lot from configuration, registering the configured spots.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or lists a spot
    /// twice.
    pub fn from_config(config: &LotConfig) -> Result<Self> {
        config.validate()?;

        let lot = Self::new(
            Arc::new(SpotCatalog::new()),
            Arc::new(TicketLedger::new(config.lot.history_limit)),
            config.lot.strategy.build(),
            FeeCalculator::from(&config.billing),
        )
        .with_max_park_attempts(config.lot.max_park_attempts);

        for seed in &config.spots {
            lot.add_spot(ParkingSpot::from(seed))?;
        }
        info!(
            lot = %config.lot.name,
            strategy = %config.lot.strategy,
            spots = config.spots.len(),
            "Parking lot initialized"
        );
        Ok(lot)
    }
}

impl<S: AssignmentStrategy> ParkingLot<S> {
    /// Assemble a lot from its parts.
    pub fn new(
        catalog: Arc<SpotCatalog>,
        ledger: Arc<TicketLedger>,
        strategy: S,
        fees: FeeCalculator,
    ) -> Self {
        Self {
            catalog,
            ledger,
            strategy,
            fees,
            max_park_attempts: DEFAULT_MAX_PARK_ATTEMPTS,
        }
    }

    /// An empty lot with default billing and the given strategy.
    pub fn with_strategy(strategy: S) -> Self {
        Self::new(
            Arc::new(SpotCatalog::new()),
            Arc::new(TicketLedger::default()),
            strategy,
            FeeCalculator::default(),
        )
    }

    /// Set how many times `park` retries after losing a race (minimum 1).
    #[must_use]
    pub fn with_max_park_attempts(mut self, attempts: u32) -> Self {
        self.max_park_attempts = attempts.max(1);
        self
    }

    /// The spot catalog.
    #[must_use]
    pub fn catalog(&self) -> &Arc<SpotCatalog> {
        &self.catalog
    }

    /// The ticket ledger.
    #[must_use]
    pub fn ledger(&self) -> &Arc<TicketLedger> {
        &self.ledger
    }

    /// The assignment strategy.
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Register a spot.
    ///
    /// # Errors
    ///
    /// See [`SpotCatalog::add_spot`].
    pub fn add_spot(&self, spot: ParkingSpot) -> Result<()> {
        self.catalog.add_spot(spot)
    }

    /// Remove an available spot.
    ///
    /// # Errors
    ///
    /// See [`SpotCatalog::remove_spot`].
    pub fn remove_spot(&self, id: SpotId) -> Result<ParkingSpot> {
        self.catalog.remove_spot(id)
    }

    /// Assign a spot to `vehicle` and open its ticket.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::DuplicateSession`] if the vehicle is already
    /// parked and [`ParkingError::LotFull`] if no spot could be secured within
    /// the retry bound.
    #[tracing::instrument(skip(self, vehicle), fields(vehicle = %vehicle.id, size = %vehicle.size))]
    pub fn park(
        &self,
        vehicle: &Vehicle,
        entry_time: DateTime<Utc>,
        entry_location: i64,
    ) -> Result<ParkReceipt> {
        if self.ledger.active_ticket(&vehicle.id).is_some() {
            warn!("Vehicle already has an open ticket");
            return Err(ParkingError::DuplicateSession(vehicle.id.clone()));
        }

        let context = AssignmentContext {
            entry_location,
            entry_time,
        };
        let spot = self.secure_spot(vehicle, &context)?;

        let ticket = match self
            .ledger
            .open(vehicle, &spot, entry_time, entry_location)
        {
            Ok(ticket) => ticket,
            Err(err) => {
                // Lost a concurrent park for the same vehicle; give the spot back.
                if let Err(release_err) = self.catalog.release(spot.id) {
                    warn!(spot = %spot.id, error = %release_err, "Failed to release spot");
                }
                return Err(err);
            }
        };

        info!(ticket = %ticket.id(), spot = %spot.id, "Vehicle parked");
        Ok(ParkReceipt {
            ticket_id: ticket.id(),
            spot_id: spot.id,
        })
    }

    /// Close the vehicle's ticket, free its spot and bill the session.
    ///
    /// The fee is computed before anything is committed, so a billing error
    /// leaves the ticket open and the spot occupied.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::NoActiveSession`] or
    /// [`ParkingError::InvalidDuration`] from the ledger, or a billing error.
    #[tracing::instrument(skip(self), fields(vehicle = %vehicle_id))]
    pub fn unpark(&self, vehicle_id: &VehicleId, exit_time: DateTime<Utc>) -> Result<Invoice> {
        let (ticket, (duration_hours, fee)) =
            self.ledger.close_with(vehicle_id, exit_time, |open| {
                let hours = elapsed_hours(open.entry_time(), exit_time)?;
                let fee = self.fees.compute_fee(open.hourly_rate(), hours)?;
                Ok((hours, fee))
            })?;
        self.catalog.release(ticket.spot_id())?;

        info!(
            ticket = %ticket.id(),
            spot = %ticket.spot_id(),
            hours = %duration_hours,
            fee = %fee,
            "Vehicle unparked"
        );
        Ok(Invoice {
            ticket,
            duration_hours,
            fee,
        })
    }

    /// The vehicle's open ticket, if any.
    #[must_use]
    pub fn active_ticket(&self, vehicle_id: &VehicleId) -> Option<Ticket> {
        self.ledger.active_ticket(vehicle_id)
    }

    /// Retained closed tickets for a vehicle.
    #[must_use]
    pub fn history(&self, vehicle_id: &VehicleId) -> Vec<Ticket> {
        self.ledger.history(vehicle_id)
    }

    /// Snapshot of every spot.
    #[must_use]
    pub fn spots(&self) -> Vec<ParkingSpot> {
        self.catalog.spots()
    }

    /// Occupancy report.
    #[must_use]
    pub fn status(&self) -> LotStatus {
        LotStatus {
            total_spots: self.catalog.len(),
            available_spots: self.catalog.available_count(),
            open_sessions: self.ledger.open_count(),
            by_size: self.catalog.occupancy(),
        }
    }

    /// Steps 1-3 of a park: candidates, selection, occupy, with bounded retry.
    fn secure_spot(&self, vehicle: &Vehicle, context: &AssignmentContext) -> Result<ParkingSpot> {
        let lot_full = || ParkingError::LotFull {
            vehicle: vehicle.id.clone(),
            size: vehicle.size,
        };

        for attempt in 1..=self.max_park_attempts {
            let candidates = self.catalog.find_candidates(vehicle);
            if candidates.is_empty() {
                debug!(attempt, "No candidates");
                return Err(lot_full());
            }

            let Some(spot) = self.strategy.assign(vehicle, &candidates, context) else {
                debug!(attempt, strategy = self.strategy.name(), "Strategy declined");
                return Err(lot_full());
            };
            if !spot.size.fits(vehicle.size) {
                warn!(spot = %spot.id, strategy = self.strategy.name(), "Strategy chose a spot too small");
                return Err(lot_full());
            }

            match self.catalog.occupy(spot.id) {
                Ok(()) => {
                    debug!(attempt, spot = %spot.id, strategy = self.strategy.name(), "Spot secured");
                    return Ok(spot.clone());
                }
                Err(ParkingError::SpotUnavailable(id) | ParkingError::SpotNotFound(id)) => {
                    debug!(attempt, spot = %id, "Lost race for spot, retrying");
                }
                Err(err) => return Err(err),
            }
        }

        warn!(attempts = self.max_park_attempts, "Gave up after repeated races");
        Err(lot_full())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpotSeed;
    use crate::strategy::{NearestStrategy, SmallestFitStrategy, StrategyKind};
    use crate::types::SizeClass;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap()
    }

    fn spot(id: u64, size: u8, rate: Decimal, location: i64) -> ParkingSpot {
        ParkingSpot::new(SpotId(id), SizeClass(size), rate, location)
    }

    #[test]
    fn test_park_uses_strategy() {
        let lot = ParkingLot::with_strategy(NearestStrategy);
        lot.add_spot(spot(1, 2, dec!(1), 0)).unwrap();
        lot.add_spot(spot(2, 2, dec!(1), 10)).unwrap();

        let car = Vehicle::new("A", SizeClass::STANDARD);
        let receipt = lot.park(&car, t0(), 9).unwrap();
        assert_eq!(receipt.spot_id, SpotId(2));
        assert!(!lot.catalog().get(SpotId(2)).unwrap().is_available());
        assert_eq!(
            lot.active_ticket(&car.id).unwrap().id(),
            receipt.ticket_id
        );
    }

    #[test]
    fn test_park_never_assigns_smaller_spot() {
        let lot = ParkingLot::with_strategy(NearestStrategy);
        lot.add_spot(spot(1, 1, dec!(1), 0)).unwrap();
        lot.add_spot(spot(2, 3, dec!(1), 100)).unwrap();

        let bus = Vehicle::new("BUS", SizeClass::OVERSIZED);
        let receipt = lot.park(&bus, t0(), 0).unwrap();
        assert_eq!(receipt.spot_id, SpotId(2));
    }

    #[test]
    fn test_unpark_bills_and_releases() {
        let lot = ParkingLot::with_strategy(SmallestFitStrategy);
        lot.add_spot(spot(1, 2, dec!(2.50), 0)).unwrap();

        let car = Vehicle::new("A", SizeClass::STANDARD);
        lot.park(&car, t0(), 0).unwrap();
        let invoice = lot.unpark(&car.id, t0() + Duration::hours(2)).unwrap();

        assert_eq!(invoice.fee, dec!(5));
        assert_eq!(invoice.duration_hours, dec!(2));
        assert_eq!(invoice.ticket.exit_time(), Some(t0() + Duration::hours(2)));
        assert!(lot.catalog().get(SpotId(1)).unwrap().is_available());
        assert_eq!(lot.history(&car.id).len(), 1);
    }

    #[test]
    fn test_unpark_invalid_duration_keeps_session() {
        let lot = ParkingLot::with_strategy(SmallestFitStrategy);
        lot.add_spot(spot(1, 2, dec!(1), 0)).unwrap();
        let car = Vehicle::new("A", SizeClass::STANDARD);
        lot.park(&car, t0(), 0).unwrap();

        let err = lot
            .unpark(&car.id, t0() - Duration::seconds(30))
            .unwrap_err();
        assert!(matches!(err, ParkingError::InvalidDuration(_)));
        assert!(lot.active_ticket(&car.id).is_some());
        assert!(!lot.catalog().get(SpotId(1)).unwrap().is_available());
    }

    #[test]
    fn test_unpark_without_session() {
        let lot = ParkingLot::with_strategy(SmallestFitStrategy);
        assert!(matches!(
            lot.unpark(&VehicleId::new("GHOST"), t0()),
            Err(ParkingError::NoActiveSession(_))
        ));
    }

    #[test]
    fn test_injected_catalog_is_shared() {
        let catalog = Arc::new(SpotCatalog::new());
        let lot = ParkingLot::new(
            Arc::clone(&catalog),
            Arc::new(TicketLedger::default()),
            SmallestFitStrategy,
            FeeCalculator::default(),
        );
        lot.add_spot(spot(1, 2, dec!(4), 0)).unwrap();
        let car = Vehicle::new("A", SizeClass::STANDARD);
        lot.park(&car, t0(), 0).unwrap();

        let invoice = lot.unpark(&car.id, t0() + Duration::minutes(15)).unwrap();
        assert_eq!(invoice.fee, dec!(1));
        assert_eq!(catalog.available_count(), 1);
    }

    /// Reports a spot that another requester has just taken.
    struct Saboteur {
        catalog: Arc<SpotCatalog>,
        calls: AtomicUsize,
    }

    impl AssignmentStrategy for Saboteur {
        fn name(&self) -> &'static str {
            "saboteur"
        }

        fn assign<'a>(
            &self,
            _vehicle: &Vehicle,
            candidates: &'a [ParkingSpot],
            _context: &AssignmentContext,
        ) -> Option<&'a ParkingSpot> {
            let chosen = candidates.first()?;
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.catalog.occupy(chosen.id).ok()?;
            }
            Some(chosen)
        }
    }

    #[test]
    fn test_park_retries_after_lost_race() {
        let catalog = Arc::new(SpotCatalog::new());
        catalog.add_spot(spot(1, 2, dec!(1), 0)).unwrap();
        catalog.add_spot(spot(2, 2, dec!(1), 0)).unwrap();

        let lot = ParkingLot::new(
            Arc::clone(&catalog),
            Arc::new(TicketLedger::default()),
            Saboteur {
                catalog: Arc::clone(&catalog),
                calls: AtomicUsize::new(0),
            },
            FeeCalculator::default(),
        );

        let receipt = lot
            .park(&Vehicle::new("A", SizeClass::STANDARD), t0(), 0)
            .unwrap();
        assert_eq!(receipt.spot_id, SpotId(2));
        assert_eq!(lot.strategy().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_park_gives_up_after_bounded_retries() {
        /// Always loses the race.
        struct AlwaysStolen(Arc<SpotCatalog>);

        impl AssignmentStrategy for AlwaysStolen {
            fn name(&self) -> &'static str {
                "always_stolen"
            }

            fn assign<'a>(
                &self,
                _vehicle: &Vehicle,
                candidates: &'a [ParkingSpot],
                _context: &AssignmentContext,
            ) -> Option<&'a ParkingSpot> {
                let chosen = candidates.first()?;
                self.0.occupy(chosen.id).ok()?;
                Some(chosen)
            }
        }

        let catalog = Arc::new(SpotCatalog::new());
        for id in 1..=5 {
            catalog.add_spot(spot(id, 2, dec!(1), 0)).unwrap();
        }
        let lot = ParkingLot::new(
            Arc::clone(&catalog),
            Arc::new(TicketLedger::default()),
            AlwaysStolen(Arc::clone(&catalog)),
            FeeCalculator::default(),
        )
        .with_max_park_attempts(2);

        let err = lot
            .park(&Vehicle::new("A", SizeClass::STANDARD), t0(), 0)
            .unwrap_err();
        assert!(matches!(err, ParkingError::LotFull { .. }));
        assert_eq!(catalog.available_count(), 3);
        assert_eq!(lot.ledger().open_count(), 0);
    }

    #[test]
    fn test_failed_open_releases_spot() {
        let catalog = Arc::new(SpotCatalog::new());
        let ledger = Arc::new(TicketLedger::default());
        catalog.add_spot(spot(1, 2, dec!(1), 0)).unwrap();
        catalog.add_spot(spot(2, 2, dec!(1), 0)).unwrap();

        /// Opens a competing ticket for the same vehicle mid-park.
        struct DoubleBooker(Arc<TicketLedger>);

        impl AssignmentStrategy for DoubleBooker {
            fn name(&self) -> &'static str {
                "double_booker"
            }

            fn assign<'a>(
                &self,
                vehicle: &Vehicle,
                candidates: &'a [ParkingSpot],
                context: &AssignmentContext,
            ) -> Option<&'a ParkingSpot> {
                let (first, rest) = candidates.split_first()?;
                let other = rest.first()?;
                self.0
                    .open(vehicle, other, context.entry_time, context.entry_location)
                    .ok()?;
                Some(first)
            }
        }

        let lot = ParkingLot::new(
            Arc::clone(&catalog),
            Arc::clone(&ledger),
            DoubleBooker(Arc::clone(&ledger)),
            FeeCalculator::default(),
        );
        let err = lot
            .park(&Vehicle::new("A", SizeClass::STANDARD), t0(), 0)
            .unwrap_err();
        assert!(matches!(err, ParkingError::DuplicateSession(_)));
        assert!(catalog.get(SpotId(1)).unwrap().is_available());
    }

    #[test]
    fn test_fee_overflow_keeps_session_open() {
        let lot = ParkingLot::with_strategy(SmallestFitStrategy);
        lot.add_spot(spot(1, 2, Decimal::MAX, 0)).unwrap();
        let car = Vehicle::new("A", SizeClass::STANDARD);
        let receipt = lot.park(&car, t0(), 0).unwrap();

        let err = lot.unpark(&car.id, t0() + Duration::hours(2)).unwrap_err();
        assert!(matches!(err, ParkingError::FeeOverflow { .. }));

        let ticket = lot.active_ticket(&car.id).unwrap();
        assert_eq!(ticket.id(), receipt.ticket_id);
        assert!(ticket.is_open());
        assert!(lot.history(&car.id).is_empty());
        assert!(!lot.catalog().get(SpotId(1)).unwrap().is_available());
    }

    #[test]
    fn test_from_config_seeds_spots() {
        let mut config = LotConfig::default();
        config.lot.strategy = StrategyKind::Nearest;
        config.spots = vec![
            SpotSeed {
                id: 1,
                size_class: 2,
                hourly_rate: dec!(1),
                location: 0,
            },
            SpotSeed {
                id: 2,
                size_class: 2,
                hourly_rate: dec!(1),
                location: 50,
            },
        ];

        let lot = ParkingLot::from_config(&config).unwrap();
        assert_eq!(lot.strategy().name(), "nearest");
        assert_eq!(lot.status().total_spots, 2);
        let receipt = lot
            .park(&Vehicle::new("A", SizeClass::STANDARD), t0(), 45)
            .unwrap();
        assert_eq!(receipt.spot_id, SpotId(2));
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let mut config = LotConfig::default();
        config.lot.max_park_attempts = 0;
        let err = ParkingLot::from_config(&config).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_status_report() {
        let lot = ParkingLot::with_strategy(SmallestFitStrategy);
        lot.add_spot(spot(1, 1, dec!(1), 0)).unwrap();
        lot.add_spot(spot(2, 2, dec!(1), 0)).unwrap();
        lot.park(&Vehicle::new("A", SizeClass::COMPACT), t0(), 0)
            .unwrap();

        let status = lot.status();
        assert_eq!(status.total_spots, 2);
        assert_eq!(status.available_spots, 1);
        assert_eq!(status.open_sessions, 1);
        assert_eq!(status.by_size[0].available, 0);
    }
}
