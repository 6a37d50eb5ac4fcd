//! Pluggable spot assignment policies.
//!
//! Any type implementing [`AssignmentStrategy`] can drive a
//! [`ParkingLot`](crate::ParkingLot). Strategies are stateless: the same
//! vehicle, candidates and context always produce the same choice. Ties are
//! broken by the lowest [`SpotId`](crate::SpotId) so results are reproducible.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::catalog::ParkingSpot;
use crate::types::Vehicle;

/// Where and when a vehicle arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentContext {
    /// Entry location, on the same axis as [`ParkingSpot::location`].
    pub entry_location: i64,

    /// Entry time.
    pub entry_time: DateTime<Utc>,
}

/// Picks one spot out of a candidate set.
pub trait AssignmentStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Select a spot from `candidates`, or `None` if there is nothing to pick.
    ///
    /// The returned reference always points into `candidates`.
    fn assign<'a>(
        &self,
        vehicle: &Vehicle,
        candidates: &'a [ParkingSpot],
        context: &AssignmentContext,
    ) -> Option<&'a ParkingSpot>;
}

impl<S: AssignmentStrategy + ?Sized> AssignmentStrategy for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn assign<'a>(
        &self,
        vehicle: &Vehicle,
        candidates: &'a [ParkingSpot],
        context: &AssignmentContext,
    ) -> Option<&'a ParkingSpot> {
        (**self).assign(vehicle, candidates, context)
    }
}

/// Closest spot to the entry location.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestStrategy;

impl AssignmentStrategy for NearestStrategy {
    fn name(&self) -> &'static str {
        "nearest"
    }

    fn assign<'a>(
        &self,
        _vehicle: &Vehicle,
        candidates: &'a [ParkingSpot],
        context: &AssignmentContext,
    ) -> Option<&'a ParkingSpot> {
        candidates
            .iter()
            .min_by_key(|spot| (spot.location.abs_diff(context.entry_location), spot.id))
    }
}

/// Spot wasting the least capacity.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmallestFitStrategy;

impl AssignmentStrategy for SmallestFitStrategy {
    fn name(&self) -> &'static str {
        "smallest_fit"
    }

    fn assign<'a>(
        &self,
        vehicle: &Vehicle,
        candidates: &'a [ParkingSpot],
        _context: &AssignmentContext,
    ) -> Option<&'a ParkingSpot> {
        candidates
            .iter()
            .filter(|spot| spot.size.fits(vehicle.size))
            .min_by_key(|spot| (spot.size.waste(vehicle.size), spot.id))
    }
}

/// Built-in strategies selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// [`NearestStrategy`].
    Nearest,
    /// [`SmallestFitStrategy`].
    SmallestFit,
}

impl StrategyKind {
    /// Instantiate the strategy.
    #[must_use]
    pub fn build(self) -> Box<dyn AssignmentStrategy> {
        match self {
            Self::Nearest => Box::new(NearestStrategy),
            Self::SmallestFit => Box::new(SmallestFitStrategy),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => f.write_str("nearest"),
            Self::SmallestFit => f.write_str("smallest_fit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SizeClass, SpotId};
    use rust_decimal_macros::dec;

    fn spot(id: u64, size: u8, location: i64) -> ParkingSpot {
        ParkingSpot::new(SpotId(id), SizeClass(size), dec!(1), location)
    }

    fn at(location: i64) -> AssignmentContext {
        AssignmentContext {
            entry_location: location,
            entry_time: Utc::now(),
        }
    }

    fn car() -> Vehicle {
        Vehicle::new("CAR-1", SizeClass::STANDARD)
    }

    #[test]
    fn test_nearest_picks_closest() {
        let candidates = [spot(1, 2, 0), spot(2, 2, 8), spot(3, 2, 12)];
        let chosen = NearestStrategy.assign(&car(), &candidates, &at(10)).unwrap();
        assert_eq!(chosen.id, SpotId(2));
    }

    #[test]
    fn test_nearest_tie_breaks_on_lowest_id() {
        // Spots 7 and 3 are both 5 away from location 5; order must not matter.
        let forward = [spot(7, 2, 10), spot(3, 2, 0)];
        let backward = [spot(3, 2, 0), spot(7, 2, 10)];
        for _ in 0..10 {
            assert_eq!(
                NearestStrategy.assign(&car(), &forward, &at(5)).unwrap().id,
                SpotId(3)
            );
            assert_eq!(
                NearestStrategy.assign(&car(), &backward, &at(5)).unwrap().id,
                SpotId(3)
            );
        }
    }

    #[test]
    fn test_nearest_handles_extreme_locations() {
        let candidates = [spot(1, 2, i64::MIN), spot(2, 2, i64::MAX)];
        let chosen = NearestStrategy.assign(&car(), &candidates, &at(1)).unwrap();
        assert_eq!(chosen.id, SpotId(2));
    }

    #[test]
    fn test_smallest_fit_minimizes_waste() {
        let candidates = [spot(1, 3, 0), spot(2, 2, 100), spot(3, 4, 0)];
        let chosen = SmallestFitStrategy
            .assign(&car(), &candidates, &at(0))
            .unwrap();
        assert_eq!(chosen.id, SpotId(2));
    }

    #[test]
    fn test_smallest_fit_tie_breaks_on_lowest_id() {
        let candidates = [spot(9, 3, 0), spot(4, 3, 0), spot(6, 3, 0)];
        let chosen = SmallestFitStrategy
            .assign(&car(), &candidates, &at(0))
            .unwrap();
        assert_eq!(chosen.id, SpotId(4));
    }

    #[test]
    fn test_empty_candidates_yield_none() {
        assert!(NearestStrategy.assign(&car(), &[], &at(0)).is_none());
        assert!(SmallestFitStrategy.assign(&car(), &[], &at(0)).is_none());
    }

    #[test]
    fn test_boxed_strategy_from_kind() {
        let strategy = StrategyKind::Nearest.build();
        assert_eq!(strategy.name(), "nearest");
        let candidates = [spot(1, 2, 50), spot(2, 2, 1)];
        assert_eq!(
            strategy.assign(&car(), &candidates, &at(0)).unwrap().id,
            SpotId(2)
        );
        assert_eq!(StrategyKind::SmallestFit.build().name(), "smallest_fit");
    }

    #[test]
    fn test_strategy_kind_serde() {
        let kind: StrategyKind = serde_json::from_str("\"smallest_fit\"").unwrap();
        assert_eq!(kind, StrategyKind::SmallestFit);
        assert_eq!(StrategyKind::Nearest.to_string(), "nearest");
    }
}
