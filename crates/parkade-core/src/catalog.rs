//! Spot inventory and availability.
//!
//! [`SpotCatalog`] owns every [`ParkingSpot`] and is the only place their
//! availability flag changes. Available spots are additionally bucketed by
//! size class so candidate lookup only walks buckets that can fit the
//! vehicle.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::error::{ParkingError, Result};
use crate::types::{SizeClass, SpotId, Vehicle};

/// A unit of parkable capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "size": 2,
    "hourly_rate": "2.50",
    "location": 0,
    "available": true
}))]
pub struct ParkingSpot {
    /// Spot identity.
    pub id: SpotId,

    /// Largest vehicle size class this spot holds.
    pub size: SizeClass,

    /// Price per hour.
    #[schema(value_type = String, example = "2.50")]
    pub hourly_rate: Decimal,

    /// Position along the lot, used by distance-based strategies.
    pub location: i64,

    available: bool,
}

impl ParkingSpot {
    /// Create an available spot.
    #[must_use]
    pub const fn new(id: SpotId, size: SizeClass, hourly_rate: Decimal, location: i64) -> Self {
        Self {
            id,
            size,
            hourly_rate,
            location,
            available: true,
        }
    }

    /// Whether no vehicle currently holds this spot.
    #[inline]
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.available
    }

    /// Whether this spot is free and large enough for `vehicle`.
    #[inline]
    #[must_use]
    pub const fn can_fit(&self, vehicle: &Vehicle) -> bool {
        self.available && self.size.fits(vehicle.size)
    }
}

/// Available/total counts for one size class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SizeOccupancy {
    /// Size class.
    pub size: SizeClass,
    /// Spots of this class.
    pub total: usize,
    /// Spots of this class that are free.
    pub available: usize,
}

#[derive(Debug, Default)]
struct Inner {
    spots: BTreeMap<SpotId, ParkingSpot>,
    free_by_size: BTreeMap<SizeClass, BTreeSet<SpotId>>,
}

impl Inner {
    fn mark_free(&mut self, spot: &ParkingSpot) {
        self.free_by_size
            .entry(spot.size)
            .or_default()
            .insert(spot.id);
    }

    fn mark_taken(&mut self, spot: &ParkingSpot) {
        if let Some(bucket) = self.free_by_size.get_mut(&spot.size) {
            bucket.remove(&spot.id);
            if bucket.is_empty() {
                self.free_by_size.remove(&spot.size);
            }
        }
    }
}

/// Thread-safe catalog of parking spots.
///
/// Every method takes `&self`; [`SpotCatalog::occupy`] is a compare-and-set
/// on the availability flag, so two callers racing for the same spot see
/// exactly one success.
#[derive(Debug, Default)]
pub struct SpotCatalog {
    inner: RwLock<Inner>,
}

impl SpotCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a spot. Spots are always inserted available.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::DuplicateSpot`] if the id is taken and
    /// [`ParkingError::InvalidRate`] if the rate is negative.
    pub fn add_spot(&self, spot: ParkingSpot) -> Result<()> {
        if spot.hourly_rate.is_sign_negative() && !spot.hourly_rate.is_zero() {
            return Err(ParkingError::InvalidRate(spot.hourly_rate));
        }

        let mut inner = self.inner.write();
        if inner.spots.contains_key(&spot.id) {
            return Err(ParkingError::DuplicateSpot(spot.id));
        }

        let spot = ParkingSpot {
            available: true,
            ..spot
        };
        info!(spot = %spot.id, size = %spot.size, rate = %spot.hourly_rate, "Spot added");
        inner.mark_free(&spot);
        inner.spots.insert(spot.id, spot);
        Ok(())
    }

    /// Delete an available spot, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::SpotNotFound`] or [`ParkingError::SpotOccupied`].
    pub fn remove_spot(&self, id: SpotId) -> Result<ParkingSpot> {
        let mut inner = self.inner.write();
        let spot = inner.spots.get(&id).ok_or(ParkingError::SpotNotFound(id))?;
        if !spot.available {
            return Err(ParkingError::SpotOccupied(id));
        }

        let spot = spot.clone();
        inner.mark_taken(&spot);
        inner.spots.remove(&id);
        info!(spot = %id, "Spot removed");
        Ok(spot)
    }

    /// Every available spot large enough for `vehicle`, ordered by id.
    ///
    /// An empty result is not an error.
    #[must_use]
    pub fn find_candidates(&self, vehicle: &Vehicle) -> Vec<ParkingSpot> {
        let inner = self.inner.read();
        let mut candidates: Vec<ParkingSpot> = inner
            .free_by_size
            .range(vehicle.size..)
            .flat_map(|(_, ids)| ids.iter())
            .filter_map(|id| inner.spots.get(id))
            .cloned()
            .collect();
        candidates.sort_unstable_by_key(|spot| spot.id);
        debug!(
            vehicle = %vehicle.id,
            size = %vehicle.size,
            candidates = candidates.len(),
            "Candidate lookup"
        );
        candidates
    }

    /// Mark a spot occupied if, and only if, it is still available.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::SpotUnavailable`] if another caller got there
    /// first and [`ParkingError::SpotNotFound`] if the spot is gone.
    pub fn occupy(&self, id: SpotId) -> Result<()> {
        let mut inner = self.inner.write();
        let spot = inner
            .spots
            .get_mut(&id)
            .ok_or(ParkingError::SpotNotFound(id))?;
        if !spot.available {
            return Err(ParkingError::SpotUnavailable(id));
        }
        spot.available = false;
        let spot = spot.clone();
        inner.mark_taken(&spot);
        Ok(())
    }

    /// Mark an occupied spot available again.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::SpotNotOccupied`] or [`ParkingError::SpotNotFound`].
    pub fn release(&self, id: SpotId) -> Result<()> {
        let mut inner = self.inner.write();
        let spot = inner
            .spots
            .get_mut(&id)
            .ok_or(ParkingError::SpotNotFound(id))?;
        if spot.available {
            return Err(ParkingError::SpotNotOccupied(id));
        }
        spot.available = true;
        let spot = spot.clone();
        inner.mark_free(&spot);
        Ok(())
    }

    /// Snapshot of a single spot.
    #[must_use]
    pub fn get(&self, id: SpotId) -> Option<ParkingSpot> {
        self.inner.read().spots.get(&id).cloned()
    }

    /// Snapshot of every spot, ordered by id.
    #[must_use]
    pub fn spots(&self) -> Vec<ParkingSpot> {
        self.inner.read().spots.values().cloned().collect()
    }

    /// Number of spots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().spots.len()
    }

    /// Whether the catalog has no spots at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().spots.is_empty()
    }

    /// Number of available spots.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.inner.read().free_by_size.values().map(BTreeSet::len).sum()
    }

    /// Per-size-class totals, smallest class first.
    #[must_use]
    pub fn occupancy(&self) -> Vec<SizeOccupancy> {
        let inner = self.inner.read();
        let mut by_size: BTreeMap<SizeClass, SizeOccupancy> = BTreeMap::new();
        for spot in inner.spots.values() {
            let entry = by_size.entry(spot.size).or_insert(SizeOccupancy {
                size: spot.size,
                total: 0,
                available: 0,
            });
            entry.total += 1;
            if spot.available {
                entry.available += 1;
            }
        }
        by_size.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn spot(id: u64, size: u8) -> ParkingSpot {
        ParkingSpot::new(SpotId(id), SizeClass(size), dec!(2.0), 0)
    }

    fn catalog_with(spots: &[(u64, u8)]) -> SpotCatalog {
        let catalog = SpotCatalog::new();
        for &(id, size) in spots {
            catalog.add_spot(spot(id, size)).unwrap();
        }
        catalog
    }

    #[test]
    fn test_add_duplicate_spot() {
        let catalog = catalog_with(&[(1, 2)]);
        let err = catalog.add_spot(spot(1, 3)).unwrap_err();
        assert!(matches!(err, ParkingError::DuplicateSpot(SpotId(1))));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_add_negative_rate() {
        let catalog = SpotCatalog::new();
        let bad = ParkingSpot::new(SpotId(1), SizeClass::STANDARD, dec!(-0.5), 0);
        assert!(matches!(
            catalog.add_spot(bad),
            Err(ParkingError::InvalidRate(_))
        ));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_candidates_filter_by_size_and_availability() {
        let catalog = catalog_with(&[(4, 3), (1, 1), (2, 2), (3, 2)]);
        catalog.occupy(SpotId(3)).unwrap();

        let car = Vehicle::new("CAR", SizeClass::STANDARD);
        let ids: Vec<u64> = catalog
            .find_candidates(&car)
            .iter()
            .map(|s| s.id.0)
            .collect();
        assert_eq!(ids, vec![2, 4]);

        let bike = Vehicle::new("BIKE", SizeClass::COMPACT);
        assert_eq!(catalog.find_candidates(&bike).len(), 3);

        let truck = Vehicle::new("TRUCK", SizeClass(4));
        assert!(catalog.find_candidates(&truck).is_empty());
    }

    #[test]
    fn test_candidates_match_linear_scan() {
        let catalog = catalog_with(&[(10, 1), (11, 3), (12, 2), (13, 3), (14, 1), (15, 2)]);
        catalog.occupy(SpotId(11)).unwrap();
        catalog.occupy(SpotId(14)).unwrap();

        for size in 0..=4 {
            let vehicle = Vehicle::new("V", SizeClass(size));
            let indexed = catalog.find_candidates(&vehicle);
            let scanned: Vec<ParkingSpot> = catalog
                .spots()
                .into_iter()
                .filter(|s| s.can_fit(&vehicle))
                .collect();
            assert_eq!(indexed, scanned, "size {size}");
        }
    }

    #[test]
    fn test_occupy_twice_fails() {
        let catalog = catalog_with(&[(1, 2)]);
        catalog.occupy(SpotId(1)).unwrap();
        assert!(matches!(
            catalog.occupy(SpotId(1)),
            Err(ParkingError::SpotUnavailable(SpotId(1)))
        ));
        assert!(matches!(
            catalog.occupy(SpotId(9)),
            Err(ParkingError::SpotNotFound(SpotId(9)))
        ));
    }

    #[test]
    fn test_release_restores_availability() {
        let catalog = catalog_with(&[(1, 2)]);
        catalog.occupy(SpotId(1)).unwrap();
        assert_eq!(catalog.available_count(), 0);

        catalog.release(SpotId(1)).unwrap();
        assert_eq!(catalog.available_count(), 1);
        assert!(catalog.get(SpotId(1)).unwrap().is_available());

        assert!(matches!(
            catalog.release(SpotId(1)),
            Err(ParkingError::SpotNotOccupied(SpotId(1)))
        ));
    }

    #[test]
    fn test_remove_occupied_then_released() {
        let catalog = catalog_with(&[(1, 2)]);
        catalog.occupy(SpotId(1)).unwrap();
        assert!(matches!(
            catalog.remove_spot(SpotId(1)),
            Err(ParkingError::SpotOccupied(SpotId(1)))
        ));

        catalog.release(SpotId(1)).unwrap();
        let removed = catalog.remove_spot(SpotId(1)).unwrap();
        assert_eq!(removed.id, SpotId(1));
        assert!(catalog.is_empty());
        assert_eq!(catalog.available_count(), 0);

        assert!(matches!(
            catalog.remove_spot(SpotId(1)),
            Err(ParkingError::SpotNotFound(SpotId(1)))
        ));
    }

    #[test]
    fn test_occupancy_report() {
        let catalog = catalog_with(&[(1, 1), (2, 2), (3, 2)]);
        catalog.occupy(SpotId(2)).unwrap();

        let report = catalog.occupancy();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].size, SizeClass::COMPACT);
        assert_eq!(report[1].total, 2);
        assert_eq!(report[1].available, 1);
    }

    #[test]
    fn test_spot_serializes_availability() {
        let catalog = catalog_with(&[(1, 2)]);
        let json = serde_json::to_string(&catalog.get(SpotId(1)).unwrap()).unwrap();
        assert!(json.contains("\"available\":true"));
        assert!(json.contains("\"hourly_rate\":\"2.0\""));
    }
}
