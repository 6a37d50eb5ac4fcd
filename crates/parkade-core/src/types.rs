//! Shared domain types and OpenAPI schemas.
//!
//! Identifiers, size classes and vehicles are defined here because every
//! other module needs them. Spots live in [`crate::catalog`] and tickets in
//! [`crate::ledger`].

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Maximum length of a vehicle identifier (licence plate or similar).
pub const MAX_VEHICLE_ID_LENGTH: usize = 16;

static VEHICLE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 -]{0,15}$").expect("valid regex"));

/// Returns `true` if `value` is an acceptable vehicle identifier.
///
/// Identifiers start with an ASCII letter or digit, may contain spaces and
/// dashes after that, and are at most [`MAX_VEHICLE_ID_LENGTH`] characters.
#[must_use]
pub fn is_valid_vehicle_id(value: &str) -> bool {
    VEHICLE_ID_RE.is_match(value)
}

/// Identity of a parking spot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = u64, example = 12)]
pub struct SpotId(pub u64);

impl fmt::Display for SpotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for SpotId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Identity of a vehicle, usually its licence plate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "KA-1234")]
pub struct VehicleId(String);

impl VehicleId {
    /// Create a vehicle id without validation.
    ///
    /// Use [`VehicleId::parse`] for untrusted input.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Validate and create a vehicle id.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::InvalidVehicleId`](crate::ParkingError::InvalidVehicleId)
    /// if the value fails [`is_valid_vehicle_id`].
    pub fn parse(value: &str) -> crate::Result<Self> {
        if is_valid_vehicle_id(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(crate::ParkingError::InvalidVehicleId(value.to_string()))
        }
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VehicleId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Ordered size class shared by vehicles and spots.
///
/// A spot fits a vehicle when the spot's class is greater than or equal to
/// the vehicle's.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = u8, example = 2)]
pub struct SizeClass(pub u8);

impl SizeClass {
    /// Motorcycles and scooters.
    pub const COMPACT: Self = Self(1);
    /// Regular passenger cars.
    pub const STANDARD: Self = Self(2);
    /// Vans, buses and trucks.
    pub const OVERSIZED: Self = Self(3);

    /// Whether a spot of this class can hold a vehicle of class `vehicle`.
    #[inline]
    #[must_use]
    pub const fn fits(self, vehicle: Self) -> bool {
        self.0 >= vehicle.0
    }

    /// Capacity left unused when a vehicle of class `vehicle` parks here.
    #[inline]
    #[must_use]
    pub const fn waste(self, vehicle: Self) -> u8 {
        self.0.saturating_sub(vehicle.0)
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::COMPACT => f.write_str("compact"),
            Self::STANDARD => f.write_str("standard"),
            Self::OVERSIZED => f.write_str("oversized"),
            Self(other) => write!(f, "size-{other}"),
        }
    }
}

/// Broad vehicle category, used to pick a default size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VehicleKind {
    /// Two-wheelers.
    Motorcycle,
    /// Passenger cars.
    Car,
    /// Buses, vans, trucks.
    Bus,
}

impl From<VehicleKind> for SizeClass {
    fn from(kind: VehicleKind) -> Self {
        match kind {
            VehicleKind::Motorcycle => Self::COMPACT,
            VehicleKind::Car => Self::STANDARD,
            VehicleKind::Bus => Self::OVERSIZED,
        }
    }
}

/// A vehicle requesting a spot. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct Vehicle {
    /// Vehicle identity.
    pub id: VehicleId,

    /// Size class of the vehicle.
    pub size: SizeClass,
}

impl Vehicle {
    /// Create a vehicle with an explicit size class.
    pub fn new(id: impl Into<VehicleId>, size: SizeClass) -> Self {
        Self {
            id: id.into(),
            size,
        }
    }

    /// Create a vehicle sized by its kind.
    pub fn of_kind(id: impl Into<VehicleId>, kind: VehicleKind) -> Self {
        Self::new(id, kind.into())
    }
}

impl From<String> for VehicleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_class_ordering() {
        assert!(SizeClass::COMPACT < SizeClass::STANDARD);
        assert!(SizeClass::STANDARD < SizeClass::OVERSIZED);
        assert!(SizeClass::OVERSIZED.fits(SizeClass::COMPACT));
        assert!(SizeClass::STANDARD.fits(SizeClass::STANDARD));
        assert!(!SizeClass::COMPACT.fits(SizeClass::STANDARD));
    }

    #[test]
    fn test_size_class_waste() {
        assert_eq!(SizeClass::OVERSIZED.waste(SizeClass::COMPACT), 2);
        assert_eq!(SizeClass::STANDARD.waste(SizeClass::STANDARD), 0);
        assert_eq!(SizeClass::COMPACT.waste(SizeClass::OVERSIZED), 0);
    }

    #[test]
    fn test_vehicle_kind_sizes() {
        let bus = Vehicle::of_kind("BUS-1", VehicleKind::Bus);
        assert_eq!(bus.size, SizeClass::OVERSIZED);
        assert_eq!(SizeClass::from(VehicleKind::Motorcycle), SizeClass::COMPACT);
    }

    #[test]
    fn test_vehicle_id_validation() {
        assert!(is_valid_vehicle_id("KA-1234"));
        assert!(is_valid_vehicle_id("B MW 42"));
        assert!(!is_valid_vehicle_id(""));
        assert!(!is_valid_vehicle_id("-LEADING"));
        assert!(!is_valid_vehicle_id("THIS-PLATE-IS-WAY-TOO-LONG"));
        assert!(!is_valid_vehicle_id("semi;colon"));

        assert!(VehicleId::parse("AB-12").is_ok());
        assert!(matches!(
            VehicleId::parse("bad/plate"),
            Err(crate::ParkingError::InvalidVehicleId(_))
        ));
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&SpotId(7)).unwrap();
        assert_eq!(json, "7");
        let json = serde_json::to_string(&VehicleId::new("X1")).unwrap();
        assert_eq!(json, "\"X1\"");
        let kind: VehicleKind = serde_json::from_str("\"motorcycle\"").unwrap();
        assert_eq!(kind, VehicleKind::Motorcycle);
    }

    #[test]
    fn test_display() {
        assert_eq!(SpotId(3).to_string(), "#3");
        assert_eq!(SizeClass::STANDARD.to_string(), "standard");
        assert_eq!(SizeClass(9).to_string(), "size-9");
    }
}
