//! Unified error types for the parkade core library.
//!
//! This module provides a unified error type [`ParkingError`] that covers every
//! failure mode of the engine. Configuration loading has its own
//! [`ConfigError`](crate::config::ConfigError) which converts into the unified
//! type.
//!
//! # Design Principles
//!
//! - **Specific variants**: Each error variant captures exactly one failure mode
//! - **Synchronous values**: Errors are returned, never used for control flow
//! - **HTTP-ready**: Error types include HTTP status codes and error codes
//!
//! # Example
//!
//! ```rust
//! use parkade_core::error::{ParkingError, Result};
//! use parkade_core::SpotId;
//!
//! fn require_spot(known: bool, id: SpotId) -> Result<()> {
//!     if !known {
//!         return Err(ParkingError::SpotNotFound(id));
//!     }
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{SizeClass, SpotId, VehicleId};

/// The unified error type for all parkade operations.
#[derive(Debug, Error)]
pub enum ParkingError {
    // =========================================================================
    // CATALOG ERRORS
    // =========================================================================
    /// A spot with this identity is already in the catalog.
    #[error("Spot {0} already exists")]
    DuplicateSpot(SpotId),

    /// No spot with this identity exists.
    #[error("Spot {0} not found")]
    SpotNotFound(SpotId),

    /// The spot is in use and cannot be removed.
    #[error("Spot {0} is occupied. Unpark its vehicle before removing it.")]
    SpotOccupied(SpotId),

    /// Occupy lost a race: the spot was taken between lookup and occupy.
    #[error("Spot {0} is no longer available")]
    SpotUnavailable(SpotId),

    /// Release was called on a spot that is already available.
    #[error("Spot {0} is not occupied")]
    SpotNotOccupied(SpotId),

    // =========================================================================
    // SESSION ERRORS
    // =========================================================================
    /// No available spot fits the vehicle right now.
    #[error("No available spot fits vehicle '{vehicle}' (size {size}). Try again later.")]
    LotFull {
        /// The vehicle that could not be placed.
        vehicle: VehicleId,
        /// Its size class.
        size: SizeClass,
    },

    /// The vehicle already has an open ticket.
    #[error("Vehicle '{0}' is already parked")]
    DuplicateSession(VehicleId),

    /// The vehicle has no open ticket.
    #[error("Vehicle '{0}' has no active parking session")]
    NoActiveSession(VehicleId),

    /// The vehicle identifier is malformed.
    #[error("Invalid vehicle id: '{0}'. Use up to 16 letters, digits, spaces or dashes.")]
    InvalidVehicleId(String),

    // =========================================================================
    // BILLING ERRORS
    // =========================================================================
    /// A duration was negative (exit before entry).
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    /// An hourly rate was negative.
    #[error("Invalid hourly rate {0}: rates must be non-negative")]
    InvalidRate(Decimal),

    /// Fee arithmetic exceeded the decimal range.
    #[error("Fee computation overflowed for rate {rate} over {hours} hours")]
    FeeOverflow {
        /// Hourly rate.
        rate: Decimal,
        /// Billed hours.
        hours: Decimal,
    },

    // =========================================================================
    // CONFIGURATION ERRORS
    // =========================================================================
    /// The configuration file was not found at the expected path.
    #[error("Configuration file not found at: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// The configuration could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// The configuration was parsed but contains invalid values.
    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    // =========================================================================
    // I/O ERRORS
    // =========================================================================
    /// A low-level I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A specialized [`Result`] type for parkade operations.
pub type Result<T> = std::result::Result<T, ParkingError>;

impl ParkingError {
    /// Returns `true` if this error concerns the spot catalog.
    #[inline]
    #[must_use]
    pub const fn is_catalog_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateSpot(_)
                | Self::SpotNotFound(_)
                | Self::SpotOccupied(_)
                | Self::SpotUnavailable(_)
                | Self::SpotNotOccupied(_)
        )
    }

    /// Returns `true` if this error concerns parking sessions.
    #[inline]
    #[must_use]
    pub const fn is_session_error(&self) -> bool {
        matches!(
            self,
            Self::LotFull { .. }
                | Self::DuplicateSession(_)
                | Self::NoActiveSession(_)
                | Self::InvalidVehicleId(_)
        )
    }

    /// Returns `true` if this error concerns fee computation.
    #[inline]
    #[must_use]
    pub const fn is_billing_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDuration(_) | Self::InvalidRate(_) | Self::FeeOverflow { .. }
        )
    }

    /// Returns `true` if this error is related to configuration.
    #[inline]
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound(_) | Self::ConfigParseError(_) | Self::ConfigValidationError(_)
        )
    }

    /// Returns `true` if this error represents an expected operational state.
    ///
    /// A full lot is not a failure of the system; callers may simply retry
    /// later.
    #[inline]
    #[must_use]
    pub const fn is_expected_state(&self) -> bool {
        matches!(self, Self::LotFull { .. })
    }

    /// Returns an HTTP-appropriate status code for this error.
    #[inline]
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - malformed input
            Self::InvalidVehicleId(_) | Self::InvalidDuration(_) | Self::InvalidRate(_) => 400,

            // 404 Not Found
            Self::SpotNotFound(_) | Self::NoActiveSession(_) | Self::ConfigNotFound(_) => 404,

            // 409 Conflict - valid request refused by current state
            Self::DuplicateSpot(_)
            | Self::SpotOccupied(_)
            | Self::SpotUnavailable(_)
            | Self::SpotNotOccupied(_)
            | Self::LotFull { .. }
            | Self::DuplicateSession(_) => 409,

            // 422 Unprocessable Entity - semantic errors
            Self::FeeOverflow { .. } | Self::ConfigParseError(_) | Self::ConfigValidationError(_) => {
                422
            }

            // 500 Internal Server Error
            Self::IoError(_) => 500,
        }
    }

    /// Returns a machine-readable error code for API responses.
    #[inline]
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateSpot(_) => "DUPLICATE_SPOT",
            Self::SpotNotFound(_) => "SPOT_NOT_FOUND",
            Self::SpotOccupied(_) => "SPOT_OCCUPIED",
            Self::SpotUnavailable(_) => "SPOT_UNAVAILABLE",
            Self::SpotNotOccupied(_) => "SPOT_NOT_OCCUPIED",
            Self::LotFull { .. } => "LOT_FULL",
            Self::DuplicateSession(_) => "DUPLICATE_SESSION",
            Self::NoActiveSession(_) => "NO_ACTIVE_SESSION",
            Self::InvalidVehicleId(_) => "INVALID_VEHICLE_ID",
            Self::InvalidDuration(_) => "INVALID_DURATION",
            Self::InvalidRate(_) => "INVALID_RATE",
            Self::FeeOverflow { .. } => "FEE_OVERFLOW",
            Self::ConfigNotFound(_) => "CONFIG_NOT_FOUND",
            Self::ConfigParseError(_) => "CONFIG_PARSE_ERROR",
            Self::ConfigValidationError(_) => "CONFIG_VALIDATION_ERROR",
            Self::IoError(_) => "IO_ERROR",
        }
    }
}

// =============================================================================
// CONVERSIONS FROM MODULE-SPECIFIC ERRORS
// =============================================================================

impl From<crate::config::ConfigError> for ParkingError {
    fn from(err: crate::config::ConfigError) -> Self {
        use crate::config::ConfigError;
        match err {
            ConfigError::NotFound(path) => Self::ConfigNotFound(path),
            ConfigError::Load(e) => Self::ConfigParseError(e.to_string()),
            ConfigError::Serialize(e) => Self::ConfigParseError(e.to_string()),
            ConfigError::Write { path, source } => Self::IoError(std::io::Error::new(
                source.kind(),
                format!("Failed to write {}: {source}", path.display()),
            )),
            ConfigError::Validation { field, message } => {
                Self::ConfigValidationError(format!("{field}: {message}"))
            }
            ConfigError::MultipleValidationErrors(errors) => {
                let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                Self::ConfigValidationError(messages.join("; "))
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
