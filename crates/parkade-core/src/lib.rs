//! # parkade-core
//!
//! Core engine for the parkade parking lot system.
//!
//! This crate provides:
//! - Spot inventory with size-class indexed availability
//! - Pluggable spot assignment strategies
//! - Session tickets with a one-open-ticket-per-vehicle guarantee
//! - Exact decimal, time-based fee computation
//! - Layered configuration for the lot and its server
//!
//! ## Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`catalog`] - Spot ownership, candidate lookup, occupy/release
//! - [`strategy`] - Assignment policies (nearest, smallest fit)
//! - [`ledger`] - Ticket lifecycle and audit history
//! - [`billing`] - Fee computation and its precision policy
//! - [`lot`] - The controller orchestrating park and unpark
//! - [`config`] - Configuration loading, saving, and validation
//! - [`error`] - Unified error types for the crate
//! - [`types`] - Shared identifiers, size classes and vehicles

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

pub mod billing;
pub mod catalog;
pub mod config;
pub mod error;
pub mod ledger;
pub mod lot;
pub mod strategy;
pub mod types;

// Re-export primary types for convenience
pub use billing::{elapsed_hours, FeeCalculator, DEFAULT_FEE_SCALE};
pub use catalog::{ParkingSpot, SizeOccupancy, SpotCatalog};
pub use config::{
    default_config_path, BillingConfig, ConfigError, ConfigResult, LotConfig, LotSettings,
    ServerConfig, SpotSeed,
};
pub use error::{ParkingError, Result};
pub use ledger::{Ticket, TicketId, TicketLedger};
pub use lot::{Invoice, LotStatus, ParkReceipt, ParkingLot, DEFAULT_MAX_PARK_ATTEMPTS};
pub use strategy::{
    AssignmentContext, AssignmentStrategy, NearestStrategy, SmallestFitStrategy, StrategyKind,
};
pub use types::{
    is_valid_vehicle_id, SizeClass, SpotId, Vehicle, VehicleId, VehicleKind,
    MAX_VEHICLE_ID_LENGTH,
};
