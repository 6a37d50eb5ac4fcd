//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Instant;

use parkade_core::{LotConfig, ParkingLot};

/// State handle passed to every handler.
pub type SharedState = Arc<AppState>;

/// The lot being served and the configuration it was built from.
///
/// [`ParkingLot`] synchronizes internally, so handlers share it without an
/// outer lock.
#[derive(Debug)]
pub struct AppState {
    /// Configuration the lot was built from.
    pub config: LotConfig,

    /// The parking lot controller.
    pub lot: ParkingLot,

    started_at: Instant,
}

impl AppState {
    /// Build the lot described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or seeds a bad spot.
    pub fn new(config: LotConfig) -> parkade_core::Result<Self> {
        let lot = ParkingLot::from_config(&config)?;
        Ok(Self::with_lot(config, lot))
    }

    /// Wrap an already constructed lot.
    #[must_use]
    pub fn with_lot(config: LotConfig, lot: ParkingLot) -> Self {
        Self {
            config,
            lot,
            started_at: Instant::now(),
        }
    }

    /// Convert into the shared handle handlers expect.
    #[must_use]
    pub fn shared(self) -> SharedState {
        Arc::new(self)
    }

    /// Seconds since the state was created.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkade_core::SpotSeed;
    use rust_decimal_macros::dec;

    #[test]
    fn test_state_seeds_configured_spots() {
        let mut config = LotConfig::default();
        config.spots.push(SpotSeed {
            id: 1,
            size_class: 2,
            hourly_rate: dec!(1.50),
            location: 0,
        });

        let state = AppState::new(config).unwrap();
        assert_eq!(state.lot.status().total_spots, 1);
        assert!(state.uptime_secs() < 5);
    }

    #[test]
    fn test_state_rejects_invalid_config() {
        let mut config = LotConfig::default();
        config.lot.max_park_attempts = 0;
        assert!(AppState::new(config).is_err());
    }
}
