//! Time-based fee computation.
//!
//! Money is exact decimal. Elapsed time is measured in whole milliseconds and
//! divided into hours without going through floating point. Quotients that do
//! not terminate, such as 20 minutes, are cut off at 28 significant digits.
//! The product `rate * hours` is then rounded once, to
//! [`FeeCalculator::scale`] fractional digits, with banker's rounding, which
//! absorbs that residue.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::BillingConfig;
use crate::error::{ParkingError, Result};

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Default number of fractional digits kept on fees.
pub const DEFAULT_FEE_SCALE: u32 = 4;

/// Turns an hourly rate and a duration into an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeCalculator {
    scale: u32,
}

impl Default for FeeCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_FEE_SCALE)
    }
}

impl From<&BillingConfig> for FeeCalculator {
    fn from(config: &BillingConfig) -> Self {
        Self::new(config.fee_scale)
    }
}

impl FeeCalculator {
    /// Create a calculator keeping `scale` fractional digits.
    #[must_use]
    pub const fn new(scale: u32) -> Self {
        Self { scale }
    }

    /// Fractional digits kept on computed fees.
    #[must_use]
    pub const fn scale(&self) -> u32 {
        self.scale
    }

    /// `rate * duration_hours`, rounded to the configured scale.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::InvalidDuration`] for a negative duration,
    /// [`ParkingError::InvalidRate`] for a negative rate and
    /// [`ParkingError::FeeOverflow`] if the product does not fit a decimal.
    pub fn compute_fee(&self, rate: Decimal, duration_hours: Decimal) -> Result<Decimal> {
        if is_negative(duration_hours) {
            return Err(ParkingError::InvalidDuration(format!(
                "{duration_hours} hours is negative"
            )));
        }
        if is_negative(rate) {
            return Err(ParkingError::InvalidRate(rate));
        }

        let amount = rate
            .checked_mul(duration_hours)
            .ok_or(ParkingError::FeeOverflow {
                rate,
                hours: duration_hours,
            })?;
        Ok(amount
            .round_dp_with_strategy(self.scale, RoundingStrategy::MidpointNearestEven)
            .normalize())
    }
}

/// Hours between `entry` and `exit` as a decimal.
///
/// Exact when the millisecond count divides evenly into hours or a
/// terminating fraction of one. Otherwise the quotient is cut off at 28
/// significant digits and the fee rounding absorbs the remainder.
///
/// # Errors
///
/// Returns [`ParkingError::InvalidDuration`] if `exit` precedes `entry`.
pub fn elapsed_hours(entry: DateTime<Utc>, exit: DateTime<Utc>) -> Result<Decimal> {
    if exit < entry {
        return Err(ParkingError::InvalidDuration(format!(
            "exit {exit} precedes entry {entry}"
        )));
    }
    let millis = (exit - entry).num_milliseconds();
    Ok(Decimal::from(millis) / Decimal::from(MILLIS_PER_HOUR))
}

fn is_negative(value: Decimal) -> bool {
    value.is_sign_negative() && !value.is_zero()
}
