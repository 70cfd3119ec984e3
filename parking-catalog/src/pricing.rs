use chrono::{DateTime, Utc};
use parking_core::LedgerError;
use serde::{Deserialize, Serialize};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Digits kept after the decimal point when a cost is rounded
    pub decimal_places: u32,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self { decimal_places: 2 }
    }
}

/// Time-based billing: elapsed hours times the lot's hourly rate
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    /// Fractional hours between two instants, millisecond resolution.
    pub fn hours_elapsed(
        &self,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Result<f64, PricingError> {
        let millis = (ended_at - started_at).num_milliseconds();
        if millis < 0 {
            return Err(PricingError::EndBeforeStart {
                started_at,
                ended_at,
            });
        }
        Ok(millis as f64 / MILLIS_PER_HOUR)
    }

    /// cost = round(hours * rate, decimal_places)
    pub fn cost(
        &self,
        hourly_rate: f64,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Result<f64, PricingError> {
        if !hourly_rate.is_finite() || hourly_rate < 0.0 {
            return Err(PricingError::InvalidRate(hourly_rate));
        }
        let hours = self.hours_elapsed(started_at, ended_at)?;
        Ok(self.round(hours * hourly_rate))
    }

    /// Round to the configured precision, ties to even (0.125 -> 0.12)
    pub fn round(&self, value: f64) -> f64 {
        let scale = 10f64.powi(self.config.decimal_places as i32);
        (value * scale).round_ties_even() / scale
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PricingError {
    #[error("Hourly rate must be a non-negative number, got {0}")]
    InvalidRate(f64),

    #[error("Reservation cannot end ({ended_at}) before it starts ({started_at})")]
    EndBeforeStart {
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    },
}

impl From<PricingError> for LedgerError {
    fn from(err: PricingError) -> Self {
        LedgerError::Validation(err.to_string())
    }
}
