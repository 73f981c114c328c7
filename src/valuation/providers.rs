use std::time::Duration;

use super::adjustments::MarketUnitValues;
use super::domain::{Coordinates, PropertyType, RawPropertyRecord, ValuationResult};

/// Resolves a street address into coordinates. May fail or time out; the
/// orchestrator maps both onto its own error taxonomy.
pub trait Geocoder: Send + Sync {
    fn resolve(&self, address: &str, timeout: Option<Duration>)
        -> Result<Coordinates, GeocodeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("address not found")]
    NotFound,
    #[error("address is ambiguous: {0}")]
    Ambiguous(String),
    #[error("geocoder timed out")]
    Timeout,
    #[error("geocoder unavailable: {0}")]
    Unavailable(String),
}

/// Supplies raw property+sale records near a point. May return an empty
/// set; screening decides eligibility, so providers can over-fetch.
pub trait SalePool: Send + Sync {
    fn fetch(
        &self,
        center: Coordinates,
        radius_miles: f64,
        property_type: Option<PropertyType>,
        max_age_days: i64,
        timeout: Option<Duration>,
    ) -> Result<Vec<RawPropertyRecord>, PoolError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("sale pool timed out")]
    Timeout,
    #[error("sale pool unavailable: {0}")]
    Unavailable(String),
}

/// Supplies the per-market dollar unit values behind adjustments, refreshed
/// out of band (regression over recent sales, or static market constants).
pub trait MarketDataProvider: Send + Sync {
    fn unit_values(&self) -> MarketUnitValues;
}

/// Fixed unit values, for deployments tuning the market by configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticMarketData {
    units: MarketUnitValues,
}

impl StaticMarketData {
    pub fn new(units: MarketUnitValues) -> Self {
        Self { units }
    }
}

impl MarketDataProvider for StaticMarketData {
    fn unit_values(&self) -> MarketUnitValues {
        self.units
    }
}

/// Outbound hook for the persistence collaborator (history listing, audit
/// records). Sink failures are logged and never corrupt the returned result.
pub trait AnalysisSink: Send + Sync {
    fn record(&self, result: &ValuationResult) -> Result<(), SinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("analysis sink unavailable: {0}")]
    Unavailable(String),
}
