//! CSV-backed sale pool so analyses can run against an exported file of
//! recent sales instead of a live data provider.

mod csv;

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use crate::valuation::{Coordinates, PoolError, PropertyType, RawPropertyRecord, SalePool};

#[derive(Debug)]
pub enum CsvPoolError {
    Io(std::io::Error),
    Csv(::csv::Error),
}

impl std::fmt::Display for CsvPoolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CsvPoolError::Io(err) => write!(f, "failed to read sale pool file: {}", err),
            CsvPoolError::Csv(err) => write!(f, "invalid sale pool CSV data: {}", err),
        }
    }
}

impl std::error::Error for CsvPoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CsvPoolError::Io(err) => Some(err),
            CsvPoolError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CsvPoolError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<::csv::Error> for CsvPoolError {
    fn from(err: ::csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// In-memory pool loaded once from a CSV export. Fetches pre-filter by
/// radius where coordinates parsed; rows without usable coordinates pass
/// through so the screener owns that exclusion.
pub struct CsvSalePool {
    records: Vec<RawPropertyRecord>,
}

impl CsvSalePool {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CsvPoolError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CsvPoolError> {
        let records = csv::parse_records(reader)?;
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl SalePool for CsvSalePool {
    fn fetch(
        &self,
        center: Coordinates,
        radius_miles: f64,
        _property_type: Option<PropertyType>,
        _max_age_days: i64,
        _timeout: Option<Duration>,
    ) -> Result<Vec<RawPropertyRecord>, PoolError> {
        let nearby = self
            .records
            .iter()
            .filter(|record| match (record.latitude, record.longitude) {
                (Some(latitude), Some(longitude)) => {
                    let location = Coordinates {
                        latitude,
                        longitude,
                    };
                    center.distance_miles(&location) <= radius_miles
                }
                _ => true,
            })
            .cloned()
            .collect();
        Ok(nearby)
    }
}
