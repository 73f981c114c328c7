//! Seeded pool and static geocoder backing the `demo` subcommand, so the
//! engine can be exercised without a live data provider.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, NaiveDate};

use crate::valuation::{
    Coordinates, Geocoder, GeocodeError, PoolError, PropertyType, RawPropertyRecord, SalePool,
    SaleStatus,
};

/// Lookup-table geocoder. Unknown addresses resolve to a fixed fallback so
/// demo subjects always land inside the seeded market.
pub struct StaticGeocoder {
    known: HashMap<String, Coordinates>,
    fallback: Coordinates,
}

impl StaticGeocoder {
    pub fn new(fallback: Coordinates) -> Self {
        Self {
            known: HashMap::new(),
            fallback,
        }
    }

    pub fn with_address(mut self, address: &str, location: Coordinates) -> Self {
        self.known
            .insert(address.trim().to_ascii_lowercase(), location);
        self
    }
}

impl Geocoder for StaticGeocoder {
    fn resolve(
        &self,
        address: &str,
        _timeout: Option<Duration>,
    ) -> Result<Coordinates, GeocodeError> {
        Ok(self
            .known
            .get(&address.trim().to_ascii_lowercase())
            .copied()
            .unwrap_or(self.fallback))
    }
}

/// In-memory pool over a fixed record set.
pub struct SeededSalePool {
    records: Vec<RawPropertyRecord>,
}

impl SeededSalePool {
    pub fn new(records: Vec<RawPropertyRecord>) -> Self {
        Self { records }
    }
}

impl SalePool for SeededSalePool {
    fn fetch(
        &self,
        _center: Coordinates,
        _radius_miles: f64,
        _property_type: Option<PropertyType>,
        _max_age_days: i64,
        _timeout: Option<Duration>,
    ) -> Result<Vec<RawPropertyRecord>, PoolError> {
        Ok(self.records.clone())
    }
}

/// Anchor point of the seeded market (Beverly Hills).
pub const DEMO_CENTER: Coordinates = Coordinates {
    latitude: 34.0722,
    longitude: -118.4000,
};

pub const DEMO_SUBJECT_ADDRESS: &str = "500 Palm Drive, Beverly Hills, CA 90210";

/// Sample sold properties across three adjacent neighborhoods, with sale
/// dates placed relative to `as_of` so recency windows behave the same on
/// any day the demo runs.
pub fn seeded_records(as_of: NaiveDate) -> Vec<RawPropertyRecord> {
    let seeds: [(&str, f64, f64, f64, f64, f64, f64, f64, f64, i64); 7] = [
        // address, lat, lon, sqft, beds, baths, year, lot, price, days ago
        ("123 Beverly Drive, Beverly Hills, CA 90210", 34.0736, -118.4004, 2400.0, 4.0, 3.0, 2015.0, 8000.0, 1_200_000.0, 45),
        ("456 Rodeo Avenue, Beverly Hills, CA 90210", 34.0697, -118.4015, 2200.0, 3.0, 2.5, 2018.0, 7500.0, 1_150_000.0, 62),
        ("789 Canon Street, Beverly Hills, CA 90210", 34.0728, -118.3987, 2600.0, 4.0, 3.5, 2012.0, 9000.0, 1_350_000.0, 30),
        ("111 Sunset Plaza Drive, West Hollywood, CA 90069", 34.0928, -118.3774, 2100.0, 3.0, 2.0, 2020.0, 6500.0, 980_000.0, 55),
        ("222 Laurel Canyon Blvd, West Hollywood, CA 90069", 34.0945, -118.3788, 2300.0, 3.0, 2.5, 2017.0, 7000.0, 1_050_000.0, 38),
        ("333 Hollywood Boulevard, Hollywood, CA 90028", 34.1022, -118.3267, 1900.0, 3.0, 2.0, 2010.0, 6000.0, 850_000.0, 72),
        ("444 Vine Street, Hollywood, CA 90028", 34.1016, -118.3259, 2500.0, 4.0, 3.0, 2016.0, 8500.0, 1_100_000.0, 41),
    ];

    seeds
        .into_iter()
        .map(
            |(address, lat, lon, sqft, beds, baths, year, lot, price, days_ago)| {
                RawPropertyRecord {
                    address: address.to_string(),
                    latitude: Some(lat),
                    longitude: Some(lon),
                    property_type: Some("single_family".to_string()),
                    square_footage: Some(sqft),
                    bedrooms: Some(beds),
                    bathrooms: Some(baths),
                    year_built: Some(year),
                    lot_size: Some(lot),
                    sale_price: Some(price),
                    sale_date: Some(as_of - ChronoDuration::days(days_ago)),
                    days_on_market: Some((days_ago / 2) as u32),
                    sale_status: Some(SaleStatus::Sold),
                }
            },
        )
        .collect()
}

/// Geocoder pre-loaded with every seeded address plus the demo subject.
pub fn seeded_geocoder() -> StaticGeocoder {
    StaticGeocoder::new(DEMO_CENTER)
        .with_address(
            DEMO_SUBJECT_ADDRESS,
            Coordinates {
                latitude: 34.0730,
                longitude: -118.3995,
            },
        )
        .with_address(
            "123 Beverly Drive, Beverly Hills, CA 90210",
            Coordinates {
                latitude: 34.0736,
                longitude: -118.4004,
            },
        )
}
