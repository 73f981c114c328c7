use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, TimeZone, Utc};

use crate::valuation::adjustments::MarketUnitValues;
use crate::valuation::domain::{
    AdjustmentBreakdown, CandidateSale, Coordinates, PropertyFeatures, PropertyType,
    RawPropertyRecord, SaleStatus, ScoredComparable, ValuationRequest,
};
use crate::valuation::providers::{
    Geocoder, GeocodeError, PoolError, SalePool, StaticMarketData,
};
use crate::valuation::service::{EngineConfig, ValuationService};
use crate::valuation::similarity::ScoringContext;

pub(super) const CENTER: Coordinates = Coordinates {
    latitude: 34.0722,
    longitude: -118.4000,
};

pub(super) fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
}

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn subject() -> PropertyFeatures {
    PropertyFeatures {
        location: Some(CENTER),
        property_type: Some(PropertyType::SingleFamily),
        square_footage: Some(2000),
        bedrooms: Some(3),
        bathrooms: Some(2.0),
        year_built: Some(2010),
        lot_size: Some(6000),
    }
}

pub(super) fn scoring_ctx() -> ScoringContext {
    ScoringContext {
        radius_miles: 10.0,
        max_age_days: 180,
        as_of: as_of(),
    }
}

pub(super) fn candidate(
    address: &str,
    square_footage: u32,
    bedrooms: u32,
    bathrooms: f64,
    sale_price: f64,
    days_ago: i64,
) -> CandidateSale {
    CandidateSale {
        address: address.to_string(),
        features: PropertyFeatures {
            location: Some(Coordinates {
                latitude: CENTER.latitude + 0.01,
                longitude: CENTER.longitude,
            }),
            property_type: Some(PropertyType::SingleFamily),
            square_footage: Some(square_footage),
            bedrooms: Some(bedrooms),
            bathrooms: Some(bathrooms),
            year_built: Some(2010),
            lot_size: Some(6000),
        },
        sale_price,
        sale_date: as_of() - ChronoDuration::days(days_ago),
        days_on_market: Some(20),
    }
}

pub(super) fn raw_record(address: &str, sale_price: f64, days_ago: i64) -> RawPropertyRecord {
    RawPropertyRecord {
        address: address.to_string(),
        latitude: Some(CENTER.latitude + 0.01),
        longitude: Some(CENTER.longitude),
        property_type: Some("single_family".to_string()),
        square_footage: Some(2100.0),
        bedrooms: Some(3.0),
        bathrooms: Some(2.0),
        year_built: Some(2012.0),
        lot_size: Some(6000.0),
        sale_price: Some(sale_price),
        sale_date: Some(as_of() - ChronoDuration::days(days_ago)),
        days_on_market: Some(20),
        sale_status: Some(SaleStatus::Sold),
    }
}

pub(super) fn scored(address: &str, similarity: f64, adjusted_price: f64) -> ScoredComparable {
    let sale = candidate(address, 2000, 3, 2.0, adjusted_price, 30);
    ScoredComparable {
        sale,
        similarity_score: similarity,
        distance_miles: Some(0.7),
        adjustments: AdjustmentBreakdown::default(),
        adjusted_price,
    }
}

pub(super) fn request() -> ValuationRequest {
    let mut request = ValuationRequest::new("500 Palm Drive, Beverly Hills, CA 90210");
    request.search_radius_miles = 10.0;
    request.max_comparables = 6;
    request.property_type = Some(PropertyType::SingleFamily);
    request.square_footage = Some(2000.0);
    request.bedrooms = Some(3.0);
    request.bathrooms = Some(2.0);
    request.year_built = Some(2010.0);
    request.lot_size = Some(6000.0);
    request
}

/// Geocoder that counts calls and resolves everything to the test center.
pub(super) struct CountingGeocoder {
    pub(super) calls: AtomicUsize,
    outcome: Result<Coordinates, ()>,
}

impl CountingGeocoder {
    pub(super) fn resolving() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            outcome: Ok(CENTER),
        }
    }

    pub(super) fn timing_out() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            outcome: Err(()),
        }
    }

    pub(super) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Geocoder for CountingGeocoder {
    fn resolve(
        &self,
        _address: &str,
        _timeout: Option<Duration>,
    ) -> Result<Coordinates, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.map_err(|_| GeocodeError::Timeout)
    }
}

/// Pool serving a fixed record set, counting fetches, optionally delaying
/// to widen concurrency windows in cache tests.
pub(super) struct CountingPool {
    records: Vec<RawPropertyRecord>,
    pub(super) fetches: AtomicUsize,
    delay: Option<Duration>,
}

impl CountingPool {
    pub(super) fn new(records: Vec<RawPropertyRecord>) -> Self {
        Self {
            records,
            fetches: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub(super) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(super) fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl SalePool for CountingPool {
    fn fetch(
        &self,
        _center: Coordinates,
        _radius_miles: f64,
        _property_type: Option<PropertyType>,
        _max_age_days: i64,
        _timeout: Option<Duration>,
    ) -> Result<Vec<RawPropertyRecord>, PoolError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        Ok(self.records.clone())
    }
}

pub(super) struct UnavailablePool;

impl SalePool for UnavailablePool {
    fn fetch(
        &self,
        _center: Coordinates,
        _radius_miles: f64,
        _property_type: Option<PropertyType>,
        _max_age_days: i64,
        _timeout: Option<Duration>,
    ) -> Result<Vec<RawPropertyRecord>, PoolError> {
        Err(PoolError::Unavailable("mls export offline".to_string()))
    }
}

pub(super) fn default_pool_records() -> Vec<RawPropertyRecord> {
    vec![
        raw_record("123 Beverly Drive, Beverly Hills, CA 90210", 1_200_000.0, 45),
        raw_record("456 Rodeo Avenue, Beverly Hills, CA 90210", 1_150_000.0, 62),
        raw_record("789 Canon Street, Beverly Hills, CA 90210", 1_350_000.0, 30),
    ]
}

pub(super) fn service(
    geocoder: Arc<CountingGeocoder>,
    pool: Arc<CountingPool>,
) -> ValuationService<CountingGeocoder, CountingPool, StaticMarketData> {
    ValuationService::new(
        geocoder,
        pool,
        Arc::new(StaticMarketData::new(MarketUnitValues::default())),
        EngineConfig::default(),
    )
}
