//! Loads a comparable-sales CSV export through the public pool type and
//! drives a full analysis over it, including degraded rows.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};

use cma_engine::demo::StaticGeocoder;
use cma_engine::pool::CsvSalePool;
use cma_engine::valuation::{
    Coordinates, EngineConfig, PropertyType, SalePool, SaleStatus, StaticMarketData,
    ValuationRequest, ValuationService,
};

const CENTER: Coordinates = Coordinates {
    latitude: 34.0722,
    longitude: -118.4000,
};

const EXPORT: &str = "\
address,latitude,longitude,property_type,square_footage,bedrooms,bathrooms,year_built,lot_size,sale_price,sale_date,days_on_market,sale_status
\"10 Elm Court, Beverly Hills, CA 90210\",34.0731,-118.3992,single_family,2100,3,2,2012,6200,\"$1,050,000\",2024-05-02,22,Sold
\"12 Elm Court, Beverly Hills, CA 90210\",34.0733,-118.3990,single_family,1950,3,2.5,2009,,985000,04/18/2024,31,closed
\"14 Elm Court, Beverly Hills, CA 90210\",,,single_family,2400,,not-a-number,2016,7000,1200000,2024-03-29,,Sold
\"90 Pine Street, Pasadena, CA 91101\",34.1466,-118.1445,condo,1400,2,2,2019,0,760000,2024-05-20,15,Pending
";

fn export_pool() -> CsvSalePool {
    CsvSalePool::from_reader(Cursor::new(EXPORT)).expect("well-formed export")
}

#[test]
fn malformed_cells_degrade_to_unknown_fields() {
    let pool = export_pool();
    assert_eq!(pool.len(), 4);

    let records = pool
        .fetch(CENTER, 50.0, None, 365, None)
        .expect("in-memory fetch");

    let first = &records[0];
    assert_eq!(first.sale_price, Some(1_050_000.0));
    assert_eq!(
        first.sale_date,
        NaiveDate::from_ymd_opt(2024, 5, 2)
    );
    assert_eq!(first.sale_status, Some(SaleStatus::Sold));

    // Alternate date format and the missing lot size on row two.
    let second = &records[1];
    assert_eq!(second.sale_date, NaiveDate::from_ymd_opt(2024, 4, 18));
    assert_eq!(second.lot_size, None);
    assert_eq!(second.sale_status, Some(SaleStatus::Sold));

    // Row three: no coordinates, blank bedrooms, unparseable bathrooms.
    let third = &records[2];
    assert_eq!(third.latitude, None);
    assert_eq!(third.bedrooms, None);
    assert_eq!(third.bathrooms, None);
    assert_eq!(third.days_on_market, None);
}

#[test]
fn radius_prefilter_keeps_unlocated_rows_for_the_screener() {
    let pool = export_pool();

    // Pasadena sits well outside two miles; the unlocated row passes through.
    let nearby = pool
        .fetch(CENTER, 2.0, None, 365, None)
        .expect("in-memory fetch");
    let addresses: Vec<&str> = nearby.iter().map(|r| r.address.as_str()).collect();
    assert_eq!(
        addresses,
        vec![
            "10 Elm Court, Beverly Hills, CA 90210",
            "12 Elm Court, Beverly Hills, CA 90210",
            "14 Elm Court, Beverly Hills, CA 90210",
        ]
    );
}

#[test]
fn analysis_over_a_csv_export_runs_end_to_end() {
    let service = ValuationService::new(
        Arc::new(StaticGeocoder::new(CENTER)),
        Arc::new(export_pool()),
        Arc::new(StaticMarketData::default()),
        EngineConfig::default(),
    );

    let mut request = ValuationRequest::new("11 Elm Court, Beverly Hills, CA 90210");
    request.search_radius_miles = 2.0;
    request.max_comparables = 6;
    request.property_type = Some(PropertyType::SingleFamily);
    request.square_footage = Some(2000.0);
    request.bedrooms = Some(3.0);
    request.bathrooms = Some(2.0);
    request.year_built = Some(2011.0);

    let now = Utc
        .with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp");
    let result = service
        .evaluate_at(&request, now, Some(Duration::from_secs(5)))
        .expect("analysis over export succeeds");

    // The unlocated row and the pending condo fall out in screening.
    assert_eq!(result.comparables.len(), 2);
    assert!(result
        .comparables
        .iter()
        .all(|comp| comp.sale.address.contains("Elm Court")));
    assert!(result.estimated_value.low > 0.0);
    assert!(result.estimated_value.high >= result.estimated_value.low);
}
