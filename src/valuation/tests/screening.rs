use chrono::Duration as ChronoDuration;

use super::common::*;
use crate::valuation::domain::{PropertyType, SaleStatus};
use crate::valuation::screening::{screen, screen_all, ScreeningCriteria};
use crate::valuation::service::{Stage, ValuationError};

fn criteria() -> ScreeningCriteria {
    ScreeningCriteria {
        center: CENTER,
        radius_miles: 10.0,
        max_age_days: 180,
        property_type: Some(PropertyType::SingleFamily),
        as_of: as_of(),
    }
}

#[test]
fn admits_eligible_sold_records() {
    let pool = default_pool_records();
    let survivors: Vec<_> = screen(&pool, &criteria()).collect();
    assert_eq!(survivors.len(), 3);
    assert!(survivors
        .iter()
        .all(|candidate| candidate.sale_price > 0.0));
}

#[test]
fn drops_records_missing_sale_price_or_date() {
    let mut missing_price = raw_record("no price", 1.0, 30);
    missing_price.sale_price = None;
    let mut missing_date = raw_record("no date", 900_000.0, 30);
    missing_date.sale_date = None;
    let mut free_house = raw_record("zero price", 0.0, 30);
    free_house.sale_price = Some(0.0);

    let pool = vec![missing_price, missing_date, free_house];
    assert_eq!(screen(&pool, &criteria()).count(), 0);
}

#[test]
fn drops_stale_and_future_sales() {
    let stale = raw_record("stale", 900_000.0, 181);
    let future = raw_record("future", 900_000.0, -5);
    let fresh = raw_record("fresh", 900_000.0, 180);

    let pool = vec![stale, future, fresh];
    let survivors: Vec<_> = screen(&pool, &criteria()).collect();
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].address, "fresh");
}

#[test]
fn drops_records_outside_radius() {
    let mut far = raw_record("far away", 900_000.0, 30);
    far.latitude = Some(CENTER.latitude + 2.0);

    let mut unlocated = raw_record("no coordinates", 900_000.0, 30);
    unlocated.latitude = None;

    let pool = vec![far, unlocated, raw_record("near", 900_000.0, 30)];
    let survivors: Vec<_> = screen(&pool, &criteria()).collect();
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].address, "near");
}

#[test]
fn enforces_property_type_when_requested() {
    let mut condo = raw_record("condo", 900_000.0, 30);
    condo.property_type = Some("condo".to_string());
    let mut untyped = raw_record("untyped", 900_000.0, 30);
    untyped.property_type = None;

    let pool = vec![condo.clone(), untyped.clone(), raw_record("sfr", 900_000.0, 30)];
    let survivors: Vec<_> = screen(&pool, &criteria()).collect();
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].address, "sfr");

    // Without a requested type everything else being equal survives.
    let open = ScreeningCriteria {
        property_type: None,
        ..criteria()
    };
    assert_eq!(screen(&pool, &open).count(), 3);
}

#[test]
fn drops_non_sold_listings() {
    let mut pending = raw_record("pending", 900_000.0, 30);
    pending.sale_status = Some(SaleStatus::Pending);
    let mut unknown_status = raw_record("unknown status", 900_000.0, 30);
    unknown_status.sale_status = None;

    let pool = vec![pending, unknown_status];
    let survivors: Vec<_> = screen(&pool, &criteria()).collect();
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].address, "unknown status");
}

#[test]
fn rescreening_the_same_pool_is_side_effect_free() {
    let pool = default_pool_records();
    let snapshot = pool.clone();

    let tight = ScreeningCriteria {
        radius_miles: 0.001,
        ..criteria()
    };
    assert_eq!(screen(&pool, &tight).count(), 0);
    assert_eq!(screen(&pool, &criteria()).count(), 3);
    assert_eq!(pool, snapshot);
}

#[test]
fn screen_all_fails_when_nothing_survives() {
    let pool = vec![raw_record("stale", 900_000.0, 400)];
    let err = screen_all(&pool, &criteria()).expect_err("expected insufficient data");
    match err {
        ValuationError::InsufficientData { stage, .. } => assert_eq!(stage, Stage::Screening),
        other => panic!("expected insufficient data, got {other:?}"),
    }
}

#[test]
fn candidate_carries_normalized_features() {
    let mut raw = raw_record("weird fields", 900_000.0, 30);
    raw.square_footage = Some(-50.0);
    raw.year_built = Some(1200.0);

    let pool = vec![raw];
    let survivors: Vec<_> = screen(&pool, &criteria()).collect();
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].features.square_footage, None);
    assert_eq!(survivors[0].features.year_built, None);
    assert_eq!(
        survivors[0].sale_date,
        as_of() - ChronoDuration::days(30)
    );
}
