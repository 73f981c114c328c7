use chrono::NaiveDate;

use super::domain::{CandidateSale, Coordinates, PropertyType, RawPropertyRecord, SaleStatus};
use super::normalizer;
use super::service::{Stage, ValuationError};

/// Eligibility filters applied to a raw sale pool before scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreeningCriteria {
    pub center: Coordinates,
    pub radius_miles: f64,
    pub max_age_days: i64,
    pub property_type: Option<PropertyType>,
    pub as_of: NaiveDate,
}

/// Lazily screen a pool down to eligible comparables. Restartable: the
/// returned iterator borrows the pool, so the same pool can be re-screened
/// with different criteria without side effects.
pub fn screen<'a>(
    pool: &'a [RawPropertyRecord],
    criteria: &'a ScreeningCriteria,
) -> impl Iterator<Item = CandidateSale> + 'a {
    pool.iter().filter_map(move |raw| admit(raw, criteria))
}

/// Collect the screened pool, failing when nothing survives so the caller
/// reports "cannot value with current data" instead of an empty estimate.
pub fn screen_all(
    pool: &[RawPropertyRecord],
    criteria: &ScreeningCriteria,
) -> Result<Vec<CandidateSale>, ValuationError> {
    let survivors: Vec<CandidateSale> = screen(pool, criteria).collect();
    if survivors.is_empty() {
        return Err(ValuationError::InsufficientData {
            stage: Stage::Screening,
            reason: format!(
                "no comparable sales within {:.2} miles and {} days",
                criteria.radius_miles, criteria.max_age_days
            ),
        });
    }
    Ok(survivors)
}

fn admit(raw: &RawPropertyRecord, criteria: &ScreeningCriteria) -> Option<CandidateSale> {
    // Sale price and date are mandatory evidence; records missing either
    // are dropped rather than scored with placeholders.
    let sale_price = raw.sale_price.filter(|price| price.is_finite() && *price > 0.0)?;
    let sale_date = raw.sale_date?;

    if !matches!(raw.sale_status, None | Some(SaleStatus::Sold)) {
        return None;
    }

    let age_days = (criteria.as_of - sale_date).num_days();
    if age_days < 0 || age_days > criteria.max_age_days {
        return None;
    }

    let features = normalizer::normalize(raw);

    let location = features.location?;
    if criteria.center.distance_miles(&location) > criteria.radius_miles {
        return None;
    }

    if let (Some(wanted), Some(actual)) = (criteria.property_type, features.property_type) {
        if wanted != actual {
            return None;
        }
    } else if criteria.property_type.is_some() && features.property_type.is_none() {
        return None;
    }

    Some(CandidateSale {
        address: raw.address.clone(),
        features,
        sale_price,
        sale_date,
        days_on_market: raw.days_on_market,
    })
}
