use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{AdjustmentBreakdown, CandidateSale, PropertyFeatures};

const MAX_AGE_ADJUSTMENT_YEARS: i32 = 20;
const MARKET_TIME_GRACE_DAYS: i64 = 90;
const QUARTERLY_APPRECIATION: f64 = 0.01;
const MAX_TIME_APPRECIATION: f64 = 0.02;
const SMALL_HOME_SQFT: u32 = 1500;
const LARGE_HOME_SQFT: u32 = 3000;

/// Per-market dollar unit values converting feature differences into
/// adjustments. Derived externally (regression or static market constants)
/// and injected; the calculator never computes them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketUnitValues {
    pub price_per_sqft: f64,
    pub per_bedroom: f64,
    pub per_bathroom: f64,
    pub per_year_of_age: f64,
    pub per_lot_sqft: f64,
    pub per_lot_sqft_beyond_knee: f64,
    pub lot_knee_sqft: f64,
}

impl Default for MarketUnitValues {
    fn default() -> Self {
        Self {
            price_per_sqft: 150.0,
            per_bedroom: 15_000.0,
            per_bathroom: 8_000.0,
            per_year_of_age: 500.0,
            per_lot_sqft: 5.0,
            per_lot_sqft_beyond_knee: 2.0,
            lot_knee_sqft: 5_000.0,
        }
    }
}

/// Converts subject/candidate feature differences into signed dollar
/// amounts. Sign convention: the total is added to the candidate's sale
/// price to estimate what it would have sold for with the subject's
/// features.
#[derive(Debug, Clone)]
pub struct AdjustmentCalculator {
    units: MarketUnitValues,
}

impl AdjustmentCalculator {
    pub fn new(units: MarketUnitValues) -> Self {
        Self { units }
    }

    pub fn adjust(
        &self,
        subject: &PropertyFeatures,
        candidate: &CandidateSale,
        as_of: NaiveDate,
    ) -> AdjustmentBreakdown {
        let mut breakdown = AdjustmentBreakdown {
            size: self.size_adjustment(subject, &candidate.features),
            bedrooms: self.bedroom_adjustment(subject, &candidate.features),
            bathrooms: self.bathroom_adjustment(subject, &candidate.features),
            age: self.age_adjustment(subject, &candidate.features),
            lot_size: self.lot_size_adjustment(subject, &candidate.features),
            market_time: Some(self.market_time_adjustment(candidate, as_of)),
            total: 0.0,
        };
        breakdown.total = breakdown.component_sum();
        breakdown
    }

    /// Sale price corrected for feature differences; non-positive results
    /// mean the candidate is not usable evidence and must be excluded, never
    /// clamped.
    pub fn adjusted_price(sale_price: f64, breakdown: &AdjustmentBreakdown) -> f64 {
        sale_price + breakdown.total
    }

    fn size_adjustment(
        &self,
        subject: &PropertyFeatures,
        candidate: &PropertyFeatures,
    ) -> Option<f64> {
        let subject_sqft = subject.square_footage?;
        let candidate_sqft = candidate.square_footage?;

        // Smaller homes trade at a higher $/sqft, larger at a lower one.
        let price_per_sqft = if candidate_sqft < SMALL_HOME_SQFT {
            self.units.price_per_sqft * 1.2
        } else if candidate_sqft > LARGE_HOME_SQFT {
            self.units.price_per_sqft * 0.8
        } else {
            self.units.price_per_sqft
        };

        Some((subject_sqft as f64 - candidate_sqft as f64) * price_per_sqft)
    }

    fn bedroom_adjustment(
        &self,
        subject: &PropertyFeatures,
        candidate: &PropertyFeatures,
    ) -> Option<f64> {
        let subject_beds = subject.bedrooms?;
        let candidate_beds = candidate.bedrooms?;
        Some((subject_beds as f64 - candidate_beds as f64) * self.units.per_bedroom)
    }

    fn bathroom_adjustment(
        &self,
        subject: &PropertyFeatures,
        candidate: &PropertyFeatures,
    ) -> Option<f64> {
        let subject_baths = subject.bathrooms?;
        let candidate_baths = candidate.bathrooms?;
        Some((subject_baths - candidate_baths) * self.units.per_bathroom)
    }

    fn age_adjustment(
        &self,
        subject: &PropertyFeatures,
        candidate: &PropertyFeatures,
    ) -> Option<f64> {
        let subject_year = subject.year_built?;
        let candidate_year = candidate.year_built?;

        // Cap at 20 years either way to keep one old outlier from dominating.
        let years = (subject_year - candidate_year)
            .clamp(-MAX_AGE_ADJUSTMENT_YEARS, MAX_AGE_ADJUSTMENT_YEARS);

        Some(years as f64 * self.units.per_year_of_age)
    }

    fn lot_size_adjustment(
        &self,
        subject: &PropertyFeatures,
        candidate: &PropertyFeatures,
    ) -> Option<f64> {
        let subject_lot = subject.lot_size? as f64;
        let candidate_lot = candidate.lot_size? as f64;
        let difference = subject_lot - candidate_lot;

        // Full per-sqft value up to the knee, diminishing value beyond it.
        let magnitude = difference.abs();
        let adjustment = if magnitude <= self.units.lot_knee_sqft {
            magnitude * self.units.per_lot_sqft
        } else {
            self.units.lot_knee_sqft * self.units.per_lot_sqft
                + (magnitude - self.units.lot_knee_sqft) * self.units.per_lot_sqft_beyond_knee
        };

        Some(adjustment.copysign(difference))
    }

    /// Older sales get lifted toward today's market: 1% per quarter past a
    /// 90-day grace window, capped at 2% of the sale price. Always present
    /// since sale_date is mandatory.
    fn market_time_adjustment(&self, candidate: &CandidateSale, as_of: NaiveDate) -> f64 {
        let days_ago = (as_of - candidate.sale_date).num_days();
        if days_ago <= MARKET_TIME_GRACE_DAYS {
            return 0.0;
        }

        let quarters = (days_ago - MARKET_TIME_GRACE_DAYS) as f64 / MARKET_TIME_GRACE_DAYS as f64;
        let rate = (QUARTERLY_APPRECIATION * quarters).min(MAX_TIME_APPRECIATION);

        candidate.sale_price * rate
    }
}
