use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in miles, matching the haversine constant used for
/// comparable search distances.
const EARTH_RADIUS_MILES: f64 = 3956.0;

/// Resolved geographic position of a property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Great-circle distance to another point in miles (haversine).
    pub fn distance_miles(&self, other: &Coordinates) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_MILES * c
    }
}

/// Property categories the engine compares like-for-like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    SingleFamily,
    Condo,
    Townhouse,
    MultiFamily,
}

impl PropertyType {
    pub const fn label(self) -> &'static str {
        match self {
            PropertyType::SingleFamily => "single_family",
            PropertyType::Condo => "condo",
            PropertyType::Townhouse => "townhouse",
            PropertyType::MultiFamily => "multi_family",
        }
    }

    /// Lenient parse for provider data; unrecognized values map to `None`
    /// so a bad label degrades to "unknown type" instead of dropping the row.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "single_family" | "sfr" | "house" => Some(PropertyType::SingleFamily),
            "condo" | "condominium" => Some(PropertyType::Condo),
            "townhouse" | "townhome" => Some(PropertyType::Townhouse),
            "multi_family" | "duplex" | "triplex" => Some(PropertyType::MultiFamily),
            _ => None,
        }
    }
}

/// Listing lifecycle state attached to a raw sale record. Only closed sales
/// are admissible comparable evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Sold,
    Active,
    Pending,
    Expired,
}

/// Untrusted property+sale row as it arrives from a sale-pool provider.
/// Everything beyond the address is optional; the normalizer and screener
/// decide what survives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPropertyRecord {
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub property_type: Option<String>,
    pub square_footage: Option<f64>,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub year_built: Option<f64>,
    pub lot_size: Option<f64>,
    pub sale_price: Option<f64>,
    pub sale_date: Option<NaiveDate>,
    pub days_on_market: Option<u32>,
    pub sale_status: Option<SaleStatus>,
}

/// Canonical feature vector for a subject or candidate property. Absent
/// fields mean "unknown" and are excluded from scoring, never imputed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PropertyFeatures {
    pub location: Option<Coordinates>,
    pub property_type: Option<PropertyType>,
    pub square_footage: Option<u32>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f64>,
    pub year_built: Option<i32>,
    pub lot_size: Option<u32>,
}

/// A screened sold property: features plus the mandatory sale facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSale {
    pub address: String,
    pub features: PropertyFeatures,
    pub sale_price: f64,
    pub sale_date: NaiveDate,
    pub days_on_market: Option<u32>,
}

/// Signed dollar corrections applied to a comparable's sale price. A
/// component is present only when the feature is known on both the subject
/// and the candidate; `Some(0.0)` is a real "no difference" observation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AdjustmentBreakdown {
    pub size: Option<f64>,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub age: Option<f64>,
    pub lot_size: Option<f64>,
    pub market_time: Option<f64>,
    pub total: f64,
}

impl AdjustmentBreakdown {
    /// Sum of whichever components are present; `total` must equal this.
    pub fn component_sum(&self) -> f64 {
        [
            self.size,
            self.bedrooms,
            self.bathrooms,
            self.age,
            self.lot_size,
            self.market_time,
        ]
        .iter()
        .flatten()
        .sum()
    }
}

/// A comparable that survived screening, scoring, and adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredComparable {
    pub sale: CandidateSale,
    pub similarity_score: f64,
    pub distance_miles: Option<f64>,
    pub adjustments: AdjustmentBreakdown,
    pub adjusted_price: f64,
}

/// Low / most-likely / high estimate band for the subject.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatedValueRange {
    pub low: f64,
    pub most_likely: f64,
    pub high: f64,
}

/// Aggregate view of the dollar adjustments across returned comparables so
/// reports can show how much correction the estimate required.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentSummary {
    pub average_adjustment: f64,
    pub min_adjustment: f64,
    pub max_adjustment: f64,
}

/// Completed analysis handed to persistence and presentation collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub subject_address: String,
    pub subject: PropertyFeatures,
    pub estimated_value: EstimatedValueRange,
    pub comparables: Vec<ScoredComparable>,
    pub confidence_score: f64,
    pub adjustment_summary: AdjustmentSummary,
    pub analyzed_at: DateTime<Utc>,
}

/// Inbound request with defaults applied at construction, validated by the
/// orchestrator before any collaborator call runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRequest {
    pub address: String,
    pub property_type: Option<PropertyType>,
    pub search_radius_miles: f64,
    pub max_comparables: usize,
    pub square_footage: Option<f64>,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub year_built: Option<f64>,
    pub lot_size: Option<f64>,
}

pub const DEFAULT_SEARCH_RADIUS_MILES: f64 = 1.0;
pub const DEFAULT_MAX_COMPARABLES: usize = 6;

impl ValuationRequest {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            property_type: None,
            search_radius_miles: DEFAULT_SEARCH_RADIUS_MILES,
            max_comparables: DEFAULT_MAX_COMPARABLES,
            square_footage: None,
            bedrooms: None,
            bathrooms: None,
            year_built: None,
            lot_size: None,
        }
    }
}
