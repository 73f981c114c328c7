use std::io::Read;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::valuation::{RawPropertyRecord, SaleStatus};

/// Parse a comparable-sales export into raw records. Field-level problems
/// (blank cells, unparseable numbers) degrade to "unknown" on that field;
/// only structurally broken CSV fails the import.
pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<RawPropertyRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for row in csv_reader.deserialize::<SaleRow>() {
        records.push(row?.into_record());
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct SaleRow {
    address: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    latitude: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    longitude: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    property_type: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    square_footage: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    bedrooms: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    bathrooms: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    year_built: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    lot_size: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    sale_price: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    sale_date: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    days_on_market: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    sale_status: Option<String>,
}

impl SaleRow {
    fn into_record(self) -> RawPropertyRecord {
        RawPropertyRecord {
            address: self.address,
            latitude: parse_number(self.latitude.as_deref()),
            longitude: parse_number(self.longitude.as_deref()),
            property_type: self.property_type,
            square_footage: parse_number(self.square_footage.as_deref()),
            bedrooms: parse_number(self.bedrooms.as_deref()),
            bathrooms: parse_number(self.bathrooms.as_deref()),
            year_built: parse_number(self.year_built.as_deref()),
            lot_size: parse_number(self.lot_size.as_deref()),
            sale_price: parse_number(self.sale_price.as_deref()),
            sale_date: self.sale_date.as_deref().and_then(parse_date),
            days_on_market: parse_number(self.days_on_market.as_deref())
                .filter(|days| *days >= 0.0)
                .map(|days| days.round() as u32),
            sale_status: self.sale_status.as_deref().and_then(parse_status),
        }
    }
}

fn parse_number(value: Option<&str>) -> Option<f64> {
    value.and_then(|raw| raw.replace([',', '$'], "").parse::<f64>().ok())
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    const FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
    FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

fn parse_status(value: &str) -> Option<SaleStatus> {
    match value.trim().to_ascii_lowercase().as_str() {
        "sold" | "closed" => Some(SaleStatus::Sold),
        "active" => Some(SaleStatus::Active),
        "pending" => Some(SaleStatus::Pending),
        "expired" => Some(SaleStatus::Expired),
        _ => None,
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
