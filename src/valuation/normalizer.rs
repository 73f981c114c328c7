use super::domain::{Coordinates, PropertyFeatures, PropertyType, RawPropertyRecord};

const MIN_PLAUSIBLE_YEAR_BUILT: i32 = 1700;
const MAX_PLAUSIBLE_YEAR_BUILT: i32 = 2100;

/// Convert a raw provider row into the canonical feature vector. Total:
/// out-of-range values degrade to "unknown" so one malformed field never
/// drops the whole record.
pub fn normalize(raw: &RawPropertyRecord) -> PropertyFeatures {
    PropertyFeatures {
        location: normalize_location(raw.latitude, raw.longitude),
        property_type: raw
            .property_type
            .as_deref()
            .and_then(PropertyType::parse),
        square_footage: positive_count(raw.square_footage),
        bedrooms: raw
            .bedrooms
            .filter(|value| value.is_finite() && *value >= 0.0)
            .map(|value| value.round() as u32),
        bathrooms: raw.bathrooms.filter(|value| value.is_finite() && *value >= 0.0),
        year_built: raw
            .year_built
            .filter(|value| value.is_finite())
            .map(|value| value.round() as i32)
            .filter(|year| (MIN_PLAUSIBLE_YEAR_BUILT..=MAX_PLAUSIBLE_YEAR_BUILT).contains(year)),
        lot_size: positive_count(raw.lot_size),
    }
}

fn normalize_location(latitude: Option<f64>, longitude: Option<f64>) -> Option<Coordinates> {
    let latitude = latitude.filter(|lat| lat.is_finite() && lat.abs() <= 90.0)?;
    let longitude = longitude.filter(|lon| lon.is_finite() && lon.abs() <= 180.0)?;
    Some(Coordinates {
        latitude,
        longitude,
    })
}

fn positive_count(value: Option<f64>) -> Option<u32> {
    value
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v.round() as u32)
}

/// Canonicalize an address for cache keys and lookups: drop zero-width
/// characters, collapse whitespace, lowercase.
pub fn normalize_address(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_ascii_lowercase()
}
