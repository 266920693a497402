//! Row normalization: raw CSV cells to a validated airport field set.

use std::collections::HashMap;

use crate::errors::RowError;
use crate::geo::validate_coordinates;
use crate::models::{AirportRow, is_active_category};

/// One source row: header name -> cell text.
pub type RawRow = HashMap<String, String>;

/// Columns every source must carry. Other columns are optional or ignored.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "ident",
    "name",
    "type",
    "latitude_deg",
    "longitude_deg",
    "iso_country",
];

/// A validated, typed airport record ready to be linked and written.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAirport {
    /// `ident`.
    pub ident: String,
    /// `iata_code`, uppercased; empty unless exactly three characters.
    pub iata_code: String,
    /// `name`.
    pub name: String,
    /// `type`, untouched.
    pub airport_type: String,
    /// Derived from `airport_type`.
    pub active: bool,
    /// `latitude_deg`.
    pub latitude: f64,
    /// `longitude_deg`.
    pub longitude: f64,
    /// `elevation_ft`; blank is `None`.
    pub elevation_ft: Option<i32>,
    /// `iso_country`, uppercased; may be blank (imported unlinked).
    pub iso_country: String,
    /// `iso_region`.
    pub iso_region: String,
    /// `municipality`.
    pub municipality: String,
}

impl NormalizedAirport {
    /// Borrow as a writable row with the given links.
    pub fn as_row<'a>(&'a self, country_code: Option<&'a str>, city_id: Option<i32>) -> AirportRow<'a> {
        AirportRow {
            ident: &self.ident,
            iata_code: &self.iata_code,
            name: &self.name,
            airport_type: &self.airport_type,
            active: self.active,
            latitude: self.latitude,
            longitude: self.longitude,
            elevation_ft: self.elevation_ft,
            iso_country: &self.iso_country,
            iso_region: &self.iso_region,
            municipality: &self.municipality,
            country_code,
            city_id,
        }
    }
}

fn cell<'a>(raw: &'a RawRow, column: &str) -> &'a str {
    raw.get(column).map(|s| s.trim()).unwrap_or("")
}

fn required<'a>(raw: &'a RawRow, column: &'static str) -> Result<&'a str, RowError> {
    let v = cell(raw, column);
    if v.is_empty() {
        return Err(RowError::MissingField(column));
    }
    Ok(v)
}

fn parse_f64(raw: &RawRow, column: &'static str) -> Result<f64, RowError> {
    let v = required(raw, column)?;
    v.parse::<f64>().map_err(|_| RowError::InvalidNumber {
        column,
        value: v.to_string(),
    })
}

/// Blank is `None`; `"5431"` and `"5431.0"` both parse.
fn parse_elevation(raw: &RawRow) -> Result<Option<i32>, RowError> {
    let v = cell(raw, "elevation_ft");
    if v.is_empty() {
        return Ok(None);
    }
    if let Ok(n) = v.parse::<i32>() {
        return Ok(Some(n));
    }
    match v.parse::<f64>() {
        Ok(f) if f.is_finite() && f.abs() < i32::MAX as f64 => Ok(Some(f.round() as i32)),
        _ => Err(RowError::InvalidNumber {
            column: "elevation_ft",
            value: v.to_string(),
        }),
    }
}

/// Validate and type-convert one raw row.
///
/// Rejects rows with a missing required field, a non-numeric coordinate or
/// elevation, or a coordinate out of range.
pub fn normalize_row(raw: &RawRow) -> Result<NormalizedAirport, RowError> {
    let ident = required(raw, "ident")?.to_string();
    let name = required(raw, "name")?.to_string();
    let airport_type = required(raw, "type")?.to_string();
    let latitude = parse_f64(raw, "latitude_deg")?;
    let longitude = parse_f64(raw, "longitude_deg")?;
    validate_coordinates(latitude, longitude)?;
    let elevation_ft = parse_elevation(raw)?;

    let mut iata_code = cell(raw, "iata_code").to_uppercase();
    if iata_code.chars().count() != 3 {
        iata_code.clear();
    }

    Ok(NormalizedAirport {
        active: is_active_category(&airport_type),
        ident,
        iata_code,
        name,
        airport_type,
        latitude,
        longitude,
        elevation_ft,
        iso_country: cell(raw, "iso_country").to_uppercase(),
        iso_region: cell(raw, "iso_region").to_string(),
        municipality: cell(raw, "municipality").to_string(),
    })
}
