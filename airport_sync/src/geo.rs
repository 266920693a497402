//! Great-circle distance math on a spherical Earth.
//!
//! Everything here is pure: degrees in, kilometers (or miles) out. Range
//! validation is separate ([`validate_coordinates`]) so hot loops can skip it
//! once inputs are known good.

use std::{f64::consts::PI, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Mean Earth radius (IUGG) in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Statute miles per kilometer.
pub const MILES_PER_KM: f64 = 0.621371;


/// Unit a distance is reported in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    /// Kilometers (`km`).
    #[default]
    #[serde(rename = "km")]
    Kilometers,
    /// Statute miles (`mi`).
    #[serde(rename = "mi")]
    Miles,
}

impl Unit {
    /// Convert a distance in kilometers into this unit.
    pub fn from_km(self, km: f64) -> f64 {
        match self {
            Unit::Kilometers => km,
            Unit::Miles => km * MILES_PER_KM,
        }
    }

    /// Short suffix used in human-readable output.
    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Kilometers => "km",
            Unit::Miles => "mi",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Returned when a unit string is neither kilometers nor miles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown distance unit '{0}' (expected km or mi)")]
pub struct UnknownUnit(pub String);

impl FromStr for Unit {
    type Err = UnknownUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "km" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => Ok(Unit::Kilometers),
            "mi" | "mile" | "miles" => Ok(Unit::Miles),
            _ => Err(UnknownUnit(s.to_string())),
        }
    }
}

/// A latitude or longitude outside its valid range (or not a finite number).
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    /// Latitude must be within [-90, 90].
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    /// Longitude must be within [-180, 180].
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// Check that a point is a finite, in-range lat/lon pair.
///
/// Out-of-range values are rejected, never clamped.
pub fn validate_coordinates(lat: f64, lon: f64) -> Result<(), CoordinateError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(CoordinateError::LatitudeOutOfRange(lat));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(CoordinateError::LongitudeOutOfRange(lon));
    }
    Ok(())
}

/// Haversine central angle between two points, in radians.
fn central_angle(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    // rounding can push `a` a hair past 1.0 for antipodal points
    2.0 * a.sqrt().clamp(-1.0, 1.0).asin()
}

/// Great-circle distance in kilometers.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    EARTH_RADIUS_KM * central_angle(lat1, lon1, lat2, lon2)
}

/// Great-circle distance between two points given in degrees, in `unit`.
///
/// Never negative; exactly `0.0` for identical points.
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64, unit: Unit) -> f64 {
    unit.from_km(haversine_km(lat1, lon1, lat2, lon2))
}

/// Axis-aligned lat/lon rectangle used as a cheap pre-filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Southern edge in degrees.
    pub min_lat: f64,
    /// Northern edge in degrees.
    pub max_lat: f64,
    /// Western edge in degrees.
    pub min_lon: f64,
    /// Eastern edge in degrees.
    pub max_lon: f64,
}

impl BoundingBox {
    /// Square box of half-width `delta_deg` degrees centered on a point.
    pub fn around(lat: f64, lon: f64, delta_deg: f64) -> Self {
        Self {
            min_lat: lat - delta_deg,
            max_lat: lat + delta_deg,
            min_lon: lon - delta_deg,
            max_lon: lon + delta_deg,
        }
    }

    /// True when the box reaches past a pole or across the antimeridian.
    ///
    /// Such a box cannot be expressed as one range query per axis.
    pub fn crosses_edge(&self) -> bool {
        self.min_lat < -90.0 || self.max_lat > 90.0 || self.min_lon < -180.0 || self.max_lon > 180.0
    }

    /// True when every point within `radius_km` of `(lat, lon)` lies inside the box.
    ///
    /// Uses the exact longitude half-width of a spherical cap,
    /// `asin(sin θ / cos φ)`; a cap that contains a pole never fits.
    pub fn contains_circle(&self, lat: f64, lon: f64, radius_km: f64) -> bool {
        let theta = radius_km / EARTH_RADIUS_KM;
        let theta_deg = theta.to_degrees();
        if lat - theta_deg < self.min_lat || lat + theta_deg > self.max_lat {
            return false;
        }

        let ratio = theta.sin() / lat.to_radians().cos();
        if !(0.0..1.0).contains(&ratio) || theta >= PI / 2.0 {
            return false;
        }
        let dlon_deg = ratio.asin().to_degrees();
        lon - dlon_deg >= self.min_lon && lon + dlon_deg <= self.max_lon
    }
}
