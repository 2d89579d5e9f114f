//! Stateless unit conversions used when normalizing provider payloads.
//!
//! Providers mostly report metric (SI / WMO) units; everything the CLI shows
//! is imperial. Conversions happen once, at normalization time.

pub const MM_TO_INCHES: f64 = 0.03937;
pub const CM_TO_INCHES: f64 = 0.3937;
pub const METERS_TO_INCHES: f64 = 39.37;
pub const KMH_PER_MPH: f64 = 1.609344;
pub const METERS_PER_MILE: f64 = 1609.344;
pub const PASCALS_PER_INHG: f64 = 3386.389;

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

pub fn kmh_to_mph(kmh: f64) -> f64 {
    kmh / KMH_PER_MPH
}

pub fn mps_to_mph(mps: f64) -> f64 {
    kmh_to_mph(mps * 3.6)
}

pub fn pascals_to_inhg(pa: f64) -> f64 {
    pa / PASCALS_PER_INHG
}

pub fn meters_to_miles(m: f64) -> f64 {
    m / METERS_PER_MILE
}

pub fn mm_to_inches(mm: f64) -> f64 {
    mm * MM_TO_INCHES
}

pub fn cm_to_inches(cm: f64) -> f64 {
    cm * CM_TO_INCHES
}

pub fn meters_to_inches(m: f64) -> f64 {
    m * METERS_TO_INCHES
}

/// 16-point compass name for a bearing in degrees. Any finite input is
/// wrapped into `[0, 360)` first.
pub fn degrees_to_compass(degrees: f64) -> &'static str {
    let normalized = degrees.rem_euclid(360.0);
    let idx = ((normalized / 22.5) + 0.5).floor() as usize % COMPASS_POINTS.len();
    COMPASS_POINTS[idx]
}
