//! Moon phase, daylight and solar event times.
//!
//! Illumination is a linear (triangular) approximation over the eight phase
//! buckets, not an ephemeris figure.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use sunrise::{Coordinates, DawnType, SolarDay, SolarEvent};

use crate::{clock::PlaceClock, model::Coordinate};

pub const SYNODIC_MONTH_DAYS: f64 = 29.53059;

/// Known new moon: 2000-01-06 18:14 UTC.
const REFERENCE_NEW_MOON_UNIX: i64 = 947_182_440;

const PHASE_NAMES: [&str; 8] = [
    "New Moon",
    "Waxing Crescent",
    "First Quarter",
    "Waxing Gibbous",
    "Full Moon",
    "Waning Gibbous",
    "Last Quarter",
    "Waning Crescent",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoonPhase {
    pub index: u8,
    pub name: &'static str,
    pub illumination_pct: f64,
}

impl MoonPhase {
    pub fn icon(&self) -> &'static str {
        ["🌑", "🌒", "🌓", "🌔", "🌕", "🌖", "🌗", "🌘"][self.index as usize % 8]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DaylightDuration {
    pub hours: i64,
    pub minutes: i64,
}

impl std::fmt::Display for DaylightDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}h {}m", self.hours, self.minutes)
    }
}

/// The sun stays above (or below) the horizon for the whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolarCondition {
    Day,
    Night,
}

impl PolarCondition {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Day => "polar day",
            Self::Night => "polar night",
        }
    }
}

/// Solar events in the place's offset; `None` when they do not happen on that date.
#[derive(Debug, Clone, Serialize)]
pub struct AstronomicalFacts {
    pub sunrise: Option<DateTime<FixedOffset>>,
    pub sunset: Option<DateTime<FixedOffset>>,
    pub civil_twilight_begin: Option<DateTime<FixedOffset>>,
    pub civil_twilight_end: Option<DateTime<FixedOffset>>,
    pub polar: Option<PolarCondition>,
    pub moon: MoonPhase,
    pub daylight: Option<DaylightDuration>,
}

pub fn moon_phase(at: DateTime<Utc>) -> MoonPhase {
    let reference = Utc
        .timestamp_opt(REFERENCE_NEW_MOON_UNIX, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let elapsed_days = (at - reference).num_seconds() as f64 / 86_400.0;
    let days_into_cycle = elapsed_days.rem_euclid(SYNODIC_MONTH_DAYS);

    let index = ((days_into_cycle / SYNODIC_MONTH_DAYS) * 8.0).floor() as i64;
    let index = index.rem_euclid(8) as u8;
    let illumination_pct = 100.0 * (1.0 - (f64::from(index) - 4.0).abs() / 4.0);

    MoonPhase { index, name: PHASE_NAMES[index as usize], illumination_pct }
}

/// Whole hours plus remainder minutes between sunrise and sunset.
pub fn daylight(sunrise: DateTime<Utc>, sunset: DateTime<Utc>) -> DaylightDuration {
    let total_minutes = (sunset - sunrise).num_minutes().max(0);
    DaylightDuration { hours: total_minutes / 60, minutes: total_minutes % 60 }
}

/// Approximate noon altitude of the sun in degrees, from the day's declination.
fn noon_altitude(latitude: f64, date: NaiveDate) -> f64 {
    let day = f64::from(date.ordinal());
    let declination = -23.44 * (std::f64::consts::TAU / 365.0 * (day + 10.0)).cos();
    90.0 - (latitude - declination).abs()
}

fn polar_condition(latitude: f64, date: NaiveDate) -> PolarCondition {
    if noon_altitude(latitude, date) > 0.0 { PolarCondition::Day } else { PolarCondition::Night }
}

/// Solar times for the place-local `date` at `coord`, with the moon phase at
/// noon UTC of that date.
pub fn facts(coord: &Coordinate, date: NaiveDate, clock: &PlaceClock) -> Option<AstronomicalFacts> {
    let coordinates = Coordinates::new(coord.latitude, coord.longitude)?;
    let day = SolarDay::new(coordinates, date);

    let sunrise = day.event_time(SolarEvent::Sunrise);
    let sunset = day.event_time(SolarEvent::Sunset);
    let civil_twilight_begin = day.event_time(SolarEvent::Dawn(DawnType::Civil));
    let civil_twilight_end = day.event_time(SolarEvent::Dusk(DawnType::Civil));

    let noon = date.and_hms_opt(12, 0, 0)?.and_utc();

    let polar = match (sunrise, sunset) {
        (None, None) => Some(polar_condition(coord.latitude, date)),
        _ => None,
    };
    let daylight = match (sunrise, sunset, polar) {
        (Some(rise), Some(set), _) => Some(daylight(rise, set)),
        (_, _, Some(PolarCondition::Day)) => Some(DaylightDuration { hours: 24, minutes: 0 }),
        (_, _, Some(PolarCondition::Night)) => Some(DaylightDuration { hours: 0, minutes: 0 }),
        _ => None,
    };

    let local = |t: Option<DateTime<Utc>>| t.map(|t| clock.localize(t));
    Some(AstronomicalFacts {
        sunrise: local(sunrise),
        sunset: local(sunset),
        civil_twilight_begin: local(civil_twilight_begin),
        civil_twilight_end: local(civil_twilight_end),
        polar,
        moon: moon_phase(noon),
        daylight,
    })
}
