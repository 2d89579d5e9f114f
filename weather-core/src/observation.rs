use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::{
    model::{Station, StationObservation},
    units,
};

/// Differences within this many °F count as agreement.
pub const MATCH_TOLERANCE_F: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "label", rename_all = "snake_case")]
pub enum Comparison {
    /// No forecast value to compare against.
    Unavailable,
    Matches { delta: f64 },
    Warmer { delta: f64 },
    Cooler { delta: f64 },
}

impl Comparison {
    pub fn label(&self) -> &'static str {
        match self {
            Comparison::Unavailable => "no forecast to compare",
            Comparison::Matches { .. } => "matches forecast",
            Comparison::Warmer { .. } => "warmer than forecast",
            Comparison::Cooler { .. } => "cooler than forecast",
        }
    }
}

pub fn compare(observed_f: f64, forecast_f: Option<f64>) -> Comparison {
    let Some(forecast_f) = forecast_f else {
        return Comparison::Unavailable;
    };
    let delta = observed_f - forecast_f;
    if delta.abs() <= MATCH_TOLERANCE_F {
        Comparison::Matches { delta }
    } else if delta > 0.0 {
        Comparison::Warmer { delta }
    } else {
        Comparison::Cooler { delta: delta.abs() }
    }
}

/// Station observation in display units.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ObservedConditions {
    pub temperature_f: Option<f64>,
    pub wind_speed_mph: Option<f64>,
    pub wind_direction: Option<&'static str>,
    pub pressure_inhg: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub dewpoint_f: Option<f64>,
    pub visibility_mi: Option<f64>,
    pub description: Option<String>,
    pub observed_at: Option<DateTime<FixedOffset>>,
}

pub fn normalize(obs: &StationObservation) -> ObservedConditions {
    ObservedConditions {
        temperature_f: obs.temperature.map(|t| t.to_fahrenheit()),
        wind_speed_mph: obs.wind_speed.map(|s| s.to_mph()),
        wind_direction: obs.wind_direction_deg.map(units::degrees_to_compass),
        pressure_inhg: obs.pressure_pa.map(units::pascals_to_inhg),
        humidity_pct: obs.humidity_pct,
        dewpoint_f: obs.dewpoint.map(|t| t.to_fahrenheit()),
        visibility_mi: obs.visibility_m.map(units::meters_to_miles),
        description: obs.text_description.clone().filter(|d| !d.trim().is_empty()),
        observed_at: obs.timestamp,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ObservationReport {
    pub station: Station,
    pub conditions: ObservedConditions,
    pub comparison: Comparison,
    pub forecast_temperature_f: Option<f64>,
}

impl ObservationReport {
    pub fn new(station: Station, obs: &StationObservation, forecast_f: Option<f64>) -> Self {
        let conditions = normalize(obs);
        let comparison = match conditions.temperature_f {
            Some(observed) => compare(observed, forecast_f),
            None => Comparison::Unavailable,
        };
        Self { station, conditions, comparison, forecast_temperature_f: forecast_f }
    }
}
