use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    accumulation::AccumulationEvent,
    aqi::AqiReading,
    astronomy::AstronomicalFacts,
    observation::ObservationReport,
    source::SourceKind,
    temporal::TemporalIntent,
};

/// Regional provider coverage box (continental US).
pub const REGIONAL_LAT_RANGE: (f64, f64) = (24.0, 49.0);
pub const REGIONAL_LON_RANGE: (f64, f64) = (-125.0, -66.0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Returns `None` when either component is outside its valid range.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self { latitude, longitude })
    }

    pub fn in_regional_coverage(&self) -> bool {
        (REGIONAL_LAT_RANGE.0..=REGIONAL_LAT_RANGE.1).contains(&self.latitude)
            && (REGIONAL_LON_RANGE.0..=REGIONAL_LON_RANGE.1).contains(&self.longitude)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodedPlace {
    pub coordinate: Coordinate,
    pub display_name: String,
}

/// Links to the regional sub-resources for one grid cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gridpoint {
    pub forecast_url: Option<String>,
    pub hourly_url: Option<String>,
    pub grid_data_url: Option<String>,
    pub alerts_zone: Option<String>,
    pub observation_stations_url: Option<String>,
    pub fire_zone: Option<String>,
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPeriod {
    pub name: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: Option<DateTime<FixedOffset>>,
    pub is_daytime: bool,
    pub short_text: String,
    pub detailed_text: String,
    pub temperature: Option<f64>,
    pub temperature_unit: String,
    pub precip_probability: Option<f64>,
    pub wind_speed: Option<String>,
    pub wind_direction: Option<String>,
}

impl ForecastPeriod {
    /// Temperature in °F regardless of the unit the provider used.
    pub fn temperature_f(&self) -> Option<f64> {
        let value = self.temperature?;
        if self.temperature_unit.eq_ignore_ascii_case("C") {
            Some(crate::units::celsius_to_fahrenheit(value))
        } else {
            Some(value)
        }
    }

    /// Whether the instant `at` falls before the end of this period.
    pub fn ends_after(&self, at: DateTime<Utc>) -> bool {
        match self.end_time {
            Some(end) => end.with_timezone(&Utc) > at,
            None => self.start_time.with_timezone(&Utc) >= at,
        }
    }

    /// Whether the instant `at` lies inside this period.
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.start_time.with_timezone(&Utc) <= at && self.ends_after(at)
    }

    pub fn condition(&self) -> Condition {
        let text = if self.detailed_text.is_empty() {
            &self.short_text
        } else {
            &self.detailed_text
        };
        Condition::classify(text)
    }
}

/// Coarse condition bucket for a forecast text, checked in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    Snow,
    Rain,
    Clear,
    Cloudy,
    Windy,
    Mixed,
}

impl Condition {
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("snow") || lower.contains("blizzard") || lower.contains("flurr") {
            Condition::Snow
        } else if lower.contains("rain") || lower.contains("shower") || lower.contains("drizzle") {
            Condition::Rain
        } else if lower.contains("sun") || lower.contains("clear") {
            Condition::Clear
        } else if lower.contains("cloud") || lower.contains("overcast") {
            Condition::Cloudy
        } else if lower.contains("wind") || lower.contains("blowing") {
            Condition::Windy
        } else {
            Condition::Mixed
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Condition::Snow => "❄️",
            Condition::Rain => "🌧️",
            Condition::Clear => "☀️",
            Condition::Cloudy => "☁️",
            Condition::Windy => "💨",
            Condition::Mixed => "🌤️",
        }
    }
}

/// A named block of free text, as used by zone (fire weather) forecasts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextPeriod {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Extreme,
    Severe,
    Moderate,
    Minor,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    Immediate,
    Expected,
    Future,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Certainty {
    Observed,
    Likely,
    Possible,
    Unknown,
}

impl Severity {
    pub fn from_provider(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "extreme" => Severity::Extreme,
            "severe" => Severity::Severe,
            "moderate" => Severity::Moderate,
            "minor" => Severity::Minor,
            _ => Severity::Unknown,
        }
    }
}

impl Urgency {
    pub fn from_provider(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "immediate" => Urgency::Immediate,
            "expected" => Urgency::Expected,
            "future" => Urgency::Future,
            _ => Urgency::Unknown,
        }
    }
}

impl Certainty {
    pub fn from_provider(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "observed" => Certainty::Observed,
            "likely" => Certainty::Likely,
            "possible" => Certainty::Possible,
            _ => Certainty::Unknown,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub event: String,
    pub severity: Severity,
    pub urgency: Urgency,
    pub certainty: Certainty,
    pub headline: Option<String>,
    pub description: Option<String>,
    pub instruction: Option<String>,
    pub onset: Option<DateTime<FixedOffset>>,
    pub expires: Option<DateTime<FixedOffset>>,
    pub response_type: Option<String>,
}

/// One time-series entry from raw grid data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridValue {
    pub value: Option<f64>,
    pub unit: String,
    /// ISO-8601 interval, e.g. `2026-01-05T06:00:00+00:00/PT6H`.
    pub valid_time: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridSeries {
    pub snowfall: Vec<GridValue>,
    pub ice: Vec<GridValue>,
    pub precip_probability: Vec<GridValue>,
}

impl GridSeries {
    pub fn is_empty(&self) -> bool {
        self.snowfall.is_empty() && self.ice.is_empty() && self.precip_probability.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

/// A temperature in the unit the station reported it in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub value: f64,
    pub unit: TemperatureUnit,
}

impl Temperature {
    pub fn celsius(value: f64) -> Self {
        Self { value, unit: TemperatureUnit::Celsius }
    }

    pub fn fahrenheit(value: f64) -> Self {
        Self { value, unit: TemperatureUnit::Fahrenheit }
    }

    pub fn to_fahrenheit(&self) -> f64 {
        match self.unit {
            TemperatureUnit::Celsius => crate::units::celsius_to_fahrenheit(self.value),
            TemperatureUnit::Fahrenheit => self.value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedUnit {
    KilometersPerHour,
    MetersPerSecond,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Speed {
    pub value: f64,
    pub unit: SpeedUnit,
}

impl Speed {
    pub fn to_mph(&self) -> f64 {
        match self.unit {
            SpeedUnit::KilometersPerHour => crate::units::kmh_to_mph(self.value),
            SpeedUnit::MetersPerSecond => crate::units::mps_to_mph(self.value),
        }
    }
}

/// Latest station report, values kept in the units the station used.
/// `None` means the station did not report the field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StationObservation {
    pub temperature: Option<Temperature>,
    pub wind_speed: Option<Speed>,
    pub wind_direction_deg: Option<f64>,
    pub pressure_pa: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub dewpoint: Option<Temperature>,
    pub visibility_m: Option<f64>,
    pub text_description: Option<String>,
    pub timestamp: Option<DateTime<FixedOffset>>,
}

/// Current conditions from the global text service, verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConditions {
    pub condition: String,
    pub temperature: String,
    pub wind: String,
    pub humidity: String,
    pub precipitation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TafReport {
    pub station_id: String,
    pub raw: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FireWeatherForecast {
    pub zone_id: String,
    pub periods: Vec<TextPeriod>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    Hourly,
    Standard,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastFacet {
    pub granularity: Granularity,
    pub periods: Vec<ForecastPeriod>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AirQuality {
    pub current: Vec<AqiReading>,
    pub forecast: Vec<AqiReading>,
}

/// Facet categories in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FacetKind {
    Forecast,
    Alerts,
    Accumulation,
    GlobalConditions,
    GlobalOutlook,
    Observation,
    AirQuality,
    Astronomy,
    Aviation,
    FireWeather,
}

impl FacetKind {
    pub fn label(&self) -> &'static str {
        match self {
            FacetKind::Forecast => "forecast",
            FacetKind::Alerts => "alerts",
            FacetKind::Accumulation => "accumulation",
            FacetKind::GlobalConditions => "current conditions",
            FacetKind::GlobalOutlook => "outlook",
            FacetKind::Observation => "observation",
            FacetKind::AirQuality => "air quality",
            FacetKind::Astronomy => "astronomy",
            FacetKind::Aviation => "aviation (TAF)",
            FacetKind::FireWeather => "fire weather",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "facet", rename_all = "snake_case")]
pub enum Facet {
    Forecast(ForecastFacet),
    Alerts { alerts: Vec<Alert> },
    Accumulation { events: Vec<AccumulationEvent> },
    GlobalConditions(GlobalConditions),
    GlobalOutlook { text: String },
    Observation(ObservationReport),
    AirQuality(AirQuality),
    Astronomy(AstronomicalFacts),
    Aviation(TafReport),
    FireWeather(FireWeatherForecast),
    Unavailable { kind: FacetKind, reason: String },
}

impl Facet {
    pub fn kind(&self) -> FacetKind {
        match self {
            Facet::Forecast(_) => FacetKind::Forecast,
            Facet::Alerts { .. } => FacetKind::Alerts,
            Facet::Accumulation { .. } => FacetKind::Accumulation,
            Facet::GlobalConditions(_) => FacetKind::GlobalConditions,
            Facet::GlobalOutlook { .. } => FacetKind::GlobalOutlook,
            Facet::Observation(_) => FacetKind::Observation,
            Facet::AirQuality(_) => FacetKind::AirQuality,
            Facet::Astronomy(_) => FacetKind::Astronomy,
            Facet::Aviation(_) => FacetKind::Aviation,
            Facet::FireWeather(_) => FacetKind::FireWeather,
            Facet::Unavailable { kind, .. } => *kind,
        }
    }

    /// Whether the facet carries any weather data at all.
    pub fn is_usable(&self) -> bool {
        match self {
            Facet::Forecast(f) => !f.periods.is_empty(),
            Facet::Alerts { alerts } => !alerts.is_empty(),
            Facet::Accumulation { events } => !events.is_empty(),
            Facet::AirQuality(aq) => !aq.current.is_empty() || !aq.forecast.is_empty(),
            Facet::FireWeather(fw) => !fw.periods.is_empty(),
            Facet::GlobalOutlook { text } => !text.trim().is_empty(),
            Facet::GlobalConditions(_)
            | Facet::Observation(_)
            | Facet::Astronomy(_)
            | Facet::Aviation(_) => true,
            Facet::Unavailable { .. } => false,
        }
    }
}

/// Output of one resolution: the place, the parsed intent, and the facets
/// that were requested, in presentation order.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedFactSet {
    pub query: String,
    pub place: GeocodedPlace,
    pub intent: TemporalIntent,
    pub source: SourceKind,
    pub warnings: Vec<String>,
    pub facets: Vec<Facet>,
    pub generated_at: DateTime<Utc>,
}

impl ResolvedFactSet {
    pub fn facet(&self, kind: FacetKind) -> Option<&Facet> {
        self.facets.iter().find(|f| f.kind() == kind)
    }

    pub fn count(&self, kind: FacetKind) -> usize {
        self.facets.iter().filter(|f| f.kind() == kind).count()
    }
}
