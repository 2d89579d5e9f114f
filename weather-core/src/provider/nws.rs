//! US National Weather Service (api.weather.gov) plus the Aviation Weather
//! Center TAF feed.
//!
//! `/points/{lat},{lon}` resolves a coordinate to a forecast office grid
//! cell whose links lead to the forecast, hourly forecast, raw grid data,
//! alert zone, observation stations and fire-weather zone.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use crate::{
    model::{
        Alert, Certainty, Coordinate, ForecastPeriod, GridSeries, GridValue, Gridpoint, Severity,
        Speed, SpeedUnit, Station, StationObservation, Temperature, TextPeriod, Urgency,
    },
};

use super::{RegionalProvider, http::HttpClient};

const API_URL: &str = "https://api.weather.gov";
const TAF_URL: &str = "https://aviationweather.gov/api/data/taf";

#[derive(Debug, Clone)]
pub struct NwsClient {
    http: HttpClient,
}

impl NwsClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    async fn periods(&self, url: &str, what: &str) -> Result<Vec<ForecastPeriod>> {
        let parsed: ApiForecastResponse = self.http.get_json(url, &[], what).await?;
        Ok(parsed.properties.periods.into_iter().map(ApiPeriod::into_period).collect())
    }
}

#[derive(Debug, Deserialize)]
struct ApiPoints {
    properties: ApiPointsProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPointsProperties {
    forecast: Option<String>,
    forecast_hourly: Option<String>,
    forecast_grid_data: Option<String>,
    forecast_zone: Option<String>,
    observation_stations: Option<String>,
    fire_weather_zone: Option<String>,
    time_zone: Option<String>,
}

impl ApiPointsProperties {
    fn into_gridpoint(self) -> Gridpoint {
        Gridpoint {
            forecast_url: self.forecast,
            hourly_url: self.forecast_hourly,
            grid_data_url: self.forecast_grid_data,
            alerts_zone: self.forecast_zone.as_deref().and_then(last_segment),
            observation_stations_url: self.observation_stations,
            fire_zone: self.fire_weather_zone.as_deref().and_then(last_segment),
            time_zone: self.time_zone,
        }
    }
}

/// Zone URLs end in the zone id, e.g. `.../zones/forecast/MAZ015`.
fn last_segment(url: &str) -> Option<String> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Deserialize)]
struct ApiForecastResponse {
    properties: ApiForecastProperties,
}

#[derive(Debug, Deserialize)]
struct ApiForecastProperties {
    #[serde(default)]
    periods: Vec<ApiPeriod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiValue {
    value: Option<f64>,
    #[serde(default)]
    unit_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPeriod {
    #[serde(default)]
    name: String,
    start_time: DateTime<FixedOffset>,
    end_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    is_daytime: bool,
    temperature: Option<f64>,
    #[serde(default)]
    temperature_unit: String,
    probability_of_precipitation: Option<ApiValue>,
    wind_speed: Option<String>,
    wind_direction: Option<String>,
    #[serde(default)]
    short_forecast: String,
    #[serde(default)]
    detailed_forecast: String,
}

impl ApiPeriod {
    fn into_period(self) -> ForecastPeriod {
        ForecastPeriod {
            name: self.name,
            start_time: self.start_time,
            end_time: self.end_time,
            is_daytime: self.is_daytime,
            short_text: self.short_forecast,
            detailed_text: self.detailed_forecast,
            temperature: self.temperature,
            temperature_unit: self.temperature_unit,
            precip_probability: self.probability_of_precipitation.and_then(|p| p.value),
            wind_speed: self.wind_speed.filter(|s| !s.is_empty()),
            wind_direction: self.wind_direction.filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiAlertsResponse {
    #[serde(default)]
    features: Vec<ApiAlertFeature>,
}

#[derive(Debug, Deserialize)]
struct ApiAlertFeature {
    properties: ApiAlert,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiAlert {
    event: String,
    #[serde(default)]
    severity: String,
    #[serde(default)]
    urgency: String,
    #[serde(default)]
    certainty: String,
    headline: Option<String>,
    description: Option<String>,
    instruction: Option<String>,
    onset: Option<DateTime<FixedOffset>>,
    expires: Option<DateTime<FixedOffset>>,
    response: Option<String>,
}

impl ApiAlert {
    fn into_alert(self) -> Alert {
        Alert {
            event: self.event,
            severity: Severity::from_provider(&self.severity),
            urgency: Urgency::from_provider(&self.urgency),
            certainty: Certainty::from_provider(&self.certainty),
            headline: self.headline,
            description: self.description,
            instruction: self.instruction,
            onset: self.onset,
            expires: self.expires,
            response_type: self.response,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiGridData {
    properties: ApiGridProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiGridProperties {
    snowfall_amount: Option<ApiGridLayer>,
    ice_accumulation: Option<ApiGridLayer>,
    probability_of_precipitation: Option<ApiGridLayer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiGridLayer {
    #[serde(default)]
    uom: String,
    #[serde(default)]
    values: Vec<ApiGridValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiGridValue {
    valid_time: String,
    value: Option<f64>,
}

impl ApiGridLayer {
    fn into_values(self) -> Vec<GridValue> {
        let uom = self.uom;
        self.values
            .into_iter()
            .map(|v| GridValue { value: v.value, unit: uom.clone(), valid_time: v.valid_time })
            .collect()
    }
}

impl ApiGridProperties {
    fn into_series(self) -> GridSeries {
        GridSeries {
            snowfall: self.snowfall_amount.map(ApiGridLayer::into_values).unwrap_or_default(),
            ice: self.ice_accumulation.map(ApiGridLayer::into_values).unwrap_or_default(),
            precip_probability: self
                .probability_of_precipitation
                .map(ApiGridLayer::into_values)
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiStations {
    #[serde(default)]
    features: Vec<ApiStationFeature>,
}

#[derive(Debug, Deserialize)]
struct ApiStationFeature {
    properties: ApiStation,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiStation {
    station_identifier: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiObservation {
    properties: ApiObservationProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiObservationProperties {
    timestamp: Option<DateTime<FixedOffset>>,
    text_description: Option<String>,
    temperature: Option<ApiValue>,
    dewpoint: Option<ApiValue>,
    wind_direction: Option<ApiValue>,
    wind_speed: Option<ApiValue>,
    barometric_pressure: Option<ApiValue>,
    visibility: Option<ApiValue>,
    relative_humidity: Option<ApiValue>,
}

/// The API normally reports `wmoUnit:degC`; values are kept as reported.
fn temperature(v: &Option<ApiValue>) -> Option<Temperature> {
    let v = v.as_ref()?;
    let value = v.value?;
    if v.unit_code.ends_with("degF") {
        Some(Temperature::fahrenheit(value))
    } else {
        Some(Temperature::celsius(value))
    }
}

fn speed(v: &Option<ApiValue>) -> Option<Speed> {
    let v = v.as_ref()?;
    let value = v.value?;
    let unit = if v.unit_code.ends_with("m_s-1") {
        SpeedUnit::MetersPerSecond
    } else {
        SpeedUnit::KilometersPerHour
    };
    Some(Speed { value, unit })
}

fn raw(v: &Option<ApiValue>) -> Option<f64> {
    v.as_ref()?.value
}

impl ApiObservationProperties {
    fn into_observation(self) -> StationObservation {
        StationObservation {
            temperature: temperature(&self.temperature),
            wind_speed: speed(&self.wind_speed),
            wind_direction_deg: raw(&self.wind_direction),
            pressure_pa: raw(&self.barometric_pressure),
            humidity_pct: raw(&self.relative_humidity),
            dewpoint: temperature(&self.dewpoint),
            visibility_m: raw(&self.visibility),
            text_description: self.text_description,
            timestamp: self.timestamp,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiZoneForecast {
    properties: ApiZoneForecastProperties,
}

#[derive(Debug, Deserialize)]
struct ApiZoneForecastProperties {
    #[serde(default)]
    periods: Vec<ApiZonePeriod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiZonePeriod {
    name: String,
    detailed_forecast: String,
}

#[async_trait]
impl RegionalProvider for NwsClient {
    async fn gridpoint(&self, coord: &Coordinate) -> Result<Gridpoint> {
        let url = format!("{API_URL}/points/{:.4},{:.4}", coord.latitude, coord.longitude);
        let parsed: ApiPoints = self.http.get_json(&url, &[], "NWS gridpoint").await?;
        Ok(parsed.properties.into_gridpoint())
    }

    async fn forecast(&self, url: &str) -> Result<Vec<ForecastPeriod>> {
        self.periods(url, "NWS forecast").await
    }

    async fn hourly(&self, url: &str) -> Result<Vec<ForecastPeriod>> {
        self.periods(url, "NWS hourly forecast").await
    }

    async fn alerts(&self, zone: &str) -> Result<Vec<Alert>> {
        let url = format!("{API_URL}/alerts/active");
        let parsed: ApiAlertsResponse =
            self.http.get_json(&url, &[("zone", zone)], "NWS alerts").await?;
        Ok(parsed.features.into_iter().map(|f| f.properties.into_alert()).collect())
    }

    async fn grid_data(&self, url: &str) -> Result<GridSeries> {
        let parsed: ApiGridData = self.http.get_json(url, &[], "NWS grid data").await?;
        Ok(parsed.properties.into_series())
    }

    async fn nearest_station(&self, stations_url: &str) -> Result<Station> {
        let parsed: ApiStations = self.http.get_json(stations_url, &[], "NWS stations").await?;
        let first = parsed
            .features
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("NWS stations response contained no stations"))?;
        Ok(Station { id: first.properties.station_identifier, name: first.properties.name })
    }

    async fn latest_observation(&self, station_id: &str) -> Result<StationObservation> {
        let url = format!("{API_URL}/stations/{station_id}/observations/latest");
        let parsed: ApiObservation = self.http.get_json(&url, &[], "NWS observation").await?;
        Ok(parsed.properties.into_observation())
    }

    async fn taf(&self, station_id: &str) -> Result<String> {
        let body = self
            .http
            .get_text(TAF_URL, &[("ids", station_id), ("format", "raw")], "AWC TAF")
            .await?;
        let body = body.trim();
        if body.is_empty() {
            return Err(anyhow!("No TAF issued for station {station_id}"));
        }
        Ok(body.to_string())
    }

    async fn fire_forecast(&self, zone_id: &str) -> Result<Vec<TextPeriod>> {
        let url = format!("{API_URL}/zones/fire/{zone_id}/forecast");
        let parsed: ApiZoneForecast = self
            .http
            .get_json(&url, &[], "NWS fire weather forecast")
            .await
            .with_context(|| format!("fire weather zone {zone_id}"))?;
        Ok(parsed
            .properties
            .periods
            .into_iter()
            .map(|p| TextPeriod { name: p.name, text: p.detailed_forecast })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_payload_maps_to_gridpoint() {
        let json = r#"{
            "properties": {
                "forecast": "https://api.weather.gov/gridpoints/BOX/71,90/forecast",
                "forecastHourly": "https://api.weather.gov/gridpoints/BOX/71,90/forecast/hourly",
                "forecastGridData": "https://api.weather.gov/gridpoints/BOX/71,90",
                "forecastZone": "https://api.weather.gov/zones/forecast/MAZ015",
                "observationStations": "https://api.weather.gov/gridpoints/BOX/71,90/stations",
                "fireWeatherZone": "https://api.weather.gov/zones/fire/MAZ015",
                "timeZone": "America/New_York"
            }
        }"#;
        let points: ApiPoints = serde_json::from_str(json).unwrap();
        let grid = points.properties.into_gridpoint();
        assert_eq!(grid.alerts_zone.as_deref(), Some("MAZ015"));
        assert_eq!(grid.fire_zone.as_deref(), Some("MAZ015"));
        assert!(grid.hourly_url.unwrap().ends_with("/forecast/hourly"));
    }

    #[test]
    fn forecast_period_with_null_pop() {
        let json = r#"{
            "properties": {
                "periods": [{
                    "number": 1,
                    "name": "Tonight",
                    "startTime": "2026-01-05T18:00:00-05:00",
                    "endTime": "2026-01-06T06:00:00-05:00",
                    "isDaytime": false,
                    "temperature": 24,
                    "temperatureUnit": "F",
                    "probabilityOfPrecipitation": {"unitCode": "wmoUnit:percent", "value": null},
                    "windSpeed": "5 to 10 mph",
                    "windDirection": "NW",
                    "shortForecast": "Mostly Clear",
                    "detailedForecast": "Mostly clear, with a low around 24."
                }]
            }
        }"#;
        let parsed: ApiForecastResponse = serde_json::from_str(json).unwrap();
        let period = parsed.properties.periods.into_iter().next().unwrap().into_period();
        assert_eq!(period.name, "Tonight");
        assert_eq!(period.temperature_f(), Some(24.0));
        assert_eq!(period.precip_probability, None);
        assert_eq!(period.wind_direction.as_deref(), Some("NW"));
    }

    #[test]
    fn alert_payload_maps_enums() {
        let json = r#"{
            "features": [{
                "properties": {
                    "event": "Winter Storm Warning",
                    "severity": "Severe",
                    "urgency": "Expected",
                    "certainty": "Likely",
                    "headline": "Winter Storm Warning issued January 5",
                    "description": "Heavy snow expected.",
                    "instruction": null,
                    "onset": "2026-01-05T19:00:00-05:00",
                    "expires": null,
                    "response": "Prepare"
                }
            }]
        }"#;
        let parsed: ApiAlertsResponse = serde_json::from_str(json).unwrap();
        let alert = parsed.features.into_iter().next().unwrap().properties.into_alert();
        assert_eq!(alert.severity, Severity::Severe);
        assert_eq!(alert.urgency, Urgency::Expected);
        assert_eq!(alert.certainty, Certainty::Likely);
        assert!(alert.onset.is_some());
        assert!(alert.expires.is_none());
        assert_eq!(alert.response_type.as_deref(), Some("Prepare"));
    }

    #[test]
    fn grid_layers_carry_their_unit() {
        let json = r#"{
            "properties": {
                "snowfallAmount": {
                    "uom": "wmoUnit:mm",
                    "values": [
                        {"validTime": "2026-01-05T18:00:00+00:00/PT6H", "value": 50.8},
                        {"validTime": "2026-01-06T00:00:00+00:00/PT6H", "value": null}
                    ]
                },
                "probabilityOfPrecipitation": {
                    "uom": "wmoUnit:percent",
                    "values": [{"validTime": "2026-01-05T18:00:00+00:00/PT1H", "value": 90}]
                }
            }
        }"#;
        let parsed: ApiGridData = serde_json::from_str(json).unwrap();
        let series = parsed.properties.into_series();
        assert_eq!(series.snowfall.len(), 2);
        assert_eq!(series.snowfall[0].unit, "wmoUnit:mm");
        assert_eq!(series.snowfall[1].value, None);
        assert!(series.ice.is_empty());
        assert_eq!(series.precip_probability[0].value, Some(90.0));
    }

    #[test]
    fn observation_keeps_missing_fields_missing() {
        let json = r#"{
            "properties": {
                "timestamp": "2026-01-05T17:54:00+00:00",
                "textDescription": "Light Snow",
                "temperature": {"unitCode": "wmoUnit:degC", "value": -2.2},
                "dewpoint": {"unitCode": "wmoUnit:degC", "value": null},
                "windDirection": {"unitCode": "wmoUnit:degree_(angle)", "value": 40},
                "windSpeed": {"unitCode": "wmoUnit:km_h-1", "value": 24.1},
                "barometricPressure": {"unitCode": "wmoUnit:Pa", "value": 100950},
                "visibility": {"unitCode": "wmoUnit:m", "value": 2410},
                "relativeHumidity": {"unitCode": "wmoUnit:percent", "value": 92.5}
            }
        }"#;
        let parsed: ApiObservation = serde_json::from_str(json).unwrap();
        let obs = parsed.properties.into_observation();
        assert_eq!(obs.temperature, Some(Temperature::celsius(-2.2)));
        assert_eq!(obs.dewpoint, None);
        assert_eq!(
            obs.wind_speed,
            Some(Speed { value: 24.1, unit: SpeedUnit::KilometersPerHour })
        );
        assert_eq!(obs.pressure_pa, Some(100_950.0));
        assert_eq!(obs.text_description.as_deref(), Some("Light Snow"));
    }

    #[test]
    fn observation_keeps_reported_units() {
        let props = ApiObservationProperties {
            timestamp: None,
            text_description: None,
            temperature: Some(ApiValue { value: Some(71.6), unit_code: "wmoUnit:degF".into() }),
            dewpoint: None,
            wind_direction: None,
            wind_speed: Some(ApiValue { value: Some(10.0), unit_code: "wmoUnit:m_s-1".into() }),
            barometric_pressure: None,
            visibility: None,
            relative_humidity: None,
        };
        let obs = props.into_observation();
        assert_eq!(obs.temperature, Some(Temperature::fahrenheit(71.6)));
        assert_eq!(obs.wind_speed, Some(Speed { value: 10.0, unit: SpeedUnit::MetersPerSecond }));
        // A Fahrenheit report reaches the display without a Celsius detour.
        let shown = crate::observation::normalize(&obs);
        assert_eq!(shown.temperature_f, Some(71.6));
    }

    #[test]
    fn zone_id_from_url() {
        assert_eq!(last_segment("https://api.weather.gov/zones/fire/AKZ222/").as_deref(), Some("AKZ222"));
        assert_eq!(last_segment("").as_deref(), None);
    }
}
