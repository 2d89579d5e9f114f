use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    aqi::{AqiReading, categorize},
    model::Coordinate,
};

use super::{AirQualityProvider, http::HttpClient};

const CURRENT_URL: &str = "https://www.airnowapi.org/aq/observation/latLong/current/";
const FORECAST_URL: &str = "https://www.airnowapi.org/aq/forecast/latLong/";

/// Reporting areas further than this from the coordinate are ignored.
const SEARCH_DISTANCE_MILES: &str = "25";

#[derive(Clone)]
pub struct AirNowClient {
    http: HttpClient,
    api_key: String,
}

impl std::fmt::Debug for AirNowClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AirNowClient").field("api_key", &"<redacted>").finish()
    }
}

impl AirNowClient {
    pub fn new(http: HttpClient, api_key: String) -> Self {
        Self { http, api_key }
    }

    async fn fetch(&self, url: &str, coord: &Coordinate, what: &str) -> Result<Vec<AqiReading>> {
        let lat = format!("{:.4}", coord.latitude);
        let lon = format!("{:.4}", coord.longitude);
        let parsed: Vec<ApiReading> = self
            .http
            .get_json(
                url,
                &[
                    ("format", "application/json"),
                    ("latitude", lat.as_str()),
                    ("longitude", lon.as_str()),
                    ("distance", SEARCH_DISTANCE_MILES),
                    ("API_KEY", self.api_key.as_str()),
                ],
                what,
            )
            .await?;
        Ok(parsed.into_iter().map(ApiReading::into_reading).collect())
    }
}

#[derive(Debug, Deserialize)]
struct ApiCategory {
    #[serde(rename = "Number")]
    number: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiReading {
    parameter_name: String,
    #[serde(rename = "AQI", default = "missing_aqi")]
    aqi: i64,
    category: Option<ApiCategory>,
    reporting_area: Option<String>,
    date_observed: Option<String>,
    hour_observed: Option<u32>,
    date_forecast: Option<String>,
    #[serde(default)]
    action_day: bool,
    discussion: Option<String>,
}

fn missing_aqi() -> i64 {
    -1
}

impl ApiReading {
    fn into_reading(self) -> AqiReading {
        let (aqi, category) = categorize(self.aqi, self.category.and_then(|c| c.number));
        let date_label = match (self.date_forecast, self.date_observed, self.hour_observed) {
            (Some(date), _, _) => date.trim().to_string(),
            (None, Some(date), Some(hour)) => format!("{} {hour:02}:00", date.trim()),
            (None, Some(date), None) => date.trim().to_string(),
            (None, None, _) => String::new(),
        };
        AqiReading {
            parameter: self.parameter_name,
            aqi,
            category,
            reporting_area: self.reporting_area,
            date_label,
            discussion: self.discussion.filter(|d| !d.trim().is_empty()),
            action_day: self.action_day,
        }
    }
}

#[async_trait]
impl AirQualityProvider for AirNowClient {
    async fn current(&self, coord: &Coordinate) -> Result<Vec<AqiReading>> {
        self.fetch(CURRENT_URL, coord, "AirNow current AQI").await
    }

    async fn forecast(&self, coord: &Coordinate) -> Result<Vec<AqiReading>> {
        self.fetch(FORECAST_URL, coord, "AirNow AQI forecast").await
    }
}
