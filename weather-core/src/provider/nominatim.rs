use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::model::{Coordinate, GeocodedPlace};

use super::{Geocoder, http::HttpClient};

const SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";

/// OpenStreetMap Nominatim geocoder.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    http: HttpClient,
}

impl NominatimClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[derive(Debug, Deserialize)]
struct ApiPlace {
    lat: String,
    lon: String,
    display_name: Option<String>,
}

impl ApiPlace {
    fn into_place(self, query: &str) -> Result<GeocodedPlace> {
        let lat: f64 = self.lat.parse().with_context(|| format!("Invalid latitude '{}'", self.lat))?;
        let lon: f64 = self.lon.parse().with_context(|| format!("Invalid longitude '{}'", self.lon))?;
        let coordinate = Coordinate::new(lat, lon)
            .with_context(|| format!("Coordinates out of range: {lat},{lon}"))?;
        Ok(GeocodedPlace {
            coordinate,
            display_name: self.display_name.unwrap_or_else(|| query.to_string()),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn geocode(&self, text: &str) -> Result<Option<GeocodedPlace>> {
        let parsed: Vec<ApiPlace> = self
            .http
            .get_json(SEARCH_URL, &[("q", text), ("format", "json"), ("limit", "1")], "Nominatim")
            .await?;

        parsed.into_iter().next().map(|place| place.into_place(text)).transpose()
    }
}
