use crate::{
    Config,
    aqi::AqiReading,
    model::{
        Alert, Coordinate, ForecastPeriod, GeocodedPlace, GlobalConditions, GridSeries, Gridpoint,
        Station, StationObservation, TextPeriod,
    },
    provider::{
        airnow::AirNowClient, http::HttpClient, nominatim::NominatimClient, nws::NwsClient,
        wttr::WttrClient,
    },
    resolve::Resolver,
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug};

pub mod airnow;
pub mod http;
pub mod nominatim;
pub mod nws;
pub mod wttr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Nws,
    Wttr,
    AirNow,
    Nominatim,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Nws => "nws",
            ProviderId::Wttr => "wttr",
            ProviderId::AirNow => "airnow",
            ProviderId::Nominatim => "nominatim",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::Nws, ProviderId::Wttr, ProviderId::AirNow, ProviderId::Nominatim]
    }

    /// Whether the provider needs an API key to be usable.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderId::AirNow)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "nws" => Ok(ProviderId::Nws),
            "wttr" => Ok(ProviderId::Wttr),
            "airnow" => Ok(ProviderId::AirNow),
            "nominatim" => Ok(ProviderId::Nominatim),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: nws, wttr, airnow, nominatim."
            )),
        }
    }
}

/// Place-name lookup. `Ok(None)` means the lookup worked but found nothing.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn geocode(&self, text: &str) -> anyhow::Result<Option<GeocodedPlace>>;
}

/// The authoritative provider for the regional coverage box.
#[async_trait]
pub trait RegionalProvider: Send + Sync + Debug {
    async fn gridpoint(&self, coord: &Coordinate) -> anyhow::Result<Gridpoint>;
    async fn forecast(&self, url: &str) -> anyhow::Result<Vec<ForecastPeriod>>;
    async fn hourly(&self, url: &str) -> anyhow::Result<Vec<ForecastPeriod>>;
    async fn alerts(&self, zone: &str) -> anyhow::Result<Vec<Alert>>;
    async fn grid_data(&self, url: &str) -> anyhow::Result<GridSeries>;
    async fn nearest_station(&self, stations_url: &str) -> anyhow::Result<Station>;
    async fn latest_observation(&self, station_id: &str) -> anyhow::Result<StationObservation>;
    async fn taf(&self, station_id: &str) -> anyhow::Result<String>;
    async fn fire_forecast(&self, zone_id: &str) -> anyhow::Result<Vec<TextPeriod>>;
}

#[async_trait]
pub trait AirQualityProvider: Send + Sync + Debug {
    async fn current(&self, coord: &Coordinate) -> anyhow::Result<Vec<AqiReading>>;
    async fn forecast(&self, coord: &Coordinate) -> anyhow::Result<Vec<AqiReading>>;
}

/// Coverage-agnostic text service used as the fallback.
#[async_trait]
pub trait GlobalProvider: Send + Sync + Debug {
    async fn conditions(&self, location: &str) -> anyhow::Result<Option<GlobalConditions>>;
    async fn outlook(&self, location: &str) -> anyhow::Result<Option<String>>;
}

/// Construct a resolver wired to the real providers from config.
pub fn resolver_from_config(config: &Config) -> anyhow::Result<Resolver> {
    let http = HttpClient::new(&config.http.user_agent, config.http.timeout())?;
    let global_http = HttpClient::new(wttr::TERMINAL_USER_AGENT, config.http.global_timeout())?;

    let air_quality: Option<Box<dyn AirQualityProvider>> =
        match config.provider_api_key(ProviderId::AirNow) {
            Some(key) => Some(Box::new(AirNowClient::new(http.clone(), key.to_owned()))),
            None => {
                tracing::debug!("no AirNow API key configured; AQI will be unavailable");
                None
            }
        };

    Ok(Resolver::new(
        Box::new(NominatimClient::new(http.clone())),
        Box::new(NwsClient::new(http)),
        air_quality,
        Box::new(WttrClient::new(global_http)),
    ))
}
