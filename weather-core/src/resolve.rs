//! Staged resolution of a free-text query into a [`ResolvedFactSet`].
//!
//! Stages run strictly one after another: geocode, pick a source, fetch the
//! regional facets one by one, fall back to the global provider when the
//! regional path produced nothing usable, then sort facets into presentation
//! order. Only a failed geocode or a total absence of data is fatal; every
//! other failure becomes a [`Facet::Unavailable`] marker.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::{
    accumulation, alerts, astronomy,
    clock::PlaceClock,
    error::ResolveError,
    model::{
        AirQuality, Facet, FacetKind, FireWeatherForecast, ForecastFacet, ForecastPeriod,
        GeocodedPlace, Granularity, Gridpoint, ResolvedFactSet, Station, TafReport,
    },
    observation::ObservationReport,
    provider::{AirQualityProvider, Geocoder, GlobalProvider, RegionalProvider},
    source::{self, SourceKind, SourceOverride},
    temporal::{self, TemporalIntent},
};

/// Query words that make accumulation data worth fetching unasked.
pub const WINTER_KEYWORDS: [&str; 7] =
    ["snow", "storm", "accumulation", "blizzard", "december", "january", "february"];

/// Hourly periods kept from the target time onward.
pub const HOURLY_WINDOW: usize = 12;

const OUTSIDE_COVERAGE: &str = "unavailable outside regional coverage";
const REGIONAL_ONLY: &str = "only available from the regional (NWS) source";

/// Which facets to fetch. The standard forecast is always fetched.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub source: SourceOverride,
    pub alerts: bool,
    pub hourly: bool,
    pub accumulation: bool,
    pub air_quality: bool,
    pub observation: bool,
    pub astronomy: bool,
    pub aviation: bool,
    pub fire_weather: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            source: SourceOverride::Auto,
            alerts: true,
            hourly: false,
            accumulation: false,
            air_quality: false,
            observation: false,
            astronomy: false,
            aviation: false,
            fire_weather: false,
        }
    }
}

pub fn is_winter_relevant(query: &str) -> bool {
    let lower = query.to_lowercase();
    WINTER_KEYWORDS.iter().any(|k| lower.contains(k))
}

#[derive(Debug)]
pub struct Resolver {
    geocoder: Box<dyn Geocoder>,
    regional: Box<dyn RegionalProvider>,
    air_quality: Option<Box<dyn AirQualityProvider>>,
    global: Box<dyn GlobalProvider>,
}

/// Per-call context threaded through the regional stages.
struct Request<'a> {
    query: &'a str,
    place: &'a GeocodedPlace,
    intent: &'a TemporalIntent,
    options: &'a ResolveOptions,
    now: DateTime<Utc>,
    clock: PlaceClock,
}

impl Resolver {
    pub fn new(
        geocoder: Box<dyn Geocoder>,
        regional: Box<dyn RegionalProvider>,
        air_quality: Option<Box<dyn AirQualityProvider>>,
        global: Box<dyn GlobalProvider>,
    ) -> Self {
        Self { geocoder, regional, air_quality, global }
    }

    pub fn has_air_quality(&self) -> bool {
        self.air_quality.is_some()
    }

    pub async fn resolve(
        &self,
        query: &str,
        options: &ResolveOptions,
    ) -> Result<ResolvedFactSet, ResolveError> {
        self.resolve_at(query, options, Utc::now()).await
    }

    /// Same as [`Resolver::resolve`] with an explicit "now".
    ///
    /// Clock times in the query are read on the place's clock: the regional
    /// gridpoint's zone when there is one, otherwise an offset from longitude.
    pub async fn resolve_at(
        &self,
        query: &str,
        options: &ResolveOptions,
        now: DateTime<Utc>,
    ) -> Result<ResolvedFactSet, ResolveError> {
        let location = place_text(query);
        let place = self.locate(&location, query).await?;
        debug!(place = %place.display_name, coord = %place.coordinate, "location resolved");

        let mut warnings = Vec::new();
        let grid = if source::select(&place.coordinate, options.source) {
            match self.regional.gridpoint(&place.coordinate).await {
                Ok(grid) => Some(grid),
                Err(err) => {
                    let err = ResolveError::provider("NWS gridpoint", &err);
                    warn!(%err, "falling back to global source");
                    warnings.push(format!(
                        "Regional gridpoint not found ({}), falling back to global weather",
                        err.reason()
                    ));
                    None
                }
            }
        } else {
            None
        };

        let clock = PlaceClock::for_place(
            grid.as_ref().and_then(|g| g.time_zone.as_deref()),
            &place.coordinate,
        );
        let intent = temporal::parse(query, clock.local(now));
        debug!(?clock, ?intent, "temporal intent");

        let request = Request { query, place: &place, intent: &intent, options, now, clock };
        let mut regional_facets = None;

        if let Some(grid) = &grid {
            let facets = self.regional_facets(grid, &request, &mut warnings).await;
            if facets.iter().any(Facet::is_usable) {
                regional_facets = Some(facets);
            } else {
                warn!("regional source returned no usable data, falling back to global");
                warnings.push("Regional forecast unavailable, falling back to global weather".to_string());
            }
        }

        let (source, mut facets) = match regional_facets {
            Some(facets) => (SourceKind::Regional, facets),
            None => (SourceKind::Global, self.global_facets(&location, &request).await?),
        };

        if options.astronomy {
            facets.push(astronomy_facet(&place, clock.local(now).date(), &clock));
        }

        facets.sort_by_key(Facet::kind);

        Ok(ResolvedFactSet {
            query: query.to_string(),
            place,
            intent,
            source,
            warnings,
            facets,
            generated_at: now,
        })
    }

    async fn locate(&self, location: &str, query: &str) -> Result<GeocodedPlace, ResolveError> {
        match self.geocoder.geocode(location).await {
            Ok(Some(place)) => Ok(place),
            Ok(None) => Err(ResolveError::LocationNotFound { query: query.to_string() }),
            Err(err) => {
                warn!(error = %format!("{err:#}"), location, "geocoding failed");
                Err(ResolveError::LocationNotFound { query: query.to_string() })
            }
        }
    }

    async fn regional_facets(
        &self,
        grid: &Gridpoint,
        req: &Request<'_>,
        warnings: &mut Vec<String>,
    ) -> Vec<Facet> {
        let options = req.options;
        let mut facets = Vec::new();

        let forecast = self.forecast_facet(grid, req, warnings).await;
        let periods = match &forecast {
            Facet::Forecast(f) => f.periods.clone(),
            _ => Vec::new(),
        };
        facets.push(forecast);

        if options.alerts {
            facets.push(settle(FacetKind::Alerts, "NWS alerts", self.alerts_facet(grid).await));
        }

        if options.accumulation || is_winter_relevant(req.query) {
            facets.push(self.accumulation_facet(grid, &periods).await);
        }

        let station = if options.observation || options.aviation {
            Some(self.station(grid).await)
        } else {
            None
        };

        if let Some(station) = station.as_ref().filter(|_| options.observation) {
            let result = match station {
                Ok(station) => self.observation_facet(station, &periods, req.now).await,
                Err(reason) => Err(anyhow::anyhow!("{reason}")),
            };
            facets.push(settle(FacetKind::Observation, "NWS observation", result));
        }

        if options.air_quality {
            facets.push(self.air_quality_facet(req.place).await);
        }

        if let Some(station) = station.as_ref().filter(|_| options.aviation) {
            let result = match station {
                Ok(station) => self.aviation_facet(station).await,
                Err(reason) => Err(anyhow::anyhow!("{reason}")),
            };
            facets.push(settle(FacetKind::Aviation, "AWC TAF", result));
        }

        if options.fire_weather {
            let result = self.fire_weather_facet(grid).await;
            facets.push(settle(FacetKind::FireWeather, "NWS fire weather", result));
        }

        facets
    }

    /// Hourly first for time-targeted queries, standard forecast otherwise or
    /// when hourly fails. Never drops to the global source on its own.
    async fn forecast_facet(
        &self,
        grid: &Gridpoint,
        req: &Request<'_>,
        warnings: &mut Vec<String>,
    ) -> Facet {
        if req.intent.is_temporal || req.options.hourly {
            let target = req
                .intent
                .target_time
                .and_then(|wall| req.clock.instant(wall))
                .unwrap_or(req.now);
            match self.hourly_periods(grid, target).await {
                Ok(periods) if !periods.is_empty() => {
                    return Facet::Forecast(ForecastFacet { granularity: Granularity::Hourly, periods });
                }
                Ok(_) => {
                    warn!(%target, "hourly forecast has no periods for target time");
                    warnings.push("Hourly forecast empty, showing standard forecast".to_string());
                }
                Err(err) => {
                    warn!(error = %format!("{err:#}"), "hourly forecast failed");
                    warnings.push("Hourly forecast unavailable, showing standard forecast".to_string());
                }
            }
        }

        let result: anyhow::Result<Facet> = async {
            let url = grid
                .forecast_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("gridpoint has no forecast link"))?;
            let periods = self.regional.forecast(url).await?;
            Ok(Facet::Forecast(ForecastFacet { granularity: Granularity::Standard, periods }))
        }
        .await;
        settle(FacetKind::Forecast, "NWS forecast", result)
    }

    async fn hourly_periods(
        &self,
        grid: &Gridpoint,
        target: DateTime<Utc>,
    ) -> anyhow::Result<Vec<ForecastPeriod>> {
        let url = grid
            .hourly_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("gridpoint has no hourly forecast link"))?;
        let periods = self.regional.hourly(url).await?;
        Ok(window_from(periods, target))
    }

    async fn alerts_facet(&self, grid: &Gridpoint) -> anyhow::Result<Facet> {
        let zone = grid
            .alerts_zone
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("gridpoint has no forecast zone"))?;
        let fetched = self.regional.alerts(zone).await?;
        Ok(Facet::Alerts { alerts: alerts::rank(fetched) })
    }

    /// Grid time series when available, otherwise the forecast narratives.
    async fn accumulation_facet(&self, grid: &Gridpoint, periods: &[ForecastPeriod]) -> Facet {
        let series = match grid.grid_data_url.as_deref() {
            Some(url) => match self.regional.grid_data(url).await {
                Ok(series) if !series.is_empty() => Some(series),
                Ok(_) => None,
                Err(err) => {
                    warn!(error = %format!("{err:#}"), "grid data failed, using forecast text");
                    None
                }
            },
            None => None,
        };

        let events = match series {
            Some(series) => accumulation::extract(&series),
            None => accumulation::extract_from_text(periods),
        };
        Facet::Accumulation { events }
    }

    async fn station(&self, grid: &Gridpoint) -> Result<Station, String> {
        let result: anyhow::Result<Station> = async {
            let url = grid
                .observation_stations_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("gridpoint has no observation stations link"))?;
            self.regional.nearest_station(url).await
        }
        .await;
        result.map_err(|err| format!("{err:#}"))
    }

    async fn observation_facet(
        &self,
        station: &Station,
        periods: &[ForecastPeriod],
        now: DateTime<Utc>,
    ) -> anyhow::Result<Facet> {
        let obs = self.regional.latest_observation(&station.id).await?;
        let forecast_f = temperature_at(periods, now);
        Ok(Facet::Observation(ObservationReport::new(station.clone(), &obs, forecast_f)))
    }

    async fn air_quality_facet(&self, place: &GeocodedPlace) -> Facet {
        let Some(provider) = self.air_quality.as_ref() else {
            return Facet::Unavailable {
                kind: FacetKind::AirQuality,
                reason: "no AirNow API key configured (run `weather configure airnow` or set AIRNOW_API_KEY)"
                    .to_string(),
            };
        };

        let current = provider.current(&place.coordinate).await;
        let forecast = provider.forecast(&place.coordinate).await;

        match (current, forecast) {
            (Err(err), Err(_)) => settle(FacetKind::AirQuality, "AirNow", Err(err)),
            (current, forecast) => {
                let current = current.unwrap_or_else(|err| {
                    warn!(error = %format!("{err:#}"), "AirNow current AQI failed");
                    Vec::new()
                });
                let forecast = forecast.unwrap_or_else(|err| {
                    warn!(error = %format!("{err:#}"), "AirNow AQI forecast failed");
                    Vec::new()
                });
                Facet::AirQuality(AirQuality { current, forecast })
            }
        }
    }

    async fn aviation_facet(&self, station: &Station) -> anyhow::Result<Facet> {
        let raw = self.regional.taf(&station.id).await?;
        Ok(Facet::Aviation(TafReport { station_id: station.id.clone(), raw }))
    }

    async fn fire_weather_facet(&self, grid: &Gridpoint) -> anyhow::Result<Facet> {
        let zone_id = grid
            .fire_zone
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("gridpoint has no fire weather zone"))?;
        let periods = self.regional.fire_forecast(zone_id).await?;
        Ok(Facet::FireWeather(FireWeatherForecast { zone_id: zone_id.to_string(), periods }))
    }

    async fn global_facets(
        &self,
        location: &str,
        req: &Request<'_>,
    ) -> Result<Vec<Facet>, ResolveError> {
        let mut facets = Vec::new();

        match self.global.conditions(location).await {
            Ok(Some(conditions)) => facets.push(Facet::GlobalConditions(conditions)),
            Ok(None) => debug!(location, "global provider returned no current conditions"),
            Err(err) => warn!(error = %format!("{err:#}"), "global current conditions failed"),
        }

        match self.global.outlook(location).await {
            Ok(Some(text)) => facets.push(Facet::GlobalOutlook { text }),
            Ok(None) => debug!(location, "global provider returned no outlook"),
            Err(err) => warn!(error = %format!("{err:#}"), "global outlook failed"),
        }

        if facets.is_empty() {
            return Err(ResolveError::NoWeatherDataAvailable { query: req.query.to_string() });
        }

        let options = req.options;
        if options.air_quality {
            facets.push(Facet::Unavailable {
                kind: FacetKind::AirQuality,
                reason: OUTSIDE_COVERAGE.to_string(),
            });
        }
        for (requested, kind) in [
            (options.observation, FacetKind::Observation),
            (options.aviation, FacetKind::Aviation),
            (options.fire_weather, FacetKind::FireWeather),
        ] {
            if requested {
                facets.push(Facet::Unavailable { kind, reason: REGIONAL_ONLY.to_string() });
            }
        }

        Ok(facets)
    }
}

/// The place part of the query, or the raw query if stripping leaves nothing.
fn place_text(query: &str) -> String {
    let stripped = temporal::strip_qualifiers(query);
    if stripped.is_empty() { query.trim().to_string() } else { stripped }
}

/// Turn a facet fetch result into the facet or an `Unavailable` marker.
fn settle(kind: FacetKind, provider: &'static str, result: anyhow::Result<Facet>) -> Facet {
    result.unwrap_or_else(|err| {
        let err = ResolveError::provider(provider, &err);
        warn!(%err, facet = kind.label(), "facet unavailable");
        Facet::Unavailable { kind, reason: err.reason() }
    })
}

/// Periods starting with the one that contains `target`, at most
/// [`HOURLY_WINDOW`] of them.
fn window_from(periods: Vec<ForecastPeriod>, target: DateTime<Utc>) -> Vec<ForecastPeriod> {
    match periods.iter().position(|p| p.ends_after(target)) {
        Some(start) => periods.into_iter().skip(start).take(HOURLY_WINDOW).collect(),
        None => Vec::new(),
    }
}

/// Forecast temperature (°F) for the period covering `now`, else the first.
fn temperature_at(periods: &[ForecastPeriod], now: DateTime<Utc>) -> Option<f64> {
    periods
        .iter()
        .find(|p| p.covers(now))
        .or_else(|| periods.first())
        .and_then(ForecastPeriod::temperature_f)
}

fn astronomy_facet(place: &GeocodedPlace, date: NaiveDate, clock: &PlaceClock) -> Facet {
    match astronomy::facts(&place.coordinate, date, clock) {
        Some(facts) => Facet::Astronomy(facts),
        None => Facet::Unavailable {
            kind: FacetKind::Astronomy,
            reason: "could not compute solar times for this location".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        aqi::{AqiCategory, AqiReading},
        model::{
            Alert, Certainty, Coordinate, GlobalConditions, GridSeries, GridValue, Severity,
            StationObservation, Temperature, TextPeriod, Urgency,
        },
        observation::Comparison,
    };
    use async_trait::async_trait;
    use chrono::{Duration, FixedOffset, TimeZone, Timelike};
    use std::{collections::HashMap, sync::Mutex};

    /// 09:00 in Boston.
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 14, 0, 0).unwrap()
    }

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn period(name: &str, start: DateTime<FixedOffset>, hours: i64, temp: f64, text: &str) -> ForecastPeriod {
        ForecastPeriod {
            name: name.to_string(),
            start_time: start,
            end_time: Some(start + Duration::hours(hours)),
            is_daytime: true,
            short_text: text.to_string(),
            detailed_text: text.to_string(),
            temperature: Some(temp),
            temperature_unit: "F".to_string(),
            precip_probability: None,
            wind_speed: None,
            wind_direction: None,
        }
    }

    fn standard_periods() -> Vec<ForecastPeriod> {
        vec![
            period("Today", ts("2026-01-05T06:00:00-05:00"), 12, 34.0, "Snow likely. New snow accumulation of 1 to 2 inches possible."),
            period("Tonight", ts("2026-01-05T18:00:00-05:00"), 12, 22.0, "Mostly cloudy, with a low around 22."),
            period("Tuesday", ts("2026-01-06T06:00:00-05:00"), 12, 30.0, "Sunny, with a high near 30."),
        ]
    }

    fn hourly_periods() -> Vec<ForecastPeriod> {
        let start = ts("2026-01-05T09:00:00-05:00");
        (0..48)
            .map(|h| period("", start + Duration::hours(h), 1, 30.0 + h as f64 * 0.1, "Cloudy"))
            .collect()
    }

    fn alert(event: &str, severity: Severity) -> Alert {
        Alert {
            event: event.to_string(),
            severity,
            urgency: Urgency::Expected,
            certainty: Certainty::Likely,
            headline: None,
            description: None,
            instruction: None,
            onset: None,
            expires: None,
            response_type: None,
        }
    }

    #[derive(Debug, Default)]
    struct FakeGeocoder {
        places: HashMap<String, GeocodedPlace>,
        fail: bool,
    }

    impl FakeGeocoder {
        fn with(places: &[(&str, f64, f64)]) -> Self {
            let places = places
                .iter()
                .map(|(name, lat, lon)| {
                    let place = GeocodedPlace {
                        coordinate: Coordinate::new(*lat, *lon).unwrap(),
                        display_name: name.to_string(),
                    };
                    (name.to_string(), place)
                })
                .collect();
            Self { places, ..Default::default() }
        }
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn geocode(&self, text: &str) -> anyhow::Result<Option<GeocodedPlace>> {
            if self.fail {
                anyhow::bail!("connection reset");
            }
            Ok(self.places.get(text).cloned())
        }
    }

    /// `None` in any field makes that call fail.
    #[derive(Debug)]
    struct FakeRegional {
        gridpoint: Option<Gridpoint>,
        forecast: Option<Vec<ForecastPeriod>>,
        hourly: Option<Vec<ForecastPeriod>>,
        alerts: Option<Vec<Alert>>,
        grid_data: Option<GridSeries>,
        station: Option<Station>,
        observation: Option<StationObservation>,
        taf: Option<String>,
        fire: Option<Vec<TextPeriod>>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl Default for FakeRegional {
        fn default() -> Self {
            Self {
                gridpoint: Some(Gridpoint {
                    forecast_url: Some("forecast".into()),
                    hourly_url: Some("hourly".into()),
                    grid_data_url: Some("grid".into()),
                    alerts_zone: Some("MAZ015".into()),
                    observation_stations_url: Some("stations".into()),
                    fire_zone: Some("MAZ015".into()),
                    time_zone: Some("America/New_York".into()),
                }),
                forecast: Some(standard_periods()),
                hourly: Some(hourly_periods()),
                alerts: Some(Vec::new()),
                grid_data: None,
                station: Some(Station { id: "KBOS".into(), name: "Boston Logan".into() }),
                observation: Some(StationObservation {
                    temperature: Some(Temperature::celsius(5.0)),
                    ..Default::default()
                }),
                taf: Some("TAF KBOS 051130Z 0512/0618 36010KT P6SM BKN040".into()),
                fire: Some(vec![TextPeriod { name: "Today".into(), text: "Min RH 40 percent.".into() }]),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl FakeRegional {
        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn answer<T: Clone>(&self, call: &'static str, value: &Option<T>) -> anyhow::Result<T> {
            self.record(call);
            value.clone().ok_or_else(|| anyhow::anyhow!("{call} timed out"))
        }
    }

    #[async_trait]
    impl RegionalProvider for std::sync::Arc<FakeRegional> {
        async fn gridpoint(&self, _coord: &Coordinate) -> anyhow::Result<Gridpoint> {
            self.answer("gridpoint", &self.gridpoint)
        }
        async fn forecast(&self, _url: &str) -> anyhow::Result<Vec<ForecastPeriod>> {
            self.answer("forecast", &self.forecast)
        }
        async fn hourly(&self, _url: &str) -> anyhow::Result<Vec<ForecastPeriod>> {
            self.answer("hourly", &self.hourly)
        }
        async fn alerts(&self, _zone: &str) -> anyhow::Result<Vec<Alert>> {
            self.answer("alerts", &self.alerts)
        }
        async fn grid_data(&self, _url: &str) -> anyhow::Result<GridSeries> {
            self.answer("grid_data", &self.grid_data)
        }
        async fn nearest_station(&self, _url: &str) -> anyhow::Result<Station> {
            self.answer("station", &self.station)
        }
        async fn latest_observation(&self, _id: &str) -> anyhow::Result<StationObservation> {
            self.answer("observation", &self.observation)
        }
        async fn taf(&self, _id: &str) -> anyhow::Result<String> {
            self.answer("taf", &self.taf)
        }
        async fn fire_forecast(&self, _zone: &str) -> anyhow::Result<Vec<TextPeriod>> {
            self.answer("fire", &self.fire)
        }
    }

    #[derive(Debug)]
    struct FakeAirQuality {
        current: Option<Vec<AqiReading>>,
    }

    #[async_trait]
    impl AirQualityProvider for FakeAirQuality {
        async fn current(&self, _coord: &Coordinate) -> anyhow::Result<Vec<AqiReading>> {
            self.current.clone().ok_or_else(|| anyhow::anyhow!("AirNow 500"))
        }
        async fn forecast(&self, _coord: &Coordinate) -> anyhow::Result<Vec<AqiReading>> {
            anyhow::bail!("AirNow forecast 500")
        }
    }

    #[derive(Debug, Default)]
    struct FakeGlobal {
        conditions: Option<GlobalConditions>,
        outlook: Option<String>,
    }

    impl FakeGlobal {
        fn working() -> Self {
            Self {
                conditions: Some(GlobalConditions {
                    condition: "Light rain".into(),
                    temperature: "+9°C".into(),
                    wind: "↙14km/h".into(),
                    humidity: "87%".into(),
                    precipitation: "0.3mm".into(),
                }),
                outlook: Some("Weather report: Paris".into()),
            }
        }
    }

    #[async_trait]
    impl GlobalProvider for FakeGlobal {
        async fn conditions(&self, _location: &str) -> anyhow::Result<Option<GlobalConditions>> {
            Ok(self.conditions.clone())
        }
        async fn outlook(&self, _location: &str) -> anyhow::Result<Option<String>> {
            match &self.outlook {
                Some(text) => Ok(Some(text.clone())),
                None => anyhow::bail!("wttr.in timed out"),
            }
        }
    }

    const PLACES: &[(&str, f64, f64)] = &[
        ("Boston, MA", 42.36, -71.06),
        ("Boston", 42.36, -71.06),
        ("Buffalo", 42.89, -78.88),
        ("Fairbanks", 64.84, -147.72),
        ("Paris", 48.85, 2.35),
    ];

    struct Harness {
        regional: std::sync::Arc<FakeRegional>,
        resolver: Resolver,
    }

    fn harness(regional: FakeRegional, global: FakeGlobal) -> Harness {
        harness_with(regional, global, None, FakeGeocoder::with(PLACES))
    }

    fn harness_with(
        regional: FakeRegional,
        global: FakeGlobal,
        air: Option<FakeAirQuality>,
        geocoder: FakeGeocoder,
    ) -> Harness {
        let regional = std::sync::Arc::new(regional);
        let resolver = Resolver::new(
            Box::new(geocoder),
            Box::new(regional.clone()),
            air.map(|a| Box::new(a) as Box<dyn AirQualityProvider>),
            Box::new(global),
        );
        Harness { regional, resolver }
    }

    fn kinds(set: &ResolvedFactSet) -> Vec<FacetKind> {
        set.facets.iter().map(Facet::kind).collect()
    }

    #[tokio::test]
    async fn default_query_yields_one_standard_forecast() {
        let h = harness(FakeRegional::default(), FakeGlobal::working());
        let set = h.resolver.resolve_at("Boston, MA", &ResolveOptions::default(), now()).await.unwrap();

        assert_eq!(set.source, SourceKind::Regional);
        assert!(!set.intent.is_temporal);
        assert_eq!(set.count(FacetKind::Forecast), 1);
        assert_eq!(kinds(&set), [FacetKind::Forecast, FacetKind::Alerts]);
        match set.facet(FacetKind::Forecast) {
            Some(Facet::Forecast(f)) => {
                assert_eq!(f.granularity, Granularity::Standard);
                assert_eq!(f.periods.len(), 3);
            }
            other => panic!("unexpected forecast facet: {other:?}"),
        }
        assert_eq!(h.regional.calls(), ["gridpoint", "forecast", "alerts"]);
        assert!(set.warnings.is_empty());
    }

    #[tokio::test]
    async fn temporal_query_uses_hourly_window_from_target() {
        let h = harness(FakeRegional::default(), FakeGlobal::working());
        let set = h.resolver.resolve_at("Boston at 8 PM", &ResolveOptions::default(), now()).await.unwrap();

        assert!(set.intent.is_temporal);
        assert_eq!(set.place.display_name, "Boston");
        let Some(Facet::Forecast(f)) = set.facet(FacetKind::Forecast) else {
            panic!("missing forecast");
        };
        assert_eq!(f.granularity, Granularity::Hourly);
        assert_eq!(f.periods.len(), HOURLY_WINDOW);
        assert_eq!(f.periods[0].start_time.naive_local().hour(), 20);
        assert_eq!(h.regional.calls(), ["gridpoint", "hourly", "alerts"]);
    }

    #[tokio::test]
    async fn failed_hourly_falls_back_to_standard_not_global() {
        let regional = FakeRegional { hourly: None, ..Default::default() };
        let h = harness(regional, FakeGlobal::working());
        let options = ResolveOptions { source: SourceOverride::Nws, ..Default::default() };
        let set = h.resolver.resolve_at("Fairbanks at 3am", &options, now()).await.unwrap();

        assert!(set.intent.is_temporal);
        assert_eq!(set.source, SourceKind::Regional);
        assert_eq!(h.regional.calls()[..3], ["gridpoint", "hourly", "forecast"]);
        let Some(Facet::Forecast(f)) = set.facet(FacetKind::Forecast) else {
            panic!("missing forecast");
        };
        assert_eq!(f.granularity, Granularity::Standard);
        assert!(set.facet(FacetKind::GlobalConditions).is_none());
        assert_eq!(set.warnings.len(), 1);
    }

    #[tokio::test]
    async fn hourly_periods_ending_before_target_fall_back_to_standard() {
        let early = ts("2026-01-05T09:00:00-05:00");
        let regional = FakeRegional {
            hourly: Some((0..4).map(|h| period("", early + Duration::hours(h), 1, 30.0, "Cloudy")).collect()),
            ..Default::default()
        };
        let h = harness(regional, FakeGlobal::working());
        let set = h.resolver.resolve_at("Boston at 8 PM", &ResolveOptions::default(), now()).await.unwrap();

        assert_eq!(set.source, SourceKind::Regional);
        let Some(Facet::Forecast(f)) = set.facet(FacetKind::Forecast) else {
            panic!("missing forecast");
        };
        assert_eq!(f.granularity, Granularity::Standard);
        assert_eq!(set.warnings, ["Hourly forecast empty, showing standard forecast"]);
        assert_eq!(h.regional.calls(), ["gridpoint", "hourly", "forecast", "alerts"]);
    }

    #[tokio::test]
    async fn hourly_window_starts_at_current_instant() {
        let h = harness(FakeRegional::default(), FakeGlobal::working());
        let options = ResolveOptions { hourly: true, ..Default::default() };
        // 11:30 in Boston
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 16, 30, 0).unwrap();
        let set = h.resolver.resolve_at("Boston", &options, at).await.unwrap();

        let Some(Facet::Forecast(f)) = set.facet(FacetKind::Forecast) else {
            panic!("missing forecast");
        };
        assert_eq!(f.granularity, Granularity::Hourly);
        assert_eq!(f.periods[0].start_time, ts("2026-01-05T11:00:00-05:00"));
    }

    #[tokio::test]
    async fn clock_times_are_read_on_the_place_clock() {
        let h = harness(FakeRegional::default(), FakeGlobal::working());
        let options = ResolveOptions { astronomy: true, ..Default::default() };
        // 22:00 on Jan 5 in Boston, already Jan 6 in UTC
        let at = Utc.with_ymd_and_hms(2026, 1, 6, 3, 0, 0).unwrap();
        let set = h.resolver.resolve_at("Boston at 8 PM", &options, at).await.unwrap();

        let target = set.intent.target_time.unwrap();
        assert_eq!((target.date().to_string(), target.hour()), ("2026-01-06".to_string(), 20));
        let Some(Facet::Forecast(f)) = set.facet(FacetKind::Forecast) else {
            panic!("missing forecast");
        };
        assert_eq!(f.periods[0].start_time, ts("2026-01-06T20:00:00-05:00"));

        let Some(Facet::Astronomy(facts)) = set.facet(FacetKind::Astronomy) else {
            panic!("missing astronomy");
        };
        let sunrise = facts.sunrise.unwrap();
        assert_eq!(sunrise.date_naive().to_string(), "2026-01-05");
        assert_eq!(sunrise.offset().local_minus_utc(), -5 * 3600);
    }

    #[tokio::test]
    async fn unknown_place_is_fatal() {
        let h = harness(FakeRegional::default(), FakeGlobal::working());
        let err = h
            .resolver
            .resolve_at("Xyzzyville Nowhere", &ResolveOptions::default(), now())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::LocationNotFound { .. }));
        assert!(h.regional.calls().is_empty());
    }

    #[tokio::test]
    async fn geocoder_error_is_location_not_found() {
        let geocoder = FakeGeocoder { fail: true, ..Default::default() };
        let h = harness_with(FakeRegional::default(), FakeGlobal::working(), None, geocoder);
        let err = h.resolver.resolve_at("Boston", &ResolveOptions::default(), now()).await.unwrap_err();
        assert!(matches!(err, ResolveError::LocationNotFound { .. }));
    }

    #[tokio::test]
    async fn outside_coverage_uses_global_and_marks_aqi() {
        let h = harness(FakeRegional::default(), FakeGlobal::working());
        let options = ResolveOptions { air_quality: true, ..Default::default() };
        let set = h.resolver.resolve_at("Paris", &options, now()).await.unwrap();

        assert_eq!(set.source, SourceKind::Global);
        assert_eq!(
            kinds(&set),
            [FacetKind::GlobalConditions, FacetKind::GlobalOutlook, FacetKind::AirQuality]
        );
        match set.facet(FacetKind::AirQuality) {
            Some(Facet::Unavailable { reason, .. }) => assert_eq!(reason, OUTSIDE_COVERAGE),
            other => panic!("expected unavailable AQI, got {other:?}"),
        }
        assert!(h.regional.calls().is_empty());
    }

    #[tokio::test]
    async fn gridpoint_failure_falls_back_with_warning() {
        let regional = FakeRegional { gridpoint: None, ..Default::default() };
        let global = FakeGlobal::working();
        let h = harness(regional, global);
        let set = h.resolver.resolve_at("Boston, MA tonight", &ResolveOptions::default(), now()).await.unwrap();

        assert_eq!(set.source, SourceKind::Global);
        assert_eq!(set.warnings.len(), 1);
        assert!(set.warnings[0].contains("gridpoint"));
        assert_eq!(h.regional.calls(), ["gridpoint"]);
    }

    #[tokio::test]
    async fn regional_with_nothing_usable_falls_back() {
        let regional = FakeRegional { forecast: None, hourly: None, ..Default::default() };
        let h = harness(regional, FakeGlobal::working());
        let set = h.resolver.resolve_at("Boston, MA", &ResolveOptions::default(), now()).await.unwrap();

        assert_eq!(set.source, SourceKind::Global);
        assert!(set.facet(FacetKind::Forecast).is_none());
        assert!(set.facet(FacetKind::GlobalConditions).is_some());
    }

    #[tokio::test]
    async fn partial_regional_result_is_kept() {
        let regional = FakeRegional {
            forecast: None,
            alerts: Some(vec![alert("Winter Storm Warning", Severity::Severe)]),
            ..Default::default()
        };
        let h = harness(regional, FakeGlobal::working());
        let set = h.resolver.resolve_at("Boston, MA", &ResolveOptions::default(), now()).await.unwrap();

        assert_eq!(set.source, SourceKind::Regional);
        assert!(matches!(
            set.facet(FacetKind::Forecast),
            Some(Facet::Unavailable { kind: FacetKind::Forecast, .. })
        ));
    }

    #[tokio::test]
    async fn total_failure_is_no_weather_data() {
        let regional = FakeRegional { gridpoint: None, ..Default::default() };
        let global = FakeGlobal::default();
        let h = harness(regional, global);
        let err = h.resolver.resolve_at("Boston", &ResolveOptions::default(), now()).await.unwrap_err();
        assert!(matches!(err, ResolveError::NoWeatherDataAvailable { .. }));
    }

    #[tokio::test]
    async fn forced_global_skips_regional() {
        let h = harness(FakeRegional::default(), FakeGlobal::working());
        let options = ResolveOptions { source: SourceOverride::Wttr, ..Default::default() };
        let set = h.resolver.resolve_at("Boston at 8 PM", &options, now()).await.unwrap();

        assert_eq!(set.source, SourceKind::Global);
        assert!(set.intent.is_temporal);
        assert!(h.regional.calls().is_empty());
    }

    #[tokio::test]
    async fn winter_keyword_pulls_grid_accumulation() {
        let regional = FakeRegional {
            grid_data: Some(GridSeries {
                snowfall: vec![GridValue {
                    value: Some(50.0),
                    unit: "wmoUnit:mm".into(),
                    valid_time: "2026-01-05T18:00:00+00:00/PT6H".into(),
                }],
                ..Default::default()
            }),
            ..Default::default()
        };
        let h = harness(regional, FakeGlobal::working());
        let set = h.resolver.resolve_at("Buffalo snow", &ResolveOptions::default(), now()).await.unwrap();

        let Some(Facet::Accumulation { events }) = set.facet(FacetKind::Accumulation) else {
            panic!("missing accumulation facet");
        };
        assert_eq!(events.len(), 1);
        assert!((events[0].amount - 1.97).abs() < 0.01);
        assert!(h.regional.calls().contains(&"grid_data"));
        assert_eq!(set.place.display_name, "Buffalo");
    }

    #[tokio::test]
    async fn topic_words_are_not_geocoded() {
        let h = harness(FakeRegional::default(), FakeGlobal::working());
        let set = h.resolver.resolve_at("Boston, MA storm", &ResolveOptions::default(), now()).await.unwrap();

        assert_eq!(set.place.display_name, "Boston, MA");
        assert_eq!(set.source, SourceKind::Regional);
        assert!(set.facet(FacetKind::Accumulation).is_some());
        assert!(h.regional.calls().contains(&"grid_data"));
    }

    #[tokio::test]
    async fn grid_failure_uses_forecast_text() {
        let h = harness(FakeRegional::default(), FakeGlobal::working());
        let options = ResolveOptions { accumulation: true, ..Default::default() };
        let set = h.resolver.resolve_at("Boston", &options, now()).await.unwrap();

        let Some(Facet::Accumulation { events }) = set.facet(FacetKind::Accumulation) else {
            panic!("missing accumulation facet");
        };
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].time_label, "Today");
        assert_eq!((events[0].low, events[0].amount), (Some(1.0), 2.0));
    }

    #[tokio::test]
    async fn every_facet_in_presentation_order() {
        let regional = FakeRegional { taf: None, ..Default::default() };
        let air = FakeAirQuality {
            current: Some(vec![AqiReading {
                parameter: "PM2.5".into(),
                aqi: Some(35),
                category: AqiCategory::Good,
                reporting_area: Some("Boston".into()),
                date_label: "2026-01-05 08:00".into(),
                discussion: None,
                action_day: false,
            }]),
        };
        let h = harness_with(regional, FakeGlobal::working(), Some(air), FakeGeocoder::with(PLACES));
        let options = ResolveOptions {
            air_quality: true,
            observation: true,
            astronomy: true,
            aviation: true,
            fire_weather: true,
            ..Default::default()
        };
        let set = h.resolver.resolve_at("Boston", &options, now()).await.unwrap();

        assert_eq!(
            kinds(&set),
            [
                FacetKind::Forecast,
                FacetKind::Alerts,
                FacetKind::Observation,
                FacetKind::AirQuality,
                FacetKind::Astronomy,
                FacetKind::Aviation,
                FacetKind::FireWeather,
            ]
        );
        assert!(matches!(set.facet(FacetKind::Aviation), Some(Facet::Unavailable { .. })));
        assert!(matches!(set.facet(FacetKind::AirQuality), Some(Facet::AirQuality(aq)) if aq.current.len() == 1));
        // station list is fetched once for both observation and aviation
        assert_eq!(h.regional.calls().iter().filter(|c| **c == "station").count(), 1);
    }

    #[tokio::test]
    async fn observation_compared_with_current_period() {
        let h = harness(FakeRegional::default(), FakeGlobal::working());
        let options = ResolveOptions { observation: true, ..Default::default() };
        let set = h.resolver.resolve_at("Boston", &options, now()).await.unwrap();

        let Some(Facet::Observation(report)) = set.facet(FacetKind::Observation) else {
            panic!("missing observation");
        };
        // 5°C = 41°F against "Today" at 34°F
        assert_eq!(report.conditions.temperature_f, Some(41.0));
        assert_eq!(report.forecast_temperature_f, Some(34.0));
        assert_eq!(report.comparison, Comparison::Warmer { delta: 7.0 });
    }

    #[tokio::test]
    async fn missing_airnow_key_is_reported() {
        let h = harness(FakeRegional::default(), FakeGlobal::working());
        let options = ResolveOptions { air_quality: true, ..Default::default() };
        let set = h.resolver.resolve_at("Boston", &options, now()).await.unwrap();
        match set.facet(FacetKind::AirQuality) {
            Some(Facet::Unavailable { reason, .. }) => assert!(reason.contains("AirNow API key")),
            other => panic!("expected unavailable AQI, got {other:?}"),
        }
    }

    #[test]
    fn winter_keywords_are_case_insensitive() {
        assert!(is_winter_relevant("Buffalo SNOW totals"));
        assert!(is_winter_relevant("Denver in January"));
        assert!(!is_winter_relevant("Phoenix, AZ"));
    }

    #[test]
    fn place_text_falls_back_to_raw_query() {
        assert_eq!(place_text("Boston at 8 PM"), "Boston");
        assert_eq!(place_text("  tonight "), "tonight");
    }
}
