//! Snow, ice and precipitation events from grid time series, with a
//! forecast-text fallback.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

use crate::{
    model::{ForecastPeriod, GridSeries, GridValue},
    units,
};

/// Only the first entries of each series are considered.
pub const MAX_SERIES_ENTRIES: usize = 8;

pub const SNOW_THRESHOLD_IN: f64 = 0.1;
pub const ICE_THRESHOLD_IN: f64 = 0.01;
pub const PRECIP_CHANCE_THRESHOLD_PCT: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccumulationKind {
    Snow,
    Ice,
    PrecipitationChance,
    Precipitation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccumulationUnit {
    Inches,
    Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccumulationEvent {
    pub kind: AccumulationKind,
    pub amount: f64,
    pub unit: AccumulationUnit,
    /// Interval start for grid data, period name for text matches.
    pub time_label: String,
    /// Lower bound when the source gave a range.
    pub low: Option<f64>,
}

/// Convert a depth to inches from a WMO-style unit code.
///
/// `mm` and `cm` are recognised first; any other code containing `m` is
/// treated as meters. Every `wmoUnit:` code contains an `m`, so an
/// unexpected code lands in the meters branch.
pub fn to_inches(value: f64, unit: &str) -> f64 {
    let unit = unit.to_ascii_lowercase();
    if unit.contains("mm") {
        units::mm_to_inches(value)
    } else if unit.contains("cm") {
        units::cm_to_inches(value)
    } else if unit.contains('m') {
        units::meters_to_inches(value)
    } else {
        value
    }
}

pub fn extract(series: &GridSeries) -> Vec<AccumulationEvent> {
    let mut events = Vec::new();
    events.extend(depth_events(&series.snowfall, AccumulationKind::Snow, SNOW_THRESHOLD_IN));
    events.extend(depth_events(&series.ice, AccumulationKind::Ice, ICE_THRESHOLD_IN));
    events.extend(
        series
            .precip_probability
            .iter()
            .take(MAX_SERIES_ENTRIES)
            .filter_map(|entry| {
                let pct = entry.value.filter(|v| *v > 0.0)?;
                (pct >= PRECIP_CHANCE_THRESHOLD_PCT).then(|| AccumulationEvent {
                    kind: AccumulationKind::PrecipitationChance,
                    amount: pct,
                    unit: AccumulationUnit::Percent,
                    time_label: interval_start(&entry.valid_time),
                    low: None,
                })
            }),
    );
    sort_by_label(events)
}

fn depth_events(
    entries: &[GridValue],
    kind: AccumulationKind,
    threshold: f64,
) -> impl Iterator<Item = AccumulationEvent> + '_ {
    entries.iter().take(MAX_SERIES_ENTRIES).filter_map(move |entry| {
        let raw = entry.value.filter(|v| *v > 0.0)?;
        let inches = to_inches(raw, &entry.unit);
        (inches >= threshold).then(|| AccumulationEvent {
            kind,
            amount: inches,
            unit: AccumulationUnit::Inches,
            time_label: interval_start(&entry.valid_time),
            low: None,
        })
    })
}

fn interval_start(valid_time: &str) -> String {
    valid_time.split('/').next().unwrap_or(valid_time).to_string()
}

fn sort_by_label(mut events: Vec<AccumulationEvent>) -> Vec<AccumulationEvent> {
    events.sort_by(|a, b| a.time_label.cmp(&b.time_label));
    events
}

const AMOUNT: &str = r"(\d+(?:\.\d+)?|one|a half|a tenth|a quarter)";

static SNOW_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    amount_regex(r"(?:new\s+)?snow\s+accumulations?\s+of\s+(?:around\s+|up\s+to\s+|less\s+than\s+)?")
});
static ICE_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    amount_regex(r"ice\s+accumulations?\s+of\s+(?:around\s+|up\s+to\s+|less\s+than\s+)?")
});
static PRECIP_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    amount_regex(r"(?:new\s+)?(?:rainfall|precipitation)\s+amounts?\s+(?:of|between)\s+(?:around\s+|up\s+to\s+|less\s+than\s+)?")
});

fn amount_regex(prefix: &str) -> Regex {
    let pattern = format!(
        r"(?i){prefix}{AMOUNT}(?:\s+(?:to|and)\s+{AMOUNT})?(?:\s+of\s+an)?\s+inch(?:es)?"
    );
    Regex::new(&pattern).expect("built-in accumulation pattern must compile")
}

fn amount_value(text: &str) -> Option<f64> {
    match text.to_ascii_lowercase().as_str() {
        "one" => Some(1.0),
        "a half" => Some(0.5),
        "a quarter" => Some(0.25),
        "a tenth" => Some(0.1),
        other => other.parse().ok(),
    }
}

fn event_from_caps(caps: &Captures<'_>, kind: AccumulationKind, label: &str) -> Option<AccumulationEvent> {
    let first = amount_value(caps.get(1)?.as_str())?;
    let second = caps.get(2).and_then(|m| amount_value(m.as_str()));
    let (low, amount) = match second {
        Some(high) => (Some(first.min(high)), first.max(high)),
        None => (None, first),
    };
    (amount > 0.0).then(|| AccumulationEvent {
        kind,
        amount,
        unit: AccumulationUnit::Inches,
        time_label: label.to_string(),
        low,
    })
}

/// Regex fallback over forecast narratives, labelled with the period name.
pub fn extract_from_text(periods: &[ForecastPeriod]) -> Vec<AccumulationEvent> {
    let patterns: [(&Regex, AccumulationKind); 3] = [
        (&*SNOW_TEXT, AccumulationKind::Snow),
        (&*ICE_TEXT, AccumulationKind::Ice),
        (&*PRECIP_TEXT, AccumulationKind::Precipitation),
    ];

    let mut events = Vec::new();
    for period in periods {
        for (re, kind) in &patterns {
            events.extend(
                re.captures_iter(&period.detailed_text)
                    .filter_map(|caps| event_from_caps(&caps, *kind, &period.name)),
            );
        }
    }
    sort_by_label(events)
}
