//! Human-friendly (markdown-ish) and JSON rendering of a resolved fact set.

use weather_core::{
    Facet, FacetKind, ResolvedFactSet, SourceKind,
    accumulation::{AccumulationEvent, AccumulationKind, AccumulationUnit},
    aqi::AqiReading,
    astronomy::AstronomicalFacts,
    model::{Alert, ForecastFacet, Granularity},
    observation::{Comparison, ObservationReport},
};

/// Standard periods shown (today, tonight, tomorrow, tomorrow night).
const STANDARD_PERIODS: usize = 4;

/// Alert events named in the header.
const HEADER_ALERTS: usize = 2;

pub fn json(set: &ResolvedFactSet) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(set)?)
}

pub fn markdown(set: &ResolvedFactSet) -> String {
    let mut out = Vec::new();

    for warning in &set.warnings {
        out.push(format!("⚠️  {warning}"));
    }

    let alerts = match set.facet(FacetKind::Alerts) {
        Some(Facet::Alerts { alerts }) => alerts.as_slice(),
        _ => &[],
    };
    header(&mut out, set, alerts);
    out.push(String::new());

    for facet in &set.facets {
        match facet {
            Facet::Forecast(forecast) => forecast_section(&mut out, forecast),
            Facet::Alerts { .. } => {}
            Facet::Accumulation { events } => accumulation_section(&mut out, events),
            Facet::GlobalConditions(c) => {
                out.push(format!("**Now:** {} {}", c.condition, c.temperature));
                out.push(format!("Wind: {} | Humidity: {}", c.wind, c.humidity));
                out.push(String::new());
            }
            Facet::GlobalOutlook { text } => {
                out.push("**3-Day Outlook:**".to_string());
                out.push("```".to_string());
                out.push(text.clone());
                out.push("```".to_string());
                out.push(String::new());
            }
            Facet::Observation(report) => observation_section(&mut out, report),
            Facet::AirQuality(aq) => {
                out.push("**🌫️ Air Quality:**".to_string());
                if aq.current.is_empty() && aq.forecast.is_empty() {
                    out.push("No reporting area nearby".to_string());
                }
                out.extend(aq.current.iter().map(current_aqi_line));
                out.extend(aq.forecast.iter().map(forecast_aqi_line));
                out.push(String::new());
            }
            Facet::Astronomy(facts) => astronomy_section(&mut out, facts),
            Facet::Aviation(taf) => {
                out.push(format!("**✈️ TAF {}:**", taf.station_id));
                out.push("```".to_string());
                out.push(taf.raw.trim_end().to_string());
                out.push("```".to_string());
                out.push(String::new());
            }
            Facet::FireWeather(fire) => {
                out.push(format!("**🔥 Fire Weather ({}):**", fire.zone_id));
                for period in &fire.periods {
                    out.push(format!("*{}:* {}", period.name, period.text));
                }
                out.push(String::new());
            }
            Facet::Unavailable { kind, reason } => {
                out.push(format!("*{} unavailable: {reason}*", capitalize(kind.label())));
                out.push(String::new());
            }
        }
    }

    if set.source == SourceKind::Global && set.facet(FacetKind::GlobalOutlook).is_none() {
        out.push("*Forecast data unavailable for this location.*".to_string());
        out.push(String::new());
    }

    bottom_line(&mut out, alerts);

    while out.last().is_some_and(|line| line.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

fn header(out: &mut Vec<String>, set: &ResolvedFactSet, alerts: &[Alert]) {
    let name = &set.place.display_name;
    match set.source {
        SourceKind::Global => out.push(format!("🌦️ **{name} Forecast** (Global source)")),
        SourceKind::Regional if !alerts.is_empty() => {
            let titles: Vec<&str> =
                alerts.iter().take(HEADER_ALERTS).map(|a| a.event.as_str()).collect();
            out.push(format!("🚨 **{name} — Alert Active**"));
            out.push(format!("⚠️  {}", titles.join(", ")));
        }
        SourceKind::Regional => out.push(format!("🌦️ **{name} Forecast**")),
    }
}

fn forecast_section(out: &mut Vec<String>, forecast: &ForecastFacet) {
    match forecast.granularity {
        Granularity::Standard => {
            for period in forecast
                .periods
                .iter()
                .filter(|p| !p.detailed_text.is_empty())
                .take(STANDARD_PERIODS)
            {
                out.push(format!("**{} {}**", period.condition().icon(), period.name));
                out.push(period.detailed_text.clone());
                out.push(String::new());
            }
        }
        Granularity::Hourly => {
            out.push("**Hourly:**".to_string());
            for period in &forecast.periods {
                let mut line = format!(
                    "{} {}",
                    period.condition().icon(),
                    period.start_time.format("%a %-I %p")
                );
                if let Some(temp) = period.temperature {
                    line.push_str(&format!("  {temp:.0}°{}", period.temperature_unit));
                }
                line.push_str(&format!("  {}", period.short_text));
                if let Some(pop) = period.precip_probability.filter(|p| *p > 0.0) {
                    line.push_str(&format!("  💧{pop:.0}%"));
                }
                out.push(line);
            }
            out.push(String::new());
        }
    }
}

fn accumulation_section(out: &mut Vec<String>, events: &[AccumulationEvent]) {
    out.push("**❄️ Accumulation:**".to_string());
    if events.is_empty() {
        out.push("No significant accumulation expected".to_string());
    }
    for event in events {
        out.push(format!("- {} ({})", accumulation_line(event), event.time_label));
    }
    out.push(String::new());
}

fn accumulation_line(event: &AccumulationEvent) -> String {
    let what = match event.kind {
        AccumulationKind::Snow => "Snow",
        AccumulationKind::Ice => "Ice",
        AccumulationKind::PrecipitationChance => "Precipitation chance",
        AccumulationKind::Precipitation => "Precipitation",
    };
    match (event.unit, event.low) {
        (AccumulationUnit::Percent, _) => format!("{what}: {:.0}%", event.amount),
        (AccumulationUnit::Inches, Some(low)) => {
            format!("{what}: {} to {} in", trim_amount(low), trim_amount(event.amount))
        }
        (AccumulationUnit::Inches, None) => format!("{what}: {} in", trim_amount(event.amount)),
    }
}

/// Two decimals at most, no trailing zeros.
fn trim_amount(value: f64) -> String {
    let s = format!("{value:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn observation_section(out: &mut Vec<String>, report: &ObservationReport) {
    let c = &report.conditions;
    let mut headline = format!("**🌡️ Observed at {} ({}):**", report.station.name, report.station.id);
    if let Some(temp) = c.temperature_f {
        headline.push_str(&format!(" {temp:.0}°F"));
    }
    if let Some(desc) = &c.description {
        headline.push_str(&format!(", {desc}"));
    }
    out.push(headline);

    let mut details = Vec::new();
    if let Some(speed) = c.wind_speed_mph {
        details.push(match c.wind_direction {
            Some(dir) => format!("Wind: {dir} {speed:.0} mph"),
            None => format!("Wind: {speed:.0} mph"),
        });
    }
    if let Some(h) = c.humidity_pct {
        details.push(format!("Humidity: {h:.0}%"));
    }
    if let Some(p) = c.pressure_inhg {
        details.push(format!("Pressure: {p:.2} inHg"));
    }
    if let Some(v) = c.visibility_mi {
        details.push(format!("Visibility: {v:.1} mi"));
    }
    if !details.is_empty() {
        out.push(details.join(" | "));
    }

    match (report.comparison, report.forecast_temperature_f) {
        (Comparison::Unavailable, _) | (_, None) => {}
        (comparison @ (Comparison::Warmer { delta } | Comparison::Cooler { delta }), Some(forecast)) => {
            out.push(format!("→ {} by {delta:.0}°F (forecast {forecast:.0}°F)", comparison.label()));
        }
        (comparison, Some(forecast)) => {
            out.push(format!("→ {} (forecast {forecast:.0}°F)", comparison.label()));
        }
    }
    out.push(String::new());
}

fn current_aqi_line(reading: &AqiReading) -> String {
    let value = reading.aqi.map(|v| v.to_string()).unwrap_or_else(|| "n/a".to_string());
    let mut line = format!(
        "- {} {}: {value} ({})",
        reading.category.icon(),
        reading.parameter,
        reading.category.name()
    );
    if let Some(area) = &reading.reporting_area {
        line.push_str(&format!(" at {area}"));
    }
    line
}

fn forecast_aqi_line(reading: &AqiReading) -> String {
    let mut line = format!(
        "- {} {} {}: {}",
        reading.category.icon(),
        reading.date_label,
        reading.parameter,
        reading.category.name()
    );
    if reading.action_day {
        line.push_str(" (action day)");
    }
    line
}

fn astronomy_section(out: &mut Vec<String>, facts: &AstronomicalFacts) {
    let local = |t: Option<chrono::DateTime<chrono::FixedOffset>>| match t {
        Some(t) => t.format("%-I:%M %p").to_string(),
        None => "none".to_string(),
    };
    out.push("**🌅 Sun & Moon:**".to_string());
    match facts.polar {
        Some(polar) => out.push(format!("No sunrise or sunset ({})", polar.label())),
        None => out.push(format!("Sunrise {} | Sunset {}", local(facts.sunrise), local(facts.sunset))),
    }
    if let Some(daylight) = facts.daylight {
        out.push(format!("Daylight {daylight}"));
    }
    if facts.civil_twilight_begin.is_some() || facts.civil_twilight_end.is_some() {
        out.push(format!(
            "Civil twilight {} to {}",
            local(facts.civil_twilight_begin),
            local(facts.civil_twilight_end)
        ));
    }
    out.push(format!(
        "{} {} ({:.0}% illuminated)",
        facts.moon.icon(),
        facts.moon.name,
        facts.moon.illumination_pct
    ));
    out.push(String::new());
}

fn bottom_line(out: &mut Vec<String>, alerts: &[Alert]) {
    let Some(top) = alerts.first() else {
        return;
    };
    let Some(action) = top.bottom_line() else {
        return;
    };
    out.push("**⚡ Bottom line:**".to_string());
    if let Some(headline) = &top.headline {
        out.push(headline.clone());
    }
    out.push(format!("→ {action}"));
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
